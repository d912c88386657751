use ndarray::s;

use seqprep::{EncodedSequences, EvalBatcher, prepare_eval_batches};

fn sequences(rows: Vec<(u32, Vec<u32>)>) -> EncodedSequences {
    rows.into_iter().collect()
}

#[test]
fn next_item_targets_for_single_entity() {
    let data = sequences(vec![(1, vec![5, 6, 7])]);
    let batches = prepare_eval_batches(&data, 2, 100).unwrap();
    assert_eq!(batches.len(), 1);

    let batch = &batches[0];
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.entities, vec![1]);

    let mut expected_input = vec![0_u32; 100];
    expected_input[..3].copy_from_slice(&[5, 6, 7]);
    let mut expected_target = vec![0_u32; 100];
    expected_target[..2].copy_from_slice(&[6, 7]);
    assert_eq!(batch.inputs.row(0).to_vec(), expected_input);
    assert_eq!(batch.targets.row(0).to_vec(), expected_target);
}

#[test]
fn five_entities_in_batches_of_two() {
    let data = sequences(vec![
        (1, vec![1, 2]),
        (2, vec![3]),
        (3, vec![4, 5, 6]),
        (4, vec![7, 8]),
        (5, vec![9, 10, 11, 12]),
    ]);
    let batches = prepare_eval_batches(&data, 2, 3).unwrap();
    let sizes: Vec<usize> = batches.iter().map(|batch| batch.len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);

    let entities: Vec<u32> = batches
        .iter()
        .flat_map(|batch| batch.entities.clone())
        .collect();
    assert_eq!(entities, vec![1, 2, 3, 4, 5]);

    // Row alignment: entity 5 is alone in the last batch and truncated to width 3.
    let last = &batches[2];
    assert_eq!(last.inputs.dim(), (1, 3));
    assert_eq!(last.inputs.row(0).to_vec(), vec![9, 10, 11]);
    assert_eq!(last.targets.row(0).to_vec(), vec![10, 11, 0]);

    let middle = &batches[1];
    assert_eq!(middle.entities, vec![3, 4]);
    assert_eq!(middle.inputs.slice(s![1, ..]).to_vec(), vec![7, 8, 0]);
    assert_eq!(middle.targets.slice(s![1, ..]).to_vec(), vec![8, 0, 0]);
}

#[test]
fn batch_size_one_behaves_like_two() {
    let data = sequences(vec![(1, vec![1]), (2, vec![2]), (3, vec![3])]);
    let with_one = prepare_eval_batches(&data, 1, 4).unwrap();
    let with_two = prepare_eval_batches(&data, 2, 4).unwrap();
    assert_eq!(with_one, with_two);
    assert_eq!(with_one.len(), 2);
    assert_eq!(EvalBatcher::new(1, 4).unwrap().batch_size(), 2);
}

#[test]
fn exact_multiple_has_no_remainder_batch() {
    let data = sequences(vec![(1, vec![1]), (2, vec![2]), (3, vec![3]), (4, vec![4])]);
    let batches = EvalBatcher::new(2, 8).unwrap().batches(&data);
    assert_eq!(batches.len(), 2);
    assert!(batches.iter().all(|batch| batch.len() == 2));
}
