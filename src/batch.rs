//! Fixed-width evaluation batches for next-item prediction.

use ndarray::Array2;
use tracing::debug;

use crate::constants::batching::{DEFAULT_MAX_SEQ_LEN, MIN_BATCH_SIZE};
use crate::data::{EncodedSequences, EvalBatch};
use crate::errors::PrepError;
use crate::types::VocabIndex;

/// Turns encoded sequences into padded input/target batches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalBatcher {
    batch_size: usize,
    max_len: usize,
}

impl EvalBatcher {
    /// `batch_size` below [`MIN_BATCH_SIZE`] is raised to it. `max_len` must be positive.
    pub fn new(batch_size: usize, max_len: usize) -> Result<Self, PrepError> {
        if max_len == 0 {
            return Err(PrepError::Configuration(
                "max sequence length must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            batch_size: batch_size.max(MIN_BATCH_SIZE),
            max_len,
        })
    }

    /// Batcher with the default row width.
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(MIN_BATCH_SIZE),
            max_len: DEFAULT_MAX_SEQ_LEN,
        }
    }

    /// Effective batch size after coercion.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Fixed width of input/target rows.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Split `data` into consecutive batches in entity order.
    ///
    /// Every batch holds `batch_size` rows except possibly the last, which
    /// holds the remainder and is neither dropped nor padded.
    pub fn batches(&self, data: &EncodedSequences) -> Vec<EvalBatch> {
        let rows: Vec<(VocabIndex, &[VocabIndex])> = data.iter().collect();
        let batches: Vec<EvalBatch> = rows
            .chunks(self.batch_size)
            .map(|chunk| self.build_batch(chunk))
            .collect();
        debug!(
            entities = rows.len(),
            batches = batches.len(),
            batch_size = self.batch_size,
            max_len = self.max_len,
            "built evaluation batches"
        );
        batches
    }

    fn build_batch(&self, rows: &[(VocabIndex, &[VocabIndex])]) -> EvalBatch {
        let mut inputs = Array2::<VocabIndex>::zeros((rows.len(), self.max_len));
        let mut targets = Array2::<VocabIndex>::zeros((rows.len(), self.max_len));
        let mut entities = Vec::with_capacity(rows.len());
        for (row, (entity, items)) in rows.iter().enumerate() {
            entities.push(*entity);
            let len = self.max_len.min(items.len());
            for (col, item) in items[..len].iter().enumerate() {
                inputs[[row, col]] = *item;
            }
            // Last valid position has no next item inside the window.
            for (col, item) in items[..len].iter().skip(1).enumerate() {
                targets[[row, col]] = *item;
            }
        }
        EvalBatch {
            entities,
            inputs,
            targets,
        }
    }
}

/// One-shot helper: coerce `batch_size`, then batch `data`.
pub fn prepare_eval_batches(
    data: &EncodedSequences,
    batch_size: usize,
    max_len: usize,
) -> Result<Vec<EvalBatch>, PrepError> {
    Ok(EvalBatcher::new(batch_size, max_len)?.batches(data))
}
