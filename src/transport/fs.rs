use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::constants::layout::{
    DELIMITER, ENTITY_VOCAB_SUFFIX, ITEM_VOCAB_SUFFIX, JSON_EXTENSION, PARTITION_EXTENSION,
    PARTITION_HEADER, RAW_EXTENSION, TEST_SUFFIX, TRAIN_SUFFIX, VALIDATION_SUFFIX,
};
use crate::data::RawEvent;
use crate::errors::PrepError;
use crate::splits::SplitLabel;
use crate::types::{DatasetName, Timestamp};
use crate::vocab::Vocabulary;

/// File locations for one named dataset under a data root.
///
/// Everything lives in `<root>/<name>/`, prefixed with `<name>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetLayout {
    dir: PathBuf,
    name: DatasetName,
}

impl DatasetLayout {
    /// Layout of dataset `name` under `root`.
    pub fn new(root: impl AsRef<Path>, name: impl Into<DatasetName>) -> Self {
        let name = name.into();
        Self {
            dir: root.as_ref().join(&name),
            name,
        }
    }

    /// Directory holding every file of this dataset.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Dataset name used as file prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Headerless raw event log.
    pub fn raw_events(&self) -> PathBuf {
        self.file(&self.name, RAW_EXTENSION)
    }

    /// Partition table written by the splitter.
    pub fn partition(&self, label: SplitLabel) -> PathBuf {
        self.file(&self.stem(label), PARTITION_EXTENSION)
    }

    /// Encoded sequences for one partition.
    pub fn encoded(&self, label: SplitLabel) -> PathBuf {
        self.file(&self.stem(label), JSON_EXTENSION)
    }

    /// Persisted item vocabulary.
    pub fn item_vocab(&self) -> PathBuf {
        self.file(&format!("{}{ITEM_VOCAB_SUFFIX}", self.name), JSON_EXTENSION)
    }

    /// Persisted entity vocabulary.
    pub fn entity_vocab(&self) -> PathBuf {
        self.file(&format!("{}{ENTITY_VOCAB_SUFFIX}", self.name), JSON_EXTENSION)
    }

    fn stem(&self, label: SplitLabel) -> String {
        let suffix = match label {
            SplitLabel::Train => TRAIN_SUFFIX,
            SplitLabel::Validation => VALIDATION_SUFFIX,
            SplitLabel::Test => TEST_SUFFIX,
        };
        format!("{}{suffix}", self.name)
    }

    fn file(&self, stem: &str, extension: &str) -> PathBuf {
        self.dir.join(format!("{stem}.{extension}"))
    }
}

/// Read a headerless `entity<TAB>item<TAB>time` log.
pub fn read_raw_events(path: &Path) -> Result<Vec<RawEvent>, PrepError> {
    read_events(path, false)
}

/// Read a partition table written by [`StagedArtifacts::stage_partition`].
pub fn read_partition(path: &Path) -> Result<Vec<RawEvent>, PrepError> {
    read_events(path, true)
}

fn read_events(path: &Path, has_headers: bool) -> Result<Vec<RawEvent>, PrepError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(has_headers)
        .flexible(true)
        .from_path(path)?;
    let mut events = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        let line = record.position().map(|pos| pos.line()).unwrap_or(0);
        events.push(parse_event(path, line, &record)?);
    }
    debug!(path = %path.display(), events = events.len(), "read event table");
    Ok(events)
}

fn parse_event(path: &Path, line: u64, record: &StringRecord) -> Result<RawEvent, PrepError> {
    let malformed = |reason: String| PrepError::MalformedRow {
        path: path.to_path_buf(),
        line,
        reason,
    };
    if record.len() != 3 {
        return Err(malformed(format!("expected 3 fields, found {}", record.len())));
    }
    let time = record[2]
        .trim()
        .parse::<Timestamp>()
        .map_err(|err| malformed(format!("invalid timestamp '{}': {err}", &record[2])))?;
    Ok(RawEvent {
        entity: record[0].to_string(),
        item: record[1].to_string(),
        time,
    })
}

/// Read a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PrepError> {
    let file = fs::File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

/// Load a vocabulary persisted as a JSON array in index order.
pub fn read_vocabulary(path: &Path, kind: &'static str) -> Result<Vocabulary, PrepError> {
    let ids: Vec<String> = read_json(path)?;
    Vocabulary::from_ordered(kind, ids)
}

/// Artifacts written to temporary files next to their destinations and
/// renamed into place only by [`commit`](Self::commit).
///
/// Dropping without committing removes every staged file.
#[derive(Debug, Default)]
pub struct StagedArtifacts {
    staged: Vec<(NamedTempFile, PathBuf)>,
}

impl StagedArtifacts {
    /// Empty stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a partition table with the canonical header.
    pub fn stage_partition(&mut self, dest: PathBuf, events: &[RawEvent]) -> Result<(), PrepError> {
        self.stage_with(dest, |file| {
            let mut writer = WriterBuilder::new().delimiter(DELIMITER).from_writer(file);
            writer.write_record(PARTITION_HEADER)?;
            for event in events {
                let time = event.time.to_string();
                writer.write_record([event.entity.as_str(), event.item.as_str(), time.as_str()])?;
            }
            writer.flush()?;
            Ok(())
        })
    }

    /// Stage any serializable value as JSON.
    pub fn stage_json<T: Serialize + ?Sized>(
        &mut self,
        dest: PathBuf,
        value: &T,
    ) -> Result<(), PrepError> {
        self.stage_with(dest, |file| {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, value)?;
            writer.flush()?;
            Ok(())
        })
    }

    /// Stage a vocabulary as a JSON array in index order.
    pub fn stage_vocabulary(&mut self, dest: PathBuf, vocab: &Vocabulary) -> Result<(), PrepError> {
        let ids: Vec<&str> = vocab.ids().collect();
        self.stage_json(dest, &ids)
    }

    fn stage_with<F>(&mut self, dest: PathBuf, write: F) -> Result<(), PrepError>
    where
        F: FnOnce(&mut fs::File) -> Result<(), PrepError>,
    {
        let dir = dest
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        write(tmp.as_file_mut())?;
        tmp.as_file().sync_all()?;
        self.staged.push((tmp, dest));
        Ok(())
    }

    /// Number of staged artifacts.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// True when nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Rename staged files into place, in staging order.
    ///
    /// If a rename fails, destinations already renamed by this commit are
    /// removed and the remaining temp files are dropped. Files that a rename
    /// replaced are not restored.
    pub fn commit(self) -> Result<Vec<PathBuf>, PrepError> {
        let mut written: Vec<PathBuf> = Vec::with_capacity(self.staged.len());
        for (tmp, dest) in self.staged {
            if let Err(err) = tmp.persist(&dest) {
                for path in &written {
                    if let Err(remove_err) = fs::remove_file(path) {
                        warn!(path = %path.display(), error = %remove_err, "rollback failed");
                    }
                }
                return Err(PrepError::Persist(format!(
                    "{}: {}",
                    dest.display(),
                    err.error
                )));
            }
            debug!(path = %dest.display(), "artifact committed");
            written.push(dest);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn layout_matches_dataset_naming() {
        let layout = DatasetLayout::new("data", "gowalla");
        assert_eq!(layout.raw_events(), Path::new("data/gowalla/gowalla.tsv"));
        assert_eq!(
            layout.partition(SplitLabel::Train),
            Path::new("data/gowalla/gowalla_train_tr.txt")
        );
        assert_eq!(
            layout.partition(SplitLabel::Validation),
            Path::new("data/gowalla/gowalla_train_valid.txt")
        );
        assert_eq!(
            layout.encoded(SplitLabel::Test),
            Path::new("data/gowalla/gowalla_test.json")
        );
        assert_eq!(
            layout.item_vocab(),
            Path::new("data/gowalla/gowalla_item_dict.json")
        );
        assert_eq!(
            layout.entity_vocab(),
            Path::new("data/gowalla/gowalla_user_dict.json")
        );
    }

    #[test]
    fn raw_events_parse_and_bad_rows_report_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.tsv");
        fs::write(&path, "u1\ti1\t100\nu2\ti2\t200\n").unwrap();
        let events = read_raw_events(&path).unwrap();
        assert_eq!(events, vec![RawEvent::new("u1", "i1", 100), RawEvent::new("u2", "i2", 200)]);

        fs::write(&path, "u1\ti1\t100\nu2\ti2\tsoon\n").unwrap();
        match read_raw_events(&path) {
            Err(PrepError::MalformedRow { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }

        fs::write(&path, "u1\ti1\n").unwrap();
        assert!(matches!(
            read_raw_events(&path),
            Err(PrepError::MalformedRow { .. })
        ));
    }

    #[test]
    fn partition_tables_round_trip_with_header() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("part.txt");
        let events = vec![RawEvent::new("s1", "a", 5), RawEvent::new("s1", "b", 6)];
        let mut staged = StagedArtifacts::new();
        staged.stage_partition(dest.clone(), &events).unwrap();
        assert!(!dest.exists());
        staged.commit().unwrap();

        let text = fs::read_to_string(&dest).unwrap();
        assert!(text.starts_with("UserId\tItemId\tTime\n"));
        assert_eq!(read_partition(&dest).unwrap(), events);
    }

    #[test]
    fn dropping_uncommitted_artifacts_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.json");
        {
            let mut staged = StagedArtifacts::new();
            let value: BTreeMap<u32, Vec<u32>> = [(1, vec![2, 3])].into_iter().collect();
            staged.stage_json(dest.clone(), &value).unwrap();
            assert_eq!(staged.len(), 1);
        }
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn failed_commit_removes_already_renamed_artifacts() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.json");
        // A non-empty directory cannot be replaced by a file rename.
        let blocked = dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), "x").unwrap();

        let mut staged = StagedArtifacts::new();
        staged.stage_json(first.clone(), &[1_u32, 2]).unwrap();
        staged.stage_json(blocked.clone(), &[3_u32]).unwrap();
        assert!(matches!(staged.commit(), Err(PrepError::Persist(_))));

        assert!(!first.exists());
        assert!(blocked.join("keep").exists());
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("blocked")]);
    }

    #[test]
    fn json_keys_are_stringified_indices() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("enc.json");
        let value: BTreeMap<u32, Vec<u32>> = [(2, vec![7]), (10, vec![8, 9])].into_iter().collect();
        let mut staged = StagedArtifacts::new();
        staged.stage_json(dest.clone(), &value).unwrap();
        staged.commit().unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), r#"{"2":[7],"10":[8,9]}"#);
        let back: BTreeMap<u32, Vec<u32>> = read_json(&dest).unwrap();
        assert_eq!(back, value);
    }
}
