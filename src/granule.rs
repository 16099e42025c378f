// request-files/src/granule.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A file requested for recovery, as it appears in the task input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileKey {
    pub key: String,
    pub dest_bucket: String,
}

/// Per-file restore result. `success` is never reset once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverFile {
    pub key: String,
    pub dest_bucket: String,
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "err_msg", default)]
    pub error_message: String,
}

impl RecoverFile {
    pub fn new(file: &FileKey) -> Self {
        Self {
            key: file.key.clone(),
            dest_bucket: file.dest_bucket.clone(),
            success: false,
            error_message: String::new(),
        }
    }

    /// Last path segment of the key.
    pub fn filename(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    pub(crate) fn mark_accepted(&mut self) {
        self.success = true;
        self.error_message.clear();
    }

    pub(crate) fn record_failure(&mut self, message: impl Into<String>) {
        self.error_message = message.into();
    }
}

/// One unit of data restored as a group.
///
/// Fields the task does not know about are kept in `extra` and written back
/// out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Granule {
    #[serde(rename = "granuleId")]
    pub granule_id: String,
    #[serde(default)]
    pub keys: Vec<FileKey>,
    #[serde(default)]
    pub recover_files: Vec<RecoverFile>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Granule {
    pub fn new(granule_id: impl Into<String>, keys: Vec<FileKey>) -> Self {
        Self {
            granule_id: granule_id.into(),
            keys,
            recover_files: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.recover_files.iter().all(|f| f.success)
    }

    pub fn failed_files(&self) -> impl Iterator<Item = &RecoverFile> {
        self.recover_files.iter().filter(|f| !f.success)
    }
}
