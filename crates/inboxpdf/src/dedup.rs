//! Persisted set of messages that have already been handled.
//!
//! The set is small and rewritten in full after every change: serialized
//! sorted to a sibling temp file, then renamed over the previous snapshot.
//! The file on disk is therefore always a complete, deterministic list.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::email::UniqueId;
use crate::error::DedupError;

pub struct DedupStore {
    path: PathBuf,
    ids: BTreeSet<UniqueId>,
}

impl DedupStore {
    /// An empty store that persists to `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ids: BTreeSet::new(),
        }
    }

    /// Loads the snapshot at `path`. A missing file is an empty set and a
    /// malformed one is logged and treated as empty. Any other read failure
    /// is returned.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DedupError> {
        let mut store = Self::new(path);
        store.ids = store.read_snapshot()?;
        Ok(store)
    }

    fn read_snapshot(&self) -> Result<BTreeSet<UniqueId>, DedupError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No processed-id file at {}", self.path.display());
                return Ok(BTreeSet::new());
            }
            Err(e) => {
                return Err(DedupError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        match serde_json::from_str::<Vec<UniqueId>>(&content) {
            Ok(ids) => {
                debug!("Loaded {} processed ids from {}", ids.len(), self.path.display());
                Ok(ids.into_iter().collect())
            }
            Err(e) => {
                warn!(
                    "Processed-id file {} is malformed, starting empty: {}",
                    self.path.display(),
                    e
                );
                Ok(BTreeSet::new())
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &UniqueId) -> bool {
        self.ids.contains(id)
    }

    /// Adds `id` in memory. Returns false if it was already present.
    pub fn insert(&mut self, id: UniqueId) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UniqueId> {
        self.ids.iter()
    }

    /// Adds `id` and rewrites the snapshot.
    pub fn record(&mut self, id: UniqueId) -> Result<(), DedupError> {
        self.insert(id);
        self.persist()
    }

    /// Rewrites the whole snapshot atomically.
    pub fn persist(&self) -> Result<(), DedupError> {
        let ids: Vec<&UniqueId> = self.ids.iter().collect();
        let mut json = serde_json::to_string_pretty(&ids)?;
        json.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        let temp_path = self.temp_path();
        let written = std::fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| std::fs::rename(&temp_path, &self.path)) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(self.write_error(e));
        }

        debug!("Persisted {} processed ids to {}", self.ids.len(), self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_error(&self, source: std::io::Error) -> DedupError {
        DedupError::Write {
            path: self.path.clone(),
            source,
        }
    }
}
