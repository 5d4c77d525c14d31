use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

use super::filename::split_extension;

/// Highest `(n)` suffix tried before giving up on a name.
const MAX_COLLISION_SUFFIX: u32 = 10_000;

/// Writes extracted attachments into the output directory without ever
/// replacing an existing file.
pub struct FileStorage {
    output_directory: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.as_ref().to_path_buf(),
        }
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Stores `content` as `filename`, or as `stem(1).ext`, `stem(2).ext`, ...
    /// when that name is taken. Returns the path written.
    pub fn store(&self, filename: &str, content: &[u8]) -> Result<PathBuf, StorageError> {
        self.ensure_directory()?;

        let (stem, ext) = split_extension(filename);
        for counter in 0..=MAX_COLLISION_SUFFIX {
            let try_filename = if counter == 0 {
                filename.to_string()
            } else {
                format!("{}({}){}", stem, counter, ext)
            };
            let try_path = self.output_directory.join(&try_filename);

            // create_new is an atomic check-and-create; an existing file is never opened.
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&try_path)
            {
                Ok(file) => {
                    write_and_sync(file, &try_path, content)?;
                    return Ok(try_path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::WriteFile {
                        path: try_path,
                        source: e,
                    });
                }
            }
        }

        Err(StorageError::FileExists(self.output_directory.join(filename)))
    }

    fn ensure_directory(&self) -> Result<(), StorageError> {
        if !self.output_directory.is_dir() {
            std::fs::create_dir_all(&self.output_directory).map_err(|e| {
                StorageError::CreateDirectory {
                    path: self.output_directory.clone(),
                    source: e,
                }
            })?;
        }
        Ok(())
    }
}

/// Writes the whole payload; a partially written file is removed again.
fn write_and_sync(mut file: std::fs::File, path: &Path, content: &[u8]) -> Result<(), StorageError> {
    let result = file.write_all(content).and_then(|()| file.sync_all());
    if let Err(e) = result {
        drop(file);
        let _ = std::fs::remove_file(path);
        return Err(StorageError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}
