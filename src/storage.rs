/// Append-only mnemonic file
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::FarmError;

pub struct MnemonicStore {
    path: PathBuf,
}

impl MnemonicStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one phrase and flush it to disk before returning
    pub fn append(&self, mnemonic: &str) -> Result<(), FarmError> {
        let persist = |source| FarmError::Persist {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(persist)?;
        writeln!(file, "{}", mnemonic).map_err(persist)?;
        file.sync_data().map_err(persist)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_previous_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = MnemonicStore::new(dir.path().join("mnemonic.txt"));

        store.append("first phrase").unwrap();
        store.append("second phrase").unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "first phrase\nsecond phrase\n");
    }

    #[test]
    fn test_unwritable_path_is_persist_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = MnemonicStore::new(dir.path().join("missing").join("mnemonic.txt"));

        let err = store.append("phrase").unwrap_err();
        assert!(matches!(err, FarmError::Persist { .. }));
    }
}
