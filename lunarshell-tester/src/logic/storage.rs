use lunarshell_game::Storage;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonDirError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Storage that keeps one pretty-printed JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct JsonDirStorage {
    dir: PathBuf,
}

impl JsonDirStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the backing directory so a run can write to it.
    pub fn prepare(&self) -> Result<(), JsonDirError> {
        fs::create_dir_all(&self.dir).map_err(|err| Self::io_error(&self.dir, err))
    }

    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn io_error(path: &Path, source: std::io::Error) -> JsonDirError {
        JsonDirError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl Storage for JsonDirStorage {
    type Error = JsonDirError;

    fn save(&self, key: &str, value: &Value) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.dir).map_err(|err| Self::io_error(&self.dir, err))?;
        let path = self.path_for(key);
        let payload = serde_json::to_vec_pretty(value).map_err(|source| JsonDirError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, payload).map_err(|err| Self::io_error(&path, err))
    }

    fn load(&self, key: &str) -> Result<Option<Value>, Self::Error> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Self::io_error(&path, err)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| JsonDirError::Json { path, source })
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(Self::io_error(&path, err)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "lunarshell-store-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn save_load_remove_cycle() {
        let storage = JsonDirStorage::new(temp_dir("cycle"));
        assert!(storage.load("exploration.log").unwrap().is_none());

        storage
            .save("exploration.log", &json!({"entries": []}))
            .unwrap();
        assert!(storage.path_for("exploration.log").exists());
        assert_eq!(
            storage.load("exploration.log").unwrap(),
            Some(json!({"entries": []}))
        );

        storage.remove("exploration.log").unwrap();
        storage.remove("exploration.log").unwrap();
        assert!(storage.load("exploration.log").unwrap().is_none());
    }

    #[test]
    fn prepare_fails_when_the_directory_is_a_file() {
        let path = temp_dir("occupied");
        fs::write(&path, b"not a directory").unwrap();
        let storage = JsonDirStorage::new(&path);
        assert!(matches!(storage.prepare(), Err(JsonDirError::Io { .. })));
    }

    #[test]
    fn corrupt_files_report_json_errors() {
        let dir = temp_dir("corrupt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("player.state.json"), b"{oops").unwrap();
        let storage = JsonDirStorage::new(&dir);
        assert!(matches!(
            storage.load("player.state"),
            Err(JsonDirError::Json { .. })
        ));
    }
}
