use crate::error::AppError;
use crate::model::Snapshot;
use crate::storage::SnapshotBackend;
use std::path::{Path, PathBuf};

const STORE_FILE_NAME: &str = "todoData.json";
const STORE_ENV_VAR: &str = "TRACKER_STORE_PATH";

/// Resolves where the snapshot lives: the `TRACKER_STORE_PATH` variable,
/// then the configured path, then the per-user default.
pub fn store_path(configured: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("tracker").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("tracker")
            .join(STORE_FILE_NAME))
    }
}

/// Keeps the snapshot as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| STORE_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<Snapshot>, AppError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no stored snapshot");
            return Ok(None);
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|err| AppError::io(err.to_string()))?;
        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|err| {
            AppError::invalid_data(format!("invalid store {}: {}", self.path.display(), err))
        })?;

        tracing::debug!(
            path = %self.path.display(),
            pending = snapshot.pending.len(),
            completed = snapshot.completed.len(),
            "loaded snapshot"
        );
        Ok(Some(snapshot))
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
        }

        let content = snapshot.to_document()?;
        let temp_path = self.temp_path();
        write_synced(&temp_path, content.as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&temp_path, permissions)
                .map_err(|err| AppError::io(err.to_string()))?;
        }

        std::fs::rename(&temp_path, &self.path).map_err(|err| {
            std::fs::remove_file(&temp_path).ok();
            AppError::io(err.to_string())
        })?;
        sync_parent(&self.path)?;

        tracing::debug!(path = %self.path.display(), "saved snapshot");
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    use std::io::Write;

    let mut file = std::fs::File::create(path).map_err(|err| AppError::io(err.to_string()))?;
    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .map_err(|err| AppError::io(err.to_string()))
}

// Makes the rename itself durable.
#[cfg(unix)]
fn sync_parent(path: &Path) -> Result<(), AppError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::File::open(parent)
        .and_then(|dir| dir.sync_all())
        .map_err(|err| AppError::io(err.to_string()))
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> Result<(), AppError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{JsonFileBackend, sync_parent};
    use crate::model::{ServiceType, Snapshot, Task};
    use crate::storage::SnapshotBackend;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("tracker-{nanos}-{file_name}"))
    }

    fn sample_task() -> Task {
        Task {
            id: "task-1".to_string(),
            name: "Alice".to_string(),
            service_type: ServiceType::Cleaning,
            description: String::new(),
            remarks: "gate code 42".to_string(),
            created_time: "2025-12-20T00:00:00Z".to_string(),
            completed_time: None,
        }
    }

    #[test]
    fn missing_file_loads_as_none() {
        let backend = JsonFileBackend::new(temp_path("missing.json"));
        assert_eq!(backend.load().unwrap(), None);
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("todoData.json");
        let mut backend = JsonFileBackend::new(&path);
        let snapshot = Snapshot {
            pending: vec![sample_task()],
            completed: Vec::new(),
        };

        backend.save(&snapshot).unwrap();
        let loaded = backend.load().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, Some(snapshot));
    }

    #[test]
    fn save_creates_parent_directories_and_leaves_no_temp_file() {
        let dir = temp_path("nested");
        let path = dir.join("deeper").join("todoData.json");
        let mut backend = JsonFileBackend::new(&path);

        backend.save(&Snapshot::default()).unwrap();
        let exists = path.exists();
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        fs::remove_dir_all(&dir).ok();

        assert!(exists);
        assert!(leftovers.is_empty());
    }

    #[test]
    fn stored_layout_is_pending_and_completed() {
        let path = temp_path("layout.json");
        let mut backend = JsonFileBackend::new(&path);
        backend
            .save(&Snapshot {
                pending: vec![sample_task()],
                completed: Vec::new(),
            })
            .unwrap();

        let stored: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(stored["pending"][0]["id"], "task-1");
        assert_eq!(stored["pending"][0]["serviceType"], "Cleaning");
        assert!(stored["completed"].as_array().unwrap().is_empty());
    }

    #[test]
    fn accepts_legacy_documents_with_time_field() {
        let path = temp_path("legacy.json");
        let content = "{\n  \"pending\": [\n    {\n      \"id\": \"1734652800000abcde\",\n      \"name\": \"Alice\",\n      \"serviceType\": \"Cleaning\",\n      \"description\": \"\",\n      \"remarks\": \"\",\n      \"time\": \"2024-12-20T00:00:00.000Z\"\n    }\n  ],\n  \"completed\": []\n}";
        fs::write(&path, content).unwrap();

        let loaded = JsonFileBackend::new(&path).load().unwrap().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.pending[0].created_time, "2024-12-20T00:00:00.000Z");
    }

    #[test]
    fn rejects_malformed_store() {
        let path = temp_path("bad-store.json");
        fs::write(&path, "{ \"pending\": [").unwrap();

        let err = JsonFileBackend::new(&path).load().unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_store_missing_a_collection() {
        let path = temp_path("half-store.json");
        fs::write(&path, "{ \"pending\": [] }").unwrap();

        let err = JsonFileBackend::new(&path).load().unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn sync_parent_accepts_bare_file_names() {
        assert!(sync_parent(std::path::Path::new("todoData.json")).is_ok());
    }

    #[test]
    fn save_twice_replaces_the_document() {
        let path = temp_path("replace.json");
        let mut backend = JsonFileBackend::new(&path);
        let snapshot = Snapshot {
            pending: vec![sample_task()],
            completed: Vec::new(),
        };

        backend.save(&snapshot).unwrap();
        backend.save(&Snapshot::default()).unwrap();
        let loaded = backend.load().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, Some(Snapshot::default()));
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_path("private.json");
        JsonFileBackend::new(&path)
            .save(&Snapshot::default())
            .unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        fs::remove_file(&path).ok();

        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn save_into_unwritable_location_reports_io_error() {
        let blocker = temp_path("blocker");
        fs::write(&blocker, "").unwrap();
        let mut backend = JsonFileBackend::new(blocker.join("todoData.json"));

        let err = backend.save(&Snapshot::default()).unwrap_err();
        fs::remove_file(&blocker).ok();

        assert_eq!(err.code(), "io_error");
    }
}
