/// Captured host surface stored as JSON.
///
/// The file is produced by a capture script running inside the host and has
/// the shape `{"module": ["name", ...]}` (or the detailed capture shape, see
/// [`SurfaceSnapshot::from_json_str`]).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::surface::SurfaceSnapshot;
use crate::ports::SurfaceSource;

pub struct JsonSnapshotFile {
    path: PathBuf,
}

impl JsonSnapshotFile {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn save(&self, snapshot: &SurfaceSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, snapshot.to_json_string()?)
            .with_context(|| format!("Failed to write snapshot {}", self.path.display()))
    }
}

impl SurfaceSource for JsonSnapshotFile {
    fn load(&self) -> Result<SurfaceSnapshot> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read snapshot {}", self.path.display()))?;
        SurfaceSnapshot::from_json_str(&json)
            .with_context(|| format!("Failed to load snapshot {}", self.path.display()))
    }

    fn describe(&self) -> String {
        format!("snapshot {}", self.path.display())
    }
}
