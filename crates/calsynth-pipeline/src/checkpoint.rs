use std::collections::BTreeMap;
use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::errors::PipelineError;
use crate::step::Step;

/// Per-step completion marker kept in `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub sha256: String,
    pub completed_at: String,
}

/// Map of step name to its completed checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub entries: BTreeMap<String, ManifestEntry>,
}

/// JSON checkpoint files plus the manifest, written atomically so a
/// crashed run never leaves a half-written checkpoint behind.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let dir = dir.into();
        create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, step: Step) -> PathBuf {
        self.dir.join(format!("{step}.json"))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join("manifest.json")
    }

    pub fn exists(&self, step: Step) -> bool {
        self.path_for(step).exists()
    }

    pub fn save<T: Serialize>(&self, step: Step, value: &T) -> Result<(), PipelineError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let path = self.path_for(step);
        write_bytes_atomic(&path, &bytes)?;

        let mut manifest = self.manifest()?;
        manifest.entries.insert(
            step.to_string(),
            ManifestEntry {
                path: path.to_string_lossy().into_owned(),
                sha256: hex::encode(Sha256::digest(&bytes)),
                completed_at: chrono::Utc::now().to_rfc3339(),
            },
        );
        write_bytes_atomic(&self.manifest_path(), &serde_json::to_vec_pretty(&manifest)?)?;

        info!(step = %step, bytes = bytes.len(), "checkpoint saved");
        Ok(())
    }

    pub fn load<T: DeserializeOwned>(&self, step: Step) -> Result<Option<T>, PipelineError> {
        let path = self.path_for(step);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let value = serde_json::from_str(&contents)?;
        info!(step = %step, "checkpoint loaded");
        Ok(Some(value))
    }

    pub fn manifest(&self) -> Result<Manifest, PipelineError> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(Manifest::default());
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

fn write_bytes_atomic(path: &Path, data: &[u8]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| PipelineError::Config(format!("invalid checkpoint path {path:?}")))?;
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
