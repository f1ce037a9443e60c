//! Pipeline file loader.
//!
//! Loads every pipeline document (`.toml`, `.json`, `.yaml`, `.yml`) in a
//! directory. Invalid files are reported and skipped; they never prevent
//! the rest from loading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::definition::{PipelineConfig, PipelineFormat};
use crate::error::{PipelineError, Result};

/// Outcome of loading one file.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A pipeline was loaded (or replaced one with the same name).
    Loaded { name: String, path: PathBuf },
    /// A file failed to parse or validate.
    Error { path: PathBuf, error: String },
}

#[derive(Debug, Clone)]
struct LoadedPipeline {
    definition: PipelineConfig,
    path: PathBuf,
}

/// Pipelines loaded from one directory, keyed by name.
///
/// A pipeline's name is its `name` field, or the file stem when absent.
#[derive(Debug)]
pub struct PipelineLoader {
    pipeline_dir: PathBuf,
    pipelines: BTreeMap<String, LoadedPipeline>,
}

impl PipelineLoader {
    /// Create a loader for `pipeline_dir`. The directory must exist.
    pub fn new(pipeline_dir: impl Into<PathBuf>) -> Result<Self> {
        let pipeline_dir = pipeline_dir.into();
        if !pipeline_dir.is_dir() {
            return Err(PipelineError::invalid(format!(
                "pipeline directory {} does not exist",
                pipeline_dir.display()
            )));
        }

        Ok(Self {
            pipeline_dir,
            pipelines: BTreeMap::new(),
        })
    }

    pub fn pipeline_dir(&self) -> &Path {
        &self.pipeline_dir
    }

    /// Load all pipeline files from the directory.
    ///
    /// Files are visited in path order, so when two files declare the same
    /// name the later path wins.
    pub fn load_all(&mut self) -> Vec<PipelineEvent> {
        let mut events = Vec::new();

        let entries = match std::fs::read_dir(&self.pipeline_dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!(
                    dir = %self.pipeline_dir.display(),
                    error = %e,
                    "failed to read pipeline directory"
                );
                return events;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| Self::is_pipeline_file(path))
            .collect();
        paths.sort();

        for path in paths {
            events.push(self.load_file(&path));
        }

        info!(
            loaded = self.pipelines.len(),
            dir = %self.pipeline_dir.display(),
            "pipelines loaded"
        );
        events
    }

    fn load_file(&mut self, path: &Path) -> PipelineEvent {
        debug!(path = %path.display(), "loading pipeline file");

        let definition = match load_pipeline_file(path) {
            Ok(definition) => definition,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping pipeline file");
                return PipelineEvent::Error {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                };
            }
        };

        let name = match &definition.name {
            Some(name) => name.clone(),
            None => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        if let Some(previous) = self.pipelines.insert(
            name.clone(),
            LoadedPipeline {
                definition,
                path: path.to_path_buf(),
            },
        ) {
            warn!(
                pipeline = %name,
                path = %path.display(),
                replaced = %previous.path.display(),
                "pipeline name already loaded; later file wins"
            );
        }

        PipelineEvent::Loaded {
            name,
            path: path.to_path_buf(),
        }
    }

    /// Get a loaded pipeline by name.
    pub fn get(&self, name: &str) -> Option<&PipelineConfig> {
        self.pipelines.get(name).map(|loaded| &loaded.definition)
    }

    /// File a pipeline was loaded from.
    pub fn source_path(&self, name: &str) -> Option<&Path> {
        self.pipelines.get(name).map(|loaded| loaded.path.as_path())
    }

    /// Names of all loaded pipelines, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.pipelines.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    fn is_pipeline_file(path: &Path) -> bool {
        path.is_file() && PipelineFormat::from_path(path).is_some()
    }
}

/// Read, parse and structurally validate one pipeline file.
pub fn load_pipeline_file(path: &Path) -> Result<PipelineConfig> {
    let definition = PipelineConfig::from_file(path)?;
    definition.validate()?;
    Ok(definition)
}
