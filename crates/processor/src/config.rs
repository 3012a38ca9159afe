//! Run configuration loaded from YAML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, InvalidInput};

fn config_error(path: &Path, error: impl std::fmt::Display) -> Error {
    Error::Config {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

fn default_workers() -> usize {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Number of chunks and worker threads.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Upper bound on `workers` accepted by front-ends. The processor itself doesn't limit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    /// Where to save the worker timeline, see [Trace](crate::trace::Trace).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<PathBuf>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_workers: None,
            trace: None,
        }
    }
}

impl ProcessorConfig {
    /// Read [ProcessorConfig] from YAML file.
    pub fn from_yaml<P: AsRef<Path>>(file: P) -> Result<Self, Error> {
        let path = file.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| config_error(path, e))?;
        serde_yaml::from_str(&content).map_err(|e| config_error(path, e))
    }

    /// Parse [ProcessorConfig] from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self, Error> {
        serde_yaml::from_str(content).map_err(|e| config_error(Path::new("<inline>"), e))
    }

    /// Checks `workers` against `max_workers`. The check against the document size happens
    /// during partitioning.
    pub fn validate(&self) -> Result<(), Error> {
        if self.workers == 0 {
            return Err(InvalidInput::NoWorkers.into());
        }
        if let Some(limit) = self.max_workers {
            if self.workers > limit {
                return Err(InvalidInput::WorkerLimitExceeded {
                    workers: self.workers,
                    limit,
                }
                .into());
            }
        }
        Ok(())
    }
}
