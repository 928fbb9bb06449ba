//! Interpreter configuration.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use ember_eval::DEFAULT_STACK_SIZE;
use serde::{Deserialize, Serialize};

use crate::MachineError;

/// Environment variable holding extra module directories.
pub const PATH_VAR: &str = "EMBER_PATH";
/// Environment variable overriding the process stack size, in bytes.
pub const STACK_SIZE_VAR: &str = "EMBER_STACK_SIZE";

/// Settings for a [`Machine`](crate::Machine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Directories searched, in order, for `<module>.erl`.
    pub search_paths: Vec<PathBuf>,
    /// Stack size of every process thread.
    pub stack_size: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from(".")],
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl MachineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON configuration file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, MachineError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Defaults overridden by the environment.
    pub fn from_env() -> Result<Self, MachineError> {
        Self::default().with_env()
    }

    /// Apply `EMBER_PATH` and `EMBER_STACK_SIZE` on top of this config.
    pub fn with_env(self) -> Result<Self, MachineError> {
        self.with_vars(env::var_os(PATH_VAR), env::var(STACK_SIZE_VAR).ok())
    }

    fn with_vars(
        mut self,
        path: Option<OsString>,
        stack_size: Option<String>,
    ) -> Result<Self, MachineError> {
        if let Some(path) = path {
            let mut search_paths: Vec<PathBuf> = env::split_paths(&path).collect();
            search_paths.append(&mut self.search_paths);
            self.search_paths = search_paths;
        }
        if let Some(size) = stack_size {
            self.stack_size = size.trim().parse().map_err(|_| {
                MachineError::Config(format!("{} must be a byte count, got '{}'", STACK_SIZE_VAR, size))
            })?;
        }
        Ok(self)
    }

    /// Add a directory to the end of the search path.
    pub fn search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    /// Replace the whole search path.
    pub fn search_paths(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_paths = dirs;
        self
    }

    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }
}
