//! Shared test infrastructure for integration tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Scratch directory holding a migration file and a store snapshot.
pub struct Workspace {
    pub dir: TempDir,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp workspace"),
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn store_path(&self) -> PathBuf {
        self.path("store.json")
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent directory");
        }
        std::fs::write(&path, contents.as_bytes()).expect("write file");
        path
    }

    /// Run `tmig` with the workspace as working directory.
    pub fn tmig(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_tmig"))
            .args(args)
            .current_dir(self.dir.path())
            .env_remove("TMIG_LOG")
            .output()
            .expect("spawn tmig")
    }

    pub fn read_json(&self, path: &Path) -> serde_json::Value {
        let bytes = std::fs::read(path).expect("read json file");
        serde_json::from_slice(&bytes).expect("parse json file")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
