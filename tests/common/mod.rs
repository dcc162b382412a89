//! Shared test infrastructure for integration tests.
//!
//! Executables are tiny shell scripts written into a temp dir and run through
//! `sh` (exec'ing a freshly written file races with concurrent forks and can
//! fail with ETXTBSY). Every script appends its argv to `runs.log`, so tests
//! can count invocations.
#![allow(dead_code)]

use simdb::{Catalog, CatalogConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Copies the input to the output and appends the previous output, if any.
pub const COPY_SCRIPT: &str = r#"cat "$1" > "$2"
if [ -n "$3" ]; then cat "$3" >> "$2"; fi
"#;

/// Reports success without writing the output.
pub const SILENT_SCRIPT: &str = "exit 0\n";

/// Writes a partial output, complains, and fails.
pub const FAILING_SCRIPT: &str = r#"echo partial > "$2"
echo "diverged at step 7" >&2
exit 2
"#;

pub struct Sandbox {
    pub temp_dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            temp_dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root().join("data")
    }

    pub fn log_path(&self) -> PathBuf {
        self.root().join("runs.log")
    }

    /// Writes a script that logs its argv before running `body`.
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.root().join(name);
        let content = format!(
            "#!/bin/sh\necho \"$@\" >> '{}'\n{body}",
            self.log_path().display()
        );
        std::fs::write(&path, content).expect("write script");
        path
    }

    /// Command line running `script` through `sh`.
    pub fn command(&self, script: &Path) -> String {
        format!("sh '{}'", script.display())
    }

    pub fn config(&self, script: &Path, filetype: &str) -> CatalogConfig {
        CatalogConfig::new(self.data_dir(), filetype, self.command(script))
    }

    pub fn catalog(&self, body: &str, filetype: &str) -> Catalog {
        let script = self.script("execute.sh", body);
        Catalog::open(self.config(&script, filetype)).expect("open catalog")
    }

    /// One entry per invocation, each the space-joined argv.
    pub fn runs(&self) -> Vec<String> {
        std::fs::read_to_string(self.log_path())
            .map(|content| content.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
