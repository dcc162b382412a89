//! Catalog configuration: where files live, what the executable produces, and
//! which program produces it.
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Folder holding every input/output pair.
    pub directory: PathBuf,
    /// Extension of the output files (`nc`, `yaml`, `txt`, ...), without the dot.
    pub filetype: String,
    /// Program path or command line producing outputs from inputs. When loaded
    /// from a file, a relative program path (one containing a `/`) resolves
    /// against the file's folder; arguments after it are passed unchanged.
    pub executable: String,
}

impl CatalogConfig {
    pub fn new(
        directory: impl Into<PathBuf>,
        filetype: impl Into<String>,
        executable: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            filetype: filetype.into(),
            executable: executable.into(),
        }
    }

    /// Reads a JSON config file. Relative directories and program paths
    /// resolve against the file's own folder.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|err| Error::fs(path, err))?;
        let mut config: CatalogConfig = serde_json::from_slice(&bytes)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))?;
        if let Some(base) = path.parent() {
            if config.directory.is_relative() {
                config.directory = base.join(&config.directory);
            }
            config.executable = resolve_relative_program(&config.executable, base)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(Error::Config("directory must not be empty".to_string()));
        }
        if self.filetype.is_empty() {
            return Err(Error::Config("filetype must not be empty".to_string()));
        }
        if self
            .filetype
            .chars()
            .any(|ch| matches!(ch, '.' | '/' | '\\') || ch.is_whitespace())
        {
            return Err(Error::Config(format!(
                "filetype '{}' must be a bare extension without dots or separators",
                self.filetype
            )));
        }
        if self.executable.trim().is_empty() {
            return Err(Error::Config("executable must not be empty".to_string()));
        }
        Ok(())
    }
}

// Bare names (`sh`, `simulate`) are left for the `PATH` lookup.
fn resolve_relative_program(executable: &str, base: &Path) -> Result<String> {
    let whole = Path::new(executable);
    if executable.contains('/') && whole.is_relative() && base.join(whole).is_file() {
        return Ok(base.join(whole).to_string_lossy().into_owned());
    }
    let mut words = shell_words::split(executable)
        .map_err(|err| Error::Config(format!("executable '{executable}': {err}")))?;
    let Some(program) = words.first_mut() else {
        return Ok(executable.to_string());
    };
    if !program.contains('/') || Path::new(program.as_str()).is_absolute() {
        return Ok(executable.to_string());
    }
    *program = base.join(program.as_str()).to_string_lossy().into_owned();
    Ok(shell_words::join(words))
}
