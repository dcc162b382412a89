//! Creating outputs: the only path that invokes the executable.
use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::fingerprint::{canonical_bytes, Fingerprint};
use crate::params::ParamSet;
use crate::util::write_atomic;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Exclusive claim on producing one output, held for the duration of a run.
#[derive(Debug)]
struct RunClaim {
    path: PathBuf,
}

impl RunClaim {
    fn acquire(path: PathBuf) -> Result<Self> {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let claim = Self { path };
                // On failure the claim drops here and takes the file with it.
                writeln!(file, "{}", std::process::id())
                    .map_err(|err| Error::fs(&claim.path, err))?;
                Ok(claim)
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(Error::Busy { lock: path })
            }
            Err(err) => Err(Error::fs(&path, err)),
        }
    }
}

impl Drop for RunClaim {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

impl Catalog {
    /// Returns the output for `(params, index)`, running the executable only
    /// if the output does not exist yet.
    ///
    /// For `index > 0` the output of `index - 1` must already exist and is
    /// passed to the executable as a third argument.
    pub fn create(&self, params: &ParamSet, index: u32) -> Result<PathBuf> {
        let canonical = canonical_bytes(params)?;
        let fingerprint = Fingerprint::of_canonical(&canonical);
        let output = self.layout.output_path(&fingerprint, index);
        let previous = self.predecessor(&fingerprint, index)?;

        if output.is_file() {
            tracing::info!(fingerprint = fingerprint.short(), index, "existing simulation");
            return Ok(output);
        }

        let _claim = RunClaim::acquire(self.layout.lock_path(&fingerprint, index))?;
        // A concurrent run may have finished between the check and the claim.
        if output.is_file() {
            tracing::info!(fingerprint = fingerprint.short(), index, "existing simulation");
            return Ok(output);
        }

        let input = self.layout.input_path(&fingerprint, index);
        write_atomic(&input, &canonical)?;
        tracing::info!(fingerprint = fingerprint.short(), index, "running simulation");
        self.executable.produce(&input, &output, previous.as_deref())?;
        Ok(output)
    }

    /// Deletes the pair at `index` and creates it again.
    pub fn recreate(&self, params: &ParamSet, index: u32) -> Result<PathBuf> {
        self.delete(params, Some(index))?;
        self.create(params, index)
    }

    fn predecessor(&self, fingerprint: &Fingerprint, index: u32) -> Result<Option<PathBuf>> {
        let Some(previous_index) = index.checked_sub(1) else {
            return Ok(None);
        };
        let previous = self.layout.output_path(fingerprint, previous_index);
        if !previous.is_file() {
            return Err(Error::MissingPredecessor {
                fingerprint: fingerprint.to_string(),
                index,
            });
        }
        Ok(Some(previous))
    }
}
