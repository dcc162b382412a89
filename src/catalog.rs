//! Catalog handle: path resolution, selection, and deletion.
//!
//! The directory is the only state. Every query re-reads it; nothing is cached
//! between calls.
use crate::config::CatalogConfig;
use crate::error::{Error, Result};
use crate::exec::Executable;
use crate::fingerprint::Fingerprint;
use crate::layout::Layout;
use crate::params::ParamSet;
use crate::util::remove_if_exists;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Catalog {
    pub(crate) config: CatalogConfig,
    pub(crate) layout: Layout,
    pub(crate) executable: Executable,
}

impl Catalog {
    /// Validates `config` and creates the directory if it does not exist yet.
    pub fn open(config: CatalogConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.directory).map_err(|err| Error::fs(&config.directory, err))?;
        let executable = Executable::parse(&config.executable)?;
        let layout = Layout::new(config.directory.clone(), config.filetype.clone());
        tracing::debug!(
            directory = %config.directory.display(),
            filetype = %config.filetype,
            program = %executable.program().display(),
            "catalog opened"
        );
        Ok(Self {
            config,
            layout,
            executable,
        })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn directory(&self) -> &Path {
        self.layout.directory()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn fingerprint(&self, params: &ParamSet) -> Result<Fingerprint> {
        Fingerprint::of(params)
    }

    /// Input path for `(params, index)`; does not check existence.
    pub fn input_path(&self, params: &ParamSet, index: u32) -> Result<PathBuf> {
        Ok(self.layout.input_path(&Fingerprint::of(params)?, index))
    }

    /// Output path for `(params, index)`; does not check existence.
    pub fn output_path(&self, params: &ParamSet, index: u32) -> Result<PathBuf> {
        Ok(self.layout.output_path(&Fingerprint::of(params)?, index))
    }

    pub fn exists(&self, params: &ParamSet, index: u32) -> Result<bool> {
        Ok(self.output_path(params, index)?.is_file())
    }

    /// The output path if the output exists. Absence is `Ok(None)`, not an error.
    pub fn select(&self, params: &ParamSet, index: u32) -> Result<Option<PathBuf>> {
        let output = self.output_path(params, index)?;
        Ok(output.is_file().then_some(output))
    }

    /// Like [`Catalog::select`] but absence is [`Error::NotFound`].
    pub fn outfile(&self, params: &ParamSet, index: u32) -> Result<PathBuf> {
        let fingerprint = Fingerprint::of(params)?;
        let output = self.layout.output_path(&fingerprint, index);
        if output.is_file() {
            Ok(output)
        } else {
            Err(Error::NotFound {
                fingerprint: fingerprint.to_string(),
                index,
            })
        }
    }

    /// Number of contiguous outputs starting at index 0; stops at the first gap.
    pub fn count(&self, params: &ParamSet) -> Result<u32> {
        let fingerprint = Fingerprint::of(params)?;
        Ok(self.chain_length(&fingerprint))
    }

    pub(crate) fn chain_length(&self, fingerprint: &Fingerprint) -> u32 {
        let mut index = 0;
        while self.layout.output_path(fingerprint, index).is_file() {
            index += 1;
        }
        index
    }

    /// Removes the input/output pair at `index`, or every pair of the
    /// fingerprint when `index` is `None`. Missing files are not errors.
    pub fn delete(&self, params: &ParamSet, index: Option<u32>) -> Result<()> {
        let fingerprint = Fingerprint::of(params)?;
        match index {
            Some(index) => self.delete_pair(&fingerprint, index),
            None => {
                let mut indices = self.indices_on_disk(&fingerprint)?;
                indices.sort_unstable();
                indices.dedup();
                for index in indices {
                    self.delete_pair(&fingerprint, index)?;
                }
                Ok(())
            }
        }
    }

    // Also drops a claim file left behind by a run that died.
    fn delete_pair(&self, fingerprint: &Fingerprint, index: u32) -> Result<()> {
        let output = remove_if_exists(&self.layout.output_path(fingerprint, index))?;
        let input = remove_if_exists(&self.layout.input_path(fingerprint, index))?;
        let claim = remove_if_exists(&self.layout.lock_path(fingerprint, index))?;
        if claim {
            tracing::warn!(fingerprint = fingerprint.short(), index, "removed stale run claim");
        }
        if output || input {
            tracing::info!(fingerprint = fingerprint.short(), index, "deleted simulation");
        }
        Ok(())
    }

    // Claim files count too, so a run that died before writing its input
    // still gets cleaned up.
    fn indices_on_disk(&self, fingerprint: &Fingerprint) -> Result<Vec<u32>> {
        let directory = self.layout.directory();
        let mut indices = Vec::new();
        for entry in fs::read_dir(directory).map_err(|err| Error::fs(directory, err))? {
            let entry = entry.map_err(|err| Error::fs(directory, err))?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let file = self
                .layout
                .parse(&name)
                .or_else(|| self.layout.parse_claim(&name));
            if let Some(file) = file.filter(|file| file.fingerprint == *fingerprint) {
                indices.push(file.index);
            }
        }
        Ok(indices)
    }

    /// Removes the directory with everything in it and returns a handle on a
    /// freshly created, empty directory with the same configuration.
    pub fn delete_all(self) -> Result<Catalog> {
        let directory = self.config.directory.clone();
        match fs::remove_dir_all(&directory) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(Error::fs(&directory, err)),
        }
        tracing::info!(directory = %directory.display(), "deleted catalog directory");
        Catalog::open(self.config)
    }
}
