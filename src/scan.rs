//! Catalog reconstruction from the directory listing.
//!
//! There is no index file. Every call lists the directory, keeps names that
//! follow the layout convention, and decodes inputs back into parameter sets.
//! An input is trusted only if re-encoding it reproduces the fingerprint in its
//! name; anything else is reported as inconsistent and left out of the table.
use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::fingerprint::{canonical_bytes, Fingerprint};
use crate::layout::{CatalogFile, FileKind};
use crate::params::ParamSet;
use crate::util::display_path;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything the directory says about one fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub fingerprint: Fingerprint,
    pub params: ParamSet,
    /// Indices with an input file present.
    pub inputs: BTreeSet<u32>,
    /// Indices with an output file present.
    pub outputs: BTreeSet<u32>,
}

/// One materialized input/output pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub fingerprint: Fingerprint,
    pub n: u32,
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Default)]
pub struct Scan {
    pub entries: Vec<CatalogEntry>,
    /// Input-convention files that failed to decode or to round-trip.
    pub inconsistent: Vec<PathBuf>,
}

struct Pending {
    params: Option<ParamSet>,
    inputs: BTreeSet<u32>,
    outputs: BTreeSet<u32>,
}

impl Catalog {
    pub(crate) fn list_catalog_files(&self) -> Result<Vec<(PathBuf, CatalogFile)>> {
        let directory = self.layout.directory();
        let mut files = Vec::new();
        for entry in fs::read_dir(directory).map_err(|err| Error::fs(directory, err))? {
            let entry = entry.map_err(|err| Error::fs(directory, err))?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if let Some(file) = self.layout.parse(&name) {
                files.push((entry.path(), file));
            }
        }
        Ok(files)
    }

    /// Rebuilds the full catalog view from disk.
    pub fn scan(&self) -> Result<Scan> {
        let mut pending: BTreeMap<Fingerprint, Pending> = BTreeMap::new();
        let mut inconsistent = Vec::new();
        for (path, file) in self.list_catalog_files()? {
            let slot = pending
                .entry(file.fingerprint.clone())
                .or_insert_with(|| Pending {
                    params: None,
                    inputs: BTreeSet::new(),
                    outputs: BTreeSet::new(),
                });
            match file.kind {
                FileKind::Output => {
                    slot.outputs.insert(file.index);
                }
                FileKind::Input => match verify_input(&path, &file.fingerprint) {
                    Ok(params) => {
                        slot.inputs.insert(file.index);
                        slot.params.get_or_insert(params);
                    }
                    Err(reason) => {
                        tracing::warn!(
                            file = %display_path(&path, Some(self.directory())),
                            %reason,
                            "skipping inconsistent input file"
                        );
                        inconsistent.push(path);
                    }
                },
            }
        }
        inconsistent.sort();
        let entries = pending
            .into_iter()
            .filter_map(|(fingerprint, slot)| {
                let params = slot.params?;
                Some(CatalogEntry {
                    fingerprint,
                    params,
                    inputs: slot.inputs,
                    outputs: slot.outputs,
                })
            })
            .collect::<Vec<_>>();
        tracing::debug!(
            entries = entries.len(),
            inconsistent = inconsistent.len(),
            "catalog scanned"
        );
        Ok(Scan {
            entries,
            inconsistent,
        })
    }

    /// One parameter set per fingerprint with at least one valid input file.
    ///
    /// Ordering is not part of the contract; filter the result in memory.
    pub fn table(&self) -> Result<Vec<ParamSet>> {
        Ok(self
            .scan()?
            .entries
            .into_iter()
            .map(|entry| entry.params)
            .collect())
    }

    /// Every materialized pair, for `n` in `0..count(params)` of each tabled
    /// parameter set, sorted by fingerprint and index.
    pub fn files(&self) -> Result<Vec<FileEntry>> {
        let mut files = Vec::new();
        for entry in self.scan()?.entries {
            for n in 0..self.chain_length(&entry.fingerprint) {
                files.push(FileEntry {
                    input: self.layout.input_path(&entry.fingerprint, n),
                    output: self.layout.output_path(&entry.fingerprint, n),
                    fingerprint: entry.fingerprint.clone(),
                    n,
                });
            }
        }
        Ok(files)
    }
}

fn verify_input(path: &Path, expected: &Fingerprint) -> std::result::Result<ParamSet, String> {
    let bytes = fs::read(path).map_err(|err| format!("read failed: {err}"))?;
    let params = ParamSet::from_json_slice(&bytes).map_err(|err| err.to_string())?;
    let canonical = canonical_bytes(&params).map_err(|err| err.to_string())?;
    let actual = Fingerprint::of_canonical(&canonical);
    if actual != *expected {
        return Err(format!("content fingerprint is {}", actual.short()));
    }
    Ok(params)
}
