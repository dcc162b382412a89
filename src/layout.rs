//! File naming convention inside a catalog directory.
//!
//! ```text
//! <fp>.json            input, n = 0
//! <fp>_<n>.json        input, n > 0
//! <fp>.<filetype>      output, n = 0
//! <fp>_<n>.<filetype>  output, n > 0
//! ```
//! With `filetype == "json"` outputs end in `_out.json` instead so they never
//! collide with inputs.
use crate::fingerprint::Fingerprint;
use std::path::{Path, PathBuf};

pub const INPUT_EXTENSION: &str = "json";
const JSON_OUTPUT_SUFFIX: &str = "_out";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Input,
    Output,
}

/// A file name recognised as part of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFile {
    pub fingerprint: Fingerprint,
    pub index: u32,
    pub kind: FileKind,
}

#[derive(Debug, Clone)]
pub struct Layout {
    directory: PathBuf,
    filetype: String,
}

impl Layout {
    pub fn new(directory: impl Into<PathBuf>, filetype: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            filetype: filetype.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn filetype(&self) -> &str {
        &self.filetype
    }

    pub fn input_path(&self, fingerprint: &Fingerprint, index: u32) -> PathBuf {
        self.directory
            .join(format!("{}.{INPUT_EXTENSION}", stem(fingerprint, index)))
    }

    pub fn output_path(&self, fingerprint: &Fingerprint, index: u32) -> PathBuf {
        self.directory.join(self.output_name(fingerprint, index))
    }

    /// Claim file held while the executable produces `output_path(fingerprint, index)`.
    pub fn lock_path(&self, fingerprint: &Fingerprint, index: u32) -> PathBuf {
        self.directory
            .join(format!(".{}.lock", self.output_name(fingerprint, index)))
    }

    fn output_name(&self, fingerprint: &Fingerprint, index: u32) -> String {
        let stem = stem(fingerprint, index);
        if self.outputs_are_json() {
            format!("{stem}{JSON_OUTPUT_SUFFIX}.{INPUT_EXTENSION}")
        } else {
            format!("{stem}.{}", self.filetype)
        }
    }

    fn outputs_are_json(&self) -> bool {
        self.filetype == INPUT_EXTENSION
    }

    /// Classifies a bare file name; anything off-convention yields `None`.
    pub fn parse(&self, file_name: &str) -> Option<CatalogFile> {
        let (stem, extension) = file_name.rsplit_once('.')?;
        let (stem, kind) = if self.outputs_are_json() {
            if extension != INPUT_EXTENSION {
                return None;
            }
            match stem.strip_suffix(JSON_OUTPUT_SUFFIX) {
                Some(stem) => (stem, FileKind::Output),
                None => (stem, FileKind::Input),
            }
        } else if extension == INPUT_EXTENSION {
            (stem, FileKind::Input)
        } else if extension == self.filetype {
            (stem, FileKind::Output)
        } else {
            return None;
        };
        let (fingerprint, index) = parse_stem(stem)?;
        Some(CatalogFile {
            fingerprint,
            index,
            kind,
        })
    }

    /// Classifies a claim file name; yields the output it guards.
    pub fn parse_claim(&self, file_name: &str) -> Option<CatalogFile> {
        let output = file_name.strip_prefix('.')?.strip_suffix(".lock")?;
        self.parse(output)
            .filter(|file| file.kind == FileKind::Output)
    }
}

fn stem(fingerprint: &Fingerprint, index: u32) -> String {
    if index == 0 {
        fingerprint.to_string()
    } else {
        format!("{fingerprint}_{index}")
    }
}

fn parse_stem(stem: &str) -> Option<(Fingerprint, u32)> {
    match stem.split_once('_') {
        None => Some((Fingerprint::parse(stem)?, 0)),
        Some((fp, index)) => {
            // `_0` and leading zeros would alias the canonical name.
            if index.is_empty()
                || index.starts_with('0')
                || !index.bytes().all(|byte| byte.is_ascii_digit())
            {
                return None;
            }
            Some((Fingerprint::parse(fp)?, index.parse().ok()?))
        }
    }
}
