//! Content-addressed catalog of simulation inputs and outputs.
//!
//! A parameter set is canonically encoded and hashed; the hash names an input
//! file holding the encoding and the output file an external executable
//! produces from it. The directory is the only state: every query lists it
//! again.
//!
//! ```no_run
//! use simdb::{Catalog, CatalogConfig, ParamSet};
//!
//! let catalog = Catalog::open(CatalogConfig::new("./data", "nc", "./execute.sh"))?;
//! let params = ParamSet::new().with("n", 3).with("Nx", 20);
//! let first = catalog.create(&params, 0)?;
//! let restart = catalog.create(&params, 1)?;
//! assert_eq!(catalog.count(&params)?, 2);
//! # let _ = (first, restart);
//! # Ok::<(), simdb::Error>(())
//! ```
mod catalog;
mod config;
mod create;
mod error;
mod exec;
mod fingerprint;
mod layout;
mod params;
mod repeater;
mod scan;
mod util;

pub use catalog::Catalog;
pub use config::CatalogConfig;
pub use error::{Error, Result};
pub use exec::{Executable, Invocation, MAX_STDERR_BYTES};
pub use fingerprint::{canonical_bytes, Fingerprint, FINGERPRINT_LEN};
pub use layout::{CatalogFile, FileKind, Layout, INPUT_EXTENSION};
pub use params::{ParamSet, ParamValue};
pub use repeater::Repeater;
pub use scan::{CatalogEntry, FileEntry, Scan};
