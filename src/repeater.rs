//! A single reusable input/output pair, for runs whose results need not be kept.
//!
//! Every `run` overwrites the same two files; nothing is content-addressed and
//! nothing is skipped.
use crate::error::Result;
use crate::exec::Executable;
use crate::fingerprint::canonical_bytes;
use crate::params::ParamSet;
use crate::util::{remove_if_exists, write_atomic};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Repeater {
    executable: Executable,
    input: PathBuf,
    output: PathBuf,
}

impl Repeater {
    pub fn new(
        executable: &str,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            executable: Executable::parse(executable)?,
            input: input.into(),
            output: output.into(),
        })
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Writes `params` to the input file and runs `executable input output`.
    pub fn run(&self, params: &ParamSet) -> Result<&Path> {
        write_atomic(&self.input, &canonical_bytes(params)?)?;
        tracing::info!(input = %self.input.display(), "running repeater");
        self.executable.produce(&self.input, &self.output, None)?;
        Ok(&self.output)
    }

    /// Removes both files; missing files are fine.
    pub fn clean(&self) -> Result<()> {
        remove_if_exists(&self.input)?;
        remove_if_exists(&self.output)?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn run_overwrites_the_same_pair() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repeater = Repeater::new(
            "sh -c 'cp \"$1\" \"$2\"' sim",
            dir.path().join("temp.json"),
            dir.path().join("temp.out"),
        )
        .expect("repeater");

        let first = ParamSet::new().with("n", 1);
        let second = ParamSet::new().with("n", 2);
        repeater.run(&first).expect("first run");
        let output = repeater.run(&second).expect("second run").to_path_buf();
        let content = std::fs::read(&output).expect("read output");
        assert_eq!(ParamSet::from_json_slice(&content).unwrap(), second);

        repeater.clean().expect("clean");
        assert!(!repeater.input().exists());
        assert!(!output.exists());
        repeater.clean().expect("clean twice");
    }

    #[test]
    fn failures_surface_with_exit_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repeater = Repeater::new(
            "sh -c 'exit 7' sim",
            dir.path().join("temp.json"),
            dir.path().join("temp.out"),
        )
        .expect("repeater");
        assert!(matches!(
            repeater.run(&ParamSet::new()),
            Err(Error::Execution { code: Some(7), .. })
        ));
        assert!(repeater.input().is_file());
    }
}
