//! Invocation of the external executable.
//!
//! Contract: `executable <input> <output> [<previous-output>]`, exit code 0 on
//! success, and `<output>` must exist afterwards.
use crate::error::{Error, Result};
use crate::util::truncate_bytes;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;

/// Bytes of stderr kept on an execution error.
pub const MAX_STDERR_BYTES: usize = 4096;

/// A resolved program plus any leading arguments from the configured command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executable {
    program: PathBuf,
    leading_args: Vec<String>,
}

pub struct Invocation {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub elapsed_ms: u128,
}

impl Executable {
    /// Accepts an existing file path as-is, otherwise splits the command with
    /// shell quoting rules and resolves a bare program name through `PATH`.
    pub fn parse(command: &str) -> Result<Self> {
        if Path::new(command).is_file() {
            return Ok(Self {
                program: PathBuf::from(command),
                leading_args: Vec::new(),
            });
        }
        let mut words = shell_words::split(command)
            .map_err(|err| Error::Config(format!("executable '{command}': {err}")))?
            .into_iter();
        let program = words
            .next()
            .ok_or_else(|| Error::Config("executable must not be empty".to_string()))?;
        Ok(Self {
            program: resolve_program(&program),
            leading_args: words.collect(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn leading_args(&self) -> &[String] {
        &self.leading_args
    }

    pub fn run(&self, args: &[&Path]) -> Result<Invocation> {
        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| Error::fs(&self.program, err))?;
        let elapsed_ms = start.elapsed().as_millis();
        tracing::debug!(
            program = %self.program.display(),
            elapsed_ms,
            code = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "executable finished"
        );
        Ok(Invocation {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
            elapsed_ms,
        })
    }

    /// Runs `input output [previous]` and enforces the output contract.
    ///
    /// A non-zero exit removes any partial `output`; the input is left alone.
    pub fn produce(&self, input: &Path, output: &Path, previous: Option<&Path>) -> Result<()> {
        let mut args = vec![input, output];
        args.extend(previous);
        let invocation = self.run(&args)?;
        if !invocation.stdout.is_empty() {
            tracing::debug!(
                stdout = %String::from_utf8_lossy(&invocation.stdout).trim_end(),
                "executable stdout"
            );
        }
        if !invocation.status.success() {
            let stderr = truncate_bytes(&invocation.stderr, MAX_STDERR_BYTES);
            tracing::warn!(
                code = ?invocation.status.code(),
                stderr = %stderr.trim_end(),
                "executable failed"
            );
            crate::util::remove_if_exists(output)?;
            return Err(Error::Execution {
                code: invocation.status.code(),
                stderr: stderr.trim_end().to_string(),
            });
        }
        if !output.is_file() {
            return Err(Error::ExecutionFailure {
                output: output.to_path_buf(),
            });
        }
        Ok(())
    }
}

fn resolve_program(program: &str) -> PathBuf {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.to_path_buf();
    }
    which::which(program).unwrap_or_else(|_| path.to_path_buf())
}
