use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{AssemblyError, AssemblyResult};

/// An external all-vs-all aligner producing SAM on its stdout.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignerCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl AlignerCommand {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        AlignerCommand {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// minimap2 aligning every fragment against every other one, with
    /// SAM output.
    pub fn minimap2<P: AsRef<Path>>(fragments: P) -> Self {
        let fragments = fragments.as_ref();
        Self::new("minimap2")
            .args(&["-a", "-x", "ava-ont"])
            .arg(fragments)
            .arg(fragments)
    }

    /// Runs the aligner to completion and returns its stdout.
    pub fn run(&self) -> AssemblyResult<Vec<u8>> {
        log::info!(
            "Running {} {}",
            self.program.to_string_lossy(),
            self.args
                .iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(AssemblyError::Aligner {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        log::debug!("Aligner produced {} bytes of SAM", output.stdout.len());
        Ok(output.stdout)
    }
}
