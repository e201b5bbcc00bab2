use std::process::{Command, Stdio};
use crate::error::{LvlupError, Result};

/// Program invoked to fetch tools.
pub const ARKADE: &str = "arkade";

/// Something that can materialize a tool's binary in the bin directory.
///
/// Installing is fetch-only: removal never goes through the installer, the
/// reconciler deletes binaries itself.
pub trait PackageInstaller {
    /// Installs (or re-installs) `tool`.
    ///
    /// With `show_output` the installer's own output is streamed to the terminal.
    ///
    /// # Errors
    /// Returns [`LvlupError::InstallFailure`] if the tool could not be installed.
    fn install(&self, tool: &str, show_output: bool) -> Result<()>;
}

impl<T: PackageInstaller + ?Sized> PackageInstaller for &T {
    fn install(&self, tool: &str, show_output: bool) -> Result<()> {
        (**self).install(tool, show_output)
    }
}

/// Installs tools by running `arkade get <tool>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArkadeInstaller {
    program: String,
}

impl Default for ArkadeInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl ArkadeInstaller {
    pub fn new() -> Self {
        Self::with_program(ARKADE)
    }

    /// Uses a different executable in place of `arkade`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

impl PackageInstaller for ArkadeInstaller {
    fn install(&self, tool: &str, show_output: bool) -> Result<()> {
        log::debug!("Running {} get {}", self.program, tool);
        let mut command = Command::new(&self.program);
        command.args(["get", tool]).stdin(Stdio::null());
        let not_started = |e: std::io::Error| {
            LvlupError::install_failure(tool, format!("could not run {}: {}", self.program, e))
        };

        if show_output {
            let status = command
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .map_err(not_started)?;
            if !status.success() {
                let reason = format!("{} exited with {}", self.program, status);
                return Err(LvlupError::install_failure(tool, reason));
            }
            return Ok(());
        }

        let output = command.output().map_err(not_started)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => format!("{} exited with {}", self.program, output.status),
                stderr => stderr.to_string(),
            };
            return Err(LvlupError::install_failure(tool, reason));
        }
        Ok(())
    }
}
