use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};

/// Shells `config-shell` knows the rc file of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    Zsh,
    Bash,
}

impl ShellKind {
    /// Detects the shell from the value of `$SHELL`.
    ///
    /// # Errors
    /// Returns an error for any shell other than zsh or bash.
    pub fn detect(shell_env: &str) -> Result<ShellKind> {
        if shell_env.contains("zsh") {
            Ok(ShellKind::Zsh)
        } else if shell_env.contains("bash") {
            Ok(ShellKind::Bash)
        } else {
            bail!("Unsupported shell: '{}'. Only zsh and bash are supported.", shell_env)
        }
    }

    /// File name of the rc file inside the home directory.
    pub fn rc_file(&self) -> &'static str {
        match self {
            ShellKind::Zsh => ".zshrc",
            ShellKind::Bash => ".bashrc",
        }
    }
}

/// Renders the block that puts the arkade bin directory and the directory
/// holding `arkade-lvlup` on the `PATH`.
///
/// Paths below `home` are written relative to `$HOME` so the block survives a
/// changed home mount point.
pub fn path_block(home: &Path, bin_dir: &Path, exe_dir: &Path) -> String {
    let bin = home_relative(home, bin_dir);
    let exe = home_relative(home, exe_dir);
    format!(
        r#"# Check for arkade and arkade-lvlup
if command -v arkade &> /dev/null; then
    export PATH="{bin}:$PATH"
    if [[ -f "{exe}/arkade-lvlup" ]]; then
        export PATH="{exe}:$PATH"
    fi
fi"#
    )
}

fn home_relative(home: &Path, path: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rel) if rel.as_os_str().is_empty() => "$HOME".to_string(),
        Ok(rel) => format!("$HOME/{}", rel.display()),
        Err(_) => path.display().to_string(),
    }
}

/// The state of the user's rc file with respect to the PATH block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSetup {
    pub rc_path: PathBuf,
    pub block: String,
    /// The rc file already contains the block.
    pub configured: bool,
}

impl ShellSetup {
    /// Reads the rc file of `kind` under `home` and checks for `block`.
    ///
    /// A missing rc file counts as not configured. The file is never written.
    pub fn inspect(home: &Path, kind: ShellKind, block: String) -> Result<ShellSetup> {
        let rc_path = home.join(kind.rc_file());
        let configured = if rc_path.exists() {
            let content = std::fs::read_to_string(&rc_path)
                .with_context(|| format!("Could not read {}", rc_path.display()))?;
            content.contains(&block)
        } else {
            false
        };
        Ok(ShellSetup { rc_path, block, configured })
    }
}
