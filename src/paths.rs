use std::path::{Path, PathBuf};
use directories::BaseDirs;
use crate::error::{LvlupError, Result};

/// Name of the arkade directory inside the user's home.
pub const ARKADE_DIR: &str = ".arkade";
/// File name of the manifest inside the arkade directory.
pub const MANIFEST_FILE: &str = "lvlup.yaml";

/// Fixed filesystem layout used by `arkade-lvlup`.
///
/// ```text
/// ~/.arkade/             config dir
/// ~/.arkade/lvlup.yaml   manifest
/// ~/.arkade/bin/         binaries fetched by arkade
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LvlupPaths {
    /// The `.arkade` directory.
    pub config_dir: PathBuf,
    /// The `.arkade/bin` directory arkade installs into.
    pub bin_dir: PathBuf,
    /// The `.arkade/lvlup.yaml` manifest.
    pub manifest: PathBuf,
}

impl LvlupPaths {
    /// Resolves the layout from the invoking user's home directory.
    ///
    /// # Errors
    /// Returns [`LvlupError::HomeDirUnavailable`] if no home directory can be found.
    pub fn resolve() -> Result<Self> {
        let base = BaseDirs::new().ok_or(LvlupError::HomeDirUnavailable)?;
        Ok(Self::from_home(base.home_dir()))
    }

    /// Builds the layout under an arbitrary home directory.
    pub fn from_home<P: AsRef<Path>>(home: P) -> Self {
        let config_dir = home.as_ref().join(ARKADE_DIR);
        Self {
            bin_dir: config_dir.join("bin"),
            manifest: config_dir.join(MANIFEST_FILE),
            config_dir,
        }
    }

    /// Ensures the config and bin directories exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)
            .map_err(|e| LvlupError::config_io(&self.config_dir, e))?;
        std::fs::create_dir_all(&self.bin_dir)
            .map_err(|e| LvlupError::directory_io(&self.bin_dir, e))?;
        log::debug!("Using arkade directory {}", self.config_dir.display());
        Ok(())
    }
}
