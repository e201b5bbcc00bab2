use std::io;
use std::path::Path;
use serde::{Deserialize, Deserializer, Serialize};
use crate::error::{LvlupError, Result};
use crate::inventory::list_installed;
use crate::util::tool_name;

/// Represents the contents of a `lvlup.yaml` file.
///
/// ```yaml
/// tools:
///   - kubectl
///   - helm
/// ```
///
/// The list is ordered and never holds duplicates or blank names. Loading
/// normalizes the file and [`Manifest::add`] refuses duplicates, so the
/// in-memory value always upholds that.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Declared tool names, in declaration order.
    #[serde(default, deserialize_with = "null_as_empty")]
    tools: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Manifest {
    /// Creates a manifest from a list of names, normalizing it.
    pub fn new<I, S>(tools: I) -> Manifest
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut manifest = Manifest::default();
        for tool in tools {
            if let Some(name) = tool_name(tool.as_ref()) {
                manifest.add(&name);
            }
        }
        manifest
    }
    /// Loads a `Manifest` from a file path.
    ///
    /// An empty file is an empty manifest. Blank and duplicate entries are dropped.
    ///
    /// # Errors
    /// [`LvlupError::ManifestNotFound`] if the file does not exist,
    /// [`LvlupError::ConfigIo`] if it can't be read and
    /// [`LvlupError::ManifestFormat`] if it isn't valid YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Manifest> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                LvlupError::ManifestNotFound { path: path.to_path_buf() }
            } else {
                LvlupError::config_io(path, e)
            }
        })?;
        if content.trim().is_empty() {
            log::debug!("Manifest {} is empty", path.display());
            return Ok(Manifest::default());
        }
        let raw: Manifest = serde_yaml::from_str(&content).map_err(|source| {
            LvlupError::ManifestFormat { path: path.to_path_buf(), source }
        })?;
        let manifest = Manifest::new(&raw.tools);
        if manifest.len() != raw.tools.len() {
            log::warn!(
                "Dropped {} blank, invalid or duplicate entries from {}",
                raw.tools.len() - manifest.len(),
                path.display()
            );
        }
        log::debug!("Loaded {} tools from {}", manifest.len(), path.display());
        Ok(manifest)
    }
    /// Saves the `Manifest` to the given path, overwriting it.
    ///
    /// The parent directory is created if needed.
    ///
    /// # Errors
    /// Returns an error if the file can't be written or serialization fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).map_err(|source| {
            LvlupError::ManifestFormat { path: path.to_path_buf(), source }
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LvlupError::config_io(parent, e))?;
        }
        std::fs::write(path, yaml).map_err(|e| LvlupError::config_io(path, e))?;
        log::debug!("Saved {} tools to {}", self.len(), path.display());
        Ok(())
    }
    /// Loads the manifest, or creates it from the tools already installed.
    ///
    /// On first run there is no manifest yet. Rather than treating every
    /// pre-existing binary as extraneous, the installed set is adopted as the
    /// initial declaration and written to `path`.
    ///
    /// Returns the manifest and whether it was just initialized.
    pub fn load_or_init<P, B>(path: P, bin_dir: B) -> Result<(Manifest, bool)>
    where
        P: AsRef<Path>,
        B: AsRef<Path>,
    {
        let path = path.as_ref();
        if path.exists() {
            return Ok((Manifest::load(path)?, false));
        }
        let installed = list_installed(bin_dir)?;
        let manifest = Manifest::new(&installed);
        manifest.save(path)?;
        log::info!("Initialized {} with {} tools", path.display(), manifest.len());
        Ok((manifest, true))
    }
    /// Appends a tool if it is not declared yet.
    ///
    /// Returns `true` if the manifest changed.
    pub fn add(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.tools.push(name.to_string());
        true
    }
    /// Removes the first occurrence of a tool.
    ///
    /// Returns `true` if the manifest changed. If the tool is not declared, nothing happens.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.tools.iter().position(|t| t == name) {
            Some(index) => {
                self.tools.remove(index);
                true
            }
            None => false,
        }
    }
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t == name)
    }
    /// Declared tools in declaration order.
    pub fn tools(&self) -> &[String] {
        &self.tools
    }
    pub fn len(&self) -> usize {
        self.tools.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lvlup.yaml");
        let manifest = Manifest::new(["kubectl", "helm", "k9s"]);
        manifest.save(&path).unwrap();

        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.tools(), ["kubectl", "helm", "k9s"]);
    }

    #[test]
    fn test_saved_file_uses_tools_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lvlup.yaml");
        Manifest::new(["jq"]).save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("tools:"));
        assert!(content.contains("- jq"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = Manifest::load(dir.path().join("lvlup.yaml")).unwrap_err();
        assert!(matches!(err, LvlupError::ManifestNotFound { .. }));
    }

    #[test]
    fn test_load_empty_and_null_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lvlup.yaml");

        fs::write(&path, "").unwrap();
        assert!(Manifest::load(&path).unwrap().is_empty());

        fs::write(&path, "tools:\n").unwrap();
        assert!(Manifest::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_normalizes_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lvlup.yaml");
        fs::write(&path, "tools:\n  - ' helm '\n  - ''\n  - kubectl\n  - helm\n").unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.tools(), ["helm", "kubectl"]);
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lvlup.yaml");
        fs::write(&path, "tools: [unclosed").unwrap();

        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(err, LvlupError::ManifestFormat { .. }));
    }

    #[test]
    fn test_add_is_duplicate_free() {
        let mut manifest = Manifest::default();
        assert!(manifest.add("helm"));
        assert!(!manifest.add("helm"));
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_remove_first_occurrence() {
        let mut manifest = Manifest::new(["a", "b", "c"]);
        assert!(manifest.remove("b"));
        assert!(!manifest.remove("b"));
        assert_eq!(manifest.tools(), ["a", "c"]);
    }

    #[test]
    fn test_load_or_init_seeds_from_bin_dir() {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir(&bin).unwrap();
        fs::write(bin.join("y"), b"bin").unwrap();
        fs::write(bin.join("x"), b"bin").unwrap();
        let path = dir.path().join("lvlup.yaml");

        let (manifest, initialized) = Manifest::load_or_init(&path, &bin).unwrap();
        assert!(initialized);
        assert_eq!(manifest.tools(), ["x", "y"]);
        assert_eq!(Manifest::load(&path).unwrap(), manifest);
    }

    #[test]
    fn test_load_or_init_keeps_existing_manifest() {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir(&bin).unwrap();
        fs::write(bin.join("x"), b"bin").unwrap();
        let path = dir.path().join("lvlup.yaml");
        Manifest::new(["helm"]).save(&path).unwrap();

        let (manifest, initialized) = Manifest::load_or_init(&path, &bin).unwrap();
        assert!(!initialized);
        assert_eq!(manifest.tools(), ["helm"]);
    }
}
