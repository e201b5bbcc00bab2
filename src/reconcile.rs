//! Reconciliation of the manifest (intent) with the bin directory (reality).
//!
//! The manifest is always the declarative intent and the installed set is
//! always the observed reality. Every operation here either moves reality
//! toward intent (install missing tools, optionally prune extras) or changes
//! intent because the user explicitly asked for it (`get` adds, `remove`
//! deletes). Nothing here edits the manifest to match reality; seeding the
//! manifest from the bin directory only happens in
//! [`Manifest::load_or_init`](crate::manifest::Manifest::load_or_init).
//!
//! The manifest is read once when the [`Reconciler`] is built and kept in
//! memory. Every confirmed change is written back immediately, before any
//! installer call that follows it, so an interrupted batch never loses a
//! declaration that was already reported.

use std::path::PathBuf;
use crate::error::{LvlupError, Result};
use crate::installer::PackageInstaller;
use crate::inventory::{is_installed, list_installed, remove_binary};
use crate::manifest::Manifest;
use crate::paths::LvlupPaths;
use crate::util::tool_name;

/// An operation requested by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Declare and install tools. `force` re-installs tools already present.
    Get { tools: Vec<String>, force: bool },
    /// Undeclare tools and delete their binaries.
    Remove { tools: Vec<String> },
    /// Converge the bin directory with the manifest.
    ///
    /// Without `force`, missing tools are installed and nothing else changes.
    /// With `force`, extraneous binaries are pruned and every declared tool is re-installed.
    Sync { force: bool },
    /// Report the differences between the manifest and the bin directory.
    Status,
}

/// Options that apply to every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Stream the installer's output to the terminal.
    pub show_output: bool,
}

/// What happened to a single tool during an install pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStatus {
    /// The installer ran and succeeded.
    Installed,
    /// The binary was already present and the install was not forced.
    AlreadyInstalled,
    /// The installer failed; the batch continued.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub tool: String,
    /// The tool was appended to the manifest by this call.
    pub added: bool,
    pub status: InstallStatus,
}

impl InstallOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, InstallStatus::Failed(_))
    }
}

/// What happened to a binary when it was deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryRemoval {
    Deleted,
    /// There was nothing to delete.
    Absent,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub tool: String,
    /// The tool was removed from the manifest by this call.
    pub undeclared: bool,
    pub binary: BinaryRemoval,
}

impl RemoveOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.binary, BinaryRemoval::Failed(_))
    }
}

/// Result of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Whether this was a forced sync.
    pub forced: bool,
    /// Extraneous binaries found during a forced sync.
    pub pruned: Vec<RemoveOutcome>,
    pub installs: Vec<InstallOutcome>,
}

impl SyncSummary {
    /// Number of tools whose install or prune failed.
    pub fn failures(&self) -> usize {
        self.pruned.iter().filter(|p| p.is_failure()).count()
            + self.installs.iter().filter(|i| i.is_failure()).count()
    }

    /// Nothing had to be installed or pruned, and nothing failed.
    pub fn was_in_sync(&self) -> bool {
        self.pruned.is_empty()
            && self.installs.iter().all(|i| i.status == InstallStatus::AlreadyInstalled)
    }
}

/// Read-only comparison of the manifest with the bin directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// Declared in the manifest but missing from the bin directory, in manifest order.
    pub declared_not_installed: Vec<String>,
    /// Present in the bin directory but not declared, sorted.
    pub installed_not_declared: Vec<String>,
    /// Every declared tool, in manifest order.
    pub managed: Vec<String>,
}

impl StatusReport {
    pub fn is_in_sync(&self) -> bool {
        self.declared_not_installed.is_empty() && self.installed_not_declared.is_empty()
    }
}

/// Structured result of [`Reconciler::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Install(Vec<InstallOutcome>),
    Remove(Vec<RemoveOutcome>),
    Sync(SyncSummary),
    Status(StatusReport),
}

/// Drives the bin directory toward the manifest.
pub struct Reconciler<I> {
    manifest: Manifest,
    manifest_path: PathBuf,
    bin_dir: PathBuf,
    installer: I,
}

impl<I: PackageInstaller> Reconciler<I> {
    /// Creates a reconciler working on an already loaded manifest.
    pub fn new(paths: &LvlupPaths, manifest: Manifest, installer: I) -> Self {
        Self {
            manifest,
            manifest_path: paths.manifest.clone(),
            bin_dir: paths.bin_dir.clone(),
            installer,
        }
    }

    /// Runs a request and returns what happened.
    pub fn handle(&mut self, request: &Request, options: Options) -> Result<Report> {
        match request {
            Request::Get { tools, force } => self
                .install_tools(tools, *force, options.show_output)
                .map(Report::Install),
            Request::Remove { tools } => self.remove_tools(tools).map(Report::Remove),
            Request::Sync { force: true } => {
                self.sync_forcefully(options.show_output).map(Report::Sync)
            }
            Request::Sync { force: false } => {
                self.sync_idempotent(options.show_output).map(Report::Sync)
            }
            Request::Status => self.report_status().map(Report::Status),
        }
    }

    /// Declares and installs tools, one at a time, in the given order.
    ///
    /// A tool missing from the manifest is appended and the manifest is saved
    /// before the installer runs. Unless `force` is set, tools whose binary is
    /// already present are not installed again. A failing install is recorded
    /// and the next tool is processed.
    ///
    /// # Errors
    /// Only fatal errors are returned, i.e. the manifest could not be saved.
    pub fn install_tools<S: AsRef<str>>(
        &mut self,
        names: &[S],
        force: bool,
        show_output: bool,
    ) -> Result<Vec<InstallOutcome>> {
        let mut outcomes = Vec::with_capacity(names.len());
        for raw in names {
            let Some(tool) = tool_name(raw.as_ref()) else {
                continue;
            };

            let added = self.manifest.add(&tool);
            if added {
                self.persist()?;
                log::info!("Declared {}", tool);
            }

            if !force && is_installed(&self.bin_dir, &tool) {
                log::info!("{} is already installed, skipping", tool);
                let status = InstallStatus::AlreadyInstalled;
                outcomes.push(InstallOutcome { tool, added, status });
                continue;
            }

            let status = match self.installer.install(&tool, show_output) {
                Ok(()) => {
                    log::info!("Installed {}", tool);
                    InstallStatus::Installed
                }
                Err(e) if !e.is_fatal() => {
                    log::warn!("{}", e);
                    InstallStatus::Failed(failure_reason(&e))
                }
                Err(e) => return Err(e),
            };
            outcomes.push(InstallOutcome { tool, added, status });
        }
        Ok(outcomes)
    }

    /// Undeclares tools and deletes their binaries.
    ///
    /// Removing a tool that is neither declared nor installed is a no-op.
    ///
    /// # Errors
    /// Only fatal errors are returned, i.e. the manifest could not be saved.
    pub fn remove_tools<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<RemoveOutcome>> {
        let mut outcomes = Vec::with_capacity(names.len());
        for raw in names {
            let Some(tool) = tool_name(raw.as_ref()) else {
                continue;
            };

            let undeclared = self.manifest.remove(&tool);
            if undeclared {
                self.persist()?;
                log::info!("Undeclared {}", tool);
            }

            let binary = self.delete_binary(&tool);
            outcomes.push(RemoveOutcome { tool, undeclared, binary });
        }
        Ok(outcomes)
    }

    /// Makes the bin directory exactly match the manifest.
    ///
    /// Binaries not declared in the manifest are deleted first, then every
    /// declared tool is re-installed regardless of whether it is present.
    pub fn sync_forcefully(&mut self, show_output: bool) -> Result<SyncSummary> {
        let installed = list_installed(&self.bin_dir)?;
        let mut pruned = Vec::new();
        for tool in installed.into_iter().filter(|t| !self.manifest.contains(t)) {
            log::info!("Pruning extraneous tool {}", tool);
            let binary = self.delete_binary(&tool);
            pruned.push(RemoveOutcome { tool, undeclared: false, binary });
        }

        let declared = self.manifest.tools().to_vec();
        let installs = self.install_tools(&declared, true, show_output)?;
        Ok(SyncSummary { forced: true, pruned, installs })
    }

    /// Installs every declared tool that is missing. Nothing is pruned and
    /// present tools are not fetched again.
    pub fn sync_idempotent(&mut self, show_output: bool) -> Result<SyncSummary> {
        let declared = self.manifest.tools().to_vec();
        let installs = self.install_tools(&declared, false, show_output)?;
        Ok(SyncSummary { forced: false, pruned: Vec::new(), installs })
    }

    /// Compares the manifest with the bin directory without changing either.
    ///
    /// # Errors
    /// Returns [`LvlupError::DirectoryIo`] if the bin directory cannot be read.
    pub fn report_status(&self) -> Result<StatusReport> {
        let installed = list_installed(&self.bin_dir)?;
        let declared_not_installed = self
            .manifest
            .tools()
            .iter()
            .filter(|t| !installed.contains(*t))
            .cloned()
            .collect();
        let installed_not_declared = installed
            .into_iter()
            .filter(|t| !self.manifest.contains(t))
            .collect();
        Ok(StatusReport {
            declared_not_installed,
            installed_not_declared,
            managed: self.manifest.tools().to_vec(),
        })
    }

    fn delete_binary(&self, tool: &str) -> BinaryRemoval {
        match remove_binary(&self.bin_dir, tool) {
            Ok(true) => BinaryRemoval::Deleted,
            Ok(false) => BinaryRemoval::Absent,
            Err(e) => {
                log::warn!("{}", e);
                BinaryRemoval::Failed(e.to_string())
            }
        }
    }

    fn persist(&self) -> Result<()> {
        self.manifest.save(&self.manifest_path)
    }
}

fn failure_reason(err: &LvlupError) -> String {
    match err {
        LvlupError::InstallFailure { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    struct Recorder {
        bin_dir: PathBuf,
        calls: RefCell<Vec<String>>,
    }

    impl PackageInstaller for Recorder {
        fn install(&self, tool: &str, _show_output: bool) -> Result<()> {
            self.calls.borrow_mut().push(tool.to_string());
            if tool == "broken" {
                return Err(LvlupError::install_failure(tool, "exit status: 1"));
            }
            fs::write(self.bin_dir.join(tool), b"bin").unwrap();
            Ok(())
        }
    }

    fn setup(declared: &[&str], installed: &[&str]) -> (TempDir, LvlupPaths) {
        let dir = tempdir().unwrap();
        let paths = LvlupPaths::from_home(dir.path());
        paths.ensure_dirs().unwrap();
        for tool in installed {
            fs::write(paths.bin_dir.join(tool), b"bin").unwrap();
        }
        Manifest::new(declared).save(&paths.manifest).unwrap();
        (dir, paths)
    }

    fn recorder(bin_dir: &Path) -> Recorder {
        Recorder { bin_dir: bin_dir.to_path_buf(), calls: RefCell::new(Vec::new()) }
    }

    fn reconciler<'a>(paths: &LvlupPaths, installer: &'a Recorder) -> Reconciler<&'a Recorder> {
        Reconciler::new(paths, Manifest::load(&paths.manifest).unwrap(), installer)
    }

    #[test]
    fn test_handle_get_reports_install() {
        let (_dir, paths) = setup(&[], &[]);
        let installer = recorder(&paths.bin_dir);
        let mut reconciler = reconciler(&paths, &installer);

        let report = reconciler
            .handle(&Request::Get { tools: vec!["jq".into()], force: false }, Options::default())
            .unwrap();
        match report {
            Report::Install(outcomes) => {
                assert_eq!(outcomes.len(), 1);
                assert!(outcomes[0].added);
                assert_eq!(outcomes[0].status, InstallStatus::Installed);
            }
            other => panic!("unexpected report: {other:?}"),
        }
    }

    #[test]
    fn test_install_skips_blank_names() {
        let (_dir, paths) = setup(&[], &[]);
        let installer = recorder(&paths.bin_dir);
        let mut reconciler = Reconciler::new(&paths, Manifest::default(), &installer);

        let outcomes = reconciler.install_tools(&["", "  ", " yq "], false, false).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].tool, "yq");
        assert_eq!(*installer.calls.borrow(), vec!["yq"]);
    }

    #[test]
    fn test_forced_get_reinstalls_present_tool() {
        let (_dir, paths) = setup(&["helm"], &["helm"]);
        let installer = recorder(&paths.bin_dir);
        let mut reconciler = reconciler(&paths, &installer);

        let outcomes = reconciler.install_tools(&["helm"], true, false).unwrap();
        assert_eq!(outcomes[0].status, InstallStatus::Installed);
        assert!(!outcomes[0].added);
        assert_eq!(installer.calls.borrow().len(), 1);
    }

    #[test]
    fn test_skip_still_declares_tool() {
        let (_dir, paths) = setup(&[], &["k9s"]);
        let installer = recorder(&paths.bin_dir);
        let mut reconciler = Reconciler::new(&paths, Manifest::default(), &installer);

        let outcomes = reconciler.install_tools(&["k9s"], false, false).unwrap();
        assert_eq!(outcomes[0].status, InstallStatus::AlreadyInstalled);
        assert!(outcomes[0].added);
        assert!(installer.calls.borrow().is_empty());
        assert!(Manifest::load(&paths.manifest).unwrap().contains("k9s"));
    }

    #[test]
    fn test_idempotent_sync_does_not_prune() {
        let (_dir, paths) = setup(&["a"], &["extra"]);
        let installer = recorder(&paths.bin_dir);
        let mut reconciler = reconciler(&paths, &installer);

        let summary = reconciler.sync_idempotent(false).unwrap();
        assert!(!summary.forced);
        assert!(summary.pruned.is_empty());
        assert!(paths.bin_dir.join("extra").exists());
        assert!(paths.bin_dir.join("a").exists());
        assert!(!summary.was_in_sync());
    }

    #[test]
    fn test_idempotent_sync_when_in_sync() {
        let (_dir, paths) = setup(&["a", "b"], &["a", "b"]);
        let installer = recorder(&paths.bin_dir);
        let mut reconciler = reconciler(&paths, &installer);

        let summary = reconciler.sync_idempotent(false).unwrap();
        assert!(summary.was_in_sync());
        assert_eq!(summary.failures(), 0);
        assert!(installer.calls.borrow().is_empty());
    }

    #[test]
    fn test_sync_summary_counts_failures() {
        let (_dir, paths) = setup(&["broken", "ok"], &[]);
        let installer = recorder(&paths.bin_dir);
        let mut reconciler = reconciler(&paths, &installer);

        let summary = reconciler.sync_idempotent(false).unwrap();
        assert_eq!(summary.failures(), 1);
        let expected = InstallStatus::Failed("exit status: 1".to_string());
        assert_eq!(summary.installs[0].status, expected);
    }

    #[test]
    fn test_status_in_sync() {
        let (_dir, paths) = setup(&["a"], &["a"]);
        let installer = recorder(&paths.bin_dir);
        let reconciler = reconciler(&paths, &installer);

        let report = reconciler.report_status().unwrap();
        assert!(report.is_in_sync());
        assert_eq!(report.managed, vec!["a"]);
    }

    #[test]
    fn test_failed_manifest_save_aborts_install() {
        let (_dir, paths) = setup(&[], &[]);
        fs::remove_file(&paths.manifest).unwrap();
        fs::create_dir(&paths.manifest).unwrap();
        let installer = recorder(&paths.bin_dir);
        let mut reconciler = Reconciler::new(&paths, Manifest::default(), &installer);

        let err = reconciler.install_tools(&["a", "b"], false, false).unwrap_err();
        assert!(matches!(err, LvlupError::ConfigIo { .. }));
        assert!(err.is_fatal());
        assert!(installer.calls.borrow().is_empty());
    }

    #[test]
    fn test_failed_manifest_save_aborts_remove() {
        let (_dir, paths) = setup(&[], &["a"]);
        fs::remove_file(&paths.manifest).unwrap();
        fs::create_dir(&paths.manifest).unwrap();
        let installer = recorder(&paths.bin_dir);
        let mut reconciler = Reconciler::new(&paths, Manifest::new(["a"]), &installer);

        let err = reconciler.remove_tools(&["a"]).unwrap_err();
        assert!(matches!(err, LvlupError::ConfigIo { .. }));
        // the binary is only deleted once the manifest change is on disk
        assert!(paths.bin_dir.join("a").exists());
    }

    #[test]
    fn test_unreadable_bin_dir_is_fatal() {
        let (_dir, paths) = setup(&["a"], &[]);
        fs::remove_dir(&paths.bin_dir).unwrap();
        fs::write(&paths.bin_dir, b"").unwrap();
        let installer = recorder(&paths.bin_dir);
        let mut reconciler = reconciler(&paths, &installer);

        let status = reconciler.report_status().unwrap_err();
        assert!(matches!(status, LvlupError::DirectoryIo { .. }));
        let sync = reconciler.sync_forcefully(false).unwrap_err();
        assert!(matches!(sync, LvlupError::DirectoryIo { .. }));
        assert!(sync.is_fatal());
        assert!(installer.calls.borrow().is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_force_sync_ignores_non_utf8_binaries() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (_dir, paths) = setup(&[], &[]);
        let odd = paths.bin_dir.join(OsStr::from_bytes(b"tool\xff"));
        fs::write(&odd, b"bin").unwrap();
        let installer = recorder(&paths.bin_dir);
        let mut reconciler = reconciler(&paths, &installer);

        let summary = reconciler.sync_forcefully(false).unwrap();
        assert!(summary.pruned.is_empty());
        assert_eq!(summary.failures(), 0);
        assert!(odd.exists());
        assert!(reconciler.report_status().unwrap().is_in_sync());
    }
}
