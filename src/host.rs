//! This module defines the contracts between the install engine and the rest of the mod manager.
//! The engine never touches archives, plugin lists, or the game folder directly; it goes through these traits.
//!
//! Every method takes `&self`, since the engine only ever runs one install at a time on one thread.
//! Implementations that need to change state should use interior mutability.

use std::{
	io,
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
};

use crate::{prelude::*, util::path::normalize_path};

/// Serves the files of a mod package.
/// Paths are case-insensitive and may use either kind of slash.
pub trait PackageSource {
	/// Checks if the package contains a file at the provided path.
	fn contains_file(&self, path: &str) -> bool;

	/// Reads a file out of the package.
	fn get_file(&self, path: &str) -> io::Result<Vec<u8>>;

	/// Lists the files inside a folder as full package paths, in a stable order.
	/// A folder that does not exist yields an empty list.
	fn get_file_list(&self, folder: &str, recursive: bool) -> io::Result<Vec<String>>;

	/// The package's format, which is handed to the *PathAdjuster*.
	fn format(&self) -> &str {
		"fomod"
	}

	/// The package's own screenshot, used when a script sets no header image.
	fn screenshot(&self) -> Option<String> {
		None
	}
}

/// The target game's list of components, which are usually plugins.
pub trait ComponentRegistry {
	/// Checks if the component is known to the game at all.
	fn is_registered(&self, path: &str) -> bool;

	/// Checks if the component is known and enabled.
	fn is_active(&self, path: &str) -> bool;

	/// Decides whether an installed file should be considered for activation.
	fn is_activatable(&self, path: &str) -> bool;

	/// Registers the component if needed, then enables or disables it.
	fn set_activation(&self, path: &str, active: bool) -> io::Result<()>;
}

/// Answers version queries made by conditions.
pub trait VersionOracle {
	/// The target game's version, if it could be determined.
	fn target_app_version(&self) -> Option<Version>;

	/// The script extender's version, or *None* if it isn't installed.
	fn extender_version(&self) -> Option<Version>;

	/// The mod manager's own version.
	fn manager_version(&self) -> Version;
}

/// Writes files into the game's file tree.
pub trait FileInstaller {
	/// Writes *data* to *destination*.
	/// Collisions are settled by the implementation, usually by asking the user.
	/// Returns *false* if the write was declined, which is not an error.
	fn install_file(&self, source: &str, data: &[u8], destination: &str) -> io::Result<bool>;
}

/// Adjusts script paths to a game's folder conventions.
/// This is applied to every destination and activation candidate before it is used.
pub trait PathAdjuster {
	fn adjust_path(&self, format: &str, raw: &str) -> String;
}

/// A *PathAdjuster* that only normalizes paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPaths;

impl PathAdjuster for IdentityPaths {
	fn adjust_path(&self, _format: &str, raw: &str) -> String {
		normalize_path(raw)
	}
}

/// A *VersionOracle* that answers with fixed versions.
#[derive(Debug, Clone)]
pub struct StaticVersions {
	pub target_app: Option<Version>,
	pub extender: Option<Version>,
	pub manager: Version,
}

impl Default for StaticVersions {
	fn default() -> Self {
		Self {
			target_app: None,
			extender: None,
			manager: manager_version(),
		}
	}
}

impl VersionOracle for StaticVersions {
	fn target_app_version(&self) -> Option<Version> {
		self.target_app.clone()
	}

	fn extender_version(&self) -> Option<Version> {
		self.extender.clone()
	}

	fn manager_version(&self) -> Version {
		self.manager.clone()
	}
}

/// This crate's own version, which is what scripts see as the mod manager's version.
pub fn manager_version() -> Version {
	env!("CARGO_PKG_VERSION")
		.parse()
		.unwrap_or_else(|_| Version::from_parts(&[0]))
}

/// A snapshot of an install run's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress<'p> {
	/// The script entry being worked on, starting at 1.
	pub item: usize,

	/// The number of entries counted before the run started.
	/// Entries can be skipped, such as options in steps that end up hidden, so a completed run closes with a report where *item* equals *total*.
	pub total: usize,

	/// The number of file writes attempted so far, including this one.
	pub files_written: usize,

	/// The destination of the file that was just handled.
	/// This is empty on the closing report of a completed run.
	pub label: &'p str,
}

/// Watches an install run.
/// The engine reports after each file and asks about cancellation before each one.
pub trait InstallMonitor {
	fn report(&mut self, progress: &Progress);

	fn is_cancelled(&self) -> bool {
		false
	}
}

impl InstallMonitor for () {
	fn report(&mut self, _progress: &Progress) {}
}

/// A cancellation flag that can be shared with another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	/// Asks the current run to stop before its next file.
	pub fn cancel(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}
}

/// An *InstallMonitor* that logs progress and honors a *CancelToken*.
#[derive(Debug, Clone, Default)]
pub struct LogMonitor {
	pub token: CancelToken,
}

impl InstallMonitor for LogMonitor {
	fn report(&mut self, progress: &Progress) {
		match progress.label.is_empty() {
			true => info!("[{}/{}] Done.", progress.item, progress.total),
			false => info!("[{}/{}] {}", progress.item, progress.total, progress.label),
		}
	}

	fn is_cancelled(&self) -> bool {
		self.token.is_cancelled()
	}
}
