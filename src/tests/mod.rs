// Tests for the install script engine.
// Collaborators are replaced with in-memory fakes that record how they were used.

mod conditions;
mod installer;
mod selection;

use std::{
	cell::{Cell, RefCell},
	io,
};

use log::LevelFilter;
use simple_logger::SimpleLogger;

use crate::{
	host::{ComponentRegistry, FileInstaller, InstallMonitor, PackageSource, Progress, StaticVersions},
	prelude::*,
	util::path::{path_key, strip_folder},
};

/// Starts the logger, ignoring the error raised when another test already started it.
pub fn init_logger() {
	let _ = SimpleLogger::new().with_level(LevelFilter::Debug).init();
}

/// Builds versions for a game, with no script extender.
pub fn game_versions(game: &str) -> StaticVersions {
	StaticVersions {
		target_app: Some(game.parse().unwrap()),
		..Default::default()
	}
}

/// A package held in memory, where each file's content is its own path.
#[derive(Default)]
pub struct FakePackage {
	files: IndexMap<String, String>,
	screenshot: Option<String>,
}

impl FakePackage {
	pub fn with_files(paths: &[&str]) -> Self {
		let files = paths.iter().map(|p| (path_key(p), p.to_string())).collect();
		Self { files, screenshot: None }
	}

	pub fn with_screenshot(mut self, path: &str) -> Self {
		self.screenshot = Some(path.to_owned());
		self
	}
}

impl PackageSource for FakePackage {
	fn contains_file(&self, path: &str) -> bool {
		self.files.contains_key(&path_key(path))
	}

	fn get_file(&self, path: &str) -> io::Result<Vec<u8>> {
		self.files.get(&path_key(path))
			.map(|p| p.as_bytes().to_vec())
			.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_owned()))
	}

	fn get_file_list(&self, folder: &str, recursive: bool) -> io::Result<Vec<String>> {
		let list = self.files.values()
			.filter(|p| strip_folder(folder, p).is_some_and(|rest| recursive || !rest.contains('/')))
			.cloned()
			.collect();

		Ok(list)
	}

	fn screenshot(&self) -> Option<String> {
		self.screenshot.clone()
	}
}

/// A registry that keeps components in memory and counts state lookups.
/// Every path is activatable unless it is listed in *inert*.
#[derive(Default)]
pub struct FakeRegistry {
	pub registered: RefCell<IndexSet<String>>,
	pub active: RefCell<IndexSet<String>>,
	pub inert: IndexSet<String>,
	pub activations: RefCell<Vec<(String, bool)>>,
	pub lookups: Cell<usize>,
}

impl FakeRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_inactive(self, path: &str) -> Self {
		self.registered.borrow_mut().insert(path_key(path));
		self
	}

	pub fn with_active(self, path: &str) -> Self {
		self.registered.borrow_mut().insert(path_key(path));
		self.active.borrow_mut().insert(path_key(path));
		self
	}

	pub fn with_inert(mut self, path: &str) -> Self {
		self.inert.insert(path_key(path));
		self
	}
}

impl ComponentRegistry for FakeRegistry {
	fn is_registered(&self, path: &str) -> bool {
		self.lookups.set(self.lookups.get() + 1);
		self.registered.borrow().contains(&path_key(path))
	}

	fn is_active(&self, path: &str) -> bool {
		self.lookups.set(self.lookups.get() + 1);
		self.active.borrow().contains(&path_key(path))
	}

	fn is_activatable(&self, path: &str) -> bool {
		!self.inert.contains(&path_key(path))
	}

	fn set_activation(&self, path: &str, active: bool) -> io::Result<()> {
		self.activations.borrow_mut().push((path.to_owned(), active));
		self.registered.borrow_mut().insert(path_key(path));

		match active {
			true => { self.active.borrow_mut().insert(path_key(path)); },
			false => { self.active.borrow_mut().shift_remove(&path_key(path)); },
		}

		Ok(())
	}
}

/// An installer that records every call instead of writing anything.
#[derive(Default)]
pub struct RecordingInstaller {
	/// Each call as *(source, destination)*, in order.
	pub calls: RefCell<Vec<(String, String)>>,

	/// Destinations whose overwrite is declined.
	pub declined: IndexSet<String>,

	/// A destination that fails to write.
	pub broken: Option<String>,
}

impl RecordingInstaller {
	pub fn destinations(&self) -> Vec<String> {
		self.calls.borrow().iter().map(|(_, d)| d.clone()).collect()
	}
}

impl FileInstaller for RecordingInstaller {
	fn install_file(&self, source: &str, _data: &[u8], destination: &str) -> io::Result<bool> {
		self.calls.borrow_mut().push((source.to_owned(), destination.to_owned()));

		if self.broken.as_deref() == Some(destination) {
			return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
		}

		Ok(!self.declined.contains(destination))
	}
}

/// A monitor that keeps every report, and can cancel after a number of them.
#[derive(Default)]
pub struct CountingMonitor {
	/// Each report as *(item, total, files_written, label)*.
	pub reports: Vec<(usize, usize, usize, String)>,
	pub cancel_after: Option<usize>,
}

impl InstallMonitor for CountingMonitor {
	fn report(&mut self, progress: &Progress) {
		self.reports.push((progress.item, progress.total, progress.files_written, progress.label.to_owned()));
	}

	fn is_cancelled(&self) -> bool {
		self.cancel_after.is_some_and(|n| self.reports.len() >= n)
	}
}
