//! This module contains collaborators backed by plain directories.
//! They let an extracted package be installed straight into a game folder, which is what the CLI does.

use std::{
	cell::RefCell,
	fs,
	io,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::{
	host::{ComponentRegistry, FileInstaller, PackageSource},
	prelude::*,
	util::{
		misc::{ask_yes_no, LoadOrDefault, SaveLoad},
		path::{escapes_root, extension, normalize_path, path_key, strip_folder},
	},
};

/// Where a package keeps its install script.
pub const SCRIPT_PATH: &str = "fomod/ModuleConfig.xml";

/// Where a target directory keeps its plugin list.
pub const PLUGIN_LIST_PATH: &str = ".modcrab/plugins.bin";

/// File extensions of components that can be activated.
const ACTIVATABLE_EXTENSIONS: [&str; 3] = ["esp", "esm", "esl"];

/// File extensions that count as images when looking for a package's screenshot.
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// An extracted package on disk.
/// The directory is indexed once, so lookups ignore case even on case-sensitive filesystems.
#[derive(Debug, Clone)]
pub struct DirectoryPackage {
	root: PathBuf,

	/// Maps path keys to the real, normalized relative paths.
	index: IndexMap<String, String>,
}

impl DirectoryPackage {
	/// Indexes the package at the provided directory.
	pub fn open(root: impl AsRef<Path>) -> AppResult<Self> {
		let root = root.as_ref().to_owned();
		let mut index = IndexMap::new();

		let walker = WalkDir::new(&root)
			.sort_by_file_name()
			.into_iter();

		for entry in walker {
			let entry = entry.map_err(io::Error::from)?;
			if !entry.file_type().is_file() { continue; }

			let Ok(relative) = entry.path().strip_prefix(&root) else { continue };
			let relative = normalize_path(relative.to_string_lossy());

			index.insert(path_key(&relative), relative);
		}

		debug!("Indexed {} file(s) in '{}'.", index.len(), root.display());
		Ok(Self { root, index }.unwrapped())
	}

	/// Re-roots a package that keeps its script inside a wrapper folder, as many archives do.
	/// Everything outside that folder is left out, so script paths resolve against the wrapper.
	fn unwrapped(self) -> Self {
		let wanted = path_key(SCRIPT_PATH);
		if self.index.contains_key(&wanted) { return self; }

		let nested = self.index.iter()
			.filter(|(k, _)| k.ends_with(&format!("/{wanted}")))
			.min_by_key(|(k, _)| k.matches('/').count())
			.map(|(_, v)| v[..v.len() - SCRIPT_PATH.len() - 1].to_owned());

		let Some(wrapper) = nested else { return self };

		let index: IndexMap<String, String> = self.index.values()
			.filter_map(|path| strip_folder(&wrapper, path))
			.map(|path| (path_key(&path), path))
			.collect();

		let root = self.root.join(&wrapper);
		debug!("Using '{}' as the package root, since it holds the install script.", root.display());

		Self { root, index }
	}

	/// The directory every package path is relative to.
	/// This is the wrapper folder when the package was re-rooted on open.
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Finds the package's install script.
	pub fn script_path(&self) -> Option<&str> {
		self.index.get(&path_key(SCRIPT_PATH)).map(String::as_str)
	}

	/// Reads and parses the package's install script.
	pub fn load_script(&self) -> AppResult<Script> {
		let Some(path) = self.script_path() else {
			let error = Notice::from_preset(NoticePreset::Error, "Package")
				.add_field("Description", &format!("The package at '{}' has no install script.", self.root.display()))
				.add_field("Suggestion", &format!("Ensure the package contains '{SCRIPT_PATH}', or pass a script with '--script'."));

			return Err(AppError::Custom(error));
		};

		let raw = self.get_file(path)?;
		let script = crate::xml::parse_script(&String::from_utf8_lossy(&raw))?;

		Ok(script)
	}
}

impl PackageSource for DirectoryPackage {
	fn contains_file(&self, path: &str) -> bool {
		self.index.contains_key(&path_key(path))
	}

	fn get_file(&self, path: &str) -> io::Result<Vec<u8>> {
		let Some(relative) = self.index.get(&path_key(path)) else {
			return Err(io::Error::new(io::ErrorKind::NotFound, format!("'{path}' is not in the package")));
		};

		fs::read(self.root.join(relative))
	}

	fn get_file_list(&self, folder: &str, recursive: bool) -> io::Result<Vec<String>> {
		let list = self.index.values()
			.filter(|path| match strip_folder(folder, path) {
				Some(rest) => recursive || !rest.contains('/'),
				None => false,
			})
			.cloned()
			.collect();

		Ok(list)
	}

	/// A root-level image named "screenshot", if the package has one.
	fn screenshot(&self) -> Option<String> {
		self.index.values()
			.filter(|p| !p.contains('/'))
			.find(|p| {
				let is_image = extension(p).is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()));
				is_image && p.to_ascii_lowercase().starts_with("screenshot.")
			})
			.cloned()
	}
}

/// What a *DirectoryInstaller* does when a file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
	#[default]
	Always,
	Never,

	/// Ask on the terminal each time.
	Prompt,
}

/// Writes files into a target directory.
#[derive(Debug, Clone)]
pub struct DirectoryInstaller {
	root: PathBuf,
	policy: OverwritePolicy,
}

impl DirectoryInstaller {
	pub fn new(root: impl AsRef<Path>, policy: OverwritePolicy) -> Self {
		Self { root: root.as_ref().to_owned(), policy }
	}
}

impl FileInstaller for DirectoryInstaller {
	fn install_file(&self, _source: &str, data: &[u8], destination: &str) -> io::Result<bool> {
		if escapes_root(destination) {
			let message = format!("'{destination}' points outside of the target directory");
			return Err(io::Error::new(io::ErrorKind::InvalidInput, message));
		}

		let path = self.root.join(normalize_path(destination));

		if path.exists() {
			let overwrite = match self.policy {
				OverwritePolicy::Always => true,
				OverwritePolicy::Never => false,
				OverwritePolicy::Prompt => ask_yes_no(format!("'{destination}' already exists. Overwrite it? [y/N] "))?,
			};

			if !overwrite { return Ok(false); }
		}

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}

		fs::write(&path, data)?;
		Ok(true)
	}
}

/// The plugins a target directory knows about, keyed by their path keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginList {
	pub registered: IndexSet<String>,
	pub active: IndexSet<String>,
}

/// A *ComponentRegistry* for a target directory.
/// Plugin files on disk count as registered, and activation is tracked in a plugin list saved under '.modcrab'.
/// Changes stay in memory until *DirectoryRegistry::save* is called.
#[derive(Debug)]
pub struct DirectoryRegistry {
	root: PathBuf,
	list: RefCell<PluginList>,
}

impl DirectoryRegistry {
	/// Opens the registry for a target directory, starting with an empty plugin list if none was saved.
	pub fn open(root: impl AsRef<Path>) -> AppResult<Self> {
		let root = root.as_ref().to_owned();
		let list = PluginList::load_or_default(root.join(PLUGIN_LIST_PATH))?;

		Ok(Self { root, list: RefCell::new(list) })
	}

	/// Saves the plugin list.
	pub fn save(&self) -> AppResult<()> {
		let list = self.list.borrow();
		debug!("Saving {} active plugin(s) to '{}'.", list.active.len(), self.root.display());

		list.clone().save(self.root.join(PLUGIN_LIST_PATH))
	}

	/// A copy of the current plugin list.
	pub fn plugins(&self) -> PluginList {
		self.list.borrow().clone()
	}
}

impl ComponentRegistry for DirectoryRegistry {
	fn is_registered(&self, path: &str) -> bool {
		self.list.borrow().registered.contains(&path_key(path))
			|| (!escapes_root(path) && self.root.join(normalize_path(path)).is_file())
	}

	fn is_active(&self, path: &str) -> bool {
		self.list.borrow().active.contains(&path_key(path))
	}

	fn is_activatable(&self, path: &str) -> bool {
		extension(path).is_some_and(|e| ACTIVATABLE_EXTENSIONS.contains(&e.as_str()))
	}

	fn set_activation(&self, path: &str, active: bool) -> io::Result<()> {
		let key = path_key(path);
		let mut list = self.list.borrow_mut();

		list.registered.insert(key.clone());

		match active {
			true => { list.active.insert(key); },
			false => { list.active.shift_remove(&key); },
		}

		Ok(())
	}
}
