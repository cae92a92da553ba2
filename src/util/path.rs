//! This module handles the paths used inside mod packages and install scripts.
//! These paths are case-insensitive and may use either kind of slash, so everything is funneled through *normalize_path*.

use crate::prelude::*;

/// Normalizes a package or destination path.
/// Backslashes become forward slashes, while empty and '.' segments are dropped.
/// The result never starts or ends with a slash.
pub fn normalize_path(path: impl AsRef<str>) -> String {
	path.as_ref()
		.split(['/', '\\'])
		.map(str::trim)
		.filter(|s| !s.is_empty() && *s != ".")
		.join("/")
}

/// Builds the key used to compare paths.
/// Keys are normalized and lowercased, so 'Data\Foo.ESP' and 'data/foo.esp' share a key.
pub fn path_key(path: impl AsRef<str>) -> String {
	normalize_path(path).to_ascii_lowercase()
}

/// Joins a relative path onto a base path.
/// An empty base is treated as the root.
pub fn join_path(base: impl AsRef<str>, rest: impl AsRef<str>) -> String {
	let base = normalize_path(base);
	let rest = normalize_path(rest);

	match (base.is_empty(), rest.is_empty()) {
		(true, _) => rest,
		(false, true) => base,
		(false, false) => format!("{base}/{rest}"),
	}
}

/// Strips a folder from the front of a path, ignoring case.
/// Returns *None* if the path is not inside the folder.
pub fn strip_folder(folder: impl AsRef<str>, path: impl AsRef<str>) -> Option<String> {
	let folder = normalize_path(folder);
	let path = normalize_path(path);

	if folder.is_empty() { return Some(path); }

	let prefix_len = folder.len();
	let is_inside = path.len() > prefix_len
		&& path.as_bytes()[prefix_len] == b'/'
		&& path[..prefix_len].eq_ignore_ascii_case(&folder);

	is_inside.then(|| path[prefix_len + 1..].to_owned())
}

/// Returns *true* if the path tries to climb out of its root with a '..' segment.
pub fn escapes_root(path: impl AsRef<str>) -> bool {
	normalize_path(path).split('/').any(|s| s == "..")
}

/// Returns the lowercased extension of a path's file name, if it has one.
pub fn extension(path: impl AsRef<str>) -> Option<String> {
	let path = normalize_path(path);
	let name = path.rsplit('/').next()?;

	match name.rsplit_once('.') {
		Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_ascii_lowercase()),
		_ => None,
	}
}
