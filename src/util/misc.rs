//! This module is the general place for utilities that don't need their own module.

use std::{fmt::Display, fs, io::{self, BufRead, Write}, path::Path};

use serde::{de::DeserializeOwned, Serialize};

use crate::prelude::*;

/// Lets state such as a plugin list be kept in a binary file between runs.
/// Files are encoded with Bincode through Serde.
pub trait SaveLoad: Sized {
	/// Encodes this value into the file at *path*, creating its parent directories first.
	fn save(self, path: impl AsRef<Path>) -> AppResult<()>;

	/// Decodes a value out of the file at *path*.
	fn load(path: impl AsRef<Path>) -> AppResult<Self>;
}

/// Extends *SaveLoad* with a fallback to the type's default value.
pub trait LoadOrDefault: Sized {
	/// Loads the file at *path*, or returns the default value if it is missing or can't be decoded.
	/// Other errors, such as a lack of permissions, are still returned.
	fn load_or_default(path: impl AsRef<Path>) -> AppResult<Self>;
}

impl<T> SaveLoad for T
where
	T: Serialize + DeserializeOwned,
{
	fn save(self, path: impl AsRef<Path>) -> AppResult<()> {
		let path = path.as_ref();

		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent)?;
		}

		fs::write(path, bincode::serialize(&self)?)?;
		Ok(())
	}

	fn load(path: impl AsRef<Path>) -> AppResult<Self> {
		let encoded = fs::read(path)?;
		Ok(bincode::deserialize(&encoded)?)
	}
}

impl<T> LoadOrDefault for T
where
	T: SaveLoad + Default,
{
	fn load_or_default(path: impl AsRef<Path>) -> AppResult<Self> {
		let path = path.as_ref();

		match T::load(path) {
			Err(AppError::IO(e)) if e.kind() == io::ErrorKind::NotFound => Ok(T::default()),

			Err(AppError::Bincode(e)) => {
				warn!("Ignoring '{}', since it could not be decoded: {e}", path.display());
				Ok(T::default())
			}

			other => other,
		}
	}
}

/// Joins a slice's items into a single comma-separated string.
pub fn display_slice<T: Display>(slice: &[T]) -> String {
	slice.iter().join(", ")
}

/// Prints the provided question, and then reads the user's answer from STDIN.
/// Only answers starting with 'y' count as a yes.
pub fn ask_yes_no(question: impl AsRef<str>) -> io::Result<bool> {
	let mut stdout = io::stdout();

	// The question has no newline, so STDOUT has to be flushed by hand.
	stdout.write_all(question.as_ref().as_bytes())?;
	stdout.flush()?;

	let mut answer = String::new();
	io::stdin().lock().read_line(&mut answer)?;

	Ok(answer.trim().to_ascii_lowercase().starts_with('y'))
}
