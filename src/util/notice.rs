//! This module provides the *Notice* struct, which is used for pretty-printing warnings, errors, or other messages to users.

use crate::{prelude::*, util::text::TextStyle};
use std::{fmt::Display, io};

use super::text::TextColor;

/// Notices allow you to easily pretty-print warning, errors, and other various information.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Notice {
	color: TextColor,
	prefix: String,
	header: String,
	fields: Vec<(String, String)>,
}

/// Presets to use while making a notice, allowing you to quickly recreate common forms of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NoticePreset {
	/// A red notice with the prefix "ERROR".
	Error,

	/// A yellow notice with the prefix "WARN".
	Warning,

	/// A green notice with the prefix "DONE".
	Success,

	/// A cyan notice with the prefix "STATS".
	Statistics,
}

impl Notice {
	/// Builds a new notice from raw components.
	pub fn new(color: TextColor, prefix: &str, header: &str) -> Self {
		Self {
			color,
			prefix: prefix.to_owned(),
			header: header.to_owned(),
			fields: Vec::new(),
		}
	}

	/// Builds a new notice from a preset and a header.
	pub fn from_preset(preset: NoticePreset, header: &str) -> Self {
		match preset {
			NoticePreset::Error => Notice::new(TextColor::Red, "ERROR", header),
			NoticePreset::Warning => Notice::new(TextColor::Yellow, "WARN", header),
			NoticePreset::Success => Notice::new(TextColor::Green, "DONE", header),
			NoticePreset::Statistics => Notice::new(TextColor::Cyan, "STATS", header),
		}
	}

	/// Adds a new field to this notice, which will be printed after any other fields.
	/// A field will be presented in the form of `"{label}: {content}"`.
	pub fn add_field(mut self, label: &str, content: &str) -> Self {
		self.fields.push((label.to_owned(), content.to_owned()));
		self
	}

	/// Returns the content of the first field with the provided label.
	pub fn field(&self, label: &str) -> Option<&str> {
		self.fields.iter()
			.find(|(l, _)| l == label)
			.map(|(_, content)| content.as_str())
	}

	/// Convenience method to allow printing a notice at the end of a dot-call chain.
	pub fn print(self) {
		println!("{self}");
	}
}

impl Display for Notice {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let title = format!("[{} - {}]", self.prefix, self.header).stylize(Some(TextStyle::Bold), Some(self.color), None);
		writeln!(f, "{}", title)?;

		let mut formatted_label;
		for (label, content) in self.fields.iter() {
			formatted_label = format!("  {label}: ").stylize(Some(TextStyle::Bold), Some(self.color), None);
			writeln!(f, "{}{}", formatted_label, content)?;
		}

		Ok(())
	}
}

// Beyond this point is just conversions between errors and notices.

impl From<AppError> for Notice {
	fn from(value: AppError) -> Self {
		match value {
			AppError::IO(error) => error.into(),
			AppError::Script(error) => error.into(),
			AppError::Install(error) => error.into(),
			AppError::Custom(notice) => notice,

			AppError::Bincode(error) => Notice::from_preset(NoticePreset::Error, "(De)serialization")
				.add_field("Description", "Failed to convert a Rust type to a string or vice-versa.")
				.add_field("Details", &error.to_string()),

			AppError::Unknown(error) => Notice::from_preset(NoticePreset::Error, "Unknown")
				.add_field("Message", "An unknown error has occurred!")
				.add_field("Details", &error.to_string()),
		}
	}
}

impl From<io::Error> for Notice {
	fn from(value: io::Error) -> Self {
		let notice = Notice::from_preset(NoticePreset::Error, "IO");

		match value.kind() {
			io::ErrorKind::NotFound => notice
				.add_field("Description", "Tried to access a file that doesn't exist.")
				.add_field("Details", &value.to_string()),

			io::ErrorKind::PermissionDenied => notice
				.add_field("Description", "Tried to access a file without the right permissions.")
				.add_field("Suggestion", "Ensure you have full permissions for the package and the target directory."),

			_ => notice
				.add_field("Description", "An unknown error has occurred!")
				.add_field("Details", &value.to_string()),
		}
	}
}

impl From<ScriptError> for Notice {
	fn from(value: ScriptError) -> Self {
		let notice = Notice::from_preset(NoticePreset::Error, "Script");

		match value {
			ScriptError::UnsupportedVersion(id) => notice
				.add_field("Description", &format!("The script declares the format version '{id}', which is not supported."))
				.add_field("Supported", &ScriptVersion::ALL.iter().join(", ")),

			ScriptError::Structure { path, message } => notice
				.add_field("Description", "The script does not follow its format version's structure.")
				.add_field("Location", &path)
				.add_field("Details", &message),

			ScriptError::Xml(error) => notice
				.add_field("Description", "The script is not valid XML.")
				.add_field("Details", &error.to_string()),

			ScriptError::Write(error) => notice
				.add_field("Description", "Failed to write the script.")
				.add_field("Details", &error.to_string()),

			ScriptError::Unrepresentable { version, feature } => notice
				.add_field("Description", &format!("Format version {version} cannot express {feature}, which this script uses."))
				.add_field("Suggestion", "Pick a newer format version."),
		}
	}
}

impl From<InstallError> for Notice {
	fn from(value: InstallError) -> Self {
		let notice = Notice::from_preset(NoticePreset::Error, "Install");

		match value {
			InstallError::UnfulfilledPrerequisite(reason) => notice
				.add_field("Description", "The package's requirements are not met, so nothing was installed.")
				.add_field("Reason", &reason),

			InstallError::Io { path, source } => notice
				.add_field("Description", &format!("Failed to install '{path}'."))
				.add_field("Details", &source.to_string())
				.add_field("Note", "Files installed before this one were left in place."),

			InstallError::Activation { path, source } => notice
				.add_field("Description", &format!("Failed to change the activation of '{path}'."))
				.add_field("Details", &source.to_string()),
		}
	}
}
