//! This module contains the errors used all over this codebase.

use std::io;

use crate::prelude::*;

/// Convenience wrapper around *Result<T, AppError>*.
pub type AppResult<T> = Result<T, AppError>;

/// Error returned by several functions in this crate.
#[derive(Error, Debug)]
pub enum AppError {
	/// Error returned by failing IO operations.
	/// Most of these will occur during filesystem interactions.
	#[error(transparent)]
	IO(#[from] io::Error),

	/// Error returned when failing to (de)serialize type using Serde and Bincode.
	#[error(transparent)]
	Bincode(#[from] bincode::Error),

	/// Error returned while reading, converting, or writing an install script.
	#[error(transparent)]
	Script(#[from] ScriptError),

	/// Error returned by a failed install run.
	#[error(transparent)]
	Install(#[from] InstallError),

	/// Custom error that simply wraps a *Notice*.
	#[error("{0}")]
	Custom(Notice),

	/// Error converted from any error that does not have a matching *AppError* variant.
	#[error(transparent)]
	Unknown(#[from] anyhow::Error),
}

/// An error involving an install script document.
#[derive(Error, Debug)]
pub enum ScriptError {
	/// The document declares a format version this crate does not know.
	/// This wraps the identifier exactly as it was declared.
	#[error("The script's format version '{0}' is not supported.")]
	UnsupportedVersion(String),

	/// The document is well-formed XML, but does not follow its version's grammar.
	#[error("Invalid script structure at '{path}': {message}")]
	Structure {
		/// Path to the offending element, such as "config/installSteps/installStep[2]".
		path: String,

		message: String,
	},

	/// The document is not well-formed XML.
	#[error(transparent)]
	Xml(#[from] roxmltree::Error),

	/// Writing the document failed.
	#[error(transparent)]
	Write(#[from] quick_xml::Error),

	/// A script uses something the requested format version cannot express.
	#[error("Format version {version} cannot express {feature}.")]
	Unrepresentable {
		version: ScriptVersion,
		feature: Feature,
	},
}

/// An error that stops an install run.
/// Cancellation is not an error; see *InstallOutcome*.
#[derive(Error, Debug)]
pub enum InstallError {
	/// The script's prerequisites are not met.
	/// This wraps a description of the first unmet condition.
	#[error("The package's requirements are not met: {0}")]
	UnfulfilledPrerequisite(String),

	/// Reading a file from the package or writing it to the target failed.
	#[error("Failed to install '{path}': {source}")]
	Io {
		path: String,

		#[source]
		source: io::Error,
	},

	/// Changing a component's activation failed.
	#[error("Failed to change the activation of '{path}': {source}")]
	Activation {
		path: String,

		#[source]
		source: io::Error,
	},
}
