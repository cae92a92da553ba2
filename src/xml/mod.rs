//! This module converts install scripts between XML documents and *Script* values.
//! Every format version shares one reader and one writer, each driven by the version's *Capabilities*.

mod reader;
mod writer;

use std::{fs, path::Path};

use crate::prelude::*;

pub use reader::ScriptReader;
pub use writer::ScriptWriter;

/// Namespace used by the schema location attribute on a document's root element.
pub(crate) const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Name of a document's root element.
pub(crate) const ROOT_ELEMENT: &str = "config";

/// Detects the format version a document declares.
/// Documents that declare nothing are treated as version 1.0.
pub fn detect_version(raw: &str) -> Result<ScriptVersion, ScriptError> {
	let doc = roxmltree::Document::parse(strip_bom(raw))?;
	version_of_root(doc.root_element())
}

/// Returns the reader for a format version.
pub fn reader_for(version: ScriptVersion) -> ScriptReader {
	ScriptReader::new(version)
}

/// Returns the writer for a format version.
pub fn writer_for(version: ScriptVersion) -> ScriptWriter {
	ScriptWriter::new(version)
}

/// Reads a document using the reader for whichever version it declares.
pub fn parse_script(raw: &str) -> Result<Script, ScriptError> {
	let doc = roxmltree::Document::parse(strip_bom(raw))?;
	let version = version_of_root(doc.root_element())?;

	debug!("Reading a script declared as format version {version}.");
	reader_for(version).read_document(&doc)
}

/// Writes a script using the format version it was read from.
pub fn write_script(script: &Script) -> Result<String, ScriptError> {
	writer_for(script.version).write(script)
}

/// Writes a script using another format version.
/// This fails if the script relies on anything the target version cannot express.
pub fn write_script_as(script: &Script, version: ScriptVersion) -> Result<String, ScriptError> {
	writer_for(version).write(script)
}

/// Reads a script from a file on disk.
pub fn load_script(path: impl AsRef<Path>) -> AppResult<Script> {
	let raw = fs::read_to_string(path)?;
	Ok(parse_script(&raw)?)
}

fn strip_bom(raw: &str) -> &str {
	raw.strip_prefix('\u{feff}').unwrap_or(raw)
}

/// Reads the version declared on a root element.
/// The schema location wins over a plain 'version' attribute.
fn version_of_root(root: roxmltree::Node) -> Result<ScriptVersion, ScriptError> {
	if root.tag_name().name() != ROOT_ELEMENT {
		return Err(ScriptError::Structure {
			path: root.tag_name().name().to_owned(),
			message: format!("expected the root element to be '{ROOT_ELEMENT}'"),
		});
	}

	let schema = root.attributes()
		.find(|a| a.name() == "noNamespaceSchemaLocation")
		.map(|a| a.value());

	if let Some(location) = schema {
		return schema_identifier(location)
			.and_then(ScriptVersion::from_identifier)
			.ok_or_else(|| ScriptError::UnsupportedVersion(location.trim().to_owned()));
	}

	match root.attribute("version") {
		Some(id) => id.parse(),
		None => Ok(ScriptVersion::V1_0),
	}
}

/// Pulls "5.0" out of a schema location such as "http://qconsulting.ca/fo3/ModConfig5.0.xsd".
fn schema_identifier(location: &str) -> Option<&str> {
	let file = location.trim().rsplit(['/', '\\']).next()?;

	file.strip_prefix("ModConfig")?
		.strip_suffix(".xsd")
}
