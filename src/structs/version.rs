//! This module defines versions, both for the software a script can query and for the script format itself.

use std::{cmp::Ordering, fmt::Display, str::FromStr};

use crate::prelude::*;

/// A dotted version, such as "1.9.32.0" or "2.0b".
/// Each part compares by its leading number first, then by the rest of the part as case-insensitive text.
/// Missing trailing parts count as zero, so "1.0" equals "1.0.0".
#[derive(Debug, Clone)]
pub struct Version {
	/// The version exactly as it was written.
	raw: String,

	/// The parsed dot-separated parts.
	parts: Vec<VersionPart>,
}

/// One dot-separated part, split into its leading digits and whatever follows them.
/// A part without leading digits, such as "beta", has a number of zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
struct VersionPart {
	number: u64,
	suffix: String,
}

impl VersionPart {
	fn parse(part: &str) -> Self {
		let split = part.find(|c: char| !c.is_ascii_digit()).unwrap_or(part.len());
		let (digits, suffix) = part.split_at(split);

		let number = match digits.parse() {
			Ok(number) => number,
			Err(_) if digits.is_empty() => 0,

			// Too many digits for a u64.
			Err(_) => u64::MAX,
		};

		VersionPart { number, suffix: suffix.to_ascii_lowercase() }
	}
}

/// Error returned when a string cannot be read as a *Version*.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not a valid version")]
pub struct ParseVersionError(pub String);

impl Version {
	/// Returns the version exactly as it was written.
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Builds a purely numeric version, such as *[1, 9, 32]*.
	pub fn from_parts(parts: &[u64]) -> Self {
		Self {
			raw: parts.iter().join("."),
			parts: parts.iter().map(|&number| VersionPart { number, suffix: String::new() }).collect(),
		}
	}
}

impl FromStr for Version {
	type Err = ParseVersionError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let raw = s.trim();
		let body = raw.strip_prefix(['v', 'V']).unwrap_or(raw);

		if body.is_empty() || body.split('.').any(|p| p.trim().is_empty()) {
			return Err(ParseVersionError(s.to_owned()));
		}

		let parts = body.split('.')
			.map(|p| VersionPart::parse(p.trim()))
			.collect();

		Ok(Self { raw: raw.to_owned(), parts })
	}
}

impl Ord for Version {
	fn cmp(&self, other: &Self) -> Ordering {
		let zero = VersionPart::default();
		let len = self.parts.len().max(other.parts.len());

		(0..len)
			.map(|i| {
				let a = self.parts.get(i).unwrap_or(&zero);
				let b = other.parts.get(i).unwrap_or(&zero);
				a.cmp(b)
			})
			.find(|o| o.is_ne())
			.unwrap_or(Ordering::Equal)
	}
}

impl PartialOrd for Version {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl PartialEq for Version {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other).is_eq()
	}
}

impl Eq for Version {}

impl Display for Version {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.raw)
	}
}

/// The generations of the install script format.
/// Each version is a superset of the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScriptVersion {
	V1_0,
	V2_0,
	V3_0,
	V4_0,
	V5_0,
}

/// Base location of the published schemas, used when writing a script's schema declaration.
const SCHEMA_ROOT: &str = "http://qconsulting.ca/fo3/";

impl ScriptVersion {
	/// Every supported version, oldest first.
	pub const ALL: [ScriptVersion; 5] = [
		ScriptVersion::V1_0,
		ScriptVersion::V2_0,
		ScriptVersion::V3_0,
		ScriptVersion::V4_0,
		ScriptVersion::V5_0,
	];

	/// The identifier used for this version inside documents, such as "5.0".
	pub fn identifier(&self) -> &'static str {
		match self {
			ScriptVersion::V1_0 => "1.0",
			ScriptVersion::V2_0 => "2.0",
			ScriptVersion::V3_0 => "3.0",
			ScriptVersion::V4_0 => "4.0",
			ScriptVersion::V5_0 => "5.0",
		}
	}

	/// Looks up a version by its identifier.
	/// Unknown identifiers return *None*; there is no guessing at newer formats.
	pub fn from_identifier(id: &str) -> Option<Self> {
		let id = id.trim();
		Self::ALL.into_iter().find(|v| v.identifier() == id)
	}

	/// The schema location written into a document's root element.
	pub fn schema_location(&self) -> String {
		format!("{SCHEMA_ROOT}ModConfig{}.xsd", self.identifier())
	}

	/// The object-model capabilities this version's grammar can express.
	pub fn capabilities(&self) -> Capabilities {
		let at_least = |v: ScriptVersion| *self >= v;

		Capabilities {
			install_steps: at_least(ScriptVersion::V2_0),
			flags: at_least(ScriptVersion::V2_0),
			conditional_installs: at_least(ScriptVersion::V2_0),
			header_display: at_least(ScriptVersion::V3_0),
			sort_order: at_least(ScriptVersion::V3_0),
			step_visibility: at_least(ScriptVersion::V4_0),
			file_attributes: at_least(ScriptVersion::V4_0),
			nested_conditions: at_least(ScriptVersion::V5_0),
		}
	}
}

impl Display for ScriptVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.identifier())
	}
}

impl FromStr for ScriptVersion {
	type Err = ScriptError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_identifier(s).ok_or_else(|| ScriptError::UnsupportedVersion(s.to_owned()))
	}
}

/// Describes which optional parts of the object model a script version supports.
/// Readers never populate, and writers refuse to emit, anything their table leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities {
	/// Multiple named install steps. Without this, a script has at most one unnamed step.
	pub install_steps: bool,

	/// Flag conditions and the flags options set when installed.
	pub flags: bool,

	/// File sets installed when a condition holds.
	pub conditional_installs: bool,

	/// Title colour, title position, and image display settings.
	pub header_display: bool,

	/// The 'order' attribute on steps, groups, and options.
	pub sort_order: bool,

	/// Conditions that hide a whole install step.
	pub step_visibility: bool,

	/// File priority, 'alwaysInstall', and 'installIfUsable'.
	pub file_attributes: bool,

	/// Composite conditions inside other composite conditions.
	pub nested_conditions: bool,
}

impl Capabilities {
	/// Checks if a feature is part of this table.
	pub fn supports(&self, feature: Feature) -> bool {
		match feature {
			Feature::InstallSteps => self.install_steps,
			Feature::Flags => self.flags,
			Feature::ConditionalInstalls => self.conditional_installs,
			Feature::HeaderDisplay => self.header_display,
			Feature::SortOrder => self.sort_order,
			Feature::StepVisibility => self.step_visibility,
			Feature::FileAttributes => self.file_attributes,
			Feature::NestedConditions => self.nested_conditions,
		}
	}
}

/// A single capability a script can make use of.
/// See *Capabilities* for what each one means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
	InstallSteps,
	Flags,
	ConditionalInstalls,
	HeaderDisplay,
	SortOrder,
	StepVisibility,
	FileAttributes,
	NestedConditions,
}

impl Display for Feature {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let label = match self {
			Feature::InstallSteps => "named install steps",
			Feature::Flags => "condition flags",
			Feature::ConditionalInstalls => "conditional file installs",
			Feature::HeaderDisplay => "header display settings",
			Feature::SortOrder => "sort orders",
			Feature::StepVisibility => "step visibility conditions",
			Feature::FileAttributes => "file priorities and install attributes",
			Feature::NestedConditions => "nested conditions",
		};

		f.write_str(label)
	}
}
