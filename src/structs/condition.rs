//! This module defines the condition tree scripts use to gate steps, option types, and file sets.
//! Conditions are plain data; see *ConditionContext* for how they are evaluated.

use std::fmt::Display;

use crate::{prelude::*, util::path::normalize_path};

/// The state of a component (usually a plugin) relative to the target game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentState {
	/// The component is not installed at all.
	Missing,

	/// The component is installed, but not active.
	Inactive,

	/// The component is installed and active.
	Active,
}

impl ComponentState {
	/// The name used for this state in script documents.
	pub fn as_str(&self) -> &'static str {
		match self {
			ComponentState::Missing => "Missing",
			ComponentState::Inactive => "Inactive",
			ComponentState::Active => "Active",
		}
	}

	/// Looks up a state by its document name.
	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"Missing" => Some(ComponentState::Missing),
			"Inactive" => Some(ComponentState::Inactive),
			"Active" => Some(ComponentState::Active),
			_ => None,
		}
	}
}

impl Display for ComponentState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.as_str().to_lowercase())
	}
}

/// The pieces of software whose versions a condition can check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionSubject {
	/// The game the package is being installed into.
	TargetApp,

	/// The game's script extender.
	Extender,

	/// The mod manager itself.
	ManagerTool,
}

impl Display for VersionSubject {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let label = match self {
			VersionSubject::TargetApp => "game",
			VersionSubject::Extender => "script extender",
			VersionSubject::ManagerTool => "mod manager",
		};

		f.write_str(label)
	}
}

/// How a composite condition folds its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
	#[default]
	And,
	Or,
}

impl Operator {
	/// The name used for this operator in script documents.
	pub fn as_str(&self) -> &'static str {
		match self {
			Operator::And => "And",
			Operator::Or => "Or",
		}
	}

	/// Looks up an operator by its document name.
	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"And" => Some(Operator::And),
			"Or" => Some(Operator::Or),
			_ => None,
		}
	}
}

/// A node in a condition tree.
/// Trees are built once by a reader and never change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
	/// True if the component at *path* is currently in *state*.
	/// The path is normalized when built through *Condition::component*.
	ComponentState {
		path: String,
		state: ComponentState,
	},

	/// True if the subject's version is known and at least *min*.
	VersionAtLeast {
		subject: VersionSubject,
		min: Version,
	},

	/// True if the named flag is set to exactly *value*.
	FlagEquals {
		flag: String,
		value: String,
	},

	/// Folds the children with the operator.
	/// An empty AND is true, while an empty OR is false.
	Composite {
		operator: Operator,
		children: Vec<Condition>,
	},
}

impl Condition {
	/// A condition that is always true, which is an empty AND.
	pub fn always() -> Self {
		Condition::Composite { operator: Operator::And, children: Vec::new() }
	}

	pub fn and(children: Vec<Condition>) -> Self {
		Condition::Composite { operator: Operator::And, children }
	}

	pub fn or(children: Vec<Condition>) -> Self {
		Condition::Composite { operator: Operator::Or, children }
	}

	pub fn component(path: impl AsRef<str>, state: ComponentState) -> Self {
		Condition::ComponentState { path: normalize_path(path), state }
	}

	pub fn version_at_least(subject: VersionSubject, min: Version) -> Self {
		Condition::VersionAtLeast { subject, min }
	}

	pub fn flag(flag: impl Into<String>, value: impl Into<String>) -> Self {
		Condition::FlagEquals { flag: flag.into(), value: value.into() }
	}

	/// Returns *true* if this is the empty AND produced by *Condition::always*.
	pub fn is_always(&self) -> bool {
		matches!(self, Condition::Composite { operator: Operator::And, children } if children.is_empty())
	}

	/// Checks if any leaf of this tree is a flag condition.
	pub fn uses_flags(&self) -> bool {
		match self {
			Condition::FlagEquals { .. } => true,
			Condition::Composite { children, .. } => children.iter().any(Condition::uses_flags),
			_ => false,
		}
	}

	/// Checks if a composite appears directly inside another composite anywhere in this tree.
	pub fn has_nested_composites(&self) -> bool {
		let Condition::Composite { children, .. } = self else { return false };

		children.iter().any(|c| matches!(c, Condition::Composite { .. }))
	}
}

impl Display for Condition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Condition::ComponentState { path, state } => write!(f, "'{path}' is {state}"),
			Condition::VersionAtLeast { subject, min } => write!(f, "{subject} version >= {min}"),
			Condition::FlagEquals { flag, value } => write!(f, "flag '{flag}' is '{value}'"),
			Condition::Composite { children, .. } if children.is_empty() && self.is_always() => f.write_str("always"),
			Condition::Composite { children, .. } if children.is_empty() => f.write_str("never"),
			Condition::Composite { operator, children } => {
				let sep = format!(" {} ", operator.as_str().to_uppercase());
				write!(f, "({})", children.iter().join(&sep))
			}
		}
	}
}
