//! This module evaluates conditions against the state of the target game.
//! A *ConditionContext* pairs the game's collaborators with the flag table of a single install run.

use crate::{
	host::{ComponentRegistry, VersionOracle},
	prelude::*,
};

/// The flags set so far during an install run, in the order they were first set.
/// Flags that were never set read as *None*, which never equals any expected value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagTable(IndexMap<String, String>);

impl FlagTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(name).map(String::as_str)
	}

	/// Sets a flag, replacing its previous value.
	pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.0.insert(name.into(), value.into());
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlagTable {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// The state conditions are evaluated against.
/// Component and version lookups go to the injected collaborators, while flags live in this context.
/// Only the installer writes flags; use *ConditionContext::fork* to try things out without touching the real table.
pub struct ConditionContext<'a> {
	registry: &'a dyn ComponentRegistry,
	versions: &'a dyn VersionOracle,
	flags: FlagTable,
}

impl<'a> ConditionContext<'a> {
	/// Builds a context with an empty flag table.
	pub fn new(registry: &'a dyn ComponentRegistry, versions: &'a dyn VersionOracle) -> Self {
		Self { registry, versions, flags: FlagTable::new() }
	}

	/// Replaces this context's flag table, which lets callers pre-seed flags.
	pub fn with_flags(mut self, flags: FlagTable) -> Self {
		self.flags = flags;
		self
	}

	pub fn flags(&self) -> &FlagTable {
		&self.flags
	}

	pub(crate) fn set_flag(&mut self, name: &str, value: &str) {
		debug!("Setting flag '{name}' to '{value}'.");
		self.flags.set(name, value);
	}

	/// Copies this context, including its flags, so a caller can evaluate "what if" scenarios.
	/// Changes made to the copy never reach this context.
	pub fn fork(&self) -> ConditionContext<'a> {
		ConditionContext {
			registry: self.registry,
			versions: self.versions,
			flags: self.flags.clone(),
		}
	}

	/// Looks up the state of a component.
	pub fn component_state(&self, path: &str) -> ComponentState {
		match (self.registry.is_registered(path), self.registry.is_active(path)) {
			(false, _) => ComponentState::Missing,
			(true, false) => ComponentState::Inactive,
			(true, true) => ComponentState::Active,
		}
	}

	/// Queries a subject's version. *None* means the version is unknown, or the subject isn't installed.
	pub fn version_of(&self, subject: VersionSubject) -> Option<Version> {
		match subject {
			VersionSubject::TargetApp => self.versions.target_app_version(),
			VersionSubject::Extender => self.versions.extender_version(),
			VersionSubject::ManagerTool => Some(self.versions.manager_version()),
		}
	}

	/// Evaluates a condition.
	/// Composites stop at the first child that decides their result.
	pub fn evaluate(&self, condition: &Condition) -> bool {
		match condition {
			Condition::ComponentState { path, state } => self.component_state(path) == *state,

			Condition::VersionAtLeast { subject, min } => {
				self.version_of(*subject).is_some_and(|v| v >= *min)
			}

			Condition::FlagEquals { flag, value } => self.flags.get(flag) == Some(value.as_str()),

			Condition::Composite { operator: Operator::And, children } => {
				children.iter().all(|c| self.evaluate(c))
			}

			Condition::Composite { operator: Operator::Or, children } => {
				children.iter().any(|c| self.evaluate(c))
			}
		}
	}

	/// Describes why a condition is not satisfied, for showing to users.
	/// Returns *None* if the condition holds.
	pub fn explain(&self, condition: &Condition) -> Option<String> {
		if self.evaluate(condition) { return None; }

		let message = match condition {
			Condition::ComponentState { path, state } => {
				let found = self.component_state(path);
				format!("component '{path}' is not {state} (found: {found})")
			}

			Condition::VersionAtLeast { subject, min } => match self.version_of(*subject) {
				Some(found) => format!("requires {subject} version >= {min}, found {found}"),
				None => format!("requires {subject} version >= {min}, but it is not installed"),
			},

			Condition::FlagEquals { flag, value } => match self.flags.get(flag) {
				Some(found) => format!("requires flag '{flag}' to be '{value}', found '{found}'"),
				None => format!("requires flag '{flag}' to be '{value}', but it is not set"),
			},

			Condition::Composite { operator: Operator::And, children } => {
				return children.iter().find_map(|c| self.explain(c));
			}

			Condition::Composite { operator: Operator::Or, children } if children.is_empty() => {
				"no alternatives were given".to_owned()
			}

			Condition::Composite { operator: Operator::Or, children } => {
				let reasons = children.iter()
					.filter_map(|c| self.explain(c))
					.join("; ");

				format!("none of the following were satisfied: {reasons}")
			}
		};

		Some(message)
	}

	/// Resolves an option's type.
	/// The first pattern whose condition holds wins; otherwise, the default type is used.
	pub fn resolve_type(&self, resolver: &TypeResolver) -> InstallType {
		resolver.patterns.iter()
			.find(|p| self.evaluate(&p.condition))
			.map_or(resolver.default, |p| p.install_type)
	}
}
