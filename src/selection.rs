//! This module holds the user's choices for an install run, and works out sensible defaults for them.

use crate::prelude::*;

/// The options a user picked, and which of those should have their components activated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
	chosen: IndexSet<OptionId>,
	activated: IndexSet<OptionId>,
}

impl Selection {
	pub fn new() -> Self {
		Self::default()
	}

	/// Picks an option and asks for its components to be activated.
	pub fn choose(&mut self, id: OptionId) -> &mut Self {
		self.chosen.insert(id);
		self.activated.insert(id);
		self
	}

	/// Picks an option without touching the activation of its components.
	pub fn choose_inactive(&mut self, id: OptionId) -> &mut Self {
		self.chosen.insert(id);
		self.activated.shift_remove(&id);
		self
	}

	pub fn unchoose(&mut self, id: OptionId) -> &mut Self {
		self.chosen.shift_remove(&id);
		self.activated.shift_remove(&id);
		self
	}

	/// Keeps every pick, but stops activating any of them.
	pub fn without_activation(mut self) -> Self {
		self.activated.clear();
		self
	}

	pub fn is_chosen(&self, id: OptionId) -> bool {
		self.chosen.contains(&id)
	}

	/// Only chosen options can be activated.
	pub fn is_activated(&self, id: OptionId) -> bool {
		self.is_chosen(id) && self.activated.contains(&id)
	}

	pub fn chosen(&self) -> impl Iterator<Item = OptionId> + '_ {
		self.chosen.iter().copied()
	}

	pub fn len(&self) -> usize {
		self.chosen.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chosen.is_empty()
	}
}

impl FromIterator<OptionId> for Selection {
	fn from_iter<T: IntoIterator<Item = OptionId>>(iter: T) -> Self {
		let chosen: IndexSet<OptionId> = iter.into_iter().collect();
		Self { activated: chosen.clone(), chosen }
	}
}

/// Returns the indices of the steps that would currently be shown, in declaration order.
pub fn visible_steps(script: &Script, context: &ConditionContext) -> Vec<usize> {
	script.steps.iter()
		.enumerate()
		.filter(|(_, step)| step.visible.as_ref().map_or(true, |v| context.evaluate(v)))
		.map(|(i, _)| i)
		.collect()
}

/// Builds the selection a wizard would start with, if the user accepted every default.
///
/// Options that resolve to *Required* or *Recommended* are picked, as is every usable option in a *SelectAll* group.
/// Groups that need at least one pick get their first usable option when nothing else was picked.
/// Steps are resolved one after another on a forked context, so flags set by earlier picks affect later steps.
pub fn default_selection(script: &Script, context: &ConditionContext) -> Selection {
	let mut what_if = context.fork();
	let mut selection = Selection::new();

	for (s, step) in script.steps.iter().enumerate() {
		if let Some(ref visible) = step.visible {
			if !what_if.evaluate(visible) { continue; }
		}

		for (g, group) in step.groups.iter().enumerate() {
			let types = group.options.iter()
				.map(|o| what_if.resolve_type(&o.type_resolver))
				.collect_vec();

			let mut picks = types.iter()
				.enumerate()
				.filter(|(_, t)| t.is_preselected() || (group.mode == SelectionMode::SelectAll && t.is_usable()))
				.map(|(o, _)| o)
				.collect_vec();

			let needs_one = matches!(group.mode, SelectionMode::SelectExactlyOne | SelectionMode::SelectAtLeastOne);

			if picks.is_empty() && needs_one {
				picks.extend(types.iter().position(InstallType::is_usable));
			}

			if matches!(group.mode, SelectionMode::SelectExactlyOne | SelectionMode::SelectAtMostOne) {
				picks.truncate(1);
			}

			for o in picks {
				selection.choose(OptionId::new(s, g, o));

				for flag in group.options[o].condition_flags.iter() {
					what_if.set_flag(&flag.name, &flag.value);
				}
			}
		}
	}

	selection
}
