//! This module provides functions to check a script against its package, and a selection against its script.

use crate::{host::PackageSource, prelude::*, selection::{visible_steps, Selection}};

/// Lists every source path the script mentions that the package does not have.
/// Folders count as missing when they contain no files.
pub fn missing_sources(script: &Script, package: &dyn PackageSource) -> Vec<String> {
	script.all_files()
		.filter(|f| match f.is_folder {
			// An empty folder source means the whole package.
			true => !f.source.is_empty() && package.get_file_list(&f.source, true).map_or(true, |l| l.is_empty()),
			false => !package.contains_file(&f.source),
		})
		.map(|f| f.source.clone())
		.unique()
		.collect()
}

/// Ensures every file the script mentions exists in the package, returning an *Err* if one doesn't.
pub fn ensure_sources(script: &Script, package: &dyn PackageSource) -> AppResult<()> {
	let missing = missing_sources(script, package);
	if missing.is_empty() { return Ok(()); }

	let error = Notice::from_preset(NoticePreset::Error, "Package")
		.add_field("Description", "The install script refers to files that are not in the package.")
		.add_field("Files", &missing.join(", "))
		.add_field("Suggestion", "Check that the package was extracted completely.");

	Err(AppError::Custom(error))
}

/// Checks a selection against the rules of each group, returning a warning for every problem found.
/// The engine installs whatever it is given, so these are warnings rather than errors.
pub fn check_selection(script: &Script, context: &ConditionContext, selection: &Selection) -> Vec<Notice> {
	let visible = visible_steps(script, context);
	let mut notices = Vec::new();

	let warn = |description: String| {
		Notice::from_preset(NoticePreset::Warning, "Selection").add_field("Description", &description)
	};

	for (s, step) in script.steps.iter().enumerate() {
		let is_visible = visible.contains(&s);

		for (g, group) in step.groups.iter().enumerate() {
			let ids = (0..group.options.len()).map(|o| OptionId::new(s, g, o)).collect_vec();
			let chosen = ids.iter().filter(|id| selection.is_chosen(**id)).count();

			if !is_visible {
				if chosen > 0 {
					notices.push(warn(format!("Options in the hidden step '{}' will not be installed.", step.name)));
				}

				continue;
			}

			if !group.mode.accepts(chosen, group.options.len()) {
				notices.push(warn(format!(
					"The group '{}' is {}, but {chosen} of its {} option(s) were picked.",
					group.name, group.mode, group.options.len()
				)));
			}

			for (id, option) in ids.iter().zip(group.options.iter()) {
				match (context.resolve_type(&option.type_resolver), selection.is_chosen(*id)) {
					(InstallType::NotUsable, true) => {
						notices.push(warn(format!("The option '{}' is not usable, but it was picked anyway.", option.name)));
					}

					(InstallType::Required, false) => {
						notices.push(warn(format!("The option '{}' is required, but it was not picked.", option.name)));
					}

					_ => {},
				}
			}
		}
	}

	notices
}
