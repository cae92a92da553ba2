// Tests for default choices and selection checks.

use super::*;
use crate::{
	selection::{default_selection, visible_steps, Selection},
	validation::{check_selection, ensure_sources, missing_sources},
};

fn group(name: &str, mode: SelectionMode, options: &[(&str, InstallType)]) -> OptionGroup {
	let mut group = OptionGroup::new(name, mode);
	group.options = options.iter().map(|(n, t)| InstallOption::new(*n, *t)).collect();
	group
}

/// Two steps, where picking "Tree/Big" in the first shows the second.
fn wizard() -> Script {
	let mut first = InstallStep::new("First");
	first.groups.push(group("Tree", SelectionMode::SelectExactlyOne, &[
		("Small", InstallType::NotUsable),
		("Big", InstallType::Optional),
		("Huge", InstallType::Optional),
	]));
	first.groups.push(group("Extras", SelectionMode::SelectAny, &[
		("Recommended", InstallType::Recommended),
		("Optional", InstallType::Optional),
	]));
	first.groups.push(group("Everything", SelectionMode::SelectAll, &[
		("One", InstallType::Optional),
		("Broken", InstallType::NotUsable),
	]));

	first.groups[0].options[1].condition_flags.push(ConditionFlag { name: "tree".to_owned(), value: "big".to_owned() });

	let mut second = InstallStep::new("Second");
	second.visible = Some(Condition::flag("tree", "big"));
	second.groups.push(group("Leaves", SelectionMode::SelectAtLeastOne, &[("Green", InstallType::Optional)]));

	let mut script = Script::new(ScriptVersion::V4_0, "Wizard");
	script.steps = vec![first, second];
	script
}

#[test]
fn defaults_follow_types_and_modes() {
	let registry = FakeRegistry::new();
	let versions = StaticVersions::default();
	let context = ConditionContext::new(&registry, &versions);
	let script = wizard();

	let selection = default_selection(&script, &context);
	let chosen = selection.chosen().collect_vec();

	assert_eq!(chosen, vec![
		// The first usable option of an exactly-one group.
		OptionId::new(0, 0, 1),
		OptionId::new(0, 1, 0),
		OptionId::new(0, 2, 0),

		// Picking "Big" set the flag that shows the second step.
		OptionId::new(1, 0, 0),
	]);

	assert!(selection.is_activated(OptionId::new(0, 0, 1)));

	// The caller's context never saw the flag.
	assert!(context.flags().is_empty());
	assert_eq!(visible_steps(&script, &context), vec![0]);
}

#[test]
fn selection_checks_warn_about_broken_rules() {
	let registry = FakeRegistry::new();
	let versions = StaticVersions::default();
	let context = ConditionContext::new(&registry, &versions);

	let mut script = wizard();
	script.steps[0].groups[1].options[1].type_resolver = TypeResolver::fixed(InstallType::Required);

	let selection: Selection = [
		OptionId::new(0, 0, 0),
		OptionId::new(0, 0, 1),
		OptionId::new(1, 0, 0),
	].into_iter().collect();

	let descriptions = check_selection(&script, &context, &selection).iter()
		.filter_map(|n| n.field("Description").map(str::to_owned))
		.collect_vec();

	assert!(descriptions.iter().any(|d| d.contains("'Tree'") && d.contains("2 of its 3")));
	assert!(descriptions.iter().any(|d| d.contains("'Small' is not usable")));
	assert!(descriptions.iter().any(|d| d.contains("'Optional' is required")));
	assert!(descriptions.iter().any(|d| d.contains("'Everything'")));
	assert!(descriptions.iter().any(|d| d.contains("hidden step 'Second'")));

	assert!(check_selection(&script, &context, &Selection::new()).len() >= 2);
}

#[test]
fn selection_tracks_activation_separately() {
	let id = OptionId::new(0, 0, 0);
	let mut selection = Selection::new();

	selection.choose_inactive(id);
	assert!(selection.is_chosen(id) && !selection.is_activated(id));

	selection.choose(id);
	assert!(selection.is_activated(id));

	selection.unchoose(id);
	assert!(!selection.is_chosen(id) && !selection.is_activated(id));
	assert!(selection.is_empty());
}

#[test]
fn missing_sources_are_reported() {
	let package = FakePackage::with_files(&["core/main.esp", "textures/a.dds"]);

	let mut script = Script::new(ScriptVersion::V2_0, "Test");
	script.required_files = vec![
		InstallableFile::file("Core\\Main.esp", ""),
		InstallableFile::folder("textures", ""),
		InstallableFile::folder("meshes", ""),
		InstallableFile::file("gone.esp", ""),
		InstallableFile::file("gone.esp", "again.esp"),
	];

	assert_eq!(missing_sources(&script, &package), vec!["meshes", "gone.esp"]);

	match ensure_sources(&script, &package) {
		Err(AppError::Custom(notice)) => assert_eq!(notice.field("Files"), Some("meshes, gone.esp")),
		other => panic!("expected a custom error, got {other:?}"),
	}

	script.required_files.truncate(2);
	assert!(ensure_sources(&script, &package).is_ok());
}
