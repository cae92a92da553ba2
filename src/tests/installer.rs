// Tests for install runs.

use super::*;
use crate::{
	host::{IdentityPaths, PathAdjuster},
	installer::{count_items, install, Collaborators, InstallOutcome},
	selection::Selection,
};

/// Everything a run needs, held together so tests can inspect the fakes afterwards.
struct Harness {
	package: FakePackage,
	registry: FakeRegistry,
	files: RecordingInstaller,
	versions: StaticVersions,
	flags: FlagTable,
}

impl Harness {
	fn new(paths: &[&str]) -> Self {
		Self {
			package: FakePackage::with_files(paths),
			registry: FakeRegistry::new(),
			files: RecordingInstaller::default(),
			versions: game_versions("1.0"),
			flags: FlagTable::new(),
		}
	}

	fn run(&self, script: &Script, selection: &Selection, monitor: &mut CountingMonitor) -> (Result<InstallOutcome, InstallError>, FlagTable) {
		self.run_with(script, selection, monitor, &IdentityPaths)
	}

	fn run_with(
		&self,
		script: &Script,
		selection: &Selection,
		monitor: &mut CountingMonitor,
		paths: &dyn PathAdjuster,
	) -> (Result<InstallOutcome, InstallError>, FlagTable) {
		init_logger();

		let mut context = ConditionContext::new(&self.registry, &self.versions).with_flags(self.flags.clone());
		let with = Collaborators { package: &self.package, registry: &self.registry, files: &self.files, paths };

		let result = install(script, &mut context, selection, &with, monitor);
		(result, context.flags().clone())
	}
}

/// Builds a 2.0 script with one step holding a single group.
fn one_group_script(mode: SelectionMode, options: Vec<InstallOption>) -> Script {
	let mut group = OptionGroup::new("Variant", mode);
	group.options = options;

	let mut step = InstallStep::new("Main");
	step.groups.push(group);

	Script::new(ScriptVersion::V2_0, "Test").tap_mut(|s| s.steps.push(step))
}

fn option_with(name: &str, install_type: InstallType, files: Vec<InstallableFile>) -> InstallOption {
	InstallOption::new(name, install_type).tap_mut(|o| o.files = files)
}

#[test]
fn required_files_install_in_order_without_conditions() {
	let harness = Harness::new(&["core/main.esp"]);

	let mut script = Script::new(ScriptVersion::V1_0, "Test");
	script.required_files = vec![
		InstallableFile::file("core/main.esp", "main.esp"),
		InstallableFile::file("core/main.esp", "main.esp"),
	];

	let mut monitor = CountingMonitor::default();
	let (result, _) = harness.run(&script, &Selection::new(), &mut monitor);
	let outcome = result.unwrap();

	assert!(!outcome.is_cancelled());
	assert_eq!(*harness.files.calls.borrow(), vec![
		("core/main.esp".to_owned(), "main.esp".to_owned()),
		("core/main.esp".to_owned(), "main.esp".to_owned()),
	]);

	// Nothing asked for a component's state.
	assert_eq!(harness.registry.lookups.get(), 0);
	assert_eq!(outcome.summary().files_installed, 2);
	assert_eq!(harness.registry.activations.borrow().len(), 2);

	let items = monitor.reports.iter().map(|(item, total, written, _)| (*item, *total, *written)).collect_vec();
	assert_eq!(items, vec![(1, 2, 1), (2, 2, 2)]);
}

#[test]
fn exactly_one_group_installs_only_the_chosen_option() {
	let harness = Harness::new(&["a/a.dat", "b/b.dat"]);

	let script = one_group_script(SelectionMode::SelectExactlyOne, vec![
		option_with("A", InstallType::Optional, vec![InstallableFile::file("a/a.dat", "plugins/a.dat")]),
		option_with("B", InstallType::Optional, vec![InstallableFile::file("b/b.dat", "plugins/b.dat")]),
	]);

	let selection: Selection = [OptionId::new(0, 0, 0)].into_iter().collect();
	let (result, _) = harness.run(&script, &selection, &mut CountingMonitor::default());

	result.unwrap();
	assert_eq!(harness.files.destinations(), vec!["plugins/a.dat"]);
	assert_eq!(*harness.registry.activations.borrow(), vec![("plugins/a.dat".to_owned(), true)]);
}

#[test]
fn activation_is_skipped_when_not_requested_or_not_possible() {
	let mut harness = Harness::new(&["a/a.esp", "a/readme.txt"]);
	harness.registry = FakeRegistry::new().with_inert("docs/readme.txt");

	let script = one_group_script(SelectionMode::SelectAny, vec![
		option_with("A", InstallType::Optional, vec![
			InstallableFile::file("a/a.esp", "a.esp"),
			InstallableFile::file("a/readme.txt", "docs/readme.txt"),
		]),
	]);

	let mut selection = Selection::new();
	selection.choose(OptionId::new(0, 0, 0));
	harness.run(&script, &selection, &mut CountingMonitor::default()).0.unwrap();
	assert_eq!(*harness.registry.activations.borrow(), vec![("a.esp".to_owned(), true)]);

	let harness = Harness::new(&["a/a.esp", "a/readme.txt"]);
	let selection = selection.without_activation();
	harness.run(&script, &selection, &mut CountingMonitor::default()).0.unwrap();

	assert_eq!(harness.files.destinations().len(), 2);
	assert!(harness.registry.activations.borrow().is_empty());
}

#[test]
fn conditional_files_follow_flags_set_by_options() {
	let mut script = one_group_script(SelectionMode::SelectExactlyOne, vec![
		option_with("A", InstallType::Optional, vec![]),
		option_with("B", InstallType::Optional, vec![]),
	]);

	let options = &mut script.steps[0].groups[0].options;
	options[0].condition_flags.push(ConditionFlag { name: "choice".to_owned(), value: "A".to_owned() });
	options[1].condition_flags.push(ConditionFlag { name: "choice".to_owned(), value: "B".to_owned() });

	script.conditional_file_sets.push(ConditionalFileSet {
		condition: Condition::flag("choice", "B"),
		files: vec![InstallableFile::file("b/patch.esp", "patch.esp")],
	});

	// Picking A leaves the flag at "A", so the set is skipped.
	let harness = Harness::new(&["b/patch.esp"]);
	let selection: Selection = [OptionId::new(0, 0, 0)].into_iter().collect();
	let (result, flags) = harness.run(&script, &selection, &mut CountingMonitor::default());

	result.unwrap();
	assert_eq!(flags.get("choice"), Some("A"));
	assert!(harness.files.destinations().is_empty());

	// Picking B installs the set, activated even though the option asked for no activation.
	let harness = Harness::new(&["b/patch.esp"]);
	let selection: Selection = [OptionId::new(0, 0, 1)].into_iter().collect();
	let (result, flags) = harness.run(&script, &selection.without_activation(), &mut CountingMonitor::default());

	result.unwrap();
	assert_eq!(flags.get("choice"), Some("B"));
	assert_eq!(harness.files.destinations(), vec!["patch.esp"]);
	assert_eq!(*harness.registry.activations.borrow(), vec![("patch.esp".to_owned(), true)]);
}

#[test]
fn cancelling_stops_before_the_next_file() {
	let paths = ["f/1", "f/2", "f/3", "f/4", "f/5"];
	let harness = Harness::new(&paths);

	let mut script = Script::new(ScriptVersion::V1_0, "Test");
	script.required_files = paths.iter().map(|p| InstallableFile::file(p, "")).collect();

	let mut monitor = CountingMonitor { cancel_after: Some(3), ..Default::default() };
	let (result, _) = harness.run(&script, &Selection::new(), &mut monitor);

	match result.unwrap() {
		InstallOutcome::Cancelled(summary) => assert_eq!(summary.files_installed, 3),
		other => panic!("expected a cancelled run, got {other:?}"),
	}

	assert_eq!(harness.files.calls.borrow().len(), 3);
	assert_eq!(monitor.reports.len(), 3);
}

#[test]
fn unmet_prerequisites_touch_nothing() {
	let mut harness = Harness::new(&["core/main.esp"]);
	harness.versions = game_versions("0.9");

	let mut script = Script::new(ScriptVersion::V1_0, "Test");
	script.prerequisites = Condition::version_at_least(VersionSubject::TargetApp, "1.0".parse().unwrap());
	script.required_files.push(InstallableFile::file("core/main.esp", "main.esp"));

	let mut monitor = CountingMonitor::default();
	let (result, _) = harness.run(&script, &Selection::new(), &mut monitor);

	match result {
		Err(InstallError::UnfulfilledPrerequisite(reason)) => assert!(reason.contains("1.0") && reason.contains("0.9")),
		other => panic!("expected unfulfilled prerequisites, got {other:?}"),
	}

	assert!(harness.files.calls.borrow().is_empty());
	assert!(monitor.reports.is_empty());
}

#[test]
fn hidden_steps_are_skipped() {
	let harness = Harness::new(&["a/a.dat", "b/b.dat"]);

	let mut script = one_group_script(SelectionMode::SelectAny, vec![
		option_with("A", InstallType::Optional, vec![InstallableFile::file("a/a.dat", "a.dat")]),
	]);

	let mut hidden = InstallStep::new("Hidden");
	hidden.visible = Some(Condition::flag("never", "set"));
	hidden.groups.push(OptionGroup::new("G", SelectionMode::SelectAny).tap_mut(|g| {
		g.options.push(option_with("B", InstallType::Optional, vec![InstallableFile::file("b/b.dat", "b.dat")]));
	}));
	script.steps.push(hidden);

	let selection: Selection = [OptionId::new(0, 0, 0), OptionId::new(1, 0, 0)].into_iter().collect();
	let mut monitor = CountingMonitor::default();
	harness.run(&script, &selection, &mut monitor).0.unwrap();

	assert_eq!(harness.files.destinations(), vec!["a.dat"]);

	// The hidden option was counted up front, so the run closes the gap itself.
	assert_eq!(count_items(&script, &selection), 2);
	assert_eq!(monitor.reports, vec![
		(1, 2, 1, "a.dat".to_owned()),
		(2, 2, 1, String::new()),
	]);
}

#[test]
fn cancelled_runs_do_not_close_their_progress() {
	let harness = Harness::new(&["f/1", "f/2"]);

	let mut script = Script::new(ScriptVersion::V1_0, "Test");
	script.required_files = vec![InstallableFile::file("f/1", ""), InstallableFile::file("f/2", "")];

	let mut monitor = CountingMonitor { cancel_after: Some(1), ..Default::default() };
	let (result, _) = harness.run(&script, &Selection::new(), &mut monitor);

	assert!(result.unwrap().is_cancelled());
	assert_eq!(monitor.reports.iter().map(|r| r.0).collect_vec(), vec![1]);
}

#[test]
fn priorities_order_files_within_a_list() {
	let harness = Harness::new(&["low", "mid", "high", "tie"]);

	let mut script = Script::new(ScriptVersion::V4_0, "Test");
	script.required_files = vec![
		InstallableFile::file("high", "").tap_mut(|f| f.priority = 10),
		InstallableFile::file("mid", ""),
		InstallableFile::file("low", "").tap_mut(|f| f.priority = -1),
		InstallableFile::file("tie", ""),
	];

	harness.run(&script, &Selection::new(), &mut CountingMonitor::default()).0.unwrap();
	assert_eq!(harness.files.destinations(), vec!["low", "mid", "tie", "high"]);
}

#[test]
fn unchosen_options_still_install_flagged_files() {
	let harness = Harness::new(&["a/always", "a/usable", "a/plain", "b/usable"]);

	let mut usable_only = option_with("B", InstallType::NotUsable, vec![
		InstallableFile::file("b/usable", "").tap_mut(|f| f.install_if_usable = true),
	]);
	usable_only.description = "Never usable.".to_owned();

	let script = one_group_script(SelectionMode::SelectAny, vec![
		option_with("A", InstallType::Optional, vec![
			InstallableFile::file("a/always", "").tap_mut(|f| f.always_install = true),
			InstallableFile::file("a/usable", "").tap_mut(|f| f.install_if_usable = true),
			InstallableFile::file("a/plain", ""),
		]),
		usable_only,
	]);

	let selection = Selection::new();
	assert_eq!(count_items(&script, &selection), 3);

	harness.run(&script, &selection, &mut CountingMonitor::default()).0.unwrap();

	assert_eq!(harness.files.destinations(), vec!["a/always", "a/usable"]);
	assert!(harness.registry.activations.borrow().is_empty());
}

#[test]
fn folders_install_recursively() {
	let harness = Harness::new(&["data/a.esp", "data/textures/t.dds", "other/x"]);

	let mut script = Script::new(ScriptVersion::V1_0, "Test");
	script.required_files = vec![InstallableFile::folder("Data", "mods/data")];

	harness.run(&script, &Selection::new(), &mut CountingMonitor::default()).0.unwrap();

	assert_eq!(harness.files.destinations(), vec!["mods/data/a.esp", "mods/data/textures/t.dds"]);

	// Only folders installed in place change activation.
	assert!(harness.registry.activations.borrow().is_empty());
}

#[test]
fn folders_installed_in_place_toggle_activation() {
	let harness = Harness::new(&["data/a.esp", "data/b.esp"]);

	let script = one_group_script(SelectionMode::SelectAny, vec![
		option_with("A", InstallType::Optional, vec![InstallableFile::folder("data", "")]),
	]);

	let mut selection = Selection::new();
	selection.choose_inactive(OptionId::new(0, 0, 0));

	harness.run(&script, &selection, &mut CountingMonitor::default()).0.unwrap();

	assert_eq!(harness.files.destinations(), vec!["data/a.esp", "data/b.esp"]);
	assert_eq!(*harness.registry.activations.borrow(), vec![
		("data/a.esp".to_owned(), false),
		("data/b.esp".to_owned(), false),
	]);
}

#[test]
fn declined_files_are_not_activated() {
	let mut harness = Harness::new(&["main.esp"]);
	harness.files.declined.insert("main.esp".to_owned());

	let mut script = Script::new(ScriptVersion::V1_0, "Test");
	script.required_files.push(InstallableFile::file("main.esp", ""));

	let outcome = harness.run(&script, &Selection::new(), &mut CountingMonitor::default()).0.unwrap();

	assert_eq!(outcome.summary().files_declined, 1);
	assert!(harness.registry.activations.borrow().is_empty());
}

#[test]
fn write_failures_stop_the_run() {
	let mut harness = Harness::new(&["one", "two", "three"]);
	harness.files.broken = Some("two".to_owned());

	let mut script = Script::new(ScriptVersion::V1_0, "Test");
	script.required_files = ["one", "two", "three"].map(|p| InstallableFile::file(p, "")).to_vec();

	match harness.run(&script, &Selection::new(), &mut CountingMonitor::default()).0 {
		Err(InstallError::Io { path, .. }) => assert_eq!(path, "two"),
		other => panic!("expected an IO error, got {other:?}"),
	}

	assert_eq!(harness.files.calls.borrow().len(), 2);

	// Files missing from the package fail the same way.
	let harness = Harness::new(&[]);
	match harness.run(&script, &Selection::new(), &mut CountingMonitor::default()).0 {
		Err(InstallError::Io { path, source }) => {
			assert_eq!(path, "one");
			assert_eq!(source.kind(), io::ErrorKind::NotFound);
		}
		other => panic!("expected an IO error, got {other:?}"),
	}
}

#[test]
fn destinations_pass_through_the_path_adjuster() {
	struct DataFolder;

	impl PathAdjuster for DataFolder {
		fn adjust_path(&self, format: &str, raw: &str) -> String {
			assert_eq!(format, "fomod");
			format!("Data/{raw}")
		}
	}

	let harness = Harness::new(&["main.esp"]);
	let mut script = Script::new(ScriptVersion::V1_0, "Test");
	script.required_files.push(InstallableFile::file("main.esp", ""));

	harness.run_with(&script, &Selection::new(), &mut CountingMonitor::default(), &DataFolder).0.unwrap();

	assert_eq!(harness.files.destinations(), vec!["Data/main.esp"]);
	assert_eq!(*harness.registry.activations.borrow(), vec![("Data/main.esp".to_owned(), true)]);
}
