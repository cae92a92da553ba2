// Tests for versions, conditions, and their evaluation.

use super::*;
use crate::host::StaticVersions;

fn v(raw: &str) -> Version {
	raw.parse().unwrap()
}

#[test]
fn versions_compare_by_part() {
	assert!(v("1.10") > v("1.9"));
	assert!(v("1.9.32.0") > v("1.9.4"));
	assert_eq!(v("1.0"), v("1.0.0"));
	assert_eq!(v("v2"), v("2.0"));
	assert!(v("2.0b") > v("2.0a"));
	assert!("".parse::<Version>().is_err());
	assert!("1..2".parse::<Version>().is_err());
	assert_eq!(Version::from_parts(&[1, 4]).to_string(), "1.4");

	// Leading numbers decide before any suffix does.
	assert!(v("1.10b") > v("1.9"));
	assert!(v("1.9b") > v("1.9"));
	assert!(v("1.9b") < v("1.10"));
	assert!(v("1.beta") < v("1.1"));
}

#[test]
fn version_ordering_is_transitive() {
	let mut versions = ["10", "1a", "2", "1", "1.0b", "2a", "0.9"].map(v);
	versions.sort();

	let sorted = versions.iter().map(Version::as_str).collect_vec();
	assert_eq!(sorted, vec!["0.9", "1", "1.0b", "1a", "2", "2a", "10"]);

	assert!(v("1a") < v("2") && v("2") < v("10") && v("1a") < v("10"));
}

#[test]
fn suffixed_game_versions_pass_version_gates() {
	let registry = FakeRegistry::new();
	let versions = game_versions("1.10b");
	let context = ConditionContext::new(&registry, &versions);

	assert!(context.evaluate(&Condition::version_at_least(VersionSubject::TargetApp, v("1.9"))));
	assert!(!context.evaluate(&Condition::version_at_least(VersionSubject::TargetApp, v("1.11"))));
}

#[test]
fn component_states_come_from_the_registry() {
	let registry = FakeRegistry::new()
		.with_active("Data/Active.esp")
		.with_inactive("Inactive.esp");

	let versions = StaticVersions::default();
	let context = ConditionContext::new(&registry, &versions);

	assert_eq!(context.component_state("data\\active.ESP"), ComponentState::Active);
	assert_eq!(context.component_state("inactive.esp"), ComponentState::Inactive);
	assert_eq!(context.component_state("missing.esp"), ComponentState::Missing);

	assert!(context.evaluate(&Condition::component("Data/Active.esp", ComponentState::Active)));
	assert!(context.evaluate(&Condition::component("missing.esp", ComponentState::Missing)));
	assert!(!context.evaluate(&Condition::component("Inactive.esp", ComponentState::Active)));
}

#[test]
fn version_conditions_need_a_known_version() {
	let registry = FakeRegistry::new();
	let versions = game_versions("1.5.97");
	let context = ConditionContext::new(&registry, &versions);

	assert!(context.evaluate(&Condition::version_at_least(VersionSubject::TargetApp, v("1.5"))));
	assert!(context.evaluate(&Condition::version_at_least(VersionSubject::TargetApp, v("1.5.97.0"))));
	assert!(!context.evaluate(&Condition::version_at_least(VersionSubject::TargetApp, v("1.6"))));

	// No extender is installed, so even a zero version fails.
	assert!(!context.evaluate(&Condition::version_at_least(VersionSubject::Extender, v("0"))));
	assert!(context.evaluate(&Condition::version_at_least(VersionSubject::ManagerTool, v("0.0.1"))));
}

#[test]
fn flags_must_match_exactly() {
	let registry = FakeRegistry::new();
	let versions = StaticVersions::default();

	let flags: FlagTable = [("texture", "2k")].into_iter().collect();
	let context = ConditionContext::new(&registry, &versions).with_flags(flags);

	assert!(context.evaluate(&Condition::flag("texture", "2k")));
	assert!(!context.evaluate(&Condition::flag("texture", "2K")));
	assert!(!context.evaluate(&Condition::flag("unset", "")));
}

#[test]
fn empty_composites() {
	let registry = FakeRegistry::new();
	let versions = StaticVersions::default();
	let context = ConditionContext::new(&registry, &versions);

	assert!(context.evaluate(&Condition::always()));
	assert!(!context.evaluate(&Condition::or(vec![])));
	assert_eq!(context.explain(&Condition::always()), None);
	assert!(context.explain(&Condition::or(vec![])).is_some());
}

#[test]
fn composites_are_monotonic() {
	let registry = FakeRegistry::new();
	let versions = StaticVersions::default();
	let flags: FlagTable = [("a", "1")].into_iter().collect();
	let context = ConditionContext::new(&registry, &versions).with_flags(flags);

	let yes = Condition::flag("a", "1");
	let no = Condition::flag("a", "2");

	// Adding a false child never turns a false AND true.
	let and = Condition::and(vec![yes.clone(), no.clone()]);
	assert!(!context.evaluate(&and));
	assert!(!context.evaluate(&Condition::and(vec![yes.clone(), no.clone(), no.clone()])));

	// Adding a true child never turns a true OR false.
	let or = Condition::or(vec![no.clone(), yes.clone()]);
	assert!(context.evaluate(&or));
	assert!(context.evaluate(&Condition::or(vec![no.clone(), yes.clone(), yes.clone()])));

	// Nesting keeps these rules.
	assert!(context.evaluate(&Condition::and(vec![or.clone(), yes.clone()])));
	assert!(!context.evaluate(&Condition::or(vec![and, no])));
}

#[test]
fn and_stops_at_the_first_false_child() {
	let registry = FakeRegistry::new();
	let versions = StaticVersions::default();
	let context = ConditionContext::new(&registry, &versions);

	let condition = Condition::and(vec![
		Condition::flag("unset", "x"),
		Condition::component("a.esp", ComponentState::Active),
	]);

	assert!(!context.evaluate(&condition));
	assert_eq!(registry.lookups.get(), 0);
}

#[test]
fn explanations_name_the_failing_leaf() {
	let registry = FakeRegistry::new().with_inactive("Foo.esp");
	let versions = game_versions("0.9");
	let flags: FlagTable = [("choice", "A")].into_iter().collect();
	let context = ConditionContext::new(&registry, &versions).with_flags(flags);

	let component = Condition::component("Foo.esp", ComponentState::Active);
	assert_eq!(
		context.explain(&component).as_deref(),
		Some("component 'Foo.esp' is not active (found: inactive)"),
	);

	let game = Condition::version_at_least(VersionSubject::TargetApp, v("1.0"));
	assert_eq!(context.explain(&game).as_deref(), Some("requires game version >= 1.0, found 0.9"));

	let extender = Condition::version_at_least(VersionSubject::Extender, v("2.0"));
	assert_eq!(
		context.explain(&extender).as_deref(),
		Some("requires script extender version >= 2.0, but it is not installed"),
	);

	let flag = Condition::flag("choice", "B");
	assert_eq!(context.explain(&flag).as_deref(), Some("requires flag 'choice' to be 'B', found 'A'"));

	// An AND explains its first failing child.
	let and = Condition::and(vec![Condition::flag("choice", "A"), game.clone(), flag.clone()]);
	assert_eq!(context.explain(&and), context.explain(&game));

	let or = Condition::or(vec![game, flag]);
	let message = context.explain(&or).unwrap();
	assert!(message.starts_with("none of the following were satisfied: "));
	assert!(message.contains("found 0.9") && message.contains("found 'A'"));

	assert_eq!(context.explain(&Condition::flag("choice", "A")), None);
}

#[test]
fn forks_do_not_leak_flags() {
	let registry = FakeRegistry::new();
	let versions = StaticVersions::default();
	let mut context = ConditionContext::new(&registry, &versions);
	context.set_flag("kept", "yes");

	let mut fork = context.fork();
	fork.set_flag("branch", "yes");

	assert!(fork.evaluate(&Condition::flag("kept", "yes")));
	assert!(fork.evaluate(&Condition::flag("branch", "yes")));
	assert!(!context.evaluate(&Condition::flag("branch", "yes")));
	assert_eq!(context.flags().len(), 1);
}

#[test]
fn first_matching_type_pattern_wins() {
	let registry = FakeRegistry::new().with_active("Core.esm");
	let versions = StaticVersions::default();
	let context = ConditionContext::new(&registry, &versions);

	let resolver = TypeResolver {
		default: InstallType::Optional,
		patterns: vec![
			TypePattern {
				condition: Condition::component("Missing.esp", ComponentState::Active),
				install_type: InstallType::NotUsable,
			},
			TypePattern {
				condition: Condition::component("Core.esm", ComponentState::Active),
				install_type: InstallType::Recommended,
			},
			TypePattern {
				condition: Condition::always(),
				install_type: InstallType::Required,
			},
		],
	};

	assert_eq!(context.resolve_type(&resolver), InstallType::Recommended);
	assert_eq!(context.resolve_type(&TypeResolver::fixed(InstallType::CouldBeUsable)), InstallType::CouldBeUsable);
}

#[test]
fn capability_table_grows_with_each_version() {
	let caps = ScriptVersion::ALL.map(|v| v.capabilities());

	assert!(!caps[0].install_steps && !caps[0].flags && !caps[0].conditional_installs);
	assert!(caps[1].install_steps && caps[1].flags && !caps[1].sort_order);
	assert!(caps[2].header_display && caps[2].sort_order && !caps[2].step_visibility);
	assert!(caps[3].step_visibility && caps[3].file_attributes && !caps[3].nested_conditions);
	assert!(caps[4].nested_conditions);

	assert_eq!(ScriptVersion::from_identifier("3.0"), Some(ScriptVersion::V3_0));
	assert_eq!(ScriptVersion::from_identifier("6.0"), None);
}
