//! This module defines the in-memory form of an install script.
//! A *Script* is built once by a reader and treated as read-only afterwards, no matter which format version it came from.

use std::fmt::Display;

use crate::{host::PackageSource, prelude::*, util::path::normalize_path};

/// A parsed install script.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
	/// The format version this script was read from, and will be written as.
	pub version: ScriptVersion,

	/// Display metadata shown at the top of the install wizard.
	pub header: HeaderInfo,

	/// The root gate. If this is false, installation stops before any step is shown.
	pub prerequisites: Condition,

	/// Files that are always installed.
	pub required_files: Vec<InstallableFile>,

	/// The wizard's pages, in declaration order.
	pub steps: Vec<InstallStep>,

	/// How the wizard should order the steps.
	pub step_order: SortOrder,

	/// Files installed whenever their condition holds, regardless of the user's choices.
	pub conditional_file_sets: Vec<ConditionalFileSet>,
}

impl Script {
	/// Builds an empty script with the provided title.
	pub fn new(version: ScriptVersion, title: impl Into<String>) -> Self {
		Self {
			version,
			header: HeaderInfo { title: title.into(), ..Default::default() },
			prerequisites: Condition::always(),
			required_files: Vec::new(),
			steps: Vec::new(),
			step_order: SortOrder::Explicit,
			conditional_file_sets: Vec::new(),
		}
	}

	/// Retrieves an option by its position in the script.
	pub fn option(&self, id: OptionId) -> Option<&InstallOption> {
		self.steps.get(id.step)?
			.groups.get(id.group)?
			.options.get(id.option)
	}

	/// Iterates over every option in declaration order, alongside its id.
	pub fn options(&self) -> impl Iterator<Item = (OptionId, &InstallOption)> {
		self.steps.iter().enumerate().flat_map(|(s, step)| {
			step.groups.iter().enumerate().flat_map(move |(g, group)| {
				group.options.iter().enumerate().map(move |(o, option)| (OptionId::new(s, g, o), option))
			})
		})
	}

	/// Finds an option using a "Step/Group/Option" path, ignoring case.
	/// Scripts with a single unnamed step also accept "Group/Option".
	pub fn find_option(&self, path: &str) -> Option<OptionId> {
		let parts: Vec<&str> = path.split('/').map(str::trim).collect();

		let (step, group, option) = match parts[..] {
			[step, group, option] => (Some(step), group, option),
			[group, option] => (None, group, option),
			_ => return None,
		};

		self.options().find_map(|(id, candidate)| {
			let step_matches = match step {
				Some(step) => self.steps[id.step].name.eq_ignore_ascii_case(step),
				None => self.steps.len() == 1,
			};

			let is_match = step_matches
				&& self.steps[id.step].groups[id.group].name.eq_ignore_ascii_case(group)
				&& candidate.name.eq_ignore_ascii_case(option);

			is_match.then_some(id)
		})
	}

	/// Iterates over every installable file mentioned anywhere in this script.
	pub fn all_files(&self) -> impl Iterator<Item = &InstallableFile> {
		self.required_files.iter()
			.chain(self.options().flat_map(|(_, o)| o.files.iter()))
			.chain(self.conditional_file_sets.iter().flat_map(|s| s.files.iter()))
	}

	/// Returns the steps in the order the wizard should present them.
	pub fn sorted_steps(&self) -> Vec<(usize, &InstallStep)> {
		self.step_order.arrange(&self.steps, |s| s.name.as_str())
	}

	/// Collects every optional format capability this script relies on.
	/// A writer can only emit the script if its version supports all of them.
	pub fn features(&self) -> IndexSet<Feature> {
		let mut features = IndexSet::new();

		if self.steps.len() > 1 || self.steps.iter().any(|s| !s.name.is_empty()) {
			features.insert(Feature::InstallSteps);
		}

		if self.header.has_display_settings() {
			features.insert(Feature::HeaderDisplay);
		}

		if !self.conditional_file_sets.is_empty() {
			features.insert(Feature::ConditionalInstalls);
		}

		let has_sort_order = self.step_order != SortOrder::Explicit
			|| self.steps.iter().any(|s| s.group_order != SortOrder::Explicit
				|| s.groups.iter().any(|g| g.option_order != SortOrder::Explicit));

		if has_sort_order {
			features.insert(Feature::SortOrder);
		}

		if self.steps.iter().any(|s| s.visible.is_some()) {
			features.insert(Feature::StepVisibility);
		}

		if self.all_files().any(InstallableFile::uses_attributes) {
			features.insert(Feature::FileAttributes);
		}

		if self.options().any(|(_, o)| !o.condition_flags.is_empty()) {
			features.insert(Feature::Flags);
		}

		for condition in self.conditions() {
			if condition.uses_flags() { features.insert(Feature::Flags); }
			if condition.has_nested_composites() { features.insert(Feature::NestedConditions); }
		}

		features.tap_mut(|f| f.sort())
	}

	/// Iterates over every root condition in this script.
	fn conditions(&self) -> impl Iterator<Item = &Condition> {
		std::iter::once(&self.prerequisites)
			.chain(self.steps.iter().filter_map(|s| s.visible.as_ref()))
			.chain(self.options().flat_map(|(_, o)| o.type_resolver.patterns.iter().map(|p| &p.condition)))
			.chain(self.conditional_file_sets.iter().map(|s| &s.condition))
	}
}

/// Locates an option by the index of its step, group, and position within the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OptionId {
	pub step: usize,
	pub group: usize,
	pub option: usize,
}

impl OptionId {
	pub fn new(step: usize, group: usize, option: usize) -> Self {
		Self { step, group, option }
	}
}

/// Where the title is drawn relative to the header image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TitlePosition {
	#[default]
	Left,
	Right,
	RightOfImage,
}

impl TitlePosition {
	pub fn as_str(&self) -> &'static str {
		match self {
			TitlePosition::Left => "Left",
			TitlePosition::Right => "Right",
			TitlePosition::RightOfImage => "RightOfImage",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"Left" => Some(TitlePosition::Left),
			"Right" => Some(TitlePosition::Right),
			"RightOfImage" => Some(TitlePosition::RightOfImage),
			_ => None,
		}
	}
}

/// Display metadata for the install wizard.
/// The engine carries this through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
	pub title: String,

	/// Path to the header image inside the package.
	pub image: Option<String>,

	/// Hex colour for the title, such as "000000".
	pub colour: Option<String>,

	pub title_position: TitlePosition,

	pub show_image: bool,
	pub show_fade: bool,

	/// Height of the image in pixels. Negative values mean "use the default".
	pub image_height: i32,
}

impl Default for HeaderInfo {
	fn default() -> Self {
		Self {
			title: String::new(),
			image: None,
			colour: None,
			title_position: TitlePosition::Left,
			show_image: true,
			show_fade: true,
			image_height: -1,
		}
	}
}

impl HeaderInfo {
	/// Returns the header image, or the package's screenshot if no image is set.
	pub fn image_or_screenshot(&self, package: &dyn PackageSource) -> Option<String> {
		self.image.clone().or_else(|| package.screenshot())
	}

	/// Checks if any display setting differs from its default.
	pub fn has_display_settings(&self) -> bool {
		let HeaderInfo { colour, title_position, show_image, show_fade, image_height, .. } = self;
		let defaults = HeaderInfo::default();

		colour.is_some()
			|| *title_position != defaults.title_position
			|| *show_image != defaults.show_image
			|| *show_fade != defaults.show_fade
			|| *image_height != defaults.image_height
	}
}

/// How the wizard should order a list of steps, groups, or options.
/// This is presentation only; installation always uses declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
	Ascending,
	Descending,
	#[default]
	Explicit,
}

impl SortOrder {
	pub fn as_str(&self) -> &'static str {
		match self {
			SortOrder::Ascending => "Ascending",
			SortOrder::Descending => "Descending",
			SortOrder::Explicit => "Explicit",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"Ascending" => Some(SortOrder::Ascending),
			"Descending" => Some(SortOrder::Descending),
			"Explicit" => Some(SortOrder::Explicit),
			_ => None,
		}
	}

	/// Arranges items by name, keeping each item's original index.
	/// Names are compared without case, and ties keep declaration order.
	pub fn arrange<'a, T>(&self, items: &'a [T], name: impl Fn(&T) -> &str) -> Vec<(usize, &'a T)> {
		let mut arranged: Vec<(usize, &T)> = items.iter().enumerate().collect();

		match self {
			SortOrder::Explicit => {},
			SortOrder::Ascending => arranged.sort_by_cached_key(|(_, t)| name(t).to_lowercase()),
			SortOrder::Descending => {
				arranged.sort_by_cached_key(|(_, t)| std::cmp::Reverse(name(t).to_lowercase()))
			}
		}

		arranged
	}
}

/// One page of the install wizard.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallStep {
	pub name: String,

	/// If present and false, the step is skipped entirely.
	pub visible: Option<Condition>,

	pub groups: Vec<OptionGroup>,
	pub group_order: SortOrder,
}

impl InstallStep {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), visible: None, groups: Vec::new(), group_order: SortOrder::Explicit }
	}

	/// Returns the groups in the order the wizard should present them.
	pub fn sorted_groups(&self) -> Vec<(usize, &OptionGroup)> {
		self.group_order.arrange(&self.groups, |g| g.name.as_str())
	}
}

/// Constrains how many options of a group the user may pick.
/// The engine does not enforce this; the wizard does, with help from *SelectionMode::accepts*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionMode {
	SelectExactlyOne,
	SelectAtMostOne,
	SelectAtLeastOne,
	SelectAny,
	SelectAll,
}

impl SelectionMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			SelectionMode::SelectExactlyOne => "SelectExactlyOne",
			SelectionMode::SelectAtMostOne => "SelectAtMostOne",
			SelectionMode::SelectAtLeastOne => "SelectAtLeastOne",
			SelectionMode::SelectAny => "SelectAny",
			SelectionMode::SelectAll => "SelectAll",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"SelectExactlyOne" => Some(SelectionMode::SelectExactlyOne),
			"SelectAtMostOne" => Some(SelectionMode::SelectAtMostOne),
			"SelectAtLeastOne" => Some(SelectionMode::SelectAtLeastOne),
			"SelectAny" => Some(SelectionMode::SelectAny),
			"SelectAll" => Some(SelectionMode::SelectAll),
			_ => None,
		}
	}

	/// Checks if picking *chosen* options out of *available* satisfies this mode.
	pub fn accepts(&self, chosen: usize, available: usize) -> bool {
		match self {
			SelectionMode::SelectExactlyOne => chosen == 1,
			SelectionMode::SelectAtMostOne => chosen <= 1,
			SelectionMode::SelectAtLeastOne => chosen >= 1,
			SelectionMode::SelectAny => true,
			SelectionMode::SelectAll => chosen == available,
		}
	}
}

impl Display for SelectionMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A named group of options on an install step.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionGroup {
	pub name: String,
	pub mode: SelectionMode,
	pub options: Vec<InstallOption>,
	pub option_order: SortOrder,
}

impl OptionGroup {
	pub fn new(name: impl Into<String>, mode: SelectionMode) -> Self {
		Self { name: name.into(), mode, options: Vec::new(), option_order: SortOrder::Explicit }
	}

	/// Returns the options in the order the wizard should present them.
	pub fn sorted_options(&self) -> Vec<(usize, &InstallOption)> {
		self.option_order.arrange(&self.options, |o| o.name.as_str())
	}
}

/// A user-selectable unit of files.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallOption {
	pub name: String,
	pub description: String,
	pub image: Option<String>,
	pub files: Vec<InstallableFile>,

	/// Flags written to the flag table once this option has been installed.
	pub condition_flags: Vec<ConditionFlag>,

	/// Decides whether this option is required, optional, unusable, and so on.
	pub type_resolver: TypeResolver,
}

impl InstallOption {
	pub fn new(name: impl Into<String>, install_type: InstallType) -> Self {
		Self {
			name: name.into(),
			description: String::new(),
			image: None,
			files: Vec::new(),
			condition_flags: Vec::new(),
			type_resolver: TypeResolver::fixed(install_type),
		}
	}
}

/// A flag set by an option, such as `texture_size = 2k`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionFlag {
	pub name: String,
	pub value: String,
}

/// Classifies an option for the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallType {
	/// Always selected and cannot be deselected.
	Required,

	/// Selected by default.
	Recommended,

	/// Not selected by default.
	Optional,

	/// Cannot be selected.
	NotUsable,

	/// Not selected by default, but likely to work.
	CouldBeUsable,
}

impl InstallType {
	pub fn as_str(&self) -> &'static str {
		match self {
			InstallType::Required => "Required",
			InstallType::Recommended => "Recommended",
			InstallType::Optional => "Optional",
			InstallType::NotUsable => "NotUsable",
			InstallType::CouldBeUsable => "CouldBeUsable",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"Required" => Some(InstallType::Required),
			"Recommended" => Some(InstallType::Recommended),
			"Optional" => Some(InstallType::Optional),
			"NotUsable" => Some(InstallType::NotUsable),
			"CouldBeUsable" => Some(InstallType::CouldBeUsable),
			_ => None,
		}
	}

	/// Returns *true* if the wizard should select this option before the user touches it.
	pub fn is_preselected(&self) -> bool {
		matches!(self, InstallType::Required | InstallType::Recommended)
	}

	pub fn is_usable(&self) -> bool {
		*self != InstallType::NotUsable
	}
}

impl Display for InstallType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Resolves an option's *InstallType*.
/// Patterns are checked top to bottom and the first one whose condition holds wins.
/// If none match, the default type is used.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeResolver {
	pub default: InstallType,
	pub patterns: Vec<TypePattern>,
}

impl TypeResolver {
	/// Builds a resolver that always yields the same type.
	pub fn fixed(install_type: InstallType) -> Self {
		Self { default: install_type, patterns: Vec::new() }
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypePattern {
	pub condition: Condition,
	pub install_type: InstallType,
}

/// A file or folder to copy out of the package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstallableFile {
	/// Path inside the package.
	pub source: String,

	/// Path inside the game's file tree. Empty means "same relative location as the source".
	pub destination: String,

	/// If set, everything under *source* is installed recursively.
	pub is_folder: bool,

	/// Lower priorities install first, so higher priorities win collisions.
	pub priority: i32,

	/// Install this even when the owning option was not chosen.
	pub always_install: bool,

	/// Install this when the owning option was not chosen but is usable.
	pub install_if_usable: bool,
}

impl InstallableFile {
	pub fn file(source: impl AsRef<str>, destination: impl AsRef<str>) -> Self {
		Self {
			source: normalize_path(source),
			destination: normalize_path(destination),
			is_folder: false,
			priority: 0,
			always_install: false,
			install_if_usable: false,
		}
	}

	pub fn folder(source: impl AsRef<str>, destination: impl AsRef<str>) -> Self {
		Self { is_folder: true, ..Self::file(source, destination) }
	}

	/// The path this entry lands on, falling back to the source when no destination is given.
	pub fn target(&self) -> &str {
		match self.destination.is_empty() {
			true => &self.source,
			false => &self.destination,
		}
	}

	/// Checks if this entry uses priority or either install attribute.
	pub fn uses_attributes(&self) -> bool {
		self.priority != 0 || self.always_install || self.install_if_usable
	}
}

/// A set of files installed in full whenever its condition holds.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalFileSet {
	pub condition: Condition,
	pub files: Vec<InstallableFile>,
}
