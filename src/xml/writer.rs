//! This module writes *Script* values as install script documents.

use quick_xml::{
	events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
	Writer,
};

use crate::prelude::*;

use super::{ROOT_ELEMENT, XSI_NAMESPACE};

/// Writes documents in a single format version.
#[derive(Debug, Clone, Copy)]
pub struct ScriptWriter {
	version: ScriptVersion,
	caps: Capabilities,
}

/// Attributes for a single element, in the order they are written.
type Attrs<'s> = Vec<(&'static str, &'s str)>;

/// Thin layer over quick-xml's *Writer* that keeps element plumbing out of the script logic.
struct Emitter {
	inner: Writer<Vec<u8>>,
}

impl Emitter {
	fn new() -> Self {
		Self { inner: Writer::new_with_indent(Vec::new(), b'\t', 1) }
	}

	fn start(&mut self, name: &str, attrs: Attrs) -> quick_xml::Result<()> {
		let elem = BytesStart::new(name).with_attributes(attrs);
		self.inner.write_event(Event::Start(elem))
	}

	fn end(&mut self, name: &str) -> quick_xml::Result<()> {
		self.inner.write_event(Event::End(BytesEnd::new(name)))
	}

	fn empty(&mut self, name: &str, attrs: Attrs) -> quick_xml::Result<()> {
		let elem = BytesStart::new(name).with_attributes(attrs);
		self.inner.write_event(Event::Empty(elem))
	}

	/// Writes an element that only holds text.
	/// Empty text is written as an empty element.
	fn text(&mut self, name: &str, attrs: Attrs, text: &str) -> quick_xml::Result<()> {
		if text.is_empty() { return self.empty(name, attrs); }

		self.start(name, attrs)?;
		self.inner.write_event(Event::Text(BytesText::new(text)))?;
		self.end(name)
	}

	fn finish(self) -> String {
		String::from_utf8_lossy(&self.inner.into_inner()).into_owned()
	}
}

impl ScriptWriter {
	pub fn new(version: ScriptVersion) -> Self {
		Self { version, caps: version.capabilities() }
	}

	pub fn version(&self) -> ScriptVersion {
		self.version
	}

	/// Checks if this writer can express everything the script uses.
	pub fn can_write(&self, script: &Script) -> Result<(), ScriptError> {
		match script.features().into_iter().find(|f| !self.caps.supports(*f)) {
			Some(feature) => Err(ScriptError::Unrepresentable { version: self.version, feature }),
			None => Ok(()),
		}
	}

	/// Writes a script as a document in this writer's format version.
	pub fn write(&self, script: &Script) -> Result<String, ScriptError> {
		self.can_write(script)?;

		let mut out = Emitter::new();
		out.inner.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

		let schema = self.version.schema_location();
		out.start(ROOT_ELEMENT, vec![
			("xmlns:xsi", XSI_NAMESPACE),
			("xsi:noNamespaceSchemaLocation", schema.as_str()),
		])?;

		self.write_header(&mut out, &script.header)?;

		if script.prerequisites != Condition::always() {
			self.write_composite(&mut out, "moduleDependencies", &script.prerequisites)?;
		}

		if !script.required_files.is_empty() {
			self.write_files(&mut out, "requiredInstallFiles", &script.required_files)?;
		}

		match (self.caps.install_steps, &script.steps[..]) {
			(_, []) => {},
			(false, [step]) => self.write_groups(&mut out, step)?,
			(false, _) => {
				return Err(ScriptError::Unrepresentable { version: self.version, feature: Feature::InstallSteps });
			}

			(true, steps) => {
				out.start("installSteps", self.order_attr(script.step_order))?;

				for step in steps {
					self.write_step(&mut out, step)?;
				}

				out.end("installSteps")?;
			}
		}

		if !script.conditional_file_sets.is_empty() {
			out.start("conditionalFileInstalls", vec![])?;
			out.start("patterns", vec![])?;

			for set in script.conditional_file_sets.iter() {
				out.start("pattern", vec![])?;
				self.write_composite(&mut out, "dependencies", &set.condition)?;
				self.write_files(&mut out, "files", &set.files)?;
				out.end("pattern")?;
			}

			out.end("patterns")?;
			out.end("conditionalFileInstalls")?;
		}

		out.end(ROOT_ELEMENT)?;
		Ok(out.finish())
	}

	/// Sort orders are only written when they differ from the default.
	fn order_attr(&self, order: SortOrder) -> Attrs<'static> {
		match order {
			SortOrder::Explicit => vec![],
			other => vec![("order", other.as_str())],
		}
	}

	fn write_header(&self, out: &mut Emitter, header: &HeaderInfo) -> quick_xml::Result<()> {
		let mut name_attrs = Attrs::new();

		if header.title_position != TitlePosition::default() {
			name_attrs.push(("position", header.title_position.as_str()));
		}

		if let Some(ref colour) = header.colour {
			name_attrs.push(("colour", colour));
		}

		out.text("moduleName", name_attrs, &header.title)?;

		let defaults = HeaderInfo::default();
		let height = header.image_height.to_string();
		let mut image_attrs = Attrs::new();

		if let Some(ref path) = header.image {
			image_attrs.push(("path", path));
		}

		if header.show_image != defaults.show_image {
			image_attrs.push(("showImage", bool_str(header.show_image)));
		}

		if header.show_fade != defaults.show_fade {
			image_attrs.push(("showFade", bool_str(header.show_fade)));
		}

		if header.image_height != defaults.image_height {
			image_attrs.push(("height", &height));
		}

		if !image_attrs.is_empty() {
			out.empty("moduleImage", image_attrs)?;
		}

		Ok(())
	}

	fn write_step(&self, out: &mut Emitter, step: &InstallStep) -> quick_xml::Result<()> {
		out.start("installStep", vec![("name", step.name.as_str())])?;

		if let Some(ref visible) = step.visible {
			out.start("visible", vec![])?;
			self.write_composite(out, "dependencies", visible)?;
			out.end("visible")?;
		}

		self.write_groups(out, step)?;
		out.end("installStep")
	}

	fn write_groups(&self, out: &mut Emitter, step: &InstallStep) -> quick_xml::Result<()> {
		out.start("optionalFileGroups", self.order_attr(step.group_order))?;

		for group in step.groups.iter() {
			out.start("group", vec![("name", group.name.as_str()), ("type", group.mode.as_str())])?;
			out.start("plugins", self.order_attr(group.option_order))?;

			for option in group.options.iter() {
				self.write_option(out, option)?;
			}

			out.end("plugins")?;
			out.end("group")?;
		}

		out.end("optionalFileGroups")
	}

	fn write_option(&self, out: &mut Emitter, option: &InstallOption) -> quick_xml::Result<()> {
		out.start("plugin", vec![("name", option.name.as_str())])?;
		out.text("description", vec![], &option.description)?;

		if let Some(ref image) = option.image {
			out.empty("image", vec![("path", image.as_str())])?;
		}

		if !option.files.is_empty() {
			self.write_files(out, "files", &option.files)?;
		}

		if !option.condition_flags.is_empty() {
			out.start("conditionFlags", vec![])?;

			for flag in option.condition_flags.iter() {
				out.text("flag", vec![("name", flag.name.as_str())], &flag.value)?;
			}

			out.end("conditionFlags")?;
		}

		out.start("typeDescriptor", vec![])?;
		let resolver = &option.type_resolver;

		if resolver.patterns.is_empty() {
			out.empty("type", vec![("name", resolver.default.as_str())])?;
		} else {
			out.start("dependencyType", vec![])?;
			out.empty("defaultType", vec![("name", resolver.default.as_str())])?;
			out.start("patterns", vec![])?;

			for pattern in resolver.patterns.iter() {
				out.start("pattern", vec![])?;
				self.write_composite(out, "dependencies", &pattern.condition)?;
				out.empty("type", vec![("name", pattern.install_type.as_str())])?;
				out.end("pattern")?;
			}

			out.end("patterns")?;
			out.end("dependencyType")?;
		}

		out.end("typeDescriptor")?;
		out.end("plugin")
	}

	fn write_files(&self, out: &mut Emitter, name: &str, files: &[InstallableFile]) -> quick_xml::Result<()> {
		out.start(name, vec![])?;

		for file in files {
			let priority = file.priority.to_string();
			let mut attrs: Attrs = vec![("source", file.source.as_str())];

			if !file.destination.is_empty() {
				attrs.push(("destination", &file.destination));
			}

			if file.priority != 0 {
				attrs.push(("priority", &priority));
			}

			if file.always_install {
				attrs.push(("alwaysInstall", "true"));
			}

			if file.install_if_usable {
				attrs.push(("installIfUsable", "true"));
			}

			let tag = if file.is_folder { "folder" } else { "file" };
			out.empty(tag, attrs)?;
		}

		out.end(name)
	}

	/// Writes a condition as a list element.
	/// A lone leaf is wrapped in an AND, since documents only hold conditions inside lists.
	fn write_composite(&self, out: &mut Emitter, name: &str, condition: &Condition) -> quick_xml::Result<()> {
		let (operator, children) = match condition {
			Condition::Composite { operator, children } => (*operator, children.as_slice()),
			leaf => (Operator::And, std::slice::from_ref(leaf)),
		};

		out.start(name, vec![("operator", operator.as_str())])?;

		for child in children {
			self.write_condition(out, child)?;
		}

		out.end(name)
	}

	fn write_condition(&self, out: &mut Emitter, condition: &Condition) -> quick_xml::Result<()> {
		match condition {
			Condition::ComponentState { path, state } => {
				out.empty("fileDependency", vec![("file", path.as_str()), ("state", state.as_str())])
			}

			Condition::VersionAtLeast { subject, min } => {
				let tag = match subject {
					VersionSubject::TargetApp => "gameDependency",
					VersionSubject::Extender => "foseDependency",
					VersionSubject::ManagerTool => "fommDependency",
				};

				out.empty(tag, vec![("version", min.as_str())])
			}

			Condition::FlagEquals { flag, value } => {
				out.empty("flagDependency", vec![("flag", flag.as_str()), ("value", value.as_str())])
			}

			Condition::Composite { .. } => self.write_composite(out, "dependencies", condition),
		}
	}
}

fn bool_str(value: bool) -> &'static str {
	if value { "true" } else { "false" }
}
