//! This module reads install script documents into *Script* values.
//! Anything the reader's format version cannot express is rejected rather than skipped, so nothing is ever silently lost.

use std::str::FromStr;

use roxmltree::{Document, Node};

use crate::{prelude::*, structs::version::ParseVersionError, util::path::normalize_path};

use super::ROOT_ELEMENT;

/// Marks which capability an element or attribute needs, if any.
type Allowed<'s> = &'s [(&'s str, Option<Feature>)];

/// Reads documents written in a single format version.
#[derive(Debug, Clone, Copy)]
pub struct ScriptReader {
	version: ScriptVersion,
	caps: Capabilities,
}

/// An element, alongside its path from the root for use in error messages.
struct Element<'a, 'input> {
	node: Node<'a, 'input>,
	path: String,
}

impl<'a, 'input> Element<'a, 'input> {
	fn name(&self) -> &str {
		self.node.tag_name().name()
	}

	fn error(&self, message: impl Into<String>) -> ScriptError {
		ScriptError::Structure { path: self.path.clone(), message: message.into() }
	}

	fn attr(&self, name: &str) -> Option<&'a str> {
		self.node.attribute(name)
	}

	fn required_attr(&self, name: &str) -> Result<&'a str, ScriptError> {
		self.attr(name).ok_or_else(|| self.error(format!("missing required attribute '{name}'")))
	}

	/// The element's trimmed text, or an empty string if it has none.
	fn text(&self) -> String {
		self.node.text().map(str::trim).unwrap_or_default().to_owned()
	}

	/// Every child element, in document order.
	/// Paths are indexed among siblings of the same name, starting at 1.
	fn elements(&self) -> Vec<Element<'a, 'input>> {
		let mut seen: IndexMap<&str, usize> = IndexMap::new();

		self.node.children()
			.filter(Node::is_element)
			.map(|node| {
				let name = node.tag_name().name();
				let index = seen.entry(name).or_default();
				*index += 1;

				Element { node, path: format!("{}/{name}[{index}]", self.path) }
			})
			.collect()
	}

	/// Finds a child element that may appear at most once.
	fn single(&self, name: &str) -> Result<Option<Element<'a, 'input>>, ScriptError> {
		let mut matches = self.node.children()
			.filter(|n| n.is_element() && n.tag_name().name() == name);

		let Some(node) = matches.next() else { return Ok(None) };

		if matches.next().is_some() {
			return Err(self.error(format!("element '{name}' may only appear once")));
		}

		Ok(Some(Element { node, path: format!("{}/{name}", self.path) }))
	}

	fn required(&self, name: &str) -> Result<Element<'a, 'input>, ScriptError> {
		self.single(name)?.ok_or_else(|| self.error(format!("missing required element '{name}'")))
	}

	/// Parses an attribute with a lookup function, such as *InstallType::from_name*.
	fn parse_attr<T>(&self, name: &str, lookup: impl Fn(&str) -> Option<T>) -> Result<Option<T>, ScriptError> {
		let Some(raw) = self.attr(name) else { return Ok(None) };

		lookup(raw.trim())
			.ok_or_else(|| self.error(format!("invalid value '{raw}' for attribute '{name}'")))
			.map(Some)
	}

	fn parse_bool(&self, name: &str) -> Result<Option<bool>, ScriptError> {
		self.parse_attr(name, |raw| match raw {
			"true" | "1" => Some(true),
			"false" | "0" => Some(false),
			_ => None,
		})
	}

	fn parse_number<T: FromStr>(&self, name: &str) -> Result<Option<T>, ScriptError> {
		self.parse_attr(name, |raw| raw.parse().ok())
	}
}

impl ScriptReader {
	pub fn new(version: ScriptVersion) -> Self {
		Self { version, caps: version.capabilities() }
	}

	pub fn version(&self) -> ScriptVersion {
		self.version
	}

	/// Reads a document using this reader's grammar, regardless of what the document declares.
	pub fn read(&self, raw: &str) -> Result<Script, ScriptError> {
		let doc = Document::parse(raw.strip_prefix('\u{feff}').unwrap_or(raw))?;
		self.read_document(&doc)
	}

	pub(crate) fn read_document(&self, doc: &Document) -> Result<Script, ScriptError> {
		let root = Element { node: doc.root_element(), path: ROOT_ELEMENT.to_owned() };

		if root.name() != ROOT_ELEMENT {
			return Err(root.error(format!("expected the root element to be '{ROOT_ELEMENT}'")));
		}

		self.check(&root, &[
			("noNamespaceSchemaLocation", None),
			("version", None),
		], &[
			("moduleName", None),
			("moduleImage", None),
			("moduleDependencies", None),
			("requiredInstallFiles", None),
			("optionalFileGroups", None),
			("installSteps", Some(Feature::InstallSteps)),
			("conditionalFileInstalls", Some(Feature::ConditionalInstalls)),
		])?;

		let mut script = Script::new(self.version, "");
		script.header = self.read_header(&root)?;

		if let Some(deps) = root.single("moduleDependencies")? {
			script.prerequisites = self.read_composite(&deps)?;
		}

		if let Some(files) = root.single("requiredInstallFiles")? {
			script.required_files = self.read_files(&files)?;
		}

		match (root.single("installSteps")?, root.single("optionalFileGroups")?) {
			(Some(_), Some(groups)) => {
				return Err(groups.error("'optionalFileGroups' must be inside an install step when 'installSteps' is used"));
			}

			(Some(steps), None) => {
				self.check(&steps, &[("order", Some(Feature::SortOrder))], &[("installStep", None)])?;
				script.step_order = self.read_order(&steps)?;

				script.steps = steps.elements().iter()
					.map(|s| self.read_step(s))
					.collect::<Result<_, _>>()?;
			}

			// Without named steps, root-level groups form a single unnamed step.
			(None, Some(groups)) => {
				let mut step = InstallStep::new("");
				self.read_group_list(&groups, &mut step)?;
				script.steps.push(step);
			}

			(None, None) => {},
		}

		if let Some(installs) = root.single("conditionalFileInstalls")? {
			self.check(&installs, &[], &[("patterns", None)])?;
			let patterns = installs.required("patterns")?;
			self.check(&patterns, &[], &[("pattern", None)])?;

			script.conditional_file_sets = patterns.elements().iter()
				.map(|p| {
					self.check(p, &[], &[("dependencies", None), ("files", None)])?;

					Ok::<_, ScriptError>(ConditionalFileSet {
						condition: self.read_composite(&p.required("dependencies")?)?,
						files: self.read_files(&p.required("files")?)?,
					})
				})
				.collect::<Result<_, _>>()?;
		}

		Ok(script)
	}

	/// Checks an element's attributes and children against what this version allows.
	fn check(&self, el: &Element, attrs: Allowed, children: Allowed) -> Result<(), ScriptError> {
		for attr in el.node.attributes() {
			let name = attr.name();

			match attrs.iter().find(|(allowed, _)| *allowed == name) {
				None => return Err(el.error(format!("unknown attribute '{name}'"))),
				Some((_, Some(feature))) if !self.caps.supports(*feature) => {
					return Err(el.error(format!(
						"attribute '{name}' needs {feature}, which format version {} does not support",
						self.version
					)));
				}
				Some(_) => {},
			}
		}

		for child in el.node.children().filter(Node::is_element) {
			let name = child.tag_name().name();

			match children.iter().find(|(allowed, _)| *allowed == name) {
				None => return Err(el.error(format!("unknown element '{name}'"))),
				Some((_, Some(feature))) if !self.caps.supports(*feature) => {
					return Err(el.error(format!(
						"element '{name}' needs {feature}, which format version {} does not support",
						self.version
					)));
				}
				Some(_) => {},
			}
		}

		Ok(())
	}

	fn read_header(&self, root: &Element) -> Result<HeaderInfo, ScriptError> {
		let mut header = HeaderInfo::default();

		let name = root.required("moduleName")?;
		self.check(&name, &[
			("position", Some(Feature::HeaderDisplay)),
			("colour", Some(Feature::HeaderDisplay)),
		], &[])?;

		header.title = name.text();
		header.colour = name.attr("colour").map(|c| c.trim().to_owned());

		if let Some(position) = name.parse_attr("position", TitlePosition::from_name)? {
			header.title_position = position;
		}

		if let Some(image) = root.single("moduleImage")? {
			self.check(&image, &[
				("path", None),
				("showImage", Some(Feature::HeaderDisplay)),
				("showFade", Some(Feature::HeaderDisplay)),
				("height", Some(Feature::HeaderDisplay)),
			], &[])?;

			header.image = image.attr("path").map(normalize_path).filter(|p| !p.is_empty());
			header.show_image = image.parse_bool("showImage")?.unwrap_or(true);
			header.show_fade = image.parse_bool("showFade")?.unwrap_or(true);
			header.image_height = image.parse_number("height")?.unwrap_or(-1);
		}

		Ok(header)
	}

	fn read_order(&self, el: &Element) -> Result<SortOrder, ScriptError> {
		Ok(el.parse_attr("order", SortOrder::from_name)?.unwrap_or_default())
	}

	fn read_step(&self, el: &Element) -> Result<InstallStep, ScriptError> {
		self.check(el, &[("name", None)], &[
			("visible", Some(Feature::StepVisibility)),
			("optionalFileGroups", None),
		])?;

		let mut step = InstallStep::new(el.required_attr("name")?.trim());

		if let Some(visible) = el.single("visible")? {
			self.check(&visible, &[], &[("dependencies", None)])?;
			step.visible = Some(self.read_composite(&visible.required("dependencies")?)?);
		}

		if let Some(groups) = el.single("optionalFileGroups")? {
			self.read_group_list(&groups, &mut step)?;
		}

		Ok(step)
	}

	fn read_group_list(&self, el: &Element, step: &mut InstallStep) -> Result<(), ScriptError> {
		self.check(el, &[("order", Some(Feature::SortOrder))], &[("group", None)])?;
		step.group_order = self.read_order(el)?;

		step.groups = el.elements().iter()
			.map(|g| self.read_group(g))
			.collect::<Result<_, _>>()?;

		Ok(())
	}

	fn read_group(&self, el: &Element) -> Result<OptionGroup, ScriptError> {
		self.check(el, &[("name", None), ("type", None)], &[("plugins", None)])?;

		let mode = el.parse_attr("type", SelectionMode::from_name)?
			.ok_or_else(|| el.error("missing required attribute 'type'"))?;

		let mut group = OptionGroup::new(el.required_attr("name")?.trim(), mode);

		if let Some(plugins) = el.single("plugins")? {
			self.check(&plugins, &[("order", Some(Feature::SortOrder))], &[("plugin", None)])?;
			group.option_order = self.read_order(&plugins)?;

			group.options = plugins.elements().iter()
				.map(|p| self.read_option(p))
				.collect::<Result<_, _>>()?;
		}

		Ok(group)
	}

	fn read_option(&self, el: &Element) -> Result<InstallOption, ScriptError> {
		self.check(el, &[("name", None)], &[
			("description", None),
			("image", None),
			("files", None),
			("conditionFlags", Some(Feature::Flags)),
			("typeDescriptor", None),
		])?;

		let descriptor = el.required("typeDescriptor")?;
		let mut option = InstallOption::new(el.required_attr("name")?.trim(), InstallType::Optional);

		option.type_resolver = self.read_type_descriptor(&descriptor)?;
		option.description = el.single("description")?.map(|d| d.text()).unwrap_or_default();

		if let Some(image) = el.single("image")? {
			self.check(&image, &[("path", None)], &[])?;
			option.image = Some(normalize_path(image.required_attr("path")?));
		}

		if let Some(files) = el.single("files")? {
			option.files = self.read_files(&files)?;
		}

		if let Some(flags) = el.single("conditionFlags")? {
			self.check(&flags, &[], &[("flag", None)])?;

			option.condition_flags = flags.elements().iter()
				.map(|f| {
					self.check(f, &[("name", None)], &[])?;
					Ok::<_, ScriptError>(ConditionFlag { name: f.required_attr("name")?.trim().to_owned(), value: f.text() })
				})
				.collect::<Result<_, _>>()?;
		}

		Ok(option)
	}

	fn read_type_descriptor(&self, el: &Element) -> Result<TypeResolver, ScriptError> {
		self.check(el, &[], &[("type", None), ("dependencyType", None)])?;

		match (el.single("type")?, el.single("dependencyType")?) {
			(Some(fixed), None) => Ok(TypeResolver::fixed(self.read_type(&fixed)?)),

			(None, Some(dynamic)) => {
				self.check(&dynamic, &[], &[("defaultType", None), ("patterns", None)])?;

				let default = self.read_type(&dynamic.required("defaultType")?)?;
				let mut resolver = TypeResolver::fixed(default);

				if let Some(patterns) = dynamic.single("patterns")? {
					self.check(&patterns, &[], &[("pattern", None)])?;

					resolver.patterns = patterns.elements().iter()
						.map(|p| {
							self.check(p, &[], &[("dependencies", None), ("type", None)])?;

							Ok::<_, ScriptError>(TypePattern {
								condition: self.read_composite(&p.required("dependencies")?)?,
								install_type: self.read_type(&p.required("type")?)?,
							})
						})
						.collect::<Result<_, _>>()?;
				}

				Ok(resolver)
			}

			_ => Err(el.error("expected exactly one of 'type' or 'dependencyType'")),
		}
	}

	fn read_type(&self, el: &Element) -> Result<InstallType, ScriptError> {
		self.check(el, &[("name", None)], &[])?;

		el.parse_attr("name", InstallType::from_name)?
			.ok_or_else(|| el.error("missing required attribute 'name'"))
	}

	fn read_files(&self, el: &Element) -> Result<Vec<InstallableFile>, ScriptError> {
		self.check(el, &[], &[("file", None), ("folder", None)])?;

		el.elements().iter()
			.map(|f| self.read_file(f))
			.collect()
	}

	fn read_file(&self, el: &Element) -> Result<InstallableFile, ScriptError> {
		self.check(el, &[
			("source", None),
			("destination", None),
			("priority", Some(Feature::FileAttributes)),
			("alwaysInstall", Some(Feature::FileAttributes)),
			("installIfUsable", Some(Feature::FileAttributes)),
		], &[])?;

		let source = el.required_attr("source")?;
		let destination = el.attr("destination").unwrap_or_default();

		let mut file = match el.name() {
			"folder" => InstallableFile::folder(source, destination),
			_ => InstallableFile::file(source, destination),
		};

		if file.source.is_empty() && !file.is_folder {
			return Err(el.error("attribute 'source' must not be empty"));
		}

		file.priority = el.parse_number("priority")?.unwrap_or(0);
		file.always_install = el.parse_bool("alwaysInstall")?.unwrap_or(false);
		file.install_if_usable = el.parse_bool("installIfUsable")?.unwrap_or(false);

		Ok(file)
	}

	/// Reads an element holding a list of conditions, such as 'moduleDependencies'.
	fn read_composite(&self, el: &Element) -> Result<Condition, ScriptError> {
		self.check(el, &[("operator", None)], &[
			("fileDependency", None),
			("flagDependency", Some(Feature::Flags)),
			("gameDependency", None),
			("foseDependency", None),
			("fommDependency", None),
			("dependencies", Some(Feature::NestedConditions)),
		])?;

		let operator = el.parse_attr("operator", Operator::from_name)?.unwrap_or_default();

		let children = el.elements().iter()
			.map(|c| self.read_condition(c))
			.collect::<Result<_, _>>()?;

		Ok(Condition::Composite { operator, children })
	}

	fn read_condition(&self, el: &Element) -> Result<Condition, ScriptError> {
		let version_of = |subject: VersionSubject| -> Result<Condition, ScriptError> {
			self.check(el, &[("version", None)], &[])?;

			let raw = el.required_attr("version")?;
			let min = raw.parse().map_err(|e: ParseVersionError| el.error(e.to_string()))?;

			Ok(Condition::version_at_least(subject, min))
		};

		match el.name() {
			"fileDependency" => {
				self.check(el, &[("file", None), ("state", None)], &[])?;

				let state = el.parse_attr("state", ComponentState::from_name)?
					.ok_or_else(|| el.error("missing required attribute 'state'"))?;

				Ok(Condition::component(el.required_attr("file")?, state))
			}

			"flagDependency" => {
				self.check(el, &[("flag", None), ("value", None)], &[])?;
				Ok(Condition::flag(el.required_attr("flag")?.trim(), el.attr("value").unwrap_or_default().trim()))
			}

			"gameDependency" => version_of(VersionSubject::TargetApp),
			"foseDependency" => version_of(VersionSubject::Extender),
			"fommDependency" => version_of(VersionSubject::ManagerTool),
			"dependencies" => self.read_composite(el),
			other => Err(el.error(format!("unknown condition '{other}'"))),
		}
	}
}
