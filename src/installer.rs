//! This module runs an install script against a package, turning the user's choices into file copies and component activations.
//!
//! A run goes through four phases in order:
//! 1. The script's prerequisites are checked. If they fail, nothing is touched.
//! 2. Required files are installed and activated.
//! 3. Options are walked in declaration order, skipping hidden steps.
//!    Chosen options install their files and then set their flags.
//! 4. Conditional file sets whose condition holds are installed and activated.

use std::ops::ControlFlow;

use crate::{
	host::{ComponentRegistry, FileInstaller, InstallMonitor, PackageSource, PathAdjuster, Progress},
	prelude::*,
	selection::Selection,
	util::path::{join_path, strip_folder},
};

/// The collaborators an install run writes through.
#[derive(Clone, Copy)]
pub struct Collaborators<'c> {
	pub package: &'c dyn PackageSource,
	pub registry: &'c dyn ComponentRegistry,
	pub files: &'c dyn FileInstaller,
	pub paths: &'c dyn PathAdjuster,
}

/// How an install run ended, if it didn't fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
	/// Every phase ran to the end.
	Complete(InstallSummary),

	/// The monitor asked to stop. Files written before that point are left in place.
	Cancelled(InstallSummary),
}

impl InstallOutcome {
	pub fn summary(&self) -> &InstallSummary {
		match self {
			InstallOutcome::Complete(summary) | InstallOutcome::Cancelled(summary) => summary,
		}
	}

	pub fn is_cancelled(&self) -> bool {
		matches!(self, InstallOutcome::Cancelled(_))
	}
}

/// What an install run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallSummary {
	/// Files the *FileInstaller* actually wrote.
	pub files_installed: usize,

	/// Files the *FileInstaller* declined to overwrite.
	pub files_declined: usize,

	/// Components that were activated, in order.
	pub activated: Vec<String>,

	/// Components that were deactivated, in order.
	pub deactivated: Vec<String>,
}

/// Installs a package using the provided choices.
/// Flags set by chosen options are written into *context*, so later conditions see them.
pub fn install(
	script: &Script,
	context: &mut ConditionContext,
	selection: &Selection,
	with: &Collaborators,
	monitor: &mut dyn InstallMonitor,
) -> Result<InstallOutcome, InstallError> {
	if let Some(reason) = context.explain(&script.prerequisites) {
		return Err(InstallError::UnfulfilledPrerequisite(reason));
	}

	let mut run = Run {
		with,
		monitor,
		total: count_items(script, selection),
		item: 0,
		reported: 0,
		attempts: 0,
		summary: InstallSummary::default(),
	};

	let flow = run.install_script(script, context, selection)?;
	if flow.is_continue() { run.close(); }

	let Run { summary, .. } = run;

	info!(
		"Installed {} file(s) and activated {} component(s){}.",
		summary.files_installed,
		summary.activated.len(),
		if flow.is_break() { " before being cancelled" } else { "" },
	);

	match flow {
		ControlFlow::Continue(()) => Ok(InstallOutcome::Complete(summary)),
		ControlFlow::Break(()) => Ok(InstallOutcome::Cancelled(summary)),
	}
}

/// Counts the entries a run may work through, which is the *total* reported in each *Progress*.
/// Folders and conditional file sets count as a single entry each.
pub fn count_items(script: &Script, selection: &Selection) -> usize {
	let option_files: usize = script.options()
		.map(|(id, option)| match selection.is_chosen(id) {
			true => option.files.len(),
			false => option.files.iter().filter(|f| f.always_install || f.install_if_usable).count(),
		})
		.sum();

	script.required_files.len() + option_files + script.conditional_file_sets.len()
}

/// Returns the files of a list in install order.
/// Lower priorities go first, and ties keep declaration order.
fn by_priority<'f>(files: impl IntoIterator<Item = &'f InstallableFile>) -> Vec<&'f InstallableFile> {
	files.into_iter()
		.collect_vec()
		.tap_mut(|f| f.sort_by_key(|file| file.priority))
}

/// Shorthand for stopping early when a step was cancelled.
macro_rules! flow {
	($e:expr) => {
		if $e.is_break() { return Ok(ControlFlow::Break(())); }
	};
}

/// The state of a single install run.
struct Run<'r, 'c> {
	with: &'r Collaborators<'c>,
	monitor: &'r mut dyn InstallMonitor,
	total: usize,

	/// The entry currently being installed.
	item: usize,

	/// The *item* of the last progress report.
	reported: usize,

	/// Calls made to the *FileInstaller* so far.
	attempts: usize,

	summary: InstallSummary,
}

type Flow = Result<ControlFlow<()>, InstallError>;

impl<'r, 'c> Run<'r, 'c> {
	fn install_script(&mut self, script: &Script, context: &mut ConditionContext, selection: &Selection) -> Flow {
		for file in by_priority(&script.required_files) {
			self.item += 1;
			flow!(self.install_entry(file, true)?);
		}

		for (s, step) in script.steps.iter().enumerate() {
			if let Some(ref visible) = step.visible {
				if !context.evaluate(visible) {
					debug!("Skipping hidden step '{}'.", step.name);
					continue;
				}
			}

			for (g, group) in step.groups.iter().enumerate() {
				for (o, option) in group.options.iter().enumerate() {
					let id = OptionId::new(s, g, o);
					flow!(self.install_option(option, id, context, selection)?);
				}
			}
		}

		for set in script.conditional_file_sets.iter() {
			self.item += 1;

			if !context.evaluate(&set.condition) {
				debug!("Skipping conditional files, since {} does not hold.", set.condition);
				continue;
			}

			for file in by_priority(&set.files) {
				flow!(self.install_entry(file, true)?);
			}
		}

		Ok(ControlFlow::Continue(()))
	}

	fn install_option(&mut self, option: &InstallOption, id: OptionId, context: &mut ConditionContext, selection: &Selection) -> Flow {
		if selection.is_chosen(id) {
			debug!("Installing option '{}'.", option.name);
			let activate = selection.is_activated(id);

			for file in by_priority(&option.files) {
				self.item += 1;
				flow!(self.install_entry(file, activate)?);
			}

			for flag in option.condition_flags.iter() {
				context.set_flag(&flag.name, &flag.value);
			}

			return Ok(ControlFlow::Continue(()));
		}

		let extras = by_priority(option.files.iter().filter(|f| f.always_install || f.install_if_usable));
		if extras.is_empty() { return Ok(ControlFlow::Continue(())); }

		let usable = context.resolve_type(&option.type_resolver).is_usable();

		for file in extras {
			self.item += 1;

			if file.always_install || usable {
				flow!(self.install_entry(file, false)?);
			}
		}

		Ok(ControlFlow::Continue(()))
	}

	/// Sends a closing report if skipped entries kept the last one short of the total.
	fn close(&mut self) {
		if self.reported >= self.total { return; }

		self.reported = self.total;
		self.monitor.report(&Progress {
			item: self.total,
			total: self.total,
			files_written: self.attempts,
			label: "",
		});
	}

	fn install_entry(&mut self, file: &InstallableFile, activate: bool) -> Flow {
		if !file.is_folder {
			return self.install_single(&file.source, file.target(), activate.then_some(true));
		}

		let members = self.with.package.get_file_list(&file.source, true)
			.map_err(|source| InstallError::Io { path: file.source.clone(), source })?;

		// Only members of folders installed in place have their activation touched.
		let activation = file.destination.is_empty().then_some(activate);

		for member in members {
			let relative = strip_folder(&file.source, &member).unwrap_or_else(|| member.clone());
			let destination = join_path(file.target(), relative);

			flow!(self.install_single(&member, &destination, activation)?);
		}

		Ok(ControlFlow::Continue(()))
	}

	/// Installs a single file.
	/// If *activation* is set, the file's activation is changed after it is written, as long as it is activatable.
	fn install_single(&mut self, source: &str, destination: &str, activation: Option<bool>) -> Flow {
		if self.monitor.is_cancelled() {
			debug!("Install cancelled before '{source}'.");
			return Ok(ControlFlow::Break(()));
		}

		let Collaborators { package, registry, files, paths } = *self.with;
		let destination = paths.adjust_path(package.format(), destination);

		let data = package.get_file(source)
			.map_err(|e| InstallError::Io { path: source.to_owned(), source: e })?;

		debug!("Installing '{source}' to '{destination}'.");
		self.attempts += 1;

		let written = files.install_file(source, &data, &destination)
			.map_err(|e| InstallError::Io { path: destination.clone(), source: e })?;

		match written {
			true => self.summary.files_installed += 1,
			false => {
				self.summary.files_declined += 1;
				debug!("Overwriting '{destination}' was declined.");
			}
		}

		if let Some(active) = activation.filter(|_| written) {
			if registry.is_activatable(&destination) {
				registry.set_activation(&destination, active)
					.map_err(|e| InstallError::Activation { path: destination.clone(), source: e })?;

				match active {
					true => self.summary.activated.push(destination.clone()),
					false => self.summary.deactivated.push(destination.clone()),
				}
			}
		}

		self.reported = self.item;
		self.monitor.report(&Progress {
			item: self.item,
			total: self.total,
			files_written: self.attempts,
			label: &destination,
		});

		Ok(ControlFlow::Continue(()))
	}
}
