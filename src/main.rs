//! Command line front end for Modcrab's install script engine.
//! It can check and convert install scripts, and install extracted packages into a game directory.

use std::{fs, path::PathBuf};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use modcrab_script::{
	host::{IdentityPaths, LogMonitor, StaticVersions},
	installer::{self, Collaborators},
	local::{DirectoryInstaller, DirectoryPackage, DirectoryRegistry, OverwritePolicy},
	prelude::*,
	selection::{default_selection, Selection},
	util::misc::display_slice,
	validation, xml,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
	/// Print debug logs.
	#[arg(short, long, global = true)]
	verbose: bool,

	/// The command to execute.
	#[command(subcommand)]
	cmd: Command,
}

#[derive(Subcommand, Clone, PartialEq, Eq)]
enum Command {
	/// Parses an install script and summarizes it.
	Check {
		/// The script to check.
		script: PathBuf,

		/// If this is set, the script's files are also looked up in this extracted package.
		#[arg(short, long)]
		package: Option<PathBuf>,
	},

	/// Rewrites an install script in another format version.
	Convert {
		/// The script to convert.
		script: PathBuf,

		/// The format version to write, such as "5.0".
		#[arg(short, long)]
		to: String,

		/// Where to write the result. The script is printed if this isn't set.
		#[arg(short, long)]
		output: Option<PathBuf>,
	},

	/// Installs an extracted package into a target directory.
	Install {
		/// The extracted package.
		package: PathBuf,

		/// The directory to install into, usually the game's data folder.
		target: PathBuf,

		/// Use this script instead of the package's own.
		#[arg(long)]
		script: Option<PathBuf>,

		/// Pick an option using its "Step/Group/Option" path. Defaults are used if this is never set.
		#[arg(short, long)]
		choose: Vec<String>,

		/// Install plugins without activating them.
		#[arg(long)]
		no_activate: bool,

		/// The game's version, used by version conditions.
		#[arg(long)]
		game_version: Option<String>,

		/// The script extender's version. Leave this unset if it isn't installed.
		#[arg(long)]
		extender_version: Option<String>,

		/// Pre-seed a flag, in the form "name=value".
		#[arg(long = "flag")]
		flags: Vec<String>,

		/// What to do when a file already exists.
		#[arg(long, value_enum, default_value_t = Overwrite::Always)]
		overwrite: Overwrite,
	},
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq)]
enum Overwrite {
	Always,
	Never,
	Prompt,
}

impl From<Overwrite> for OverwritePolicy {
	fn from(value: Overwrite) -> Self {
		match value {
			Overwrite::Always => OverwritePolicy::Always,
			Overwrite::Never => OverwritePolicy::Never,
			Overwrite::Prompt => OverwritePolicy::Prompt,
		}
	}
}

fn main() {
	let args = Cli::parse();
	let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };

	if SimpleLogger::new().with_colors(true).with_level(level).init().is_err() {
		Notice::from_preset(NoticePreset::Warning, "Logger")
			.add_field("Description", "Failed to start the logger, so no logs will be shown.")
			.print();
	}

	if let Err(error) = run_command(args.cmd) { error.conv::<Notice>().print(); }
}

/// Runs the command specified by the passed CLI arguments.
fn run_command(cmd: Command) -> AppResult<()> {
	match cmd {
		Command::Check { script, package } => check(script, package),
		Command::Convert { script, to, output } => convert(script, &to, output),

		Command::Install { package, target, script, choose, no_activate, game_version, extender_version, flags, overwrite } => {
			let versions = StaticVersions {
				target_app: parse_version(game_version)?,
				extender: parse_version(extender_version)?,
				..Default::default()
			};

			let flags: FlagTable = flags.iter()
				.map(|raw| raw.split_once('=').ok_or_else(|| anyhow!("'{raw}' is not in the form name=value")))
				.collect::<Result<_, _>>()?;

			let request = InstallRequest { package, target, script, choose, no_activate, versions, flags, overwrite: overwrite.into() };
			install(request)
		}
	}
}

fn parse_version(raw: Option<String>) -> AppResult<Option<Version>> {
	let version = raw.map(|v| v.parse::<Version>().context("Invalid version given on the command line")).transpose()?;
	Ok(version)
}

fn check(path: PathBuf, package: Option<PathBuf>) -> AppResult<()> {
	let script = xml::load_script(&path)?;
	let features = script.features().into_iter().collect_vec();

	Notice::from_preset(NoticePreset::Statistics, "Script")
		.add_field("Title", &script.header.title)
		.add_field("Format", &script.version.to_string())
		.add_field("Steps", &script.steps.len().to_string())
		.add_field("Options", &script.options().count().to_string())
		.add_field("Files", &script.all_files().count().to_string())
		.add_field("Features", &if features.is_empty() { "none".to_owned() } else { display_slice(&features) })
		.print();

	let Some(package) = package else { return Ok(()) };

	let package = DirectoryPackage::open(package)?;
	validation::ensure_sources(&script, &package)?;

	Notice::from_preset(NoticePreset::Success, "Package")
		.add_field("Description", "Every file the script refers to is in the package.")
		.print();

	Ok(())
}

fn convert(path: PathBuf, to: &str, output: Option<PathBuf>) -> AppResult<()> {
	let version: ScriptVersion = to.parse()?;
	let script = xml::load_script(&path)?;
	let converted = xml::write_script_as(&script, version)?;

	match output {
		None => println!("{converted}"),
		Some(output) => {
			fs::write(&output, converted)?;
			info!("Wrote format version {version} to '{}'.", output.display());
		}
	}

	Ok(())
}

/// Everything the install command needs, gathered from its arguments.
struct InstallRequest {
	package: PathBuf,
	target: PathBuf,
	script: Option<PathBuf>,
	choose: Vec<String>,
	no_activate: bool,
	versions: StaticVersions,
	flags: FlagTable,
	overwrite: OverwritePolicy,
}

fn install(request: InstallRequest) -> AppResult<()> {
	let package = DirectoryPackage::open(&request.package)?;

	let script = match request.script {
		Some(ref path) => xml::load_script(path)?,
		None => package.load_script()?,
	};

	validation::ensure_sources(&script, &package)?;

	let registry = DirectoryRegistry::open(&request.target)?;
	let mut context = ConditionContext::new(&registry, &request.versions).with_flags(request.flags);

	let mut selection = match request.choose.is_empty() {
		true => default_selection(&script, &context),
		false => choose_options(&script, &request.choose)?,
	};

	if request.no_activate { selection = selection.without_activation(); }

	for notice in validation::check_selection(&script, &context, &selection) {
		notice.print();
	}

	let files = DirectoryInstaller::new(&request.target, request.overwrite);
	let with = Collaborators { package: &package, registry: &registry, files: &files, paths: &IdentityPaths };
	let mut monitor = LogMonitor::default();

	let outcome = installer::install(&script, &mut context, &selection, &with, &mut monitor)?;
	registry.save()?;

	let summary = outcome.summary();
	let preset = if outcome.is_cancelled() { NoticePreset::Warning } else { NoticePreset::Success };

	Notice::from_preset(preset, "Install")
		.add_field("Package", &script.header.title)
		.add_field("Installed", &summary.files_installed.to_string())
		.add_field("Skipped", &summary.files_declined.to_string())
		.add_field("Activated", &if summary.activated.is_empty() { "none".to_owned() } else { display_slice(&summary.activated) })
		.print();

	Ok(())
}

/// Looks up every "Step/Group/Option" path given on the command line.
fn choose_options(script: &Script, paths: &[String]) -> AppResult<Selection> {
	paths.iter()
		.map(|path| {
			script.find_option(path).ok_or_else(|| {
				let error = Notice::from_preset(NoticePreset::Error, "Selection")
					.add_field("Description", &format!("The script has no option at '{path}'."))
					.add_field("Suggestion", "Run 'modcrab-script check' to see the script's steps, groups, and options.");

				AppError::Custom(error)
			})
		})
		.collect()
}
