//! This module re-exports a bunch of utilities used across this program.

#![allow(unused_imports)]

pub use tap::prelude::*;

pub use indexmap::{IndexMap, IndexSet};
pub use itertools::Itertools;
pub use thiserror::Error;

pub use log::debug;
pub use log::error;
pub use log::info;
pub use log::warn;

pub use crate::structs::error::{AppError, AppResult, InstallError, ScriptError};
pub use crate::util::text::FancyText;
pub use crate::util::notice::Notice;
pub use crate::util::notice::NoticePreset;

pub use crate::structs::condition::{ComponentState, Condition, Operator, VersionSubject};
pub use crate::structs::script::{
	ConditionFlag, ConditionalFileSet, HeaderInfo, InstallOption, InstallStep, InstallType, InstallableFile,
	OptionGroup, OptionId, Script, SelectionMode, SortOrder, TitlePosition, TypePattern, TypeResolver,
};
pub use crate::structs::version::{Capabilities, Feature, ScriptVersion, Version};
pub use crate::state::{ConditionContext, FlagTable};
