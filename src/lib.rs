//! Modcrab's install script engine.
//! It reads versioned XML install scripts, evaluates their conditions against a target game, and installs the files a user picked.

pub mod host;
pub mod installer;
pub mod local;
pub mod prelude;
pub mod selection;
pub mod state;
pub mod structs;
pub mod util;
pub mod validation;
pub mod xml;

#[cfg(test)]
mod tests;
