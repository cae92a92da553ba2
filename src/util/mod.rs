//! Small utilities shared by the rest of the crate.

pub mod misc;
pub mod notice;
pub mod path;
pub mod text;
