//! This is the parent module over the install script's data, such as *Script* or *Condition*.

pub mod condition;
pub mod error;
pub mod script;
pub mod version;
