//! Command implementations for the OxiLha CLI.

pub mod extract;
pub mod list;

pub use extract::{ExtractOptions, cmd_extract};
pub use list::{ListOptions, cmd_list};
pub use test::cmd_test;
