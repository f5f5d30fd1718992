//! Command-line interface module.

mod args;
pub mod apply;
pub mod common;
pub mod inspect;
pub mod preview;

pub use args::{Cli, Commands};
