//! External side effects
//!
//! Trait-based abstraction over the operator's brew and stop-pouring
//! commands, so the pot can be driven against a fake runner in tests.

pub mod command;

pub use command::{ActionError, ActionOutput, ActionRunner, CommandActionRunner};
