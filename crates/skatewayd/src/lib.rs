//! Skateway daemon library - exposes modules for testing.

pub mod config;
pub mod dispatcher;
pub mod publisher;
