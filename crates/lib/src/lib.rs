//! Topowiz core library — backend client, session orchestration, progress derivation and
//! config, shared by the CLI and desktop applications.

pub mod api;
pub mod config;
pub mod init;
pub mod orchestrator;
pub mod render;
pub mod snapshot;
pub mod step;
pub mod transcript;
