// Library surface for headless/integration tests and reuse.
// The binary in main.rs only parses flags and owns the terminal.
pub mod app;
pub mod app_dirs;
pub mod classify;
pub mod clock;
pub mod config;
pub mod corpus;
pub mod history;
pub mod presenter;
pub mod runtime;
pub mod session;
pub mod share;
pub mod stats;
pub mod ui;
pub mod validation;
