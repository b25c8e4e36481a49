/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - The session history of generated sprites (history.rs)
/// - The prompt and request lifecycle state machine (shell.rs)

pub mod data;
pub mod history;
pub mod shell;
