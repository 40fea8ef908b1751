//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides a single-page medical-themed interface with:
//! - Patient measurement entry form
//! - Outcome box with label and confidence
//! - Attribution footer

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
