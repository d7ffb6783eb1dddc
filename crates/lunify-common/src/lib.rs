//! Common types for the lunify JavaScript-to-Lua compiler.
//!
//! This crate provides foundational types used across all lunify crates:
//! - Source spans (`Span`)
//! - Line/column resolution (`LineMap`, `Position`)
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`)

pub mod diagnostics;
pub mod position;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticCategory};
pub use position::{LineMap, Position};
pub use span::Span;
