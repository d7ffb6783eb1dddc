//! AST-to-Lua rewrite engine for the lunify compiler.
//!
//! The pipeline per file: parse into a `NodeArena`, run the read-only
//! analysis pass (hoisting, loop/label usage), then rewrite every node
//! bottom-up into an output fragment, finishing with the program assembler
//! that adds the runtime prologue and module scaffold.

pub mod analysis;
pub mod assemble;
pub mod encode;
pub mod fragments;
pub mod frames;
pub mod idents;
pub mod rewrite;

pub use analysis::Analysis;
pub use rewrite::Rewriter;

use lunify_common::Diagnostic;
use lunify_parser::ParserState;

/// Compile one file's source text to Lua.
pub fn transpile(file_name: &str, source: &str) -> Result<String, Diagnostic> {
    let mut parser = ParserState::new(file_name, source);
    let root = parser.parse_program()?;
    let arena = std::mem::take(&mut parser.arena);
    let mut rewriter = Rewriter::new(&arena, source, file_name);
    Ok(rewriter.rewrite_program(root))
}
