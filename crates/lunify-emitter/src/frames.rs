//! Loop/label context resolution.
//!
//! Frames are derived on demand by walking parent links from a node out to
//! its enclosing function or program. Break/continue encoding and loop
//! emission both consult this stack to decide between a native `break` and
//! sentinel propagation.

use lunify_parser::{NodeArena, NodeIndex, NodeKind};

use crate::idents::sanitize;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameKind {
    Loop,
    Try,
    Switch,
}

#[derive(Clone, Debug)]
pub struct Frame {
    pub kind: FrameKind,
    pub label: Option<String>,
    pub node: NodeIndex,
}

/// The label attached to a statement, if its parent is a labeled statement.
pub fn statement_label(arena: &NodeArena, node: NodeIndex) -> Option<String> {
    let parent = arena.parent(node)?;
    match arena.kind(parent) {
        NodeKind::LabeledStatement { label, .. } => {
            arena.identifier_name(*label).map(sanitize)
        }
        _ => None,
    }
}

/// Enclosing loop/try/switch frames, nearest first, stopping at the first
/// function or program boundary.
///
/// A try statement only counts as a protected frame when the walk ascends
/// out of its `try` block; its catch handler and finalizer run outside the
/// protected call, so jumps from there take the native path.
pub fn enclosing_frames(arena: &NodeArena, start: NodeIndex) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut previous = start;
    let mut node = start;
    while let Some(parent) = arena.parent(node) {
        match arena.kind(parent) {
            NodeKind::WhileStatement { .. }
            | NodeKind::DoWhileStatement { .. }
            | NodeKind::ForStatement { .. }
            | NodeKind::ForInStatement { .. } => {
                frames.push(Frame {
                    kind: FrameKind::Loop,
                    label: statement_label(arena, parent),
                    node: parent,
                });
            }
            NodeKind::TryStatement { block, .. } => {
                if *block == previous {
                    frames.push(Frame {
                        kind: FrameKind::Try,
                        label: None,
                        node: parent,
                    });
                }
            }
            NodeKind::SwitchStatement { .. } => {
                frames.push(Frame {
                    kind: FrameKind::Switch,
                    label: statement_label(arena, parent),
                    node: parent,
                });
            }
            NodeKind::FunctionDeclaration { .. }
            | NodeKind::FunctionExpression { .. }
            | NodeKind::Program { .. } => break,
            _ => {}
        }
        previous = parent;
        node = parent;
    }
    frames
}

/// Labels of enclosing loops reachable without crossing a try boundary.
/// A wrapped loop checks these flags to keep unwinding a labeled jump that
/// targets an outer loop.
pub fn ascendant_labels(arena: &NodeArena, loop_node: NodeIndex) -> Vec<String> {
    let mut labels = Vec::new();
    for frame in enclosing_frames(arena, loop_node) {
        match frame.kind {
            FrameKind::Try => break,
            FrameKind::Loop => {
                if let Some(label) = frame.label {
                    labels.push(label);
                }
            }
            FrameKind::Switch => {}
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use lunify_parser::ParserState;

    fn parse(source: &str) -> (NodeArena, NodeIndex) {
        let mut parser = ParserState::new("test.js", source);
        let root = parser.parse_program().expect("parse failed");
        (std::mem::take(&mut parser.arena), root)
    }

    fn find_break(arena: &NodeArena) -> NodeIndex {
        (0..arena.len())
            .map(|i| NodeIndex(i as u32))
            .find(|i| matches!(arena.kind(*i), NodeKind::BreakStatement { .. }))
            .expect("break statement present")
    }

    #[test]
    fn loop_frame_is_nearest() {
        let (arena, _) = parse("outer: while (a) { for (;;) { break; } }");
        let frames = enclosing_frames(&arena, find_break(&arena));
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].kind, FrameKind::Loop);
        assert_eq!(frames[0].label, None);
        assert_eq!(frames[1].label.as_deref(), Some("outer"));
    }

    #[test]
    fn try_counts_only_from_its_protected_block() {
        let (arena, _) = parse("while (a) { try { break; } catch (e) {} }");
        let frames = enclosing_frames(&arena, find_break(&arena));
        assert_eq!(frames[0].kind, FrameKind::Try);

        let (arena, _) = parse("while (a) { try { f(); } catch (e) { break; } }");
        let frames = enclosing_frames(&arena, find_break(&arena));
        assert_eq!(frames[0].kind, FrameKind::Loop);
    }

    #[test]
    fn switch_is_a_frame() {
        let (arena, _) = parse("while (a) { switch (x) { case 1: break; } }");
        let frames = enclosing_frames(&arena, find_break(&arena));
        assert_eq!(frames[0].kind, FrameKind::Switch);
        assert_eq!(frames[1].kind, FrameKind::Loop);
    }

    #[test]
    fn frames_stop_at_function_boundaries() {
        let (arena, _) = parse("while (a) { var f = function () { break; }; }");
        let frames = enclosing_frames(&arena, find_break(&arena));
        assert!(frames.is_empty());
    }

    #[test]
    fn ascendant_labels_stop_at_a_try_boundary() {
        let (arena, _) = parse(
            "a: while (x) { try { b: while (y) { while (z) { q(); } } } catch (e) {} }",
        );
        // Children are added to the arena before their parents, so the
        // innermost while has the smallest index.
        let innermost = (0..arena.len())
            .map(|i| NodeIndex(i as u32))
            .find(|i| matches!(arena.kind(*i), NodeKind::WhileStatement { .. }))
            .expect("while present");
        let labels = ascendant_labels(&arena, innermost);
        assert_eq!(labels, vec!["b".to_string()]);
    }
}
