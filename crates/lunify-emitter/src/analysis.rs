//! Pre-emission analysis.
//!
//! A read-only walk over the AST that fills the side tables the rewrite
//! rules need before any text exists: per-scope hoist sets, per-scope
//! identifier references, which loops need the single-iteration wrapper,
//! and which switches must re-issue a pending break/continue flag after
//! their `until true`.
//!
//! Running this ahead of emission guarantees the rewrite pass never reads
//! a scope's hoist list before the whole scope has been seen.

use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};

use lunify_parser::{NodeArena, NodeIndex, NodeKind};

use crate::frames::{enclosing_frames, FrameKind};
use crate::idents::sanitize;

#[derive(Default)]
pub struct Analysis {
    /// Names needing a hoisted `local` per function/program scope,
    /// insertion-ordered. `arguments` rides along here and is filtered out
    /// at emission (its binding comes from the synthesized capture).
    hoisted: FxHashMap<NodeIndex, IndexSet<String>>,
    /// Identifier names referenced in expression position, per scope.
    referenced: FxHashMap<NodeIndex, FxHashSet<String>>,
    /// Loops whose body is wrapped in `repeat ... until true` plus a flag
    /// check, because a continue targets them or a labeled jump crosses
    /// them.
    wrapped_loops: FxHashSet<NodeIndex>,
    /// Switches a break/continue must propagate through, with the flag
    /// names to re-check after `until true`.
    switch_flags: FxHashMap<NodeIndex, IndexSet<String>>,
}

impl Analysis {
    pub fn run(arena: &NodeArena, root: NodeIndex) -> Analysis {
        let mut analysis = Analysis::default();
        analysis.hoisted.entry(root).or_default();
        analysis.visit(arena, root, root);
        analysis
    }

    /// The hoisted `local` list for a scope, emission-ready.
    pub fn declarations(&self, scope: NodeIndex) -> Vec<String> {
        self.hoisted
            .get(&scope)
            .map(|names| {
                names
                    .iter()
                    .filter(|name| name.as_str() != "arguments")
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn hoists(&self, scope: NodeIndex, name: &str) -> bool {
        self.hoisted
            .get(&scope)
            .is_some_and(|names| names.contains(name))
    }

    pub fn uses_arguments(&self, scope: NodeIndex) -> bool {
        self.hoists(scope, "arguments")
    }

    pub fn is_wrapped_loop(&self, node: NodeIndex) -> bool {
        self.wrapped_loops.contains(&node)
    }

    pub fn switch_propagation_flags(&self, node: NodeIndex) -> Option<&IndexSet<String>> {
        self.switch_flags.get(&node)
    }

    /// Whether `name` is referenced anywhere inside `function`'s subtree,
    /// including nested function scopes. Drives the self-reference alias
    /// for named function expressions.
    pub fn references_in_subtree(
        &self,
        arena: &NodeArena,
        function: NodeIndex,
        name: &str,
    ) -> bool {
        self.referenced.iter().any(|(scope, names)| {
            names.contains(name) && is_self_or_descendant(arena, *scope, function)
        })
    }

    fn register(&mut self, scope: NodeIndex, name: String) {
        self.hoisted.entry(scope).or_default().insert(name);
    }

    fn visit(&mut self, arena: &NodeArena, node: NodeIndex, scope: NodeIndex) {
        match arena.kind(node) {
            NodeKind::Identifier { name } => {
                let fixed = sanitize(name);
                // A bare `arguments` reference forces the capture synthesis
                // in the enclosing function.
                if name == "arguments" {
                    self.register(scope, fixed.clone());
                }
                self.referenced.entry(scope).or_default().insert(fixed);
            }
            NodeKind::FunctionDeclaration { name, body, .. } => {
                if let Some(text) = arena.identifier_name(*name) {
                    self.register(scope, sanitize(text));
                }
                self.hoisted.entry(node).or_default();
                self.visit(arena, *body, node);
            }
            NodeKind::FunctionExpression { body, .. } => {
                self.hoisted.entry(node).or_default();
                self.visit(arena, *body, node);
            }
            NodeKind::VariableDeclarator { id, init } => {
                if let Some(text) = arena.identifier_name(*id) {
                    self.register(scope, sanitize(text));
                }
                if let Some(init) = init {
                    self.visit(arena, *init, scope);
                }
            }
            NodeKind::MemberExpression {
                object,
                property,
                computed,
            } => {
                self.visit(arena, *object, scope);
                if *computed {
                    self.visit(arena, *property, scope);
                }
            }
            // Property keys are names, not references.
            NodeKind::Property { value, .. } => self.visit(arena, *value, scope),
            NodeKind::LabeledStatement { body, .. } => self.visit(arena, *body, scope),
            NodeKind::BreakStatement { label } => {
                let label = label
                    .and_then(|l| arena.identifier_name(l))
                    .map(sanitize);
                self.mark_break(arena, node, label);
            }
            NodeKind::ContinueStatement { label } => {
                let label = label
                    .and_then(|l| arena.identifier_name(l))
                    .map(sanitize);
                self.mark_continue(arena, node, label);
            }
            _ => {
                for child in arena.children(node) {
                    self.visit(arena, child, scope);
                }
            }
        }
    }

    /// A continue wraps its target loop; a labeled continue also wraps every
    /// loop it unwinds through, and any switch crossed must re-issue the
    /// flag.
    fn mark_continue(&mut self, arena: &NodeArena, node: NodeIndex, label: Option<String>) {
        let flag = flag_name(label.as_deref());
        for frame in enclosing_frames(arena, node) {
            match frame.kind {
                FrameKind::Loop => {
                    self.wrapped_loops.insert(frame.node);
                    match &label {
                        None => return,
                        Some(l) if frame.label.as_deref() == Some(l.as_str()) => return,
                        Some(_) => {}
                    }
                }
                FrameKind::Switch => {
                    self.switch_flags
                        .entry(frame.node)
                        .or_default()
                        .insert(flag.clone());
                }
                FrameKind::Try => {}
            }
        }
    }

    /// An unlabeled break needs no marking: it exits its nearest loop or
    /// switch natively (the flag is only added when the target loop is
    /// wrapped for other reasons). A labeled break wraps every loop up to
    /// and including its target so the ascend checks can unwind it.
    fn mark_break(&mut self, arena: &NodeArena, node: NodeIndex, label: Option<String>) {
        let Some(label) = label else { return };
        let flag = flag_name(Some(&label));
        for frame in enclosing_frames(arena, node) {
            if frame.label.as_deref() == Some(label.as_str()) {
                if frame.kind == FrameKind::Loop {
                    self.wrapped_loops.insert(frame.node);
                }
                return;
            }
            match frame.kind {
                FrameKind::Loop => {
                    self.wrapped_loops.insert(frame.node);
                }
                FrameKind::Switch => {
                    self.switch_flags
                        .entry(frame.node)
                        .or_default()
                        .insert(flag.clone());
                }
                FrameKind::Try => {}
            }
        }
    }
}

/// `_c` for unlabeled jumps, `_c<label>` for labeled ones.
pub fn flag_name(label: Option<&str>) -> String {
    match label {
        Some(label) => format!("_c{label}"),
        None => "_c".to_string(),
    }
}

fn is_self_or_descendant(arena: &NodeArena, mut node: NodeIndex, ancestor: NodeIndex) -> bool {
    loop {
        if node == ancestor {
            return true;
        }
        match arena.parent(node) {
            Some(parent) => node = parent,
            None => return false,
        }
    }
}
