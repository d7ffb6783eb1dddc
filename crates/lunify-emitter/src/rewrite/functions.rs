//! Function declaration/expression emission.
//!
//! Every function becomes a runtime wrapper call with an explicit receiver:
//! `_JS._func(function (this, a, b) ... end)`. Functions that touch the
//! `arguments` pseudo-array take varargs instead and synthesize the capture.

use lunify_parser::{NodeIndex, NodeKind};

use crate::idents::sanitize;
use crate::rewrite::Rewriter;

impl<'a> Rewriter<'a> {
    pub(super) fn emit_function(&mut self, node: NodeIndex) -> String {
        let (name_node, params, body, is_declaration) = match self.arena.kind(node) {
            NodeKind::FunctionDeclaration { name, params, body } => {
                (Some(*name), params, *body, true)
            }
            NodeKind::FunctionExpression { name, params, body } => (*name, params, *body, false),
            _ => unreachable!("emit_function on non-function node"),
        };
        let own_name = name_node
            .and_then(|n| self.arena.identifier_name(n))
            .map(sanitize);
        let params: Vec<String> = params.iter().map(|p| self.text(*p)).collect();

        // A self-reference alias is needed when the body can no longer reach
        // the function through an outer binding: a named expression whose
        // name is used inside, or a declaration whose own scope re-declares
        // the name.
        let needs_alias = match &own_name {
            Some(name) if is_declaration => self.analysis.hoists(node, name),
            Some(name) => {
                self.analysis.hoists(node, name)
                    || self
                        .analysis
                        .references_in_subtree(self.arena, node, name)
            }
            None => false,
        };
        let alias = match (&own_name, needs_alias) {
            (Some(name), true) => format!("local {name} = debug.getinfo(1, 'f').func;\n"),
            _ => String::new(),
        };

        let body_text = self.text(body);
        let core = if self.analysis.uses_arguments(node) {
            // The vararg table arrives 1-based; shifting rebases it to the
            // source language's 0-based view.
            let params_line = if params.is_empty() {
                String::new()
            } else {
                format!("local {} = ...;\n", params.join(", "))
            };
            format!(
                "_JS._func(function (this, ...)\n{alias}local arguments = _JS._arr((function (...) return arg; end)(...)); arguments:shift();\n{params_line}{body_text}\nend)"
            )
        } else {
            let mut signature = vec!["this".to_string()];
            signature.extend(params);
            format!(
                "_JS._func(function ({})\n{alias}{body_text}\nend)",
                signature.join(", ")
            )
        };

        if is_declaration {
            let name = own_name.unwrap_or_default();
            format!("{name} = {core};")
        } else {
            core
        }
    }
}
