//! Rewrite rules for statements: control flow, loops, switch, try, and the
//! break/continue sentinel encoding.

use lunify_parser::{NodeIndex, NodeKind, UnaryOp};

use crate::analysis::flag_name;
use crate::frames::{ascendant_labels, enclosing_frames, statement_label, FrameKind};
use crate::idents::sanitize;
use crate::rewrite::Rewriter;

impl<'a> Rewriter<'a> {
    pub(super) fn emit_variable_declaration(&mut self, node: NodeIndex) -> String {
        let NodeKind::VariableDeclaration { declarations } = self.arena.kind(node) else {
            unreachable!("emit_variable_declaration on non-declaration node");
        };
        // One parallel assignment; the `local` itself is hoisted to the top
        // of the enclosing scope.
        let mut names = Vec::new();
        let mut inits = Vec::new();
        for declaration in declarations {
            let NodeKind::VariableDeclarator { id, init } = self.arena.kind(*declaration) else {
                continue;
            };
            names.push(self.text(*id));
            inits.push(match init {
                Some(init) => self.text(*init),
                None => "nil".to_string(),
            });
        }
        format!("{} = {};", names.join(", "), inits.join(", "))
    }

    pub(super) fn emit_expression_statement(&mut self, node: NodeIndex) -> String {
        let NodeKind::ExpressionStatement { expression } = self.arena.kind(node) else {
            unreachable!("emit_expression_statement on wrong node");
        };
        let text = self.text(*expression);
        match self.arena.kind(*expression) {
            // `delete x` already rewrote to an assignment statement.
            NodeKind::UnaryExpression {
                op: UnaryOp::Delete,
                ..
            } => format!("{text};"),
            // Expressions that are not statements in the target language
            // become a no-op conditional; logical expressions wrapped
            // themselves already.
            NodeKind::BinaryExpression { .. }
            | NodeKind::UnaryExpression { .. }
            | NodeKind::NumberLiteral { .. }
            | NodeKind::StringLiteral { .. }
            | NodeKind::BoolLiteral { .. }
            | NodeKind::NullLiteral
            | NodeKind::RegexLiteral { .. }
            | NodeKind::CallExpression { .. }
            | NodeKind::Identifier { .. }
            | NodeKind::ThisExpression
            | NodeKind::MemberExpression { .. }
            | NodeKind::ConditionalExpression { .. } => format!("if {text} then end;"),
            _ => format!("{text};"),
        }
    }

    pub(super) fn emit_if(&mut self, node: NodeIndex) -> String {
        let NodeKind::IfStatement {
            test,
            consequent,
            alternate,
        } = self.arena.kind(node)
        else {
            unreachable!("emit_if on non-if node");
        };
        let mut out = format!("if {} then\n{}\n", self.truthy(*test), self.text(*consequent));
        if let Some(alternate) = alternate {
            out.push_str(&format!("else\n{}\n", self.text(*alternate)));
        }
        out.push_str("end");
        out
    }

    pub(super) fn emit_throw(&mut self, node: NodeIndex) -> String {
        let NodeKind::ThrowStatement { argument } = self.arena.kind(node) else {
            unreachable!("emit_throw on non-throw node");
        };
        format!("error({})", self.text(*argument))
    }

    pub(super) fn emit_return(&mut self, node: NodeIndex) -> String {
        let NodeKind::ReturnStatement { argument } = self.arena.kind(node) else {
            unreachable!("emit_return on non-return node");
        };
        // The conditional lets a return precede further statements in the
        // same Lua block.
        match argument {
            Some(argument) => format!("if true then return {}; end;", self.text(*argument)),
            None => "if true then return; end;".to_string(),
        }
    }

    // ==================== Loops ====================

    /// The single-iteration wrapper for loops a continue (or a labeled jump
    /// passing through) must be able to exit: `repeat ... until true` ends
    /// the iteration, then the flag check decides whether the loop itself
    /// must also break, including on behalf of labeled outer loops.
    fn loop_wrapper(&self, node: NodeIndex) -> Option<(String, String)> {
        if !self.analysis.is_wrapped_loop(node) {
            return None;
        }
        let name = statement_label(self.arena, node).unwrap_or_default();
        let ascend: String = ascendant_labels(self.arena, node)
            .iter()
            .map(|label| format!(" or _c{label}"))
            .collect();
        Some((
            format!("local _c{name} = nil; repeat"),
            format!("until true;\nif _c{name} == _JS._break{ascend} then break end"),
        ))
    }

    fn loop_lines(&self, node: NodeIndex, head: String, body: NodeIndex, tail: &str) -> String {
        let mut lines = vec![head];
        let wrapper = self.loop_wrapper(node);
        if let Some((open, _)) = &wrapper {
            lines.push(open.clone());
        }
        lines.push(self.text(body));
        if let Some((_, close)) = &wrapper {
            lines.push(close.clone());
        }
        lines.push(tail.to_string());
        lines.retain(|l| !l.is_empty());
        lines.join("\n")
    }

    pub(super) fn emit_while(&mut self, node: NodeIndex) -> String {
        let NodeKind::WhileStatement { test, body } = self.arena.kind(node) else {
            unreachable!("emit_while on non-while node");
        };
        let head = format!("while {} do", self.truthy(*test));
        self.loop_lines(node, head, *body, "end")
    }

    pub(super) fn emit_do_while(&mut self, node: NodeIndex) -> String {
        let NodeKind::DoWhileStatement { body, test } = self.arena.kind(node) else {
            unreachable!("emit_do_while on non-do-while node");
        };
        let tail = format!("until not {};", self.truthy(*test));
        self.loop_lines(node, "repeat".to_string(), *body, &tail)
    }

    pub(super) fn emit_for(&mut self, node: NodeIndex) -> String {
        let NodeKind::ForStatement {
            init,
            test,
            update,
            body,
        } = self.arena.kind(node)
        else {
            unreachable!("emit_for on non-for node");
        };
        let mut lines = Vec::new();
        if let Some(init) = init {
            let text = self.text(*init);
            if matches!(self.arena.kind(*init), NodeKind::VariableDeclaration { .. }) {
                lines.push(text);
            } else {
                lines.push(format!("{text};"));
            }
        }
        let head = match test {
            Some(test) => format!("while {} do", self.truthy(*test)),
            None => "while true do".to_string(),
        };
        lines.push(head);
        let wrapper = self.loop_wrapper(node);
        if let Some((open, _)) = &wrapper {
            lines.push(open.clone());
        }
        lines.push(self.text(*body));
        if let Some((_, close)) = &wrapper {
            lines.push(close.clone());
        }
        // The update runs after the wrapper check so a continue still
        // advances the loop variable while a break skips it.
        if let Some(update) = update {
            lines.push(format!("{};", self.text(*update)));
        }
        lines.push("end".to_string());
        lines.retain(|l| !l.is_empty());
        lines.join("\n")
    }

    pub(super) fn emit_for_in(&mut self, node: NodeIndex) -> String {
        let NodeKind::ForInStatement { left, right, body } = self.arena.kind(node) else {
            unreachable!("emit_for_in on non-for-in node");
        };
        let name = match self.arena.kind(*left) {
            NodeKind::VariableDeclaration { declarations } => declarations
                .first()
                .and_then(|d| match self.arena.kind(*d) {
                    NodeKind::VariableDeclarator { id, .. } => self.arena.identifier_name(*id),
                    _ => None,
                })
                .map(sanitize)
                .unwrap_or_default(),
            _ => self.text(*left),
        };
        let head = format!("for {name} in pairs({}) do", self.text(*right));
        self.loop_lines(node, head, *body, "end")
    }

    // ==================== Switch ====================

    pub(super) fn emit_switch(&mut self, node: NodeIndex) -> String {
        let NodeKind::SwitchStatement {
            discriminant,
            cases,
        } = self.arena.kind(node)
        else {
            unreachable!("emit_switch on non-switch node");
        };
        let mut lines = Vec::new();
        // A label on the switch gets its flag declared here so jumps that
        // target the switch from nested constructs have a local to set.
        if let Some(label) = statement_label(self.arena, node) {
            lines.push(format!("local _c{label} = nil;"));
        }
        lines.push("repeat".to_string());
        lines.push(format!("local _r = {};", self.text(*discriminant)));

        // Every case test is evaluated once, up front, in source order.
        let mut default_index = None;
        for (i, case) in cases.iter().enumerate() {
            let NodeKind::SwitchCase { test, .. } = self.arena.kind(*case) else {
                continue;
            };
            match test {
                Some(test) => lines.push(format!("local _{i} = {};", self.text(*test))),
                None => {
                    // The default slot holds a fresh table: a value nothing
                    // can compare equal to until the dispatch below picks it.
                    default_index = Some(i);
                    lines.push(format!("local _{i} = {{}};"));
                }
            }
        }
        if let Some(default) = default_index {
            let misses: Vec<String> = cases
                .iter()
                .enumerate()
                .filter(|(_, case)| {
                    matches!(
                        self.arena.kind(**case),
                        NodeKind::SwitchCase { test: Some(_), .. }
                    )
                })
                .map(|(i, _)| format!("_r ~= _{i}"))
                .collect();
            if misses.is_empty() {
                lines.push(format!("_r = _{default};"));
            } else {
                lines.push(format!("if {} then _r = _{default} end", misses.join(" and ")));
            }
        }

        for (i, case) in cases.iter().enumerate() {
            let NodeKind::SwitchCase { consequent, .. } = self.arena.kind(*case) else {
                continue;
            };
            let mut chunk = format!("if _r == _{i} then\n");
            for statement in consequent {
                let text = self.text(*statement);
                if !text.is_empty() {
                    chunk.push_str(&text);
                    chunk.push('\n');
                }
            }
            // Without a terminating break, execution falls through by
            // matching the next case's slot.
            let ends_with_break = consequent
                .last()
                .is_some_and(|s| matches!(self.arena.kind(*s), NodeKind::BreakStatement { .. }));
            if i + 1 < cases.len() && !ends_with_break {
                chunk.push_str(&format!("_r = _{};\n", i + 1));
            }
            chunk.push_str("end");
            lines.push(chunk);
        }
        lines.push("until true".to_string());

        // Re-issue any break/continue flag that has to travel past this
        // switch to reach its loop.
        if let Some(flags) = self.analysis.switch_propagation_flags(node) {
            let frames = enclosing_frames(self.arena, node);
            let inside_try = frames.first().is_some_and(|f| f.kind == FrameKind::Try);
            if inside_try {
                let mut chain = String::new();
                for (i, flag) in flags.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { "elseif" };
                    chain.push_str(&format!("{keyword} {flag} ~= nil then return {flag}\n"));
                }
                chain.push_str("end");
                lines.push(chain);
            } else {
                let checks: Vec<String> =
                    flags.iter().map(|flag| format!("{flag} ~= nil")).collect();
                lines.push(format!("if {} then break end", checks.join(" or ")));
            }
        }
        lines.join("\n")
    }

    // ==================== Try / catch / finally ====================

    pub(super) fn emit_try(&mut self, node: NodeIndex) -> String {
        let NodeKind::TryStatement {
            block,
            handler,
            finalizer,
        } = self.arena.kind(node)
        else {
            unreachable!("emit_try on non-try node");
        };
        let mut lines = vec![
            "local _e = nil".to_string(),
            "local _s, _r = xpcall(function ()".to_string(),
            self.text(*block),
            "    end, function (err)".to_string(),
            "        _e = err".to_string(),
            "    end)".to_string(),
        ];
        if let Some(handler) = handler {
            let NodeKind::CatchClause { param, body } = self.arena.kind(*handler) else {
                unreachable!("catch clause expected");
            };
            lines.push("if _s == false then".to_string());
            lines.push(format!("local {} = _e;", self.text(*param)));
            lines.push(self.text(*body));
            lines.push("end".to_string());
        }
        if let Some(finalizer) = finalizer {
            lines.push(self.text(*finalizer));
        }
        if handler.is_none() {
            // No handler: the error resurfaces once the finalizer has run.
            lines.push("if _s == false then error(_e) end".to_string());
        }
        let frames = enclosing_frames(self.arena, node);
        if !frames.is_empty() {
            let inside_try = frames[0].kind == FrameKind::Try;
            lines.push("if _r == _JS._break then".to_string());
            lines.push(if inside_try { "return _JS._break;" } else { "break;" }.to_string());
            lines.push("elseif _r == _JS._cont then".to_string());
            lines.push(if inside_try { "return _JS._cont;" } else { "break;" }.to_string());
            lines.push("end".to_string());
        }
        lines.retain(|l| !l.is_empty());
        lines.join("\n")
    }

    // ==================== Break / continue ====================

    pub(super) fn emit_break(&mut self, node: NodeIndex) -> String {
        let NodeKind::BreakStatement { label } = self.arena.kind(node) else {
            unreachable!("emit_break on non-break node");
        };
        let label = label.and_then(|l| self.arena.identifier_name(l)).map(sanitize);
        let frames = enclosing_frames(self.arena, node);
        if frames.is_empty() {
            self.warn_unsupported(node, "break outside a loop or switch");
        }
        let nearest_is_try = frames.first().is_some_and(|f| f.kind == FrameKind::Try);
        let jump = if nearest_is_try {
            "return _JS._break;"
        } else {
            "break;"
        };
        let flag = match &label {
            // A labeled jump always records its sentinel; the wrappers and
            // switch checks along the way read it.
            Some(l) => Some(flag_name(Some(l))),
            None => {
                let target = frames
                    .iter()
                    .find(|f| matches!(f.kind, FrameKind::Loop | FrameKind::Switch));
                match target {
                    // A wrapped loop only sees the break via its flag check.
                    Some(f)
                        if f.kind == FrameKind::Loop
                            && self.analysis.is_wrapped_loop(f.node) =>
                    {
                        Some(flag_name(None))
                    }
                    // Unwrapped loop or switch: the native break reaches it.
                    _ => None,
                }
            }
        };
        match flag {
            Some(flag) => format!("{flag} = _JS._break; {jump}"),
            None => jump.to_string(),
        }
    }

    pub(super) fn emit_continue(&mut self, node: NodeIndex) -> String {
        let NodeKind::ContinueStatement { label } = self.arena.kind(node) else {
            unreachable!("emit_continue on non-continue node");
        };
        let label = label.and_then(|l| self.arena.identifier_name(l)).map(sanitize);
        let frames = enclosing_frames(self.arena, node);
        if frames.is_empty() {
            self.warn_unsupported(node, "continue outside a loop");
        }
        let nearest_is_try = frames.first().is_some_and(|f| f.kind == FrameKind::Try);
        let jump = if nearest_is_try {
            "return _JS._cont;"
        } else {
            "break;"
        };
        format!("{} = _JS._cont; {jump}", flag_name(label.as_deref()))
    }
}
