//! The rewrite engine: one rule per node category, applied bottom-up.
//!
//! Every rule consumes the already-final Lua text of its children (via the
//! fragment map) and produces the node's own final text. Rules never look
//! below their children's fragments, so each node's output is valid Lua on
//! its own once its rule has run.

mod expressions;
mod functions;
mod statements;

use lunify_parser::{NodeArena, NodeIndex, NodeKind};
use tracing::warn;

use crate::analysis::Analysis;
use crate::assemble;
use crate::encode::{encode_number, encode_string};
use crate::fragments::FragmentMap;
use crate::idents::sanitize;

pub struct Rewriter<'a> {
    arena: &'a NodeArena,
    source: &'a str,
    file_name: String,
    analysis: Analysis,
    fragments: FragmentMap,
}

impl<'a> Rewriter<'a> {
    pub fn new(
        arena: &'a NodeArena,
        source: &'a str,
        file_name: impl Into<String>,
    ) -> Rewriter<'a> {
        Rewriter {
            arena,
            source,
            file_name: file_name.into(),
            analysis: Analysis::default(),
            fragments: FragmentMap::new(arena.len()),
        }
    }

    /// Run the analysis pass, rewrite the whole tree bottom-up, and return
    /// the assembled program text.
    pub fn rewrite_program(&mut self, root: NodeIndex) -> String {
        self.analysis = Analysis::run(self.arena, root);
        self.rewrite(root);
        self.text(root)
    }

    fn rewrite(&mut self, node: NodeIndex) {
        for child in self.arena.children(node) {
            self.rewrite(child);
        }
        if let Some(text) = self.rule(node) {
            self.fragments.set(node, text);
        }
    }

    /// A node's current text: its fragment if a rule produced one, else the
    /// raw source slice (the pass-through path for unconverted nodes).
    pub(crate) fn text(&self, node: NodeIndex) -> String {
        match self.fragments.get(node) {
            Some(text) => text.to_string(),
            None => self.arena.span(node).slice(self.source).to_string(),
        }
    }

    fn rule(&mut self, node: NodeIndex) -> Option<String> {
        let text = match self.arena.kind(node) {
            NodeKind::Program { .. } => self.emit_program(node),
            NodeKind::Identifier { name } => sanitize(name),
            NodeKind::NumberLiteral { value } => format!("({})", encode_number(*value)),
            NodeKind::StringLiteral { value } => format!("({})", encode_string(value)),
            NodeKind::BoolLiteral { value } => {
                (if *value { "(true)" } else { "(false)" }).to_string()
            }
            NodeKind::NullLiteral => "(null)".to_string(),
            NodeKind::RegexLiteral { pattern, flags } => format!(
                "_JS._new(RegExp, ({}))",
                encode_string(&format!("/{pattern}/{flags}"))
            ),
            NodeKind::ThisExpression => "this".to_string(),

            // Structural nodes whose parents compose them directly.
            NodeKind::Property { .. }
            | NodeKind::SwitchCase { .. }
            | NodeKind::VariableDeclarator { .. }
            | NodeKind::CatchClause { .. } => return None,

            NodeKind::ArrayExpression { .. } => self.emit_array(node),
            NodeKind::ObjectExpression { .. } => self.emit_object(node),
            NodeKind::UnaryExpression { .. } => self.emit_unary(node),
            NodeKind::UpdateExpression { .. } => self.emit_update(node),
            NodeKind::BinaryExpression { .. } => self.emit_binary(node),
            NodeKind::LogicalExpression { .. } => self.emit_logical(node),
            NodeKind::AssignmentExpression { .. } => self.emit_assignment(node),
            NodeKind::ConditionalExpression { .. } => self.emit_conditional(node),
            NodeKind::SequenceExpression { .. } => self.emit_sequence(node),
            NodeKind::CallExpression { .. } => self.emit_call(node),
            NodeKind::NewExpression { .. } => self.emit_new(node),
            NodeKind::MemberExpression { .. } => self.emit_member(node),

            NodeKind::FunctionDeclaration { .. } | NodeKind::FunctionExpression { .. } => {
                self.emit_function(node)
            }
            NodeKind::VariableDeclaration { .. } => self.emit_variable_declaration(node),
            NodeKind::BlockStatement { .. } => self.emit_block(node),
            NodeKind::EmptyStatement | NodeKind::DebuggerStatement => String::new(),
            NodeKind::ExpressionStatement { .. } => self.emit_expression_statement(node),
            NodeKind::IfStatement { .. } => self.emit_if(node),
            NodeKind::WhileStatement { .. } => self.emit_while(node),
            NodeKind::DoWhileStatement { .. } => self.emit_do_while(node),
            NodeKind::ForStatement { .. } => self.emit_for(node),
            NodeKind::ForInStatement { .. } => self.emit_for_in(node),
            NodeKind::SwitchStatement { .. } => self.emit_switch(node),
            NodeKind::TryStatement { .. } => self.emit_try(node),
            NodeKind::ThrowStatement { .. } => self.emit_throw(node),
            NodeKind::ReturnStatement { .. } => self.emit_return(node),
            NodeKind::BreakStatement { .. } => self.emit_break(node),
            NodeKind::ContinueStatement { .. } => self.emit_continue(node),
            NodeKind::LabeledStatement { body, .. } => self.text(*body),
        };
        Some(text)
    }

    /// Wrap a condition in the runtime truthiness coercion unless the
    /// expression already yields a target-language boolean.
    pub(crate) fn truthy(&self, test: NodeIndex) -> String {
        let text = self.text(test);
        let already_boolean = match self.arena.kind(test) {
            NodeKind::UnaryExpression {
                op: lunify_parser::UnaryOp::Not,
                ..
            } => true,
            NodeKind::BinaryExpression { op, .. } => op.is_comparison(),
            _ => false,
        };
        if already_boolean {
            text
        } else {
            format!("_JS._truthy({text})")
        }
    }

    pub(crate) fn parent_kind(&self, node: NodeIndex) -> Option<&NodeKind> {
        self.arena.parent(node).map(|p| self.arena.kind(p))
    }

    pub(crate) fn warn_unsupported(&self, node: NodeIndex, what: &str) {
        warn!(
            file = %self.file_name,
            offset = self.arena.span(node).start,
            "{what} has no rewrite rule; passing through unconverted"
        );
    }

    /// Body of a function or program: hoisted locals first, then function
    /// declarations, then the remaining statements.
    pub(crate) fn scope_body(&self, ids: &[String], statements: &[NodeIndex]) -> String {
        let mut function_decls = Vec::new();
        let mut others = Vec::new();
        for statement in statements {
            let text = self.text(*statement);
            if matches!(
                self.arena.kind(*statement),
                NodeKind::FunctionDeclaration { .. }
            ) {
                function_decls.push(text);
            } else {
                others.push(text);
            }
        }
        assemble::scope_body(ids, &function_decls, &others)
    }

    fn emit_program(&mut self, node: NodeIndex) -> String {
        let NodeKind::Program { body } = self.arena.kind(node) else {
            unreachable!("emit_program on non-program node");
        };
        let ids = self.analysis.declarations(node);
        let body_text = self.scope_body(&ids, body);
        assemble::assemble_program(&body_text)
    }

    fn emit_block(&mut self, node: NodeIndex) -> String {
        let NodeKind::BlockStatement { body } = self.arena.kind(node) else {
            unreachable!("emit_block on non-block node");
        };
        let ids = match self.arena.parent(node) {
            Some(parent)
                if matches!(
                    self.arena.kind(parent),
                    NodeKind::FunctionDeclaration { .. } | NodeKind::FunctionExpression { .. }
                ) =>
            {
                self.analysis.declarations(parent)
            }
            _ => Vec::new(),
        };
        self.scope_body(&ids, body)
    }
}
