//! Rewrite rules for expressions.

use lunify_parser::{BinaryOp, LogicalOp, NodeIndex, NodeKind, UnaryOp};

use crate::encode::{encode_number, encode_string};
use crate::idents::is_lua_identifier;
use crate::rewrite::Rewriter;

/// Compose a binary operation from already-rewritten operand text. Also
/// serves compound-assignment desugaring, so `a |= b` routes through the
/// same bit helper as `a | b`.
pub(super) fn binary_text(op: BinaryOp, left: &str, right: &str) -> String {
    match op {
        BinaryOp::Equals | BinaryOp::StrictEquals => format!("({left} == {right})"),
        BinaryOp::NotEquals | BinaryOp::StrictNotEquals => format!("({left} ~= {right})"),
        BinaryOp::ShiftLeft => format!("_JS._bit.lshift({left}, {right})"),
        BinaryOp::ShiftRight => format!("_JS._bit.arshift({left}, {right})"),
        BinaryOp::UnsignedShiftRight => format!("_JS._bit.rshift({left}, {right})"),
        BinaryOp::BitwiseAnd => format!("_JS._bit.band({left}, {right})"),
        BinaryOp::BitwiseOr => format!("_JS._bit.bor({left}, {right})"),
        BinaryOp::BitwiseXor => format!("_JS._bit.bxor({left}, {right})"),
        BinaryOp::Instanceof => format!("_JS._instanceof({left}, {right})"),
        BinaryOp::In => format!("({left} in {right})"),
        BinaryOp::Add => format!("({left} + {right})"),
        BinaryOp::Subtract => format!("({left} - {right})"),
        BinaryOp::Multiply => format!("({left} * {right})"),
        BinaryOp::Divide => format!("({left} / {right})"),
        BinaryOp::Modulo => format!("({left} % {right})"),
        BinaryOp::LessThan => format!("({left} < {right})"),
        BinaryOp::LessThanEquals => format!("({left} <= {right})"),
        BinaryOp::GreaterThan => format!("({left} > {right})"),
        BinaryOp::GreaterThanEquals => format!("({left} >= {right})"),
    }
}

impl<'a> Rewriter<'a> {
    pub(super) fn emit_array(&mut self, node: NodeIndex) -> String {
        let NodeKind::ArrayExpression { elements } = self.arena.kind(node) else {
            unreachable!("emit_array on non-array node");
        };
        if elements.is_empty() {
            return "_JS._arr({})".to_string();
        }
        // The first element lands at index 0 so the runtime array stays
        // zero-based; the rest follow as an ordinary sequence.
        let items: Vec<String> = elements.iter().map(|e| self.text(*e)).collect();
        format!("_JS._arr({{[0]={}}})", items.join(", "))
    }

    pub(super) fn emit_object(&mut self, node: NodeIndex) -> String {
        let NodeKind::ObjectExpression { properties } = self.arena.kind(node) else {
            unreachable!("emit_object on non-object node");
        };
        let entries: Vec<String> = properties
            .iter()
            .filter_map(|p| {
                let NodeKind::Property { key, value } = self.arena.kind(*p) else {
                    return None;
                };
                let key_text = match self.arena.kind(*key) {
                    NodeKind::Identifier { name } => encode_string(name),
                    NodeKind::StringLiteral { value } => encode_string(value),
                    NodeKind::NumberLiteral { value } => encode_number(*value),
                    _ => encode_string(""),
                };
                Some(format!("[{key_text}]={}", self.text(*value)))
            })
            .collect();
        format!("_JS._obj({{\n  {}}})", entries.join(",\n  "))
    }

    pub(super) fn emit_unary(&mut self, node: NodeIndex) -> String {
        let NodeKind::UnaryExpression { op, argument } = self.arena.kind(node) else {
            unreachable!("emit_unary on non-unary node");
        };
        let arg = self.text(*argument);
        match op {
            UnaryOp::Not => format!("(not {arg})"),
            UnaryOp::Typeof => format!("_JS._typeof({arg})"),
            UnaryOp::Delete => format!("{arg} = nil"),
            UnaryOp::Minus => format!("(-{arg})"),
            // Lua coerces the operand of arithmetic, which matches the
            // source language's to-number here.
            UnaryOp::Plus => format!("(0 + {arg})"),
            UnaryOp::Void => format!("(function () local _r = {arg}; return nil; end)()"),
            UnaryOp::BitwiseNot => {
                self.warn_unsupported(node, "unary '~'");
                format!("(~{arg})")
            }
        }
    }

    pub(super) fn emit_update(&mut self, node: NodeIndex) -> String {
        let NodeKind::UpdateExpression {
            op,
            prefix,
            argument,
        } = self.arena.kind(node)
        else {
            unreachable!("emit_update on non-update node");
        };
        let target = self.text(*argument);
        let operator = op.arithmetic();
        if *prefix {
            format!("(function () {target} = {target} {operator} 1; return {target}; end)()")
        } else {
            format!(
                "(function () local _r = {target}; {target} = _r {operator} 1; return _r end)()"
            )
        }
    }

    pub(super) fn emit_binary(&mut self, node: NodeIndex) -> String {
        let NodeKind::BinaryExpression { op, left, right } = self.arena.kind(node) else {
            unreachable!("emit_binary on non-binary node");
        };
        if *op == BinaryOp::In {
            self.warn_unsupported(node, "'in' operator");
        }
        let left = self.text(*left);
        let right = self.text(*right);
        binary_text(*op, &left, &right)
    }

    pub(super) fn emit_logical(&mut self, node: NodeIndex) -> String {
        let NodeKind::LogicalExpression { op, left, right } = self.arena.kind(node) else {
            unreachable!("emit_logical on non-logical node");
        };
        let operator = match op {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        };
        let text = format!("({} {operator} {})", self.text(*left), self.text(*right));
        // and/or cannot stand alone as a statement.
        if matches!(
            self.parent_kind(node),
            Some(NodeKind::ExpressionStatement { .. })
        ) {
            format!("if {text} then end")
        } else {
            text
        }
    }

    pub(super) fn emit_assignment(&mut self, node: NodeIndex) -> String {
        let NodeKind::AssignmentExpression { op, left, right } = self.arena.kind(node) else {
            unreachable!("emit_assignment on non-assignment node");
        };
        let left_text = self.text(*left);
        let right_text = match op.binary_op() {
            None => self.text(*right),
            Some(binary) => binary_text(binary, &left_text, &self.text(*right)),
        };
        // Assignment is a statement in the target language; in expression
        // position it becomes a closure yielding the assigned value.
        if matches!(
            self.parent_kind(node),
            Some(NodeKind::ExpressionStatement { .. })
        ) {
            format!("{left_text} = {right_text}")
        } else {
            format!("(function () local _r = {right_text}; {left_text} = _r; return _r; end)()")
        }
    }

    pub(super) fn emit_conditional(&mut self, node: NodeIndex) -> String {
        let NodeKind::ConditionalExpression {
            test,
            consequent,
            alternate,
        } = self.arena.kind(node)
        else {
            unreachable!("emit_conditional on non-conditional node");
        };
        // Single-element table selection keeps nil/false branch values
        // working: the chosen table is always truthy, its [1] may be nil.
        format!(
            "({} and {{{}}} or {{{}}})[1]",
            self.truthy(*test),
            self.text(*consequent),
            self.text(*alternate)
        )
    }

    pub(super) fn emit_sequence(&mut self, node: NodeIndex) -> String {
        let NodeKind::SequenceExpression { expressions } = self.arena.kind(node) else {
            unreachable!("emit_sequence on non-sequence node");
        };
        self.warn_unsupported(node, "comma expression");
        let parts: Vec<String> = expressions.iter().map(|e| self.text(*e)).collect();
        parts.join(", ")
    }

    pub(super) fn emit_call(&mut self, node: NodeIndex) -> String {
        let NodeKind::CallExpression { callee, arguments } = self.arena.kind(node) else {
            unreachable!("emit_call on non-call node");
        };
        let mut args: Vec<String> = arguments.iter().map(|a| self.text(*a)).collect();
        if let NodeKind::MemberExpression {
            object,
            property,
            computed,
        } = self.arena.kind(*callee)
        {
            let object_text = self.text(*object);
            if !*computed {
                let name = self.arena.identifier_name(*property).unwrap_or_default();
                // console.log gets a trailing "" so the runtime's vararg
                // handling cannot truncate a trailing nil argument.
                if name == "log"
                    && self.arena.identifier_name(*object) == Some("console")
                {
                    args.push("\"\"".to_string());
                }
                if is_lua_identifier(name) {
                    return format!("{object_text}:{name}({})", args.join(", "));
                }
                return self.method_call_closure(&object_text, &encode_string(name), &args);
            }
            let key = self.text(*property);
            return self.method_call_closure(&object_text, &key, &args);
        }
        // Free calls receive the global object as their receiver.
        let mut full = vec!["global".to_string()];
        full.extend(args);
        format!("{}({})", self.text(*callee), full.join(", "))
    }

    /// Method invocation through a key that Lua's `:` syntax cannot
    /// express. Evaluates the receiver once and passes it explicitly.
    fn method_call_closure(&self, object: &str, key: &str, args: &[String]) -> String {
        let self_args = if args.is_empty() {
            "_o".to_string()
        } else {
            format!("_o, {}", args.join(", "))
        };
        format!("(function (_o) return _o[{key}]({self_args}); end)({object})")
    }

    pub(super) fn emit_new(&mut self, node: NodeIndex) -> String {
        let NodeKind::NewExpression { callee, arguments } = self.arena.kind(node) else {
            unreachable!("emit_new on non-new node");
        };
        let mut parts = vec![self.text(*callee)];
        parts.extend(arguments.iter().map(|a| self.text(*a)));
        format!("_JS._new({})", parts.join(", "))
    }

    pub(super) fn emit_member(&mut self, node: NodeIndex) -> String {
        let NodeKind::MemberExpression {
            object,
            property,
            computed,
        } = self.arena.kind(node)
        else {
            unreachable!("emit_member on non-member node");
        };
        let object_text = self.text(*object);
        if *computed {
            return format!("{object_text}[{}]", self.text(*property));
        }
        let name = self.arena.identifier_name(*property).unwrap_or_default();
        if is_lua_identifier(name) {
            format!("{object_text}.{name}")
        } else {
            // Keyword and `$` property names index with their raw string so
            // keys stay consistent with object-literal emission.
            format!("{object_text}[{}]", encode_string(name))
        }
    }
}
