//! Expression parsing: primary, unary, precedence climbing, and the
//! left-hand-side suffix chain (member access, calls, `new`).

use lunify_common::{Diagnostic, Span};
use lunify_scanner::{SyntaxKind, TokenValue};

use crate::node::{AssignOp, BinaryOp, LogicalOp, NodeIndex, NodeKind, UnaryOp, UpdateOp};
use crate::parser::ParserState;

enum BinaryOperator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// Precedence and operator for a binary/logical token. `no_in` suppresses
/// the `in` operator inside for-statement headers.
fn binary_operator(kind: SyntaxKind, no_in: bool) -> Option<(u8, BinaryOperator)> {
    use BinaryOperator::{Binary, Logical};
    let entry = match kind {
        SyntaxKind::BarBar => (1, Logical(LogicalOp::Or)),
        SyntaxKind::AmpersandAmpersand => (2, Logical(LogicalOp::And)),
        SyntaxKind::Bar => (3, Binary(BinaryOp::BitwiseOr)),
        SyntaxKind::Caret => (4, Binary(BinaryOp::BitwiseXor)),
        SyntaxKind::Ampersand => (5, Binary(BinaryOp::BitwiseAnd)),
        SyntaxKind::EqualsEquals => (6, Binary(BinaryOp::Equals)),
        SyntaxKind::ExclamationEquals => (6, Binary(BinaryOp::NotEquals)),
        SyntaxKind::EqualsEqualsEquals => (6, Binary(BinaryOp::StrictEquals)),
        SyntaxKind::ExclamationEqualsEquals => (6, Binary(BinaryOp::StrictNotEquals)),
        SyntaxKind::LessThan => (7, Binary(BinaryOp::LessThan)),
        SyntaxKind::LessThanEquals => (7, Binary(BinaryOp::LessThanEquals)),
        SyntaxKind::GreaterThan => (7, Binary(BinaryOp::GreaterThan)),
        SyntaxKind::GreaterThanEquals => (7, Binary(BinaryOp::GreaterThanEquals)),
        SyntaxKind::InstanceofKeyword => (7, Binary(BinaryOp::Instanceof)),
        SyntaxKind::InKeyword if !no_in => (7, Binary(BinaryOp::In)),
        SyntaxKind::LessThanLessThan => (8, Binary(BinaryOp::ShiftLeft)),
        SyntaxKind::GreaterThanGreaterThan => (8, Binary(BinaryOp::ShiftRight)),
        SyntaxKind::GreaterThanGreaterThanGreaterThan => {
            (8, Binary(BinaryOp::UnsignedShiftRight))
        }
        SyntaxKind::Plus => (9, Binary(BinaryOp::Add)),
        SyntaxKind::Minus => (9, Binary(BinaryOp::Subtract)),
        SyntaxKind::Asterisk => (10, Binary(BinaryOp::Multiply)),
        SyntaxKind::Slash => (10, Binary(BinaryOp::Divide)),
        SyntaxKind::Percent => (10, Binary(BinaryOp::Modulo)),
        _ => return None,
    };
    Some(entry)
}

fn assignment_operator(kind: SyntaxKind) -> Option<AssignOp> {
    let op = match kind {
        SyntaxKind::Equals => AssignOp::Assign,
        SyntaxKind::PlusEquals => AssignOp::AddAssign,
        SyntaxKind::MinusEquals => AssignOp::SubtractAssign,
        SyntaxKind::AsteriskEquals => AssignOp::MultiplyAssign,
        SyntaxKind::SlashEquals => AssignOp::DivideAssign,
        SyntaxKind::PercentEquals => AssignOp::ModuloAssign,
        SyntaxKind::LessThanLessThanEquals => AssignOp::ShiftLeftAssign,
        SyntaxKind::GreaterThanGreaterThanEquals => AssignOp::ShiftRightAssign,
        SyntaxKind::GreaterThanGreaterThanGreaterThanEquals => AssignOp::UnsignedShiftRightAssign,
        SyntaxKind::AmpersandEquals => AssignOp::BitwiseAndAssign,
        SyntaxKind::BarEquals => AssignOp::BitwiseOrAssign,
        SyntaxKind::CaretEquals => AssignOp::BitwiseXorAssign,
        _ => return None,
    };
    Some(op)
}

impl<'a> ParserState<'a> {
    pub(crate) fn parse_expression(&mut self, no_in: bool) -> Result<NodeIndex, Diagnostic> {
        let first = self.parse_assignment_expression(no_in)?;
        if !self.at(SyntaxKind::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat(SyntaxKind::Comma)? {
            expressions.push(self.parse_assignment_expression(no_in)?);
        }
        let span = self
            .arena
            .span(expressions[0])
            .union(self.arena.span(*expressions.last().expect("nonempty")));
        Ok(self
            .arena
            .add(NodeKind::SequenceExpression { expressions }, span))
    }

    pub(crate) fn parse_assignment_expression(
        &mut self,
        no_in: bool,
    ) -> Result<NodeIndex, Diagnostic> {
        self.enter()?;
        let result = self.parse_assignment_inner(no_in);
        self.leave();
        result
    }

    fn parse_assignment_inner(&mut self, no_in: bool) -> Result<NodeIndex, Diagnostic> {
        let left = self.parse_conditional_expression(no_in)?;
        let Some(op) = assignment_operator(self.current.kind) else {
            return Ok(left);
        };
        if !matches!(
            self.arena.kind(left),
            NodeKind::Identifier { .. } | NodeKind::MemberExpression { .. }
        ) {
            return Err(self.error_here("invalid assignment target"));
        }
        self.bump()?;
        let right = self.parse_assignment_expression(no_in)?;
        let span = self.arena.span(left).union(self.arena.span(right));
        Ok(self
            .arena
            .add(NodeKind::AssignmentExpression { op, left, right }, span))
    }

    fn parse_conditional_expression(&mut self, no_in: bool) -> Result<NodeIndex, Diagnostic> {
        let test = self.parse_binary_expression(1, no_in)?;
        if !self.eat(SyntaxKind::QuestionMark)? {
            return Ok(test);
        }
        // `in` is allowed again between `?` and `:`.
        let consequent = self.parse_assignment_expression(false)?;
        self.expect(SyntaxKind::Colon, "':'")?;
        let alternate = self.parse_assignment_expression(no_in)?;
        let span = self.arena.span(test).union(self.arena.span(alternate));
        Ok(self.arena.add(
            NodeKind::ConditionalExpression {
                test,
                consequent,
                alternate,
            },
            span,
        ))
    }

    fn parse_binary_expression(
        &mut self,
        min_precedence: u8,
        no_in: bool,
    ) -> Result<NodeIndex, Diagnostic> {
        let mut left = self.parse_unary_expression()?;
        loop {
            let Some((precedence, operator)) = binary_operator(self.current.kind, no_in) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            self.bump()?;
            let right = self.parse_binary_expression(precedence + 1, no_in)?;
            let span = self.arena.span(left).union(self.arena.span(right));
            left = match operator {
                BinaryOperator::Binary(op) => {
                    self.arena
                        .add(NodeKind::BinaryExpression { op, left, right }, span)
                }
                BinaryOperator::Logical(op) => {
                    self.arena
                        .add(NodeKind::LogicalExpression { op, left, right }, span)
                }
            };
        }
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<NodeIndex, Diagnostic> {
        self.enter()?;
        let result = self.parse_unary_inner();
        self.leave();
        result
    }

    fn parse_unary_inner(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        let unary_op = match self.current.kind {
            SyntaxKind::Exclamation => Some(UnaryOp::Not),
            SyntaxKind::Tilde => Some(UnaryOp::BitwiseNot),
            SyntaxKind::Plus => Some(UnaryOp::Plus),
            SyntaxKind::Minus => Some(UnaryOp::Minus),
            SyntaxKind::TypeofKeyword => Some(UnaryOp::Typeof),
            SyntaxKind::VoidKeyword => Some(UnaryOp::Void),
            SyntaxKind::DeleteKeyword => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = unary_op {
            self.bump()?;
            let argument = self.parse_unary_expression()?;
            let span = self.finish_span(start);
            return Ok(self.arena.add(NodeKind::UnaryExpression { op, argument }, span));
        }

        if matches!(
            self.current.kind,
            SyntaxKind::PlusPlus | SyntaxKind::MinusMinus
        ) {
            let op = if self.at(SyntaxKind::PlusPlus) {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            self.bump()?;
            let argument = self.parse_unary_expression()?;
            self.check_update_target(argument)?;
            let span = self.finish_span(start);
            return Ok(self.arena.add(
                NodeKind::UpdateExpression {
                    op,
                    prefix: true,
                    argument,
                },
                span,
            ));
        }

        let expression = self.parse_lhs_expression()?;
        // Postfix ++/-- must be on the same line as its operand.
        if matches!(
            self.current.kind,
            SyntaxKind::PlusPlus | SyntaxKind::MinusMinus
        ) && !self.current.newline_before
        {
            let op = if self.at(SyntaxKind::PlusPlus) {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            self.check_update_target(expression)?;
            self.bump()?;
            let span = self.finish_span(start);
            return Ok(self.arena.add(
                NodeKind::UpdateExpression {
                    op,
                    prefix: false,
                    argument: expression,
                },
                span,
            ));
        }
        Ok(expression)
    }

    fn check_update_target(&self, target: NodeIndex) -> Result<(), Diagnostic> {
        if matches!(
            self.arena.kind(target),
            NodeKind::Identifier { .. } | NodeKind::MemberExpression { .. }
        ) {
            return Ok(());
        }
        Err(self.error_here("invalid increment/decrement target"))
    }

    fn parse_lhs_expression(&mut self) -> Result<NodeIndex, Diagnostic> {
        let mut expression = if self.at(SyntaxKind::NewKeyword) {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };
        loop {
            expression = match self.current.kind {
                SyntaxKind::Dot => self.parse_dot_member(expression)?,
                SyntaxKind::OpenBracket => self.parse_computed_member(expression)?,
                SyntaxKind::OpenParen => {
                    let arguments = self.parse_arguments()?;
                    let span = Span::new(self.arena.span(expression).start, self.prev_end);
                    self.arena.add(
                        NodeKind::CallExpression {
                            callee: expression,
                            arguments,
                        },
                        span,
                    )
                }
                _ => break,
            };
        }
        Ok(expression)
    }

    fn parse_dot_member(&mut self, object: NodeIndex) -> Result<NodeIndex, Diagnostic> {
        self.bump()?;
        // ES5 allows reserved words after `.` (`a.new`, `a.in`).
        if !self.at(SyntaxKind::Identifier) && !self.current.kind.is_keyword() {
            return Err(self.error_here(format!(
                "expected property name, found '{}'",
                self.current_text()
            )));
        }
        let name_span = self.current.span;
        let name = self.current.text(self.source).to_string();
        self.bump()?;
        let property = self.arena.add(NodeKind::Identifier { name }, name_span);
        let span = Span::new(self.arena.span(object).start, self.prev_end);
        Ok(self.arena.add(
            NodeKind::MemberExpression {
                object,
                property,
                computed: false,
            },
            span,
        ))
    }

    fn parse_computed_member(&mut self, object: NodeIndex) -> Result<NodeIndex, Diagnostic> {
        self.bump()?;
        let property = self.parse_expression(false)?;
        self.expect(SyntaxKind::CloseBracket, "']'")?;
        let span = Span::new(self.arena.span(object).start, self.prev_end);
        Ok(self.arena.add(
            NodeKind::MemberExpression {
                object,
                property,
                computed: true,
            },
            span,
        ))
    }

    fn parse_new_expression(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.expect(SyntaxKind::NewKeyword, "'new'")?;
        let mut callee = if self.at(SyntaxKind::NewKeyword) {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };
        // Member accesses bind tighter than the `new` argument list.
        loop {
            callee = match self.current.kind {
                SyntaxKind::Dot => self.parse_dot_member(callee)?,
                SyntaxKind::OpenBracket => self.parse_computed_member(callee)?,
                _ => break,
            };
        }
        let arguments = if self.at(SyntaxKind::OpenParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        let span = self.finish_span(start);
        Ok(self
            .arena
            .add(NodeKind::NewExpression { callee, arguments }, span))
    }

    fn parse_arguments(&mut self) -> Result<Vec<NodeIndex>, Diagnostic> {
        self.expect(SyntaxKind::OpenParen, "'('")?;
        let mut arguments = Vec::new();
        if !self.at(SyntaxKind::CloseParen) {
            loop {
                arguments.push(self.parse_assignment_expression(false)?);
                if !self.eat(SyntaxKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::CloseParen, "')'")?;
        Ok(arguments)
    }

    fn parse_primary_expression(&mut self) -> Result<NodeIndex, Diagnostic> {
        let span = self.current.span;
        match self.current.kind {
            SyntaxKind::Identifier => self.parse_identifier(),
            SyntaxKind::NumericLiteral => {
                let value = match self.current.value {
                    TokenValue::Number(n) => n,
                    _ => 0.0,
                };
                self.bump()?;
                Ok(self.arena.add(NodeKind::NumberLiteral { value }, span))
            }
            SyntaxKind::StringLiteral => {
                let value = match &self.current.value {
                    TokenValue::String(s) => s.clone(),
                    _ => String::new(),
                };
                self.bump()?;
                Ok(self.arena.add(NodeKind::StringLiteral { value }, span))
            }
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => {
                let value = self.at(SyntaxKind::TrueKeyword);
                self.bump()?;
                Ok(self.arena.add(NodeKind::BoolLiteral { value }, span))
            }
            SyntaxKind::NullKeyword => {
                self.bump()?;
                Ok(self.arena.add(NodeKind::NullLiteral, span))
            }
            SyntaxKind::ThisKeyword => {
                self.bump()?;
                Ok(self.arena.add(NodeKind::ThisExpression, span))
            }
            SyntaxKind::Slash | SyntaxKind::SlashEquals => self.parse_regex_literal(),
            SyntaxKind::OpenParen => {
                self.bump()?;
                let expression = self.parse_expression(false)?;
                self.expect(SyntaxKind::CloseParen, "')'")?;
                Ok(expression)
            }
            SyntaxKind::OpenBracket => self.parse_array_literal(),
            SyntaxKind::OpenBrace => self.parse_object_literal(),
            SyntaxKind::FunctionKeyword => self.parse_function_expression(),
            _ => Err(self.error_here(format!(
                "expected expression, found '{}'",
                self.current_text()
            ))),
        }
    }

    fn parse_regex_literal(&mut self) -> Result<NodeIndex, Diagnostic> {
        let token = self.rescan_current_as_regex()?;
        let span = token.span;
        let (pattern, flags) = match token.value {
            TokenValue::Regex { pattern, flags } => (pattern, flags),
            _ => (String::new(), String::new()),
        };
        self.bump()?;
        Ok(self
            .arena
            .add(NodeKind::RegexLiteral { pattern, flags }, span))
    }

    fn parse_array_literal(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.bump()?;
        let mut elements = Vec::new();
        while !self.at(SyntaxKind::CloseBracket) {
            if self.at(SyntaxKind::EndOfFile) {
                return Err(self.error_here("unexpected end of file in array literal"));
            }
            if self.at(SyntaxKind::Comma) {
                // Elision: a hole reads back as null.
                let hole_span = Span::at(self.current.span.start);
                elements.push(self.arena.add(NodeKind::NullLiteral, hole_span));
                self.bump()?;
                continue;
            }
            elements.push(self.parse_assignment_expression(false)?);
            if !self.at(SyntaxKind::CloseBracket) {
                self.expect(SyntaxKind::Comma, "','")?;
            }
        }
        self.bump()?;
        let span = self.finish_span(start);
        Ok(self.arena.add(NodeKind::ArrayExpression { elements }, span))
    }

    fn parse_object_literal(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.bump()?;
        let mut properties = Vec::new();
        while !self.at(SyntaxKind::CloseBrace) {
            if self.at(SyntaxKind::EndOfFile) {
                return Err(self.error_here("unexpected end of file in object literal"));
            }
            let key_span = self.current.span;
            let key = match self.current.kind {
                SyntaxKind::Identifier => {
                    let name = self.current.text(self.source).to_string();
                    self.bump()?;
                    self.arena.add(NodeKind::Identifier { name }, key_span)
                }
                kind if kind.is_keyword() => {
                    // Reserved words are legal property keys in ES5.
                    let name = self.current.text(self.source).to_string();
                    self.bump()?;
                    self.arena.add(NodeKind::Identifier { name }, key_span)
                }
                SyntaxKind::StringLiteral => {
                    let value = match &self.current.value {
                        TokenValue::String(s) => s.clone(),
                        _ => String::new(),
                    };
                    self.bump()?;
                    self.arena.add(NodeKind::StringLiteral { value }, key_span)
                }
                SyntaxKind::NumericLiteral => {
                    let value = match self.current.value {
                        TokenValue::Number(n) => n,
                        _ => 0.0,
                    };
                    self.bump()?;
                    self.arena.add(NodeKind::NumberLiteral { value }, key_span)
                }
                _ => {
                    return Err(self.error_here(format!(
                        "expected property name, found '{}'",
                        self.current_text()
                    )));
                }
            };
            if !self.at(SyntaxKind::Colon)
                && matches!(self.arena.identifier_name(key), Some("get") | Some("set"))
            {
                return Err(self.error_here("accessor properties are not supported"));
            }
            self.expect(SyntaxKind::Colon, "':'")?;
            let value = self.parse_assignment_expression(false)?;
            let span = self.finish_span(key_span);
            properties.push(self.arena.add(NodeKind::Property { key, value }, span));
            if !self.at(SyntaxKind::CloseBrace) {
                self.expect(SyntaxKind::Comma, "','")?;
            }
        }
        self.bump()?;
        let span = self.finish_span(start);
        Ok(self
            .arena
            .add(NodeKind::ObjectExpression { properties }, span))
    }

    fn parse_function_expression(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.expect(SyntaxKind::FunctionKeyword, "'function'")?;
        let name = if self.at(SyntaxKind::Identifier) {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        let params = self.parse_parameters()?;
        let body = self.parse_block()?;
        let span = self.finish_span(start);
        Ok(self
            .arena
            .add(NodeKind::FunctionExpression { name, params, body }, span))
    }
}
