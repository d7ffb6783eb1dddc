//! Recursive-descent ES5 parser.
//!
//! Token-cursor state, automatic semicolon insertion, and statement parsing
//! live here; expression parsing (precedence climbing) is in
//! `expressions.rs`.

mod expressions;

use lunify_common::{Diagnostic, Span};
use lunify_scanner::{ScanError, Scanner, SyntaxKind, Token, TokenValue};

use crate::node::{NodeArena, NodeIndex, NodeKind};

/// Maximum statement/expression nesting before parsing is abandoned. Keeps
/// the parser and every later recursive walk off the process stack limit.
const MAX_PARSE_DEPTH: u32 = 500;

pub struct ParserState<'a> {
    file_name: String,
    source: &'a str,
    scanner: Scanner<'a>,
    current: Token,
    peeked: Option<Token>,
    prev_end: u32,
    depth: u32,
    pub arena: NodeArena,
}

impl<'a> ParserState<'a> {
    pub fn new(file_name: impl Into<String>, source: &'a str) -> ParserState<'a> {
        ParserState {
            file_name: file_name.into(),
            source,
            scanner: Scanner::new(source),
            current: Token {
                kind: SyntaxKind::EndOfFile,
                span: Span::at(0),
                newline_before: false,
                value: TokenValue::None,
            },
            peeked: None,
            prev_end: 0,
            depth: 0,
            arena: NodeArena::new(),
        }
    }

    /// Parse a whole program and assign parent links. The arena is left in
    /// `self.arena` for the caller to take.
    pub fn parse_program(&mut self) -> Result<NodeIndex, Diagnostic> {
        self.bump()?;
        let mut body = Vec::new();
        while !self.at(SyntaxKind::EndOfFile) {
            body.push(self.parse_statement()?);
        }
        let span = Span::new(0, self.source.len() as u32);
        let program = self.arena.add(NodeKind::Program { body }, span);
        self.arena.assign_parents(program);
        Ok(program)
    }

    // ==================== Cursor ====================

    fn bump(&mut self) -> Result<(), Diagnostic> {
        self.prev_end = self.current.span.end;
        self.current = match self.peeked.take() {
            Some(token) => token,
            None => self.next_from_scanner()?,
        };
        Ok(())
    }

    fn next_from_scanner(&mut self) -> Result<Token, Diagnostic> {
        self.scanner
            .next_token()
            .map_err(|e| self.scan_diagnostic(e))
    }

    fn scan_diagnostic(&self, e: ScanError) -> Diagnostic {
        Diagnostic::error(&self.file_name, Span::at(e.pos), e.message)
    }

    fn peek(&mut self) -> Result<&Token, Diagnostic> {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_from_scanner()?);
        }
        Ok(self.peeked.as_ref().expect("just filled"))
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.current.kind == kind
    }

    fn eat(&mut self, kind: SyntaxKind) -> Result<bool, Diagnostic> {
        if self.at(kind) {
            self.bump()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn expect(&mut self, kind: SyntaxKind, what: &str) -> Result<(), Diagnostic> {
        if self.at(kind) {
            self.bump()?;
            return Ok(());
        }
        Err(self.error_here(format!("expected {what}, found '{}'", self.current_text())))
    }

    fn current_text(&self) -> &str {
        if self.current.kind == SyntaxKind::EndOfFile {
            "end of file"
        } else {
            self.current.text(self.source)
        }
    }

    fn error_here(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::error(&self.file_name, self.current.span, message)
    }

    fn finish_span(&self, start: Span) -> Span {
        Span::new(start.start, self.prev_end)
    }

    fn enter(&mut self) -> Result<(), Diagnostic> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            return Err(self.error_here("nesting too deep"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Automatic semicolon insertion: a real `;`, a line terminator before
    /// the current token, `}`, or end of file all terminate a statement.
    fn expect_semicolon(&mut self) -> Result<(), Diagnostic> {
        if self.eat(SyntaxKind::Semicolon)? {
            return Ok(());
        }
        if self.current.newline_before
            || self.at(SyntaxKind::CloseBrace)
            || self.at(SyntaxKind::EndOfFile)
        {
            return Ok(());
        }
        Err(self.error_here(format!("expected ';', found '{}'", self.current_text())))
    }

    /// Re-interpret the current `/` or `/=` token as the start of a regex
    /// literal. Only called from primary-expression position, where no
    /// lookahead token can be pending.
    pub(crate) fn rescan_current_as_regex(&mut self) -> Result<Token, Diagnostic> {
        debug_assert!(self.peeked.is_none());
        let token = self
            .scanner
            .rescan_regex(&self.current)
            .map_err(|e| self.scan_diagnostic(e))?;
        self.current = token.clone();
        Ok(token)
    }

    pub(crate) fn parse_identifier(&mut self) -> Result<NodeIndex, Diagnostic> {
        if !self.at(SyntaxKind::Identifier) {
            return Err(self.error_here(format!(
                "expected identifier, found '{}'",
                self.current_text()
            )));
        }
        let span = self.current.span;
        let name = self.current.text(self.source).to_string();
        self.bump()?;
        Ok(self.arena.add(NodeKind::Identifier { name }, span))
    }

    // ==================== Statements ====================

    pub(crate) fn parse_statement(&mut self) -> Result<NodeIndex, Diagnostic> {
        self.enter()?;
        let result = self.parse_statement_inner();
        self.leave();
        result
    }

    fn parse_statement_inner(&mut self) -> Result<NodeIndex, Diagnostic> {
        match self.current.kind {
            SyntaxKind::OpenBrace => self.parse_block(),
            SyntaxKind::VarKeyword => {
                let declaration = self.parse_variable_declaration(false)?;
                self.expect_semicolon()?;
                Ok(declaration)
            }
            SyntaxKind::Semicolon => {
                let span = self.current.span;
                self.bump()?;
                Ok(self.arena.add(NodeKind::EmptyStatement, span))
            }
            SyntaxKind::FunctionKeyword => self.parse_function_declaration(),
            SyntaxKind::IfKeyword => self.parse_if_statement(),
            SyntaxKind::WhileKeyword => self.parse_while_statement(),
            SyntaxKind::DoKeyword => self.parse_do_while_statement(),
            SyntaxKind::ForKeyword => self.parse_for_statement(),
            SyntaxKind::SwitchKeyword => self.parse_switch_statement(),
            SyntaxKind::TryKeyword => self.parse_try_statement(),
            SyntaxKind::ThrowKeyword => self.parse_throw_statement(),
            SyntaxKind::ReturnKeyword => self.parse_return_statement(),
            SyntaxKind::BreakKeyword => self.parse_break_or_continue(true),
            SyntaxKind::ContinueKeyword => self.parse_break_or_continue(false),
            SyntaxKind::DebuggerKeyword => {
                let span = self.current.span;
                self.bump()?;
                self.expect_semicolon()?;
                Ok(self.arena.add(NodeKind::DebuggerStatement, span))
            }
            SyntaxKind::WithKeyword => Err(self.error_here("with statements are not supported")),
            SyntaxKind::Identifier => {
                if self.peek()?.kind == SyntaxKind::Colon {
                    return self.parse_labeled_statement();
                }
                self.parse_expression_statement()
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        let expression = self.parse_expression(false)?;
        self.expect_semicolon()?;
        let span = self.finish_span(start);
        Ok(self
            .arena
            .add(NodeKind::ExpressionStatement { expression }, span))
    }

    fn parse_block(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.expect(SyntaxKind::OpenBrace, "'{'")?;
        let mut body = Vec::new();
        while !self.at(SyntaxKind::CloseBrace) {
            if self.at(SyntaxKind::EndOfFile) {
                return Err(self.error_here("unexpected end of file in block"));
            }
            body.push(self.parse_statement()?);
        }
        self.bump()?;
        let span = self.finish_span(start);
        Ok(self.arena.add(NodeKind::BlockStatement { body }, span))
    }

    /// `var a = 1, b;` without the trailing semicolon, which is the
    /// caller's business so this also serves for-statement initializers.
    fn parse_variable_declaration(&mut self, no_in: bool) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.expect(SyntaxKind::VarKeyword, "'var'")?;
        let mut declarations = Vec::new();
        loop {
            let id = self.parse_identifier()?;
            let decl_start = self.arena.span(id);
            let init = if self.eat(SyntaxKind::Equals)? {
                Some(self.parse_assignment_expression(no_in)?)
            } else {
                None
            };
            let span = self.finish_span(decl_start);
            declarations.push(self.arena.add(NodeKind::VariableDeclarator { id, init }, span));
            if !self.eat(SyntaxKind::Comma)? {
                break;
            }
        }
        let span = self.finish_span(start);
        Ok(self
            .arena
            .add(NodeKind::VariableDeclaration { declarations }, span))
    }

    fn parse_function_declaration(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.expect(SyntaxKind::FunctionKeyword, "'function'")?;
        let name = self.parse_identifier()?;
        let params = self.parse_parameters()?;
        let body = self.parse_block()?;
        let span = self.finish_span(start);
        Ok(self
            .arena
            .add(NodeKind::FunctionDeclaration { name, params, body }, span))
    }

    pub(crate) fn parse_parameters(&mut self) -> Result<Vec<NodeIndex>, Diagnostic> {
        self.expect(SyntaxKind::OpenParen, "'('")?;
        let mut params = Vec::new();
        if !self.at(SyntaxKind::CloseParen) {
            loop {
                params.push(self.parse_identifier()?);
                if !self.eat(SyntaxKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::CloseParen, "')'")?;
        Ok(params)
    }

    fn parse_if_statement(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.bump()?;
        self.expect(SyntaxKind::OpenParen, "'('")?;
        let test = self.parse_expression(false)?;
        self.expect(SyntaxKind::CloseParen, "')'")?;
        let consequent = self.parse_statement()?;
        let alternate = if self.eat(SyntaxKind::ElseKeyword)? {
            Some(self.parse_statement()?)
        } else {
            None
        };
        let span = self.finish_span(start);
        Ok(self.arena.add(
            NodeKind::IfStatement {
                test,
                consequent,
                alternate,
            },
            span,
        ))
    }

    fn parse_while_statement(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.bump()?;
        self.expect(SyntaxKind::OpenParen, "'('")?;
        let test = self.parse_expression(false)?;
        self.expect(SyntaxKind::CloseParen, "')'")?;
        let body = self.parse_statement()?;
        let span = self.finish_span(start);
        Ok(self.arena.add(NodeKind::WhileStatement { test, body }, span))
    }

    fn parse_do_while_statement(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.bump()?;
        let body = self.parse_statement()?;
        self.expect(SyntaxKind::WhileKeyword, "'while'")?;
        self.expect(SyntaxKind::OpenParen, "'('")?;
        let test = self.parse_expression(false)?;
        self.expect(SyntaxKind::CloseParen, "')'")?;
        // The semicolon after do-while is always optional.
        self.eat(SyntaxKind::Semicolon)?;
        let span = self.finish_span(start);
        Ok(self
            .arena
            .add(NodeKind::DoWhileStatement { body, test }, span))
    }

    fn parse_for_statement(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.bump()?;
        self.expect(SyntaxKind::OpenParen, "'('")?;

        let init = if self.at(SyntaxKind::Semicolon) {
            None
        } else if self.at(SyntaxKind::VarKeyword) {
            let declaration = self.parse_variable_declaration(true)?;
            if self.at(SyntaxKind::InKeyword) {
                if let NodeKind::VariableDeclaration { declarations } =
                    self.arena.kind(declaration)
                    && declarations.len() != 1
                {
                    return Err(
                        self.error_here("for-in loop declares more than one iteration variable")
                    );
                }
                return self.finish_for_in(start, declaration);
            }
            Some(declaration)
        } else {
            let expression = self.parse_expression(true)?;
            if self.at(SyntaxKind::InKeyword) {
                return self.finish_for_in(start, expression);
            }
            Some(expression)
        };
        self.expect(SyntaxKind::Semicolon, "';'")?;

        let test = if self.at(SyntaxKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.expect(SyntaxKind::Semicolon, "';'")?;

        let update = if self.at(SyntaxKind::CloseParen) {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.expect(SyntaxKind::CloseParen, "')'")?;

        let body = self.parse_statement()?;
        let span = self.finish_span(start);
        Ok(self.arena.add(
            NodeKind::ForStatement {
                init,
                test,
                update,
                body,
            },
            span,
        ))
    }

    fn finish_for_in(&mut self, start: Span, left: NodeIndex) -> Result<NodeIndex, Diagnostic> {
        self.expect(SyntaxKind::InKeyword, "'in'")?;
        let right = self.parse_expression(false)?;
        self.expect(SyntaxKind::CloseParen, "')'")?;
        let body = self.parse_statement()?;
        let span = self.finish_span(start);
        Ok(self
            .arena
            .add(NodeKind::ForInStatement { left, right, body }, span))
    }

    fn parse_switch_statement(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.bump()?;
        self.expect(SyntaxKind::OpenParen, "'('")?;
        let discriminant = self.parse_expression(false)?;
        self.expect(SyntaxKind::CloseParen, "')'")?;
        self.expect(SyntaxKind::OpenBrace, "'{'")?;

        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.at(SyntaxKind::CloseBrace) {
            let case_start = self.current.span;
            let test = if self.eat(SyntaxKind::CaseKeyword)? {
                let test = self.parse_expression(false)?;
                Some(test)
            } else if self.at(SyntaxKind::DefaultKeyword) {
                if seen_default {
                    return Err(self.error_here("more than one default clause in switch"));
                }
                seen_default = true;
                self.bump()?;
                None
            } else {
                return Err(self.error_here(format!(
                    "expected 'case' or 'default', found '{}'",
                    self.current_text()
                )));
            };
            self.expect(SyntaxKind::Colon, "':'")?;
            let mut consequent = Vec::new();
            while !matches!(
                self.current.kind,
                SyntaxKind::CaseKeyword | SyntaxKind::DefaultKeyword | SyntaxKind::CloseBrace
            ) {
                if self.at(SyntaxKind::EndOfFile) {
                    return Err(self.error_here("unexpected end of file in switch"));
                }
                consequent.push(self.parse_statement()?);
            }
            let span = self.finish_span(case_start);
            cases.push(self.arena.add(NodeKind::SwitchCase { test, consequent }, span));
        }
        self.bump()?;
        let span = self.finish_span(start);
        Ok(self.arena.add(
            NodeKind::SwitchStatement {
                discriminant,
                cases,
            },
            span,
        ))
    }

    fn parse_try_statement(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.bump()?;
        let block = self.parse_block()?;
        let handler = if self.at(SyntaxKind::CatchKeyword) {
            let clause_start = self.current.span;
            self.bump()?;
            self.expect(SyntaxKind::OpenParen, "'('")?;
            let param = self.parse_identifier()?;
            self.expect(SyntaxKind::CloseParen, "')'")?;
            let body = self.parse_block()?;
            let span = self.finish_span(clause_start);
            Some(self.arena.add(NodeKind::CatchClause { param, body }, span))
        } else {
            None
        };
        let finalizer = if self.eat(SyntaxKind::FinallyKeyword)? {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_here("missing catch or finally after try"));
        }
        let span = self.finish_span(start);
        Ok(self.arena.add(
            NodeKind::TryStatement {
                block,
                handler,
                finalizer,
            },
            span,
        ))
    }

    fn parse_throw_statement(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.bump()?;
        if self.current.newline_before {
            return Err(self.error_here("illegal newline after throw"));
        }
        let argument = self.parse_expression(false)?;
        self.expect_semicolon()?;
        let span = self.finish_span(start);
        Ok(self.arena.add(NodeKind::ThrowStatement { argument }, span))
    }

    fn parse_return_statement(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.bump()?;
        // Restricted production: a newline after `return` ends the statement.
        let argument = if self.current.newline_before
            || self.at(SyntaxKind::Semicolon)
            || self.at(SyntaxKind::CloseBrace)
            || self.at(SyntaxKind::EndOfFile)
        {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.expect_semicolon()?;
        let span = self.finish_span(start);
        Ok(self.arena.add(NodeKind::ReturnStatement { argument }, span))
    }

    fn parse_break_or_continue(&mut self, is_break: bool) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        self.bump()?;
        // Restricted production: no newline between the keyword and a label.
        let label = if self.at(SyntaxKind::Identifier) && !self.current.newline_before {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        self.expect_semicolon()?;
        let span = self.finish_span(start);
        let kind = if is_break {
            NodeKind::BreakStatement { label }
        } else {
            NodeKind::ContinueStatement { label }
        };
        Ok(self.arena.add(kind, span))
    }

    fn parse_labeled_statement(&mut self) -> Result<NodeIndex, Diagnostic> {
        let start = self.current.span;
        let label = self.parse_identifier()?;
        self.expect(SyntaxKind::Colon, "':'")?;
        let body = self.parse_statement()?;
        let span = self.finish_span(start);
        Ok(self
            .arena
            .add(NodeKind::LabeledStatement { label, body }, span))
    }
}
