use lunify_parser::{
    BinaryOp, LogicalOp, NodeArena, NodeIndex, NodeKind, ParserState, UnaryOp,
};

fn parse_expr(source: &str) -> (NodeArena, NodeIndex) {
    let mut parser = ParserState::new("test.js", source);
    let root = parser.parse_program().expect("parse failed");
    let expr = match parser.arena.kind(root) {
        NodeKind::Program { body } => match parser.arena.kind(body[0]) {
            NodeKind::ExpressionStatement { expression } => *expression,
            other => panic!("expected expression statement, got {other:?}"),
        },
        _ => unreachable!(),
    };
    (parser.arena, expr)
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let (arena, expr) = parse_expr("a + b * c;");
    let NodeKind::BinaryExpression { op, right, .. } = arena.kind(expr) else {
        panic!("expected binary expression");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(
        arena.kind(*right),
        NodeKind::BinaryExpression {
            op: BinaryOp::Multiply,
            ..
        }
    ));
}

#[test]
fn logical_or_binds_looser_than_and() {
    let (arena, expr) = parse_expr("a || b && c;");
    let NodeKind::LogicalExpression { op, right, .. } = arena.kind(expr) else {
        panic!("expected logical expression");
    };
    assert_eq!(*op, LogicalOp::Or);
    assert!(matches!(
        arena.kind(*right),
        NodeKind::LogicalExpression {
            op: LogicalOp::And,
            ..
        }
    ));
}

#[test]
fn assignment_is_right_associative() {
    let (arena, expr) = parse_expr("a = b = c;");
    let NodeKind::AssignmentExpression { right, .. } = arena.kind(expr) else {
        panic!("expected assignment");
    };
    assert!(matches!(
        arena.kind(*right),
        NodeKind::AssignmentExpression { .. }
    ));
}

#[test]
fn slash_after_operand_is_division() {
    let (arena, expr) = parse_expr("a / b;");
    assert!(matches!(
        arena.kind(expr),
        NodeKind::BinaryExpression {
            op: BinaryOp::Divide,
            ..
        }
    ));
}

#[test]
fn slash_in_expression_position_is_regex() {
    let (arena, expr) = parse_expr("/ab+c/gi;");
    let NodeKind::RegexLiteral { pattern, flags } = arena.kind(expr) else {
        panic!("expected regex literal");
    };
    assert_eq!(pattern, "ab+c");
    assert_eq!(flags, "gi");
}

#[test]
fn typeof_nests_inside_equality() {
    let (arena, expr) = parse_expr("typeof x == 'number';");
    let NodeKind::BinaryExpression { op, left, .. } = arena.kind(expr) else {
        panic!("expected binary expression");
    };
    assert_eq!(*op, BinaryOp::Equals);
    assert!(matches!(
        arena.kind(*left),
        NodeKind::UnaryExpression {
            op: UnaryOp::Typeof,
            ..
        }
    ));
}

#[test]
fn member_call_chain_shapes() {
    let (arena, expr) = parse_expr("a.b[c](1, 2).d;");
    let NodeKind::MemberExpression {
        object, computed, ..
    } = arena.kind(expr)
    else {
        panic!("expected member expression");
    };
    assert!(!computed);
    let NodeKind::CallExpression { callee, arguments } = arena.kind(*object) else {
        panic!("expected call");
    };
    assert_eq!(arguments.len(), 2);
    assert!(matches!(
        arena.kind(*callee),
        NodeKind::MemberExpression { computed: true, .. }
    ));
}

#[test]
fn new_with_member_callee_and_arguments() {
    let (arena, expr) = parse_expr("new a.B(1);");
    let NodeKind::NewExpression { callee, arguments } = arena.kind(expr) else {
        panic!("expected new expression");
    };
    assert_eq!(arguments.len(), 1);
    assert!(matches!(
        arena.kind(*callee),
        NodeKind::MemberExpression { .. }
    ));
}

#[test]
fn conditional_expression_shape() {
    let (arena, expr) = parse_expr("a ? b : c;");
    assert!(matches!(
        arena.kind(expr),
        NodeKind::ConditionalExpression { .. }
    ));
}

#[test]
fn sequence_expression_collects_operands() {
    let (arena, expr) = parse_expr("a, b, c;");
    let NodeKind::SequenceExpression { expressions } = arena.kind(expr) else {
        panic!("expected sequence");
    };
    assert_eq!(expressions.len(), 3);
}

#[test]
fn object_literal_allows_keyword_and_literal_keys() {
    let (arena, expr) = parse_expr("({ default: 1, 'two': 2, 3: 3 });");
    let NodeKind::ObjectExpression { properties } = arena.kind(expr) else {
        panic!("expected object literal");
    };
    assert_eq!(properties.len(), 3);
}

#[test]
fn array_holes_read_as_null() {
    let (arena, expr) = parse_expr("[1, , 3];");
    let NodeKind::ArrayExpression { elements } = arena.kind(expr) else {
        panic!("expected array literal");
    };
    assert_eq!(elements.len(), 3);
    assert!(matches!(arena.kind(elements[1]), NodeKind::NullLiteral));
}

#[test]
fn postfix_update_must_share_a_line() {
    let (arena, expr) = parse_expr("i++;");
    assert!(matches!(
        arena.kind(expr),
        NodeKind::UpdateExpression { prefix: false, .. }
    ));
    // With a newline in between, `++` cannot attach to `i`; since prefix
    // `++j` then follows, the program still parses as two statements.
    let mut parser = ParserState::new("test.js", "i\n++j;");
    let root = parser.parse_program().expect("parse failed");
    let NodeKind::Program { body } = parser.arena.kind(root) else {
        unreachable!();
    };
    assert_eq!(body.len(), 2);
}

#[test]
fn rejects_invalid_assignment_target() {
    let mut parser = ParserState::new("test.js", "1 = 2;");
    assert!(parser.parse_program().is_err());
}
