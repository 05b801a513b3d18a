//! Parser structure and error tests.

use noteg::{
    AccessibilityKind, BinaryOp, Error, Expr, Literal, ParseErrorKind, Stmt, TemplatePart,
    UnaryOp, parse_str,
};

fn statements(input: &str) -> Vec<Stmt> {
    parse_str(input).expect("parse").statements
}

fn expr(input: &str) -> Expr {
    match statements(input).into_iter().next() {
        Some(Stmt::Expr(e)) => e,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

fn parse_error(input: &str) -> ParseErrorKind {
    match parse_str(input) {
        Err(Error::Parse(err)) => err.kind,
        other => panic!("expected parse error, got {other:?}"),
    }
}

// -----------------------------------------------------------
// Precedence.
// -----------------------------------------------------------

#[test]
fn parse_precedence_ladder() {
    // || < && < equality < comparison < term < factor
    let e = expr("a || b && c == d < e + f * g");
    assert_eq!(e.to_string(), "a || b && c == d < e + f * g");
    let Expr::Binary { op, right, .. } = e else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Or);
    let Expr::Binary { op, right, .. } = *right else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::And);
    let Expr::Binary { op, right, .. } = *right else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Eq);
    assert!(matches!(*right, Expr::Binary { op: BinaryOp::Less, .. }));
}

#[test]
fn parse_unary_binds_looser_than_pipe() {
    let e = expr("-x | f");
    let Expr::Unary { op, operand, .. } = e else {
        panic!("expected unary");
    };
    assert_eq!(op, UnaryOp::Neg);
    assert!(matches!(*operand, Expr::Binary { op: BinaryOp::Pipe, .. }));
}

#[test]
fn parse_pipe_chain_is_left_associative() {
    let e = expr("x | f | g");
    let Expr::Binary { left, right, .. } = e else {
        panic!("expected binary");
    };
    assert!(matches!(*left, Expr::Binary { op: BinaryOp::Pipe, .. }));
    assert!(matches!(*right, Expr::Identifier { ref name, .. } if name == "g"));
}

#[test]
fn parse_binary_spans_cover_operands() {
    let Expr::Binary { span, .. } = expr("aa + bb") else {
        panic!("expected binary");
    };
    assert_eq!(span.start.column, 1);
    assert_eq!(span.end.column, 8);
}

// -----------------------------------------------------------
// Primary expressions.
// -----------------------------------------------------------

#[test]
fn parse_array_with_newlines_and_trailing_comma() {
    let Expr::Array(items) = expr("[\n\t1,\n\t2,\n]") else {
        panic!("expected array");
    };
    assert_eq!(items.len(), 2);
}

#[test]
fn parse_object_keys() {
    let Expr::Object(entries) = expr("{ name: \"x\", \"two words\": 2 }") else {
        panic!("expected object");
    };
    assert_eq!(entries[0].0, "name");
    assert_eq!(entries[1].0, "two words");
    assert!(matches!(parse_error("{ 1: 2 }"), ParseErrorKind::InvalidObjectKey { .. }));
}

#[test]
fn parse_accessibility_wraps_whole_expression() {
    let Expr::Accessibility { kind, content } = expr("asl \"a\" + \"b\"") else {
        panic!("expected accessibility");
    };
    assert_eq!(kind, AccessibilityKind::Asl);
    assert!(matches!(*content, Expr::Binary { op: BinaryOp::Add, .. }));
}

#[test]
fn parse_template_keyword_prefix() {
    let Expr::Template(parts) = expr("template \"a\" \"b\"") else {
        panic!("expected template");
    };
    assert_eq!(
        parts,
        vec![
            TemplatePart::Text("a".to_string()),
            TemplatePart::Text("b".to_string()),
        ]
    );
    assert!(matches!(parse_error("template 1"), ParseErrorKind::ExpectedTemplate { .. }));
}

#[test]
fn parse_plain_string_is_not_template() {
    assert_eq!(
        expr("\"hello\""),
        Expr::Literal(Literal::String("hello".to_string()))
    );
}

#[test]
fn parse_template_restores_pipe_in_parens() {
    let Expr::Template(parts) = expr("{{ (x | f) }}") else {
        panic!("expected template");
    };
    assert!(matches!(
        &parts[0],
        TemplatePart::Expr(Expr::Binary { op: BinaryOp::Pipe, .. })
    ));
}

#[test]
fn parse_template_filter_needs_name() {
    assert!(matches!(
        parse_error("{{ x | 1 }}"),
        ParseErrorKind::ExpectedIdentifier { .. }
    ));
}

#[test]
fn parse_unclosed_template_group() {
    assert!(matches!(
        parse_error("{{ x"),
        ParseErrorKind::ExpectedToken { .. }
    ));
}

// -----------------------------------------------------------
// Statements.
// -----------------------------------------------------------

#[test]
fn parse_const_is_immutable_let() {
    assert!(matches!(
        &statements("const pi = 3.14")[0],
        Stmt::Let { mutable: false, .. }
    ));
}

#[test]
fn parse_component_props() {
    let stmts = statements("component Card(title, body) {\n\treturn title\n}");
    let Stmt::Component { name, props, body } = &stmts[0] else {
        panic!("expected component");
    };
    assert_eq!(name, "Card");
    assert_eq!(props, &["title".to_string(), "body".to_string()]);
    assert_eq!(body.len(), 1);
}

#[test]
fn parse_blank_lines_inside_blocks() {
    let stmts = statements("while x {\n\n\ta\n\n\tb\n\n}");
    let Stmt::While { body, .. } = &stmts[0] else {
        panic!("expected while");
    };
    assert_eq!(body.len(), 2);
}

#[test]
fn parse_import_needs_from_and_path() {
    assert!(matches!(
        parse_error("import { a } of \"x\""),
        ParseErrorKind::ExpectedFrom { .. }
    ));
    assert!(matches!(
        parse_error("import { a } from b"),
        ParseErrorKind::ExpectedPath { .. }
    ));
}

#[test]
fn parse_export_name() {
    assert!(matches!(&statements("export greet")[0], Stmt::Export { name, .. } if name == "greet"));
    assert!(matches!(
        parse_error("export 1"),
        ParseErrorKind::ExpectedIdentifier { .. }
    ));
}

#[test]
fn parse_return_forms() {
    let stmts = statements("function f() {\n\treturn\n}\nfunction g() {\n\treturn 1\n}");
    let Stmt::Function { body, .. } = &stmts[0] else {
        panic!("expected function");
    };
    assert_eq!(body[0], Stmt::Return(None));
    let Stmt::Function { body, .. } = &stmts[1] else {
        panic!("expected function");
    };
    assert!(matches!(body[0], Stmt::Return(Some(_))));
}

#[test]
fn parse_nested_blocks_closed_by_template_close() {
    let stmts = statements("function f(xs) { for x in xs { print(x) }}");
    let Stmt::Function { body, .. } = &stmts[0] else {
        panic!("expected function");
    };
    assert!(matches!(body[0], Stmt::For { .. }));
}

// -----------------------------------------------------------
// Errors.
// -----------------------------------------------------------

#[test]
fn parse_error_messages_carry_location() {
    let err = parse_str("let x 1").unwrap_err();
    assert_eq!(err.to_string(), "expected '=', got number at line 1, column 7");
}

#[test]
fn parse_error_is_fail_fast() {
    // Two problems; only the first is reported.
    let err = parse_str("let = 1\nlet = 2").unwrap_err();
    assert_eq!(err.span().map(|s| s.start.line), Some(1));
}

#[test]
fn parse_missing_expression() {
    assert!(matches!(
        parse_error("let x = )"),
        ParseErrorKind::ExpectedExpression { .. }
    ));
    assert!(matches!(
        parse_error("let x = else"),
        ParseErrorKind::ExpectedExpression { .. }
    ));
}

// -----------------------------------------------------------
// Nesting limit.
// -----------------------------------------------------------

fn nested_parens(depth: usize) -> String {
    format!("{}1{}", "(".repeat(depth), ")".repeat(depth))
}

#[test]
fn parse_moderate_nesting() {
    assert_eq!(
        expr(&nested_parens(40)),
        Expr::Literal(Literal::Number(1.0))
    );
    assert!(parse_str(&format!("{}1{}", "[".repeat(30), "]".repeat(30))).is_ok());
}

#[test]
fn parse_deep_nesting_is_an_error() {
    assert_eq!(
        parse_error(&nested_parens(500)),
        ParseErrorKind::NestingTooDeep
    );
    assert_eq!(
        parse_error(&format!("{}1{}", "[".repeat(500), "]".repeat(500))),
        ParseErrorKind::NestingTooDeep
    );
    assert_eq!(
        parse_error(&format!("{}1", "-".repeat(500))),
        ParseErrorKind::NestingTooDeep
    );
    assert_eq!(
        parse_error(&format!("{}null{}", "{{ ".repeat(500), " }}".repeat(500))),
        ParseErrorKind::NestingTooDeep
    );
}

#[test]
fn parse_deep_blocks_is_an_error() {
    let mut source = String::new();
    for _ in 0..200 {
        source.push_str("if true {\n");
    }
    source.push_str("1\n");
    for _ in 0..200 {
        source.push_str("}\n");
    }
    let err = parse_str(&source).unwrap_err();
    assert_eq!(err.code(), "nesting-too-deep");
    assert_eq!(
        err.message(),
        format!("nesting deeper than {} levels", noteg::parser::MAX_NESTING)
    );
}
