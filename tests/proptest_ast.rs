//! Property-based tests with proptest.
//!
//! Generate random ASTs, format them, parse them back, and verify the
//! round-trip produces a stable (idempotent) output.
//!
//! We check `format(parse(format(ast))) == format(ast)` rather than
//! `ast == parse(format(ast))` because parsed nodes carry source spans
//! while built nodes carry synthetic ones, and a template made only of
//! text prints back as a plain string.

use noteg::{
    AccessibilityKind, BinaryOp, Expr, Interpreter, Keyword, Program, Stmt, Synth, TemplatePart,
    UnaryOp, format, parse_str, tokenize,
};
use proptest::prelude::*;

// -- Leaf strategies --

/// Identifier that is not a keyword or literal word.
fn name() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,8}".prop_filter("reserved word", |s| {
        Keyword::from_word(s).is_none() && !matches!(s.as_str(), "true" | "false" | "null")
    })
}

/// String contents including characters that need escaping.
fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?'\"\\\\{}|<>&-]{0,12}"
}

fn number() -> impl Strategy<Value = f64> {
    prop_oneof![
        (0u32..100_000).prop_map(f64::from),
        (0u32..1000).prop_map(|n| f64::from(n) / 4.0),
    ]
}

fn kind() -> impl Strategy<Value = AccessibilityKind> {
    prop::sample::select(AccessibilityKind::ALL.to_vec())
}

fn binary_op() -> impl Strategy<Value = BinaryOp> {
    prop::sample::select(vec![
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Eq,
        BinaryOp::NotEq,
        BinaryOp::Less,
        BinaryOp::LessEq,
        BinaryOp::Greater,
        BinaryOp::GreaterEq,
        BinaryOp::And,
        BinaryOp::Or,
        BinaryOp::Pipe,
    ])
}

fn leaf_expr() -> impl Strategy<Value = Expr> {
    prop_oneof![
        Just(Expr::null()),
        any::<bool>().prop_map(Expr::bool),
        number().prop_map(Expr::number),
        text().prop_map(|s| Expr::string(&s)),
        name().prop_map(|n| Expr::ident(&n)),
    ]
}

/// Expressions up to a few levels deep.
fn expr() -> impl Strategy<Value = Expr> {
    leaf_expr().prop_recursive(3, 24, 4, |inner| {
        let part = prop_oneof![
            text().prop_map(TemplatePart::Text),
            inner.clone().prop_map(TemplatePart::Expr),
            (inner.clone(), name()).prop_map(|(e, f)| TemplatePart::filtered(e, &f)),
        ];
        prop_oneof![
            (binary_op(), inner.clone(), inner.clone())
                .prop_map(|(op, l, r)| Expr::binary(op, l, r)),
            (prop::bool::ANY, inner.clone()).prop_map(|(neg, e)| {
                Expr::unary(if neg { UnaryOp::Neg } else { UnaryOp::Not }, e)
            }),
            (name(), prop::collection::vec(inner.clone(), 0..=3))
                .prop_map(|(f, args)| Expr::ident(&f).call(args)),
            prop::collection::vec(inner.clone(), 0..=3).prop_map(Expr::array),
            prop::collection::vec((prop_oneof![name(), text()], inner.clone()), 0..=3).prop_map(
                |entries| Expr::Object(entries.into_iter().collect())
            ),
            (kind(), inner.clone()).prop_map(|(k, e)| Expr::accessible(k, e)),
            prop::collection::vec(part, 0..=3).prop_map(Expr::template),
        ]
    })
}

/// Statement at a given depth (limits recursion)
fn stmt(depth: u32) -> BoxedStrategy<Stmt> {
    let simple = prop_oneof![
        (name(), expr(), any::<bool>()).prop_map(|(n, e, mutable)| if mutable {
            Stmt::let_(&n, e)
        } else {
            Stmt::const_(&n, e)
        }),
        expr().prop_map(Stmt::Expr),
        prop::option::of(expr()).prop_map(Stmt::Return),
        (prop::collection::vec(name(), 0..=3), text()).prop_map(|(names, path)| {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            Stmt::import(&names, &path)
        }),
        name().prop_map(|n| Stmt::export(&n)),
        (kind(), expr()).prop_map(|(k, e)| Stmt::accessibility(k, e)),
    ];

    if depth == 0 {
        return simple.boxed();
    }

    let block = || prop::collection::vec(stmt(depth - 1), 0..=3);
    let params = || prop::collection::vec(name(), 0..=3);
    let with_block = prop_oneof![
        (expr(), block(), prop::option::of(block())).prop_map(|(cond, then, otherwise)| {
            let stmt = Stmt::if_(cond, then);
            match otherwise {
                Some(block) => stmt.else_(block),
                None => stmt,
            }
        }),
        (name(), expr(), block()).prop_map(|(var, iterable, body)| Stmt::for_in(
            &var, iterable, body
        )),
        (expr(), block()).prop_map(|(cond, body)| Stmt::while_(cond, body)),
        (name(), params(), block()).prop_map(|(n, ps, body)| {
            let ps: Vec<&str> = ps.iter().map(String::as_str).collect();
            Stmt::function(&n, &ps, body)
        }),
        (name(), params(), block()).prop_map(|(n, ps, body)| {
            let ps: Vec<&str> = ps.iter().map(String::as_str).collect();
            Stmt::component(&n, &ps, body)
        }),
    ];

    prop_oneof![
        3 => simple,
        1 => with_block,
    ]
    .boxed()
}

/// Full program (0-6 statements at depth 2)
fn program() -> impl Strategy<Value = Program> {
    prop::collection::vec(stmt(2), 0..=6).prop_map(|statements| Program { statements })
}

// -- Property tests --

proptest! {
    /// Formatting is idempotent: format(parse(format(x))) == format(x).
    /// This is the core round-trip property.
    #[test]
    fn format_idempotent(program in program()) {
        let r1 = format(&program);
        let parsed = parse_str(&r1)
            .map_err(|e| {
                TestCaseError::fail(
                    std::format!("parse error: {e}\n--- output ---\n{r1}"))
            })?;
        let r2 = format(&parsed);
        prop_assert_eq!(r1, r2);
    }

    /// A formatted program never fails to tokenize.
    #[test]
    fn format_never_produces_lex_error(program in program()) {
        let formatted = format(&program);
        tokenize(&formatted).map_err(|e| {
            TestCaseError::fail(
                std::format!("lex error: {e}\n--- output ---\n{formatted}"))
        })?;
    }

    /// Top-level statement count survives the round-trip.
    #[test]
    fn statement_count_preserved(program in program()) {
        let formatted = format(&program);
        let parsed = parse_str(&formatted).unwrap();
        prop_assert_eq!(program.statements.len(), parsed.statements.len());
    }

    /// `value | f` and `{{ value | f }}` agree for every unary builtin.
    #[test]
    fn pipe_and_filter_agree(
        s in text(),
        filter in prop::sample::select(vec!["upper", "lower", "escape_html", "len"]),
    ) {
        let piped = Expr::string(&s).pipe(Expr::ident(filter)).to_string();
        let filtered = Expr::template(vec![TemplatePart::filtered(Expr::string(&s), filter)])
            .to_string();

        let mut interp = Interpreter::new();
        let a = interp.run(&piped).unwrap();
        let b = interp.run(&filtered).unwrap();
        prop_assert_eq!(a.to_string(), b.to_string());
    }

    /// Number literals evaluate to themselves through format and parse.
    #[test]
    fn number_literals_survive(n in number()) {
        let source = Expr::number(n).to_string();
        let value = Interpreter::new().run(&source).unwrap();
        prop_assert_eq!(value, noteg::Value::Number(n));
    }

    /// The bounded engine renders byte-identically on every call and
    /// leaves unknown names in place.
    #[test]
    fn synth_is_deterministic(value in "[a-z ]{0,10}", missing in "[a-z]{1,6}") {
        let mut synth = Synth::new();
        synth.set("known", &value).unwrap();
        let template = std::format!("<{{{{ known }}}}|{{{{ x{missing} }}}}>");
        let first = synth.render(&template).unwrap();
        prop_assert_eq!(&first, &synth.render(&template).unwrap());
        prop_assert_eq!(first, std::format!("<{value}|{{{{x{missing}}}}}>"));
    }
}
