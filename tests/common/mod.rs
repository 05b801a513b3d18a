#![allow(dead_code)]

use noteg::{Error, Interpreter, Program, Value, format, parse, parse_str, tokenize};

/// Parse then format must reproduce `input` exactly.
pub fn roundtrip(input: &str) {
    let tokens = tokenize(input).expect("tokenize failed");
    let program = parse(&tokens).expect("parse failed");
    let output = format(&program);
    assert_eq!(
        output, input,
        "round-trip mismatch:\n--- expected ---\n{input}\n--- got ---\n{output}"
    );
}

/// Format a program, parse it back, and check the second format is
/// identical to the first.
pub fn assert_format_stable(program: &Program) {
    let formatted = format(program);
    let reparsed = parse_str(&formatted).unwrap_or_else(|e| {
        panic!(
            "failed to re-parse formatted output: {e}\n\
             --- formatted ---\n{formatted}"
        )
    });
    let again = format(&reparsed);
    assert_eq!(
        formatted, again,
        "format is not idempotent\n--- first ---\n{formatted}\n--- second ---\n{again}"
    );
}

/// Run `source` in a fresh interpreter, returning the value and output.
pub fn eval(source: &str) -> (Value, String) {
    let mut interp = Interpreter::new();
    let value = interp
        .run(source)
        .unwrap_or_else(|e| panic!("run failed: {e}\n--- source ---\n{source}"));
    (value, interp.take_output())
}

/// Run `source` and return its error.
pub fn eval_err(source: &str) -> Error {
    match Interpreter::new().run(source) {
        Ok(value) => panic!("expected an error, got {value:?}"),
        Err(e) => e,
    }
}
