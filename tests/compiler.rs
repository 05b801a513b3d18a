//! Target output through the public compiler API.

use noteg::{CompileOptions, Error, Program, Stmt, Expr, Target, compile, compile_program, compile_with};

fn body(html: &str) -> &str {
    html.split_once("<body>")
        .and_then(|(_, rest)| rest.split_once("</body>"))
        .map(|(inner, _)| inner)
        .expect("document body")
}

// -----------------------------------------------------------
// JavaScript.
// -----------------------------------------------------------

/// Checked read of a Note G variable bound to JavaScript `ident`.
fn read(name: &str, ident: &str) -> String {
    format!("__ng.get(typeof {ident} === \"undefined\" ? undefined : {ident}, \"{name}\")")
}

#[test]
fn js_wraps_program_in_function_scope() {
    let out = compile("let x = 1", Target::JavaScript).expect("compile");
    assert!(out.contains("(function () {\n"));
    assert!(out.ends_with("})();\n"));
    assert!(out.contains("\tvar x = 1;\n"));
}

#[test]
fn js_negative_literals_are_parenthesised() {
    let program = Program::new().let_("x", Expr::number(-2.5));
    let out = compile_program(&program, &CompileOptions::default());
    assert!(out.contains("var x = (-2.5);"));
}

#[test]
fn js_objects_are_expressions() {
    let out = compile("{ a: 1, \"b c\": [2] }", Target::JavaScript).expect("compile");
    assert!(out.contains("({\"a\": 1, \"b c\": [2]});"));
}

#[test]
fn js_while_and_not() {
    let out = compile("while !done {\n\tprint(1)\n}", Target::JavaScript).expect("compile");
    assert!(out.contains(&format!(
        "while (__ng.truthy(!__ng.truthy({}))) {{",
        read("done", "done")
    )));
}

#[test]
fn js_export_and_import() {
    let out = compile(
        "import { a, b } from \"./lib.ng\"\nexport a",
        Target::JavaScript,
    )
    .expect("compile");
    assert!(out.contains("// import { a, b } from \"./lib.ng\""));
    assert!(out.contains(&format!("__ng.exports[\"a\"] = {};", read("a", "a"))));
}

#[test]
fn js_components_compile_like_functions() {
    let out = compile("component Card(title) {\n\treturn title\n}", Target::JavaScript)
        .expect("compile");
    assert!(out.contains("var Card = function Card(title) {"));
    assert!(out.contains("__ng.arity(\"Card\", 1, arguments.length);"));
    assert!(out.contains(&format!(
        "\t\treturn {};\n\t\treturn null;\n\t}};",
        read("title", "title")
    )));
}

#[test]
fn js_runtime_names_are_not_user_visible() {
    let out = compile("let __ng = 1\nprint(__ng)", Target::JavaScript).expect("compile");
    assert!(out.contains("var __ng_ = 1;"));
    assert!(out.contains(&format!(
        "__ng.call({}, [{}]);",
        read("print", "print"),
        read("__ng", "__ng_")
    )));
}

// -----------------------------------------------------------
// HTML.
// -----------------------------------------------------------

#[test]
fn html_document_shell() {
    let out = compile("", Target::Html).expect("compile");
    assert!(out.starts_with("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n"));
    assert!(out.contains("<meta charset=\"utf-8\">"));
    assert_eq!(body(&out), "\n");
}

#[test]
fn html_computed_expressions_show_as_interpolations() {
    let out = compile("1 + 2\nname | upper", Target::Html).expect("compile");
    assert!(out.contains("<p>{{ 1 + 2 }}</p>"));
    assert!(out.contains("<p>{{ name | upper }}</p>"));
}

#[test]
fn html_nested_blocks_indent() {
    let source = "for x in xs {\n\tif x {\n\t\t\"yes\"\n\t} else {\n\t\t\"no\"\n\t}\n}";
    let out = compile(source, Target::Html).expect("compile");
    let expected = "\
<!-- for x in xs -->
\t<!-- if x -->
\t\t<p>yes</p>
\t<!-- else -->
\t\t<p>no</p>
\t<!-- end if -->
<!-- end for -->
";
    assert_eq!(body(&out).trim_start_matches('\n'), expected);
}

#[test]
fn html_escapes_markup_in_text() {
    let out = compile("\"<script>alert('x')</script>\"", Target::Html).expect("compile");
    assert!(out.contains("<p>&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;</p>"));
    assert!(!body(&out).contains("<script>"));
}

#[test]
fn html_statement_accessibility_is_a_div() {
    let out = compile("accessibility gsl \"hallo\"", Target::Html).expect("compile");
    assert!(out.contains("<div data-accessibility=\"gsl\">hallo</div>"));
}

// -----------------------------------------------------------
// Accessible HTML.
// -----------------------------------------------------------

#[test]
fn accessible_html_indents_inside_main() {
    let out = compile("\"one\"\nasl \"two\"", Target::AccessibleHtml).expect("compile");
    assert!(out.contains("\t<p>one</p>\n"));
    assert!(out.contains(
        "\t<p><span class=\"a11y-asl\" lang=\"ase\" aria-label=\"American Sign Language\">two</span></p>\n"
    ));
    assert!(out.contains("</main>\n</body>\n</html>\n"));
}

#[test]
fn accessible_html_title_is_escaped() {
    let options = CompileOptions::new(Target::AccessibleHtml).title("<Lesson 1>");
    let out = compile_with("", &options).expect("compile");
    assert!(out.contains("<title>&lt;Lesson 1&gt;</title>"));
}

#[test]
fn compile_program_skips_parsing() {
    let program = Program::new().statement(Stmt::export("greet"));
    let out = compile_program(&program, &CompileOptions::new(Target::Html));
    assert!(out.contains("<!-- export greet -->"));
}

#[test]
fn syntax_errors_surface() {
    let err = compile("if {", Target::Html).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}
