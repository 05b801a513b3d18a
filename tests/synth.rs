//! Bounded substitution engine through the public API.

use noteg::synth::{MAX_NAME_LEN, MAX_TEMPLATE_LEN, MAX_VARIABLES, Status};
use noteg::{AccessibilityKind, Synth, SynthError};

#[test]
fn renders_every_occurrence() {
    let mut synth = Synth::new();
    synth.set("x", "1").expect("set");
    synth.set("y", "2").expect("set");
    assert_eq!(
        synth.render("{{x}}+{{ y }}={{x}}{{y}}").expect("render"),
        "1+2=12"
    );
}

#[test]
fn set_replaces_existing_value() {
    let mut synth = Synth::new();
    synth.set("who", "Ada").expect("set");
    synth.set("who", "Grace").expect("set");
    assert_eq!(synth.len(), 1);
    assert_eq!(synth.get("who"), Some("Grace"));
}

#[test]
fn text_without_tags_is_copied() {
    let synth = Synth::new();
    assert_eq!(synth.render("plain } { text").expect("render"), "plain } { text");
    assert_eq!(synth.render("").expect("render"), "");
}

#[test]
fn unterminated_tag_reports_offset() {
    let mut synth = Synth::new();
    synth.set("a", "A").expect("set");
    let err = synth.render("{{a}} and {{ b").unwrap_err();
    assert_eq!(err, SynthError::Syntax { offset: 10 });
    assert_eq!(err.status() as i32, 1);
}

#[test]
fn name_cap_is_inclusive() {
    let mut synth = Synth::new();
    let name = "n".repeat(MAX_NAME_LEN);
    synth.set(&name, "ok").expect("name at the cap");
    let too_long = "n".repeat(MAX_NAME_LEN + 1);
    assert_eq!(
        synth.set(&too_long, "x").unwrap_err().status(),
        Status::NameTooLong
    );
}

#[test]
fn variable_cap_allows_updates() {
    let mut synth = Synth::new();
    for i in 0..MAX_VARIABLES {
        synth.set(&format!("v{i}"), "x").expect("set");
    }
    assert_eq!(
        synth.set("one_more", "x").unwrap_err().status(),
        Status::TooManyVariables
    );
    synth.set("v0", "updated").expect("existing name still settable");
    assert_eq!(synth.get("v0"), Some("updated"));
}

#[test]
fn template_cap() {
    let synth = Synth::new();
    let big = "a".repeat(MAX_TEMPLATE_LEN + 1);
    assert_eq!(
        synth.render(&big).unwrap_err().status(),
        Status::TemplateTooLarge
    );
}

#[test]
fn accessible_render_wraps_output() {
    let mut synth = Synth::new();
    synth.set("word", "hello").expect("set");
    let out = synth
        .render_accessible(AccessibilityKind::Gsl, "{{ word }}")
        .expect("render");
    assert_eq!(
        out,
        "<div class=\"a11y-gsl\" lang=\"gsg\" aria-label=\"German Sign Language\">hello</div>"
    );
}
