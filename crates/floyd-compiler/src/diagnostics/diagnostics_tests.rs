use rowan::TextRange;

use super::Diagnostics;

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(start.into(), end.into())
}

#[test]
fn collects_and_counts() {
    let mut diag = Diagnostics::new();
    assert!(diag.is_empty());
    diag.error("bad rule", range(0, 3)).emit();
    diag.warning("dodgy", range(4, 5)).emit();
    assert_eq!(diag.len(), 2);
    assert_eq!(diag.error_count(), 1);
    assert!(diag.has_errors());
}

#[test]
fn plain_format_without_source() {
    let mut diag = Diagnostics::new();
    diag.error("unknown rule", range(2, 5)).emit();
    let out = diag.printer().render();
    assert_eq!(out, "error at 2..5: unknown rule");
}

#[test]
fn snippet_format_points_at_span() {
    let source = "g = bogus";
    let mut diag = Diagnostics::new();
    diag.error("unknown rule `bogus`", range(4, 9)).emit();
    let out = diag.printer().source(source).render();
    assert!(out.contains("unknown rule `bogus`"), "{out}");
    assert!(out.contains("g = bogus"), "{out}");
    assert!(out.contains("^^^^^"), "{out}");
}

#[test]
fn related_locations_are_annotated() {
    let source = "a = 'x'\na = 'y'\n";
    let mut diag = Diagnostics::new();
    diag.error("duplicate rule `a`", range(8, 9))
        .related_to("first defined here", range(0, 1))
        .emit();
    let out = diag.printer().source(source).render();
    assert!(out.contains("duplicate rule `a`"), "{out}");
    assert!(out.contains("first defined here"), "{out}");
}

#[test]
fn empty_span_still_renders() {
    let source = "g =";
    let mut diag = Diagnostics::new();
    diag.error("expected a term", range(3, 3)).emit();
    let out = diag.printer().source(source).render();
    assert!(out.contains("expected a term"), "{out}");
}
