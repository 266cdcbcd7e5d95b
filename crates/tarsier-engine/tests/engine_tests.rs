//! Facade behavior: strict queries, snapshot generations, template
//! matching, highlights and locator rendering.

use tarsier_aria::{AriaTemplateNode, MatchMode, RenderMode, SnapshotError, TemplateChild, TemplateText};
use tarsier_engine::{parse_selector, Engine, EngineError, TargetLanguage};

fn template_node(role: &str, name: Option<&str>) -> AriaTemplateNode {
    AriaTemplateNode {
        role: role.parse().expect("known role"),
        name: name.map(|n| TemplateText::Exact(n.to_owned())),
        checked: None,
        disabled: None,
        expanded: None,
        level: None,
        pressed: None,
        selected: None,
        url: None,
        children: None,
    }
}

#[test]
fn strict_mode_rejects_ambiguous_queries_with_previews() {
    let mut engine = Engine::from_html(
        "<p class=\"x\">a</p><p class=\"x\">b</p><p class=\"x\">c</p>",
    );
    let selector = parse_selector("p.x").expect("parses");

    let first = engine
        .query_selector(&selector, None, false)
        .expect("non-strict succeeds")
        .expect("matches");
    let all = engine
        .query_selector_all(&selector, None)
        .expect("query succeeds");
    assert_eq!(all[0], first);

    let Err(EngineError::StrictModeViolation { previews }) =
        engine.query_selector(&selector, None, true)
    else {
        panic!("expected a strict mode violation");
    };
    assert_eq!(previews.len(), 3);
    for preview in &previews {
        assert!(preview.markup.starts_with("<p"));
        assert!(!preview.selector.is_empty());
    }
}

#[test]
fn strict_mode_accepts_a_unique_match() {
    let mut engine = Engine::from_html("<button>Save</button><button>Cancel</button>");
    let selector = parse_selector("text=Save").expect("parses");
    let matched = engine
        .query_selector(&selector, None, true)
        .expect("strict succeeds");
    assert!(matched.is_some());
}

#[test]
fn snapshot_references_go_stale_per_generation() {
    let mut engine = Engine::from_html("<button>Go</button>");
    let (rendered, first_generation) = engine.build_aria_snapshot(None, RenderMode::Plain);
    assert!(rendered.contains("button \"Go\""));

    let button = engine
        .resolve_snapshot_ref(first_generation, 1)
        .expect("current generation resolves")
        .expect("ref exists");
    assert_eq!(
        engine.tree().as_element(button).map(|e| e.tag_name.as_str()),
        Some("button")
    );

    let (_, second_generation) = engine.build_aria_snapshot(None, RenderMode::Plain);
    assert_eq!(
        engine.resolve_snapshot_ref(first_generation, 1),
        Err(EngineError::Snapshot(SnapshotError::Stale {
            requested: first_generation,
            latest: second_generation,
        }))
    );
}

#[test]
fn template_matching_reports_both_renderings() {
    let mut engine = Engine::from_html("<h1>Dashboard</h1><button>Save</button>");
    let template = vec![TemplateChild::Node(template_node("button", Some("Save")))];
    let outcome = engine
        .match_aria_template(None, &template, MatchMode::Contain)
        .expect("matching succeeds");
    assert!(outcome.matched);
    assert!(outcome.rendered.contains("heading \"Dashboard\""));
    assert!(!outcome.rendered_regex.is_empty());

    let template = vec![TemplateChild::Node(template_node("checkbox", None))];
    let outcome = engine
        .match_aria_template(None, &template, MatchMode::Contain)
        .expect("matching succeeds");
    assert!(!outcome.matched);
}

#[test]
fn highlights_never_affect_queries() {
    let mut engine = Engine::from_html("<button>a</button><button>b</button>");
    let selector = parse_selector("button").expect("parses");

    engine.highlight(&selector).expect("highlight succeeds");
    assert_eq!(engine.highlighted().len(), 2);

    let all = engine
        .query_selector_all(&selector, None)
        .expect("query succeeds");
    assert_eq!(all.len(), 2);

    engine
        .mask_elements(std::slice::from_ref(&selector), "#ff000080")
        .expect("mask succeeds");
    assert!(engine
        .highlighted()
        .iter()
        .all(|(_, color)| color == "#ff000080"));

    engine.hide_highlight();
    assert!(engine.highlighted().is_empty());
}

#[test]
fn locator_source_uses_the_configured_test_id() {
    let mut engine = Engine::from_html("<div></div>");
    let selector = parse_selector("role=button[name=\"Save\"][exact]").expect("parses");
    assert_eq!(
        engine.locator_source(&selector, TargetLanguage::Python),
        "page.get_by_role(\"button\", name=\"Save\", exact=True)"
    );

    engine.set_test_id_attribute("data-qa");
    let selector = parse_selector("[data-qa=\"cart\"]").expect("parses");
    assert_eq!(
        engine.locator_source(&selector, TargetLanguage::JavaScript),
        "page.getByTestId('cart')"
    );
}

#[test]
fn generated_selector_prefers_the_test_id() {
    let mut engine = Engine::from_html("<input data-testid=\"email\">");
    let input = engine.tree().descendant_elements(engine.tree().root(), false)[0];
    assert_eq!(
        engine.generate_selector_string(input),
        "[data-testid=\"email\"]"
    );
}
