//! Generator and code-renderer behavior over HTML fixtures.

use tarsier_dom::{DomTree, NodeId};
use tarsier_locator::{
    generate_selector, render, selector_to_tokens, GeneratedSelector, GeneratorOptions,
    LocatorToken, TargetLanguage,
};
use tarsier_selectors::{parse_selector, query, QueryCache};

fn generate(tree: &DomTree, target: NodeId) -> GeneratedSelector {
    let mut cache = QueryCache::new();
    generate_selector(tree, &mut cache, target, &GeneratorOptions::default())
}

fn find(tree: &DomTree, tag: &str) -> NodeId {
    tree.descendant_elements(tree.root(), true)
        .into_iter()
        .find(|&n| tree.as_element(n).is_some_and(|e| e.tag_name == tag))
        .expect("element present")
}

#[test]
fn test_id_beats_every_other_signal() {
    let tree = DomTree::from_html("<input data-testid=\"email\" placeholder=\"Email\" id=\"mail\">");
    let input = find(&tree, "input");
    let generated = generate(&tree, input);
    assert_eq!(generated.selector, "[data-testid=\"email\"]");
    assert_eq!(generated.elements, vec![input]);
}

#[test]
fn placeholder_beats_role_with_name() {
    let tree =
        DomTree::from_html("<input placeholder=\"Email\"><input placeholder=\"Password\">");
    let first = find(&tree, "input");
    assert_eq!(generate(&tree, first).selector, "[placeholder=\"Email\"]");
}

#[test]
fn role_with_name_is_preferred_over_text_and_css() {
    let tree = DomTree::from_html("<button>Save</button><button>Cancel</button>");
    let save = find(&tree, "button");
    assert_eq!(
        generate(&tree, save).selector,
        "role=button[name=\"Save\"][exact]"
    );
}

#[test]
fn machine_generated_ids_never_anchor_a_selector() {
    let tree = DomTree::from_html("<div id=\"x9fK2qZ8\"><span>hi</span></div>");
    let target = find(&tree, "div");
    let generated = generate(&tree, target);
    assert!(!generated.selector.contains("x9fK2qZ8"));
    assert_eq!(generated.elements, vec![target]);
}

#[test]
fn ambiguous_targets_get_an_ancestor_prefix() {
    let tree = DomTree::from_html(
        "<div class=\"main\"><button>Go</button></div>\
         <div class=\"side\"><button>Go</button></div>",
    );
    let target = find(&tree, "button");
    assert_eq!(
        generate(&tree, target).selector,
        "div.main >> role=button[name=\"Go\"][exact]"
    );
}

#[test]
fn structural_fallback_walks_the_tree() {
    let tree = DomTree::from_html("<ul><li>x</li><li>x</li></ul>");
    let second = *tree
        .descendant_elements(tree.root(), false)
        .last()
        .expect("li");
    let generated = generate(&tree, second);
    assert_eq!(generated.selector, "ul > li:nth-child(2)");
    assert_eq!(generated.elements, vec![second]);
}

#[test]
fn every_generated_selector_resolves_uniquely() {
    let tree = DomTree::from_html(
        "<div id=\"app\"><h1>Title</h1>\
         <form><label for=\"mail\">Mail</label><input id=\"mail\"><button>Send</button></form>\
         </div>",
    );
    let mut cache = QueryCache::new();
    for element in tree.descendant_elements(tree.root(), false) {
        let generated =
            generate_selector(&tree, &mut cache, element, &GeneratorOptions::default());
        let parsed = parse_selector(&generated.selector).expect("generated selector parses");
        let resolved = query(&tree, &parsed, tree.root(), &mut cache).expect("query succeeds");
        assert_eq!(resolved, vec![element], "selector {}", generated.selector);
    }
}

#[test]
fn multiple_mode_returns_distinct_alternatives() {
    let tree = DomTree::from_html("<button id=\"save\">Save</button>");
    let button = find(&tree, "button");
    let mut cache = QueryCache::new();
    let options = GeneratorOptions {
        multiple: true,
        ..GeneratorOptions::default()
    };
    let generated = generate_selector(&tree, &mut cache, button, &options);
    assert_eq!(generated.selector, "role=button[name=\"Save\"][exact]");
    assert!(generated.selectors.contains(&"role=button".to_owned()));
    assert_eq!(
        generated.selectors.len(),
        generated
            .selectors
            .iter()
            .collect::<std::collections::HashSet<_>>()
            .len()
    );
}

#[test]
fn tokens_render_across_languages() {
    let token = LocatorToken::new("test-id", "email");
    assert_eq!(
        render(&[token.clone()], TargetLanguage::JavaScript),
        "page.getByTestId('email')"
    );
    assert_eq!(
        render(&[token.clone()], TargetLanguage::Python),
        "page.get_by_test_id(\"email\")"
    );
    assert_eq!(
        render(&[token.clone()], TargetLanguage::Java),
        "page.getByTestId(\"email\")"
    );
    assert_eq!(
        render(&[token], TargetLanguage::CSharp),
        "page.GetByTestId(\"email\")"
    );
}

#[test]
fn role_tokens_carry_name_and_exactness() {
    let token = LocatorToken {
        kind: "role".to_owned(),
        body: "button".to_owned(),
        name: Some("Save".to_owned()),
        exact: true,
    };
    assert_eq!(
        render(&[token.clone()], TargetLanguage::JavaScript),
        "page.getByRole('button', { name: 'Save', exact: true })"
    );
    assert_eq!(
        render(&[token.clone()], TargetLanguage::Java),
        "page.getByRole(AriaRole.BUTTON, new Page.GetByRoleOptions().setName(\"Save\").setExact(true))"
    );
    assert_eq!(
        render(&[token], TargetLanguage::CSharp),
        "page.GetByRole(AriaRole.Button, new() { Name = \"Save\", Exact = true })"
    );
}

#[test]
fn parsed_selectors_become_token_chains() {
    let selector = parse_selector("[data-testid=\"email\"] >> nth=0").expect("parses");
    let tokens = selector_to_tokens(&selector, "data-testid");
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].kind, "test-id");
    assert_eq!(tokens[0].body, "email");
    assert_eq!(tokens[1].kind, "nth");
    assert_eq!(
        render(&tokens, TargetLanguage::JavaScript),
        "page.getByTestId('email').nth(0)"
    );

    let selector =
        parse_selector("role=button[name=\"Save\"][exact] >> visible=true").expect("parses");
    let tokens = selector_to_tokens(&selector, "data-testid");
    assert_eq!(
        render(&tokens, TargetLanguage::JavaScript),
        "page.getByRole('button', { name: 'Save', exact: true }).filter({ visible: true })"
    );
}

#[test]
#[should_panic(expected = "unknown locator kind")]
fn unknown_token_kinds_are_defects() {
    let _ = render(
        &[LocatorToken::new("teleport", "nowhere")],
        TargetLanguage::JavaScript,
    );
}
