//! End-to-end accessibility checks over HTML fixtures.

use tarsier_aria::{
    matches_template, render, AriaCache, AriaChild, AriaRole, AriaSnapshot, AriaTemplateNode,
    MatchMode, RenderMode, TemplateChild, TemplateText,
};
use tarsier_dom::DomTree;

fn snapshot(html: &str) -> AriaSnapshot {
    let tree = DomTree::from_html(html);
    let mut cache = AriaCache::new();
    cache.begin();
    let snap = AriaSnapshot::build(&tree, tree.root(), &mut cache, 1);
    cache.end();
    snap
}

/// Accessible-name precedence over a realistic form.
#[test]
fn accessible_name_conformance() {
    let html = r#"
        <form>
          <label for="user">Username</label>
          <input id="user" placeholder="you@example.com">
          <input type="search" title="Search the site">
          <button aria-label="Submit the form">Go</button>
          <img src="logo.png" alt="Company logo">
        </form>
    "#;
    let tree = DomTree::from_html(html);
    let mut cache = AriaCache::new();
    cache.begin();

    let names: Vec<(AriaRole, String)> = tree
        .descendant_elements(tree.root(), false)
        .into_iter()
        .filter_map(|node| {
            let role = cache.role(&tree, node)?;
            Some((role, cache.accessible_name(&tree, node)))
        })
        .collect();
    cache.end();

    assert!(names.contains(&(AriaRole::Textbox, "Username".to_owned())));
    assert!(names.contains(&(AriaRole::Searchbox, "Search the site".to_owned())));
    assert!(names.contains(&(AriaRole::Button, "Submit the form".to_owned())));
    assert!(names.contains(&(AriaRole::Img, "Company logo".to_owned())));
}

#[test]
fn snapshot_render_matches_its_own_structure() {
    let snap = snapshot(
        "<nav><a href=\"/home\">Home</a></nav>\
         <main><h2>News</h2><p>Nothing happened.</p></main>",
    );
    let rendered = render(&snap, RenderMode::Plain);
    assert_eq!(
        rendered,
        "- navigation:\n  \
         - link \"Home\":\n    \
         - /url: /home\n\
         - main:\n  \
         - heading \"News\" [level=2]\n  \
         - paragraph: Nothing happened.\n"
    );
}

#[test]
fn contain_template_ignores_unrelated_siblings() {
    let snap = snapshot(
        "<h1>Store</h1><button>Add to cart</button><p>fine print</p><button>Checkout</button>",
    );
    let template = vec![
        TemplateChild::Node(AriaTemplateNode {
            role: AriaRole::Heading,
            name: Some(TemplateText::Exact("Store".into())),
            checked: None,
            disabled: None,
            expanded: None,
            level: Some(1),
            pressed: None,
            selected: None,
            url: None,
            children: None,
        }),
        TemplateChild::Node(AriaTemplateNode {
            role: AriaRole::Button,
            name: Some(TemplateText::Pattern("Check".into())),
            checked: None,
            disabled: None,
            expanded: None,
            level: None,
            pressed: None,
            selected: None,
            url: None,
            children: None,
        }),
    ];
    assert_eq!(matches_template(&snap, &template, MatchMode::Contain), Ok(true));
}

#[test]
fn snapshot_refs_survive_for_the_matching_generation() {
    let tree = DomTree::from_html("<button>Go</button>");
    let mut cache = AriaCache::new();
    let snap = AriaSnapshot::build(&tree, tree.root(), &mut cache, 3);
    let AriaChild::Node(button) = &snap.children[0] else {
        panic!("expected a node");
    };
    assert!(snap.resolve(button.ref_id).is_some());
    assert!(snap.resolve(9999).is_none());
}
