//! ARIA role vocabulary and role resolution.
//!
//! [WAI-ARIA 1.2 § 5.4 Definition of Roles](https://www.w3.org/TR/wai-aria-1.2/#role_definitions)
//! [ARIA in HTML](https://www.w3.org/TR/html-aria/) for the implicit
//! tag-to-role mapping.
//!
//! Resolution order: the first recognized token of an explicit `role`
//! attribute wins, except that `presentation`/`none` on a focusable element
//! or one carrying global ARIA attributes is a conflict and falls back to
//! the implicit role. Implicit roles can depend on structural context
//! (a `td` is a `gridcell` inside a grid table, a `header` is only a
//! `banner` outside sectioning content).

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tarsier_dom::{DomTree, ElementData, NodeId};

/// The WAI-ARIA 1.2 role vocabulary (abstract roles omitted - they are
/// never assigned to elements).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum AriaRole {
    Alert,
    AlertDialog,
    Application,
    Article,
    Banner,
    Blockquote,
    Button,
    Caption,
    Cell,
    Checkbox,
    Code,
    ColumnHeader,
    Combobox,
    Complementary,
    ContentInfo,
    Definition,
    Deletion,
    Dialog,
    Directory,
    Document,
    Emphasis,
    Feed,
    Figure,
    Form,
    Generic,
    Grid,
    GridCell,
    Group,
    Heading,
    Img,
    Insertion,
    Link,
    List,
    Listbox,
    ListItem,
    Log,
    Main,
    Marquee,
    Math,
    Menu,
    Menubar,
    MenuItem,
    MenuItemCheckbox,
    MenuItemRadio,
    Meter,
    Navigation,
    None,
    Note,
    Option,
    Paragraph,
    Presentation,
    Progressbar,
    Radio,
    RadioGroup,
    Region,
    Row,
    RowGroup,
    RowHeader,
    Scrollbar,
    Search,
    Searchbox,
    Separator,
    Slider,
    SpinButton,
    Status,
    Strong,
    Subscript,
    Superscript,
    Switch,
    Tab,
    Table,
    Tablist,
    Tabpanel,
    Term,
    Textbox,
    Time,
    Timer,
    Toolbar,
    Tooltip,
    Tree,
    TreeGrid,
    TreeItem,
}

impl AriaRole {
    /// Roles equivalent to "not exposed": `presentation` and its synonym
    /// `none`.
    #[must_use]
    pub const fn is_presentation(self) -> bool {
        matches!(self, Self::Presentation | Self::None)
    }

    /// Roles whose accessible name comes from their subtree content.
    #[must_use]
    pub const fn names_from_content(self) -> bool {
        matches!(
            self,
            Self::Button
                | Self::Cell
                | Self::Checkbox
                | Self::ColumnHeader
                | Self::GridCell
                | Self::Heading
                | Self::Link
                | Self::MenuItem
                | Self::MenuItemCheckbox
                | Self::MenuItemRadio
                | Self::Option
                | Self::Radio
                | Self::Row
                | Self::RowHeader
                | Self::Switch
                | Self::Tab
                | Self::Tooltip
                | Self::TreeItem
        )
    }
}

/// Resolve the exposed role of an element, or `None` when the element has
/// no role (generic containers, presentation).
#[must_use]
pub fn resolve_role(tree: &DomTree, node: NodeId) -> Option<AriaRole> {
    let element = tree.as_element(node)?;
    if let Some(role) = explicit_role(element) {
        if role.is_presentation() {
            // Conflict resolution: presentation is ignored on focusable
            // elements and on elements with global ARIA attributes.
            if is_focusable(element) || has_global_aria_attributes(element) {
                return implicit_role(tree, node, element);
            }
            return None;
        }
        return Some(role);
    }
    let implicit = implicit_role(tree, node, element)?;
    if inherits_presentation(tree, node, implicit) {
        return None;
    }
    Some(implicit)
}

/// First recognized token of the `role` attribute.
fn explicit_role(element: &ElementData) -> Option<AriaRole> {
    element
        .attr("role")?
        .split_ascii_whitespace()
        .find_map(|token| token.to_ascii_lowercase().parse().ok())
}

/// Focusable enough for the presentation-conflict rule: natively
/// interactive and not disabled, or an explicit `tabindex`.
fn is_focusable(element: &ElementData) -> bool {
    if element.attrs.contains_key("tabindex") {
        return true;
    }
    if element.attrs.contains_key("disabled") {
        return false;
    }
    match element.tag_name.as_str() {
        "button" | "input" | "select" | "textarea" => true,
        "a" | "area" => element.attrs.contains_key("href"),
        _ => false,
    }
}

/// Any `aria-*` attribute other than `aria-hidden` counts as a global ARIA
/// attribute for conflict resolution.
fn has_global_aria_attributes(element: &ElementData) -> bool {
    element
        .attrs
        .keys()
        .any(|key| key.starts_with("aria-") && key != "aria-hidden")
}

/// Required-owned roles whose container going `presentation` takes them
/// down with it, unless an intervening explicit role breaks the chain.
fn inherits_presentation(tree: &DomTree, node: NodeId, implicit: AriaRole) -> bool {
    let container_role = match implicit {
        AriaRole::ListItem => AriaRole::List,
        AriaRole::Row | AriaRole::RowGroup => AriaRole::Table,
        AriaRole::Cell | AriaRole::GridCell | AriaRole::ColumnHeader | AriaRole::RowHeader => {
            AriaRole::Table
        }
        _ => return false,
    };
    for ancestor in tree.ancestors(node) {
        let Some(element) = tree.as_element(ancestor) else {
            continue;
        };
        if let Some(role) = explicit_role(element) {
            // An explicit role anywhere on the chain settles it.
            return role.is_presentation();
        }
        let owns_chain = match container_role {
            AriaRole::List => matches!(element.tag_name.as_str(), "ul" | "ol" | "menu"),
            AriaRole::Table => matches!(
                element.tag_name.as_str(),
                "table" | "thead" | "tbody" | "tfoot" | "tr"
            ),
            _ => false,
        };
        if !owns_chain {
            return false;
        }
    }
    false
}

/// Implicit role from tag name plus structural context.
fn implicit_role(tree: &DomTree, node: NodeId, element: &ElementData) -> Option<AriaRole> {
    match element.tag_name.as_str() {
        "a" | "area" => element.attrs.contains_key("href").then_some(AriaRole::Link),
        "article" => Some(AriaRole::Article),
        "aside" => Some(AriaRole::Complementary),
        "blockquote" => Some(AriaRole::Blockquote),
        "button" => Some(AriaRole::Button),
        "caption" => Some(AriaRole::Caption),
        "code" => Some(AriaRole::Code),
        "datalist" => Some(AriaRole::Listbox),
        "dd" => Some(AriaRole::Definition),
        "del" => Some(AriaRole::Deletion),
        "details" => Some(AriaRole::Group),
        "dfn" => Some(AriaRole::Term),
        "dialog" => Some(AriaRole::Dialog),
        "em" => Some(AriaRole::Emphasis),
        "fieldset" => Some(AriaRole::Group),
        "figure" => Some(AriaRole::Figure),
        "footer" => outside_sectioning(tree, node).then_some(AriaRole::ContentInfo),
        "form" => Some(AriaRole::Form),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(AriaRole::Heading),
        "header" => outside_sectioning(tree, node).then_some(AriaRole::Banner),
        "hr" => Some(AriaRole::Separator),
        "html" => Some(AriaRole::Document),
        "img" => {
            // alt="" opts an image out of the accessibility tree.
            if element.attr("alt") == Some("") {
                None
            } else {
                Some(AriaRole::Img)
            }
        }
        "input" => input_role(element),
        "ins" => Some(AriaRole::Insertion),
        "li" => {
            let listed = tree.ancestors(node).any(|ancestor| {
                tree.as_element(ancestor)
                    .is_some_and(|e| matches!(e.tag_name.as_str(), "ul" | "ol" | "menu"))
            });
            listed.then_some(AriaRole::ListItem)
        }
        "main" => Some(AriaRole::Main),
        "math" => Some(AriaRole::Math),
        "menu" => Some(AriaRole::List),
        "meter" => Some(AriaRole::Meter),
        "nav" => Some(AriaRole::Navigation),
        "ol" | "ul" => Some(AriaRole::List),
        "optgroup" => Some(AriaRole::Group),
        "option" => Some(AriaRole::Option),
        "output" => Some(AriaRole::Status),
        "p" => Some(AriaRole::Paragraph),
        "progress" => Some(AriaRole::Progressbar),
        "search" => Some(AriaRole::Search),
        "section" => Some(AriaRole::Region),
        "select" => {
            let multiple = element.attrs.contains_key("multiple");
            let sized = element
                .attr("size")
                .and_then(|s| s.parse::<u32>().ok())
                .is_some_and(|size| size > 1);
            if multiple || sized {
                Some(AriaRole::Listbox)
            } else {
                Some(AriaRole::Combobox)
            }
        }
        "strong" => Some(AriaRole::Strong),
        "sub" => Some(AriaRole::Subscript),
        "summary" => Some(AriaRole::Button),
        "sup" => Some(AriaRole::Superscript),
        "table" => Some(AriaRole::Table),
        "tbody" | "tfoot" | "thead" => Some(AriaRole::RowGroup),
        "td" => Some(if in_grid_table(tree, node) {
            AriaRole::GridCell
        } else {
            AriaRole::Cell
        }),
        "textarea" => Some(AriaRole::Textbox),
        "th" => Some(match element.attr("scope") {
            Some("col" | "colgroup") => AriaRole::ColumnHeader,
            Some("row" | "rowgroup") => AriaRole::RowHeader,
            _ => {
                if in_grid_table(tree, node) {
                    AriaRole::GridCell
                } else {
                    AriaRole::ColumnHeader
                }
            }
        }),
        "time" => Some(AriaRole::Time),
        "tr" => Some(AriaRole::Row),
        _ => None,
    }
}

/// `input` roles keyed by the `type` attribute.
fn input_role(element: &ElementData) -> Option<AriaRole> {
    let input_type = element.attr("type").unwrap_or("text").to_ascii_lowercase();
    match input_type.as_str() {
        "button" | "image" | "reset" | "submit" => Some(AriaRole::Button),
        "checkbox" => Some(AriaRole::Checkbox),
        "radio" => Some(AriaRole::Radio),
        "range" => Some(AriaRole::Slider),
        "number" => Some(AriaRole::SpinButton),
        "search" => {
            if element.attrs.contains_key("list") {
                Some(AriaRole::Combobox)
            } else {
                Some(AriaRole::Searchbox)
            }
        }
        "email" | "tel" | "text" | "url" | "password" => {
            if element.attrs.contains_key("list") {
                Some(AriaRole::Combobox)
            } else {
                Some(AriaRole::Textbox)
            }
        }
        "hidden" => None,
        _ => Some(AriaRole::Textbox),
    }
}

/// `header`/`footer` are landmarks only outside sectioning content.
fn outside_sectioning(tree: &DomTree, node: NodeId) -> bool {
    !tree.ancestors(node).any(|ancestor| {
        tree.as_element(ancestor).is_some_and(|e| {
            matches!(
                e.tag_name.as_str(),
                "article" | "aside" | "main" | "nav" | "section"
            )
        })
    })
}

/// Whether the nearest ancestor table resolves to `grid`/`treegrid`.
fn in_grid_table(tree: &DomTree, node: NodeId) -> bool {
    tree.ancestors(node)
        .find(|&ancestor| {
            tree.as_element(ancestor)
                .is_some_and(|e| e.tag_name == "table" || e.attr("role").is_some())
        })
        .and_then(|table| tree.as_element(table))
        .and_then(explicit_role)
        .is_some_and(|role| matches!(role, AriaRole::Grid | AriaRole::TreeGrid))
}

/// Heading level: `aria-level` wins, then the tag digit, then the default 2
/// for `role=heading` without a level.
#[must_use]
pub fn heading_level(tree: &DomTree, node: NodeId) -> Option<u32> {
    let element = tree.as_element(node)?;
    if let Some(level) = element.attr("aria-level").and_then(|v| v.parse().ok()) {
        return Some(level);
    }
    match element.tag_name.as_str() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => (resolve_role(tree, node) == Some(AriaRole::Heading)).then_some(2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(html: &str) -> DomTree {
        DomTree::from_html(html)
    }

    fn role_of(tree: &DomTree, tag: &str) -> Option<AriaRole> {
        let node = tree
            .descendant_elements(tree.root(), false)
            .into_iter()
            .find(|&n| tree.as_element(n).is_some_and(|e| e.tag_name == tag))
            .expect("element present");
        resolve_role(tree, node)
    }

    #[test]
    fn explicit_role_first_valid_token_wins() {
        let t = tree("<div role=\"bogus button\">x</div>");
        assert_eq!(role_of(&t, "div"), Some(AriaRole::Button));
    }

    #[test]
    fn presentation_conflict_on_focusable_element() {
        let t = tree("<button role=\"none\">x</button>");
        assert_eq!(role_of(&t, "button"), Some(AriaRole::Button));
        let t = tree("<img role=\"presentation\" alt=\"pic\">");
        assert_eq!(role_of(&t, "img"), None);
    }

    #[test]
    fn td_is_gridcell_only_inside_grid() {
        let t = tree("<table><tr><td>a</td></tr></table>");
        assert_eq!(role_of(&t, "td"), Some(AriaRole::Cell));
        let t = tree("<table role=grid><tr><td>a</td></tr></table>");
        assert_eq!(role_of(&t, "td"), Some(AriaRole::GridCell));
    }

    #[test]
    fn list_presentation_inherits_into_items() {
        let t = tree("<ul role=none><li>a</li></ul>");
        assert_eq!(role_of(&t, "li"), None);
        let t = tree("<ul role=none><li role=listitem>a</li></ul>");
        assert_eq!(role_of(&t, "li"), Some(AriaRole::ListItem));
    }

    #[test]
    fn orphan_li_has_no_role() {
        let t = tree("<div><li>a</li></div>");
        assert_eq!(role_of(&t, "li"), None);
    }

    #[test]
    fn header_is_banner_only_at_top_level() {
        let t = tree("<header>x</header>");
        assert_eq!(role_of(&t, "header"), Some(AriaRole::Banner));
        let t = tree("<article><header>x</header></article>");
        assert_eq!(role_of(&t, "header"), None);
    }

    #[test]
    fn input_types() {
        let t = tree("<input type=checkbox>");
        assert_eq!(role_of(&t, "input"), Some(AriaRole::Checkbox));
        let t = tree("<input type=search>");
        assert_eq!(role_of(&t, "input"), Some(AriaRole::Searchbox));
        let t = tree("<input>");
        assert_eq!(role_of(&t, "input"), Some(AriaRole::Textbox));
    }

    #[test]
    fn heading_levels() {
        let t = tree("<h3>x</h3>");
        let node = t
            .descendant_elements(t.root(), false)
            .into_iter()
            .find(|&n| t.as_element(n).is_some_and(|e| e.tag_name == "h3"))
            .expect("h3");
        assert_eq!(heading_level(&t, node), Some(3));
        let t = tree("<div role=heading aria-level=4>x</div>");
        let node = t
            .descendant_elements(t.root(), false)
            .into_iter()
            .find(|&n| t.as_element(n).is_some_and(|e| e.tag_name == "div"))
            .expect("div");
        assert_eq!(heading_level(&t, node), Some(4));
    }

    #[test]
    fn role_names_round_trip_through_strings() {
        assert_eq!(
            "menuitemcheckbox".parse::<AriaRole>(),
            Ok(AriaRole::MenuItemCheckbox)
        );
        assert_eq!(AriaRole::TreeItem.to_string(), "treeitem");
    }
}
