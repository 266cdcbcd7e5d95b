//! Per-language locator source rendering.
//!
//! A locator is presented to the embedder as a chain of tokens, each a
//! `(kind, body)` pair plus the options the kind understands. One factory
//! per target language turns a token into that language's idiomatic call;
//! quoting and escaping live entirely inside the factory.

use strum_macros::{Display, EnumString};

use tarsier_selectors::{
    AttributeSelector, CssPart, PartBody, Selector, SelectorPart, TextPredicate,
};

/// Languages the renderer can emit locator source for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum TargetLanguage {
    /// `page.getByRole('button', { name: 'Save' })`
    #[strum(serialize = "javascript", serialize = "js")]
    JavaScript,
    /// `page.get_by_role("button", name="Save")`
    #[strum(serialize = "python")]
    Python,
    /// `page.getByRole(AriaRole.BUTTON, new Page.GetByRoleOptions().setName("Save"))`
    #[strum(serialize = "java")]
    Java,
    /// `page.GetByRole(AriaRole.Button, new() { Name = "Save" })`
    #[strum(serialize = "csharp")]
    CSharp,
}

/// One step of a locator chain.
///
/// `kind` is one of `test-id`, `role`, `text`, `label`, `placeholder`,
/// `alt`, `title`, `nth`, `visible`, `default` (raw CSS/selector) or
/// `frame`. The kind is data so embedders can ship token chains across a
/// boundary; an unrecognized kind is a programming error and panics.
#[derive(Debug, Clone)]
pub struct LocatorToken {
    /// Token kind, see above.
    pub kind: String,
    /// Principal argument: role name, literal text, selector, index.
    pub body: String,
    /// Accessible-name option for `role` tokens.
    pub name: Option<String>,
    /// Exact-match option for text-bearing tokens.
    pub exact: bool,
}

impl LocatorToken {
    /// A token with no options set.
    #[must_use]
    pub fn new(kind: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            body: body.into(),
            name: None,
            exact: false,
        }
    }
}

/// Render a token chain as locator source in `language`.
///
/// # Panics
/// Panics on an unknown token kind or a non-integer `nth` body; both are
/// defects in the caller, not data errors.
#[must_use]
pub fn render(tokens: &[LocatorToken], language: TargetLanguage) -> String {
    let factory: &dyn LocatorFactory = match language {
        TargetLanguage::JavaScript => &JavaScriptFactory,
        TargetLanguage::Python => &PythonFactory,
        TargetLanguage::Java => &JavaFactory,
        TargetLanguage::CSharp => &CSharpFactory,
    };
    let mut out = factory.base().to_owned();
    for token in tokens {
        out.push('.');
        out.push_str(&render_token(factory, token));
    }
    out
}

/// Convert a parsed selector's root chain into renderable tokens.
///
/// Attribute-equality CSS parts on the test id attribute and on
/// `placeholder`/`alt`/`title` become their dedicated kinds; `text=`,
/// `role=`, `nth=` and `visible=` parts map directly; everything else is
/// carried as a raw `default` token.
#[must_use]
pub fn selector_to_tokens(selector: &Selector, test_id_attribute: &str) -> Vec<LocatorToken> {
    selector
        .root()
        .parts
        .iter()
        .map(|part| token_for(part, test_id_attribute))
        .collect()
}

fn token_for(part: &SelectorPart, test_id_attribute: &str) -> LocatorToken {
    match &part.body {
        PartBody::Css(_) => attribute_token(part, test_id_attribute)
            .unwrap_or_else(|| LocatorToken::new("default", part.raw_body.clone())),
        PartBody::Text(TextPredicate::Exact(text)) => LocatorToken {
            kind: "text".to_owned(),
            body: text.clone(),
            name: None,
            exact: true,
        },
        PartBody::Text(TextPredicate::Substring(text)) => LocatorToken::new("text", text.clone()),
        PartBody::Role(role_query) => {
            let (name, exact) = match &role_query.name {
                Some(TextPredicate::Exact(name)) => (Some(name.clone()), true),
                Some(TextPredicate::Substring(name)) => (Some(name.clone()), false),
                Some(TextPredicate::Pattern(_)) | None => (None, false),
            };
            LocatorToken {
                kind: "role".to_owned(),
                body: role_query.role.clone(),
                name,
                exact,
            }
        }
        PartBody::Index(index) => LocatorToken::new("nth", index.to_string()),
        PartBody::Visible(visible) => LocatorToken::new("visible", visible.to_string()),
        PartBody::Text(TextPredicate::Pattern(_))
        | PartBody::Nested { .. }
        | PartBody::Opaque(_) => LocatorToken::new(
            "default",
            format!("{}={}", part.engine, part.raw_body),
        ),
    }
}

/// `[attr="value"]`-only parts on well-known attributes.
fn attribute_token(part: &SelectorPart, test_id_attribute: &str) -> Option<LocatorToken> {
    let PartBody::Css(list) = &part.body else {
        return None;
    };
    let [complex] = list.as_slice() else {
        return None;
    };
    let [entry] = complex.sequence.as_slice() else {
        return None;
    };
    if !entry.simple.calls.is_empty() {
        return None;
    }
    let compound = entry.simple.css.as_ref()?;
    let [CssPart::Attribute(AttributeSelector::Equals(attribute, value))] =
        compound.parts.as_slice()
    else {
        return None;
    };
    let kind = if attribute == test_id_attribute {
        "test-id"
    } else {
        match attribute.as_str() {
            "placeholder" => "placeholder",
            "alt" => "alt",
            "title" => "title",
            _ => return None,
        }
    };
    Some(LocatorToken {
        kind: kind.to_owned(),
        body: value.clone(),
        name: None,
        exact: true,
    })
}

fn render_token(factory: &dyn LocatorFactory, token: &LocatorToken) -> String {
    match token.kind.as_str() {
        "test-id" => factory.test_id(&token.body),
        "role" => factory.role(&token.body, token.name.as_deref(), token.exact),
        "text" => factory.text(&token.body, token.exact),
        "label" => factory.label(&token.body, token.exact),
        "placeholder" => factory.placeholder(&token.body, token.exact),
        "alt" => factory.alt_text(&token.body, token.exact),
        "title" => factory.title(&token.body, token.exact),
        "nth" => match token.body.parse::<i64>() {
            Ok(index) => factory.nth(index),
            Err(_) => panic!("nth token body must be an integer, got {:?}", token.body),
        },
        "visible" => factory.visible(token.body != "false"),
        "default" | "css" => factory.css(&token.body),
        "frame" => factory.frame(&token.body),
        other => panic!("unknown locator kind {other:?}"),
    }
}

/// Language-specific call rendering; one method per token kind.
trait LocatorFactory {
    fn base(&self) -> &'static str;
    fn test_id(&self, value: &str) -> String;
    fn role(&self, role: &str, name: Option<&str>, exact: bool) -> String;
    fn text(&self, text: &str, exact: bool) -> String;
    fn label(&self, text: &str, exact: bool) -> String;
    fn placeholder(&self, text: &str, exact: bool) -> String;
    fn alt_text(&self, text: &str, exact: bool) -> String;
    fn title(&self, text: &str, exact: bool) -> String;
    fn nth(&self, index: i64) -> String;
    fn visible(&self, visible: bool) -> String;
    fn css(&self, selector: &str) -> String;
    fn frame(&self, selector: &str) -> String;
}

fn quote_with(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

struct JavaScriptFactory;

fn js(text: &str) -> String {
    quote_with(text, '\'')
}

fn js_text(method: &str, text: &str, exact: bool) -> String {
    if exact {
        format!("{method}({}, {{ exact: true }})", js(text))
    } else {
        format!("{method}({})", js(text))
    }
}

impl LocatorFactory for JavaScriptFactory {
    fn base(&self) -> &'static str {
        "page"
    }
    fn test_id(&self, value: &str) -> String {
        format!("getByTestId({})", js(value))
    }
    fn role(&self, role: &str, name: Option<&str>, exact: bool) -> String {
        match name {
            Some(name) if exact => format!(
                "getByRole({}, {{ name: {}, exact: true }})",
                js(role),
                js(name)
            ),
            Some(name) => format!("getByRole({}, {{ name: {} }})", js(role), js(name)),
            None => format!("getByRole({})", js(role)),
        }
    }
    fn text(&self, text: &str, exact: bool) -> String {
        js_text("getByText", text, exact)
    }
    fn label(&self, text: &str, exact: bool) -> String {
        js_text("getByLabel", text, exact)
    }
    fn placeholder(&self, text: &str, exact: bool) -> String {
        js_text("getByPlaceholder", text, exact)
    }
    fn alt_text(&self, text: &str, exact: bool) -> String {
        js_text("getByAltText", text, exact)
    }
    fn title(&self, text: &str, exact: bool) -> String {
        js_text("getByTitle", text, exact)
    }
    fn nth(&self, index: i64) -> String {
        format!("nth({index})")
    }
    fn visible(&self, visible: bool) -> String {
        format!("filter({{ visible: {visible} }})")
    }
    fn css(&self, selector: &str) -> String {
        format!("locator({})", js(selector))
    }
    fn frame(&self, selector: &str) -> String {
        format!("frameLocator({})", js(selector))
    }
}

struct PythonFactory;

fn py(text: &str) -> String {
    quote_with(text, '"')
}

fn py_text(method: &str, text: &str, exact: bool) -> String {
    if exact {
        format!("{method}({}, exact=True)", py(text))
    } else {
        format!("{method}({})", py(text))
    }
}

impl LocatorFactory for PythonFactory {
    fn base(&self) -> &'static str {
        "page"
    }
    fn test_id(&self, value: &str) -> String {
        format!("get_by_test_id({})", py(value))
    }
    fn role(&self, role: &str, name: Option<&str>, exact: bool) -> String {
        match name {
            Some(name) if exact => format!(
                "get_by_role({}, name={}, exact=True)",
                py(role),
                py(name)
            ),
            Some(name) => format!("get_by_role({}, name={})", py(role), py(name)),
            None => format!("get_by_role({})", py(role)),
        }
    }
    fn text(&self, text: &str, exact: bool) -> String {
        py_text("get_by_text", text, exact)
    }
    fn label(&self, text: &str, exact: bool) -> String {
        py_text("get_by_label", text, exact)
    }
    fn placeholder(&self, text: &str, exact: bool) -> String {
        py_text("get_by_placeholder", text, exact)
    }
    fn alt_text(&self, text: &str, exact: bool) -> String {
        py_text("get_by_alt_text", text, exact)
    }
    fn title(&self, text: &str, exact: bool) -> String {
        py_text("get_by_title", text, exact)
    }
    fn nth(&self, index: i64) -> String {
        format!("nth({index})")
    }
    fn visible(&self, visible: bool) -> String {
        format!("filter(visible={})", if visible { "True" } else { "False" })
    }
    fn css(&self, selector: &str) -> String {
        format!("locator({})", py(selector))
    }
    fn frame(&self, selector: &str) -> String {
        format!("frame_locator({})", py(selector))
    }
}

struct JavaFactory;

fn jv(text: &str) -> String {
    quote_with(text, '"')
}

fn jv_text(method: &str, options: &str, text: &str, exact: bool) -> String {
    if exact {
        format!(
            "{method}({}, new Page.{options}().setExact(true))",
            jv(text)
        )
    } else {
        format!("{method}({})", jv(text))
    }
}

impl LocatorFactory for JavaFactory {
    fn base(&self) -> &'static str {
        "page"
    }
    fn test_id(&self, value: &str) -> String {
        format!("getByTestId({})", jv(value))
    }
    fn role(&self, role: &str, name: Option<&str>, exact: bool) -> String {
        let role = role.to_ascii_uppercase();
        match name {
            Some(name) if exact => format!(
                "getByRole(AriaRole.{role}, new Page.GetByRoleOptions().setName({}).setExact(true))",
                jv(name)
            ),
            Some(name) => format!(
                "getByRole(AriaRole.{role}, new Page.GetByRoleOptions().setName({}))",
                jv(name)
            ),
            None => format!("getByRole(AriaRole.{role})"),
        }
    }
    fn text(&self, text: &str, exact: bool) -> String {
        jv_text("getByText", "GetByTextOptions", text, exact)
    }
    fn label(&self, text: &str, exact: bool) -> String {
        jv_text("getByLabel", "GetByLabelOptions", text, exact)
    }
    fn placeholder(&self, text: &str, exact: bool) -> String {
        jv_text("getByPlaceholder", "GetByPlaceholderOptions", text, exact)
    }
    fn alt_text(&self, text: &str, exact: bool) -> String {
        jv_text("getByAltText", "GetByAltTextOptions", text, exact)
    }
    fn title(&self, text: &str, exact: bool) -> String {
        jv_text("getByTitle", "GetByTitleOptions", text, exact)
    }
    fn nth(&self, index: i64) -> String {
        format!("nth({index})")
    }
    fn visible(&self, visible: bool) -> String {
        format!("filter(new Locator.FilterOptions().setVisible({visible}))")
    }
    fn css(&self, selector: &str) -> String {
        format!("locator({})", jv(selector))
    }
    fn frame(&self, selector: &str) -> String {
        format!("frameLocator({})", jv(selector))
    }
}

struct CSharpFactory;

fn cs(text: &str) -> String {
    quote_with(text, '"')
}

fn cs_text(method: &str, text: &str, exact: bool) -> String {
    if exact {
        format!("{method}({}, new() {{ Exact = true }})", cs(text))
    } else {
        format!("{method}({})", cs(text))
    }
}

fn pascal(role: &str) -> String {
    let mut chars = role.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_ascii_uppercase().to_string() + chars.as_str()
    })
}

impl LocatorFactory for CSharpFactory {
    fn base(&self) -> &'static str {
        "page"
    }
    fn test_id(&self, value: &str) -> String {
        format!("GetByTestId({})", cs(value))
    }
    fn role(&self, role: &str, name: Option<&str>, exact: bool) -> String {
        let role = pascal(role);
        match name {
            Some(name) if exact => format!(
                "GetByRole(AriaRole.{role}, new() {{ Name = {}, Exact = true }})",
                cs(name)
            ),
            Some(name) => format!(
                "GetByRole(AriaRole.{role}, new() {{ Name = {} }})",
                cs(name)
            ),
            None => format!("GetByRole(AriaRole.{role})"),
        }
    }
    fn text(&self, text: &str, exact: bool) -> String {
        cs_text("GetByText", text, exact)
    }
    fn label(&self, text: &str, exact: bool) -> String {
        cs_text("GetByLabel", text, exact)
    }
    fn placeholder(&self, text: &str, exact: bool) -> String {
        cs_text("GetByPlaceholder", text, exact)
    }
    fn alt_text(&self, text: &str, exact: bool) -> String {
        cs_text("GetByAltText", text, exact)
    }
    fn title(&self, text: &str, exact: bool) -> String {
        cs_text("GetByTitle", text, exact)
    }
    fn nth(&self, index: i64) -> String {
        format!("Nth({index})")
    }
    fn visible(&self, visible: bool) -> String {
        format!("Filter(new() {{ Visible = {visible} }})")
    }
    fn css(&self, selector: &str) -> String {
        format!("Locator({})", cs(selector))
    }
    fn frame(&self, selector: &str) -> String {
        format!("FrameLocator({})", cs(selector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn languages_parse_from_strings() {
        assert_eq!(
            "javascript".parse::<TargetLanguage>().expect("parses"),
            TargetLanguage::JavaScript
        );
        assert_eq!(
            "csharp".parse::<TargetLanguage>().expect("parses"),
            TargetLanguage::CSharp
        );
        assert!("ruby".parse::<TargetLanguage>().is_err());
    }

    #[test]
    fn quoting_escapes_quote_and_backslash() {
        assert_eq!(quote_with("a'b\\c", '\''), "'a\\'b\\\\c'");
    }

    #[test]
    fn pascal_cases_the_first_letter() {
        assert_eq!(pascal("button"), "Button");
        assert_eq!(pascal(""), "");
    }
}
