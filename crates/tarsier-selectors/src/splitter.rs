//! Composite-selector splitter: `engine=body >> engine=body >> ...`.
//!
//! The top-level selector grammar is not CSS: a selector is a chain of
//! parts separated by `>>`, each handed to a named engine. The splitter
//! cuts the chain (respecting `'`, `"` and backtick quoting), infers the
//! engine for prefix-less parts, resolves the one optional `*` capture
//! marker, and parses each body into its engine-specific form. Nesting
//! engines (`has=`, `and=`, `or=`, `not=`, layout engines) carry a whole
//! inner selector; those recurse into the chain arena of the root
//! [`Selector`].

use crate::ast::{Chain, ChainId, PartBody, RoleQuery, Selector, SelectorPart, TextPredicate};
use crate::clause::{compile_pattern, parse_complex_list};
use crate::error::MalformedSelectorError;

/// Engines whose bodies are whole inner selectors.
const NESTING_ENGINES: &[&str] = &[
    "has", "and", "or", "not", "near", "left-of", "right-of", "above", "below",
];

/// Parse a composite selector string into its chain arena.
///
/// # Errors
/// Returns [`MalformedSelectorError`] when the chain grammar or any part
/// body is invalid. Unknown engine names are not a parse error; they
/// surface as [`crate::QueryError::UnknownEngine`] at query time.
pub fn parse_selector(source: &str) -> Result<Selector, MalformedSelectorError> {
    let mut chains = Vec::new();
    let mut fragment_ids = 0;
    let _ = parse_chain_into(&mut chains, source, source, &mut fragment_ids)?;
    Ok(Selector {
        source: source.to_owned(),
        chains,
    })
}

/// Parse one chain, reserving its arena slot before recursing so the
/// outermost call always lands at index 0.
fn parse_chain_into(
    chains: &mut Vec<Chain>,
    full_source: &str,
    chain_source: &str,
    fragment_ids: &mut u32,
) -> Result<ChainId, MalformedSelectorError> {
    let id = ChainId(chains.len());
    chains.push(Chain {
        parts: Vec::new(),
        capture: None,
    });

    let mut parts = Vec::new();
    let mut capture = None;
    for (index, (offset, raw_part)) in split_chain(chain_source).into_iter().enumerate() {
        let trimmed = raw_part.trim();
        if trimmed.is_empty() {
            return Err(malformed(full_source, raw_part, offset));
        }
        let (captured, engine, body) = split_part(trimmed);
        if captured {
            if capture.is_some() {
                return Err(malformed(full_source, trimmed, offset));
            }
            capture = Some(index);
        }
        let first_in_chain = index == 0;
        let part = parse_part(
            chains,
            full_source,
            &engine,
            body,
            offset,
            first_in_chain,
            fragment_ids,
        )?;
        parts.push(part);
    }
    if parts.is_empty() {
        return Err(malformed(full_source, chain_source, 0));
    }

    chains[id.0] = Chain { parts, capture };
    Ok(id)
}

fn malformed(selector: &str, fragment: &str, position: usize) -> MalformedSelectorError {
    MalformedSelectorError {
        selector: selector.to_owned(),
        fragment: fragment.to_owned(),
        position,
    }
}

/// Cut a chain at unquoted `>>` boundaries, keeping each part's byte
/// offset for error messages. Quotes (`'`, `"`, backtick) hide separators;
/// backslash escapes the next character inside quotes. A quote inside an
/// already-started bare `text=` body is ordinary prose (`text=don't`) and
/// is not tracked; a quote opening the body still delimits it.
fn split_chain(source: &str) -> Vec<(usize, &str)> {
    let bytes = source.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        match (quote, bytes[i]) {
            (Some(_), b'\\') if i + 1 < bytes.len() => i += 1,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, c @ (b'\'' | b'"' | b'`')) if scans_quotes(&source[start..i]) => {
                quote = Some(c);
            }
            (None, b'>') if bytes.get(i + 1) == Some(&b'>') => {
                parts.push((start, &source[start..i]));
                i += 1;
                start = i + 1;
            }
            (None, _) => {}
        }
        i += 1;
    }
    parts.push((start, &source[start..]));
    parts
}

/// Whether a quote encountered after `prefix` (the current part's text so
/// far) delimits a string. It does everywhere except mid-body in a bare
/// `text=` part.
fn scans_quotes(prefix: &str) -> bool {
    let prefix = prefix.trim_start();
    let prefix = prefix.strip_prefix('*').unwrap_or(prefix);
    let bytes = prefix.as_bytes();
    if bytes.len() >= 5 && bytes[..4].eq_ignore_ascii_case(b"text") && bytes[4] == b'=' {
        return prefix[5..].trim_start().is_empty();
    }
    true
}

/// Split one part into `(captured, engine, body)`, inferring the engine
/// when no `name=` prefix is present: `//`- or `..`-prefixed bodies are
/// XPath, quoted bodies are text, everything else is CSS. The `*` capture
/// marker requires an explicit engine prefix.
fn split_part(part: &str) -> (bool, String, &str) {
    let (captured, rest) = match part.strip_prefix('*') {
        Some(rest) if explicit_engine(rest).is_some() => (true, rest),
        _ => (false, part),
    };
    if let Some((engine, body)) = explicit_engine(rest) {
        return (captured, engine.to_ascii_lowercase(), body);
    }
    if rest.starts_with("//") || rest.starts_with("..") {
        return (captured, "xpath".to_owned(), rest);
    }
    if rest.starts_with('"') || rest.starts_with('\'') {
        return (captured, "text".to_owned(), rest);
    }
    (captured, "css".to_owned(), rest)
}

/// `name=` prefix detection: an identifier-shaped engine name directly
/// followed by `=`. Anything else (brackets, quotes, combinators before
/// the first `=`) falls through to engine inference.
fn explicit_engine(part: &str) -> Option<(&str, &str)> {
    let eq = part.find('=')?;
    let name = &part[..eq];
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+')
        || name.chars().next().is_some_and(|c| c.is_ascii_digit())
    {
        return None;
    }
    Some((name, &part[eq + 1..]))
}

fn parse_part(
    chains: &mut Vec<Chain>,
    full_source: &str,
    engine: &str,
    body: &str,
    offset: usize,
    first_in_chain: bool,
    fragment_ids: &mut u32,
) -> Result<SelectorPart, MalformedSelectorError> {
    let parsed = match engine {
        "css" => PartBody::Css(parse_complex_list(body, fragment_ids).map_err(|mut e| {
            e.selector = full_source.to_owned();
            e.position += offset;
            e
        })?),
        "text" => PartBody::Text(
            parse_text_body(body).ok_or_else(|| malformed(full_source, body, offset))?,
        ),
        "role" => PartBody::Role(
            parse_role_body(body).ok_or_else(|| malformed(full_source, body, offset))?,
        ),
        "nth" => {
            let index = body
                .trim()
                .parse::<i64>()
                .map_err(|_| malformed(full_source, body, offset))?;
            PartBody::Index(index)
        }
        "visible" => match body.trim() {
            "true" => PartBody::Visible(true),
            "false" => PartBody::Visible(false),
            _ => return Err(malformed(full_source, body, offset)),
        },
        name if NESTING_ENGINES.contains(&name) => {
            if first_in_chain {
                return Err(malformed(full_source, body, offset));
            }
            let (inner_source, distance) = parse_nested_body(body)
                .ok_or_else(|| malformed(full_source, body, offset))?;
            let inner = parse_chain_into(chains, full_source, &inner_source, fragment_ids)?;
            PartBody::Nested { inner, distance }
        }
        _ => PartBody::Opaque(body.to_owned()),
    };
    Ok(SelectorPart {
        engine: engine.to_owned(),
        raw_body: body.to_owned(),
        body: parsed,
    })
}

/// `text=` body forms: `/re/flags` pattern, quoted exact match, or bare
/// case-insensitive substring.
fn parse_text_body(body: &str) -> Option<TextPredicate> {
    let trimmed = body.trim();
    if let Some(rest) = trimmed.strip_prefix('/') {
        let close = rest.rfind('/')?;
        let (pattern, flags) = rest.split_at(close);
        return compile_pattern(pattern, &flags[1..]).map(TextPredicate::Pattern);
    }
    if (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
        || (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2)
    {
        let inner = &trimmed[1..trimmed.len() - 1];
        return Some(TextPredicate::Exact(unescape(inner)));
    }
    Some(TextPredicate::Substring(trimmed.to_owned()))
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// `role=` body: a role name followed by `[attr]` / `[attr=value]` filter
/// groups, e.g. `role=button[name="Save"][pressed][level=2]`. Also used
/// by the clause parser for `:role(...)` bodies.
pub(crate) fn parse_role_body(body: &str) -> Option<RoleQuery> {
    let trimmed = body.trim();
    let role_end = trimmed.find('[').unwrap_or(trimmed.len());
    let role = trimmed[..role_end].trim();
    if role.is_empty() || !role.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }
    let mut query = RoleQuery {
        role: role.to_ascii_lowercase(),
        ..RoleQuery::default()
    };
    let mut exact_name = false;

    let mut rest = trimmed[role_end..].trim_start();
    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return None;
        }
        let close = find_bracket_close(rest)?;
        let group = &rest[1..close];
        rest = rest[close + 1..].trim_start();

        let (key, value) = match group.find('=') {
            Some(eq) => (group[..eq].trim(), Some(group[eq + 1..].trim())),
            None => (group.trim(), None),
        };
        match key {
            "name" => {
                let value = value?;
                if let Some(pattern_body) = value.strip_prefix('/') {
                    let slash = pattern_body.rfind('/')?;
                    let (pattern, flags) = pattern_body.split_at(slash);
                    query.name =
                        Some(TextPredicate::Pattern(compile_pattern(pattern, &flags[1..])?));
                } else if (value.starts_with('"') && value.ends_with('"') && value.len() >= 2)
                    || (value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2)
                {
                    query.name = Some(TextPredicate::Substring(unescape(
                        &value[1..value.len() - 1],
                    )));
                } else {
                    query.name = Some(TextPredicate::Substring(value.to_owned()));
                }
            }
            "exact" => exact_name = value.is_none_or(|v| v == "true"),
            "checked" => query.checked = Some(parse_bool(value)?),
            "selected" => query.selected = Some(parse_bool(value)?),
            "pressed" => query.pressed = Some(parse_bool(value)?),
            "expanded" => query.expanded = Some(parse_bool(value)?),
            "disabled" => query.disabled = Some(parse_bool(value)?),
            "level" => query.level = Some(value?.parse().ok()?),
            "include-hidden" => query.include_hidden = parse_bool(value)?,
            _ => return None,
        }
    }
    if exact_name {
        if let Some(TextPredicate::Substring(text)) = query.name.take() {
            query.name = Some(TextPredicate::Exact(text));
        } else {
            return None;
        }
    }
    Some(query)
}

/// Closing `]` of the group starting at `rest[0] == '['`, quote-aware.
fn find_bracket_close(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 1;
    while i < bytes.len() {
        match (quote, bytes[i]) {
            (Some(_), b'\\') if i + 1 < bytes.len() => i += 1,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, c @ (b'\'' | b'"')) => quote = Some(c),
            (None, b']') => return Some(i),
            (None, _) => {}
        }
        i += 1;
    }
    None
}

/// Nesting-engine bodies: either a bare inner selector, a JSON string
/// (`has="div >> span"`), or a JSON array with an optional numeric
/// distance bound (`near=["#anchor", 120]`).
fn parse_nested_body(body: &str) -> Option<(String, Option<f64>)> {
    let trimmed = body.trim();
    if trimmed.starts_with('[') {
        let value: serde_json::Value = serde_json::from_str(trimmed).ok()?;
        let array = value.as_array()?;
        let selector = array.first()?.as_str()?.to_owned();
        let distance = match array.get(1) {
            Some(d) => Some(d.as_f64()?),
            None => None,
        };
        if array.len() > 2 {
            return None;
        }
        return Some((selector, distance));
    }
    if trimmed.starts_with('"') {
        let selector: String = serde_json::from_str(trimmed).ok()?;
        return Some((selector, None));
    }
    Some((trimmed.to_owned(), None))
}

fn parse_bool(value: Option<&str>) -> Option<bool> {
    match value {
        None => Some(true),
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_splits_on_unquoted_separators() {
        let selector = parse_selector("div >> text=\"a >> b\" >> nth=0").expect("parse");
        assert_eq!(selector.root().parts.len(), 3);
        assert_eq!(selector.root().parts[0].engine, "css");
        assert_eq!(selector.root().parts[1].engine, "text");
        assert_eq!(selector.root().parts[2].engine, "nth");
    }

    #[test]
    fn bare_text_bodies_ignore_stray_quotes() {
        let selector = parse_selector("text=don't worry >> nth=0").expect("parse");
        assert_eq!(selector.root().parts.len(), 2);
        assert!(matches!(
            &selector.root().parts[0].body,
            PartBody::Text(TextPredicate::Substring(t)) if t == "don't worry"
        ));
        assert_eq!(selector.root().parts[1].engine, "nth");
    }

    #[test]
    fn engine_inference() {
        let selector = parse_selector("\"Sign in\"").expect("parse");
        assert_eq!(selector.root().parts[0].engine, "text");
        let selector = parse_selector("//button[1]").expect("parse");
        assert_eq!(selector.root().parts[0].engine, "xpath");
        assert!(matches!(selector.root().parts[0].body, PartBody::Opaque(_)));
    }

    #[test]
    fn capture_marker_requires_engine_prefix() {
        let selector = parse_selector("ul >> *css=li >> text=apple").expect("parse");
        assert_eq!(selector.root().capture, Some(1));
        // A bare `*` is the universal selector, not a capture marker.
        let selector = parse_selector("*").expect("parse");
        assert_eq!(selector.root().capture, None);
        assert_eq!(selector.root().parts[0].engine, "css");
    }

    #[test]
    fn duplicate_capture_is_rejected() {
        assert!(parse_selector("*css=ul >> *css=li").is_err());
    }

    #[test]
    fn nested_body_forms() {
        let selector = parse_selector("div >> has=\"span.icon\"").expect("parse");
        let PartBody::Nested { inner, distance } = selector.root().parts[1].body else {
            panic!("expected nested body");
        };
        assert_eq!(distance, None);
        assert_eq!(selector.chain(inner).parts[0].engine, "css");

        let selector = parse_selector("input >> near=[\"#anchor\", 120]").expect("parse");
        let PartBody::Nested { distance, .. } = selector.root().parts[1].body else {
            panic!("expected nested body");
        };
        assert_eq!(distance, Some(120.0));
    }

    #[test]
    fn nesting_engine_cannot_open_a_chain() {
        assert!(parse_selector("has=\"div\"").is_err());
    }

    #[test]
    fn role_body_filters() {
        let selector =
            parse_selector("role=button[name=\"Save\"][pressed][level=2][include-hidden]")
                .expect("parse");
        let PartBody::Role(query) = &selector.root().parts[0].body else {
            panic!("expected role body");
        };
        assert_eq!(query.role, "button");
        assert!(matches!(&query.name, Some(TextPredicate::Substring(n)) if n == "Save"));
        assert_eq!(query.pressed, Some(true));
        assert_eq!(query.level, Some(2));
        assert!(query.include_hidden);
    }

    #[test]
    fn role_exact_name() {
        let selector = parse_selector("role=button[name=\"Save\"][exact]").expect("parse");
        let PartBody::Role(query) = &selector.root().parts[0].body else {
            panic!("expected role body");
        };
        assert!(matches!(&query.name, Some(TextPredicate::Exact(n)) if n == "Save"));
    }

    #[test]
    fn text_body_forms() {
        assert!(matches!(
            parse_selector("text=hello world").expect("parse").root().parts[0].body,
            PartBody::Text(TextPredicate::Substring(_))
        ));
        assert!(matches!(
            parse_selector("text=\"hello\"").expect("parse").root().parts[0].body,
            PartBody::Text(TextPredicate::Exact(_))
        ));
        assert!(matches!(
            parse_selector("text=/^hel+o$/i").expect("parse").root().parts[0].body,
            PartBody::Text(TextPredicate::Pattern(_))
        ));
    }

    #[test]
    fn round_trips_through_display() {
        let source = "div.item >> *css=li:has(span) >> nth=-1";
        let selector = parse_selector(source).expect("parse");
        assert_eq!(
            selector.to_string(),
            "css=div.item >> *css=li:has(span) >> nth=-1"
        );
    }

    #[test]
    fn empty_parts_are_rejected() {
        assert!(parse_selector("div >> >> span").is_err());
        assert!(parse_selector("").is_err());
    }
}
