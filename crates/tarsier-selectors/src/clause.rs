//! Token-stream parser for CSS-shaped selector clauses.
//!
//! [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing)
//!
//! Turns the token stream of one clause (the body of a `css=` part, or a
//! nested selector list inside an engine call) into a list of
//! [`ComplexSelector`] alternatives. Plain CSS simple selectors collapse
//! into [`CssCompound`] fragments; recognized functional names (`:has`,
//! `:text`, `:left-of`, ...) become [`EngineCall`]s; everything else a CSS
//! tokenizer accepts but no engine evaluates degrades to a never-matching
//! part instead of a parse error.

use regex::RegexBuilder;
use tarsier_common::warning::warn_once;

use crate::ast::{
    Combinator, ComplexSelector, EngineArg, EngineCall, SequenceEntry, SimpleSelector,
};
use crate::css::{AttributeSelector, CssCompound, CssPart, CssPseudo};
use crate::error::MalformedSelectorError;
use crate::splitter::parse_role_body;
use crate::tokenizer::{tokenize, HashType, Token};

/// Functional names dispatched to engines rather than treated as plain CSS.
const ENGINE_FUNCTIONS: &[&str] = &[
    "has", "is", "where", "not", "light", "text", "text-is", "text-matches", "has-text",
    "role", "nth-match", "left-of", "right-of", "above", "below", "near",
];

/// Bare pseudo-class names dispatched to engines.
const ENGINE_PSEUDOS: &[&str] = &["visible", "scope", "text"];

/// Plain-CSS pseudo-classes the evaluator matches natively.
fn native_pseudo(name: &str) -> Option<CssPseudo> {
    match name {
        "root" => Some(CssPseudo::Root),
        "first-child" => Some(CssPseudo::FirstChild),
        "last-child" => Some(CssPseudo::LastChild),
        "only-child" => Some(CssPseudo::OnlyChild),
        "first-of-type" => Some(CssPseudo::FirstOfType),
        "last-of-type" => Some(CssPseudo::LastOfType),
        "empty" => Some(CssPseudo::Empty),
        "disabled" => Some(CssPseudo::Disabled),
        "enabled" => Some(CssPseudo::Enabled),
        "checked" => Some(CssPseudo::Checked),
        _ => None,
    }
}

/// Parse one clause into its comma-separated complex-selector alternatives.
///
/// `fragment_ids` is the per-selector counter handing out memoization ids;
/// it is threaded through nested clause parses so every simple selector in
/// one composite selector gets a distinct id.
pub(crate) fn parse_complex_list(
    source: &str,
    fragment_ids: &mut u32,
) -> Result<Vec<ComplexSelector>, MalformedSelectorError> {
    let mut parser = ClauseParser {
        source,
        tokens: tokenize(source),
        pos: 0,
        fragment_ids,
    };
    let list = parser.parse_selector_list()?;
    match parser.peek() {
        Token::Eof => Ok(list),
        other => Err(parser.unexpected(other.clone())),
    }
}

struct ClauseParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    fragment_ids: &'a mut u32,
}

impl ClauseParser<'_> {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_whitespace() {
            self.pos += 1;
        }
    }

    fn unexpected(&self, token: Token) -> MalformedSelectorError {
        MalformedSelectorError {
            selector: self.source.to_owned(),
            fragment: token.to_string(),
            position: self.pos,
        }
    }

    fn next_fragment_id(&mut self) -> u32 {
        let id = *self.fragment_ids;
        *self.fragment_ids += 1;
        id
    }

    /// `<selector-list> = <complex-selector> [ ',' <complex-selector> ]*`
    ///
    /// Stops (without consuming) at any token that cannot continue the
    /// list, so engine calls parse their inner lists in place and claim
    /// the closing `)` themselves; the top-level caller checks for `Eof`.
    fn parse_selector_list(&mut self) -> Result<Vec<ComplexSelector>, MalformedSelectorError> {
        let mut list = vec![self.parse_complex()?];
        loop {
            self.skip_whitespace();
            if matches!(self.peek(), Token::Comma) {
                let _ = self.bump();
                list.push(self.parse_complex()?);
            } else {
                return Ok(list);
            }
        }
    }

    /// "A complex selector is a chain of one or more compound selectors
    /// separated by combinators."
    fn parse_complex(&mut self) -> Result<ComplexSelector, MalformedSelectorError> {
        self.skip_whitespace();
        let first = self.parse_compound()?;
        let mut sequence = vec![SequenceEntry {
            combinator: Combinator::Descendant,
            simple: first,
        }];
        loop {
            let saw_whitespace = self.peek().is_whitespace();
            self.skip_whitespace();
            let combinator = match self.peek() {
                Token::Delim('>') => {
                    let _ = self.bump();
                    if matches!(self.peek(), Token::Delim('=')) {
                        let _ = self.bump();
                        Combinator::ScopeDescendant
                    } else {
                        Combinator::Child
                    }
                }
                Token::Delim('+') => {
                    let _ = self.bump();
                    Combinator::NextSibling
                }
                Token::Delim('~') => {
                    let _ = self.bump();
                    Combinator::SubsequentSibling
                }
                token if saw_whitespace && self.starts_compound(token) => Combinator::Descendant,
                _ => return Ok(ComplexSelector { sequence }),
            };
            self.skip_whitespace();
            let simple = self.parse_compound()?;
            sequence.push(SequenceEntry { combinator, simple });
        }
    }

    fn starts_compound(&self, token: &Token) -> bool {
        matches!(
            token,
            Token::Ident(_)
                | Token::Hash { .. }
                | Token::Function(_)
                | Token::LeftBracket
                | Token::Colon
                | Token::Delim('*' | '.')
        )
    }

    /// "A compound selector is a sequence of simple selectors that are not
    /// separated by a combinator."
    fn parse_compound(&mut self) -> Result<SimpleSelector, MalformedSelectorError> {
        let mut css_parts: Vec<CssPart> = Vec::new();
        let mut css_source = String::new();
        let mut calls: Vec<EngineCall> = Vec::new();
        loop {
            match self.peek().clone() {
                Token::Ident(name) => {
                    let _ = self.bump();
                    css_source.push_str(&name);
                    css_parts.push(CssPart::Type(name.to_ascii_lowercase()));
                }
                Token::Delim('*') => {
                    let _ = self.bump();
                    css_source.push('*');
                    css_parts.push(CssPart::Universal);
                }
                Token::Hash { value, hash_type } => {
                    if hash_type != HashType::Id {
                        return Err(self.unexpected(Token::Hash { value, hash_type }));
                    }
                    let _ = self.bump();
                    css_source.push('#');
                    css_source.push_str(&value);
                    css_parts.push(CssPart::Id(value));
                }
                Token::Delim('.') => {
                    let _ = self.bump();
                    let Token::Ident(class) = self.bump() else {
                        return Err(self.unexpected(Token::Delim('.')));
                    };
                    css_source.push('.');
                    css_source.push_str(&class);
                    css_parts.push(CssPart::Class(class));
                }
                Token::LeftBracket => {
                    let (part, text) = self.parse_attribute()?;
                    css_source.push_str(&text);
                    css_parts.push(part);
                }
                Token::Colon => {
                    let _ = self.bump();
                    self.parse_after_colon(&mut css_parts, &mut css_source, &mut calls)?;
                }
                token => {
                    if css_parts.is_empty() && calls.is_empty() {
                        return Err(self.unexpected(token));
                    }
                    let css = (!css_parts.is_empty()).then(|| CssCompound {
                        source: css_source,
                        parts: css_parts,
                    });
                    return Ok(SimpleSelector {
                        fragment_id: self.next_fragment_id(),
                        css,
                        calls,
                    });
                }
            }
        }
    }

    /// Everything after a `:` - a native pseudo-class, an engine pseudo or
    /// call, a pseudo-element, or an unsupported pseudo kept as a
    /// never-matching fragment.
    fn parse_after_colon(
        &mut self,
        css_parts: &mut Vec<CssPart>,
        css_source: &mut String,
        calls: &mut Vec<EngineCall>,
    ) -> Result<(), MalformedSelectorError> {
        // `::name` pseudo-element: tolerated, never matches.
        if matches!(self.peek(), Token::Colon) {
            let _ = self.bump();
            let Token::Ident(name) = self.bump() else {
                return Err(self.unexpected(Token::Colon));
            };
            css_source.push_str(&format!("::{name}"));
            css_parts.push(CssPart::NeverMatch(format!("::{name}")));
            return Ok(());
        }
        match self.bump() {
            Token::Ident(name) => {
                let lower = name.to_ascii_lowercase();
                if ENGINE_PSEUDOS.contains(&lower.as_str()) {
                    calls.push(EngineCall {
                        name: lower,
                        args: Vec::new(),
                    });
                } else if let Some(pseudo) = native_pseudo(&lower) {
                    css_source.push(':');
                    css_source.push_str(&name);
                    css_parts.push(CssPart::Pseudo(pseudo));
                } else {
                    css_source.push(':');
                    css_source.push_str(&name);
                    css_parts.push(CssPart::NeverMatch(format!(":{lower}")));
                }
                Ok(())
            }
            Token::Function(name) => {
                let lower = name.to_ascii_lowercase();
                if ENGINE_FUNCTIONS.contains(&lower.as_str()) {
                    calls.push(self.parse_engine_call(lower)?);
                } else if lower == "nth-child" {
                    let (part, text) = self.parse_nth_child()?;
                    css_source.push_str(&text);
                    css_parts.push(part);
                } else {
                    let text = self.skip_balanced_call(&lower)?;
                    css_source.push_str(&text);
                    css_parts.push(CssPart::NeverMatch(format!(":{lower}()")));
                }
                Ok(())
            }
            token => Err(self.unexpected(token)),
        }
    }

    /// `:nth-child(3)` - the integer form matches natively; the full an+b
    /// grammar is tolerated but never matches.
    fn parse_nth_child(&mut self) -> Result<(CssPart, String), MalformedSelectorError> {
        self.skip_whitespace();
        if let Token::Number {
            int_value: Some(n),
            repr,
            ..
        } = self.peek().clone()
        {
            let _ = self.bump();
            self.skip_whitespace();
            if matches!(self.peek(), Token::RightParen) {
                let _ = self.bump();
                return Ok((CssPart::Pseudo(CssPseudo::NthChild(n)), format!(":nth-child({repr})")));
            }
            // Fall through: `3n`, `3 of ...` and friends end up unsupported.
        }
        let mut depth = 1_usize;
        while depth > 0 {
            match self.bump() {
                Token::LeftParen | Token::Function(_) => depth += 1,
                Token::RightParen => depth -= 1,
                Token::Eof => return Err(self.unexpected(Token::Eof)),
                _ => {}
            }
        }
        Ok((
            CssPart::NeverMatch(":nth-child(an+b)".to_owned()),
            ":nth-child()".to_owned(),
        ))
    }

    /// Consume a whole unsupported functional pseudo, warning once.
    fn skip_balanced_call(&mut self, name: &str) -> Result<String, MalformedSelectorError> {
        warn_once(
            "Selector",
            &format!("unsupported pseudo-class :{name}() never matches"),
        );
        let mut depth = 1_usize;
        while depth > 0 {
            match self.bump() {
                Token::LeftParen | Token::Function(_) => depth += 1,
                Token::RightParen => depth -= 1,
                Token::Eof => return Err(self.unexpected(Token::Eof)),
                _ => {}
            }
        }
        Ok(format!(":{name}()"))
    }

    /// Parse the argument list of a recognized engine call. The shapes are
    /// fixed per name: selector lists for the logical engines, a string for
    /// the text engines, a pattern (plus optional flags) for
    /// `text-matches`, a role query for `role`, and a selector list with a
    /// trailing number for `nth-match` and the layout engines.
    fn parse_engine_call(&mut self, name: String) -> Result<EngineCall, MalformedSelectorError> {
        let args = match name.as_str() {
            "has" | "is" | "where" | "not" | "light" => {
                let list = self.parse_selector_list()?;
                self.expect_right_paren()?;
                vec![EngineArg::Selectors(list)]
            }
            "text" | "text-is" | "has-text" => {
                let text = self.parse_string_argument()?;
                self.expect_right_paren()?;
                vec![EngineArg::Text(text)]
            }
            "text-matches" => {
                let pattern = self.parse_string_argument()?;
                self.skip_whitespace();
                let flags = if matches!(self.peek(), Token::Comma) {
                    let _ = self.bump();
                    Some(self.parse_string_argument()?)
                } else {
                    None
                };
                self.expect_right_paren()?;
                let regex = compile_pattern(&pattern, flags.as_deref().unwrap_or(""))
                    .ok_or_else(|| MalformedSelectorError {
                        selector: self.source.to_owned(),
                        fragment: pattern.clone(),
                        position: self.pos,
                    })?;
                vec![EngineArg::Pattern(regex)]
            }
            "role" => {
                let body = self.collect_call_body()?;
                let query = parse_role_body(&body).ok_or_else(|| MalformedSelectorError {
                    selector: self.source.to_owned(),
                    fragment: body,
                    position: self.pos,
                })?;
                vec![EngineArg::Role(Box::new(query))]
            }
            "nth-match" => {
                let list = self.parse_selector_list()?;
                self.skip_whitespace();
                if !matches!(self.peek(), Token::Comma) {
                    let token = self.peek().clone();
                    return Err(self.unexpected(token));
                }
                let _ = self.bump();
                let index = self.parse_number_argument()?;
                self.expect_right_paren()?;
                vec![EngineArg::Selectors(list), EngineArg::Number(index)]
            }
            "left-of" | "right-of" | "above" | "below" | "near" => {
                let list = self.parse_selector_list()?;
                self.skip_whitespace();
                let mut args = vec![EngineArg::Selectors(list)];
                if matches!(self.peek(), Token::Comma) {
                    let _ = self.bump();
                    args.push(EngineArg::Number(self.parse_number_argument()?));
                }
                self.expect_right_paren()?;
                args
            }
            _ => unreachable!("engine call names are filtered by the caller"),
        };
        Ok(EngineCall { name, args })
    }

    /// Consume the rest of a call up to its balanced `)` and hand back the
    /// re-serialized body text, for calls whose bodies have their own
    /// grammar.
    fn collect_call_body(&mut self) -> Result<String, MalformedSelectorError> {
        let mut body = String::new();
        let mut depth = 1_usize;
        loop {
            match self.bump() {
                Token::RightParen if depth == 1 => return Ok(body),
                token @ Token::RightParen => {
                    depth -= 1;
                    body.push_str(&token.to_string());
                }
                token @ (Token::LeftParen | Token::Function(_)) => {
                    depth += 1;
                    body.push_str(&token.to_string());
                }
                Token::Eof => return Err(self.unexpected(Token::Eof)),
                token => body.push_str(&token.to_string()),
            }
        }
    }

    fn parse_string_argument(&mut self) -> Result<String, MalformedSelectorError> {
        self.skip_whitespace();
        match self.bump() {
            Token::String(value) | Token::Ident(value) => Ok(value),
            token => Err(self.unexpected(token)),
        }
    }

    fn parse_number_argument(&mut self) -> Result<f64, MalformedSelectorError> {
        self.skip_whitespace();
        match self.bump() {
            Token::Number { value, .. } => Ok(value),
            token => Err(self.unexpected(token)),
        }
    }

    fn expect_right_paren(&mut self) -> Result<(), MalformedSelectorError> {
        self.skip_whitespace();
        match self.bump() {
            Token::RightParen => Ok(()),
            token => Err(self.unexpected(token)),
        }
    }

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    fn parse_attribute(&mut self) -> Result<(CssPart, String), MalformedSelectorError> {
        let _ = self.bump(); // `[`
        self.skip_whitespace();
        let Token::Ident(name) = self.bump() else {
            return Err(self.unexpected(Token::LeftBracket));
        };
        let name = name.to_ascii_lowercase();
        self.skip_whitespace();

        let operator = match self.peek().clone() {
            Token::RightBracket => {
                let _ = self.bump();
                return Ok((
                    CssPart::Attribute(AttributeSelector::Exists(name.clone())),
                    format!("[{name}]"),
                ));
            }
            Token::Delim(c @ ('=' | '~' | '|' | '^' | '$' | '*')) => {
                let _ = self.bump();
                if c != '=' {
                    if !matches!(self.peek(), Token::Delim('=')) {
                        let token = self.peek().clone();
                        return Err(self.unexpected(token));
                    }
                    let _ = self.bump();
                }
                c
            }
            token => return Err(self.unexpected(token)),
        };

        self.skip_whitespace();
        let value = match self.bump() {
            Token::String(v) | Token::Ident(v) => v,
            Token::Number { repr, .. } => repr,
            token => return Err(self.unexpected(token)),
        };
        self.skip_whitespace();
        match self.bump() {
            Token::RightBracket => {}
            token => return Err(self.unexpected(token)),
        }

        let part = match operator {
            '=' => AttributeSelector::Equals(name.clone(), value.clone()),
            '~' => AttributeSelector::Includes(name.clone(), value.clone()),
            '|' => AttributeSelector::DashMatch(name.clone(), value.clone()),
            '^' => AttributeSelector::PrefixMatch(name.clone(), value.clone()),
            '$' => AttributeSelector::SuffixMatch(name.clone(), value.clone()),
            '*' => AttributeSelector::SubstringMatch(name.clone(), value.clone()),
            _ => unreachable!(),
        };
        let op_text = if operator == '=' {
            "=".to_owned()
        } else {
            format!("{operator}=")
        };
        Ok((
            CssPart::Attribute(part),
            format!("[{name}{op_text}\"{value}\"]"),
        ))
    }
}

/// Compile a `text-matches` pattern with JavaScript-style flag letters.
/// Unknown flags are tolerated with a warning.
pub(crate) fn compile_pattern(pattern: &str, flags: &str) -> Option<regex::Regex> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => {
                let _ = builder.case_insensitive(true);
            }
            's' => {
                let _ = builder.dot_matches_new_line(true);
            }
            'm' => {
                let _ = builder.multi_line(true);
            }
            'u' | 'g' => {}
            other => warn_once("Selector", &format!("ignoring regex flag {other:?}")),
        }
    }
    builder.build().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<ComplexSelector> {
        let mut ids = 0;
        parse_complex_list(source, &mut ids).expect("selector should parse")
    }

    #[test]
    fn compound_collects_all_simple_selectors() {
        let list = parse("div#main.item[href^=\"https\"]:first-child");
        assert_eq!(list.len(), 1);
        let simple = &list[0].sequence[0].simple;
        let css = simple.css.as_ref().expect("css compound");
        assert_eq!(css.parts.len(), 5);
        assert!(simple.calls.is_empty());
    }

    #[test]
    fn combinators_including_scope_descendant() {
        let list = parse("ul > li ~ li >= span");
        let combinators: Vec<_> = list[0]
            .sequence
            .iter()
            .map(|entry| entry.combinator)
            .collect();
        assert_eq!(
            combinators,
            vec![
                Combinator::Descendant,
                Combinator::Child,
                Combinator::SubsequentSibling,
                Combinator::ScopeDescendant,
            ]
        );
    }

    #[test]
    fn engine_calls_parse_with_shaped_arguments() {
        let list = parse("article:has(div.note):text(\"hello\")");
        let simple = &list[0].sequence[0].simple;
        assert_eq!(simple.calls.len(), 2);
        assert_eq!(simple.calls[0].name, "has");
        assert!(matches!(simple.calls[0].args[0], EngineArg::Selectors(_)));
        assert_eq!(simple.calls[1].name, "text");
        assert!(matches!(
            &simple.calls[1].args[0],
            EngineArg::Text(t) if t == "hello"
        ));
    }

    #[test]
    fn role_pseudo_compiles_a_role_query() {
        use crate::ast::TextPredicate;

        let list = parse(":role(button[name=\"Save\"][pressed])");
        let call = &list[0].sequence[0].simple.calls[0];
        assert_eq!(call.name, "role");
        let EngineArg::Role(query) = &call.args[0] else {
            panic!("expected a compiled role query");
        };
        assert_eq!(query.role, "button");
        assert!(matches!(&query.name, Some(TextPredicate::Substring(n)) if n == "Save"));
        assert_eq!(query.pressed, Some(true));
    }

    #[test]
    fn text_matches_compiles_flags() {
        let list = parse(":text-matches(\"^sub\\\\w+$\", \"i\")");
        let EngineArg::Pattern(regex) = &list[0].sequence[0].simple.calls[0].args[0] else {
            panic!("expected compiled pattern");
        };
        assert!(regex.is_match("SUBMIT"));
    }

    #[test]
    fn layout_call_takes_optional_distance() {
        let list = parse("input:left-of(:text(\"Units\"), 80)");
        let call = &list[0].sequence[0].simple.calls[0];
        assert_eq!(call.name, "left-of");
        assert_eq!(call.args.len(), 2);
        assert!(matches!(call.args[1], EngineArg::Number(n) if (n - 80.0).abs() < f64::EPSILON));
    }

    #[test]
    fn unsupported_pseudo_degrades_to_never_match() {
        let list = parse("button:hover");
        let css = list[0].sequence[0].simple.css.as_ref().expect("css");
        assert!(matches!(&css.parts[1], CssPart::NeverMatch(name) if name == ":hover"));
    }

    #[test]
    fn nth_child_integer_form_is_native() {
        let list = parse("li:nth-child(3)");
        let css = list[0].sequence[0].simple.css.as_ref().expect("css");
        assert!(matches!(css.parts[1], CssPart::Pseudo(CssPseudo::NthChild(3))));
    }

    #[test]
    fn braces_are_rejected() {
        let mut ids = 0;
        assert!(parse_complex_list("div { color: red }", &mut ids).is_err());
    }

    #[test]
    fn selector_list_splits_on_commas() {
        let list = parse("h1, h2, h3");
        assert_eq!(list.len(), 3);
    }
}
