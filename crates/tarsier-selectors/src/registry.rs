//! Part-engine registry.
//!
//! Maps the engine name of a chain part to its implementation kind and its
//! declared capability. The evaluator derives whatever a capability leaves
//! out: a matches-only engine opening a chain is run against every
//! descendant of the root, and any engine's `matches` can be derived by
//! querying and testing membership.

use crate::error::QueryError;

/// What an engine natively supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Filters an existing candidate list (`nth=`, `visible=`, nesting
    /// engines).
    MatchesOnly,
    /// Produces candidates from a root but cannot cheaply test one
    /// element.
    QueryOnly,
    /// Both directions supported natively.
    Both,
}

/// Implementation kind of a part engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EngineKind {
    Css,
    Text,
    Role,
    Nth,
    Visible,
    Has,
    And,
    Or,
    Not,
    Layout(LayoutRelation),
}

/// Geometric relation evaluated by the layout engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LayoutRelation {
    LeftOf,
    RightOf,
    Above,
    Below,
    Near,
}

/// Resolve an engine name.
///
/// # Errors
/// [`QueryError::UnknownEngine`] for names the registry does not carry
/// (including `xpath`, which parses but does not evaluate).
pub(crate) fn lookup(name: &str) -> Result<(EngineKind, Capability), QueryError> {
    let entry = match name {
        "css" => (EngineKind::Css, Capability::Both),
        "text" => (EngineKind::Text, Capability::Both),
        "role" => (EngineKind::Role, Capability::Both),
        "nth" => (EngineKind::Nth, Capability::MatchesOnly),
        "visible" => (EngineKind::Visible, Capability::MatchesOnly),
        "has" => (EngineKind::Has, Capability::MatchesOnly),
        "and" => (EngineKind::And, Capability::MatchesOnly),
        "or" => (EngineKind::Or, Capability::MatchesOnly),
        "not" => (EngineKind::Not, Capability::MatchesOnly),
        "left-of" => (EngineKind::Layout(LayoutRelation::LeftOf), Capability::MatchesOnly),
        "right-of" => (EngineKind::Layout(LayoutRelation::RightOf), Capability::MatchesOnly),
        "above" => (EngineKind::Layout(LayoutRelation::Above), Capability::MatchesOnly),
        "below" => (EngineKind::Layout(LayoutRelation::Below), Capability::MatchesOnly),
        "near" => (EngineKind::Layout(LayoutRelation::Near), Capability::MatchesOnly),
        other => {
            return Err(QueryError::UnknownEngine {
                name: other.to_owned(),
            })
        }
    };
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xpath_parses_but_does_not_evaluate() {
        assert!(matches!(
            lookup("xpath"),
            Err(QueryError::UnknownEngine { name }) if name == "xpath"
        ));
    }

    #[test]
    fn capabilities() {
        assert_eq!(lookup("css").map(|(_, c)| c), Ok(Capability::Both));
        assert_eq!(lookup("nth").map(|(_, c)| c), Ok(Capability::MatchesOnly));
    }
}
