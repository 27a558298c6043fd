use std::fmt;

use marq_lexer::{Span, TokenKind};
use serde::Serialize;

/// Rules with alternatives, used to say where none could be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    HtmlElement,
    HtmlMisc,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rule::HtmlElement => "htmlElement",
            Rule::HtmlMisc => "htmlMisc",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Recovered locally; the parse went on.
    Error,
    /// The parse stopped; the tree is partial.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Fatal => f.write_str("fatal"),
        }
    }
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiagnosticKind {
    #[error("expected {}, found {found}", kind_list(.expected))]
    UnexpectedToken {
        expected: Vec<TokenKind>,
        found: TokenKind,
    },

    #[error("no viable alternative for {rule} at {found}, expected {}", kind_list(.attempted))]
    NoViableAlternative {
        rule: Rule,
        attempted: Vec<TokenKind>,
        found: TokenKind,
    },

    #[error("closing tag '{close_name}' does not match '{open_name}'")]
    TagMismatch {
        open_name: String,
        close_name: String,
    },

    #[error("could not resynchronize after skipping {skipped} tokens")]
    RecoveryExhausted { skipped: usize },

    #[error("elements nested deeper than {limit} levels")]
    NestingLimit { limit: usize },
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::RecoveryExhausted { .. } | DiagnosticKind::NestingLimit { .. } => {
                Severity::Fatal
            }
            _ => Severity::Error,
        }
    }
}

fn kind_list(kinds: &[TokenKind]) -> String {
    match kinds {
        [single] => single.to_string(),
        _ => {
            let names: Vec<&str> = kinds.iter().map(|k| k.display_name()).collect();
            format!("one of {{{}}}", names.join(", "))
        }
    }
}

/// A problem found while parsing, in the order it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Span) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            span,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.span, self.severity, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unexpected_token_message() {
        let single = DiagnosticKind::UnexpectedToken {
            expected: vec![TokenKind::TagClose],
            found: TokenKind::Eof,
        };
        assert_eq!(single.to_string(), "expected '>', found <EOF>");

        let several = DiagnosticKind::UnexpectedToken {
            expected: vec![TokenKind::HtmlText, TokenKind::SeaWs],
            found: TokenKind::TagName,
        };
        assert_eq!(
            several.to_string(),
            "expected one of {HTML_TEXT, SEA_WS}, found TAG_NAME"
        );
    }

    #[test]
    fn test_display_includes_position_and_severity() {
        let diagnostic = Diagnostic::new(
            DiagnosticKind::TagMismatch {
                open_name: "span".into(),
                close_name: "div".into(),
            },
            Span::new(12, 15, 1, 13),
        );
        assert_eq!(
            diagnostic.to_string(),
            "1:13: error: closing tag 'div' does not match 'span'"
        );
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(Diagnostic::new(DiagnosticKind::RecoveryExhausted { skipped: 3 }, Span::default())
            .is_fatal());
        assert!(Diagnostic::new(DiagnosticKind::NestingLimit { limit: 2 }, Span::default())
            .is_fatal());
        assert!(!Diagnostic::new(
            DiagnosticKind::NoViableAlternative {
                rule: Rule::HtmlElement,
                attempted: vec![TokenKind::TagOpen],
                found: TokenKind::Eof,
            },
            Span::default()
        )
        .is_fatal());
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let diagnostic = Diagnostic::new(
            DiagnosticKind::RecoveryExhausted { skipped: 4 },
            Span::new(0, 1, 1, 1),
        );
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["kind"]["type"], "recovery_exhausted");
        assert_eq!(json["kind"]["skipped"], 4);
        assert_eq!(json["severity"], "fatal");
    }
}
