//! Error types for generator expressions

use ariadne::{Config, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::generator::lexer::Token;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A single problem found while parsing a generator expression
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("{message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },

    #[error("unexpected '{text}'")]
    Lexical { span: Span, text: String },

    #[error("expression is empty")]
    Empty,

    #[error("inverted range '{start}-{end}'")]
    InvertedRange { span: Span, start: char, end: char },

    #[error("range endpoint '{endpoint}' is not a letter, digit or ASCII symbol")]
    RangeOutsideAlphabet { span: Span, endpoint: char },

    #[error("repeat count '{{{raw}}}' is not a positive integer")]
    InvalidRepeat { span: Span, raw: String },

    #[error("repeat count {count} exceeds the maximum of {max}")]
    RepeatTooLarge { span: Span, count: usize, max: usize },
}

impl Diagnostic {
    /// Get the source span if available
    pub fn span(&self) -> Option<&Span> {
        match self {
            Self::Syntax { span, .. }
            | Self::Lexical { span, .. }
            | Self::InvertedRange { span, .. }
            | Self::RangeOutsideAlphabet { span, .. }
            | Self::InvalidRepeat { span, .. }
            | Self::RepeatTooLarge { span, .. } => Some(span),
            Self::Empty => None,
        }
    }
}

/// A generator expression that failed to parse, with every problem found in it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid generator expression \"{pattern}\": {}", format_diagnostics(.diagnostics))]
pub struct GeneratorError {
    pub pattern: String,
    pub diagnostics: Vec<Diagnostic>,
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl GeneratorError {
    pub fn new(pattern: impl Into<String>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            pattern: pattern.into(),
            diagnostics,
        }
    }

    /// Format the error with the pattern as source context using ariadne
    pub fn format(&self, name: &str) -> String {
        let mut buf = Vec::new();
        for diagnostic in &self.diagnostics {
            let span = diagnostic.span().cloned().unwrap_or(0..0);
            let mut report = Report::build(ReportKind::Error, name, span.start)
                .with_config(Config::default().with_color(false))
                .with_message(format!("invalid generator expression: {}", diagnostic));

            if diagnostic.span().is_some() {
                let label = match diagnostic {
                    Diagnostic::Syntax { message, expected, .. } if !expected.is_empty() => {
                        format!("{}\nExpected: {}", message, expected.join(", "))
                    }
                    other => other.to_string(),
                };
                report = report.with_label(Label::new((name, span)).with_message(label));
            }

            report
                .finish()
                .write((name, Source::from(self.pattern.as_str())), &mut buf)
                .unwrap();
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for Diagnostic {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found {
                Some(tok) => format!("unexpected {}", format_token(tok)),
                None => "unexpected end of expression".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of expression".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("'{}'", s)),
                chumsky::error::RichPattern::Any => Some("any character".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        Diagnostic::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::BracketOpen => "'['".to_string(),
        Token::BracketClose => "']'".to_string(),
        Token::Dash => "'-'".to_string(),
        Token::Repeat(raw) => format!("repeat count '{{{}}}'", raw),
        Token::Class(class) => format!("class '{}'", class.as_escape()),
        Token::Escape(c) => format!("'\\{}'", c),
        Token::Char(c) => format!("'{}'", c),
    }
}
