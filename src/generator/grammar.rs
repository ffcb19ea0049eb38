//! Generator expression parser using chumsky
//!
//! Parsing runs in two passes. The chumsky grammar only checks structure
//! (brackets, token order) and produces raw segments; [`lower`] then validates
//! range ordering and repeat counts so every semantic problem gets its own span.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::{Diagnostic, GeneratorError, Span};

use super::ast::{
    CharClass, CharRange, GeneratorExpression, PredefinedClass, RangeError, Segment, SegmentKind,
};
use super::lexer::{lex, Token};

/// Repeat counts above this are rejected unless the caller asks otherwise
pub const DEFAULT_MAX_REPEAT: usize = 255;

#[derive(Debug, Clone)]
enum RawClassItem {
    Single(char),
    Range { start: char, end: char, span: Span },
    Predefined(PredefinedClass),
}

#[derive(Debug, Clone)]
enum RawAtom {
    Literal(char),
    Predefined(PredefinedClass),
    Class(Vec<RawClassItem>),
}

#[derive(Debug, Clone)]
struct RawSegment {
    atom: RawAtom,
    repeat: Option<(String, Span)>,
}

/// Parse a generator expression with the default repeat limit
pub fn parse(pattern: &str) -> Result<GeneratorExpression, GeneratorError> {
    parse_with_limit(pattern, DEFAULT_MAX_REPEAT)
}

/// Parse a generator expression, rejecting repeat counts above `max_repeat`
pub fn parse_with_limit(
    pattern: &str,
    max_repeat: usize,
) -> Result<GeneratorExpression, GeneratorError> {
    if pattern.is_empty() {
        return Err(GeneratorError::new(pattern, vec![Diagnostic::Empty]));
    }

    let len = pattern.len();
    let mut lex_errors = Vec::new();
    let mut tokens = Vec::new();
    for (tok, span) in lex(pattern) {
        match tok {
            Ok(tok) => tokens.push((tok, SimpleSpan::from(span))),
            Err(()) => lex_errors.push(Diagnostic::Lexical {
                text: pattern.get(span.clone()).unwrap_or_default().to_string(),
                span,
            }),
        }
    }
    if !lex_errors.is_empty() {
        return Err(GeneratorError::new(pattern, lex_errors));
    }

    let token_stream = Stream::from_iter(tokens).map((len..len).into(), |(t, s): (_, _)| (t, s));

    let raw = expression_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| {
            GeneratorError::new(pattern, errs.into_iter().map(Diagnostic::from).collect())
        })?;

    lower(raw, max_repeat).map_err(|diagnostics| GeneratorError::new(pattern, diagnostics))
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> Span {
    e.start()..e.end()
}

fn expression_parser<'a, I>() -> impl Parser<'a, I, Vec<RawSegment>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    // Characters allowed as a range endpoint or single class member
    let class_char = select! {
        Token::Char(c) => c,
        Token::Escape(c) => c,
    };

    // Inside brackets a dash only forms a range between two characters;
    // anywhere else (`[-a]`, `[a-]`) it is a literal dash.
    let class_item = choice((
        select! { Token::Class(class) => RawClassItem::Predefined(class) },
        class_char
            .clone()
            .then_ignore(just(Token::Dash))
            .then(class_char.clone())
            .map_with(|(start, end), e| RawClassItem::Range {
                start,
                end,
                span: span_range(&e.span()),
            }),
        class_char.map(RawClassItem::Single),
        just(Token::Dash).to(RawClassItem::Single('-')),
    ));

    let class = class_item
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
        .map(RawAtom::Class);

    let atom = choice((
        class,
        select! {
            Token::Class(class) => RawAtom::Predefined(class),
            Token::Char(c) => RawAtom::Literal(c),
            Token::Escape(c) => RawAtom::Literal(c),
            Token::Dash => RawAtom::Literal('-'),
        },
    ));

    let repeat = select! { Token::Repeat(raw) => raw }
        .map_with(|raw, e| (raw, span_range(&e.span())));

    atom.then(repeat.or_not())
        .map(|(atom, repeat)| RawSegment { atom, repeat })
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .then_ignore(end())
}

/// Validate raw segments into a [`GeneratorExpression`], collecting every problem
fn lower(raw: Vec<RawSegment>, max_repeat: usize) -> Result<GeneratorExpression, Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();
    let mut segments = Vec::with_capacity(raw.len());

    for segment in raw {
        let kind = match segment.atom {
            RawAtom::Literal(c) => Some(SegmentKind::Literal(c)),
            RawAtom::Predefined(class) => Some(SegmentKind::Class(class.into())),
            RawAtom::Class(items) => lower_class(items, &mut diagnostics).map(SegmentKind::Class),
        };

        let repeat = match segment.repeat {
            None => Some(1),
            Some((raw, span)) => match parse_repeat(&raw) {
                None => {
                    diagnostics.push(Diagnostic::InvalidRepeat { span, raw });
                    None
                }
                Some(count) if count > max_repeat => {
                    diagnostics.push(Diagnostic::RepeatTooLarge {
                        span,
                        count,
                        max: max_repeat,
                    });
                    None
                }
                Some(count) => Some(count),
            },
        };

        if let (Some(kind), Some(repeat)) = (kind, repeat) {
            segments.push(Segment { kind, repeat });
        }
    }

    if diagnostics.is_empty() {
        Ok(GeneratorExpression::new(segments))
    } else {
        Err(diagnostics)
    }
}

/// A repeat count is a positive decimal integer: ASCII digits only, no sign,
/// whitespace or leading zero
fn parse_repeat(raw: &str) -> Option<usize> {
    if raw.is_empty() || raw.starts_with('0') || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn lower_class(items: Vec<RawClassItem>, diagnostics: &mut Vec<Diagnostic>) -> Option<CharClass> {
    let before = diagnostics.len();
    let mut ranges = Vec::new();

    for item in items {
        match item {
            RawClassItem::Single(c) => ranges.push(CharRange::single(c)),
            RawClassItem::Predefined(class) => ranges.extend(class.ranges()),
            RawClassItem::Range { start, end, span } => match CharRange::new(start, end) {
                Ok(range) => ranges.push(range),
                Err(RangeError::Inverted { start, end }) => {
                    diagnostics.push(Diagnostic::InvertedRange { span, start, end })
                }
                Err(RangeError::OutsideAlphabet(endpoint)) => {
                    diagnostics.push(Diagnostic::RangeOutsideAlphabet { span, endpoint })
                }
            },
        }
    }

    (diagnostics.len() == before).then(|| CharClass::new(ranges))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostics(pattern: &str) -> Vec<Diagnostic> {
        parse(pattern).expect_err("pattern should be rejected").diagnostics
    }

    #[test]
    fn test_parse_class_with_repeat() {
        let expr = parse("[a-z0-9]{8}").unwrap();
        assert_eq!(expr.segments().len(), 1);
        assert_eq!(expr.segments()[0].repeat, 8);
        assert_eq!(expr.output_len(), 8);
        match &expr.segments()[0].kind {
            SegmentKind::Class(class) => assert_eq!(class.alphabet().len(), 36),
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_literals_and_classes() {
        let expr = parse(r"admin-[0-9]{4}\d").unwrap();
        let kinds: Vec<_> = expr.segments().iter().map(|s| &s.kind).collect();
        assert_eq!(kinds[0], &SegmentKind::Literal('a'));
        assert_eq!(kinds[5], &SegmentKind::Literal('-'));
        assert!(matches!(kinds[6], SegmentKind::Class(_)));
        assert!(matches!(kinds[7], SegmentKind::Class(_)));
        assert_eq!(expr.output_len(), 11);
    }

    #[test]
    fn test_literal_repeat() {
        let expr = parse("x{3}").unwrap();
        assert_eq!(
            expr.segments(),
            &[Segment {
                kind: SegmentKind::Literal('x'),
                repeat: 3
            }]
        );
    }

    #[test]
    fn test_dash_at_class_edges_is_literal() {
        let expr = parse("[-a-c-]").unwrap();
        match &expr.segments()[0].kind {
            SegmentKind::Class(class) => {
                assert_eq!(class.alphabet(), vec!['-', 'a', 'b', 'c'])
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_predefined_class_inside_brackets() {
        let expr = parse(r"[\d\A]{2}").unwrap();
        match &expr.segments()[0].kind {
            SegmentKind::Class(class) => {
                assert!(class.contains('5'));
                assert!(class.contains('#'));
                assert!(!class.contains('a'));
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_inverted_range_rejected() {
        let diags = diagnostics("[a-z0-Z0-9]{8}");
        assert_eq!(
            diags,
            vec![Diagnostic::InvertedRange {
                span: 4..7,
                start: '0',
                end: 'Z'
            }]
        );
    }

    #[test]
    fn test_range_outside_alphabet_rejected() {
        assert!(matches!(
            diagnostics("[a-é]")[..],
            [Diagnostic::RangeOutsideAlphabet { endpoint: 'é', .. }]
        ));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert_eq!(diagnostics(""), vec![Diagnostic::Empty]);
    }

    #[test]
    fn test_bad_brackets_rejected() {
        for pattern in ["[]", "[a-z", "a-z]", "[[a]]"] {
            assert!(
                matches!(diagnostics(pattern)[..], [Diagnostic::Syntax { .. }, ..]),
                "{} should be a syntax error",
                pattern
            );
        }
    }

    #[test]
    fn test_bad_repeat_counts_rejected() {
        assert!(matches!(
            diagnostics("[a-z]{0}")[..],
            [Diagnostic::InvalidRepeat { .. }]
        ));
        assert!(matches!(
            diagnostics("[a-z]{-3}")[..],
            [Diagnostic::InvalidRepeat { .. }]
        ));
        assert!(matches!(
            diagnostics("[a-z]{abc}")[..],
            [Diagnostic::InvalidRepeat { .. }]
        ));
        assert!(matches!(
            diagnostics("[a-z]{256}")[..],
            [Diagnostic::RepeatTooLarge { count: 256, max: 255, .. }]
        ));
    }

    #[test]
    fn test_repeat_count_must_be_plain_digits() {
        for pattern in ["a{ 8 }", "a{+8}", "a{08}", "a{8 }", "a{}"] {
            assert!(
                matches!(diagnostics(pattern)[..], [Diagnostic::InvalidRepeat { .. }]),
                "{} should have an invalid repeat count",
                pattern
            );
        }
        assert_eq!(parse("a{10}").unwrap().output_len(), 10);
    }

    #[test]
    fn test_repeat_without_token_rejected() {
        assert!(matches!(diagnostics("{3}")[..], [Diagnostic::Syntax { .. }, ..]));
    }

    #[test]
    fn test_lone_brace_rejected() {
        assert_eq!(
            diagnostics("abc{"),
            vec![Diagnostic::Lexical {
                span: 3..4,
                text: "{".to_string()
            }]
        );
    }

    #[test]
    fn test_all_problems_reported() {
        let diags = diagnostics("[z-a]{0}");
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_custom_limit() {
        assert!(parse_with_limit("[a-z]{1000}", 1000).is_ok());
        assert!(parse_with_limit("[a-z]{9}", 8).is_err());
    }
}
