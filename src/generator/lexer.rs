//! Lexer for generator expressions using logos

use logos::Logos;

use crate::error::Span;

use super::ast::PredefinedClass;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    // Delimiters
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("-")]
    Dash,

    // Repeat count, e.g. `{8}`. The inner text is validated by the parser so that
    // `{abc}` and `{0}` get a precise diagnostic instead of a lexer error.
    #[regex(r"\{[^{}]*\}", |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_string()
    })]
    Repeat(String),

    // Predefined classes: \w \d \a \A
    #[regex(r"\\[wdaA]", |lex| PredefinedClass::from_escape(lex.slice()), priority = 10)]
    Class(PredefinedClass),

    // Any other escaped character is taken literally
    #[regex(r"\\.", |lex| lex.slice().chars().nth(1))]
    Escape(char),

    #[regex(r"[^\[\]\{\}\\-]", |lex| lex.slice().chars().next())]
    Char(char),
}

/// Lex a pattern into tokens with spans.
///
/// Unlike a tolerant lexer, unrecognized input (a lone `{`, `}` or trailing `\`)
/// is kept as an `Err` entry so the parser can report it.
pub fn lex(input: &str) -> impl Iterator<Item = (Result<Token, ()>, Span)> + '_ {
    Token::lexer(input).spanned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input).filter_map(|(tok, _)| tok.ok()).collect()
    }

    #[test]
    fn test_class_with_repeat() {
        assert_eq!(
            tokens("[a-z]{8}"),
            vec![
                Token::BracketOpen,
                Token::Char('a'),
                Token::Dash,
                Token::Char('z'),
                Token::BracketClose,
                Token::Repeat("8".to_string()),
            ]
        );
    }

    #[test]
    fn test_predefined_classes_and_escapes() {
        assert_eq!(
            tokens(r"\w\d\a\A\[\\"),
            vec![
                Token::Class(PredefinedClass::Word),
                Token::Class(PredefinedClass::Digit),
                Token::Class(PredefinedClass::Alphanumeric),
                Token::Class(PredefinedClass::Symbol),
                Token::Escape('['),
                Token::Escape('\\'),
            ]
        );
    }

    #[test]
    fn test_repeat_keeps_raw_text() {
        assert_eq!(tokens("x{ab}"), vec![Token::Char('x'), Token::Repeat("ab".to_string())]);
        assert_eq!(tokens("x{}"), vec![Token::Char('x'), Token::Repeat(String::new())]);
    }

    #[test]
    fn test_lone_brace_is_error() {
        let errors: Vec<_> = lex("ab}").filter(|(tok, _)| tok.is_err()).map(|(_, s)| s).collect();
        assert_eq!(errors, vec![2..3]);
    }

    #[test]
    fn test_multibyte_chars() {
        let spanned: Vec<_> = lex("é-").collect();
        assert_eq!(spanned[0], (Ok(Token::Char('é')), 0..2));
        assert_eq!(spanned[1], (Ok(Token::Dash), 2..3));
    }
}
