//! Parsed form of generator expressions

use std::collections::BTreeSet;

/// Characters that may appear as range endpoints, in ordinal order.
///
/// Ranges are ordered by position in this alphabet rather than by code point, so
/// `a-Z` covers every letter while `0-Z` (digits then letters) is inverted.
pub const ALPHABET: &str = concat!(
    "abcdefghijklmnopqrstuvwxyz",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "0123456789",
    "~!@#$%^&*()-_+={}[]\\|<,>.?/\"';:`",
);

/// Ordinal of a character within [`ALPHABET`]
pub fn ordinal(c: char) -> Option<usize> {
    ALPHABET.find(c)
}

/// Shorthand classes written as `\w`, `\d`, `\a` and `\A`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredefinedClass {
    /// `\w`: letters, digits and underscore
    Word,
    /// `\d`: digits
    Digit,
    /// `\a`: letters and digits
    Alphanumeric,
    /// `\A`: ASCII symbols
    Symbol,
}

impl PredefinedClass {
    /// Map an escape sequence such as `\w` to its class
    pub fn from_escape(escape: &str) -> Option<Self> {
        match escape {
            r"\w" => Some(Self::Word),
            r"\d" => Some(Self::Digit),
            r"\a" => Some(Self::Alphanumeric),
            r"\A" => Some(Self::Symbol),
            _ => None,
        }
    }

    /// The escape sequence for this class
    pub fn as_escape(self) -> &'static str {
        match self {
            Self::Word => r"\w",
            Self::Digit => r"\d",
            Self::Alphanumeric => r"\a",
            Self::Symbol => r"\A",
        }
    }

    /// Ranges covered by this class
    pub fn ranges(self) -> Vec<CharRange> {
        let alphanumeric = [
            CharRange { start: 'a', end: 'z' },
            CharRange { start: 'A', end: 'Z' },
            CharRange { start: '0', end: '9' },
        ];
        match self {
            Self::Word => {
                let mut ranges = alphanumeric.to_vec();
                ranges.push(CharRange::single('_'));
                ranges
            }
            Self::Digit => vec![CharRange { start: '0', end: '9' }],
            Self::Alphanumeric => alphanumeric.to_vec(),
            Self::Symbol => vec![CharRange { start: '~', end: '`' }],
        }
    }
}

/// Reasons a range pair is rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// Start ordinal exceeds end ordinal
    Inverted { start: char, end: char },
    /// Endpoint has no ordinal
    OutsideAlphabet(char),
}

/// An inclusive range of characters, ordered by [`ordinal`].
///
/// A range with `start == end` is a single character and may be any character,
/// including ones outside the alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRange {
    start: char,
    end: char,
}

impl CharRange {
    /// Create a range, validating both endpoints and their order
    pub fn new(start: char, end: char) -> Result<Self, RangeError> {
        if start == end {
            return Ok(Self::single(start));
        }
        let lo = ordinal(start).ok_or(RangeError::OutsideAlphabet(start))?;
        let hi = ordinal(end).ok_or(RangeError::OutsideAlphabet(end))?;
        if lo > hi {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range holding exactly one character
    pub fn single(c: char) -> Self {
        Self { start: c, end: c }
    }

    pub fn start(&self) -> char {
        self.start
    }

    pub fn end(&self) -> char {
        self.end
    }

    /// Iterate the characters covered by this range
    pub fn chars(&self) -> Box<dyn Iterator<Item = char> + '_> {
        match (ordinal(self.start), ordinal(self.end)) {
            (Some(lo), Some(hi)) if self.start != self.end => {
                Box::new(ALPHABET.chars().skip(lo).take(hi + 1 - lo))
            }
            _ => Box::new(std::iter::once(self.start)),
        }
    }

    /// Check whether a character falls inside this range
    pub fn contains(&self, c: char) -> bool {
        if self.start == self.end {
            return c == self.start;
        }
        match (ordinal(self.start), ordinal(self.end), ordinal(c)) {
            (Some(lo), Some(hi), Some(pos)) => lo <= pos && pos <= hi,
            _ => false,
        }
    }
}

/// A bracketed character class: the union of one or more ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    ranges: Vec<CharRange>,
}

impl CharClass {
    pub fn new(ranges: Vec<CharRange>) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &[CharRange] {
        &self.ranges
    }

    /// De-duplicated union of every range, in a stable order.
    ///
    /// Overlapping ranges contribute each character once, so the generator
    /// picks uniformly from the union.
    pub fn alphabet(&self) -> Vec<char> {
        self.ranges
            .iter()
            .flat_map(|r| r.chars())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn contains(&self, c: char) -> bool {
        self.ranges.iter().any(|r| r.contains(c))
    }
}

impl From<PredefinedClass> for CharClass {
    fn from(class: PredefinedClass) -> Self {
        Self::new(class.ranges())
    }
}

/// What a segment emits on each repetition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    Literal(char),
    Class(CharClass),
}

/// One token of an expression with its repeat count (always at least 1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub repeat: usize,
}

/// A validated generator expression, ready to produce values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorExpression {
    segments: Vec<Segment>,
}

impl GeneratorExpression {
    pub(crate) fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of characters every generated value has
    pub fn output_len(&self) -> usize {
        self.segments.iter().map(|s| s.repeat).sum()
    }
}
