//! Value generation from parsed expressions

use rand::seq::SliceRandom;
use rand::Rng;

use super::ast::{GeneratorExpression, SegmentKind};

/// Produce a value from an expression using the caller's random source.
///
/// Class segments pick uniformly from the de-duplicated union of their ranges.
/// The generator keeps no state of its own, so concurrent calls only need
/// separate `rng` values.
pub fn generate<R: Rng + ?Sized>(expr: &GeneratorExpression, rng: &mut R) -> String {
    let mut out = String::with_capacity(expr.output_len());

    for segment in expr.segments() {
        match &segment.kind {
            SegmentKind::Literal(c) => {
                out.extend(std::iter::repeat(*c).take(segment.repeat));
            }
            SegmentKind::Class(class) => {
                let alphabet = class.alphabet();
                for _ in 0..segment.repeat {
                    if let Some(c) = alphabet.choose(rng) {
                        out.push(*c);
                    }
                }
            }
        }
    }

    out
}

impl GeneratorExpression {
    /// Generate a value; see [`generate`]
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        generate(self, rng)
    }
}
