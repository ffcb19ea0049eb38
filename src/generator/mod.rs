//! Generator expressions: a compact pattern language for random values
//!
//! ```text
//! [a-zA-Z0-9]{12}     twelve random letters or digits
//! admin-\d{4}         "admin-" followed by four digits
//! [\w\A]{16}          sixteen word characters or symbols
//! ```

pub mod ast;
mod grammar;
pub mod lexer;
mod value;

pub use ast::{CharClass, CharRange, GeneratorExpression, PredefinedClass, Segment, SegmentKind};
pub use grammar::{parse, parse_with_limit, DEFAULT_MAX_REPEAT};
pub use value::generate;
