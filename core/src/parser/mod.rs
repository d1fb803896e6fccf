//! Text front end: a pest grammar plus a Pratt table with C precedence.
//!
//! ```text
//! ?:  (right)  <  ||  <  &&  <  |  <  ^  <  &  <  == !=  <  < > <= >=
//!     <  << >>  <  + -  <  * / %  <  unary - ~ ! +
//! ```
//!
//! A `-` written directly in front of digits is part of the literal, so
//! `-2147483648` is accepted; any other literal outside the `i32` range is an
//! error. `#` starts a comment that runs to the end of the line.

pub mod error;
pub mod parser;

pub use error::{ParseError, ParseErrorKind};
pub use parser::{
    DEFAULT_MAX_DEPTH, ExpressionParser, MAX_TREE_DEPTH, Rule, parse, parse_in,
    parse_with_max_depth,
};
