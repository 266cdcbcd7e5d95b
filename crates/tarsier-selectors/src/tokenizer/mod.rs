//! Error-tolerant CSS-style tokenizer for the selector language.
//!
//! [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization)
//!
//! "The output of the tokenization step is a stream of zero or more tokens."
//! The lexer is total: malformed input degrades to delim / bad-string /
//! bad-url tokens instead of failing, mirroring tolerant CSS tokenizing.

mod lexer;
mod token;

pub use lexer::tokenize;
pub use token::{HashType, Token};
