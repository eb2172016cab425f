//! # `rslex_generate`
//!
//! The generator of `rslex`. It turns a [Specification], a set of lex rules with start
//! conditions, trailing contexts and Rust action code, into the source of a standalone scanner.
//!
//! The generated scanner contains the runtime of `rslex` and implements the matching rules of
//! lex: the longest match wins, on equal length the rule declared first. Actions can use the lex
//! verbs `ECHO`, `REJECT`, `BEGIN` and `return`.
#![forbid(missing_docs)]

#[cfg(test)]
#[macro_use]
extern crate rstest;

/// Module that transforms action code into action functions
mod action;
pub use action::transform_action;

/// Module that writes the scanner program
mod emitter;
pub use emitter::RUNTIME_SOURCE;

/// Module with error definitions
mod errors;
pub use errors::{Result, RslexError, RslexErrorKind};

/// Module that provides the generation API
mod generate;
pub use generate::{generate, Generator};

/// Module that encodes patterns as string literals
mod pattern;
pub use pattern::encode_pattern;

pub(crate) mod rust_code_formatter;

/// Module with the specification model
mod specification;
pub use specification::{LexRule, Specification, StartConditionDef, INITIAL, WILDCARD};
