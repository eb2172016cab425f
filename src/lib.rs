#![forbid(missing_docs)]
//! # `rslex`
//! The `rslex` crate is a lexical-analyzer generator in the tradition of lex and flex.
//! A scanner is described by rules. Each rule consists of a regular expression, an optional
//! trailing context, the start conditions it is active in and an action written in Rust.
//! The generator turns such a specification into a standalone scanner program, which contains
//! the runtime of this crate.
//!
//! The scanner follows the matching rules of lex:
//! * At each position the rule with the longest match wins. The length of a trailing context
//!   counts as part of the match, although the trailing context is not consumed.
//! * On equal length the rule that was declared first wins.
//! * `REJECT` hands the match over to the next best rule.
//! * Input that no rule matches is copied to the output.
//!
//! The generator is available as [generator] and as crate `rslex_generate`.
//!
//! # Example
//! Generation is usually done in a build script:
//! ```ignore
//! use rslex::generator::{Generator, LexRule, Specification};
//!
//! let specification = Specification::new("words")
//!     .declare_start_condition("COMMENT", true)
//!     .add_rule(LexRule::new(r"[a-z]+", "return 1;"))
//!     .add_rule(LexRule::new(r"#", "BEGIN(COMMENT);"))
//!     .add_rule(LexRule::new(r"\n", "BEGIN(INITIAL);").with_start_conditions(["*"]))
//!     .add_rule(LexRule::new(r".", "").with_start_conditions(["COMMENT"]));
//! Generator::new(&specification)
//!     .wrap_in_module(true)
//!     .write_to_file(out_dir.join("words.rs"))?;
//! ```
//! The program then includes the generated module and runs the scanner:
//! ```ignore
//! include!(concat!(env!("OUT_DIR"), "/words.rs"));
//!
//! let mut scanner = words::yy_scanner_builder().build_stdio()?;
//! while scanner.yylex()? != words::END_OF_INPUT {
//!     println!("word: {}", scanner.yytext());
//! }
//! ```
//!
//! The runtime can also be used directly with hand written rule tables:
//! ```rust
//! use rslex::{ActionOutcome, Scanner, ScannerBuilder, ScannerRule};
//!
//! fn word(_yy: &mut Scanner) -> ActionOutcome {
//!     ActionOutcome::Return(1)
//! }
//!
//! fn space(_yy: &mut Scanner) -> ActionOutcome {
//!     ActionOutcome::Fallthrough
//! }
//!
//! static RULES: &[ScannerRule] = &[
//!     ScannerRule {
//!         pattern: "[a-z]+",
//!         trailing: None,
//!         start_conditions: &[],
//!         line_start: false,
//!         action: word,
//!     },
//!     ScannerRule {
//!         pattern: r"\s+",
//!         trailing: None,
//!         start_conditions: &[],
//!         line_start: false,
//!         action: space,
//!     },
//! ];
//!
//! let mut scanner = ScannerBuilder::new()
//!     .add_rules(RULES)
//!     .build("hello big world".as_bytes(), std::io::sink())
//!     .expect("ScannerBuilder error");
//! let mut words = Vec::new();
//! while scanner.yylex().unwrap() == 1 {
//!     words.push(scanner.yytext().into_owned());
//! }
//! assert_eq!(words, ["hello", "big", "world"]);
//! ```
//!
//! # Crate features
//! - `serde`: Enabled by default. Specifications can be read from and written to JSON.

/// The scanner runtime. It is also embedded into every generated scanner.
mod scanner;
pub use scanner::{
    Action, ActionOutcome, InlineAction, Scanner, ScannerBuilder, ScannerError, ScannerRule,
    StartCondition, ANY_START_CONDITION, END_OF_INPUT, INITIAL,
};

pub use rslex_generate as generator;
