use thiserror::Error;

/// The result type for the `rslex_generate` crate.
pub type Result<T> = std::result::Result<T, RslexError>;

/// The error type for the `rslex_generate` crate.
#[derive(Error, Debug)]
pub struct RslexError {
    /// The source of the error.
    pub source: Box<RslexErrorKind>,
}

impl RslexError {
    /// Create a new `RslexError`.
    pub fn new(kind: RslexErrorKind) -> Self {
        RslexError {
            source: Box::new(kind),
        }
    }

    /// The kind of the error.
    #[inline]
    pub fn kind(&self) -> &RslexErrorKind {
        &self.source
    }
}

impl std::fmt::Display for RslexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// The error kind type.
#[derive(Error, Debug)]
pub enum RslexErrorKind {
    /// The action of a rule is not a valid Rust block.
    #[error("Syntax error in the action of rule {rule} ('{pattern}'): {source}")]
    SpecSyntaxError {
        /// The declaration index of the rule.
        rule: usize,
        /// The pattern of the rule as declared.
        pattern: String,
        /// The parser error.
        source: syn::Error,
    },

    /// The inline action is not a valid Rust block.
    #[error("Syntax error in the inline action: {0}")]
    InlineActionSyntaxError(#[source] syn::Error),

    /// A package or start condition name is not a Rust identifier.
    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    /// A start condition name collides with an item of the generated scanner.
    #[error("'{0}' is reserved by the generated scanner and can't name a start condition")]
    ReservedIdentifier(String),

    /// A start condition has a negative ordinal. Negative values are reserved by the runtime.
    #[error("Start condition '{0}' has the negative ordinal {1}")]
    NegativeOrdinal(String, i32),

    /// Two start conditions share the same ordinal.
    #[error("Start conditions '{0}' and '{1}' share the ordinal {2}")]
    DuplicateOrdinal(String, String, i32),

    /// A rule references a start condition that is not declared.
    #[error("Rule {rule} references the unknown start condition '{name}'")]
    UnknownStartCondition {
        /// The declaration index of the rule.
        rule: usize,
        /// The name of the start condition.
        name: String,
    },

    /// A rule has an empty pattern.
    #[error("Rule {rule} has an empty pattern")]
    EmptyPattern {
        /// The declaration index of the rule.
        rule: usize,
    },

    /// An error occurred during the parsing of the regex syntax.
    #[error("'{1}' {0}")]
    RegexSyntaxError(regex_syntax::Error, String),

    /// An encoded pattern is not a valid string literal.
    #[error("Encoded pattern {0} is not a valid string literal: {1}")]
    InvalidPatternLiteral(String, syn::Error),

    /// A std::io error occurred.
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Writing the generated code failed.
    #[error(transparent)]
    FmtError(#[from] std::fmt::Error),

    /// A JSON model could not be read or written.
    #[cfg(feature = "serde")]
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

impl From<std::io::Error> for RslexError {
    fn from(error: std::io::Error) -> Self {
        RslexError::new(RslexErrorKind::IoError(error))
    }
}

impl From<std::fmt::Error> for RslexError {
    fn from(error: std::fmt::Error) -> Self {
        RslexError::new(RslexErrorKind::FmtError(error))
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for RslexError {
    fn from(error: serde_json::Error) -> Self {
        RslexError::new(RslexErrorKind::JsonError(error))
    }
}

impl From<RslexErrorKind> for RslexError {
    fn from(kind: RslexErrorKind) -> Self {
        RslexError::new(kind)
    }
}
