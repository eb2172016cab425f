//! Module with the specification model the generator consumes.
use rustc_hash::FxHashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use crate::Result;

/// The name of the start condition every scanner starts in.
pub const INITIAL: &str = "INITIAL";

/// The start condition name that activates a rule in all start conditions.
pub const WILDCARD: &str = "*";

/// The definition of a start condition.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StartConditionDef {
    /// The ordinal that identifies the start condition in the generated scanner.
    pub ordinal: i32,
    /// Exclusive start conditions only activate rules that list them explicitly.
    /// Inclusive start conditions additionally activate rules without start conditions.
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclusive: bool,
}

impl StartConditionDef {
    /// Create a new start condition definition.
    pub fn new(ordinal: i32, exclusive: bool) -> Self {
        Self { ordinal, exclusive }
    }
}

/// A rule of a scanner specification.
///
/// The declaration index of a rule is its position in [Specification::rules]. It decides which
/// rule wins if several rules match the same number of bytes, and in which order rules are
/// tried after a `REJECT`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct LexRule {
    /// The names of the start conditions the rule is active in.
    ///
    /// An empty list activates the rule in all inclusive start conditions, the name [WILDCARD]
    /// activates it in all start conditions.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Vec::is_empty")
    )]
    pub start_conditions: Vec<String>,
    /// The pattern in lex syntax.
    pub pattern: String,
    /// The trailing context in lex syntax. It must match after the pattern, but it is not
    /// consumed.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub trailing_pattern: Option<String>,
    /// The action code.
    #[cfg_attr(feature = "serde", serde(default))]
    pub action: String,
}

impl LexRule {
    /// Create a new rule that is active in all inclusive start conditions.
    pub fn new<P, A>(pattern: P, action: A) -> Self
    where
        P: Into<String>,
        A: Into<String>,
    {
        Self {
            start_conditions: Vec::new(),
            pattern: pattern.into(),
            trailing_pattern: None,
            action: action.into(),
        }
    }

    /// Set the start conditions of the rule.
    pub fn with_start_conditions<I, S>(mut self, start_conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.start_conditions = start_conditions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the trailing context of the rule.
    pub fn with_trailing_pattern<T: Into<String>>(mut self, trailing_pattern: T) -> Self {
        self.trailing_pattern = Some(trailing_pattern.into());
        self
    }

    /// If the rule only matches at the start of a line.
    #[inline]
    pub fn is_line_start_anchored(&self) -> bool {
        self.pattern.starts_with('^')
    }

    /// If the rule is active in all start conditions.
    #[inline]
    pub fn is_active_everywhere(&self) -> bool {
        self.start_conditions.iter().any(|name| name == WILDCARD)
    }
}

/// A scanner specification.
///
/// The specification is created by the caller, for instance by a parser of lex files, and handed
/// to the generator. The generator never changes it.
///
/// ```
/// use rslex_generate::{LexRule, Specification};
///
/// let specification = Specification::new("numbers")
///     .declare_start_condition("COMMENT", true)
///     .add_rule(LexRule::new(r"[0-9]+", "return 1;"))
///     .add_rule(LexRule::new(r"/\*", "BEGIN(COMMENT);"))
///     .add_rule(LexRule::new(r"\*/", "BEGIN(INITIAL);").with_start_conditions(["COMMENT"]));
/// assert_eq!(specification.start_conditions.len(), 2);
/// assert_eq!(specification.start_conditions["COMMENT"].ordinal, 1);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specification {
    /// The name of the generated package. Module wrapping uses it as module name.
    pub package_name: String,
    /// Code that is emitted verbatim before the scanner.
    #[cfg_attr(feature = "serde", serde(default))]
    pub prologue: String,
    /// Code that runs once before the first token is scanned.
    /// It can switch the start condition with `BEGIN(..)`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub action_inline: String,
    /// The start conditions by name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_conditions: FxHashMap<String, StartConditionDef>,
    /// The rules in declaration order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rules: Vec<LexRule>,
    /// Code that is emitted verbatim after the scanner.
    #[cfg_attr(feature = "serde", serde(default))]
    pub epilogue: String,
}

impl Specification {
    /// Create a new specification that only knows the start condition `INITIAL`.
    pub fn new<N: Into<String>>(package_name: N) -> Self {
        let mut start_conditions = FxHashMap::default();
        start_conditions.insert(INITIAL.to_string(), StartConditionDef::new(0, false));
        Self {
            package_name: package_name.into(),
            prologue: String::new(),
            action_inline: String::new(),
            start_conditions,
            rules: Vec::new(),
            epilogue: String::new(),
        }
    }

    /// Set the prologue.
    pub fn with_prologue<T: Into<String>>(mut self, prologue: T) -> Self {
        self.prologue = prologue.into();
        self
    }

    /// Set the epilogue.
    pub fn with_epilogue<T: Into<String>>(mut self, epilogue: T) -> Self {
        self.epilogue = epilogue.into();
        self
    }

    /// Set the inline action.
    pub fn with_action_inline<T: Into<String>>(mut self, action_inline: T) -> Self {
        self.action_inline = action_inline.into();
        self
    }

    /// Declare a start condition.
    ///
    /// A new start condition gets the next free ordinal. Declaring an existing start condition
    /// again only updates its exclusive flag.
    pub fn declare_start_condition<N: Into<String>>(mut self, name: N, exclusive: bool) -> Self {
        let next_ordinal = self
            .start_conditions
            .values()
            .map(|def| def.ordinal + 1)
            .max()
            .unwrap_or(0);
        self.start_conditions
            .entry(name.into())
            .and_modify(|def| def.exclusive = exclusive)
            .or_insert(StartConditionDef::new(next_ordinal, exclusive));
        self
    }

    /// Append a rule.
    pub fn add_rule(mut self, rule: LexRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Get a start condition by name.
    /// `INITIAL` is always known, even if a deserialized specification lacks it.
    pub fn start_condition(&self, name: &str) -> Option<StartConditionDef> {
        self.start_conditions.get(name).copied().or_else(|| {
            (name == INITIAL && !self.has_ordinal(0)).then(|| StartConditionDef::new(0, false))
        })
    }

    /// The start conditions sorted by ordinal, including an implicit `INITIAL`.
    pub fn start_conditions_by_ordinal(&self) -> Vec<(&str, StartConditionDef)> {
        let mut start_conditions = self
            .start_conditions
            .iter()
            .map(|(name, def)| (name.as_str(), *def))
            .collect::<Vec<_>>();
        if !self.start_conditions.contains_key(INITIAL) && !self.has_ordinal(0) {
            start_conditions.push((INITIAL, StartConditionDef::new(0, false)));
        }
        start_conditions.sort_by(|(n1, d1), (n2, d2)| d1.ordinal.cmp(&d2.ordinal).then(n1.cmp(n2)));
        start_conditions
    }

    fn has_ordinal(&self, ordinal: i32) -> bool {
        self.start_conditions
            .values()
            .any(|def| def.ordinal == ordinal)
    }

    /// Read a specification from JSON.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the specification as pretty printed JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
