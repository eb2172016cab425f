//! The scanner runtime.
//!
//! This module is compiled as part of the `rslex` crate and it is also embedded verbatim into
//! every generated scanner as the module `yy_runtime`. Therefore it must not refer to any other
//! module of the crate.
//!
//! A [Scanner] holds the complete input in one buffer. At each position all rules that are
//! active in the current start condition are matched independently against the remaining input.
//! The rule with the longest match wins, where the length of a trailing context counts as part of
//! the match. On equal length the rule that was declared first wins. The action of the winning
//! rule decides what happens next, see [ActionOutcome].
//!
//! Input that no rule matches is copied to the output byte by byte.

use std::borrow::Cow;
use std::io::{Read, Write};

use log::trace;
use regex_automata::{meta::Regex, Anchored, Input};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// The ordinal of a start condition.
pub type StartCondition = i32;

/// The start condition every scanner starts in.
pub const INITIAL: StartCondition = 0;

/// Sentinel in [ScannerRule::start_conditions] that activates a rule in all start conditions.
pub const ANY_START_CONDITION: StartCondition = -1;

/// The value [Scanner::yylex] returns when the input is exhausted.
pub const END_OF_INPUT: i32 = 0;

/// The outcome of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action ran to completion. Scanning continues with the next token.
    Fallthrough,
    /// The action returned a value. [Scanner::yylex] stops and yields it.
    Return(i32),
    /// The action invoked `REJECT`. The next best rule of the already ranked candidates is
    /// tried without matching again.
    Reject,
}

/// An action function of a rule.
pub type Action = fn(&mut Scanner) -> ActionOutcome;

/// The inline action that runs once before the first token is scanned.
/// It receives a callback that switches the active start condition.
pub type InlineAction = fn(&mut dyn FnMut(StartCondition));

/// The error type of the scanner runtime.
#[derive(Error, Debug)]
pub enum ScannerError {
    /// A pattern of a rule could not be compiled by the regex engine.
    #[error("Invalid pattern '{pattern}' in rule {rule}: {source}")]
    InvalidPattern {
        /// The declaration index of the rule.
        rule: usize,
        /// The pattern as handed to the regex engine.
        pattern: String,
        /// The error reported by the regex engine.
        source: Box<regex_automata::meta::BuildError>,
    },

    /// Reading the input or writing the output failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One entry of a rule table.
///
/// Generated scanners define their rules as a static slice of `ScannerRule` values in
/// declaration order. The position of a rule in this slice is its declaration index.
#[derive(Clone, Copy)]
pub struct ScannerRule {
    /// The primary pattern.
    pub pattern: &'static str,
    /// The trailing context. It has to match right after the primary pattern but it is not
    /// consumed.
    pub trailing: Option<&'static str>,
    /// The start conditions the rule is active in.
    /// An empty slice means all inclusive start conditions, [ANY_START_CONDITION] means all
    /// start conditions.
    pub start_conditions: &'static [StartCondition],
    /// The rule only matches at the start of a line.
    pub line_start: bool,
    /// The action that is called when the rule wins.
    pub action: Action,
}

impl std::fmt::Debug for ScannerRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerRule")
            .field("pattern", &self.pattern)
            .field("trailing", &self.trailing)
            .field("start_conditions", &self.start_conditions)
            .field("line_start", &self.line_start)
            .finish()
    }
}

struct CompiledRule {
    index: usize,
    regex: Regex,
    trailing: Option<Regex>,
    start_conditions: &'static [StartCondition],
    line_start: bool,
    action: Action,
}

impl CompiledRule {
    fn try_new(index: usize, rule: &ScannerRule) -> Result<Self, ScannerError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| ScannerError::InvalidPattern {
                rule: index,
                pattern: pattern.to_string(),
                source: Box::new(source),
            })
        };
        Ok(Self {
            index,
            regex: compile(rule.pattern)?,
            trailing: rule.trailing.map(compile).transpose()?,
            start_conditions: rule.start_conditions,
            line_start: rule.line_start,
            action: rule.action,
        })
    }

    fn is_active(&self, condition: StartCondition, exclusive: bool, at_line_start: bool) -> bool {
        if self.line_start && !at_line_start {
            return false;
        }
        if self
            .start_conditions
            .iter()
            .any(|c| *c == condition || *c == ANY_START_CONDITION)
        {
            return true;
        }
        !exclusive && self.start_conditions.is_empty()
    }

    /// Matches the rule at the start of the haystack.
    /// Returns the length of the primary match and the length including the trailing context.
    fn find_at_start(&self, haystack: &[u8]) -> Option<(usize, usize)> {
        let primary = self
            .regex
            .find(Input::new(haystack).anchored(Anchored::Yes))?;
        if primary.is_empty() {
            // An empty match would never advance the scanner.
            return None;
        }
        let primary_len = primary.end();
        let mut combined_len = primary_len;
        if let Some(trailing) = &self.trailing {
            let context =
                trailing.find(Input::new(&haystack[primary_len..]).anchored(Anchored::Yes))?;
            combined_len += context.end();
        }
        Some((primary_len, combined_len))
    }
}

impl std::fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRule")
            .field("index", &self.index)
            .field("start_conditions", &self.start_conditions)
            .field("line_start", &self.line_start)
            .field("has_trailing", &self.trailing.is_some())
            .finish()
    }
}

/// A rule that matched at the current position.
#[derive(Clone, Copy)]
struct Candidate {
    rule: usize,
    action: Action,
    primary_len: usize,
    combined_len: usize,
}

/// Collects the tables of a scanner and builds [Scanner] instances from them.
///
/// Generated scanners provide a function `yy_scanner_builder` that returns a builder which is
/// already populated with the generated tables.
#[derive(Clone, Default)]
pub struct ScannerBuilder {
    rules: Vec<ScannerRule>,
    start_conditions: Vec<(StartCondition, bool)>,
    action_inline: Option<InlineAction>,
}

impl ScannerBuilder {
    /// Creates a new scanner builder without rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule. Rules keep the order in which they are added.
    pub fn add_rule(mut self, rule: ScannerRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends multiple rules.
    pub fn add_rules(mut self, rules: &[ScannerRule]) -> Self {
        self.rules.extend_from_slice(rules);
        self
    }

    /// Adds start conditions as pairs of ordinal and exclusive flag.
    /// Start conditions that are never added are treated as inclusive.
    pub fn add_start_conditions(mut self, start_conditions: &[(StartCondition, bool)]) -> Self {
        self.start_conditions.extend_from_slice(start_conditions);
        self
    }

    /// Sets the inline action.
    pub fn action_inline(mut self, action_inline: InlineAction) -> Self {
        self.action_inline = Some(action_inline);
        self
    }

    /// Builds a scanner that reads the complete `input` and writes to `output`.
    pub fn build<R, W>(self, mut input: R, output: W) -> Result<Scanner, ScannerError>
    where
        R: Read,
        W: Write + 'static,
    {
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer)?;
        self.build_from_bytes(buffer, output)
    }

    /// Builds a scanner that scans the given bytes and writes to `output`.
    pub fn build_from_bytes<W>(self, buffer: Vec<u8>, output: W) -> Result<Scanner, ScannerError>
    where
        W: Write + 'static,
    {
        let rules = self
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| CompiledRule::try_new(index, rule))
            .collect::<Result<Vec<_>, _>>()?;
        trace!(
            "Built scanner with {} rules over {} bytes of input",
            rules.len(),
            buffer.len()
        );
        Ok(Scanner {
            rules,
            exclusive: self.start_conditions.into_iter().collect(),
            action_inline: self.action_inline,
            started: false,
            buffer,
            cursor: 0,
            text: Vec::new(),
            text_mark: 0,
            reset_text: true,
            match_start: 0,
            match_len: 0,
            condition: INITIAL,
            output: Box::new(output),
            output_error: None,
        })
    }

    /// Builds a scanner that reads the complete standard input and writes to standard output.
    pub fn build_stdio(self) -> Result<Scanner, ScannerError> {
        self.build(std::io::stdin().lock(), std::io::stdout())
    }
}

impl std::fmt::Debug for ScannerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerBuilder")
            .field("rules", &self.rules)
            .field("start_conditions", &self.start_conditions)
            .field("has_action_inline", &self.action_inline.is_some())
            .finish()
    }
}

/// A scanner over one fully buffered input.
///
/// Actions receive the scanner as `yy` and use its methods to access the matched text and to
/// control the scanning process.
pub struct Scanner {
    rules: Vec<CompiledRule>,
    exclusive: FxHashMap<StartCondition, bool>,
    action_inline: Option<InlineAction>,
    started: bool,
    buffer: Vec<u8>,
    // The read position. The remaining input is `buffer[cursor..]`.
    cursor: usize,
    text: Vec<u8>,
    // Length of the text before the current match was appended.
    text_mark: usize,
    reset_text: bool,
    match_start: usize,
    match_len: usize,
    condition: StartCondition,
    output: Box<dyn Write>,
    // Write errors inside actions are reported when the action returns.
    output_error: Option<std::io::Error>,
}

impl Scanner {
    /// Scans until an action returns a value or the input is exhausted.
    ///
    /// Returns the value of the first [ActionOutcome::Return] or [END_OF_INPUT].
    /// Subsequent calls continue where the previous call stopped.
    pub fn yylex(&mut self) -> std::io::Result<i32> {
        self.run_action_inline();
        while self.cursor < self.buffer.len() {
            if self.reset_text {
                self.text.clear();
            }
            let mut accepted = false;
            for candidate in self.candidates() {
                match self.fire(candidate)? {
                    ActionOutcome::Reject => continue,
                    ActionOutcome::Fallthrough => {
                        accepted = true;
                        break;
                    }
                    ActionOutcome::Return(value) => {
                        trace!("Rule {} returned {}", candidate.rule, value);
                        return Ok(value);
                    }
                }
            }
            if !accepted {
                self.pass_through()?;
            }
        }
        self.output.flush()?;
        Ok(END_OF_INPUT)
    }

    /// Writes the matched text to the output.
    pub fn echo(&mut self) {
        if let Err(error) = self.output.write_all(&self.text) {
            if self.output_error.is_none() {
                self.output_error = Some(error);
            }
        }
    }

    /// Switches the active start condition.
    pub fn begin(&mut self, condition: StartCondition) {
        trace!("Switching start condition {} -> {}", self.condition, condition);
        self.condition = condition;
    }

    /// Returns the active start condition.
    #[inline]
    pub fn start_condition(&self) -> StartCondition {
        self.condition
    }

    /// Keeps the matched text at the next token boundary, so that the text of the next match is
    /// appended to it.
    pub fn yymore(&mut self) {
        self.reset_text = false;
    }

    /// Consumes only the first `n` bytes of the current match. The rest is scanned again.
    /// The matched text is truncated accordingly.
    pub fn yyless(&mut self, n: usize) {
        let n = n.min(self.match_len);
        self.cursor = self.match_start + n;
        self.text.truncate(self.text_mark);
        self.text
            .extend_from_slice(&self.buffer[self.match_start..self.match_start + n]);
    }

    /// Consumes the next byte of the input without matching it.
    /// Returns `None` at the end of the input.
    pub fn input(&mut self) -> Option<u8> {
        let byte = self.buffer.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(byte)
    }

    /// Pushes a byte back to the front of the remaining input.
    pub fn unput(&mut self, byte: u8) {
        self.buffer.insert(self.cursor, byte);
    }

    /// The matched text.
    #[inline]
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// The matched text as string. Invalid UTF-8 sequences are replaced.
    pub fn yytext(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.text)
    }

    /// The length of the matched text in bytes.
    #[inline]
    pub fn yyleng(&self) -> usize {
        self.text.len()
    }

    /// The remaining input.
    #[inline]
    pub fn remaining(&self) -> &[u8] {
        &self.buffer[self.cursor..]
    }

    /// The output the scanner writes to.
    pub fn output(&mut self) -> &mut dyn Write {
        &mut *self.output
    }

    fn run_action_inline(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        if let Some(action_inline) = self.action_inline {
            let mut condition = self.condition;
            action_inline(&mut |next: StartCondition| condition = next);
            self.begin(condition);
        }
    }

    fn is_exclusive(&self, condition: StartCondition) -> bool {
        self.exclusive.get(&condition).copied().unwrap_or(false)
    }

    /// Collects the rules matching at the current position, best candidate first.
    fn candidates(&self) -> Vec<Candidate> {
        let at_line_start = self.cursor == 0 || self.buffer[self.cursor - 1] == b'\n';
        let exclusive = self.is_exclusive(self.condition);
        let remaining = &self.buffer[self.cursor..];
        let mut candidates = self
            .rules
            .iter()
            .filter(|rule| rule.is_active(self.condition, exclusive, at_line_start))
            .filter_map(|rule| {
                rule.find_at_start(remaining)
                    .map(|(primary_len, combined_len)| Candidate {
                        rule: rule.index,
                        action: rule.action,
                        primary_len,
                        combined_len,
                    })
            })
            .collect::<Vec<_>>();
        candidates.sort_by(|a, b| {
            b.combined_len
                .cmp(&a.combined_len)
                .then_with(|| a.rule.cmp(&b.rule))
        });
        candidates
    }

    /// Consumes the primary match of the candidate and runs its action.
    /// A rejected match is undone completely, also when the action failed to write its output.
    fn fire(&mut self, candidate: Candidate) -> std::io::Result<ActionOutcome> {
        let start = self.cursor;
        let end = start + candidate.primary_len;
        self.text_mark = self.text.len();
        self.text.extend_from_slice(&self.buffer[start..end]);
        self.match_start = start;
        self.match_len = candidate.primary_len;
        self.cursor = end;
        self.reset_text = true;
        trace!(
            "Rule {} matched {} bytes ({} with trailing context) at offset {}",
            candidate.rule,
            candidate.primary_len,
            candidate.combined_len,
            start
        );

        let outcome = (candidate.action)(self);
        if outcome == ActionOutcome::Reject {
            trace!("Rule {} rejected", candidate.rule);
            self.text.truncate(self.text_mark);
            self.cursor = self.match_start;
        }
        if let Some(error) = self.output_error.take() {
            return Err(error);
        }
        Ok(outcome)
    }

    /// Copies one byte of unmatched input to the output.
    fn pass_through(&mut self) -> std::io::Result<()> {
        let byte = self.buffer[self.cursor];
        self.cursor += 1;
        self.text.push(byte);
        self.reset_text = true;
        trace!("No rule matched, passing {:?} through", byte as char);
        self.output.write_all(&self.text)
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("rules", &self.rules)
            .field("exclusive", &self.exclusive)
            .field("cursor", &self.cursor)
            .field("text", &self.yytext())
            .field("condition", &self.condition)
            .finish()
    }
}
