//! Module with the code emitter that writes the scanner program.
use std::fmt::Write;

use log::{debug, trace, warn};
use proc_macro2::TokenStream;

use crate::{
    action::transform_action, encode_pattern, specification::WILDCARD, LexRule, Result,
    RslexError, RslexErrorKind, Specification,
};

/// The source of the scanner runtime. It is embedded into every generated scanner.
pub const RUNTIME_SOURCE: &str = include_str!("../../src/scanner.rs");

/// Names that the generated scanner defines or imports from its runtime.
const RESERVED_NAMES: &[&str] = &[
    "ANY_START_CONDITION",
    "END_OF_INPUT",
    "StartCondition",
    "ActionOutcome",
    "Action",
    "InlineAction",
    "ScannerError",
    "ScannerRule",
    "ScannerBuilder",
    "Scanner",
    "YY_START_CONDITIONS",
    "YY_RULES",
    "yy_action_inline",
    "yy_scanner_builder",
    "yy_runtime",
    "yy",
    "BEGIN",
];

/// The sentinel for rules that are active in all start conditions, as emitted into rule tables.
const ANY_START_CONDITION_PATH: &str = "self::yy_runtime::ANY_START_CONDITION";

/// A rule that passed validation, ready to be written.
#[derive(Debug)]
struct PreparedRule<'a> {
    rule: &'a LexRule,
    pattern: String,
    trailing: Option<String>,
    start_conditions: Vec<String>,
    action: TokenStream,
}

/// Writes the scanner program for a specification.
///
/// The emitter validates the whole specification before it writes anything. It emits in this
/// order:
/// 1. header, and the opening of the module if the output is wrapped in a module
/// 2. the prologue
/// 3. the runtime as module `yy_runtime`
/// 4. one constant per start condition
/// 5. the exclusive flags of the start conditions `YY_START_CONDITIONS`
/// 6. the rule table `YY_RULES`
/// 7. the inline action `yy_action_inline`
/// 8. the function `yy_scanner_builder`
/// 9. the epilogue, and the end of the module
#[derive(Debug)]
pub(crate) struct CodeEmitter<'a> {
    specification: &'a Specification,
    wrap_in_module: bool,
}

impl<'a> CodeEmitter<'a> {
    pub(crate) fn new(specification: &'a Specification, wrap_in_module: bool) -> Self {
        Self {
            specification,
            wrap_in_module,
        }
    }

    pub(crate) fn emit(&self) -> Result<String> {
        debug!(
            "Generating scanner '{}' with {} rules",
            self.specification.package_name,
            self.specification.rules.len()
        );
        self.check_identifiers()?;
        let rules = self
            .specification
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| self.prepare_rule(index, rule))
            .collect::<Result<Vec<_>>>()?;
        let action_inline = self.prepare_action_inline()?;

        let mut out = String::new();
        self.emit_header(&mut out)?;
        out.push_str(&self.specification.prologue);
        out.push('\n');
        self.emit_runtime(&mut out)?;
        self.emit_start_conditions(&mut out)?;
        Self::emit_rules(&mut out, &rules)?;
        Self::emit_action_inline(&mut out, &action_inline)?;
        Self::emit_builder(&mut out)?;
        out.push_str(&self.specification.epilogue);
        out.push('\n');
        if self.wrap_in_module {
            writeln!(out, "}}")?;
        }
        debug!(
            "Generated {} bytes for scanner '{}'",
            out.len(),
            self.specification.package_name
        );
        Ok(out)
    }

    fn check_identifiers(&self) -> Result<()> {
        check_identifier(&self.specification.package_name)?;
        let start_conditions = self.specification.start_conditions_by_ordinal();
        for (name, def) in &start_conditions {
            check_identifier(name)?;
            if RESERVED_NAMES.contains(name) {
                return Err(RslexError::new(RslexErrorKind::ReservedIdentifier(
                    name.to_string(),
                )));
            }
            if def.ordinal < 0 {
                return Err(RslexError::new(RslexErrorKind::NegativeOrdinal(
                    name.to_string(),
                    def.ordinal,
                )));
            }
        }
        for pair in start_conditions.windows(2) {
            let ((name1, def1), (name2, def2)) = (pair[0], pair[1]);
            if def1.ordinal == def2.ordinal {
                return Err(RslexError::new(RslexErrorKind::DuplicateOrdinal(
                    name1.to_string(),
                    name2.to_string(),
                    def1.ordinal,
                )));
            }
        }
        Ok(())
    }

    fn prepare_rule<'r>(&self, index: usize, rule: &'r LexRule) -> Result<PreparedRule<'r>> {
        trace!("Preparing rule {}: {:?}", index, rule.pattern);
        let pattern = checked_pattern_literal(index, &rule.pattern)?;
        let trailing = rule
            .trailing_pattern
            .as_deref()
            .map(|trailing| checked_pattern_literal(index, trailing))
            .transpose()?;
        let mut start_conditions = rule
            .start_conditions
            .iter()
            .filter(|name| *name != WILDCARD)
            .map(|name| {
                self.specification
                    .start_condition(name)
                    .map(|def| def.ordinal.to_string())
                    .ok_or_else(|| {
                        RslexError::new(RslexErrorKind::UnknownStartCondition {
                            rule: index,
                            name: name.clone(),
                        })
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        if rule.is_active_everywhere() {
            start_conditions = vec![ANY_START_CONDITION_PATH.to_string()];
        }
        let action = transform_action(&rule.action).map_err(|source| {
            RslexError::new(RslexErrorKind::SpecSyntaxError {
                rule: index,
                pattern: rule.pattern.clone(),
                source,
            })
        })?;
        Ok(PreparedRule {
            rule,
            pattern,
            trailing,
            start_conditions,
            action,
        })
    }

    fn prepare_action_inline(&self) -> Result<TokenStream> {
        let block: syn::Block =
            syn::parse_str(&format!("{{\n{}\n}}", self.specification.action_inline))
                .map_err(|e| RslexError::new(RslexErrorKind::InlineActionSyntaxError(e)))?;
        Ok(quote::quote!(#block))
    }

    fn emit_header(&self, out: &mut String) -> Result<()> {
        writeln!(
            out,
            "// Generated by rslex_generate {}. Do not edit.",
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(out, "// Scanner: {}", self.specification.package_name)?;
        writeln!(out)?;
        if self.wrap_in_module {
            writeln!(out, "#[allow(dead_code, clippy::all)]")?;
            writeln!(out, "pub mod {} {{", self.specification.package_name)?;
        }
        Ok(())
    }

    fn emit_runtime(&self, out: &mut String) -> Result<()> {
        writeln!(out, "#[allow(dead_code)]")?;
        writeln!(out, "pub mod yy_runtime {{")?;
        out.push_str(RUNTIME_SOURCE);
        writeln!(out, "}}")?;
        writeln!(out, "pub use self::yy_runtime::*;")?;
        writeln!(out)?;
        Ok(())
    }

    fn emit_start_conditions(&self, out: &mut String) -> Result<()> {
        let start_conditions = self.specification.start_conditions_by_ordinal();
        for (name, def) in &start_conditions {
            writeln!(out, "#[allow(dead_code, non_upper_case_globals)]")?;
            writeln!(out, "pub const {}: StartCondition = {};", name, def.ordinal)?;
        }
        writeln!(out)?;
        write!(
            out,
            "pub static YY_START_CONDITIONS: &[(StartCondition, bool)] = &["
        )?;
        for (_, def) in &start_conditions {
            write!(out, "({}, {}), ", def.ordinal, def.exclusive)?;
        }
        writeln!(out, "];")?;
        writeln!(out)?;
        Ok(())
    }

    fn emit_rules(out: &mut String, rules: &[PreparedRule<'_>]) -> Result<()> {
        writeln!(out, "pub static YY_RULES: &[ScannerRule] = &[")?;
        for (index, prepared) in rules.iter().enumerate() {
            trace!("Emitting rule {}", index);
            writeln!(out, "    // Rule {}: {:?}", index, prepared.rule.pattern)?;
            writeln!(out, "    ScannerRule {{")?;
            writeln!(out, "        pattern: {},", prepared.pattern)?;
            match &prepared.trailing {
                Some(trailing) => writeln!(out, "        trailing: Some({}),", trailing)?,
                None => writeln!(out, "        trailing: None,")?,
            }
            writeln!(
                out,
                "        start_conditions: &[{}],",
                prepared.start_conditions.join(", ")
            )?;
            writeln!(
                out,
                "        line_start: {},",
                prepared.rule.is_line_start_anchored()
            )?;
            writeln!(out, "        action: {},", prepared.action)?;
            writeln!(out, "    }},")?;
        }
        writeln!(out, "];")?;
        writeln!(out)?;
        Ok(())
    }

    fn emit_action_inline(out: &mut String, action_inline: &TokenStream) -> Result<()> {
        writeln!(
            out,
            "#[allow(non_snake_case, unused_variables, unused_mut, clippy::let_unit_value)]"
        )?;
        writeln!(
            out,
            "pub fn yy_action_inline(BEGIN: &mut dyn FnMut(StartCondition)) {{"
        )?;
        writeln!(out, "    let _ = {};", action_inline)?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        Ok(())
    }

    fn emit_builder(out: &mut String) -> Result<()> {
        writeln!(
            out,
            r#"/// Creates a scanner builder that is populated with the tables of this scanner.
pub fn yy_scanner_builder() -> ScannerBuilder {{
    ScannerBuilder::new()
        .add_rules(YY_RULES)
        .add_start_conditions(YY_START_CONDITIONS)
        .action_inline(yy_action_inline)
}}
"#
        )?;
        Ok(())
    }
}

fn check_identifier(name: &str) -> Result<()> {
    syn::parse_str::<syn::Ident>(name)
        .map(|_| ())
        .map_err(|_| RslexError::new(RslexErrorKind::InvalidIdentifier(name.to_string())))
}

/// Encodes a pattern and checks that the regex engine accepts the encoded pattern.
fn checked_pattern_literal(index: usize, pattern: &str) -> Result<String> {
    if pattern.is_empty() {
        return Err(RslexError::new(RslexErrorKind::EmptyPattern { rule: index }));
    }
    let literal = encode_pattern(pattern);
    let decoded = syn::parse_str::<syn::LitStr>(&literal)
        .map_err(|e| RslexError::new(RslexErrorKind::InvalidPatternLiteral(literal.clone(), e)))?
        .value();
    let hir = regex_syntax::Parser::new()
        .parse(&decoded)
        .map_err(|e| RslexError::new(RslexErrorKind::RegexSyntaxError(e, pattern.to_string())))?;
    if hir.properties().minimum_len() == Some(0) {
        warn!(
            "Pattern '{}' of rule {} matches the empty string. Empty matches are ignored.",
            pattern, index
        );
    }
    Ok(literal)
}
