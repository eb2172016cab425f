use std::path::Path;

use log::debug;

use crate::{emitter::CodeEmitter, rust_code_formatter::try_format, Result, Specification};

/// Generates the scanner program for the given specification.
///
/// The program is not wrapped in a module, so it can be used as a complete source file.
/// Use [Generator] for more control over the output.
///
/// ```
/// use rslex_generate::{generate, LexRule, Specification};
///
/// let specification = Specification::new("words")
///     .add_rule(LexRule::new(r"[a-z]+", "return 1;"))
///     .add_rule(LexRule::new(r"\s+", ""));
/// let code = generate(&specification).unwrap();
/// assert!(code.contains("pub fn yy_scanner_builder() -> ScannerBuilder"));
/// ```
pub fn generate(specification: &Specification) -> Result<String> {
    Generator::new(specification).generate()
}

/// A configurable scanner generator.
///
/// ```no_run
/// use rslex_generate::{Generator, LexRule, Specification};
///
/// let specification = Specification::new("numbers").add_rule(LexRule::new("[0-9]+", "return 1;"));
/// Generator::new(&specification)
///     .wrap_in_module(true)
///     .write_to_file("numbers.rs")
///     .unwrap();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Generator<'a> {
    specification: &'a Specification,
    wrap_in_module: bool,
    format_output: bool,
}

impl<'a> Generator<'a> {
    /// Create a new generator for the specification.
    /// By default the output is not wrapped in a module, and written files are formatted.
    pub fn new(specification: &'a Specification) -> Self {
        Self {
            specification,
            wrap_in_module: false,
            format_output: true,
        }
    }

    /// Wrap the program in a module named after the package.
    /// This allows several scanners in one crate.
    pub fn wrap_in_module(mut self, wrap_in_module: bool) -> Self {
        self.wrap_in_module = wrap_in_module;
        self
    }

    /// Format written files with `rustfmt`.
    pub fn format_output(mut self, format_output: bool) -> Self {
        self.format_output = format_output;
        self
    }

    /// Generate the program.
    pub fn generate(&self) -> Result<String> {
        CodeEmitter::new(self.specification, self.wrap_in_module).emit()
    }

    /// Generate the program and write it to the given file.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let code = self.generate()?;
        let path = path.as_ref();
        std::fs::write(path, code)?;
        debug!("Wrote scanner '{}' to {}", self.specification.package_name, path.display());
        if self.format_output {
            try_format(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LexRule;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_generate_is_deterministic() {
        init();
        let specification = Specification::new("det")
            .declare_start_condition("C", false)
            .declare_start_condition("B", true)
            .declare_start_condition("A", false)
            .add_rule(LexRule::new("x", "ECHO;").with_start_conditions(["A", "B"]));
        let first = generate(&specification).unwrap();
        for _ in 0..5 {
            assert_eq!(generate(&specification).unwrap(), first);
        }
        assert!(first.contains("start_conditions: &[3, 2],"));
    }

    #[test]
    fn test_write_to_file() {
        init();
        let specification =
            Specification::new("file").add_rule(LexRule::new("[0-9]+", "return 1;"));
        let generator = Generator::new(&specification)
            .wrap_in_module(true)
            .format_output(false);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.rs");
        generator.write_to_file(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, generator.generate().unwrap());
        assert!(written.contains("pub mod file {"));
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        init();
        let specification = Specification::new("file");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("file.rs");
        let error = Generator::new(&specification)
            .format_output(false)
            .write_to_file(path)
            .unwrap_err();
        assert!(matches!(error.kind(), crate::RslexErrorKind::IoError(_)));
    }
}
