// Runs the scanners that the build script generated from the scenario specifications.
// Run with `cargo test --test generated_scanner_test`

use std::{cell::RefCell, io::Write, rc::Rc};

include!(concat!(env!("OUT_DIR"), "/longest.rs"));
include!(concat!(env!("OUT_DIR"), "/trailing.rs"));
include!(concat!(env!("OUT_DIR"), "/reject.rs"));
include!(concat!(env!("OUT_DIR"), "/reject_all.rs"));
include!(concat!(env!("OUT_DIR"), "/conditions.rs"));
include!(concat!(env!("OUT_DIR"), "/buffer.rs"));
include!(concat!(env!("OUT_DIR"), "/inline.rs"));
include!(concat!(env!("OUT_DIR"), "/echo.rs"));
include!(concat!(env!("OUT_DIR"), "/order_ab.rs"));
include!(concat!(env!("OUT_DIR"), "/order_ba.rs"));

/// An output that can be inspected after the scanner took ownership of it.
#[derive(Debug, Default, Clone)]
struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Scans the whole input. Returns the tokens with their texts and the output.
macro_rules! scan {
    ($scanner:ident, $input:expr) => {{
        let _ = env_logger::builder().is_test(true).try_init();
        let output = SharedOutput::default();
        let mut scanner = $scanner::yy_scanner_builder()
            .build($input.as_bytes(), output.clone())
            .unwrap();
        let mut tokens = Vec::new();
        loop {
            let token = scanner.yylex().unwrap();
            if token == $scanner::END_OF_INPUT {
                break;
            }
            tokens.push((token, scanner.yytext().into_owned()));
        }
        (tokens, output.contents())
    }};
}

fn tokens(expected: &[(i32, &str)]) -> Vec<(i32, String)> {
    expected
        .iter()
        .map(|(token, text)| (*token, text.to_string()))
        .collect()
}

#[test]
fn test_longest_match_wins() {
    let (scanned, output) = scan!(longest, "aaa");
    assert_eq!(scanned, tokens(&[(1, "aaa")]));
    assert_eq!(output, "");
}

#[test]
fn test_unmatched_input_passes_through() {
    let (scanned, output) = scan!(longest, "baab");
    assert_eq!(scanned, tokens(&[(1, "aa")]));
    assert_eq!(output, "bb");
}

#[test]
fn test_trailing_context_is_not_consumed() {
    let (scanned, output) = scan!(trailing, "abc");
    assert_eq!(scanned, tokens(&[(1, "ab")]));
    assert_eq!(output, "c");
}

#[test]
fn test_missing_trailing_context() {
    let (scanned, output) = scan!(trailing, "abd");
    assert!(scanned.is_empty());
    assert_eq!(output, "abd");
}

#[test]
fn test_reject_to_equal_length_rule() {
    let (scanned, output) = scan!(reject, "keyword other");
    assert_eq!(scanned, tokens(&[(2, "keyword"), (1, "other")]));
    assert_eq!(output, " ");
}

#[test]
fn test_reject_to_shorter_rule() {
    let (scanned, output) = scan!(reject, "42");
    assert_eq!(scanned, tokens(&[(3, "4"), (3, "2")]));
    assert_eq!(output, "");
}

#[test]
fn test_reject_falls_back_to_passthrough() {
    let (scanned, output) = scan!(reject_all, "xxyx");
    assert!(scanned.is_empty());
    assert_eq!(output, "xxyx");
}

#[test]
fn test_exclusive_start_condition() {
    let (scanned, output) = scan!(conditions, "ab\"cd ef\"\n");
    assert_eq!(
        scanned,
        tokens(&[
            (14, "ab"),
            (10, "\""),
            (11, "cd ef"),
            (12, "\""),
            (13, "\n")
        ])
    );
    assert_eq!(output, "");
}

#[test]
fn test_exclusive_start_condition_ignores_rules_without_conditions() {
    let (scanned, _) = scan!(conditions, "\"abc\"");
    // `[a-z]+` would win in an inclusive start condition.
    assert_eq!(scanned, tokens(&[(10, "\""), (11, "abc"), (12, "\"")]));
}

#[test]
fn test_inclusive_start_condition() {
    let (scanned, output) = scan!(conditions, "12@12 x\n");
    assert_eq!(
        scanned,
        tokens(&[(15, "12"), (14, "x"), (13, "\n")])
    );
    // `[0-9]+` is only active in TAG.
    assert_eq!(output, "12 ");
}

#[test]
fn test_line_start_anchor() {
    let (scanned, output) = scan!(buffer, "#abc\n#d a#b");
    assert_eq!(
        scanned,
        tokens(&[(20, "#abc"), (20, "#d"), (22, "a"), (22, "b")])
    );
    assert_eq!(output, "#");
}

#[test]
fn test_yyless() {
    let (scanned, _) = scan!(buffer, "lessons");
    assert_eq!(scanned, tokens(&[(21, "less"), (22, "ons")]));
}

#[test]
fn test_yymore() {
    let (scanned, _) = scan!(buffer, "more-over");
    assert_eq!(scanned, tokens(&[(22, "more-over")]));
}

#[test]
fn test_unput() {
    let (scanned, _) = scan!(buffer, "!ab");
    assert_eq!(scanned, tokens(&[(23, "!"), (22, "yxab")]));
}

#[test]
fn test_input() {
    let (scanned, output) = scan!(buffer, "?z?");
    assert_eq!(scanned, tokens(&[(i32::from(b'z'), "?"), (-1, "?")]));
    assert_eq!(output, "");
}

#[test]
fn test_action_inline_runs_first() {
    let (scanned, _) = scan!(inline, "abc def");
    assert_eq!(scanned, tokens(&[(30, "abc"), (30, "def")]));
}

#[test]
fn test_echo_and_output() {
    let (scanned, output) = scan!(echo, "a1 x22\n");
    assert!(scanned.is_empty());
    assert_eq!(output, "a11 <x>2222\n");
    assert_eq!(echo::rule_count(), 3);
}

#[test]
fn test_rule_order_breaks_ties() {
    let (scanned, _) = scan!(order_ab, "abc");
    assert_eq!(scanned, tokens(&[(1, "abc")]));
    let (scanned, _) = scan!(order_ba, "abc");
    assert_eq!(scanned, tokens(&[(2, "abc")]));
}

#[test]
fn test_rule_order_does_not_change_longest_match() {
    for input in ["abcd", "ab", "abcdefg hi"] {
        assert_eq!(scan!(order_ab, input), scan!(order_ba, input), "{input}");
    }
}

#[test]
fn test_start_condition_constants() {
    assert_eq!(conditions::INITIAL, 0);
    assert_eq!(conditions::STR, 1);
    assert_eq!(conditions::TAG, 2);
    assert_eq!(
        conditions::YY_START_CONDITIONS,
        &[(0, false), (1, true), (2, false)]
    );
}

#[test]
fn test_scanner_is_resumable() {
    let mut scanner = longest::yy_scanner_builder()
        .build("aa b aaa".as_bytes(), std::io::sink())
        .unwrap();
    assert_eq!(scanner.yylex().unwrap(), 1);
    assert_eq!(scanner.yytext(), "aa");
    assert_eq!(scanner.yylex().unwrap(), 1);
    assert_eq!(scanner.yytext(), "aaa");
    assert_eq!(scanner.yylex().unwrap(), longest::END_OF_INPUT);
    assert_eq!(scanner.yylex().unwrap(), longest::END_OF_INPUT);
}
