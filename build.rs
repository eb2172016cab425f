// Generates the scanners the integration tests run.
//
// The scenario scanners are defined here. The data scanners are read from the JSON
// specifications in `tests/data`.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use rslex_generate::{Generator, LexRule, Specification};

type BuildResult<T> = Result<T, Box<dyn std::error::Error>>;

fn scenario_scanners() -> Vec<Specification> {
    vec![
        Specification::new("longest")
            .add_rule(LexRule::new("a+", "return 1;"))
            .add_rule(LexRule::new("a", "ECHO;")),
        Specification::new("trailing")
            .add_rule(LexRule::new("ab", "return 1;").with_trailing_pattern("c")),
        Specification::new("reject")
            .add_rule(LexRule::new(
                "[a-z]+",
                r#"if yy.text() == b"keyword" { REJECT; } return 1;"#,
            ))
            .add_rule(LexRule::new("keyword", "return 2;"))
            .add_rule(LexRule::new("[0-9]+", "REJECT;"))
            .add_rule(LexRule::new("[0-9]", "return 3;")),
        Specification::new("reject_all").add_rule(LexRule::new("x+", "REJECT;")),
        Specification::new("conditions")
            .declare_start_condition("STR", true)
            .declare_start_condition("TAG", false)
            .add_rule(LexRule::new(r#"""#, "BEGIN(STR); return 10;"))
            .add_rule(LexRule::new(r#"[^"\n]+"#, "return 11;").with_start_conditions(["STR"]))
            .add_rule(
                LexRule::new(r#"""#, "BEGIN(INITIAL); return 12;").with_start_conditions(["STR"]),
            )
            .add_rule(LexRule::new(r"\n", "return 13;").with_start_conditions(["*"]))
            .add_rule(LexRule::new("[a-z]+", "return 14;"))
            .add_rule(LexRule::new("[0-9]+", "return 15;").with_start_conditions(["TAG"]))
            .add_rule(LexRule::new("@", "BEGIN(TAG);")),
        Specification::new("buffer")
            .add_rule(LexRule::new("^#[a-z]*", "return 20;"))
            .add_rule(LexRule::new("less[a-z]*", "yy.yyless(4); return 21;"))
            .add_rule(LexRule::new("more-", "yy.yymore();"))
            .add_rule(LexRule::new("[a-z]+", "return 22;"))
            .add_rule(LexRule::new("!", "yy.unput(b'x'); yy.unput(b'y'); return 23;"))
            .add_rule(LexRule::new(
                r"\?",
                "let next = yy.input(); return next.map_or(-1, i32::from);",
            ))
            .add_rule(LexRule::new(r"[ \n]", "")),
        Specification::new("inline")
            .declare_start_condition("LOUD", true)
            .with_action_inline("BEGIN(LOUD);")
            .add_rule(LexRule::new("[a-z]+", "return 30;").with_start_conditions(["LOUD"]))
            .add_rule(LexRule::new("[a-z]+", "return 31;")),
        Specification::new("echo")
            .with_prologue("use std::io::Write;")
            .with_epilogue(
                "/// The number of rules of this scanner.\npub fn rule_count() -> usize {\n    YY_RULES.len()\n}",
            )
            .add_rule(LexRule::new("[0-9]+", "ECHO; ECHO;"))
            .add_rule(LexRule::new(r"\s", "ECHO;"))
            .add_rule(LexRule::new("x", r#"let _ = yy.output().write_all(b"<x>");"#)),
        Specification::new("order_ab")
            .add_rule(LexRule::new("[a-z]+", "return 1;"))
            .add_rule(LexRule::new("[a-z]{3}", "return 2;")),
        Specification::new("order_ba")
            .add_rule(LexRule::new("[a-z]{3}", "return 2;"))
            .add_rule(LexRule::new("[a-z]+", "return 1;")),
    ]
}

fn data_scanners(data_dir: &Path) -> BuildResult<Vec<Specification>> {
    let mut paths = fs::read_dir(data_dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    paths.retain(|path| path.extension().is_some_and(|ext| ext == "json"));
    paths.sort();
    paths
        .iter()
        .map(|path| -> BuildResult<Specification> {
            println!("cargo:rerun-if-changed={}", path.display());
            let json = fs::read_to_string(path)?;
            Ok(Specification::from_json(&json)?)
        })
        .collect()
}

fn write_scanner(specification: &Specification, out_dir: &Path) -> BuildResult<()> {
    Generator::new(specification)
        .wrap_in_module(true)
        .format_output(false)
        .write_to_file(out_dir.join(format!("{}.rs", specification.package_name)))?;
    Ok(())
}

fn main() -> BuildResult<()> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/scanner.rs");
    println!("cargo:rerun-if-changed=tests/data");

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let data_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?).join("tests/data");

    for specification in scenario_scanners() {
        write_scanner(&specification, &out_dir)?;
    }

    // The data scanners are dispatched by name. The macro `scan!` is defined by the including
    // test.
    let mut code = String::new();
    let mut dispatch = String::new();
    for specification in data_scanners(&data_dir)? {
        write_scanner(&specification, &out_dir)?;
        let name = &specification.package_name;
        code.push_str(&format!(
            "include!(concat!(env!(\"OUT_DIR\"), \"/{name}.rs\"));\n"
        ));
        dispatch.push_str(&format!("        \"{name}\" => scan!({name}, input),\n"));
    }
    code.push_str(
        "\nfn scan_with_data_scanner(name: &str, input: &str) -> (Vec<(i32, String)>, String) {\n",
    );
    code.push_str("    match name {\n");
    code.push_str(&dispatch);
    code.push_str("        _ => panic!(\"No scanner was generated for {name}\"),\n");
    code.push_str("    }\n}\n");
    fs::write(out_dir.join("data_scanners.rs"), code)?;
    Ok(())
}
