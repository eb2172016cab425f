//! Module that transforms the action code of rules into action functions.
//!
//! Action code may use the control verbs of lex:
//! * `ECHO;` writes the matched text to the output,
//! * `REJECT;` hands the match over to the next best rule,
//! * `BEGIN(condition);` switches the start condition,
//! * `return value;` makes the scanner return `value`.
//!
//! The scanner is available as `yy`.
use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    parse_quote,
    visit_mut::{self, VisitMut},
    Block, Expr, ExprCall, ExprReturn, Item, Stmt,
};

/// Transforms action code into an expression that evaluates to an action function of type
/// `fn(&mut Scanner) -> ActionOutcome`.
///
/// The expression refers to `Scanner` and `ActionOutcome`, which must be in scope where it is
/// placed.
pub fn transform_action(code: &str) -> syn::Result<TokenStream> {
    let block = rewrite_block(code)?;
    Ok(quote! {
        {
            #[allow(
                unreachable_code,
                unused_variables,
                unused_mut,
                clippy::let_unit_value,
                clippy::needless_return
            )]
            fn action(yy: &mut Scanner) -> ActionOutcome {
                let _ = #block;
                ActionOutcome::Fallthrough
            }
            action
        }
    })
}

/// Parses the code as block and rewrites the control verbs in it.
pub(crate) fn rewrite_block(code: &str) -> syn::Result<Block> {
    let mut block: Block = syn::parse_str(&format!("{{\n{code}\n}}"))?;
    let mut rewriter = VerbRewriter::default();
    rewriter.visit_block_mut(&mut block);
    match rewriter.error {
        Some(error) => Err(error),
        None => Ok(block),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Echo,
    Reject,
}

/// Rewrites the control verbs.
///
/// Closures have their own `return`, so returns inside them are left alone. `REJECT` inside a
/// closure can't leave the action and is reported as error.
#[derive(Debug, Default)]
struct VerbRewriter {
    closure_depth: usize,
    error: Option<syn::Error>,
}

impl VerbRewriter {
    #[inline]
    fn in_closure(&self) -> bool {
        self.closure_depth > 0
    }
}

impl VisitMut for VerbRewriter {
    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        if let Stmt::Expr(expr, _) = stmt {
            match bare_verb(expr) {
                Some(Verb::Echo) => {
                    *expr = parse_quote!(yy.echo());
                    return;
                }
                Some(Verb::Reject) => {
                    if self.in_closure() {
                        if self.error.is_none() {
                            self.error = Some(syn::Error::new_spanned(
                                &*expr,
                                "REJECT can't be used inside a closure or async block",
                            ));
                        }
                    } else {
                        *expr = parse_quote!(return ActionOutcome::Reject);
                    }
                    return;
                }
                None => {}
            }
        }
        visit_mut::visit_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if matches!(expr, Expr::Closure(_) | Expr::Async(_)) {
            self.closure_depth += 1;
            visit_mut::visit_expr_mut(self, expr);
            self.closure_depth -= 1;
            return;
        }

        visit_mut::visit_expr_mut(self, expr);

        let replacement = match expr {
            Expr::Call(call) => {
                begin_argument(call).map(|condition| parse_quote!(yy.begin(#condition)))
            }
            Expr::Return(ret) if !self.in_closure() => rewrite_return(ret),
            _ => None,
        };
        if let Some(replacement) = replacement {
            *expr = replacement;
        }
    }

    // Nested items are not part of the action.
    fn visit_item_mut(&mut self, _item: &mut Item) {}
}

fn bare_verb(expr: &Expr) -> Option<Verb> {
    let Expr::Path(path) = expr else {
        return None;
    };
    if path.qself.is_some() || !path.attrs.is_empty() {
        return None;
    }
    let ident = path.path.get_ident()?;
    if ident == "ECHO" {
        Some(Verb::Echo)
    } else if ident == "REJECT" {
        Some(Verb::Reject)
    } else {
        None
    }
}

fn begin_argument(call: &ExprCall) -> Option<&Expr> {
    let Expr::Path(func) = call.func.as_ref() else {
        return None;
    };
    if func.qself.is_none() && func.path.is_ident("BEGIN") && call.args.len() == 1 {
        call.args.first()
    } else {
        None
    }
}

fn rewrite_return(ret: &ExprReturn) -> Option<Expr> {
    match &ret.expr {
        None => Some(parse_quote!(return ActionOutcome::Fallthrough)),
        Some(value) if is_tagged_outcome(value) => None,
        Some(value) => Some(parse_quote!(return ActionOutcome::Return(#value))),
    }
}

/// Checks for `ActionOutcome::Variant` and `ActionOutcome::Variant(..)`, with any path prefix.
fn is_tagged_outcome(expr: &Expr) -> bool {
    let path = match expr {
        Expr::Path(path) => &path.path,
        Expr::Call(call) => match call.func.as_ref() {
            Expr::Path(path) => &path.path,
            _ => return false,
        },
        _ => return false,
    };
    let segments = path.segments.iter().collect::<Vec<_>>();
    segments.len() >= 2 && segments[segments.len() - 2].ident == "ActionOutcome"
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::ToTokens;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn rewritten(code: &str) -> String {
        rewrite_block(code).unwrap().into_token_stream().to_string()
    }

    #[rstest]
    #[case::echo("ECHO;", quote! { { yy.echo(); } })]
    #[case::echo_tail("ECHO", quote! { { yy.echo() } })]
    #[case::reject("REJECT;", quote! { { return ActionOutcome::Reject; } })]
    #[case::begin("BEGIN(STR);", quote! { { yy.begin(STR); } })]
    #[case::begin_expression("BEGIN(if a { X } else { Y });", quote! { { yy.begin(if a { X } else { Y }); } })]
    #[case::return_value("return 1;", quote! { { return ActionOutcome::Return(1); } })]
    #[case::bare_return("return;", quote! { { return ActionOutcome::Fallthrough; } })]
    #[case::tagged_return(
        "return ActionOutcome::Reject;",
        quote! { { return ActionOutcome::Reject; } }
    )]
    #[case::tagged_return_with_value(
        "return yy_runtime::ActionOutcome::Return(3);",
        quote! { { return yy_runtime::ActionOutcome::Return(3); } }
    )]
    #[case::nested(
        "if yy.yyleng() > 2 { ECHO; } else { REJECT }",
        quote! { { if yy.yyleng() > 2 { yy.echo(); } else { return ActionOutcome::Reject } } }
    )]
    #[case::loop_with_begin(
        "for _ in 0..2 { BEGIN(A); } return 7;",
        quote! { { for _ in 0..2 { yy.begin(A); } return ActionOutcome::Return(7); } }
    )]
    #[case::closure(
        "let f = |x: i32| { return x + 1; }; return f(1);",
        quote! { { let f = |x: i32| { return x + 1; }; return ActionOutcome::Return(f(1)); } }
    )]
    #[case::echo_in_closure(
        "let mut f = |yy: &mut Scanner| { ECHO; }; f(yy);",
        quote! { { let mut f = |yy: &mut Scanner| { yy.echo(); }; f(yy); } }
    )]
    #[case::nested_item(
        "fn helper() -> i32 { return 3; } return helper();",
        quote! { { fn helper() -> i32 { return 3; } return ActionOutcome::Return(helper()); } }
    )]
    #[case::verb_as_value("let x = ECHO;", quote! { { let x = ECHO; } })]
    fn test_rewrite_verbs(#[case] code: &str, #[case] expected: TokenStream) {
        init();
        assert_eq!(rewritten(code), expected.to_string(), "code: {code}");
    }

    #[test]
    fn test_transform_action() {
        init();
        let tokens = transform_action("return 42;").unwrap();
        let expr: Expr = syn::parse2(tokens).unwrap();
        let Expr::Block(block) = expr else {
            panic!("expected a block expression");
        };
        assert_eq!(block.block.stmts.len(), 2);
        let Stmt::Item(Item::Fn(function)) = &block.block.stmts[0] else {
            panic!("expected the action function");
        };
        assert_eq!(function.sig.ident, "action");
        assert_eq!(
            function.sig.output.to_token_stream().to_string(),
            quote!(-> ActionOutcome).to_string()
        );
        let body = function.block.to_token_stream().to_string();
        assert!(body.contains(&quote!(return ActionOutcome::Return(42);).to_string()));
        let Some(Stmt::Expr(last, None)) = function.block.stmts.last() else {
            panic!("expected a tail expression");
        };
        assert_eq!(
            last.to_token_stream().to_string(),
            quote!(ActionOutcome::Fallthrough).to_string()
        );
    }

    #[test]
    fn test_empty_action() {
        init();
        assert!(transform_action("").is_ok());
        assert!(transform_action("  // nothing to do\n").is_ok());
    }

    #[rstest]
    #[case::unbalanced("return (;")]
    #[case::unclosed_block("if x {")]
    #[case::stray_brace("}")]
    #[case::reject_in_closure("let f = || { REJECT; }; ECHO;")]
    #[case::reject_in_async_block("let f = async { if x { REJECT; } };")]
    fn test_syntax_errors(#[case] code: &str) {
        init();
        assert!(transform_action(code).is_err());
    }

    #[test]
    fn test_reject_in_closure_message() {
        init();
        let error = rewrite_block("ECHO; let f = |x: i32| { REJECT; x };").unwrap_err();
        assert!(error.to_string().contains("REJECT"), "{error}");
    }
}
