// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::any::Any;
use std::collections::BTreeMap;
use std::env;

use anyhow::{bail, Result};
use hcleval::ast::{Block, Expr, Span, Traversal};
use hcleval::schema::BlockSchema;
use hcleval::*;
use serde::{Deserialize, Serialize};
use test_generator::test_resources;

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug)]
struct ExpectedError {
    code: String,
    level: String,
    message: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TestCase {
    note: String,
    variables: Option<Value>,
    // Declared variables without a value.
    unknown: Option<Vec<String>>,
    workspace: Option<String>,
    module_path: Option<String>,
    expr: Option<Expr>,
    block: Option<Block>,
    schema: Option<BlockSchema>,
    want_type: Option<Type>,
    target: String,
    evaluable: Option<bool>,
    want_result: Option<Value>,
    error: Option<ExpectedError>,
    skip: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn context(case: &TestCase) -> Result<StaticContext> {
    let mut ctx = StaticContext::new();
    if let Some(variables) = &case.variables {
        ctx.add_variables(variables.clone())?;
    }
    for name in case.unknown.iter().flatten() {
        ctx.declare_variable(name);
    }
    if let Some(workspace) = &case.workspace {
        ctx.set_workspace(workspace);
    }
    if let Some(path) = &case.module_path {
        ctx.set_module_path(path);
    }
    Ok(ctx)
}

// Evaluates the case into a fresh `T`. On failure the destination must still
// hold its default.
fn eval_into<T>(runner: &Runner, case: &TestCase) -> Result<std::result::Result<Value, Error>>
where
    T: Any + Default + Serialize,
{
    let mut dest = T::default();
    let r = match (&case.expr, &case.block, &case.schema, &case.want_type) {
        (Some(expr), None, None, None) => runner.evaluate_expr(expr, &mut dest),
        (Some(expr), None, None, Some(want)) => runner.evaluate_expr_type(expr, &mut dest, want),
        (None, Some(block), Some(schema), None) => runner.evaluate_block(block, schema, &mut dest),
        _ => bail!("a case needs either expr (with optional want_type) or block and schema"),
    };

    let bound = Value::from_json_str(&serde_json::to_string(&dest)?)?;
    match r {
        Ok(()) => Ok(Ok(bound)),
        Err(e) => {
            let default = Value::from_json_str(&serde_json::to_string(&T::default())?)?;
            if bound != default {
                bail!("destination modified on error: {bound}");
            }
            Ok(Err(e))
        }
    }
}

fn eval_case(runner: &Runner, case: &TestCase) -> Result<std::result::Result<Value, Error>> {
    match case.target.as_str() {
        "string" => eval_into::<String>(runner, case),
        "number" => eval_into::<i64>(runner, case),
        "list(string)" => eval_into::<Vec<String>>(runner, case),
        "list(number)" => eval_into::<Vec<i64>>(runner, case),
        "map(string)" => eval_into::<BTreeMap<String, String>>(runner, case),
        "map(number)" => eval_into::<BTreeMap<String, i64>>(runner, case),
        t => bail!("unsupported target `{t}`"),
    }
}

fn check_evaluable(runner: &Runner, case: &TestCase, expected: bool) -> Result<()> {
    let actual = match (&case.expr, &case.block, &case.schema) {
        (Some(expr), _, _) => runner.is_evaluable_expr(expr)?,
        (None, Some(block), Some(schema)) => runner.is_evaluable_block(&block.body, schema)?,
        _ => bail!("evaluable requires expr or block and schema"),
    };
    if actual != expected {
        bail!("evaluable: expected {expected}, got {actual}");
    }
    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::with::singleton_map_recursive::deserialize(
        serde_yaml::Deserializer::from_str(&yaml_str),
    )?;

    std::eprintln!("running {file}");

    for case in test.cases {
        std::print!("case {} ", case.note);
        if case.skip == Some(true) {
            std::println!("skipped");
            continue;
        }

        let ctx = context(&case)?;
        let runner = Runner::new(&ctx);

        if let Some(expected) = case.evaluable {
            check_evaluable(&runner, &case, expected)?;
        }

        match (&case.want_result, &case.error, eval_case(&runner, &case)?) {
            (Some(expected), None, Ok(actual)) => {
                if expected != &actual {
                    bail!(
                        "result mismatch:\n{}",
                        prettydiff::diff_chars(&expected.to_string(), &actual.to_string())
                    );
                }
            }
            (None, Some(expected), Err(actual)) => {
                let actual = ExpectedError {
                    code: actual.code.to_string(),
                    level: actual.level.to_string(),
                    message: actual.message.clone(),
                };
                if expected != &actual {
                    bail!(
                        "error mismatch:\n{}",
                        prettydiff::diff_chars(&format!("{expected:?}"), &format!("{actual:?}"))
                    );
                }
            }
            (want_result, error, actual) => {
                bail!("failure: want_result = `{want_result:?}` error = `{error:?}` actual = `{actual:?}`")
            }
        }

        std::println!("passed");
    }

    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{e}");
        }
    }
}

#[test_resources("tests/runner/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}

#[test]
#[ignore = "intended for running a single yaml file with logging"]
fn one_yaml() -> Result<()> {
    env_logger::init();

    let file = match env::args().find(|a| a.ends_with(".yaml")) {
        Some(file) => file,
        None => bail!("missing <yaml-file>"),
    };
    yaml_test(&file)
}

fn var(name: &str) -> Expr {
    Expr::traversal(Traversal::new("var").attr(name))
}

fn span(line: u32) -> Span {
    Span::new("main.tf", line, 1)
}

#[test]
fn every_kind_of_reference_is_classified() -> Result<()> {
    let ctx = StaticContext::new();
    let runner = Runner::new(&ctx);

    for root in ["var", "terraform", "path"] {
        let expr = Expr::traversal(Traversal::new(root).attr("x"));
        assert!(runner.is_evaluable_expr(&expr)?, "{root}");
    }

    for parts in [
        vec!["local", "x"],
        vec!["module", "m", "out"],
        vec!["data", "t", "n", "id"],
        vec!["aws_instance", "n", "id"],
        vec!["count", "index"],
        vec!["each", "key"],
        vec!["self", "id"],
    ] {
        let mut t = Traversal::new(parts[0]);
        for p in &parts[1..] {
            t = t.attr(p);
        }
        // A single non-evaluable reference is enough.
        let expr = Expr::template(vec![var("a"), Expr::traversal(t)]);
        assert!(!runner.is_evaluable_expr(&expr)?, "{parts:?}");
    }
    Ok(())
}

#[test]
fn missing_variable_is_an_evaluation_error() {
    let ctx = StaticContext::new();
    let mut s = String::new();
    let err = Runner::new(&ctx)
        .evaluate_expr(&var("missing").at(span(3)), &mut s)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::EvaluationError);
    assert!(err.is_error());
    assert_eq!(err.message, "Failed to eval an expression in main.tf:3");
    assert!(err
        .to_string()
        .contains("Reference to undeclared input variable"));
}

#[test]
fn unknown_and_null_are_warnings() {
    let mut ctx = StaticContext::new();
    ctx.declare_variable("later");
    ctx.set_variable("nothing", Value::Null);
    let runner = Runner::new(&ctx);

    let mut s = "untouched".to_string();
    let err = runner
        .evaluate_expr(&var("later").at(span(5)), &mut s)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownValueError);
    assert!(err.is_warning());
    assert_eq!(s, "untouched");

    let err = runner
        .evaluate_expr(&var("nothing").at(span(6)), &mut s)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NullValueError);
    assert_eq!(err.level, Level::Warning);
    assert_eq!(err.message, "Null value found in main.tf:6");
    assert_eq!(s, "untouched");
}

#[test]
fn block_null_becomes_empty_string() -> Result<()> {
    let ctx = StaticContext::new();
    let schema = BlockSchema::new().with_attribute("Name", Type::String, false);
    let block = ast::Block::new("tags", &[], ast::Body::new()).at(span(10));

    let mut tags = BTreeMap::<String, String>::new();
    Runner::new(&ctx).evaluate_block(&block, &schema, &mut tags)?;
    assert_eq!(tags, BTreeMap::from([("Name".to_string(), String::new())]));
    Ok(())
}

#[test]
fn block_map_conversion() -> Result<()> {
    let ctx = StaticContext::new();
    let runner = Runner::new(&ctx);
    let schema = BlockSchema::new()
        .with_attribute("a", Type::Number, false)
        .with_attribute("b", Type::Number, false);
    let block = ast::Block::new(
        "sizes",
        &[],
        ast::Body::new()
            .with_attribute("a", Expr::literal(1u64))
            .with_attribute("b", Expr::literal(2.5)),
    )
    .at(span(12));

    let mut strings = BTreeMap::<String, String>::new();
    runner.evaluate_block(&block, &schema, &mut strings)?;
    assert_eq!(strings["a"], "1");
    assert_eq!(strings["b"], "2.5");

    let schema = BlockSchema::new()
        .with_attribute("a", Type::Number, false)
        .with_attribute("b", Type::String, false);
    let block = ast::Block::new(
        "sizes",
        &[],
        ast::Body::new()
            .with_attribute("a", Expr::literal(1u64))
            .with_attribute("b", Expr::literal("large")),
    )
    .at(span(20));

    let mut numbers = BTreeMap::<String, i64>::new();
    let err = runner
        .evaluate_block(&block, &schema, &mut numbers)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TypeConversionError);
    assert!(err.is_error());
    assert!(err.message.ends_with("main.tf:20"));
    assert!(numbers.is_empty());
    Ok(())
}

#[test]
fn values_bind_preserving_order() -> Result<()> {
    let mut ctx = StaticContext::new();
    ctx.add_variables_from_json_str(r#"{ "s": "x", "n": 7, "l": ["c", "a", "b"] }"#)?;
    let runner = Runner::new(&ctx);

    let mut s = String::new();
    runner.evaluate_expr(&var("s"), &mut s)?;
    assert_eq!(s, "x");

    let mut n = 0i64;
    runner.evaluate_expr(&var("n"), &mut n)?;
    assert_eq!(n, 7);

    let mut l: Vec<String> = vec![];
    runner.evaluate_expr(&var("l"), &mut l)?;
    assert_eq!(l, vec!["c", "a", "b"]);
    Ok(())
}

#[test]
fn wrapped_template_into_string() -> Result<()> {
    let mut ctx = StaticContext::new();
    ctx.set_variable("x", Value::from("ok"));

    let mut s = String::new();
    Runner::new(&ctx).evaluate_expr(&Expr::template_wrap(var("x")), &mut s)?;
    assert_eq!(s, "ok");
    Ok(())
}

#[test]
fn data_source_is_unevaluable() {
    let ctx = StaticContext::new();
    let expr = Expr::traversal(Traversal::new("data").attr("some_resource").attr("x").attr("attr"))
        .at(span(8));

    let mut s = "untouched".to_string();
    let err = Runner::new(&ctx).evaluate_expr(&expr, &mut s).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnevaluableError);
    assert!(err.is_warning());
    assert_eq!(err.message, "Unevaluable expression found in main.tf:8");
    assert_eq!(s, "untouched");
}

#[test]
fn context_can_be_replaced() -> Result<()> {
    struct Fixed(Value);

    impl EvalContext for Fixed {
        fn evaluate_expr(&self, _: &Expr, _: &Type) -> std::result::Result<Value, Diagnostics> {
            Ok(self.0.clone())
        }

        fn evaluate_block(
            &self,
            _: &ast::Body,
            _: &BlockSchema,
        ) -> std::result::Result<Value, Diagnostics> {
            Ok(self.0.clone())
        }
    }

    let ctx = Fixed(Value::from(vec![Value::from("a"), Value::Unknown]));
    let mut l: Vec<String> = vec![];
    let err = Runner::new(&ctx)
        .evaluate_expr(&var("x"), &mut l)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownValueError);
    assert!(l.is_empty());
    Ok(())
}

#[test]
#[should_panic(expected = "unexpected result type")]
fn struct_destination_panics() {
    #[derive(Default)]
    struct Tags {
        _name: String,
    }

    let mut ctx = StaticContext::new();
    ctx.set_variable("x", Value::from("ok"));
    let mut dest = Tags::default();
    let _ = Runner::new(&ctx).evaluate_expr(&var("x"), &mut dest);
}

#[test]
#[should_panic(expected = "unexpected result type")]
fn struct_destination_panics_before_evaluation() {
    #[derive(Default)]
    struct Tags {
        _name: String,
    }

    // The expression is unevaluable, so evaluation alone would return Ok.
    let ctx = StaticContext::new();
    let expr = Expr::traversal(Traversal::new("aws_instance").attr("web").attr("id"));
    let mut dest = Tags::default();
    let _ = Runner::new(&ctx).evaluate_expr_type(&expr, &mut dest, &Type::Dynamic);
}
