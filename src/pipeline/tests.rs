use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::http::JsonPathExtractor;
use crate::sinks::ResultTree;
use crate::test_support::{FakeExecutor, FakeHooks};

struct Harness {
    pipeline: RequestPipeline,
    metrics: Arc<EndpointMetrics>,
    tree: Arc<ResultTree>,
    signal: RunSignal,
}

fn harness(executor: &Arc<FakeExecutor>, hooks: Option<Arc<FakeHooks>>) -> Harness {
    let metrics = Arc::new(EndpointMetrics::new());
    let tree = Arc::new(ResultTree::new(false));
    let signal = RunSignal::new();
    let pipeline = RequestPipeline::new(
        Arc::clone(executor) as Arc<dyn RequestExecutor>,
        hooks.map(|hooks| hooks as Arc<dyn HookRunner>),
        Arc::new(JsonPathExtractor),
        Arc::clone(&metrics),
        Arc::clone(&tree) as Arc<dyn crate::sinks::ResultSink>,
        Some("http://localhost:8080/api/".to_owned()),
        Duration::from_secs(5),
        signal.clone(),
    );
    Harness {
        pipeline,
        metrics,
        tree,
        signal,
    }
}

fn step(name: &str) -> PlanStep {
    PlanStep::new(
        name,
        RequestTemplate {
            path: Some("users/{{seq}}".to_owned()),
            ..RequestTemplate::default()
        },
    )
}

fn failing_report(name: &str) -> HookReport {
    HookReport {
        tests: vec![AssertionOutcome::fail(name, "token missing")],
        error: None,
    }
}

async fn run_once(harness: &Harness, step: &PlanStep) -> Result<IterationResult, String> {
    let vars = BTreeMap::from([("seq".to_owned(), "3".to_owned())]);
    let context = IterationContext {
        worker: 0,
        seq: 3,
        vars: &vars,
    };
    match harness.pipeline.run(step, context).await {
        IterationOutcome::Completed(result) => Ok(result),
        IterationOutcome::Interrupted(_) => Err("Iteration was interrupted".to_owned()),
    }
}

#[tokio::test]
async fn pre_hook_failure_skips_the_request() -> Result<(), String> {
    let executor = Arc::new(FakeExecutor::new(Duration::ZERO));
    let hooks = Arc::new(
        FakeHooks::default()
            .with("login", failing_report("has token"))
            .with("cleanup", HookReport::default()),
    );
    let harness = harness(&executor, Some(Arc::clone(&hooks)));
    let step = step("profile")
        .with_pre_hook("login")
        .with_post_hook("cleanup");

    let result = run_once(&harness, &step).await?;
    if executor.calls() != 0 {
        return Err(format!("Executor called {} times", executor.calls()));
    }
    if result.success || result.message.as_deref().is_none_or(str::is_empty) {
        return Err(format!("Expected a failed result with a message: {:?}", result));
    }
    if hooks.seen().len() != 1 {
        return Err(format!("Post hook must not run after a failed pre hook: {:?}", hooks.seen()));
    }
    let snapshot = harness.metrics.snapshot();
    if snapshot.first().map(|series| series.fail) != Some(1) {
        return Err("Expected one recorded failure".to_owned());
    }
    Ok(())
}

#[tokio::test]
async fn last_failing_assertion_sets_the_message() -> Result<(), String> {
    let executor = Arc::new(FakeExecutor::new(Duration::ZERO).with_response(200, "hello"));
    let harness = harness(&executor, None);
    let passing_status = step("greet")
        .with_assertion(Assertion::status(Comparator::Equal, 200).map_err(|err| err.to_string())?)
        .with_assertion(Assertion::body_contains("goodbye"));

    let result = run_once(&harness, &passing_status).await?;
    if result.success {
        return Err("Body assertion should fail the iteration".to_owned());
    }
    if result.message.as_deref() != Some("response body does not contain 'goodbye'") {
        return Err(format!("Unexpected message {:?}", result.message));
    }
    if result.assertions.len() != 2 || result.failures.len() != 1 {
        return Err(format!("Unexpected outcomes {:?}", result));
    }

    let both_failing = step("greet")
        .with_assertion(Assertion::status(Comparator::Greater, 300).map_err(|err| err.to_string())?)
        .with_assertion(Assertion::body_contains("goodbye"));
    let result = run_once(&harness, &both_failing).await?;
    if result.failures.len() != 2 {
        return Err(format!("Expected both failures kept: {:?}", result.failures));
    }
    if result.message.as_deref() != Some("response body does not contain 'goodbye'") {
        return Err(format!("Last failure should win: {:?}", result.message));
    }
    Ok(())
}

#[tokio::test]
async fn request_failure_skips_assertions_but_runs_post_hook() -> Result<(), String> {
    let executor = Arc::new(FakeExecutor::new(Duration::ZERO).failing("connection refused"));
    let hooks = Arc::new(FakeHooks::default());
    let harness = harness(&executor, Some(Arc::clone(&hooks)));
    let step = step("orders")
        .with_assertion(Assertion::body_contains("anything"))
        .with_post_hook("audit");

    let result = run_once(&harness, &step).await?;
    if result.success || result.message.as_deref() != Some("connection refused") {
        return Err(format!("Unexpected result {:?}", result));
    }
    if !result.assertions.is_empty() {
        return Err("Assertions need a response".to_owned());
    }
    if hooks.seen() != vec![("audit".to_owned(), None)] {
        return Err(format!("Unexpected hook calls {:?}", hooks.seen()));
    }
    Ok(())
}

#[tokio::test]
async fn failing_post_hook_test_fails_the_iteration() -> Result<(), String> {
    let executor = Arc::new(FakeExecutor::new(Duration::ZERO));
    let hooks = Arc::new(FakeHooks::default().with("verify", failing_report("schema")));
    let harness = harness(&executor, Some(Arc::clone(&hooks)));
    let result = run_once(&harness, &step("items").with_post_hook("verify")).await?;
    if result.success {
        return Err("Post hook test failure should fail the iteration".to_owned());
    }
    if hooks.seen() != vec![("verify".to_owned(), Some(200))] {
        return Err(format!("Post hook should see the response: {:?}", hooks.seen()));
    }
    if !result
        .message
        .as_deref()
        .is_some_and(|message| message.starts_with("post-request hook failed"))
    {
        return Err(format!("Unexpected message {:?}", result.message));
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cost_prefers_the_executor_measurement() -> Result<(), String> {
    let measured = Arc::new(FakeExecutor::new(Duration::from_millis(30)).with_cost(12));
    let harness_measured = harness(&measured, None);
    let result = run_once(&harness_measured, &step("a")).await?;
    if result.cost_ms != 12 {
        return Err(format!("Expected executor cost 12, got {}", result.cost_ms));
    }

    let unmeasured = Arc::new(FakeExecutor::new(Duration::from_millis(30)));
    let harness_unmeasured = harness(&unmeasured, None);
    let result = run_once(&harness_unmeasured, &step("a")).await?;
    if result.cost_ms != 30 {
        return Err(format!("Expected elapsed cost 30, got {}", result.cost_ms));
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_during_pause_still_records_the_iteration() -> Result<(), String> {
    let executor = Arc::new(FakeExecutor::new(Duration::ZERO));
    let hooks = Arc::new(FakeHooks::default());
    let harness = harness(&executor, Some(Arc::clone(&hooks)));
    let step = step("slow")
        .with_assertion(Assertion::pause(Duration::from_secs(30)))
        .with_assertion(Assertion::body_contains("never checked"))
        .with_post_hook("cleanup");

    let signal = harness.signal.clone();
    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        signal.stop();
    });
    let vars = BTreeMap::new();
    let outcome = harness
        .pipeline
        .run(
            &step,
            IterationContext {
                worker: 1,
                seq: 0,
                vars: &vars,
            },
        )
        .await;
    stopper.await.map_err(|err| err.to_string())?;

    if !outcome.is_interrupted() {
        return Err(format!("Expected an interrupted outcome, got {:?}", outcome));
    }
    let result = outcome.result();
    if !result.success || result.message.is_some() || !result.assertions.is_empty() {
        return Err(format!(
            "Interruption is a clean exit and skips later assertions, got {:?}",
            result
        ));
    }
    if executor.calls() != 1 {
        return Err(format!("Expected one request, got {}", executor.calls()));
    }
    if harness.metrics.total_recorded() != 1 || harness.tree.accepted() != 1 {
        return Err("Interrupted iteration should be recorded once".to_owned());
    }
    if hooks.seen() != vec![("cleanup".to_owned(), Some(200))] {
        return Err(format!("Post-hook should run once, saw {:?}", hooks.seen()));
    }
    Ok(())
}

#[tokio::test]
async fn json_path_assertion_renders_expected_value() -> Result<(), String> {
    let executor =
        Arc::new(FakeExecutor::new(Duration::ZERO).with_response(200, r#"{"user":{"id":"3"}}"#));
    let harness = harness(&executor, None);
    let step = step("user").with_assertion(Assertion::json_path("$.user.id", "{{seq}}"));
    let result = run_once(&harness, &step).await?;
    if !result.success {
        return Err(format!("Expected success, got {:?}", result));
    }
    if harness.tree.results().len() != 1 {
        return Err("Result should reach the sink".to_owned());
    }
    Ok(())
}

#[tokio::test]
async fn unresolvable_url_is_a_request_failure() -> Result<(), String> {
    let executor = Arc::new(FakeExecutor::new(Duration::ZERO));
    let harness = harness(&executor, None);
    let step = PlanStep::new("broken", RequestTemplate::default());
    let result = run_once(&harness, &step).await?;
    if result.success || executor.calls() != 0 {
        return Err(format!("Expected an unsent failure, got {:?}", result));
    }
    Ok(())
}

#[test]
fn materialize_joins_relative_paths() -> Result<(), String> {
    let template = RequestTemplate {
        method: HttpMethod::Post,
        path: Some("orders/{{id}}".to_owned()),
        headers: vec![("X-Trace".to_owned(), "{{id}}-{{missing}}".to_owned())],
        body: Some(r#"{"id":"{{ id }}"}"#.to_owned()),
        ..RequestTemplate::default()
    };
    let vars = BTreeMap::from([("id".to_owned(), "42".to_owned())]);
    let spec = materialize(&template, Some("https://shop.test/api/"), &vars)
        .map_err(|err| err.to_string())?;
    if spec.url.as_str() != "https://shop.test/api/orders/42" {
        return Err(format!("Unexpected url {}", spec.url));
    }
    if spec.headers != vec![("X-Trace".to_owned(), "42-{{missing}}".to_owned())] {
        return Err(format!("Unexpected headers {:?}", spec.headers));
    }
    if spec.body.as_deref() != Some(r#"{"id":"42"}"#) {
        return Err(format!("Unexpected body {:?}", spec.body));
    }
    if materialize(&template, None, &vars).is_ok() {
        return Err("Relative path without base url should fail".to_owned());
    }
    Ok(())
}

#[test]
fn iteration_vars_add_builtins() -> Result<(), String> {
    let plan_vars = BTreeMap::from([("tenant".to_owned(), "acme".to_owned())]);
    let vars = iteration_vars(&plan_vars, 4, 9, 1);
    for (key, expected) in [("tenant", "acme"), ("worker", "4"), ("seq", "9"), ("step", "2")] {
        if vars.get(key).map(String::as_str) != Some(expected) {
            return Err(format!("{} = {:?}", key, vars.get(key)));
        }
    }
    if !vars.contains_key("timestamp_ms") || !vars.contains_key("timestamp_s") {
        return Err("Missing timestamp vars".to_owned());
    }
    Ok(())
}

#[test]
fn comparators_parse_and_compare() -> Result<(), String> {
    let greater: Comparator = ">".parse().map_err(|err: crate::error::ValidationError| err.to_string())?;
    if !greater.holds(500, 499) || greater.holds(200, 200) {
        return Err("Greater comparator misbehaves".to_owned());
    }
    if "~".parse::<Comparator>().is_ok() {
        return Err("Unknown comparator should be rejected".to_owned());
    }
    if Assertion::status(Comparator::Equal, 70_000).is_ok() {
        return Err("Out-of-range status should be rejected".to_owned());
    }
    Ok(())
}
