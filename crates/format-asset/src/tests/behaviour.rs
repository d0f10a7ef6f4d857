//! Behaviour-driven tests for asset command dispatch.

use std::ffi::OsString;
use std::io::Write;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::command::{AssetRunner, FormatArgs, FormatAsset};
use crate::engine::FormatEngine;
use crate::error::AssetError;
use crate::invocation::{Invocation, RunOutcome};
use crate::registry::{ToolHandler, ToolRegistry, proxy_marker};

use super::{EchoTool, ExitTool, MissingTool};

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TestWorld {
    registry: ToolRegistry,
    status: Option<u8>,
    stdout: String,
    stderr: String,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

/// Formats by running the echo tool over the requested files.
struct EchoAsset;

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct EchoAssetError(#[from] AssetError);

impl FormatAsset for EchoAsset {
    type Error = EchoAssetError;

    fn type_name(&self) -> &str {
        "echo"
    }

    fn verify_config(&self, _config: &str) -> Result<(), EchoAssetError> {
        Ok(())
    }

    fn format(
        &self,
        args: &FormatArgs,
        engine: &dyn FormatEngine,
        sink: &mut dyn Write,
    ) -> Result<RunOutcome, EchoAssetError> {
        let invocation = Invocation::new("echo-asset")
            .arg(proxy_marker("echo"))
            .args(args.files.iter().cloned());
        Ok(engine.run(&invocation, sink)?)
    }
}

fn register(world: &mut TestWorld, name: &str, handler: Box<dyn ToolHandler>) {
    world
        .registry
        .register(name, handler)
        .expect("register tool");
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a registry with an echo tool")]
fn given_echo_tool(world: &mut TestWorld) {
    register(world, "echo", Box::new(EchoTool));
}

#[given("a registry with a tool that exits with status {code}")]
fn given_exit_tool(world: &mut TestWorld, code: i32) {
    register(world, "exit", Box::new(ExitTool(code)));
}

#[given("a registry with a tool whose binary is missing")]
fn given_missing_tool(world: &mut TestWorld) {
    register(world, "missing", Box::new(MissingTool));
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the asset runs with arguments {arguments}")]
fn when_asset_runs(world: &mut TestWorld, arguments: String) {
    let argv: Vec<OsString> = std::iter::once("asset")
        .chain(arguments.trim_matches('"').split_whitespace())
        .map(OsString::from)
        .collect();
    let runner = AssetRunner::new(&EchoAsset, &world.registry);
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let status = runner.run_status(argv, &mut stdout, &mut stderr);
    world.status = Some(status);
    world.stdout = String::from_utf8(stdout).expect("utf8 stdout");
    world.stderr = String::from_utf8(stderr).expect("utf8 stderr");
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the exit status is {status}")]
fn then_exit_status(world: &mut TestWorld, status: u8) {
    assert_eq!(
        world.status,
        Some(status),
        "stdout: {:?}, stderr: {:?}",
        world.stdout,
        world.stderr
    );
}

#[then("stdout is {text}")]
fn then_stdout_is(world: &mut TestWorld, text: String) {
    let expected = text.trim_matches('"');
    assert_eq!(world.stdout.trim_end(), expected);
}

#[then("nothing is written to stdout")]
fn then_stdout_empty(world: &mut TestWorld) {
    assert!(world.stdout.is_empty(), "stdout: {:?}", world.stdout);
}

#[then("stderr mentions {text}")]
fn then_stderr_mentions(world: &mut TestWorld, text: String) {
    let needle = text.trim_matches('"');
    assert!(
        world.stderr.contains(needle),
        "expected stderr to mention '{needle}', got: {:?}",
        world.stderr
    );
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/asset_runner.feature",
    name = "Proxy marker runs the registered tool"
)]
fn proxy_marker_runs_the_registered_tool(world: TestWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/asset_runner.feature",
    name = "Proxy marker propagates the tool exit status"
)]
fn proxy_marker_propagates_the_tool_exit_status(world: TestWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/asset_runner.feature",
    name = "Unknown proxy marker fails"
)]
fn unknown_proxy_marker_fails(world: TestWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/asset_runner.feature",
    name = "Listing non-conforming files fails the command"
)]
fn listing_non_conforming_files_fails_the_command(world: TestWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/asset_runner.feature",
    name = "Writing files succeeds"
)]
fn writing_files_succeeds(world: TestWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/asset_runner.feature",
    name = "Proxy tool launch failure is reported"
)]
fn proxy_tool_launch_failure_is_reported(world: TestWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/asset_runner.feature",
    name = "Type name is printed"
)]
fn type_name_is_printed(world: TestWorld) {
    drop(world);
}
