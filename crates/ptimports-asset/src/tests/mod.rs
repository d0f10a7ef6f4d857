//! Unit and behavioural tests for the ptimports asset.


use std::cell::{Cell, RefCell};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use format_asset::{
    AssetError, EngineKind, FormatArgs, FormatAsset, FormatEngine, InProcessEngine, Invocation,
    RunOutcome,
};
use rstest::{fixture, rstest};

use crate::{
    FormatError, LoadError, PackageLoader, PackageMetadata, PtimportsAsset, TYPE_NAME, ToolLocator,
    run, tool_registry,
};

/// Records every invocation and answers with a fixed outcome and output.
pub(crate) struct RecordingEngine {
    seen: RefCell<Vec<Invocation>>,
    outcome: RunOutcome,
    output: &'static str,
}

impl RecordingEngine {
    pub(crate) const fn new(outcome: RunOutcome, output: &'static str) -> Self {
        Self {
            seen: RefCell::new(Vec::new()),
            outcome,
            output,
        }
    }

    pub(crate) fn invocations(&self) -> Vec<Invocation> {
        self.seen.borrow().clone()
    }

    /// Arguments of the single recorded invocation, lossily converted.
    pub(crate) fn only_arguments(&self) -> Vec<String> {
        let invocations = self.invocations();
        assert_eq!(invocations.len(), 1, "invocations: {invocations:?}");
        invocations
            .first()
            .map(|invocation| {
                invocation
                    .arguments()
                    .iter()
                    .map(|arg| arg.to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl FormatEngine for RecordingEngine {
    fn run(&self, invocation: &Invocation, sink: &mut dyn Write) -> Result<RunOutcome, AssetError> {
        self.seen.borrow_mut().push(invocation.clone());
        sink.write_all(self.output.as_bytes())
            .map_err(|source| AssetError::Output {
                source: Arc::new(source),
            })?;
        Ok(self.outcome)
    }
}

/// Answers every load with the same packages and counts the calls.
#[derive(Default)]
pub(crate) struct StaticLoader {
    packages: Vec<PackageMetadata>,
    calls: Cell<usize>,
}

impl StaticLoader {
    pub(crate) fn with_import_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            packages: paths.into_iter().map(PackageMetadata::new).collect(),
            calls: Cell::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl PackageLoader for StaticLoader {
    fn load(&self, _dir: &Path) -> Result<Vec<PackageMetadata>, LoadError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.packages.clone())
    }
}

impl PackageLoader for &StaticLoader {
    fn load(&self, dir: &Path) -> Result<Vec<PackageMetadata>, LoadError> {
        (**self).load(dir)
    }
}

fn format_args(list: bool, refactor: bool, config: &str, files: &[&str]) -> FormatArgs {
    FormatArgs {
        list,
        project_dir: PathBuf::from("/work/project"),
        config: config.to_owned(),
        refactor,
        engine: EngineKind::InProcess,
        files: files.iter().map(PathBuf::from).collect(),
    }
}

#[fixture]
fn loader() -> StaticLoader {
    StaticLoader::with_import_paths(["github.com/acme/project"])
}

// ---------------------------------------------------------------------------
// FormatAsset implementation
// ---------------------------------------------------------------------------

#[test]
fn type_name_is_ptimports() {
    assert_eq!(PtimportsAsset::new().type_name(), "ptimports");
}

#[rstest]
#[case::blank("", true)]
#[case::all_keys("skip-refactor: true\nskip-simplify: false\nseparate-project-imports: true", true)]
#[case::unknown_key("skip-imports: true", false)]
#[case::not_boolean("skip-simplify: sometimes", false)]
fn verify_config_accepts_only_known_boolean_keys(#[case] config: &str, #[case] valid: bool) {
    let result = PtimportsAsset::new().verify_config(config);
    assert_eq!(result.is_ok(), valid, "result: {result:?}");
}

#[rstest]
#[case::flag_set_config_default(true, "", true)]
#[case::flag_set_config_skips(true, "skip-refactor: true", false)]
#[case::flag_unset_config_default(false, "", false)]
#[case::flag_unset_config_enables(false, "skip-refactor: false", false)]
fn refactor_requires_flag_and_config(
    loader: StaticLoader,
    #[case] refactor_flag: bool,
    #[case] config: &str,
    #[case] expect_refactor: bool,
) {
    let asset = PtimportsAsset::with_loader(&loader).with_locator(ToolLocator::SelfProxy);
    let engine = RecordingEngine::new(RunOutcome::Success, "");
    let mut sink = Vec::new();

    asset
        .format(
            &format_args(true, refactor_flag, config, &["foo.go"]),
            &engine,
            &mut sink,
        )
        .expect("format");

    let arguments = engine.only_arguments();
    assert_eq!(arguments.first().map(String::as_str), Some("__ptimports"));
    assert_eq!(arguments.iter().any(|arg| arg == "-r"), expect_refactor);
}

#[rstest]
fn separate_project_imports_uses_loader(loader: StaticLoader) {
    let asset = PtimportsAsset::with_loader(&loader);
    let engine = RecordingEngine::new(RunOutcome::Success, "");
    let mut sink = Vec::new();

    asset
        .format(
            &format_args(
                false,
                true,
                "separate-project-imports: true\nskip-simplify: true",
                &["a.go"],
            ),
            &engine,
            &mut sink,
        )
        .expect("format");

    assert_eq!(loader.calls(), 1);
    assert_eq!(
        engine.only_arguments(),
        ["__ptimports", "-w", "-r", "--local", "github.com/acme/project/", "a.go"]
    );
}

#[cfg(unix)]
#[rstest]
fn executable_locator_spawns_ptimports_whatever_the_engine(loader: StaticLoader) {
    let asset = PtimportsAsset::with_loader(&loader)
        .with_locator(ToolLocator::Executable(PathBuf::from("echo")));
    let engine = RecordingEngine::new(RunOutcome::Success, "unused\n");
    let mut sink = Vec::new();

    let outcome = asset
        .format(
            &format_args(true, true, "", &["foo.go"]),
            &engine,
            &mut sink,
        )
        .expect("format");

    assert_eq!(outcome, RunOutcome::Success);
    assert!(engine.invocations().is_empty());
    assert_eq!(String::from_utf8(sink).expect("utf8"), "-l -s -r foo.go\n");
}

#[cfg(unix)]
#[test]
fn executable_locator_works_with_in_process_registry() {
    let registry = tool_registry().expect("registry");
    let engine = InProcessEngine::new(&registry);
    let asset = PtimportsAsset::new().with_locator(ToolLocator::Executable(PathBuf::from("true")));
    let mut sink = Vec::new();

    let outcome = asset
        .format(&format_args(true, true, "", &["foo.go"]), &engine, &mut sink)
        .expect("an installed executable should not need a proxy marker");

    assert_eq!(outcome, RunOutcome::Success);
    assert!(sink.is_empty());
}

#[rstest]
fn invalid_config_fails_before_running(loader: StaticLoader) {
    let asset = PtimportsAsset::with_loader(&loader);
    let engine = RecordingEngine::new(RunOutcome::Success, "");
    let mut sink = Vec::new();

    let err = asset
        .format(
            &format_args(true, true, "bogus: 1", &["foo.go"]),
            &engine,
            &mut sink,
        )
        .expect_err("config should be rejected");

    assert!(matches!(err, FormatError::Config { .. }));
    assert!(engine.invocations().is_empty());
    assert_eq!(loader.calls(), 0);
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

#[test]
fn registry_exposes_ptimports_tool() {
    let registry = tool_registry().expect("registry");
    assert_eq!(registry.names(), vec![TYPE_NAME]);
}

#[test]
fn run_prints_type_name() {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let _code = run(
        [OsString::from("ptimports-asset"), OsString::from("type-name")],
        &mut stdout,
        &mut stderr,
    );

    assert_eq!(String::from_utf8(stdout).expect("utf8"), "ptimports\n");
    assert!(stderr.is_empty());
}

#[test]
fn run_reports_invalid_config_on_stderr() {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let _code = run(
        ["ptimports-asset", "verify-config", "--config", "bogus: true"].map(OsString::from),
        &mut stdout,
        &mut stderr,
    );

    assert!(stdout.is_empty());
    let message = String::from_utf8(stderr).expect("utf8");
    assert!(
        message.starts_with("invalid ptimports configuration"),
        "stderr: {message}"
    );
}
