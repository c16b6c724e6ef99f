// tests/config_loading.rs

use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;

use podstep::config::load_and_validate;
use podstep::errors::StepError;
use podstep::{FakePodClient, StepGraph, StepLink, pod_steps_from_config};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
fn test_pipeline_config_builds_steps() {
    let file = write_config(
        r#"
[job]
job = "very-cool-prow-job"
build_id = "test-build-id"
prow_job_id = "prow-job-id"
namespace = "ci-op-1234"

[test.unit]
as = "unit"
commands = "make test"
secret_name = "test-credentials"
secret_mount_path = "/var/run/creds"

[test.unit.from]
name = "pipeline"
tag = "src"

[test.e2e]
as = "e2e-pod"
commands = "make e2e"
artifact_dir = "/tmp/artifacts"

[test.e2e.from]
name = "pipeline"
tag = "bin"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.job.namespace, "ci-op-1234");
    assert_eq!(cfg.test.len(), 2);
    assert_eq!(cfg.test["unit"].secret_name(), Some("test-credentials"));

    let steps = pod_steps_from_config(&cfg, Arc::new(FakePodClient::new()));
    let mut names: Vec<&str> = steps.iter().map(|s| s.name()).collect();
    names.sort();
    assert_eq!(names, vec!["e2e-pod", "unit"]);

    for step in &steps {
        assert_eq!(step.requires(), vec![StepLink::ImagesReady]);
        assert!(step.inputs().unwrap().is_empty());
    }

    let graph = StepGraph::build(steps).unwrap();
    assert_eq!(graph.len(), 2);
    assert!(graph.external_links().contains(&StepLink::ImagesReady));
}

#[test]
fn test_empty_optional_fields_are_absent() {
    let file = write_config(
        r#"
[job]
namespace = "ns"

[test.unit]
as = "unit"
commands = "make test"
secret_name = ""
secret_mount_path = ""
service_account_name = ""

[test.unit.from]
name = "pipeline"
tag = "src"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let step = &cfg.test["unit"];
    assert_eq!(step.secret_name(), None);
    assert_eq!(step.secret_mount_path(), None);
    assert_eq!(step.service_account_name(), None);
}

#[test]
fn test_duplicate_pod_names_are_rejected() {
    let file = write_config(
        r#"
[job]
namespace = "ns"

[test.a]
as = "same"
commands = "true"
from = { name = "pipeline", tag = "src" }

[test.b]
as = "same"
commands = "true"
from = { name = "pipeline", tag = "src" }
"#,
    );

    match load_and_validate(file.path()) {
        Err(StepError::ConfigError(msg)) => assert!(msg.contains("same")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_missing_commands_is_a_parse_error() {
    let file = write_config(
        r#"
[job]
namespace = "ns"

[test.a]
as = "a"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(StepError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    assert!(matches!(
        load_and_validate(&missing),
        Err(StepError::IoError(_))
    ));
}
