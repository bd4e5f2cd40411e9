// tests/spec_builder.rs

use std::path::PathBuf;

use simrun::errors::SimrunError;
use simrun::exec::{ProcessSpec, ProcessSpecBuilder, TemplateSpecBuilder};
use simrun_test_utils::builders::ConfigFileBuilder;

#[test]
fn test_job_placeholder_is_substituted_everywhere() {
    let cfg = ConfigFileBuilder::new()
        .program("/opt/sim/bin/run")
        .runtime_arg("-Dsim.id={job}")
        .arg("--job")
        .arg("{job}")
        .arg("out-{job}.csv")
        .env("SIM_JOB", "{job}")
        .build();

    let spec = TemplateSpecBuilder::from_config(&cfg.process)
        .build_command(17)
        .unwrap();

    assert_eq!(spec.program, PathBuf::from("/opt/sim/bin/run"));
    assert_eq!(spec.args, vec!["-Dsim.id=17", "--job", "17", "out-17.csv"]);
    assert_eq!(spec.env, vec![("SIM_JOB".to_string(), "17".to_string())]);
}

#[test]
fn test_runtime_args_come_before_program_args() {
    let cfg = ConfigFileBuilder::new()
        .program("/usr/bin/java")
        .arg("-cp")
        .arg("sim.jar")
        .runtime_arg("-Xmx2g")
        .runtime_arg("-XX:+UseG1GC")
        .build();

    let spec = TemplateSpecBuilder::from_config(&cfg.process)
        .build_command(1)
        .unwrap();

    assert_eq!(spec.args, vec!["-Xmx2g", "-XX:+UseG1GC", "-cp", "sim.jar"]);
}

#[test]
fn test_working_directory_is_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ConfigFileBuilder::new()
        .program("/bin/true")
        .cwd(dir.path())
        .build();

    let spec = TemplateSpecBuilder::from_config(&cfg.process)
        .build_command(2)
        .unwrap();

    assert_eq!(spec.cwd.as_deref(), Some(dir.path()));
}

#[cfg(unix)]
#[test]
fn test_bare_program_is_resolved_on_search_path() {
    use std::os::unix::fs::PermissionsExt;

    let empty = tempfile::tempdir().unwrap();
    let bin = tempfile::tempdir().unwrap();

    let exe = bin.path().join("simworker");
    std::fs::write(&exe, "#!/bin/sh\n").unwrap();
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

    // Same name but not executable: must be skipped.
    let decoy = empty.path().join("simworker");
    std::fs::write(&decoy, "").unwrap();

    let search = std::env::join_paths([empty.path(), bin.path()]).unwrap();
    let cfg = ConfigFileBuilder::new().program("simworker").build();

    let spec = TemplateSpecBuilder::from_config(&cfg.process)
        .with_search_path(Some(search))
        .build_command(3)
        .unwrap();

    assert_eq!(spec.program, exe);
}

#[test]
fn test_unresolvable_program_is_resource_unavailable() {
    let empty = tempfile::tempdir().unwrap();
    let cfg = ConfigFileBuilder::new().program("no-such-simulator").build();

    let result = TemplateSpecBuilder::from_config(&cfg.process)
        .with_search_path(Some(empty.path().as_os_str().to_owned()))
        .build_command(4);

    match result {
        Err(SimrunError::ResourceUnavailable(msg)) => assert!(msg.contains("no-such-simulator")),
        other => panic!("Expected ResourceUnavailable, got: {:?}", other),
    }
}

#[test]
fn test_unset_search_path_is_resource_unavailable() {
    let cfg = ConfigFileBuilder::new().program("sim").build();

    let result = TemplateSpecBuilder::from_config(&cfg.process)
        .with_search_path(None)
        .build_command(5);

    assert!(matches!(
        result,
        Err(SimrunError::ResourceUnavailable(msg)) if msg.contains("PATH is not set")
    ));
}

#[test]
fn test_program_with_directory_is_used_as_is() {
    let cfg = ConfigFileBuilder::new().program("./bin/sim").build();

    let spec = TemplateSpecBuilder::from_config(&cfg.process)
        .with_search_path(None)
        .build_command(6)
        .unwrap();

    assert_eq!(spec.program, PathBuf::from("./bin/sim"));
}

#[test]
fn test_display_quotes_arguments_with_spaces() {
    let spec = ProcessSpec::new("/bin/sh").arg("-c").arg("echo hi").arg("");

    assert_eq!(spec.to_string(), r#"/bin/sh -c "echo hi" """#);
}
