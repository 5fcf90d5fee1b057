use std::error::Error;
use std::io::Write;

use repodag::config::{load_and_validate, validate_config, ConfigFile};

type TestResult = Result<(), Box<dyn Error>>;

fn parse(toml: &str) -> Result<ConfigFile, toml::de::Error> {
    toml::from_str(toml)
}

#[test]
fn scalar_and_array_dependencies_both_parse() -> TestResult {
    let cfg = parse(
        r#"
        [[batch.deploy.step]]
        id = "lib"
        cmd = "make lib"

        [[batch.deploy.step]]
        id = "api"
        cmd = "make api"
        dir = "services/api"
        upstream = "lib"

        [[batch.deploy.step]]
        id = "site"
        cmd = "make site"
        upstream = ["lib", "api"]
        "#,
    )?;

    let batch = cfg.batch.get("deploy").ok_or("missing batch")?;
    let steps = batch.to_steps();

    assert_eq!(steps.len(), 3);
    assert!(steps[0].upstream.is_empty());
    assert_eq!(steps[1].upstream, vec!["lib"]);
    assert_eq!(
        steps[1].dir.as_deref(),
        Some(std::path::Path::new("services/api"))
    );
    assert_eq!(steps[2].upstream, vec!["lib", "api"]);
    Ok(())
}

#[test]
fn downstream_references_parse_too() -> TestResult {
    let cfg = parse(
        r#"
        [[batch.fan.step]]
        id = "root"
        cmd = "true"
        downstream = ["left", "right"]

        [[batch.fan.step]]
        id = "left"
        cmd = "true"

        [[batch.fan.step]]
        id = "right"
        cmd = "true"
        "#,
    )?;

    let steps = cfg.batch.get("fan").ok_or("missing batch")?.to_steps();
    assert_eq!(steps[0].downstream, vec!["left", "right"]);
    Ok(())
}

#[test]
fn config_without_batches_is_invalid() -> TestResult {
    let cfg = parse("")?;
    assert!(validate_config(&cfg).is_err());
    Ok(())
}

#[test]
fn empty_batch_is_invalid() -> TestResult {
    let cfg = parse("[batch.hollow]")?;
    assert!(validate_config(&cfg).is_err());
    Ok(())
}

#[test]
fn duplicate_step_ids_are_invalid() -> TestResult {
    let cfg = parse(
        r#"
        [[batch.dup.step]]
        id = "a"
        cmd = "true"

        [[batch.dup.step]]
        id = "a"
        cmd = "false"
        "#,
    )?;

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("duplicate step ID"));
    Ok(())
}

#[test]
fn self_dependency_is_invalid() -> TestResult {
    let cfg = parse(
        r#"
        [[batch.selfish.step]]
        id = "a"
        cmd = "true"
        upstream = "a"
        "#,
    )?;

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("cannot depend on itself"));
    Ok(())
}

#[test]
fn unknown_references_are_tolerated() -> TestResult {
    let cfg = parse(
        r#"
        [[batch.lenient.step]]
        id = "a"
        cmd = "true"
        upstream = "not-a-step"
        "#,
    )?;

    // Only warned about; the engine ignores unknown references.
    validate_config(&cfg)?;
    Ok(())
}

#[test]
fn load_and_validate_reads_a_file_from_disk() -> TestResult {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        r#"
        [[batch.pull.step]]
        id = "core"
        cmd = "git pull"
        dir = "repos/core"

        [[batch.pull.step]]
        id = "tools"
        cmd = "git pull"
        dir = "repos/tools"
        upstream = "core"
        "#
    )?;

    let cfg = load_and_validate(file.path())?;

    let steps = cfg.batch.get("pull").ok_or("missing batch")?.to_steps();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[1].upstream, vec!["core"]);
    Ok(())
}

#[test]
fn loading_a_missing_file_fails_with_context() {
    let err = load_and_validate("definitely/not/here.toml").unwrap_err();
    assert!(err.to_string().contains("reading config file"));
}
