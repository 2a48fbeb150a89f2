//! End-to-end command dispatch against outline files.

use std::fs;

use clap::Parser;
use rstest::rstest;
use tempfile::TempDir;

use treeview::cli::{execute_command, Cli, CliError};
use treeview::exitcode;
use treeview::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

const OUTLINE: &str = "\
# sample outline
A=first
A.A1
B
tmp.t1
";

fn run(dir: &TempDir, args: &[&str]) -> Result<(), CliError> {
    let outline = dir.path().join("outline.txt");
    fs::write(&outline, OUTLINE).unwrap();
    let outline = outline.to_string_lossy().to_string();
    let argv: Vec<&str> = ["treeview"]
        .into_iter()
        .chain(args.iter().map(|&arg| if arg == "FILE" { outline.as_str() } else { arg }))
        .collect();
    let cli = Cli::try_parse_from(argv).unwrap();
    execute_command(&cli)
}

#[rstest]
#[case::show(&["show", "FILE"])]
#[case::show_values(&["show", "--values", "FILE"])]
#[case::find(&["find", "FILE", "A.A1"])]
#[case::prune(&["prune", "FILE", "tmp"])]
#[case::prune_indexed(&["--indexed", "prune", "FILE", "A"])]
fn given_valid_outline_when_running_then_succeeds(#[case] args: &[&str]) {
    let dir = TempDir::new().unwrap();
    run(&dir, args).unwrap();
}

#[test]
fn given_missing_path_when_finding_then_data_error() {
    let dir = TempDir::new().unwrap();
    let err = run(&dir, &["find", "FILE", "A.missing"]).unwrap_err();
    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

#[test]
fn given_missing_file_when_showing_then_no_input() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.txt");
    let cli = Cli::try_parse_from(["treeview", "show", missing.to_str().unwrap()]).unwrap();

    let err = execute_command(&cli).unwrap_err();

    assert!(matches!(err, CliError::Io { .. }));
    assert_eq!(err.exit_code(), exitcode::NOINPUT);
}

#[test]
fn given_duplicate_lines_when_showing_then_data_error() {
    let dir = TempDir::new().unwrap();
    let outline = dir.path().join("dup.txt");
    fs::write(&outline, "A\nA\n").unwrap();
    let cli = Cli::try_parse_from(["treeview", "show", outline.to_str().unwrap()]).unwrap();

    let err = execute_command(&cli).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

#[test]
fn given_no_subcommand_when_running_then_usage_error() {
    let cli = Cli::try_parse_from(["treeview"]).unwrap();
    let err = execute_command(&cli).unwrap_err();
    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_bad_config_when_running_then_config_error() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[tree]\npath_separator = \"\"\n").unwrap();
    let outline = dir.path().join("outline.txt");
    fs::write(&outline, OUTLINE).unwrap();
    let cli = Cli::try_parse_from([
        "treeview",
        "--config",
        config.to_str().unwrap(),
        "show",
        outline.to_str().unwrap(),
    ])
    .unwrap();

    let err = execute_command(&cli).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::CONFIG);
}
