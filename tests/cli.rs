//! End-to-end runs of the `parmul` binary.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("parmul-cli-{}-{name}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_parmul"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

#[test]
fn test_multiplies_and_writes_output() {
    let dir = scratch_dir("ok");
    let input = dir.join("input.txt");
    let output = dir.join("output.txt");
    fs::write(&input, "1 2\n3 4\n\n5 6\n7 8\n").unwrap();

    for strategy in ["row-per-task", "row-block", "tiled"] {
        let out = run(&[
            "--input",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--strategy",
            strategy,
            "--workers",
            "2",
            "--verify",
        ]);
        assert!(out.status.success(), "{strategy}: {out:?}");
        assert_eq!(out.status.code(), Some(0));
        assert_eq!(fs::read_to_string(&output).unwrap(), "19.0 22.0\n43.0 50.0\n");

        let stdout = String::from_utf8_lossy(&out.stdout);
        assert!(stdout.contains("sequential"));
        assert!(stdout.contains(&format!("parallel/{strategy}")));
        assert!(stdout.contains("verified"));
    }
}

#[test]
fn test_missing_input_exits_with_one() {
    let dir = scratch_dir("missing");
    let out = run(&[
        "--input",
        dir.join("nope.txt").to_str().unwrap(),
        "--output",
        dir.join("out.txt").to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!dir.join("out.txt").exists());
}

#[test]
fn test_dimension_error_exits_with_one() {
    let dir = scratch_dir("dims");
    let input = dir.join("input.txt");
    let output = dir.join("output.txt");
    fs::write(&input, "1 2 3\n4 5 6\n\n1 2\n3 4\n").unwrap();

    let out = run(&[
        "--input",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("incompatible inner dimensions"));
    assert!(!output.exists());
}

#[test]
fn test_config_file_and_cell_trace() {
    let dir = scratch_dir("config");
    let input = dir.join("input.txt");
    let output = dir.join("output.txt");
    let trace = dir.join("cells.log");
    let config = dir.join("job.toml");
    fs::write(&input, "1 2 3\n\n1\n1\n1\n").unwrap();
    fs::write(
        &config,
        format!(
            "input = {:?}\noutput = {:?}\nmode = \"parallel\"\nstrategy = \"row-per-task\"\n",
            input, output
        ),
    )
    .unwrap();

    let out = run(&[
        "--config",
        config.to_str().unwrap(),
        "--trace-cells",
        trace.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{out:?}");
    assert_eq!(fs::read_to_string(&output).unwrap(), "6.0\n");
    assert!(fs::read_to_string(&trace).unwrap().contains("computed C[0][0] = 6"));
}

#[test]
fn test_verify_rejected_without_parallel_path() {
    let dir = scratch_dir("verify-seq");
    let input = dir.join("input.txt");
    let output = dir.join("output.txt");
    fs::write(&input, "1 2\n3 4\n\n5 6\n7 8\n").unwrap();

    let out = run(&[
        "--input",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--mode",
        "sequential",
        "--verify",
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("--verify needs the parallel path"));
    assert!(!output.exists());
}

#[test]
fn test_cell_trace_lists_each_cell_once_in_both_mode() {
    let dir = scratch_dir("trace-both");
    let input = dir.join("input.txt");
    let output = dir.join("output.txt");
    let trace = dir.join("cells.log");
    fs::write(&input, "1 2\n3 4\n\n5 6\n7 8\n").unwrap();

    let out = run(&[
        "--input",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--workers",
        "2",
        "--trace-cells",
        trace.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{out:?}");

    let text = fs::read_to_string(&trace).unwrap();
    assert_eq!(text.lines().count(), 4, "{text}");
    for cell in ["C[0][0] = 19", "C[0][1] = 22", "C[1][0] = 43", "C[1][1] = 50"] {
        assert_eq!(text.matches(cell).count(), 1, "{cell} in {text}");
    }
}
