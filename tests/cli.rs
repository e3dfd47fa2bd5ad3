use std::process::ExitStatus;

use assert_cmd::Command;
use testify::temp::write_temp_file;

fn run_command(args: Vec<&str>) -> (String, ExitStatus) {
    let mut cmd = Command::cargo_bin("cnc").unwrap();
    for arg in args {
        cmd.arg(arg);
    }

    let output = cmd.output().expect("Failed to execute process");
    let stdout = String::from_utf8(output.stdout).expect("Output is not a valid utf8 string");

    (stdout, output.status)
}

fn assert_no_log_lines(output: &str) {
    // Assert there are no lines with keywords
    let keywords = ["ERROR", "WARN", "INFO", "DEBUG", "TRACE"];
    for line in output.lines() {
        let present = keywords.iter().any(|word| line.contains(word));
        assert!(!present, "Log detected in output line: {:?}", line);
    }
}

const SNAPSHOT: &str = r#"{
    "type": "data",
    "payload": {
        "rules": [
            {"id": 1, "selector": [["namespace", "=", "dev"], ["pod", "=", "a"]], "action": "drop"},
            {"id": 2, "selector": [["namespace", "=", "dev"]], "action": "keep"}
        ],
        "agents": [
            {"name": "agent-1", "targets": [
                {"namespace": "dev", "pod": "a"},
                {"namespace": "dev", "pod": "b"},
                {"namespace": "prod", "pod": "c"}
            ]}
        ]
    }
}"#;

#[test]
fn clean_output() {
    let snapshot = write_temp_file(SNAPSHOT);
    let snapshot = snapshot.to_str().unwrap();

    let tests = vec![
        (vec!["--version"], true),
        (vec!["groups", "--snapshot", snapshot], true),
        (vec!["groups", "--snapshot", snapshot, "--by", "namespace,pod", "-r"], true),
        (vec!["groups", "--snapshot", "/not/exist.json"], false),
        (vec!["validate"], true),
        (vec!["something_not_exist"], false),
    ];

    for (args, want) in tests {
        let (output, status) = run_command(args.clone());
        assert_no_log_lines(&output);
        assert_eq!(status.success(), want, "args: {:?}", args)
    }
}

#[test]
fn groups_from_snapshot() {
    let snapshot = write_temp_file(SNAPSHOT);

    let (output, status) = run_command(vec![
        "groups",
        "--snapshot",
        snapshot.to_str().unwrap(),
        "--by",
        "namespace",
    ]);
    assert!(status.success());

    assert!(output.contains("3 targets, 1 profiled, 2 groups"), "{output}");
    let rows = output
        .lines()
        .skip_while(|line| !line.starts_with('#'))
        .collect::<Vec<_>>();
    assert_eq!(
        rows,
        vec![
            "#  namespace  Total  Profiled  Status",
            "1  dev        2      1         partial",
            "2  prod       1      0         none kept",
        ]
    );
}

#[test]
fn groups_exit_codes() {
    let broken = write_temp_file(r#"{"type": "data", "payload": {"rules": "nope"}}"#);

    let (_, status) = run_command(vec!["groups", "--snapshot", broken.to_str().unwrap()]);
    assert_eq!(status.code(), Some(exitcode::DATAERR));

    let (_, status) = run_command(vec!["groups", "--snapshot", "/not/exist.json"]);
    assert_eq!(status.code(), Some(exitcode::NOINPUT));
}

#[test]
fn validate_config() {
    let valid = write_temp_file("address: 10.0.0.1:8333\nreconnect:\n  interval: 500ms\n");
    let (output, status) = run_command(vec!["validate", "-c", valid.to_str().unwrap()]);
    assert!(status.success());
    assert!(output.contains("address: 10.0.0.1:8333"), "{output}");
    assert!(output.contains("interval: 500ms"), "{output}");
    assert!(output.contains("Validated"), "{output}");

    let invalid = write_temp_file("reconnect:\n  attempts: 0\n");
    let (output, status) = run_command(vec!["validate", "-c", invalid.to_str().unwrap()]);
    assert_eq!(status.code(), Some(exitcode::CONFIG));
    assert!(output.contains("reconnect.attempts must be at least 1"), "{output}");

    let unknown = write_temp_file("adress: 10.0.0.1:8333\n");
    let (_, status) = run_command(vec!["validate", "-c", unknown.to_str().unwrap()]);
    assert_eq!(status.code(), Some(exitcode::CONFIG));
}
