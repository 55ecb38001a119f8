//! Tests for equals subcommand of the CLI
//!
//! Miri is globally disabled for these tests because they mostly involve
//! calling the CLI binary, which Miri doesn't support.
#![cfg(all(test, not(miri)))]

use assert_cmd::Command;
use assert_fs::{NamedTempFile, fixture::FileWriteStr};
use predicates::str::contains;
use rstest::{fixture, rstest};
use rulegraph_cli::equals::EQUAL_PRINT;

#[fixture]
fn cmd() -> Command {
    Command::cargo_bin("rulegraph").unwrap()
}

#[fixture]
fn equals_cmd(mut cmd: Command) -> Command {
    cmd.arg("equals");
    cmd
}

fn graph_file(name: &str, json: &str) -> NamedTempFile {
    let file = NamedTempFile::new(name).unwrap();
    file.write_str(json).unwrap();
    file
}

const PAIR: &str = r#"{"version": "v1",
    "nodes": [
        {"id": 0, "name": "a", "ports": [{"port": "o", "kind": "output", "type": "number"}]},
        {"id": 1, "name": "b", "ports": [{"port": "i", "kind": "input", "type": "number"}]}
    ],
    "edges": [{"from": {"node": 0, "port": "o"}, "to": {"node": 1, "port": "i"}}]}"#;

/// The same graph with different node handles, listed in another order.
const PAIR_RENUMBERED: &str = r#"{"version": "v1",
    "nodes": [
        {"id": 9, "name": "b", "ports": [{"port": "i", "kind": "input", "type": "number"}]},
        {"id": 4, "name": "a", "ports": [{"port": "o", "kind": "output", "type": "number"}]}
    ],
    "edges": [{"from": {"node": 4, "port": "o"}, "to": {"node": 9, "port": "i"}}]}"#;

const PAIR_RETYPED: &str = r#"{"version": "v1",
    "nodes": [
        {"id": 0, "name": "a", "ports": [{"port": "o", "kind": "output", "type": "text"}]},
        {"id": 1, "name": "b", "ports": [{"port": "i", "kind": "input", "type": "number"}]}
    ],
    "edges": [{"from": {"node": 0, "port": "o"}, "to": {"node": 1, "port": "i"}}]}"#;

#[rstest]
#[case("isomorphic")]
#[case("canonical")]
fn test_handles_are_ignored(mut equals_cmd: Command, #[case] policy: &str) {
    let first = graph_file("first.json", PAIR);
    let second = graph_file("second.json", PAIR_RENUMBERED);
    equals_cmd.arg(first.path()).arg(second.path());
    equals_cmd.args(["--policy", policy]);
    equals_cmd.assert().success().stderr(contains(EQUAL_PRINT));
}

#[rstest]
fn test_different(mut equals_cmd: Command) {
    let first = graph_file("first.json", PAIR);
    let second = graph_file("second.json", PAIR_RETYPED);
    equals_cmd.arg(first.path()).arg(second.path());
    equals_cmd
        .assert()
        .failure()
        .stderr(contains("Graphs differ under isomorphic equality."));
}

#[rstest]
fn test_stdin(mut equals_cmd: Command) {
    let second = graph_file("second.json", PAIR);
    equals_cmd.arg("-").arg(second.path());
    equals_cmd.write_stdin(PAIR_RENUMBERED);
    equals_cmd.assert().success().stderr(contains(EQUAL_PRINT));
}
