//! Tests for propagate subcommand of the CLI
//!
//! Miri is globally disabled for these tests because they mostly involve
//! calling the CLI binary, which Miri doesn't support.
#![cfg(all(test, not(miri)))]

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::fixture::PathChild;
use predicates::{prelude::*, str::contains};
use rstest::{fixture, rstest};
use rulegraph::{Edge, Graph, Node, PortType};

#[fixture]
fn cmd() -> Command {
    Command::cargo_bin("rulegraph").unwrap()
}

#[fixture]
fn propagate_cmd(mut cmd: Command) -> Command {
    cmd.arg("propagate");
    cmd
}

/// `a.out: number -> b.in: generic`, `b.out: generic -> c.in: generic`.
#[fixture]
fn chain() -> Graph {
    let mut g = Graph::new();
    let a = g.add_node(Node::new("a").with_output("out", "number"));
    let b = g.add_node(
        Node::new("b")
            .with_input("in", "generic")
            .with_output("out", "generic"),
    );
    let c = g.add_node(Node::new("c").with_input("in", "generic"));
    g.add_edge(Edge::new((a, "out"), (b, "in"))).unwrap();
    g.add_edge(Edge::new((b, "out"), (c, "in"))).unwrap();
    g
}

fn port_type(graph: &Graph, node: &str, port: &str) -> PortType {
    graph
        .node_by_name(node)
        .unwrap()
        .port(port)
        .unwrap()
        .port_type
        .clone()
}

#[rstest]
fn test_propagate(chain: Graph, mut propagate_cmd: Command) {
    propagate_cmd.write_stdin(serde_json::to_string(&chain).unwrap());
    let output = propagate_cmd.assert().success().get_output().stdout.clone();

    let out: Graph = serde_json::from_slice(&output).unwrap();
    assert_eq!(port_type(&out, "b", "in"), PortType::new("number"));
    // `b.out` has no concrete neighbour.
    assert_eq!(port_type(&out, "b", "out"), PortType::Generic);
    assert_eq!(port_type(&out, "c", "in"), PortType::Generic);
}

#[rstest]
fn test_budget(chain: Graph, mut propagate_cmd: Command) {
    propagate_cmd.args(["--max-iterations", "0"]);
    propagate_cmd.write_stdin(serde_json::to_string(&chain).unwrap());
    let assert = propagate_cmd
        .assert()
        .success()
        .stderr(contains("No fixpoint after 0 iterations"));

    let out: Graph = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(out, chain);
}

#[rstest]
fn test_output_file(chain: Graph, mut propagate_cmd: Command) {
    let dir = TempDir::new().unwrap();
    let out_file = dir.child("typed.json");
    propagate_cmd.args(["--policy", "canonical", "-o"]);
    propagate_cmd.arg(out_file.path());
    propagate_cmd.write_stdin(serde_json::to_string(&chain).unwrap());
    propagate_cmd.assert().success().stdout(predicate::str::is_empty());

    let out = Graph::load_json(std::fs::File::open(out_file.path()).unwrap()).unwrap();
    assert_eq!(port_type(&out, "b", "in"), PortType::new("number"));
}

#[rstest]
fn test_validate_rejects_input(mut propagate_cmd: Command) {
    let json = r#"{"version": "v1", "nodes": [{"id": 0, "name": "a"}],
        "edges": [{"from": {"node": 0, "port": "x"}, "to": {"node": 0, "port": "y"}}]}"#;
    propagate_cmd.arg("--validate");
    propagate_cmd.write_stdin(json);
    propagate_cmd
        .assert()
        .failure()
        .stderr(contains("Graph is invalid"));
}
