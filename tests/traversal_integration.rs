//! Traversal integration tests.
//!
//! Runs path queries against the reference graph
//!
//! ```text
//! 1 -> 2 -> 6
//!      2 -> 3 -> 5
//!      2 -> 4
//! ```
//!
//! with edges created in that order, so result order is fully determined.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use graphrel::{Direction, Error, Graph, GraphConfig, Node, NodeId, Traversal, TraversalResult};
use serde_json::json;
use tempfile::TempDir;
use test_case::test_case;

struct Fixture {
    graph: Graph,
    nodes: Vec<Node>,
    _temp_dir: TempDir,
}

impl Fixture {
    /// Builds the reference graph. `n(k)` is the node labelled `k` above.
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config = GraphConfig::default().with_db_path(temp_dir.path().join("traversal.db"));
        let graph = Graph::open(&config).unwrap();

        let nodes: Vec<Node> = (1..=6)
            .map(|k| graph.create_node(&json!({ "k": k })).unwrap())
            .collect();
        let fixture = Self {
            graph,
            nodes,
            _temp_dir: temp_dir,
        };

        for (from, to) in [(1, 2), (2, 6), (2, 3), (3, 5), (2, 4)] {
            fixture
                .n(from)
                .create_edge(&fixture.n(to), Some("next"), None)
                .unwrap();
        }
        fixture
    }

    fn n(&self, k: usize) -> Node {
        self.nodes[k - 1].clone()
    }

    fn ids(&self, ks: &[usize]) -> Vec<NodeId> {
        ks.iter().map(|&k| self.n(k).id()).collect()
    }

    fn paths(&self, result: &TraversalResult) -> Vec<Vec<NodeId>> {
        result.paths().iter().map(graphrel::Path::node_ids).collect()
    }

    fn run(&self, traversal: &Traversal) -> TraversalResult {
        self.graph.traverse(traversal).unwrap()
    }
}

#[test]
fn test_out_depth_four_yields_maximal_paths_in_order() {
    let f = Fixture::new();
    let result = f.run(&Traversal::new(f.n(1).id()).with_depth(4));

    assert_eq!(result.len(), 3);
    assert_eq!(
        f.paths(&result),
        vec![f.ids(&[1, 2, 6]), f.ids(&[1, 2, 3, 5]), f.ids(&[1, 2, 4])]
    );
    assert_eq!(result.node_ids(), f.ids(&[1, 2, 6, 3, 5, 4]));
}

#[test]
fn test_in_from_root_is_empty() {
    let f = Fixture::new();
    let result = f.run(
        &Traversal::new(f.n(1).id())
            .with_direction(Direction::In)
            .with_depth_range(1, 4),
    );
    assert!(result.is_empty());
    assert!(result.nodes().is_empty());
}

#[test]
fn test_in_walks_back_to_root() {
    let f = Fixture::new();
    let result = f.run(
        &Traversal::new(f.n(5).id())
            .with_direction(Direction::In)
            .with_depth(4),
    );
    assert_eq!(f.paths(&result), vec![f.ids(&[5, 3, 2, 1])]);
}

#[test]
fn test_end_node_constrains_paths() {
    let f = Fixture::new();
    let result = f.run(&Traversal::new(f.n(1).id()).with_depth(2).with_end(f.n(4).id()));
    assert_eq!(f.paths(&result), vec![f.ids(&[1, 2, 4])]);
}

#[test]
fn test_paths_stop_at_end_node() {
    let f = Fixture::new();
    let result = f.run(&Traversal::new(f.n(1).id()).with_depth(4).with_end(f.n(3).id()));
    assert_eq!(f.paths(&result), vec![f.ids(&[1, 2, 3])]);
}

#[test]
fn test_unreachable_end_is_empty() {
    let f = Fixture::new();
    let result = f.run(&Traversal::new(f.n(6).id()).with_depth(4).with_end(f.n(1).id()));
    assert!(result.is_empty());
}

#[test]
fn test_either_walks_mirror_rows() {
    let f = Fixture::new();
    let result = f.run(
        &Traversal::new(f.n(6).id())
            .with_direction(Direction::Either)
            .with_depth(3),
    );
    assert_eq!(
        f.paths(&result),
        vec![f.ids(&[6, 2, 1]), f.ids(&[6, 2, 3, 5]), f.ids(&[6, 2, 4])]
    );
    assert_eq!(result.node_ids(), f.ids(&[6, 2, 1, 3, 5, 4]));
}

#[test]
fn test_min_depth_drops_short_paths() {
    let f = Fixture::new();
    let result = f.run(&Traversal::new(f.n(1).id()).with_depth_range(3, 4));
    assert_eq!(f.paths(&result), vec![f.ids(&[1, 2, 3, 5])]);
}

#[test]
fn test_exact_depth() {
    let f = Fixture::new();
    let result = f.run(&Traversal::new(f.n(1).id()).with_depth_range(2, 2));
    assert_eq!(
        f.paths(&result),
        vec![f.ids(&[1, 2, 6]), f.ids(&[1, 2, 3]), f.ids(&[1, 2, 4])]
    );
}

#[test]
fn test_min_zero_prepends_trivial_path() {
    let f = Fixture::new();
    let result = f.run(&Traversal::new(f.n(1).id()).with_depth_range(0, 1));
    assert_eq!(f.paths(&result), vec![f.ids(&[1]), f.ids(&[1, 2])]);
    assert_eq!(result.paths()[0].hops(), 0);
}

#[test]
fn test_trivial_path_respects_end() {
    let f = Fixture::new();
    let start = f.n(2).id();

    let to_self = f.run(&Traversal::new(start).with_depth_range(0, 2).with_end(start));
    assert_eq!(f.paths(&to_self), vec![f.ids(&[2])]);

    let elsewhere = f.run(
        &Traversal::new(start)
            .with_depth_range(0, 2)
            .with_end(f.n(5).id()),
    );
    assert_eq!(f.paths(&elsewhere), vec![f.ids(&[2, 3, 5])]);
}

#[test]
fn test_isolated_start_is_empty() {
    let f = Fixture::new();
    let loner = f.graph.create_node(&json!({})).unwrap();
    for direction in [Direction::Out, Direction::In, Direction::Either] {
        let result = f.run(
            &Traversal::new(loner.id())
                .with_direction(direction)
                .with_depth(3),
        );
        assert!(result.is_empty(), "{direction}");
    }
}

#[test]
fn test_label_filter_applies_to_every_hop() {
    let f = Fixture::new();
    f.n(6).create_edge(&f.n(5), Some("other"), None).unwrap();
    f.n(4).create_edge(&f.n(5), Some("next"), None).unwrap();

    let result = f.run(
        &Traversal::new(f.n(1).id())
            .with_depth(4)
            .with_label("next"),
    );
    assert_eq!(
        f.paths(&result),
        vec![f.ids(&[1, 2, 6]), f.ids(&[1, 2, 3, 5]), f.ids(&[1, 2, 4, 5])]
    );

    let none = f.run(&Traversal::new(f.n(1).id()).with_depth(4).with_label("other"));
    assert!(none.is_empty());
}

#[test]
fn test_cycles_never_revisit_nodes() {
    let f = Fixture::new();
    // Close 5 back onto 2 and 1.
    f.n(5).create_edge(&f.n(2), None, None).unwrap();
    f.n(5).create_edge(&f.n(1), None, None).unwrap();

    let result = f.run(&Traversal::new(f.n(1).id()).with_depth(8));
    for path in result.paths() {
        let ids = path.node_ids();
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len(), "revisit in {ids:?}");
    }
    assert_eq!(
        f.paths(&result),
        vec![f.ids(&[1, 2, 6]), f.ids(&[1, 2, 3, 5]), f.ids(&[1, 2, 4])]
    );
}

#[test]
fn test_cursor_matches_materialized_result() {
    let f = Fixture::new();
    let traversal = Traversal::new(f.n(1).id()).with_depth(4);

    let cursor = f.graph.traverse_cursor(&traversal).unwrap();
    assert_eq!(cursor.size_hint(), (3, Some(3)));
    let streamed: Vec<Vec<NodeId>> = cursor.map(|p| p.node_ids()).collect();

    let result = f.run(&traversal);
    assert_eq!(streamed, f.paths(&result));
    // Reading a result twice gives the same answer.
    assert_eq!(f.paths(&result), f.paths(&result));
    assert_eq!(result.node_ids(), result.node_ids());
}

#[test]
fn test_cursor_into_result_after_partial_read() {
    let f = Fixture::new();
    let mut cursor = f
        .graph
        .traverse_cursor(&Traversal::new(f.n(1).id()).with_depth(4))
        .unwrap();
    let first = cursor.next().unwrap();
    assert_eq!(first.node_ids(), f.ids(&[1, 2, 6]));

    let rest = cursor.into_result();
    assert_eq!(rest.len(), 2);
    assert_eq!(rest.node_ids(), f.ids(&[1, 2, 3, 5, 4]));
}

#[test]
fn test_path_nodes_carry_payloads() {
    let f = Fixture::new();
    let result = f.run(&Traversal::new(f.n(1).id()).with_depth(2).with_end(f.n(6).id()));
    let path = &result.paths()[0];
    assert_eq!(path.terminus().unwrap().payload().unwrap(), json!({"k": 6}));
    assert_eq!(path.start().unwrap(), &f.n(1));
    assert_eq!(path.into_iter().count(), 3);
}

#[test_case(3, 2 ; "inverted range")]
#[test_case(1, 33 ; "above default maximum")]
#[test_case(0, 64 ; "above join cap")]
fn test_bad_depth_is_invalid_input(min: u32, max: u32) {
    let f = Fixture::new();
    let err = f
        .graph
        .traverse(&Traversal::new(f.n(1).id()).with_depth_range(min, max))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn test_deep_traversal_at_configured_maximum() {
    let temp_dir = TempDir::new().unwrap();
    let config = GraphConfig::default()
        .with_db_path(temp_dir.path().join("chain.db"))
        .with_max_traversal_depth(40);
    let graph = Graph::open(&config).unwrap();

    let chain: Vec<Node> = (0..=40)
        .map(|i| graph.create_node(&json!({ "i": i })).unwrap())
        .collect();
    for pair in chain.windows(2) {
        pair[0].create_edge(&pair[1], None, None).unwrap();
    }

    let result = graph
        .traverse(&Traversal::new(chain[0].id()).with_depth(40))
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.paths()[0].hops(), 40);
    assert_eq!(result.nodes().len(), 41);
}
