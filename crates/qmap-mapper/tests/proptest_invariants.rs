//! Property-based tests for the mapper's invariants.

mod common;

use std::collections::BTreeSet;

use common::{assert_adjacent, assert_no_overlap, grid, options};
use proptest::prelude::*;
use qmap_ir::{Gate, Kernel};
use qmap_mapper::{Grid, Mapper, RealState, Virt2Real};
use qmap_platform::{Edge, TopologyConfig};

const QUBITS: usize = 6;

/// A connected graph: a random spanning tree plus random extra edges.
fn arb_connected(max: usize) -> impl Strategy<Value = (usize, TopologyConfig)> {
    (2..=max)
        .prop_flat_map(|n| {
            let parents: Vec<_> = (1..n).map(|i| 0..i).collect();
            let extra = prop::collection::vec((0..n, 0..n), 0..n);
            (Just(n), parents, extra)
        })
        .prop_map(|(n, parents, extra)| {
            let mut pairs = BTreeSet::new();
            for (i, p) in parents.into_iter().enumerate() {
                pairs.insert((p, i + 1));
            }
            for (a, b) in extra {
                if a != b {
                    pairs.insert((a.min(b), a.max(b)));
                }
            }
            let edges = pairs
                .into_iter()
                .flat_map(|(a, b)| [Edge::new(a, b), Edge::new(b, a)])
                .collect();
            let topology = TopologyConfig {
                form: Some("irregular".into()),
                edges,
                ..TopologyConfig::default()
            };
            (n, topology)
        })
}

#[derive(Debug, Clone)]
enum Op {
    Allocate(usize),
    Swap(usize, usize),
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        (0..QUBITS).prop_map(Op::Allocate),
        (0..QUBITS, 0..QUBITS - 1).prop_map(|(a, b)| Op::Swap(a, if b >= a { b + 1 } else { b })),
    ];
    prop::collection::vec(op, 0..50)
}

fn arb_state() -> impl Strategy<Value = RealState> {
    prop_oneof![
        Just(RealState::NoState),
        Just(RealState::WasInited),
        Just(RealState::HasState),
    ]
}

fn arb_kernel() -> impl Strategy<Value = Kernel> {
    let gate = prop_oneof![
        (0..QUBITS).prop_map(|q| Gate::custom("x", vec![q])),
        (0..QUBITS, 0..QUBITS - 1).prop_map(|(a, b)| {
            let b = if b >= a { b + 1 } else { b };
            Gate::custom("cz", vec![a, b])
        }),
    ];
    prop::collection::vec(gate, 1..25).prop_map(|gates| {
        let mut k = Kernel::new("k", QUBITS, 0);
        for gate in gates {
            k.push(gate).unwrap();
        }
        k
    })
}

proptest! {
    #[test]
    fn distance_is_a_metric((n, topology) in arb_connected(8)) {
        let grid = Grid::from_topology(&topology, n).unwrap();
        for i in 0..n {
            prop_assert_eq!(grid.distance(i, i), 0);
            for j in 0..n {
                prop_assert_eq!(grid.distance(i, j), grid.distance(j, i));
                prop_assert!(grid.distance(i, j) < n);
                for k in 0..n {
                    prop_assert!(grid.distance(i, j) <= grid.distance(i, k) + grid.distance(k, j));
                }
            }
        }
    }

    #[test]
    fn mapping_stays_injective(one_to_one in any::<bool>(), ops in arb_ops()) {
        let mut v2r = Virt2Real::new(QUBITS, one_to_one, false);
        for op in ops {
            match op {
                Op::Allocate(v) => {
                    v2r.allocate(v).unwrap();
                }
                Op::Swap(a, b) => v2r.swap(a, b),
            }
            let mapped: Vec<usize> = v2r.mapping().iter().flatten().copied().collect();
            let distinct: BTreeSet<usize> = mapped.iter().copied().collect();
            prop_assert_eq!(mapped.len(), distinct.len());
            for (v, r) in v2r.mapping().iter().enumerate() {
                if let Some(r) = r {
                    prop_assert_eq!(v2r.virt_of(*r), Some(v));
                }
            }
        }
    }

    #[test]
    fn swap_is_an_involution(
        ops in arb_ops(),
        states in prop::collection::vec(arb_state(), QUBITS),
        (a, b) in (0..QUBITS, 0..QUBITS - 1),
    ) {
        let b = if b >= a { b + 1 } else { b };
        let mut v2r = Virt2Real::new(QUBITS, false, false);
        for op in ops {
            if let Op::Allocate(v) = op {
                v2r.allocate(v).unwrap();
            }
        }
        for (r, state) in states.into_iter().enumerate() {
            v2r.set_state(r, state);
        }
        let before = v2r.clone();
        v2r.swap(a, b);
        v2r.swap(a, b);
        prop_assert_eq!(v2r, before);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn mapped_output_is_executable(
        kernel in arb_kernel(),
        lookahead in prop::sample::select(vec!["no", "1qfirst", "noroutingfirst", "all"]),
        moves in prop::sample::select(vec!["no", "yes"]),
        heuristic in prop::sample::select(vec!["base", "minextend", "minextendrc"]),
    ) {
        let mapper = Mapper::new(
            grid(2, 3),
            options(&[
                format!("maplookahead={lookahead}").as_str(),
                format!("mapusemoves={moves}").as_str(),
                format!("mapper={heuristic}").as_str(),
            ]),
        )
        .unwrap();
        let mut mapped = kernel.clone();
        let report = mapper.map(&mut mapped).unwrap();

        assert_adjacent(mapper.grid(), &mapped);
        assert_no_overlap(&mapped, QUBITS);
        let count = |k: &Kernel, name: &str| k.gates.iter().filter(|g| g.name == name).count();
        prop_assert_eq!(count(&mapped, "cz"), count(&kernel, "cz"));
        prop_assert_eq!(count(&mapped, "x"), count(&kernel, "x"));
        prop_assert_eq!(
            count(&mapped, "swap") + count(&mapped, "move"),
            report.swaps_added
        );
    }
}
