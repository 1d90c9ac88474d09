//! Benchmarks for qubit mapping
//!
//! Run with: cargo bench -p qmap-mapper

use std::collections::BTreeMap;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qmap_ir::{Gate, Kernel};
use qmap_mapper::{Grid, Mapper, MapperOptions};
use qmap_platform::{
    HardwareSettings, InstructionDef, InstructionType, Platform, PlatformConfig, ResourcesConfig,
    TopologyConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn grid_platform(side: usize) -> Arc<Platform> {
    let instructions = [
        ("x", 20, InstructionType::Mw),
        ("h", 20, InstructionType::Mw),
        ("cz", 40, InstructionType::Flux),
        ("prepz", 20, InstructionType::None),
        ("swap", 60, InstructionType::Flux),
        ("move", 40, InstructionType::Flux),
    ]
    .into_iter()
    .map(|(name, duration, kind)| (name.to_string(), InstructionDef::new(duration, kind)))
    .collect();
    let config = PlatformConfig {
        name: format!("grid{side}"),
        hardware_settings: HardwareSettings {
            qubit_number: side * side,
            cycle_time: 20,
        },
        topology: TopologyConfig::grid(side, side),
        instructions,
        gate_decomposition: BTreeMap::new(),
        resources: ResourcesConfig::default(),
    };
    Arc::new(Platform::new(config).unwrap())
}

/// A random circuit, one in three gates a two-qubit gate.
fn random_kernel(qubits: usize, gates: usize, seed: u64) -> Kernel {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut k = Kernel::new("random", qubits, 0);
    for _ in 0..gates {
        let a = rng.gen_range(0..qubits);
        if rng.gen_range(0..3) == 0 {
            let mut b = rng.gen_range(0..qubits - 1);
            if b >= a {
                b += 1;
            }
            k.push(Gate::custom("cz", vec![a, b])).unwrap();
        } else {
            let name = if rng.gen_range(0..2) == 0 { "x" } else { "h" };
            k.push(Gate::custom(name, vec![a])).unwrap();
        }
    }
    k
}

fn options(assignments: &[&str]) -> MapperOptions {
    let mut options = MapperOptions::default();
    options.apply(assignments.iter().copied()).unwrap();
    options
}

/// Benchmark building the distance matrix
fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid");

    for side in &[3, 5, 8] {
        let platform = grid_platform(*side);
        group.bench_with_input(BenchmarkId::new("build", side * side), &platform, |b, p| {
            b.iter(|| Grid::new(black_box(p)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark mapping random circuits on square grids
fn bench_map_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_random");
    group.sample_size(20);

    for side in &[3, 4, 5] {
        let qubits = side * side;
        let kernel = random_kernel(qubits, 200, 7);
        let mapper = Mapper::new(grid_platform(*side), options(&["mapseed=1"])).unwrap();
        group.bench_with_input(BenchmarkId::new("minextend", qubits), &kernel, |b, k| {
            b.iter(|| {
                let mut k = k.clone();
                mapper.map(black_box(&mut k)).unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark the effect of the search options on a 4x4 grid
fn bench_search_options(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_options");
    group.sample_size(10);

    let kernel = random_kernel(16, 120, 11);
    let variants: &[(&str, &[&str])] = &[
        ("base", &["mapper=base", "maptiebreak=first"]),
        ("minextend", &["maptiebreak=first"]),
        ("lookahead_all", &["maplookahead=all", "maptiebreak=first"]),
        ("level1", &["mapselectmaxlevel=1", "maptiebreak=first"]),
        ("borders", &["mappathselect=borders", "maptiebreak=first"]),
    ];
    for (name, assignments) in variants {
        let mapper = Mapper::new(grid_platform(4), options(assignments)).unwrap();
        group.bench_function(*name, |b| {
            b.iter(|| {
                let mut k = kernel.clone();
                mapper.map(black_box(&mut k)).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_grid, bench_map_random, bench_search_options);
criterion_main!(benches);
