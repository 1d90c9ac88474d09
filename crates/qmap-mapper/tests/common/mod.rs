//! Shared fixtures for the mapper integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use qmap_ir::{Gate, Kernel};
use qmap_mapper::{Grid, MapperOptions};
use qmap_platform::{
    HardwareSettings, InstructionDef, InstructionType, Platform, PlatformConfig, ResourcesConfig,
    TopologyConfig,
};

pub const CYCLE_TIME: u64 = 20;

/// A platform with the usual instruction set on the given topology.
pub fn platform(name: &str, qubits: usize, topology: TopologyConfig) -> Arc<Platform> {
    platform_with_resources(name, qubits, topology, ResourcesConfig::default())
}

pub fn platform_with_resources(
    name: &str,
    qubits: usize,
    topology: TopologyConfig,
    resources: ResourcesConfig,
) -> Arc<Platform> {
    let instructions = [
        ("x", 20, InstructionType::Mw),
        ("y", 20, InstructionType::Mw),
        ("h", 20, InstructionType::Mw),
        ("cz", 40, InstructionType::Flux),
        ("cnot", 40, InstructionType::Flux),
        ("prepz", 20, InstructionType::None),
        ("measure", 300, InstructionType::Readout),
        ("swap", 60, InstructionType::Flux),
        ("move", 40, InstructionType::Flux),
        ("tswap", 120, InstructionType::Flux),
        ("tmove", 80, InstructionType::Flux),
    ]
    .into_iter()
    .map(|(name, duration, kind)| (name.to_string(), InstructionDef::new(duration, kind)))
    .collect();
    let config = PlatformConfig {
        name: name.to_string(),
        hardware_settings: HardwareSettings {
            qubit_number: qubits,
            cycle_time: CYCLE_TIME,
        },
        topology,
        instructions,
        gate_decomposition: BTreeMap::new(),
        resources,
    };
    Arc::new(Platform::new(config).unwrap())
}

pub fn linear(n: usize) -> Arc<Platform> {
    platform(&format!("linear{n}"), n, TopologyConfig::linear(n))
}

pub fn ring(n: usize) -> Arc<Platform> {
    platform(&format!("ring{n}"), n, TopologyConfig::ring(n))
}

pub fn grid(rows: usize, cols: usize) -> Arc<Platform> {
    platform(
        &format!("grid{rows}x{cols}"),
        rows * cols,
        TopologyConfig::grid(rows, cols),
    )
}

/// Options with a fixed seed plus `key=value` overrides.
pub fn options(assignments: &[&str]) -> MapperOptions {
    let mut options = MapperOptions::default();
    options.set("mapseed", "42").unwrap();
    options.apply(assignments.iter().copied()).unwrap();
    options
}

/// A kernel from `(name, qubits)` pairs.
pub fn kernel(qubits: usize, gates: &[(&str, &[usize])]) -> Kernel {
    let mut k = Kernel::new("kernel", qubits, 0);
    for (name, operands) in gates {
        k.push(Gate::custom(*name, operands.to_vec())).unwrap();
    }
    k
}

pub fn names(kernel: &Kernel) -> Vec<&str> {
    kernel.gates.iter().map(|g| g.name.as_str()).collect()
}

/// Every two-qubit gate acts on nearest neighbours.
pub fn assert_adjacent(grid: &Grid, kernel: &Kernel) {
    for gate in kernel.gates.iter().filter(|g| g.qubits.len() == 2) {
        assert_eq!(
            grid.distance(gate.qubits[0], gate.qubits[1]),
            1,
            "{gate} is not on neighbours"
        );
    }
}

/// Per physical qubit, gates start in order and never overlap.
pub fn assert_no_overlap(kernel: &Kernel, qubits: usize) {
    let mut busy_until = vec![0u64; qubits];
    for gate in &kernel.gates {
        let Some(start) = gate.cycle else { continue };
        for &q in &gate.qubits {
            assert!(
                start >= busy_until[q],
                "{gate} starts before qubit {q} is free at {}",
                busy_until[q]
            );
            busy_until[q] = start + gate.duration_cycles(CYCLE_TIME);
        }
    }
}
