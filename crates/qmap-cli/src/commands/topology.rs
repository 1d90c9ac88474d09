//! Topology command implementation.

use anyhow::{Context, Result};
use console::style;

use qmap_mapper::Grid;
use qmap_mapper::grid::UNREACHABLE;

use super::common::load_platform;

/// Execute the topology command.
pub fn execute(platform: &str) -> Result<()> {
    let platform = load_platform(platform)?;
    let grid = Grid::new(&platform).context("Invalid topology")?;
    print!("{}", render(&grid, platform.name()));
    Ok(())
}

/// Neighbours, cores and the distance matrix as text.
fn render(grid: &Grid, name: &str) -> String {
    let n = grid.qubit_count();
    let mut out = String::new();

    out.push_str(&format!(
        "{} {} ({} qubits, form {:?}, {} core(s))\n\n",
        style("Topology").cyan().bold(),
        style(if name.is_empty() { "<unnamed>" } else { name }).yellow(),
        n,
        grid.form(),
        grid.core_count()
    ));

    out.push_str("Neighbours:\n");
    for q in 0..n {
        let coord = grid
            .coordinate(q)
            .map_or_else(String::new, |(x, y)| format!(" @({x},{y})"));
        let nbs: Vec<String> = grid.neighbors(q).iter().map(ToString::to_string).collect();
        out.push_str(&format!(
            "  q{q:<3} core {}{coord}: {}\n",
            grid.core_of(q),
            nbs.join(" ")
        ));
    }

    out.push_str("\nDistances:\n     ");
    for j in 0..n {
        out.push_str(&format!("{j:>4}"));
    }
    out.push('\n');
    for i in 0..n {
        out.push_str(&format!("  {i:>3}"));
        for j in 0..n {
            let d = grid.distance(i, j);
            if d == UNREACHABLE {
                out.push_str("   -");
            } else {
                out.push_str(&format!("{d:>4}"));
            }
        }
        out.push('\n');
    }
    out
}
