//! Map command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use tracing::info;

use qmap_mapper::{MapReport, Mapper, MapperOptions};

use super::common::{default_output, load_platform, load_program, save_json};

/// Execute the map command.
pub async fn execute(
    platform: &str,
    input: &str,
    output: Option<&str>,
    options: &[String],
    chain: bool,
    report: Option<&str>,
) -> Result<()> {
    println!(
        "{} Mapping {} onto {}",
        style("→").cyan().bold(),
        style(input).green(),
        style(platform).yellow()
    );

    let platform = load_platform(platform)?;
    println!(
        "  Platform: {} qubits, cycle time {} ns",
        platform.qubit_count(),
        platform.cycle_time()
    );

    let mut mapper_options = MapperOptions::default();
    mapper_options
        .apply(options.iter().map(String::as_str))
        .context("Invalid mapper option")?;
    let mapper = Mapper::new(Arc::new(platform), mapper_options)
        .context("Platform cannot be mapped onto")?;

    let mut program = load_program(input)?;
    println!("  Loaded: {} kernel(s)", program.kernels.len());

    let reports = map_program(&mapper, &mut program.kernels, chain).await?;

    println!("{} Mapping complete", style("✓").green().bold());
    for r in &reports {
        let placement = r
            .placement
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        println!(
            "  {:<20} swaps {:>4}  moves {:>4}  depth {:>6}  placement {}",
            style(&r.kernel).cyan(),
            r.swaps_added,
            r.moves_added,
            r.depth,
            style(placement).dim()
        );
    }

    let output_path = output.map_or_else(|| default_output(input), PathBuf::from);
    save_json(&program, &output_path)?;
    println!("  Output: {}", style(output_path.display()).green());

    if let Some(report) = report {
        let report_path = PathBuf::from(report);
        save_json(&reports, &report_path)?;
        println!("  Report: {}", style(report_path.display()).green());
    }

    Ok(())
}

/// Map the kernels in order. With `chain` every kernel after the first
/// starts from the final mapping of the one before.
async fn map_program(
    mapper: &Mapper,
    kernels: &mut [qmap_ir::Kernel],
    chain: bool,
) -> Result<Vec<MapReport>> {
    let mut reports: Vec<MapReport> = Vec::with_capacity(kernels.len());
    for kernel in kernels.iter_mut() {
        let report = match reports.last() {
            Some(previous) if chain => mapper.map_from(kernel, previous.final_mapping()),
            _ => mapper.map_with_placement(kernel).await,
        }
        .with_context(|| format!("Failed to map kernel '{}'", kernel.name))?;
        reports.push(report);
    }
    let swaps: usize = reports.iter().map(|r| r.swaps_added).sum();
    info!(kernels = reports.len(), swaps, "program mapped");
    Ok(reports)
}
