//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - qubit mapping for connectivity-constrained devices",
        style("qmap").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qmap-ir        Gates, kernels and dependency graphs");
    println!("  qmap-platform  Platform descriptions and resources");
    println!("  qmap-mapper    Routing, initial placement and scheduling");
    println!("  qmap-cli       Command-line interface");
    println!();
    println!("License:    {}", style(env!("CARGO_PKG_LICENSE")).dim());
}
