//! Shared helpers for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use qmap_ir::{Kernel, Program};
use qmap_platform::Platform;

/// Input files hold either a whole program or a single kernel.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProgramFile {
    Program(Program),
    Kernel(Kernel),
}

/// Load a platform description.
pub fn load_platform(path: &str) -> Result<Platform> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    Platform::load(path).with_context(|| format!("Failed to load platform: {path}"))
}

/// Load a program, or a single kernel wrapped in a program of its own.
pub fn load_program(path: &str) -> Result<Program> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;

    let ext = path_obj.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !ext.eq_ignore_ascii_case("json") {
        anyhow::bail!("Unsupported input format '{ext}', expected .json");
    }

    let program = match serde_json::from_str::<ProgramFile>(&source)
        .with_context(|| format!("Failed to parse program: {path}"))?
    {
        ProgramFile::Program(program) => program,
        ProgramFile::Kernel(kernel) => Program {
            name: kernel.name.clone(),
            kernels: vec![kernel],
        },
    };
    program
        .validate()
        .with_context(|| format!("Invalid program: {path}"))?;
    Ok(program)
}

/// Default output path: `<stem>_mapped.json` next to the input.
pub fn default_output(input: &str) -> PathBuf {
    let path = Path::new(input);
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    path.with_file_name(format!("{stem}_mapped.json"))
}

/// Write `value` as pretty JSON.
pub fn save_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    fs::write(path, content).with_context(|| format!("Failed to write file: {}", path.display()))
}
