//! File utility functions

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Expand `~` and make relative paths absolute against the working directory.
///
/// The path is not canonicalized: `./a/../b` keeps its components.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    let expanded = match path {
        "" => PathBuf::from("."),
        "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        _ => match (path.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(path),
        },
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

/// Read a whole input, where `-` means standard input
pub fn read_input(source: &str) -> Result<Vec<u8>> {
    if source == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read standard input")?;
        return Ok(buf);
    }
    read_file(&expand_path(source))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    tracing::debug!(path = %path.display(), "Reading input file");
    std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
}
