use anyhow::{Context, Result};
use lattice_common::{FireSnapshot, SweepPoint};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const FIRE_HEADER: &str = "#step_number, empty, tree, burning";
pub const SWEEP_HEADER: &str = "# p, spanning_probability";

/// Result file encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    /// Maps the config string; `None` means CSV.
    pub fn from_config(format: Option<&str>) -> Result<Self> {
        match format {
            None | Some("csv") => Ok(OutputFormat::Csv),
            Some("json") => Ok(OutputFormat::Json),
            Some(other) => anyhow::bail!("Unknown output format: {}", other),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Writes a comment header line followed by headerless CSV rows.
fn write_csv<W: Write, T: Serialize>(mut out: W, header: &str, records: &[T]) -> Result<()> {
    writeln!(out, "{}", header)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Fire time series as `step,empty,tree,burning` rows.
pub fn write_fire_csv<W: Write>(out: W, series: &[FireSnapshot]) -> Result<()> {
    write_csv(out, FIRE_HEADER, series)
}

/// Sweep results as `p,spanning_fraction` rows.
pub fn write_sweep_csv<W: Write>(out: W, points: &[SweepPoint]) -> Result<()> {
    write_csv(out, SWEEP_HEADER, points)
}

/// Encodes `records` into `out`; failures name `path`.
fn write_records<W: Write, T: Serialize>(
    mut out: W,
    path: &Path,
    format: OutputFormat,
    header: &str,
    records: &[T],
) -> Result<()> {
    let written = match format {
        OutputFormat::Csv => write_csv(&mut out, header, records),
        OutputFormat::Json => serde_json::to_writer(&mut out, records)
            .map_err(anyhow::Error::from)
            .and_then(|()| out.flush().map_err(anyhow::Error::from)),
    };
    written.with_context(|| format!("Error writing '{}'", path.display()))
}

fn save<T: Serialize>(path: &Path, format: OutputFormat, header: &str, records: &[T]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Error creating output file '{}'", path.display()))?;
    write_records(BufWriter::new(file), path, format, header, records)?;
    info!("{} records saved to {}", records.len(), path.display());
    Ok(())
}

/// Saves the fire series to `<base>_fire.<ext>` and returns the path.
pub fn save_fire_series(base_filename: &str, format: OutputFormat, series: &[FireSnapshot]) -> Result<PathBuf> {
    let path = PathBuf::from(format!("{}_fire.{}", base_filename, format.extension()));
    save(&path, format, FIRE_HEADER, series)?;
    Ok(path)
}

/// Saves sweep results to `<base>_percolation.<ext>` and returns the path.
pub fn save_sweep(base_filename: &str, format: OutputFormat, points: &[SweepPoint]) -> Result<PathBuf> {
    let path = PathBuf::from(format!("{}_percolation.{}", base_filename, format.extension()));
    save(&path, format, SWEEP_HEADER, points)?;
    Ok(path)
}
