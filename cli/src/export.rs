use crate::error::CliError;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tonepeak_core::{DemodError, DisplayView, ResultSink, ResultTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
    Xlsx,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
            Some(ext) if ext == "csv" => Ok(OutputFormat::Csv),
            Some(ext) if ext == "json" => Ok(OutputFormat::Json),
            Some(ext) if ext == "xlsx" => Ok(OutputFormat::Xlsx),
            _ => Err(CliError::UnknownOutputFormat(path.display().to_string())),
        }
    }
}

fn export_err(e: impl std::fmt::Display) -> DemodError {
    DemodError::Export(e.to_string())
}

/// Writes the table as comma-separated values, one header line then one line per frame
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ResultSink for CsvSink {
    fn consume(&mut self, table: &ResultTable) -> tonepeak_core::Result<()> {
        let mut out = BufWriter::new(File::create(&self.path).map_err(export_err)?);
        writeln!(out, "{}", table.columns().join(",")).map_err(export_err)?;
        for record in table.records() {
            writeln!(out, "{}", record.join(",")).map_err(export_err)?;
        }
        out.flush().map_err(export_err)
    }
}

#[derive(Serialize)]
struct JsonRow<'a> {
    bits: &'a [u8],
    parity: u8,
    sent_parity: u8,
    #[serde(rename = "match")]
    matches: bool,
}

#[derive(Serialize)]
struct JsonTable<'a> {
    columns: Vec<String>,
    frames: usize,
    matches: usize,
    rows: Vec<JsonRow<'a>>,
}

pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ResultSink for JsonSink {
    fn consume(&mut self, table: &ResultTable) -> tonepeak_core::Result<()> {
        let doc = JsonTable {
            columns: table.columns(),
            frames: table.len(),
            matches: table.match_count(),
            rows: table
                .rows()
                .iter()
                .map(|row| JsonRow {
                    bits: row.frame.bits(),
                    parity: row.frame.parity(),
                    sent_parity: row.sent_parity,
                    matches: row.matches,
                })
                .collect(),
        };
        let mut out = BufWriter::new(File::create(&self.path).map_err(export_err)?);
        serde_json::to_writer_pretty(&mut out, &doc).map_err(export_err)?;
        out.flush().map_err(export_err)
    }
}

/// Writes the table to a `Results` worksheet; bits and parities are numeric cells
pub struct XlsxSink {
    path: PathBuf,
}

impl XlsxSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ResultSink for XlsxSink {
    fn consume(&mut self, table: &ResultTable) -> tonepeak_core::Result<()> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Results").map_err(export_err)?;

        for (col, name) in table.columns().iter().enumerate() {
            sheet.write_string(0, col as u16, name.as_str()).map_err(export_err)?;
        }
        for (row, record) in table.records().iter().enumerate() {
            let row = row as u32 + 1;
            for (col, cell) in record.iter().enumerate() {
                let col = col as u16;
                if cell.is_empty() {
                    continue;
                }
                match cell.parse::<u8>() {
                    Ok(value) => sheet.write_number(row, col, f64::from(value)).map_err(export_err)?,
                    Err(_) => sheet.write_string(row, col, cell.as_str()).map_err(export_err)?,
                };
            }
        }

        workbook.save(&self.path).map_err(export_err)
    }
}

#[derive(Serialize)]
struct JsonDisplay {
    frequencies: Vec<f32>,
    frame_times: Vec<f32>,
    /// Row per frequency, column per frame
    decibels: Vec<Vec<f32>>,
    constellation: Vec<Vec<bool>>,
}

/// Dump the carrier-band display grids for an external plotter
pub fn write_display(path: &Path, view: &DisplayView) -> Result<(), CliError> {
    let doc = JsonDisplay {
        frequencies: view.frequencies.clone(),
        frame_times: view.frame_times.clone(),
        decibels: view.decibels.rows().into_iter().map(|r| r.to_vec()).collect(),
        constellation: view
            .constellation
            .rows()
            .into_iter()
            .map(|r| r.to_vec())
            .collect(),
    };
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut out, &doc)?;
    out.flush()?;
    Ok(())
}
