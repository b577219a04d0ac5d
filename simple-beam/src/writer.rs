use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::{PipelineError, Stage};
use crate::models::ForceRecord;

pub const CSV_HEADER: &str = "Frame Name,Normal Force (N),Shear Force (T),Moment (M)";

/// Writes frame forces as CSV
pub struct ResultWriter;

impl ResultWriter {
    /// Replace `path` with the header and one row per record, in order
    pub fn write_csv(path: &Path, records: &[ForceRecord]) -> Result<(), PipelineError> {
        let io_err = |e| PipelineError::io(Stage::Write, path, e);
        let file = File::create(path).map_err(io_err)?;
        let mut out = BufWriter::new(file);
        write_force_records_csv(&mut out, records).map_err(io_err)?;
        out.flush().map_err(io_err)?;
        tracing::info!("Wrote {} rows to {}", records.len(), path.display());
        Ok(())
    }
}

/// Frame, P, V2 and M3 of each record
pub fn write_force_records_csv<W: Write>(mut w: W, records: &[ForceRecord]) -> io::Result<()> {
    writeln!(w, "{}", CSV_HEADER)?;
    for r in records {
        writeln!(w, "{},{},{},{}", csv_field(&r.frame), r.p, r.v2, r.m3)?;
    }
    Ok(())
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
