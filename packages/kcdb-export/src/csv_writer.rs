use crate::flatten::flatten_record;
use crate::types::Record;
use anyhow::{Context, Result};
use indexmap::IndexSet;
use std::fs;
use std::io;
use std::path::Path;
use tempfile::Builder;
use tracing::{debug, info};

/// Union of every key in the batch, in the order keys are first seen.
///
/// The whole batch has to be known before the header can be written, so
/// writing is always two passes: collect columns, then emit rows.
pub fn collect_columns(records: &[Record]) -> Vec<String> {
    let mut columns = IndexSet::new();
    for record in records {
        for key in record.keys() {
            columns.insert(key.clone());
        }
    }
    columns.into_iter().collect()
}

/// Writes a header line and one row per record to `writer`.
///
/// Returns the number of data rows. An empty batch writes nothing at all.
pub fn write_records<W: io::Write>(writer: W, records: &[Record]) -> Result<usize> {
    if records.is_empty() {
        return Ok(0);
    }

    let columns = collect_columns(records);
    let mut csv = csv::Writer::from_writer(writer);

    csv.write_record(&columns)
        .context("Failed to write CSV header")?;

    for record in records {
        let row = flatten_record(record, &columns);
        csv.write_record(row.values())
            .context("Failed to write CSV row")?;
    }

    csv.flush().context("Failed to flush CSV output")?;
    Ok(records.len())
}

/// Mode for a rewritten file: the existing target's, else 0644 on unix.
fn output_permissions(path: &Path) -> Option<fs::Permissions> {
    if let Ok(meta) = fs::metadata(path) {
        return Some(meta.permissions());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(fs::Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        None
    }
}

/// Writes `records` to `path`, replacing any previous file.
///
/// Rows go to a temporary file next to the target which is renamed into place
/// once complete, so an interrupted run never leaves a half-written CSV.
pub fn write_batch(path: &Path, records: &[Record]) -> Result<usize> {
    if records.is_empty() {
        info!(path = %path.display(), "No records to write");
        return Ok(0);
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .context(format!("Failed to create output directory: {:?}", dir))?;

    let existed = path.exists();
    let mode = output_permissions(path);
    let mut builder = Builder::new();
    if let Some(mode) = &mode {
        builder.permissions(mode.clone());
    }
    let mut tmp = builder
        .tempfile_in(dir)
        .context(format!("Failed to create temporary file in {:?}", dir))?;

    // creation mode is masked by the umask; an existing target's mode is copied exactly
    if let (true, Some(mode)) = (existed, mode) {
        tmp.as_file()
            .set_permissions(mode)
            .context(format!("Failed to set permissions on {:?}", tmp.path()))?;
    }
    let rows = write_records(&mut tmp, records)?;

    debug!(tmp = %tmp.path().display(), target = %path.display(), "Persisting CSV");
    tmp.persist(path)
        .map_err(|e| e.error)
        .context(format!("Failed to write CSV file: {:?}", path))?;

    info!(rows, path = %path.display(), "Wrote CSV");
    Ok(rows)
}
