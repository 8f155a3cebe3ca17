//! Zip packaging for multi-image results.

use crate::batch::ProcessedOutput;
use crate::error::Result;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Bundles outputs into one zip, one entry per derived filename.
///
/// Entries keep input order. When two outputs derive the same name the later
/// bytes replace the earlier ones and the entry keeps its first position.
pub fn package(outputs: &[ProcessedOutput]) -> Result<Vec<u8>> {
    let entries = collect_entries(outputs);

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default());
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        writer.start_file(name, options)?;
        writer.write_all(bytes)?;
    }

    let cursor = writer.finish()?;
    tracing::debug!(entries = outputs.len(), bytes = cursor.get_ref().len(), "archive packaged");
    Ok(cursor.into_inner())
}

fn collect_entries(outputs: &[ProcessedOutput]) -> Vec<(&str, &[u8])> {
    let mut entries: Vec<(&str, &[u8])> = Vec::with_capacity(outputs.len());
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for output in outputs {
        let name = output.filename.as_str();
        match positions.get(name) {
            Some(&index) => entries[index].1 = &output.bytes,
            None => {
                positions.insert(name, entries.len());
                entries.push((name, &output.bytes));
            }
        }
    }
    entries
}
