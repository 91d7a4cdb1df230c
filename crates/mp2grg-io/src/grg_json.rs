//! GRG JSON document reader/writer
//!
//! Documents are written with keys in sorted order and two-space
//! indentation so that repeated translations of the same case produce
//! byte-identical output.

use std::fs;
use std::path::Path;

use mp2grg_core::{GrgDocument, TranslateResult};
use tracing::debug;

/// Read a GRG document from a JSON file
pub fn read_grg_file(path: impl AsRef<Path>) -> TranslateResult<GrgDocument> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let doc = read_grg_str(&content)?;
    debug!(path = %path.display(), id = %doc.network.id, "read GRG document");
    Ok(doc)
}

pub fn read_grg_str(content: &str) -> TranslateResult<GrgDocument> {
    Ok(serde_json::from_str(content)?)
}

/// Serialize with sorted keys.
///
/// Going through `serde_json::Value` sorts every object because the value
/// map is a `BTreeMap` without the `preserve_order` feature.
pub fn write_grg_string(doc: &GrgDocument) -> TranslateResult<String> {
    let value = serde_json::to_value(doc)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn write_grg_file(doc: &GrgDocument, path: impl AsRef<Path>) -> TranslateResult<()> {
    let mut text = write_grg_string(doc)?;
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}
