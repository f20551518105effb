//! Species identity from file names
//!
//! Species files are named `res_<digits>_7.<ext>`, e.g. `res_22679_7.parquet`.
//! The digits are the species id; nothing else maps a file to a species.

use std::path::Path;
use std::sync::OnceLock;

use bioserver_common::types::SpeciesId;
use regex::Regex;

use crate::error::{IngestError, IngestResult};

fn species_file_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"^res_(\d+)_7\.[^.]+$").expect("species file pattern is valid")
    })
}

/// Resolve the species id encoded in `path`'s base name
pub fn resolve_species_id(path: &Path) -> IngestResult<SpeciesId> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| IngestError::malformed(path.display().to_string(), "no UTF-8 file name"))?;

    let captures = species_file_pattern()
        .captures(name)
        .ok_or_else(|| IngestError::malformed(name, "expected res_<digits>_7.<ext>"))?;

    captures[1]
        .parse::<SpeciesId>()
        .map_err(|e| IngestError::malformed(name, e.to_string()))
}
