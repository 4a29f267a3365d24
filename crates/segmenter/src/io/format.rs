//! Format definitions for model serialization.
//!
//! Both formats start with a [`ModelHeader`] so a file can be dispatched
//! to the right construction kind before its body is decoded. The binary
//! format is two consecutive bincode values (header, body); the JSON format
//! is one object with `header` and `model` fields.

use cogmorph_core::{ConstructionKind, MorphError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tag at the start of every model header.
pub const MODEL_MAGIC: &str = "cogmorph";

/// Current serialization version.
pub const FORMAT_VERSION: u32 = 1;

/// Model file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelFormat {
    /// bincode header followed by a bincode body
    #[default]
    Binary,
    /// Single JSON document
    Json,
}

impl ModelFormat {
    /// `.json` files are JSON, everything else binary.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ModelFormat::Json,
            _ => ModelFormat::Binary,
        }
    }
}

/// Leading record of a model file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelHeader {
    pub magic: String,
    pub version: u32,
    /// Construction kind of the stored model
    pub kind: ConstructionKind,
    /// The stored model has no analyses and cannot be trained further
    pub segment_only: bool,
}

impl ModelHeader {
    pub fn new(kind: ConstructionKind, segment_only: bool) -> Self {
        Self {
            magic: MODEL_MAGIC.to_string(),
            version: FORMAT_VERSION,
            kind,
            segment_only,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.magic != MODEL_MAGIC {
            return Err(MorphError::Load(format!(
                "Not a cogmorph model (magic '{}')",
                self.magic
            )));
        }
        if self.version != FORMAT_VERSION {
            return Err(MorphError::Load(format!(
                "Unsupported model version {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Fail unless the stored kind is `expected`.
    pub fn expect_kind(&self, expected: ConstructionKind) -> Result<()> {
        if self.kind != expected {
            return Err(MorphError::Load(format!(
                "Model holds {} constructions, expected {}",
                self.kind, expected
            )));
        }
        Ok(())
    }
}

/// JSON layout of a model file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonModel<T> {
    pub header: ModelHeader,
    pub model: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(ModelFormat::from_path(Path::new("m.json")), ModelFormat::Json);
        assert_eq!(ModelFormat::from_path(Path::new("m.JSON")), ModelFormat::Json);
        assert_eq!(ModelFormat::from_path(Path::new("m.bin")), ModelFormat::Binary);
        assert_eq!(ModelFormat::from_path(Path::new("model")), ModelFormat::Binary);
    }

    #[test]
    fn test_header_validation() {
        let header = ModelHeader::new(ConstructionKind::Cognate, false);
        assert!(header.validate().is_ok());
        assert!(header.expect_kind(ConstructionKind::Cognate).is_ok());
        assert!(header.expect_kind(ConstructionKind::Baseline).is_err());

        let mut bad = header.clone();
        bad.version = FORMAT_VERSION + 1;
        assert!(matches!(bad.validate(), Err(MorphError::Load(_))));
    }

    #[test]
    fn test_header_json_roundtrip() {
        let header = ModelHeader::new(ConstructionKind::Parallel, true);
        let json = serde_json::to_string(&header).unwrap();
        assert!(json.contains("\"parallel\""));
        let back: ModelHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(back, header);
    }
}
