//! Save functionality for trained models.

use super::format::{ModelFormat, ModelHeader};
use cogmorph_core::{MorphError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
struct JsonModelRef<'a, T> {
    header: &'a ModelHeader,
    model: &'a T,
}

/// Model saver - writes a header and model body in either format.
pub struct ModelSaver;

impl ModelSaver {
    /// Save `model` to `path`, picking the format from the extension.
    pub fn save<T: Serialize>(path: &Path, header: &ModelHeader, model: &T) -> Result<()> {
        Self::save_as(path, ModelFormat::from_path(path), header, model)
    }

    pub fn save_as<T: Serialize>(
        path: &Path,
        format: ModelFormat,
        header: &ModelHeader,
        model: &T,
    ) -> Result<()> {
        let file = File::create(path).map_err(|e| {
            MorphError::Save(format!("Failed to create file {}: {}", path.display(), e))
        })?;
        let mut writer = BufWriter::new(file);
        Self::write(&mut writer, format, header, model)?;
        writer
            .flush()
            .map_err(|e| MorphError::Save(format!("Failed to flush {}: {}", path.display(), e)))
    }

    /// Serialize to any writer.
    pub fn write<W: Write, T: Serialize>(
        writer: &mut W,
        format: ModelFormat,
        header: &ModelHeader,
        model: &T,
    ) -> Result<()> {
        match format {
            ModelFormat::Binary => {
                bincode::serialize_into(&mut *writer, header)
                    .map_err(|e| MorphError::Save(format!("Failed to serialize header: {}", e)))?;
                bincode::serialize_into(&mut *writer, model)
                    .map_err(|e| MorphError::Save(format!("Failed to serialize model: {}", e)))
            }
            ModelFormat::Json => {
                let doc = JsonModelRef { header, model };
                serde_json::to_writer(&mut *writer, &doc)
                    .map_err(|e| MorphError::Save(format!("Failed to serialize model: {}", e)))
            }
        }
    }
}
