//! Load functionality for saved models.

use super::format::{JsonModel, ModelFormat, ModelHeader};
use cogmorph_core::{MorphError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Model loader - the counterpart of [`super::ModelSaver`].
pub struct ModelLoader;

#[derive(Deserialize)]
struct HeaderOnly {
    header: ModelHeader,
}

impl ModelLoader {
    fn open(path: &Path) -> Result<BufReader<File>> {
        let file = File::open(path).map_err(|e| {
            MorphError::Load(format!("Failed to open file {}: {}", path.display(), e))
        })?;
        Ok(BufReader::new(file))
    }

    /// Read and validate only the header of a model file.
    pub fn load_header(path: &Path) -> Result<ModelHeader> {
        let mut reader = Self::open(path)?;
        let header = match ModelFormat::from_path(path) {
            ModelFormat::Binary => bincode::deserialize_from(&mut reader)
                .map_err(|e| MorphError::Load(format!("Failed to deserialize header: {}", e)))?,
            ModelFormat::Json => {
                let doc: HeaderOnly = serde_json::from_reader(reader)
                    .map_err(|e| MorphError::Load(format!("Failed to deserialize header: {}", e)))?;
                doc.header
            }
        };
        header.validate()?;
        Ok(header)
    }

    /// Load a header and model body, picking the format from the extension.
    pub fn load<T: DeserializeOwned>(path: &Path) -> Result<(ModelHeader, T)> {
        let reader = Self::open(path)?;
        Self::read(reader, ModelFormat::from_path(path))
    }

    /// Deserialize from any reader.
    pub fn read<R: Read, T: DeserializeOwned>(
        mut reader: R,
        format: ModelFormat,
    ) -> Result<(ModelHeader, T)> {
        match format {
            ModelFormat::Binary => {
                let header: ModelHeader = bincode::deserialize_from(&mut reader)
                    .map_err(|e| MorphError::Load(format!("Failed to deserialize header: {}", e)))?;
                header.validate()?;
                let model = bincode::deserialize_from(&mut reader)
                    .map_err(|e| MorphError::Load(format!("Failed to deserialize model: {}", e)))?;
                Ok((header, model))
            }
            ModelFormat::Json => {
                let doc: JsonModel<T> = serde_json::from_reader(reader)
                    .map_err(|e| MorphError::Load(format!("Failed to deserialize model: {}", e)))?;
                doc.header.validate()?;
                Ok((doc.header, doc.model))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::ModelSaver;
    use super::*;
    use cogmorph_core::ConstructionKind;
    use std::io::Cursor;

    #[test]
    fn test_binary_roundtrip_in_memory() {
        let header = ModelHeader::new(ConstructionKind::Baseline, false);
        let body = vec![("walk".to_string(), 3u64), ("ing".to_string(), 2)];
        let mut buf = Vec::new();
        ModelSaver::write(&mut buf, ModelFormat::Binary, &header, &body).unwrap();

        let (h, b): (ModelHeader, Vec<(String, u64)>) =
            ModelLoader::read(Cursor::new(buf), ModelFormat::Binary).unwrap();
        assert_eq!(h, header);
        assert_eq!(b, body);
    }

    #[test]
    fn test_json_roundtrip_in_memory() {
        let header = ModelHeader::new(ConstructionKind::Cognate, true);
        let body = vec![1u32, 2, 3];
        let mut buf = Vec::new();
        ModelSaver::write(&mut buf, ModelFormat::Json, &header, &body).unwrap();

        let (h, b): (ModelHeader, Vec<u32>) =
            ModelLoader::read(Cursor::new(buf), ModelFormat::Json).unwrap();
        assert_eq!(h, header);
        assert_eq!(b, body);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ModelLoader::load_header(Path::new("/nonexistent/model.bin")).unwrap_err();
        assert!(matches!(err, MorphError::Load(_)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = ModelLoader::read::<_, Vec<u32>>(Cursor::new(b"{\"x\":1}".to_vec()), ModelFormat::Json)
            .unwrap_err();
        assert!(matches!(err, MorphError::Load(_)));
    }
}
