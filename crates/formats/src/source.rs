use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
    #[error("malformed geometry in {} at feature {index}: {reason}", path.display())]
    GeometryFormat {
        path: PathBuf,
        index: usize,
        reason: String,
    },
    #[error("unsupported source format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },
}

impl SourceError {
    pub fn parse(path: &Path, reason: impl Into<String>) -> Self {
        SourceError::Parse {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SourceError::FileAccess { path, .. }
            | SourceError::Parse { path, .. }
            | SourceError::GeometryFormat { path, .. }
            | SourceError::UnsupportedFormat { path } => path,
        }
    }
}

/// On-disk encoding of a source, inferred from the file extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Spreadsheet,
    Csv,
    GeoJson,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SourceFormat::Spreadsheet),
            "csv" => Some(SourceFormat::Csv),
            "geojson" | "json" => Some(SourceFormat::GeoJson),
            _ => None,
        }
    }
}

pub fn read_source(path: &Path) -> Result<Vec<u8>, SourceError> {
    fs::read(path).map_err(|source| SourceError::FileAccess {
        path: path.to_path_buf(),
        source,
    })
}

pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::{SourceError, SourceFormat, read_source};
    use std::path::Path;

    #[test]
    fn infers_format_from_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("Rute.XLSX")),
            Some(SourceFormat::Spreadsheet)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("rute.csv")),
            Some(SourceFormat::Csv)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("indonesia.geojson")),
            Some(SourceFormat::GeoJson)
        );
        assert_eq!(SourceFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(SourceFormat::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn missing_file_is_file_access_error() {
        let err = read_source(Path::new("/definitely/not/here.xlsx")).expect_err("missing");
        assert!(matches!(err, SourceError::FileAccess { .. }));
        assert_eq!(err.path(), Path::new("/definitely/not/here.xlsx"));
    }
}
