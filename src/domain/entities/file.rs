use serde::{Deserialize, Serialize};

use crate::domain::value_objects::FileType;

/// A stored blob: either the raw source (e.g. a PDF) or a standalone image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: i64,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFile {
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub path: String,
}

impl NewFile {
    pub fn raw(path: impl Into<String>) -> Self {
        Self {
            file_type: FileType::Raw,
            path: path.into(),
        }
    }

    pub fn image(path: impl Into<String>) -> Self {
        Self {
            file_type: FileType::Image,
            path: path.into(),
        }
    }
}

impl File {
    pub fn from_new(id: i64, new_file: NewFile) -> Self {
        Self {
            id,
            file_type: new_file.file_type,
            path: new_file.path,
        }
    }

    /// Last path component, if any.
    pub fn file_name(&self) -> Option<&str> {
        std::path::Path::new(&self.path)
            .file_name()
            .and_then(|name| name.to_str())
    }

    pub fn is_raw(&self) -> bool {
        self.file_type == FileType::Raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_path() {
        let file = File::from_new(1, NewFile::raw("/data/pdfs/abc_report.pdf"));
        assert_eq!(file.file_name(), Some("abc_report.pdf"));
        assert!(file.is_raw());
    }

    #[test]
    fn test_type_column_name_in_json() {
        let file: File =
            serde_json::from_str(r#"{"id": 3, "type": "image", "path": "/x.png"}"#).unwrap();
        assert_eq!(file.file_type, FileType::Image);
    }
}
