use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    /// Source file id.
    pub path: Option<i64>,
    pub filename: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub path: Option<i64>,
    pub filename: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl Document {
    pub fn from_new(id: i64, new_document: NewDocument) -> Self {
        Self {
            id,
            path: new_document.path,
            filename: new_document.filename,
            author: new_document.author,
            title: new_document.title,
            metadata: new_document.metadata,
        }
    }

    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.filename.as_deref())
            .unwrap_or("Untitled")
    }
}

/// Title derived from an uploaded file name: everything before the first dot.
pub fn title_from_filename(filename: &str) -> String {
    filename
        .split('.')
        .next()
        .unwrap_or(filename)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallbacks() {
        let mut doc = Document::from_new(
            1,
            NewDocument {
                filename: Some("report.pdf".to_string()),
                title: Some("Annual Report".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(doc.display_name(), "Annual Report");

        doc.title = Some("  ".to_string());
        assert_eq!(doc.display_name(), "report.pdf");

        doc.filename = None;
        assert_eq!(doc.display_name(), "Untitled");
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename("annual report.v2.pdf"), "annual report");
        assert_eq!(title_from_filename("noext"), "noext");
    }
}
