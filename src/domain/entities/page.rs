use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub page_num: i32,
    pub document_id: i64,
    pub image_contents: Option<Vec<u8>>,
    pub mimetype: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPage {
    pub page_num: i32,
    pub document_id: i64,
    pub image_contents: Option<Vec<u8>>,
    pub mimetype: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl Page {
    pub fn from_new(id: i64, new_page: NewPage) -> Self {
        Self {
            id,
            page_num: new_page.page_num,
            document_id: new_page.document_id,
            image_contents: new_page.image_contents,
            mimetype: new_page.mimetype,
            metadata: new_page.metadata,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_contents.as_ref().is_some_and(|bytes| !bytes.is_empty())
    }
}
