use serde::{Deserialize, Serialize};

/// Text transcription or description attached to a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub id: i64,
    pub page_id: i64,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCaption {
    pub page_id: i64,
    pub contents: String,
}

impl Caption {
    pub fn from_new(id: i64, new_caption: NewCaption) -> Self {
        Self {
            id,
            page_id: new_caption.page_id,
            contents: new_caption.contents,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptionChunkRelation {
    pub caption_id: i64,
    pub chunk_id: i64,
}
