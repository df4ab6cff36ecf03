use diesel::prelude::*;
use serde::Serialize;

use crate::domain::entities::{
    Caption, CaptionChunkRelation, Document, File, NewCaption, NewDocument, NewFile, NewPage, Page,
};
use crate::domain::repositories::RepositoryError;
use crate::domain::value_objects::FileType;
use crate::infrastructure::database::schema::{
    caption_chunk_relations, captions, documents, files, pages,
};

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Identifiable)]
#[diesel(table_name = files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FileModel {
    pub id: i64,
    pub file_type: String,
    pub path: String,
}

/// `id: None` lets the identity sequence assign the key.
#[derive(Debug, Insertable)]
#[diesel(table_name = files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewFileModel {
    pub id: Option<i64>,
    pub file_type: String,
    pub path: String,
}

impl From<&NewFile> for NewFileModel {
    fn from(file: &NewFile) -> Self {
        Self {
            id: None,
            file_type: file.file_type.as_str().to_string(),
            path: file.path.clone(),
        }
    }
}

impl From<&File> for NewFileModel {
    fn from(file: &File) -> Self {
        Self {
            id: Some(file.id),
            file_type: file.file_type.as_str().to_string(),
            path: file.path.clone(),
        }
    }
}

impl TryFrom<FileModel> for File {
    type Error = RepositoryError;

    fn try_from(model: FileModel) -> Result<Self, Self::Error> {
        let file_type = model
            .file_type
            .parse::<FileType>()
            .map_err(RepositoryError::Database)?;
        Ok(File {
            id: model.id,
            file_type,
            path: model.path,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Identifiable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentModel {
    pub id: i64,
    pub path: Option<i64>,
    pub filename: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDocumentModel {
    pub id: Option<i64>,
    pub path: Option<i64>,
    pub filename: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl From<&NewDocument> for NewDocumentModel {
    fn from(document: &NewDocument) -> Self {
        Self {
            id: None,
            path: document.path,
            filename: document.filename.clone(),
            author: document.author.clone(),
            title: document.title.clone(),
            metadata: document.metadata.clone(),
        }
    }
}

impl From<&Document> for NewDocumentModel {
    fn from(document: &Document) -> Self {
        Self {
            id: Some(document.id),
            path: document.path,
            filename: document.filename.clone(),
            author: document.author.clone(),
            title: document.title.clone(),
            metadata: document.metadata.clone(),
        }
    }
}

impl From<DocumentModel> for Document {
    fn from(model: DocumentModel) -> Self {
        Document {
            id: model.id,
            path: model.path,
            filename: model.filename,
            author: model.author,
            title: model.title,
            metadata: model.metadata,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(belongs_to(DocumentModel, foreign_key = document_id))]
#[diesel(table_name = pages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PageModel {
    pub id: i64,
    pub page_num: i32,
    pub document_id: i64,
    pub image_contents: Option<Vec<u8>>,
    pub mimetype: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = pages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPageModel {
    pub id: Option<i64>,
    pub page_num: i32,
    pub document_id: i64,
    pub image_contents: Option<Vec<u8>>,
    pub mimetype: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl From<NewPage> for NewPageModel {
    fn from(page: NewPage) -> Self {
        Self {
            id: None,
            page_num: page.page_num,
            document_id: page.document_id,
            image_contents: page.image_contents,
            mimetype: page.mimetype,
            metadata: page.metadata,
        }
    }
}

impl From<&Page> for NewPageModel {
    fn from(page: &Page) -> Self {
        Self {
            id: Some(page.id),
            page_num: page.page_num,
            document_id: page.document_id,
            image_contents: page.image_contents.clone(),
            mimetype: page.mimetype.clone(),
            metadata: page.metadata.clone(),
        }
    }
}

impl From<PageModel> for Page {
    fn from(model: PageModel) -> Self {
        Page {
            id: model.id,
            page_num: model.page_num,
            document_id: model.document_id,
            image_contents: model.image_contents,
            mimetype: model.mimetype,
            metadata: model.metadata,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = captions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CaptionModel {
    pub id: i64,
    pub page_id: i64,
    pub contents: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = captions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewCaptionModel {
    pub id: Option<i64>,
    pub page_id: i64,
    pub contents: String,
}

impl From<&NewCaption> for NewCaptionModel {
    fn from(caption: &NewCaption) -> Self {
        Self {
            id: None,
            page_id: caption.page_id,
            contents: caption.contents.clone(),
        }
    }
}

impl From<&Caption> for NewCaptionModel {
    fn from(caption: &Caption) -> Self {
        Self {
            id: Some(caption.id),
            page_id: caption.page_id,
            contents: caption.contents.clone(),
        }
    }
}

impl From<CaptionModel> for Caption {
    fn from(model: CaptionModel) -> Self {
        Caption {
            id: model.id,
            page_id: model.page_id,
            contents: model.contents,
        }
    }
}

#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = caption_chunk_relations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CaptionChunkRelationModel {
    pub caption_id: i64,
    pub chunk_id: i64,
}

impl From<&CaptionChunkRelation> for CaptionChunkRelationModel {
    fn from(relation: &CaptionChunkRelation) -> Self {
        Self {
            caption_id: relation.caption_id,
            chunk_id: relation.chunk_id,
        }
    }
}
