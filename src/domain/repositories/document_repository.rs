use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::entities::{Document, File, ImageChunk, NewDocument, NewFile, NewPage, Page};
use crate::domain::entities::{Caption, NewCaption};

/// One rendered page of an uploaded document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageUpload {
    pub image_contents: Vec<u8>,
    pub mimetype: String,
}

/// Everything written for a single uploaded document. The document's `path`
/// is filled in with the new file id.
#[derive(Debug, Clone)]
pub struct IngestionBatch {
    pub file: NewFile,
    pub document: NewDocument,
    pub pages: Vec<PageUpload>,
}

#[derive(Debug, Clone)]
pub struct IngestedDocument {
    pub file: File,
    pub document: Document,
    /// Pages in order, each with the image chunk covering the full page.
    pub pages: Vec<(Page, ImageChunk)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentDeletion {
    pub document_id: i64,
    pub pages_removed: usize,
    pub captions_removed: usize,
    pub chunks_removed: usize,
    pub image_chunks_removed: usize,
    /// The source file row, when it was removed along with the document.
    pub file: Option<File>,
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create_file(&self, file: NewFile) -> Result<File, RepositoryError>;
    async fn find_file(&self, id: i64) -> Result<Option<File>, RepositoryError>;
    /// Fails with a foreign key violation while documents reference the file.
    async fn delete_file(&self, id: i64) -> Result<bool, RepositoryError>;

    async fn create_document(&self, document: NewDocument) -> Result<Document, RepositoryError>;
    async fn find_document(&self, id: i64) -> Result<Option<Document>, RepositoryError>;
    async fn list_documents(&self) -> Result<Vec<Document>, RepositoryError>;
    /// Fails with a foreign key violation while pages reference the document.
    async fn delete_document(&self, id: i64) -> Result<bool, RepositoryError>;

    async fn create_page(&self, page: NewPage) -> Result<Page, RepositoryError>;
    async fn find_page(&self, id: i64) -> Result<Option<Page>, RepositoryError>;
    async fn find_page_by_number(
        &self,
        document_id: i64,
        page_num: i32,
    ) -> Result<Option<Page>, RepositoryError>;
    /// Ordered by page number.
    async fn find_pages_by_document(&self, document_id: i64) -> Result<Vec<Page>, RepositoryError>;

    async fn create_caption(&self, caption: NewCaption) -> Result<Caption, RepositoryError>;
    async fn find_captions_by_page(&self, page_id: i64) -> Result<Vec<Caption>, RepositoryError>;

    /// Writes the file, document, pages and page image chunks in one transaction.
    async fn save_ingestion(
        &self,
        batch: IngestionBatch,
    ) -> Result<IngestedDocument, RepositoryError>;

    /// Removes a document with its pages, captions, caption chunks, image chunks
    /// and, when nothing else points at it, its file, in one transaction.
    /// Returns `None` if the document does not exist.
    async fn delete_document_tree(
        &self,
        document_id: i64,
    ) -> Result<Option<DocumentDeletion>, RepositoryError>;

    async fn count_files(&self) -> Result<i64, RepositoryError>;
    async fn count_documents(&self) -> Result<i64, RepositoryError>;
    async fn count_pages(&self) -> Result<i64, RepositoryError>;
    async fn count_pages_by_document(&self, document_id: i64) -> Result<i64, RepositoryError>;
}
