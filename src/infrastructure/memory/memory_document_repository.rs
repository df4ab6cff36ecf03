use async_trait::async_trait;

use super::InMemoryStore;
use crate::domain::entities::{
    Caption, Document, File, ImageChunk, NewCaption, NewDocument, NewFile, NewImageChunk, NewPage,
    Page,
};
use crate::domain::repositories::{
    DocumentDeletion, DocumentRepository, IngestedDocument, IngestionBatch, RepositoryError,
};

#[async_trait]
impl DocumentRepository for InMemoryStore {
    async fn create_file(&self, file: NewFile) -> Result<File, RepositoryError> {
        let mut tables = self.lock().await;
        let id = tables.next_id("file");
        tables.insert_file(File::from_new(id, file))
    }

    async fn find_file(&self, id: i64) -> Result<Option<File>, RepositoryError> {
        Ok(self.lock().await.files.get(&id).cloned())
    }

    async fn delete_file(&self, id: i64) -> Result<bool, RepositoryError> {
        self.lock().await.delete_file(id)
    }

    async fn create_document(&self, document: NewDocument) -> Result<Document, RepositoryError> {
        let mut tables = self.lock().await;
        let id = tables.next_id("document");
        tables.insert_document(Document::from_new(id, document))
    }

    async fn find_document(&self, id: i64) -> Result<Option<Document>, RepositoryError> {
        Ok(self.lock().await.documents.get(&id).cloned())
    }

    async fn list_documents(&self) -> Result<Vec<Document>, RepositoryError> {
        Ok(self.lock().await.documents.values().cloned().collect())
    }

    async fn delete_document(&self, id: i64) -> Result<bool, RepositoryError> {
        self.lock().await.delete_document(id)
    }

    async fn create_page(&self, page: NewPage) -> Result<Page, RepositoryError> {
        let mut tables = self.lock().await;
        let id = tables.next_id("page");
        tables.insert_page(Page::from_new(id, page))
    }

    async fn find_page(&self, id: i64) -> Result<Option<Page>, RepositoryError> {
        Ok(self.lock().await.pages.get(&id).cloned())
    }

    async fn find_page_by_number(
        &self,
        document_id: i64,
        page_num: i32,
    ) -> Result<Option<Page>, RepositoryError> {
        Ok(self
            .lock()
            .await
            .pages
            .values()
            .find(|p| p.document_id == document_id && p.page_num == page_num)
            .cloned())
    }

    async fn find_pages_by_document(&self, document_id: i64) -> Result<Vec<Page>, RepositoryError> {
        let mut pages: Vec<Page> = self
            .lock()
            .await
            .pages
            .values()
            .filter(|p| p.document_id == document_id)
            .cloned()
            .collect();
        pages.sort_by_key(|p| p.page_num);
        Ok(pages)
    }

    async fn create_caption(&self, caption: NewCaption) -> Result<Caption, RepositoryError> {
        let mut tables = self.lock().await;
        let id = tables.next_id("caption");
        tables.insert_caption(Caption::from_new(id, caption))
    }

    async fn find_captions_by_page(&self, page_id: i64) -> Result<Vec<Caption>, RepositoryError> {
        Ok(self
            .lock()
            .await
            .captions
            .values()
            .filter(|c| c.page_id == page_id)
            .cloned()
            .collect())
    }

    async fn save_ingestion(
        &self,
        batch: IngestionBatch,
    ) -> Result<IngestedDocument, RepositoryError> {
        let mut tables = self.lock().await;
        tables.transaction(|t| {
            let file_id = t.next_id("file");
            let file = t.insert_file(File::from_new(file_id, batch.file))?;

            let document_id = t.next_id("document");
            let document = t.insert_document(Document::from_new(
                document_id,
                NewDocument {
                    path: Some(file.id),
                    ..batch.document
                },
            ))?;

            let mut pages = Vec::with_capacity(batch.pages.len());
            for (index, upload) in batch.pages.into_iter().enumerate() {
                let page_id = t.next_id("page");
                let page = t.insert_page(Page::from_new(
                    page_id,
                    NewPage {
                        page_num: index as i32 + 1,
                        document_id: document.id,
                        image_contents: Some(upload.image_contents.clone()),
                        mimetype: Some(upload.mimetype.clone()),
                        metadata: None,
                    },
                ))?;

                let image_chunk_id = t.next_id("image_chunk");
                let image_chunk = t.insert_image_chunk(ImageChunk::from_new(
                    image_chunk_id,
                    NewImageChunk {
                        parent_page: Some(page.id),
                        contents: upload.image_contents,
                        mimetype: upload.mimetype,
                    },
                ))?;
                pages.push((page, image_chunk));
            }

            Ok(IngestedDocument {
                file,
                document,
                pages,
            })
        })
    }

    async fn delete_document_tree(
        &self,
        document_id: i64,
    ) -> Result<Option<DocumentDeletion>, RepositoryError> {
        let mut tables = self.lock().await;
        tables.transaction(|t| t.delete_document_tree(document_id))
    }

    async fn count_files(&self) -> Result<i64, RepositoryError> {
        Ok(self.lock().await.files.len() as i64)
    }

    async fn count_documents(&self) -> Result<i64, RepositoryError> {
        Ok(self.lock().await.documents.len() as i64)
    }

    async fn count_pages(&self) -> Result<i64, RepositoryError> {
        Ok(self.lock().await.pages.len() as i64)
    }

    async fn count_pages_by_document(&self, document_id: i64) -> Result<i64, RepositoryError> {
        Ok(self
            .lock()
            .await
            .pages
            .values()
            .filter(|p| p.document_id == document_id)
            .count() as i64)
    }
}
