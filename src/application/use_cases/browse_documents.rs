use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::domain::entities::Page;
use crate::domain::repositories::{ChunkRepository, DocumentRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum BrowseDocumentsError {
    #[error("Document not found: {0}")]
    DocumentNotFound(i64),
    #[error("Page {page_num} not found in document {document_id}")]
    PageNotFound { document_id: i64, page_num: i32 },
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<RepositoryError> for BrowseDocumentsError {
    fn from(error: RepositoryError) -> Self {
        BrowseDocumentsError::RepositoryError(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentOverview {
    pub document_id: i64,
    pub title: String,
    pub filename: Option<String>,
    pub file_path: Option<String>,
    pub page_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub page: Page,
    /// First image chunk cropped from the page, the one annotators select.
    pub image_chunk_id: Option<i64>,
}

pub struct BrowseDocumentsUseCase {
    document_repository: Arc<dyn DocumentRepository>,
    chunk_repository: Arc<dyn ChunkRepository>,
}

impl BrowseDocumentsUseCase {
    pub fn new(
        document_repository: Arc<dyn DocumentRepository>,
        chunk_repository: Arc<dyn ChunkRepository>,
    ) -> Self {
        Self {
            document_repository,
            chunk_repository,
        }
    }

    pub async fn overview(&self) -> Result<Vec<DocumentOverview>, BrowseDocumentsError> {
        let documents = self.document_repository.list_documents().await?;

        let mut overview = Vec::with_capacity(documents.len());
        for document in documents {
            let file_path = match document.path {
                Some(file_id) => self
                    .document_repository
                    .find_file(file_id)
                    .await?
                    .map(|file| file.path),
                None => None,
            };
            let page_count = self
                .document_repository
                .count_pages_by_document(document.id)
                .await?;

            overview.push(DocumentOverview {
                document_id: document.id,
                title: document.display_name().to_string(),
                filename: document.filename,
                file_path,
                page_count,
            });
        }
        Ok(overview)
    }

    pub async fn page(
        &self,
        document_id: i64,
        page_num: i32,
    ) -> Result<PageView, BrowseDocumentsError> {
        if self.document_repository.find_document(document_id).await?.is_none() {
            return Err(BrowseDocumentsError::DocumentNotFound(document_id));
        }

        let page = self
            .document_repository
            .find_page_by_number(document_id, page_num)
            .await?
            .ok_or(BrowseDocumentsError::PageNotFound {
                document_id,
                page_num,
            })?;

        let image_chunk_id = self
            .chunk_repository
            .find_image_chunks_by_page(page.id)
            .await?
            .first()
            .map(|chunk| chunk.id);

        Ok(PageView { page, image_chunk_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::SeedRepository;
    use crate::domain::seed::SeedData;
    use crate::infrastructure::memory::InMemoryStore;

    async fn use_case() -> BrowseDocumentsUseCase {
        let store = Arc::new(InMemoryStore::new());
        store.load_seed(&SeedData::bundled().unwrap()).await.unwrap();
        BrowseDocumentsUseCase::new(store.clone(), store)
    }

    #[tokio::test]
    async fn test_overview_of_seeded_documents() {
        let overview = use_case().await.overview().await.unwrap();

        assert_eq!(overview.len(), 5);
        assert_eq!(
            overview[0],
            DocumentOverview {
                document_id: 1,
                title: "Annual Report 2023".to_string(),
                filename: Some("seed_annual_report_2023.pdf".to_string()),
                file_path: Some("/data/pdfs/seed_annual_report_2023.pdf".to_string()),
                page_count: 3,
            }
        );
        let pages: i64 = overview.iter().map(|d| d.page_count).sum();
        assert_eq!(pages, 8);
    }

    #[tokio::test]
    async fn test_page_lookup_with_image_chunk() {
        let use_case = use_case().await;

        let view = use_case.page(2, 2).await.unwrap();
        assert_eq!(view.page.id, 5);
        assert_eq!(view.image_chunk_id, Some(5));

        assert!(matches!(
            use_case.page(2, 9).await,
            Err(BrowseDocumentsError::PageNotFound { page_num: 9, .. })
        ));
        assert!(matches!(
            use_case.page(42, 1).await,
            Err(BrowseDocumentsError::DocumentNotFound(42))
        ));
    }
}
