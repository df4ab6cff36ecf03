use async_trait::async_trait;
use diesel::prelude::*;

use crate::domain::entities::{
    Caption, Document, File, ImageChunk, NewCaption, NewDocument, NewFile, NewImageChunk, NewPage,
    Page,
};
use crate::domain::repositories::{
    DocumentDeletion, DocumentRepository, IngestedDocument, IngestionBatch, RepositoryError,
};
use crate::infrastructure::database::models::{
    CaptionModel, DocumentModel, FileModel, ImageChunkModel, NewCaptionModel, NewDocumentModel,
    NewFileModel, NewImageChunkModel, NewPageModel, PageModel,
};
use crate::infrastructure::database::schema::{
    caption_chunk_relations, captions, chunks, documents, files, image_chunks, pages,
};
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

pub struct PostgresDocumentRepository {
    pool: DbPool,
}

impl PostgresDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    async fn create_file(&self, file: NewFile) -> Result<File, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let model = diesel::insert_into(files::table)
            .values(&NewFileModel::from(&file))
            .returning(FileModel::as_returning())
            .get_result(&mut conn)?;

        File::try_from(model)
    }

    async fn find_file(&self, id: i64) -> Result<Option<File>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        files::table
            .find(id)
            .select(FileModel::as_select())
            .first(&mut conn)
            .optional()?
            .map(File::try_from)
            .transpose()
    }

    async fn delete_file(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let deleted_count = diesel::delete(files::table.find(id)).execute(&mut conn)?;
        Ok(deleted_count > 0)
    }

    async fn create_document(&self, document: NewDocument) -> Result<Document, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let model = diesel::insert_into(documents::table)
            .values(&NewDocumentModel::from(&document))
            .returning(DocumentModel::as_returning())
            .get_result(&mut conn)?;

        Ok(Document::from(model))
    }

    async fn find_document(&self, id: i64) -> Result<Option<Document>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let result = documents::table
            .find(id)
            .select(DocumentModel::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(result.map(Document::from))
    }

    async fn list_documents(&self) -> Result<Vec<Document>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let models = documents::table
            .order(documents::id.asc())
            .select(DocumentModel::as_select())
            .load(&mut conn)?;

        Ok(models.into_iter().map(Document::from).collect())
    }

    async fn delete_document(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let deleted_count = diesel::delete(documents::table.find(id)).execute(&mut conn)?;
        Ok(deleted_count > 0)
    }

    async fn create_page(&self, page: NewPage) -> Result<Page, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let model = diesel::insert_into(pages::table)
            .values(&NewPageModel::from(page))
            .returning(PageModel::as_returning())
            .get_result(&mut conn)?;

        Ok(Page::from(model))
    }

    async fn find_page(&self, id: i64) -> Result<Option<Page>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let result = pages::table
            .find(id)
            .select(PageModel::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(result.map(Page::from))
    }

    async fn find_page_by_number(
        &self,
        document_id: i64,
        page_num: i32,
    ) -> Result<Option<Page>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let result = pages::table
            .filter(pages::document_id.eq(document_id))
            .filter(pages::page_num.eq(page_num))
            .select(PageModel::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(result.map(Page::from))
    }

    async fn find_pages_by_document(&self, document_id: i64) -> Result<Vec<Page>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let models = pages::table
            .filter(pages::document_id.eq(document_id))
            .order(pages::page_num.asc())
            .select(PageModel::as_select())
            .load(&mut conn)?;

        Ok(models.into_iter().map(Page::from).collect())
    }

    async fn create_caption(&self, caption: NewCaption) -> Result<Caption, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let model = diesel::insert_into(captions::table)
            .values(&NewCaptionModel::from(&caption))
            .returning(CaptionModel::as_returning())
            .get_result(&mut conn)?;

        Ok(Caption::from(model))
    }

    async fn find_captions_by_page(&self, page_id: i64) -> Result<Vec<Caption>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let models = captions::table
            .filter(captions::page_id.eq(page_id))
            .order(captions::id.asc())
            .select(CaptionModel::as_select())
            .load(&mut conn)?;

        Ok(models.into_iter().map(Caption::from).collect())
    }

    async fn save_ingestion(
        &self,
        batch: IngestionBatch,
    ) -> Result<IngestedDocument, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let file = diesel::insert_into(files::table)
                .values(&NewFileModel::from(&batch.file))
                .returning(FileModel::as_returning())
                .get_result(conn)?;
            let file = File::try_from(file)?;

            let new_document = NewDocument {
                path: Some(file.id),
                ..batch.document
            };
            let document = diesel::insert_into(documents::table)
                .values(&NewDocumentModel::from(&new_document))
                .returning(DocumentModel::as_returning())
                .get_result(conn)?;
            let document = Document::from(document);

            let mut ingested_pages = Vec::with_capacity(batch.pages.len());
            for (index, upload) in batch.pages.into_iter().enumerate() {
                let page = diesel::insert_into(pages::table)
                    .values(&NewPageModel::from(NewPage {
                        page_num: index as i32 + 1,
                        document_id: document.id,
                        image_contents: Some(upload.image_contents.clone()),
                        mimetype: Some(upload.mimetype.clone()),
                        metadata: None,
                    }))
                    .returning(PageModel::as_returning())
                    .get_result(conn)?;

                let image_chunk = diesel::insert_into(image_chunks::table)
                    .values(&NewImageChunkModel::from(NewImageChunk {
                        parent_page: Some(page.id),
                        contents: upload.image_contents,
                        mimetype: upload.mimetype,
                    }))
                    .returning(ImageChunkModel::as_returning())
                    .get_result(conn)?;

                ingested_pages.push((Page::from(page), ImageChunk::from(image_chunk)));
            }

            Ok(IngestedDocument {
                file,
                document,
                pages: ingested_pages,
            })
        })
    }

    async fn delete_document_tree(
        &self,
        document_id: i64,
    ) -> Result<Option<DocumentDeletion>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let Some(document) = documents::table
                .find(document_id)
                .select(DocumentModel::as_select())
                .first(conn)
                .optional()?
            else {
                return Ok(None);
            };

            let page_ids: Vec<i64> = pages::table
                .filter(pages::document_id.eq(document_id))
                .select(pages::id)
                .load(conn)?;
            let caption_ids: Vec<i64> = captions::table
                .filter(captions::page_id.eq_any(&page_ids))
                .select(captions::id)
                .load(conn)?;
            let chunk_ids: Vec<i64> = chunks::table
                .filter(chunks::parent_caption.eq_any(&caption_ids))
                .select(chunks::id)
                .load(conn)?;

            diesel::delete(
                caption_chunk_relations::table.filter(
                    caption_chunk_relations::caption_id
                        .eq_any(&caption_ids)
                        .or(caption_chunk_relations::chunk_id.eq_any(&chunk_ids)),
                ),
            )
            .execute(conn)?;

            let chunks_removed =
                diesel::delete(chunks::table.filter(chunks::id.eq_any(&chunk_ids))).execute(conn)?;
            let image_chunks_removed = diesel::delete(
                image_chunks::table.filter(image_chunks::parent_page.eq_any(&page_ids)),
            )
            .execute(conn)?;
            let captions_removed =
                diesel::delete(captions::table.filter(captions::id.eq_any(&caption_ids)))
                    .execute(conn)?;
            let pages_removed =
                diesel::delete(pages::table.filter(pages::id.eq_any(&page_ids))).execute(conn)?;
            diesel::delete(documents::table.find(document_id)).execute(conn)?;

            let mut file = None;
            if let Some(file_id) = document.path {
                let still_referenced: i64 = documents::table
                    .filter(documents::path.eq(file_id))
                    .count()
                    .get_result(conn)?;
                if still_referenced == 0 {
                    let removed: Option<FileModel> = diesel::delete(files::table.find(file_id))
                        .returning(FileModel::as_returning())
                        .get_result(conn)
                        .optional()?;
                    file = removed.map(File::try_from).transpose()?;
                }
            }

            tracing::debug!(
                "Deleted document {} with {} pages, {} captions, {} chunks, {} image chunks",
                document_id,
                pages_removed,
                captions_removed,
                chunks_removed,
                image_chunks_removed
            );

            Ok(Some(DocumentDeletion {
                document_id,
                pages_removed,
                captions_removed,
                chunks_removed,
                image_chunks_removed,
                file,
            }))
        })
    }

    async fn count_files(&self) -> Result<i64, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;
        Ok(files::table.count().get_result(&mut conn)?)
    }

    async fn count_documents(&self) -> Result<i64, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;
        Ok(documents::table.count().get_result(&mut conn)?)
    }

    async fn count_pages(&self) -> Result<i64, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;
        Ok(pages::table.count().get_result(&mut conn)?)
    }

    async fn count_pages_by_document(&self, document_id: i64) -> Result<i64, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        Ok(pages::table
            .filter(pages::document_id.eq(document_id))
            .count()
            .get_result(&mut conn)?)
    }
}
