use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::entities::{
    Caption, CaptionChunkRelation, Chunk, Document, EvaluationResult, ExecutorResult, File,
    ImageChunk, Metric, Page, Pipeline, Query, RetrievalRelation, RetrievedResult, Summary,
};
use crate::domain::repositories::{ConstraintViolation, DocumentDeletion, RepositoryError};
use crate::domain::seed::{SEQUENCED_TABLES, SequenceState};
use crate::domain::value_objects::ChunkRef;

/// (query_id, group_index, group_order)
type RelationSlot = (i64, i32, i32);
/// (query_id, pipeline_id, item_id)
type RetrievedKey = (i64, i64, i64);

fn foreign_key(message: String) -> RepositoryError {
    ConstraintViolation::ForeignKey(message).into()
}

fn unique(message: String) -> RepositoryError {
    ConstraintViolation::Unique(message).into()
}

fn ensure_free<V>(map: &BTreeMap<i64, V>, id: i64, table: &str) -> Result<(), RepositoryError> {
    if map.contains_key(&id) {
        return Err(unique(format!("Key (id)=({}) already exists in {}", id, table)));
    }
    Ok(())
}

fn require<V>(
    map: &BTreeMap<i64, V>,
    id: i64,
    column: &str,
    table: &str,
) -> Result<(), RepositoryError> {
    if !map.contains_key(&id) {
        return Err(foreign_key(format!(
            "Key ({})=({}) is not present in table {}",
            column, id, table
        )));
    }
    Ok(())
}

fn restrict(referenced: bool, table: &str, id: i64, by: &str) -> Result<(), RepositoryError> {
    if referenced {
        tracing::debug!("delete from {} blocked: id {} referenced by {}", table, id, by);
        return Err(foreign_key(format!(
            "Key (id)=({}) is still referenced from table {}",
            id, by
        )));
    }
    Ok(())
}

fn last_key<K: Copy, V>(map: &BTreeMap<K, V>) -> Option<K> {
    map.keys().next_back().copied()
}

/// Row storage behind `InMemoryStore`. Every insert and delete applies the same
/// key, foreign key and uniqueness rules as the relational schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub files: BTreeMap<i64, File>,
    pub documents: BTreeMap<i64, Document>,
    pub pages: BTreeMap<i64, Page>,
    pub captions: BTreeMap<i64, Caption>,
    pub chunks: BTreeMap<i64, Chunk>,
    pub image_chunks: BTreeMap<i64, ImageChunk>,
    pub caption_chunk_relations: BTreeSet<(i64, i64)>,
    pub queries: BTreeMap<i64, Query>,
    pub retrieval_relations: BTreeMap<RelationSlot, ChunkRef>,
    pub pipelines: BTreeMap<i64, Pipeline>,
    pub metrics: BTreeMap<i64, Metric>,
    pub executor_results: BTreeMap<(i64, i64), ExecutorResult>,
    pub evaluation_results: BTreeMap<(i64, i64, i64), EvaluationResult>,
    pub chunk_retrieved_results: BTreeMap<RetrievedKey, Option<f64>>,
    pub image_chunk_retrieved_results: BTreeMap<RetrievedKey, Option<f64>>,
    pub summaries: BTreeMap<(i64, i64), Summary>,
    sequences: HashMap<&'static str, i64>,
}

impl Tables {
    /// Runs `f` against a copy and keeps the copy only if `f` succeeds.
    /// Identity values drawn inside a failed transaction stay consumed.
    pub fn transaction<T>(
        &mut self,
        f: impl FnOnce(&mut Tables) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut staged = self.clone();
        match f(&mut staged) {
            Ok(value) => {
                *self = staged;
                Ok(value)
            }
            Err(error) => {
                self.sequences = staged.sequences;
                Err(error)
            }
        }
    }

    /// Draws the next identity value. Like a database sequence, the value is
    /// consumed even if the insert that uses it fails.
    pub fn next_id(&mut self, table: &'static str) -> i64 {
        let value = self.sequences.entry(table).or_insert(0);
        *value += 1;
        *value
    }

    fn max_id(&self, table: &str) -> Option<i64> {
        match table {
            "file" => last_key(&self.files),
            "document" => last_key(&self.documents),
            "page" => last_key(&self.pages),
            "caption" => last_key(&self.captions),
            "chunk" => last_key(&self.chunks),
            "image_chunk" => last_key(&self.image_chunks),
            "query" => last_key(&self.queries),
            "pipeline" => last_key(&self.pipelines),
            "metric" => last_key(&self.metrics),
            _ => None,
        }
    }

    pub fn advance_sequences(&mut self) -> Vec<SequenceState> {
        SEQUENCED_TABLES
            .iter()
            .map(|&table| {
                let max_id = self.max_id(table).unwrap_or(0);
                let value = self.sequences.entry(table).or_insert(0);
                *value = (*value).max(max_id);
                SequenceState {
                    table,
                    last_value: *value,
                }
            })
            .collect()
    }

    // Inserts

    pub fn insert_file(&mut self, file: File) -> Result<File, RepositoryError> {
        ensure_free(&self.files, file.id, "file")?;
        self.files.insert(file.id, file.clone());
        Ok(file)
    }

    pub fn insert_document(&mut self, document: Document) -> Result<Document, RepositoryError> {
        ensure_free(&self.documents, document.id, "document")?;
        if let Some(file_id) = document.path {
            require(&self.files, file_id, "path", "file")?;
        }
        self.documents.insert(document.id, document.clone());
        Ok(document)
    }

    pub fn insert_page(&mut self, page: Page) -> Result<Page, RepositoryError> {
        ensure_free(&self.pages, page.id, "page")?;
        require(&self.documents, page.document_id, "document_id", "document")?;
        if self
            .pages
            .values()
            .any(|p| p.document_id == page.document_id && p.page_num == page.page_num)
        {
            return Err(unique(format!(
                "Key (document_id, page_num)=({}, {}) already exists",
                page.document_id, page.page_num
            )));
        }
        self.pages.insert(page.id, page.clone());
        Ok(page)
    }

    pub fn insert_caption(&mut self, caption: Caption) -> Result<Caption, RepositoryError> {
        ensure_free(&self.captions, caption.id, "caption")?;
        require(&self.pages, caption.page_id, "page_id", "page")?;
        self.captions.insert(caption.id, caption.clone());
        Ok(caption)
    }

    pub fn insert_chunk(&mut self, chunk: Chunk) -> Result<Chunk, RepositoryError> {
        ensure_free(&self.chunks, chunk.id, "chunk")?;
        if let Some(caption_id) = chunk.parent_caption {
            require(&self.captions, caption_id, "parent_caption", "caption")?;
        }
        self.chunks.insert(chunk.id, chunk.clone());
        Ok(chunk)
    }

    pub fn insert_image_chunk(
        &mut self,
        image_chunk: ImageChunk,
    ) -> Result<ImageChunk, RepositoryError> {
        ensure_free(&self.image_chunks, image_chunk.id, "image_chunk")?;
        if let Some(page_id) = image_chunk.parent_page {
            require(&self.pages, page_id, "parent_page", "page")?;
        }
        self.image_chunks.insert(image_chunk.id, image_chunk.clone());
        Ok(image_chunk)
    }

    pub fn insert_caption_chunk_relation(
        &mut self,
        relation: CaptionChunkRelation,
    ) -> Result<(), RepositoryError> {
        require(&self.captions, relation.caption_id, "caption_id", "caption")?;
        require(&self.chunks, relation.chunk_id, "chunk_id", "chunk")?;
        if !self
            .caption_chunk_relations
            .insert((relation.caption_id, relation.chunk_id))
        {
            return Err(unique(format!(
                "Key (caption_id, chunk_id)=({}, {}) already exists",
                relation.caption_id, relation.chunk_id
            )));
        }
        Ok(())
    }

    pub fn insert_query(&mut self, query: Query) -> Result<Query, RepositoryError> {
        ensure_free(&self.queries, query.id, "query")?;
        self.queries.insert(query.id, query.clone());
        Ok(query)
    }

    fn require_target(&self, target: ChunkRef) -> Result<(), RepositoryError> {
        match target {
            ChunkRef::Text(id) => require(&self.chunks, id, "chunk_id", "chunk"),
            ChunkRef::Image(id) => require(&self.image_chunks, id, "image_chunk_id", "image_chunk"),
        }
    }

    pub fn insert_retrieval_relation(
        &mut self,
        relation: RetrievalRelation,
    ) -> Result<(), RepositoryError> {
        require(&self.queries, relation.query_id, "query_id", "query")?;
        self.require_target(relation.target)?;
        if self.retrieval_relations.contains_key(&relation.slot()) {
            let (query_id, group_index, group_order) = relation.slot();
            return Err(unique(format!(
                "Key (query_id, group_index, group_order)=({}, {}, {}) already exists",
                query_id, group_index, group_order
            )));
        }
        self.retrieval_relations.insert(relation.slot(), relation.target);
        Ok(())
    }

    pub fn insert_pipeline(&mut self, pipeline: Pipeline) -> Result<Pipeline, RepositoryError> {
        ensure_free(&self.pipelines, pipeline.id, "pipeline")?;
        self.pipelines.insert(pipeline.id, pipeline.clone());
        Ok(pipeline)
    }

    pub fn insert_metric(&mut self, metric: Metric) -> Result<Metric, RepositoryError> {
        ensure_free(&self.metrics, metric.id, "metric")?;
        self.metrics.insert(metric.id, metric.clone());
        Ok(metric)
    }

    pub fn insert_executor_result(
        &mut self,
        result: ExecutorResult,
    ) -> Result<(), RepositoryError> {
        require(&self.queries, result.query_id, "query_id", "query")?;
        require(&self.pipelines, result.pipeline_id, "pipeline_id", "pipeline")?;
        let key = (result.query_id, result.pipeline_id);
        if self.executor_results.contains_key(&key) {
            return Err(unique(format!(
                "Key (query_id, pipeline_id)=({}, {}) already exists",
                key.0, key.1
            )));
        }
        self.executor_results.insert(key, result);
        Ok(())
    }

    pub fn insert_evaluation_result(
        &mut self,
        result: EvaluationResult,
    ) -> Result<(), RepositoryError> {
        require(&self.queries, result.query_id, "query_id", "query")?;
        require(&self.pipelines, result.pipeline_id, "pipeline_id", "pipeline")?;
        require(&self.metrics, result.metric_id, "metric_id", "metric")?;
        let key = (result.query_id, result.pipeline_id, result.metric_id);
        if self.evaluation_results.contains_key(&key) {
            return Err(unique(format!(
                "Key (query_id, pipeline_id, metric_id)=({}, {}, {}) already exists",
                key.0, key.1, key.2
            )));
        }
        self.evaluation_results.insert(key, result);
        Ok(())
    }

    pub fn insert_retrieved_result(
        &mut self,
        result: &RetrievedResult,
    ) -> Result<(), RepositoryError> {
        require(&self.queries, result.query_id, "query_id", "query")?;
        require(&self.pipelines, result.pipeline_id, "pipeline_id", "pipeline")?;
        self.require_target(result.target)?;
        let key = (result.query_id, result.pipeline_id, result.target.id());
        let table = match result.target {
            ChunkRef::Text(_) => &mut self.chunk_retrieved_results,
            ChunkRef::Image(_) => &mut self.image_chunk_retrieved_results,
        };
        if table.contains_key(&key) {
            return Err(unique(format!(
                "Key (query_id, pipeline_id, {})=({}, {}, {}) already exists",
                if result.target.is_text() { "chunk_id" } else { "image_chunk_id" },
                key.0,
                key.1,
                key.2
            )));
        }
        table.insert(key, result.rel_score);
        Ok(())
    }

    pub fn insert_summary(&mut self, summary: Summary) -> Result<(), RepositoryError> {
        require(&self.pipelines, summary.pipeline_id, "pipeline_id", "pipeline")?;
        require(&self.metrics, summary.metric_id, "metric_id", "metric")?;
        let key = (summary.pipeline_id, summary.metric_id);
        if self.summaries.contains_key(&key) {
            return Err(unique(format!(
                "Key (pipeline_id, metric_id)=({}, {}) already exists",
                key.0, key.1
            )));
        }
        self.summaries.insert(key, summary);
        Ok(())
    }

    // Deletes: a row still referenced by another row cannot be removed.

    pub fn delete_file(&mut self, id: i64) -> Result<bool, RepositoryError> {
        if !self.files.contains_key(&id) {
            return Ok(false);
        }
        let referenced = self.documents.values().any(|d| d.path == Some(id));
        restrict(referenced, "file", id, "document")?;
        Ok(self.files.remove(&id).is_some())
    }

    pub fn delete_document(&mut self, id: i64) -> Result<bool, RepositoryError> {
        if !self.documents.contains_key(&id) {
            return Ok(false);
        }
        let referenced = self.pages.values().any(|p| p.document_id == id);
        restrict(referenced, "document", id, "page")?;
        Ok(self.documents.remove(&id).is_some())
    }

    pub fn delete_page(&mut self, id: i64) -> Result<bool, RepositoryError> {
        if !self.pages.contains_key(&id) {
            return Ok(false);
        }
        restrict(
            self.captions.values().any(|c| c.page_id == id),
            "page",
            id,
            "caption",
        )?;
        restrict(
            self.image_chunks.values().any(|ic| ic.parent_page == Some(id)),
            "page",
            id,
            "image_chunk",
        )?;
        Ok(self.pages.remove(&id).is_some())
    }

    pub fn delete_caption(&mut self, id: i64) -> Result<bool, RepositoryError> {
        if !self.captions.contains_key(&id) {
            return Ok(false);
        }
        restrict(
            self.chunks.values().any(|c| c.parent_caption == Some(id)),
            "caption",
            id,
            "chunk",
        )?;
        restrict(
            self.caption_chunk_relations.iter().any(|(caption_id, _)| *caption_id == id),
            "caption",
            id,
            "caption_chunk_relation",
        )?;
        Ok(self.captions.remove(&id).is_some())
    }

    pub fn delete_chunk(&mut self, id: i64) -> Result<bool, RepositoryError> {
        if !self.chunks.contains_key(&id) {
            return Ok(false);
        }
        restrict(
            self.caption_chunk_relations.iter().any(|(_, chunk_id)| *chunk_id == id),
            "chunk",
            id,
            "caption_chunk_relation",
        )?;
        restrict(
            self.retrieval_relations.values().any(|t| *t == ChunkRef::Text(id)),
            "chunk",
            id,
            "retrieval_relation",
        )?;
        restrict(
            self.chunk_retrieved_results.keys().any(|(_, _, item)| *item == id),
            "chunk",
            id,
            "chunk_retrieved_result",
        )?;
        Ok(self.chunks.remove(&id).is_some())
    }

    pub fn delete_image_chunk(&mut self, id: i64) -> Result<bool, RepositoryError> {
        if !self.image_chunks.contains_key(&id) {
            return Ok(false);
        }
        restrict(
            self.retrieval_relations.values().any(|t| *t == ChunkRef::Image(id)),
            "image_chunk",
            id,
            "retrieval_relation",
        )?;
        restrict(
            self.image_chunk_retrieved_results.keys().any(|(_, _, item)| *item == id),
            "image_chunk",
            id,
            "image_chunk_retrieved_result",
        )?;
        Ok(self.image_chunks.remove(&id).is_some())
    }

    pub fn delete_query(&mut self, id: i64) -> Result<bool, RepositoryError> {
        if !self.queries.contains_key(&id) {
            return Ok(false);
        }
        restrict(
            self.retrieval_relations.keys().any(|(query_id, _, _)| *query_id == id),
            "query",
            id,
            "retrieval_relation",
        )?;
        restrict(
            self.executor_results.keys().any(|(query_id, _)| *query_id == id),
            "query",
            id,
            "executor_result",
        )?;
        restrict(
            self.evaluation_results.keys().any(|(query_id, _, _)| *query_id == id),
            "query",
            id,
            "evaluation_result",
        )?;
        restrict(
            self.chunk_retrieved_results
                .keys()
                .chain(self.image_chunk_retrieved_results.keys())
                .any(|(query_id, _, _)| *query_id == id),
            "query",
            id,
            "retrieved_result",
        )?;
        Ok(self.queries.remove(&id).is_some())
    }

    pub fn delete_relations_of_query(&mut self, query_id: i64) -> usize {
        let before = self.retrieval_relations.len();
        self.retrieval_relations.retain(|(q, _, _), _| *q != query_id);
        before - self.retrieval_relations.len()
    }

    /// Removes a document and everything beneath it. Call inside `transaction`:
    /// a blocked delete part-way through leaves the working copy inconsistent.
    pub fn delete_document_tree(
        &mut self,
        document_id: i64,
    ) -> Result<Option<DocumentDeletion>, RepositoryError> {
        let Some(document) = self.documents.get(&document_id).cloned() else {
            return Ok(None);
        };

        let page_ids: BTreeSet<i64> = self
            .pages
            .values()
            .filter(|p| p.document_id == document_id)
            .map(|p| p.id)
            .collect();
        let caption_ids: BTreeSet<i64> = self
            .captions
            .values()
            .filter(|c| page_ids.contains(&c.page_id))
            .map(|c| c.id)
            .collect();
        let chunk_ids: BTreeSet<i64> = self
            .chunks
            .values()
            .filter(|c| c.parent_caption.is_some_and(|id| caption_ids.contains(&id)))
            .map(|c| c.id)
            .collect();
        let image_chunk_ids: BTreeSet<i64> = self
            .image_chunks
            .values()
            .filter(|ic| ic.parent_page.is_some_and(|id| page_ids.contains(&id)))
            .map(|ic| ic.id)
            .collect();

        self.caption_chunk_relations.retain(|(caption_id, chunk_id)| {
            !caption_ids.contains(caption_id) && !chunk_ids.contains(chunk_id)
        });

        for id in &chunk_ids {
            self.delete_chunk(*id)?;
        }
        for id in &image_chunk_ids {
            self.delete_image_chunk(*id)?;
        }
        for id in &caption_ids {
            self.delete_caption(*id)?;
        }
        for id in &page_ids {
            self.delete_page(*id)?;
        }
        self.delete_document(document_id)?;

        let file = match document.path {
            Some(file_id) if !self.documents.values().any(|d| d.path == Some(file_id)) => {
                let file = self.files.get(&file_id).cloned();
                self.delete_file(file_id)?;
                file
            }
            _ => None,
        };

        Ok(Some(DocumentDeletion {
            document_id,
            pages_removed: page_ids.len(),
            captions_removed: caption_ids.len(),
            chunks_removed: chunk_ids.len(),
            image_chunks_removed: image_chunk_ids.len(),
            file,
        }))
    }

    // Reads

    pub fn relations_of_query(&self, query_id: i64) -> Vec<RetrievalRelation> {
        self.retrieval_relations
            .range((query_id, i32::MIN, i32::MIN)..=(query_id, i32::MAX, i32::MAX))
            .map(|(&(query_id, group_index, group_order), &target)| RetrievalRelation {
                query_id,
                group_index,
                group_order,
                target,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{NewDocument, NewFile, NewPage};

    fn tables_with_page() -> Tables {
        let mut tables = Tables::default();
        tables.insert_file(File::from_new(1, NewFile::raw("/d.pdf"))).unwrap();
        tables
            .insert_document(Document::from_new(
                1,
                NewDocument {
                    path: Some(1),
                    ..Default::default()
                },
            ))
            .unwrap();
        tables
            .insert_page(Page::from_new(
                1,
                NewPage {
                    page_num: 1,
                    document_id: 1,
                    ..Default::default()
                },
            ))
            .unwrap();
        tables
    }

    #[test]
    fn test_failed_transaction_leaves_tables_untouched() {
        let mut tables = tables_with_page();

        let result: Result<(), RepositoryError> = tables.transaction(|t| {
            t.insert_file(File::from_new(2, NewFile::raw("/e.pdf")))?;
            t.insert_file(File::from_new(2, NewFile::raw("/again.pdf")))?;
            Ok(())
        });

        assert!(result.is_err());
        assert!(!tables.files.contains_key(&2));
    }

    #[test]
    fn test_restrict_on_referenced_file() {
        let mut tables = tables_with_page();
        let err = tables.delete_file(1).unwrap_err();
        assert!(matches!(
            err.constraint(),
            Some(ConstraintViolation::ForeignKey(_))
        ));
        assert!(tables.files.contains_key(&1));
    }

    #[test]
    fn test_sequence_never_moves_backwards() {
        let mut tables = tables_with_page();
        for _ in 0..5 {
            tables.next_id("file");
        }

        let states = tables.advance_sequences();
        let file = states.iter().find(|s| s.table == "file").unwrap();
        assert_eq!(file.last_value, 5);
        assert_eq!(tables.next_id("file"), 6);
    }

    #[test]
    fn test_relations_of_query_is_ordered() {
        let mut tables = Tables::default();
        tables
            .insert_query(Query::from_new(1, crate::domain::entities::NewQuery::new("q?")))
            .unwrap();
        tables
            .insert_chunk(Chunk::from_new(
                1,
                crate::domain::entities::NewChunk {
                    parent_caption: None,
                    contents: "c".to_string(),
                },
            ))
            .unwrap();
        for (gi, go) in [(1, 0), (0, 1), (0, 0)] {
            tables
                .insert_retrieval_relation(RetrievalRelation {
                    query_id: 1,
                    group_index: gi,
                    group_order: go,
                    target: ChunkRef::Text(1),
                })
                .unwrap();
        }

        let slots: Vec<(i32, i32)> = tables
            .relations_of_query(1)
            .iter()
            .map(|r| (r.group_index, r.group_order))
            .collect();
        assert_eq!(slots, vec![(0, 0), (0, 1), (1, 0)]);
    }
}
