use async_trait::async_trait;

use super::InMemoryStore;
use crate::domain::entities::{NewQuery, Query, RetrievalRelation};
use crate::domain::repositories::{QueryRepository, RepositoryError};
use crate::domain::value_objects::{EmbeddingUpdate, RetrievalGroundTruth};

#[async_trait]
impl QueryRepository for InMemoryStore {
    async fn create_query(&self, query: NewQuery) -> Result<Query, RepositoryError> {
        let mut tables = self.lock().await;
        let id = tables.next_id("query");
        tables.insert_query(Query::from_new(id, query))
    }

    async fn create_query_with_ground_truth(
        &self,
        query: NewQuery,
        ground_truth: &RetrievalGroundTruth,
    ) -> Result<(Query, Vec<RetrievalRelation>), RepositoryError> {
        if ground_truth.is_empty() {
            return Err(RepositoryError::Validation(
                "ground truth needs at least one target".to_string(),
            ));
        }

        let mut tables = self.lock().await;
        tables.transaction(|t| {
            let id = t.next_id("query");
            let query = t.insert_query(Query::from_new(id, query))?;
            let relations = ground_truth.to_relations(query.id);
            for relation in &relations {
                t.insert_retrieval_relation(*relation)?;
            }
            Ok((query, relations))
        })
    }

    async fn find_query(&self, id: i64) -> Result<Option<Query>, RepositoryError> {
        Ok(self.lock().await.queries.get(&id).cloned())
    }

    async fn list_queries(&self, skip: i64, limit: i64) -> Result<Vec<Query>, RepositoryError> {
        Ok(self
            .lock()
            .await
            .queries
            .values()
            .rev()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_queries(&self) -> Result<i64, RepositoryError> {
        Ok(self.lock().await.queries.len() as i64)
    }

    async fn add_retrieval_relation(
        &self,
        relation: RetrievalRelation,
    ) -> Result<(), RepositoryError> {
        self.lock().await.insert_retrieval_relation(relation)
    }

    async fn find_relations_by_query(
        &self,
        query_id: i64,
    ) -> Result<Vec<RetrievalRelation>, RepositoryError> {
        Ok(self.lock().await.relations_of_query(query_id))
    }

    async fn delete_query(&self, id: i64) -> Result<bool, RepositoryError> {
        self.lock().await.delete_query(id)
    }

    async fn delete_query_with_relations(&self, id: i64) -> Result<Option<usize>, RepositoryError> {
        let mut tables = self.lock().await;
        if !tables.queries.contains_key(&id) {
            return Ok(None);
        }
        tables.transaction(|t| {
            let removed = t.delete_relations_of_query(id);
            t.delete_query(id)?;
            Ok(Some(removed))
        })
    }

    async fn update_query_embeddings(
        &self,
        id: i64,
        update: EmbeddingUpdate,
    ) -> Result<(), RepositoryError> {
        if update.is_empty() {
            return Err(RepositoryError::Validation(
                "embedding update sets no columns".to_string(),
            ));
        }
        update.ensure_dimension(self.dimension())?;

        let mut tables = self.lock().await;
        let query = tables
            .queries
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("query", id))?;
        if let Some(embedding) = update.embedding {
            query.embedding = Some(embedding);
        }
        if let Some(embeddings) = update.embeddings {
            query.embeddings = Some(embeddings);
        }
        Ok(())
    }
}
