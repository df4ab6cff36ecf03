use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::entities::{NewQuery, Query, RetrievalRelation};
use crate::domain::value_objects::{EmbeddingUpdate, RetrievalGroundTruth};

#[async_trait]
pub trait QueryRepository: Send + Sync {
    async fn create_query(&self, query: NewQuery) -> Result<Query, RepositoryError>;

    /// Persists the query and every ground-truth relation, or nothing.
    async fn create_query_with_ground_truth(
        &self,
        query: NewQuery,
        ground_truth: &RetrievalGroundTruth,
    ) -> Result<(Query, Vec<RetrievalRelation>), RepositoryError>;

    async fn find_query(&self, id: i64) -> Result<Option<Query>, RepositoryError>;
    /// Newest first.
    async fn list_queries(&self, skip: i64, limit: i64) -> Result<Vec<Query>, RepositoryError>;
    async fn count_queries(&self) -> Result<i64, RepositoryError>;

    async fn add_retrieval_relation(
        &self,
        relation: RetrievalRelation,
    ) -> Result<(), RepositoryError>;
    /// Ordered by `(group_index, group_order)`.
    async fn find_relations_by_query(
        &self,
        query_id: i64,
    ) -> Result<Vec<RetrievalRelation>, RepositoryError>;

    /// Fails with a foreign key violation while relations or results reference the query.
    async fn delete_query(&self, id: i64) -> Result<bool, RepositoryError>;
    /// Removes the relations and then the query in one transaction. Returns the
    /// number of relations removed, or `None` if the query does not exist.
    async fn delete_query_with_relations(&self, id: i64) -> Result<Option<usize>, RepositoryError>;

    async fn update_query_embeddings(
        &self,
        id: i64,
        update: EmbeddingUpdate,
    ) -> Result<(), RepositoryError>;

    async fn ground_truth(&self, query_id: i64) -> Result<RetrievalGroundTruth, RepositoryError> {
        let relations = self.find_relations_by_query(query_id).await?;
        Ok(RetrievalGroundTruth::from_relations(relations))
    }
}
