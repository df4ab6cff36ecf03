use async_trait::async_trait;
use diesel::prelude::*;

use super::vector_columns::{check_update, load_query_vectors};
use crate::domain::entities::{NewQuery, Query, RetrievalRelation};
use crate::domain::repositories::{QueryRepository, RepositoryError};
use crate::domain::value_objects::{EmbeddingUpdate, RetrievalGroundTruth};
use crate::infrastructure::database::models::{
    NewQueryModel, QueryModel, QueryVectorsChangeset, RetrievalRelationModel,
};
use crate::infrastructure::database::schema::{queries, retrieval_relations};
use crate::infrastructure::database::{DbPool, VectorSupport, get_connection_from_pool};

pub struct PostgresQueryRepository {
    pool: DbPool,
    vectors: VectorSupport,
    dimension: usize,
}

impl PostgresQueryRepository {
    pub fn new(pool: DbPool, vectors: VectorSupport, dimension: usize) -> Self {
        Self {
            pool,
            vectors,
            dimension,
        }
    }

    fn attach_vectors(
        &self,
        conn: &mut PgConnection,
        items: &mut [Query],
    ) -> Result<(), RepositoryError> {
        if !self.vectors.is_available() || items.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = items.iter().map(|q| q.id).collect();
        let mut columns = load_query_vectors(conn, &ids)?;
        for query in items {
            if let Some(found) = columns.remove(&query.id) {
                query.embedding = found.embedding;
                query.embeddings = found.embeddings;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl QueryRepository for PostgresQueryRepository {
    async fn create_query(&self, query: NewQuery) -> Result<Query, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let model = diesel::insert_into(queries::table)
            .values(&NewQueryModel::from(&query))
            .returning(QueryModel::as_returning())
            .get_result(&mut conn)?;

        Ok(Query::from(model))
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

        let mut conn = get_connection_from_pool(&self.pool)?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let model = diesel::insert_into(queries::table)
                .values(&NewQueryModel::from(&query))
                .returning(QueryModel::as_returning())
                .get_result(conn)?;
            let query = Query::from(model);

            let relations = ground_truth.to_relations(query.id);
            let rows: Vec<RetrievalRelationModel> =
                relations.iter().map(RetrievalRelationModel::from).collect();
            diesel::insert_into(retrieval_relations::table)
                .values(&rows)
                .execute(conn)?;

            tracing::debug!(
                "Created query {} with {} ground-truth relations",
                query.id,
                relations.len()
            );
            Ok((query, relations))
        })
    }

    async fn find_query(&self, id: i64) -> Result<Option<Query>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let Some(model) = queries::table
            .find(id)
            .select(QueryModel::as_select())
            .first(&mut conn)
            .optional()?
        else {
            return Ok(None);
        };

        let mut found = [Query::from(model)];
        self.attach_vectors(&mut conn, &mut found)?;
        let [query] = found;
        Ok(Some(query))
    }

    async fn list_queries(&self, skip: i64, limit: i64) -> Result<Vec<Query>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let models = queries::table
            .order(queries::id.desc())
            .offset(skip.max(0))
            .limit(limit.max(0))
            .select(QueryModel::as_select())
            .load(&mut conn)?;

        let mut result: Vec<Query> = models.into_iter().map(Query::from).collect();
        self.attach_vectors(&mut conn, &mut result)?;
        Ok(result)
    }

    async fn count_queries(&self) -> Result<i64, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;
        Ok(queries::table.count().get_result(&mut conn)?)
    }

    async fn add_retrieval_relation(
        &self,
        relation: RetrievalRelation,
    ) -> Result<(), RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        diesel::insert_into(retrieval_relations::table)
            .values(&RetrievalRelationModel::from(&relation))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn find_relations_by_query(
        &self,
        query_id: i64,
    ) -> Result<Vec<RetrievalRelation>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let models = retrieval_relations::table
            .filter(retrieval_relations::query_id.eq(query_id))
            .order((
                retrieval_relations::group_index.asc(),
                retrieval_relations::group_order.asc(),
            ))
            .select(RetrievalRelationModel::as_select())
            .load(&mut conn)?;

        models.into_iter().map(RetrievalRelation::try_from).collect()
    }

    async fn delete_query(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let deleted_count = diesel::delete(queries::table.find(id)).execute(&mut conn)?;
        Ok(deleted_count > 0)
    }

    async fn delete_query_with_relations(&self, id: i64) -> Result<Option<usize>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let exists: i64 = queries::table
                .filter(queries::id.eq(id))
                .count()
                .get_result(conn)?;
            if exists == 0 {
                return Ok(None);
            }

            let removed = diesel::delete(
                retrieval_relations::table.filter(retrieval_relations::query_id.eq(id)),
            )
            .execute(conn)?;
            diesel::delete(queries::table.find(id)).execute(conn)?;

            Ok(Some(removed))
        })
    }

    async fn update_query_embeddings(
        &self,
        id: i64,
        update: EmbeddingUpdate,
    ) -> Result<(), RepositoryError> {
        check_update(self.vectors, self.dimension, &update)?;
        let mut conn = get_connection_from_pool(&self.pool)?;

        let updated = diesel::update(queries::table.find(id))
            .set(&QueryVectorsChangeset::from(&update))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(RepositoryError::not_found("query", id));
        }
        Ok(())
    }
}
