use diesel::prelude::*;

use crate::domain::entities::{NewQuery, Query, RetrievalRelation};
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::schema::{queries, retrieval_relations};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = queries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QueryModel {
    pub id: i64,
    pub contents: String,
    pub query_to_llm: Option<String>,
    pub generation_gt: Option<Vec<String>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = queries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewQueryModel {
    pub id: Option<i64>,
    pub contents: String,
    pub query_to_llm: Option<String>,
    pub generation_gt: Option<Vec<String>>,
}

impl From<&NewQuery> for NewQueryModel {
    fn from(query: &NewQuery) -> Self {
        Self {
            id: None,
            contents: query.contents.clone(),
            query_to_llm: query.query_to_llm.clone(),
            generation_gt: query.generation_gt.clone(),
        }
    }
}

impl From<&Query> for NewQueryModel {
    fn from(query: &Query) -> Self {
        Self {
            id: Some(query.id),
            contents: query.contents.clone(),
            query_to_llm: query.query_to_llm.clone(),
            generation_gt: query.generation_gt.clone(),
        }
    }
}

impl From<QueryModel> for Query {
    fn from(model: QueryModel) -> Self {
        Query {
            id: model.id,
            contents: model.contents,
            query_to_llm: model.query_to_llm,
            generation_gt: model.generation_gt,
            embedding: None,
            embeddings: None,
        }
    }
}

/// Storage shape of a relation: the target split into two nullable columns.
#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = retrieval_relations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RetrievalRelationModel {
    pub query_id: i64,
    pub group_index: i32,
    pub group_order: i32,
    pub chunk_id: Option<i64>,
    pub image_chunk_id: Option<i64>,
}

impl From<&RetrievalRelation> for RetrievalRelationModel {
    fn from(relation: &RetrievalRelation) -> Self {
        Self {
            query_id: relation.query_id,
            group_index: relation.group_index,
            group_order: relation.group_order,
            chunk_id: relation.target.chunk_id(),
            image_chunk_id: relation.target.image_chunk_id(),
        }
    }
}

impl TryFrom<RetrievalRelationModel> for RetrievalRelation {
    type Error = RepositoryError;

    fn try_from(model: RetrievalRelationModel) -> Result<Self, Self::Error> {
        Ok(RetrievalRelation::from_columns(
            model.query_id,
            model.group_index,
            model.group_order,
            model.chunk_id,
            model.image_chunk_id,
        )?)
    }
}
