//! Reads of the embedding columns, which only exist as `vector` types when an
//! extension is installed.

use std::collections::HashMap;

use diesel::prelude::*;
use diesel::sql_types::{Array, BigInt, Double};
use pgvector::Vector;

use crate::domain::repositories::RepositoryError;
use crate::domain::value_objects::{Embedding, EmbeddingUpdate, MultiVector};
use crate::infrastructure::database::VectorSupport;
use crate::infrastructure::database::models::{VectorColumns, to_vectors};
use crate::infrastructure::database::schema::{chunks, image_chunks, queries};

type VectorRow = (i64, Option<Vector>, Option<Vec<Vector>>);

fn index_rows(rows: Vec<VectorRow>) -> Result<HashMap<i64, VectorColumns>, RepositoryError> {
    rows.into_iter()
        .map(|row| VectorColumns::from_row(row).map(|columns| (columns.id, columns)))
        .collect()
}

pub fn load_chunk_vectors(
    conn: &mut PgConnection,
    ids: &[i64],
) -> Result<HashMap<i64, VectorColumns>, RepositoryError> {
    let rows = chunks::table
        .filter(chunks::id.eq_any(ids))
        .select((chunks::id, chunks::embedding, chunks::embeddings))
        .load::<VectorRow>(conn)?;
    index_rows(rows)
}

pub fn load_image_chunk_vectors(
    conn: &mut PgConnection,
    ids: &[i64],
) -> Result<HashMap<i64, VectorColumns>, RepositoryError> {
    let rows = image_chunks::table
        .filter(image_chunks::id.eq_any(ids))
        .select((image_chunks::id, image_chunks::embedding, image_chunks::embeddings))
        .load::<VectorRow>(conn)?;
    index_rows(rows)
}

pub fn load_query_vectors(
    conn: &mut PgConnection,
    ids: &[i64],
) -> Result<HashMap<i64, VectorColumns>, RepositoryError> {
    let rows = queries::table
        .filter(queries::id.eq_any(ids))
        .select((queries::id, queries::embedding, queries::embeddings))
        .load::<VectorRow>(conn)?;
    index_rows(rows)
}

/// Checks an update against the column dimension and the installed extension.
pub fn check_update(
    vectors: VectorSupport,
    dimension: usize,
    update: &EmbeddingUpdate,
) -> Result<(), RepositoryError> {
    if update.is_empty() {
        return Err(RepositoryError::Validation(
            "embedding update sets no columns".to_string(),
        ));
    }
    update.ensure_dimension(dimension)?;
    if !vectors.is_available() {
        return Err(RepositoryError::ExtensionUnavailable(
            "embedding columns are stored as real[] and cannot be written".to_string(),
        ));
    }
    Ok(())
}

#[derive(QueryableByName)]
struct MaxSimRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
    #[diesel(sql_type = Double)]
    distance: f64,
}

/// Ranks rows of `table` by VectorChord's `@#` MaxSim distance. The score is
/// the negated distance, so higher is closer.
pub fn max_sim_search(
    conn: &mut PgConnection,
    table: &'static str,
    query: &MultiVector,
    limit: usize,
) -> Result<Vec<(i64, f32)>, RepositoryError> {
    let sql = format!(
        "SELECT id, (embeddings @# $1)::float8 AS distance FROM {} \
         WHERE embeddings IS NOT NULL ORDER BY embeddings @# $1 LIMIT $2",
        table
    );

    let rows = diesel::sql_query(sql)
        .bind::<Array<pgvector::sql_types::Vector>, _>(to_vectors(query))
        .bind::<BigInt, _>(limit as i64)
        .load::<MaxSimRow>(conn)?;

    Ok(rows.into_iter().map(|row| (row.id, -(row.distance as f32))).collect())
}

/// Late-interaction score computed in process, for pgvector without MaxSim.
pub fn max_sim_in_process(
    candidates: Vec<(i64, Option<Vec<Vector>>)>,
    query: &MultiVector,
) -> Result<Vec<(i64, f32)>, RepositoryError> {
    let mut scored = Vec::with_capacity(candidates.len());
    for (id, vectors) in candidates {
        if let Some(vectors) = vectors {
            let stored = crate::infrastructure::database::models::from_vectors(vectors)?;
            scored.push((id, stored.max_sim(query)));
        }
    }
    Ok(scored)
}

pub fn dense_scores(
    rows: Vec<(i64, Option<Vector>)>,
    query: &Embedding,
) -> Result<Vec<(i64, f32)>, RepositoryError> {
    let mut scored = Vec::with_capacity(rows.len());
    for (id, vector) in rows {
        if let Some(vector) = vector {
            let stored = crate::infrastructure::database::models::from_vector(vector)?;
            scored.push((id, stored.cosine_similarity(query)));
        }
    }
    Ok(scored)
}
