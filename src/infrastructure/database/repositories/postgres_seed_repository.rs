use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::BigInt;

use crate::domain::repositories::{RepositoryError, SeedRepository};
use crate::domain::seed::{SEQUENCED_TABLES, SeedData, SeedReport, SequenceState};
use crate::domain::value_objects::{Embedding, EmbeddingUpdate, MultiVector};
use crate::infrastructure::database::models::{
    CaptionChunkRelationModel, ChunkVectorsChangeset, EvaluationResultModel, ExecutorResultModel,
    ImageChunkVectorsChangeset, NewCaptionModel, NewChunkModel, NewDocumentModel, NewFileModel,
    NewImageChunkModel, NewMetricModel, NewPageModel, NewPipelineModel, NewQueryModel,
    QueryVectorsChangeset, RetrievalRelationModel, SummaryModel, split_retrieved,
};
use crate::infrastructure::database::schema::{
    caption_chunk_relations, captions, chunk_retrieved_results, chunks, documents,
    evaluation_results, executor_results, files, image_chunk_retrieved_results, image_chunks,
    metrics, pages, pipelines, queries, retrieval_relations, summaries,
};
use crate::infrastructure::database::{DbPool, VectorSupport, get_connection_from_pool};

pub struct PostgresSeedRepository {
    pool: DbPool,
    vectors: VectorSupport,
    dimension: usize,
}

impl PostgresSeedRepository {
    pub fn new(pool: DbPool, vectors: VectorSupport, dimension: usize) -> Self {
        Self {
            pool,
            vectors,
            dimension,
        }
    }
}

#[derive(QueryableByName)]
struct SequenceRow {
    #[diesel(sql_type = BigInt)]
    last_value: i64,
}

fn advance_sequence_sql(table: &str) -> String {
    format!(
        "WITH seq AS (SELECT pg_get_serial_sequence('{table}', 'id') AS name), \
         target AS ( \
             SELECT GREATEST( \
                 (SELECT COALESCE(MAX(id), 0) FROM \"{table}\"), \
                 COALESCE(pg_sequence_last_value((SELECT name FROM seq)::regclass), 0) \
             ) AS value \
         ) \
         SELECT setval((SELECT name FROM seq), GREATEST(value, 1), value > 0) AS next_base, \
                value AS last_value \
         FROM target"
    )
}

/// Seed rows carrying vectors, restricted to the ids that were actually inserted.
fn vector_updates<'a, T: 'a>(
    rows: impl IntoIterator<Item = &'a T>,
    inserted: &[i64],
    columns: impl Fn(&T) -> (i64, Option<&Embedding>, Option<&MultiVector>),
) -> Vec<(i64, EmbeddingUpdate)> {
    rows.into_iter()
        .map(columns)
        .filter(|(id, _, _)| inserted.contains(id))
        .map(|(id, embedding, embeddings)| {
            (
                id,
                EmbeddingUpdate {
                    embedding: embedding.cloned(),
                    embeddings: embeddings.cloned(),
                },
            )
        })
        .filter(|(_, update)| !update.is_empty())
        .collect()
}

#[async_trait]
impl SeedRepository for PostgresSeedRepository {
    async fn load_seed(&self, seed: &SeedData) -> Result<SeedReport, RepositoryError> {
        seed.check_dimension(self.dimension)?;
        let relations: Vec<RetrievalRelationModel> = seed
            .relations()?
            .iter()
            .map(RetrievalRelationModel::from)
            .collect();
        let (text_results, image_results) = split_retrieved(&seed.retrieved_results());
        let vectors = self.vectors;

        let mut conn = get_connection_from_pool(&self.pool)?;

        let report = conn.transaction::<_, RepositoryError, _>(|conn| {
            let mut report = SeedReport::default();

            let rows: Vec<NewFileModel> = seed.files.iter().map(NewFileModel::from).collect();
            let inserted: Vec<i64> = diesel::insert_into(files::table)
                .values(&rows)
                .on_conflict(files::id)
                .do_nothing()
                .returning(files::id)
                .get_results(conn)?;
            report.record("file", rows.len(), inserted.len());

            let rows: Vec<NewDocumentModel> =
                seed.documents.iter().map(NewDocumentModel::from).collect();
            let inserted: Vec<i64> = diesel::insert_into(documents::table)
                .values(&rows)
                .on_conflict(documents::id)
                .do_nothing()
                .returning(documents::id)
                .get_results(conn)?;
            report.record("document", rows.len(), inserted.len());

            let rows: Vec<NewPageModel> = seed.pages.iter().map(NewPageModel::from).collect();
            let inserted: Vec<i64> = diesel::insert_into(pages::table)
                .values(&rows)
                .on_conflict(pages::id)
                .do_nothing()
                .returning(pages::id)
                .get_results(conn)?;
            report.record("page", rows.len(), inserted.len());

            let rows: Vec<NewCaptionModel> =
                seed.captions.iter().map(NewCaptionModel::from).collect();
            let inserted: Vec<i64> = diesel::insert_into(captions::table)
                .values(&rows)
                .on_conflict(captions::id)
                .do_nothing()
                .returning(captions::id)
                .get_results(conn)?;
            report.record("caption", rows.len(), inserted.len());

            let rows: Vec<NewChunkModel> = seed.chunks.iter().map(NewChunkModel::from).collect();
            let inserted: Vec<i64> = diesel::insert_into(chunks::table)
                .values(&rows)
                .on_conflict(chunks::id)
                .do_nothing()
                .returning(chunks::id)
                .get_results(conn)?;
            report.record("chunk", rows.len(), inserted.len());
            if vectors.is_available() {
                let updates = vector_updates(&seed.chunks, &inserted, |c| {
                    (c.id, c.embedding.as_ref(), c.embeddings.as_ref())
                });
                for (id, update) in updates {
                    diesel::update(chunks::table.find(id))
                        .set(&ChunkVectorsChangeset::from(&update))
                        .execute(conn)?;
                }
            }

            let rows: Vec<NewImageChunkModel> =
                seed.image_chunks.iter().map(NewImageChunkModel::from).collect();
            let inserted: Vec<i64> = diesel::insert_into(image_chunks::table)
                .values(&rows)
                .on_conflict(image_chunks::id)
                .do_nothing()
                .returning(image_chunks::id)
                .get_results(conn)?;
            report.record("image_chunk", rows.len(), inserted.len());
            if vectors.is_available() {
                let updates = vector_updates(&seed.image_chunks, &inserted, |c| {
                    (c.id, c.embedding.as_ref(), c.embeddings.as_ref())
                });
                for (id, update) in updates {
                    diesel::update(image_chunks::table.find(id))
                        .set(&ImageChunkVectorsChangeset::from(&update))
                        .execute(conn)?;
                }
            }

            let rows: Vec<CaptionChunkRelationModel> = seed
                .caption_chunk_relations
                .iter()
                .map(CaptionChunkRelationModel::from)
                .collect();
            let inserted = diesel::insert_into(caption_chunk_relations::table)
                .values(&rows)
                .on_conflict((
                    caption_chunk_relations::caption_id,
                    caption_chunk_relations::chunk_id,
                ))
                .do_nothing()
                .execute(conn)?;
            report.record("caption_chunk_relation", rows.len(), inserted);

            let rows: Vec<NewQueryModel> = seed.queries.iter().map(NewQueryModel::from).collect();
            let inserted: Vec<i64> = diesel::insert_into(queries::table)
                .values(&rows)
                .on_conflict(queries::id)
                .do_nothing()
                .returning(queries::id)
                .get_results(conn)?;
            report.record("query", rows.len(), inserted.len());
            if vectors.is_available() {
                let updates = vector_updates(&seed.queries, &inserted, |q| {
                    (q.id, q.embedding.as_ref(), q.embeddings.as_ref())
                });
                for (id, update) in updates {
                    diesel::update(queries::table.find(id))
                        .set(&QueryVectorsChangeset::from(&update))
                        .execute(conn)?;
                }
            }

            let inserted = diesel::insert_into(retrieval_relations::table)
                .values(&relations)
                .on_conflict((
                    retrieval_relations::query_id,
                    retrieval_relations::group_index,
                    retrieval_relations::group_order,
                ))
                .do_nothing()
                .execute(conn)?;
            report.record("retrieval_relation", relations.len(), inserted);

            let rows: Vec<NewPipelineModel> =
                seed.pipelines.iter().map(NewPipelineModel::from).collect();
            let inserted: Vec<i64> = diesel::insert_into(pipelines::table)
                .values(&rows)
                .on_conflict(pipelines::id)
                .do_nothing()
                .returning(pipelines::id)
                .get_results(conn)?;
            report.record("pipeline", rows.len(), inserted.len());

            let rows: Vec<NewMetricModel> = seed.metrics.iter().map(NewMetricModel::from).collect();
            let inserted: Vec<i64> = diesel::insert_into(metrics::table)
                .values(&rows)
                .on_conflict(metrics::id)
                .do_nothing()
                .returning(metrics::id)
                .get_results(conn)?;
            report.record("metric", rows.len(), inserted.len());

            let rows: Vec<ExecutorResultModel> = seed
                .executor_results
                .iter()
                .map(ExecutorResultModel::from)
                .collect();
            let inserted = diesel::insert_into(executor_results::table)
                .values(&rows)
                .on_conflict((executor_results::query_id, executor_results::pipeline_id))
                .do_nothing()
                .execute(conn)?;
            report.record("executor_result", rows.len(), inserted);

            let rows: Vec<EvaluationResultModel> = seed
                .evaluation_results
                .iter()
                .map(EvaluationResultModel::from)
                .collect();
            let inserted = diesel::insert_into(evaluation_results::table)
                .values(&rows)
                .on_conflict((
                    evaluation_results::query_id,
                    evaluation_results::pipeline_id,
                    evaluation_results::metric_id,
                ))
                .do_nothing()
                .execute(conn)?;
            report.record("evaluation_result", rows.len(), inserted);

            let inserted = diesel::insert_into(chunk_retrieved_results::table)
                .values(&text_results)
                .on_conflict((
                    chunk_retrieved_results::query_id,
                    chunk_retrieved_results::pipeline_id,
                    chunk_retrieved_results::chunk_id,
                ))
                .do_nothing()
                .execute(conn)?;
            report.record("chunk_retrieved_result", text_results.len(), inserted);

            let inserted = diesel::insert_into(image_chunk_retrieved_results::table)
                .values(&image_results)
                .on_conflict((
                    image_chunk_retrieved_results::query_id,
                    image_chunk_retrieved_results::pipeline_id,
                    image_chunk_retrieved_results::image_chunk_id,
                ))
                .do_nothing()
                .execute(conn)?;
            report.record("image_chunk_retrieved_result", image_results.len(), inserted);

            let rows: Vec<SummaryModel> = seed.summaries.iter().map(SummaryModel::from).collect();
            let inserted = diesel::insert_into(summaries::table)
                .values(&rows)
                .on_conflict((summaries::pipeline_id, summaries::metric_id))
                .do_nothing()
                .execute(conn)?;
            report.record("summary", rows.len(), inserted);

            Ok(report)
        })?;

        tracing::info!(
            "Seed loaded: {} rows inserted, {} already present",
            report.total_inserted(),
            report.total_skipped()
        );
        Ok(report)
    }

    async fn advance_sequences(&self) -> Result<Vec<SequenceState>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let mut states = Vec::with_capacity(SEQUENCED_TABLES.len());
            for table in SEQUENCED_TABLES {
                let row = diesel::sql_query(advance_sequence_sql(table))
                    .get_result::<SequenceRow>(conn)?;
                tracing::debug!("Sequence of {} advanced to {}", table, row.last_value);
                states.push(SequenceState {
                    table,
                    last_value: row.last_value,
                });
            }
            Ok(states)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_sequence_sql_targets_table() {
        let sql = advance_sequence_sql("image_chunk");
        assert!(sql.contains("pg_get_serial_sequence('image_chunk', 'id')"));
        assert!(sql.contains("FROM \"image_chunk\""));
        assert!(sql.contains("AS last_value"));
    }

    #[test]
    fn test_vector_updates_skip_rows_not_inserted() {
        let embedding = Embedding::new(vec![1.0, 0.0]).unwrap();
        let rows = vec![
            (1_i64, Some(embedding.clone())),
            (2, Some(embedding)),
            (3, None),
        ];

        let updates = vector_updates(&rows, &[2, 3], |(id, e)| (*id, e.as_ref(), None));

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, 2);
    }
}
