use async_trait::async_trait;

use super::{InMemoryStore, Tables};
use crate::domain::repositories::{RepositoryError, SeedRepository};
use crate::domain::seed::{SeedData, SeedReport, SequenceState};

/// Inserts rows whose key is free and records how many went in.
fn seed_table<T: Clone>(
    tables: &mut Tables,
    report: &mut SeedReport,
    table: &'static str,
    rows: &[T],
    exists: impl Fn(&Tables, &T) -> bool,
    insert: impl Fn(&mut Tables, T) -> Result<(), RepositoryError>,
) -> Result<(), RepositoryError> {
    let mut inserted = 0;
    for row in rows {
        if exists(tables, row) {
            continue;
        }
        insert(tables, row.clone())?;
        inserted += 1;
    }
    report.record(table, rows.len(), inserted);
    Ok(())
}

#[async_trait]
impl SeedRepository for InMemoryStore {
    async fn load_seed(&self, seed: &SeedData) -> Result<SeedReport, RepositoryError> {
        seed.check_dimension(self.dimension())?;
        let relations = seed.relations()?;
        let retrieved = seed.retrieved_results();

        let mut tables = self.lock().await;
        let report = tables.transaction(|t| {
            let mut report = SeedReport::default();

            seed_table(
                t,
                &mut report,
                "file",
                &seed.files,
                |t, r| t.files.contains_key(&r.id),
                |t, r| t.insert_file(r).map(drop),
            )?;
            seed_table(
                t,
                &mut report,
                "document",
                &seed.documents,
                |t, r| t.documents.contains_key(&r.id),
                |t, r| t.insert_document(r).map(drop),
            )?;
            seed_table(
                t,
                &mut report,
                "page",
                &seed.pages,
                |t, r| t.pages.contains_key(&r.id),
                |t, r| t.insert_page(r).map(drop),
            )?;
            seed_table(
                t,
                &mut report,
                "caption",
                &seed.captions,
                |t, r| t.captions.contains_key(&r.id),
                |t, r| t.insert_caption(r).map(drop),
            )?;
            seed_table(
                t,
                &mut report,
                "chunk",
                &seed.chunks,
                |t, r| t.chunks.contains_key(&r.id),
                |t, r| t.insert_chunk(r).map(drop),
            )?;
            seed_table(
                t,
                &mut report,
                "image_chunk",
                &seed.image_chunks,
                |t, r| t.image_chunks.contains_key(&r.id),
                |t, r| t.insert_image_chunk(r).map(drop),
            )?;
            seed_table(
                t,
                &mut report,
                "caption_chunk_relation",
                &seed.caption_chunk_relations,
                |t, r| t.caption_chunk_relations.contains(&(r.caption_id, r.chunk_id)),
                |t, r| t.insert_caption_chunk_relation(r),
            )?;
            seed_table(
                t,
                &mut report,
                "query",
                &seed.queries,
                |t, r| t.queries.contains_key(&r.id),
                |t, r| t.insert_query(r).map(drop),
            )?;
            seed_table(
                t,
                &mut report,
                "retrieval_relation",
                &relations,
                |t, r| t.retrieval_relations.contains_key(&r.slot()),
                |t, r| t.insert_retrieval_relation(r),
            )?;
            seed_table(
                t,
                &mut report,
                "pipeline",
                &seed.pipelines,
                |t, r| t.pipelines.contains_key(&r.id),
                |t, r| t.insert_pipeline(r).map(drop),
            )?;
            seed_table(
                t,
                &mut report,
                "metric",
                &seed.metrics,
                |t, r| t.metrics.contains_key(&r.id),
                |t, r| t.insert_metric(r).map(drop),
            )?;
            seed_table(
                t,
                &mut report,
                "executor_result",
                &seed.executor_results,
                |t, r| t.executor_results.contains_key(&(r.query_id, r.pipeline_id)),
                |t, r| t.insert_executor_result(r),
            )?;
            seed_table(
                t,
                &mut report,
                "evaluation_result",
                &seed.evaluation_results,
                |t, r| {
                    t.evaluation_results
                        .contains_key(&(r.query_id, r.pipeline_id, r.metric_id))
                },
                |t, r| t.insert_evaluation_result(r),
            )?;

            let (text, image): (Vec<_>, Vec<_>) =
                retrieved.iter().cloned().partition(|r| r.target.is_text());
            seed_table(
                t,
                &mut report,
                "chunk_retrieved_result",
                &text,
                |t, r| {
                    t.chunk_retrieved_results
                        .contains_key(&(r.query_id, r.pipeline_id, r.target.id()))
                },
                |t, r| t.insert_retrieved_result(&r),
            )?;
            seed_table(
                t,
                &mut report,
                "image_chunk_retrieved_result",
                &image,
                |t, r| {
                    t.image_chunk_retrieved_results
                        .contains_key(&(r.query_id, r.pipeline_id, r.target.id()))
                },
                |t, r| t.insert_retrieved_result(&r),
            )?;

            seed_table(
                t,
                &mut report,
                "summary",
                &seed.summaries,
                |t, r| t.summaries.contains_key(&(r.pipeline_id, r.metric_id)),
                |t, r| t.insert_summary(r),
            )?;

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
        Ok(self.lock().await.advance_sequences())
    }
}
