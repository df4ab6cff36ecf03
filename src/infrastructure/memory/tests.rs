use super::InMemoryStore;
use crate::domain::entities::{
    CaptionChunkRelation, NewCaption, NewChunk, NewDocument, NewFile, NewImageChunk, NewMetric,
    NewPage, NewPipeline, NewQuery, RetrievalRelation, RetrievedResult,
};
use crate::domain::repositories::{
    ChunkRepository, ConstraintViolation, DocumentRepository, EvaluationRepository, IngestionBatch,
    PageUpload, QueryRepository, RepositoryError, SeedRepository, SimilarityQuery,
};
use crate::domain::seed::SeedData;
use crate::domain::value_objects::{
    ChunkRef, Embedding, EmbeddingUpdate, MetricType, MultiVector, RetrievalGroundTruth,
};

fn is_foreign_key(err: &RepositoryError) -> bool {
    matches!(err.constraint(), Some(ConstraintViolation::ForeignKey(_)))
}

fn is_unique(err: &RepositoryError) -> bool {
    matches!(err.constraint(), Some(ConstraintViolation::Unique(_)))
}

async fn store_with_page() -> (InMemoryStore, i64, i64) {
    let store = InMemoryStore::with_dimension(3);
    let file = store.create_file(NewFile::raw("/data/pdfs/a.pdf")).await.unwrap();
    let document = store
        .create_document(NewDocument {
            path: Some(file.id),
            filename: Some("a.pdf".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let page = store
        .create_page(NewPage {
            page_num: 1,
            document_id: document.id,
            ..Default::default()
        })
        .await
        .unwrap();
    (store, document.id, page.id)
}

#[tokio::test]
async fn test_end_to_end_annotation_chain() {
    let store = InMemoryStore::with_dimension(3);

    let file = store.create_file(NewFile::raw("/data/pdfs/report.pdf")).await.unwrap();
    let document = store
        .create_document(NewDocument {
            path: Some(file.id),
            filename: Some("report.pdf".to_string()),
            title: Some("report".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let page = store
        .create_page(NewPage {
            page_num: 1,
            document_id: document.id,
            ..Default::default()
        })
        .await
        .unwrap();
    let caption = store
        .create_caption(NewCaption {
            page_id: page.id,
            contents: "Quarterly revenue table".to_string(),
        })
        .await
        .unwrap();
    let chunk = store
        .create_chunk(NewChunk {
            parent_caption: Some(caption.id),
            contents: "Revenue grew 12%".to_string(),
        })
        .await
        .unwrap();
    let query = store.create_query(NewQuery::new("How much did revenue grow?")).await.unwrap();
    store
        .add_retrieval_relation(RetrievalRelation {
            query_id: query.id,
            group_index: 0,
            group_order: 0,
            target: ChunkRef::Text(chunk.id),
        })
        .await
        .unwrap();

    let relations = store.find_relations_by_query(query.id).await.unwrap();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].target, ChunkRef::Text(chunk.id));

    let gt = store.ground_truth(query.id).await.unwrap();
    assert!(gt.is_satisfied_by(&[ChunkRef::Text(chunk.id)]));
}

#[tokio::test]
async fn test_duplicate_page_number_is_rejected() {
    let (store, document_id, _) = store_with_page().await;

    let err = store
        .create_page(NewPage {
            page_num: 1,
            document_id,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(is_unique(&err));

    let second = store
        .create_page(NewPage {
            page_num: 2,
            document_id,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(second.page_num, 2);
}

#[tokio::test]
async fn test_page_requires_existing_document() {
    let store = InMemoryStore::new();
    let err = store
        .create_page(NewPage {
            page_num: 1,
            document_id: 42,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(is_foreign_key(&err));
}

#[tokio::test]
async fn test_relation_to_missing_chunk_is_rejected() {
    let store = InMemoryStore::new();
    let query = store.create_query(NewQuery::new("q")).await.unwrap();

    let err = store
        .add_retrieval_relation(RetrievalRelation {
            query_id: query.id,
            group_index: 0,
            group_order: 0,
            target: ChunkRef::Image(99),
        })
        .await
        .unwrap_err();
    assert!(is_foreign_key(&err));
}

#[tokio::test]
async fn test_relation_slot_is_unique() {
    let store = InMemoryStore::new();
    let query = store.create_query(NewQuery::new("q")).await.unwrap();
    let chunk = store
        .create_chunk(NewChunk {
            parent_caption: None,
            contents: "c".to_string(),
        })
        .await
        .unwrap();
    let relation = RetrievalRelation {
        query_id: query.id,
        group_index: 0,
        group_order: 0,
        target: ChunkRef::Text(chunk.id),
    };

    store.add_retrieval_relation(relation).await.unwrap();
    let err = store.add_retrieval_relation(relation).await.unwrap_err();
    assert!(is_unique(&err));
}

#[tokio::test]
async fn test_delete_document_is_restricted_by_pages() {
    let (store, document_id, _) = store_with_page().await;

    let err = store.delete_document(document_id).await.unwrap_err();
    assert!(is_foreign_key(&err));
    assert!(store.find_document(document_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_document_tree_removes_descendants() {
    let (store, document_id, page_id) = store_with_page().await;
    let caption = store
        .create_caption(NewCaption {
            page_id,
            contents: "cap".to_string(),
        })
        .await
        .unwrap();
    let chunk = store
        .create_chunk(NewChunk {
            parent_caption: Some(caption.id),
            contents: "text".to_string(),
        })
        .await
        .unwrap();
    store
        .link_caption_chunk(CaptionChunkRelation {
            caption_id: caption.id,
            chunk_id: chunk.id,
        })
        .await
        .unwrap();
    store
        .create_image_chunk(NewImageChunk {
            parent_page: Some(page_id),
            contents: vec![1, 2, 3],
            mimetype: "image/png".to_string(),
        })
        .await
        .unwrap();

    let deletion = store.delete_document_tree(document_id).await.unwrap().unwrap();
    assert_eq!(deletion.pages_removed, 1);
    assert_eq!(deletion.captions_removed, 1);
    assert_eq!(deletion.chunks_removed, 1);
    assert_eq!(deletion.image_chunks_removed, 1);
    assert!(deletion.file.is_some());

    assert_eq!(store.count_documents().await.unwrap(), 0);
    assert_eq!(store.count_files().await.unwrap(), 0);
    assert_eq!(store.count_chunks().await.unwrap(), 0);
    assert!(store.delete_document_tree(document_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_document_tree_blocked_by_annotation_keeps_everything() {
    let (store, document_id, page_id) = store_with_page().await;
    let image_chunk = store
        .create_image_chunk(NewImageChunk {
            parent_page: Some(page_id),
            contents: vec![0],
            mimetype: "image/png".to_string(),
        })
        .await
        .unwrap();
    let gt = RetrievalGroundTruth::single(ChunkRef::Image(image_chunk.id));
    store
        .create_query_with_ground_truth(NewQuery::new("q"), &gt)
        .await
        .unwrap();

    let err = store.delete_document_tree(document_id).await.unwrap_err();
    assert!(is_foreign_key(&err));
    assert_eq!(store.count_pages().await.unwrap(), 1);
    assert_eq!(store.count_image_chunks().await.unwrap(), 1);
}

#[tokio::test]
async fn test_query_with_ground_truth_is_atomic() {
    let store = InMemoryStore::new();
    let gt = RetrievalGroundTruth::or_all(vec![ChunkRef::Text(1), ChunkRef::Text(2)]).unwrap();

    let err = store
        .create_query_with_ground_truth(NewQuery::new("orphan"), &gt)
        .await
        .unwrap_err();
    assert!(is_foreign_key(&err));
    assert_eq!(store.count_queries().await.unwrap(), 0);
}

#[tokio::test]
async fn test_failed_query_create_still_consumes_its_id() {
    let store = InMemoryStore::new();
    let first = store.create_query(NewQuery::new("first")).await.unwrap();
    let gt = RetrievalGroundTruth::or_all(vec![ChunkRef::Image(42)]).unwrap();

    assert!(
        store
            .create_query_with_ground_truth(NewQuery::new("orphan"), &gt)
            .await
            .is_err()
    );

    let next = store.create_query(NewQuery::new("next")).await.unwrap();
    assert_eq!(first.id, 1);
    assert_eq!(next.id, 3);
    assert_eq!(store.count_queries().await.unwrap(), 2);
}

#[tokio::test]
async fn test_two_groups_roundtrip_through_store() {
    let store = InMemoryStore::new();
    let chunk = store
        .create_chunk(NewChunk {
            parent_caption: None,
            contents: "a".to_string(),
        })
        .await
        .unwrap();
    let image = store
        .create_image_chunk(NewImageChunk {
            parent_page: None,
            contents: vec![9],
            mimetype: "image/jpeg".to_string(),
        })
        .await
        .unwrap();

    let gt = RetrievalGroundTruth::new(vec![
        vec![ChunkRef::Text(chunk.id)],
        vec![ChunkRef::Image(image.id)],
    ])
    .unwrap();
    let (query, relations) = store
        .create_query_with_ground_truth(NewQuery::new("q"), &gt)
        .await
        .unwrap();
    assert_eq!(relations.len(), 2);

    let loaded = store.ground_truth(query.id).await.unwrap();
    assert_eq!(loaded, gt);
    assert!(loaded.is_satisfied_by(&[ChunkRef::Image(image.id)]));
    assert!(loaded.is_satisfied_by(&[ChunkRef::Text(chunk.id)]));
}

#[tokio::test]
async fn test_delete_query_with_relations() {
    let store = InMemoryStore::new();
    let chunk = store
        .create_chunk(NewChunk {
            parent_caption: None,
            contents: "a".to_string(),
        })
        .await
        .unwrap();
    let (query, _) = store
        .create_query_with_ground_truth(
            NewQuery::new("q"),
            &RetrievalGroundTruth::single(ChunkRef::Text(chunk.id)),
        )
        .await
        .unwrap();

    assert!(is_foreign_key(&store.delete_query(query.id).await.unwrap_err()));
    assert_eq!(store.delete_query_with_relations(query.id).await.unwrap(), Some(1));
    assert_eq!(store.delete_query_with_relations(query.id).await.unwrap(), None);
    // the chunk is free again
    assert!(store.find_chunk(chunk.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_list_queries_newest_first() {
    let store = InMemoryStore::new();
    for text in ["first", "second", "third"] {
        store.create_query(NewQuery::new(text)).await.unwrap();
    }

    let page = store.list_queries(1, 5).await.unwrap();
    let contents: Vec<&str> = page.iter().map(|q| q.contents.as_str()).collect();
    assert_eq!(contents, vec!["second", "first"]);
}

#[tokio::test]
async fn test_seed_twice_is_idempotent() {
    let store = InMemoryStore::new();
    let seed = SeedData::bundled().unwrap();

    let first = store.load_seed(&seed).await.unwrap();
    assert_eq!(first.total_inserted(), seed.row_count());
    assert_eq!(first.total_skipped(), 0);

    let snapshot = store.lock().await.clone();

    let second = store.load_seed(&seed).await.unwrap();
    assert_eq!(second.total_inserted(), 0);
    assert_eq!(second.total_skipped(), seed.row_count());
    assert_eq!(store.count_files().await.unwrap(), 10);
    assert_eq!(*store.lock().await, snapshot);
}

#[tokio::test]
async fn test_seed_vectors_must_match_store_dimension() {
    let store = InMemoryStore::new();
    let seed = SeedData::from_json(
        r#"{
            "chunks": [{"id": 1, "contents": "short vector", "embedding": [1.0, 0.0]}]
        }"#,
    )
    .unwrap();

    let err = store.load_seed(&seed).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));
    assert!(store.find_chunk(1).await.unwrap().is_none());

    let small = InMemoryStore::with_dimension(2);
    assert_eq!(small.load_seed(&seed).await.unwrap().inserted("chunk"), 1);
}

#[tokio::test]
async fn test_ids_continue_after_seed() {
    let store = InMemoryStore::new();
    let seed = SeedData::bundled().unwrap();
    store.load_seed(&seed).await.unwrap();

    let states = store.advance_sequences().await.unwrap();
    let file_state = states.iter().find(|s| s.table == "file").unwrap();
    assert_eq!(file_state.last_value, 10);

    let file = store.create_file(NewFile::raw("/data/pdfs/new.pdf")).await.unwrap();
    assert!(file.id >= 11);

    // advancing again is harmless
    store.advance_sequences().await.unwrap();
    let next = store.create_file(NewFile::image("/data/img.png")).await.unwrap();
    assert!(next.id > file.id);
}

#[tokio::test]
async fn test_seeded_ground_truth_shapes() {
    let store = InMemoryStore::new();
    store.load_seed(&SeedData::bundled().unwrap()).await.unwrap();

    let q4 = store.ground_truth(4).await.unwrap();
    assert_eq!(q4.groups().len(), 2);
    assert!(q4.is_satisfied_by(&[ChunkRef::Text(7), ChunkRef::Image(8)]));
    assert!(!q4.is_satisfied_by(&[ChunkRef::Text(7), ChunkRef::Text(8)]));
}

#[tokio::test]
async fn test_ingestion_writes_pages_in_order() {
    let store = InMemoryStore::new();
    let batch = IngestionBatch {
        file: NewFile::raw("/data/pdfs/x_doc.pdf"),
        document: NewDocument {
            filename: Some("doc.pdf".to_string()),
            title: Some("doc".to_string()),
            ..Default::default()
        },
        pages: vec![
            PageUpload {
                image_contents: vec![1],
                mimetype: "image/png".to_string(),
            },
            PageUpload {
                image_contents: vec![2],
                mimetype: "image/png".to_string(),
            },
        ],
    };

    let ingested = store.save_ingestion(batch).await.unwrap();
    assert_eq!(ingested.document.path, Some(ingested.file.id));
    let nums: Vec<i32> = ingested.pages.iter().map(|(p, _)| p.page_num).collect();
    assert_eq!(nums, vec![1, 2]);
    assert_eq!(ingested.pages[1].1.parent_page, Some(ingested.pages[1].0.id));
    assert_eq!(
        store.find_page_by_number(ingested.document.id, 2).await.unwrap().map(|p| p.id),
        Some(ingested.pages[1].0.id)
    );
}

#[tokio::test]
async fn test_dense_and_multi_vector_search() {
    let store = InMemoryStore::with_dimension(2);
    let mut ids = Vec::new();
    for contents in ["east", "north", "plain"] {
        ids.push(
            store
                .create_chunk(NewChunk {
                    parent_caption: None,
                    contents: contents.to_string(),
                })
                .await
                .unwrap()
                .id,
        );
    }
    let east = Embedding::new(vec![1.0, 0.0]).unwrap();
    let north = Embedding::new(vec![0.0, 1.0]).unwrap();
    store
        .update_chunk_embeddings(
            ids[0],
            EmbeddingUpdate {
                embedding: Some(east.clone()),
                embeddings: Some(MultiVector::new(vec![east.clone()]).unwrap()),
            },
        )
        .await
        .unwrap();
    store
        .update_chunk_embeddings(
            ids[1],
            EmbeddingUpdate {
                embedding: Some(north.clone()),
                embeddings: None,
            },
        )
        .await
        .unwrap();

    let dense = store
        .search_chunks(&SimilarityQuery::Dense(east.clone()), 10)
        .await
        .unwrap();
    assert_eq!(dense.len(), 2);
    assert_eq!(dense[0].target, ChunkRef::Text(ids[0]));

    let multi = store
        .search_chunks(
            &SimilarityQuery::MultiVector(MultiVector::new(vec![east, north]).unwrap()),
            10,
        )
        .await
        .unwrap();
    assert_eq!(multi.len(), 1);

    let wrong = SimilarityQuery::Dense(Embedding::new(vec![1.0, 0.0, 0.0]).unwrap());
    assert!(matches!(
        store.search_chunks(&wrong, 1).await,
        Err(RepositoryError::Validation(_))
    ));
}

#[tokio::test]
async fn test_update_embeddings_rejects_unknown_or_wrong_dimension() {
    let store = InMemoryStore::with_dimension(2);
    let update = EmbeddingUpdate {
        embedding: Some(Embedding::new(vec![1.0, 0.0]).unwrap()),
        embeddings: None,
    };
    assert!(matches!(
        store.update_image_chunk_embeddings(5, update).await,
        Err(RepositoryError::NotFound { .. })
    ));

    let query = store.create_query(NewQuery::new("q")).await.unwrap();
    let bad = EmbeddingUpdate {
        embedding: Some(Embedding::new(vec![1.0]).unwrap()),
        embeddings: None,
    };
    assert!(matches!(
        store.update_query_embeddings(query.id, bad).await,
        Err(RepositoryError::Validation(_))
    ));
}

#[tokio::test]
async fn test_retrieved_results_route_by_kind_and_sort() {
    let store = InMemoryStore::new();
    store.load_seed(&SeedData::bundled().unwrap()).await.unwrap();

    let results = store.find_retrieved_results(1, 2).await.unwrap();
    let targets: Vec<ChunkRef> = results.iter().map(|r| r.target).collect();
    assert_eq!(targets, vec![ChunkRef::Image(1), ChunkRef::Text(1)]);

    let batch = vec![
        RetrievedResult {
            query_id: 2,
            pipeline_id: 1,
            target: ChunkRef::Image(3),
            rel_score: None,
        },
        RetrievedResult {
            query_id: 2,
            pipeline_id: 1,
            target: ChunkRef::Text(999),
            rel_score: Some(0.5),
        },
    ];
    assert!(is_foreign_key(&store.save_retrieved_results(&batch).await.unwrap_err()));
    assert!(store.find_retrieved_results(2, 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pipeline_and_metric_round_trip() {
    let store = InMemoryStore::new();
    let pipeline = store
        .create_pipeline(NewPipeline {
            name: "dense".to_string(),
            config: serde_json::json!({"top_k": 5}),
        })
        .await
        .unwrap();
    let metric = store
        .create_metric(NewMetric {
            name: "recall".to_string(),
            metric_type: MetricType::Retrieval,
        })
        .await
        .unwrap();

    assert_eq!(store.find_pipeline(pipeline.id).await.unwrap(), Some(pipeline));
    assert_eq!(store.list_metrics().await.unwrap(), vec![metric]);
}
