// Mirrors the DDL rendered by `schema_setup`. Vector columns are only selected
// when a vector extension is installed.

diesel::table! {
    use diesel::sql_types::*;

    #[sql_name = "file"]
    files (id) {
        id -> Int8,
        #[sql_name = "type"]
        file_type -> Varchar,
        path -> Varchar,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    #[sql_name = "document"]
    documents (id) {
        id -> Int8,
        path -> Nullable<Int8>,
        filename -> Nullable<Varchar>,
        author -> Nullable<Varchar>,
        title -> Nullable<Text>,
        metadata -> Nullable<Jsonb>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    #[sql_name = "page"]
    pages (id) {
        id -> Int8,
        page_num -> Int4,
        document_id -> Int8,
        image_contents -> Nullable<Bytea>,
        mimetype -> Nullable<Varchar>,
        metadata -> Nullable<Jsonb>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    #[sql_name = "caption"]
    captions (id) {
        id -> Int8,
        page_id -> Int8,
        contents -> Text,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use pgvector::sql_types::*;

    #[sql_name = "chunk"]
    chunks (id) {
        id -> Int8,
        parent_caption -> Nullable<Int8>,
        contents -> Text,
        embedding -> Nullable<Vector>,
        embeddings -> Nullable<Array<Vector>>,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use pgvector::sql_types::*;

    #[sql_name = "image_chunk"]
    image_chunks (id) {
        id -> Int8,
        parent_page -> Nullable<Int8>,
        contents -> Bytea,
        mimetype -> Varchar,
        embedding -> Nullable<Vector>,
        embeddings -> Nullable<Array<Vector>>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    #[sql_name = "caption_chunk_relation"]
    caption_chunk_relations (caption_id, chunk_id) {
        caption_id -> Int8,
        chunk_id -> Int8,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use pgvector::sql_types::*;

    #[sql_name = "query"]
    queries (id) {
        id -> Int8,
        contents -> Text,
        query_to_llm -> Nullable<Text>,
        generation_gt -> Nullable<Array<Text>>,
        embedding -> Nullable<Vector>,
        embeddings -> Nullable<Array<Vector>>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    #[sql_name = "retrieval_relation"]
    retrieval_relations (query_id, group_index, group_order) {
        query_id -> Int8,
        group_index -> Int4,
        group_order -> Int4,
        chunk_id -> Nullable<Int8>,
        image_chunk_id -> Nullable<Int8>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    #[sql_name = "pipeline"]
    pipelines (id) {
        id -> Int8,
        name -> Varchar,
        config -> Jsonb,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    #[sql_name = "metric"]
    metrics (id) {
        id -> Int8,
        name -> Varchar,
        #[sql_name = "type"]
        metric_type -> Varchar,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    #[sql_name = "executor_result"]
    executor_results (query_id, pipeline_id) {
        query_id -> Int8,
        pipeline_id -> Int8,
        generation_result -> Nullable<Text>,
        token_usage -> Nullable<Int8>,
        execution_time -> Nullable<Int8>,
        metadata -> Nullable<Jsonb>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    #[sql_name = "evaluation_result"]
    evaluation_results (query_id, pipeline_id, metric_id) {
        query_id -> Int8,
        pipeline_id -> Int8,
        metric_id -> Int8,
        metric_result -> Float8,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    #[sql_name = "chunk_retrieved_result"]
    chunk_retrieved_results (query_id, pipeline_id, chunk_id) {
        query_id -> Int8,
        pipeline_id -> Int8,
        chunk_id -> Int8,
        rel_score -> Nullable<Float8>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    #[sql_name = "image_chunk_retrieved_result"]
    image_chunk_retrieved_results (query_id, pipeline_id, image_chunk_id) {
        query_id -> Int8,
        pipeline_id -> Int8,
        image_chunk_id -> Int8,
        rel_score -> Nullable<Float8>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    #[sql_name = "summary"]
    summaries (pipeline_id, metric_id) {
        pipeline_id -> Int8,
        metric_id -> Int8,
        metric_result -> Float8,
        token_usage -> Nullable<Int8>,
        execution_time -> Nullable<Int8>,
        metadata -> Nullable<Jsonb>,
    }
}

diesel::joinable!(documents -> files (path));
diesel::joinable!(pages -> documents (document_id));
diesel::joinable!(captions -> pages (page_id));
diesel::joinable!(chunks -> captions (parent_caption));
diesel::joinable!(image_chunks -> pages (parent_page));
diesel::joinable!(caption_chunk_relations -> captions (caption_id));
diesel::joinable!(caption_chunk_relations -> chunks (chunk_id));
diesel::joinable!(retrieval_relations -> queries (query_id));
diesel::joinable!(retrieval_relations -> chunks (chunk_id));
diesel::joinable!(retrieval_relations -> image_chunks (image_chunk_id));
diesel::joinable!(executor_results -> queries (query_id));
diesel::joinable!(executor_results -> pipelines (pipeline_id));
diesel::joinable!(evaluation_results -> queries (query_id));
diesel::joinable!(evaluation_results -> pipelines (pipeline_id));
diesel::joinable!(evaluation_results -> metrics (metric_id));
diesel::joinable!(chunk_retrieved_results -> queries (query_id));
diesel::joinable!(chunk_retrieved_results -> pipelines (pipeline_id));
diesel::joinable!(chunk_retrieved_results -> chunks (chunk_id));
diesel::joinable!(image_chunk_retrieved_results -> queries (query_id));
diesel::joinable!(image_chunk_retrieved_results -> pipelines (pipeline_id));
diesel::joinable!(image_chunk_retrieved_results -> image_chunks (image_chunk_id));
diesel::joinable!(summaries -> pipelines (pipeline_id));
diesel::joinable!(summaries -> metrics (metric_id));

diesel::allow_tables_to_appear_in_same_query!(
    files,
    documents,
    pages,
    captions,
    chunks,
    image_chunks,
    caption_chunk_relations,
    queries,
    retrieval_relations,
    pipelines,
    metrics,
    executor_results,
    evaluation_results,
    chunk_retrieved_results,
    image_chunk_retrieved_results,
    summaries,
);
