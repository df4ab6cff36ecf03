//! Idempotent schema creation.
//!
//! The vector extension is chosen at startup: VectorChord first (it brings
//! pgvector along and adds the `@#` MaxSim operator), then plain pgvector.
//! Without either, embedding columns fall back to `real[]` and vector search is
//! reported as unavailable. Tables are only created when missing, so the
//! support reported to the repositories is read back from the column types
//! that actually exist.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;

use super::DatabaseError;
use super::errors::ONE_TARGET_CONSTRAINT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorSupport {
    VectorChord,
    PgVector,
    Unavailable,
}

impl VectorSupport {
    pub fn is_available(&self) -> bool {
        !matches!(self, VectorSupport::Unavailable)
    }

    /// Whether the database can rank multi-vector columns itself.
    pub fn has_max_sim(&self) -> bool {
        matches!(self, VectorSupport::VectorChord)
    }

    pub fn dense_column(&self, dimension: usize) -> String {
        if self.is_available() {
            format!("vector({})", dimension)
        } else {
            "real[]".to_string()
        }
    }

    pub fn multi_column(&self, dimension: usize) -> String {
        if self.is_available() {
            format!("vector({})[]", dimension)
        } else {
            "real[][]".to_string()
        }
    }
}

impl std::fmt::Display for VectorSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorSupport::VectorChord => write!(f, "vchord"),
            VectorSupport::PgVector => write!(f, "vector"),
            VectorSupport::Unavailable => write!(f, "none"),
        }
    }
}

const EXTENSIONS: [(&str, VectorSupport); 2] = [
    ("CREATE EXTENSION IF NOT EXISTS vchord CASCADE", VectorSupport::VectorChord),
    ("CREATE EXTENSION IF NOT EXISTS vector", VectorSupport::PgVector),
];

/// Tries each extension in order. Failures are logged and never fatal.
pub fn install_vector_extension(conn: &mut PgConnection) -> VectorSupport {
    for (statement, support) in EXTENSIONS {
        match conn.batch_execute(statement) {
            Ok(()) => {
                tracing::info!("Vector extension '{}' available", support);
                return support;
            }
            Err(e) => tracing::warn!("Could not enable vector extension '{}': {}", support, e),
        }
    }

    tracing::warn!(
        "No vector extension available; embedding columns use real[] and search is disabled"
    );
    VectorSupport::Unavailable
}

pub fn render_schema(support: VectorSupport, dimension: usize) -> String {
    let vector = support.dense_column(dimension);
    let vectors = support.multi_column(dimension);

    format!(
        r#"
CREATE TABLE IF NOT EXISTS file (
    id BIGSERIAL PRIMARY KEY,
    type VARCHAR(255) NOT NULL CHECK (type IN ('raw', 'image')),
    path VARCHAR(255) NOT NULL
);

CREATE TABLE IF NOT EXISTS document (
    id BIGSERIAL PRIMARY KEY,
    path BIGINT REFERENCES file (id),
    filename VARCHAR(255),
    author VARCHAR(255),
    title TEXT,
    metadata JSONB
);

CREATE TABLE IF NOT EXISTS page (
    id BIGSERIAL PRIMARY KEY,
    page_num INT NOT NULL,
    document_id BIGINT NOT NULL REFERENCES document (id),
    image_contents BYTEA,
    mimetype VARCHAR(255),
    metadata JSONB,
    UNIQUE (document_id, page_num)
);

CREATE TABLE IF NOT EXISTS caption (
    id BIGSERIAL PRIMARY KEY,
    page_id BIGINT NOT NULL REFERENCES page (id),
    contents TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunk (
    id BIGSERIAL PRIMARY KEY,
    parent_caption BIGINT REFERENCES caption (id),
    contents TEXT NOT NULL,
    embedding {vector},
    embeddings {vectors}
);

CREATE TABLE IF NOT EXISTS image_chunk (
    id BIGSERIAL PRIMARY KEY,
    parent_page BIGINT REFERENCES page (id),
    contents BYTEA NOT NULL,
    mimetype VARCHAR(255) NOT NULL,
    embedding {vector},
    embeddings {vectors}
);

CREATE TABLE IF NOT EXISTS caption_chunk_relation (
    caption_id BIGINT NOT NULL REFERENCES caption (id),
    chunk_id BIGINT NOT NULL REFERENCES chunk (id),
    PRIMARY KEY (caption_id, chunk_id)
);

CREATE TABLE IF NOT EXISTS query (
    id BIGSERIAL PRIMARY KEY,
    contents TEXT NOT NULL,
    query_to_llm TEXT,
    generation_gt TEXT[],
    embedding {vector},
    embeddings {vectors}
);

CREATE TABLE IF NOT EXISTS retrieval_relation (
    query_id BIGINT NOT NULL REFERENCES query (id),
    group_index INT NOT NULL,
    group_order INT NOT NULL,
    chunk_id BIGINT REFERENCES chunk (id),
    image_chunk_id BIGINT REFERENCES image_chunk (id),
    PRIMARY KEY (query_id, group_index, group_order),
    CONSTRAINT {one_target} CHECK ((chunk_id IS NULL) <> (image_chunk_id IS NULL))
);

CREATE TABLE IF NOT EXISTS pipeline (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    config JSONB NOT NULL
);

CREATE TABLE IF NOT EXISTS metric (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    type VARCHAR(255) NOT NULL CHECK (type IN ('retrieval', 'generation'))
);

CREATE TABLE IF NOT EXISTS executor_result (
    query_id BIGINT NOT NULL REFERENCES query (id),
    pipeline_id BIGINT NOT NULL REFERENCES pipeline (id),
    generation_result TEXT,
    token_usage BIGINT,
    execution_time BIGINT,
    metadata JSONB,
    PRIMARY KEY (query_id, pipeline_id)
);

CREATE TABLE IF NOT EXISTS evaluation_result (
    query_id BIGINT NOT NULL REFERENCES query (id),
    pipeline_id BIGINT NOT NULL REFERENCES pipeline (id),
    metric_id BIGINT NOT NULL REFERENCES metric (id),
    metric_result DOUBLE PRECISION NOT NULL,
    PRIMARY KEY (query_id, pipeline_id, metric_id)
);

CREATE TABLE IF NOT EXISTS chunk_retrieved_result (
    query_id BIGINT NOT NULL REFERENCES query (id),
    pipeline_id BIGINT NOT NULL REFERENCES pipeline (id),
    chunk_id BIGINT NOT NULL REFERENCES chunk (id),
    rel_score DOUBLE PRECISION,
    PRIMARY KEY (query_id, pipeline_id, chunk_id)
);

CREATE TABLE IF NOT EXISTS image_chunk_retrieved_result (
    query_id BIGINT NOT NULL REFERENCES query (id),
    pipeline_id BIGINT NOT NULL REFERENCES pipeline (id),
    image_chunk_id BIGINT NOT NULL REFERENCES image_chunk (id),
    rel_score DOUBLE PRECISION,
    PRIMARY KEY (query_id, pipeline_id, image_chunk_id)
);

CREATE TABLE IF NOT EXISTS summary (
    pipeline_id BIGINT NOT NULL REFERENCES pipeline (id),
    metric_id BIGINT NOT NULL REFERENCES metric (id),
    metric_result DOUBLE PRECISION NOT NULL,
    token_usage BIGINT,
    execution_time BIGINT,
    metadata JSONB,
    PRIMARY KEY (pipeline_id, metric_id)
);
"#,
        vector = vector,
        vectors = vectors,
        one_target = ONE_TARGET_CONSTRAINT,
    )
}

const EMBEDDING_COLUMNS_SQL: &str = "\
    SELECT c.relname::text AS table_name, \
           a.attname::text AS column_name, \
           format_type(a.atttypid, a.atttypmod) AS column_type \
    FROM pg_attribute a \
    JOIN pg_class c ON c.oid = a.attrelid \
    WHERE c.relname IN ('chunk', 'image_chunk', 'query') \
      AND a.attname IN ('embedding', 'embeddings') \
      AND a.attnum > 0 \
      AND NOT a.attisdropped \
      AND pg_table_is_visible(c.oid) \
    ORDER BY 1, 2";

const EXTENSIONS_SQL: &str =
    "SELECT extname::text AS extname FROM pg_extension WHERE extname IN ('vchord', 'vector')";

#[derive(Debug, Clone, PartialEq, Eq, QueryableByName)]
pub struct EmbeddingColumn {
    #[diesel(sql_type = Text)]
    pub table_name: String,
    #[diesel(sql_type = Text)]
    pub column_name: String,
    /// As rendered by `format_type`, e.g. `vector(768)[]` or `real[]`.
    #[diesel(sql_type = Text)]
    pub column_type: String,
}

#[derive(QueryableByName)]
struct ExtensionRow {
    #[diesel(sql_type = Text)]
    extname: String,
}

/// Derives vector support from the installed extensions and the embedding
/// column types. Columns must all be `real[]` or all be vectors of `dimension`.
pub fn resolve_vector_support(
    extensions: &[String],
    columns: &[EmbeddingColumn],
    dimension: usize,
) -> Result<VectorSupport, DatabaseError> {
    if columns.is_empty() {
        return Err(DatabaseError::SchemaError("embedding columns not found".to_string()));
    }

    let dense = VectorSupport::PgVector.dense_column(dimension);
    let multi = VectorSupport::PgVector.multi_column(dimension);

    let mut vector_columns = 0;
    for column in columns {
        let expected = if column.column_name == "embeddings" {
            &multi
        } else {
            &dense
        };
        if column.column_type == *expected {
            vector_columns += 1;
        } else if !column.column_type.starts_with("real") {
            return Err(DatabaseError::SchemaError(format!(
                "{}.{} is {}, expected {}",
                column.table_name, column.column_name, column.column_type, expected
            )));
        }
    }

    if vector_columns == 0 {
        if !extensions.is_empty() {
            tracing::warn!(
                "Embedding columns were created as real[] before a vector extension was installed; \
                 search stays disabled until they are migrated"
            );
        }
        return Ok(VectorSupport::Unavailable);
    }
    if vector_columns != columns.len() {
        return Err(DatabaseError::SchemaError(
            "embedding columns mix vector and real[] types".to_string(),
        ));
    }

    if extensions.iter().any(|name| name == "vchord") {
        Ok(VectorSupport::VectorChord)
    } else {
        Ok(VectorSupport::PgVector)
    }
}

/// Reads back which vector support the existing tables allow.
pub fn detect_vector_support(
    conn: &mut PgConnection,
    dimension: usize,
) -> Result<VectorSupport, DatabaseError> {
    let extensions: Vec<String> = diesel::sql_query(EXTENSIONS_SQL)
        .load::<ExtensionRow>(conn)
        .map_err(|e| DatabaseError::SchemaError(e.to_string()))?
        .into_iter()
        .map(|row| row.extname)
        .collect();
    let columns = diesel::sql_query(EMBEDDING_COLUMNS_SQL)
        .load::<EmbeddingColumn>(conn)
        .map_err(|e| DatabaseError::SchemaError(e.to_string()))?;

    resolve_vector_support(&extensions, &columns, dimension)
}

/// Enables a vector extension if possible, then creates any missing tables.
pub fn setup_schema(
    conn: &mut PgConnection,
    dimension: usize,
) -> Result<VectorSupport, DatabaseError> {
    let installed = install_vector_extension(conn);

    conn.batch_execute(&render_schema(installed, dimension))
        .map_err(|e| DatabaseError::SchemaError(e.to_string()))?;

    let support = detect_vector_support(conn, dimension)?;
    if support != installed {
        tracing::warn!(
            "Existing embedding columns imply vector support '{}' (extension setup gave '{}')",
            support,
            installed
        );
    }

    tracing::info!("Schema ready (vector support: {}, dimension: {})", support, dimension);
    Ok(support)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_columns_follow_extension() {
        let ddl = render_schema(VectorSupport::PgVector, 768);
        assert!(ddl.contains("embedding vector(768),"));
        assert!(ddl.contains("embeddings vector(768)[]"));

        let fallback = render_schema(VectorSupport::Unavailable, 768);
        assert!(fallback.contains("embedding real[],"));
        assert!(fallback.contains("embeddings real[][]"));
        assert!(!fallback.contains("vector("));
    }

    #[test]
    fn test_schema_is_idempotent_and_constrained() {
        let ddl = render_schema(VectorSupport::VectorChord, 128);

        assert_eq!(ddl.matches("CREATE TABLE IF NOT EXISTS").count(), 16);
        assert_eq!(ddl.matches("CREATE TABLE").count(), 16);
        assert!(ddl.contains("CHECK ((chunk_id IS NULL) <> (image_chunk_id IS NULL))"));
        assert!(ddl.contains("UNIQUE (document_id, page_num)"));
        assert!(!ddl.contains("ON DELETE CASCADE"));
    }

    fn columns(dense: &str, multi: &str) -> Vec<EmbeddingColumn> {
        ["chunk", "image_chunk", "query"]
            .iter()
            .flat_map(|table| {
                [("embedding", dense), ("embeddings", multi)].map(|(column, column_type)| {
                    EmbeddingColumn {
                        table_name: table.to_string(),
                        column_name: column.to_string(),
                        column_type: column_type.to_string(),
                    }
                })
            })
            .collect()
    }

    #[test]
    fn test_support_read_from_existing_columns() {
        let vector = vec!["vector".to_string()];
        let chord = vec!["vchord".to_string(), "vector".to_string()];
        let real = columns("real[]", "real[]");
        let typed = columns("vector(768)", "vector(768)[]");

        // Tables created before the extension keep their real[] columns.
        assert_eq!(
            resolve_vector_support(&vector, &real, 768).unwrap(),
            VectorSupport::Unavailable
        );
        // Extension present from an earlier run even if CREATE EXTENSION failed now.
        assert_eq!(
            resolve_vector_support(&chord, &typed, 768).unwrap(),
            VectorSupport::VectorChord
        );
        assert_eq!(
            resolve_vector_support(&vector, &typed, 768).unwrap(),
            VectorSupport::PgVector
        );
        assert_eq!(
            resolve_vector_support(&[], &real, 768).unwrap(),
            VectorSupport::Unavailable
        );
    }

    #[test]
    fn test_support_rejects_dimension_and_mixed_columns() {
        let vector = vec!["vector".to_string()];

        let wrong_dimension = columns("vector(128)", "vector(128)[]");
        assert!(matches!(
            resolve_vector_support(&vector, &wrong_dimension, 768),
            Err(DatabaseError::SchemaError(message)) if message.contains("vector(768)")
        ));

        let mut mixed = columns("vector(768)", "vector(768)[]");
        mixed[0].column_type = "real[]".to_string();
        assert!(resolve_vector_support(&vector, &mixed, 768).is_err());

        assert!(resolve_vector_support(&vector, &[], 768).is_err());
    }

    #[test]
    fn test_support_capabilities() {
        assert!(VectorSupport::VectorChord.has_max_sim());
        assert!(!VectorSupport::PgVector.has_max_sim());
        assert!(!VectorSupport::Unavailable.is_available());
    }
}
