use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Embedding, MultiVector};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub id: i64,
    pub contents: String,
    /// Alternative phrasing sent to the generator instead of `contents`.
    pub query_to_llm: Option<String>,
    /// Accepted answers.
    pub generation_gt: Option<Vec<String>>,
    pub embedding: Option<Embedding>,
    pub embeddings: Option<MultiVector>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewQuery {
    pub contents: String,
    pub query_to_llm: Option<String>,
    pub generation_gt: Option<Vec<String>>,
}

impl NewQuery {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            ..Default::default()
        }
    }
}

impl Query {
    pub fn from_new(id: i64, new_query: NewQuery) -> Self {
        Self {
            id,
            contents: new_query.contents,
            query_to_llm: new_query.query_to_llm,
            generation_gt: new_query.generation_gt,
            embedding: None,
            embeddings: None,
        }
    }

    /// Text handed to the generator.
    pub fn prompt_text(&self) -> &str {
        self.query_to_llm.as_deref().unwrap_or(&self.contents)
    }

    pub fn accepts_answer(&self, answer: &str) -> bool {
        let answer = answer.trim();
        self.generation_gt
            .as_ref()
            .is_some_and(|answers| answers.iter().any(|a| a.trim() == answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_text_prefers_llm_phrasing() {
        let mut query = Query::from_new(1, NewQuery::new("q?"));
        assert_eq!(query.prompt_text(), "q?");

        query.query_to_llm = Some("rephrased q?".to_string());
        assert_eq!(query.prompt_text(), "rephrased q?");
    }

    #[test]
    fn test_accepts_answer() {
        let query = Query::from_new(
            1,
            NewQuery {
                contents: "capital of France?".to_string(),
                query_to_llm: None,
                generation_gt: Some(vec!["Paris".to_string(), "Paris, France".to_string()]),
            },
        );

        assert!(query.accepts_answer(" Paris "));
        assert!(!query.accepts_answer("Lyon"));
    }
}
