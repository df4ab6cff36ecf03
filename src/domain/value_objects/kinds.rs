use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Raw,
    Image,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Raw => "raw",
            FileType::Image => "image",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(FileType::Raw),
            "image" => Ok(FileType::Image),
            _ => Err(format!("Invalid file type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Retrieval,
    Generation,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Retrieval => "retrieval",
            MetricType::Generation => "generation",
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "retrieval" => Ok(MetricType::Retrieval),
            "generation" => Ok(MetricType::Generation),
            _ => Err(format!("Invalid metric type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("RAW".parse::<FileType>(), Ok(FileType::Raw));
        assert_eq!("Generation".parse::<MetricType>(), Ok(MetricType::Generation));
        assert!("video".parse::<FileType>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&FileType::Image).unwrap(), "\"image\"");
        let parsed: MetricType = serde_json::from_str("\"retrieval\"").unwrap();
        assert_eq!(parsed, MetricType::Retrieval);
    }
}
