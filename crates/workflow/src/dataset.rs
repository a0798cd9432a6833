use qacache_common::{QaCacheError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Question asked when none is given on the command line
pub const DEFAULT_QUERY: &str = "한국의 수도는 어디입니까?";

/// Question/answer pair. Only the question's embedding is stored, not its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl QaPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Built-in capital-city pairs, in load order
pub fn sample_pairs() -> Vec<QaPair> {
    vec![
        QaPair::new("대한민국의 수도는 어디야?", "대한민국의 수도는 서울입니다."),
        QaPair::new("미국의 수도는 어디야?", "미국의 수도는 워싱턴 D.C.입니다."),
        QaPair::new("일본의 수도는 어디야?", "일본의 수도는 도쿄입니다."),
        QaPair::new("중국의 수도는 어디야?", "중국의 수도는 베이징입니다."),
        QaPair::new("프랑스의 수도는 어디야?", "프랑스의 수도는 파리입니다."),
    ]
}

/// Load pairs from a JSON array of `{"question": ..., "answer": ...}` objects
pub fn load_pairs(path: &Path) -> Result<Vec<QaPair>> {
    let data = std::fs::read_to_string(path).map_err(|e| {
        QaCacheError::invalid_input(format!("Failed to read dataset {}: {}", path.display(), e))
    })?;

    let pairs: Vec<QaPair> = serde_json::from_str(&data).map_err(|e| {
        QaCacheError::invalid_input(format!("Invalid dataset {}: {}", path.display(), e))
    })?;

    tracing::info!("Loaded {} Q&A pairs from {}", pairs.len(), path.display());
    Ok(pairs)
}

/// Dataset from `path` when given, otherwise the built-in sample
pub fn resolve_pairs(path: Option<&Path>) -> Result<Vec<QaPair>> {
    match path {
        Some(path) => load_pairs(path),
        None => Ok(sample_pairs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sample_pairs_order() {
        let pairs = sample_pairs();
        assert_eq!(pairs.len(), 5);
        assert_eq!(pairs[0].answer, "대한민국의 수도는 서울입니다.");
        assert_eq!(pairs[4].question, "프랑스의 수도는 어디야?");
    }

    #[test]
    fn test_load_pairs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"question":"영국의 수도는 어디야?","answer":"영국의 수도는 런던입니다."}}]"#
        )
        .unwrap();

        let pairs = load_pairs(file.path()).unwrap();
        assert_eq!(pairs, vec![QaPair::new("영국의 수도는 어디야?", "영국의 수도는 런던입니다.")]);
    }

    #[test]
    fn test_load_pairs_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"영국의 수도는 어디야?":"런던"}}"#).unwrap();

        let err = load_pairs(file.path()).unwrap_err();
        assert!(matches!(err, QaCacheError::InvalidInput(_)));
    }

    #[test]
    fn test_resolve_pairs_defaults_to_sample() {
        assert_eq!(resolve_pairs(None).unwrap(), sample_pairs());
        assert!(resolve_pairs(Some(Path::new("/nonexistent/qa.json"))).is_err());
    }
}
