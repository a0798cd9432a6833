use async_trait::async_trait;
use qacache_common::{QaCacheError, Result};
use redis::aio::Connection;
use redis::{Cmd, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::codec::embedding_to_bytes;
use crate::store::VectorStore;
use crate::types::{IndexSchema, QaRecord, SearchHit, TEXT_FIELD, VECTOR_FIELD};

/// Query dialect required for KNN with parameters
const SEARCH_DIALECT: u32 = 2;

/// Query parameter bound to the packed query vector
const VECTOR_PARAM: &str = "vec";

/// RediSearch-backed vector store over a single connection
pub struct RedisVectorStore {
    conn: Mutex<Connection>,
}

impl RedisVectorStore {
    /// Connect to Redis; the connection is held for the store's lifetime
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| QaCacheError::config(format!("Invalid Redis URL {}: {}", url, e)))?;
        let conn = client
            .get_async_connection()
            .await
            .map_err(|e| QaCacheError::network(format!("Failed to connect to Redis at {}: {}", url, e)))?;

        info!("Redis vector store connected: {}", url);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    async fn query(&self, cmd: &Cmd) -> Result<Value> {
        let mut conn = self.conn.lock().await;
        cmd.query_async(&mut *conn)
            .await
            .map_err(|e| QaCacheError::vector_store(e.to_string()))
    }
}

#[async_trait]
impl VectorStore for RedisVectorStore {
    async fn drop_index(&self, name: &str, delete_documents: bool) -> Result<()> {
        self.query(&drop_index_cmd(name, delete_documents)).await?;
        info!("Dropped index {} (delete_documents={})", name, delete_documents);
        Ok(())
    }

    async fn create_index(&self, schema: &IndexSchema) -> Result<()> {
        self.query(&create_index_cmd(schema)).await?;
        info!(
            "Created index {} - FLAT FLOAT32 dim={} metric={}",
            schema.name, schema.dim, schema.metric
        );
        Ok(())
    }

    async fn upsert(&self, record: &QaRecord) -> Result<()> {
        self.query(&upsert_cmd(record)).await?;
        debug!("HSET {} ({} dims)", record.key, record.embedding.len());
        Ok(())
    }

    async fn knn_search(&self, index: &str, embedding: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let reply = self.query(&knn_search_cmd(index, embedding, k)).await?;
        parse_search_reply(&reply)
    }

    async fn fetch_answer(&self, key: &str) -> Result<Option<String>> {
        let mut cmd = redis::cmd("HGET");
        cmd.arg(key).arg(TEXT_FIELD);

        match self.query(&cmd).await? {
            Value::Nil => Ok(None),
            value => redis::from_redis_value(&value)
                .map(Some)
                .map_err(|e| QaCacheError::vector_store(format!("Bad HGET reply for {}: {}", key, e))),
        }
    }
}

/// Name of the pseudo-field RediSearch fills with the KNN distance
pub fn score_field() -> String {
    format!("__{}_score", VECTOR_FIELD)
}

/// `*=>[KNN k @embedding $vec]`
pub fn knn_query(k: usize) -> String {
    format!("*=>[KNN {} @{} ${}]", k, VECTOR_FIELD, VECTOR_PARAM)
}

/// `FT.DROPINDEX <name> [DD]`
pub fn drop_index_cmd(name: &str, delete_documents: bool) -> Cmd {
    let mut cmd = redis::cmd("FT.DROPINDEX");
    cmd.arg(name);
    if delete_documents {
        cmd.arg("DD");
    }
    cmd
}

/// `FT.CREATE <name> SCHEMA embedding VECTOR FLAT 6 ... value TEXT`
pub fn create_index_cmd(schema: &IndexSchema) -> Cmd {
    let mut cmd = redis::cmd("FT.CREATE");
    cmd.arg(&schema.name)
        .arg("SCHEMA")
        .arg(VECTOR_FIELD)
        .arg("VECTOR")
        .arg("FLAT")
        .arg(6)
        .arg("TYPE")
        .arg("FLOAT32")
        .arg("DIM")
        .arg(schema.dim)
        .arg("DISTANCE_METRIC")
        .arg(schema.metric.as_str())
        .arg(TEXT_FIELD)
        .arg("TEXT");
    cmd
}

/// `HSET <key> embedding <blob> value <answer>`
pub fn upsert_cmd(record: &QaRecord) -> Cmd {
    let mut cmd = redis::cmd("HSET");
    cmd.arg(&record.key)
        .arg(VECTOR_FIELD)
        .arg(embedding_to_bytes(&record.embedding))
        .arg(TEXT_FIELD)
        .arg(&record.answer);
    cmd
}

/// `FT.SEARCH` KNN query returning the answer text and distance
pub fn knn_search_cmd(index: &str, embedding: &[f32], k: usize) -> Cmd {
    let score = score_field();
    let mut cmd = redis::cmd("FT.SEARCH");
    cmd.arg(index)
        .arg(knn_query(k))
        .arg("PARAMS")
        .arg(2)
        .arg(VECTOR_PARAM)
        .arg(embedding_to_bytes(embedding))
        .arg("SORTBY")
        .arg(&score)
        .arg("RETURN")
        .arg(2)
        .arg(TEXT_FIELD)
        .arg(&score)
        .arg("LIMIT")
        .arg(0)
        .arg(k)
        .arg("DIALECT")
        .arg(SEARCH_DIALECT);
    cmd
}

/// Decode an `FT.SEARCH` reply: `[total, key1, [field, value, ...], key2, ...]`
///
/// Documents without the answer field are skipped.
pub fn parse_search_reply(reply: &Value) -> Result<Vec<SearchHit>> {
    let items = match reply {
        Value::Bulk(items) => items,
        other => {
            return Err(QaCacheError::vector_store(format!(
                "Unexpected FT.SEARCH reply: {:?}",
                other
            )))
        }
    };

    let Some((total, docs)) = items.split_first() else {
        return Ok(Vec::new());
    };
    debug!("FT.SEARCH total={:?}, returned={}", total, docs.len() / 2);

    let score_name = score_field();
    let mut hits = Vec::new();

    for doc in docs.chunks(2) {
        let key: String = redis::from_redis_value(&doc[0])
            .map_err(|e| QaCacheError::vector_store(format!("Bad document key in reply: {}", e)))?;

        let fields = match doc.get(1) {
            Some(Value::Bulk(fields)) => fields.as_slice(),
            _ => &[],
        };

        let mut answer = None;
        let mut score = None;
        for pair in fields.chunks(2) {
            let [name, value] = pair else { continue };
            let name: String = redis::from_redis_value(name)
                .map_err(|e| QaCacheError::vector_store(format!("Bad field name in reply: {}", e)))?;

            if name == TEXT_FIELD {
                answer = Some(redis::from_redis_value::<String>(value).map_err(|e| {
                    QaCacheError::vector_store(format!("Answer of {} is not UTF-8 text: {}", key, e))
                })?);
            } else if name == score_name {
                score = redis::from_redis_value::<String>(value)
                    .ok()
                    .and_then(|s| s.parse::<f32>().ok());
            }
        }

        match answer {
            Some(answer) => hits.push(SearchHit { key, answer, score }),
            None => debug!("Skipping {}: no {} field returned", key, TEXT_FIELD),
        }
    }

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qacache_common::DistanceMetric;

    fn packed(cmd: &Cmd) -> String {
        String::from_utf8_lossy(&cmd.get_packed_command()).into_owned()
    }

    fn data(s: &str) -> Value {
        Value::Data(s.as_bytes().to_vec())
    }

    #[test]
    fn test_knn_query() {
        assert_eq!(knn_query(1), "*=>[KNN 1 @embedding $vec]");
        assert_eq!(score_field(), "__embedding_score");
    }

    #[test]
    fn test_create_index_cmd() {
        let schema = IndexSchema::new("qa_index", 768, DistanceMetric::Cosine);
        let wire = packed(&create_index_cmd(&schema));

        for token in [
            "FT.CREATE", "qa_index", "SCHEMA", "embedding", "VECTOR", "FLAT", "FLOAT32",
            "768", "DISTANCE_METRIC", "COSINE", "value", "TEXT",
        ] {
            assert!(wire.contains(&format!("\r\n{}\r\n", token)), "missing {}", token);
        }
    }

    #[test]
    fn test_drop_index_cmd() {
        assert!(packed(&drop_index_cmd("qa_index", true)).ends_with("\r\nDD\r\n"));
        assert!(!packed(&drop_index_cmd("qa_index", false)).contains("DD"));
    }

    #[test]
    fn test_upsert_cmd_sends_vector_as_single_blob() {
        let record = QaRecord {
            key: "doc:0".to_string(),
            embedding: vec![1.0, -2.0],
            answer: "대한민국의 수도는 서울입니다.".to_string(),
        };
        let bytes = upsert_cmd(&record).get_packed_command();

        // HSET key field blob field answer
        assert!(bytes.starts_with(b"*6\r\n$4\r\nHSET\r\n$5\r\ndoc:0\r\n"));
        let blob: &[u8] = &[0x00, 0x00, 0x80, 0x3f, 0x00, 0x00, 0x00, 0xc0];
        assert!(bytes.windows(blob.len()).any(|w| w == blob));
        assert!(packed(&upsert_cmd(&record)).contains("대한민국의 수도는 서울입니다."));
    }

    #[test]
    fn test_knn_search_cmd() {
        let wire = packed(&knn_search_cmd("qa_index", &[0.5], 1));
        assert!(wire.contains("*=>[KNN 1 @embedding $vec]"));
        assert!(wire.contains("\r\nPARAMS\r\n$1\r\n2\r\n$3\r\nvec\r\n"));
        assert!(wire.contains("\r\nSORTBY\r\n$17\r\n__embedding_score\r\n"));
        assert!(wire.contains(
            "\r\nRETURN\r\n$1\r\n2\r\n$5\r\nvalue\r\n$17\r\n__embedding_score\r\n"
        ));
        assert!(wire.contains("\r\nLIMIT\r\n$1\r\n0\r\n$1\r\n1\r\n"));
        assert!(wire.ends_with("\r\nDIALECT\r\n$1\r\n2\r\n"));
    }

    #[test]
    fn test_knn_search_cmd_sends_query_vector_as_single_blob() {
        let bytes = knn_search_cmd("qa_index", &[1.0, -2.0], 3).get_packed_command();

        // `vec` is followed by one 8-byte bulk string holding both floats
        let mut expected = b"$3\r\nvec\r\n$8\r\n".to_vec();
        expected.extend_from_slice(&[0x00, 0x00, 0x80, 0x3f, 0x00, 0x00, 0x00, 0xc0]);
        expected.extend_from_slice(b"\r\n$6\r\nSORTBY\r\n");
        assert!(bytes.windows(expected.len()).any(|w| w == expected.as_slice()));

        let wire = String::from_utf8_lossy(&bytes).into_owned();
        assert!(wire.contains("*=>[KNN 3 @embedding $vec]"));
        assert!(wire.contains("\r\nLIMIT\r\n$1\r\n0\r\n$1\r\n3\r\n"));
    }

    #[test]
    fn test_parse_search_reply_hit() {
        let reply = Value::Bulk(vec![
            Value::Int(1),
            data("doc:0"),
            Value::Bulk(vec![
                data("value"),
                data("대한민국의 수도는 서울입니다."),
                data("__embedding_score"),
                data("0.0421"),
            ]),
        ]);

        let hits = parse_search_reply(&reply).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "doc:0");
        assert_eq!(hits[0].answer, "대한민국의 수도는 서울입니다.");
        assert!((hits[0].score.unwrap() - 0.0421).abs() < 1e-6);
    }

    #[test]
    fn test_parse_search_reply_empty() {
        let reply = Value::Bulk(vec![Value::Int(0)]);
        assert!(parse_search_reply(&reply).unwrap().is_empty());
    }

    #[test]
    fn test_parse_search_reply_skips_docs_without_answer() {
        let reply = Value::Bulk(vec![
            Value::Int(1),
            data("doc:9"),
            Value::Bulk(vec![data("__embedding_score"), data("0.3")]),
        ]);
        assert!(parse_search_reply(&reply).unwrap().is_empty());
    }

    #[test]
    fn test_parse_search_reply_rejects_error_shape() {
        assert!(parse_search_reply(&Value::Status("OK".to_string())).is_err());
    }
}
