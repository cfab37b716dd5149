//! SQL-over-HTTP connector for a Pinot-style broker.
//!
//! Request:  POST <endpoint>  {"sql": "..."}
//! Response: {
//!   "resultTable": {
//!     "dataSchema": { "columnNames": [...], "columnDataTypes": [...] },
//!     "rows": [[...], ...]
//!   },
//!   "exceptions": [{ "errorCode": 150, "message": "..." }]
//! }
//!
//! A non-empty `exceptions` array means the broker rejected the query even
//! though the HTTP status was 200.

use crate::error::QueryError;
use crate::query::row::{QueryResult, Row};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Anything that can run a parameterless SQL string and hand back rows.
pub trait QueryService {
    fn execute(&self, sql: &str) -> impl Future<Output = Result<QueryResult, QueryError>> + Send;
}

/// Stateless client for a fixed broker endpoint. No retries.
#[derive(Debug, Clone)]
pub struct PinotConnector {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct SqlRequest<'a> {
    sql: &'a str,
}

#[derive(Debug, Deserialize)]
struct BrokerResponse {
    #[serde(rename = "resultTable", default)]
    result_table: Option<ResultTable>,
    #[serde(default)]
    exceptions: Vec<BrokerException>,
}

#[derive(Debug, Deserialize)]
struct ResultTable {
    #[serde(rename = "dataSchema")]
    data_schema: DataSchema,
    #[serde(default)]
    rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct DataSchema {
    #[serde(rename = "columnNames", default)]
    column_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BrokerException {
    #[serde(rename = "errorCode", default)]
    error_code: i64,
    #[serde(default)]
    message: String,
}

impl PinotConnector {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(QueryError::Client)?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, err: reqwest::Error) -> QueryError {
        if err.is_timeout() {
            QueryError::Timeout(self.timeout)
        } else {
            QueryError::Connect {
                endpoint: self.endpoint.clone(),
                source: err,
            }
        }
    }
}

impl QueryService for PinotConnector {
    async fn execute(&self, sql: &str) -> Result<QueryResult, QueryError> {
        let started = Instant::now();
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&SqlRequest { sql })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(QueryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result = decode_response(&body)?;
        debug!(
            rows = result.rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query complete"
        );
        Ok(result)
    }
}

/// Decode a broker response body into columns + rows.
pub fn decode_response(body: &str) -> Result<QueryResult, QueryError> {
    let resp: BrokerResponse = serde_json::from_str(body).map_err(QueryError::Decode)?;

    if !resp.exceptions.is_empty() {
        let msg = resp
            .exceptions
            .iter()
            .map(|e| format!("[{}] {}", e.error_code, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(QueryError::Rejected(msg));
    }

    Ok(match resp.result_table {
        Some(table) => QueryResult {
            columns: table.data_schema.column_names,
            rows: table.rows,
        },
        None => QueryResult::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Scalar;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_result_table() {
        let body = r#"{
            "resultTable": {
                "dataSchema": {
                    "columnNames": ["COUNTRY", "totalSales"],
                    "columnDataTypes": ["STRING", "DOUBLE"]
                },
                "rows": [["Thailand", 150.0], ["Japan", 30]]
            },
            "exceptions": [],
            "numServersQueried": 1,
            "timeUsedMs": 4
        }"#;

        let result = decode_response(body).unwrap();
        assert_eq!(result.columns, vec!["COUNTRY", "totalSales"]);
        assert_eq!(
            result.rows,
            vec![
                vec![Scalar::text("Thailand"), Scalar::Number(150.0)],
                vec![Scalar::text("Japan"), Scalar::Number(30.0)],
            ]
        );
    }

    #[test]
    fn nulls_survive_decoding() {
        let body = r#"{"resultTable":{"dataSchema":{"columnNames":["gender","userCount"]},"rows":[[null, 3]]}}"#;
        let result = decode_response(body).unwrap();
        assert_eq!(result.rows[0], vec![Scalar::Null, Scalar::Number(3.0)]);
    }

    #[test]
    fn broker_exceptions_are_query_failures() {
        let body = r#"{"exceptions":[{"errorCode":150,"message":"SQLParsingError: bad token"}]}"#;
        let err = decode_response(body).unwrap_err();
        assert!(matches!(err, QueryError::Rejected(ref m) if m == "[150] SQLParsingError: bad token"));
        assert!(!err.is_connectivity());
    }

    #[test]
    fn missing_result_table_is_empty() {
        let result = decode_response(r#"{"exceptions":[]}"#).unwrap();
        assert_eq!(result, QueryResult::default());
    }

    #[test]
    fn garbage_body_is_decode_error() {
        let err = decode_response("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, QueryError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_connectivity_failure() {
        // Nothing listens on the discard port.
        let conn = PinotConnector::new("http://127.0.0.1:9/query/sql", Duration::from_secs(2))
            .unwrap();
        let err = conn.execute("SELECT 1").await.unwrap_err();
        assert!(err.is_connectivity(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn silent_endpoint_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and never answer.
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let timeout = Duration::from_millis(200);
        let conn = PinotConnector::new(format!("http://{addr}/query/sql"), timeout).unwrap();
        let err = conn.execute("SELECT 1").await.unwrap_err();

        assert!(matches!(err, QueryError::Timeout(t) if t == timeout), "unexpected error: {err}");
        assert!(err.is_connectivity());
    }
}
