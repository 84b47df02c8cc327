//! Biographical lookup against the China Biographical Database (CBDB).
//!
//! Every failure path (network, timeout, unexpected JSON) yields `None`;
//! a missing biography never fails an exploration.

use mingyu_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Public CBDB person API.
pub const CBDB_ENDPOINT: &str = "https://cbdb.fas.harvard.edu/cbdbapi/person.php";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Biography {
    pub name: String,
    pub birth: String,
    pub death: String,
    pub dynasty: String,
    pub native: String,
    pub id: String,
}

/// HTTP client for the person endpoint.
#[derive(Debug, Clone)]
pub struct BiographyClient {
    client: reqwest::Client,
    endpoint: String,
}

impl BiographyClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Look up a person by Simplified Chinese name.
    pub async fn lookup(&self, name: &str) -> Option<Biography> {
        match self.fetch(name).await {
            Ok(body) => {
                let bio = parse_biography(&body, name);
                if bio.is_none() {
                    tracing::debug!("No CBDB record for '{}'", name);
                }
                bio
            }
            Err(e) => {
                tracing::debug!("CBDB lookup for '{}' failed: {}", name, e);
                None
            }
        }
    }

    async fn fetch(&self, name: &str) -> AppResult<String> {
        let traditional = zhconv::zhconv(name, zhconv::Variant::ZhHant);
        tracing::debug!("Querying CBDB for '{}' ({})", name, traditional);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("name", traditional.as_str()), ("o", "json")])
            .send()
            .await
            .map_err(|e| AppError::Other(format!("CBDB request failed: {}", e)))?;

        response
            .text()
            .await
            .map_err(|e| AppError::Other(format!("Failed to read CBDB response: {}", e)))
    }
}

/// Parse a CBDB person response.
///
/// The payload nests `Package → PersonAuthority → PersonInfo → Person`, any
/// layer of which may be absent; `Person` is an object or a list whose
/// first element is used.
pub fn parse_biography(body: &str, name: &str) -> Option<Biography> {
    let mut data: Value = serde_json::from_str(body).ok()?;

    for key in ["Package", "PersonAuthority", "PersonInfo", "Person"] {
        let inner = data.get_mut(key).map(Value::take);
        if let Some(inner) = inner {
            data = inner;
        }
    }

    let target = match data {
        Value::Object(map) => Value::Object(map),
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        _ => return None,
    };

    let basic = target.get("BasicInfo");
    let field = |key: &str, default: &str| -> String {
        basic
            .and_then(|b| b.get(key))
            .and_then(value_to_string)
            .unwrap_or_else(|| default.to_string())
    };

    Some(Biography {
        name: field("ChName", name),
        birth: field("YearBirth", "?"),
        death: field("YearDeath", "?"),
        dynasty: field("Dynasty", "明"),
        native: field("IndexAddr", "未知"),
        id: field("PersonId", "N/A"),
    })
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_package() {
        let body = r#"{
            "Package": {"PersonAuthority": {"PersonInfo": {"Person": {
                "BasicInfo": {
                    "PersonId": "1762",
                    "ChName": "張居正",
                    "YearBirth": "1525",
                    "YearDeath": "1582",
                    "Dynasty": "明",
                    "IndexAddr": "江陵"
                }
            }}}}
        }"#;

        let bio = parse_biography(body, "张居正").unwrap();
        assert_eq!(bio.name, "張居正");
        assert_eq!(bio.birth, "1525");
        assert_eq!(bio.death, "1582");
        assert_eq!(bio.native, "江陵");
        assert_eq!(bio.id, "1762");
    }

    #[test]
    fn test_parse_person_list_uses_first() {
        let body = r#"{"Person": [
            {"BasicInfo": {"ChName": "海瑞", "YearBirth": 1514}},
            {"BasicInfo": {"ChName": "other"}}
        ]}"#;

        let bio = parse_biography(body, "海瑞").unwrap();
        assert_eq!(bio.name, "海瑞");
        assert_eq!(bio.birth, "1514");
        assert_eq!(bio.death, "?");
        assert_eq!(bio.dynasty, "明");
        assert_eq!(bio.native, "未知");
        assert_eq!(bio.id, "N/A");
    }

    #[test]
    fn test_missing_basic_info_uses_defaults() {
        let bio = parse_biography(r#"{"Person": {}}"#, "于谦").unwrap();
        assert_eq!(bio.name, "于谦");
        assert_eq!(bio.birth, "?");
    }

    #[test]
    fn test_unusable_payloads() {
        assert!(parse_biography("not json", "x").is_none());
        assert!(parse_biography(r#"{"Person": []}"#, "x").is_none());
        assert!(parse_biography(r#""plain string""#, "x").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_none() {
        let client =
            BiographyClient::new("http://127.0.0.1:9/person.php", Duration::from_millis(200))
                .unwrap();
        assert!(client.lookup("张居正").await.is_none());
    }
}
