//! HTTP client for a FHIR REST server.
//!
//! Covers exactly what the inspection commands need: the CapabilityStatement
//! (`/metadata`), `_summary=count` totals, and paged searches following
//! bundle `next` links. The nested structure of fetched resources is left as
//! raw `serde_json::Value`; no schema is assumed here.

use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Error type for server fetch operations.
#[derive(Debug)]
pub enum FetchError {
    /// Network or connection error
    Network(String),
    /// 404 Not Found (includes server message if any)
    NotFound(String),
    /// 400 Bad Request (includes server error message)
    BadRequest(String),
    /// 5xx Server Error (includes server error message)
    ServerError(String),
    /// Response could not be parsed as expected
    InvalidResponse(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "network error: {msg}"),
            FetchError::NotFound(msg) => write!(f, "not found: {msg}"),
            FetchError::BadRequest(msg) => write!(f, "bad request: {msg}"),
            FetchError::ServerError(msg) => write!(f, "server error: {msg}"),
            FetchError::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Server identity read from the CapabilityStatement.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    pub software_name: Option<String>,
    pub software_version: Option<String>,
    pub fhir_version: Option<String>,
    /// Resource types declared under `rest[0].resource`.
    pub resource_types: Vec<String>,
}

/// HTTP client for read-only inspection of a FHIR server.
#[derive(Debug, Clone)]
pub struct FhirClient {
    client: Client,
    base_url: String,
}

impl FhirClient {
    /// Create a new client.
    ///
    /// `base_url` is the server root (e.g., `https://hapi.fhir.org/baseR4`).
    /// Trailing slashes are stripped.
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Map a non-2xx response to a `FetchError`.
    ///
    /// Reads the response body as text to include in error messages.
    async fn map_error(resp: reqwest::Response) -> FetchError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        match status {
            StatusCode::NOT_FOUND => FetchError::NotFound(if body.is_empty() {
                "resource not found".to_string()
            } else {
                body
            }),
            StatusCode::BAD_REQUEST => FetchError::BadRequest(if body.is_empty() {
                "bad request".to_string()
            } else {
                body
            }),
            s if s.is_server_error() => FetchError::ServerError(if body.is_empty() {
                format!("status {s}")
            } else {
                body
            }),
            _ => FetchError::ServerError(format!("unexpected status {status}: {body}")),
        }
    }

    /// Map a reqwest error (network/timeout) to a `FetchError`.
    fn map_network_error(e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Network(format!("request timed out: {e}"))
        } else if e.is_connect() {
            FetchError::Network(format!("connection failed: {e}"))
        } else {
            FetchError::Network(e.to_string())
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let resp = self
            .client
            .get(url)
            .header("Accept", "application/fhir+json")
            .send()
            .await
            .map_err(Self::map_network_error)?;

        if resp.status().is_success() {
            resp.json()
                .await
                .map_err(|e| FetchError::InvalidResponse(e.to_string()))
        } else {
            Err(Self::map_error(resp).await)
        }
    }

    /// Fetch the server's CapabilityStatement.
    pub async fn metadata(&self) -> Result<ServerInfo, FetchError> {
        let url = format!("{}/metadata", self.base_url);
        let capability = self.get_json(&url).await?;

        let str_at = |pointer: &str| {
            capability
                .pointer(pointer)
                .and_then(Value::as_str)
                .map(String::from)
        };

        let resource_types = capability
            .pointer("/rest/0/resource")
            .and_then(Value::as_array)
            .map(|resources| {
                resources
                    .iter()
                    .filter_map(|r| r.get("type").and_then(Value::as_str).map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Ok(ServerInfo {
            software_name: str_at("/software/name"),
            software_version: str_at("/software/version"),
            fhir_version: str_at("/fhirVersion"),
            resource_types,
        })
    }

    /// Total stored instance count of one resource type, via
    /// `{type}?_summary=count`.
    pub async fn count(&self, resource_type: &str) -> Result<u64, FetchError> {
        let url = format!("{}/{}?_summary=count", self.base_url, resource_type);
        let bundle = self.get_json(&url).await?;
        bundle
            .get("total")
            .and_then(Value::as_u64)
            .ok_or_else(|| FetchError::InvalidResponse("count bundle has no total".to_string()))
    }

    /// Start a paged search over all instances of `resource_type`. The
    /// server decides the page size; pages are pulled on demand.
    pub fn search(&self, resource_type: &str) -> InstancePages {
        InstancePages {
            client: self.clone(),
            next_url: Some(format!("{}/{}", self.base_url, resource_type)),
        }
    }

    /// Rewrite a bundle `next` link onto our base URL.
    ///
    /// Some servers advertise an internal host in their paging links; only
    /// the path and query are trustworthy, so we re-root them onto the URL
    /// the user gave us.
    fn rebase(&self, link: &str) -> String {
        if link.starts_with(&self.base_url) {
            return link.to_string();
        }
        match (Url::parse(&self.base_url), Url::parse(link)) {
            (Ok(base), Ok(parsed)) => {
                let base_path = base.path().trim_end_matches('/');
                let path = parsed.path();
                // Keep only the part of the path below our base path, in case
                // the link repeats it under a different host.
                let tail = path.strip_prefix(base_path).unwrap_or(path);
                let mut url = format!("{}/{}", self.base_url, tail.trim_start_matches('/'));
                if let Some(query) = parsed.query() {
                    url.push('?');
                    url.push_str(query);
                }
                url
            }
            _ => link.to_string(),
        }
    }
}

/// Cursor over the pages of one search, implementing the record source the
/// aggregator folds from.
pub struct InstancePages {
    client: FhirClient,
    next_url: Option<String>,
}

impl InstancePages {
    /// Fetch the next page of resources, or `None` when the last bundle had
    /// no `next` link. Each returned value is the `resource` of one bundle
    /// entry; a bundle without entries yields an empty page.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>, FetchError> {
        let url = match self.next_url.take() {
            Some(url) => url,
            None => return Ok(None),
        };

        let bundle = self.client.get_json(&url).await?;

        let mut instances = Vec::new();
        if let Some(entries) = bundle.get("entry").and_then(Value::as_array) {
            for entry in entries {
                if let Some(resource) = entry.get("resource") {
                    instances.push(resource.clone());
                }
            }
        }

        self.next_url = next_link(&bundle).map(|link| self.client.rebase(&link));
        Ok(Some(instances))
    }
}

#[async_trait::async_trait]
impl crate::aggregate::RecordSource for InstancePages {
    async fn next_page(&mut self) -> Result<Option<Vec<Value>>, FetchError> {
        InstancePages::next_page(self).await
    }
}

/// The `next` relation of a bundle's `link` list, if present.
fn next_link(bundle: &Value) -> Option<String> {
    bundle
        .get("link")
        .and_then(Value::as_array)?
        .iter()
        .find(|link| link.get("relation").and_then(Value::as_str) == Some("next"))
        .and_then(|link| link.get("url").and_then(Value::as_str))
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_strips_trailing_slash() {
        let client = FhirClient::new("http://localhost:8080/fhir/");
        assert_eq!(client.base_url(), "http://localhost:8080/fhir");
    }

    #[test]
    fn test_rebase_foreign_host() {
        let client = FhirClient::new("https://example.org/baseR4");
        let rebased = client.rebase("http://10.0.0.1:8080/baseR4/Patient?page=2");
        assert_eq!(rebased, "https://example.org/baseR4/Patient?page=2");
    }

    #[test]
    fn test_rebase_keeps_own_links() {
        let client = FhirClient::new("https://example.org/baseR4");
        let link = "https://example.org/baseR4/Patient?page=2";
        assert_eq!(client.rebase(link), link);
    }

    #[test]
    fn test_error_display() {
        let err = FetchError::Network("connection refused".to_string());
        assert_eq!(format!("{err}"), "network error: connection refused");
    }

    #[tokio::test]
    async fn test_metadata_parse() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "CapabilityStatement",
                "fhirVersion": "4.0.1",
                "software": {"name": "HAPI FHIR", "version": "6.2.0"},
                "rest": [{"resource": [
                    {"type": "Patient"},
                    {"type": "Observation"}
                ]}]
            })))
            .mount(&server)
            .await;

        let client = FhirClient::new(&server.uri());
        let info = client.metadata().await.unwrap();
        assert_eq!(info.software_name.as_deref(), Some("HAPI FHIR"));
        assert_eq!(info.fhir_version.as_deref(), Some("4.0.1"));
        assert_eq!(info.resource_types, ["Patient", "Observation"]);
    }

    #[tokio::test]
    async fn test_count_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Patient"))
            .and(query_param("_summary", "count"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Bundle", "type": "searchset", "total": 42
            })))
            .mount(&server)
            .await;

        let client = FhirClient::new(&server.uri());
        assert_eq!(client.count("Patient").await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_count_missing_total_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Patient"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Bundle"
            })))
            .mount(&server)
            .await;

        let client = FhirClient::new(&server.uri());
        let err = client.count("Patient").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_paged_search_follows_next_links() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/Patient"))
            .and(query_param_is_missing("page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Bundle",
                "entry": [{"resource": {"resourceType": "Patient", "id": "1"}}],
                "link": [
                    {"relation": "self", "url": format!("{}/Patient", server.uri())},
                    // Deliberately a foreign host, as misconfigured servers send.
                    {"relation": "next", "url": "http://internal:8080/Patient?page=2"}
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/Patient"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Bundle",
                "entry": [{"resource": {"resourceType": "Patient", "id": "2"}}],
                "link": [{"relation": "self", "url": "x"}]
            })))
            .mount(&server)
            .await;

        let client = FhirClient::new(&server.uri());
        let mut pages = client.search("Patient");

        let first = pages.next_page().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0]["id"], "1");

        let second = pages.next_page().await.unwrap().unwrap();
        assert_eq!(second[0]["id"], "2");

        assert!(pages.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_not_found_maps_to_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Nope"))
            .respond_with(ResponseTemplate::new(404).set_body_string("unknown resource type"))
            .mount(&server)
            .await;

        let client = FhirClient::new(&server.uri());
        let err = client.count("Nope").await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound(msg) if msg.contains("unknown resource type")));
    }
}
