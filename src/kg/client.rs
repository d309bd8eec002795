use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::FetchError;
use super::merge::MergeSuggestions;
use super::parse::{DocumentDetail, GraphPayload, RawMergeSuggestions, parse_document_detail};

const ERROR_BODY_LIMIT: usize = 512;

/// Backend calls the explorer depends on. Implementations block; callers run
/// them on worker threads.
pub trait GraphApi: Send + Sync {
    fn global_hierarchy(&self, query: &str, top_k: usize) -> Result<GraphPayload, FetchError>;

    fn global_search(&self, query: &str, top_k: usize) -> Result<GraphPayload, FetchError>;

    /// `collection_id = "all"` requests the cross-collection graph.
    fn collection_graph(&self, collection_id: &str) -> Result<GraphPayload, FetchError>;

    fn merge_suggestions(&self, collection_id: &str) -> Result<MergeSuggestions, FetchError>;

    fn document(&self, collection_id: &str, document_id: &str)
    -> Result<DocumentDetail, FetchError>;
}

#[derive(Debug, Serialize)]
struct GraphQuery<'a> {
    query: &'a str,
    top_k: usize,
}

pub struct HttpGraphApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGraphApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.filter(|token| !token.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, FetchError> {
        let response = self.authorize(request).send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let mut body = body;
            if body.len() > ERROR_BODY_LIMIT {
                let mut cut = ERROR_BODY_LIMIT;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn post_graph_query(
        &self,
        path: &str,
        query: &str,
        top_k: usize,
    ) -> Result<GraphPayload, FetchError> {
        tracing::debug!(path, query, top_k, "requesting graph");
        self.send(
            self.client
                .post(self.url(path))
                .json(&GraphQuery { query, top_k }),
        )
    }
}

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

impl GraphApi for HttpGraphApi {
    fn global_hierarchy(&self, query: &str, top_k: usize) -> Result<GraphPayload, FetchError> {
        self.post_graph_query("graphs/hierarchy/global", query, top_k)
    }

    fn global_search(&self, query: &str, top_k: usize) -> Result<GraphPayload, FetchError> {
        self.post_graph_query("graphs/search/global", query, top_k)
    }

    fn collection_graph(&self, collection_id: &str) -> Result<GraphPayload, FetchError> {
        let path = format!("collections/{}/graphs", segment(collection_id));
        tracing::debug!(%path, "requesting collection graph");
        self.send(self.client.get(self.url(&path)))
    }

    fn merge_suggestions(&self, collection_id: &str) -> Result<MergeSuggestions, FetchError> {
        let path = format!(
            "collections/{}/graphs/merge-suggestions",
            segment(collection_id)
        );
        let raw: RawMergeSuggestions = self.send(self.client.post(self.url(&path)))?;
        Ok(raw.into_suggestions())
    }

    fn document(
        &self,
        collection_id: &str,
        document_id: &str,
    ) -> Result<DocumentDetail, FetchError> {
        let path = format!(
            "collections/{}/documents/{}",
            segment(collection_id),
            segment(document_id)
        );
        let raw: Value = self.send(self.client.get(self.url(&path)))?;
        Ok(parse_document_detail(raw, document_id))
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn api(server: &mockito::Server, token: Option<&str>) -> HttpGraphApi {
        HttpGraphApi::new(
            &format!("{}/api/v1/", server.url()),
            token.map(str::to_owned),
            Duration::from_secs(5),
        )
        .expect("client builds")
    }

    #[test]
    fn hierarchy_posts_query_and_top_k() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/v1/graphs/hierarchy/global")
            .match_body(Matcher::Json(serde_json::json!({"query": "", "top_k": 50})))
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(r#"{"nodes": [{"id": "c1", "kind": "collection"}], "edges": []}"#)
            .create();

        let payload = api(&server, Some("secret"))
            .global_hierarchy("", 50)
            .expect("hierarchy loads");

        mock.assert();
        let (nodes, edges) = payload.into_parts();
        assert_eq!(nodes.len(), 1);
        assert!(edges.is_empty());
    }

    #[test]
    fn non_success_status_maps_to_status_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/api/v1/graphs/search/global")
            .with_status(503)
            .with_body("maintenance")
            .create();

        let error = api(&server, None)
            .global_search("breaker", 20)
            .expect_err("503 must fail");

        match error {
            FetchError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_body_maps_to_decode_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/api/v1/collections/all/graphs")
            .with_status(200)
            .with_body("<html>")
            .create();

        let error = api(&server, None)
            .collection_graph("all")
            .expect_err("html is not a graph");
        assert!(matches!(error, FetchError::Decode(_)));
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/v1/collections/yard%20north/documents/doc%2F7")
            .with_status(200)
            .with_body(r#"{"id": "doc/7", "title": "Relay settings", "content": "Zone 1 reach"}"#)
            .create();

        let detail = api(&server, None)
            .document("yard north", "doc/7")
            .expect("document loads");

        mock.assert();
        assert_eq!(detail.title, "Relay settings");
        assert_eq!(detail.content, "Zone 1 reach");
    }

    #[test]
    fn merge_suggestions_are_normalized() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/api/v1/collections/c1/graphs/merge-suggestions")
            .with_status(200)
            .with_body(r#"{"suggestions": [{"entity_ids": ["a", "b"]}], "pending_count": 13}"#)
            .create();

        let suggestions = api(&server, None)
            .merge_suggestions("c1")
            .expect("suggestions load");

        assert_eq!(suggestions.pending_count, 13);
        assert_eq!(suggestions.suggestions[0].entities.len(), 2);
    }
}
