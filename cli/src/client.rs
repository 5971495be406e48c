//! RemoteClient: HTTP client for a running social graph server

use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when talking to the server
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with an error body
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub user_count: usize,
    pub edge_count: usize,
    pub mutual_pairs: usize,
    pub max_followers: usize,
    pub average_following: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    pub version: String,
    pub graph: GraphStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub a: String,
    pub b: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionPath {
    pub from: String,
    pub to: String,
    pub path: Vec<String>,
    pub degrees: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredUser {
    pub id: String,
    pub score: usize,
    /// Only present on recommendations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub id: String,
    pub following: usize,
    pub followers: usize,
    pub second_degree: usize,
    pub reach: Vec<usize>,
}

/// Network client for the social graph HTTP API
pub struct RemoteClient {
    http_base_url: String,
    http_client: Client,
}

impl RemoteClient {
    pub fn new(http_base_url: &str) -> Self {
        Self {
            http_base_url: http_base_url.trim_end_matches('/').to_string(),
            http_client: Client::new(),
        }
    }

    /// `base/segment/...?params` with every segment percent-encoded
    fn url(&self, segments: &[&str], params: &[(&str, String)]) -> ClientResult<Url> {
        let mut url = Url::parse(&self.http_base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.http_base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> ClientResult<T> {
        let mut request = self.http_client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: serde_json::Value = response
            .json()
            .await
            .unwrap_or_else(|_| serde_json::json!({"error": "Unknown error"}));
        let message = error_body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Err(ClientError::Api { status: status.as_u16(), message })
    }

    fn limit_param(limit: Option<usize>) -> Vec<(&'static str, String)> {
        limit.map(|l| vec![("limit", l.to_string())]).unwrap_or_default()
    }

    pub async fn follow(&self, follower: &str, followee: &str) -> ClientResult<serde_json::Value> {
        let body = serde_json::json!({ "follower": follower, "followee": followee });
        self.send(Method::POST, self.url(&["follow"], &[])?, Some(body)).await
    }

    pub async fn unfollow(&self, follower: &str, followee: &str) -> ClientResult<serde_json::Value> {
        let body = serde_json::json!({ "follower": follower, "followee": followee });
        self.send(Method::DELETE, self.url(&["follow"], &[])?, Some(body)).await
    }

    pub async fn relationship(&self, a: &str, b: &str) -> ClientResult<Relationship> {
        let url = self.url(&["status"], &[("a", a.to_string()), ("b", b.to_string())])?;
        self.send(Method::GET, url, None).await
    }

    pub async fn path(&self, from: &str, to: &str, max_depth: Option<usize>) -> ClientResult<ConnectionPath> {
        let mut params = vec![("from", from.to_string()), ("to", to.to_string())];
        if let Some(depth) = max_depth {
            params.push(("maxDepth", depth.to_string()));
        }
        self.send(Method::GET, self.url(&["path"], &params)?, None).await
    }

    pub async fn mutual(&self, a: &str, b: &str, limit: Option<usize>) -> ClientResult<Vec<String>> {
        let mut params = vec![("a", a.to_string()), ("b", b.to_string())];
        params.extend(Self::limit_param(limit));
        self.send(Method::GET, self.url(&["mutual"], &params)?, None).await
    }

    pub async fn recommendations(&self, user: &str, limit: Option<usize>) -> ClientResult<Vec<ScoredUser>> {
        let mut params = vec![("user", user.to_string())];
        params.extend(Self::limit_param(limit));
        self.send(Method::GET, self.url(&["recommendations"], &params)?, None).await
    }

    pub async fn trending(&self, limit: Option<usize>) -> ClientResult<Vec<ScoredUser>> {
        let url = self.url(&["trending"], &Self::limit_param(limit))?;
        self.send(Method::GET, url, None).await
    }

    pub async fn users(&self, skip: usize, limit: Option<usize>) -> ClientResult<Vec<String>> {
        let mut params = vec![("skip", skip.to_string())];
        params.extend(Self::limit_param(limit));
        self.send(Method::GET, self.url(&["users"], &params)?, None).await
    }

    pub async fn register_user(&self, id: &str) -> ClientResult<serde_json::Value> {
        self.send(Method::PUT, self.url(&["users", id], &[])?, None).await
    }

    pub async fn remove_user(&self, id: &str) -> ClientResult<serde_json::Value> {
        self.send(Method::DELETE, self.url(&["users", id], &[])?, None).await
    }

    pub async fn stats(&self, id: &str, depth: Option<usize>) -> ClientResult<UserStats> {
        let params: Vec<(&str, String)> = depth.map(|d| vec![("depth", d.to_string())]).unwrap_or_default();
        self.send(Method::GET, self.url(&["users", id, "stats"], &params)?, None).await
    }

    /// `followers`, `following` or `friends` of `id`
    pub async fn neighbors(&self, id: &str, relation: &str) -> ClientResult<Vec<String>> {
        self.send(Method::GET, self.url(&["users", id, relation], &[])?, None).await
    }

    pub async fn status(&self) -> ClientResult<ServerStatus> {
        self.send(Method::GET, self.url(&["api", "status"], &[])?, None).await
    }

    pub async fn ping(&self) -> ClientResult<String> {
        let status = self.status().await?;
        if status.status == "healthy" {
            Ok("PONG".to_string())
        } else {
            Err(ClientError::Api {
                status: 503,
                message: format!("Server unhealthy: {}", status.status),
            })
        }
    }
}
