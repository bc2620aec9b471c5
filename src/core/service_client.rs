// src/core/service_client.rs
//! Authenticated HTTP client for the portal backend. Every call carries the
//! bearer token; an unauthorized response ends the session and sends the
//! user to the login page.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

use crate::core::navigation::{Navigator, Route};
use crate::core::session::SessionStore;

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Create a client rooted at `base_url` (e.g. `http://host/api/v1`)
    pub fn new(
        base_url: &str,
        timeout_seconds: u64,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            navigator,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let builder = builder.headers(headers);
        match self.session.get_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// GET; `Ok(None)` means the session ended and a redirect was issued
    pub async fn get<R>(&self, endpoint: &str) -> Result<Option<R>>
    where
        R: DeserializeOwned,
    {
        let url = self.url(endpoint);
        self.execute("GET", &url, self.client.get(&url)).await
    }

    pub async fn get_with_query<R, Q>(&self, endpoint: &str, query: &Q) -> Result<Option<R>>
    where
        R: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(endpoint);
        self.execute("GET", &url, self.client.get(&url).query(query))
            .await
    }

    pub async fn post_json<T, R>(&self, endpoint: &str, payload: &T) -> Result<Option<R>>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(endpoint);
        self.execute("POST", &url, self.client.post(&url).json(payload))
            .await
    }

    pub async fn put_json<T, R>(&self, endpoint: &str, payload: &T) -> Result<Option<R>>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(endpoint);
        self.execute("PUT", &url, self.client.put(&url).json(payload))
            .await
    }

    pub async fn put_empty<R>(&self, endpoint: &str) -> Result<Option<R>>
    where
        R: DeserializeOwned,
    {
        let url = self.url(endpoint);
        self.execute("PUT", &url, self.client.put(&url)).await
    }

    pub async fn delete<R>(&self, endpoint: &str) -> Result<Option<R>>
    where
        R: DeserializeOwned,
    {
        let url = self.url(endpoint);
        self.execute("DELETE", &url, self.client.delete(&url)).await
    }

    /// Existence check: `Some(true)` on success, `Some(false)` on 404
    pub async fn exists(&self, endpoint: &str) -> Result<Option<bool>> {
        let url = self.url(endpoint);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .with_context(|| format!("Failed to GET from {}", url))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                self.end_session();
                Ok(None)
            }
            StatusCode::NOT_FOUND => Ok(Some(false)),
            status if status.is_success() => Ok(Some(true)),
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                anyhow::bail!("HTTP {} error: {}", status, error_text)
            }
        }
    }

    /// Unauthenticated GET for the login endpoints
    pub async fn get_public<R, Q>(&self, endpoint: &str, query: &Q) -> Result<R>
    where
        R: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(endpoint);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to GET from {}", url))?;
        Self::parse(&url, response).await
    }

    /// Unauthenticated POST for the login endpoints
    pub async fn post_public<T, R>(&self, endpoint: &str, payload: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(endpoint);
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Failed to POST to {}", url))?;
        Self::parse(&url, response).await
    }

    async fn execute<R>(&self, method: &str, url: &str, builder: RequestBuilder) -> Result<Option<R>>
    where
        R: DeserializeOwned,
    {
        trace!("{} {}", method, url);

        let response = self
            .authorize(builder)
            .send()
            .await
            .with_context(|| format!("Failed to {} {}", method, url))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("{} {} returned 401, ending session", method, url);
            self.end_session();
            return Ok(None);
        }

        Self::parse(url, response).await.map(Some)
    }

    async fn parse<R>(url: &str, response: reqwest::Response) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let status = response.status();
        debug!("Response status from {}: {}", url, status);

        if status.is_success() {
            response
                .json::<R>()
                .await
                .with_context(|| format!("Failed to parse JSON response from {}", url))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Service error response from {}: {}", url, error_text);
            anyhow::bail!("HTTP {} error: {}", status, error_text)
        }
    }

    fn end_session(&self) {
        if let Err(e) = self.session.clear() {
            error!("Failed to clear session: {}", e);
        }
        self.navigator.navigate(&Route::Login);
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    //! One-shot HTTP responder for exercising the real client

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    pub fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    /// Serve `response` to a single connection; the handle yields the raw request
    pub async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if let Some(end) = find_head_end(&request) {
                    let head = String::from_utf8_lossy(&request[..end]).to_lowercase();
                    let body_len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + body_len {
                        break;
                    }
                }
            }

            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn find_head_end(bytes: &[u8]) -> Option<usize> {
        bytes.windows(4).position(|w| w == b"\r\n\r\n")
    }
}
