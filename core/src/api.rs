use crate::{config::ApiSettings, files::PendingFile};
use async_trait::async_trait;
use feed_api::{Attachment, Envelope, LikeResponse, NewPost, Post, UploadResponse};
use reqwest::{
    multipart::{Form, Part},
    Client, Method, RequestBuilder, Response,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Errors raised while talking to the posts API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Remote operations the home page depends on.
#[async_trait]
pub trait PostsApi: Send + Sync {
    /// Retrieve the whole feed.
    async fn fetch_posts(&self) -> Result<Vec<Post>, ApiError>;
    /// Flip the caller's like on a post and return the new count.
    async fn toggle_like(&self, id: &str) -> Result<LikeResponse, ApiError>;
    /// Upload files in one request, returning their attachment references.
    async fn upload_files(&self, files: &[PendingFile]) -> Result<Vec<Attachment>, ApiError>;
    async fn create_post(&self, post: &NewPost) -> Result<Post, ApiError>;
}

/// [`PostsApi`] over HTTP.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Build a client honouring the configured timeout and token.
    pub fn from_settings(settings: &ApiSettings) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        debug!("api request {} {}", method, url);
        let req = self.client.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        let bytes = resp.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
        Ok(envelope.into_inner())
    }
}

#[async_trait]
impl PostsApi for HttpApi {
    async fn fetch_posts(&self) -> Result<Vec<Post>, ApiError> {
        let resp = self.request(Method::GET, "posts").send().await?;
        Self::decode(resp).await
    }

    async fn toggle_like(&self, id: &str) -> Result<LikeResponse, ApiError> {
        let resp = self
            .request(Method::POST, &format!("posts/{id}/like"))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn upload_files(&self, files: &[PendingFile]) -> Result<Vec<Attachment>, ApiError> {
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.name.clone())
                .mime_str(&file.mime)?;
            form = form.part("files", part);
        }
        let resp = self
            .request(Method::POST, "uploads")
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadResponse = Self::decode(resp).await?;
        Ok(uploaded.files)
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, ApiError> {
        let resp = self.request(Method::POST, "posts").json(post).send().await?;
        Self::decode(resp).await
    }
}
