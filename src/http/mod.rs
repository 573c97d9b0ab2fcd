use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

use crate::model::Track;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server returned {status} for {path}")]
    Status { status: StatusCode, path: String },

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Thin client over the marketplace REST API.
#[derive(Clone)]
pub struct ApiService {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiService {
    pub fn new(client: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn http_client(&self) -> &Client {
        &self.client
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn check(&self, path: &str, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                path: path.to_string(),
            });
        }
        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get_json_with(path, &[]).await
    }

    pub async fn get_json_with<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        debug!(path, ?query, "api_get");
        let response = self
            .authorize(self.client.get(self.url(path)).query(query))
            .send()
            .await?;
        Ok(self.check(path, response)?.json::<T>().await?)
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        debug!(path, "api_post");
        let response = self
            .authorize(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await?;
        self.check(path, response)?;
        Ok(())
    }

    pub async fn post_for<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(path, "api_post");
        let response = self
            .authorize(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await?;
        Ok(self.check(path, response)?.json::<T>().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        debug!(path, "api_delete");
        let response = self.authorize(self.client.delete(self.url(path))).send().await?;
        self.check(path, response)?;
        Ok(())
    }

    pub async fn fetch_catalog(&self, query: Option<&str>) -> Result<Vec<Track>, ApiError> {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => self.get_json_with("beats", &[("search", q)]).await,
            None => self.get_json("beats").await,
        }
    }

    pub async fn fetch_track(&self, track_id: &str) -> Result<Track, ApiError> {
        self.get_json(&format!("beats/{}", urlencoding::encode(track_id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_urls_without_double_slashes() {
        let api = ApiService::new(Client::new(), "https://api.example.com/v1/", None);
        assert_eq!(api.url("/cart"), "https://api.example.com/v1/cart");
        assert_eq!(api.url("beats/1"), "https://api.example.com/v1/beats/1");
    }

    #[test]
    fn search_terms_travel_as_query_pairs() {
        let api = ApiService::new(Client::new(), "https://api.example.com/v1", None);
        let request = api
            .client
            .get(api.url("beats"))
            .query(&[("search", "dark trap & b=c")])
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/v1/beats");
        let pairs: Vec<_> = request.url().query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("search".to_string(), "dark trap & b=c".to_string())]);
    }
}
