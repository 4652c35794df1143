use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{RateLimiter, Quota, state::{NotKeyed, InMemoryState}, clock::DefaultClock};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub type ApiRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Anything that stops a holder fetch. Transport failures, non-2xx answers
/// and undecodable bodies all land in `Request`; callers do not retry.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid holder request: {0}")]
    InvalidRequest(String),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Which Dune surface a request targets; they authenticate with different headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFlavor {
    Sim,
    Dune,
}

impl ApiFlavor {
    fn key_header(self) -> &'static str {
        match self {
            ApiFlavor::Sim => "X-Sim-Api-Key",
            ApiFlavor::Dune => "X-Dune-Api-Key",
        }
    }
}

#[derive(Clone)]
pub struct SimClient {
    http: Client,
    api_key: String,
    rate_limiter: Arc<ApiRateLimiter>,
}

impl SimClient {
    pub fn new(api_key: impl Into<String>, requests_per_second: NonZeroU32) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(requests_per_second))),
        }
    }

    fn authorize(&self, request: RequestBuilder, flavor: ApiFlavor) -> RequestBuilder {
        request
            .header(flavor.key_header(), self.api_key.as_str())
            .bearer_auth(&self.api_key)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, flavor: ApiFlavor) -> Result<T, FetchError> {
        tracing::debug!("GET {}", url);
        let request = self.authorize(self.http.get(url), flavor);
        self.send(url, request).await
    }

    pub async fn post_json<B, T>(&self, url: &str, body: &B, flavor: ApiFlavor) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("POST {}", url);
        let request = self.authorize(self.http.post(url).json(body), flavor);
        self.send(url, request).await
    }

    async fn send<T: DeserializeOwned>(&self, url: &str, request: RequestBuilder) -> Result<T, FetchError> {
        self.rate_limiter.until_ready().await;
        execute(request).await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })
    }
}

async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, reqwest::Error> {
    let response = request.send().await?.error_for_status()?;
    response.json::<T>().await
}
