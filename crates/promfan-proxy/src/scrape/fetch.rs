//! Upstream retrieval seam.

use async_trait::async_trait;

use promfan_core::error::{PromfanError, Result};

const ACCEPT: &str = "text/plain;version=0.0.4;q=1,*/*;q=0.1";

/// Fetch one target's raw exposition body.
///
/// Implementations report non-success statuses as `PromfanError::Status`,
/// connect/read failures as `PromfanError::Transport`, and a body that is
/// not UTF-8 as `PromfanError::Decode`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Production fetcher over a shared `reqwest` connection pool.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("promfan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PromfanError::Internal(format!("http client init failed: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .send()
            .await
            .map_err(|e| PromfanError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PromfanError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PromfanError::Transport(format!("read body failed: {e}")))?;

        String::from_utf8(body.to_vec()).map_err(|e| {
            let valid = e.utf8_error().valid_up_to();
            let line = body.iter().take(valid).filter(|b| **b == b'\n').count() + 1;
            PromfanError::Decode {
                line,
                msg: "body is not valid UTF-8".into(),
            }
        })
    }
}
