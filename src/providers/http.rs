/*!
 * HTTP transport used by the backend clients.
 *
 * The DeepL client only needs "POST this form, give me status and body".
 * Keeping that behind a trait lets tests script host responses without a
 * network.
 */

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::fmt::Debug;
use std::time::Duration;

use crate::errors::ProviderError;

/// Raw HTTP answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Minimal form-posting transport
#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    /// POST a form-encoded body with the given authorization header value.
    ///
    /// Returns `Err` only for transport failures; any HTTP status is a reply.
    async fn post_form(
        &self,
        url: &str,
        authorization: &str,
        form: &[(&'static str, String)],
    ) -> Result<HttpReply, ProviderError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_form(
        &self,
        url: &str,
        authorization: &str,
        form: &[(&'static str, String)],
    ) -> Result<HttpReply, ProviderError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", authorization)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connect"
                } else {
                    "request"
                };
                ProviderError::RequestFailed(format!("{} error: {}", kind, e.without_url()))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("body error: {}", e.without_url())))?;

        debug!("HTTP {} reply with {} bytes", status, body.len());
        Ok(HttpReply { status, body })
    }
}
