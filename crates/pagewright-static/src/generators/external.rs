//! Page bodies fetched from a URL.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use thiserror::Error;

use super::{Generator, GeneratorContext};
use crate::builder::BuildError;
use crate::collection::PageCollection;
use crate::hooks::Stage;
use crate::message::Message;
use crate::page::Page;

/// Variable naming the URL a page's body comes from.
const EXTERNAL_KEY: &str = "external";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
}

/// Retrieves remote content as text.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTP fetcher. The client is created on first use.
#[derive(Debug, Default)]
pub struct HttpFetcher {
    client: OnceLock<reqwest::blocking::Client>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, FetchError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(self.client.get_or_init(|| client))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client()?
            .get(url)
            .send()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .map_err(|e| FetchError::Request(e.to_string()))
    }
}

/// Replaces the body of pages with an `external` variable by the fetched text.
pub struct ExternalBodyGenerator {
    fetcher: Arc<dyn Fetcher>,
}

impl ExternalBodyGenerator {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

impl std::fmt::Debug for ExternalBodyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalBodyGenerator").finish_non_exhaustive()
    }
}

impl Generator for ExternalBodyGenerator {
    fn name(&self) -> &'static str {
        "external"
    }

    fn generate(
        &self,
        pages: &PageCollection,
        ctx: &GeneratorContext<'_>,
    ) -> Result<Vec<Page>, BuildError> {
        let mut generated = Vec::new();

        for page in pages {
            let Some(url) = page
                .variable(EXTERNAL_KEY)
                .and_then(|v| v.to_text())
                .filter(|url| !url.trim().is_empty())
            else {
                continue;
            };

            let body = match self.fetcher.fetch(url.trim()) {
                Ok(body) => body,
                Err(e) => {
                    (ctx.report)(Message::warning(
                        Stage::Generate,
                        page.id(),
                        format!("could not fetch {url}: {e}"),
                    ));
                    continue;
                }
            };

            let format = page
                .source()
                .map(|s| ctx.config.formats_for(&s.extension).1)
                .unwrap_or(ctx.config.body.format.as_str());

            let mut updated = page.clone();
            updated.set_html(ctx.converters.convert_body(&body, Some(format)));
            updated.set_body(body);
            generated.push(updated);
        }

        Ok(generated)
    }
}
