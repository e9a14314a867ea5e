//! HTTP realization of the execution channel: posts the request envelope to
//! a remote backend's `/query` endpoint and decodes the frame response.

use std::future::Future;

use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use tracing::debug;

use crate::datasource::ExecutionChannel;
use crate::query::{QueryRequest, QueryResponse};

#[derive(Clone)]
pub struct HttpChannel {
    base: Url,
    client: reqwest::Client,
}

impl HttpChannel {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base).context("invalid base URL")?;
        let client = reqwest::Client::builder().build()?;
        Ok(HttpChannel { base, client })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    async fn post_query(&self, request: QueryRequest) -> Result<QueryResponse> {
        let url = self.base.join("/query")?;
        debug!(target: "tabsource", "POST {} ({} targets)", url, request.targets.len());
        let resp = self.client.post(url).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("remote error: HTTP {}: {}", status, body));
        }
        let res: QueryResponse = resp.json().await.context("invalid response body")?;
        Ok(res)
    }
}

impl ExecutionChannel for HttpChannel {
    fn query(
        &self,
        request: QueryRequest,
    ) -> impl Future<Output = Result<QueryResponse>> + Send {
        self.post_query(request)
    }
}
