use crate::auth::Credential;
use crate::config::Settings;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const CONTRACT: &str = "tinkoff.public.invest.api.contract.v1";

/// The three invest API calls the report needs.
#[async_trait::async_trait]
pub trait BrokerageApi: Send + Sync {
    async fn get_accounts(&self) -> Result<Value>;
    async fn get_portfolio(&self, account_id: &str) -> Result<Value>;
    async fn share_by(&self, figi: &str) -> Result<Value>;
}

/// REST client for the invest public API. Every call is a POST with a JSON
/// body; responses come back as raw JSON trees.
#[derive(Clone)]
pub struct InvestClient {
    http: reqwest::Client,
    base_url: String,
    auth_header: String,
}

#[derive(Debug, Serialize)]
struct PortfolioRequest<'a> {
    #[serde(rename = "accountId")]
    account_id: &'a str,
    currency: &'a str,
}

#[derive(Debug, Serialize)]
struct ShareByRequest<'a> {
    #[serde(rename = "idType")]
    id_type: &'a str,
    id: &'a str,
}

impl InvestClient {
    pub fn from_settings(settings: &Settings, credential: &Credential) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to build invest http client")?;

        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            auth_header: credential.header_value(),
        })
    }

    fn url(&self, service: &str, method: &str) -> String {
        format!(
            "{}/{CONTRACT}.{service}/{method}",
            self.base_url.trim_end_matches('/')
        )
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));
        headers.insert("Authorization", HeaderValue::from_str(&self.auth_header)?);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn call<B: Serialize>(&self, service: &str, method: &str, body: &B) -> Result<Value> {
        let url = self.url(service, method);

        let res = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(body)
            .send()
            .await
            .with_context(|| format!("{service}/{method} request failed"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read {service}/{method} response"))?;

        if !status.is_success() {
            anyhow::bail!("{service}/{method} HTTP {status}: {text}");
        }

        serde_json::from_str(&text)
            .with_context(|| format!("{service}/{method} response is not valid JSON: {text}"))
    }
}

#[async_trait::async_trait]
impl BrokerageApi for InvestClient {
    async fn get_accounts(&self) -> Result<Value> {
        self.call("UsersService", "GetAccounts", &serde_json::json!({}))
            .await
    }

    async fn get_portfolio(&self, account_id: &str) -> Result<Value> {
        let req = PortfolioRequest {
            account_id,
            currency: "RUB",
        };
        self.call("OperationsService", "GetPortfolio", &req).await
    }

    async fn share_by(&self, figi: &str) -> Result<Value> {
        let req = ShareByRequest {
            id_type: "1",
            id: figi,
        };
        self.call("InstrumentsService", "ShareBy", &req).await
    }
}
