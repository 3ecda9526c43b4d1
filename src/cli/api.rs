use anyhow::{bail, Result};
use serde::Deserialize;

use crate::database::db::analytics::AnalyticsSummary;
use crate::database::models::{Category, NewTransaction, Transaction};
use crate::parser::ParsedTransaction;

/// HTTP client for the backend. The dashboard goes through the API
/// surface only; it never touches the database.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseReply {
    pub success: bool,
    pub data: Option<ParsedTransaction>,
    pub error: Option<String>,
}

impl Client {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    // ============= Transactions =============

    pub async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let list = self
            .http
            .get(format!("{}/api/transactions", self.base))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(list)
    }

    pub async fn create_transaction(&self, req: &NewTransaction) -> Result<Transaction> {
        let resp = self
            .http
            .post(format!("{}/api/transactions", self.base))
            .json(req)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("{}", error_message(resp).await);
        }
        Ok(resp.json().await?)
    }

    pub async fn delete_transaction(&self, id: i64) -> Result<()> {
        let resp = self
            .http
            .delete(format!("{}/api/transactions/{id}", self.base))
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("{}", error_message(resp).await);
        }
        Ok(())
    }

    // ============= Categories =============

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let list = self
            .http
            .get(format!("{}/api/categories", self.base))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(list)
    }

    // ============= Analytics =============

    pub async fn summary(&self) -> Result<AnalyticsSummary> {
        let summary = self
            .http
            .get(format!("{}/api/analytics/summary", self.base))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(summary)
    }

    // ============= Natural language =============

    pub async fn parse_text(&self, text: &str) -> Result<ParseReply> {
        let reply = self
            .http
            .post(format!("{}/api/parse", self.base))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(reply)
    }
}

/// Pull the `{"error": ...}` body out of a rejected response, falling
/// back to the status line.
async fn error_message(resp: reqwest::Response) -> String {
    let status = resp.status();
    #[derive(Deserialize)]
    struct Body {
        error: String,
    }
    match resp.json::<Body>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    }
}
