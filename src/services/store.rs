use super::wire;
use async_trait::async_trait;
use awasser_core::content::{ContentStore, Table};
use awasser_core::{Error, Result};
use reqwest::Client;
use serde_json::Value;

/// PostgREST client for the hosted content store.
#[derive(Clone, Debug)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn checked(table: Table, resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        log::error!("[store] {} -> HTTP {}: {}", table.name(), status, body);
        Err(Error::store(
            table.name(),
            format!("HTTP {}: {}", status.as_u16(), wire::error_message(&body)),
        ))
    }
}

#[async_trait(?Send)]
impl ContentStore for RestStore {
    async fn list(&self, table: Table) -> Result<Vec<Value>> {
        let resp = self
            .authed(self.client.get(wire::table_url(&self.base_url, table)))
            .send()
            .await
            .map_err(|e| Error::store(table.name(), e))?;
        let rows: Vec<Value> = Self::checked(table, resp)
            .await?
            .json()
            .await
            .map_err(|e| Error::store(table.name(), e))?;
        log::info!("[store] {} rows from {}", rows.len(), table.name());
        Ok(rows)
    }

    async fn insert(&self, table: Table, record: Value) -> Result<Value> {
        let resp = self
            .authed(self.client.post(wire::insert_url(&self.base_url, table)))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await
            .map_err(|e| Error::store(table.name(), e))?;
        let body: Value = Self::checked(table, resp)
            .await?
            .json()
            .await
            .map_err(|e| Error::store(table.name(), e))?;
        wire::first_row(table, body)
    }

    async fn delete(&self, table: Table, id: &str) -> Result<()> {
        let resp = self
            .authed(self.client.delete(wire::row_url(&self.base_url, table, id)))
            .send()
            .await
            .map_err(|e| Error::store(table.name(), e))?;
        Self::checked(table, resp).await?;
        log::info!("[store] deleted {} from {}", id, table.name());
        Ok(())
    }
}
