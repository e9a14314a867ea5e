//! Per-instance connection settings.
//!
//! Plain fields arrive as instance JSON; the password travels separately in a
//! secure map and is only ever folded into the connection string, never
//! echoed back out.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceSettings {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub user: String,
}

impl DatasourceSettings {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid datasource settings JSON")
    }

    /// Assemble the connection string the driver layer expects. The password
    /// comes from the decrypted secure map; a missing entry folds in as empty.
    pub fn connection_string(&self, secure: &HashMap<String, String>) -> String {
        let password = secure.get("password").map(String::as_str).unwrap_or("");
        format!(
            "HOSTNAME={};PORT={};DATABASE={};UID={};PWD={}",
            self.host, self.port, self.database, self.user, password
        )
    }
}
