use crate::backends::realtime;
use crate::backends::traits::PropertyBackend;
use crate::backends::types::{BackendKind, ChangeFeed, PropertyRow};
use crate::config::BackendCredentials;
use crate::error::{Result, StoreError};
use crate::models::Property;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use std::time::Duration;
use tracing::{debug, warn};

/// Table holding one row per custom property: `(id text primary key, data jsonb)`
pub const PROPERTIES_TABLE: &str = "properties";

/// Custom records stored in a hosted table, addressed through its REST interface
pub struct RemoteBackend {
    client: Client,
    table_url: Url,
    realtime_url: Url,
    key: String,
}

impl RemoteBackend {
    pub fn new(credentials: &BackendCredentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let base = base_url(&credentials.url)?;
        let table_url = base
            .join(&format!("rest/v1/{}", PROPERTIES_TABLE))
            .map_err(|e| StoreError::Config(format!("invalid backend URL: {}", e)))?;
        let realtime_url = realtime::endpoint(&base, &credentials.key)?;

        Ok(Self {
            client,
            table_url,
            realtime_url,
            key: credentials.key.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
    }

    async fn upsert_rows(&self, rows: &[PropertyRow]) -> Result<()> {
        let request = self
            .client
            .post(self.table_url.clone())
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);

        let response = self.authorized(request).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl PropertyBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn load(&self) -> Result<Vec<Property>> {
        let request = self
            .client
            .get(self.table_url.clone())
            .query(&[("select", "id,data")]);

        let response = ensure_success(self.authorized(request).send().await?).await?;
        let rows: Vec<PropertyRow> = response.json().await?;
        debug!("Fetched {} rows from {}", rows.len(), PROPERTIES_TABLE);

        Ok(rows.into_iter().filter_map(row_to_property).collect())
    }

    async fn upsert(&self, property: &Property) -> Result<()> {
        let row = property_to_row(property)?;
        self.upsert_rows(std::slice::from_ref(&row)).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.table_url.clone())
            .query(&[("id", format!("eq.{}", id))]);

        ensure_success(self.authorized(request).send().await?).await?;
        Ok(())
    }

    async fn save_all(&self, properties: &[Property]) -> Result<()> {
        if properties.is_empty() {
            return Ok(());
        }
        let rows = properties
            .iter()
            .map(property_to_row)
            .collect::<Result<Vec<_>>>()?;
        self.upsert_rows(&rows).await
    }

    fn watch(&self) -> ChangeFeed {
        let endpoint = self.realtime_url.clone();
        ChangeFeed::spawn(move |changes| realtime::run(endpoint, PROPERTIES_TABLE, changes))
    }
}

/// Normalise the configured endpoint so relative joins append instead of replace.
fn base_url(raw: &str) -> Result<Url> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| StoreError::Config(format!("invalid backend URL: {}", e)))
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    warn!("Backend returned status: {}", status);
    Err(StoreError::Backend {
        status: status.as_u16(),
        message,
    })
}

pub fn property_to_row(property: &Property) -> Result<PropertyRow> {
    Ok(PropertyRow {
        id: property.id.clone(),
        data: serde_json::to_value(property.without_source())?,
    })
}

/// Rows whose payload lacks an id take the row's primary key.
pub fn row_to_property(row: PropertyRow) -> Option<Property> {
    let mut data = match row.data {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        other => {
            warn!("Row {} holds a non-object payload: {}", row.id, other);
            return None;
        }
    };
    let has_id = matches!(data.get("id"), Some(serde_json::Value::String(_)));
    if !has_id {
        data.insert("id".to_string(), serde_json::Value::String(row.id.clone()));
    }

    match serde_json::from_value::<Property>(serde_json::Value::Object(data)) {
        Ok(property) => Some(Property {
            source: None,
            ..property
        }),
        Err(e) => {
            warn!("Skipping malformed row {}: {}", row.id, e);
            None
        }
    }
}
