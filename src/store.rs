// store.rs

use crate::*;

/// A message as the store returns it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Msg {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "Lat")]
    pub lat: f64,
    #[serde(rename = "Lng")]
    pub lng: f64,
    #[serde(rename = "SortKey", default)]
    pub sort_key: f64,
    #[serde(rename = "CustomID", default)]
    pub custom_id: String,
}

/// A message about to be published.
#[derive(Clone, Debug, PartialEq)]
pub struct NewMsg {
    pub body: String,
    pub lat: f64,
    pub lng: f64,
    pub sort_key: f64,
    pub custom_id: String,
}

/// One page of a geo query, unordered.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoResponse {
    #[serde(rename = "Msgs", default)]
    pub msgs: Vec<Msg>,
    #[serde(rename = "Cursor", default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Appends one message. The store dedups on `custom_id`.
    async fn publish(&self, token: &str, msg: &NewMsg) -> Result<Msg, AqiError>;
}

#[async_trait]
pub trait GeoQuerier: Send + Sync {
    async fn query(
        &self,
        app: &str,
        user: &str,
        rect: &Rect,
        cursor: Option<&str>,
    ) -> Result<GeoResponse, AqiError>;
}

/// HTTP client for the message store.
#[derive(Clone, Debug)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
}

impl StoreClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("aqirelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Cannot build store http client")?;
        Ok(StoreClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    what: &'static str,
    resp: reqwest::Response,
) -> Result<T, AqiError> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(AqiError::upstream(what, anyhow!("{status}: {text}")));
    }
    resp.json::<T>()
        .await
        .map_err(|e| AqiError::upstream(what, e))
}

#[async_trait]
impl Publisher for StoreClient {
    async fn publish(&self, token: &str, msg: &NewMsg) -> Result<Msg, AqiError> {
        let form = [
            ("Token", token.to_string()),
            ("Body", msg.body.clone()),
            ("Lat", msg.lat.to_string()),
            ("Lng", msg.lng.to_string()),
            ("SortKey", msg.sort_key.to_string()),
            ("CustomID", msg.custom_id.clone()),
        ];
        let resp = self
            .http
            .post(self.url("msg/create"))
            .form(&form)
            .send()
            .await
            .map_err(|e| AqiError::upstream("store publish", e))?;
        decode("store publish", resp).await
    }
}

#[async_trait]
impl GeoQuerier for StoreClient {
    async fn query(
        &self,
        app: &str,
        user: &str,
        rect: &Rect,
        cursor: Option<&str>,
    ) -> Result<GeoResponse, AqiError> {
        let mut params = vec![
            ("App", app.to_string()),
            ("User", user.to_string()),
            ("CLat", rect.c_lat.to_string()),
            ("CLng", rect.c_lng.to_string()),
            ("SLat", rect.s_lat.to_string()),
            ("SLng", rect.s_lng.to_string()),
        ];
        if let Some(c) = cursor {
            params.push(("Cursor", c.to_string()));
        }
        let resp = self
            .http
            .get(self.url("msgs/bygeo/appuser"))
            .query(&params)
            .send()
            .await
            .map_err(|e| AqiError::upstream("store geo query", e))?;
        decode("store geo query", resp).await
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Default)]
pub struct DryRunPublisher {
    count: AtomicU64,
}

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, _token: &str, msg: &NewMsg) -> Result<Msg, AqiError> {
        let n = self.count.fetch_add(1, Ordering::Relaxed);
        info!(
            "dry run #{n}: {} sort_key={} at ({}, {}) body={}",
            msg.custom_id, msg.sort_key, msg.lat, msg.lng, msg.body
        );
        Ok(Msg {
            id: format!("dry-run-{n}"),
            body: msg.body.clone(),
            lat: msg.lat,
            lng: msg.lng,
            sort_key: msg.sort_key,
            custom_id: msg.custom_id.clone(),
        })
    }
}


// EOF
