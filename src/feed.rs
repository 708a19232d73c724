// feed.rs

use serde_json::{Map, Value};

use crate::*;

/// Fetches the open-data feed once.
pub async fn fetch_records(client: &reqwest::Client, url: &str) -> Result<Vec<RawRecord>, AqiError> {
    info!("Fetching feed {url}");
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| AqiError::upstream("feed fetch", e))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(AqiError::upstream(
            "feed fetch",
            anyhow!("{url} returned {status}"),
        ));
    }
    let text = resp
        .text()
        .await
        .map_err(|e| AqiError::upstream("feed fetch", e))?;
    let records = records_from_json(&text)?;
    info!("Feed returned {n} records", n = records.len());
    Ok(records)
}

/// Decodes a feed document: a JSON array of flat objects.
///
/// Non-string values are kept in their JSON text form so that feeds sending
/// bare numbers still go through the record parser.
pub fn records_from_json(text: &str) -> Result<Vec<RawRecord>, AqiError> {
    let rows = serde_json::from_str::<Vec<Map<String, Value>>>(text)?;
    Ok(rows.into_iter().map(stringify).collect())
}

fn stringify(row: Map<String, Value>) -> RawRecord {
    row.into_iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (k, v)
        })
        .collect()
}


// EOF
