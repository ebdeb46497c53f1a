use anyhow::{anyhow, Result};
use reqwest::{header, Client, StatusCode};
use sha1::{Digest, Sha1};
use url::Url;

/// Outcome of a conditional fetch.
#[derive(Debug, PartialEq, Eq)]
pub enum Fetched {
    Modified { body: Vec<u8>, etag: String },
    NotModified,
    Gone,
}

/// GETs `url`, sending `If-None-Match` when an etag was saved by an earlier
/// crawl. Servers that send no usable `ETag` are compared by content hash.
pub async fn fetch_conditional(client: &Client, url: &Url, saved_etag: Option<&str>) -> Result<Fetched> {
    let host = url.host_str().unwrap_or_default().to_string();
    let mut req = client.get(url.clone());
    if let Some(etag) = saved_etag {
        req = req.header(header::IF_NONE_MATCH, format!("\"{etag}\""));
    }
    let resp = req.send().await.map_err(|e| anyhow!("{host}: {e}"))?;

    match resp.status() {
        StatusCode::OK => {
            let etag = resp
                .headers()
                .get(header::ETAG)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_etag);
            let body = resp.bytes().await.map_err(|e| anyhow!("{host}: {e}"))?.to_vec();
            let etag = etag.unwrap_or_else(|| content_hash(&body));
            if saved_etag == Some(etag.as_str()) {
                return Ok(Fetched::NotModified);
            }
            Ok(Fetched::Modified { body, etag })
        }
        StatusCode::NOT_MODIFIED => Ok(Fetched::NotModified),
        StatusCode::NOT_FOUND => Ok(Fetched::Gone),
        status => Err(anyhow!("{host}: get {url} -> {status}")),
    }
}

/// Strong etag value without its quotes. Weak or unquoted tags are ignored.
pub fn parse_etag(value: &str) -> Option<String> {
    let inner = value.strip_prefix('"')?.strip_suffix('"')?;
    Some(inner.to_string())
}

pub fn content_hash(body: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(body);
    format!("{:x}", hasher.finalize())
}
