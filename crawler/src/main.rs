mod fetch;
mod state;

use anyhow::{anyhow, Result};
use clap::Parser;
use docdex_core::Package;
use fetch::{fetch_conditional, Fetched};
use reqwest::Client;
use state::{CrawlState, Entry};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tokio::sync::Semaphore;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Re-crawl extracted package records and push changes to the index server")]
struct Cli {
    /// Path to a file with record URLs (one per line)
    #[arg(long)]
    seeds: String,
    /// Etag state carried between runs
    #[arg(long, default_value = "./crawl-state.json")]
    state: String,
    /// Base URL of the index server
    #[arg(long, default_value = "http://127.0.0.1:8080/")]
    server: String,
    /// Token for the server's write endpoints
    #[arg(long, env = "ADMIN_TOKEN")]
    admin_token: String,
    /// Concurrent fetches
    #[arg(long, default_value_t = 16)]
    concurrency: usize,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// User-Agent string sent upstream
    #[arg(long, default_value = "docdex-crawler/0.1 (+https://example.com/bot)")]
    user_agent: String,
}

#[derive(Debug, Default)]
struct Changes {
    put: Vec<Package>,
    removed: Vec<String>,
    unchanged: usize,
    failed: usize,
}

impl Changes {
    /// Keeps a removal only when no put of this run and no state entry still
    /// claims the path.
    fn settle(&mut self, state: &CrawlState) {
        let put = &self.put;
        self.removed.retain(|path| {
            !put.iter().any(|pkg| &pkg.import_path == path)
                && !state.entries.values().any(|entry| &entry.import_path == path)
        });
        self.removed.sort();
        self.removed.dedup();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let client = Client::builder()
        .user_agent(args.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;
    let server = Url::parse(&args.server)?;
    let seeds = read_seeds(Path::new(&args.seeds))?;
    if seeds.is_empty() { return Err(anyhow!("no valid seeds")); }
    let state_path = Path::new(&args.state);
    let mut state = CrawlState::load(state_path)?;
    tracing::info!(seeds = seeds.len(), concurrency = args.concurrency, "crawl starting");

    let changes = crawl(&client, seeds, &mut state, args.concurrency.max(1)).await;
    push(&client, &server, &args.admin_token, &changes).await?;
    state.save(state_path)?;

    tracing::info!(
        put = changes.put.len(),
        removed = changes.removed.len(),
        unchanged = changes.unchanged,
        failed = changes.failed,
        "crawl done"
    );
    Ok(())
}

/// Fetches every seed in parallel and folds the outcomes into `state`.
async fn crawl(client: &Client, seeds: Vec<Url>, state: &mut CrawlState, concurrency: usize) -> Changes {
    let permits = Arc::new(Semaphore::new(concurrency));
    let mut inflight = Vec::with_capacity(seeds.len());
    for url in seeds {
        let client = client.clone();
        let permits = Arc::clone(&permits);
        let saved = state.etag(url.as_str()).map(str::to_string);
        inflight.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await;
            let outcome = fetch_conditional(&client, &url, saved.as_deref()).await;
            (url, outcome)
        }));
    }

    let mut changes = Changes::default();
    for handle in inflight {
        let (url, outcome) = match handle.await {
            Ok(done) => done,
            Err(err) => {
                tracing::warn!(%err, "fetch task failed");
                changes.failed += 1;
                continue;
            }
        };
        apply(&mut changes, state, url.as_str(), outcome);
    }
    changes.settle(state);
    changes
}

fn apply(changes: &mut Changes, state: &mut CrawlState, url: &str, outcome: Result<Fetched>) {
    match outcome {
        Ok(Fetched::Modified { body, etag }) => match serde_json::from_slice::<Package>(&body) {
            Ok(pkg) if !pkg.import_path.is_empty() => {
                let fetched_at = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
                if let Some(prev) = state.entries.get(url) {
                    if prev.import_path != pkg.import_path {
                        changes.removed.push(prev.import_path.clone());
                    }
                }
                state.entries.insert(url.to_string(), Entry { etag, import_path: pkg.import_path.clone(), fetched_at });
                changes.put.push(pkg);
            }
            Ok(_) => {
                tracing::warn!(url, "record has no import path");
                changes.failed += 1;
            }
            Err(err) => {
                tracing::warn!(url, %err, "record is not a package");
                changes.failed += 1;
            }
        },
        Ok(Fetched::NotModified) => {
            tracing::debug!(url, "not modified");
            changes.unchanged += 1;
        }
        Ok(Fetched::Gone) => {
            if let Some(prev) = state.entries.remove(url) {
                tracing::info!(url, import_path = %prev.import_path, "package gone upstream");
                changes.removed.push(prev.import_path);
            }
        }
        Err(err) => {
            tracing::warn!(url, %err, "fetch failed");
            changes.failed += 1;
        }
    }
}

async fn push(client: &Client, server: &Url, token: &str, changes: &Changes) -> Result<()> {
    if !changes.put.is_empty() {
        let resp = client
            .post(server.join("index/batch")?)
            .header("X-ADMIN-TOKEN", token)
            .json(&changes.put)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            return Err(anyhow!("index/batch -> {status}: {}", resp.text().await.unwrap_or_default()));
        }
    }
    for path in &changes.removed {
        let resp = client
            .delete(server.join(&format!("pkg/{path}"))?)
            .header("X-ADMIN-TOKEN", token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(anyhow!("remove {path} -> {}", resp.status()));
        }
    }
    Ok(())
}

fn read_seeds(path: &Path) -> Result<Vec<Url>> {
    let mut seeds = Vec::new();
    for line in BufReader::new(File::open(path)?).lines() {
        let s = line?.trim().to_string();
        if s.is_empty() || s.starts_with('#') { continue; }
        let u = Url::parse(&s).or_else(|_| Url::parse(&format!("https://{}", s)));
        match u {
            Ok(u) => seeds.push(u),
            Err(err) => tracing::warn!(seed = %s, %err, "skipping seed"),
        }
    }
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn modified(json: &str) -> Result<Fetched> {
        Ok(Fetched::Modified { body: json.as_bytes().to_vec(), etag: "e1".into() })
    }

    #[test]
    fn seeds_skip_comments_and_default_scheme() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("seeds.txt");
        fs::write(&file, "# records\nhttps://a.example/strconv.json\n\nb.example/oauth.json\n").unwrap();
        let seeds = read_seeds(&file).unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[1].as_str(), "https://b.example/oauth.json");
    }

    #[test]
    fn modified_record_is_put_and_remembered() {
        let mut state = CrawlState::default();
        let mut changes = Changes::default();
        apply(&mut changes, &mut state, "u1", modified(r#"{"import_path":"strconv","name":"strconv"}"#));
        assert_eq!(changes.put.len(), 1);
        assert_eq!(state.etag("u1"), Some("e1"));
        assert_eq!(state.entries["u1"].import_path, "strconv");
    }

    #[test]
    fn moved_record_removes_old_path() {
        let mut state = CrawlState::default();
        let mut changes = Changes::default();
        apply(&mut changes, &mut state, "u1", modified(r#"{"import_path":"old/path","name":"p"}"#));
        apply(&mut changes, &mut state, "u1", modified(r#"{"import_path":"new/path","name":"p"}"#));
        assert_eq!(changes.removed, vec!["old/path".to_string()]);
        assert_eq!(changes.put.len(), 2);
    }

    #[test]
    fn reclaimed_path_is_not_removed() {
        let mut state = CrawlState::default();
        let mut changes = Changes::default();
        apply(&mut changes, &mut state, "u1", modified(r#"{"import_path":"x","name":"x"}"#));
        apply(&mut changes, &mut state, "u1", modified(r#"{"import_path":"y","name":"y"}"#));
        apply(&mut changes, &mut state, "u2", modified(r#"{"import_path":"x","name":"x"}"#));
        assert_eq!(changes.removed, vec!["x".to_string()]);
        changes.settle(&state);
        assert!(changes.removed.is_empty());
        let put: Vec<&str> = changes.put.iter().map(|p| p.import_path.as_str()).collect();
        assert_eq!(put, vec!["x", "y", "x"]);
    }

    #[test]
    fn path_claimed_by_unchanged_seed_is_not_removed() {
        let mut state = CrawlState::default();
        let mut changes = Changes::default();
        apply(&mut changes, &mut state, "u1", modified(r#"{"import_path":"x","name":"x"}"#));
        apply(&mut changes, &mut state, "u2", modified(r#"{"import_path":"x","name":"x"}"#));
        let mut changes = Changes::default();
        apply(&mut changes, &mut state, "u1", Ok(Fetched::Gone));
        apply(&mut changes, &mut state, "u2", Ok(Fetched::NotModified));
        changes.settle(&state);
        assert!(changes.removed.is_empty());
        assert_eq!(changes.unchanged, 1);
    }

    #[test]
    fn gone_removes_known_path_only() {
        let mut state = CrawlState::default();
        let mut changes = Changes::default();
        apply(&mut changes, &mut state, "u1", modified(r#"{"import_path":"strconv","name":"strconv"}"#));
        apply(&mut changes, &mut state, "u1", Ok(Fetched::Gone));
        apply(&mut changes, &mut state, "u2", Ok(Fetched::Gone));
        assert_eq!(changes.removed, vec!["strconv".to_string()]);
        assert!(state.entries.is_empty());
    }

    #[test]
    fn bad_records_and_errors_are_counted() {
        let mut state = CrawlState::default();
        let mut changes = Changes::default();
        apply(&mut changes, &mut state, "u1", modified("not json"));
        apply(&mut changes, &mut state, "u2", modified(r#"{"name":"orphan"}"#));
        apply(&mut changes, &mut state, "u3", Err(anyhow!("example.com: timeout")));
        apply(&mut changes, &mut state, "u4", Ok(Fetched::NotModified));
        assert_eq!(changes.failed, 3);
        assert_eq!(changes.unchanged, 1);
        assert!(changes.put.is_empty());
        assert!(state.entries.is_empty());
    }
}
