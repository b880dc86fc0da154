//! Client for the remote book/price query service, plus the concurrent
//! per-direction, per-hop fan-out that feeds the book aggregator.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::book::build_book;
use crate::models::{Book, Trace, TradingPair};

/// Source of routed price levels for one directed pair and hop count.
/// One independent call per direction and hop count; implementations may
/// fail per call, and the caller degrades that hop to empty levels.
#[async_trait]
pub trait LevelSource: Send + Sync {
    async fn query_levels(&self, pair: &TradingPair, hops: u32) -> Result<Vec<Trace>>;
}

pub struct IndexerApi {
    api_url: String,
    client: reqwest::Client,
}

impl IndexerApi {
    pub fn new(api_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            api_url: crate::utils::remove_trailing_slash(api_url),
            client,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn with_client(api_url: &str, client: reqwest::Client) -> Self {
        Self {
            api_url: crate::utils::remove_trailing_slash(api_url),
            client,
        }
    }

    fn build_levels_url(&self, pair: &TradingPair, hops: u32) -> String {
        format!(
            "{}/levels/{}/{}?hops={}",
            self.api_url, pair.start, pair.end, hops
        )
    }

    async fn fetch_levels(&self, pair: &TradingPair, hops: u32) -> Result<Vec<Trace>> {
        let url = self.build_levels_url(pair, hops);
        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(anyhow::anyhow!("rate_limited"));
        }
        let body = response.text().await?;
        let levels: Vec<Trace> = serde_json::from_str(&body)?;
        Ok(levels)
    }
}

#[async_trait]
impl LevelSource for IndexerApi {
    async fn query_levels(&self, pair: &TradingPair, hops: u32) -> Result<Vec<Trace>> {
        crate::utils::retry(3, 500, || self.fetch_levels(pair, hops)).await
    }
}

/// Fetch and aggregate a full two-sided book for `pair`.
///
/// Asks come from the pair as given, bids from the flipped direction.
/// All `2 * max_hops` queries run concurrently and are joined before
/// aggregation; a failed query degrades its hop count to empty levels
/// (logged) instead of aborting the whole book.
pub async fn fetch_book(
    source: Arc<dyn LevelSource>,
    pair: &TradingPair,
    max_hops: u32,
    depth_limit: usize,
) -> Book {
    let mut ask_handles = Vec::with_capacity(max_hops as usize);
    let mut bid_handles = Vec::with_capacity(max_hops as usize);

    for hops in 1..=max_hops {
        let src = Arc::clone(&source);
        let ask_pair = pair.clone();
        ask_handles.push(tokio::spawn(async move {
            (hops, src.query_levels(&ask_pair, hops).await)
        }));

        let src = Arc::clone(&source);
        let bid_pair = pair.flipped();
        bid_handles.push(tokio::spawn(async move {
            (hops, src.query_levels(&bid_pair, hops).await)
        }));
    }

    let asks = join_side("ask", pair, ask_handles).await;
    let bids = join_side("bid", pair, bid_handles).await;

    build_book(asks, bids, depth_limit)
}

async fn join_side(
    side: &str,
    pair: &TradingPair,
    handles: Vec<tokio::task::JoinHandle<(u32, Result<Vec<Trace>>)>>,
) -> Vec<Vec<Trace>> {
    let mut groups = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok((_, Ok(levels))) => groups.push(levels),
            Ok((hops, Err(e))) => {
                warn!(%pair, side, hops, error = %e, "level query failed, degrading hop to empty");
                groups.push(Vec::new());
            }
            Err(e) => {
                warn!(%pair, side, error = %e, "level query task panicked");
                groups.push(Vec::new());
            }
        }
    }
    groups
}
