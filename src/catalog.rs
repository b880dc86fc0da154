//! Asset catalog: resolves a display symbol to asset identity and
//! decimal-exponent metadata. The registry service itself is external;
//! this module only defines the seam and a JSON-file-backed
//! implementation used by the CLI and tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;

use crate::error::{EncodeError, EncodeResult};
use crate::models::Asset;

#[async_trait]
pub trait AssetCatalog: Send + Sync {
    /// Case-insensitive exact symbol match.
    async fn resolve(&self, symbol: &str) -> Option<Asset>;

    /// Like [`resolve`](Self::resolve), but an unmatched symbol is a
    /// typed error for callers feeding the encoder.
    async fn require(&self, symbol: &str) -> EncodeResult<Asset> {
        self.resolve(symbol)
            .await
            .ok_or_else(|| EncodeError::UnknownAsset(symbol.to_string()))
    }
}

/// In-memory catalog over a fixed asset list.
pub struct StaticCatalog {
    by_symbol: HashMap<String, Asset>,
}

impl StaticCatalog {
    pub fn from_assets(assets: Vec<Asset>) -> Self {
        let by_symbol = assets
            .into_iter()
            .map(|a| (a.symbol.to_lowercase(), a))
            .collect();
        Self { by_symbol }
    }

    /// Load a catalog from a JSON file holding an array of assets.
    pub fn load(path: &str) -> Result<Self> {
        let file =
            File::open(path).map_err(|e| anyhow!("Failed to open asset file {}: {}", path, e))?;
        let reader = BufReader::new(file);
        let assets: Vec<Asset> = serde_json::from_reader(reader)
            .map_err(|e| anyhow!("Failed to parse asset file {}: {}", path, e))?;
        Ok(Self::from_assets(assets))
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

#[async_trait]
impl AssetCatalog for StaticCatalog {
    async fn resolve(&self, symbol: &str) -> Option<Asset> {
        self.by_symbol.get(&symbol.to_lowercase()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> StaticCatalog {
        StaticCatalog::from_assets(vec![
            Asset::new("29ea9c2fbf10b309", "PEN", 6),
            Asset::new("76b301e3a8b1b2b7", "USDY", 6),
        ])
    }

    #[tokio::test]
    async fn test_resolve_case_insensitive() {
        let catalog = catalog();
        let asset = catalog.resolve("pen").await.unwrap();
        assert_eq!(asset.symbol, "PEN");
        assert_eq!(asset.decimals, 6);
        assert!(catalog.resolve("USDy").await.is_some());
    }

    #[tokio::test]
    async fn test_resolve_unknown_symbol() {
        assert!(catalog().resolve("DOGE").await.is_none());
    }

    #[tokio::test]
    async fn test_require_unknown_symbol_is_typed_error() {
        let err = catalog().require("DOGE").await.unwrap_err();
        assert!(matches!(err, EncodeError::UnknownAsset(ref s) if s == "DOGE"));
        assert!(!err.is_precision());
        assert!(catalog().require("pen").await.is_ok());
    }

    #[tokio::test]
    async fn test_no_prefix_match() {
        assert!(catalog().resolve("PE").await.is_none());
        assert!(catalog().resolve("PENX").await.is_none());
    }
}
