pub mod serpapi;

use async_trait::async_trait;
use std::sync::Arc;

use crate::cli::Args;
use crate::errors::ChatError;
use self::serpapi::SerpApiClient;

/// Seam for the hosted web-search API: one query string in, one best-effort
/// answer out.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<String, ChatError>;
}

pub fn new_provider(args: &Args) -> Arc<dyn SearchProvider> {
    Arc::new(SerpApiClient::new(
        args.search_api_key.clone(),
        args.search_base_url.clone(),
        args.search_engine.clone(),
    ))
}
