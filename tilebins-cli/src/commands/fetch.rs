//! `fetch` command: fetch a viewport's tiles and print their bins.
//!
//! Bins are written to stdout as one JSON object per line, in tile key order.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::info;

use tilebins::bins::BinRecord;
use tilebins::config::ClientConfig;
use tilebins::coord::{TileCoord, TileKey};
use tilebins::coordinator::{TileDataCoordinator, TileReadyCallback};
use tilebins::iterator::TileIterator;
use tilebins::transport::{AsyncReqwestClient, FetchContext, RestTransport};

use super::common::RegionArgs;
use crate::error::CliError;

/// Poll interval while waiting for outstanding fetches.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Arguments for `fetch`.
#[derive(Debug, Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub region: RegionArgs,

    /// Tile service root (default from config)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Layer to fetch (default from config)
    #[arg(long)]
    pub layer: Option<String>,

    /// Per-request timeout in seconds (default from config)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Send the enumerated tile set instead of the viewport bounds
    #[arg(long)]
    pub tile_set: bool,

    /// Extra query parameter, KEY=VALUE; may be repeated
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

impl FetchArgs {
    fn apply(&self, client: ClientConfig) -> Result<ClientConfig, CliError> {
        let mut client = self.region.apply(client)?;
        if let Some(url) = &self.base_url {
            client = client.with_base_url(url.clone());
        }
        if let Some(layer) = &self.layer {
            client = client.with_layer(layer.clone());
        }
        if let Some(secs) = self.timeout {
            if secs == 0 {
                return Err(CliError::Usage("--timeout must be positive".to_string()));
            }
            client = client.with_timeout_secs(secs);
        }
        Ok(client)
    }

    fn context(
        &self,
        client: &ClientConfig,
        tiles: &[TileCoord],
    ) -> Result<FetchContext, CliError> {
        let context = if self.tile_set {
            FetchContext::tile_set(tiles.iter().copied())
        } else {
            let pyramid = client.pyramid.create()?;
            let iterator = TileIterator::with_bin_counts(
                pyramid.as_ref(),
                self.region.level,
                (self.region.min_x, self.region.min_y),
                (self.region.max_x, self.region.max_y),
                client.bins,
            )?;
            FetchContext::bounds(iterator.bounds())
        };

        Ok(self
            .params
            .iter()
            .fold(context, |ctx, (k, v)| ctx.with_param(k.clone(), v.clone())))
    }
}

fn parse_param(text: &str) -> Result<(String, String), String> {
    match text.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", text)),
    }
}

/// Run the fetch command.
pub fn run(args: FetchArgs, client: ClientConfig) -> Result<(), CliError> {
    let client = args.apply(client)?;
    let tiles = args.region.enumerate(&client)?;
    let context = args.context(&client, &tiles)?;

    if tiles.is_empty() {
        info!("Viewport covers no tiles");
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let bins = runtime.block_on(fetch_bins(&client, tiles, context))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for record in &bins {
        let line = serde_json::to_string(record)
            .map_err(|e| CliError::Output(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        writeln!(out, "{}", line).map_err(CliError::Output)?;
    }
    Ok(())
}

async fn fetch_bins(
    client: &ClientConfig,
    tiles: Vec<TileCoord>,
    context: FetchContext,
) -> Result<Vec<BinRecord<Value>>, CliError> {
    let http = AsyncReqwestClient::with_timeout(client.server.timeout_secs)?;
    let transport = Arc::new(RestTransport::<_, Value>::new(
        http,
        client.server.base_url.clone(),
        client.server.layer.clone(),
        Handle::current(),
    ));
    let coordinator = TileDataCoordinator::<Value>::new(client.pyramid.create()?, transport);

    let on_ready: TileReadyCallback = Arc::new(|key: &TileKey| {
        info!(tile = %key, "Tile ready");
    });
    let summary = coordinator.request_tiles(tiles, context, on_ready);
    info!(
        tiles = summary.requested(),
        fetches = summary.fetched.len(),
        "Fetching tiles"
    );

    // Gaps and failures fire no callback, so wait on the pending set.
    let wait = tokio::time::timeout(client.timeout() + Duration::from_secs(1), async {
        while coordinator.pending_count() > 0 {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await;

    coordinator.log_stats();
    if wait.is_err() {
        return Err(CliError::Timeout {
            pending: coordinator.pending_count(),
        });
    }

    Ok(coordinator.get_all_resident_bins())
}
