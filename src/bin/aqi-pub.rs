// bin/aqi-pub.rs

use std::{fs, path::PathBuf};

use aqirelay::*;
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};

#[derive(Debug, Parser)]
#[command(version, about = "Republish open-data air quality readings to the message store")]
struct Opts {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Message store user token
    #[arg(long, env = "STORE_TOKEN", hide_env_values = true)]
    store_token: Option<String>,

    #[arg(long)]
    store_url: Option<String>,

    #[arg(long)]
    feed_url: Option<String>,

    /// Read the feed document from a file instead of fetching it
    #[arg(long)]
    input: Option<PathBuf>,

    /// Seed for the ordering-key jitter; a fixed seed replays a run exactly
    #[arg(long, default_value_t = 0)]
    random_seed: u64,

    #[arg(long, value_enum)]
    on_error: Option<BatchMode>,

    /// Log messages instead of publishing them
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let opts = Opts::parse();
    info!("aqi-pub {VERSION} starting up.");

    let mut config = MyConfig::load(opts.config.as_deref())?;
    if let Some(t) = opts.store_token {
        config.store_token = t;
    }
    if let Some(u) = opts.store_url {
        config.store_url = u;
    }
    if let Some(u) = opts.feed_url {
        config.feed_url = u;
    }
    if let Some(m) = opts.on_error {
        config.on_error = m;
    }
    debug!("My config:\n{config:#?}");

    let offset = config.feed_offset()?;
    let (input, seed, dry_run) = (opts.input, opts.random_seed, opts.dry_run);

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async move {
            let records = match &input {
                Some(path) => {
                    info!("Reading feed from {}", path.display());
                    let text = fs::read_to_string(path)
                        .with_context(|| format!("Cannot read {}", path.display()))?;
                    records_from_json(&text)?
                }
                None => {
                    let client = reqwest::Client::new();
                    fetch_records(&client, &config.feed_url).await?
                }
            };

            let mut rng = StdRng::seed_from_u64(seed);
            let report = if dry_run {
                let publisher = DryRunPublisher::default();
                Ingester::new(&publisher, &config.store_token)
                    .with_offset(offset)
                    .with_mode(config.on_error)
                    .run(&records, &mut rng)
                    .await?
            } else {
                if config.store_token.is_empty() {
                    bail!("No store token given, use --store-token or STORE_TOKEN");
                }
                let publisher = StoreClient::new(&config.store_url)?;
                Ingester::new(&publisher, &config.store_token)
                    .with_offset(offset)
                    .with_mode(config.on_error)
                    .run(&records, &mut rng)
                    .await?
            };

            info!(
                "Published {} of {} records, {} skipped.",
                report.published,
                records.len(),
                report.skipped
            );
            Ok::<(), anyhow::Error>(())
        })
}

// EOF
