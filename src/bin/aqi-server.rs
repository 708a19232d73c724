// bin/aqi-server.rs

use std::path::PathBuf;

use aqirelay::*;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, about = "Serve the nearest air quality reading and drive the indicator")]
struct Opts {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    port: Option<u16>,

    #[arg(long)]
    store_url: Option<String>,

    #[arg(long)]
    static_dir: Option<String>,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let opts = Opts::parse();
    info!("aqi-server {VERSION} starting up.");

    let mut config = MyConfig::load(opts.config.as_deref())?;
    if let Some(p) = opts.port {
        config.port = p;
    }
    if let Some(u) = opts.store_url {
        config.store_url = u;
    }
    if let Some(d) = opts.static_dir {
        config.static_dir = d;
    }
    info!("My config:\n{config:#?}");

    let querier: Arc<dyn GeoQuerier> = Arc::new(StoreClient::new(&config.store_url)?);
    let actuator = open_actuator(&config)?;
    let state = Arc::new(MyState::new(config, querier, actuator.clone()));

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async move {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Cannot listen for ctrl-c: {e}");
                    std::future::pending::<()>().await;
                }
                info!("Termination signal received!");
            };
            run_api_server(state, shutdown).await
        })?;

    info!("Clearing indicator.");
    actuator.clear()?;
    info!("Exiting");
    Ok(())
}

#[cfg(feature = "hardware")]
fn open_actuator(config: &MyConfig) -> anyhow::Result<Arc<dyn Actuator>> {
    Ok(Arc::new(sysfs_actuator(config.normal_pin, config.alert_pin)?))
}

#[cfg(not(feature = "hardware"))]
fn open_actuator(config: &MyConfig) -> anyhow::Result<Arc<dyn Actuator>> {
    warn!(
        "Built without hardware support, gpio {} / {} are not driven",
        config.normal_pin, config.alert_pin
    );
    Ok(Arc::new(LogActuator::default()))
}

// EOF
