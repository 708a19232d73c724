// lib.rs

pub use std::{
    collections::HashMap,
    net,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

pub use anyhow::{anyhow, bail, Context};
pub use async_trait::async_trait;
pub use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
pub use serde::{Deserialize, Serialize};
pub use tracing::*;

mod config;
pub use config::*;

mod error;
pub use error::*;

mod reading;
pub use reading::*;

mod identity;
pub use identity::*;

mod payload;
pub use payload::*;

mod geo;
pub use geo::*;

mod actuator;
pub use actuator::*;

mod store;
pub use store::*;

mod feed;
pub use feed::*;

mod ingest;
pub use ingest::*;

mod state;
pub use state::*;

mod apiserver;
pub use apiserver::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");

/// One raw observation from the open-data feed, field name to string value.
pub type RawRecord = HashMap<String, String>;

/// Installs the tracing subscriber used by both binaries.
///
/// The filter comes from `RUST_LOG`, falling back to `info`.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// EOF
