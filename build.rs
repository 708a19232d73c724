// build.rs

use std::env;

fn main() -> anyhow::Result<()> {
    build_data::set_BUILD_TIMESTAMP();
    build_data::no_debug_rebuilds();

    let api_port = env::var("API_PORT").unwrap_or_else(|_| "8080".into());
    let store_url = env::var("STORE_URL").unwrap_or_else(|_| "http://localhost:9000".into());
    let feed_url = env::var("FEED_URL")
        .unwrap_or_else(|_| "https://opendata.epa.gov.tw/ws/Data/AQI/?$format=json".into());

    println!("cargo:rustc-env=API_PORT={api_port}");
    println!("cargo:rustc-env=STORE_URL={store_url}");
    println!("cargo:rustc-env=FEED_URL={feed_url}");
    println!("cargo:rerun-if-env-changed=API_PORT");
    println!("cargo:rerun-if-env-changed=STORE_URL");
    println!("cargo:rerun-if-env-changed=FEED_URL");

    Ok(())
}

// EOF
