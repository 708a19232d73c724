// config.rs

use std::{fs, path::Path};

use crate::*;

const DEFAULT_API_PORT: u16 = 8080;
const DEFAULT_APP_ID: &str = "16Qao77TJqiey";
const DEFAULT_USER_ID: &str = "12NPDF4sASbe4";
const DEFAULT_NORMAL_PIN: u64 = 10;
const DEFAULT_ALERT_PIN: u64 = 11;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MyConfig {
    pub port: u16,

    pub store_url: String,
    pub store_token: String,
    pub app_id: String,
    pub user_id: String,

    pub feed_url: String,
    pub feed_utc_offset_hours: i32,
    pub on_error: BatchMode,

    pub normal_pin: u64,
    pub alert_pin: u64,
    pub static_dir: String,
}

impl Default for MyConfig {
    fn default() -> Self {
        Self {
            port: option_env!("API_PORT")
                .unwrap_or("-")
                .parse()
                .unwrap_or(DEFAULT_API_PORT),

            store_url: option_env!("STORE_URL")
                .unwrap_or("http://localhost:9000")
                .into(),
            store_token: String::new(),
            app_id: DEFAULT_APP_ID.into(),
            user_id: DEFAULT_USER_ID.into(),

            feed_url: option_env!("FEED_URL")
                .unwrap_or("https://opendata.epa.gov.tw/ws/Data/AQI/?$format=json")
                .into(),
            feed_utc_offset_hours: 0,
            on_error: BatchMode::AbortOnError,

            normal_pin: DEFAULT_NORMAL_PIN,
            alert_pin: DEFAULT_ALERT_PIN,
            static_dir: "static".into(),
        }
    }
}

impl MyConfig {
    /// Reads a JSON config file. Keys left out keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        info!("Reading config from {}", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        let config = serde_json::from_str::<MyConfig>(&text)
            .with_context(|| format!("Cannot parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Defaults, or the file contents when a path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Offset the feed's wall-clock PublishTime is expressed in.
    pub fn feed_offset(&self) -> anyhow::Result<FixedOffset> {
        match FixedOffset::east_opt(self.feed_utc_offset_hours * 3600) {
            Some(o) => Ok(o),
            None => bail!(
                "Feed UTC offset out of range: {} hours",
                self.feed_utc_offset_hours
            ),
        }
    }
}


// EOF
