// reading.rs

use chrono::Offset;

use crate::*;

pub const PUBLISH_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub const FIELD_SITE_NAME: &str = "SiteName";
pub const FIELD_COUNTY: &str = "County";
pub const FIELD_AQI: &str = "AQI";
pub const FIELD_POLLUTANT: &str = "Pollutant";
pub const FIELD_STATUS: &str = "Status";
pub const FIELD_PUBLISH_TIME: &str = "PublishTime";
pub const FIELD_LATITUDE: &str = "Latitude";
pub const FIELD_LONGITUDE: &str = "Longitude";

/// A single validated observation from the feed.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    pub site_name: String,
    pub county: String,
    pub aqi: i64,
    /// Dominant pollutant, empty when the site reports none.
    pub pollutant: String,
    pub status: String,
    pub publish_time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Reading {
    /// Parses a raw feed record, reading PublishTime as UTC.
    pub fn from_record(raw: &RawRecord) -> Result<Self, AqiError> {
        Self::from_record_at(raw, &Utc.fix())
    }

    /// Parses a raw feed record whose PublishTime wall clock is in `offset`.
    ///
    /// Numeric and time fields are checked first, then the required text
    /// fields. Absent keys count as empty strings.
    pub fn from_record_at(raw: &RawRecord, offset: &FixedOffset) -> Result<Self, AqiError> {
        let publish_time = parse_publish_time(field(raw, FIELD_PUBLISH_TIME), offset)?;
        let aqi = parse_field::<i64>(raw, FIELD_AQI)?;
        let latitude = parse_field::<f64>(raw, FIELD_LATITUDE)?;
        let longitude = parse_field::<f64>(raw, FIELD_LONGITUDE)?;

        let reading = Reading {
            site_name: field(raw, FIELD_SITE_NAME).to_string(),
            county: field(raw, FIELD_COUNTY).to_string(),
            aqi,
            pollutant: field(raw, FIELD_POLLUTANT).to_string(),
            status: field(raw, FIELD_STATUS).to_string(),
            publish_time,
            latitude,
            longitude,
        };

        if reading.site_name.is_empty() {
            return Err(AqiError::MissingField(FIELD_SITE_NAME));
        }
        if reading.county.is_empty() {
            return Err(AqiError::MissingField(FIELD_COUNTY));
        }
        if reading.status.is_empty() {
            return Err(AqiError::MissingField(FIELD_STATUS));
        }
        Ok(reading)
    }

    pub fn publish_timestamp(&self) -> i64 {
        self.publish_time.timestamp()
    }
}

fn field<'a>(raw: &'a RawRecord, name: &str) -> &'a str {
    raw.get(name).map(String::as_str).unwrap_or("")
}

fn parse_field<T: std::str::FromStr>(raw: &RawRecord, name: &'static str) -> Result<T, AqiError> {
    let s = field(raw, name);
    s.parse::<T>().map_err(|_| AqiError::Parse {
        field: name,
        raw: s.to_string(),
    })
}

// chrono accepts "2024-1-1 1:5" for the same format; the feed never pads less.
fn is_padded_publish_time(s: &str) -> bool {
    s.len() == 16
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            10 => b == b' ',
            13 => b == b':',
            _ => b.is_ascii_digit(),
        })
}

pub fn parse_publish_time(s: &str, offset: &FixedOffset) -> Result<DateTime<Utc>, AqiError> {
    let err = || AqiError::Parse {
        field: FIELD_PUBLISH_TIME,
        raw: s.to_string(),
    };
    if !is_padded_publish_time(s) {
        return Err(err());
    }
    let naive = NaiveDateTime::parse_from_str(s, PUBLISH_TIME_FORMAT).map_err(|_| err())?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(err)
}


// EOF
