// payload.rs

use crate::*;

/// What stays in the message body. Site, county, time and position travel
/// as native message fields instead.
#[derive(Debug, Serialize)]
pub struct ReadingBody<'a> {
    #[serde(rename = "AQI")]
    pub aqi: i64,
    #[serde(rename = "Pollutant")]
    pub pollutant: &'a str,
    #[serde(rename = "Status")]
    pub status: &'a str,
}

impl<'a> From<&'a Reading> for ReadingBody<'a> {
    fn from(r: &'a Reading) -> Self {
        ReadingBody {
            aqi: r.aqi,
            pollutant: &r.pollutant,
            status: &r.status,
        }
    }
}

pub fn reduce_payload(reading: &Reading) -> Result<String, AqiError> {
    Ok(serde_json::to_string(&ReadingBody::from(reading))?)
}

/// The part of a published body the query service acts on.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct BodyAqi {
    #[serde(rename = "AQI")]
    pub aqi: i64,
}

pub fn body_aqi(body: &str) -> Result<i64, AqiError> {
    Ok(serde_json::from_str::<BodyAqi>(body)?.aqi)
}


// EOF
