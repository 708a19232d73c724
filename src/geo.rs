// geo.rs

use crate::*;

/// Half-height of the search window, degrees latitude.
pub const QUERY_SPAN_LAT: f64 = 0.06;
/// Half-width of the search window, degrees longitude.
pub const QUERY_SPAN_LNG: f64 = 0.35;

/// Center point plus fixed half-spans.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rect {
    #[serde(rename = "CLat")]
    pub c_lat: f64,
    #[serde(rename = "CLng")]
    pub c_lng: f64,
    #[serde(rename = "SLat")]
    pub s_lat: f64,
    #[serde(rename = "SLng")]
    pub s_lng: f64,
}

/// Query or form parameters naming the center of a search.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RectParams {
    #[serde(rename = "CLat")]
    pub c_lat: Option<String>,
    #[serde(rename = "CLng")]
    pub c_lng: Option<String>,
}

impl RectParams {
    /// Collects the center from decoded `key=value` pairs. The first value
    /// of a repeated key wins and unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = RectParams::default();
        for (k, v) in pairs {
            let slot = match k.as_str() {
                "CLat" => &mut params.c_lat,
                "CLng" => &mut params.c_lng,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(v);
            }
        }
        params
    }
}

impl Rect {
    pub fn around(c_lat: f64, c_lng: f64) -> Self {
        Rect {
            c_lat,
            c_lng,
            s_lat: QUERY_SPAN_LAT,
            s_lng: QUERY_SPAN_LNG,
        }
    }

    /// Builds the search window from request parameters. Spans are not
    /// taken from the caller.
    pub fn from_params(params: &RectParams) -> Result<Self, AqiError> {
        let c_lat = parse_coord("CLat", params.c_lat.as_deref())?;
        let c_lng = parse_coord("CLng", params.c_lng.as_deref())?;
        Ok(Rect::around(c_lat, c_lng))
    }

    /// Squared planar distance in degree space, no geodesic correction.
    pub fn sq_distance(&self, lat: f64, lng: f64) -> f64 {
        (lat - self.c_lat).powi(2) + (lng - self.c_lng).powi(2)
    }
}

fn parse_coord(param: &'static str, value: Option<&str>) -> Result<f64, AqiError> {
    let value = value.ok_or_else(|| AqiError::InvalidQuery {
        param,
        reason: "missing".into(),
    })?;
    value.trim().parse::<f64>().map_err(|e| AqiError::InvalidQuery {
        param,
        reason: format!("{value:?}: {e}"),
    })
}

/// The message closest to the center; the first one wins a tie.
pub fn select_nearest<'a>(msgs: &'a [Msg], rect: &Rect) -> Result<&'a Msg, AqiError> {
    let mut iter = msgs.iter();
    let mut best = iter.next().ok_or(AqiError::EmptyResult)?;
    let mut best_dist = rect.sq_distance(best.lat, best.lng);
    for m in iter {
        let d = rect.sq_distance(m.lat, m.lng);
        if d < best_dist {
            best = m;
            best_dist = d;
        }
    }
    Ok(best)
}

/// Orders messages nearest-first. Stable, so equal distances keep their
/// input order.
pub fn sort_nearest(msgs: &mut [Msg], rect: &Rect) {
    msgs.sort_by(|a, b| {
        rect.sq_distance(a.lat, a.lng)
            .total_cmp(&rect.sq_distance(b.lat, b.lng))
    });
}


// EOF
