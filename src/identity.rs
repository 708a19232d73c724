// identity.rs

use rand::Rng;

use crate::*;

/// UTC layout of the publish time inside a custom id.
pub const CUSTOM_ID_TIME_FORMAT: &str = "%Y%m%d_%H%M";

/// Whole seconds of jitter; the fraction below adds up to one more.
pub const ORDERING_JITTER_SECS: u32 = 60 * 60 - 1;

/// Store-facing identity of one reading.
#[derive(Clone, Debug, PartialEq)]
pub struct Identity {
    /// Deduplication key: County + SiteName + YYYYMMDD_HHMM.
    pub custom_id: String,
    /// Sort key: publish time plus random jitter inside the publish hour.
    pub ordering_key: f64,
}

pub fn custom_id(reading: &Reading) -> Result<String, AqiError> {
    let id = format!(
        "{}{}{}",
        reading.county,
        reading.site_name,
        reading.publish_time.format(CUSTOM_ID_TIME_FORMAT)
    );
    if id.is_empty() {
        return Err(AqiError::EmptyIdentity {
            site: reading.site_name.clone(),
            county: reading.county.clone(),
        });
    }
    Ok(id)
}

/// Readings sharing a coarse publish time must not collide in the store's
/// sort index, so the key is spread over `[ts, ts + 3600)`.
pub fn ordering_key<R: Rng + ?Sized>(reading: &Reading, rng: &mut R) -> f64 {
    let secs = rng.gen_range(0..ORDERING_JITTER_SECS);
    let frac = rng.gen::<f64>();
    jittered_key(reading.publish_timestamp(), secs, frac)
}

/// `secs` below `ORDERING_JITTER_SECS`, `frac` in `[0, 1)`.
fn jittered_key(ts: i64, secs: u32, frac: f64) -> f64 {
    let mut key = ts as f64;
    key += f64::from(secs);
    key += frac;
    key
}

pub fn derive_identity<R: Rng + ?Sized>(reading: &Reading, rng: &mut R) -> Result<Identity, AqiError> {
    Ok(Identity {
        ordering_key: ordering_key(reading, rng),
        custom_id: custom_id(reading)?,
    })
}


// EOF
