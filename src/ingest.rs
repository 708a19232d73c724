// ingest.rs

use chrono::Offset;
use rand::Rng;

use crate::*;

/// What a batch does when one record fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BatchMode {
    /// Stop at the first failure; nothing after it is published.
    #[default]
    AbortOnError,
    /// Log the failure, count it and go on with the next record.
    SkipAndContinue,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub published: usize,
    pub skipped: usize,
}

/// Turns a reading into the message the store receives.
pub fn build_msg<R: Rng + ?Sized>(reading: &Reading, rng: &mut R) -> Result<NewMsg, AqiError> {
    let identity = derive_identity(reading, rng)?;
    let body = reduce_payload(reading)?;
    Ok(NewMsg {
        body,
        lat: reading.latitude,
        lng: reading.longitude,
        sort_key: identity.ordering_key,
        custom_id: identity.custom_id,
    })
}

/// Sequential single pass over one fetched batch.
pub struct Ingester<'a, P: ?Sized> {
    pub publisher: &'a P,
    pub token: &'a str,
    pub offset: FixedOffset,
    pub mode: BatchMode,
}

impl<'a, P: Publisher + ?Sized> Ingester<'a, P> {
    pub fn new(publisher: &'a P, token: &'a str) -> Self {
        Ingester {
            publisher,
            token,
            offset: Utc.fix(),
            mode: BatchMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: BatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    async fn publish_one<R: Rng + ?Sized>(&self, raw: &RawRecord, rng: &mut R) -> Result<Msg, AqiError> {
        let reading = Reading::from_record_at(raw, &self.offset)?;
        let msg = build_msg(&reading, rng)?;
        self.publisher.publish(self.token, &msg).await
    }

    pub async fn run<R: Rng + ?Sized>(&self, records: &[RawRecord], rng: &mut R) -> Result<IngestReport, AqiError> {
        let mut report = IngestReport::default();
        for (i, raw) in records.iter().enumerate() {
            match self.publish_one(raw, rng).await {
                Ok(msg) => {
                    info!("{i} published {} as {:?}", msg.custom_id, msg.id);
                    report.published += 1;
                }
                Err(e) => match self.mode {
                    BatchMode::AbortOnError => {
                        error!("{i} failed, aborting batch: {e}");
                        return Err(e);
                    }
                    BatchMode::SkipAndContinue => {
                        warn!("{i} skipped: {e}");
                        report.skipped += 1;
                    }
                },
            }
        }
        info!(
            "Batch done: {} published, {} skipped",
            report.published, report.skipped
        );
        Ok(report)
    }
}


// EOF
