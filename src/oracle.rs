// Price Oracle Integration
//
// This module abstracts where the settlement engine gets its price observation.
// The engine is agnostic to whether samples come from Chainlink, Pyth or a
// custom feed. It only ever asks for the latest sample, and only at two moments:
// when a barrier contract is constructed and when any contract is resolved.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{Price, Timestamp};

/// Round identifier reported by the feed
pub type SampleId = u64;

/// A single timestamped observation from the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSample {
    pub sample_id: SampleId,
    pub price: Price,
    pub sample_time: Timestamp,
}

impl PriceSample {
    pub fn new(sample_id: SampleId, price: Price, sample_time: Timestamp) -> Self {
        Self {
            sample_id,
            price,
            sample_time,
        }
    }
}

/// Errors that can occur while reading the feed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("oracle has not published a sample yet")]
    NoSample,

    #[error("oracle reported a non-positive price {raw} in sample {sample_id}")]
    InvalidPrice { sample_id: SampleId, raw: Decimal },

    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can report the latest price sample.
pub trait PriceOracle: Send + Sync {
    fn latest_sample(&self) -> Result<PriceSample, OracleError>;
}

/// In-memory feed for tests and simulations. Samples are pushed by hand, the
/// way a mock aggregator contract has its round data set directly.
#[derive(Debug, Default)]
pub struct MockOracle {
    current: Mutex<Option<PriceSample>>,
    failure: Mutex<Option<String>>,
    reads: AtomicU64,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(price: Price) -> Self {
        let oracle = Self::new();
        oracle.set_sample(PriceSample::new(0, price, Timestamp::from_millis(0)));
        oracle
    }

    pub fn set_sample(&self, sample: PriceSample) {
        *self.current.lock() = Some(sample);
    }

    /// Publish a raw price. non-positive values are rejected and the feed keeps its last sample.
    pub fn set_raw(&self, sample_id: SampleId, raw: Decimal, sample_time: Timestamp) -> Result<(), OracleError> {
        let price = Price::new(raw).ok_or(OracleError::InvalidPrice { sample_id, raw })?;
        self.set_sample(PriceSample::new(sample_id, price, sample_time));
        Ok(())
    }

    /// Publish a new price as the next round.
    pub fn push_price(&self, price: Price, sample_time: Timestamp) -> PriceSample {
        let mut current = self.current.lock();
        let sample_id = current.map(|s| s.sample_id + 1).unwrap_or(0);
        let sample = PriceSample::new(sample_id, price, sample_time);
        *current = Some(sample);
        sample
    }

    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock() = Some(reason.into());
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    /// How many times the feed has been read.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl PriceOracle for MockOracle {
    fn latest_sample(&self) -> Result<PriceSample, OracleError> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = self.failure.lock().as_ref() {
            return Err(OracleError::Unavailable(reason.clone()));
        }

        self.current.lock().ok_or(OracleError::NoSample)
    }
}
