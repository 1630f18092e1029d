//! Sample-rate selection and the tick clock derived from it.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

const NS_PER_SEC: u64 = 1_000_000_000;

/// Rates the Screamer/AWACS codec can be clocked at, ascending.
pub const SUPPORTED_RATES_HZ: [u32; 8] = [7350, 8820, 11025, 14700, 17640, 22050, 29400, 44100];

pub const DEFAULT_RATE_HZ: u32 = 44_100;

/// A sample rate the codec actually supports.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SampleRate(u32);

impl SampleRate {
    pub const DEFAULT: Self = Self(DEFAULT_RATE_HZ);

    /// Clamp an arbitrary request to the closest supported rate. Ties go to the lower rate.
    pub fn nearest(hz: u32) -> Self {
        let mut best = SUPPORTED_RATES_HZ[0];
        for rate in SUPPORTED_RATES_HZ {
            if rate.abs_diff(hz) < best.abs_diff(hz) {
                best = rate;
            }
        }
        Self(best)
    }

    pub fn hz(self) -> u32 {
        self.0
    }

    /// Nanoseconds between ticks, rounded to nearest.
    pub fn tick_interval_ns(self) -> u64 {
        let hz = u64::from(self.0);
        (NS_PER_SEC + hz / 2) / hz
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for SampleRate {
    type Error = ConfigurationError;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        if SUPPORTED_RATES_HZ.contains(&hz) {
            Ok(Self(hz))
        } else {
            Err(ConfigurationError::UnsupportedSampleRate {
                requested: hz,
                nearest: Self::nearest(hz).0,
            })
        }
    }
}

impl From<SampleRate> for u32 {
    fn from(rate: SampleRate) -> Self {
        rate.0
    }
}

/// Converts guest time into a whole number of frames, carrying the remainder.
///
/// `frac_fp` holds the sub-frame remainder scaled by 1e9 so no time is lost
/// between calls, regardless of how irregularly the host polls.
#[derive(Debug, Clone)]
pub struct FrameClock {
    rate: SampleRate,
    last_ns: u64,
    frac_fp: u64,
}

impl FrameClock {
    pub fn new(rate: SampleRate, start_ns: u64) -> Self {
        Self {
            rate,
            last_ns: start_ns,
            frac_fp: 0,
        }
    }

    pub fn rate(&self) -> SampleRate {
        self.rate
    }

    pub fn last_ns(&self) -> u64 {
        self.last_ns
    }

    /// Sub-frame remainder carried into the next advance, scaled by 1e9.
    pub fn frac_fp(&self) -> u64 {
        self.frac_fp
    }

    /// Advance to `now_ns`, returning the frames that elapsed. Time going backwards yields 0.
    pub fn advance_to(&mut self, now_ns: u64) -> u64 {
        if now_ns <= self.last_ns {
            return 0;
        }
        let elapsed = u128::from(now_ns - self.last_ns);
        let total = elapsed * u128::from(self.rate.hz()) + u128::from(self.frac_fp);
        self.last_ns = now_ns;
        self.frac_fp = (total % u128::from(NS_PER_SEC)) as u64;
        u64::try_from(total / u128::from(NS_PER_SEC)).unwrap_or(u64::MAX)
    }

    /// Switch rate from the current anchor onwards; the partial frame is dropped.
    pub fn set_rate(&mut self, rate: SampleRate) {
        if rate != self.rate {
            self.rate = rate;
            self.frac_fp = 0;
        }
    }
}
