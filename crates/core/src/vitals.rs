//! Synthetic vital-sign generation.
//!
//! Readings are drawn from fixed distributions keyed on the alert level. In
//! critical mode the heart-rate and systolic ranges are disjoint from the
//! normal ones so the state is unambiguous in the data.

use std::ops::Range;

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::alert::AlertLevel;
use crate::patient::{
    PatientState, BASELINE_HEART_RATE, BASELINE_OXYGEN, BASELINE_SYSTOLIC, BASELINE_TEMPERATURE_F,
};
use crate::types::Timestamp;

/// Critical-mode heart rate range (BPM).
pub const CRITICAL_HEART_RATE: Range<f64> = 130.0..170.0;

/// Critical-mode systolic range (mmHg).
pub const CRITICAL_SYSTOLIC: Range<f64> = 160.0..180.0;

/// Critical-mode oxygen saturation range (%).
pub const CRITICAL_OXYGEN: Range<f64> = 88.0..94.0;

/// Temperature never strays more than this from baseline (°F).
pub const TEMPERATURE_SPREAD_F: f64 = 0.4;

/// Changes smaller than this are reported as a stable trend.
const TREND_DEAD_BAND: f64 = 0.5;

/// One reading per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VitalsSample {
    pub heart_rate: f64,
    pub systolic: f64,
    pub oxygen: f64,
    pub temperature: f64,
}

/// Draws [`VitalsSample`]s.
#[derive(Debug, Clone)]
pub struct VitalsSampler {
    heart_rate: Gaussian,
    systolic: Gaussian,
    oxygen: Gaussian,
    temperature: Gaussian,
}

/// Normal distribution with a fixed mean and spread.
#[derive(Debug, Clone, Copy)]
struct Gaussian {
    mean: f64,
    std_dev: f64,
}

impl Distribution<f64> for Gaussian {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let z: f64 = StandardNormal.sample(rng);
        self.mean + self.std_dev * z
    }
}

impl Default for VitalsSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl VitalsSampler {
    pub fn new() -> Self {
        Self {
            heart_rate: normal(BASELINE_HEART_RATE, 1.2),
            systolic: normal(BASELINE_SYSTOLIC, 1.8),
            oxygen: normal(BASELINE_OXYGEN, 0.5),
            temperature: normal(BASELINE_TEMPERATURE_F, 0.2),
        }
    }

    /// Draw one reading for every channel under `level`.
    ///
    /// Heart rate and systolic are floored to whole numbers, matching how
    /// they are displayed.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, level: AlertLevel) -> VitalsSample {
        let temperature = self.temperature.sample(rng).clamp(
            BASELINE_TEMPERATURE_F - TEMPERATURE_SPREAD_F,
            BASELINE_TEMPERATURE_F + TEMPERATURE_SPREAD_F,
        );

        match level {
            AlertLevel::Critical => VitalsSample {
                heart_rate: rng.random_range(CRITICAL_HEART_RATE).floor(),
                systolic: rng.random_range(CRITICAL_SYSTOLIC).floor(),
                oxygen: rng.random_range(CRITICAL_OXYGEN),
                temperature,
            },
            AlertLevel::Stable | AlertLevel::Warning => VitalsSample {
                heart_rate: self.heart_rate.sample(rng).floor(),
                systolic: self.systolic.sample(rng).floor(),
                oxygen: self.oxygen.sample(rng).min(100.0),
                temperature,
            },
        }
    }
}

fn normal(mean: f64, std_dev: f64) -> Gaussian {
    Gaussian { mean, std_dev }
}

impl PatientState {
    /// Record `sample` on every channel. Diastolic pressure carries over.
    pub fn apply_sample(&mut self, sample: VitalsSample, at: Timestamp) {
        self.heart_rate.record(sample.heart_rate, at, TREND_DEAD_BAND);
        let diastolic = self.blood_pressure.diastolic;
        self.blood_pressure.record(sample.systolic, diastolic, at);
        self.oxygen_level.record(sample.oxygen, at, TREND_DEAD_BAND);
        self.temperature.record(sample.temperature, at, TREND_DEAD_BAND);
    }
}
