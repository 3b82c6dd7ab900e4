use crate::error::{InstallError, Result};
use crate::progress::Stage;

/// Per-stage weights folding stage progress into one overall percentage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageWeights([u8; 6]);

impl Default for StageWeights {
    fn default() -> Self {
        Self([5, 20, 25, 15, 25, 10])
    }
}

impl StageWeights {
    /// Weights are indexed in [`Stage::ALL`] order and must sum to 100.
    pub fn new(weights: [u8; 6]) -> Result<Self> {
        let sum: u32 = weights.iter().map(|w| u32::from(*w)).sum();
        if sum != 100 {
            return Err(InstallError::InvalidWeights(sum));
        }
        Ok(Self(weights))
    }

    pub fn weight(&self, stage: Stage) -> u8 {
        self.0[stage.index()]
    }

    /// Full weight of every earlier stage plus the completed share of `stage`.
    pub fn overall(&self, stage: Stage, stage_percent: f64) -> f64 {
        let pct = stage_percent.clamp(0.0, 100.0);
        let before: u32 = self.0[..stage.index()].iter().map(|w| u32::from(*w)).sum();
        let current = f64::from(self.weight(stage)) * pct / 100.0;
        (f64::from(before) + current).clamp(0.0, 100.0)
    }
}
