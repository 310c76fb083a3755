use serde::{Deserialize, Serialize};

/// Lowest temperature (°C) still inside the safety band.
pub const MIN_SAFE_TEMP: f64 = 2.0;
/// Highest temperature (°C) still inside the safety band.
pub const MAX_SAFE_TEMP: f64 = 8.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    InSafeRange,
    BelowMinimum,
    AboveMaximum,
}

impl Verdict {
    pub fn is_alert(self) -> bool {
        !matches!(self, Verdict::InSafeRange)
    }
}

/// Classify a temperature against the inclusive `[2.0, 8.0]` band.
///
/// NaN never lands in the band: it is reported as `AboveMaximum`.
pub fn classify(temperature_c: f64) -> Verdict {
    if temperature_c < MIN_SAFE_TEMP {
        Verdict::BelowMinimum
    } else if temperature_c <= MAX_SAFE_TEMP {
        Verdict::InSafeRange
    } else {
        Verdict::AboveMaximum
    }
}

pub fn is_alert(verdict: Verdict) -> bool {
    verdict.is_alert()
}
