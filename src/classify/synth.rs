use rand::Rng;

use super::band::{MAX_SAFE_TEMP, MIN_SAFE_TEMP};

/// Headroom above the band used for synthesized high excursions.
pub const EXCURSION_HEADROOM: f64 = 4.0;

/// Display fallback for readings the store sent without a measured temperature.
///
/// The value only agrees with the alert flag; it is not a measurement.
pub struct TemperatureSynthesizer<R: Rng> {
    rng: R,
}

impl<R: Rng> TemperatureSynthesizer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn synthesize(&mut self, alert_flag: bool) -> f64 {
        synthesize_temperature(&mut self.rng, alert_flag)
    }
}

/// Alerts draw from `[0, 2.0)` or `(8.0, 12.0]` with equal odds; others from `[2.0, 8.0]`.
pub fn synthesize_temperature<R: Rng>(rng: &mut R, alert_flag: bool) -> f64 {
    if !alert_flag {
        return rng.gen_range(MIN_SAFE_TEMP..=MAX_SAFE_TEMP);
    }

    if rng.gen_bool(0.5) {
        rng.gen_range(0.0..MIN_SAFE_TEMP)
    } else {
        // (MAX, MAX + headroom]: mirror a half-open draw so the lower end is excluded.
        MAX_SAFE_TEMP + EXCURSION_HEADROOM - rng.gen_range(0.0..EXCURSION_HEADROOM)
    }
}
