//! Fire-weather index derivation (simplified Canadian FWI chain).
//!
//! Pure and pointwise. No clamping here: extreme inputs may yield negative or
//! very large values, interpretation happens in `risk` and `severity`.

use crate::models::{FireIndices, WeatherSample};

/// FFMC = 59.5 * (250 - RH) / (147.2 + T)
pub fn ffmc(temperature_c: f64, relative_humidity: f64) -> f64 {
    59.5 * (250.0 - relative_humidity) / (147.2 + temperature_c)
}

/// ISI = 0.208 * Wind * (1 - e^(-0.98 * FFMC))
pub fn isi(wind_kmh: f64, ffmc: f64) -> f64 {
    0.208 * wind_kmh * (1.0 - (-0.98 * ffmc).exp())
}

/// FWI = ISI * 1.5
pub fn fwi(isi: f64) -> f64 {
    isi * 1.5
}

pub fn compute_indices(weather: &WeatherSample) -> FireIndices {
    let ffmc = ffmc(weather.temperature_c, weather.relative_humidity);
    let isi = isi(weather.wind_kmh, ffmc);
    FireIndices {
        ffmc,
        isi,
        fwi: fwi(isi),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_values_hot_dry_windy() {
        let ix = compute_indices(&WeatherSample::new(35.0, 20.0, 25.0, 0.0));
        assert!((ix.ffmc - 75.109_769_484_083_43).abs() < 1e-9, "{ix:?}");
        assert!((ix.isi - 5.2).abs() < 1e-9, "{ix:?}");
        assert!((ix.fwi - 7.8).abs() < 1e-9, "{ix:?}");
    }

    #[test]
    fn golden_values_safe_default() {
        let ix = compute_indices(&WeatherSample::SAFE_DEFAULT);
        assert!((ix.ffmc - 67.155_756_207_674_95).abs() < 1e-9);
        assert!((ix.isi - 2.08).abs() < 1e-9);
        assert!((ix.fwi - 3.12).abs() < 1e-9);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let w = WeatherSample::new(41.3, 12.5, 33.0, 0.2);
        let a = compute_indices(&w);
        let b = compute_indices(&w);
        assert_eq!(a, b);
    }

    #[test]
    fn no_clamping_on_extreme_inputs() {
        // RH above 250 drives FFMC negative, which then makes ISI negative.
        let ix = compute_indices(&WeatherSample::new(20.0, 300.0, 10.0, 0.0));
        assert!(ix.ffmc < 0.0);
        assert!(ix.isi < 0.0);
        assert!(ix.fwi < 0.0);
    }
}
