//! Daily weather forcing

use serde::{Deserialize, Serialize};

/// Weather for one simulated day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Incoming shortwave radiation (MJ/m²)
    pub radn: f64,
    /// Maximum air temperature (°C)
    pub max_t: f64,
    /// Minimum air temperature (°C)
    pub min_t: f64,
    /// Rainfall (mm)
    pub rain: f64,
    /// Vapour pressure (hPa)
    pub vp: f64,
    /// Air pressure (hPa)
    pub air_pressure: f64,
    /// Wind speed at the reference height (m/s)
    pub wind: f64,
    /// Site latitude (degrees, south negative)
    pub latitude: f64,
}

impl Default for WeatherSnapshot {
    /// A mild, dry temperate summer day at sea level.
    fn default() -> Self {
        Self {
            radn: 20.0,
            max_t: 30.0,
            min_t: 15.0,
            rain: 0.0,
            vp: 15.0,
            air_pressure: 1010.0,
            wind: 3.0,
            latitude: -27.5,
        }
    }
}

impl WeatherSnapshot {
    /// Temperature weighted 0.75 to the maximum, used by the long wave and
    /// Penman-Monteith terms.
    #[inline]
    pub fn day_weighted_temperature(&self) -> f64 {
        0.75 * self.max_t + 0.25 * self.min_t
    }

    /// Arithmetic mean of minimum and maximum, used by the decoupling factor
    #[inline]
    pub fn mean_temperature(&self) -> f64 {
        (self.min_t + self.max_t) / 2.0
    }

    /// Temperature weighted 0.6 to the maximum, used by soil evaporation
    #[inline]
    pub fn soil_weighted_temperature(&self) -> f64 {
        0.6 * self.max_t + 0.4 * self.min_t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_weightings_differ() {
        let w = WeatherSnapshot {
            max_t: 30.0,
            min_t: 10.0,
            ..WeatherSnapshot::default()
        };
        assert_eq!(w.day_weighted_temperature(), 25.0);
        assert_eq!(w.mean_temperature(), 20.0);
        assert_eq!(w.soil_weighted_temperature(), 22.0);
    }
}
