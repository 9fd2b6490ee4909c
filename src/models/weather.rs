use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of weather at a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub date: NaiveDate,
    /// Falls back to the min/max midpoint when absent.
    #[serde(default)]
    pub temp_mean_c: Option<f64>,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub humidity_percent: f64,
    /// Daily humidity extremes, preferred over the mean when both are present.
    #[serde(default)]
    pub humidity_min_percent: Option<f64>,
    #[serde(default)]
    pub humidity_max_percent: Option<f64>,
    /// Wind speed at 2 m height.
    pub wind_speed_ms: f64,
    /// Incoming shortwave radiation, MJ/m²/day.
    pub solar_radiation_mj: f64,
    #[serde(default)]
    pub precipitation_mm: f64,
    #[serde(default)]
    pub pressure_kpa: Option<f64>,
}

impl WeatherObservation {
    pub fn new(
        date: NaiveDate,
        temp_min_c: f64,
        temp_max_c: f64,
        humidity_percent: f64,
        wind_speed_ms: f64,
        solar_radiation_mj: f64,
    ) -> Self {
        Self {
            date,
            temp_mean_c: None,
            temp_min_c,
            temp_max_c,
            humidity_percent,
            humidity_min_percent: None,
            humidity_max_percent: None,
            wind_speed_ms,
            solar_radiation_mj,
            precipitation_mm: 0.0,
            pressure_kpa: None,
        }
    }

    pub fn with_precipitation(mut self, mm: f64) -> Self {
        self.precipitation_mm = mm;
        self
    }

    pub fn with_mean_temp(mut self, celsius: f64) -> Self {
        self.temp_mean_c = Some(celsius);
        self
    }

    pub fn with_humidity_range(mut self, min_percent: f64, max_percent: f64) -> Self {
        self.humidity_min_percent = Some(min_percent);
        self.humidity_max_percent = Some(max_percent);
        self
    }

    pub fn with_pressure(mut self, kpa: f64) -> Self {
        self.pressure_kpa = Some(kpa);
        self
    }

    pub fn mean_temp_c(&self) -> f64 {
        self.temp_mean_c
            .unwrap_or((self.temp_min_c + self.temp_max_c) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_temp_falls_back_to_midpoint() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 6).unwrap();
        let obs = WeatherObservation::new(date, 12.0, 22.0, 70.0, 2.0, 20.0);
        assert!((obs.mean_temp_c() - 17.0).abs() < 1e-9);

        let obs = obs.with_mean_temp(16.5);
        assert!((obs.mean_temp_c() - 16.5).abs() < 1e-9);
    }

    #[test]
    fn optional_fields_default_when_missing() {
        let yaml = r#"
date: 2024-07-06
temp_min_c: 12.3
temp_max_c: 21.5
humidity_percent: 73.5
wind_speed_ms: 2.078
solar_radiation_mj: 22.07
"#;
        let obs: WeatherObservation = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(obs.precipitation_mm, 0.0);
        assert!(obs.pressure_kpa.is_none());
        assert!(obs.humidity_min_percent.is_none());
    }
}
