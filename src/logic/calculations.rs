use crate::models::WeatherObservation;
use chrono::NaiveDate;
use serde::Serialize;

/// Calculate Growing Degree Days (GDD), °C·day
///
/// Daily mean above the crop's base temperature, summed.
pub fn growing_degree_days(observations: &[WeatherObservation], base_temp_c: f64) -> f64 {
    observations
        .iter()
        .map(|o| (o.mean_temp_c() - base_temp_c).max(0.0))
        .sum()
}

/// Calculate total precipitation over a period
pub fn total_precipitation(observations: &[WeatherObservation]) -> f64 {
    observations
        .iter()
        .map(|o| o.precipitation_mm)
        .filter(|p| *p >= 0.0)
        .sum()
}

pub fn average_temperature(observations: &[WeatherObservation]) -> Option<f64> {
    if observations.is_empty() {
        None
    } else {
        Some(
            observations.iter().map(|o| o.mean_temp_c()).sum::<f64>() / observations.len() as f64,
        )
    }
}

/// Longest run of consecutive days without measurable rain.
pub fn longest_dry_spell(observations: &[WeatherObservation], dry_below_mm: f64) -> u32 {
    let mut longest = 0;
    let mut current = 0;
    for o in observations {
        if o.precipitation_mm < dry_below_mm {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Observations dated within `[from, to]`, sorted by date.
pub fn observations_between(
    observations: &[WeatherObservation],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<WeatherObservation> {
    let mut window: Vec<WeatherObservation> = observations
        .iter()
        .filter(|o| o.date >= from && o.date <= to)
        .cloned()
        .collect();
    window.sort_by_key(|o| o.date);
    window
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: usize,
    pub total_precipitation_mm: f64,
    pub mean_temp_c: Option<f64>,
    pub growing_degree_days: f64,
    pub longest_dry_spell_days: u32,
}

/// GDD base temperature for temperate cereals.
pub const DEFAULT_GDD_BASE_C: f64 = 5.0;
/// Daily rain below this counts as a dry day.
const DRY_DAY_MM: f64 = 1.0;

pub fn summarize(
    observations: &[WeatherObservation],
    from: NaiveDate,
    to: NaiveDate,
    gdd_base_c: f64,
) -> WeatherSummary {
    let window = observations_between(observations, from, to);
    WeatherSummary {
        from,
        to,
        days: window.len(),
        total_precipitation_mm: total_precipitation(&window),
        mean_temp_c: average_temperature(&window),
        growing_degree_days: growing_degree_days(&window, gdd_base_c),
        longest_dry_spell_days: longest_dry_spell(&window, DRY_DAY_MM),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32, tmin: f64, tmax: f64, rain: f64) -> WeatherObservation {
        WeatherObservation::new(
            NaiveDate::from_ymd_opt(2024, 5, d).unwrap(),
            tmin,
            tmax,
            60.0,
            2.0,
            20.0,
        )
        .with_precipitation(rain)
    }

    fn week() -> Vec<WeatherObservation> {
        vec![
            day(3, 10.0, 20.0, 0.0),
            day(1, 2.0, 6.0, 12.0),
            day(2, 8.0, 16.0, 0.5),
            day(4, 12.0, 24.0, 0.0),
            day(5, 11.0, 21.0, 4.0),
        ]
    }

    #[test]
    fn gdd_ignores_days_below_base() {
        // Means: 15, 4, 12, 18, 16
        let gdd = growing_degree_days(&week(), 5.0);
        assert!((gdd - (10.0 + 0.0 + 7.0 + 13.0 + 11.0)).abs() < 1e-9);
    }

    #[test]
    fn precipitation_and_dry_spell() {
        let mut obs = week();
        obs.sort_by_key(|o| o.date);
        assert!((total_precipitation(&obs) - 16.5).abs() < 1e-9);
        assert_eq!(longest_dry_spell(&obs, 1.0), 3);
    }

    #[test]
    fn summary_windows_by_date() {
        let s = summarize(
            &week(),
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
            DEFAULT_GDD_BASE_C,
        );
        assert_eq!(s.days, 3);
        assert!((s.total_precipitation_mm - 0.5).abs() < 1e-9);
        assert!((s.mean_temp_c.unwrap() - 15.0).abs() < 1e-9);
        assert_eq!(s.longest_dry_spell_days, 3);
    }

    #[test]
    fn empty_window_has_no_mean() {
        assert_eq!(average_temperature(&[]), None);
        assert_eq!(longest_dry_spell(&[], 1.0), 0);
    }
}
