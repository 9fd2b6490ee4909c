//! FAO-56 Penman-Monteith reference evapotranspiration, daily time step.
//!
//! Equation numbers refer to FAO Irrigation and Drainage Paper 56.

use crate::models::WeatherObservation;
use chrono::Datelike;
use std::f64::consts::PI;

/// Solar constant, MJ/m²/min.
const SOLAR_CONSTANT: f64 = 0.0820;
/// Stefan-Boltzmann constant, MJ/K⁴/m²/day.
const STEFAN_BOLTZMANN: f64 = 4.903e-9;
/// Albedo of the hypothetical grass reference crop.
const REFERENCE_ALBEDO: f64 = 0.23;

/// Atmospheric pressure from elevation, kPa (eq. 7).
pub fn atmospheric_pressure(elevation_m: f64) -> f64 {
    101.3 * ((293.0 - 0.0065 * elevation_m) / 293.0).powf(5.26)
}

/// Psychrometric constant, kPa/°C (eq. 8).
pub fn psychrometric_constant(pressure_kpa: f64) -> f64 {
    0.000665 * pressure_kpa
}

/// Saturation vapour pressure at `temp_c`, kPa (eq. 11).
pub fn saturation_vapour_pressure(temp_c: f64) -> f64 {
    0.6108 * ((17.27 * temp_c) / (temp_c + 237.3)).exp()
}

/// Slope of the saturation vapour pressure curve, kPa/°C (eq. 13).
pub fn vapour_pressure_slope(temp_c: f64) -> f64 {
    4098.0 * saturation_vapour_pressure(temp_c) / (temp_c + 237.3).powi(2)
}

/// Mean saturation and actual vapour pressure, kPa.
///
/// Uses the daily humidity extremes when both are known (eq. 17), otherwise
/// mean relative humidity (eq. 19).
pub fn vapour_pressures(weather: &WeatherObservation) -> (f64, f64) {
    let e_max = saturation_vapour_pressure(weather.temp_max_c);
    let e_min = saturation_vapour_pressure(weather.temp_min_c);
    let es = (e_max + e_min) / 2.0;

    let ea = match (weather.humidity_min_percent, weather.humidity_max_percent) {
        (Some(rh_min), Some(rh_max)) => (e_min * rh_max / 100.0 + e_max * rh_min / 100.0) / 2.0,
        _ => weather.humidity_percent / 100.0 * es,
    };

    (es, ea.min(es))
}

/// Extraterrestrial radiation for a latitude and day of year, MJ/m²/day
/// (eqs. 21-25).
pub fn extraterrestrial_radiation(latitude_deg: f64, day_of_year: u32) -> f64 {
    let j = day_of_year as f64;
    let phi = latitude_deg.to_radians();

    let inverse_distance = 1.0 + 0.033 * (2.0 * PI * j / 365.0).cos();
    let declination = 0.409 * (2.0 * PI * j / 365.0 - 1.39).sin();
    // Polar day/night clamp.
    let sunset_angle = (-phi.tan() * declination.tan()).clamp(-1.0, 1.0).acos();

    24.0 * 60.0 / PI
        * SOLAR_CONSTANT
        * inverse_distance
        * (sunset_angle * phi.sin() * declination.sin()
            + phi.cos() * declination.cos() * sunset_angle.sin())
}

/// Clear-sky radiation, MJ/m²/day (eq. 37).
pub fn clear_sky_radiation(ra: f64, elevation_m: f64) -> f64 {
    (0.75 + 2e-5 * elevation_m) * ra
}

/// Net radiation at the crop surface, MJ/m²/day (eqs. 38-40).
pub fn net_radiation(weather: &WeatherObservation, latitude_deg: f64, elevation_m: f64) -> f64 {
    let ra = extraterrestrial_radiation(latitude_deg, weather.date.ordinal());
    let rso = clear_sky_radiation(ra, elevation_m);
    let rs = weather.solar_radiation_mj.max(0.0);
    let (_, ea) = vapour_pressures(weather);

    let rns = (1.0 - REFERENCE_ALBEDO) * rs;

    let relative_shortwave = if rso > 0.0 {
        (rs / rso).min(1.0)
    } else {
        1.0
    };
    let tmax_k = weather.temp_max_c + 273.16;
    let tmin_k = weather.temp_min_c + 273.16;
    let rnl = STEFAN_BOLTZMANN
        * (tmax_k.powi(4) + tmin_k.powi(4))
        / 2.0
        * (0.34 - 0.14 * ea.max(0.0).sqrt())
        * (1.35 * relative_shortwave - 0.35);

    rns - rnl
}

/// Unclamped Penman-Monteith result (eq. 6), mm/day. May be negative under
/// cold, humid, low-radiation conditions.
pub fn penman_monteith(weather: &WeatherObservation, latitude_deg: f64, elevation_m: f64) -> f64 {
    let pressure = weather
        .pressure_kpa
        .unwrap_or_else(|| atmospheric_pressure(elevation_m));
    let gamma = psychrometric_constant(pressure);
    let t = weather.mean_temp_c();
    let delta = vapour_pressure_slope(t);
    let (es, ea) = vapour_pressures(weather);
    let u2 = weather.wind_speed_ms.max(0.0);
    let rn = net_radiation(weather, latitude_deg, elevation_m);
    // Daily soil heat flux is negligible.
    let g = 0.0;

    let numerator = 0.408 * delta * (rn - g) + gamma * (900.0 / (t + 273.0)) * u2 * (es - ea);
    let denominator = delta + gamma * (1.0 + 0.34 * u2);

    numerator / denominator
}

/// Reference evapotranspiration, mm/day.
///
/// Evapotranspiration cannot be negative: a negative Penman-Monteith value is
/// clamped to zero and logged.
pub fn calculate_et0(weather: &WeatherObservation, latitude_deg: f64, elevation_m: f64) -> f64 {
    let et0 = penman_monteith(weather, latitude_deg, elevation_m);
    if et0 < 0.0 || !et0.is_finite() {
        tracing::debug!(
            date = %weather.date,
            raw_et0 = et0,
            "clamping non-physical ET0 to zero"
        );
        return 0.0;
    }
    et0
}

/// Crop evapotranspiration, mm/day.
pub fn calculate_etc(et0: f64, kc: f64) -> f64 {
    et0 * kc
}
