//! FAO-56 four-phase crop coefficient curve.

use crate::models::{CropPhase, GrowingSeasonProfile};

/// Linear ramp from `start` to `end` across a phase. A zero-length phase has
/// no interior, so it resolves straight to the next phase's start value.
fn interpolate(start: f64, end: f64, offset: f64, length: u32) -> f64 {
    if length == 0 {
        return end;
    }
    let fraction = (offset / length as f64).clamp(0.0, 1.0);
    start + fraction * (end - start)
}

/// Crop coefficient `days_after_planting` days into the season.
pub fn kc(days_after_planting: f64, profile: &GrowingSeasonProfile) -> f64 {
    let phases = profile.phases();
    let coeffs = profile.coefficients();

    let ini = phases.initial as f64;
    let dev_end = ini + phases.development as f64;
    let mid_end = dev_end + phases.mid as f64;
    let total = profile.total_growth_period() as f64;

    if days_after_planting >= total {
        coeffs.kc_end
    } else if days_after_planting <= ini {
        coeffs.kc_initial
    } else if days_after_planting <= dev_end {
        interpolate(
            coeffs.kc_initial,
            coeffs.kc_mid,
            days_after_planting - ini,
            phases.development,
        )
    } else if days_after_planting <= mid_end {
        coeffs.kc_mid
    } else {
        interpolate(
            coeffs.kc_mid,
            coeffs.kc_end,
            days_after_planting - mid_end,
            phases.late,
        )
    }
}

pub fn kc_on_day(days_after_planting: i64, profile: &GrowingSeasonProfile) -> f64 {
    kc(days_after_planting as f64, profile)
}

/// FAO-56 phase for a day offset. Day 0 (planting day) is `Initial`.
pub fn crop_phase(days_after_planting: i64, profile: &GrowingSeasonProfile) -> CropPhase {
    if days_after_planting < 0 {
        return CropPhase::PreSowing;
    }

    let phases = profile.phases();
    let d = days_after_planting as u64;
    let ini = phases.initial as u64;
    let dev_end = ini + phases.development as u64;
    let mid_end = dev_end + phases.mid as u64;
    let total = profile.total_growth_period() as u64;

    if d >= total {
        CropPhase::Harvest
    } else if d < ini {
        CropPhase::Initial
    } else if d < dev_end {
        CropPhase::Development
    } else if d < mid_end {
        CropPhase::MidSeason
    } else {
        CropPhase::LateSeason
    }
}
