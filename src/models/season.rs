use crate::error::{FieldPlanError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// FAO-56 phase lengths in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseLengths {
    pub initial: u32,
    pub development: u32,
    pub mid: u32,
    pub late: u32,
}

impl PhaseLengths {
    pub fn new(initial: u32, development: u32, mid: u32, late: u32) -> Self {
        Self {
            initial,
            development,
            mid,
            late,
        }
    }

    /// Widened so four `u32` lengths from untrusted input cannot overflow.
    pub fn total(&self) -> u64 {
        [self.initial, self.development, self.mid, self.late]
            .iter()
            .map(|d| u64::from(*d))
            .sum()
    }
}

/// The three characteristic crop coefficients of the FAO-56 curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropCoefficients {
    pub kc_initial: f64,
    pub kc_mid: f64,
    pub kc_end: f64,
}

impl CropCoefficients {
    pub fn new(kc_initial: f64, kc_mid: f64, kc_end: f64) -> Self {
        Self {
            kc_initial,
            kc_mid,
            kc_end,
        }
    }
}

/// Phase/coefficient tuple for a crop type, independent of any planting date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropCoefficientDefinition {
    pub crop_type: String,
    pub growing_duration_days: u32,
    pub phases: PhaseLengths,
    pub coefficients: CropCoefficients,
}

impl CropCoefficientDefinition {
    pub fn into_profile(self, planting_date: NaiveDate) -> Result<GrowingSeasonProfile> {
        GrowingSeasonProfile::new(
            planting_date,
            self.growing_duration_days,
            self.phases,
            self.coefficients,
        )
    }
}

/// Season shape of one crop variety on one field. Validated on construction
/// and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeasonProfile")]
pub struct GrowingSeasonProfile {
    planting_date: NaiveDate,
    growing_duration_days: u32,
    phases: PhaseLengths,
    coefficients: CropCoefficients,
}

#[derive(Deserialize)]
struct RawSeasonProfile {
    planting_date: NaiveDate,
    growing_duration_days: u32,
    phases: PhaseLengths,
    coefficients: CropCoefficients,
}

impl TryFrom<RawSeasonProfile> for GrowingSeasonProfile {
    type Error = FieldPlanError;

    fn try_from(raw: RawSeasonProfile) -> Result<Self> {
        Self::new(
            raw.planting_date,
            raw.growing_duration_days,
            raw.phases,
            raw.coefficients,
        )
    }
}

impl GrowingSeasonProfile {
    pub fn new(
        planting_date: NaiveDate,
        growing_duration_days: u32,
        phases: PhaseLengths,
        coefficients: CropCoefficients,
    ) -> Result<Self> {
        if growing_duration_days == 0 {
            return Err(FieldPlanError::InvalidInput(
                "growing duration must be at least one day".into(),
            ));
        }

        if phases.total() > u64::from(growing_duration_days) {
            return Err(FieldPlanError::InvalidInput(format!(
                "phase lengths sum to {} days, longer than the {}-day growing duration",
                phases.total(),
                growing_duration_days
            )));
        }

        let kcs = [
            coefficients.kc_initial,
            coefficients.kc_mid,
            coefficients.kc_end,
        ];
        if kcs.iter().any(|kc| !kc.is_finite() || *kc < 0.0) {
            return Err(FieldPlanError::InvalidInput(format!(
                "crop coefficients must be finite and non-negative, got {:?}",
                kcs
            )));
        }

        Ok(Self {
            planting_date,
            growing_duration_days,
            phases,
            coefficients,
        })
    }

    pub fn planting_date(&self) -> NaiveDate {
        self.planting_date
    }

    pub fn growing_duration_days(&self) -> u32 {
        self.growing_duration_days
    }

    pub fn growing_duration(&self) -> NonZeroU32 {
        // Construction rejects zero.
        NonZeroU32::new(self.growing_duration_days).unwrap_or(NonZeroU32::MIN)
    }

    pub fn phases(&self) -> PhaseLengths {
        self.phases
    }

    pub fn coefficients(&self) -> CropCoefficients {
        self.coefficients
    }

    /// Sum of the four FAO-56 phase lengths.
    pub fn total_growth_period(&self) -> u32 {
        // Bounded by the growing duration on construction.
        u32::try_from(self.phases.total()).unwrap_or(self.growing_duration_days)
    }

    pub fn days_after_planting(&self, date: NaiveDate) -> i64 {
        (date - self.planting_date).num_days()
    }

    pub fn harvest_date(&self) -> NaiveDate {
        self.planting_date + chrono::Duration::days(self.growing_duration_days as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan_1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn valid_profile() {
        let profile = GrowingSeasonProfile::new(
            jan_1(),
            120,
            PhaseLengths::new(15, 25, 40, 40),
            CropCoefficients::new(0.3, 1.15, 0.5),
        )
        .unwrap();

        assert_eq!(profile.total_growth_period(), 120);
        assert_eq!(profile.growing_duration().get(), 120);
        assert_eq!(
            profile.harvest_date(),
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()
        );
        assert_eq!(
            profile.days_after_planting(NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()),
            10
        );
    }

    #[test]
    fn rejects_zero_duration() {
        let result = GrowingSeasonProfile::new(
            jan_1(),
            0,
            PhaseLengths::new(0, 0, 0, 0),
            CropCoefficients::new(0.3, 1.15, 0.5),
        );
        assert!(matches!(result, Err(FieldPlanError::InvalidInput(_))));
    }

    #[test]
    fn rejects_phases_longer_than_season() {
        let result = GrowingSeasonProfile::new(
            jan_1(),
            100,
            PhaseLengths::new(15, 25, 40, 40),
            CropCoefficients::new(0.3, 1.15, 0.5),
        );
        assert!(result.is_err());
    }

    #[test]
    fn phase_lengths_beyond_u32_are_rejected() {
        let phases = PhaseLengths::new(u32::MAX, 2, 0, 0);
        assert_eq!(phases.total(), u32::MAX as u64 + 2);

        let result = GrowingSeasonProfile::new(
            jan_1(),
            120,
            phases,
            CropCoefficients::new(0.3, 1.15, 0.5),
        );
        assert!(matches!(result, Err(FieldPlanError::InvalidInput(_))));

        let yaml = r#"
planting_date: 2024-01-01
growing_duration_days: 120
phases: { initial: 4294967295, development: 2, mid: 0, late: 0 }
coefficients: { kc_initial: 0.3, kc_mid: 1.15, kc_end: 0.5 }
"#;
        let parsed: std::result::Result<GrowingSeasonProfile, _> = serde_yaml::from_str(yaml);
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_negative_coefficient() {
        let result = GrowingSeasonProfile::new(
            jan_1(),
            120,
            PhaseLengths::new(15, 25, 40, 40),
            CropCoefficients::new(0.3, -1.0, 0.5),
        );
        assert!(result.is_err());
    }

    #[test]
    fn deserialization_validates() {
        let yaml = r#"
planting_date: 2024-01-01
growing_duration_days: 100
phases: { initial: 15, development: 25, mid: 40, late: 40 }
coefficients: { kc_initial: 0.3, kc_mid: 1.15, kc_end: 0.5 }
"#;
        let parsed: std::result::Result<GrowingSeasonProfile, _> = serde_yaml::from_str(yaml);
        assert!(parsed.is_err());

        let yaml = yaml.replace("100", "120");
        let parsed: GrowingSeasonProfile = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.phases().mid, 40);
    }

    #[test]
    fn definition_into_profile() {
        let def = CropCoefficientDefinition {
            crop_type: "maize".into(),
            growing_duration_days: 125,
            phases: PhaseLengths::new(20, 35, 40, 30),
            coefficients: CropCoefficients::new(0.3, 1.2, 0.35),
        };
        let profile = def.into_profile(jan_1()).unwrap();
        assert_eq!(profile.planting_date(), jan_1());
        assert_eq!(profile.total_growth_period(), 125);
    }
}
