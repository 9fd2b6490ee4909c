use crate::error::{FieldPlanError, Result};
use crate::models::{GrowingSeasonProfile, GrowthStage};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Tolerance on progress thresholds, so a date landing exactly on a boundary
/// is not pushed into the next stage by floating-point error.
pub const PROGRESS_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageThreshold {
    pub stage: GrowthStage,
    /// Upper bound (inclusive) of the stage, as a fraction of the season.
    pub progress: f64,
}

/// Ascending progress thresholds mapping season progress to a growth stage.
/// Progress beyond the last threshold is `Harvest`.
///
/// This is the only stage-length table: classification and fertilizer timing
/// both read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StageThreshold>", into = "Vec<StageThreshold>")]
pub struct StageTable {
    thresholds: Vec<StageThreshold>,
}

impl StageTable {
    pub fn new(thresholds: Vec<StageThreshold>) -> Result<Self> {
        if thresholds.is_empty() {
            return Err(FieldPlanError::Config("stage table is empty".into()));
        }

        for pair in thresholds.windows(2) {
            if pair[1].progress <= pair[0].progress {
                return Err(FieldPlanError::Config(format!(
                    "stage thresholds must ascend: {} ({}) follows {} ({})",
                    pair[1].stage, pair[1].progress, pair[0].stage, pair[0].progress
                )));
            }
        }

        for (i, t) in thresholds.iter().enumerate() {
            if !t.progress.is_finite() || t.progress < 0.0 {
                return Err(FieldPlanError::Config(format!(
                    "threshold for {} must be a non-negative number",
                    t.stage
                )));
            }
            if t.stage == GrowthStage::Harvest {
                return Err(FieldPlanError::Config(
                    "Harvest is implied past the last threshold and cannot be listed".into(),
                ));
            }
            if thresholds[..i].iter().any(|prev| prev.stage == t.stage) {
                return Err(FieldPlanError::Config(format!(
                    "stage {} listed twice",
                    t.stage
                )));
            }
        }

        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &[StageThreshold] {
        &self.thresholds
    }

    pub fn stage_for_progress(&self, progress: f64) -> GrowthStage {
        self.thresholds
            .iter()
            .find(|t| progress <= t.progress + PROGRESS_EPSILON)
            .map(|t| t.stage)
            .unwrap_or(GrowthStage::Harvest)
    }

    /// Season fraction at which `stage` begins.
    pub fn onset_fraction(&self, stage: GrowthStage) -> Option<f64> {
        if stage == GrowthStage::Harvest {
            return self.thresholds.last().map(|t| t.progress);
        }
        let idx = self.thresholds.iter().position(|t| t.stage == stage)?;
        Some(if idx == 0 {
            0.0
        } else {
            self.thresholds[idx - 1].progress
        })
    }

    /// Share of the season spent in `stage`. `Harvest` gets whatever the last
    /// threshold leaves short of the full season.
    pub fn fraction_of_season(&self, stage: GrowthStage) -> Option<f64> {
        if stage == GrowthStage::Harvest {
            let last = self.thresholds.last().map(|t| t.progress)?;
            return Some((1.0 - last).max(0.0));
        }
        let end = self.thresholds.iter().find(|t| t.stage == stage)?.progress;
        Some(end - self.onset_fraction(stage)?)
    }

    /// Day offset from sowing at which `stage` begins.
    pub fn onset_day(&self, stage: GrowthStage, growing_duration: NonZeroU32) -> Option<u32> {
        self.onset_fraction(stage)
            .map(|f| (f * growing_duration.get() as f64).round() as u32)
    }
}

impl TryFrom<Vec<StageThreshold>> for StageTable {
    type Error = FieldPlanError;

    fn try_from(thresholds: Vec<StageThreshold>) -> Result<Self> {
        Self::new(thresholds)
    }
}

impl From<StageTable> for Vec<StageThreshold> {
    fn from(table: StageTable) -> Self {
        table.thresholds
    }
}

impl Default for StageTable {
    fn default() -> Self {
        let t = |stage, progress| StageThreshold { stage, progress };
        Self {
            thresholds: vec![
                t(GrowthStage::Sowing, 0.0),
                t(GrowthStage::Germination, 0.1),
                t(GrowthStage::Vegetative, 0.4),
                t(GrowthStage::Flowering, 0.6),
                t(GrowthStage::GrainFilling, 0.85),
                t(GrowthStage::Maturity, 1.0),
            ],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GrowthStageClassifier {
    table: StageTable,
}

impl GrowthStageClassifier {
    pub fn new(table: StageTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &StageTable {
        &self.table
    }

    /// Days before planting count as negative progress and classify as `Sowing`.
    pub fn classify(
        &self,
        planting_date: NaiveDate,
        current_date: NaiveDate,
        growing_duration_days: NonZeroU32,
    ) -> GrowthStage {
        let elapsed_days = (current_date - planting_date).num_days();
        let progress = elapsed_days as f64 / growing_duration_days.get() as f64;
        self.table.stage_for_progress(progress)
    }

    pub fn classify_in_season(
        &self,
        profile: &GrowingSeasonProfile,
        current_date: NaiveDate,
    ) -> GrowthStage {
        self.classify(
            profile.planting_date(),
            current_date,
            profile.growing_duration(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan_1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn days(n: i64) -> chrono::Duration {
        chrono::Duration::days(n)
    }

    fn duration(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn planting_day_is_sowing() {
        let c = GrowthStageClassifier::default();
        assert_eq!(c.classify(jan_1(), jan_1(), duration(120)), GrowthStage::Sowing);
    }

    #[test]
    fn before_planting_is_sowing() {
        let c = GrowthStageClassifier::default();
        assert_eq!(
            c.classify(jan_1(), jan_1() - days(10), duration(120)),
            GrowthStage::Sowing
        );
    }

    #[test]
    fn end_of_season_is_maturity_then_harvest() {
        let c = GrowthStageClassifier::default();
        assert_eq!(
            c.classify(jan_1(), jan_1() + days(120), duration(120)),
            GrowthStage::Maturity
        );
        assert_eq!(
            c.classify(jan_1(), jan_1() + days(121), duration(120)),
            GrowthStage::Harvest
        );
    }

    #[test]
    fn day_ten_of_hundred_twenty_is_germination() {
        let c = GrowthStageClassifier::default();
        assert_eq!(
            c.classify(jan_1(), jan_1() + days(10), duration(120)),
            GrowthStage::Germination
        );
    }

    #[test]
    fn exact_boundaries_stay_in_lower_stage() {
        let c = GrowthStageClassifier::default();
        // 0.1, 0.4, 0.6 and 0.85 of a 100-day season.
        let cases = [
            (10, GrowthStage::Germination),
            (11, GrowthStage::Vegetative),
            (40, GrowthStage::Vegetative),
            (41, GrowthStage::Flowering),
            (60, GrowthStage::Flowering),
            (85, GrowthStage::GrainFilling),
            (86, GrowthStage::Maturity),
        ];
        for (offset, expected) in cases {
            assert_eq!(
                c.classify(jan_1(), jan_1() + days(offset), duration(100)),
                expected,
                "day {}",
                offset
            );
        }
    }

    #[test]
    fn boundary_with_inexact_float_ratio() {
        // 0.3 * 30 = 9 days, 9/30 is not exactly representable.
        let table = StageTable::new(vec![
            StageThreshold {
                stage: GrowthStage::Sowing,
                progress: 0.0,
            },
            StageThreshold {
                stage: GrowthStage::Vegetative,
                progress: 0.3,
            },
            StageThreshold {
                stage: GrowthStage::Maturity,
                progress: 1.0,
            },
        ])
        .unwrap();
        let c = GrowthStageClassifier::new(table);
        assert_eq!(
            c.classify(jan_1(), jan_1() + days(9), duration(30)),
            GrowthStage::Vegetative
        );
    }

    #[test]
    fn onset_and_fraction_from_default_table() {
        let table = StageTable::default();
        assert_eq!(table.onset_fraction(GrowthStage::Germination), Some(0.0));
        assert_eq!(table.onset_fraction(GrowthStage::Vegetative), Some(0.1));
        assert_eq!(table.onset_fraction(GrowthStage::GrainFilling), Some(0.6));
        assert_eq!(table.onset_fraction(GrowthStage::Harvest), Some(1.0));

        let veg = table.fraction_of_season(GrowthStage::Vegetative).unwrap();
        assert!((veg - 0.3).abs() < 1e-9);

        let total: f64 = GrowthStage::all()
            .iter()
            .filter_map(|s| table.fraction_of_season(*s))
            .sum();
        assert!((total - 1.0).abs() < 1e-9);

        assert_eq!(table.onset_day(GrowthStage::Vegetative, duration(120)), Some(12));
        assert_eq!(table.onset_day(GrowthStage::Flowering, duration(120)), Some(48));
    }

    #[test]
    fn fraction_of_season_with_open_first_stage() {
        let t = |stage, progress| StageThreshold { stage, progress };
        let table = StageTable::new(vec![
            t(GrowthStage::Germination, 0.2),
            t(GrowthStage::Vegetative, 0.5),
            t(GrowthStage::Maturity, 0.9),
        ])
        .unwrap();

        let share = |s| table.fraction_of_season(s).unwrap();
        assert!((share(GrowthStage::Germination) - 0.2).abs() < 1e-9);
        assert!((share(GrowthStage::Vegetative) - 0.3).abs() < 1e-9);
        assert!((share(GrowthStage::Maturity) - 0.4).abs() < 1e-9);
        assert!((share(GrowthStage::Harvest) - 0.1).abs() < 1e-9);
        assert_eq!(table.fraction_of_season(GrowthStage::Flowering), None);
    }

    #[test]
    fn rejects_bad_tables() {
        let t = |stage, progress| StageThreshold { stage, progress };
        assert!(StageTable::new(vec![]).is_err());
        assert!(StageTable::new(vec![
            t(GrowthStage::Sowing, 0.0),
            t(GrowthStage::Vegetative, 0.5),
            t(GrowthStage::Flowering, 0.4),
        ])
        .is_err());
        assert!(StageTable::new(vec![
            t(GrowthStage::Sowing, 0.0),
            t(GrowthStage::Harvest, 1.0)
        ])
        .is_err());
        assert!(StageTable::new(vec![
            t(GrowthStage::Sowing, 0.0),
            t(GrowthStage::Sowing, 0.5)
        ])
        .is_err());
    }

    #[test]
    fn table_yaml_round_trip_validates() {
        let yaml = r#"
- { stage: Sowing, progress: 0.0 }
- { stage: Vegetative, progress: 0.5 }
- { stage: Maturity, progress: 1.0 }
"#;
        let table: StageTable = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(table.stage_for_progress(0.7), GrowthStage::Maturity);

        let bad = "- { stage: Sowing, progress: 0.5 }\n- { stage: Maturity, progress: 0.2 }\n";
        let parsed: std::result::Result<StageTable, _> = serde_yaml::from_str(bad);
        assert!(parsed.is_err());
    }
}
