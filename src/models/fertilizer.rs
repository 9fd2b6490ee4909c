use super::{GrowthStage, Nutrient, NutrientVector, Recommendation, Severity};
use crate::error::{FieldPlanError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationMethod {
    /// Incorporated at or before sowing.
    Basal,
    SideDress,
    TopDress,
    Foliar,
}

impl ApplicationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationMethod::Basal => "Basal",
            ApplicationMethod::SideDress => "Side-Dress",
            ApplicationMethod::TopDress => "Top-Dress",
            ApplicationMethod::Foliar => "Foliar",
        }
    }
}

impl std::fmt::Display for ApplicationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[default]
    Planned,
    Completed,
    Skipped,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Planned => "Planned",
            ApplicationStatus::Completed => "Completed",
            ApplicationStatus::Skipped => "Skipped",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FertilizerApplication {
    pub sequence: u32,
    pub target_date: NaiveDate,
    pub stage: GrowthStage,
    pub days_after_planting: u32,
    pub nutrients: NutrientVector,
    pub method: ApplicationMethod,
    pub rationale: String,
    pub status: ApplicationStatus,
    pub actual_application_date: Option<NaiveDate>,
}

impl FertilizerApplication {
    pub fn is_completed(&self) -> bool {
        self.status == ApplicationStatus::Completed
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Planned
    }

    /// Planned, and `grace_days` past its target date.
    pub fn is_overdue(&self, today: NaiveDate, grace_days: u32) -> bool {
        self.is_pending()
            && today > self.target_date + chrono::Duration::days(grace_days as i64)
    }

    pub fn complete(&mut self, applied_on: NaiveDate) -> Result<()> {
        match self.status {
            ApplicationStatus::Planned => {
                self.status = ApplicationStatus::Completed;
                self.actual_application_date = Some(applied_on);
                Ok(())
            }
            other => Err(FieldPlanError::InvalidTransition(format!(
                "application #{} is {}, only planned applications can be completed",
                self.sequence, other
            ))),
        }
    }

    pub fn skip(&mut self) -> Result<()> {
        match self.status {
            ApplicationStatus::Planned => {
                self.status = ApplicationStatus::Skipped;
                Ok(())
            }
            other => Err(FieldPlanError::InvalidTransition(format!(
                "application #{} is {}, only planned applications can be skipped",
                self.sequence, other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonFertilizerPlan {
    pub field_id: String,
    pub sowing_date: NaiveDate,
    pub growing_duration_days: u32,
    pub target_yield_t_ha: f64,
    pub total_requirement: NutrientVector,
    pub soil_supply: NutrientVector,
    pub fertilizer_requirement: NutrientVector,
    pub applications: Vec<FertilizerApplication>,
}

impl SeasonFertilizerPlan {
    pub fn application(&self, sequence: u32) -> Option<&FertilizerApplication> {
        self.applications.iter().find(|a| a.sequence == sequence)
    }

    fn application_mut(&mut self, sequence: u32) -> Result<&mut FertilizerApplication> {
        let field_id = self.field_id.clone();
        self.applications
            .iter_mut()
            .find(|a| a.sequence == sequence)
            .ok_or_else(|| {
                FieldPlanError::NotFound(format!(
                    "application #{} in plan for field {}",
                    sequence, field_id
                ))
            })
    }

    pub fn sequence_for_stage(&self, stage: GrowthStage) -> Option<u32> {
        self.applications
            .iter()
            .find(|a| a.stage == stage)
            .map(|a| a.sequence)
    }

    /// Marks a planned application as applied. The plan itself is not recomputed.
    pub fn record_completion(&mut self, sequence: u32, applied_on: NaiveDate) -> Result<()> {
        self.application_mut(sequence)?.complete(applied_on)
    }

    pub fn record_skip(&mut self, sequence: u32) -> Result<()> {
        self.application_mut(sequence)?.skip()
    }

    pub fn applied_total(&self) -> NutrientVector {
        self.applications
            .iter()
            .filter(|a| a.is_completed())
            .map(|a| a.nutrients)
            .sum()
    }

    pub fn pending_total(&self) -> NutrientVector {
        self.applications
            .iter()
            .filter(|a| a.is_pending())
            .map(|a| a.nutrients)
            .sum()
    }

    pub fn pending(&self) -> impl Iterator<Item = &FertilizerApplication> {
        self.applications.iter().filter(|a| a.is_pending())
    }

    pub fn next_pending(&self, today: NaiveDate) -> Option<&FertilizerApplication> {
        self.pending().find(|a| a.target_date >= today)
    }

    pub fn overdue(&self, today: NaiveDate, grace_days: u32) -> Vec<&FertilizerApplication> {
        self.applications
            .iter()
            .filter(|a| a.is_overdue(today, grace_days))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeficitStatus {
    Adequate,
    Deficient,
    Critical,
}

impl DeficitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeficitStatus::Adequate => "Adequate",
            DeficitStatus::Deficient => "Deficient",
            DeficitStatus::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for DeficitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientDeficit {
    pub nutrient: Nutrient,
    pub deficit_kg_ha: f64,
    /// Deficit as a fraction of the requirement.
    pub relative_deficit: f64,
    pub urgency: Severity,
    pub symptom: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientDeficitAnalysis {
    pub deficit: NutrientVector,
    pub surplus: NutrientVector,
    pub deficits: Vec<NutrientDeficit>,
    pub max_relative_deficit: f64,
    pub status: DeficitStatus,
}

/// Point-in-time nutrient picture for one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientBalance {
    pub field_id: String,
    pub as_of: NaiveDate,
    pub required: NutrientVector,
    pub available: NutrientVector,
    pub applied: NutrientVector,
    pub pending: NutrientVector,
    pub deficit: NutrientVector,
    pub surplus: NutrientVector,
    pub status: DeficitStatus,
    pub deficits: Vec<NutrientDeficit>,
    pub recommendations: Vec<Recommendation>,
    pub warnings: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn plan() -> SeasonFertilizerPlan {
        let app = |sequence: u32, target: NaiveDate, n: f64| FertilizerApplication {
            sequence,
            target_date: target,
            stage: GrowthStage::Vegetative,
            days_after_planting: 0,
            nutrients: NutrientVector::npk(n, 0.0, 0.0),
            method: ApplicationMethod::SideDress,
            rationale: String::new(),
            status: ApplicationStatus::Planned,
            actual_application_date: None,
        };
        SeasonFertilizerPlan {
            field_id: "north".into(),
            sowing_date: date(1, 1),
            growing_duration_days: 120,
            target_yield_t_ha: 5.0,
            total_requirement: NutrientVector::npk(150.0, 0.0, 0.0),
            soil_supply: NutrientVector::npk(40.0, 0.0, 0.0),
            fertilizer_requirement: NutrientVector::npk(110.0, 0.0, 0.0),
            applications: vec![
                app(1, date(1, 1), 22.0),
                app(2, date(1, 13), 44.0),
                app(3, date(2, 18), 33.0),
                app(4, date(3, 13), 11.0),
            ],
        }
    }

    #[test]
    fn completion_sets_actual_date() {
        let mut plan = plan();
        plan.record_completion(1, date(1, 2)).unwrap();

        let app = plan.application(1).unwrap();
        assert_eq!(app.status, ApplicationStatus::Completed);
        assert_eq!(app.actual_application_date, Some(date(1, 2)));
        assert!((plan.applied_total().nitrogen - 22.0).abs() < 1e-9);
        assert!((plan.pending_total().nitrogen - 88.0).abs() < 1e-9);
    }

    #[test]
    fn completed_cannot_be_completed_or_skipped_again() {
        let mut plan = plan();
        plan.record_completion(1, date(1, 2)).unwrap();

        assert!(matches!(
            plan.record_completion(1, date(1, 3)),
            Err(FieldPlanError::InvalidTransition(_))
        ));
        assert!(matches!(
            plan.record_skip(1),
            Err(FieldPlanError::InvalidTransition(_))
        ));
    }

    #[test]
    fn skipped_is_excluded_from_totals() {
        let mut plan = plan();
        plan.record_skip(2).unwrap();

        assert_eq!(plan.application(2).unwrap().status, ApplicationStatus::Skipped);
        assert_eq!(plan.applied_total().nitrogen, 0.0);
        assert!((plan.pending_total().nitrogen - 66.0).abs() < 1e-9);
        assert!(plan.record_completion(2, date(1, 20)).is_err());
        // Retained in the plan.
        assert_eq!(plan.applications.len(), 4);
    }

    #[test]
    fn unknown_sequence_is_not_found() {
        let mut plan = plan();
        assert!(matches!(
            plan.record_completion(9, date(1, 2)),
            Err(FieldPlanError::NotFound(_))
        ));
    }

    #[test]
    fn overdue_respects_grace_period() {
        let plan = plan();
        // #2 targets Jan 13; with 7 days grace it is overdue from Jan 21.
        let overdue: Vec<u32> = plan.overdue(date(1, 20), 7).iter().map(|a| a.sequence).collect();
        assert_eq!(overdue, vec![1]);

        let overdue: Vec<u32> = plan.overdue(date(1, 21), 7).iter().map(|a| a.sequence).collect();
        assert_eq!(overdue, vec![1, 2]);
    }

    #[test]
    fn next_pending_skips_past_targets() {
        let mut plan = plan();
        plan.record_completion(1, date(1, 1)).unwrap();
        let next = plan.next_pending(date(1, 20)).unwrap();
        assert_eq!(next.sequence, 3);
    }
}
