use super::growth_stage::{GrowthStageClassifier, StageTable};
use super::rules::{BalanceContext, RulesEngine};
use crate::error::{FieldPlanError, Result};
use crate::models::{
    ApplicationMethod, ApplicationStatus, CropNutrientRequirement, DeficitStatus,
    FertilizerApplication, FertilizerProduct, GrowingSeasonProfile, GrowthStage, Nutrient,
    NutrientBalance, NutrientDeficit, NutrientDeficitAnalysis, NutrientVector,
    SeasonFertilizerPlan, Severity,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU32;

/// Share of each nutrient's seasonal fertilizer requirement delivered at each
/// growth stage. Every nutrient's shares sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageDistribution {
    shares: BTreeMap<Nutrient, BTreeMap<GrowthStage, f64>>,
}

impl StageDistribution {
    pub fn new(shares: BTreeMap<Nutrient, BTreeMap<GrowthStage, f64>>) -> Result<Self> {
        let table = Self { shares };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        for nutrient in Nutrient::all() {
            let stages = self.shares.get(nutrient).ok_or_else(|| {
                FieldPlanError::Config(format!("no stage distribution for {}", nutrient))
            })?;

            if stages.contains_key(&GrowthStage::Harvest) {
                return Err(FieldPlanError::Config(format!(
                    "{} distribution assigns a share to Harvest",
                    nutrient
                )));
            }
            if stages.values().any(|s| !s.is_finite() || *s < 0.0) {
                return Err(FieldPlanError::Config(format!(
                    "{} distribution has a negative share",
                    nutrient
                )));
            }
            let total: f64 = stages.values().sum();
            if (total - 1.0).abs() > 1e-6 {
                return Err(FieldPlanError::Config(format!(
                    "{} distribution sums to {:.3}, expected 1.0",
                    nutrient, total
                )));
            }
        }
        Ok(())
    }

    pub fn share(&self, nutrient: Nutrient, stage: GrowthStage) -> f64 {
        self.shares
            .get(&nutrient)
            .and_then(|stages| stages.get(&stage))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn stages(&self) -> impl Iterator<Item = GrowthStage> + '_ {
        let mut stages: Vec<GrowthStage> = self
            .shares
            .values()
            .flat_map(|s| s.keys().copied())
            .collect();
        stages.sort();
        stages.dedup();
        stages.into_iter()
    }
}

impl Default for StageDistribution {
    fn default() -> Self {
        use GrowthStage::*;

        let table = |entries: &[(GrowthStage, f64)]| -> BTreeMap<GrowthStage, f64> {
            entries.iter().copied().collect()
        };
        let shares: BTreeMap<Nutrient, BTreeMap<GrowthStage, f64>> = BTreeMap::from([
            (
                Nutrient::Nitrogen,
                table(&[
                    (Germination, 0.2),
                    (Vegetative, 0.4),
                    (Flowering, 0.3),
                    (GrainFilling, 0.1),
                ]),
            ),
            (
                Nutrient::Phosphorus,
                table(&[(Germination, 0.6), (Vegetative, 0.3), (Flowering, 0.1)]),
            ),
            (
                Nutrient::Potassium,
                table(&[(Germination, 0.4), (Vegetative, 0.4), (Flowering, 0.2)]),
            ),
            (
                Nutrient::Sulfur,
                table(&[(Germination, 0.3), (Vegetative, 0.5), (Flowering, 0.2)]),
            ),
            (
                Nutrient::Calcium,
                table(&[(Germination, 0.5), (Vegetative, 0.3), (Flowering, 0.2)]),
            ),
            (
                Nutrient::Magnesium,
                table(&[(Germination, 0.3), (Vegetative, 0.4), (Flowering, 0.3)]),
            ),
        ]);
        Self { shares }
    }
}

/// Relative-deficit bands for the overall nutrient status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeficitBands {
    /// Largest relative deficit below this is `Adequate`.
    pub adequate_below: f64,
    /// Largest relative deficit at or above this is `Critical`.
    pub critical_from: f64,
}

impl Default for DeficitBands {
    fn default() -> Self {
        Self {
            adequate_below: 0.10,
            critical_from: 0.30,
        }
    }
}

impl DeficitBands {
    pub fn validate(&self) -> Result<()> {
        if !(0.0 <= self.adequate_below && self.adequate_below <= self.critical_from) {
            return Err(FieldPlanError::Config(format!(
                "deficit bands must satisfy 0 <= adequate_below ({}) <= critical_from ({})",
                self.adequate_below, self.critical_from
            )));
        }
        Ok(())
    }

    pub fn status(&self, relative_deficit: f64) -> DeficitStatus {
        if relative_deficit < self.adequate_below {
            DeficitStatus::Adequate
        } else if relative_deficit < self.critical_from {
            DeficitStatus::Deficient
        } else {
            DeficitStatus::Critical
        }
    }

    pub fn urgency(&self, relative_deficit: f64) -> Severity {
        match self.status(relative_deficit) {
            DeficitStatus::Adequate => Severity::Advisory,
            DeficitStatus::Deficient => Severity::Warning,
            DeficitStatus::Critical => Severity::Critical,
        }
    }
}

/// Trigger levels for nutrient-balance advice, kg/ha unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    pub nitrogen_topdress_kg_ha: f64,
    pub phosphorus_kg_ha: f64,
    pub potassium_kg_ha: f64,
    pub secondary_kg_ha: f64,
    /// Surplus as a fraction of the requirement.
    pub surplus_fraction: f64,
    pub overdue_grace_days: u32,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            nitrogen_topdress_kg_ha: 20.0,
            phosphorus_kg_ha: 10.0,
            potassium_kg_ha: 15.0,
            secondary_kg_ha: 5.0,
            surplus_fraction: 0.3,
            overdue_grace_days: 7,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FertilizerPolicy {
    #[serde(default)]
    pub distribution: StageDistribution,
    #[serde(default)]
    pub deficit_bands: DeficitBands,
    #[serde(default)]
    pub thresholds: RuleThresholds,
}

impl RuleThresholds {
    pub fn validate(&self) -> Result<()> {
        let levels = [
            ("nitrogen_topdress_kg_ha", self.nitrogen_topdress_kg_ha),
            ("phosphorus_kg_ha", self.phosphorus_kg_ha),
            ("potassium_kg_ha", self.potassium_kg_ha),
            ("secondary_kg_ha", self.secondary_kg_ha),
            ("surplus_fraction", self.surplus_fraction),
        ];
        for (name, value) in levels {
            if !value.is_finite() || value < 0.0 {
                return Err(FieldPlanError::Config(format!(
                    "fertilizer threshold {} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl FertilizerPolicy {
    pub fn validate(&self, stages: &StageTable) -> Result<()> {
        self.distribution.validate()?;
        self.deficit_bands.validate()?;
        self.thresholds.validate()?;
        for stage in self.distribution.stages() {
            if stages.onset_fraction(stage).is_none() {
                return Err(FieldPlanError::Config(format!(
                    "distribution uses stage {} which the stage table does not define",
                    stage
                )));
            }
        }
        Ok(())
    }
}

fn method_for(stage: GrowthStage) -> ApplicationMethod {
    match stage {
        GrowthStage::Sowing | GrowthStage::Germination => ApplicationMethod::Basal,
        GrowthStage::Vegetative => ApplicationMethod::SideDress,
        GrowthStage::Flowering => ApplicationMethod::TopDress,
        GrowthStage::GrainFilling | GrowthStage::Maturity | GrowthStage::Harvest => {
            ApplicationMethod::Foliar
        }
    }
}

fn stage_purpose(stage: GrowthStage) -> &'static str {
    match stage {
        GrowthStage::Sowing | GrowthStage::Germination => {
            "establishes roots and early vigour; phosphorus is most effective placed early"
        }
        GrowthStage::Vegetative => "supports peak canopy expansion and tillering",
        GrowthStage::Flowering => "sustains flowering and seed set",
        GrowthStage::GrainFilling => "maintains leaf nitrogen for grain protein",
        GrowthStage::Maturity | GrowthStage::Harvest => "late correction only",
    }
}

#[derive(Debug, Default)]
pub struct FertilizerPlanner {
    policy: FertilizerPolicy,
    classifier: GrowthStageClassifier,
    rules: RulesEngine,
}

impl FertilizerPlanner {
    pub fn new(policy: FertilizerPolicy, stages: StageTable) -> Result<Self> {
        policy.validate(&stages)?;
        Ok(Self {
            policy,
            classifier: GrowthStageClassifier::new(stages),
            rules: RulesEngine::new(),
        })
    }

    pub fn policy(&self) -> &FertilizerPolicy {
        &self.policy
    }

    pub fn rules(&self) -> &RulesEngine {
        &self.rules
    }

    /// Seasonal requirement scaled to `target_yield_t_ha`, split into dated
    /// applications per the stage distribution.
    pub fn calculate_season_plan(
        &self,
        field_id: &str,
        requirement: &CropNutrientRequirement,
        target_yield_t_ha: f64,
        soil_supply: NutrientVector,
        profile: &GrowingSeasonProfile,
        sowing_date: NaiveDate,
    ) -> Result<SeasonFertilizerPlan> {
        if !(requirement.reference_yield_t_ha.is_finite() && requirement.reference_yield_t_ha > 0.0)
        {
            return Err(FieldPlanError::InvalidInput(format!(
                "reference yield must be positive, got {}",
                requirement.reference_yield_t_ha
            )));
        }
        if !(target_yield_t_ha.is_finite() && target_yield_t_ha >= 0.0) {
            return Err(FieldPlanError::InvalidInput(format!(
                "target yield must be non-negative, got {}",
                target_yield_t_ha
            )));
        }
        if !requirement.uptake.is_non_negative() || !soil_supply.is_non_negative() {
            return Err(FieldPlanError::InvalidInput(
                "nutrient quantities must be non-negative".into(),
            ));
        }

        let total_requirement =
            requirement.uptake * (target_yield_t_ha / requirement.reference_yield_t_ha);
        // Per nutrient: surplus of one never offsets a deficit of another.
        let fertilizer_requirement = total_requirement.saturating_sub(&soil_supply);

        let duration = profile.growing_duration();
        let distribution = &self.policy.distribution;
        let mut applications = Vec::new();

        for stage in distribution.stages() {
            let nutrients = fertilizer_requirement.map(|n, v| v * distribution.share(n, stage));
            if nutrients.is_zero() {
                continue;
            }

            let days_after_planting = self
                .classifier
                .table()
                .onset_day(stage, duration)
                .ok_or_else(|| {
                    FieldPlanError::Config(format!("stage {} missing from stage table", stage))
                })?;

            applications.push(FertilizerApplication {
                sequence: applications.len() as u32 + 1,
                target_date: sowing_date + chrono::Duration::days(days_after_planting as i64),
                stage,
                days_after_planting,
                nutrients,
                method: method_for(stage),
                rationale: self.rationale(stage),
                status: ApplicationStatus::Planned,
                actual_application_date: None,
            });
        }

        tracing::info!(
            field = %field_id,
            applications = applications.len(),
            nitrogen = fertilizer_requirement.nitrogen,
            "generated season fertilizer plan"
        );

        Ok(SeasonFertilizerPlan {
            field_id: field_id.to_string(),
            sowing_date,
            growing_duration_days: profile.growing_duration_days(),
            target_yield_t_ha,
            total_requirement,
            soil_supply,
            fertilizer_requirement,
            applications,
        })
    }

    fn rationale(&self, stage: GrowthStage) -> String {
        let shares: Vec<String> = Nutrient::all()
            .iter()
            .filter_map(|n| {
                let share = self.policy.distribution.share(*n, stage);
                (share > 0.0).then(|| format!("{:.0}% {}", share * 100.0, n.symbol()))
            })
            .collect();
        format!(
            "{} {}: {} of the season's fertilizer requirement; {}.",
            stage,
            method_for(stage).as_str().to_lowercase(),
            shares.join(", "),
            stage_purpose(stage)
        )
    }

    pub fn analyze_nutrient_deficit(
        &self,
        required: &NutrientVector,
        available: &NutrientVector,
        already_applied: &NutrientVector,
    ) -> NutrientDeficitAnalysis {
        let supplied = *available + *already_applied;
        let deficit = required.saturating_sub(&supplied);
        let surplus = supplied.saturating_sub(required);
        let bands = &self.policy.deficit_bands;

        let deficits: Vec<NutrientDeficit> = deficit
            .iter()
            .filter(|(_, kg)| *kg > 0.0)
            .map(|(nutrient, kg)| {
                let need = required.get(nutrient);
                let relative = if need > 0.0 { kg / need } else { 0.0 };
                NutrientDeficit {
                    nutrient,
                    deficit_kg_ha: kg,
                    relative_deficit: relative,
                    urgency: bands.urgency(relative),
                    symptom: nutrient.deficiency_symptom().to_string(),
                }
            })
            .collect();

        let max_relative_deficit = deficits
            .iter()
            .map(|d| d.relative_deficit)
            .fold(0.0, f64::max);

        NutrientDeficitAnalysis {
            deficit,
            surplus,
            deficits,
            max_relative_deficit,
            status: bands.status(max_relative_deficit),
        }
    }

    /// Snapshot of a plan's nutrient position on `as_of`, with advice.
    pub fn nutrient_balance(
        &self,
        plan: &SeasonFertilizerPlan,
        products: &[FertilizerProduct],
        as_of: NaiveDate,
    ) -> Result<NutrientBalance> {
        let duration = NonZeroU32::new(plan.growing_duration_days).ok_or_else(|| {
            FieldPlanError::InvalidData(format!(
                "plan for field {} has a zero-day season",
                plan.field_id
            ))
        })?;

        let applied = plan.applied_total();
        let pending = plan.pending_total();
        let analysis =
            self.analyze_nutrient_deficit(&plan.total_requirement, &plan.soil_supply, &applied);

        let ctx = BalanceContext {
            as_of,
            stage: self.classifier.classify(plan.sowing_date, as_of, duration),
            plan,
            analysis: &analysis,
            pending,
            products,
            policy: &self.policy,
        };

        let (warnings, recommendations): (Vec<_>, Vec<_>) = self
            .rules
            .evaluate(&ctx)
            .into_iter()
            .partition(|r| r.is_warning());

        Ok(NutrientBalance {
            field_id: plan.field_id.clone(),
            as_of,
            required: plan.total_requirement,
            available: plan.soil_supply,
            applied,
            pending,
            deficit: analysis.deficit,
            surplus: analysis.surplus,
            status: analysis.status,
            deficits: analysis.deficits,
            recommendations,
            warnings,
        })
    }
}
