//! Field-level entry points: resolve records through the data-source traits
//! and run the engines on them.

use super::calculations::{summarize, WeatherSummary, DEFAULT_GDD_BASE_C};
use super::fertilizer::FertilizerPlanner;
use super::growth_stage::GrowthStageClassifier;
use super::irrigation::{FieldSite, IrrigationEngine};
use crate::config::Config;
use crate::datasources::FieldDataSource;
use crate::error::{FieldPlanError, Result};
use crate::models::{
    ApplicationRecord, CropVariety, Field, GrowingSeasonProfile, GrowthStage,
    IrrigationRecommendation, IrrigationSchedule, NutrientBalance, NutrientVector,
    RecordedOutcome, SeasonFertilizerPlan, SoilWaterParameters,
};
use chrono::NaiveDate;
use serde::Serialize;

struct ResolvedField {
    field: Field,
    water: SoilWaterParameters,
    variety: CropVariety,
    profile: GrowingSeasonProfile,
}

impl ResolvedField {
    fn site(&self) -> FieldSite<'_> {
        FieldSite {
            field: &self.field,
            soil: &self.water,
            profile: &self.profile,
        }
    }
}

/// Everything the advisor can say about one field on one day.
#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    pub field_id: String,
    pub as_of: NaiveDate,
    pub growth_stage: GrowthStage,
    /// Absent when there is no weather for `as_of`.
    pub irrigation: Option<IrrigationRecommendation>,
    pub nutrient_balance: NutrientBalance,
}

pub struct FieldAdvisor<S> {
    store: S,
    classifier: GrowthStageClassifier,
    irrigation: IrrigationEngine,
    planner: FertilizerPlanner,
}

impl<S: FieldDataSource> FieldAdvisor<S> {
    pub fn new(store: S, config: &Config) -> Result<Self> {
        Ok(Self {
            store,
            classifier: GrowthStageClassifier::new(config.growth_stages.clone()),
            irrigation: IrrigationEngine::new(config.irrigation.clone()),
            planner: FertilizerPlanner::new(
                config.fertilizer.clone(),
                config.growth_stages.clone(),
            )?,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn field_ids(&self) -> Result<Vec<String>> {
        self.store.field_ids()
    }

    fn resolve(&self, field_id: &str) -> Result<ResolvedField> {
        let field = self.store.field(field_id)?;
        let water = self.store.soil(&field.soil_id)?.water_parameters()?;
        let variety = self.store.crop_variety(&field.crop_variety_id)?;
        let profile = self
            .store
            .profile_definition(&variety.crop_type)?
            .into_profile(field.planting_date)?;

        Ok(ResolvedField {
            field,
            water,
            variety,
            profile,
        })
    }

    pub fn growth_stage(&self, field_id: &str, date: NaiveDate) -> Result<GrowthStage> {
        let resolved = self.resolve(field_id)?;
        Ok(self.classifier.classify_in_season(&resolved.profile, date))
    }

    /// Irrigation advice for `date`, or for the latest observation when no
    /// date is given. An explicit moisture reading overrides the stored one,
    /// which is only used when recent enough and not taken after the day.
    pub fn irrigation_for(
        &self,
        field_id: &str,
        date: Option<NaiveDate>,
        soil_moisture: Option<f64>,
    ) -> Result<IrrigationRecommendation> {
        let resolved = self.resolve(field_id)?;

        let weather = match date {
            Some(d) => self.store.observation_on(field_id, d)?,
            None => self.store.latest_observation(field_id)?,
        }
        .ok_or_else(|| {
            FieldPlanError::NotFound(match date {
                Some(d) => format!("weather for field {} on {}", field_id, d),
                None => format!("weather for field {}", field_id),
            })
        })?;

        let moisture = match soil_moisture {
            Some(m) => Some(m),
            None => self
                .store
                .latest_condition(field_id)?
                .filter(|c| {
                    let usable = self
                        .irrigation
                        .policy()
                        .moisture_usable(c.observed_on, weather.date);
                    if !usable {
                        tracing::debug!(
                            field = %field_id,
                            observed_on = %c.observed_on,
                            date = %weather.date,
                            "stored moisture reading out of range, estimating"
                        );
                    }
                    usable
                })
                .and_then(|c| c.soil_moisture),
        };

        self.irrigation
            .calculate_irrigation_requirement(&resolved.site(), &weather, moisture)
    }

    /// Water balance over the field's full weather series. A stored moisture
    /// reading seeds the balance if it predates the series; otherwise the
    /// root zone starts at field capacity.
    pub fn irrigation_schedule(&self, field_id: &str) -> Result<IrrigationSchedule> {
        let resolved = self.resolve(field_id)?;
        let observations = self.store.observations(field_id)?;

        let first = observations.iter().map(|o| o.date).min();
        let initial_moisture = self
            .store
            .latest_condition(field_id)?
            .filter(|c| first.is_some_and(|d| c.observed_on <= d))
            .and_then(|c| c.soil_moisture);

        self.irrigation
            .irrigation_schedule(&resolved.site(), &observations, initial_moisture)
    }

    /// Season plan with recorded outcomes applied.
    pub fn season_plan(&self, field_id: &str) -> Result<SeasonFertilizerPlan> {
        let resolved = self.resolve(field_id)?;

        let soil_supply = match self.store.latest_condition(field_id)? {
            Some(condition) => condition.nutrient_supply,
            None => {
                tracing::debug!(field = %field_id, "no field condition, assuming zero soil supply");
                NutrientVector::zero()
            }
        };

        let mut plan = self.planner.calculate_season_plan(
            field_id,
            &resolved.variety.nutrient_requirement,
            resolved.field.target_yield_t_ha,
            soil_supply,
            &resolved.profile,
            resolved.field.planting_date,
        )?;

        for record in self.store.application_records(field_id)? {
            apply_record(&mut plan, &record)?;
        }
        Ok(plan)
    }

    pub fn nutrient_balance(&self, field_id: &str, as_of: NaiveDate) -> Result<NutrientBalance> {
        let plan = self.season_plan(field_id)?;
        let products = self.store.fertilizer_products()?;
        self.planner.nutrient_balance(&plan, &products, as_of)
    }

    pub fn weather_summary(&self, field_id: &str) -> Result<Option<WeatherSummary>> {
        let observations = self.store.observations(field_id)?;
        let from = observations.iter().map(|o| o.date).min();
        let to = observations.iter().map(|o| o.date).max();
        Ok(from
            .zip(to)
            .map(|(from, to)| summarize(&observations, from, to, DEFAULT_GDD_BASE_C)))
    }

    pub fn field_report(&self, field_id: &str, as_of: NaiveDate) -> Result<FieldReport> {
        let growth_stage = self.growth_stage(field_id, as_of)?;
        let irrigation = match self.irrigation_for(field_id, Some(as_of), None) {
            Ok(rec) => Some(rec),
            Err(FieldPlanError::NotFound(what)) => {
                tracing::debug!(field = %field_id, %what, "no irrigation advice");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(FieldReport {
            field_id: field_id.to_string(),
            as_of,
            growth_stage,
            irrigation,
            nutrient_balance: self.nutrient_balance(field_id, as_of)?,
        })
    }
}

/// Applies one recorded outcome to the matching planned application.
fn apply_record(plan: &mut SeasonFertilizerPlan, record: &ApplicationRecord) -> Result<()> {
    let sequence = match (record.sequence, record.stage) {
        (Some(sequence), _) => sequence,
        (None, Some(stage)) => plan.sequence_for_stage(stage).ok_or_else(|| {
            FieldPlanError::InvalidData(format!(
                "field {} has no planned application at stage {}",
                plan.field_id, stage
            ))
        })?,
        (None, None) => {
            return Err(FieldPlanError::InvalidData(format!(
                "application record for field {} names neither sequence nor stage",
                plan.field_id
            )))
        }
    };

    match record.outcome {
        RecordedOutcome::Completed { applied_on } => plan.record_completion(sequence, applied_on),
        RecordedOutcome::Skipped => plan.record_skip(sequence),
    }
}
