pub mod engine;
pub mod nitrogen;
pub mod overdue;
pub mod phosphorus;
pub mod potassium;
pub mod secondary;
pub mod surplus;

pub use engine::RulesEngine;

use super::fertilizer::FertilizerPolicy;
use crate::models::{
    FertilizerProduct, GrowthStage, Nutrient, NutrientDeficitAnalysis, NutrientVector,
    Recommendation, SeasonFertilizerPlan,
};
use chrono::NaiveDate;

/// Everything a balance rule may look at for one field on one day.
pub struct BalanceContext<'a> {
    pub as_of: NaiveDate,
    /// Growth stage on `as_of`.
    pub stage: GrowthStage,
    pub plan: &'a SeasonFertilizerPlan,
    pub analysis: &'a NutrientDeficitAnalysis,
    /// Nutrients in applications still planned.
    pub pending: NutrientVector,
    pub products: &'a [FertilizerProduct],
    pub policy: &'a FertilizerPolicy,
}

impl BalanceContext<'_> {
    /// Deficit that planned applications will not close.
    pub fn uncovered(&self, nutrient: Nutrient) -> f64 {
        (self.analysis.deficit.get(nutrient) - self.pending.get(nutrient)).max(0.0)
    }

    pub fn relative(&self, nutrient: Nutrient, kg_ha: f64) -> f64 {
        let required = self.plan.total_requirement.get(nutrient);
        if required > 0.0 {
            kg_ha / required
        } else {
            0.0
        }
    }

    /// Richest product for `nutrient`, with the rate that supplies `kg_ha`.
    pub fn product_advice(&self, nutrient: Nutrient, kg_ha: f64) -> Option<String> {
        let product = self
            .products
            .iter()
            .filter(|p| p.content.get(nutrient) > 0.0)
            .max_by(|a, b| a.content.get(nutrient).total_cmp(&b.content.get(nutrient)))?;
        let rate = product.rate_for(nutrient, kg_ha)?;
        Some(format!("{:.0} kg/ha of {}", rate, product.name))
    }
}

/// Trait for nutrient-balance rules
pub trait Rule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Evaluate the rule and return a recommendation if conditions are met
    fn evaluate(&self, ctx: &BalanceContext<'_>) -> Option<Recommendation>;
}
