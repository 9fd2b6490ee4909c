use super::{BalanceContext, Rule};
use crate::models::{GrowthStage, Nutrient, Recommendation, RecommendationCategory, Severity};

/// Phosphorus correction rule
///
/// Phosphorus is immobile in soil and mostly taken up early, so a shortfall
/// is worth correcting up to the vegetative stage. Later it is noted so the
/// next season's basal dose can make it up.
pub struct PhosphorusRule;

impl Rule for PhosphorusRule {
    fn id(&self) -> &'static str {
        "p_deficit"
    }

    fn name(&self) -> &'static str {
        "Phosphorus Deficit"
    }

    fn evaluate(&self, ctx: &BalanceContext<'_>) -> Option<Recommendation> {
        let uncovered = ctx.uncovered(Nutrient::Phosphorus);
        if uncovered <= ctx.policy.thresholds.phosphorus_kg_ha {
            return None;
        }

        let early = ctx.stage <= GrowthStage::Vegetative;
        let rec = Recommendation::new(
            "p_deficit",
            RecommendationCategory::Phosphorus,
            if early {
                Severity::Advisory
            } else {
                Severity::Info
            },
            "Phosphorus Shortfall",
            format!(
                "Phosphorus supply is {:.1} kg/ha short of the crop requirement.",
                uncovered
            ),
        )
        .with_explanation(Nutrient::Phosphorus.deficiency_symptom())
        .with_data_point("Uncovered Deficit", format!("{:.1} kg/ha", uncovered))
        .with_data_point("Growth Stage", ctx.stage);

        let action = match (early, ctx.product_advice(Nutrient::Phosphorus, uncovered)) {
            (true, Some(product)) => format!("Band {} close to the row now.", product),
            (true, None) => "Band a phosphate fertilizer close to the row now.".to_string(),
            (false, _) => {
                "Late phosphorus has little effect. Raise the basal phosphorus dose next season."
                    .to_string()
            }
        };
        Some(rec.with_action(action))
    }
}
