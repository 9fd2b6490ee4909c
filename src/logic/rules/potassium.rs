use super::{BalanceContext, Rule};
use crate::models::{Nutrient, Recommendation, RecommendationCategory, Severity};

pub struct PotassiumRule;

impl Rule for PotassiumRule {
    fn id(&self) -> &'static str {
        "k_deficit"
    }

    fn name(&self) -> &'static str {
        "Potassium Deficit"
    }

    fn evaluate(&self, ctx: &BalanceContext<'_>) -> Option<Recommendation> {
        let uncovered = ctx.uncovered(Nutrient::Potassium);
        if uncovered <= ctx.policy.thresholds.potassium_kg_ha {
            return None;
        }

        let relative = ctx.relative(Nutrient::Potassium, uncovered);
        let severity = if relative >= ctx.policy.deficit_bands.critical_from {
            Severity::Warning
        } else {
            Severity::Advisory
        };

        let mut rec = Recommendation::new(
            "k_deficit",
            RecommendationCategory::Potassium,
            severity,
            "Potassium Shortfall",
            format!(
                "Potassium supply is {:.1} kg/ha ({:.0}%) short of the crop requirement.",
                uncovered,
                relative * 100.0
            ),
        )
        .with_explanation(
            "Potassium regulates water use and stalk strength. Shortfalls raise lodging \
             risk and drought sensitivity.",
        )
        .with_data_point("Uncovered Deficit", format!("{:.1} kg/ha", uncovered));

        if let Some(product) = ctx.product_advice(Nutrient::Potassium, uncovered) {
            rec = rec.with_action(format!("Side-dress {}.", product));
        }
        Some(rec)
    }
}
