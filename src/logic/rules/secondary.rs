use super::{BalanceContext, Rule};
use crate::models::{Nutrient, Recommendation, RecommendationCategory, Severity};

const SECONDARY: [Nutrient; 3] = [Nutrient::Sulfur, Nutrient::Calcium, Nutrient::Magnesium];

/// Sulfur, calcium and magnesium shortfalls, reported together.
pub struct SecondaryNutrientRule;

impl Rule for SecondaryNutrientRule {
    fn id(&self) -> &'static str {
        "secondary_deficit"
    }

    fn name(&self) -> &'static str {
        "Secondary Nutrient Deficit"
    }

    fn evaluate(&self, ctx: &BalanceContext<'_>) -> Option<Recommendation> {
        let threshold = ctx.policy.thresholds.secondary_kg_ha;
        let short: Vec<(Nutrient, f64)> = SECONDARY
            .iter()
            .map(|n| (*n, ctx.uncovered(*n)))
            .filter(|(_, kg)| *kg > threshold)
            .collect();

        if short.is_empty() {
            return None;
        }

        let names: Vec<&str> = short.iter().map(|(n, _)| n.as_str()).collect();
        let mut rec = Recommendation::new(
            "secondary_deficit",
            RecommendationCategory::SecondaryNutrients,
            Severity::Advisory,
            "Secondary Nutrient Shortfall",
            format!("Supply falls short for {}.", names.join(", ")),
        );

        let mut actions = Vec::new();
        for (nutrient, kg) in &short {
            rec = rec.with_data_point(nutrient.as_str(), format!("{:.1} kg/ha short", kg));
            if let Some(product) = ctx.product_advice(*nutrient, *kg) {
                actions.push(format!("{} for {}", product, nutrient.symbol()));
            }
        }

        let symptoms: Vec<String> = short
            .iter()
            .map(|(n, _)| format!("{}: {}", n, n.deficiency_symptom()))
            .collect();
        rec = rec.with_explanation(symptoms.join(". "));

        if !actions.is_empty() {
            rec = rec.with_action(format!("Consider {}.", actions.join("; ")));
        }
        Some(rec)
    }
}
