use super::{BalanceContext, Rule};
use crate::models::{Nutrient, Recommendation, RecommendationCategory, Severity};

/// Oversupply rule
///
/// Supply well above requirement is wasted money, and for nitrogen it is
/// a leaching and runoff risk.
pub struct SurplusRule;

impl Rule for SurplusRule {
    fn id(&self) -> &'static str {
        "nutrient_surplus"
    }

    fn name(&self) -> &'static str {
        "Nutrient Surplus"
    }

    fn evaluate(&self, ctx: &BalanceContext<'_>) -> Option<Recommendation> {
        let fraction = ctx.policy.thresholds.surplus_fraction;
        let excessive: Vec<(Nutrient, f64)> = ctx
            .analysis
            .surplus
            .iter()
            .filter(|(n, kg)| {
                let required = ctx.plan.total_requirement.get(*n);
                required > 0.0 && *kg > fraction * required
            })
            .collect();

        if excessive.is_empty() {
            return None;
        }

        let nitrogen = excessive.iter().any(|(n, _)| *n == Nutrient::Nitrogen);
        let names: Vec<&str> = excessive.iter().map(|(n, _)| n.as_str()).collect();

        let mut rec = Recommendation::new(
            "nutrient_surplus",
            RecommendationCategory::NutrientSurplus,
            if nitrogen {
                Severity::Warning
            } else {
                Severity::Advisory
            },
            "Nutrient Oversupply",
            format!(
                "Supply exceeds the requirement by more than {:.0}% for {}.",
                fraction * 100.0,
                names.join(", ")
            ),
        );

        for (nutrient, kg) in &excessive {
            rec = rec.with_data_point(nutrient.as_str(), format!("{:.1} kg/ha surplus", kg));
        }

        if nitrogen {
            rec = rec
                .with_explanation(
                    "Nitrogen beyond crop demand is prone to leaching as nitrate, \
                     especially on light soils or after heavy rain.",
                )
                .with_action(
                    "Skip or reduce remaining nitrogen applications and avoid irrigating \
                     beyond the root zone.",
                );
        } else {
            rec = rec.with_action("Reduce the matching rates in next season's plan.");
        }
        Some(rec)
    }
}
