use super::{BalanceContext, Rule};
use crate::models::{Nutrient, Recommendation, RecommendationCategory, Severity};

/// Nitrogen top-dress rule
///
/// Nitrogen is the nutrient most likely to run short in season, since losses
/// coincide with peak demand during canopy expansion. When the deficit
/// left after every still-planned application exceeds the top-dress
/// threshold, recommend an extra top-dressing. A deficit the plan already
/// covers is reported for information only.
pub struct NitrogenTopDressRule;

impl Rule for NitrogenTopDressRule {
    fn id(&self) -> &'static str {
        "n_topdress"
    }

    fn name(&self) -> &'static str {
        "Nitrogen Top-Dress"
    }

    fn evaluate(&self, ctx: &BalanceContext<'_>) -> Option<Recommendation> {
        let deficit = ctx.analysis.deficit.nitrogen;
        let threshold = ctx.policy.thresholds.nitrogen_topdress_kg_ha;
        let uncovered = ctx.uncovered(Nutrient::Nitrogen);

        if uncovered > threshold {
            Some(build_topdress(ctx, deficit, uncovered, threshold))
        } else if deficit > threshold {
            Some(build_scheduled(ctx, deficit))
        } else {
            None
        }
    }
}

fn build_topdress(
    ctx: &BalanceContext<'_>,
    deficit: f64,
    uncovered: f64,
    threshold: f64,
) -> Recommendation {
    let relative = ctx.relative(Nutrient::Nitrogen, uncovered);
    let severity = if relative >= ctx.policy.deficit_bands.critical_from {
        Severity::Critical
    } else {
        Severity::Warning
    };

    let mut rec = Recommendation::new(
        "n_topdress",
        RecommendationCategory::Nitrogen,
        severity,
        "Top-Dress Nitrogen",
        format!(
            "Nitrogen deficit of {:.1} kg/ha is not covered by the remaining plan and \
             exceeds {:.0} kg/ha. Consider urea top-dressing.",
            uncovered, threshold
        ),
    )
    .with_explanation(
        "Crop nitrogen demand peaks from stem elongation through flowering. A shortfall \
         at this point reduces leaf area and grain number, and it cannot be recovered \
         later in the season.",
    )
    .with_data_point("Total Deficit", format!("{:.1} kg/ha", deficit))
    .with_data_point("Uncovered Deficit", format!("{:.1} kg/ha", uncovered))
    .with_data_point("Growth Stage", ctx.stage);

    if let Some(product) = ctx.product_advice(Nutrient::Nitrogen, uncovered) {
        rec = rec.with_action(format!(
            "Top-dress {} before the next rain or irrigation to limit volatilisation.",
            product
        ));
    }
    rec
}

fn build_scheduled(ctx: &BalanceContext<'_>, deficit: f64) -> Recommendation {
    let mut rec = Recommendation::new(
        "n_scheduled",
        RecommendationCategory::Nitrogen,
        Severity::Info,
        "Nitrogen Deficit Covered by Plan",
        format!(
            "Nitrogen deficit of {:.1} kg/ha will be met by {:.1} kg/ha in planned applications.",
            deficit, ctx.pending.nitrogen
        ),
    )
    .with_data_point("Pending N", format!("{:.1} kg/ha", ctx.pending.nitrogen));

    if let Some(next) = ctx.plan.next_pending(ctx.as_of) {
        rec = rec
            .with_data_point("Next Application", next.target_date)
            .with_action(format!(
                "Apply application #{} ({}) on {}.",
                next.sequence, next.method, next.target_date
            ));
    }
    rec
}
