use super::{BalanceContext, Rule};
use crate::models::{Recommendation, RecommendationCategory, Severity};

/// Planned applications past their target date plus the grace period.
///
/// They stay planned and keep counting as pending; the grower has to record
/// them as completed or skipped.
pub struct OverdueApplicationRule;

impl Rule for OverdueApplicationRule {
    fn id(&self) -> &'static str {
        "overdue_applications"
    }

    fn name(&self) -> &'static str {
        "Overdue Applications"
    }

    fn evaluate(&self, ctx: &BalanceContext<'_>) -> Option<Recommendation> {
        let grace = ctx.policy.thresholds.overdue_grace_days;
        let overdue = ctx.plan.overdue(ctx.as_of, grace);
        if overdue.is_empty() {
            return None;
        }

        let listed: Vec<String> = overdue
            .iter()
            .map(|a| format!("#{} {} due {}", a.sequence, a.stage, a.target_date))
            .collect();

        let mut rec = Recommendation::new(
            "overdue_applications",
            RecommendationCategory::Schedule,
            Severity::Warning,
            "Fertilizer Applications Overdue",
            format!(
                "{} planned application(s) more than {} days past target: {}.",
                overdue.len(),
                grace,
                listed.join("; ")
            ),
        );

        for app in &overdue {
            let days_late = (ctx.as_of - app.target_date).num_days();
            rec = rec.with_data_point(
                &format!("#{}", app.sequence),
                format!("{} days late", days_late),
            );
        }

        Some(rec.with_action(
            "Record each overdue application as completed or skipped so the nutrient \
             balance reflects what the crop actually received.",
        ))
    }
}
