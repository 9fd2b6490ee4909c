use super::{
    nitrogen::NitrogenTopDressRule, overdue::OverdueApplicationRule, phosphorus::PhosphorusRule,
    potassium::PotassiumRule, secondary::SecondaryNutrientRule, surplus::SurplusRule,
    BalanceContext, Rule,
};
use crate::models::Recommendation;

pub struct RulesEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl std::fmt::Debug for RulesEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.id()))
            .finish()
    }
}

impl RulesEngine {
    pub fn new() -> Self {
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(NitrogenTopDressRule),
            Box::new(PhosphorusRule),
            Box::new(PotassiumRule),
            Box::new(SecondaryNutrientRule),
            Box::new(SurplusRule),
            Box::new(OverdueApplicationRule),
        ];

        Self { rules }
    }

    /// Recommendations ordered most severe first.
    pub fn evaluate(&self, ctx: &BalanceContext<'_>) -> Vec<Recommendation> {
        let mut recs: Vec<Recommendation> = self
            .rules
            .iter()
            .filter_map(|rule| rule.evaluate(ctx))
            .collect();
        recs.sort_by(|a, b| b.severity.cmp(&a.severity));
        recs
    }

    pub fn list_rules(&self) -> Vec<(&'static str, &'static str)> {
        self.rules.iter().map(|r| (r.id(), r.name())).collect()
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::fertilizer::FertilizerPolicy;
    use crate::models::{
        ApplicationMethod, ApplicationStatus, DeficitStatus, FertilizerApplication,
        FertilizerProduct, GrowthStage, Nutrient, NutrientDeficitAnalysis, NutrientVector,
        SeasonFertilizerPlan, Severity,
    };
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn plan(pending_n: f64) -> SeasonFertilizerPlan {
        SeasonFertilizerPlan {
            field_id: "north".into(),
            sowing_date: date(1, 1),
            growing_duration_days: 120,
            target_yield_t_ha: 5.0,
            total_requirement: NutrientVector::npk(150.0, 30.0, 60.0)
                .with(Nutrient::Sulfur, 20.0),
            soil_supply: NutrientVector::npk(40.0, 0.0, 0.0),
            fertilizer_requirement: NutrientVector::npk(110.0, 30.0, 60.0),
            applications: vec![FertilizerApplication {
                sequence: 1,
                target_date: date(2, 18),
                stage: GrowthStage::Flowering,
                days_after_planting: 48,
                nutrients: NutrientVector::npk(pending_n, 0.0, 0.0),
                method: ApplicationMethod::TopDress,
                rationale: String::new(),
                status: ApplicationStatus::Planned,
                actual_application_date: None,
            }],
        }
    }

    fn analysis(deficit: NutrientVector, surplus: NutrientVector) -> NutrientDeficitAnalysis {
        NutrientDeficitAnalysis {
            deficit,
            surplus,
            deficits: Vec::new(),
            max_relative_deficit: 0.0,
            status: DeficitStatus::Deficient,
        }
    }

    fn evaluate(
        plan: &SeasonFertilizerPlan,
        analysis: &NutrientDeficitAnalysis,
        as_of: NaiveDate,
        stage: GrowthStage,
    ) -> Vec<Recommendation> {
        let policy = FertilizerPolicy::default();
        let products = FertilizerProduct::catalog();
        let ctx = BalanceContext {
            as_of,
            stage,
            plan,
            analysis,
            pending: plan.pending_total(),
            products: &products,
            policy: &policy,
        };
        RulesEngine::new().evaluate(&ctx)
    }

    fn find<'a>(recs: &'a [Recommendation], id: &str) -> Option<&'a Recommendation> {
        recs.iter().find(|r| r.id == id)
    }

    #[test]
    fn uncovered_nitrogen_triggers_topdress() {
        let plan = plan(10.0);
        let analysis = analysis(NutrientVector::npk(45.0, 0.0, 0.0), NutrientVector::zero());
        let recs = evaluate(&plan, &analysis, date(1, 20), GrowthStage::Vegetative);

        let rec = find(&recs, "n_topdress").unwrap();
        assert_eq!(rec.severity, Severity::Warning);
        assert!(rec.description.contains("urea"));
        assert!(rec.description.contains("35.0"));
        // 35 kg N from 46% urea
        assert!(rec.suggested_action.as_ref().unwrap().contains("76 kg/ha of Urea"));
    }

    #[test]
    fn covered_nitrogen_is_informational() {
        let plan = plan(40.0);
        let analysis = analysis(NutrientVector::npk(45.0, 0.0, 0.0), NutrientVector::zero());
        let recs = evaluate(&plan, &analysis, date(1, 20), GrowthStage::Vegetative);

        assert!(find(&recs, "n_topdress").is_none());
        let rec = find(&recs, "n_scheduled").unwrap();
        assert_eq!(rec.severity, Severity::Info);
    }

    #[test]
    fn small_nitrogen_deficit_is_ignored() {
        let plan = plan(0.0);
        let analysis = analysis(NutrientVector::npk(15.0, 0.0, 0.0), NutrientVector::zero());
        let recs = evaluate(&plan, &analysis, date(1, 20), GrowthStage::Vegetative);
        assert!(recs.is_empty());
    }

    #[test]
    fn late_phosphorus_is_deferred_to_next_season() {
        let plan = plan(0.0);
        let analysis = analysis(NutrientVector::npk(0.0, 20.0, 0.0), NutrientVector::zero());

        let early = evaluate(&plan, &analysis, date(1, 10), GrowthStage::Germination);
        assert_eq!(find(&early, "p_deficit").unwrap().severity, Severity::Advisory);

        let late = evaluate(&plan, &analysis, date(3, 20), GrowthStage::GrainFilling);
        let rec = find(&late, "p_deficit").unwrap();
        assert_eq!(rec.severity, Severity::Info);
        assert!(rec.suggested_action.as_ref().unwrap().contains("next season"));
    }

    #[test]
    fn potassium_shortfall_scales_with_requirement() {
        let plan = plan(0.0);
        let k = |kg| analysis(NutrientVector::npk(0.0, 0.0, kg), NutrientVector::zero());

        // Requirement is 60 kg K; the default threshold is 15 kg.
        let small = evaluate(&plan, &k(12.0), date(1, 20), GrowthStage::Vegetative);
        assert!(find(&small, "k_deficit").is_none());

        let moderate = evaluate(&plan, &k(16.0), date(1, 20), GrowthStage::Vegetative);
        assert_eq!(find(&moderate, "k_deficit").unwrap().severity, Severity::Advisory);

        let large = evaluate(&plan, &k(24.0), date(1, 20), GrowthStage::Vegetative);
        let rec = find(&large, "k_deficit").unwrap();
        assert_eq!(rec.severity, Severity::Warning);
        assert!(rec.description.contains("40%"));
        assert_eq!(
            rec.suggested_action.as_deref(),
            Some("Side-dress 48 kg/ha of Muriate of potash.")
        );
    }

    #[test]
    fn nitrogen_surplus_warns_of_leaching() {
        let plan = plan(0.0);
        let analysis = analysis(NutrientVector::zero(), NutrientVector::npk(60.0, 5.0, 0.0));
        let recs = evaluate(&plan, &analysis, date(1, 20), GrowthStage::Vegetative);

        let rec = find(&recs, "nutrient_surplus").unwrap();
        assert_eq!(rec.severity, Severity::Warning);
        assert!(rec.explanation.contains("leaching"));
        // 5 kg P on a 30 kg requirement stays under the 30% band.
        assert_eq!(rec.data_points.len(), 1);
    }

    #[test]
    fn secondary_shortfall_suggests_products() {
        let plan = plan(0.0);
        let analysis = analysis(
            NutrientVector::zero().with(Nutrient::Sulfur, 12.0),
            NutrientVector::zero(),
        );
        let recs = evaluate(&plan, &analysis, date(1, 20), GrowthStage::Vegetative);
        let rec = find(&recs, "secondary_deficit").unwrap();
        assert!(rec.description.contains("Sulfur"));
        assert!(rec.suggested_action.as_ref().unwrap().contains("Ammonium sulfate"));
    }

    #[test]
    fn overdue_application_is_a_warning() {
        let plan = plan(30.0);
        let analysis = analysis(NutrientVector::npk(30.0, 0.0, 0.0), NutrientVector::zero());

        let on_time = evaluate(&plan, &analysis, date(2, 25), GrowthStage::Flowering);
        assert!(find(&on_time, "overdue_applications").is_none());

        let late = evaluate(&plan, &analysis, date(2, 26), GrowthStage::Flowering);
        let rec = find(&late, "overdue_applications").unwrap();
        assert!(rec.is_warning());
        assert_eq!(rec.data_points[0].value, "8 days late");
    }

    #[test]
    fn results_sorted_by_severity() {
        let plan = plan(0.0);
        let analysis = analysis(
            NutrientVector::npk(100.0, 20.0, 0.0),
            NutrientVector::zero(),
        );
        let recs = evaluate(&plan, &analysis, date(1, 10), GrowthStage::Germination);
        assert!(recs.len() >= 2);
        assert!(recs.windows(2).all(|w| w[0].severity >= w[1].severity));
        assert_eq!(recs[0].id, "n_topdress");
        assert_eq!(recs[0].severity, Severity::Critical);
    }

    #[test]
    fn rules_are_listed() {
        let ids: Vec<&str> = RulesEngine::new().list_rules().iter().map(|r| r.0).collect();
        assert!(ids.contains(&"n_topdress"));
        assert!(ids.contains(&"overdue_applications"));
    }
}
