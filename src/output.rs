//! Plain-text rendering for the CLI.

use fieldplan::logic::calculations::WeatherSummary;
use fieldplan::logic::{BatchReport, FieldOutcome};
use fieldplan::models::{
    IrrigationRecommendation, IrrigationSchedule, NutrientBalance, Recommendation,
    SeasonFertilizerPlan,
};
use std::fmt::Write;

pub fn irrigation(rec: &IrrigationRecommendation) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} on {} ({})",
        rec.severity.symbol(),
        rec.field_id,
        rec.date,
        rec.crop_phase
    );
    let _ = writeln!(
        out,
        "  ET0 {:.2} mm  Kc {:.2}  ETc {:.2} mm",
        rec.et0_mm, rec.kc, rec.etc_mm
    );
    let _ = writeln!(
        out,
        "  Rain {:.1} mm (effective {:.1} mm)",
        rec.precipitation_mm, rec.effective_precipitation_mm
    );
    let _ = writeln!(
        out,
        "  Net {:.2} mm  Gross {:.2} mm",
        rec.net_irrigation_mm, rec.gross_irrigation_mm
    );
    if let (Some(moisture), Some(depletion)) = (rec.current_soil_moisture, rec.depletion_mm) {
        let _ = writeln!(
            out,
            "  Soil moisture {:.3}  Depletion {:.1} mm",
            moisture, depletion
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", rec.recommended_action);
    out
}

pub fn schedule(schedule: &IrrigationSchedule, weather: Option<&WeatherSummary>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: TAW {:.1} mm, RAW {:.1} mm",
        schedule.field_id, schedule.total_available_water_mm, schedule.readily_available_water_mm
    );
    if let Some(w) = weather {
        let _ = writeln!(
            out,
            "Weather {} to {}: {:.1} mm rain, {:.0} GDD, longest dry spell {} days",
            w.from, w.to, w.total_precipitation_mm, w.growing_degree_days, w.longest_dry_spell_days
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<10}  {:>6}  {:>6}  {:>7}  {:>6}  {:>7}  {:>4}",
        "date", "ETc", "Peff", "irrig", "perc", "depl", "Ks"
    );
    for day in &schedule.days {
        let _ = writeln!(
            out,
            "{:<10}  {:>6.2}  {:>6.1}  {:>7.1}  {:>6.1}  {:>7.1}  {:>4.2}",
            day.date,
            day.etc_mm,
            day.effective_precipitation_mm,
            day.irrigation_gross_mm,
            day.deep_percolation_mm,
            day.depletion_mm,
            day.ks
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} irrigation event(s), {:.1} mm gross, {} stressed day(s)",
        schedule.irrigation_events().count(),
        schedule.total_gross_irrigation(),
        schedule.stressed_days()
    );
    out
}

pub fn plan(plan: &SeasonFertilizerPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: sown {}, target {:.1} t/ha",
        plan.field_id, plan.sowing_date, plan.target_yield_t_ha
    );
    let _ = writeln!(out, "  Requirement  {}", plan.total_requirement);
    let _ = writeln!(out, "  Soil supply  {}", plan.soil_supply);
    let _ = writeln!(out, "  Fertilizer   {}", plan.fertilizer_requirement);
    let _ = writeln!(out);
    for app in &plan.applications {
        let _ = writeln!(
            out,
            "#{} {} {} ({}, day {}) [{}]",
            app.sequence,
            app.target_date,
            app.stage,
            app.method,
            app.days_after_planting,
            app.status
        );
        let _ = writeln!(out, "   {}", app.nutrients);
        if let Some(applied) = app.actual_application_date {
            let _ = writeln!(out, "   applied {}", applied);
        }
        let _ = writeln!(out, "   {}", app.rationale);
    }
    out
}

fn recommendation(out: &mut String, rec: &Recommendation) {
    let _ = writeln!(out, "{} {}", rec.severity.symbol(), rec.title);
    let _ = writeln!(out, "  {}", rec.description);
    for dp in &rec.data_points {
        let _ = writeln!(out, "    {}: {}", dp.label, dp.value);
    }
    if !rec.explanation.is_empty() {
        let _ = writeln!(out, "  Why: {}", rec.explanation);
    }
    if let Some(ref action) = rec.suggested_action {
        let _ = writeln!(out, "  Suggested action: {}", action);
    }
}

pub fn balance(balance: &NutrientBalance) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} as of {}: {}",
        balance.field_id, balance.as_of, balance.status
    );
    let _ = writeln!(out, "  Required   {}", balance.required);
    let _ = writeln!(out, "  Available  {}", balance.available);
    let _ = writeln!(out, "  Applied    {}", balance.applied);
    let _ = writeln!(out, "  Pending    {}", balance.pending);
    let _ = writeln!(out, "  Deficit    {}", balance.deficit);
    let _ = writeln!(out, "  Surplus    {}", balance.surplus);

    if !balance.deficits.is_empty() {
        let _ = writeln!(out);
        for d in &balance.deficits {
            let _ = writeln!(
                out,
                "{} {} short {:.1} kg/ha ({:.0}%): {}",
                d.urgency.symbol(),
                d.nutrient,
                d.deficit_kg_ha,
                d.relative_deficit * 100.0,
                d.symptom
            );
        }
    }

    for (heading, recs) in [
        ("Warnings", &balance.warnings),
        ("Recommendations", &balance.recommendations),
    ] {
        if recs.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}:", heading);
        for rec in recs {
            recommendation(&mut out, rec);
        }
    }
    out
}

pub fn batch(report: &BatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Batch as of {}: {} ok, {} failed",
        report.as_of,
        report.succeeded(),
        report.failed()
    );
    for outcome in &report.outcomes {
        match outcome {
            FieldOutcome::Ok(r) => {
                let irrigation = r
                    .irrigation
                    .as_ref()
                    .map(|i| format!("{} {}", i.severity.symbol(), i.action.as_str()))
                    .unwrap_or_else(|| "no weather".to_string());
                let _ = writeln!(
                    out,
                    "  {:<12} {:<13} irrigation: {:<24} nutrients: {} ({} warning(s))",
                    r.field_id,
                    r.growth_stage.as_str(),
                    irrigation,
                    r.nutrient_balance.status,
                    r.nutrient_balance.warnings.len()
                );
            }
            FieldOutcome::Failed { field_id, error } => {
                let _ = writeln!(out, "  {:<12} FAILED: {}", field_id, error);
            }
        }
    }
    out
}
