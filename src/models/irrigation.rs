use super::{CropPhase, Severity};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IrrigationAction {
    /// Crop demand is met by rainfall, or the root zone is at field capacity.
    NotNeeded,
    /// Root zone still holds readily available water.
    Forecast { days_until_due: u32 },
    IrrigateNow,
    /// Soil moisture at or below wilting point.
    IrrigateUrgently,
    /// No soil moisture reading; based on ETc and rainfall only.
    Estimate,
}

impl IrrigationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            IrrigationAction::NotNeeded => "Not Needed",
            IrrigationAction::Forecast { .. } => "Forecast",
            IrrigationAction::IrrigateNow => "Irrigate Now",
            IrrigationAction::IrrigateUrgently => "Irrigate Urgently",
            IrrigationAction::Estimate => "Estimate",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            IrrigationAction::NotNeeded => Severity::Info,
            IrrigationAction::Forecast { .. } | IrrigationAction::Estimate => Severity::Advisory,
            IrrigationAction::IrrigateNow => Severity::Warning,
            IrrigationAction::IrrigateUrgently => Severity::Critical,
        }
    }
}

impl std::fmt::Display for IrrigationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrigationRecommendation {
    pub field_id: String,
    pub date: NaiveDate,
    pub crop_phase: CropPhase,
    pub et0_mm: f64,
    pub kc: f64,
    pub etc_mm: f64,
    pub precipitation_mm: f64,
    pub effective_precipitation_mm: f64,
    pub net_irrigation_mm: f64,
    pub gross_irrigation_mm: f64,
    pub current_soil_moisture: Option<f64>,
    /// Root-zone depletion below field capacity, mm.
    pub depletion_mm: Option<f64>,
    /// Gross depth to bring the root zone back to field capacity.
    pub refill_gross_mm: Option<f64>,
    pub action: IrrigationAction,
    pub severity: Severity,
    pub recommended_action: String,
    pub is_estimate: bool,
}

/// One simulated day of a season water balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterBalanceDay {
    pub date: NaiveDate,
    pub etc_mm: f64,
    pub effective_precipitation_mm: f64,
    pub irrigation_net_mm: f64,
    pub irrigation_gross_mm: f64,
    pub deep_percolation_mm: f64,
    pub depletion_mm: f64,
    /// Water stress coefficient, 1.0 when unstressed.
    pub ks: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrigationSchedule {
    pub field_id: String,
    pub total_available_water_mm: f64,
    pub readily_available_water_mm: f64,
    pub days: Vec<WaterBalanceDay>,
}

impl IrrigationSchedule {
    pub fn irrigation_events(&self) -> impl Iterator<Item = &WaterBalanceDay> {
        self.days.iter().filter(|d| d.irrigation_net_mm > 0.0)
    }

    pub fn total_gross_irrigation(&self) -> f64 {
        self.days.iter().map(|d| d.irrigation_gross_mm).sum()
    }

    pub fn stressed_days(&self) -> usize {
        self.days.iter().filter(|d| d.ks < 1.0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_severity() {
        assert_eq!(IrrigationAction::NotNeeded.severity(), Severity::Info);
        assert_eq!(
            IrrigationAction::Forecast { days_until_due: 3 }.severity(),
            Severity::Advisory
        );
        assert_eq!(IrrigationAction::IrrigateNow.severity(), Severity::Warning);
        assert_eq!(
            IrrigationAction::IrrigateUrgently.severity(),
            Severity::Critical
        );
    }

    #[test]
    fn action_serializes_with_tag() {
        let json = serde_json::to_string(&IrrigationAction::Forecast { days_until_due: 4 }).unwrap();
        assert_eq!(json, r#"{"action":"forecast","days_until_due":4}"#);
    }
}
