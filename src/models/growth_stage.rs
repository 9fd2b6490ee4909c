use serde::{Deserialize, Serialize};

/// Phenological stage by fractional progress through the growing season.
/// Drives nutrient distribution and application timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GrowthStage {
    Sowing,
    Germination,
    Vegetative,
    Flowering,
    GrainFilling,
    Maturity,
    Harvest,
}

impl GrowthStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthStage::Sowing => "Sowing",
            GrowthStage::Germination => "Germination",
            GrowthStage::Vegetative => "Vegetative",
            GrowthStage::Flowering => "Flowering",
            GrowthStage::GrainFilling => "Grain Filling",
            GrowthStage::Maturity => "Maturity",
            GrowthStage::Harvest => "Harvest",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' ', '_'], "").as_str() {
            "sowing" => Some(GrowthStage::Sowing),
            "germination" => Some(GrowthStage::Germination),
            "vegetative" => Some(GrowthStage::Vegetative),
            "flowering" => Some(GrowthStage::Flowering),
            "grainfilling" => Some(GrowthStage::GrainFilling),
            "maturity" => Some(GrowthStage::Maturity),
            "harvest" => Some(GrowthStage::Harvest),
            _ => None,
        }
    }

    pub fn all() -> &'static [GrowthStage] {
        &[
            GrowthStage::Sowing,
            GrowthStage::Germination,
            GrowthStage::Vegetative,
            GrowthStage::Flowering,
            GrowthStage::GrainFilling,
            GrowthStage::Maturity,
            GrowthStage::Harvest,
        ]
    }
}

impl std::fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// FAO-56 crop development phase, partitioned by physical phase lengths.
/// Not interchangeable with [`GrowthStage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CropPhase {
    PreSowing,
    Initial,
    Development,
    MidSeason,
    LateSeason,
    Harvest,
}

impl CropPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropPhase::PreSowing => "Pre-Sowing",
            CropPhase::Initial => "Initial",
            CropPhase::Development => "Development",
            CropPhase::MidSeason => "Mid-Season",
            CropPhase::LateSeason => "Late Season",
            CropPhase::Harvest => "Harvest",
        }
    }
}

impl std::fmt::Display for CropPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_stage_round_trip() {
        for stage in GrowthStage::all() {
            let debug_str = format!("{:?}", stage);
            assert_eq!(
                GrowthStage::from_str(&debug_str),
                Some(*stage),
                "Round-trip failed for {:?}",
                stage
            );
        }
    }

    #[test]
    fn growth_stage_from_display_name() {
        assert_eq!(
            GrowthStage::from_str("Grain Filling"),
            Some(GrowthStage::GrainFilling)
        );
        assert_eq!(
            GrowthStage::from_str("grain_filling"),
            Some(GrowthStage::GrainFilling)
        );
        assert_eq!(GrowthStage::from_str("tillering"), None);
    }

    #[test]
    fn stages_are_ordered() {
        assert!(GrowthStage::Sowing < GrowthStage::Germination);
        assert!(GrowthStage::Maturity < GrowthStage::Harvest);
        assert!(CropPhase::PreSowing < CropPhase::Initial);
        assert!(CropPhase::LateSeason < CropPhase::Harvest);
    }
}
