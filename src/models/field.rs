use super::{GrowthStage, NutrientVector};
use crate::error::{FieldPlanError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrigationMethod {
    Drip,
    Sprinkler,
    CenterPivot,
    Surface,
    None,
}

impl IrrigationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            IrrigationMethod::Drip => "Drip",
            IrrigationMethod::Sprinkler => "Sprinkler",
            IrrigationMethod::CenterPivot => "Center Pivot",
            IrrigationMethod::Surface => "Surface/Furrow",
            IrrigationMethod::None => "None",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' ', '_'], "").as_str() {
            "drip" | "trickle" => Some(IrrigationMethod::Drip),
            "sprinkler" => Some(IrrigationMethod::Sprinkler),
            "centerpivot" | "pivot" => Some(IrrigationMethod::CenterPivot),
            "surface" | "furrow" | "flood" | "surface/furrow" => Some(IrrigationMethod::Surface),
            "none" | "rainfed" => Some(IrrigationMethod::None),
            _ => None,
        }
    }

    pub fn all() -> &'static [IrrigationMethod] {
        &[
            IrrigationMethod::Drip,
            IrrigationMethod::Sprinkler,
            IrrigationMethod::CenterPivot,
            IrrigationMethod::Surface,
            IrrigationMethod::None,
        ]
    }
}

impl std::fmt::Display for IrrigationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoilType {
    Clay,
    Loam,
    Sandy,
    SiltLoam,
    ClayLoam,
    SandyLoam,
}

impl SoilType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Clay => "Clay",
            SoilType::Loam => "Loam",
            SoilType::Sandy => "Sandy",
            SoilType::SiltLoam => "Silt Loam",
            SoilType::ClayLoam => "Clay Loam",
            SoilType::SandyLoam => "Sandy Loam",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "clay" => Some(SoilType::Clay),
            "loam" => Some(SoilType::Loam),
            "sandy" | "sand" => Some(SoilType::Sandy),
            "siltloam" | "silt loam" => Some(SoilType::SiltLoam),
            "clayloam" | "clay loam" => Some(SoilType::ClayLoam),
            "sandyloam" | "sandy loam" => Some(SoilType::SandyLoam),
            _ => None,
        }
    }

    /// Mid-range field capacity and wilting point from FAO-56 Table 19,
    /// with p = 0.5.
    pub fn typical_water_parameters(&self) -> SoilWaterParameters {
        let (fc, wp) = match self {
            SoilType::Sandy => (0.12, 0.045),
            SoilType::SandyLoam => (0.175, 0.075),
            SoilType::Loam => (0.25, 0.12),
            SoilType::SiltLoam => (0.29, 0.12),
            SoilType::ClayLoam => (0.32, 0.19),
            SoilType::Clay => (0.36, 0.22),
        };
        SoilWaterParameters {
            field_capacity: fc,
            wilting_point: wp,
            allowable_depletion: 0.5,
        }
    }
}

impl std::fmt::Display for SoilType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Volumetric soil water constants. `wilting_point < field_capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSoilWater")]
pub struct SoilWaterParameters {
    field_capacity: f64,
    wilting_point: f64,
    allowable_depletion: f64,
}

#[derive(Deserialize)]
struct RawSoilWater {
    field_capacity: f64,
    wilting_point: f64,
    allowable_depletion: f64,
}

impl TryFrom<RawSoilWater> for SoilWaterParameters {
    type Error = FieldPlanError;

    fn try_from(raw: RawSoilWater) -> Result<Self> {
        Self::new(raw.field_capacity, raw.wilting_point, raw.allowable_depletion)
    }
}

impl SoilWaterParameters {
    pub fn new(field_capacity: f64, wilting_point: f64, allowable_depletion: f64) -> Result<Self> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(field_capacity) || !in_unit(wilting_point) || !in_unit(allowable_depletion) {
            return Err(FieldPlanError::InvalidInput(format!(
                "soil water fractions must lie in 0..1 (fc={}, wp={}, p={})",
                field_capacity, wilting_point, allowable_depletion
            )));
        }
        if wilting_point >= field_capacity {
            return Err(FieldPlanError::InvalidInput(format!(
                "wilting point ({}) must be below field capacity ({})",
                wilting_point, field_capacity
            )));
        }
        Ok(Self {
            field_capacity,
            wilting_point,
            allowable_depletion,
        })
    }

    pub fn field_capacity(&self) -> f64 {
        self.field_capacity
    }

    pub fn wilting_point(&self) -> f64 {
        self.wilting_point
    }

    pub fn allowable_depletion(&self) -> f64 {
        self.allowable_depletion
    }

    /// Plant-available water per metre of root zone, mm/m.
    pub fn available_water_per_m(&self) -> f64 {
        1000.0 * (self.field_capacity - self.wilting_point)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Soil {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub soil_type: Option<SoilType>,
    /// Measured constants. When absent the texture class supplies typical ones.
    #[serde(default)]
    pub water: Option<SoilWaterParameters>,
}

impl Soil {
    pub fn water_parameters(&self) -> Result<SoilWaterParameters> {
        self.water
            .or_else(|| self.soil_type.map(|t| t.typical_water_parameters()))
            .ok_or_else(|| {
                FieldPlanError::InvalidData(format!(
                    "soil {} has neither water parameters nor a soil type",
                    self.id
                ))
            })
    }
}

/// Seasonal uptake of a crop at a reference yield.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropNutrientRequirement {
    pub reference_yield_t_ha: f64,
    pub uptake: NutrientVector,
}

impl CropNutrientRequirement {
    pub fn new(reference_yield_t_ha: f64, uptake: NutrientVector) -> Self {
        Self {
            reference_yield_t_ha,
            uptake,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropVariety {
    pub id: String,
    pub name: String,
    /// Key for the crop-coefficient definition lookup.
    pub crop_type: String,
    pub nutrient_requirement: CropNutrientRequirement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub elevation_m: f64,
    #[serde(default)]
    pub area_ha: Option<f64>,
    pub soil_id: String,
    pub crop_variety_id: String,
    pub planting_date: NaiveDate,
    pub target_yield_t_ha: f64,
    pub irrigation_method: IrrigationMethod,
    /// Effective rooting depth; the configured default applies when absent.
    #[serde(default)]
    pub root_depth_m: Option<f64>,
}

/// Latest soil-state snapshot for a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldCondition {
    pub field_id: String,
    pub observed_on: NaiveDate,
    /// Volumetric water content, 0..1.
    #[serde(default)]
    pub soil_moisture: Option<f64>,
    /// Plant-available nutrients the soil is expected to supply this season.
    pub nutrient_supply: NutrientVector,
}

/// A fertilizer product and its nutrient content as mass fractions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FertilizerProduct {
    pub name: String,
    pub content: NutrientVector,
}

impl FertilizerProduct {
    pub fn new(name: &str, content: NutrientVector) -> Self {
        Self {
            name: name.to_string(),
            content,
        }
    }

    /// Product rate (kg/ha) delivering `kg_ha` of `nutrient`.
    pub fn rate_for(&self, nutrient: super::Nutrient, kg_ha: f64) -> Option<f64> {
        let fraction = self.content.get(nutrient);
        (fraction > 0.0).then(|| kg_ha / fraction)
    }

    /// Common straight fertilizers, elemental content.
    pub fn catalog() -> Vec<FertilizerProduct> {
        use super::Nutrient;
        vec![
            FertilizerProduct::new(
                "Urea (46-0-0)",
                NutrientVector::zero().with(Nutrient::Nitrogen, 0.46),
            ),
            FertilizerProduct::new(
                "Calcium ammonium nitrate",
                NutrientVector::zero()
                    .with(Nutrient::Nitrogen, 0.27)
                    .with(Nutrient::Calcium, 0.08),
            ),
            FertilizerProduct::new(
                "Triple superphosphate",
                NutrientVector::zero()
                    .with(Nutrient::Phosphorus, 0.20)
                    .with(Nutrient::Calcium, 0.14),
            ),
            FertilizerProduct::new(
                "Muriate of potash",
                NutrientVector::zero().with(Nutrient::Potassium, 0.50),
            ),
            FertilizerProduct::new(
                "Ammonium sulfate",
                NutrientVector::zero()
                    .with(Nutrient::Nitrogen, 0.21)
                    .with(Nutrient::Sulfur, 0.24),
            ),
            FertilizerProduct::new(
                "Gypsum",
                NutrientVector::zero()
                    .with(Nutrient::Calcium, 0.23)
                    .with(Nutrient::Sulfur, 0.18),
            ),
            FertilizerProduct::new(
                "Kieserite",
                NutrientVector::zero()
                    .with(Nutrient::Magnesium, 0.15)
                    .with(Nutrient::Sulfur, 0.20),
            ),
        ]
    }
}

/// Externally recorded outcome for one planned application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub field_id: String,
    /// Sequence number of the planned application, or the stage it targets.
    #[serde(default)]
    pub sequence: Option<u32>,
    #[serde(default)]
    pub stage: Option<GrowthStage>,
    pub outcome: RecordedOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordedOutcome {
    Completed { applied_on: NaiveDate },
    Skipped,
}
