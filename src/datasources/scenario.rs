use super::{CropCoefficientLookup, FieldRepository, WeatherProvider};
use crate::error::{FieldPlanError, Result};
use crate::models::{
    ApplicationRecord, CropCoefficientDefinition, CropVariety, FertilizerProduct, Field,
    FieldCondition, Soil, WeatherObservation,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// In-memory field data loaded from a single YAML document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioStore {
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub soils: Vec<Soil>,
    #[serde(default)]
    pub crop_varieties: Vec<CropVariety>,
    #[serde(default)]
    pub crop_coefficients: Vec<CropCoefficientDefinition>,
    #[serde(default)]
    pub conditions: Vec<FieldCondition>,
    #[serde(default)]
    pub applications: Vec<ApplicationRecord>,
    /// Overrides the built-in product catalog when present.
    #[serde(default)]
    pub products: Option<Vec<FertilizerProduct>>,
    /// Daily series keyed by field id.
    #[serde(default)]
    pub weather: BTreeMap<String, Vec<WeatherObservation>>,
}

impl ScenarioStore {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FieldPlanError::Config(format!(
                "Failed to read scenario file {}: {}",
                path.display(),
                e
            ))
        })?;
        let store = Self::from_yaml_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            fields = store.fields.len(),
            "loaded scenario"
        );
        Ok(store)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut store: ScenarioStore = serde_yaml::from_str(content)?;
        for series in store.weather.values_mut() {
            series.sort_by_key(|o| o.date);
        }
        store.validate()?;
        Ok(store)
    }

    /// Referential integrity between the record sets.
    pub fn validate(&self) -> Result<()> {
        for soil in &self.soils {
            soil.water_parameters()?;
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.id.as_str()) {
                return Err(FieldPlanError::InvalidData(format!(
                    "duplicate field id {}",
                    field.id
                )));
            }
            if !self.soils.iter().any(|s| s.id == field.soil_id) {
                return Err(FieldPlanError::InvalidData(format!(
                    "field {} references unknown soil {}",
                    field.id, field.soil_id
                )));
            }
            let variety = self
                .crop_varieties
                .iter()
                .find(|v| v.id == field.crop_variety_id)
                .ok_or_else(|| {
                    FieldPlanError::InvalidData(format!(
                        "field {} references unknown crop variety {}",
                        field.id, field.crop_variety_id
                    ))
                })?;
            if !self
                .crop_coefficients
                .iter()
                .any(|c| c.crop_type == variety.crop_type)
            {
                return Err(FieldPlanError::InvalidData(format!(
                    "no crop coefficients for crop type {} (field {})",
                    variety.crop_type, field.id
                )));
            }
        }

        let known = |id: &str| self.fields.iter().any(|f| f.id == id);
        let orphans = self
            .conditions
            .iter()
            .map(|c| c.field_id.as_str())
            .chain(self.applications.iter().map(|a| a.field_id.as_str()))
            .chain(self.weather.keys().map(String::as_str));
        for id in orphans {
            if !known(id) {
                return Err(FieldPlanError::InvalidData(format!(
                    "record references unknown field {}",
                    id
                )));
            }
        }
        Ok(())
    }
}

impl WeatherProvider for ScenarioStore {
    fn observations(&self, field_id: &str) -> Result<Vec<WeatherObservation>> {
        Ok(self.weather.get(field_id).cloned().unwrap_or_default())
    }
}

impl FieldRepository for ScenarioStore {
    fn field(&self, field_id: &str) -> Result<Field> {
        self.fields
            .iter()
            .find(|f| f.id == field_id)
            .cloned()
            .ok_or_else(|| FieldPlanError::NotFound(format!("field {}", field_id)))
    }

    fn field_ids(&self) -> Result<Vec<String>> {
        Ok(self.fields.iter().map(|f| f.id.clone()).collect())
    }

    fn soil(&self, soil_id: &str) -> Result<Soil> {
        self.soils
            .iter()
            .find(|s| s.id == soil_id)
            .cloned()
            .ok_or_else(|| FieldPlanError::NotFound(format!("soil {}", soil_id)))
    }

    fn crop_variety(&self, variety_id: &str) -> Result<CropVariety> {
        self.crop_varieties
            .iter()
            .find(|v| v.id == variety_id)
            .cloned()
            .ok_or_else(|| FieldPlanError::NotFound(format!("crop variety {}", variety_id)))
    }

    fn latest_condition(&self, field_id: &str) -> Result<Option<FieldCondition>> {
        Ok(self
            .conditions
            .iter()
            .filter(|c| c.field_id == field_id)
            .max_by_key(|c| c.observed_on)
            .cloned())
    }

    fn application_records(&self, field_id: &str) -> Result<Vec<ApplicationRecord>> {
        Ok(self
            .applications
            .iter()
            .filter(|a| a.field_id == field_id)
            .cloned()
            .collect())
    }

    fn fertilizer_products(&self) -> Result<Vec<FertilizerProduct>> {
        Ok(self
            .products
            .clone()
            .unwrap_or_else(FertilizerProduct::catalog))
    }
}

impl CropCoefficientLookup for ScenarioStore {
    fn profile_definition(&self, crop_type: &str) -> Result<CropCoefficientDefinition> {
        self.crop_coefficients
            .iter()
            .find(|c| c.crop_type == crop_type)
            .cloned()
            .ok_or_else(|| {
                FieldPlanError::NotFound(format!("crop coefficients for {}", crop_type))
            })
    }
}
