//! Boundary between the engine and wherever field records live.

pub mod scenario;

pub use scenario::ScenarioStore;

use crate::error::Result;
use crate::models::{
    ApplicationRecord, CropCoefficientDefinition, CropVariety, FertilizerProduct, Field,
    FieldCondition, Soil, WeatherObservation,
};
use chrono::NaiveDate;

/// Daily weather series per field.
pub trait WeatherProvider: Send + Sync {
    /// All observations for the field, oldest first.
    fn observations(&self, field_id: &str) -> Result<Vec<WeatherObservation>>;

    fn observation_on(&self, field_id: &str, date: NaiveDate) -> Result<Option<WeatherObservation>> {
        Ok(self
            .observations(field_id)?
            .into_iter()
            .find(|o| o.date == date))
    }

    fn latest_observation(&self, field_id: &str) -> Result<Option<WeatherObservation>> {
        Ok(self
            .observations(field_id)?
            .into_iter()
            .max_by_key(|o| o.date))
    }
}

/// Field, soil and crop records. Lookups of unknown ids fail with `NotFound`.
pub trait FieldRepository: Send + Sync {
    fn field(&self, field_id: &str) -> Result<Field>;

    fn field_ids(&self) -> Result<Vec<String>>;

    fn soil(&self, soil_id: &str) -> Result<Soil>;

    fn crop_variety(&self, variety_id: &str) -> Result<CropVariety>;

    fn latest_condition(&self, field_id: &str) -> Result<Option<FieldCondition>>;

    /// Recorded outcomes of planned fertilizer applications, in recording order.
    fn application_records(&self, field_id: &str) -> Result<Vec<ApplicationRecord>>;

    fn fertilizer_products(&self) -> Result<Vec<FertilizerProduct>> {
        Ok(FertilizerProduct::catalog())
    }
}

pub trait CropCoefficientLookup: Send + Sync {
    fn profile_definition(&self, crop_type: &str) -> Result<CropCoefficientDefinition>;
}

/// A store that answers every boundary query.
pub trait FieldDataSource: WeatherProvider + FieldRepository + CropCoefficientLookup {}

impl<T> FieldDataSource for T where T: WeatherProvider + FieldRepository + CropCoefficientLookup {}
