use super::advisor::{FieldAdvisor, FieldReport};
use crate::datasources::FieldDataSource;
use crate::error::{FieldPlanError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldOutcome {
    Ok(Box<FieldReport>),
    Failed { field_id: String, error: String },
}

impl FieldOutcome {
    pub fn field_id(&self) -> &str {
        match self {
            FieldOutcome::Ok(report) => &report.field_id,
            FieldOutcome::Failed { field_id, .. } => field_id,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, FieldOutcome::Ok(_))
    }
}

/// One outcome per requested field, in request order.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub as_of: NaiveDate,
    pub outcomes: Vec<FieldOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Computes field reports on the blocking pool, at most `max_concurrency`
/// at a time.
pub struct BatchRunner<S> {
    advisor: Arc<FieldAdvisor<S>>,
    max_concurrency: usize,
}

impl<S: FieldDataSource + 'static> BatchRunner<S> {
    pub fn new(advisor: Arc<FieldAdvisor<S>>, max_concurrency: usize) -> Self {
        Self {
            advisor,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Every field the store knows about.
    pub async fn run(&self, as_of: NaiveDate) -> Result<BatchReport> {
        let field_ids = self.advisor.field_ids()?;
        Ok(self.run_fields(field_ids, as_of).await)
    }

    pub async fn run_fields(&self, field_ids: Vec<String>, as_of: NaiveDate) -> BatchReport {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(field_ids.len());

        for field_id in field_ids {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    handles.push((field_id, Err(FieldPlanError::Task(e.to_string()))));
                    continue;
                }
            };

            let advisor = Arc::clone(&self.advisor);
            let id = field_id.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                advisor.field_report(&id, as_of)
            });
            handles.push((field_id, Ok(handle)));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (field_id, handle) in handles {
            let result = match handle {
                Ok(handle) => handle
                    .await
                    .map_err(|e| FieldPlanError::Task(format!("Task join error: {}", e)))
                    .and_then(|r| r),
                Err(e) => Err(e),
            };

            outcomes.push(match result {
                Ok(report) => FieldOutcome::Ok(Box::new(report)),
                Err(e) => {
                    tracing::warn!(field = %field_id, error = %e, "field report failed");
                    FieldOutcome::Failed {
                        field_id,
                        error: e.to_string(),
                    }
                }
            });
        }

        let report = BatchReport { as_of, outcomes };
        tracing::info!(
            %as_of,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::datasources::{CropCoefficientLookup, FieldRepository, ScenarioStore, WeatherProvider};
    use crate::models::{
        ApplicationRecord, CropCoefficientDefinition, CropVariety, Field, FieldCondition, Soil,
        WeatherObservation,
    };

    fn demo() -> ScenarioStore {
        ScenarioStore::from_yaml_str(include_str!("../../demos/scenario.yaml")).unwrap()
    }

    fn may(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    /// Demo store with an extra field whose lookup panics.
    struct Faulty(ScenarioStore);

    impl WeatherProvider for Faulty {
        fn observations(&self, field_id: &str) -> Result<Vec<WeatherObservation>> {
            self.0.observations(field_id)
        }
    }

    impl FieldRepository for Faulty {
        fn field(&self, field_id: &str) -> Result<Field> {
            if field_id == "boom" {
                panic!("corrupt record");
            }
            self.0.field(field_id)
        }

        fn field_ids(&self) -> Result<Vec<String>> {
            let mut ids = self.0.field_ids()?;
            ids.insert(1, "boom".to_string());
            Ok(ids)
        }

        fn soil(&self, soil_id: &str) -> Result<Soil> {
            self.0.soil(soil_id)
        }

        fn crop_variety(&self, variety_id: &str) -> Result<CropVariety> {
            self.0.crop_variety(variety_id)
        }

        fn latest_condition(&self, field_id: &str) -> Result<Option<FieldCondition>> {
            self.0.latest_condition(field_id)
        }

        fn application_records(&self, field_id: &str) -> Result<Vec<ApplicationRecord>> {
            self.0.application_records(field_id)
        }
    }

    impl CropCoefficientLookup for Faulty {
        fn profile_definition(&self, crop_type: &str) -> Result<CropCoefficientDefinition> {
            self.0.profile_definition(crop_type)
        }
    }

    #[tokio::test]
    async fn reports_every_field_in_order() {
        let advisor = Arc::new(FieldAdvisor::new(demo(), &Config::default()).unwrap());
        let report = BatchRunner::new(advisor, 2).run(may(10)).await.unwrap();

        let ids: Vec<&str> = report.outcomes.iter().map(|o| o.field_id()).collect();
        assert_eq!(ids, vec!["north", "south"]);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 0);
    }

    #[tokio::test]
    async fn unknown_field_fails_alone() {
        let advisor = Arc::new(FieldAdvisor::new(demo(), &Config::default()).unwrap());
        let report = BatchRunner::new(advisor, 1)
            .run_fields(
                vec!["north".into(), "west".into(), "south".into()],
                may(10),
            )
            .await;

        assert_eq!(report.succeeded(), 2);
        match &report.outcomes[1] {
            FieldOutcome::Failed { field_id, error } => {
                assert_eq!(field_id, "west");
                assert!(error.contains("Not found"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn panicking_field_does_not_abort_batch() {
        let advisor = Arc::new(FieldAdvisor::new(Faulty(demo()), &Config::default()).unwrap());
        let report = BatchRunner::new(advisor, 4).run(may(10)).await.unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert!(!report.outcomes[1].is_ok());
        assert_eq!(report.outcomes[1].field_id(), "boom");
    }

    #[test]
    fn zero_concurrency_is_raised_to_one() {
        let advisor = Arc::new(FieldAdvisor::new(demo(), &Config::default()).unwrap());
        assert_eq!(BatchRunner::new(advisor, 0).max_concurrency, 1);
    }
}
