pub mod advisor;
pub mod batch;
pub mod calculations;
pub mod crop_coefficient;
pub mod evapotranspiration;
pub mod fertilizer;
pub mod growth_stage;
pub mod irrigation;
pub mod rules;
pub mod water_balance;

pub use advisor::{FieldAdvisor, FieldReport};
pub use batch::{BatchReport, BatchRunner, FieldOutcome};
pub use crop_coefficient::kc;
pub use evapotranspiration::{calculate_et0, calculate_etc};
pub use fertilizer::{FertilizerPlanner, FertilizerPolicy};
pub use growth_stage::{GrowthStageClassifier, StageTable};
pub use irrigation::{FieldSite, IrrigationEngine, IrrigationPolicy};
pub use rules::RulesEngine;
