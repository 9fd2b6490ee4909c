pub mod fertilizer;
pub mod field;
pub mod growth_stage;
pub mod irrigation;
pub mod nutrient;
pub mod recommendation;
pub mod season;
pub mod weather;

pub use fertilizer::*;
pub use field::*;
pub use growth_stage::*;
pub use irrigation::*;
pub use nutrient::*;
pub use recommendation::*;
pub use season::*;
pub use weather::*;
