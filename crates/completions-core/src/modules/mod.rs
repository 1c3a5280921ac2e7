pub mod aggregation;
pub mod export;
pub mod intersection;
pub mod msw;
pub mod serialization;
pub mod tables;
pub mod transmissibility;

mod traits;

pub use traits::{CompletionGenerator, WellCompletionRequest};
