pub mod analyzer;
pub mod buckets;
pub mod metrics;
mod model;
pub mod patterns;
pub mod stats;

pub use analyzer::{Analyzer, PreparedSources};
pub use metrics::{MetricDescriptor, METRICS};
pub use model::{DataAnalysis, QuestionAnalyzed};
pub use stats::{InsufficientData, MannWhitney};
