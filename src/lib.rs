//! Pre/post comparison of developer-experience metrics around an intervention
//! date, using the Mann-Whitney U test per research question and workforce mode.

pub mod analyze;
pub mod model;
pub mod report;
pub mod utils;

pub use model::{Error, Result};
