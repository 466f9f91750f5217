mod error;
mod logging;
mod report;

pub use error::*;
pub use logging::*;
pub use report::*;
