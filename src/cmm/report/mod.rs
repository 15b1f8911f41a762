pub mod config;
pub mod distribute;
pub mod error;
pub mod extract;
pub mod io;
pub mod logging;
pub mod model;
pub mod run;

pub use error::{ReportError, Result};
