pub mod accumulation;
pub mod analytes;
pub mod calendar;
pub mod coercion;
pub mod config;
pub mod coverage;
pub mod error;
pub mod nutrients;
pub mod pipelines;
pub mod reformatter;
pub mod series;

pub use error::{PipelineError, Result};
