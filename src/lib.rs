pub mod adapters;
pub mod config;
pub mod evaluation;
pub mod fourier;
pub mod history;
pub mod logging;
pub mod news_impact;
pub mod oracle;
pub mod phase_space;
pub mod poisson;

pub use crate::oracle::{OracleIntegrator, OraclePrediction, PredictionRequest};

/// One prediction with the default ensemble settings.
pub fn predict(request: &PredictionRequest) -> OraclePrediction {
    OracleIntegrator::default().predict(request)
}
