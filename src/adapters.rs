//! Shapes handed to callers outside the engine. Nothing in the engine reads
//! these back.

use serde::{Deserialize, Serialize};

use crate::oracle::OraclePrediction;
use crate::phase_space::PhasePoint;

/// Flat single-confidence view kept for older dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPrediction {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
    pub gg: f64,
    pub over25: f64,
    pub over15: f64,
    pub under25: f64,
    pub confidence: f64,
    #[serde(rename = "adjustedHomeXG")]
    pub adjusted_home_xg: f64,
    #[serde(rename = "adjustedAwayXG")]
    pub adjusted_away_xg: f64,
    pub home_momentum: f64,
    pub away_momentum: f64,
    pub explanation: Vec<String>,
    pub simulation_cloud: Vec<PhasePoint>,
}

impl From<&OraclePrediction> for LegacyPrediction {
    fn from(p: &OraclePrediction) -> Self {
        let markets = &p.predictions;
        Self {
            home_win: markets.one_x_two.home_win,
            draw: markets.one_x_two.draw,
            away_win: markets.one_x_two.away_win,
            gg: markets.gg.yes,
            over25: markets.over_25.yes,
            over15: p.raw_probabilities.over15,
            under25: markets.over_25.no,
            confidence: markets.one_x_two.confidence,
            adjusted_home_xg: p.adjusted_home_xg,
            adjusted_away_xg: p.adjusted_away_xg,
            home_momentum: p.home_momentum,
            away_momentum: p.away_momentum,
            explanation: p.explanation.clone(),
            simulation_cloud: p.simulation_cloud.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictedOutcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl PredictedOutcome {
    /// Home wins ties with anything, away wins ties with the draw.
    pub fn from_probs(home: f64, draw: f64, away: f64) -> Self {
        if home >= draw.max(away) {
            PredictedOutcome::HomeWin
        } else if away >= draw.max(home) {
            PredictedOutcome::AwayWin
        } else {
            PredictedOutcome::Draw
        }
    }
}

/// One row for the predictions table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub home_team: String,
    pub away_team: String,
    pub home_xg: f64,
    pub away_xg: f64,
    pub prob_home: f64,
    pub prob_draw: f64,
    pub prob_away: f64,
    pub predicted_outcome: PredictedOutcome,
}

impl PredictionRecord {
    pub fn from_prediction(home_team: &str, away_team: &str, p: &OraclePrediction) -> Self {
        let m = p.predictions.one_x_two;
        Self {
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            home_xg: p.adjusted_home_xg,
            away_xg: p.adjusted_away_xg,
            prob_home: m.home_win,
            prob_draw: m.draw,
            prob_away: m.away_win,
            predicted_outcome: PredictedOutcome::from_probs(m.home_win, m.draw, m.away_win),
        }
    }
}
