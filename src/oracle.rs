use std::f64::consts::PI;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BaseWeights, EnsembleConfig};
use crate::fourier::{self, WaveAnalysis, WaveDirection};
use crate::history::{self, MatchRecord};
use crate::news_impact::{self, NewsImpactItem};
use crate::phase_space::{self, PhasePoint, PhaseSpaceEngine, PointKind};
use crate::poisson::{MatchProbabilities, PoissonModel};

const MIN_XG: f64 = 0.1;
const DEFAULT_GEOMETRIC_CONFIDENCE: f64 = 0.5;
const MIN_GEOMETRIC_CONFIDENCE: f64 = 0.3;
const MARKET_CONFIDENCE_CAP: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub home_team: String,
    pub away_team: String,
    pub base_home_xg: f64,
    pub base_away_xg: f64,
    #[serde(default)]
    pub home_history: Vec<MatchRecord>,
    #[serde(default)]
    pub away_history: Vec<MatchRecord>,
    #[serde(default)]
    pub home_news: Vec<NewsImpactItem>,
    #[serde(default)]
    pub away_news: Vec<NewsImpactItem>,
    #[serde(default)]
    pub match_date: Option<String>,
    /// Reference time for news decay.
    pub as_of: DateTime<Utc>,
}

impl PredictionRequest {
    pub fn new(
        home_team: &str,
        away_team: &str,
        base_home_xg: f64,
        base_away_xg: f64,
        as_of: DateTime<Utc>,
    ) -> Self {
        Self {
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            base_home_xg,
            base_away_xg,
            home_history: Vec::new(),
            away_history: Vec::new(),
            home_news: Vec::new(),
            away_news: Vec::new(),
            match_date: None,
            as_of,
        }
    }

    pub fn with_histories(mut self, home: Vec<MatchRecord>, away: Vec<MatchRecord>) -> Self {
        self.home_history = home;
        self.away_history = away;
        self
    }

    pub fn with_news(mut self, home: Vec<NewsImpactItem>, away: Vec<NewsImpactItem>) -> Self {
        self.home_news = home;
        self.away_news = away;
        self
    }

    pub fn with_match_date(mut self, date: &str) -> Self {
        self.match_date = Some(date.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneXTwo {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YesNo {
    pub yes: f64,
    pub no: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Markets {
    #[serde(rename = "1X2")]
    pub one_x_two: OneXTwo,
    #[serde(rename = "GG")]
    pub gg: YesNo,
    #[serde(rename = "over_2.5")]
    pub over_25: YesNo,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewsDelta {
    pub home: f64,
    pub away: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactors {
    pub fourier_weight: f64,
    pub poisson_weight: f64,
    pub montecarlo_weight: f64,
    pub news_impact: NewsDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OraclePrediction {
    #[serde(rename = "match")]
    pub fixture: String,
    pub date: String,
    pub predictions: Markets,
    pub contributing_factors: ContributingFactors,
    pub adjusted_home_xg: f64,
    pub adjusted_away_xg: f64,
    pub home_momentum: f64,
    pub away_momentum: f64,
    pub explanation: Vec<String>,
    pub simulation_cloud: Vec<PhasePoint>,
    pub raw_probabilities: MatchProbabilities,
}

impl OraclePrediction {
    pub fn prediction_point(&self, trajectory: &[PhasePoint]) -> PhasePoint {
        let time = trajectory.last().map(|p| p.time + 1).unwrap_or(0);
        PhasePoint::new(time, self.adjusted_home_xg, self.adjusted_away_xg)
            .tagged(PointKind::Prediction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleWeights {
    pub weights: BaseWeights,
    pub overall_confidence: f64,
}

#[derive(Debug, Clone, Default)]
pub struct OracleIntegrator {
    config: EnsembleConfig,
    poisson: PoissonModel,
}

impl OracleIntegrator {
    pub fn new(config: EnsembleConfig) -> Self {
        Self {
            config: config.sanitized(),
            poisson: PoissonModel::default(),
        }
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn predict(&self, req: &PredictionRequest) -> OraclePrediction {
        let cfg = &self.config;
        let home = req.home_team.as_str();
        let away = req.away_team.as_str();
        let mut explanation = Vec::new();

        // 1. Form waves.
        let home_wave = fourier::analyze_form_wave(
            &fourier::matches_to_signal(&req.home_history, home),
            cfg.top_frequencies,
        );
        let away_wave = fourier::analyze_form_wave(
            &fourier::matches_to_signal(&req.away_history, away),
            cfg.top_frequencies,
        );
        let home_fourier_conf = fourier_confidence(&home_wave);
        let away_fourier_conf = fourier_confidence(&away_wave);
        let fourier_conf = (home_fourier_conf + away_fourier_conf) / 2.0;

        explanation.push(describe_wave(home, &home_wave, home_fourier_conf));
        explanation.push(describe_wave(away, &away_wave, away_fourier_conf));

        // 2. News.
        let home_news =
            news_impact::team_news_impact(&req.home_news, req.as_of, cfg.news_half_life_hours);
        let away_news =
            news_impact::team_news_impact(&req.away_news, req.as_of, cfg.news_half_life_hours);
        for (team, impact) in [(home, &home_news), (away, &away_news)] {
            if !impact.factors.is_empty() {
                explanation.push(format!("News: {team} factors: {}", impact.factors.join(", ")));
            }
        }

        // 3. Momentum and news scale each side's xG.
        let mut adj_home = req.base_home_xg
            * (1.0 + home_wave.momentum * cfg.momentum_influence)
            * home_news.attack_modifier;
        let mut adj_away = req.base_away_xg
            * (1.0 + away_wave.momentum * cfg.momentum_influence)
            * away_news.attack_modifier;

        // 4. Venue.
        adj_home *= cfg.home_advantage_factor;
        explanation.push(format!(
            "Venue: home advantage {:+.0}% applied to {home}",
            (cfg.home_advantage_factor - 1.0) * 100.0
        ));
        debug!(home, away, adj_home, adj_away, "xG after momentum, news and venue");

        // 5. Home trajectory velocity and stability.
        let trajectory = history::goals_trajectory(&req.home_history, home);
        let mut geometric_conf = DEFAULT_GEOMETRIC_CONFIDENCE;
        if let [.., prev, last] = trajectory.as_slice() {
            let vx = phase_space::velocity(prev, last).vx;
            adj_home *= 1.0 + vx * cfg.velocity_influence;

            if let [.., p1, p2, p3] = trajectory.as_slice() {
                let turn = phase_space::curvature(p1, p2, p3);
                geometric_conf = (1.0 - turn / PI).max(MIN_GEOMETRIC_CONFIDENCE);
            }

            let trend = if vx > 0.0 { "increasing" } else { "decreasing" };
            explanation.push(format!(
                "Geometric: {home} velocity {trend} (conf: {:.0}%)",
                geometric_conf * 100.0
            ));
        }

        // 6. Seeded Monte Carlo cloud.
        let seed = derive_seed(home, away, req.base_home_xg, req.base_away_xg);
        let mut engine = PhaseSpaceEngine::seeded(seed);
        let cloud = engine.run_monte_carlo(&trajectory, cfg.monte_carlo_iterations);
        let (_, cloud_std) = cloud_spread(&cloud, adj_home);
        let mc_conf = (1.0 - cloud_std / 3.0).clamp(0.2, MARKET_CONFIDENCE_CAP);
        explanation.push(format!(
            "Monte Carlo: volatility {:.2}, confidence {:.0}%",
            cloud_std,
            mc_conf * 100.0
        ));
        debug!(seed, samples = cloud.len(), cloud_std, mc_conf, "monte carlo cloud");

        // 7. Scoreline model.
        adj_home = adj_home.max(MIN_XG);
        adj_away = adj_away.max(MIN_XG);
        let probs = self.poisson.calculate(adj_home, adj_away);
        explanation.push(format!(
            "Poisson: adjusted xG {adj_home:.2} vs {adj_away:.2} -> 1/X/2 {:.0}%/{:.0}%/{:.0}%",
            probs.home_win * 100.0,
            probs.draw * 100.0,
            probs.away_win * 100.0
        ));

        // 8. Ensemble weights.
        let ensemble = self.ensemble_weights(fourier_conf, 1.0, mc_conf, geometric_conf);
        let w = ensemble.weights;
        explanation.push(format!(
            "Ensemble weights: Fourier {:.0}%, Poisson {:.0}%, MC {:.0}%",
            w.fourier * 100.0,
            w.poisson * 100.0,
            w.montecarlo * 100.0
        ));

        // 9. Market confidence.
        let overall = ensemble.overall_confidence;
        let combined_momentum = (home_wave.momentum + away_wave.momentum).abs();
        let gg_conf = (overall * 0.9 * (1.0 + combined_momentum * 0.1)).min(MARKET_CONFIDENCE_CAP);
        let total_xg = adj_home + adj_away;
        let over_conf =
            (overall * (0.8 + (total_xg * 0.05).min(0.2))).min(MARKET_CONFIDENCE_CAP);
        explanation.push(format!(
            "Confidence: 1X2 {:.0}%, GG {:.0}%, over 2.5 {:.0}%",
            overall * 100.0,
            gg_conf * 100.0,
            over_conf * 100.0
        ));
        debug!(overall, gg_conf, over_conf, "market confidence");

        OraclePrediction {
            fixture: format!("{home} vs {away}"),
            date: req
                .match_date
                .clone()
                .unwrap_or_else(|| req.as_of.date_naive().to_string()),
            predictions: Markets {
                one_x_two: OneXTwo {
                    home_win: round3(probs.home_win),
                    draw: round3(probs.draw),
                    away_win: round3(probs.away_win),
                    confidence: round3(overall),
                },
                gg: YesNo {
                    yes: round3(probs.gg),
                    no: round3(probs.gg_no),
                    confidence: round3(gg_conf),
                },
                over_25: YesNo {
                    yes: round3(probs.over25),
                    no: round3(probs.under25),
                    confidence: round3(over_conf),
                },
            },
            contributing_factors: ContributingFactors {
                fourier_weight: round3(w.fourier),
                poisson_weight: round3(w.poisson),
                montecarlo_weight: round3(w.montecarlo),
                news_impact: NewsDelta {
                    home: round3(home_news.overall_modifier - 1.0),
                    away: round3(away_news.overall_modifier - 1.0),
                },
            },
            adjusted_home_xg: round3(adj_home),
            adjusted_away_xg: round3(adj_away),
            home_momentum: round3(home_wave.momentum),
            away_momentum: round3(away_wave.momentum),
            explanation,
            simulation_cloud: cloud,
            raw_probabilities: probs,
        }
    }

    // The Monte Carlo share also carries the trajectory stability.
    pub fn ensemble_weights(
        &self,
        fourier_conf: f64,
        poisson_conf: f64,
        mc_conf: f64,
        geometric_conf: f64,
    ) -> EnsembleWeights {
        let base = self.config.base_weights;
        let raw = if self.config.confidence_weighted {
            BaseWeights {
                fourier: base.fourier * fourier_conf,
                poisson: base.poisson * poisson_conf,
                montecarlo: base.montecarlo * mc_conf * geometric_conf,
            }
        } else {
            base
        };

        let total = raw.fourier + raw.poisson + raw.montecarlo;
        let weights = if total > 0.0 {
            BaseWeights {
                fourier: raw.fourier / total,
                poisson: raw.poisson / total,
                montecarlo: raw.montecarlo / total,
            }
        } else {
            BaseWeights {
                fourier: 1.0 / 3.0,
                poisson: 1.0 / 3.0,
                montecarlo: 1.0 / 3.0,
            }
        };

        let overall_confidence = weights.fourier * fourier_conf
            + weights.poisson * poisson_conf
            + weights.montecarlo * (mc_conf + geometric_conf) / 2.0;

        EnsembleWeights {
            weights,
            overall_confidence,
        }
    }
}

pub fn fourier_confidence(wave: &WaveAnalysis) -> f64 {
    let Some(max_amp) = wave
        .dominant_frequencies
        .iter()
        .map(|f| f.amplitude)
        .reduce(f64::max)
    else {
        return 0.3;
    };

    let amp_conf = (max_amp * 2.0).min(1.0);
    let direction_conf = if wave.direction == WaveDirection::Neutral {
        0.5
    } else {
        0.8
    };
    (amp_conf + direction_conf) / 2.0
}

/// 32-bit string hash of `home|away|xg|xg`, xG at two decimals.
pub fn derive_seed(home: &str, away: &str, base_home_xg: f64, base_away_xg: f64) -> u32 {
    let key = format!(
        "{home}|{away}|{}|{}",
        fixed2(base_home_xg),
        fixed2(base_away_xg)
    );
    let mut hash: i32 = 0;
    for unit in key.encode_utf16() {
        hash = (hash << 5).wrapping_sub(hash).wrapping_add(unit as i32);
    }
    hash.unsigned_abs()
}

fn cloud_spread(cloud: &[PhasePoint], fallback_mean: f64) -> (f64, f64) {
    if cloud.is_empty() {
        return (fallback_mean, 1.0);
    }
    let n = cloud.len() as f64;
    let mean = cloud.iter().map(|p| p.x).sum::<f64>() / n;
    let var = cloud.iter().map(|p| (p.x - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn describe_wave(team: &str, wave: &WaveAnalysis, conf: f64) -> String {
    let trend = match wave.direction {
        WaveDirection::Rising => "rising",
        WaveDirection::Falling => "falling",
        WaveDirection::Neutral => "flat",
    };
    format!(
        "Fourier: {team} momentum {trend} {:.0}% (conf: {:.0}%)",
        wave.momentum * 100.0,
        conf * 100.0
    )
}

// Exact ties (odd multiples of 1/8) round away from zero; `{:.2}` alone
// would round them to even.
fn fixed2(v: f64) -> String {
    let eighths = v * 8.0;
    if eighths.fract() == 0.0 && eighths.abs() % 2.0 == 1.0 {
        format!("{:.2}", (v * 100.0).round() / 100.0)
    } else {
        format!("{v:.2}")
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
