use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::news_impact::DEFAULT_HALF_LIFE_HOURS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseWeights {
    pub fourier: f64,
    pub poisson: f64,
    pub montecarlo: f64,
}

impl Default for BaseWeights {
    fn default() -> Self {
        Self {
            fourier: 0.25,
            poisson: 0.45,
            montecarlo: 0.30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub confidence_weighted: bool,
    pub base_weights: BaseWeights,
    pub momentum_influence: f64,
    pub velocity_influence: f64,
    pub monte_carlo_iterations: usize,
    // 1.10 = +10% on home xG.
    pub home_advantage_factor: f64,
    pub top_frequencies: usize,
    pub news_half_life_hours: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            confidence_weighted: true,
            base_weights: BaseWeights::default(),
            momentum_influence: 0.20,
            velocity_influence: 0.10,
            monte_carlo_iterations: 500,
            home_advantage_factor: 1.10,
            top_frequencies: 3,
            news_half_life_hours: DEFAULT_HALF_LIFE_HOURS,
        }
    }
}

impl EnsembleConfig {
    /// Read a JSON file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read ensemble config {}", path.display()))?;
        let cfg = serde_json::from_str::<Self>(&raw).context("parse ensemble config")?;
        Ok(cfg.sanitized())
    }

    /// Defaults with `ORACLE_*` overrides from the process environment.
    pub fn from_env() -> Self {
        Self::default().apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_f64 = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());
        let parse_usize = |key: &str| lookup(key).and_then(|v| v.trim().parse::<usize>().ok());

        if let Some(v) = lookup("ORACLE_CONFIDENCE_WEIGHTED").and_then(|v| parse_bool(&v)) {
            self.confidence_weighted = v;
        }
        if let Some(v) = parse_f64("ORACLE_MOMENTUM_INFLUENCE") {
            self.momentum_influence = v;
        }
        if let Some(v) = parse_f64("ORACLE_VELOCITY_INFLUENCE") {
            self.velocity_influence = v;
        }
        if let Some(v) = parse_usize("ORACLE_MC_ITERATIONS") {
            self.monte_carlo_iterations = v;
        }
        if let Some(v) = parse_f64("ORACLE_HOME_ADVANTAGE") {
            self.home_advantage_factor = v;
        }
        if let Some(v) = parse_usize("ORACLE_TOP_FREQUENCIES") {
            self.top_frequencies = v;
        }
        if let Some(v) = parse_f64("ORACLE_NEWS_HALF_LIFE_HOURS") {
            self.news_half_life_hours = v;
        }
        self.sanitized()
    }

    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };

        let w = &mut self.base_weights;
        w.fourier = finite_or(w.fourier, d.base_weights.fourier).max(0.0);
        w.poisson = finite_or(w.poisson, d.base_weights.poisson).max(0.0);
        w.montecarlo = finite_or(w.montecarlo, d.base_weights.montecarlo).max(0.0);
        if w.fourier + w.poisson + w.montecarlo <= 0.0 {
            self.base_weights = d.base_weights;
        }

        self.momentum_influence = finite_or(self.momentum_influence, d.momentum_influence).clamp(0.0, 1.0);
        self.velocity_influence = finite_or(self.velocity_influence, d.velocity_influence).clamp(0.0, 1.0);
        self.monte_carlo_iterations = self.monte_carlo_iterations.clamp(1, 100_000);
        self.home_advantage_factor =
            finite_or(self.home_advantage_factor, d.home_advantage_factor).clamp(0.5, 2.0);
        self.top_frequencies = self.top_frequencies.max(1);
        self.news_half_life_hours = finite_or(self.news_half_life_hours, d.news_half_life_hours);
        if self.news_half_life_hours <= 0.0 {
            self.news_half_life_hours = d.news_half_life_hours;
        }
        self
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
