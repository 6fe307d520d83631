use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use oracle_engine::adapters::{LegacyPrediction, PredictionRecord};
use oracle_engine::config::EnsembleConfig;
use oracle_engine::history::{self, MatchRecord, TeamStats};
use oracle_engine::logging;
use oracle_engine::news_impact::NewsImpactItem;
use oracle_engine::oracle::{OracleIntegrator, PredictionRequest};

#[derive(Debug, serde::Deserialize)]
struct PredictCase {
    home: String,
    away: String,
    #[serde(default)]
    base_home_xg: Option<f64>,
    #[serde(default)]
    base_away_xg: Option<f64>,
    #[serde(default)]
    home_history: Vec<MatchRecord>,
    #[serde(default)]
    away_history: Vec<MatchRecord>,
    #[serde(default)]
    home_news: Vec<NewsImpactItem>,
    #[serde(default)]
    away_news: Vec<NewsImpactItem>,
    #[serde(default)]
    match_date: Option<String>,
    #[serde(default)]
    as_of: Option<DateTime<Utc>>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let path = std::env::args()
        .nth(1)
        .filter(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/predict_case.json"));

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("read case file {}", path.display()))?;
    let case: PredictCase = serde_json::from_str(&raw).context("invalid case json")?;

    let config = match parse_path_arg("--config") {
        Some(p) => EnsembleConfig::load(&p)?,
        None => EnsembleConfig::default(),
    };
    let config = config.apply_overrides(|key| std::env::var(key).ok());

    // Without explicit xG, fall back to the venue-split averages of the histories.
    let (naive_home, naive_away) = history::naive_expected_goals(
        &TeamStats::from_history(&case.home, &case.home_history),
        &TeamStats::from_history(&case.away, &case.away_history),
    );
    let base_home = case.base_home_xg.unwrap_or(naive_home);
    let base_away = case.base_away_xg.unwrap_or(naive_away);

    let mut request = PredictionRequest::new(
        &case.home,
        &case.away,
        base_home,
        base_away,
        case.as_of.unwrap_or_else(Utc::now),
    )
    .with_histories(case.home_history, case.away_history)
    .with_news(case.home_news, case.away_news);
    if let Some(date) = case.match_date.as_deref() {
        request = request.with_match_date(date);
    }

    info!(
        home = %request.home_team,
        away = %request.away_team,
        base_home,
        base_away,
        "predicting"
    );
    let prediction = OracleIntegrator::new(config).predict(&request);

    let json = if has_flag("--legacy") {
        serde_json::to_string_pretty(&LegacyPrediction::from(&prediction))
    } else if has_flag("--record") {
        serde_json::to_string_pretty(&PredictionRecord::from_prediction(
            &request.home_team,
            &request.away_team,
            &prediction,
        ))
    } else {
        serde_json::to_string_pretty(&prediction)
    }
    .context("serialize prediction")?;

    println!("{json}");
    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && !raw.trim().is_empty()
        {
            return Some(PathBuf::from(raw.trim()));
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
