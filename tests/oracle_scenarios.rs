use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};

use oracle_engine::config::EnsembleConfig;
use oracle_engine::history::MatchRecord;
use oracle_engine::news_impact::NewsImpactItem;
use oracle_engine::oracle::{OracleIntegrator, PredictionRequest};

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 12, 12, 0, 0).unwrap()
}

/// Ten 1-1 draws: no form momentum and a motionless trajectory.
fn flat_history(team: &str) -> Vec<MatchRecord> {
    (0..10)
        .map(|i| {
            if i % 2 == 0 {
                MatchRecord::new(team, &format!("Opp{i}"), 1, 1)
            } else {
                MatchRecord::new(&format!("Opp{i}"), team, 1, 1)
            }
        })
        .collect()
}

fn read_fixture(name: &str) -> serde_json::Value {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    serde_json::from_str(&raw).expect("fixture should be valid json")
}

fn fixture_request() -> PredictionRequest {
    let v = read_fixture("predict_case.json");
    let home_history: Vec<MatchRecord> =
        serde_json::from_value(v["home_history"].clone()).expect("home history");
    let away_history: Vec<MatchRecord> =
        serde_json::from_value(v["away_history"].clone()).expect("away history");
    let home_news: Vec<NewsImpactItem> =
        serde_json::from_value(v["home_news"].clone()).expect("home news");
    let away_news: Vec<NewsImpactItem> =
        serde_json::from_value(v["away_news"].clone()).expect("away news");

    PredictionRequest::new("Roma", "Lazio", 1.45, 1.25, as_of())
        .with_histories(home_history, away_history)
        .with_news(home_news, away_news)
        .with_match_date("2025-04-13")
}

#[test]
fn favourite_home_team_is_favoured() {
    let req = PredictionRequest::new("Inter", "Lecce", 2.0, 0.8, as_of())
        .with_histories(flat_history("Inter"), flat_history("Lecce"));
    let p = OracleIntegrator::default().predict(&req);

    assert_eq!(p.home_momentum, 0.0);
    assert_eq!(p.away_momentum, 0.0);
    assert!(p.predictions.one_x_two.home_win > 0.55);
    assert!(p.predictions.one_x_two.confidence > 0.5);
    assert_eq!(p.simulation_cloud.len(), 500);
}

#[test]
fn balanced_teams_split_evenly_on_neutral_ground() {
    let oracle = OracleIntegrator::new(EnsembleConfig {
        home_advantage_factor: 1.0,
        ..EnsembleConfig::default()
    });
    let req = PredictionRequest::new("Torino", "Genoa", 1.3, 1.3, as_of())
        .with_histories(flat_history("Torino"), flat_history("Genoa"));
    let m = oracle.predict(&req).predictions.one_x_two;

    assert!((m.home_win - m.away_win).abs() <= 0.001);
    assert!(m.draw > 0.25);

    // The default venue factor tips the same fixture towards the hosts.
    let m = OracleIntegrator::default().predict(&req).predictions.one_x_two;
    assert!(m.home_win > m.away_win);
}

#[test]
fn empty_histories_produce_a_complete_prediction() {
    let req = PredictionRequest::new("Como", "Parma", 1.2, 1.0, as_of());
    let p = OracleIntegrator::default().predict(&req);

    assert_eq!(p.home_momentum, 0.0);
    assert_eq!(p.away_momentum, 0.0);
    assert!(p.simulation_cloud.is_empty());
    for v in [
        p.predictions.one_x_two.confidence,
        p.predictions.gg.confidence,
        p.predictions.over_25.confidence,
        p.contributing_factors.fourier_weight,
        p.contributing_factors.montecarlo_weight,
    ] {
        assert!(v.is_finite());
    }
    let f = p.contributing_factors;
    assert!((f.fourier_weight + f.poisson_weight + f.montecarlo_weight - 1.0).abs() < 0.002);
}

#[test]
fn identical_requests_give_identical_predictions() {
    let req = fixture_request();
    let oracle = OracleIntegrator::default();
    let a = oracle.predict(&req);
    let b = oracle.predict(&req);
    assert_eq!(a, b);
    assert_eq!(a.simulation_cloud.len(), 500);
}

#[test]
fn news_moves_expected_goals() {
    let with_news = fixture_request();
    let mut without_news = with_news.clone();
    without_news.home_news.clear();
    without_news.away_news.clear();

    let oracle = OracleIntegrator::default();
    let a = oracle.predict(&with_news);
    let b = oracle.predict(&without_news);

    // Home lost a forward, away is highly motivated.
    assert!(a.adjusted_home_xg < b.adjusted_home_xg);
    assert!(a.adjusted_away_xg > b.adjusted_away_xg);
    assert!(a.contributing_factors.news_impact.home < 0.0);
    assert!(a.contributing_factors.news_impact.away > 0.0);
    assert!(a.explanation.iter().any(|l| l.contains("Dybala (forward) unavailable")));
    // Same base xG, same seed: the cloud does not depend on news.
    assert_eq!(a.simulation_cloud, b.simulation_cloud);
}

#[test]
fn markets_are_consistent() {
    let p = OracleIntegrator::default().predict(&fixture_request());
    let m = p.predictions;
    assert!((m.one_x_two.home_win + m.one_x_two.draw + m.one_x_two.away_win - 1.0).abs() < 0.002);
    assert!((m.gg.yes + m.gg.no - 1.0).abs() < 0.002);
    assert!((m.over_25.yes + m.over_25.no - 1.0).abs() < 0.002);
    assert!(m.one_x_two.confidence > 0.0 && m.one_x_two.confidence <= 1.0);
    assert!(m.gg.confidence <= 0.95);
    assert!(m.over_25.confidence <= 0.95);
    assert_eq!(p.raw_probabilities.score_matrix.len(), 11);
}

#[test]
fn serialised_shape_uses_market_keys() {
    let p = OracleIntegrator::default().predict(&fixture_request());
    let v = serde_json::to_value(&p).unwrap();
    assert_eq!(v["match"], "Roma vs Lazio");
    assert_eq!(v["date"], "2025-04-13");
    assert!(v["predictions"]["1X2"]["home_win"].is_number());
    assert!(v["predictions"]["GG"]["yes"].is_number());
    assert!(v["predictions"]["over_2.5"]["no"].is_number());
    assert!(v["contributing_factors"]["news_impact"]["home"].is_number());
    assert_eq!(v["simulation_cloud"][0]["kind"], "simulation");
}

#[test]
fn request_round_trips_through_json() {
    let req = fixture_request();
    let raw = serde_json::to_string(&req).unwrap();
    let back: PredictionRequest = serde_json::from_str(&raw).unwrap();
    assert_eq!(back, req);
    assert_eq!(oracle_engine::predict(&back), oracle_engine::predict(&req));
}
