use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use tracing::{info, warn};

use oracle_engine::config::EnsembleConfig;
use oracle_engine::evaluation::{self, Market, Scorecard, Settlement};
use oracle_engine::history::{self, MatchRecord, TeamStats};
use oracle_engine::logging;
use oracle_engine::oracle::{Markets, OracleIntegrator, PredictionRequest};

const DEFAULT_HISTORY_LIMIT: usize = 20;
const DEFAULT_MIN_HISTORY: usize = 5;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let path = std::env::args()
        .nth(1)
        .filter(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .or_else(|| std::env::var("ORACLE_ARCHIVE").ok().map(PathBuf::from))
        .context("usage: oracle_backtest <matches.json> [--min-history N] [--limit N]")?;

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("read match archive {}", path.display()))?;
    let mut archive: Vec<MatchRecord> =
        serde_json::from_str(&raw).context("invalid match archive json")?;
    // Stable: same-day fixtures keep file order.
    archive.sort_by(|a, b| a.date.cmp(&b.date));

    let min_history = parse_usize_arg("--min-history")
        .unwrap_or(DEFAULT_MIN_HISTORY)
        .max(1);
    let limit = parse_usize_arg("--limit")
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .max(min_history);
    let oracle = OracleIntegrator::new(EnsembleConfig::from_env());

    let rows: Vec<(Markets, Settlement)> = (0..archive.len())
        .into_par_iter()
        .filter_map(|idx| {
            let m = &archive[idx];
            let home_history = history::team_history_before(&archive, &m.home_team, idx, limit);
            let away_history = history::team_history_before(&archive, &m.away_team, idx, limit);
            if home_history.len() < min_history || away_history.len() < min_history {
                return None;
            }

            let (base_home, base_away) = history::naive_expected_goals(
                &TeamStats::from_history(&m.home_team, &home_history),
                &TeamStats::from_history(&m.away_team, &away_history),
            );
            let request =
                PredictionRequest::new(&m.home_team, &m.away_team, base_home, base_away, kickoff(m))
                    .with_histories(home_history, away_history)
                    .with_match_date(&m.date);
            let prediction = oracle.predict(&request);
            Some((prediction.predictions, Settlement::of(m)))
        })
        .collect();

    if rows.is_empty() {
        return Err(anyhow!(
            "no fixture had {min_history}+ prior matches for both teams"
        ));
    }
    let skipped = archive.len() - rows.len();
    if skipped > 0 {
        warn!(skipped, min_history, "fixtures without enough history were skipped");
    }

    // Scored in archive order so the sums match a sequential run.
    let mut card = Scorecard::default();
    for (markets, result) in &rows {
        card.record(markets, *result);
    }
    let report = card.report();

    let results: Vec<Settlement> = rows.iter().map(|(_, r)| *r).collect();
    let base = evaluation::base_rate_markets(&results);
    let mut base_card = Scorecard::default();
    for result in &results {
        base_card.record(&base, *result);
    }
    let baseline = base_card.report();

    info!(archive = %path.display(), fixtures = archive.len(), samples = card.samples(), "backtest finished");

    println!("Walk-forward ensemble backtest");
    println!("Archive: {}", path.display());
    for market in Market::ALL {
        let s = report.score(market);
        let b = baseline.score(market);
        println!(
            "{:<9} samples={} brier={:.4} log_loss={:.4} accuracy={:.3} confidence_gap={:.4} | base rate brier={:.4} log_loss={:.4}",
            market.label(),
            s.samples,
            s.brier,
            s.log_loss,
            s.accuracy,
            report.confidence_gap(market),
            b.brier,
            b.log_loss
        );
    }
    for band in &report.bands {
        println!(
            "  {:<9} conf {:.1}-{:.1} picks={} mean_conf={:.3} hit_rate={:.3}",
            band.market.label(),
            band.lower,
            band.upper,
            band.picks,
            band.mean_confidence,
            band.hit_rate
        );
    }

    Ok(())
}

/// Midnight UTC on the match date; unparsable dates fall back to the epoch so
/// news decay (absent here) stays deterministic.
fn kickoff(m: &MatchRecord) -> DateTime<Utc> {
    NaiveDate::parse_from_str(m.date.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn parse_usize_arg(name: &str) -> Option<usize> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && let Ok(v) = raw.trim().parse::<usize>()
        {
            return Some(v);
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && let Ok(v) = next.trim().parse::<usize>()
        {
            return Some(v);
        }
    }
    None
}
