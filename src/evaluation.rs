use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::adapters::PredictedOutcome;
use crate::history::MatchRecord;
use crate::oracle::{Markets, OneXTwo, YesNo};

pub const DEFAULT_BAND_WIDTH: f64 = 0.1;
const MIN_PROB: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    fn index(self) -> usize {
        match self {
            Outcome::Home => 0,
            Outcome::Draw => 1,
            Outcome::Away => 2,
        }
    }
}

impl From<PredictedOutcome> for Outcome {
    fn from(p: PredictedOutcome) -> Self {
        match p {
            PredictedOutcome::HomeWin => Outcome::Home,
            PredictedOutcome::Draw => Outcome::Draw,
            PredictedOutcome::AwayWin => Outcome::Away,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    #[serde(rename = "1X2")]
    OneXTwo,
    #[serde(rename = "GG")]
    Gg,
    #[serde(rename = "over_2.5")]
    Over25,
}

impl Market {
    pub const ALL: [Market; 3] = [Market::OneXTwo, Market::Gg, Market::Over25];

    pub fn label(self) -> &'static str {
        match self {
            Market::OneXTwo => "1X2",
            Market::Gg => "GG",
            Market::Over25 => "over_2.5",
        }
    }

    fn index(self) -> usize {
        match self {
            Market::OneXTwo => 0,
            Market::Gg => 1,
            Market::Over25 => 2,
        }
    }
}

/// How each market settled for one finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub outcome: Outcome,
    pub both_scored: bool,
    pub over_25: bool,
}

impl Settlement {
    pub fn from_score(home_goals: u32, away_goals: u32) -> Self {
        let outcome = match home_goals.cmp(&away_goals) {
            Ordering::Greater => Outcome::Home,
            Ordering::Less => Outcome::Away,
            Ordering::Equal => Outcome::Draw,
        };
        Self {
            outcome,
            both_scored: home_goals > 0 && away_goals > 0,
            over_25: home_goals + away_goals >= 3,
        }
    }

    pub fn of(m: &MatchRecord) -> Self {
        Self::from_score(m.home_goals, m.away_goals)
    }
}

// Output probabilities are rounded to 3 decimals, so renormalise.
fn one_x_two_probs(m: &OneXTwo) -> [f64; 3] {
    let sum = m.home_win + m.draw + m.away_win;
    if sum <= 0.0 {
        return [1.0 / 3.0; 3];
    }
    [m.home_win / sum, m.draw / sum, m.away_win / sum]
}

fn yes_prob(m: &YesNo) -> f64 {
    let sum = m.yes + m.no;
    if sum <= 0.0 { 0.5 } else { m.yes / sum }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MarketScore {
    pub samples: usize,
    pub brier: f64,
    pub log_loss: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct ScoreSums {
    n: usize,
    brier: f64,
    log_loss: f64,
    hits: usize,
}

impl ScoreSums {
    fn add(&mut self, brier: f64, p_actual: f64, hit: bool) {
        self.n += 1;
        self.brier += brier;
        self.log_loss -= p_actual.clamp(MIN_PROB, 1.0).ln();
        if hit {
            self.hits += 1;
        }
    }

    fn finish(&self) -> MarketScore {
        if self.n == 0 {
            return MarketScore::default();
        }
        let n = self.n as f64;
        MarketScore {
            samples: self.n,
            brier: self.brier / n,
            log_loss: self.log_loss / n,
            accuracy: self.hits as f64 / n,
        }
    }
}

/// Picks whose stated confidence fell in `[lower, upper)`, and how many came in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBand {
    pub market: Market,
    pub lower: f64,
    pub upper: f64,
    pub picks: usize,
    pub mean_confidence: f64,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct BandSums {
    picks: usize,
    confidence: f64,
    hits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketReport {
    pub one_x_two: MarketScore,
    pub gg: MarketScore,
    pub over_25: MarketScore,
    pub bands: Vec<ConfidenceBand>,
}

impl MarketReport {
    pub fn score(&self, market: Market) -> MarketScore {
        match market {
            Market::OneXTwo => self.one_x_two,
            Market::Gg => self.gg,
            Market::Over25 => self.over_25,
        }
    }

    /// Pick-weighted mean of |confidence - hit rate| over one market's bands.
    pub fn confidence_gap(&self, market: Market) -> f64 {
        let (weighted, picks) = self
            .bands
            .iter()
            .filter(|b| b.market == market)
            .fold((0.0, 0usize), |(sum, n), b| {
                (
                    sum + b.picks as f64 * (b.mean_confidence - b.hit_rate).abs(),
                    n + b.picks,
                )
            });
        if picks == 0 { 0.0 } else { weighted / picks as f64 }
    }
}

/// Running scores for the three oracle markets over a run of settled fixtures.
#[derive(Debug, Clone)]
pub struct Scorecard {
    band_width: f64,
    scores: [ScoreSums; 3],
    bands: [Vec<BandSums>; 3],
}

impl Default for Scorecard {
    fn default() -> Self {
        Self::new(DEFAULT_BAND_WIDTH)
    }
}

impl Scorecard {
    pub fn new(band_width: f64) -> Self {
        let band_width = if band_width.is_finite() && band_width > 0.0 {
            band_width.min(1.0)
        } else {
            DEFAULT_BAND_WIDTH
        };
        let count = (1.0 / band_width).ceil() as usize;
        Self {
            band_width,
            scores: [ScoreSums::default(); 3],
            bands: std::array::from_fn(|_| vec![BandSums::default(); count]),
        }
    }

    pub fn samples(&self) -> usize {
        self.scores[0].n
    }

    pub fn record(&mut self, markets: &Markets, result: Settlement) {
        let p = one_x_two_probs(&markets.one_x_two);
        let actual = result.outcome.index();
        let brier = p
            .iter()
            .enumerate()
            .map(|(i, v)| if i == actual { (v - 1.0).powi(2) } else { v.powi(2) })
            .sum();
        let pick = Outcome::from(PredictedOutcome::from_probs(p[0], p[1], p[2]));
        let hit = pick == result.outcome;
        self.scores[Market::OneXTwo.index()].add(brier, p[actual], hit);
        self.add_pick(Market::OneXTwo, markets.one_x_two.confidence, hit);

        for (market, yes_no, happened) in [
            (Market::Gg, &markets.gg, result.both_scored),
            (Market::Over25, &markets.over_25, result.over_25),
        ] {
            let yes = yes_prob(yes_no);
            let (y, p_actual) = if happened { (1.0, yes) } else { (0.0, 1.0 - yes) };
            let hit = (yes >= 0.5) == happened;
            self.scores[market.index()].add((yes - y).powi(2), p_actual, hit);
            self.add_pick(market, yes_no.confidence, hit);
        }
    }

    fn add_pick(&mut self, market: Market, confidence: f64, hit: bool) {
        let bands = &mut self.bands[market.index()];
        let confidence = if confidence.is_finite() { confidence.clamp(0.0, 1.0) } else { 0.0 };
        let idx = ((confidence / self.band_width).floor() as usize).min(bands.len() - 1);
        let band = &mut bands[idx];
        band.picks += 1;
        band.confidence += confidence;
        if hit {
            band.hits += 1;
        }
    }

    pub fn report(&self) -> MarketReport {
        let mut bands = Vec::new();
        for market in Market::ALL {
            for (i, b) in self.bands[market.index()].iter().enumerate() {
                if b.picks == 0 {
                    continue;
                }
                bands.push(ConfidenceBand {
                    market,
                    lower: i as f64 * self.band_width,
                    upper: ((i + 1) as f64 * self.band_width).min(1.0),
                    picks: b.picks,
                    mean_confidence: b.confidence / b.picks as f64,
                    hit_rate: b.hits as f64 / b.picks as f64,
                });
            }
        }

        MarketReport {
            one_x_two: self.scores[Market::OneXTwo.index()].finish(),
            gg: self.scores[Market::Gg.index()].finish(),
            over_25: self.scores[Market::Over25.index()].finish(),
            bands,
        }
    }
}

/// Observed frequencies offered as a forecast for every fixture. Confidence
/// is zero: a base rate makes no claim about a particular match.
pub fn base_rate_markets(results: &[Settlement]) -> Markets {
    if results.is_empty() {
        let even = YesNo {
            yes: 0.5,
            no: 0.5,
            confidence: 0.0,
        };
        return Markets {
            one_x_two: OneXTwo {
                home_win: 1.0 / 3.0,
                draw: 1.0 / 3.0,
                away_win: 1.0 / 3.0,
                confidence: 0.0,
            },
            gg: even,
            over_25: even,
        };
    }

    let n = results.len() as f64;
    let mut counts = [0usize; 3];
    let mut gg = 0usize;
    let mut over = 0usize;
    for r in results {
        counts[r.outcome.index()] += 1;
        gg += usize::from(r.both_scored);
        over += usize::from(r.over_25);
    }
    let rate = |c: usize| c as f64 / n;

    Markets {
        one_x_two: OneXTwo {
            home_win: rate(counts[0]),
            draw: rate(counts[1]),
            away_win: rate(counts[2]),
            confidence: 0.0,
        },
        gg: YesNo {
            yes: rate(gg),
            no: 1.0 - rate(gg),
            confidence: 0.0,
        },
        over_25: YesNo {
            yes: rate(over),
            no: 1.0 - rate(over),
            confidence: 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markets(h: f64, d: f64, a: f64, conf: f64, gg: f64, over: f64) -> Markets {
        Markets {
            one_x_two: OneXTwo {
                home_win: h,
                draw: d,
                away_win: a,
                confidence: conf,
            },
            gg: YesNo {
                yes: gg,
                no: 1.0 - gg,
                confidence: conf,
            },
            over_25: YesNo {
                yes: over,
                no: 1.0 - over,
                confidence: conf,
            },
        }
    }

    #[test]
    fn settlement_reads_every_market() {
        assert_eq!(
            Settlement::from_score(2, 1),
            Settlement {
                outcome: Outcome::Home,
                both_scored: true,
                over_25: true
            }
        );
        let goalless = Settlement::of(&MatchRecord::new("A", "B", 0, 0));
        assert_eq!(goalless.outcome, Outcome::Draw);
        assert!(!goalless.both_scored && !goalless.over_25);
        let away = Settlement::from_score(0, 3);
        assert_eq!(away.outcome, Outcome::Away);
        assert!(!away.both_scored && away.over_25);
    }

    #[test]
    fn certain_and_correct_scores_zero_brier() {
        let mut card = Scorecard::default();
        card.record(&markets(1.0, 0.0, 0.0, 0.9, 1.0, 1.0), Settlement::from_score(2, 1));
        card.record(&markets(0.0, 1.0, 0.0, 0.9, 0.0, 0.0), Settlement::from_score(0, 0));
        let r = card.report();
        for market in Market::ALL {
            let s = r.score(market);
            assert_eq!(s.samples, 2);
            assert!(s.brier < 1e-12);
            assert!(s.log_loss < 1e-9);
            assert_eq!(s.accuracy, 1.0);
        }
    }

    #[test]
    fn even_forecast_scores() {
        let mut card = Scorecard::default();
        let third = 1.0 / 3.0;
        card.record(&markets(third, third, third, 0.5, 0.5, 0.5), Settlement::from_score(1, 0));
        let r = card.report();
        assert!((r.one_x_two.brier - 2.0 / 3.0).abs() < 1e-12);
        assert!((r.one_x_two.log_loss - 3.0_f64.ln()).abs() < 1e-12);
        assert!((r.gg.brier - 0.25).abs() < 1e-12);
        assert!((r.over_25.log_loss - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn binary_market_scores_the_side_that_happened() {
        let mut card = Scorecard::default();
        // GG yes at 80% and both scored; over at 30% and it went over.
        card.record(&markets(0.5, 0.3, 0.2, 0.6, 0.8, 0.3), Settlement::from_score(2, 2));
        let r = card.report();
        assert!((r.gg.brier - 0.04).abs() < 1e-12);
        assert!((r.gg.log_loss + 0.8_f64.ln()).abs() < 1e-12);
        assert_eq!(r.gg.accuracy, 1.0);
        assert!((r.over_25.brier - 0.49).abs() < 1e-12);
        assert_eq!(r.over_25.accuracy, 0.0);
        // Home was the pick, the match was drawn.
        assert_eq!(r.one_x_two.accuracy, 0.0);
    }

    #[test]
    fn confidence_is_checked_against_hit_rate() {
        let mut card = Scorecard::new(0.1);
        card.record(&markets(0.6, 0.25, 0.15, 0.72, 0.6, 0.6), Settlement::from_score(1, 0));
        card.record(&markets(0.6, 0.25, 0.15, 0.72, 0.6, 0.6), Settlement::from_score(0, 1));
        let r = card.report();

        let band = r
            .bands
            .iter()
            .find(|b| b.market == Market::OneXTwo)
            .copied()
            .unwrap();
        assert_eq!(band.picks, 2);
        assert!((band.lower - 0.7).abs() < 1e-12);
        assert!((band.upper - 0.8).abs() < 1e-12);
        assert!((band.mean_confidence - 0.72).abs() < 1e-12);
        assert_eq!(band.hit_rate, 0.5);
        assert!((r.confidence_gap(Market::OneXTwo) - 0.22).abs() < 1e-12);
        assert_eq!(r.bands.len(), 3);
    }

    #[test]
    fn top_confidence_lands_in_last_band() {
        let mut card = Scorecard::new(0.25);
        card.record(&markets(0.7, 0.2, 0.1, 1.0, 0.5, 0.5), Settlement::from_score(3, 0));
        let band = card.report().bands[0];
        assert_eq!((band.lower, band.upper), (0.75, 1.0));
    }

    #[test]
    fn rounded_market_is_renormalised() {
        let p = one_x_two_probs(&OneXTwo {
            home_win: 0.5,
            draw: 0.3,
            away_win: 0.201,
            confidence: 0.7,
        });
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn base_rates_follow_observed_frequencies() {
        let results = [
            Settlement::from_score(2, 1),
            Settlement::from_score(1, 0),
            Settlement::from_score(1, 1),
            Settlement::from_score(0, 2),
        ];
        let m = base_rate_markets(&results);
        assert_eq!(m.one_x_two.home_win, 0.5);
        assert_eq!(m.one_x_two.draw, 0.25);
        assert_eq!(m.gg.yes, 0.5);
        assert_eq!(m.over_25.yes, 0.25);
        assert_eq!(base_rate_markets(&[]).gg.yes, 0.5);
    }
}
