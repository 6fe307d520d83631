use serde::{Deserialize, Serialize};

pub const MAX_GOALS: usize = 10;

/// `[home_goals][away_goals]` joint probabilities, 0..=MAX_GOALS on both axes.
pub type ScoreMatrix = Vec<Vec<f64>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchProbabilities {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
    pub gg: f64,
    pub gg_no: f64,
    pub over25: f64,
    pub under25: f64,
    pub over15: f64,
    pub under15: f64,
    pub score_matrix: ScoreMatrix,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverUnder {
    pub over: f64,
    pub under: f64,
}

/// P(k; lambda) = lambda^k e^-lambda / k!
pub fn poisson_probability(k: u32, lambda: f64) -> f64 {
    let mut p = (-lambda).exp();
    for i in 1..=k {
        p *= lambda / i as f64;
    }
    p
}

fn poisson_pmf(lambda: f64, max_k: usize) -> Vec<f64> {
    let mut out = vec![0.0; max_k + 1];
    out[0] = (-lambda).exp();
    for k in 1..=max_k {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    out
}

/// Independent Poisson scoreline model, truncated at `max_goals` per side.
#[derive(Debug, Clone, Copy)]
pub struct PoissonModel {
    max_goals: usize,
}

impl Default for PoissonModel {
    fn default() -> Self {
        Self {
            max_goals: MAX_GOALS,
        }
    }
}

impl PoissonModel {
    pub fn calculate(&self, home_xg: f64, away_xg: f64) -> MatchProbabilities {
        let pmf_h = poisson_pmf(home_xg, self.max_goals);
        let pmf_a = poisson_pmf(away_xg, self.max_goals);

        let mut matrix = vec![vec![0.0; self.max_goals + 1]; self.max_goals + 1];
        let mut home_win = 0.0;
        let mut draw = 0.0;
        let mut away_win = 0.0;
        let mut gg = 0.0;
        let mut over25 = 0.0;
        let mut over15 = 0.0;

        for (h, p_h) in pmf_h.iter().enumerate() {
            for (a, p_a) in pmf_a.iter().enumerate() {
                let p = p_h * p_a;
                matrix[h][a] = p;

                if h > a {
                    home_win += p;
                } else if h < a {
                    away_win += p;
                } else {
                    draw += p;
                }
                if h >= 1 && a >= 1 {
                    gg += p;
                }
                if h + a >= 3 {
                    over25 += p;
                }
                if h + a >= 2 {
                    over15 += p;
                }
            }
        }

        // Mass beyond the cap is dropped; renormalise on what was captured.
        let total = home_win + draw + away_win;
        let gg = gg / total;
        let over25 = over25 / total;
        let over15 = over15 / total;

        MatchProbabilities {
            home_win: home_win / total,
            draw: draw / total,
            away_win: away_win / total,
            gg,
            gg_no: 1.0 - gg,
            over25,
            under25: 1.0 - over25,
            over15,
            under15: 1.0 - over15,
            score_matrix: matrix,
        }
    }
}

/// Over/under for any goal line, read off a computed matrix.
pub fn over_under(matrix: &[Vec<f64>], threshold: f64) -> OverUnder {
    let mut over = 0.0;
    let mut total = 0.0;

    for (h, row) in matrix.iter().enumerate() {
        for (a, p) in row.iter().enumerate() {
            total += p;
            if (h + a) as f64 > threshold {
                over += p;
            }
        }
    }

    if total <= 0.0 {
        return OverUnder {
            over: 0.0,
            under: 1.0,
        };
    }
    let over = over / total;
    OverUnder {
        over,
        under: 1.0 - over,
    }
}
