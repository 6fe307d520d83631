use serde::{Deserialize, Serialize};

use crate::phase_space::{PhasePoint, PointKind};

/// One finished match as supplied by the data-access layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    #[serde(default)]
    pub date: String,
}

impl MatchRecord {
    pub fn new(home_team: &str, away_team: &str, home_goals: u32, away_goals: u32) -> Self {
        Self {
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            home_goals,
            away_goals,
            date: String::new(),
        }
    }

    pub fn with_date(mut self, date: &str) -> Self {
        self.date = date.to_string();
        self
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    // Anything that is not the home side is read as the away side.
    pub fn goals_for_against(&self, team: &str) -> (u32, u32) {
        if self.home_team == team {
            (self.home_goals, self.away_goals)
        } else {
            (self.away_goals, self.home_goals)
        }
    }

    pub fn result_for(&self, team: &str) -> f64 {
        let (gf, ga) = self.goals_for_against(team);
        if gf > ga {
            1.0
        } else if gf < ga {
            -1.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub team: String,
    pub matches: usize,
    pub avg_goals_for: f64,
    pub avg_goals_against: f64,
    pub avg_home_goals_for: f64,
    pub avg_home_goals_against: f64,
    pub avg_away_goals_for: f64,
    pub avg_away_goals_against: f64,
}

impl TeamStats {
    pub fn from_history(team: &str, matches: &[MatchRecord]) -> Self {
        let mut gf = 0.0;
        let mut ga = 0.0;
        let (mut h_gf, mut h_ga, mut h_n) = (0.0, 0.0, 0usize);
        let (mut a_gf, mut a_ga, mut a_n) = (0.0, 0.0, 0usize);

        for m in matches {
            let (f, a) = m.goals_for_against(team);
            gf += f as f64;
            ga += a as f64;
            if m.home_team == team {
                h_gf += f as f64;
                h_ga += a as f64;
                h_n += 1;
            } else {
                a_gf += f as f64;
                a_ga += a as f64;
                a_n += 1;
            }
        }

        let n = matches.len();
        let avg = |sum: f64, count: usize| if count > 0 { sum / count as f64 } else { 0.0 };
        let avg_goals_for = avg(gf, n);
        let avg_goals_against = avg(ga, n);

        Self {
            team: team.to_string(),
            matches: n,
            avg_goals_for,
            avg_goals_against,
            avg_home_goals_for: if h_n > 0 { h_gf / h_n as f64 } else { avg_goals_for },
            avg_home_goals_against: if h_n > 0 { h_ga / h_n as f64 } else { avg_goals_against },
            avg_away_goals_for: if a_n > 0 { a_gf / a_n as f64 } else { avg_goals_for },
            avg_away_goals_against: if a_n > 0 { a_ga / a_n as f64 } else { avg_goals_against },
        }
    }
}

/// Venue-split average of attack and opposing defence, rounded to 2 decimals.
/// Returns (home xG, away xG).
pub fn naive_expected_goals(home: &TeamStats, away: &TeamStats) -> (f64, f64) {
    let home_xg = (home.avg_home_goals_for + away.avg_away_goals_against) / 2.0;
    let away_xg = (away.avg_away_goals_for + home.avg_home_goals_against) / 2.0;
    (round2(home_xg), round2(away_xg))
}

pub fn goals_trajectory(matches: &[MatchRecord], team: &str) -> Vec<PhasePoint> {
    matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let (gf, ga) = m.goals_for_against(team);
            PhasePoint::new(i as i64, gf as f64, ga as f64).tagged(PointKind::History)
        })
        .collect()
}

/// Rolling `window`-match averages. The first point appears once a full window
/// is available; shorter histories fall back to the per-match goals.
pub fn rolling_trajectory(matches: &[MatchRecord], team: &str, window: usize) -> Vec<PhasePoint> {
    let window = window.max(1);
    if matches.len() < window {
        return goals_trajectory(matches, team);
    }

    matches
        .windows(window)
        .enumerate()
        .map(|(start, slice)| {
            let (gf, ga) = slice.iter().fold((0u32, 0u32), |(f, a), m| {
                let (mf, ma) = m.goals_for_against(team);
                (f + mf, a + ma)
            });
            let x = round2(gf as f64 / window as f64);
            let y = round2(ga as f64 / window as f64);
            PhasePoint::new((start + window - 1) as i64, x, y).tagged(PointKind::History)
        })
        .collect()
}

/// The last `limit` matches involving `team` strictly before `before`,
/// oldest first.
pub fn team_history_before(
    archive: &[MatchRecord],
    team: &str,
    before: usize,
    limit: usize,
) -> Vec<MatchRecord> {
    let end = before.min(archive.len());
    let mut out: Vec<MatchRecord> = archive[..end]
        .iter()
        .rev()
        .filter(|m| m.involves(team))
        .take(limit)
        .cloned()
        .collect();
    out.reverse();
    out
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<MatchRecord> {
        vec![
            MatchRecord::new("Roma", "Lazio", 2, 1),
            MatchRecord::new("Inter", "Roma", 3, 0),
            MatchRecord::new("Roma", "Milan", 1, 1),
            MatchRecord::new("Napoli", "Roma", 0, 2),
        ]
    }

    #[test]
    fn result_is_read_from_the_named_side() {
        let m = MatchRecord::new("Roma", "Lazio", 2, 1);
        assert_eq!(m.result_for("Roma"), 1.0);
        assert_eq!(m.result_for("Lazio"), -1.0);
        assert_eq!(MatchRecord::new("A", "B", 1, 1).result_for("A"), 0.0);
    }

    #[test]
    fn team_stats_split_by_venue() {
        let stats = TeamStats::from_history("Roma", &sample());
        assert_eq!(stats.matches, 4);
        assert!((stats.avg_goals_for - 1.25).abs() < 1e-12);
        assert!((stats.avg_goals_against - 1.25).abs() < 1e-12);
        assert!((stats.avg_home_goals_for - 1.5).abs() < 1e-12);
        assert!((stats.avg_away_goals_for - 1.0).abs() < 1e-12);
        assert!((stats.avg_away_goals_against - 1.5).abs() < 1e-12);
    }

    #[test]
    fn team_stats_fall_back_to_overall_without_home_games() {
        let matches = vec![MatchRecord::new("A", "B", 1, 3)];
        let stats = TeamStats::from_history("B", &matches);
        assert_eq!(stats.avg_home_goals_for, 3.0);
        assert_eq!(stats.avg_home_goals_against, 1.0);

        let empty = TeamStats::from_history("B", &[]);
        assert_eq!(empty.avg_goals_for, 0.0);
        assert_eq!(empty.avg_home_goals_for, 0.0);
    }

    #[test]
    fn naive_xg_rounds_to_two_decimals() {
        let home = TeamStats {
            avg_home_goals_for: 1.333,
            avg_home_goals_against: 0.9,
            ..TeamStats::default()
        };
        let away = TeamStats {
            avg_away_goals_for: 1.1,
            avg_away_goals_against: 1.0,
            ..TeamStats::default()
        };
        let (h, a) = naive_expected_goals(&home, &away);
        assert_eq!(h, 1.17);
        assert_eq!(a, 1.0);
    }

    #[test]
    fn rolling_trajectory_starts_after_full_window() {
        let points = rolling_trajectory(&sample(), "Roma", 3);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].time, 2);
        assert_eq!(points[0].x, 1.0);
        assert_eq!(points[0].y, 1.67);
    }

    #[test]
    fn short_history_rolls_back_to_raw_goals() {
        let points = rolling_trajectory(&sample(), "Roma", 5);
        assert_eq!(points, goals_trajectory(&sample(), "Roma"));
        assert_eq!(points.len(), 4);
        assert_eq!((points[1].time, points[1].x, points[1].y), (1, 0.0, 3.0));
        assert!(rolling_trajectory(&[], "Roma", 5).is_empty());
    }

    #[test]
    fn history_before_keeps_latest_matches_oldest_first() {
        let archive = sample();
        let h = team_history_before(&archive, "Roma", 3, 2);
        assert_eq!(h.len(), 2);
        assert_eq!(h[0].home_team, "Inter");
        assert_eq!(h[1].away_team, "Milan");
        assert!(team_history_before(&archive, "Juventus", 4, 10).is_empty());
    }
}
