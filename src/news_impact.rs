use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HALF_LIFE_HOURS: f64 = 48.0;
const MAX_TOTAL_SHIFT: f64 = 0.30;
const FORM_SENTIMENT_THRESHOLD: f64 = 0.3;
const CONFIDENCE_PER_ITEM: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsCategory {
    Injury,
    Suspension,
    CoachChange,
    Form,
    Motivation,
    Transfer,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
    Coach,
}

impl PlayerRole {
    fn label(self) -> &'static str {
        match self {
            PlayerRole::Goalkeeper => "goalkeeper",
            PlayerRole::Defender => "defender",
            PlayerRole::Midfielder => "midfielder",
            PlayerRole::Forward => "forward",
            PlayerRole::Coach => "coach",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsImpactItem {
    pub team: String,
    pub category: NewsCategory,
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub player_role: Option<PlayerRole>,
    pub sentiment: f64,
    pub source_reliability: f64,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamNewsImpact {
    pub team: String,
    pub attack_modifier: f64,
    pub defense_modifier: f64,
    pub overall_modifier: f64,
    pub confidence: f64,
    pub factors: Vec<String>,
}

impl TeamNewsImpact {
    pub fn neutral() -> Self {
        Self {
            team: String::new(),
            attack_modifier: 1.0,
            defense_modifier: 1.0,
            overall_modifier: 1.0,
            confidence: 0.0,
            factors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactKind {
    ForwardOut,
    MidfielderOut,
    DefenderOut,
    GoalkeeperOut,
    CoachChange,
    WinningStreak,
    LosingStreak,
    HighMotivation,
    LowMotivation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shift {
    pub attack: f64,
    pub defense: f64,
}

impl ImpactKind {
    pub fn base_shift(self) -> Shift {
        let (attack, defense) = match self {
            ImpactKind::ForwardOut => (-0.15, 0.0),
            ImpactKind::MidfielderOut => (-0.08, -0.05),
            ImpactKind::DefenderOut => (0.0, -0.12),
            ImpactKind::GoalkeeperOut => (0.0, -0.20),
            ImpactKind::CoachChange => (-0.10, -0.10),
            ImpactKind::WinningStreak => (0.05, 0.03),
            ImpactKind::LosingStreak => (-0.05, -0.08),
            ImpactKind::HighMotivation => (0.08, 0.05),
            ImpactKind::LowMotivation => (-0.05, -0.05),
        };
        Shift { attack, defense }
    }

    fn describe(self, item: &NewsImpactItem) -> String {
        match self {
            ImpactKind::ForwardOut
            | ImpactKind::MidfielderOut
            | ImpactKind::DefenderOut
            | ImpactKind::GoalkeeperOut => {
                let name = item.player_name.as_deref().unwrap_or("Key player");
                let role = item.player_role.map(PlayerRole::label).unwrap_or("player");
                format!("{name} ({role}) unavailable")
            }
            ImpactKind::CoachChange => "Recent coach change".to_string(),
            ImpactKind::WinningStreak => "Positive form/momentum".to_string(),
            ImpactKind::LosingStreak => "Negative form/crisis".to_string(),
            ImpactKind::HighMotivation => "High motivation match".to_string(),
            ImpactKind::LowMotivation => "Low stakes match".to_string(),
        }
    }
}

// Transfers, coach absences and neutral form carry no shift.
pub fn classify(item: &NewsImpactItem) -> Option<ImpactKind> {
    match item.category {
        NewsCategory::Injury | NewsCategory::Suspension => match item.player_role? {
            PlayerRole::Forward => Some(ImpactKind::ForwardOut),
            PlayerRole::Midfielder => Some(ImpactKind::MidfielderOut),
            PlayerRole::Defender => Some(ImpactKind::DefenderOut),
            PlayerRole::Goalkeeper => Some(ImpactKind::GoalkeeperOut),
            PlayerRole::Coach => None,
        },
        NewsCategory::CoachChange => Some(ImpactKind::CoachChange),
        NewsCategory::Form if item.sentiment > FORM_SENTIMENT_THRESHOLD => {
            Some(ImpactKind::WinningStreak)
        }
        NewsCategory::Form if item.sentiment < -FORM_SENTIMENT_THRESHOLD => {
            Some(ImpactKind::LosingStreak)
        }
        NewsCategory::Motivation if item.sentiment > 0.0 => Some(ImpactKind::HighMotivation),
        NewsCategory::Motivation => Some(ImpactKind::LowMotivation),
        NewsCategory::Form | NewsCategory::Transfer | NewsCategory::Other => None,
    }
}

/// 0.5^(age / half-life). Items dated after `now` count as fresh.
pub fn decay(published_at: DateTime<Utc>, now: DateTime<Utc>, half_life_hours: f64) -> f64 {
    let age_hours = (now - published_at).num_milliseconds().max(0) as f64 / 3_600_000.0;
    0.5_f64.powf(age_hours / half_life_hours)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SingleImpact {
    pub attack: f64,
    pub defense: f64,
    pub decay: f64,
    pub factor: Option<String>,
}

pub fn single_news_impact(
    item: &NewsImpactItem,
    now: DateTime<Utc>,
    half_life_hours: f64,
) -> SingleImpact {
    let decay = decay(item.published_at, now, half_life_hours);
    let reliability = item.source_reliability.clamp(0.0, 1.0);

    let Some(kind) = classify(item) else {
        return SingleImpact {
            attack: 0.0,
            defense: 0.0,
            decay,
            factor: None,
        };
    };

    let base = kind.base_shift();
    SingleImpact {
        attack: base.attack * decay * reliability,
        defense: base.defense * decay * reliability,
        decay,
        factor: Some(format!(
            "{} ({:.0}% weight)",
            kind.describe(item),
            decay * 100.0
        )),
    }
}

pub fn team_news_impact(
    items: &[NewsImpactItem],
    now: DateTime<Utc>,
    half_life_hours: f64,
) -> TeamNewsImpact {
    let Some(first) = items.first() else {
        return TeamNewsImpact::neutral();
    };

    let mut attack = 0.0;
    let mut defense = 0.0;
    let mut decay_sum = 0.0;
    let mut factors = Vec::new();

    for item in items {
        let impact = single_news_impact(item, now, half_life_hours);
        attack += impact.attack;
        defense += impact.defense;
        decay_sum += impact.decay;
        factors.extend(impact.factor);
    }

    let attack_modifier = 1.0 + attack.clamp(-MAX_TOTAL_SHIFT, MAX_TOTAL_SHIFT);
    let defense_modifier = 1.0 + defense.clamp(-MAX_TOTAL_SHIFT, MAX_TOTAL_SHIFT);

    let count = items.len() as f64;
    let avg_decay = decay_sum / count;

    TeamNewsImpact {
        team: first.team.clone(),
        attack_modifier,
        defense_modifier,
        overall_modifier: (attack_modifier * defense_modifier).sqrt(),
        confidence: (count * CONFIDENCE_PER_ITEM).min(1.0) * avg_decay,
        factors,
    }
}

pub fn apply_news_impact_to_xg(base_xg: f64, impact: &TeamNewsImpact) -> f64 {
    base_xg * impact.attack_modifier
}
