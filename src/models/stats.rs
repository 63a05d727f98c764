//! Derived per-player and per-clan statistics.

use serde::{Deserialize, Serialize};

use super::{Player, PlayerTag};

/// A player's accumulated league result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaguePerformance {
    /// Sum of all war scores
    pub score: f64,

    /// Score of each war, in war order
    pub scores: Vec<f64>,

    /// Wars the player attacked in, or that ended with them on the roster
    pub wars_participated: u32,

    /// Wars the player attacked in
    pub wars_attacked: u32,
}

impl LeaguePerformance {
    /// Add one war's result.
    pub fn record(&mut self, score: f64, attacked: bool, war_ended: bool) {
        self.score += score;
        self.scores.push(score);
        if attacked || war_ended {
            self.wars_participated += 1;
        }
        if attacked {
            self.wars_attacked += 1;
        }
    }

    /// Mean score per participated war.
    pub fn average_score(&self) -> Option<f64> {
        if self.wars_participated == 0 {
            None
        } else {
            Some(self.score / self.wars_participated as f64)
        }
    }
}

/// A player together with their league aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPlayer {
    pub player: Player,
    pub performance: LeaguePerformance,
}

/// Flat leaderboard row for exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRow {
    pub rank: usize,
    pub tag: PlayerTag,
    pub name: String,
    pub score: f64,
    pub attacks: u32,
    pub wars_participated: u32,
    pub average_score: Option<f64>,
    pub scores: Vec<f64>,
}

impl PlayerRow {
    pub fn new(rank: usize, ranked: &RankedPlayer) -> Self {
        Self {
            rank,
            tag: ranked.player.tag.clone(),
            name: ranked.player.name.clone(),
            score: ranked.performance.score,
            attacks: ranked.performance.wars_attacked,
            wars_participated: ranked.performance.wars_participated,
            average_score: ranked.performance.average_score(),
            scores: ranked.performance.scores.clone(),
        }
    }
}

/// Count of first attacks per star result, plus missed attacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarDistribution {
    pub three: u32,
    pub two: u32,
    pub one: u32,
    pub zero: u32,
    pub missed: u32,
}

impl StarDistribution {
    /// Count one war appearance.
    pub fn record(&mut self, player: &Player) {
        if player.missed_attack {
            self.missed += 1;
        }
        if let Some(outcome) = &player.performance {
            match outcome.stars {
                3 => self.three += 1,
                2 => self.two += 1,
                1 => self.one += 1,
                _ => self.zero += 1,
            }
        }
    }

    pub fn attacks(&self) -> u32 {
        self.three + self.two + self.one + self.zero
    }

    /// Share of attacks that were three-star hits (0.0 to 1.0).
    pub fn three_star_rate(&self) -> f64 {
        let attacks = self.attacks();
        if attacks == 0 {
            0.0
        } else {
            self.three as f64 / attacks as f64
        }
    }
}

/// Mean town hall levels of one war.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThAverages {
    pub home: f64,
    pub enemy: f64,
}

/// Number of histogram buckets over 0..=100% destruction.
pub const DESTRUCTION_BUCKETS: usize = 20;

/// Bucket counts of destruction percentages, 5% wide. 100% lands in the
/// last bucket.
pub fn destruction_histogram(values: &[f64]) -> [u32; DESTRUCTION_BUCKETS] {
    let mut buckets = [0u32; DESTRUCTION_BUCKETS];
    let width = 100.0 / DESTRUCTION_BUCKETS as f64;
    for &value in values {
        let index = ((value / width) as usize).min(DESTRUCTION_BUCKETS - 1);
        buckets[index] += 1;
    }
    buckets
}

/// Like [`destruction_histogram`], leaving out full 100% attacks.
pub fn partial_destruction_histogram(values: &[f64]) -> [u32; DESTRUCTION_BUCKETS] {
    let partial: Vec<f64> = values.iter().copied().filter(|v| *v < 100.0).collect();
    destruction_histogram(&partial)
}
