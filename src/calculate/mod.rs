//! Attack scoring.
//!
//! Turns a player's war appearance into a single number. A clean hit on an
//! equal town hall is worth 100; attacking up earns more, dipping down earns
//! less, and a missed attack costs a flat penalty.
//!
//! - Equal town hall: 3 stars = 100, 2 stars = 80% of destruction, 1 star = 20%
//! - Attacking up: 2+ stars scale destruction by 100/80 or 100/70 plus a bonus
//!   for large gaps, 1 star = 50% of destruction
//! - Attacking down: 3 stars lose 10 per town hall level when the target sits
//!   below the attacker on the map, 0 stars = -20

use serde::{Deserialize, Serialize};

use crate::models::{AttackOutcome, Player};

/// Scoring knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Magnitude of the missed-attack penalty. Always applied as a negative.
    #[serde(default = "default_missed_attack_penalty")]
    pub missed_attack_penalty: f64,

    /// Trim three-star scores by how far down the map the target was.
    #[serde(default)]
    pub number_difference_check: bool,
}

fn default_missed_attack_penalty() -> f64 {
    100.0
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            missed_attack_penalty: default_missed_attack_penalty(),
            number_difference_check: false,
        }
    }
}

impl ScoringPolicy {
    /// Score one war appearance.
    pub fn score(&self, player: &Player) -> f64 {
        if player.missed_attack {
            return -self.missed_attack_penalty.abs();
        }

        match &player.performance {
            Some(outcome) => self.score_attack(outcome),
            None => 0.0,
        }
    }

    /// Score a single attack outcome.
    pub fn score_attack(&self, outcome: &AttackOutcome) -> f64 {
        let th_difference = outcome.th_difference();
        if th_difference == 0 {
            self.equal_th_score(outcome)
        } else if th_difference < 0 {
            higher_th_score(outcome)
        } else {
            self.lower_th_score(outcome)
        }
    }

    fn equal_th_score(&self, outcome: &AttackOutcome) -> f64 {
        match outcome.stars {
            3 => 100.0 - self.position_trim(outcome),
            2 => outcome.destruction * 80.0 / 100.0,
            1 => outcome.destruction * 20.0 / 100.0,
            _ => 0.0,
        }
    }

    fn lower_th_score(&self, outcome: &AttackOutcome) -> f64 {
        match outcome.stars {
            3 => {
                let gap = outcome.position_gap();
                if gap <= 0 {
                    return 100.0;
                }
                let th_penalty = (outcome.th_difference().abs() * 10) as f64;
                100.0 - th_penalty - self.position_trim(outcome)
            }
            2 => outcome.destruction * 50.0 / 100.0,
            1 => outcome.destruction * 10.0 / 100.0,
            _ => -20.0,
        }
    }

    /// Map positions the target sat below the attacker, when the check is on.
    fn position_trim(&self, outcome: &AttackOutcome) -> f64 {
        let gap = outcome.position_gap();
        if self.number_difference_check && gap > 0 {
            gap as f64
        } else {
            0.0
        }
    }
}

fn higher_th_score(outcome: &AttackOutcome) -> f64 {
    let levels_up = outcome.th_difference().abs();
    match outcome.stars {
        2 | 3 => match levels_up {
            1 => outcome.destruction * 100.0 / 80.0,
            2 => outcome.destruction * 100.0 / 70.0,
            _ => outcome.destruction * 100.0 / 70.0 + 5.0 * levels_up as f64,
        },
        1 => outcome.destruction * 50.0 / 100.0,
        _ => 0.0,
    }
}
