//! Players and their per-war attack outcome.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use tracing::warn;

use super::{MemberPayload, PlayerTag, WarClanPayload};

/// Defender town hall / map position when the defender tag is not on the
/// enemy roster.
pub const UNKNOWN_DEFENDER: i32 = -1;

/// The first attack a player made in a war.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub attacker_th: i32,
    pub defender_th: i32,
    /// Map positions, 1 = top.
    pub attacker_number: i32,
    pub defender_number: i32,
    pub stars: u8,
    /// Destruction percentage, 0.0 to 100.0.
    pub destruction: f64,
}

impl AttackOutcome {
    /// Attacker minus defender town hall. Negative when attacking up.
    pub fn th_difference(&self) -> i32 {
        self.attacker_th - self.defender_th
    }

    /// How many map positions below the attacker the defender sits.
    /// Positive when hitting a lower-placed base.
    pub fn position_gap(&self) -> i32 {
        self.defender_number - self.attacker_number
    }

    /// False when the defender was missing from the enemy roster.
    pub fn defender_known(&self) -> bool {
        self.defender_th != UNKNOWN_DEFENDER
    }
}

/// A war participant.
///
/// Equality and hashing use the tag only; the same person appears as a fresh
/// `Player` in every war.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub tag: PlayerTag,
    pub town_hall: i32,
    pub missed_attack: bool,
    pub performance: Option<AttackOutcome>,
}

impl Player {
    pub fn new(name: String, tag: PlayerTag, town_hall: i32) -> Self {
        Self {
            name,
            tag,
            town_hall,
            missed_attack: false,
            performance: None,
        }
    }

    /// Build a player from a roster entry and resolve their first attack
    /// against the enemy roster.
    pub fn from_member(member: &MemberPayload, enemy: &WarClanPayload, war_ended: bool) -> Self {
        let mut player = Self::new(member.name.clone(), member.tag.clone(), member.townhall_level);
        player.add_war_participation(member, enemy, war_ended);
        player
    }

    /// Record the outcome of this player's war. Only the first attack counts.
    ///
    /// No attack is a missed attack only once the war has ended; while it is
    /// still running the player simply hasn't participated yet.
    pub fn add_war_participation(
        &mut self,
        member: &MemberPayload,
        enemy: &WarClanPayload,
        war_ended: bool,
    ) {
        let Some(attack) = member.attacks.first() else {
            self.missed_attack = war_ended;
            return;
        };

        let (defender_th, defender_number) = match enemy.member(&attack.defender_tag) {
            Some(defender) => (defender.townhall_level, defender.map_position),
            None => {
                warn!(
                    attacker = %self.tag,
                    defender = %attack.defender_tag,
                    enemy = %enemy.tag,
                    "Defender not found on enemy roster"
                );
                (UNKNOWN_DEFENDER, UNKNOWN_DEFENDER)
            }
        };

        self.performance = Some(AttackOutcome {
            attacker_th: self.town_hall,
            defender_th,
            attacker_number: member.map_position,
            defender_number,
            stars: attack.stars,
            destruction: attack.destruction_percentage,
        });
    }

    /// Whether the player made an attack in this war.
    pub fn attacked(&self) -> bool {
        self.performance.is_some()
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}

impl Eq for Player {}

impl Hash for Player {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
    }
}
