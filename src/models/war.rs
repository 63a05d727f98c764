//! A single league war, seen from the tracked clan's side.

use serde::{Deserialize, Serialize};

use super::{ClanTag, ModelError, Player, WarClanPayload, WarPayload, WarState};

/// Stars awarded to the winner of a league war on top of the stars earned.
pub const WIN_BONUS_STARS: u32 = 10;

/// One war between the home (tracked) clan and an enemy clan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct War {
    pub home_clan: WarClanPayload,
    pub enemy_clan: WarClanPayload,
    pub ended: bool,
    /// One player per home roster member, in roster order.
    pub players: Vec<Player>,
}

impl War {
    /// Create a war and parse the home roster into players.
    pub fn new(home_clan: WarClanPayload, enemy_clan: WarClanPayload, ended: bool) -> Self {
        let mut war = Self {
            home_clan,
            enemy_clan,
            ended,
            players: Vec::new(),
        };
        war.parse_players();
        war
    }

    /// Orient a war payload around `clan_tag`.
    ///
    /// Returns `Ok(None)` when the clan doesn't take part in this war.
    pub fn from_payload(payload: WarPayload, clan_tag: &ClanTag) -> Result<Option<Self>, ModelError> {
        payload.validate()?;

        let ended = payload.state == WarState::WarEnded;
        let (home, enemy) = if &payload.clan.tag == clan_tag {
            (payload.clan, payload.opponent)
        } else if &payload.opponent.tag == clan_tag {
            (payload.opponent, payload.clan)
        } else {
            return Ok(None);
        };

        Ok(Some(Self::new(home, enemy, ended)))
    }

    fn parse_players(&mut self) {
        self.players = self
            .home_clan
            .members
            .iter()
            .map(|member| Player::from_member(member, &self.enemy_clan, self.ended))
            .collect();
    }

    /// Mean town hall level of the (home, enemy) rosters.
    pub fn average_th_level(&self) -> Result<(f64, f64), ModelError> {
        Ok((
            average_th(&self.home_clan)?,
            average_th(&self.enemy_clan)?,
        ))
    }

    /// `Some(true)` if the home clan won, `Some(false)` if it lost, `None`
    /// while the war is running or when stars and destruction are both tied.
    pub fn won(&self) -> Option<bool> {
        if !self.ended {
            return None;
        }

        let (home, enemy) = (&self.home_clan, &self.enemy_clan);
        if home.stars != enemy.stars {
            return Some(home.stars > enemy.stars);
        }
        if home.destruction_percentage != enemy.destruction_percentage {
            return Some(home.destruction_percentage > enemy.destruction_percentage);
        }
        None
    }

    /// League stars for (home, enemy), including the winner's bonus.
    pub fn stars(&self) -> (u32, u32) {
        let (home, enemy) = (self.home_clan.stars, self.enemy_clan.stars);
        match self.won() {
            Some(true) => (home + WIN_BONUS_STARS, enemy),
            Some(false) => (home, enemy + WIN_BONUS_STARS),
            None => (home, enemy),
        }
    }

    /// Summed first-attack destruction for (home, enemy).
    pub fn destruction(&self) -> (f64, f64) {
        (
            first_attack_destruction(&self.home_clan),
            first_attack_destruction(&self.enemy_clan),
        )
    }
}

fn average_th(side: &WarClanPayload) -> Result<f64, ModelError> {
    if side.members.is_empty() {
        return Err(ModelError::EmptyRoster {
            clan: side.tag.to_string(),
        });
    }
    let total: i32 = side.members.iter().map(|m| m.townhall_level).sum();
    Ok(total as f64 / side.members.len() as f64)
}

fn first_attack_destruction(side: &WarClanPayload) -> f64 {
    side.members
        .iter()
        .filter_map(|m| m.attacks.first())
        .map(|a| a.destruction_percentage)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttackPayload, MemberPayload};

    fn member(tag: &str, th: i32, pos: i32, attack: Option<(&str, u8, f64)>) -> MemberPayload {
        MemberPayload {
            tag: tag.into(),
            name: tag.to_lowercase(),
            townhall_level: th,
            map_position: pos,
            attacks: attack
                .map(|(defender, stars, destruction)| {
                    vec![AttackPayload {
                        defender_tag: defender.into(),
                        stars,
                        destruction_percentage: destruction,
                    }]
                })
                .unwrap_or_default(),
        }
    }

    fn side(tag: &str, stars: u32, destruction: f64, members: Vec<MemberPayload>) -> WarClanPayload {
        WarClanPayload {
            tag: tag.into(),
            name: tag.to_string(),
            stars,
            destruction_percentage: destruction,
            members,
        }
    }

    fn sample_war(home_stars: u32, enemy_stars: u32, home_pct: f64, enemy_pct: f64) -> War {
        let home = side(
            "#HOME",
            home_stars,
            home_pct,
            vec![
                member("#H1", 16, 1, Some(("#E1", 3, 100.0))),
                member("#H2", 14, 2, Some(("#E2", 2, 70.0))),
                member("#H3", 14, 3, None),
            ],
        );
        let enemy = side(
            "#AWAY",
            enemy_stars,
            enemy_pct,
            vec![
                member("#E1", 15, 1, Some(("#H2", 1, 45.0))),
                member("#E2", 15, 2, None),
                member("#E3", 12, 3, Some(("#H3", 3, 100.0))),
            ],
        );
        War::new(home, enemy, true)
    }

    #[test]
    fn test_players_follow_roster_order() {
        let war = sample_war(5, 4, 60.0, 50.0);
        let tags: Vec<&str> = war.players.iter().map(|p| p.tag.as_str()).collect();

        assert_eq!(tags, vec!["#H1", "#H2", "#H3"]);
        assert!(war.players[2].missed_attack);
    }

    #[test]
    fn test_average_th_level() {
        let war = sample_war(0, 0, 0.0, 0.0);
        let (home, enemy) = war.average_th_level().unwrap();

        assert!((home - 44.0 / 3.0).abs() < 1e-9);
        assert!((enemy - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_th_empty_roster_fails() {
        let war = War::new(side("#HOME", 0, 0.0, vec![]), side("#AWAY", 0, 0.0, vec![]), true);
        assert!(matches!(
            war.average_th_level(),
            Err(ModelError::EmptyRoster { .. })
        ));
    }

    #[test]
    fn test_won_by_stars() {
        assert_eq!(sample_war(5, 4, 10.0, 90.0).won(), Some(true));
        assert_eq!(sample_war(4, 5, 90.0, 10.0).won(), Some(false));
    }

    #[test]
    fn test_won_tiebreak_by_destruction() {
        assert_eq!(sample_war(5, 5, 61.0, 60.0).won(), Some(true));
        assert_eq!(sample_war(5, 5, 59.0, 60.0).won(), Some(false));
    }

    #[test]
    fn test_won_full_tie_and_running_war() {
        assert_eq!(sample_war(5, 5, 60.0, 60.0).won(), None);

        let mut running = sample_war(9, 1, 90.0, 10.0);
        running.ended = false;
        assert_eq!(running.won(), None);
        assert_eq!(running.stars(), (9, 1));
    }

    #[test]
    fn test_stars_bonus() {
        assert_eq!(sample_war(5, 4, 0.0, 0.0).stars(), (15, 4));
        assert_eq!(sample_war(4, 5, 0.0, 0.0).stars(), (4, 15));
        assert_eq!(sample_war(5, 5, 50.0, 50.0).stars(), (5, 5));
    }

    #[test]
    fn test_destruction_sums_first_attacks() {
        let (home, enemy) = sample_war(0, 0, 0.0, 0.0).destruction();
        assert!((home - 170.0).abs() < 1e-9);
        assert!((enemy - 145.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_payload_orients_home_side() {
        let war = sample_war(5, 4, 0.0, 0.0);
        let payload = WarPayload {
            state: WarState::InWar,
            clan: war.enemy_clan.clone(),
            opponent: war.home_clan.clone(),
        };

        let oriented = War::from_payload(payload.clone(), &ClanTag::new("#HOME"))
            .unwrap()
            .unwrap();
        assert_eq!(oriented.home_clan.tag.as_str(), "#HOME");
        assert_eq!(oriented.enemy_clan.tag.as_str(), "#AWAY");
        assert!(!oriented.ended);

        assert!(War::from_payload(payload, &ClanTag::new("#OTHER"))
            .unwrap()
            .is_none());
    }
}
