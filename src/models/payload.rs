//! Typed records for the game API payloads.
//!
//! Only the fields the analysis consumes are declared. Required fields are
//! enforced by serde at the boundary; value ranges are checked by
//! [`WarPayload::validate`].

use serde::{Deserialize, Serialize};

use super::{ClanTag, ModelError, PlayerTag, WarTag};

/// `GET /clans/{tag}/currentwar/leaguegroup`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueGroupPayload {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    pub rounds: Vec<RoundPayload>,
}

/// One league round. Usually four wars, one per pair of clans.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundPayload {
    pub war_tags: Vec<WarTag>,
}

/// Lifecycle state of a war.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarState {
    NotInWar,
    Preparation,
    InWar,
    WarEnded,
    #[serde(other)]
    Unknown,
}

impl WarState {
    /// Whether attacks can exist in this state.
    pub fn has_started(&self) -> bool {
        matches!(self, WarState::InWar | WarState::WarEnded)
    }
}

/// `GET /clanwarleagues/wars/{warTag}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarPayload {
    pub state: WarState,
    pub clan: WarClanPayload,
    pub opponent: WarClanPayload,
}

impl WarPayload {
    /// Check value ranges the type system can't express.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.clan.validate()?;
        self.opponent.validate()
    }

    /// Whether the given clan fights in this war.
    pub fn involves(&self, clan_tag: &ClanTag) -> bool {
        &self.clan.tag == clan_tag || &self.opponent.tag == clan_tag
    }
}

/// One side of a war.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarClanPayload {
    pub tag: ClanTag,
    pub name: String,
    #[serde(default)]
    pub stars: u32,
    #[serde(default)]
    pub destruction_percentage: f64,
    pub members: Vec<MemberPayload>,
}

impl WarClanPayload {
    fn validate(&self) -> Result<(), ModelError> {
        check_percentage(self.destruction_percentage, &self.name)?;
        for member in &self.members {
            if member.townhall_level < 1 {
                return Err(ModelError::InvalidPayload(format!(
                    "{} ({}) has town hall level {}",
                    member.name, member.tag, member.townhall_level
                )));
            }
            if member.map_position < 1 {
                return Err(ModelError::InvalidPayload(format!(
                    "{} ({}) has map position {}",
                    member.name, member.tag, member.map_position
                )));
            }
            for attack in &member.attacks {
                if attack.stars > 3 {
                    return Err(ModelError::InvalidPayload(format!(
                        "attack by {} has {} stars",
                        member.tag, attack.stars
                    )));
                }
                check_percentage(attack.destruction_percentage, member.tag.as_str())?;
            }
        }
        Ok(())
    }

    /// Look up a roster member by tag.
    pub fn member(&self, tag: &PlayerTag) -> Option<&MemberPayload> {
        self.members.iter().find(|m| &m.tag == tag)
    }
}

fn check_percentage(value: f64, owner: &str) -> Result<(), ModelError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ModelError::InvalidPayload(format!(
            "{} has destruction {} outside 0..=100",
            owner, value
        )))
    }
}

/// A roster member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPayload {
    pub tag: PlayerTag,
    pub name: String,
    pub townhall_level: i32,
    pub map_position: i32,
    #[serde(default)]
    pub attacks: Vec<AttackPayload>,
}

/// A single attack as reported by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackPayload {
    pub defender_tag: PlayerTag,
    pub stars: u8,
    pub destruction_percentage: f64,
}

/// `GET /clans/{tag}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanPayload {
    pub tag: ClanTag,
    pub name: String,
    #[serde(default)]
    pub war_league: Option<WarLeaguePayload>,
    #[serde(default)]
    pub badge_urls: Option<BadgeUrls>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarLeaguePayload {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BadgeUrls {
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAR_JSON: &str = r##"{
        "state": "warEnded",
        "clan": {
            "tag": "#AAA",
            "name": "Home",
            "stars": 20,
            "destructionPercentage": 85.5,
            "members": [
                {
                    "tag": "#P1",
                    "name": "one",
                    "townhallLevel": 15,
                    "mapPosition": 1,
                    "attacks": [
                        {"attackerTag": "#P1", "defenderTag": "#E1", "stars": 3,
                         "destructionPercentage": 100, "order": 1, "duration": 120}
                    ]
                },
                {"tag": "#P2", "name": "two", "townhallLevel": 14, "mapPosition": 2}
            ]
        },
        "opponent": {
            "tag": "#BBB",
            "name": "Away",
            "members": [
                {"tag": "#E1", "name": "e1", "townhallLevel": 15, "mapPosition": 1}
            ]
        }
    }"##;

    #[test]
    fn test_war_payload_parses() {
        let war: WarPayload = serde_json::from_str(WAR_JSON).unwrap();

        assert_eq!(war.state, WarState::WarEnded);
        assert_eq!(war.clan.tag, ClanTag::new("#AAA"));
        assert_eq!(war.clan.members.len(), 2);
        assert_eq!(war.clan.members[0].attacks.len(), 1);
        assert!(war.clan.members[1].attacks.is_empty());
        assert_eq!(war.opponent.stars, 0);
        assert!(war.validate().is_ok());
        assert!(war.involves(&ClanTag::new("bbb")));
        assert!(!war.involves(&ClanTag::new("ccc")));
    }

    #[test]
    fn test_missing_members_fails() {
        let raw = r##"{"state":"inWar","clan":{"tag":"#A","name":"a"},
            "opponent":{"tag":"#B","name":"b","members":[]}}"##;
        assert!(serde_json::from_str::<WarPayload>(raw).is_err());
    }

    #[test]
    fn test_unknown_state_tolerated() {
        let state: WarState = serde_json::from_str("\"groupNotFound\"").unwrap();
        assert_eq!(state, WarState::Unknown);
        assert!(!state.has_started());
        assert!(WarState::InWar.has_started());
    }

    #[test]
    fn test_validate_rejects_bad_stars() {
        let mut war: WarPayload = serde_json::from_str(WAR_JSON).unwrap();
        war.clan.members[0].attacks[0].stars = 4;
        assert!(matches!(war.validate(), Err(ModelError::InvalidPayload(_))));
    }

    #[test]
    fn test_validate_rejects_bad_destruction() {
        let mut war: WarPayload = serde_json::from_str(WAR_JSON).unwrap();
        war.opponent.destruction_percentage = 140.0;
        assert!(war.validate().is_err());
    }

    #[test]
    fn test_clan_payload_optional_fields() {
        let raw = r##"{"tag":"#pj2uvurc","name":"The Black Cabin",
            "warLeague":{"id":48000015,"name":"Master League II"},
            "badgeUrls":{"medium":"https://example.com/m.png"}}"##;
        let clan: ClanPayload = serde_json::from_str(raw).unwrap();

        assert_eq!(clan.tag.as_str(), "#PJ2UVURC");
        assert_eq!(clan.war_league.unwrap().name, "Master League II");
        assert_eq!(
            clan.badge_urls.unwrap().medium.as_deref(),
            Some("https://example.com/m.png")
        );
    }

    #[test]
    fn test_league_group_parses() {
        let raw = r##"{"state":"ended","season":"2026-10",
            "rounds":[{"warTags":["#8QU8J9LP","#0"]},{"warTags":["#0"]}]}"##;
        let group: LeagueGroupPayload = serde_json::from_str(raw).unwrap();

        assert_eq!(group.rounds.len(), 2);
        assert!(group.rounds[0].war_tags[1].is_placeholder());
        assert_eq!(group.season.as_deref(), Some("2026-10"));
    }
}
