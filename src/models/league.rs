//! League model: the tracked clan's wars, standings and promotion outcome.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{ClanPayload, ClanTag, LeagueGroupPayload, ModelError, War, WarState};
use crate::fetch::{CocApi, FetchError};

/// Errors that can occur while assembling a league.
#[derive(Debug, Error)]
pub enum LeagueError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid war data: {0}")]
    Model(#[from] ModelError),
}

/// End-of-league movement of the tracked clan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PromotionStatus {
    Promoted,
    Demoted,
    #[default]
    NoChange,
}

impl std::fmt::Display for PromotionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromotionStatus::Promoted => write!(f, "Promoted"),
            PromotionStatus::Demoted => write!(f, "Demoted"),
            PromotionStatus::NoChange => write!(f, "No Change"),
        }
    }
}

/// Running star/destruction totals for one clan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClanStanding {
    pub tag: ClanTag,
    pub name: String,
    pub stars: u32,
    pub destruction: f64,
}

/// A tier-name pattern and the number of slots it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRule {
    pub pattern: String,
    pub slots: u32,
}

impl TierRule {
    pub fn new(pattern: &str, slots: u32) -> Self {
        Self {
            pattern: pattern.to_string(),
            slots,
        }
    }
}

/// Ordered promotion/demotion tables. The first matching pattern wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionTable {
    #[serde(default = "default_promotions")]
    pub promotions: Vec<TierRule>,

    #[serde(default = "default_demotions")]
    pub demotions: Vec<TierRule>,
}

fn default_promotions() -> Vec<TierRule> {
    vec![
        TierRule::new("Gold.*", 2),
        TierRule::new("Crystal I", 1),
        TierRule::new("Crystal.*", 2),
        TierRule::new("Master.*", 1),
        TierRule::new("Champion.*", 1),
    ]
}

fn default_demotions() -> Vec<TierRule> {
    vec![TierRule::new(".*", 2)]
}

impl Default for PromotionTable {
    fn default() -> Self {
        Self {
            promotions: default_promotions(),
            demotions: default_demotions(),
        }
    }
}

/// Compiled [`PromotionTable`]. Patterns must match the whole tier name.
#[derive(Debug, Clone)]
pub struct PromotionRules {
    promotions: Vec<(Regex, u32)>,
    demotions: Vec<(Regex, u32)>,
}

impl PromotionRules {
    pub fn compile(table: &PromotionTable) -> Result<Self, regex::Error> {
        Ok(Self {
            promotions: compile_rules(&table.promotions)?,
            demotions: compile_rules(&table.demotions)?,
        })
    }

    /// Clans promoted out of `tier`, or `None` if no rule covers it.
    pub fn promotion_slots(&self, tier: &str) -> Option<u32> {
        first_match(&self.promotions, tier)
    }

    /// Clans demoted out of `tier`, or `None` if no rule covers it.
    pub fn demotion_slots(&self, tier: &str) -> Option<u32> {
        first_match(&self.demotions, tier)
    }
}

impl Default for PromotionRules {
    fn default() -> Self {
        Self::compile(&PromotionTable::default()).expect("built-in tier patterns are valid")
    }
}

fn compile_rules(rules: &[TierRule]) -> Result<Vec<(Regex, u32)>, regex::Error> {
    rules
        .iter()
        .map(|rule| Ok((Regex::new(&format!("^(?:{})$", rule.pattern))?, rule.slots)))
        .collect()
}

fn first_match(rules: &[(Regex, u32)], tier: &str) -> Option<u32> {
    rules
        .iter()
        .find(|(pattern, _)| pattern.is_match(tier))
        .map(|(_, slots)| *slots)
}

/// Decide promotion from a 1-based placement among `clan_count` clans.
pub fn promotion_status(
    placement: Option<usize>,
    clan_count: usize,
    promotion_slots: Option<u32>,
    demotion_slots: Option<u32>,
) -> PromotionStatus {
    let Some(placement) = placement else {
        return PromotionStatus::NoChange;
    };

    if let Some(slots) = promotion_slots {
        if placement <= slots as usize {
            return PromotionStatus::Promoted;
        }
    }
    if let Some(slots) = demotion_slots {
        if placement > clan_count.saturating_sub(slots as usize) {
            return PromotionStatus::Demoted;
        }
    }
    PromotionStatus::NoChange
}

/// Clan metadata shown in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClanInfo {
    pub tag: ClanTag,
    pub name: String,
    /// League tier name, e.g. "Master League II".
    pub war_league: Option<String>,
    pub badge_url: Option<String>,
}

impl From<ClanPayload> for ClanInfo {
    fn from(clan: ClanPayload) -> Self {
        Self {
            tag: clan.tag,
            name: clan.name,
            war_league: clan.war_league.map(|l| l.name),
            badge_url: clan.badge_urls.and_then(|b| b.medium),
        }
    }
}

/// Wars collected from a league group.
#[derive(Debug, Clone, Default)]
pub struct LeagueWars {
    /// The tracked clan's war of each round, oriented with it as home.
    pub tracked: Vec<War>,
    /// Every started war of every round, used for standings.
    pub all: Vec<War>,
}

impl From<Vec<War>> for LeagueWars {
    /// Wars that are both scored and ranked, e.g. a league where only the
    /// tracked clan's wars are known.
    fn from(wars: Vec<War>) -> Self {
        Self {
            all: wars.clone(),
            tracked: wars,
        }
    }
}

/// A clan's league season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct League {
    pub clan_tag: ClanTag,
    pub clan_info: ClanInfo,
    pub season: Option<String>,
    /// At most one war per round, in round order.
    pub wars: Vec<War>,
    /// Every clan in the group, sorted best first.
    pub standings: Vec<ClanStanding>,
    /// 1-based rank of the tracked clan in `standings`.
    pub placement: Option<usize>,
    pub promotion_slots: Option<u32>,
    pub demotion_slots: Option<u32>,
    pub promotion_status: PromotionStatus,
}

impl League {
    /// Assemble a league from already parsed wars.
    pub fn new(
        clan_tag: ClanTag,
        clan_info: ClanInfo,
        season: Option<String>,
        wars: LeagueWars,
        rules: &PromotionRules,
    ) -> Self {
        let standings = get_standings(&wars.all);
        let mut league = Self {
            clan_tag,
            clan_info,
            season,
            wars: wars.tracked,
            standings,
            placement: None,
            promotion_slots: None,
            demotion_slots: None,
            promotion_status: PromotionStatus::NoChange,
        };
        league.get_promotions(rules);
        league
    }

    /// Fetch the current league group, clan info and every war of the group.
    pub async fn fetch(
        api: &dyn CocApi,
        clan_tag: &ClanTag,
        rules: &PromotionRules,
    ) -> Result<Self, LeagueError> {
        let group = api.league_group(clan_tag).await?;
        let clan = api.clan(clan_tag).await?;
        let wars = parse_wars(api, &group, clan_tag).await?;

        Ok(Self::new(
            clan_tag.clone(),
            clan.into(),
            group.season,
            wars,
            rules,
        ))
    }

    /// League tier name of the tracked clan.
    pub fn tier(&self) -> Option<&str> {
        self.clan_info.war_league.as_deref()
    }

    fn get_promotions(&mut self, rules: &PromotionRules) {
        match self.clan_info.war_league.clone().as_deref() {
            Some(tier) => {
                self.promotion_slots = rules.promotion_slots(tier);
                self.demotion_slots = rules.demotion_slots(tier);
                if self.promotion_slots.is_none() {
                    warn!(clan = %self.clan_tag, tier, "No promotion rule for league tier");
                }
            }
            None => warn!(clan = %self.clan_tag, "Clan has no war league"),
        }

        self.placement = self
            .standings
            .iter()
            .position(|s| s.tag == self.clan_tag)
            .map(|i| i + 1);

        self.promotion_status = promotion_status(
            self.placement,
            self.standings.len(),
            self.promotion_slots,
            self.demotion_slots,
        );
    }
}

/// Walk the rounds in order and fetch every war. The first war per round
/// that involves `clan_tag` is kept as that round's tracked war; every war
/// that has started counts towards the standings.
pub async fn parse_wars(
    api: &dyn CocApi,
    group: &LeagueGroupPayload,
    clan_tag: &ClanTag,
) -> Result<LeagueWars, LeagueError> {
    let mut wars = LeagueWars::default();

    for (round_index, round) in group.rounds.iter().enumerate() {
        let round_number = round_index + 1;
        let mut found = false;

        for war_tag in &round.war_tags {
            if war_tag.is_placeholder() {
                continue;
            }

            let payload = api.war(war_tag).await?;
            let involved = !found && payload.involves(clan_tag);
            if !payload.state.has_started() {
                if involved {
                    debug!(round = round_number, war = %war_tag, state = ?payload.state, "War not started, skipping round");
                    found = true;
                }
                continue;
            }

            if involved {
                if let Some(war) = War::from_payload(payload, clan_tag)? {
                    debug!(round = round_number, war = %war_tag, enemy = %war.enemy_clan.name, "Parsed war");
                    wars.all.push(war.clone());
                    wars.tracked.push(war);
                    found = true;
                }
                continue;
            }

            payload.validate()?;
            let ended = payload.state == WarState::WarEnded;
            wars.all.push(War::new(payload.clan, payload.opponent, ended));
        }

        if !found {
            debug!(round = round_number, "No war for clan in round");
        }
    }

    info!(
        clan = %clan_tag,
        wars = wars.tracked.len(),
        group_wars = wars.all.len(),
        rounds = group.rounds.len(),
        "Parsed league wars"
    );
    Ok(wars)
}

/// Total stars and destruction per clan, sorted by (stars, destruction)
/// descending. Ties keep first-seen order.
fn get_standings(wars: &[War]) -> Vec<ClanStanding> {
    let mut standings: Vec<ClanStanding> = Vec::new();

    let mut add = |tag: &ClanTag, name: &str, stars: u32, destruction: f64| {
        match standings.iter_mut().find(|s| &s.tag == tag) {
            Some(standing) => {
                standing.stars += stars;
                standing.destruction += destruction;
            }
            None => standings.push(ClanStanding {
                tag: tag.clone(),
                name: name.to_string(),
                stars,
                destruction,
            }),
        }
    };

    for war in wars {
        let (home_stars, enemy_stars) = war.stars();
        let (home_destruction, enemy_destruction) = war.destruction();
        add(&war.home_clan.tag, &war.home_clan.name, home_stars, home_destruction);
        add(&war.enemy_clan.tag, &war.enemy_clan.name, enemy_stars, enemy_destruction);
    }

    standings.sort_by(|a, b| {
        b.stars
            .cmp(&a.stars)
            .then_with(|| b.destruction.total_cmp(&a.destruction))
    });
    standings
}
