//! League analysis.
//!
//! Obtains a clan's league (cached or freshly fetched), scores every war
//! appearance and ranks players by total score.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::calculate::ScoringPolicy;
use crate::config::TrackedClan;
use crate::fetch::CocApi;
use crate::models::{
    destruction_histogram, partial_destruction_histogram, ClanStanding, ClanTag, League,
    LeagueError, LeaguePerformance, ModelError, PlayerRow, PlayerTag, PromotionRules,
    PromotionStatus, RankedPlayer, StarDistribution, ThAverages,
};
use crate::storage::{
    report_path, write_json, JsonlWriter, LeagueCache, ReportFile, StorageConfig, StorageError,
};

/// Errors that abort the analysis of one clan.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("League error: {0}")]
    League(#[from] LeagueError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Runs the league analysis for one clan at a time.
pub struct CwlAnalyzer<'a> {
    api: &'a dyn CocApi,
    cache: &'a dyn LeagueCache,
    policy: ScoringPolicy,
    rules: PromotionRules,
    recheck: bool,
}

impl<'a> CwlAnalyzer<'a> {
    pub fn new(
        api: &'a dyn CocApi,
        cache: &'a dyn LeagueCache,
        policy: ScoringPolicy,
        rules: PromotionRules,
    ) -> Self {
        Self {
            api,
            cache,
            policy,
            rules,
            recheck: false,
        }
    }

    /// Builder method to bypass the league cache.
    pub fn with_recheck(mut self, recheck: bool) -> Self {
        self.recheck = recheck;
        self
    }

    /// Analyze a clan's league for a period.
    #[instrument(skip(self, clan), fields(clan = %clan.alias))]
    pub async fn analyze(
        &self,
        clan: &TrackedClan,
        period: &str,
    ) -> Result<LeagueAnalysis, AnalyzeError> {
        let league = self.obtain_league(clan, period).await?;
        let analysis = LeagueAnalysis::build(clan.clone(), period, league, &self.policy)?;

        info!(
            wars = analysis.league.wars.len(),
            players = analysis.players.len(),
            placement = ?analysis.league.placement,
            status = %analysis.league.promotion_status,
            "Analyzed {}",
            clan.name
        );
        Ok(analysis)
    }

    async fn obtain_league(&self, clan: &TrackedClan, period: &str) -> Result<League, AnalyzeError> {
        if !self.recheck {
            if let Some(league) = self.cache.load(period, &clan.alias)? {
                return Ok(league);
            }
        }

        let league = League::fetch(self.api, &clan.tag, &self.rules).await?;
        self.cache.save(period, &clan.alias, &league)?;
        Ok(league)
    }
}

/// Everything computed for one clan's league.
#[derive(Debug, Clone)]
pub struct LeagueAnalysis {
    pub clan: TrackedClan,
    pub period: String,
    pub league: League,
    /// Sorted by total score, best first. Ties keep first-appearance order.
    pub players: Vec<RankedPlayer>,
    /// Mean town hall levels per war, in war order.
    pub th_averages: Vec<ThAverages>,
    pub stars: StarDistribution,
    /// Destruction of every first attack.
    pub destruction: Vec<f64>,
}

impl LeagueAnalysis {
    /// Score and aggregate every player appearance in the league.
    pub fn build(
        clan: TrackedClan,
        period: &str,
        league: League,
        policy: &ScoringPolicy,
    ) -> Result<Self, ModelError> {
        let mut index: HashMap<PlayerTag, usize> = HashMap::new();
        let mut players: Vec<RankedPlayer> = Vec::new();
        let mut th_averages = Vec::with_capacity(league.wars.len());
        let mut stars = StarDistribution::default();
        let mut destruction = Vec::new();

        for war in &league.wars {
            for player in &war.players {
                let slot = *index.entry(player.tag.clone()).or_insert_with(|| {
                    players.push(RankedPlayer {
                        player: player.clone(),
                        performance: LeaguePerformance::default(),
                    });
                    players.len() - 1
                });

                let score = policy.score(player);
                players[slot]
                    .performance
                    .record(score, player.attacked(), war.ended);

                stars.record(player);
                if let Some(outcome) = &player.performance {
                    destruction.push(outcome.destruction);
                }
            }

            let (home, enemy) = war.average_th_level()?;
            th_averages.push(ThAverages { home, enemy });
        }

        sort_by_score(&mut players);

        Ok(Self {
            clan,
            period: period.to_string(),
            league,
            players,
            th_averages,
            stars,
            destruction,
        })
    }

    /// Leaderboard rows, rank 1 first.
    pub fn player_rows(&self) -> Vec<PlayerRow> {
        self.players
            .iter()
            .enumerate()
            .map(|(i, ranked)| PlayerRow::new(i + 1, ranked))
            .collect()
    }

    /// Mean of the per-war town hall averages.
    pub fn mean_th_levels(&self) -> Option<ThAverages> {
        if self.th_averages.is_empty() {
            return None;
        }
        let count = self.th_averages.len() as f64;
        Some(ThAverages {
            home: self.th_averages.iter().map(|a| a.home).sum::<f64>() / count,
            enemy: self.th_averages.iter().map(|a| a.enemy).sum::<f64>() / count,
        })
    }

    pub fn summary(&self) -> LeagueSummary {
        LeagueSummary {
            alias: self.clan.alias.clone(),
            clan_tag: self.league.clan_tag.clone(),
            clan_name: self.league.clan_info.name.clone(),
            period: self.period.clone(),
            season: self.league.season.clone(),
            league_tier: self.league.clan_info.war_league.clone(),
            badge_url: self.league.clan_info.badge_url.clone(),
            wars: self.league.wars.len(),
            placement: self.league.placement,
            clans_in_standings: self.league.standings.len(),
            promotion_status: self.league.promotion_status,
            mean_th: self.mean_th_levels(),
            stars: self.stars,
            destruction_histogram: destruction_histogram(&self.destruction).to_vec(),
            partial_destruction_histogram: partial_destruction_histogram(&self.destruction)
                .to_vec(),
        }
    }

    /// Write leaderboard, standings and summary under the period directory.
    pub fn write_reports(&self, storage: &StorageConfig) -> Result<(), StorageError> {
        let alias = &self.clan.alias;

        JsonlWriter::<PlayerRow>::for_report(storage, ReportFile::Players, &self.period, alias)?
            .write_all(&self.player_rows())?;
        JsonlWriter::<ClanStanding>::for_report(storage, ReportFile::Standings, &self.period, alias)?
            .write_all(&self.league.standings)?;

        let summary_path = report_path(storage, ReportFile::Summary, &self.period, alias)?;
        write_json(&summary_path, &self.summary())
    }
}

/// Stable sort, highest total score first.
pub fn sort_by_score(players: &mut [RankedPlayer]) {
    players.sort_by(|a, b| b.performance.score.total_cmp(&a.performance.score));
}

/// Read-only league overview for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueSummary {
    pub alias: String,
    pub clan_tag: ClanTag,
    pub clan_name: String,
    pub period: String,
    pub season: Option<String>,
    pub league_tier: Option<String>,
    pub badge_url: Option<String>,
    pub wars: usize,
    pub placement: Option<usize>,
    pub clans_in_standings: usize,
    pub promotion_status: PromotionStatus,
    pub mean_th: Option<ThAverages>,
    pub stars: StarDistribution,
    pub destruction_histogram: Vec<u32>,
    /// Destruction histogram without 100% attacks.
    pub partial_destruction_histogram: Vec<u32>,
}
