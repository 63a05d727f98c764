//! League cache keyed by (period, clan alias).
//!
//! A cached league is stored as `results/<period>/<alias>.league.json`
//! wrapped in a versioned envelope. Anything unreadable or from another
//! version is a miss, so the league is simply rebuilt.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{check_path_component, StorageConfig, StorageError};
use crate::models::League;

/// Bump when the serialized `League` shape changes.
pub const CACHE_VERSION: u32 = 2;

/// Store for already built leagues.
pub trait LeagueCache {
    /// Load a cached league, `None` on a miss.
    fn load(&self, period: &str, alias: &str) -> Result<Option<League>, StorageError>;

    /// Save a league, replacing any previous entry.
    fn save(&self, period: &str, alias: &str, league: &League) -> Result<(), StorageError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedLeague {
    version: u32,
    saved_at: DateTime<Utc>,
    league: League,
}

/// On-disk JSON cache under the results directory.
#[derive(Debug, Clone)]
pub struct FileLeagueCache {
    config: StorageConfig,
}

impl FileLeagueCache {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    fn path_for(&self, period: &str, alias: &str) -> Result<PathBuf, StorageError> {
        check_path_component(period)?;
        check_path_component(alias)?;
        Ok(self
            .config
            .results_dir(period)
            .join(format!("{}.league.json", alias)))
    }
}

impl LeagueCache for FileLeagueCache {
    fn load(&self, period: &str, alias: &str) -> Result<Option<League>, StorageError> {
        let path = self.path_for(period, alias)?;
        if !path.exists() {
            debug!("No cached league at {:?}", path);
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)?;
        let cached: CachedLeague = match serde_json::from_str(&raw) {
            Ok(cached) => cached,
            Err(e) => {
                warn!("Ignoring unreadable league cache {:?}: {}", path, e);
                return Ok(None);
            }
        };

        if cached.version != CACHE_VERSION {
            warn!(
                "Ignoring league cache {:?} with version {} (expected {})",
                path, cached.version, CACHE_VERSION
            );
            return Ok(None);
        }

        info!("Loaded league for {} from cache saved {}", alias, cached.saved_at);
        Ok(Some(cached.league))
    }

    fn save(&self, period: &str, alias: &str, league: &League) -> Result<(), StorageError> {
        let path = self.path_for(period, alias)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let cached = CachedLeague {
            version: CACHE_VERSION,
            saved_at: Utc::now(),
            league: league.clone(),
        };
        let json = serde_json::to_string(&cached)?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        debug!("Saved league cache to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClanInfo, LeagueWars, PromotionRules, PromotionStatus};
    use tempfile::TempDir;

    fn sample_league() -> League {
        League::new(
            "#US".into(),
            ClanInfo {
                tag: "#US".into(),
                name: "Us".to_string(),
                war_league: Some("Crystal League II".to_string()),
                badge_url: Some("https://example.com/badge.png".to_string()),
            },
            Some("2026-10".to_string()),
            LeagueWars::default(),
            &PromotionRules::default(),
        )
    }

    #[test]
    fn test_cache_miss_when_absent() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileLeagueCache::new(StorageConfig::new(temp_dir.path().to_path_buf()));

        assert!(cache.load("OCT", "bc").unwrap().is_none());
    }

    #[test]
    fn test_cache_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileLeagueCache::new(StorageConfig::new(temp_dir.path().to_path_buf()));

        cache.save("OCT", "bc", &sample_league()).unwrap();
        let loaded = cache.load("OCT", "bc").unwrap().unwrap();

        assert_eq!(loaded.clan_tag.as_str(), "#US");
        assert_eq!(loaded.tier(), Some("Crystal League II"));
        assert_eq!(loaded.promotion_status, PromotionStatus::NoChange);
        assert!(temp_dir
            .path()
            .join("results/OCT/bc.league.json")
            .exists());
        assert!(cache.load("OCT", "tbc").unwrap().is_none());
        assert!(cache.load("NOV", "bc").unwrap().is_none());
    }

    #[test]
    fn test_cache_version_mismatch_is_miss() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        let cache = FileLeagueCache::new(config.clone());
        cache.save("OCT", "bc", &sample_league()).unwrap();

        let path = config.results_dir("OCT").join("bc.league.json");
        let mut value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        value["version"] = serde_json::json!(CACHE_VERSION + 1);
        fs::write(&path, value.to_string()).unwrap();

        assert!(cache.load("OCT", "bc").unwrap().is_none());
    }

    #[test]
    fn test_cache_garbage_is_miss() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        fs::create_dir_all(config.results_dir("OCT")).unwrap();
        fs::write(config.results_dir("OCT").join("bc.league.json"), "not json").unwrap();

        let cache = FileLeagueCache::new(config);
        assert!(cache.load("OCT", "bc").unwrap().is_none());
    }

    #[test]
    fn test_cache_rejects_bad_alias() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileLeagueCache::new(StorageConfig::new(temp_dir.path().to_path_buf()));

        assert!(matches!(
            cache.load("OCT", "../etc"),
            Err(StorageError::InvalidPath(_))
        ));
    }
}
