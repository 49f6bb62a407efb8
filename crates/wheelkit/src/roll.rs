//! Roll service: the weighted draw that decides a winner.
//!
//! The wheel only ever visualizes an outcome produced here. `LocalRollService`
//! draws from a JSON catalog on disk and keeps a history of past rolls.

use crate::item::{ItemId, ItemKind, MediaType, WheelItem};
use derive_more::{AsRef, Deref, Display, From, Into};
use fs_err as fs;
use parking_lot::Mutex;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const MAX_HISTORY: usize = 100;

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct PresetId(String);

crate::impl_string_newtype!(PresetId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollOutcome {
    pub wheel_items: Vec<WheelItem>,
    pub winner_id: ItemId,
    pub winner_item: Option<WheelItem>,
}

#[derive(Error, Debug)]
pub enum RollError {
    #[error("Unknown preset '{0}'")]
    UnknownPreset(PresetId),
    #[error("Preset '{0}' has nothing to draw from")]
    EmptyPreset(PresetId),
    #[error("No history entry #{0}")]
    UnknownEntry(u64),
    #[error("Invalid weights: {0}")]
    Weights(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Malformed catalog: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait RollService: Send + Sync + 'static {
    fn begin_roll(
        &self,
        preset: &PresetId,
    ) -> impl Future<Output = Result<RollOutcome, RollError>> + Send;

    fn replay(&self, entry: u64) -> impl Future<Output = Result<RollOutcome, RollError>> + Send;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub id: PresetId,
    pub name: String,
    /// Multiplier per media type; types left out are not drawn.
    #[serde(default)]
    pub weights: HashMap<MediaType, f64>,
    /// Multiplier for virtual-collection entries; `0` leaves them out.
    #[serde(default)]
    pub collections: f64,
    /// Most entries put on the wheel; the rest of the pool sits this roll out.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Preset {
    fn factor(&self, item: &WheelItem) -> f64 {
        match (item.kind, item.media_type) {
            (ItemKind::Collection, _) => self.collections,
            (ItemKind::Catalog, Some(media)) => self.weights.get(&media).copied().unwrap_or(0.0),
            (ItemKind::Catalog, None) => 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub presets: Vec<Preset>,
    #[serde(default)]
    pub items: Vec<WheelItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub preset: PresetId,
    pub rolled_at: u64,
    pub outcome: RollOutcome,
}

pub struct LocalRollService {
    catalog: Catalog,
    history: Mutex<Vec<HistoryEntry>>,
    history_path: Option<PathBuf>,
}

impl LocalRollService {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            history: Mutex::new(Vec::new()),
            history_path: None,
        }
    }

    /// Load the catalog, and the history file if it exists.
    pub fn open(catalog: &Path, history: Option<PathBuf>) -> Result<Self, RollError> {
        let catalog: Catalog = serde_json::from_str(&fs::read_to_string(catalog)?)?;
        let entries = match &history {
            Some(path) if path.exists() => serde_json::from_str(&fs::read_to_string(path)?)?,
            _ => Vec::new(),
        };
        log::info!(
            "Catalog loaded: {} presets, {} items, {} history entries",
            catalog.presets.len(),
            catalog.items.len(),
            entries.len()
        );
        Ok(Self {
            catalog,
            history: Mutex::new(entries),
            history_path: history,
        })
    }

    pub fn presets(&self) -> &[Preset] {
        &self.catalog.presets
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().clone()
    }

    /// Build the wheel for `preset` and draw its winner.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        preset_id: &PresetId,
        rng: &mut R,
    ) -> Result<RollOutcome, RollError> {
        let preset = self
            .catalog
            .presets
            .iter()
            .find(|p| &p.id == preset_id)
            .ok_or_else(|| RollError::UnknownPreset(preset_id.clone()))?;

        let pool: Vec<WheelItem> = self
            .catalog
            .items
            .iter()
            .filter_map(|item| {
                let weight = item.effective_weight() * preset.factor(item);
                (weight.is_finite() && weight > 0.0).then(|| WheelItem {
                    weight,
                    ..item.clone()
                })
            })
            .collect();

        let wheel_items: Vec<WheelItem> = match preset.limit {
            Some(limit) if limit < pool.len() => {
                pool.choose_multiple(rng, limit).cloned().collect()
            }
            _ => pool,
        };
        if wheel_items.is_empty() {
            return Err(RollError::EmptyPreset(preset_id.clone()));
        }

        let index = WeightedIndex::new(wheel_items.iter().map(|i| i.weight))
            .map_err(|e| RollError::Weights(e.to_string()))?;
        let winner = wheel_items[index.sample(rng)].clone();

        Ok(RollOutcome {
            winner_id: winner.id.clone(),
            winner_item: Some(winner),
            wheel_items,
        })
    }

    fn record(&self, preset: &PresetId, outcome: &RollOutcome) -> Result<(), RollError> {
        let snapshot = {
            let mut history = self.history.lock();
            let id = history.last().map_or(1, |e| e.id + 1);
            history.push(HistoryEntry {
                id,
                preset: preset.clone(),
                rolled_at: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default(),
                outcome: outcome.clone(),
            });
            let excess = history.len().saturating_sub(MAX_HISTORY);
            history.drain(..excess);
            history.clone()
        };

        if let Some(path) = &self.history_path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        }
        Ok(())
    }
}

impl RollService for LocalRollService {
    async fn begin_roll(&self, preset: &PresetId) -> Result<RollOutcome, RollError> {
        let outcome = self.draw(preset, &mut rand::rng())?;
        if let Err(e) = self.record(preset, &outcome) {
            log::error!("Failed to save roll history: {}", e);
        }
        log::info!(
            "Rolled '{}' from {} entries",
            outcome
                .winner_item
                .as_ref()
                .map_or(outcome.winner_id.as_str(), |w| w.title.as_str()),
            outcome.wheel_items.len()
        );
        Ok(outcome)
    }

    async fn replay(&self, entry: u64) -> Result<RollOutcome, RollError> {
        self.history
            .lock()
            .iter()
            .find(|e| e.id == entry)
            .map(|e| e.outcome.clone())
            .ok_or(RollError::UnknownEntry(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const CATALOG: &str = r#"{
        "presets": [
            {"id": "movies", "name": "Movie night", "weights": {"movie": 2.0}},
            {"id": "mixed", "name": "Anything", "weights": {"movie": 1.0, "book": 3.0},
             "collections": 1.0, "limit": 3},
            {"id": "empty", "name": "Nothing", "weights": {"game": 1.0}}
        ],
        "items": [
            {"id": "m1", "title": "Alien", "media_type": "movie", "year": 1979},
            {"id": "m2", "title": "Heat", "media_type": "movie", "w": 0},
            {"id": "b1", "title": "Dune", "media_type": "book"},
            {"id": "t1", "title": "Severance", "media_type": "tv"},
            {"id": "c1", "title": "Comfort picks", "kind": "collection", "w": 2}
        ]
    }"#;

    fn service() -> LocalRollService {
        LocalRollService::new(serde_json::from_str(CATALOG).unwrap())
    }

    #[test]
    fn test_draw_filters_by_preset_weights() {
        let service = service();
        let mut rng = Pcg32::seed_from_u64(1);
        let outcome = service.draw(&PresetId::from("movies"), &mut rng).unwrap();

        let ids: Vec<_> = outcome.wheel_items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        // zero weight is normalized before the preset factor applies
        assert!(outcome.wheel_items.iter().all(|i| i.weight == 2.0));
        assert!(outcome.wheel_items.iter().any(|i| i.id == outcome.winner_id));
    }

    #[test]
    fn test_limit_caps_the_wheel() {
        let service = service();
        for seed in 0..50 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let outcome = service.draw(&PresetId::from("mixed"), &mut rng).unwrap();
            assert_eq!(outcome.wheel_items.len(), 3);
            assert!(outcome.wheel_items.iter().all(|i| i.id.as_str() != "t1"));
            assert!(outcome.wheel_items.iter().any(|i| i.id == outcome.winner_id));
        }
    }

    #[test]
    fn test_draw_errors() {
        let service = service();
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(matches!(
            service.draw(&PresetId::from("nope"), &mut rng),
            Err(RollError::UnknownPreset(_))
        ));
        assert!(matches!(
            service.draw(&PresetId::from("empty"), &mut rng),
            Err(RollError::EmptyPreset(_))
        ));
    }

    #[tokio::test]
    async fn test_rolls_are_recorded_and_replayable() {
        let service = service();
        let first = service.begin_roll(&PresetId::from("movies")).await.unwrap();
        let _ = service.begin_roll(&PresetId::from("mixed")).await.unwrap();

        let history = service.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, 1);
        assert_eq!(history[1].id, 2);
        assert_eq!(service.replay(1).await.unwrap(), first);
        assert!(matches!(
            service.replay(9).await,
            Err(RollError::UnknownEntry(9))
        ));
    }

    #[tokio::test]
    async fn test_history_persists() {
        let dir = std::env::temp_dir().join(format!("wheelkit-history-{}", std::process::id()));
        let catalog = dir.join("catalog.json");
        let history = dir.join("history.json");
        fs::create_dir_all(&dir).unwrap();
        fs::write(&catalog, CATALOG).unwrap();

        let service = LocalRollService::open(&catalog, Some(history.clone())).unwrap();
        service.begin_roll(&PresetId::from("movies")).await.unwrap();

        let reopened = LocalRollService::open(&catalog, Some(history)).unwrap();
        assert_eq!(reopened.history().len(), 1);
        let _ = fs::remove_dir_all(&dir);
    }
}
