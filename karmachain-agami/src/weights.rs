// Copyright 2025 KarmaChain (https://github.com/karmachain)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Weight table accessor
//!
//! Read access to the learned (Q-learning-style) state-action value table
//! and to context-weight overrides. The table is a read-only snapshot
//! written by an external training process and refreshed out-of-band; the
//! context multipliers are the one shared mutable resource in the core and
//! are replaced copy-on-write so readers never observe a partial update.

use crate::error::{AgamiError, AgamiResult};
use karmachain_core::config::BaseWeights;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// The four Purushartha axes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Dharma,
    Artha,
    Kama,
    Moksha,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::Dharma, Axis::Artha, Axis::Kama, Axis::Moksha];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dharma => "dharma",
            Self::Artha => "artha",
            Self::Kama => "kama",
            Self::Moksha => "moksha",
        }
    }
}

/// Coarse karma band used as the state half of a state-action key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StateBand {
    Deficit,
    Neutral,
    Ascending,
    Radiant,
}

impl StateBand {
    /// Band for an aggregate karma value.
    pub fn from_karma(karma: f64) -> Self {
        if karma < 0.0 {
            Self::Deficit
        } else if karma < 150.0 {
            Self::Neutral
        } else if karma < 600.0 {
            Self::Ascending
        } else {
            Self::Radiant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deficit => "deficit",
            Self::Neutral => "neutral",
            Self::Ascending => "ascending",
            Self::Radiant => "radiant",
        }
    }
}

/// One learned state-action value, as stored in the trained artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub band: StateBand,
    pub action_type: String,
    pub value: f64,
}

/// Sparse learned state-action value table.
///
/// Missing keys are expected by construction; reads fall back to the
/// configured default instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    values: BTreeMap<StateBand, BTreeMap<String, f64>>,
}

impl WeightTable {
    pub fn from_entries(entries: impl IntoIterator<Item = WeightEntry>) -> Self {
        let mut values: BTreeMap<StateBand, BTreeMap<String, f64>> = BTreeMap::new();
        for entry in entries {
            values
                .entry(entry.band)
                .or_default()
                .insert(entry.action_type, entry.value);
        }
        Self { values }
    }

    /// Load a trained snapshot from a JSON array of entries.
    pub fn load_json(path: impl AsRef<Path>) -> AgamiResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<WeightEntry> = serde_json::from_str(&raw)?;
        Ok(Self::from_entries(entries))
    }

    pub fn get(&self, band: StateBand, action_type: &str) -> Option<f64> {
        self.values.get(&band).and_then(|m| m.get(action_type)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(|m| m.is_empty())
    }

    /// Action types the table was trained on, across all bands.
    pub fn trained_actions(&self) -> BTreeSet<&str> {
        self.values
            .values()
            .flat_map(|m| m.keys().map(|k| k.as_str()))
            .collect()
    }
}

/// Context multipliers over the four Purushartha axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextMultipliers {
    pub dharma: f64,
    pub artha: f64,
    pub kama: f64,
    pub moksha: f64,
}

impl Default for ContextMultipliers {
    fn default() -> Self {
        Self {
            dharma: 1.0,
            artha: 1.0,
            kama: 1.0,
            moksha: 1.0,
        }
    }
}

impl ContextMultipliers {
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Dharma => self.dharma,
            Axis::Artha => self.artha,
            Axis::Kama => self.kama,
            Axis::Moksha => self.moksha,
        }
    }

    /// All-or-nothing validation: every axis must be a positive finite
    /// real within the bound.
    pub fn validate(&self, bound: f64) -> AgamiResult<()> {
        for axis in Axis::ALL {
            let v = self.get(axis);
            if !v.is_finite() || v <= 0.0 || v > bound {
                return Err(AgamiError::InvalidWeight(format!(
                    "{} multiplier {} outside (0, {}]",
                    axis.as_str(),
                    v,
                    bound
                )));
            }
        }
        Ok(())
    }
}

/// Persisted context-weights file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ContextWeightsFile {
    context_weights: BTreeMap<String, ContextMultipliers>,
    default_behavior_weights: BTreeMap<String, f64>,
}

/// Built-in module weights used when the file carries none.
fn default_module_weights() -> BTreeMap<String, f64> {
    [
        ("finance", 1.0),
        ("game", 1.2),
        ("gurukul", 1.3),
        ("insight", 1.1),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Read access to the learned weight table plus context overrides.
///
/// The table and the context map are each an `Arc` snapshot behind a
/// lock; updates build a new map and swap the `Arc`, so a prediction that
/// grabbed its snapshot keeps computing against consistent values.
pub struct WeightAccessor {
    base: BaseWeights,
    default_q: f64,
    multiplier_bound: f64,
    table: RwLock<Arc<WeightTable>>,
    contexts: RwLock<Arc<BTreeMap<String, ContextMultipliers>>>,
    module_weights: RwLock<Arc<BTreeMap<String, f64>>>,
}

impl WeightAccessor {
    pub fn new(base: BaseWeights, default_q: f64, multiplier_bound: f64) -> Self {
        Self {
            base,
            default_q,
            multiplier_bound,
            table: RwLock::new(Arc::new(WeightTable::default())),
            contexts: RwLock::new(Arc::new(BTreeMap::new())),
            module_weights: RwLock::new(Arc::new(default_module_weights())),
        }
    }

    /// Learned value for a state-action key, or the configured default.
    pub fn value(&self, band: StateBand, action_type: &str) -> f64 {
        self.table
            .read()
            .get(band, action_type)
            .unwrap_or(self.default_q)
    }

    /// Current table snapshot.
    pub fn table(&self) -> Arc<WeightTable> {
        Arc::clone(&self.table.read())
    }

    /// Replace the learned table snapshot (external reload signal).
    pub fn reload_table(&self, table: WeightTable) {
        info!(
            actions = table.trained_actions().len(),
            "reloaded weight table snapshot"
        );
        *self.table.write() = Arc::new(table);
    }

    /// `effective_weight(axis) = base(axis) * context_multiplier`; the
    /// multiplier is 1.0 for every axis when no context is supplied or
    /// the key is unknown.
    pub fn effective_weight(&self, context_key: Option<&str>, axis: Axis) -> f64 {
        let base = match axis {
            Axis::Dharma => self.base.dharma,
            Axis::Artha => self.base.artha,
            Axis::Kama => self.base.kama,
            Axis::Moksha => self.base.moksha,
        };

        let multiplier = context_key
            .and_then(|key| self.contexts.read().get(key).copied())
            .unwrap_or_default()
            .get(axis);

        base * multiplier
    }

    /// Context entry, if configured.
    pub fn context(&self, key: &str) -> Option<ContextMultipliers> {
        self.contexts.read().get(key).copied()
    }

    /// Validate and apply a context-weight update atomically.
    ///
    /// Rejected updates leave the prior entry untouched; applied updates
    /// are visible to subsequent calls only, never mid-flight.
    pub fn set_context(&self, key: impl Into<String>, entry: ContextMultipliers) -> AgamiResult<()> {
        entry.validate(self.multiplier_bound)?;

        let mut contexts = self.contexts.write();
        let mut next = (**contexts).clone();
        next.insert(key.into(), entry);
        *contexts = Arc::new(next);
        Ok(())
    }

    /// Behavioral weight for a source module (normalization path).
    pub fn module_weight(&self, module: &str) -> f64 {
        self.module_weights.read().get(module).copied().unwrap_or(1.0)
    }

    /// Load context weights and module weights from the persisted JSON
    /// layout, replacing both maps. Every context entry is validated;
    /// a single bad entry rejects the whole file.
    pub fn load_context_file(&self, path: impl AsRef<Path>) -> AgamiResult<()> {
        let raw = std::fs::read_to_string(&path)?;
        let file: ContextWeightsFile = serde_json::from_str(&raw)?;

        for (key, entry) in &file.context_weights {
            entry.validate(self.multiplier_bound).map_err(|e| {
                AgamiError::InvalidWeight(format!("context '{}': {}", key, e))
            })?;
        }

        *self.contexts.write() = Arc::new(file.context_weights);
        if !file.default_behavior_weights.is_empty() {
            *self.module_weights.write() = Arc::new(file.default_behavior_weights);
        }

        info!(path = %path.as_ref().display(), "loaded context weights");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn accessor() -> WeightAccessor {
        WeightAccessor::new(BaseWeights::default(), 0.0, 10.0)
    }

    fn sample_table() -> WeightTable {
        WeightTable::from_entries([
            WeightEntry {
                band: StateBand::Neutral,
                action_type: "donation".to_string(),
                value: 3.0,
            },
            WeightEntry {
                band: StateBand::Neutral,
                action_type: "trade".to_string(),
                value: 1.5,
            },
            WeightEntry {
                band: StateBand::Ascending,
                action_type: "donation".to_string(),
                value: 2.0,
            },
        ])
    }

    #[test]
    fn test_missing_key_returns_default() {
        let acc = WeightAccessor::new(BaseWeights::default(), 0.25, 10.0);
        acc.reload_table(sample_table());

        assert_eq!(acc.value(StateBand::Neutral, "donation"), 3.0);
        assert_eq!(acc.value(StateBand::Radiant, "donation"), 0.25);
        assert_eq!(acc.value(StateBand::Neutral, "unknown_action"), 0.25);
    }

    #[test]
    fn test_effective_weight_without_context_is_base() {
        let base = BaseWeights {
            dharma: 1.1,
            artha: 0.9,
            kama: 1.0,
            moksha: 1.3,
        };
        let acc = WeightAccessor::new(base.clone(), 0.0, 10.0);

        assert_eq!(acc.effective_weight(None, Axis::Dharma), base.dharma);
        assert_eq!(acc.effective_weight(None, Axis::Artha), base.artha);
        assert_eq!(acc.effective_weight(None, Axis::Kama), base.kama);
        assert_eq!(acc.effective_weight(None, Axis::Moksha), base.moksha);
    }

    #[test]
    fn test_unknown_context_key_multiplies_by_one() {
        let acc = accessor();
        assert_eq!(acc.effective_weight(Some("no_such_realm"), Axis::Kama), 1.0);
    }

    #[test]
    fn test_context_merge_rule() {
        let acc = accessor();
        acc.set_context(
            "gurukul_teacher",
            ContextMultipliers {
                dharma: 1.5,
                artha: 0.8,
                kama: 0.9,
                moksha: 1.2,
            },
        )
        .unwrap();

        assert_eq!(
            acc.effective_weight(Some("gurukul_teacher"), Axis::Dharma),
            1.5
        );
        assert_eq!(
            acc.effective_weight(Some("gurukul_teacher"), Axis::Artha),
            0.8
        );
    }

    #[test]
    fn test_invalid_update_rejected_in_full() {
        let acc = accessor();
        let valid = ContextMultipliers {
            dharma: 1.2,
            ..ContextMultipliers::default()
        };
        acc.set_context("realm", valid).unwrap();

        for bad in [
            ContextMultipliers { kama: -0.5, ..valid },
            ContextMultipliers { moksha: f64::NAN, ..valid },
            ContextMultipliers { artha: 0.0, ..valid },
            ContextMultipliers { dharma: 11.0, ..valid },
        ] {
            let err = acc.set_context("realm", bad);
            assert!(matches!(err, Err(AgamiError::InvalidWeight(_))));
        }

        // Prior valid entry unchanged, no partial application.
        assert_eq!(acc.context("realm").unwrap(), valid);
    }

    #[test]
    fn test_load_context_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "context_weights": {{
                    "game_warrior": {{"dharma": 1.0, "artha": 1.2, "kama": 1.1, "moksha": 0.7}}
                }},
                "default_behavior_weights": {{"finance": 1.0, "game": 1.4}}
            }}"#
        )
        .unwrap();

        let acc = accessor();
        acc.load_context_file(file.path()).unwrap();

        assert_eq!(acc.effective_weight(Some("game_warrior"), Axis::Artha), 1.2);
        assert_eq!(acc.module_weight("game"), 1.4);
        assert_eq!(acc.module_weight("gurukul"), 1.0);
    }

    #[test]
    fn test_band_thresholds() {
        assert_eq!(StateBand::from_karma(-5.0), StateBand::Deficit);
        assert_eq!(StateBand::from_karma(0.0), StateBand::Neutral);
        assert_eq!(StateBand::from_karma(150.0), StateBand::Ascending);
        assert_eq!(StateBand::from_karma(600.0), StateBand::Radiant);
    }
}
