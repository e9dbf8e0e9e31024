//! Traffic target store
//!
//! Merges partial, multi-source updates into one record per ICAO address,
//! expires targets by age and bounds their number. One `RwLock` guards the
//! whole map; writers and snapshots take it exclusively.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, trace};

use crate::icao::Icao;
use crate::report::Traffic;
use crate::update::{Source, TrafficUpdate};

/// Default capacity.
pub const DEFAULT_MAX_TARGETS: usize = 200;
/// Default time-to-live of a target without updates.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Store limits. Zero values mean "use the default".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub max_targets: usize,
    pub ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_targets: DEFAULT_MAX_TARGETS,
            ttl: DEFAULT_TTL,
        }
    }
}

impl StoreConfig {
    fn normalized(self) -> Self {
        Self {
            max_targets: if self.max_targets == 0 {
                DEFAULT_MAX_TARGETS
            } else {
                self.max_targets
            },
            ttl: if self.ttl.is_zero() { DEFAULT_TTL } else { self.ttl },
        }
    }
}

/// Per-target state. The key of the map always equals `traffic.icao`.
#[derive(Debug, Clone)]
struct Target {
    traffic: Traffic,
    seen_at: DateTime<Utc>,
    squawk: Option<String>,
    source: Source,
}

impl Target {
    fn new(icao: Icao, now: DateTime<Utc>) -> Self {
        Self {
            traffic: Traffic {
                icao,
                ..Default::default()
            },
            seen_at: now,
            squawk: None,
            source: Source::Unknown,
        }
    }
}

/// A copy of one target with its bookkeeping fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSnapshot {
    pub traffic: Traffic,
    /// False when the record sits at exactly (0, 0)
    pub position_valid: bool,
    pub seen_at: DateTime<Utc>,
    pub squawk: Option<String>,
    pub source: Source,
}

impl From<Target> for TargetSnapshot {
    fn from(t: Target) -> Self {
        Self {
            position_valid: t.traffic.has_position(),
            traffic: t.traffic,
            seen_at: t.seen_at,
            squawk: t.squawk,
            source: t.source,
        }
    }
}

/// Concurrency-safe collection of traffic targets keyed by ICAO.
pub struct TrafficStore {
    cfg: StoreConfig,
    targets: RwLock<HashMap<Icao, Target>>,
}

impl Default for TrafficStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl TrafficStore {
    pub fn new(cfg: StoreConfig) -> Self {
        let cfg = cfg.normalized();
        Self {
            cfg,
            targets: RwLock::new(HashMap::with_capacity(cfg.max_targets.min(1024))),
        }
    }

    /// Effective limits after default substitution
    pub fn config(&self) -> StoreConfig {
        self.cfg
    }

    /// Merge one update.
    ///
    /// A position-bearing update replaces the record, carrying forward the
    /// metadata fields it does not itself carry; explicit metadata is applied
    /// on top. Metadata alone only refreshes a target that already exists.
    pub fn apply(&self, now: DateTime<Utc>, update: TrafficUpdate) {
        if update.is_empty() {
            trace!("dropping empty traffic update");
            return;
        }
        let Some(update) = update.with_defaults() else {
            trace!("dropping traffic update without an ICAO address");
            return;
        };
        let TrafficUpdate {
            icao,
            traffic,
            meta,
            source,
        } = update;

        let mut targets = self.targets.write();
        let existed = targets.contains_key(&icao);
        if !existed && traffic.is_none() {
            trace!(%icao, "dropping metadata for unseen target");
            return;
        }

        let has_position_update = traffic.is_some();
        let target = targets
            .entry(icao)
            .or_insert_with(|| Target::new(icao, now));

        if let Some(mut t) = traffic {
            if existed {
                meta.carry_forward(&mut t, &target.traffic);
            }
            target.traffic = t;
        }
        meta.apply_to(&mut target.traffic);
        target.seen_at = now;

        if let Some(squawk) = meta.squawk {
            target.squawk = Some(squawk);
        }
        if source != Source::Unknown {
            target.source = source;
        }

        if has_position_update {
            self.evict_oldest(&mut targets);
        }
    }

    /// Apply a full record.
    pub fn upsert(&self, now: DateTime<Utc>, traffic: Traffic) {
        self.apply(now, TrafficUpdate::from(traffic));
    }

    /// Apply full records, skipping any at exactly (0, 0).
    pub fn upsert_many<I>(&self, now: DateTime<Utc>, records: I)
    where
        I: IntoIterator<Item = Traffic>,
    {
        for t in records.into_iter().filter(Traffic::has_position) {
            self.upsert(now, t);
        }
    }

    /// Purge expired targets, then return copies of the rest ordered by ICAO.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<Traffic> {
        self.purge_and_collect(now)
            .into_iter()
            .map(|t| t.traffic)
            .collect()
    }

    /// Like [`snapshot`](Self::snapshot) but with last-seen time, squawk,
    /// source and position validity.
    pub fn snapshot_detailed(&self, now: DateTime<Utc>) -> Vec<TargetSnapshot> {
        self.purge_and_collect(now)
            .into_iter()
            .map(TargetSnapshot::from)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.targets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.read().is_empty()
    }

    fn purge_and_collect(&self, now: DateTime<Utc>) -> Vec<Target> {
        let mut targets = self.targets.write();

        let cutoff = chrono::Duration::from_std(self.cfg.ttl)
            .ok()
            .and_then(|ttl| now.checked_sub_signed(ttl));
        if let Some(cutoff) = cutoff {
            let before = targets.len();
            targets.retain(|_, t| t.seen_at >= cutoff);
            let purged = before - targets.len();
            if purged > 0 {
                debug!(purged, remaining = targets.len(), "purged expired traffic targets");
            }
        }

        let mut out: Vec<Target> = targets.values().cloned().collect();
        drop(targets);

        out.sort_unstable_by_key(|t| t.traffic.icao);
        out
    }

    /// Remove the least recently seen targets until within capacity. Ties go
    /// to the lower ICAO address.
    fn evict_oldest(&self, targets: &mut HashMap<Icao, Target>) {
        let over = targets.len().saturating_sub(self.cfg.max_targets);
        if over == 0 {
            return;
        }

        let mut candidates: Vec<(DateTime<Utc>, Icao)> =
            targets.iter().map(|(k, v)| (v.seen_at, *k)).collect();
        candidates.sort_unstable();
        for (_, icao) in candidates.into_iter().take(over) {
            targets.remove(&icao);
        }
        debug!(
            evicted = over,
            max_targets = self.cfg.max_targets,
            "evicted oldest traffic targets"
        );
    }
}
