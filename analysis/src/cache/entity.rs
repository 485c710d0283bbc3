use super::track::{self, Track};
use common::entities::{CachedBuilding, CachedProjectile};
use common::{EntityId, Tick};

/// Width of the buckets the live cache indexes entity lifespans by. Demos that would
/// need more than [`MAX_INDEX_ENTRIES`] index entries get proportionally wider buckets.
pub const INDEX_BUCKET_TICKS: Tick = 128;

pub const MAX_INDEX_ENTRIES: u64 = 1 << 16;

/// One lifespan of an entity: from the tick it was first seen until the tick it was
/// destroyed (exclusive). Entity ids can be reused after destruction, every reuse gets
/// its own track.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntityTrackData<T> {
    pub entity: EntityId,
    pub spawned: Tick,
    pub destroyed: Option<Tick>,
    pub states: Vec<(Tick, T)>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntityCacheData<T> {
    pub tracks: Vec<EntityTrackData<T>>,
}

impl<T> Default for EntityCacheData<T> {
    fn default() -> Self {
        Self { tracks: Vec::new() }
    }
}

#[derive(Debug)]
pub struct EntityCacheBuilder<T> {
    tracks: Vec<EntityTrackData<T>>,
    open: std::collections::HashMap<EntityId, usize>,
}

impl<T> EntityCacheBuilder<T> {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            open: std::collections::HashMap::new(),
        }
    }

    pub fn record_at_tick(&mut self, tick: Tick, entity: EntityId, value: T) {
        let idx = *self.open.entry(entity).or_insert_with(|| {
            self.tracks.push(EntityTrackData {
                entity,
                spawned: tick,
                destroyed: None,
                states: Vec::new(),
            });
            self.tracks.len() - 1
        });

        let entry = &mut self.tracks[idx];
        entry.spawned = entry.spawned.min(tick);
        track::record(&mut entry.states, tick, value);
    }

    /// Closes the current lifespan of `entity`, returns false if it was not alive.
    pub fn destroy(&mut self, tick: Tick, entity: EntityId) -> bool {
        match self.open.remove(&entity) {
            Some(idx) => {
                let entry = &mut self.tracks[idx];
                entry.destroyed = Some(tick.max(entry.spawned));
                true
            }
            None => false,
        }
    }

    pub fn alive(&self) -> usize {
        self.open.len()
    }

    pub fn finish(self) -> EntityCacheData<T> {
        EntityCacheData {
            tracks: self.tracks,
        }
    }
}

impl<T> Default for EntityCacheBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Span<T> {
    entity: EntityId,
    spawned: Tick,
    destroyed: Option<Tick>,
    track: Track<T>,
}

impl<T> Span<T> {
    fn alive_at(&self, tick: Tick) -> bool {
        self.spawned <= tick && self.destroyed.map_or(true, |d| tick < d)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityCache<T> {
    spans: Vec<Span<T>>,
    bucket_ticks: Tick,
    // bucket -> spans alive in it, for the ticks before `horizon`
    buckets: std::collections::BTreeMap<u32, Vec<u32>>,
    // nothing is spawned, updated or destroyed at or after this tick
    horizon: Tick,
    // spans still alive at `horizon`
    open: Vec<u32>,
    ticks: Tick,
}

impl<T> EntityCache<T> {
    /// `ticks` is the length of the demo, entities that are never destroyed stay alive
    /// until then.
    pub fn rehydrate(data: EntityCacheData<T>, ticks: Tick) -> Self {
        let mut spans = Vec::with_capacity(data.tracks.len());
        // (span, spawned, end) of every span that is alive for at least one tick
        let mut alive = Vec::with_capacity(data.tracks.len());
        let mut horizon: Tick = 0;

        for entry in data.tracks {
            let track = Track::from_entries(entry.states);
            let spawned = track
                .first_tick()
                .map_or(entry.spawned, |first| first.max(entry.spawned));

            let end = entry.destroyed.unwrap_or(ticks).min(ticks);
            if !track.is_empty() && spawned < end {
                let last_change = match (entry.destroyed, track.last_tick()) {
                    (Some(destroyed), _) => destroyed,
                    (None, Some(last)) => last.saturating_add(1),
                    (None, None) => spawned.saturating_add(1),
                };
                horizon = horizon.max(last_change.min(end));
                alive.push((spans.len() as u32, spawned, end));
            }

            spans.push(Span {
                entity: entry.entity,
                spawned,
                destroyed: entry.destroyed,
                track,
            });
        }

        let indexed_ticks: u64 = alive
            .iter()
            .map(|&(_, spawned, end)| u64::from(end.min(horizon).saturating_sub(spawned)))
            .sum();
        let bucket_ticks = indexed_ticks
            .div_ceil(MAX_INDEX_ENTRIES)
            .clamp(u64::from(INDEX_BUCKET_TICKS), u64::from(Tick::MAX)) as Tick;

        let mut buckets: std::collections::BTreeMap<u32, Vec<u32>> = Default::default();
        let mut open = Vec::new();
        for (idx, spawned, end) in alive {
            let indexed_end = end.min(horizon);
            if spawned < indexed_end {
                for bucket in spawned / bucket_ticks..=(indexed_end - 1) / bucket_ticks {
                    buckets.entry(bucket).or_default().push(idx);
                }
            }
            if end > horizon {
                open.push(idx);
            }
        }

        Self {
            spans,
            bucket_ticks,
            buckets,
            horizon,
            open,
            ticks,
        }
    }

    /// The last known state of every entity alive at `tick`, in spawn order.
    pub fn at_tick(&self, tick: Tick) -> impl Iterator<Item = &T> + '_ {
        let candidates: &[u32] = if tick >= self.ticks {
            &[]
        } else if tick >= self.horizon {
            &self.open
        } else {
            self.buckets
                .get(&(tick / self.bucket_ticks))
                .map(|b| b.as_slice())
                .unwrap_or(&[])
        };

        candidates
            .iter()
            .map(|idx| &self.spans[*idx as usize])
            .filter(move |span| span.alive_at(tick))
            .filter_map(move |span| span.track.at(tick).map(|(_, value)| value))
    }

    /// Number of entries in the tick index.
    pub fn index_size(&self) -> usize {
        self.buckets.values().map(|b| b.len()).sum::<usize>() + self.open.len()
    }

    pub fn lifespans(&self) -> usize {
        self.spans.len()
    }

    pub fn lifespan_of(&self, entity: EntityId, tick: Tick) -> Option<(Tick, Option<Tick>)> {
        self.spans
            .iter()
            .find(|span| span.entity == entity && span.alive_at(tick))
            .map(|span| (span.spawned, span.destroyed))
    }
}

impl<T: Clone> EntityCache<T> {
    pub fn to_data(&self) -> EntityCacheData<T> {
        EntityCacheData {
            tracks: self
                .spans
                .iter()
                .map(|span| EntityTrackData {
                    entity: span.entity,
                    spawned: span.spawned,
                    destroyed: span.destroyed,
                    states: span.track.to_entries(),
                })
                .collect(),
        }
    }
}

pub type BuildingCacheData = EntityCacheData<CachedBuilding>;
pub type BuildingCache = EntityCache<CachedBuilding>;

impl EntityCache<CachedBuilding> {
    pub fn get_buildings(&self, tick: Tick) -> Vec<CachedBuilding> {
        self.at_tick(tick).cloned().collect()
    }
}

pub type ProjectileCacheData = EntityCacheData<CachedProjectile>;
pub type ProjectileCache = EntityCache<CachedProjectile>;

impl EntityCache<CachedProjectile> {
    pub fn get_projectiles(&self, tick: Tick) -> Vec<CachedProjectile> {
        self.at_tick(tick).cloned().collect()
    }
}
