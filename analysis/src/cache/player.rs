use super::track::{self, Track};
use common::entities::{CachedPlayer, PlayerSnapshot};
use common::{PlayerRef, Slot, Tick};

/// Player snapshots per slot in their transferable form.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayerCacheData {
    pub slots: Vec<Vec<(Tick, PlayerSnapshot)>>,
}

impl PlayerCacheData {
    pub fn record_at_tick(&mut self, tick: Tick, slot: Slot, snapshot: PlayerSnapshot) {
        let slot = slot as usize;
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, Vec::new);
        }
        track::record(&mut self.slots[slot], tick, snapshot);
    }

    /// Moves every snapshot of `from` into `into`. On equal ticks the moved snapshot
    /// wins, it was recorded later.
    pub fn merge_slot(&mut self, from: Slot, into: Slot) {
        let moved = match self.slots.get_mut(from as usize) {
            Some(entries) => std::mem::take(entries),
            None => return,
        };
        for (tick, snapshot) in moved {
            self.record_at_tick(tick, into, snapshot);
        }
    }

    /// Drops the slots `keep` rejects, the following slots move up.
    pub fn retain_slots<F>(&mut self, mut keep: F)
    where
        F: FnMut(Slot) -> bool,
    {
        let mut slot: Slot = 0;
        self.slots.retain(|_| {
            let kept = keep(slot);
            slot += 1;
            kept
        });
    }

    pub fn snapshot_count(&self) -> usize {
        self.slots.iter().map(|s| s.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerCache {
    slots: Vec<Track<PlayerSnapshot>>,
}

impl PlayerCache {
    pub fn rehydrate(data: PlayerCacheData) -> Self {
        Self {
            slots: data.slots.into_iter().map(Track::from_entries).collect(),
        }
    }

    pub fn to_data(&self) -> PlayerCacheData {
        PlayerCacheData {
            slots: self.slots.iter().map(|t| t.to_entries()).collect(),
        }
    }

    /// The state of the player in `slot` at `tick`, which is the last state recorded at
    /// or before it. `None` if nothing was recorded for the slot yet.
    pub fn get_player(&self, tick: Tick, slot: Slot, user: &PlayerRef) -> Option<CachedPlayer> {
        let (at, snapshot) = self.slots.get(slot as usize)?.at(tick)?;
        Some(CachedPlayer::new(slot, user.clone(), at, snapshot))
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn first_tick(&self, slot: Slot) -> Option<Tick> {
        self.slots.get(slot as usize)?.first_tick()
    }
}
