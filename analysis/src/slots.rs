use common::{EntityId, PlayerRef, Slot, UserId};

/// Assigns every player a slot the first time they are seen and keeps it for the rest
/// of the demo, independent of the entity handles the decoder hands out.
#[derive(Debug, Default)]
pub struct SlotTable {
    by_entity: std::collections::HashMap<EntityId, Slot>,
    by_user: std::collections::HashMap<UserId, Slot>,
    // slots allocated from an entity update before any user info was seen for them
    unbound: std::collections::HashSet<Slot>,
    // unbound slots whose entity turned out to belong to a known user
    retired: std::collections::BTreeSet<Slot>,
    players: Vec<PlayerRef>,
}

/// The outcome of [`SlotTable::bind_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub slot: Slot,
    /// A slot that was allocated for the entity before its user info arrived, for a
    /// user that already had a slot. Everything recorded for it belongs to `slot`.
    pub orphaned: Option<Slot>,
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot currently mapped to `entity`, allocating one if the entity was not
    /// seen before.
    pub fn resolve_entity(&mut self, entity: EntityId) -> Slot {
        if let Some(slot) = self.by_entity.get(&entity) {
            return *slot;
        }

        let slot = self.allocate(PlayerRef::unnamed(entity));
        self.unbound.insert(slot);
        self.by_entity.insert(entity, slot);

        tracing::trace!(?entity, slot, "Allocated slot for unnamed entity");

        slot
    }

    /// Binds user info to a slot. A known user keeps their slot even if they show up
    /// with a different entity handle.
    pub fn bind_user(&mut self, player: PlayerRef) -> Binding {
        let (slot, orphaned) = match self.by_user.get(&player.user_id).copied() {
            Some(slot) => {
                let orphaned = match self.by_entity.get(&player.entity_id).copied() {
                    Some(other) if other != slot && self.unbound.remove(&other) => {
                        self.retired.insert(other);
                        Some(other)
                    }
                    _ => None,
                };
                (slot, orphaned)
            }
            None => {
                let slot = match self.by_entity.get(&player.entity_id).copied() {
                    Some(slot) if self.unbound.remove(&slot) => slot,
                    _ => self.allocate(player.clone()),
                };
                self.by_user.insert(player.user_id, slot);
                (slot, None)
            }
        };

        let previous = self.players[slot as usize].entity_id;
        if previous != player.entity_id && self.by_entity.get(&previous) == Some(&slot) {
            self.by_entity.remove(&previous);
        }
        self.by_entity.insert(player.entity_id, slot);

        tracing::trace!(user = ?player.user_id, entity = ?player.entity_id, slot, ?orphaned, "Bound user");

        self.players[slot as usize] = player;
        Binding { slot, orphaned }
    }

    pub fn slot_of_user(&self, user: UserId) -> Option<Slot> {
        self.by_user.get(&user).copied()
    }

    pub fn player(&self, slot: Slot) -> Option<&PlayerRef> {
        self.players.get(slot as usize)
    }

    pub fn is_retired(&self, slot: Slot) -> bool {
        self.retired.contains(&slot)
    }

    /// Number of slots handed out, not counting retired ones.
    pub fn next_mapped_player(&self) -> u32 {
        (self.players.len() - self.retired.len()) as u32
    }

    /// slot -> latest entity handle, with retired slots removed and the remaining ones
    /// moved up to keep the numbering dense.
    pub fn into_players(self) -> Vec<PlayerRef> {
        let retired = self.retired;
        self.players
            .into_iter()
            .enumerate()
            .filter(|(slot, _)| !retired.contains(&(*slot as Slot)))
            .map(|(_, player)| player)
            .collect()
    }

    fn allocate(&mut self, player: PlayerRef) -> Slot {
        let slot = self.players.len() as Slot;
        self.players.push(player);
        slot
    }
}
