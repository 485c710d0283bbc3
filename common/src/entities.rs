use crate::{Class, EntityId, LifeState, PlayerRef, Slot, Team, Tick, UserId, Vector};

/// The state of a single player as recorded by the decoder.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayerSnapshot {
    pub position: Vector,
    pub view_angle: f32,
    pub pitch_angle: f32,
    pub health: u16,
    pub class: Class,
    pub team: Team,
    pub state: LifeState,
    /// Medigun charge in percent
    pub charge: u8,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CachedPlayer {
    pub slot: Slot,
    pub user: PlayerRef,
    /// Tick of the snapshot this player state was taken from, at or before the queried tick
    pub tick: Tick,
    pub position: Vector,
    pub view_angle: f32,
    pub pitch_angle: f32,
    pub health: u16,
    pub class: Class,
    pub team: Team,
    pub state: LifeState,
    pub charge: u8,
}

impl CachedPlayer {
    pub fn new(slot: Slot, user: PlayerRef, tick: Tick, snapshot: &PlayerSnapshot) -> Self {
        Self {
            slot,
            user,
            tick,
            position: snapshot.position,
            view_angle: snapshot.view_angle,
            pitch_angle: snapshot.pitch_angle,
            health: snapshot.health,
            class: snapshot.class,
            team: snapshot.team,
            state: snapshot.state,
            charge: snapshot.charge,
        }
    }

    /// Health relative to the class maximum, above 100 when overhealed.
    pub fn health_percentage(&self) -> f32 {
        match self.class.max_health() {
            Some(max) => self.health as f32 / max as f32 * 100.0,
            None => 0.0,
        }
    }

    pub fn overheal_percentage(&self) -> f32 {
        (self.health_percentage() - 100.0).clamp(0.0, 100.0)
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.state, LifeState::Alive)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BuildingKind {
    Sentry,
    Dispenser,
    TeleporterEntrance,
    TeleporterExit,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CachedBuilding {
    pub entity_id: EntityId,
    pub kind: BuildingKind,
    pub builder: Option<UserId>,
    pub position: Vector,
    pub angle: f32,
    pub level: u8,
    pub health: u16,
    pub max_health: u16,
    pub team: Team,
    pub is_building: bool,
    pub is_sapped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ProjectileKind {
    Rocket,
    Pipe,
    Sticky,
    Arrow,
    Flare,
    HealingBolt,
    Other,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CachedProjectile {
    pub entity_id: EntityId,
    pub kind: ProjectileKind,
    pub owner: Option<UserId>,
    pub position: Vector,
    pub rotation: Vector,
    pub team: Team,
    pub critical: bool,
}
