use common::demo_analysis::{Header, World};
use common::entities::{CachedBuilding, CachedProjectile, PlayerSnapshot};
use common::{EntityId, PlayerRef, Team, Tick, UserId};

/// The game events the timeline is built from.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DemoEvent {
    Header(Header),
    ServerInfo { interval_per_tick: f32 },
    World(World),
    UserInfo(PlayerRef),
    PlayerUpdate { entity: EntityId, snapshot: PlayerSnapshot },
    BuildingUpdate(CachedBuilding),
    BuildingDestroyed { entity: EntityId },
    ProjectileUpdate(CachedProjectile),
    ProjectileDestroyed { entity: EntityId },
    Death {
        victim: UserId,
        assister: Option<UserId>,
        killer: Option<UserId>,
        weapon: String,
    },
    RoundStart,
    RoundEnd { winner: Team },
}

/// Event driven access to a decoded demo.
pub trait Decoder {
    /// The next event and the tick it happened at, `None` once the demo is exhausted.
    fn next_event(&mut self) -> Result<Option<(Tick, DemoEvent)>, crate::DecodeError>;

    /// How much of the input has been consumed, in `[0, 1]`.
    fn progress(&self) -> f32;
}

impl<D> Decoder for &mut D
where
    D: Decoder + ?Sized,
{
    fn next_event(&mut self) -> Result<Option<(Tick, DemoEvent)>, crate::DecodeError> {
        (**self).next_event()
    }

    fn progress(&self) -> f32 {
        (**self).progress()
    }
}
