use crate::{PlayerRef, Team, Tick, Vector};

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Header {
    pub demo_type: String,
    pub version: u32,
    pub protocol: u32,
    pub server: String,
    pub nick: String,
    pub map: String,
    pub game: String,
    pub duration: f32,
    pub ticks: u32,
    pub frames: u32,
    pub signon: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct World {
    pub boundary_min: Vector,
    pub boundary_max: Vector,
}

/// A kill, with every participant's team as it was at the time of the kill.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CachedDeath {
    pub tick: Tick,
    pub victim: PlayerRef,
    pub assister: Option<PlayerRef>,
    pub killer: Option<PlayerRef>,
    pub weapon: String,
    pub victim_team: Team,
    pub assister_team: Team,
    pub killer_team: Team,
}

impl CachedDeath {
    /// The victim killed themselves.
    pub fn is_suicide(&self) -> bool {
        self.killer
            .as_ref()
            .is_some_and(|killer| killer.user_id == self.victim.user_id)
    }

    /// Killed by the world (fall damage, map hazards), there is no killer.
    pub fn is_environmental(&self) -> bool {
        self.killer.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Round {
    pub start_tick: Tick,
    pub end_tick: Tick,
    pub winner: Team,
    /// Length in seconds
    pub length: f32,
}

impl Round {
    /// Rounds cover `start_tick..end_tick`, the end tick belongs to whatever follows.
    pub fn contains(&self, tick: Tick) -> bool {
        self.start_tick <= tick && tick < self.end_tick
    }
}
