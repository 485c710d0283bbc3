pub mod demo_analysis;
pub mod entities;

pub type Tick = u32;
pub type Slot = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct UserId(pub u32);

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Team {
    #[default]
    Unassigned,
    Spectator,
    Red,
    Blue,
}

pub static TEAM_IDS: phf::Map<u8, Team> = phf::phf_map! {
    0_u8 => Team::Unassigned,
    1_u8 => Team::Spectator,
    2_u8 => Team::Red,
    3_u8 => Team::Blue,
};

impl Team {
    pub fn from_id(id: u8) -> Self {
        TEAM_IDS.get(&id).copied().unwrap_or_default()
    }

    pub fn id(&self) -> u8 {
        match self {
            Self::Unassigned => 0,
            Self::Spectator => 1,
            Self::Red => 2,
            Self::Blue => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Spectator => "spectator",
            Self::Red => "red",
            Self::Blue => "blue",
        }
    }
}

impl core::fmt::Display for Team {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Class {
    #[default]
    Other,
    Scout,
    Sniper,
    Soldier,
    Demoman,
    Medic,
    Heavy,
    Pyro,
    Spy,
    Engineer,
}

// Class ids as they appear in m_iClass
pub static CLASS_IDS: phf::Map<u8, Class> = phf::phf_map! {
    0_u8 => Class::Other,
    1_u8 => Class::Scout,
    2_u8 => Class::Sniper,
    3_u8 => Class::Soldier,
    4_u8 => Class::Demoman,
    5_u8 => Class::Medic,
    6_u8 => Class::Heavy,
    7_u8 => Class::Pyro,
    8_u8 => Class::Spy,
    9_u8 => Class::Engineer,
};

impl Class {
    pub fn from_id(id: u8) -> Self {
        CLASS_IDS.get(&id).copied().unwrap_or_default()
    }

    /// Base health without overheal, `None` for [`Class::Other`]
    pub fn max_health(&self) -> Option<u16> {
        match self {
            Self::Other => None,
            Self::Scout => Some(125),
            Self::Sniper => Some(125),
            Self::Soldier => Some(200),
            Self::Demoman => Some(175),
            Self::Medic => Some(150),
            Self::Heavy => Some(300),
            Self::Pyro => Some(175),
            Self::Spy => Some(125),
            Self::Engineer => Some(125),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LifeState {
    #[default]
    Alive,
    Dying,
    Dead,
}

/// Identifies a player as the decoder knows them at some point in the demo.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlayerRef {
    pub user_id: UserId,
    pub entity_id: EntityId,
    pub name: String,
    pub steam_id: String,
}

impl PlayerRef {
    /// Placeholder for an entity that produced state before its user info arrived.
    pub fn unnamed(entity_id: EntityId) -> Self {
        Self {
            user_id: UserId(u32::MAX),
            entity_id,
            name: String::new(),
            steam_id: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn team_ids() {
        for id in 0..4 {
            assert_eq!(Team::from_id(id).id(), id);
        }
        assert_eq!(Team::from_id(17), Team::Unassigned);
        assert_eq!(Team::Red.to_string(), "red");
    }

    #[test]
    fn class_ids() {
        assert_eq!(Class::from_id(6), Class::Heavy);
        assert_eq!(Class::from_id(42), Class::Other);
        assert_eq!(Class::Heavy.max_health(), Some(300));
        assert_eq!(Class::Other.max_health(), None);
    }
}
