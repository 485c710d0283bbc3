//! Tick indexed caches of entity state.
//!
//! Every cache comes in two forms: a plain data form that is filled while the demo is
//! decoded and moved out of the decoding thread, and a live form created from it with
//! `rehydrate` that answers point queries. Lookups use hold-last-value semantics, an
//! entity has the state of its most recent update at or before the queried tick.

pub mod entity;
pub mod player;
pub mod track;

pub use entity::{
    BuildingCache, BuildingCacheData, EntityCache, EntityCacheBuilder, EntityCacheData,
    ProjectileCache, ProjectileCacheData,
};
pub use player::{PlayerCache, PlayerCacheData};
