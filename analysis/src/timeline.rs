use crate::cache::{EntityCacheBuilder, PlayerCacheData};
use crate::demo::CachedDemoData;
use crate::slots::SlotTable;
use crate::{BuildError, DecodeError, DemoEvent, Decoder};
use common::demo_analysis::{CachedDeath, Header, Round, World};
use common::entities::{CachedBuilding, CachedProjectile};
use common::{PlayerRef, Slot, Team, Tick, UserId};

/// Tick interval of a default 66 tick server, used until the demo says otherwise.
pub const DEFAULT_INTERVAL_PER_TICK: f32 = 0.015;

#[derive(Debug, Clone)]
pub struct Config {
    /// Minimum progress increase between two progress reports.
    pub progress_step: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            progress_step: 0.01,
        }
    }
}

/// Rate limits progress reports and keeps them non-decreasing within `[0, 1]`.
#[derive(Debug)]
pub struct ProgressGate {
    step: f32,
    last: Option<f32>,
}

impl ProgressGate {
    pub fn new(step: f32) -> Self {
        Self {
            step: step.max(0.0),
            last: None,
        }
    }

    pub fn advance(&mut self, fraction: f32) -> Option<f32> {
        if fraction.is_nan() {
            return None;
        }
        let fraction = fraction.clamp(0.0, 1.0);

        match self.last {
            Some(last) if fraction <= last || fraction - last < self.step => None,
            _ => {
                self.last = Some(fraction);
                Some(fraction)
            }
        }
    }
}

#[derive(Debug, Default)]
struct RoundTracker {
    open: Option<Tick>,
    last_end: Tick,
    rounds: Vec<Round>,
}

impl RoundTracker {
    fn start(&mut self, tick: Tick) {
        if let Some(start) = self.open.replace(tick) {
            tracing::debug!(start, restart = tick, "Discarding unfinished round");
        }
    }

    fn end(&mut self, tick: Tick, winner: Team, interval_per_tick: f32) {
        let start = self.open.take().unwrap_or(self.last_end).max(self.last_end);
        self.rounds.push(Round {
            start_tick: start,
            end_tick: tick,
            winner,
            length: tick.saturating_sub(start) as f32 * interval_per_tick,
        });
        self.last_end = tick;
    }
}

/// Folds the decoded event stream into the caches, death log and round list of a demo.
#[derive(Debug)]
pub struct TimelineBuilder {
    header: Option<Header>,
    world: World,
    interval_per_tick: f32,
    last_tick: Option<Tick>,
    slots: SlotTable,
    // team of every slot as of the last player update
    teams: Vec<Team>,
    players: PlayerCacheData,
    buildings: EntityCacheBuilder<CachedBuilding>,
    projectiles: EntityCacheBuilder<CachedProjectile>,
    deaths: Vec<CachedDeath>,
    rounds: RoundTracker,
}

impl TimelineBuilder {
    pub fn new() -> Self {
        Self {
            header: None,
            world: World::default(),
            interval_per_tick: DEFAULT_INTERVAL_PER_TICK,
            last_tick: None,
            slots: SlotTable::new(),
            teams: Vec::new(),
            players: PlayerCacheData::default(),
            buildings: EntityCacheBuilder::new(),
            projectiles: EntityCacheBuilder::new(),
            deaths: Vec::new(),
            rounds: RoundTracker::default(),
        }
    }

    pub fn handle(&mut self, tick: Tick, event: DemoEvent) {
        let tick = match self.last_tick {
            Some(last) if tick < last => {
                tracing::warn!(tick, last, "Event tick went backwards");
                last
            }
            _ => tick,
        };
        self.last_tick = Some(tick);

        match event {
            DemoEvent::Header(header) => {
                tracing::debug!(map = %header.map, server = %header.server, "Demo header");
                self.header = Some(header);
            }
            DemoEvent::ServerInfo { interval_per_tick } => {
                if interval_per_tick > 0.0 {
                    self.interval_per_tick = interval_per_tick;
                }
            }
            DemoEvent::World(world) => {
                self.world = world;
            }
            DemoEvent::UserInfo(player) => {
                let binding = self.slots.bind_user(player);
                if let Some(orphan) = binding.orphaned {
                    tracing::debug!(slot = binding.slot, orphan, "Merging slot of reconnected user");
                    self.players.merge_slot(orphan, binding.slot);
                    if let Some(team) = self.teams.get(orphan as usize).copied() {
                        self.set_team(binding.slot, team);
                    }
                }
            }
            DemoEvent::PlayerUpdate { entity, snapshot } => {
                let slot = self.slots.resolve_entity(entity);
                self.set_team(slot, snapshot.team);
                self.players.record_at_tick(tick, slot, snapshot);
            }
            DemoEvent::BuildingUpdate(building) => {
                self.buildings
                    .record_at_tick(tick, building.entity_id, building);
            }
            DemoEvent::BuildingDestroyed { entity } => {
                if !self.buildings.destroy(tick, entity) {
                    tracing::trace!(?entity, tick, "Destroyed unknown building");
                }
            }
            DemoEvent::ProjectileUpdate(projectile) => {
                self.projectiles
                    .record_at_tick(tick, projectile.entity_id, projectile);
            }
            DemoEvent::ProjectileDestroyed { entity } => {
                if !self.projectiles.destroy(tick, entity) {
                    tracing::trace!(?entity, tick, "Destroyed unknown projectile");
                }
            }
            DemoEvent::Death {
                victim,
                assister,
                killer,
                weapon,
            } => {
                self.death(tick, victim, assister, killer, weapon);
            }
            DemoEvent::RoundStart => {
                self.rounds.start(tick);
            }
            DemoEvent::RoundEnd { winner } => {
                self.rounds.end(tick, winner, self.interval_per_tick);
            }
        };
    }

    fn set_team(&mut self, slot: Slot, team: Team) {
        if self.teams.len() <= slot as usize {
            self.teams.resize(slot as usize + 1, Team::Unassigned);
        }
        self.teams[slot as usize] = team;
    }

    fn participant(&self, user: UserId) -> Option<(PlayerRef, Team)> {
        let slot = self.slots.slot_of_user(user)?;
        let player = self.slots.player(slot)?.clone();
        let team = self.teams.get(slot as usize).copied().unwrap_or_default();
        Some((player, team))
    }

    fn death(
        &mut self,
        tick: Tick,
        victim: UserId,
        assister: Option<UserId>,
        killer: Option<UserId>,
        weapon: String,
    ) {
        let (victim, victim_team) = match self.participant(victim) {
            Some(v) => v,
            None => {
                tracing::warn!(?victim, tick, "Death of unknown user");
                return;
            }
        };
        let assister = assister.and_then(|u| self.participant(u));
        let killer = killer.and_then(|u| self.participant(u));

        tracing::trace!(tick, victim = %victim.name, %weapon, "Death");

        self.deaths.push(CachedDeath {
            tick,
            victim,
            assister_team: assister.as_ref().map(|(_, t)| *t).unwrap_or_default(),
            assister: assister.map(|(p, _)| p),
            killer_team: killer.as_ref().map(|(_, t)| *t).unwrap_or_default(),
            killer: killer.map(|(p, _)| p),
            weapon,
            victim_team,
        });
    }

    pub fn finish(self) -> Result<CachedDemoData, DecodeError> {
        let header = self.header.ok_or(DecodeError::MissingHeader)?;

        let observed = self.last_tick.map_or(0, |t| t.saturating_add(1));
        let ticks = header.ticks.max(observed);

        if let Some(start) = self.rounds.open {
            tracing::debug!(start, "Dropping round that never ended");
        }

        let next_mapped_player = self.slots.next_mapped_player();
        let mut player_cache = self.players;
        player_cache.retain_slots(|slot| !self.slots.is_retired(slot));

        Ok(CachedDemoData {
            header,
            ticks,
            interval_per_tick: self.interval_per_tick,
            world: self.world,
            players: self.slots.into_players(),
            next_mapped_player,
            player_cache,
            building_cache: self.buildings.finish(),
            projectile_cache: self.projectiles.finish(),
            deaths: self.deaths,
            rounds: self.rounds.rounds,
        })
    }
}

impl Default for TimelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives `decoder` to the end of the demo. `progress` is called with the fraction of
/// the input consumed so far, returning [`ControlFlow::Break`] from it cancels the build.
///
/// [`ControlFlow::Break`]: std::ops::ControlFlow::Break
#[tracing::instrument(name = "Timeline", skip_all)]
pub fn build<D, P>(mut decoder: D, config: &Config, mut progress: P) -> Result<CachedDemoData, BuildError>
where
    D: Decoder,
    P: FnMut(f32) -> std::ops::ControlFlow<()>,
{
    let mut gate = ProgressGate::new(config.progress_step);
    let mut builder = TimelineBuilder::new();

    let mut events = 0usize;
    while let Some((tick, event)) = decoder.next_event()? {
        builder.handle(tick, event);
        events += 1;

        if let Some(fraction) = gate.advance(decoder.progress()) {
            if progress(fraction).is_break() {
                tracing::info!(events, "Cancelled");
                return Err(BuildError::Cancelled);
            }
        }
    }

    let demo = builder.finish()?;
    tracing::info!(
        events,
        ticks = demo.ticks,
        players = demo.next_mapped_player,
        deaths = demo.deaths.len(),
        rounds = demo.rounds.len(),
        "Built timeline"
    );

    Ok(demo)
}
