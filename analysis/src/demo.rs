use crate::cache::{
    BuildingCache, BuildingCacheData, PlayerCache, PlayerCacheData, ProjectileCache,
    ProjectileCacheData,
};
use common::demo_analysis::{CachedDeath, Header, Round, World};
use common::entities::{CachedBuilding, CachedPlayer, CachedProjectile};
use common::{PlayerRef, Team, Tick};

/// Everything a parse produced, as plain data.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CachedDemoData {
    pub header: Header,
    pub ticks: u32,
    pub interval_per_tick: f32,
    pub world: World,
    /// slot -> latest entity handle
    pub players: Vec<PlayerRef>,
    pub next_mapped_player: u32,
    pub player_cache: PlayerCacheData,
    pub building_cache: BuildingCacheData,
    pub projectile_cache: ProjectileCacheData,
    pub deaths: Vec<CachedDeath>,
    pub rounds: Vec<Round>,
}

impl CachedDemoData {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bitcode::Error> {
        bitcode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bitcode::Error> {
        bitcode::deserialize(bytes)
    }
}

/// A parsed demo with random access to its state at every tick.
#[derive(Debug)]
pub struct CachedDemo {
    header: Header,
    ticks: u32,
    interval_per_tick: f32,
    world: World,
    players: Vec<PlayerRef>,
    player_cache: PlayerCache,
    building_cache: BuildingCache,
    projectile_cache: ProjectileCache,
    deaths: std::collections::BTreeMap<Tick, Vec<CachedDeath>>,
    rounds: Vec<Round>,
}

impl CachedDemo {
    pub fn rehydrate(data: CachedDemoData) -> Self {
        let mut players = data.players;
        players.truncate(data.next_mapped_player as usize);

        let mut deaths = std::collections::BTreeMap::<Tick, Vec<CachedDeath>>::new();
        for death in data.deaths {
            deaths.entry(death.tick).or_default().push(death);
        }

        let mut rounds = data.rounds;
        rounds.sort_by_key(|r| r.start_tick);

        Self {
            player_cache: PlayerCache::rehydrate(data.player_cache),
            building_cache: BuildingCache::rehydrate(data.building_cache, data.ticks),
            projectile_cache: ProjectileCache::rehydrate(data.projectile_cache, data.ticks),
            header: data.header,
            ticks: data.ticks,
            interval_per_tick: data.interval_per_tick,
            world: data.world,
            players,
            deaths,
            rounds,
        }
    }

    pub fn dehydrate(&self) -> CachedDemoData {
        CachedDemoData {
            header: self.header.clone(),
            ticks: self.ticks,
            interval_per_tick: self.interval_per_tick,
            world: self.world,
            players: self.players.clone(),
            next_mapped_player: self.players.len() as u32,
            player_cache: self.player_cache.to_data(),
            building_cache: self.building_cache.to_data(),
            projectile_cache: self.projectile_cache.to_data(),
            deaths: self.deaths.values().flatten().cloned().collect(),
            rounds: self.rounds.clone(),
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn interval_per_tick(&self) -> f32 {
        self.interval_per_tick
    }

    pub fn next_mapped_player(&self) -> u32 {
        self.players.len() as u32
    }

    /// slot -> latest entity handle
    pub fn players(&self) -> &[PlayerRef] {
        &self.players
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn tick_to_seconds(&self, tick: Tick) -> f32 {
        tick as f32 * self.interval_per_tick
    }

    pub fn seconds_to_tick(&self, seconds: f32) -> Tick {
        if self.interval_per_tick <= 0.0 {
            return 0;
        }
        let tick = (seconds / self.interval_per_tick).round().max(0.0) as Tick;
        tick.min(self.ticks.saturating_sub(1))
    }

    fn in_range(&self, tick: Tick) -> bool {
        tick < self.ticks
    }

    /// Every player that has been seen by `tick`, in slot order.
    pub fn players_at_tick(&self, tick: Tick) -> Vec<CachedPlayer> {
        if !self.in_range(tick) {
            return Vec::new();
        }

        let mut players: Vec<CachedPlayer> = self
            .players
            .iter()
            .enumerate()
            .filter_map(|(slot, user)| self.player_cache.get_player(tick, slot as u32, user))
            .collect();

        fake_head_to_head_teams(&mut players);

        players
    }

    pub fn buildings_at_tick(&self, tick: Tick) -> Vec<CachedBuilding> {
        self.building_cache.get_buildings(tick)
    }

    pub fn projectiles_at_tick(&self, tick: Tick) -> Vec<CachedProjectile> {
        self.projectile_cache.get_projectiles(tick)
    }

    pub fn deaths_at_tick(&self, tick: Tick) -> &[CachedDeath] {
        self.deaths.get(&tick).map(|d| d.as_slice()).unwrap_or(&[])
    }

    /// Deaths in `start..end`, oldest first.
    pub fn deaths_between(&self, start: Tick, end: Tick) -> impl Iterator<Item = &CachedDeath> + '_ {
        let range = if start < end { start..end } else { start..start };
        self.deaths.range(range).flat_map(|(_, deaths)| deaths.iter())
    }

    pub fn death_count(&self) -> usize {
        self.deaths.values().map(|d| d.len()).sum()
    }

    pub fn round_at_tick(&self, tick: Tick) -> Option<(usize, &Round)> {
        let idx = self
            .rounds
            .partition_point(|r| r.start_tick <= tick)
            .checked_sub(1)?;
        let round = &self.rounds[idx];
        round.contains(tick).then_some((idx, round))
    }
}

/// Head to head matches without server assigned teams have both players on team 0,
/// they are shown as red against blue instead.
pub fn fake_head_to_head_teams(players: &mut [CachedPlayer]) {
    if let [first, second] = players {
        if first.team == Team::Unassigned && second.team == Team::Unassigned {
            first.team = Team::Red;
            second.team = Team::Blue;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::entities::PlayerSnapshot;
    use common::{EntityId, UserId};

    fn player(slot: u32, team: Team) -> CachedPlayer {
        let snapshot = PlayerSnapshot {
            team,
            ..Default::default()
        };
        let user = PlayerRef {
            user_id: UserId(slot),
            entity_id: EntityId(slot + 1),
            name: format!("player{}", slot),
            steam_id: String::new(),
        };
        CachedPlayer::new(slot, user, 0, &snapshot)
    }

    #[test]
    fn head_to_head_without_teams() {
        let mut players = vec![player(0, Team::Unassigned), player(1, Team::Unassigned)];
        fake_head_to_head_teams(&mut players);

        assert_eq!(players[0].team, Team::Red);
        assert_eq!(players[0].team.id(), 2);
        assert_eq!(players[1].team, Team::Blue);
        assert_eq!(players[1].team.id(), 3);
    }

    #[test]
    fn head_to_head_other_configurations() {
        let cases = [
            vec![player(0, Team::Unassigned), player(1, Team::Red)],
            vec![player(0, Team::Blue), player(1, Team::Blue)],
            vec![player(0, Team::Spectator), player(1, Team::Spectator)],
            vec![player(0, Team::Unassigned)],
            vec![
                player(0, Team::Unassigned),
                player(1, Team::Unassigned),
                player(2, Team::Unassigned),
            ],
        ];

        for case in cases {
            let mut players = case.clone();
            fake_head_to_head_teams(&mut players);
            assert_eq!(players, case);
        }
    }
}
