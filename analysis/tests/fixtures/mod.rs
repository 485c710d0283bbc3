#![allow(dead_code)]

use analysis::{DecodeError, DemoEvent, Decoder};
use common::demo_analysis::{Header, World};
use common::entities::{BuildingKind, CachedBuilding, CachedProjectile, PlayerSnapshot, ProjectileKind};
use common::{Class, EntityId, LifeState, PlayerRef, Team, Tick, UserId, Vector};

pub fn header(ticks: u32) -> DemoEvent {
    DemoEvent::Header(Header {
        demo_type: "HL2DEMO".to_owned(),
        version: 3,
        protocol: 24,
        server: "test server".to_owned(),
        nick: "SourceTV Demo".to_owned(),
        map: "cp_process_final".to_owned(),
        game: "tf".to_owned(),
        duration: ticks as f32 * 0.015,
        ticks,
        frames: ticks / 2,
        signon: 0,
    })
}

pub fn user(user_id: u32, entity: u32, name: &str) -> DemoEvent {
    DemoEvent::UserInfo(PlayerRef {
        user_id: UserId(user_id),
        entity_id: EntityId(entity),
        name: name.to_owned(),
        steam_id: format!("[U:1:{}]", 1000 + user_id),
    })
}

pub fn player(entity: u32, team: Team, x: f32) -> DemoEvent {
    DemoEvent::PlayerUpdate {
        entity: EntityId(entity),
        snapshot: PlayerSnapshot {
            position: Vector::new(x, 0.0, 0.0),
            view_angle: 90.0,
            pitch_angle: 0.0,
            health: 200,
            class: Class::Soldier,
            team,
            state: LifeState::Alive,
            charge: 0,
        },
    }
}

pub fn sentry(entity: u32, builder: u32, level: u8) -> DemoEvent {
    DemoEvent::BuildingUpdate(CachedBuilding {
        entity_id: EntityId(entity),
        kind: BuildingKind::Sentry,
        builder: Some(UserId(builder)),
        position: Vector::new(10.0, 10.0, 0.0),
        angle: 0.0,
        level,
        health: 150,
        max_health: 150,
        team: Team::Red,
        is_building: false,
        is_sapped: false,
    })
}

pub fn rocket(entity: u32, owner: u32, x: f32) -> DemoEvent {
    DemoEvent::ProjectileUpdate(CachedProjectile {
        entity_id: EntityId(entity),
        kind: ProjectileKind::Rocket,
        owner: Some(UserId(owner)),
        position: Vector::new(x, 0.0, 64.0),
        rotation: Vector::default(),
        team: Team::Red,
        critical: false,
    })
}

pub fn kill(victim: u32, killer: u32, weapon: &str) -> DemoEvent {
    DemoEvent::Death {
        victim: UserId(victim),
        assister: None,
        killer: Some(UserId(killer)),
        weapon: weapon.to_owned(),
    }
}

/// A short scripted match: alpha (red) and bravo (blue) from the start, charlie joins
/// blue at tick 300 and swaps to red at tick 600.
pub fn sample_match() -> Vec<(Tick, DemoEvent)> {
    vec![
        (0, header(2000)),
        (0, DemoEvent::ServerInfo { interval_per_tick: 0.015 }),
        (
            0,
            DemoEvent::World(World {
                boundary_min: Vector::new(-4096.0, -4096.0, -1024.0),
                boundary_max: Vector::new(4096.0, 4096.0, 1024.0),
            }),
        ),
        (0, user(1, 2, "alpha")),
        (0, user(2, 3, "bravo")),
        (1, player(2, Team::Red, 0.0)),
        (1, player(3, Team::Blue, 100.0)),
        (10, DemoEvent::RoundStart),
        (100, player(2, Team::Red, 10.0)),
        (120, sentry(50, 1, 1)),
        (130, rocket(60, 1, 0.0)),
        (140, rocket(60, 1, 40.0)),
        (150, DemoEvent::ProjectileDestroyed { entity: EntityId(60) }),
        (200, kill(2, 1, "tf_projectile_rocket")),
        (300, user(3, 4, "charlie")),
        (300, player(4, Team::Blue, 50.0)),
        (400, sentry(50, 1, 2)),
        (500, kill(3, 1, "shotgun_soldier")),
        (600, player(4, Team::Red, 55.0)),
        (700, DemoEvent::BuildingDestroyed { entity: EntityId(50) }),
        (900, DemoEvent::RoundEnd { winner: Team::Red }),
        (950, DemoEvent::RoundStart),
        (1500, DemoEvent::RoundEnd { winner: Team::Blue }),
        (1999, player(2, Team::Red, 20.0)),
    ]
}

pub fn encode(events: &[(Tick, DemoEvent)]) -> Vec<u8> {
    let mut writer = analysis::demofile::DemoWriter::new();
    for (tick, event) in events {
        writer.event(*tick, event).unwrap();
    }
    writer.finish()
}

/// Replays events from memory, reports progress by event count.
pub struct VecDecoder {
    events: std::vec::IntoIter<(Tick, DemoEvent)>,
    total: usize,
    consumed: usize,
}

impl VecDecoder {
    pub fn new(events: Vec<(Tick, DemoEvent)>) -> Self {
        Self {
            total: events.len(),
            events: events.into_iter(),
            consumed: 0,
        }
    }
}

impl Decoder for VecDecoder {
    fn next_event(&mut self) -> Result<Option<(Tick, DemoEvent)>, DecodeError> {
        let next = self.events.next();
        if next.is_some() {
            self.consumed += 1;
        }
        Ok(next)
    }

    fn progress(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.consumed as f32 / self.total as f32
    }
}
