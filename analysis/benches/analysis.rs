use analysis::demofile::DemoWriter;
use analysis::DemoEvent;
use common::demo_analysis::Header;
use common::entities::{CachedProjectile, PlayerSnapshot, ProjectileKind};
use common::{EntityId, PlayerRef, Team, UserId, Vector};

fn main() {
    divan::main();
}

// 18 players sending an update every tick, a rocket every 10 ticks that lives for 100
fn synthetic_demo(ticks: u32) -> Vec<u8> {
    let mut writer = DemoWriter::new();
    writer
        .event(
            0,
            &DemoEvent::Header(Header {
                map: "cp_badlands".to_owned(),
                ticks,
                ..Default::default()
            }),
        )
        .unwrap();

    for user in 0..18 {
        writer
            .event(
                0,
                &DemoEvent::UserInfo(PlayerRef {
                    user_id: UserId(user),
                    entity_id: EntityId(user + 1),
                    name: format!("player{}", user),
                    steam_id: String::new(),
                }),
            )
            .unwrap();
    }

    for tick in 0..ticks {
        for user in 0..18 {
            let snapshot = PlayerSnapshot {
                position: Vector::new(tick as f32, user as f32, 0.0),
                health: 150,
                team: if user % 2 == 0 { Team::Red } else { Team::Blue },
                ..Default::default()
            };
            writer
                .event(tick, &DemoEvent::PlayerUpdate { entity: EntityId(user + 1), snapshot })
                .unwrap();
        }

        if tick % 10 == 0 {
            let projectile = CachedProjectile {
                entity_id: EntityId(1000 + (tick / 10) % 64),
                kind: ProjectileKind::Rocket,
                owner: Some(UserId(0)),
                position: Vector::new(tick as f32, 0.0, 0.0),
                rotation: Vector::default(),
                team: Team::Red,
                critical: false,
            };
            writer.event(tick, &DemoEvent::ProjectileUpdate(projectile)).unwrap();
        }
        if tick >= 100 && tick % 10 == 0 {
            let entity = EntityId(1000 + ((tick - 100) / 10) % 64);
            writer.event(tick, &DemoEvent::ProjectileDestroyed { entity }).unwrap();
        }
    }

    writer.finish()
}

#[divan::bench(args = [1_000, 10_000])]
fn build_timeline(bencher: divan::Bencher, ticks: u32) {
    let data = synthetic_demo(ticks);
    let config = analysis::timeline::Config::default();

    bencher.bench(|| {
        analysis::parse(divan::black_box(&data), &config, |_| std::ops::ControlFlow::Continue(()))
    });
}

#[divan::bench(args = [1_000, 10_000])]
fn random_access(bencher: divan::Bencher, ticks: u32) {
    let data = synthetic_demo(ticks);
    let demo = analysis::CachedDemo::rehydrate(
        analysis::parse(&data, &Default::default(), |_| std::ops::ControlFlow::Continue(())).unwrap(),
    );

    let mut tick = 0u32;
    bencher.bench_local(|| {
        // stride through the demo the way a scrubbing ui jumps around
        tick = (tick + 7919) % ticks;
        (
            demo.players_at_tick(divan::black_box(tick)),
            demo.projectiles_at_tick(divan::black_box(tick)),
        )
    });
}
