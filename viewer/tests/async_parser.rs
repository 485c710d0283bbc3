use std::sync::{Arc, Mutex};

use analysis::demofile::DemoWriter;
use analysis::{BuildError, DecodeError, DemoEvent};
use common::demo_analysis::Header;
use common::entities::PlayerSnapshot;
use common::{Class, EntityId, LifeState, PlayerRef, Team, Tick, UserId, Vector};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;
use viewer::{AsyncParser, ParseError};

fn player(entity: u32, team: Team, x: f32) -> DemoEvent {
    DemoEvent::PlayerUpdate {
        entity: EntityId(entity),
        snapshot: PlayerSnapshot {
            position: Vector::new(x, 0.0, 0.0),
            health: 125,
            class: Class::Scout,
            team,
            state: LifeState::Alive,
            ..Default::default()
        },
    }
}

fn user(user_id: u32, entity: u32, name: &str) -> DemoEvent {
    DemoEvent::UserInfo(PlayerRef {
        user_id: UserId(user_id),
        entity_id: EntityId(entity),
        name: name.to_owned(),
        steam_id: String::new(),
    })
}

fn demo(teams: [Team; 2]) -> Vec<u8> {
    let events: Vec<(Tick, DemoEvent)> = vec![
        (
            0,
            DemoEvent::Header(Header {
                map: "ultiduo_baloo".to_owned(),
                ticks: 1000,
                ..Default::default()
            }),
        ),
        (0, user(1, 2, "alpha")),
        (0, user(2, 3, "bravo")),
        (5, player(2, teams[0], 0.0)),
        (5, player(3, teams[1], 100.0)),
        (400, player(2, teams[0], 40.0)),
        (
            500,
            DemoEvent::Death {
                victim: UserId(2),
                assister: None,
                killer: Some(UserId(1)),
                weapon: "scattergun".to_owned(),
            },
        ),
    ];

    let mut writer = DemoWriter::new();
    for (tick, event) in events.iter() {
        writer.event(*tick, event).unwrap();
    }
    writer.finish()
}

fn long_demo(updates: u32) -> Vec<u8> {
    let mut writer = DemoWriter::new();
    writer
        .event(
            0,
            &DemoEvent::Header(Header {
                map: "koth_product_final".to_owned(),
                ticks: updates + 1,
                ..Default::default()
            }),
        )
        .unwrap();
    writer.event(0, &user(1, 2, "alpha")).unwrap();
    for tick in 1..=updates {
        writer.event(tick, &player(2, Team::Red, tick as f32)).unwrap();
    }
    writer.finish()
}

fn recording_parser(buf: Vec<u8>) -> (AsyncParser, Arc<Mutex<Vec<f32>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let parser = AsyncParser::new(buf, move |p| sink.lock().unwrap().push(p))
        .with_config(analysis::timeline::Config { progress_step: 0.0 });
    (parser, seen)
}

#[tokio::test]
async fn cache_and_query() {
    let (mut parser, seen) = recording_parser(demo([Team::Red, Team::Blue]));

    assert!(!parser.is_cached());
    parser.cache().await.unwrap();
    assert!(parser.is_cached());

    let players = parser.get_players_at_tick(450).unwrap();
    assert_eq!(players.len(), 2);
    assert_eq!(players[0].user.name, "alpha");
    assert_eq!(players[0].position, Vector::new(40.0, 0.0, 0.0));
    assert_eq!(players[0].tick, 400);
    assert_eq!(players[1].team, Team::Blue);

    let deaths = parser.get_deaths_at_tick(500).unwrap();
    assert_eq!(deaths.len(), 1);
    assert_eq!(deaths[0].victim.name, "bravo");
    assert_eq!(deaths[0].weapon, "scattergun");

    assert!(parser.get_building_at_tick(450).unwrap().is_empty());
    assert!(parser.get_projectiles_at_tick(450).unwrap().is_empty());
    // past the end of the demo
    assert!(parser.get_players_at_tick(5000).unwrap().is_empty());

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|p| (0.0..=1.0).contains(p)));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{:?}", seen);
}

#[tokio::test]
async fn queries_before_cache() {
    let (parser, seen) = recording_parser(demo([Team::Red, Team::Blue]));

    assert!(matches!(parser.get_players_at_tick(0), Err(ParseError::NotCached)));
    assert!(matches!(parser.get_building_at_tick(0), Err(ParseError::NotCached)));
    assert!(matches!(parser.get_projectiles_at_tick(0), Err(ParseError::NotCached)));
    assert!(matches!(parser.get_deaths_at_tick(0), Err(ParseError::NotCached)));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cache_twice() {
    let (mut parser, _) = recording_parser(demo([Team::Red, Team::Blue]));

    parser.cache().await.unwrap();
    assert!(matches!(parser.cache().await, Err(ParseError::AlreadyStarted)));
    // the first result is kept
    assert_eq!(parser.get_players_at_tick(10).unwrap().len(), 2);
}

#[tokio::test]
#[traced_test]
async fn truncated_demo() {
    let buf = demo([Team::Red, Team::Blue]);
    let (mut parser, _) = recording_parser(buf[..10].to_vec());

    let err = parser.cache().await.unwrap_err();
    assert!(
        matches!(
            err,
            ParseError::Build(BuildError::Decode(DecodeError::Truncated { .. }))
        ),
        "{:?}",
        err
    );

    assert!(logs_contain("Parsing demo"));
    assert!(!parser.is_cached());
    assert!(matches!(parser.get_players_at_tick(0), Err(ParseError::NotCached)));
    assert!(matches!(parser.cache().await, Err(ParseError::AlreadyStarted)));
}

#[tokio::test]
async fn unsupported_version() {
    let mut buf = demo([Team::Red, Team::Blue]);
    buf[8..12].copy_from_slice(&7u32.to_le_bytes());
    let (mut parser, _) = recording_parser(buf);

    match parser.cache().await {
        Err(ParseError::Build(BuildError::Decode(e))) => assert!(e.is_unsupported()),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn head_to_head_teams() {
    let (mut parser, _) = recording_parser(demo([Team::Unassigned, Team::Unassigned]));
    parser.cache().await.unwrap();

    let teams: Vec<Team> = parser
        .get_players_at_tick(450)
        .unwrap()
        .iter()
        .map(|p| p.team)
        .collect();
    assert_eq!(teams, vec![Team::Red, Team::Blue]);
}

#[tokio::test]
async fn detached_progress() {
    let (mut parser, seen) = recording_parser(demo([Team::Red, Team::Blue]));

    parser.detach_progress();
    parser.cache().await.unwrap();

    assert!(seen.lock().unwrap().is_empty());
    assert!(parser.is_cached());
}

#[tokio::test]
async fn detach_while_running() {
    let (mut parser, seen) = recording_parser(long_demo(20_000));
    let handle = parser.progress_handle();

    let (result, reported) = tokio::join!(parser.cache(), async {
        while seen.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        handle.detach();
        seen.lock().unwrap().len()
    });

    result.unwrap();
    assert!(!handle.is_attached());
    assert_eq!(seen.lock().unwrap().len(), reported);
    assert!(parser.is_cached());
}

#[tokio::test]
async fn dropped_cache_cancels() {
    let (mut parser, seen) = recording_parser(long_demo(50_000));

    {
        let cache = parser.cache();
        tokio::pin!(cache);
        while seen.lock().unwrap().is_empty() {
            tokio::select! {
                biased;
                result = &mut cache => panic!("parse finished early: {:?}", result),
                _ = tokio::task::yield_now() => {}
            }
        }
    }

    assert!(parser.is_cancelled());
    assert!(!parser.is_cached());
    assert!(matches!(parser.get_players_at_tick(1), Err(ParseError::NotCached)));
    assert!(matches!(parser.cache().await, Err(ParseError::AlreadyStarted)));
}

#[test]
#[traced_test]
fn abandoned_worker_stops() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async {
        let mut rx = viewer::worker::spawn(
            long_demo(50_000).into(),
            analysis::timeline::Config { progress_step: 0.0 },
        );
        let first = rx.recv().await.unwrap();
        assert!(!first.is_terminal());
        drop(rx);
    });
    // waits for the blocking worker to return
    drop(runtime);

    assert!(logs_contain("Parse abandoned"));
    assert!(!logs_contain("Built timeline"));
}

#[tokio::test]
async fn into_demo() {
    let (mut parser, _) = recording_parser(demo([Team::Red, Team::Blue]));
    parser.cache().await.unwrap();

    let demo = parser.into_demo().unwrap();
    assert_eq!(demo.header().map, "ultiduo_baloo");
    assert_eq!(demo.ticks(), 1000);
    assert_eq!(demo.death_count(), 1);
}

#[test]
fn worker_messages() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let messages = runtime.block_on(async {
        let mut rx = viewer::worker::spawn(
            demo([Team::Red, Team::Blue]).into(),
            analysis::timeline::Config { progress_step: 0.0 },
        );
        let mut messages = Vec::new();
        while let Some(message) = rx.recv().await {
            messages.push(message);
        }
        messages
    });

    let (last, rest) = messages.split_last().unwrap();
    assert!(matches!(last, viewer::worker::WorkerMessage::Done(_)));
    assert!(rest.iter().all(|m| !m.is_terminal()));
}
