use anyhow::Context;
use clap::Parser;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;

#[derive(Debug, clap::Parser)]
#[command(version, about = "Builds and inspects demo timelines")]
struct Cli {
    /// Maximum level of log output
    #[arg(long, env = "VIEWER_LOG", default_value = "info", global = true)]
    log: tracing::Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Parse a demo and print a summary
    Parse {
        demo: std::path::PathBuf,
        /// Print the state of every entity at this tick
        #[arg(long)]
        tick: Option<u32>,
        #[arg(long)]
        json: bool,
        /// Minimum progress increase between two progress reports
        #[arg(long, default_value_t = 0.05)]
        progress_step: f32,
    },
    /// Parse a demo and store the resulting cache
    Export {
        demo: std::path::PathBuf,
        #[arg(long, short)]
        out: std::path::PathBuf,
    },
    /// Load a stored cache without decoding the demo again
    Inspect {
        cache: std::path::PathBuf,
        #[arg(long)]
        tick: Option<u32>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, serde::Serialize)]
struct TickState<'d> {
    tick: u32,
    seconds: f32,
    players: Vec<common::entities::CachedPlayer>,
    buildings: Vec<common::entities::CachedBuilding>,
    projectiles: Vec<common::entities::CachedProjectile>,
    deaths: &'d [common::demo_analysis::CachedDeath],
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = cli.log;
    let registry = tracing_subscriber::Registry::default()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::filter::filter_fn(move |meta| {
            let target = meta.target();
            (target.contains("viewer") || target.contains("analysis")) && *meta.level() <= level
        }));
    tracing::subscriber::set_global_default(registry)?;

    match cli.command {
        Command::Parse {
            demo,
            tick,
            json,
            progress_step,
        } => {
            let config = analysis::timeline::Config { progress_step };
            let demo = load(&demo, config).await?;

            print_summary(&demo);
            if let Some(tick) = tick {
                print_tick(&demo, tick, json)?;
            }
        }
        Command::Export { demo, out } => {
            let demo = load(&demo, Default::default()).await?;

            let bytes = demo.dehydrate().to_bytes().context("Encoding cache")?;
            std::fs::write(&out, &bytes).with_context(|| format!("Writing {}", out.display()))?;

            tracing::info!(path = %out.display(), bytes = bytes.len(), "Stored cache");
        }
        Command::Inspect { cache, tick, json } => {
            let bytes =
                std::fs::read(&cache).with_context(|| format!("Reading {}", cache.display()))?;
            let data = analysis::CachedDemoData::from_bytes(&bytes).context("Decoding cache")?;
            let demo = analysis::CachedDemo::rehydrate(data);

            print_summary(&demo);
            if let Some(tick) = tick {
                print_tick(&demo, tick, json)?;
            }
        }
    };

    Ok(())
}

async fn load(
    path: &std::path::Path,
    config: analysis::timeline::Config,
) -> anyhow::Result<analysis::CachedDemo> {
    let buffer = viewer::DemoBuffer::open(path)
        .with_context(|| format!("Opening {}", path.display()))?;

    let mut parser = viewer::AsyncParser::new(buffer, |progress| {
        tracing::info!("Parsing... {:.0}%", progress * 100.0);
    })
    .with_config(config);

    parser.cache().await?;
    Ok(parser.into_demo()?)
}

fn print_summary(demo: &analysis::CachedDemo) {
    let header = demo.header();
    println!("Map:      {}", header.map);
    println!("Server:   {}", header.server);
    println!(
        "Length:   {} ticks ({:.1}s)",
        demo.ticks(),
        demo.tick_to_seconds(demo.ticks())
    );
    println!("Players:  {}", demo.next_mapped_player());
    println!("Deaths:   {}", demo.death_count());
    for (idx, round) in demo.rounds().iter().enumerate() {
        println!(
            "Round {}: {} - {} won by {} ({:.1}s)",
            idx + 1,
            round.start_tick,
            round.end_tick,
            round.winner,
            round.length
        );
    }
}

fn print_tick(demo: &analysis::CachedDemo, tick: u32, json: bool) -> anyhow::Result<()> {
    let state = TickState {
        tick,
        seconds: demo.tick_to_seconds(tick),
        players: demo.players_at_tick(tick),
        buildings: demo.buildings_at_tick(tick),
        projectiles: demo.projectiles_at_tick(tick),
        deaths: demo.deaths_at_tick(tick),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    println!("Tick {} ({:.2}s)", state.tick, state.seconds);
    for player in state.players.iter() {
        println!(
            "  [{}] {:<24} {:>5} {:?} {:>3}hp ({:.0}%) {:?} at ({:.0}, {:.0}, {:.0})",
            player.slot,
            player.user.name,
            player.team,
            player.class,
            player.health,
            player.health_percentage(),
            player.state,
            player.position.x,
            player.position.y,
            player.position.z
        );
    }
    for building in state.buildings.iter() {
        println!(
            "  {:?} lvl {} {} {}/{}hp",
            building.kind, building.level, building.team, building.health, building.max_health
        );
    }
    println!("  {} projectiles", state.projectiles.len());
    for death in state.deaths.iter() {
        let killer = death.killer.as_ref().map(|k| k.name.as_str()).unwrap_or("world");
        println!("  {} killed {} with {}", killer, death.victim.name, death.weapon);
    }

    Ok(())
}
