//! Headless demo: runs a level with a scripted player and logs what happens
//!
//! Usage: `castle [LEVEL_PACK.ron|.json] [LEVEL_INDEX]`

use std::path::Path;

use castle::prelude::*;

/// Ticks to simulate
const DEMO_TICKS: u32 = 600;
/// Fixed frame delta
const FRAME_DELTA: f32 = 1.0 / 30.0;
/// Turn rate of the scripted player in radians per second
const TURN_RATE: f32 = 0.6;
/// Fire every this many ticks
const FIRE_INTERVAL: u32 = 20;

const DEMO_LEVEL: &[&str] = &[
    "################",
    "#P.....#.......#",
    "#......|...g...#",
    "#......#.......#",
    "###-#######G####",
    "#.....d........#",
    "#..........o...#",
    "################",
];

/// Scripted player turning in place and firing periodically
struct DemoPlayer {
    ticks: u32,
}

impl DemoPlayer {
    fn new() -> Self {
        Self { ticks: 0 }
    }

    fn intent(&mut self, player: &Player) -> PlayerIntent {
        self.ticks += 1;
        let mut intent = PlayerIntent::hold(player);
        intent.angle = player.angle + TURN_RATE * FRAME_DELTA;
        intent
            .with_fire(self.ticks % FIRE_INTERVAL == 0)
            .with_interact(self.ticks % (FIRE_INTERVAL * 3) == 0)
    }
}

fn load_simulation(args: &[String]) -> Result<LevelSimulation, LevelError> {
    let config = SimConfig::default();
    let Some(path) = args.first() else {
        let level = LevelDescriptor::from_rows("demo", DEMO_LEVEL)?;
        return LevelSimulation::new(&level, config);
    };

    let index = match args.get(1) {
        Some(raw) => raw
            .parse()
            .map_err(|_| LevelError::Parse(format!("bad level index '{raw}'")))?,
        None => 0,
    };
    let pack = if Path::new(path).extension().is_some_and(|ext| ext == "json") {
        LevelPack::load_json(path)?
    } else {
        LevelPack::load_ron(path)?
    };
    LevelSimulation::from_pack(&pack, index, config)
}

fn log_event(event: &SimEvent) {
    match event {
        SimEvent::PlaySound { cue, position } => log::debug!("sound {} at {position}", cue.key()),
        SimEvent::PlayerDamaged { amount, attacker } => {
            log::info!("player took {amount} damage from enemy #{attacker}");
        }
        SimEvent::EnemyKilled { enemy, kind } => log::info!("{} #{enemy} killed", kind.name()),
        other => log::info!("{other:?}"),
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut sim = match load_simulation(&args) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("Failed to load level: {}", e);
            std::process::exit(1);
        }
    };

    let mut script = DemoPlayer::new();
    for _ in 0..DEMO_TICKS {
        let intent = script.intent(sim.player());
        sim.apply_intent(intent);
        sim.tick(FRAME_DELTA);
        sim.events().iter().for_each(log_event);

        if !sim.player().is_alive() {
            log::info!("player died after {:.1}s", sim.elapsed());
            break;
        }
    }

    let alive = sim.enemies().iter().filter(|e| e.is_alive()).count();
    log::info!(
        "finished: {} ticks, {alive}/{} enemies alive, player health {} score {}",
        sim.tick_count(),
        sim.enemies().len(),
        sim.player().health,
        sim.player().score
    );
    log::info!("{}", sim.stats().format_stats());
}
