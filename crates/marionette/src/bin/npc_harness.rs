//! # NPC Harness
//!
//! Runs the host simulation with NPCs from a settings file and shows the push
//! pipeline at work.
//!
//! Build with: `cargo build --package marionette --features harness`
//!
//! ```bash
//! # Scripted run with built-in defaults
//! npc_harness
//!
//! # Scripted run with a settings file, 100 ticks
//! npc_harness marionette.toml --ticks 100
//!
//! # Read commands from stdin until `quit`
//! npc_harness marionette.toml --interactive
//! ```
//!
//! Interactive commands: `push <npc> <x> <y> <z>`, `strike <npc>`,
//! `where <npc>`, `protect <npc> <on|off>`, `quit`. `<npc>` is the index in
//! the spawn list.

use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use marionette::core::{EntityId, Location, Simulation, TickLoop, Vec3};
use marionette::{
    keys, BasicNpc, ControllerRegistry, EntityController, EntityFacade, EventPipeline,
    MarionetteError, MarionetteResult, MetadataStore, Npc, NpcHandle, NpcId, NpcSpec, PushEvent,
    Settings,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Pending console commands between the stdin thread and the tick thread.
const COMMAND_QUEUE: usize = 64;

/// Options from the command line.
struct Options {
    config: Option<String>,
    ticks: u64,
    interactive: bool,
}

impl Options {
    fn parse() -> Result<Self, String> {
        let mut options = Self {
            config: None,
            ticks: 40,
            interactive: false,
        };
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--interactive" | "-i" => options.interactive = true,
                "--ticks" => {
                    let value = args.next().ok_or("--ticks needs a value")?;
                    options.ticks = value
                        .parse()
                        .map_err(|_| format!("invalid tick count: {value}"))?;
                }
                other if other.starts_with('-') => return Err(format!("unknown flag: {other}")),
                path => options.config = Some(path.to_owned()),
            }
        }
        Ok(options)
    }
}

/// A console command.
#[derive(Debug)]
enum Command {
    Push(usize, Vec3),
    Strike(usize),
    Where(usize),
    Protect(usize, bool),
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["push", npc, x, y, z] => Some(Self::Push(
                npc.parse().ok()?,
                Vec3::new(x.parse().ok()?, y.parse().ok()?, z.parse().ok()?),
            )),
            ["strike", npc] => Some(Self::Strike(npc.parse().ok()?)),
            ["where", npc] => Some(Self::Where(npc.parse().ok()?)),
            ["protect", npc, flag] => Some(Self::Protect(npc.parse().ok()?, *flag == "on")),
            ["quit"] | ["exit"] => Some(Self::Quit),
            _ => None,
        }
    }
}

/// One spawned NPC.
struct Spawned {
    npc: Rc<RefCell<BasicNpc>>,
    controller: Box<dyn EntityController>,
}

impl Spawned {
    fn entity(&self) -> Option<EntityId> {
        self.controller.entity()
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn default_npcs() -> Vec<NpcSpec> {
    let mut data = MetadataStore::new();
    data.set(keys::DEFAULT_PROTECTED, true);
    vec![
        NpcSpec {
            name: "&aWilbur".to_owned(),
            entity_type: "pig".to_owned(),
            at: Location::new(0.0, 64.0, 0.0),
            data,
        },
        NpcSpec {
            name: "&bGuide".to_owned(),
            entity_type: "player".to_owned(),
            at: Location::new(4.0, 64.0, 0.0),
            data: MetadataStore::new(),
        },
    ]
}

fn spawn_all(
    sim: &mut Simulation,
    registry: &ControllerRegistry,
    specs: &[NpcSpec],
) -> MarionetteResult<Vec<Spawned>> {
    let mut spawned = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        let id = NpcId(u32::try_from(index).unwrap_or(u32::MAX));
        let npc = BasicNpc::new(id, spec.name.clone())
            .with_store(spec.data.clone())
            .into_shared();
        let handle: NpcHandle = npc.clone();
        let mut controller = registry.create_by_name(&spec.entity_type)?;
        let facade = controller.spawn(sim, spec.at, handle)?;
        tracing::info!(npc = %id, entity = %facade.entity(), kind = %facade.kind(), "npc ready");
        spawned.push(Spawned { npc, controller });
    }
    Ok(spawned)
}

fn motion_of(sim: &Simulation, spawned: &Spawned) -> Vec3 {
    spawned
        .entity()
        .and_then(|id| sim.world().motion(id))
        .unwrap_or(Vec3::ZERO)
}

/// Pushes the first NPC with and without a listener that lifts protection.
fn push_scenario(
    sim: &mut Simulation,
    pipeline: &EventPipeline,
    spawned: &[Spawned],
) -> MarionetteResult<()> {
    let Some(first) = spawned.first() else {
        return Ok(());
    };
    let Some(entity) = first.entity() else {
        return Err(MarionetteError::NotSpawned);
    };
    let push = Vec3::new(5.0, 0.0, 0.0);

    let before = motion_of(sim, first);
    sim.push(entity, push)?;
    let after = motion_of(sim, first);
    tracing::info!(delta = ?(after - before), "push with no listeners");

    let listener = pipeline.register_listener(|event: &mut PushEvent| {
        event.set_cancelled(false);
        Ok(())
    });
    let before = motion_of(sim, first);
    sim.push(entity, push)?;
    let after = motion_of(sim, first);
    tracing::info!(delta = ?(after - before), "push with an allowing listener");
    pipeline.unregister_listener::<PushEvent>(listener);

    Ok(())
}

fn spawn_console() -> Receiver<Command> {
    let (sender, receiver) = bounded(COMMAND_QUEUE);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => {
                    let _ = sender.send(Command::Quit);
                    return;
                }
                Ok(_) => match Command::parse(line.trim()) {
                    Some(command) => {
                        if sender.send(command).is_err() {
                            return;
                        }
                    }
                    None => eprintln!("unknown command: {}", line.trim()),
                },
            }
        }
    });
    receiver
}

/// Applies one console command. Returns `false` on quit.
fn apply(sim: &mut Simulation, spawned: &[Spawned], command: Command) -> MarionetteResult<bool> {
    let target = |index: usize| spawned.get(index).and_then(Spawned::entity);
    match command {
        Command::Quit => return Ok(false),
        Command::Push(index, vector) => match target(index) {
            Some(entity) => sim.push(entity, vector)?,
            None => tracing::warn!(index, "no such npc"),
        },
        Command::Strike(index) => match target(index) {
            Some(entity) => sim.strike_lightning(entity)?,
            None => tracing::warn!(index, "no such npc"),
        },
        Command::Where(index) => match target(index).and_then(|id| sim.world().location(id)) {
            Some(at) => tracing::info!(index, x = at.x, y = at.y, z = at.z, "npc location"),
            None => tracing::warn!(index, "no such npc"),
        },
        Command::Protect(index, on) => match spawned.get(index) {
            Some(entry) => {
                entry.npc.borrow_mut().data_mut().set(keys::DEFAULT_PROTECTED, on);
                tracing::info!(index, protected = on, "updated protection");
            }
            None => tracing::warn!(index, "no such npc"),
        },
    }
    Ok(true)
}

fn run(options: &Options, settings: &Settings) -> MarionetteResult<()> {
    let pipeline = Rc::new(EventPipeline::new());
    let registry = ControllerRegistry::new(settings, Rc::clone(&pipeline))?;
    let mut sim = Simulation::new(settings.world_capacity.max(1), &settings.random);

    let specs = if settings.npcs.is_empty() {
        default_npcs()
    } else {
        settings.npcs.clone()
    };
    let spawned = spawn_all(&mut sim, &registry, &specs)?;
    push_scenario(&mut sim, &pipeline, &spawned)?;

    let console = options.interactive.then(spawn_console);
    let mut pacer = TickLoop::new(settings.tick_rate);

    'outer: loop {
        while pacer.should_tick() {
            if let Some(console) = &console {
                loop {
                    match console.try_recv() {
                        Ok(command) => {
                            if !apply(&mut sim, &spawned, command)? {
                                break 'outer;
                            }
                        }
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => break 'outer,
                    }
                }
            }

            let started = pacer.begin_tick();
            sim.step()?;
            pacer.end_tick(started);

            if console.is_none() && pacer.tick_count() >= options.ticks {
                break 'outer;
            }
        }
        pacer.wait_for_next_tick();
    }

    for entry in &spawned {
        let npc = entry.npc.borrow();
        let at = entry.entity().and_then(|id| sim.world().location(id));
        tracing::info!(npc = %npc.id(), updates = npc.updates(), location = ?at, "final state");
    }
    let stats = pacer.stats();
    tracing::info!(
        ticks = sim.current_tick(),
        avg_step_us = stats.avg_step_us,
        overruns = stats.overruns,
        "harness finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    let options = match Options::parse() {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let settings = match options.config.as_deref().map(Settings::load) {
        Some(Ok(settings)) => settings,
        Some(Err(err)) => {
            eprintln!("failed to load settings: {err}");
            return ExitCode::FAILURE;
        }
        None => Settings::default(),
    };

    init_tracing(&settings.log_level);

    match run(&options, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "harness failed");
            ExitCode::FAILURE
        }
    }
}
