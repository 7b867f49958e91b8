//! Gargantua command line explorer.
//!
//! Evaluates dilation factors and runs live sessions in the terminal.

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};

use gargantua::telemetry::{init_tracing, DEFAULT_FILTER};
use gargantua::{
    evaluate_dilation, schwarzschild_radius, FallbackPolicy, GargantuaResult, RawParameters,
    RenderLoop, RotationModel, RuntimeConfig, SessionRuntime, SimulationConfig, StopOutcome,
    TextPresenter,
};

#[derive(Parser)]
#[command(author, version, about = "Gravitational time dilation explorer (Miller's planet vs. Earth)")]
struct Cli {
    /// JSON configuration file (bounds, units, fallback, tick interval)
    #[arg(long, short = 'c', global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Override the fallback used at or inside the horizon
    #[arg(long, global = true, value_enum)]
    fallback: Option<FallbackArg>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate the dilation factor for one mass/distance pair
    Factor(FactorArgs),

    /// Run a live session and print clock readouts
    Run(RunArgs),

    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct FactorArgs {
    /// Black-hole mass, in the configured mass unit
    #[arg(long)]
    mass: Option<f64>,

    /// Orbital distance, in the configured distance unit
    #[arg(long)]
    distance: Option<f64>,

    /// Skip clamping to the slider bounds
    #[arg(long)]
    unclamped: bool,
}

#[derive(Args)]
struct RunArgs {
    /// Black-hole mass, in the configured mass unit
    #[arg(long)]
    mass: Option<f64>,

    /// Orbital distance, in the configured distance unit
    #[arg(long)]
    distance: Option<f64>,

    /// Number of ticks before the session ends
    #[arg(long, default_value_t = 10)]
    ticks: u64,

    /// Override the real-time tick interval
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Readout refresh interval
    #[arg(long, default_value_t = 100)]
    frame_ms: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum FallbackArg {
    Dramatized,
    NoDilation,
}

impl From<FallbackArg> for FallbackPolicy {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::Dramatized => Self::Dramatized,
            FallbackArg::NoDilation => Self::NoDilation,
        }
    }
}

fn load_config(cli: &Cli) -> GargantuaResult<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_json_file(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(fallback) = cli.fallback {
        config.fallback = fallback.into();
    }
    Ok(config)
}

fn factor(config: &SimulationConfig, args: &FactorArgs, json: bool) -> GargantuaResult<()> {
    let raw = RawParameters {
        mass: args.mass.unwrap_or(config.mass.default),
        distance: args.distance.unwrap_or(config.distance.default),
    };
    let (mass, distance) = if args.unclamped {
        (raw.mass, raw.distance)
    } else {
        let params = gargantua::clamp_parameters(raw, config);
        (params.mass(), params.distance())
    };

    let eval = evaluate_dilation(mass, distance, config);
    let horizon = schwarzschild_radius(mass, config);

    if json {
        let out = serde_json::json!({
            "mass": mass,
            "distance": distance,
            "schwarzschild_radius": horizon,
            "dilation": eval,
        });
        println!("{out}");
    } else {
        println!(
            "mass {} {}, distance {} {} (horizon {:.3e} {})",
            gargantua::format::format_grouped(mass),
            config.mass_unit.symbol(),
            gargantua::format::format_grouped(distance),
            config.distance_unit.symbol(),
            horizon,
            config.distance_unit.symbol(),
        );
        println!(
            "factor {:.6}{}",
            eval.factor.value(),
            if eval.source.is_fallback() { " (fallback)" } else { "" }
        );
        println!("{}", gargantua::format::dilation_summary(eval.factor));
    }
    Ok(())
}

fn run(mut config: SimulationConfig, args: &RunArgs, json: bool) -> GargantuaResult<()> {
    if let Some(interval_ms) = args.interval_ms {
        config.tick_interval_ms = interval_ms;
    }
    let interval = config.tick_interval();

    let mut runtime = SessionRuntime::new(config.clone(), RuntimeConfig::default())?;
    if let Some(mass) = args.mass {
        runtime.set_mass(mass)?;
    }
    if let Some(distance) = args.distance {
        runtime.set_distance(distance)?;
    }

    if !json {
        println!("{}", TextPresenter::<std::io::Stdout>::render_summary(&runtime.snapshot()));
    }

    let presenter = TextPresenter::new(std::io::stdout(), &config).json(json);
    let render = RenderLoop::spawn(
        runtime.snapshots(),
        presenter,
        RotationModel::default(),
        Duration::from_millis(args.frame_ms.max(1)),
    );

    runtime.start();
    let poll = (interval / 4).max(Duration::from_millis(1));
    while runtime.snapshot().ticks < args.ticks {
        thread::sleep(poll);
    }
    if let StopOutcome::Recovered { ticks } = runtime.stop() {
        tracing::warn!(ticks, "tick worker failed; readouts resume from the last snapshot");
    }

    // Let the render loop pick up the final snapshot before it stops.
    thread::sleep(Duration::from_millis(args.frame_ms.max(1) * 2));
    let _ = render.stop();

    let session = runtime.into_session();
    tracing::info!(session = %session.id(), ticks = session.ticks(), "session finished");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_tracing(DEFAULT_FILTER) {
        eprintln!("warning: {err}");
    }

    let result = load_config(&cli).and_then(|config| match &cli.command {
        Command::Factor(args) => factor(&config, args, cli.json),
        Command::Run(args) => run(config, args, cli.json),
        Command::Config => config.to_json_pretty().map(|json| println!("{json}")),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
