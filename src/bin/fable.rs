use clap::{command, Parser, Subcommand};
use fable::{
    animation::SceneGraph,
    builder::{IdGenerator, SequentialIdGenerator, UuidIdGenerator},
    parse_with, validate, Error, EventType, FableConfig, Session,
};
use serde_json::json;
use std::{fs, path::PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, default_value = "fable.json", global = true)]
    config: PathBuf,

    /// Enable debug mode
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a story and print its AST as JSON
    Parse(ParseArgs),

    /// Check a story for errors
    Validate {
        /// Path to the story file
        file: PathBuf,
    },

    /// Load a story, replay clicks and print the resulting state
    Run(RunArgs),
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to the story file
    file: PathBuf,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Number generated agent ids (text_1, button_2, ...) instead of uuids
    #[arg(long)]
    sequential_ids: bool,
}

#[derive(Parser)]
struct RunArgs {
    /// Path to the story file
    file: PathBuf,

    /// Agent id to click, in order; may be repeated
    #[arg(long = "click")]
    clicks: Vec<String>,

    /// Milliseconds of animation time to advance on load and after each click
    #[arg(long, default_value_t = 0.0)]
    tick_ms: f64,

    /// Run the statements of the first page on load
    #[arg(long)]
    enter: bool,
}

fn read_source(path: &PathBuf) -> Result<String, Error> {
    debug!("Reading story file: {:?}", path);
    fs::read_to_string(path)
        .map_err(|e| Error::internal(format!("Failed to read {}: {}", path.display(), e)))
}

fn run_parse(args: &ParseArgs) -> Result<(), Error> {
    let source = read_source(&args.file)?;
    let mut ids: Box<dyn IdGenerator> = if args.sequential_ids {
        Box::new(SequentialIdGenerator::default())
    } else {
        Box::new(UuidIdGenerator)
    };
    let story = parse_with(&source, ids.as_mut())?;
    let output = if args.pretty {
        serde_json::to_string_pretty(&story)?
    } else {
        serde_json::to_string(&story)?
    };
    println!("{}", output);
    Ok(())
}

/// Returns whether the story is valid.
fn run_validate(file: &PathBuf) -> Result<bool, Error> {
    let source = read_source(file)?;
    let validation = validate(&source);
    println!("{}", serde_json::to_string(&validation)?);
    Ok(validation.valid)
}

/// Advances the clock once for whatever started on load, then once after
/// each click.
fn replay(session: &mut Session<SceneGraph>, clicks: &[String], tick_ms: f64) {
    session.tick(tick_ms);
    for id in clicks {
        if !session.dispatch_event_by_id(EventType::OnClick, id) {
            info!("No on_click handler for '{}' on the current page", id);
        }
        session.tick(tick_ms);
    }
}

fn run_story(args: &RunArgs, config_path: &PathBuf) -> Result<(), Error> {
    let config = if config_path.exists() {
        FableConfig::from_file(config_path)?
    } else {
        FableConfig::default()
    };
    info!("Config loaded.");
    debug!("config: {:?}", config);

    let source = read_source(&args.file)?;
    let story = parse_with(&source, &mut SequentialIdGenerator::default())?;
    let nodes = SceneGraph::from_story(&story);
    let mut session = Session::new(config, nodes);
    session.subscribe(|event| {
        if let Ok(line) = serde_json::to_string(event) {
            eprintln!("{}", line);
        }
    });
    session.open(story);
    if args.enter {
        session.enter_page();
    }

    replay(&mut session, &args.clicks, args.tick_ms);

    let output = json!({
        "state": session.snapshot(),
        "nodes": session.nodes(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match &cli.command {
        Commands::Parse(args) => run_parse(args),
        Commands::Validate { file } => match run_validate(file) {
            Ok(true) => Ok(()),
            Ok(false) => std::process::exit(2),
            Err(e) => Err(e),
        },
        Commands::Run(args) => run_story(args, &cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
