use std::time::Instant;

use boxgen::{DescriptorError, Direction, GameSession, Generator, Level, LevelDescriptor, LevelSet};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boxgen")]
#[command(about = "A box-pushing puzzle generator", long_about = None)]
struct Args {
    /// Number of levels to generate
    #[arg(short = 'n', long, default_value = "1")]
    levels: usize,

    /// Seed for reproducible output (drawn from the OS if omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Grid height, overriding the level ramp
    #[arg(long)]
    height: Option<usize>,

    /// Grid width, overriding the level ramp
    #[arg(long)]
    width: Option<usize>,

    /// Number of boxes, overriding the level ramp
    #[arg(short, long)]
    boxes: Option<usize>,

    /// Number of wall segments, overriding the level ramp
    #[arg(short, long)]
    walls: Option<usize>,

    /// Successful drag steps per box, overriding the level ramp
    #[arg(short, long)]
    difficulty: Option<usize>,

    /// Give up on a level after this many rejected attempts
    #[arg(long)]
    max_attempts: Option<usize>,

    /// Write the generated levels to this file (XSB format)
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Replay a LURD move string on the first generated level
    #[arg(short, long)]
    moves: Option<String>,
}

/// The `index`-th ramp level with any command-line overrides applied.
fn descriptor(args: &Args, index: usize) -> Result<LevelDescriptor, DescriptorError> {
    let ramp = LevelDescriptor::progression(index)?;
    LevelDescriptor::new(
        args.height.unwrap_or(ramp.height()),
        args.width.unwrap_or(ramp.width()),
        args.boxes.unwrap_or(ramp.boxes()),
        args.walls.unwrap_or(ramp.walls()),
        args.difficulty.unwrap_or(ramp.difficulty()),
        index,
    )
}

fn replay(mut session: GameSession, moves: &str) {
    println!("\nStarting position:\n{}", session.grid());
    for (count, ch) in moves.chars().enumerate() {
        let Some(dir) = Direction::from_lurd(ch) else {
            eprintln!("Error: invalid move '{}' at position {}", ch, count + 1);
            std::process::exit(1);
        };
        let outcome = session.apply_move(dir);
        if !outcome.moved {
            println!("Move {} ({}) blocked", count + 1, dir);
        }
    }
    println!(
        "After {} moves ({} applied):\n{}",
        moves.len(),
        session.moves(),
        session.grid()
    );
    println!("complete: {}", if session.is_complete() { 'Y' } else { 'N' });
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("boxgen=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.levels == 0 {
        eprintln!("Error: number of levels must be at least 1");
        std::process::exit(1);
    }
    if args.max_attempts == Some(0) {
        eprintln!("Error: max attempts must be at least 1");
        std::process::exit(1);
    }

    let (mut generator, seed) = match args.seed {
        Some(seed) => (Generator::seeded(seed), seed),
        None => Generator::from_entropy(),
    };
    println!("seed: {}", seed);

    let mut set = LevelSet::new();
    let mut total_attempts = 0;
    let mut total_time_ms = 0;

    for index in 0..args.levels {
        let desc = match descriptor(&args, index) {
            Ok(desc) => desc,
            Err(e) => {
                eprintln!("Error: level {}: {}", index + 1, e);
                std::process::exit(1);
            }
        };

        let start = Instant::now();
        let level: Level = match args.max_attempts {
            Some(max_attempts) => match generator.generate_bounded(&desc, max_attempts) {
                Ok(level) => level,
                Err(rejection) => {
                    eprintln!(
                        "Error: level {} not generated after {} attempts: {}",
                        index + 1,
                        max_attempts,
                        rejection
                    );
                    std::process::exit(1);
                }
            },
            None => generator.generate(&desc),
        };
        let elapsed_ms = start.elapsed().as_millis();

        let fresh = set.push_level(&level);
        println!(
            "level: {:<3}  size: {:>2}x{:<2}  boxes: {:<3}  walls: {:<3}  difficulty: {:<4}  attempts: {:<6}  elapsed: {} ms{}",
            index + 1,
            desc.height(),
            desc.width(),
            desc.boxes(),
            desc.walls(),
            desc.difficulty(),
            level.attempts,
            elapsed_ms,
            if fresh { "" } else { "  (duplicate)" }
        );
        println!("{}", level.grid);

        total_attempts += level.attempts;
        total_time_ms += elapsed_ms;
    }

    if args.levels > 1 {
        println!("---");
        println!(
            "levels: {:>3}/{:<3}  attempts: {:<6}  elapsed: {} ms",
            set.len(),
            args.levels,
            total_attempts,
            total_time_ms
        );
    }

    if let Some(path) = &args.output {
        if let Err(e) = set.write_file(path) {
            eprintln!("Error writing levels: {}", e);
            std::process::exit(1);
        }
        println!("wrote {} levels to {}", set.len(), path);
    }

    if let Some(moves) = &args.moves {
        match set.session(0) {
            Some(session) => replay(session, moves),
            None => {
                eprintln!("Error: no level to replay moves on");
                std::process::exit(1);
            }
        }
    }
}
