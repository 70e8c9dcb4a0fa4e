//! Command-line front end for the simulator.
//!
//! The single-threaded cooperative core (`Kernel::tick`) never suspends;
//! the only concurrency here is an auxiliary thread that forwards stdin
//! lines into a channel so the main loop can interleave reading commands
//! with driving ticks on a wall-clock period, without blocking either.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use sokernel::Kernel;

#[derive(Parser, Debug)]
#[command(name = "sokernel")]
#[command(about = "Educational multiprogramming simulator")]
struct Args {
    /// Path to the swap file backing the simulated virtual memory.
    #[arg(long, default_value = "SWAP.bin")]
    swap_path: PathBuf,

    /// Milliseconds between scheduler ticks.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,

    /// Ticks a process may hold Running before a requeue (§4.4 QUANTUM).
    #[arg(long, default_value_t = sokernel::sched::QUANTUM)]
    quantum: i64,

    /// Baseline priority every new process starts at (§3 PBASE).
    #[arg(long, default_value_t = sokernel::sched::PBASE)]
    priority_base: i64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut kernel = Kernel::with_config(&args.swap_path, args.quantum, args.priority_base)
        .with_context(|| format!("could not open swap file {}", args.swap_path.display()))?;

    let commands = spawn_stdin_reader();
    let tick_period = Duration::from_millis(args.tick_ms);
    let mut next_tick = Instant::now() + tick_period;

    println!("sokernel ready. Commands: LOAD <path> <uid> | KILL <pid> | EXIT");
    'outer: loop {
        while let Ok(line) = commands.try_recv() {
            for event in kernel.handle_command(&line) {
                println!("{event}");
                if matches!(event, sokernel::Event::Exiting) {
                    break 'outer;
                }
            }
        }

        let now = Instant::now();
        if now >= next_tick {
            for event in kernel.tick() {
                println!("{event}");
            }
            next_tick = now + tick_period;
        }

        thread::sleep(Duration::from_millis(1));
    }

    Ok(())
}

/// Forward stdin lines to the main loop over a channel. This thread never
/// touches `Kernel` state; it exists only so a blocking `read_line` doesn't
/// stall the tick loop.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) => break, // EOF
                Ok(_) => {
                    if tx.send(line.trim_end().to_string()).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
    rx
}
