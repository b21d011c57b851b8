//! u-anneal CLI.
//!
//! Solve a Sudoku puzzle by simulated annealing, or run bit-flip descent
//! on a benchmark function.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use u_anneal::benchmark::BenchmarkFunction;
use u_anneal::descent::{BinaryProblem, DescentConfig, DescentRunner, DescentStrategy};
use u_anneal::sa::CoolingSchedule;
use u_anneal::sudoku::{SudokuConfig, SudokuSolver};

#[derive(Parser)]
#[command(name = "u-anneal")]
#[command(about = "Simulated annealing for Sudoku and bit-flip descent on benchmark functions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output (per-level progress)
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a Sudoku puzzle file (one row per line, 0 for blanks).
    Sudoku {
        /// Puzzle file
        file: PathBuf,
        /// TOML configuration; command-line flags override it
        #[arg(long)]
        config: Option<PathBuf>,
        /// Fixed initial temperature (sampled from a random candidate if unset)
        #[arg(long)]
        initial_temperature: Option<f64>,
        /// Sampled initial temperature as a fraction of the sample's conflicts
        #[arg(long)]
        temperature_ratio: Option<f64>,
        /// Temperature floor
        #[arg(long)]
        min_temperature: Option<f64>,
        /// Cooling schedule: geometric (g) or slow (s)
        #[arg(short, long)]
        schedule: Option<CoolingSchedule>,
        /// Cooling parameter of the schedule
        #[arg(long)]
        alpha: Option<f64>,
        /// Initial trials per level, as a multiple of the grid size
        #[arg(long)]
        trials_factor: Option<f64>,
        /// Growth factor of the trial count per level
        #[arg(long)]
        trial_growth: Option<f64>,
        /// Iteration budget (0 for unlimited)
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Random seed; run `i` of a batch uses `seed + i`
        #[arg(long)]
        seed: Option<u64>,
        /// Number of independent runs
        #[arg(short, long, default_value = "1")]
        runs: usize,
    },

    /// Run bit-flip descent on a benchmark function.
    Descent {
        /// sphere, ackley, griewank, rastrigin or rosenbrock
        function: BenchmarkFunction,
        /// Number of coordinates
        #[arg(short, long, default_value = "2")]
        dimension: usize,
        /// Bits per coordinate
        #[arg(short, long, default_value = "16")]
        bits: u32,
        /// steepest, first or random
        #[arg(short, long, default_value = "steepest")]
        strategy: DescentStrategy,
        /// Maximum number of moves
        #[arg(long, default_value = "1000")]
        max_iterations: usize,
        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Sudoku {
            file,
            config,
            initial_temperature,
            temperature_ratio,
            min_temperature,
            schedule,
            alpha,
            trials_factor,
            trial_growth,
            max_iterations,
            seed,
            runs,
        } => {
            let mut config = match config {
                Some(path) => SudokuConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => SudokuConfig::default(),
            };
            if let Some(t) = initial_temperature {
                config.initial_temperature = Some(t);
            }
            if let Some(ratio) = temperature_ratio {
                config.temperature_ratio = ratio;
            }
            let annealing = &mut config.annealing;
            if let Some(t) = min_temperature {
                annealing.min_temperature = t;
            }
            if let Some(schedule) = schedule {
                annealing.cooling = schedule;
            }
            if let Some(alpha) = alpha {
                annealing.cooling = annealing.cooling.with_alpha(alpha);
            }
            if let Some(factor) = trials_factor {
                annealing.trials_factor = factor;
            }
            if let Some(growth) = trial_growth {
                annealing.trial_growth = growth;
            }
            if let Some(n) = max_iterations {
                annealing.max_iterations = n;
            }
            if let Some(seed) = seed {
                annealing.seed = Some(seed);
            }

            let solver = SudokuSolver::from_file(&file, config)?;
            println!("{}", solver.puzzle());
            let reports = solver.solve_runs(runs.max(1))?;

            for (run, report) in reports.iter().enumerate() {
                println!(
                    "run {run}: conflicts: {}  iterations: {}  state: {}  T0: {:.4}  T: {:.6}",
                    report.conflicts,
                    report.iterations,
                    report.state,
                    report.initial_temperature,
                    report.final_temperature,
                );
            }
            let solved = reports.iter().filter(|r| r.is_solved()).count();
            if reports.len() > 1 {
                println!("solved {solved}/{}", reports.len());
            }

            let Some(best) = reports.iter().min_by_key(|r| r.conflicts) else {
                return Ok(ExitCode::FAILURE);
            };
            println!("\n{}", best.solution);
            Ok(if best.is_solved() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }

        Commands::Descent {
            function,
            dimension,
            bits,
            strategy,
            max_iterations,
            seed,
        } => {
            let problem = BinaryProblem::new(function, dimension, bits)?;
            let mut config = DescentConfig::default()
                .with_strategy(strategy)
                .with_max_iterations(max_iterations);
            config.seed = seed;

            let result = DescentRunner::run(&problem, &config);
            let point: Vec<String> = result.point.iter().map(|x| format!("{x:.6}")).collect();
            println!("{function}({})", point.join(", "));
            println!(
                "value: {:.6e}  moves: {}  evaluations: {}  local optimum: {}",
                result.value, result.iterations, result.evaluations, result.local_optimum,
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}
