use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ferrous_batch_align::compute::simd::{
    detect_optimal_simd_engine, i32_lane_count, simd_engine_description,
};
use ferrous_batch_align::{ExecutionConfig, ScoringScheme, WorkerStrategy, defaults, pairs};

#[derive(Parser)]
#[command(name = "ferrous-batch-align")]
#[command(about = "Parallel batch pairwise alignment with SIMD lane grouping", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Align record i of H.FA against record i of V.FA for every i
    Align {
        /// Horizontal sequences
        #[arg(value_name = "H.FA")]
        seqs_h: PathBuf,

        /// Vertical sequences (same record count as H.FA)
        #[arg(value_name = "V.FA")]
        seqs_v: PathBuf,

        // ===== Processing Options =====
        /// Number of worker threads (default: all available cores)
        #[arg(short = 't', long, value_name = "INT")]
        threads: Option<usize>,

        /// Run one alignment per step instead of grouping by vector width
        #[arg(long, conflicts_with = "vector_width")]
        scalar: bool,

        /// Tasks per vectorized step (default: i32 lanes of the detected SIMD engine)
        #[arg(short = 'w', long, value_name = "INT")]
        vector_width: Option<usize>,

        // ===== I/O Options =====
        /// Output TSV file (default: stdout)
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
        #[arg(short = 'v', long, value_name = "INT", default_value_t = defaults::VERBOSITY)]
        verbosity: i32,
    },

    /// Print the detected SIMD engine and default vector width
    Simd,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simd => {
            let engine = detect_optimal_simd_engine();
            println!("{}", simd_engine_description(engine));
            println!("default vector width: {}", i32_lane_count(engine));
        }

        Commands::Align {
            seqs_h,
            seqs_v,
            threads,
            scalar,
            vector_width,
            output,
            verbosity,
        } => {
            // Verbosity 1=error, 2=warning, 3=message, 4=debug, 5+=trace
            let log_level = match verbosity {
                v if v <= 1 => log::LevelFilter::Error,
                2 => log::LevelFilter::Warn,
                3 => log::LevelFilter::Info,
                4 => log::LevelFilter::Debug,
                _ => log::LevelFilter::Trace,
            };

            env_logger::Builder::from_default_env()
                .filter_level(log_level)
                .format_timestamp(None) // Don't show timestamps
                .format_target(false) // Don't show module names
                .init();

            let mut num_threads = threads.unwrap_or_else(num_cpus::get);
            if num_threads < 1 {
                log::warn!("Invalid thread count {}, using 1 thread", num_threads);
                num_threads = 1;
            }
            let max_threads = num_cpus::get() * 2;
            if num_threads > max_threads {
                log::warn!(
                    "Thread count {} exceeds recommended maximum {}, capping at {}",
                    num_threads,
                    max_threads,
                    max_threads
                );
                num_threads = max_threads;
            }

            let mut config = ExecutionConfig::default().with_threads(num_threads);
            if scalar {
                config = config.scalar();
            } else if let Some(width) = vector_width {
                config = config.with_strategy(WorkerStrategy::Vectorized { width });
            }

            let engine = detect_optimal_simd_engine();
            log::info!("SIMD engine: {}", simd_engine_description(engine));
            log::info!("Using {} workers ({})", config.num_threads, config.strategy);

            // Scoring is fixed to the built-in defaults
            let scoring = ScoringScheme::default();
            if verbosity >= 3 {
                log::info!("Scoring parameters:");
                log::info!("  Match score: {}", scoring.match_score);
                log::info!("  Mismatch penalty: {}", scoring.mismatch_penalty);
                log::info!("  Gap open: {}", scoring.gap_open);
                log::info!("  Gap extend: {}", scoring.gap_extend);
            }

            match pairs::align_fasta_pairs(&seqs_h, &seqs_v, config, scoring, output.as_deref()) {
                Ok(stats) => {
                    log::debug!(
                        "{} tasks, {} scalar steps, {} vector groups, {} panics",
                        stats.tasks_executed,
                        stats.scalar_steps,
                        stats.vector_groups,
                        stats.task_panics
                    );
                }
                Err(e) => {
                    log::error!("{}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
