// This is the main file of Autopolish and where execution starts. It mainly handles the CLI and
// then calls into other files to run whichever subcommand the user chose.

// Copyright 2024 Ryan Wick (rrwick@gmail.com)

// This file is part of Autopolish. Autopolish is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. Autopolish
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with Autopolish. If not, see <http://www.gnu.org/licenses/>.

use std::path::PathBuf;
use clap::{Parser, Subcommand, crate_version};

mod command;
mod config;
mod error;
mod executor;
mod log;
mod metrics;
mod misc;
mod pipeline;
mod polish;
mod resume;
mod stage;
mod status;
mod tools;


use crate::config::{ReadType, RunConfig};
use crate::error::PolishError;
use crate::misc::quit_with_error;

#[derive(Parser)]
#[clap(name = "Autopolish",
       version = concat!("v", crate_version!()),
       about = "resumable long-read and short-read polishing of genome assemblies",
       before_help = concat!(r#"                _                    _ _     _     "#, "\n",
                             r#"     /\        | |                  | (_)   | |    "#, "\n",
                             r#"    /  \  _   _| |_ ___  _ __   ___ | |_ ___| |__  "#, "\n",
                             r#"   / /\ \| | | | __/ _ \| '_ \ / _ \| | / __| '_ \ "#, "\n",
                             r#"  / ____ \ |_| | || (_) | |_) | (_) | | \__ \ | | |"#, "\n",
                             r#" /_/    \_\__,_|\__\___/| .__/ \___/|_|_|___/_| |_|"#, "\n",
                             r#"                        | |                        "#, "\n",
                             r#"                        |_|                        "#))]
#[command(author, version, long_about = None, disable_help_subcommand = true,
          propagate_version = true)]
#[clap(subcommand_required = true)]
#[clap(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {

    /// polish an assembly with Racon, Medaka and (optionally) Pilon
    Polish {
        /// Assembly to polish in FASTA format (required)
        #[clap(short = 'c', long = "contigs", required = true)]
        contigs: PathBuf,

        /// Long reads in FASTQ format (required)
        #[clap(short = 'l', long = "long_reads", required = true)]
        long_reads: PathBuf,

        /// Short reads, first of pair (enables Pilon polishing)
        #[clap(short = '1', long = "short_1", requires = "short_2")]
        short_1: Option<PathBuf>,

        /// Short reads, second of pair
        #[clap(short = '2', long = "short_2", requires = "short_1")]
        short_2: Option<PathBuf>,

        /// Output directory for the final assembly, log and summary (required)
        #[clap(short = 'o', long = "out_dir", required = true)]
        out_dir: PathBuf,

        /// Working directory for stage outputs [default: same as --out_dir]
        #[clap(short = 'w', long = "work_dir")]
        work_dir: Option<PathBuf>,

        /// Prefix for output file names
        #[clap(short = 'p', long = "prefix", default_value = "sample")]
        prefix: String,

        /// Number of CPU threads
        #[clap(short = 't', long = "threads", default_value = "8")]
        threads: usize,

        /// Number of Racon iterations (and Pilon iterations if short reads are given)
        #[clap(short = 'n', long = "iterations", default_value = "3")]
        iterations: usize,

        /// Long-read technology
        #[clap(long = "read_type", value_enum, default_value = "ont")]
        read_type: ReadType,

        /// Medaka model [default: Medaka's own default]
        #[clap(long = "medaka_model")]
        medaka_model: Option<String>,

        /// Pilon jar file [default: pilon in $PATH, then a jar in $CONDA_PREFIX/share]
        #[clap(long = "pilon_jar")]
        pilon_jar: Option<PathBuf>,

        /// Java heap size for Pilon
        #[clap(long = "pilon_memory", default_value = "16G")]
        pilon_memory: String,

        /// Continue from the last completed stage of a previous run
        #[clap(long = "resume")]
        resume: bool,

        /// Show the commands that would be run without running them
        #[clap(long = "dry_run")]
        dry_run: bool,

        /// Delete intermediate files, keeping only each stage's output assembly
        #[clap(long = "clean")]
        clean: bool,

        /// Enable verbose output (includes the output of each tool)
        #[clap(long = "verbose")]
        verbose: bool,
    },

    /// report which stages of a run are complete
    Status {
        /// Output directory of the run (required)
        #[clap(short = 'o', long = "out_dir", required = true)]
        out_dir: PathBuf,

        /// Working directory of the run [default: same as --out_dir]
        #[clap(short = 'w', long = "work_dir")]
        work_dir: Option<PathBuf>,

        /// Prefix for output file names
        #[clap(short = 'p', long = "prefix", default_value = "sample")]
        prefix: String,

        /// Number of iterations the run uses
        #[clap(short = 'n', long = "iterations", default_value = "3")]
        iterations: usize,

        /// Short reads, first of pair (include Pilon stages)
        #[clap(short = '1', long = "short_1", requires = "short_2")]
        short_1: Option<PathBuf>,

        /// Short reads, second of pair
        #[clap(short = '2', long = "short_2", requires = "short_1")]
        short_2: Option<PathBuf>,
    },
}


fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Polish { contigs, long_reads, short_1, short_2, out_dir, work_dir, prefix,
                                threads, iterations, read_type, medaka_model, pilon_jar,
                                pilon_memory, resume, dry_run, clean, verbose }) => {
            let work_dir = work_dir.unwrap_or_else(|| out_dir.clone());
            let mut config = RunConfig::new(&prefix, work_dir, out_dir);
            config.contigs = contigs;
            config.long_reads = long_reads;
            config.short_reads = short_1.zip(short_2);
            config.threads = threads;
            config.max_iterations = iterations;
            config.read_type = read_type;
            config.medaka_model = medaka_model;
            config.pilon_jar = pilon_jar;
            config.pilon_memory = pilon_memory;
            config.resume = resume;
            config.dry_run = dry_run;
            config.clean_intermediate = clean;
            config.verbose = verbose;
            if let Err(e) = polish::polish(config) {
                exit_with_error(e);
            }
        },
        Some(Commands::Status { out_dir, work_dir, prefix, iterations, short_1, short_2 }) => {
            let work_dir = work_dir.unwrap_or_else(|| out_dir.clone());
            let mut config = RunConfig::new(&prefix, work_dir, out_dir);
            config.max_iterations = iterations;
            config.short_reads = short_1.zip(short_2);
            status::status(&config);
        },
        None => {}
    }
}


fn exit_with_error(e: PolishError) -> ! {
    // Errors found before logging starts are only printed. After that they also go to the log
    // file, so a failed run's log says why it stopped.
    if ::log::max_level() == ::log::LevelFilter::Off {
        quit_with_error(&e.to_string());
    }
    ::log::error!("{}", e);
    ::log::info!("Completed stages are kept, rerun with --resume to continue");
    std::process::exit(1);
}
