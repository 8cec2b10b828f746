// This file contains the code for the autopolish polish subcommand.

// Copyright 2024 Ryan Wick (rrwick@gmail.com)

// This file is part of Autopolish. Autopolish is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. Autopolish
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with Autopolish. If not, see <http://www.gnu.org/licenses/>.

use std::time::Instant;

use crate::command::{CommandRunner, DryRunner, SystemRunner};
use crate::config::RunConfig;
use crate::error::{PolishError, PolishResult};
use crate::log::{section_header, explanation, setup_logger};
use crate::metrics::PolishMetrics;
use crate::misc::{check_fasta, create_dir, format_duration};
use crate::pipeline::{Pipeline, PipelineSummary};
use crate::tools::check_requirements;


pub fn polish(config: RunConfig) -> PolishResult<()> {
    let start_time = Instant::now();
    prepare(&config, &SystemRunner)?;

    // A dry run writes nothing, not even a log file.
    let log_file = if config.dry_run {
        None
    } else {
        create_dir(&config.output_dir)?;
        Some(config.log_path())
    };
    setup_logger(log_file.as_deref(), config.resume, config.verbose)
        .map_err(|e| PolishError::Config(format!("failed to set up logging: {}", e)))?;
    install_interrupt_handler();

    starting_message(&config);
    config.print_settings();
    let summary = if config.dry_run { dry_run(&config)? } else { real_run(&config)? };
    finished_message(start_time, &config, &summary);
    Ok(())
}


fn prepare(config: &RunConfig, runner: &dyn CommandRunner) -> PolishResult<()> {
    // Checks everything that can be checked up front. Nothing is created on disk until these all
    // pass.
    config.validate()?;
    check_fasta(&config.contigs)?;
    if !config.dry_run {
        check_requirements(config, runner)?;
    }
    Ok(())
}


fn real_run(config: &RunConfig) -> PolishResult<PipelineSummary> {
    let mut runner = SystemRunner;
    let summary = Pipeline::new(config, &mut runner).run()?;
    PolishMetrics::new(config, &summary)?.save_to_yaml(&config.summary_path())?;
    Ok(summary)
}


fn dry_run(config: &RunConfig) -> PolishResult<PipelineSummary> {
    let mut runner = DryRunner::default();
    let summary = Pipeline::new(config, &mut runner).run()?;
    log::info!("");
    log::info!("Dry run: {} command(s) would be run", runner.commands.len());
    Ok(summary)
}


fn install_interrupt_handler() {
    // Child processes receive the same SIGINT, so there is nothing to clean up here. Any stage
    // that was interrupted has no output file and will be rerun with --resume.
    let result = ctrlc::set_handler(|| {
        eprintln!();
        log::warn!("interrupted, rerun with --resume to continue from the last completed stage");
        std::process::exit(130);
    });
    if let Err(e) = result {
        log::warn!("could not install Ctrl-C handler: {}", e);
    }
}


fn starting_message(config: &RunConfig) {
    section_header("Starting autopolish polish");
    if config.short_reads_available() {
        explanation("This command polishes a long-read assembly with Racon and Medaka (using the \
                     long reads) and then with Pilon (using the short reads).");
    } else {
        explanation("This command polishes a long-read assembly with Racon and Medaka using the \
                     long reads. No short reads were given, so Pilon polishing will not be done.");
    }
}


fn finished_message(start_time: Instant, config: &RunConfig, summary: &PipelineSummary) {
    section_header("Finished!");
    if config.dry_run {
        log::info!("Final assembly would be: {}", summary.published_assembly.display());
    } else {
        log::info!("Stages run: {} of {}", summary.executed_count(), summary.records.len());
        log::info!("Final assembly: {} (from {})", summary.published_assembly.display(),
                   summary.final_assembly.display());
        log::info!("Run summary: {}", config.summary_path().display());
        log::info!("Log file: {}", config.log_path().display());
    }
    log::info!("Time to run: {}", format_duration(start_time.elapsed()));
    eprintln!();
}
