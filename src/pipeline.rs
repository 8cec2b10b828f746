// This file contains the top-level polishing state machine: Racon iterations, then Medaka, then
// (with short reads) Pilon iterations, then publishing the final assembly.

// Copyright 2024 Ryan Wick (rrwick@gmail.com)

// This file is part of Autopolish. Autopolish is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. Autopolish
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with Autopolish. If not, see <http://www.gnu.org/licenses/>.

use std::path::PathBuf;

use crate::command::CommandRunner;
use crate::config::RunConfig;
use crate::error::PolishResult;
use crate::executor::{clean_stage_dir, StageExecutor, StageOutcome};
use crate::log::{section_header, explanation};
use crate::misc::{copy_file, create_dir};
use crate::resume::{missing_iterations, scan, ResumePoint};
use crate::stage::{all_stages, Family, Stage};


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Init,
    Racon,
    Medaka,
    Pilon,
    Finalize,
    Done,
}

impl Phase {
    pub fn next(self, config: &RunConfig) -> Phase {
        match self {
            Phase::Init     => Phase::Racon,
            Phase::Racon    => Phase::Medaka,
            Phase::Medaka   => if config.short_reads_available() { Phase::Pilon }
                                                            else { Phase::Finalize },
            Phase::Pilon    => Phase::Finalize,
            Phase::Finalize => Phase::Done,
            Phase::Done     => Phase::Done,
        }
    }
}


#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageRecord {
    pub stage: Stage,
    pub input: PathBuf,
    pub outcome: StageOutcome,
}


/// The in-memory state of one run. Only the pipeline changes it, and it is discarded at the end
/// of the run: the files on disk are the only state that lasts between runs.
#[derive(Debug)]
pub struct PipelineState {
    pub current_assembly: PathBuf,
    pub final_assembly: Option<PathBuf>,
    pub records: Vec<StageRecord>,
    pub resume_point: Option<ResumePoint>,
}


#[derive(Debug)]
pub struct PipelineSummary {
    pub final_assembly: PathBuf,
    pub published_assembly: PathBuf,
    pub published_this_run: bool,
    pub records: Vec<StageRecord>,
    pub resumed_from: Option<Stage>,
}

impl PipelineSummary {
    pub fn executed_count(&self) -> usize {
        self.records.iter().filter(|r| matches!(r.outcome, StageOutcome::Executed(_))).count()
    }
}


pub struct Pipeline<'a> {
    config: &'a RunConfig,
    executor: StageExecutor<'a>,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a RunConfig, runner: &'a mut dyn CommandRunner) -> Self {
        Pipeline {
            config,
            executor: StageExecutor::new(config, runner),
            state: PipelineState { current_assembly: config.contigs.clone(), final_assembly: None,
                                   records: Vec::new(), resume_point: None },
        }
    }

    pub fn run(mut self) -> PolishResult<PipelineSummary> {
        // Any fatal error returns straight out of this loop, abandoning the remaining phases.
        let mut phase = Phase::Init;
        let mut published_this_run = false;
        loop {
            log::debug!("entering phase {:?}", phase);
            match phase {
                Phase::Init     => self.init(),
                Phase::Racon    => self.racon_phase()?,
                Phase::Medaka   => self.medaka_phase()?,
                Phase::Pilon    => self.pilon_phase()?,
                Phase::Finalize => published_this_run = self.finalize()?,
                Phase::Done     => { self.done()?; break; }
            }
            phase = phase.next(self.config);
        }
        let state = self.state;
        Ok(PipelineSummary {
            final_assembly: state.final_assembly.unwrap_or(state.current_assembly),
            published_assembly: self.config.final_assembly_path(),
            published_this_run,
            resumed_from: state.resume_point.as_ref().and_then(|p| p.resumed_from()),
            records: state.records,
        })
    }

    fn init(&mut self) {
        if !self.config.resume {
            self.state.current_assembly = self.config.contigs.clone();
            log::info!("Starting from {}", self.state.current_assembly.display());
            return;
        }
        section_header("Checking for previous results");
        explanation("Existing stage outputs in the working directory are now found so the run can \
                     pick up where it left off.");
        let point = scan(self.config);
        match point.resumed_from() {
            Some(stage) => log::info!("Resuming after {} ({})", stage,
                                      point.current_assembly.display()),
            None => log::info!("No previous results found, starting from {}",
                               point.current_assembly.display()),
        }
        self.log_missing_iterations(Family::Racon);
        if self.config.short_reads_available() {
            self.log_missing_iterations(Family::Pilon);
        }
        self.state.current_assembly = point.current_assembly.clone();
        self.state.resume_point = Some(point);
    }

    fn log_missing_iterations(&self, family: Family) {
        let missing = missing_iterations(self.config, family);
        let listed = if missing.is_empty() {
            "none".to_string()
        } else {
            missing.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
        };
        log::info!("{} iterations still to run in {}: {}", family.name(),
                   self.config.assemblies_dir.display(), listed);
    }

    fn racon_phase(&mut self) -> PolishResult<()> {
        section_header("Long-read polishing with Racon");
        explanation("Long reads are aligned to the assembly with minimap2 and Racon makes a \
                     consensus from the alignments. This is repeated for each iteration, each one \
                     polishing the result of the previous.");
        self.run_family(Family::Racon)
    }

    fn medaka_phase(&mut self) -> PolishResult<()> {
        section_header("Long-read polishing with Medaka");
        explanation("Medaka now makes a consensus from the long reads and the Racon-polished \
                     assembly.");
        self.run_stage(Stage::Medaka)?;
        self.state.final_assembly = Some(self.state.current_assembly.clone());
        Ok(())
    }

    fn pilon_phase(&mut self) -> PolishResult<()> {
        section_header("Short-read polishing with Pilon");
        explanation("Short reads are aligned to the assembly with BWA and Pilon uses the \
                     alignments to fix small errors. This is repeated for each iteration.");
        self.run_family(Family::Pilon)?;
        self.state.final_assembly = Some(self.state.current_assembly.clone());
        Ok(())
    }

    fn run_family(&mut self, family: Family) -> PolishResult<()> {
        for stage in family.iterations(self.config) {
            self.run_stage(stage)?;
        }
        Ok(())
    }

    fn run_stage(&mut self, stage: Stage) -> PolishResult<()> {
        // Runs (or skips) one stage and moves the current assembly on to its output. A skipped
        // stage leaves the current assembly unchanged.
        let input = self.state.current_assembly.clone();
        let outcome = self.executor.execute(stage, &input)?;
        if let Some(output) = outcome.output() {
            self.state.current_assembly = output.to_path_buf();
        }
        self.state.records.push(StageRecord { stage, input, outcome });
        Ok(())
    }

    fn finalize(&mut self) -> PolishResult<bool> {
        // Returns whether the final assembly was published by this run.
        section_header("Finalising");
        let final_assembly = self.state.final_assembly.clone()
            .unwrap_or_else(|| self.state.current_assembly.clone());
        let published = self.config.final_assembly_path();
        if published.is_file() {
            log::info!("Final assembly already exists: {}", published.display());
            return Ok(false);
        }
        if self.config.dry_run {
            log::info!("Would copy {} to {}", final_assembly.display(), published.display());
            return Ok(false);
        }
        create_dir(&self.config.output_dir)?;
        copy_file(&final_assembly, &published)?;
        log::info!("Copied {} to {}", final_assembly.display(), published.display());
        Ok(true)
    }

    fn done(&self) -> PolishResult<()> {
        if !self.config.clean_intermediate || self.config.dry_run {
            return Ok(());
        }
        let mut removed = 0;
        for stage in all_stages(self.config) {
            removed += clean_stage_dir(&stage.stage_dir(self.config),
                                       &stage.output_path(self.config))?;
        }
        log::info!("Removed {} intermediate file(s) from stage directories", removed);
        Ok(())
    }
}
