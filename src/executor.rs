// This file contains the code that carries out a single polishing stage. Every stage follows the
// same steps: check for an existing output, run the stage's commands, then move the result into
// place.

// Copyright 2024 Ryan Wick (rrwick@gmail.com)

// This file is part of Autopolish. Autopolish is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. Autopolish
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with Autopolish. If not, see <http://www.gnu.org/licenses/>.

use anyhow::{anyhow, Context};
use std::fs::read_dir;
use std::path::{Path, PathBuf};

use crate::command::{CommandRunner, ExternalCommand};
use crate::config::RunConfig;
use crate::error::{PolishError, PolishResult};
use crate::misc::{copy_file, create_dir, delete_path_if_exists, move_file};
use crate::stage::{Family, Stage};
use crate::tools::{plan_stage, Promotion, StagePlan};


#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    Executed(PathBuf),
    AlreadyComplete(PathBuf),
    Skipped(String),
}

impl StageOutcome {
    pub fn output(&self) -> Option<&Path> {
        match self {
            StageOutcome::Executed(p) | StageOutcome::AlreadyComplete(p) => Some(p),
            StageOutcome::Skipped(_) => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            StageOutcome::Executed(_)        => "executed",
            StageOutcome::AlreadyComplete(_) => "already complete",
            StageOutcome::Skipped(_)         => "skipped",
        }
    }
}


pub struct StageExecutor<'a> {
    config: &'a RunConfig,
    runner: &'a mut dyn CommandRunner,
}

impl<'a> StageExecutor<'a> {
    pub fn new(config: &'a RunConfig, runner: &'a mut dyn CommandRunner) -> Self {
        StageExecutor { config, runner }
    }

    pub fn execute(&mut self, stage: Stage, input: &Path) -> PolishResult<StageOutcome> {
        let output = stage.output_path(self.config);
        if output.is_file() {
            log::info!("{}: already complete, using {}", stage, output.display());
            return Ok(StageOutcome::AlreadyComplete(output));
        }
        let plan = match plan_stage(stage, self.config, input, &*self.runner) {
            Ok(plan) => plan,
            Err(e) if e.is_recoverable() && stage.family() == Some(Family::Pilon) => {
                log::warn!("{}: {}", stage, e);
                log::warn!("{}: skipped, continuing with {}", stage, input.display());
                return Ok(StageOutcome::Skipped(e.to_string()));
            }
            Err(e) => return Err(e),
        };
        log::info!("{}: polishing {}", stage, input.display());
        if self.config.dry_run {
            for command in &plan.commands {
                self.run_command(stage, command)?;
            }
            log::info!("{}: would produce {}", stage, output.display());
            return Ok(StageOutcome::Executed(output));
        }
        self.run_plan(&plan)?;
        log::info!("{}: finished, produced {}", stage, output.display());
        if self.config.clean_intermediate {
            let removed = clean_stage_dir(&plan.dir, &plan.output)?;
            log::info!("{}: removed {} intermediate file(s)", stage, removed);
        }
        Ok(StageOutcome::Executed(output))
    }

    fn run_plan(&mut self, plan: &StagePlan) -> PolishResult<()> {
        create_dir(&plan.dir)?;
        for (from, to) in &plan.staged_inputs {
            copy_file(from, to)?;
        }
        for command in &plan.commands {
            self.run_command(plan.stage, command)?;
        }
        if !plan.produced.is_file() {
            return Err(anyhow!("{} finished but {} was not created", plan.stage,
                               plan.produced.display()).into());
        }
        match plan.promotion {
            Promotion::Move => move_file(&plan.produced, &plan.output),
            Promotion::Copy => copy_file(&plan.produced, &plan.output),
        }
    }

    fn run_command(&mut self, stage: Stage, command: &ExternalCommand) -> PolishResult<()> {
        log::info!("  {}", command);
        let result = self.runner.run(command)?;
        if !result.output.trim().is_empty() {
            log::debug!("{}", result.output.trim_end());
        }
        if !result.succeeded() {
            return Err(PolishError::CommandFailed { stage: stage.to_string(),
                                                    command: command.to_string(),
                                                    exit_code: result.exit_code,
                                                    output: result.output });
        }
        Ok(())
    }
}


pub fn clean_stage_dir(dir: &Path, keep: &Path) -> PolishResult<usize> {
    // Deletes everything in a stage directory except the stage's output file. Returns the number
    // of files and directories removed.
    let entries = match read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(0),
    };
    let mut removed = 0;
    for entry in entries {
        let path = entry.with_context(|| format!("failed to read {}", dir.display()))?.path();
        if path == keep {
            continue;
        }
        delete_path_if_exists(&path)?;
        removed += 1;
    }
    Ok(removed)
}
