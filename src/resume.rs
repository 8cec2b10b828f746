// This file contains the code that inspects a working directory to find how far a previous run got.

// Copyright 2024 Ryan Wick (rrwick@gmail.com)

// This file is part of Autopolish. Autopolish is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. Autopolish
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with Autopolish. If not, see <http://www.gnu.org/licenses/>.

use std::path::PathBuf;

use crate::config::RunConfig;
use crate::stage::{Family, Stage};


#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResumePoint {
    pub current_assembly: PathBuf,
    pub last_racon: Option<usize>,
    pub medaka_done: bool,
    pub last_pilon: Option<usize>,  // always None when there are no short reads
}

impl ResumePoint {
    /// The completed stage whose output the run resumes from, or None for a fresh start.
    pub fn resumed_from(&self) -> Option<Stage> {
        if let Some(i) = self.last_pilon {
            Some(Stage::Pilon(i))
        } else if self.medaka_done {
            Some(Stage::Medaka)
        } else {
            self.last_racon.map(Stage::Racon)
        }
    }
}


pub fn scan(config: &RunConfig) -> ResumePoint {
    // Each family is scanned independently and later families take precedence: a Medaka output
    // supersedes any Racon output, and a Pilon output supersedes both.
    let mut point = ResumePoint { current_assembly: config.contigs.clone(), last_racon: None,
                                  medaka_done: false, last_pilon: None };
    point.last_racon = highest_completed(config, Family::Racon);
    if let Some(i) = point.last_racon {
        point.current_assembly = Stage::Racon(i).output_path(config);
    }
    if Stage::Medaka.is_complete(config) {
        point.medaka_done = true;
        point.current_assembly = Stage::Medaka.output_path(config);
    }
    if config.short_reads_available() {
        point.last_pilon = highest_completed(config, Family::Pilon);
        if let Some(i) = point.last_pilon {
            point.current_assembly = Stage::Pilon(i).output_path(config);
        }
    }
    point
}


pub fn missing_iterations(config: &RunConfig, family: Family) -> Vec<usize> {
    // Every iteration is rechecked on each run, so these are the iterations a run will execute,
    // including any below the highest completed one.
    (1..=config.max_iterations).filter(|&i| !family.iteration(i).is_complete(config)).collect()
}


fn highest_completed(config: &RunConfig, family: Family) -> Option<usize> {
    (1..=config.max_iterations).rev().find(|&i| family.iteration(i).is_complete(config))
}
