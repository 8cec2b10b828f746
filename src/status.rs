// This file contains the code for the autopolish status subcommand, which reports how far a run
// has got without running anything.

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
use crate::log::{section_header, explanation};
use crate::resume::scan;
use crate::stage::{all_stages, Stage};


#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageStatus {
    pub stage: Stage,
    pub marker: PathBuf,
    pub complete: bool,
}


pub fn status(config: &RunConfig) {
    section_header("Autopolish status");
    explanation("Each stage is complete if its output file exists. A run in this working \
                 directory (with or without --resume) will skip the complete stages.");
    for s in stage_statuses(config) {
        let state = if s.complete { "complete" } else { "not done" };
        println!("{:<20}{:<12}{}", s.stage.to_string(), state, s.marker.display());
    }
    let final_assembly = config.final_assembly_path();
    let state = if final_assembly.is_file() { "complete" } else { "not done" };
    println!("{:<20}{:<12}{}", "Final assembly", state, final_assembly.display());
    println!();

    let point = scan(config);
    match point.resumed_from() {
        Some(stage) => println!("A resumed run continues from {} ({})", stage,
                                point.current_assembly.display()),
        None        => println!("A resumed run starts from the input contigs"),
    }
    match next_stage(config) {
        Some(stage) => println!("Next stage to run: {}", stage),
        None        => println!("All stages are complete"),
    }
}


pub fn stage_statuses(config: &RunConfig) -> Vec<StageStatus> {
    all_stages(config).into_iter()
        .map(|stage| StageStatus { stage, marker: stage.output_path(config),
                                   complete: stage.is_complete(config) })
        .collect()
}


pub fn next_stage(config: &RunConfig) -> Option<Stage> {
    all_stages(config).into_iter().find(|stage| !stage.is_complete(config))
}
