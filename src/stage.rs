// This file defines the polishing stages, their order and the file naming that marks each one as
// complete.

// Copyright 2024 Ryan Wick (rrwick@gmail.com)

// This file is part of Autopolish. Autopolish is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. Autopolish
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with Autopolish. If not, see <http://www.gnu.org/licenses/>.

use std::fmt;
use std::path::PathBuf;

use crate::config::RunConfig;


/// The stage families that are run for several iterations. Both share the same iteration logic
/// and differ only in naming and in the commands each iteration runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    Racon,
    Pilon,
}

impl Family {
    pub fn iteration(&self, index: usize) -> Stage {
        match self {
            Family::Racon => Stage::Racon(index),
            Family::Pilon => Stage::Pilon(index),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Family::Racon => "Racon",
            Family::Pilon => "Pilon",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Family::Racon => "racon",
            Family::Pilon => "pilon",
        }
    }

    pub fn iterations(&self, config: &RunConfig) -> Vec<Stage> {
        (1..=config.max_iterations).map(|i| self.iteration(i)).collect()
    }
}


#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Racon(usize),
    Medaka,
    Pilon(usize),
}

impl Stage {
    pub fn family(&self) -> Option<Family> {
        match self {
            Stage::Racon(_) => Some(Family::Racon),
            Stage::Medaka   => None,
            Stage::Pilon(_) => Some(Family::Pilon),
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Stage::Racon(i) | Stage::Pilon(i) => Some(*i),
            Stage::Medaka => None,
        }
    }

    pub fn dir_name(&self) -> String {
        match (self.family(), self.index()) {
            (Some(family), Some(i)) => format!("{}_iter{}", family.label(), i),
            _ => "medaka".to_string(),
        }
    }

    pub fn stage_dir(&self, config: &RunConfig) -> PathBuf {
        config.assemblies_dir.join(self.dir_name())
    }

    pub fn output_filename(&self, config: &RunConfig) -> String {
        match self {
            Stage::Medaka => format!("{}_medaka_consensus.fasta", config.prefix),
            _             => format!("{}_{}.fasta", config.prefix, self.dir_name()),
        }
    }

    /// The file whose presence means this stage is complete.
    pub fn output_path(&self, config: &RunConfig) -> PathBuf {
        self.stage_dir(config).join(self.output_filename(config))
    }

    pub fn is_complete(&self, config: &RunConfig) -> bool {
        self.output_path(config).is_file()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.family(), self.index()) {
            (Some(family), Some(i)) => write!(f, "{} iteration {}", family.name(), i),
            _ => write!(f, "Medaka"),
        }
    }
}


pub fn all_stages(config: &RunConfig) -> Vec<Stage> {
    // Every stage of a run, in the order they execute.
    let mut stages = Family::Racon.iterations(config);
    stages.push(Stage::Medaka);
    if config.short_reads_available() {
        stages.extend(Family::Pilon.iterations(config));
    }
    stages
}
