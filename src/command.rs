// This file contains the code for running external programs. Everything Autopolish asks another
// tool to do goes through the CommandRunner trait, so tests can swap in a scripted runner.

// Copyright 2024 Ryan Wick (rrwick@gmail.com)

// This file is part of Autopolish. Autopolish is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. Autopolish
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with Autopolish. If not, see <http://www.gnu.org/licenses/>.

use anyhow::Context;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use which::which;

use crate::error::PolishResult;
use crate::misc::spinner;


#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    pub stdout: Option<PathBuf>,  // if set, stdout is saved to this file instead of captured
}

impl ExternalCommand {
    pub fn new(program: &str) -> Self {
        ExternalCommand { program: program.to_string(), args: Vec::new(), stdout: None }
    }

    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn path(mut self, path: &Path) -> Self {
        self.args.push(path.display().to_string());
        self
    }

    pub fn stdout_to(mut self, path: &Path) -> Self {
        self.stdout = Some(path.to_path_buf());
        self
    }

    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.program.clone()];
        argv.extend(self.args.iter().cloned());
        argv
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))?;
        if let Some(stdout) = &self.stdout {
            write!(f, " > {}", stdout.display())?;
        }
        Ok(())
    }
}


#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub output: String,  // stdout (unless redirected to a file) followed by stderr
}

impl CommandOutput {
    pub fn success() -> Self {
        CommandOutput { exit_code: Some(0), output: String::new() }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}


pub trait CommandRunner {
    /// Runs the command to completion. An Err means the command could not be run at all. A
    /// command that ran and failed is an Ok with a non-zero exit code.
    fn run(&mut self, command: &ExternalCommand) -> PolishResult<CommandOutput>;

    /// Returns the location of the program if it can be found in $PATH.
    fn find_program(&self, program: &str) -> Option<PathBuf> {
        which(program).ok()
    }
}


/// Runs commands as real subprocesses, blocking until each one exits.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &ExternalCommand) -> PolishResult<CommandOutput> {
        let mut process = Command::new(&command.program);
        process.args(&command.args).stdin(Stdio::null()).stderr(Stdio::piped());
        match &command.stdout {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                process.stdout(Stdio::from(file));
            }
            None => { process.stdout(Stdio::piped()); }
        }
        let pb = spinner(&format!("running {}...", command.program));
        let result = process.output();
        pb.finish_and_clear();
        let output = result.with_context(|| format!("failed to run {}", command.program))?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(CommandOutput { exit_code: output.status.code(), output: text })
    }
}


/// Records commands instead of running them and reports each as successful.
#[derive(Default)]
pub struct DryRunner {
    pub commands: Vec<ExternalCommand>,
}

impl CommandRunner for DryRunner {
    fn run(&mut self, command: &ExternalCommand) -> PolishResult<CommandOutput> {
        self.commands.push(command.clone());
        Ok(CommandOutput::success())
    }
}
