// This file defines the errors that can stop (or partially stop) an Autopolish run.

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


#[derive(Debug)]
pub enum PolishError {
    // Invalid or missing settings, found before any stage runs.
    Config(String),

    // An external program ran but returned a non-zero exit code (None if killed by a signal).
    CommandFailed { stage: String, command: String, exit_code: Option<i32>, output: String },

    // A resource needed by a stage could not be located. Only Pilon treats this as recoverable.
    MissingResource(String),

    // Anything else (file operations, programs that couldn't be started), with context attached.
    Other(anyhow::Error),
}

pub type PolishResult<T> = Result<T, PolishError>;


impl PolishError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PolishError::MissingResource(_))
    }
}


impl From<anyhow::Error> for PolishError {
    fn from(e: anyhow::Error) -> Self {
        PolishError::Other(e)
    }
}


impl fmt::Display for PolishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolishError::Config(msg) => write!(f, "{}", msg),
            PolishError::CommandFailed { stage, command, exit_code, output } => {
                let status = match exit_code {
                    Some(code) => format!("exit code {}", code),
                    None       => "terminated by signal".to_string(),
                };
                write!(f, "{} failed ({})\n  {}", stage, status, command)?;
                let tail = last_lines(output, 10);
                if !tail.is_empty() {
                    write!(f, "\n{}", tail)?;
                }
                Ok(())
            }
            PolishError::MissingResource(msg) => write!(f, "{}", msg),
            PolishError::Other(e) => write!(f, "{:#}", e),  // context followed by its causes
        }
    }
}


impl std::error::Error for PolishError {}


fn last_lines(text: &str, count: usize) -> String {
    // Tool output can be very long, so only the end (where the error usually is) is reported.
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}


pub fn missing_file_error(path: &PathBuf, description: &str) -> PolishError {
    if path.exists() {
        PolishError::Config(format!("{} is not a file: {}", description, path.display()))
    } else {
        PolishError::Config(format!("{} does not exist: {}", description, path.display()))
    }
}
