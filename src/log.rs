// This file contains the functions for Autopolish's terminal and log-file output.

// Copyright 2024 Ryan Wick (rrwick@gmail.com)

// This file is part of Autopolish. Autopolish is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. Autopolish
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with Autopolish. If not, see <http://www.gnu.org/licenses/>.

use chrono::Local;
use colored::Colorize;
use std::fs::{File, OpenOptions};
use std::path::Path;


// Messages logged with this target go to the log file but not to stderr, because the section
// headers and explanations are already printed to stderr in their own format.
const FILE_ONLY: &str = "autopolish::file_only";


pub fn setup_logger(log_file: Option<&Path>, append: bool,
                    verbose: bool) -> Result<(), fern::InitError> {
    // Leveled messages go to stderr and (if given) the log file. A fresh run replaces any existing
    // log file, a resumed run appends to it.
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    let stderr_dispatch = fern::Dispatch::new()
        .filter(|metadata| metadata.target() != FILE_ONLY)
        .format(|out, message, record| {
            let label = level_label(record.level());
            if label.is_empty() {
                out.finish(format_args!("{}", message))
            } else {
                out.finish(format_args!("{} {}", label, message))
            }
        })
        .chain(std::io::stderr());
    let mut logger = fern::Dispatch::new().level(level).chain(stderr_dispatch);
    if let Some(log_file) = log_file {
        let file = open_log_file(log_file, append)?;
        let file_dispatch = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!("{} [{}] {}",
                                        Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                                        record.level(), message))
            })
            .chain(file);
        logger = logger.chain(file_dispatch);
    }
    logger.apply()?;
    Ok(())
}


fn open_log_file(log_file: &Path, append: bool) -> std::io::Result<File> {
    if append {
        OpenOptions::new().create(true).append(true).open(log_file)
    } else {
        File::create(log_file)
    }
}


fn level_label(level: log::Level) -> String {
    match level {
        log::Level::Error => "Error:".red().bold().to_string(),
        log::Level::Warn  => "Warning:".yellow().bold().to_string(),
        _                 => String::new(),
    }
}


pub fn section_header(text: &str) {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let date = format!("({})", now);
    eprintln!();
    eprintln!("{} {}", bold_yellow_underline(text), date.dimmed());
    log::info!(target: FILE_ONLY, "== {} ==", text);
}


pub fn explanation(text: &str) {
    let width = terminal_width();
    let wrapped = textwrap::fill(&text.split_whitespace().collect::<Vec<_>>().join(" "), width);
    eprintln!("{}", wrapped.dimmed());
    eprintln!();
}


fn bold_yellow_underline(text: &str) -> String {
    text.bold().yellow().underline().to_string()
}


fn terminal_width() -> usize {
    // Explanations are wrapped to the terminal width, within sensible limits.
    match term_size::dimensions_stderr() {
        Some((w, _)) => w.clamp(40, 150),
        None         => 100,
    }
}
