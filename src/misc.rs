// This file contains miscellaneous functions used by various parts of Autopolish.

// Copyright 2024 Ryan Wick (rrwick@gmail.com)

// This file is part of Autopolish. Autopolish is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. Autopolish
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with Autopolish. If not, see <http://www.gnu.org/licenses/>.

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use flate2::read::MultiGzDecoder;
use std::ffi::OsString;
use std::fs::{self, File, create_dir_all, remove_dir_all, remove_file};
use std::io;
use std::io::{prelude::*, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PolishError, PolishResult};


pub fn create_dir(dir_path: &Path) -> PolishResult<()> {
    create_dir_all(dir_path)
        .with_context(|| format!("failed to create directory {}", dir_path.display()))?;
    Ok(())
}


pub fn delete_path_if_exists(path: &Path) -> PolishResult<()> {
    // Deletes a file or a whole directory. Symlinks are removed, not followed.
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(_) => return Ok(()),
    };
    let result = if metadata.is_dir() { remove_dir_all(path) } else { remove_file(path) };
    result.with_context(|| format!("failed to delete {}", path.display()))?;
    Ok(())
}


pub fn move_file(from: &Path, to: &Path) -> PolishResult<()> {
    fs::rename(from, to)
        .with_context(|| format!("failed to move {} to {}", from.display(), to.display()))?;
    Ok(())
}


pub fn copy_file(from: &Path, to: &Path) -> PolishResult<()> {
    // The copy is written next to the destination and then renamed into place, so the destination
    // path only ever holds a complete file.
    let partial = partial_path(to);
    fs::copy(from, &partial)
        .with_context(|| format!("failed to copy {} to {}", from.display(), partial.display()))?;
    move_file(&partial, to)
}


pub fn partial_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}


#[cfg(not(test))]
pub fn quit_with_error(text: &str) -> ! {
    // For friendly error messages, this function normally just prints the error and quits.
    eprintln!();
    eprintln!("Error: {}", text);
    std::process::exit(1);
}
#[cfg(test)]
pub fn quit_with_error(text: &str) -> ! {
    // But when running unit tests, this function instead panics so I can catch it for the test.
    panic!("{}", text);
}


pub fn assembly_stats(filename: &Path) -> PolishResult<(usize, u64)> {
    // Returns the number of sequences and the total sequence length of a FASTA file (gzipped or
    // not).
    let reader = fasta_reader(filename)
        .with_context(|| format!("failed to open {}", filename.display()))?;
    let mut count = 0;
    let mut total_length = 0u64;
    for line in reader.lines() {
        let text = line.with_context(|| format!("failed to read {}", filename.display()))?;
        let text = text.trim_end();
        if text.starts_with('>') {
            count += 1;
        } else {
            total_length += text.len() as u64;
        }
    }
    Ok((count, total_length))
}


pub fn check_fasta(filename: &Path) -> PolishResult<()> {
    // A quick sanity check that a file looks like FASTA: the first non-empty line is a header.
    let reader = fasta_reader(filename)
        .with_context(|| format!("failed to open {}", filename.display()))?;
    for line in reader.lines() {
        let text = line.with_context(|| format!("failed to read {}", filename.display()))?;
        if text.trim().is_empty() { continue; }
        if text.starts_with('>') { return Ok(()); }
        break;
    }
    Err(PolishError::Config(format!("{} is not in FASTA format", filename.display())))
}


fn fasta_reader(filename: &Path) -> io::Result<BufReader<Box<dyn Read>>> {
    let file = File::open(filename)?;
    let reader: Box<dyn Read> = if is_file_gzipped(filename)? {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(BufReader::new(reader))
}


fn is_file_gzipped(filename: &Path) -> io::Result<bool> {
    // Returns true if the file appears to be gzipped (based on the first two bytes).
    let mut file = File::open(filename)?;
    let mut buf = [0u8; 2];
    match file.read_exact(&mut buf) {
        Ok(_)  => Ok(buf[0] == 31 && buf[1] == 139),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}


pub fn format_duration(duration: std::time::Duration) -> String {
    let microseconds = duration.as_micros() % 1000000;
    let seconds =      duration.as_micros() / 1000000 % 60;
    let minutes =      duration.as_micros() / 1000000 / 60 % 60;
    let hours =        duration.as_micros() / 1000000 / 60 / 60;
    format!("{}:{:02}:{:02}.{:06}", hours, minutes, seconds, microseconds)
}


pub fn spinner(message: &str) -> ProgressBar {
    if cfg!(test) {
        ProgressBar::hidden() // don't show a spinner during unit tests
    } else {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠚", "⠞", "⠖", "⠦", "⠴", "⠲", "⠳", "⠓"])  // dots3 from github.com/sindresorhus/cli-spinners
                .template("{spinner} {msg}").unwrap(),
        );
        pb.set_message(message.to_string());
        pb
    }
}
