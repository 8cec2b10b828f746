// This file defines the settings for a polishing run and the checks that are done on them before
// anything else happens.

// Copyright 2024 Ryan Wick (rrwick@gmail.com)

// This file is part of Autopolish. Autopolish is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. Autopolish
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with Autopolish. If not, see <http://www.gnu.org/licenses/>.

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{missing_file_error, PolishError, PolishResult};


#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadType {
    Ont,     // Oxford Nanopore reads
    Pacbio,  // PacBio reads
}

impl ReadType {
    pub fn minimap2_preset(&self) -> &'static str {
        match self {
            ReadType::Ont    => "map-ont",
            ReadType::Pacbio => "map-pb",
        }
    }
}

impl fmt::Display for ReadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadType::Ont    => write!(f, "ont"),
            ReadType::Pacbio => write!(f, "pacbio"),
        }
    }
}


#[derive(Clone, Debug)]
pub struct RunConfig {
    pub prefix: String,
    pub max_iterations: usize,
    pub read_type: ReadType,
    pub contigs: PathBuf,
    pub long_reads: PathBuf,
    pub short_reads: Option<(PathBuf, PathBuf)>,
    pub threads: usize,
    pub pilon_memory: String,
    pub pilon_jar: Option<PathBuf>,
    pub medaka_model: Option<String>,
    pub assemblies_dir: PathBuf,
    pub output_dir: PathBuf,
    pub clean_intermediate: bool,
    pub resume: bool,
    pub dry_run: bool,
    pub verbose: bool,
}

impl RunConfig {
    pub fn new(prefix: &str, work_dir: PathBuf, output_dir: PathBuf) -> Self {
        // Creates a config with default settings. Input files still need to be filled in before
        // a run can be validated.
        RunConfig {
            prefix: prefix.to_string(),
            max_iterations: 3,
            read_type: ReadType::Ont,
            contigs: PathBuf::new(),
            long_reads: PathBuf::new(),
            short_reads: None,
            threads: 8,
            pilon_memory: "16G".to_string(),
            pilon_jar: None,
            medaka_model: None,
            assemblies_dir: work_dir.join("assemblies"),
            output_dir,
            clean_intermediate: false,
            resume: false,
            dry_run: false,
            verbose: false,
        }
    }

    pub fn short_reads_available(&self) -> bool {
        self.short_reads.is_some()
    }

    pub fn final_assembly_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_final_assembly.fasta", self.prefix))
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_polish.log", self.prefix))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_polish.yaml", self.prefix))
    }

    pub fn validate(&self) -> PolishResult<()> {
        // Checks every setting without creating or modifying anything on disk.
        check_prefix(&self.prefix)?;
        if self.max_iterations < 1 {
            return Err(PolishError::Config("--iterations must be at least 1".to_string()));
        }
        if self.threads < 1 {
            return Err(PolishError::Config("--threads must be at least 1".to_string()));
        }
        check_memory(&self.pilon_memory)?;
        check_input_file(&self.contigs, "contigs file")?;
        check_input_file(&self.long_reads, "long-read file")?;
        if let Some((short_1, short_2)) = &self.short_reads {
            check_input_file(short_1, "short-read file")?;
            check_input_file(short_2, "short-read file")?;
            if short_1 == short_2 {
                return Err(PolishError::Config("--short_1 and --short_2 must be different \
                                                files".to_string()));
            }
        }
        for dir in [&self.assemblies_dir, &self.output_dir] {
            if dir.exists() && !dir.is_dir() {
                return Err(PolishError::Config(format!("{} exists but is not a directory",
                                                       dir.display())));
            }
        }
        Ok(())
    }

    pub fn print_settings(&self) {
        eprintln!("Settings:");
        eprintln!("  --contigs {}", self.contigs.display());
        eprintln!("  --long_reads {}", self.long_reads.display());
        if let Some((short_1, short_2)) = &self.short_reads {
            eprintln!("  --short_1 {}", short_1.display());
            eprintln!("  --short_2 {}", short_2.display());
        }
        eprintln!("  --out_dir {}", self.output_dir.display());
        eprintln!("  --prefix {}", self.prefix);
        eprintln!("  --read_type {}", self.read_type);
        eprintln!("  --iterations {}", self.max_iterations);
        eprintln!("  --threads {}", self.threads);
        if let Some(model) = &self.medaka_model {
            eprintln!("  --medaka_model {}", model);
        }
        if self.short_reads_available() {
            if let Some(jar) = &self.pilon_jar {
                eprintln!("  --pilon_jar {}", jar.display());
            }
            eprintln!("  --pilon_memory {}", self.pilon_memory);
        }
        if self.resume { eprintln!("  --resume"); }
        if self.dry_run { eprintln!("  --dry_run"); }
        if self.clean_intermediate { eprintln!("  --clean"); }
        eprintln!();
    }
}


fn check_prefix(prefix: &str) -> PolishResult<()> {
    let re = Regex::new(r"^[A-Za-z0-9._-]+$").unwrap();
    if !re.is_match(prefix) {
        return Err(PolishError::Config(format!("--prefix '{}' can only contain letters, numbers, \
                                                '.', '_' and '-'", prefix)));
    }
    Ok(())
}


fn check_memory(memory: &str) -> PolishResult<()> {
    let re = Regex::new(r"^[1-9][0-9]*[KMGkmg]?$").unwrap();
    if !re.is_match(memory) {
        return Err(PolishError::Config(format!("--pilon_memory '{}' is not a valid Java heap \
                                                size (e.g. 16G)", memory)));
    }
    Ok(())
}


fn check_input_file(path: &PathBuf, description: &str) -> PolishResult<()> {
    if !path.is_file() {
        return Err(missing_file_error(path, description));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use crate::tests::make_test_file;

    fn valid_config(dir: &std::path::Path) -> RunConfig {
        let mut config = RunConfig::new("sample", dir.to_path_buf(), dir.join("out"));
        config.contigs = dir.join("contigs.fasta");
        config.long_reads = dir.join("reads.fastq");
        make_test_file(&config.contigs, ">a\nACGT\n");
        make_test_file(&config.long_reads, "@r\nACGT\n+\nIIII\n");
        config
    }

    #[test]
    fn test_paths() {
        let config = RunConfig::new("abc", PathBuf::from("work"), PathBuf::from("out"));
        assert_eq!(config.assemblies_dir, PathBuf::from("work/assemblies"));
        assert_eq!(config.final_assembly_path(), PathBuf::from("out/abc_final_assembly.fasta"));
        assert_eq!(config.log_path(), PathBuf::from("out/abc_polish.log"));
        assert_eq!(config.summary_path(), PathBuf::from("out/abc_polish.yaml"));
    }

    #[test]
    fn test_minimap2_preset() {
        assert_eq!(ReadType::Ont.minimap2_preset(), "map-ont");
        assert_eq!(ReadType::Pacbio.minimap2_preset(), "map-pb");
    }

    #[test]
    fn test_validate_good() {
        let temp_dir = tempdir().unwrap();
        let config = valid_config(temp_dir.path());
        assert!(config.validate().is_ok());
        assert!(!config.output_dir.exists());
        assert!(!config.assemblies_dir.exists());
    }

    #[test]
    fn test_validate_bad_numbers() {
        let temp_dir = tempdir().unwrap();
        let mut config = valid_config(temp_dir.path());
        config.max_iterations = 0;
        assert!(matches!(config.validate(), Err(PolishError::Config(_))));
        config.max_iterations = 2;
        config.threads = 0;
        assert!(matches!(config.validate(), Err(PolishError::Config(_))));
    }

    #[test]
    fn test_validate_missing_inputs() {
        let temp_dir = tempdir().unwrap();
        let mut config = valid_config(temp_dir.path());
        config.contigs = temp_dir.path().join("missing.fasta");
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("contigs file does not exist"));

        let mut config = valid_config(temp_dir.path());
        config.long_reads = temp_dir.path().to_path_buf();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("long-read file is not a file"));

        let mut config = valid_config(temp_dir.path());
        config.short_reads = Some((config.long_reads.clone(), temp_dir.path().join("r2.fq")));
        assert!(config.validate().is_err());

        let mut config = valid_config(temp_dir.path());
        config.short_reads = Some((config.long_reads.clone(), config.long_reads.clone()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_output_dir_is_file() {
        let temp_dir = tempdir().unwrap();
        let config = valid_config(temp_dir.path());
        make_test_file(&config.output_dir, "not a directory");
        assert!(config.validate().unwrap_err().to_string().contains("is not a directory"));
    }

    #[test]
    fn test_check_prefix() {
        assert!(check_prefix("sample_1").is_ok());
        assert!(check_prefix("E.coli-K12").is_ok());
        assert!(check_prefix("").is_err());
        assert!(check_prefix("a/b").is_err());
        assert!(check_prefix("a b").is_err());
    }

    #[test]
    fn test_check_memory() {
        assert!(check_memory("16G").is_ok());
        assert!(check_memory("500m").is_ok());
        assert!(check_memory("2048").is_ok());
        assert!(check_memory("0").is_err());
        assert!(check_memory("0G").is_err());
        assert!(check_memory("G").is_err());
        assert!(check_memory("16GB").is_err());
        assert!(check_memory("-4G").is_err());
    }
}
