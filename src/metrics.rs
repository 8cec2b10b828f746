// This file contains the code for writing Autopolish's YAML summary of a run.

// Copyright 2024 Ryan Wick (rrwick@gmail.com)

// This file is part of Autopolish. Autopolish is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. Autopolish
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with Autopolish. If not, see <http://www.gnu.org/licenses/>.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{ReadType, RunConfig};
use crate::error::PolishResult;
use crate::misc::assembly_stats;
use crate::pipeline::PipelineSummary;


#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct StageMetrics {
    pub stage: String,
    pub status: String,
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub contig_count: Option<usize>,
    pub total_length: Option<u64>,
}


#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct PolishMetrics {
    pub prefix: String,
    pub read_type: ReadType,
    pub iterations: usize,
    pub short_read_polishing: bool,
    pub resumed_from: Option<String>,
    pub input_contig_count: usize,
    pub input_total_length: u64,
    pub stages: Vec<StageMetrics>,
    pub final_assembly: PathBuf,
    pub final_contig_count: usize,
    pub final_total_length: u64,
}

impl PolishMetrics {
    pub fn new(config: &RunConfig, summary: &PipelineSummary) -> PolishResult<Self> {
        let (input_contig_count, input_total_length) = assembly_stats(&config.contigs)?;
        let (final_contig_count, final_total_length) =
            assembly_stats(&summary.published_assembly)?;
        let mut stages = Vec::new();
        for record in &summary.records {
            let output = record.outcome.output().map(Path::to_path_buf);
            let stats = match &output {
                Some(path) if path.is_file() => Some(assembly_stats(path)?),
                _ => None,
            };
            stages.push(StageMetrics { stage: record.stage.to_string(),
                                       status: record.outcome.status().to_string(),
                                       input: record.input.clone(),
                                       output,
                                       contig_count: stats.map(|s| s.0),
                                       total_length: stats.map(|s| s.1) });
        }
        Ok(PolishMetrics {
            prefix: config.prefix.clone(),
            read_type: config.read_type,
            iterations: config.max_iterations,
            short_read_polishing: config.short_reads_available(),
            resumed_from: summary.resumed_from.map(|s| s.to_string()),
            input_contig_count, input_total_length, stages,
            final_assembly: summary.published_assembly.clone(),
            final_contig_count, final_total_length,
        })
    }

    pub fn save_to_yaml(&self, filename: &Path) -> PolishResult<()> {
        save_yaml(filename, self)
            .with_context(|| format!("failed to write {}", filename.display()))?;
        Ok(())
    }
}


fn save_yaml<T: Serialize>(yaml_filename: &Path, data: T) -> anyhow::Result<()> {
    let yaml_string = serde_yaml::to_string(&data)?;
    let mut file = File::create(yaml_filename)?;
    file.write_all(yaml_string.as_bytes())?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::read_to_string;
    use tempfile::tempdir;
    use crate::pipeline::Pipeline;
    use crate::tests::{make_stage_output, test_run_config, ScriptedRunner};
    use crate::stage::Stage;

    #[test]
    fn test_metrics_from_run() {
        let temp_dir = tempdir().unwrap();
        let mut config = test_run_config(temp_dir.path(), 2, false);
        config.resume = true;
        make_stage_output(&config, Stage::Racon(1));
        let mut runner = ScriptedRunner::default();
        let summary = Pipeline::new(&config, &mut runner).run().unwrap();
        let metrics = PolishMetrics::new(&config, &summary).unwrap();

        assert_eq!(metrics.input_contig_count, 2);
        assert_eq!(metrics.input_total_length, 16);
        assert_eq!(metrics.resumed_from, Some("Racon iteration 1".to_string()));
        let statuses: Vec<&str> = metrics.stages.iter().map(|s| s.status.as_str()).collect();
        assert_eq!(statuses, vec!["already complete", "executed", "executed"]);
        assert_eq!(metrics.stages[2].stage, "Medaka");
        assert_eq!(metrics.stages[2].contig_count, Some(1));
        assert_eq!(metrics.final_contig_count, 1);
        assert_eq!(metrics.final_total_length, 10);
        assert!(!metrics.short_read_polishing);
    }

    #[test]
    fn test_save_to_yaml() {
        let temp_dir = tempdir().unwrap();
        let config = test_run_config(temp_dir.path(), 1, false);
        let mut runner = ScriptedRunner::default();
        let summary = Pipeline::new(&config, &mut runner).run().unwrap();
        let metrics = PolishMetrics::new(&config, &summary).unwrap();
        metrics.save_to_yaml(&config.summary_path()).unwrap();

        let text = read_to_string(config.summary_path()).unwrap();
        assert!(text.contains("prefix: test"));
        assert!(text.contains("read_type: ont"));
        let loaded: PolishMetrics = serde_yaml::from_str(&text).unwrap();
        assert_eq!(loaded, metrics);
    }
}
