// This file contains the code that turns each polishing stage into the external commands it runs,
// and the code for finding those external programs.

// Copyright 2024 Ryan Wick (rrwick@gmail.com)

// This file is part of Autopolish. Autopolish is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version. Autopolish
// is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details. You should have received a copy of the GNU General Public
// License along with Autopolish. If not, see <http://www.gnu.org/licenses/>.

use std::fs::read_dir;
use std::path::{Path, PathBuf};

use crate::command::{CommandRunner, ExternalCommand};
use crate::config::RunConfig;
use crate::error::{PolishError, PolishResult};
use crate::misc::partial_path;
use crate::stage::Stage;


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Promotion {
    Move,  // the tool's output file is renamed to the stage output path
    Copy,  // the tool's output file is copied (it lives in a tool-owned directory)
}


/// Everything needed to carry out one stage.
#[derive(Clone, Debug)]
pub struct StagePlan {
    pub stage: Stage,
    pub dir: PathBuf,
    pub output: PathBuf,
    pub staged_inputs: Vec<(PathBuf, PathBuf)>,  // files copied into the stage directory first
    pub commands: Vec<ExternalCommand>,
    pub produced: PathBuf,
    pub promotion: Promotion,
}


pub fn plan_stage(stage: Stage, config: &RunConfig, input: &Path,
                  runner: &dyn CommandRunner) -> PolishResult<StagePlan> {
    match stage {
        Stage::Racon(_) => Ok(racon_plan(stage, config, input)),
        Stage::Medaka   => Ok(medaka_plan(config, input)),
        Stage::Pilon(_) => {
            let pilon = find_pilon(config, runner)?;
            pilon_plan(stage, config, input, &pilon)
        }
    }
}


fn racon_plan(stage: Stage, config: &RunConfig, input: &Path) -> StagePlan {
    // Long reads are aligned to the current assembly with minimap2, then Racon makes a consensus
    // from those alignments.
    let dir = stage.stage_dir(config);
    let output = stage.output_path(config);
    let paf = dir.join(format!("{}_{}.paf", config.prefix, stage.dir_name()));
    let produced = partial_path(&output);
    let minimap2 = ExternalCommand::new("minimap2")
        .arg("-t").arg(config.threads)
        .arg("-x").arg(config.read_type.minimap2_preset())
        .path(input).path(&config.long_reads)
        .stdout_to(&paf);
    let racon = ExternalCommand::new("racon")
        .arg("-t").arg(config.threads)
        .path(&config.long_reads).path(&paf).path(input)
        .stdout_to(&produced);
    StagePlan { stage, dir, output, staged_inputs: vec![], commands: vec![minimap2, racon],
                produced, promotion: Promotion::Move }
}


fn medaka_plan(config: &RunConfig, input: &Path) -> StagePlan {
    let stage = Stage::Medaka;
    let dir = stage.stage_dir(config);
    let medaka_dir = dir.join("medaka_out");
    let mut medaka = ExternalCommand::new("medaka_consensus")
        .arg("-i").path(&config.long_reads)
        .arg("-d").path(input)
        .arg("-o").path(&medaka_dir)
        .arg("-t").arg(config.threads);
    if let Some(model) = &config.medaka_model {
        medaka = medaka.arg("-m").arg(model);
    }
    StagePlan { stage, output: stage.output_path(config), dir, staged_inputs: vec![],
                commands: vec![medaka], produced: medaka_dir.join("consensus.fasta"),
                promotion: Promotion::Copy }
}


fn pilon_plan(stage: Stage, config: &RunConfig, input: &Path,
              pilon: &PilonLauncher) -> PolishResult<StagePlan> {
    // The assembly is copied into the stage directory so the BWA index files are written there
    // and not next to the previous stage's output.
    let (short_1, short_2) = config.short_reads.as_ref()
        .ok_or_else(|| PolishError::Config("Pilon polishing requires short reads".to_string()))?;
    let dir = stage.stage_dir(config);
    let assembly = dir.join("assembly.fasta");
    let sam = dir.join("alignments.sam");
    let bam = dir.join("alignments.bam");
    let commands = vec![
        ExternalCommand::new("bwa").arg("index").path(&assembly),
        ExternalCommand::new("bwa").arg("mem").arg("-t").arg(config.threads)
            .path(&assembly).path(short_1).path(short_2)
            .stdout_to(&sam),
        ExternalCommand::new("samtools").arg("sort").arg("-@").arg(config.threads)
            .arg("-o").path(&bam).path(&sam),
        ExternalCommand::new("samtools").arg("index").path(&bam),
        pilon.command(&config.pilon_memory)
            .arg("--genome").path(&assembly)
            .arg("--frags").path(&bam)
            .arg("--output").arg("pilon_consensus")
            .arg("--outdir").path(&dir)
            .arg("--threads").arg(config.threads),
    ];
    Ok(StagePlan { stage, output: stage.output_path(config),
                   staged_inputs: vec![(input.to_path_buf(), assembly)],
                   commands, produced: dir.join("pilon_consensus.fasta"), dir,
                   promotion: Promotion::Move })
}


#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PilonLauncher {
    Wrapper(PathBuf),  // a 'pilon' executable (e.g. the Bioconda wrapper script)
    Jar(PathBuf),      // a Pilon jar run with java
}

impl PilonLauncher {
    fn command(&self, memory: &str) -> ExternalCommand {
        let heap = format!("-Xmx{}", memory);
        match self {
            PilonLauncher::Wrapper(path) => ExternalCommand::new(&path.display().to_string())
                .arg(heap),
            PilonLauncher::Jar(jar) => ExternalCommand::new("java").arg(heap)
                .arg("-jar").path(jar),
        }
    }
}


pub fn find_pilon(config: &RunConfig, runner: &dyn CommandRunner) -> PolishResult<PilonLauncher> {
    // An explicitly given jar is the only candidate. Otherwise a 'pilon' executable in $PATH is
    // preferred over a jar in the active Conda environment.
    if let Some(jar) = &config.pilon_jar {
        if !jar.is_file() {
            return Err(PolishError::MissingResource(format!("Pilon jar not found: {}",
                                                            jar.display())));
        }
        return jar_launcher(jar.clone(), runner);
    }
    if let Some(wrapper) = runner.find_program("pilon") {
        return Ok(PilonLauncher::Wrapper(wrapper));
    }
    let conda_jar = std::env::var_os("CONDA_PREFIX")
        .and_then(|prefix| find_conda_pilon_jar(Path::new(&prefix)));
    match conda_jar {
        Some(jar) => jar_launcher(jar, runner),
        None => Err(PolishError::MissingResource("Pilon not found: no 'pilon' in $PATH and no \
                                                  Pilon jar in $CONDA_PREFIX/share".to_string())),
    }
}


fn jar_launcher(jar: PathBuf, runner: &dyn CommandRunner) -> PolishResult<PilonLauncher> {
    if runner.find_program("java").is_none() {
        return Err(PolishError::MissingResource(format!("found Pilon jar {} but 'java' is not \
                                                         in $PATH", jar.display())));
    }
    Ok(PilonLauncher::Jar(jar))
}


pub fn find_conda_pilon_jar(conda_prefix: &Path) -> Option<PathBuf> {
    // Bioconda installs Pilon as share/pilon-<version>/pilon.jar (or pilon-<version>.jar). If
    // there are several, the last one by name is used.
    let mut jars = Vec::new();
    for share_entry in read_dir(conda_prefix.join("share")).ok()?.flatten() {
        let share_path = share_entry.path();
        let dir_name = share_entry.file_name().to_string_lossy().to_string();
        if !share_path.is_dir() || !dir_name.starts_with("pilon") {
            continue;
        }
        let Ok(entries) = read_dir(&share_path) else { continue; };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with("pilon") && name.ends_with(".jar") && entry.path().is_file() {
                jars.push(entry.path());
            }
        }
    }
    jars.sort();
    jars.pop()
}


pub fn check_requirements(config: &RunConfig, runner: &dyn CommandRunner) -> PolishResult<()> {
    // Pilon is not checked here: if it can't be found, the Pilon stages are skipped with a warning
    // instead of the run failing.
    let mut required = vec!["minimap2", "racon", "medaka_consensus"];
    if config.short_reads_available() {
        required.extend(["bwa", "samtools"]);
    }
    for program in required {
        if runner.find_program(program).is_none() {
            return Err(PolishError::Config(format!("required program '{}' not found in $PATH",
                                                   program)));
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;
    use crate::config::ReadType;
    use crate::tests::{make_test_file, ScriptedRunner};

    fn test_config(dir: &Path) -> RunConfig {
        let mut config = RunConfig::new("s", dir.to_path_buf(), dir.join("out"));
        config.threads = 4;
        config.long_reads = PathBuf::from("reads.fq");
        config.short_reads = Some((PathBuf::from("r1.fq"), PathBuf::from("r2.fq")));
        config
    }

    #[test]
    fn test_racon_plan() {
        let mut config = test_config(Path::new("w"));
        config.read_type = ReadType::Pacbio;
        let plan = racon_plan(Stage::Racon(2), &config, Path::new("in.fasta"));
        assert_eq!(plan.dir, PathBuf::from("w/assemblies/racon_iter2"));
        assert_eq!(plan.commands.len(), 2);
        assert_eq!(plan.commands[0].to_string(),
                   "minimap2 -t 4 -x map-pb in.fasta reads.fq > \
                    w/assemblies/racon_iter2/s_racon_iter2.paf");
        assert_eq!(plan.commands[1].to_string(),
                   "racon -t 4 reads.fq w/assemblies/racon_iter2/s_racon_iter2.paf in.fasta > \
                    w/assemblies/racon_iter2/s_racon_iter2.fasta.partial");
        assert_eq!(plan.produced, partial_path(&plan.output));
        assert_eq!(plan.promotion, Promotion::Move);
    }

    #[test]
    fn test_medaka_plan() {
        let mut config = test_config(Path::new("w"));
        let plan = medaka_plan(&config, Path::new("in.fasta"));
        assert_eq!(plan.commands[0].to_string(),
                   "medaka_consensus -i reads.fq -d in.fasta -o w/assemblies/medaka/medaka_out \
                    -t 4");
        assert_eq!(plan.produced, PathBuf::from("w/assemblies/medaka/medaka_out/consensus.fasta"));
        assert_eq!(plan.output, PathBuf::from("w/assemblies/medaka/s_medaka_consensus.fasta"));
        assert_eq!(plan.promotion, Promotion::Copy);

        config.medaka_model = Some("r1041_e82_400bps_sup_v5.0.0".to_string());
        let plan = medaka_plan(&config, Path::new("in.fasta"));
        assert!(plan.commands[0].to_string().ends_with("-t 4 -m r1041_e82_400bps_sup_v5.0.0"));
    }

    #[test]
    fn test_pilon_plan() {
        let config = test_config(Path::new("w"));
        let pilon = PilonLauncher::Jar(PathBuf::from("/opt/pilon.jar"));
        let plan = pilon_plan(Stage::Pilon(1), &config, Path::new("in.fasta"), &pilon).unwrap();
        let commands: Vec<String> = plan.commands.iter().map(|c| c.to_string()).collect();
        assert_eq!(commands, vec![
            "bwa index w/assemblies/pilon_iter1/assembly.fasta",
            "bwa mem -t 4 w/assemblies/pilon_iter1/assembly.fasta r1.fq r2.fq > \
             w/assemblies/pilon_iter1/alignments.sam",
            "samtools sort -@ 4 -o w/assemblies/pilon_iter1/alignments.bam \
             w/assemblies/pilon_iter1/alignments.sam",
            "samtools index w/assemblies/pilon_iter1/alignments.bam",
            "java -Xmx16G -jar /opt/pilon.jar --genome w/assemblies/pilon_iter1/assembly.fasta \
             --frags w/assemblies/pilon_iter1/alignments.bam --output pilon_consensus \
             --outdir w/assemblies/pilon_iter1 --threads 4"]);
        assert_eq!(plan.staged_inputs, vec![(PathBuf::from("in.fasta"),
                                             PathBuf::from("w/assemblies/pilon_iter1/assembly.fasta"))]);
        assert_eq!(plan.produced, PathBuf::from("w/assemblies/pilon_iter1/pilon_consensus.fasta"));
        assert_eq!(plan.output, PathBuf::from("w/assemblies/pilon_iter1/s_pilon_iter1.fasta"));

        let wrapper = PilonLauncher::Wrapper(PathBuf::from("/usr/bin/pilon"));
        let plan = pilon_plan(Stage::Pilon(2), &config, Path::new("in.fasta"), &wrapper).unwrap();
        assert!(plan.commands[4].to_string().starts_with("/usr/bin/pilon -Xmx16G --genome "));
    }

    #[test]
    fn test_find_pilon_explicit_jar() {
        let temp_dir = tempdir().unwrap();
        let mut config = test_config(temp_dir.path());
        let jar = temp_dir.path().join("pilon-1.24.jar");
        config.pilon_jar = Some(jar.clone());
        let runner = ScriptedRunner::new(HashSet::from(["java", "pilon"]));

        // A missing explicit jar doesn't fall back to the wrapper.
        let result = find_pilon(&config, &runner);
        assert!(matches!(result, Err(PolishError::MissingResource(_))));

        make_test_file(&jar, "jar");
        assert_eq!(find_pilon(&config, &runner).unwrap(), PilonLauncher::Jar(jar.clone()));

        let no_java = ScriptedRunner::new(HashSet::from(["pilon"]));
        assert!(find_pilon(&config, &no_java).unwrap_err().is_recoverable());
    }

    #[test]
    fn test_find_pilon_wrapper() {
        let config = test_config(Path::new("w"));
        let runner = ScriptedRunner::new(HashSet::from(["pilon"]));
        assert_eq!(find_pilon(&config, &runner).unwrap(),
                   PilonLauncher::Wrapper(PathBuf::from("/fake/bin/pilon")));
    }

    #[test]
    fn test_find_conda_pilon_jar() {
        let temp_dir = tempdir().unwrap();
        let prefix = temp_dir.path();
        assert_eq!(find_conda_pilon_jar(prefix), None);

        std::fs::create_dir_all(prefix.join("share").join("pilon-1.23-2")).unwrap();
        std::fs::create_dir_all(prefix.join("share").join("pilon-1.24-0")).unwrap();
        std::fs::create_dir_all(prefix.join("share").join("racon")).unwrap();
        assert_eq!(find_conda_pilon_jar(prefix), None);

        let old_jar = prefix.join("share").join("pilon-1.23-2").join("pilon.jar");
        let new_jar = prefix.join("share").join("pilon-1.24-0").join("pilon.jar");
        make_test_file(&old_jar, "jar");
        make_test_file(&prefix.join("share").join("racon").join("pilon.jar"), "not pilon");
        assert_eq!(find_conda_pilon_jar(prefix), Some(old_jar));
        make_test_file(&new_jar, "jar");
        assert_eq!(find_conda_pilon_jar(prefix), Some(new_jar));
    }

    #[test]
    fn test_check_requirements() {
        let mut config = test_config(Path::new("w"));
        let long_only = ScriptedRunner::new(HashSet::from(["minimap2", "racon",
                                                           "medaka_consensus"]));
        assert!(check_requirements(&config, &long_only).is_err());
        config.short_reads = None;
        assert!(check_requirements(&config, &long_only).is_ok());

        let no_racon = ScriptedRunner::new(HashSet::from(["minimap2", "medaka_consensus"]));
        let err = check_requirements(&config, &no_racon).unwrap_err();
        assert_eq!(err.to_string(), "required program 'racon' not found in $PATH");
    }
}
