use crate::artifacts::{self, ArtifactPaths};
use crate::classifier::Predictor;
use crate::error::Result;
use crate::pipeline::ScoringPipeline;
use crate::report::write_scores;
use candle_core::Device;
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Print two class scores for a piece of text.
#[derive(Parser, Debug)]
#[command(name = "toxicity-scorer", version)]
pub struct Cli {
    /// Text to classify
    #[arg(
        required_unless_present = "stdin",
        conflicts_with = "stdin",
        allow_hyphen_values = true
    )]
    pub text: Option<String>,

    /// Classify every line read from standard input instead
    #[arg(long)]
    pub stdin: bool,

    /// Directory holding tokenizer.json, config.json and model.safetensors
    #[arg(long, env = "MODEL_PATH", default_value = ".")]
    pub model_dir: PathBuf,

    /// Tokenizer file, overrides the one in --model-dir
    #[arg(long)]
    pub tokenizer: Option<PathBuf>,

    /// Model config file, overrides the one in --model-dir
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Model weights file, overrides the one in --model-dir
    #[arg(long)]
    pub weights: Option<PathBuf>,
}

impl Cli {
    pub fn artifact_paths(&self) -> ArtifactPaths {
        let defaults = ArtifactPaths::in_dir(&self.model_dir);
        ArtifactPaths {
            tokenizer: self.tokenizer.clone().unwrap_or(defaults.tokenizer),
            config: self.config.clone().unwrap_or(defaults.config),
            weights: self.weights.clone().unwrap_or(defaults.weights),
        }
    }

    pub fn run(self) -> Result<()> {
        let (encoder, classifier) = artifacts::load(&self.artifact_paths(), &Device::Cpu)?;
        let pipeline = ScoringPipeline::new(encoder, classifier);

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        match self.text {
            Some(text) => write_scores(&mut out, &pipeline.score(&text)?)?,
            None => {
                let count = score_lines(&pipeline, std::io::stdin().lock(), &mut out)?;
                tracing::info!("scored {} lines", count);
            }
        }
        out.flush()?;
        Ok(())
    }
}

/// Write one score line per input line, stopping at the first failure.
pub fn score_lines<P, R, W>(
    pipeline: &ScoringPipeline<P>,
    input: R,
    output: &mut W,
) -> Result<usize>
where
    P: Predictor,
    R: BufRead,
    W: Write,
{
    let mut count = 0;
    for line in input.lines() {
        let scores = pipeline.score(&line?)?;
        write_scores(output, &scores)?;
        output.flush()?;
        count += 1;
    }
    Ok(count)
}
