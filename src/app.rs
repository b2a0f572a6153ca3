//! ppgcheck application.
//!
//! This module contains a top-level structure [`App`] that represents the whole
//! ppgcheck application. It reads the input files, runs the synchronous
//! pipeline on them and writes the results.

use crate::{
    args::{Args, Command},
    config::PipelineConfig,
    pipeline::Pipeline,
    report,
    trace::{self, PeakDump, ReferenceTrace},
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// ppgcheck application.
#[derive(Debug)]
pub struct App {
    pipeline: Pipeline,
    command: Command,
}

impl App {
    /// Creates a new application.
    ///
    /// The configuration file given in the arguments, if any, is read, and the
    /// settings given on the command line are applied on top of it.
    #[tracing::instrument(name = "App::new", level = "debug")]
    pub async fn new(args: &Args) -> Result<App> {
        let mut config = match &args.config {
            Some(path) => {
                let json = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
                PipelineConfig::from_json(&json)
                    .with_context(|| format!("invalid configuration in {}", path.display()))?
            }
            None => PipelineConfig::default(),
        };
        args.overrides.apply(&mut config);
        tracing::debug!(?config, "pipeline configuration");
        Ok(App {
            pipeline: Pipeline::new(config)?,
            command: args.command.clone(),
        })
    }

    /// Runs the application.
    #[tracing::instrument(name = "App::run", level = "debug", skip_all)]
    pub async fn run(self) -> Result<()> {
        match &self.command {
            Command::Compare {
                trace,
                report,
                series,
            } => self.compare(trace, report.as_deref(), series.as_deref()).await,
            Command::Filter { input, output } => self.filter(input, output.as_deref()).await,
            Command::Peaks { dump, report } => self.peaks(dump, report.as_deref()).await,
        }
    }

    async fn compare(
        &self,
        path: &Path,
        report: Option<&Path>,
        series: Option<&Path>,
    ) -> Result<()> {
        let trace = ReferenceTrace::from_reader(&read(path).await?[..])
            .with_context(|| format!("failed to load reference trace {}", path.display()))?;
        let comparison = self.pipeline.run(&trace)?;
        let json = report::compare_report(&comparison, &trace, self.pipeline.config());
        report::log_summary(&json);
        output(report, report::to_json(&json)?.into_bytes()).await?;
        if let Some(series) = series {
            let mut csv = Vec::new();
            report::write_series(&mut csv, &comparison)?;
            output(Some(series), csv).await?;
        }
        Ok(())
    }

    async fn filter(&self, path: &Path, out: Option<&Path>) -> Result<()> {
        let input = trace::read_input(&read(path).await?[..])
            .with_context(|| format!("failed to load input vector {}", path.display()))?;
        let (filtered, _) = self.pipeline.filter(&input)?;
        tracing::info!(samples = input.len(), "filtered input vector");
        let mut csv = Vec::new();
        report::write_filtered(&mut csv, &input, &filtered)?;
        output(out, csv).await
    }

    async fn peaks(&self, path: &Path, report: Option<&Path>) -> Result<()> {
        let dump = PeakDump::from_reader(&read(path).await?[..])
            .with_context(|| format!("failed to load peak dump {}", path.display()))?;
        let comparison = self.pipeline.compare_peaks(&dump);
        let json = report::peaks_report(&comparison, dump.index.len(), self.pipeline.config());
        report::log_peaks_summary(&json);
        output(report, report::to_json(&json)?.into_bytes()).await
    }
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

// Writes to a file, or to stdout if no file is given.
async fn output(path: Option<&Path>, contents: Vec<u8>) -> Result<()> {
    match path {
        Some(path) => {
            tokio::fs::write(path, contents)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&contents).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
