mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use memmap2::Mmap;
use rayon::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

use cli::{Cli, FileReport};
use imgprobe::{
    ImageFormat, ProbeConfig, ProbeError, SizeResult, probe_buffer_with, probe_stream_with,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_tracing(cli.verbose, cli.debug);

    let formats = cli::parse_formats(cli.types.clone());
    let reports = if cli.stream {
        let config = ProbeConfig::new()
            .with_read_chunk_size(cli.chunk_size)
            .with_formats(formats);
        probe_streaming(&cli.files, &config)?
    } else {
        probe_mapped(&cli.files, &formats)
    };

    let mut failures = 0usize;
    for report in &reports {
        report.print(cli.json)?;
        if !report.is_ok() {
            failures += 1;
        }
    }

    if failures > 0 {
        debug!(failures, "some files were not recognized");
        std::process::exit(1);
    }
    Ok(())
}

fn probe_mapped(files: &[PathBuf], formats: &[ImageFormat]) -> Vec<FileReport> {
    files
        .par_iter()
        .map(|path| FileReport::new(path, probe_mapped_file(path, formats)))
        .collect()
}

fn probe_mapped_file(path: &Path, formats: &[ImageFormat]) -> Result<SizeResult> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let length = file.metadata()?.len();
    if length == 0 {
        return Err(ProbeError::Unrecognized.into());
    }

    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to memory-map {}", path.display()))?;
    let result = probe_buffer_with(&map, formats).ok_or(ProbeError::Unrecognized)?;
    Ok(result.with_length(length))
}

fn probe_streaming(files: &[PathBuf], config: &ProbeConfig) -> Result<Vec<FileReport>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    Ok(runtime.block_on(async {
        let mut reports = Vec::with_capacity(files.len());
        for path in files {
            let outcome = probe_streamed_file(path, config).await;
            reports.push(FileReport::new(path, outcome));
        }
        reports
    }))
}

async fn probe_streamed_file(path: &Path, config: &ProbeConfig) -> Result<SizeResult> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let length = file.metadata().await?.len();
    let result = probe_stream_with(file, config).await?;
    Ok(result.with_length(length))
}
