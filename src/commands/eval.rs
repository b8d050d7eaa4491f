//! `strata eval` - evaluate templates and print JSON

use std::path::{Path, PathBuf};

use anyhow::{Context as AnyhowContext, Result, bail};
use rayon::prelude::*;

use crate::Context;
use crate::cli::EvalArgs;
use crate::config::EvaluationConfig;
use crate::paths;
use crate::ui;

pub fn run(ctx: &Context, args: EvalArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    let evaluation = &args.evaluation;

    let request = super::build_request(&EvaluationConfig::default(), &[], &cwd, evaluation)?;
    let backend = super::make_backend(
        evaluation.backend.unwrap_or_default(),
        paths::interpreter(evaluation.jsonnet.as_deref(), None),
    );
    let evaluator = backend.make_evaluator(request);

    if let Some(code) = &args.exec {
        let output = evaluator.evaluate_anonymous_snippet(code)?;
        print!("{output}");
        return Ok(());
    }

    let results = evaluate_all(&args.files, args.jobs, |file| evaluator.evaluate_file(file))?;

    let mut failed = 0;
    for (file, result) in args.files.iter().zip(results) {
        match result {
            Ok(output) => {
                if args.files.len() > 1 && !ctx.quiet {
                    eprintln!("// {}", file.display());
                }
                print!("{output}");
            }
            Err(e) => {
                failed += 1;
                ui::error(&e.to_string());
            }
        }
    }

    if failed > 0 {
        bail!(
            "{} of {} failed to evaluate",
            failed,
            ui::plural(args.files.len(), "file")
        );
    }
    Ok(())
}

/// Evaluate `files` on a pool of `jobs` threads, keeping input order
fn evaluate_all<T, F>(files: &[PathBuf], jobs: usize, evaluate: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&Path) -> T + Sync,
{
    if jobs <= 1 || files.len() == 1 {
        return Ok(files.iter().map(|f| evaluate(f)).collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    Ok(pool.install(|| files.par_iter().map(|f| evaluate(f)).collect()))
}
