//! Environment workflow
//!
//! - `show` - Print the provider's normalized form
//! - `diff` - Preview what apply would change
//! - `apply` - Make the target system match

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use evaluator::Evaluator;
use reconcile::{
    ChangeKind, ConfiguredProvider, DiffSummary, Input, Observer, Pipeline, ReconciledState,
    Registry, ResourceDiff, Stage, Step, StepOutcome, compute_diffs,
};

use crate::Context;
use crate::cli::{ApplyArgs, EnvArgs};
use crate::config::Environment;
use crate::paths;
use crate::ui;

// ============================================================================
// Session
// ============================================================================

/// An environment wired to its evaluator and provider
struct Session {
    env: Environment,
    evaluator: Box<dyn Evaluator>,
    provider: ConfiguredProvider,
}

impl Session {
    fn open(registry: &Registry, args: &EnvArgs) -> Result<Self> {
        let env = Environment::load(&args.env)?;
        let evaluation = &env.config.evaluation;

        let provider_config = env.config.provider.as_ref().with_context(|| {
            format!(
                "No [provider] section in {} (available: {})",
                env.dir.join(crate::config::CONFIG_FILE).display(),
                registry.names().join(", ")
            )
        })?;
        let settings = provider_config.settings_value()?;
        let provider = registry.hydrate(&provider_config.name, &settings)?;

        let request =
            super::build_request(evaluation, &env.import_roots(), &env.dir, &args.evaluation)?;
        let backend = super::make_backend(
            args.evaluation.backend.unwrap_or(evaluation.backend),
            paths::interpreter(
                args.evaluation.jsonnet.as_deref(),
                evaluation.binary.as_deref(),
            ),
        );
        log::debug!(
            "Environment {} with backend {} and provider {}",
            env.dir.display(),
            backend.name(),
            provider.name()
        );
        let evaluator = backend.make_evaluator(request);

        Ok(Self {
            env,
            evaluator,
            provider,
        })
    }

    fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(self.evaluator.as_ref(), &self.provider)
    }

    /// Run Show followed by `steps`
    fn run(&self, steps: &[Step]) -> Result<(ReconciledState, Vec<StepOutcome>)> {
        let report = self.pipeline().run_observed(
            Input::File(&self.env.entrypoint),
            steps,
            &mut LogObserver,
        )?;
        Ok((report.reconciled, report.outcomes))
    }

    /// Show and State, then compare
    fn diff(&self) -> Result<(ReconciledState, Vec<ResourceDiff>)> {
        let (desired, outcomes) = self.run(&[Step::State])?;
        let real = match outcomes.into_iter().next() {
            Some(StepOutcome::State(real)) => real,
            _ => anyhow::bail!("State step produced no live state"),
        };
        let diffs = compute_diffs(&desired, &real);
        Ok((desired, diffs))
    }
}

/// Logs stage transitions
struct LogObserver;

impl Observer for LogObserver {
    fn on_stage_start(&mut self, stage: Stage) {
        log::info!("{stage}...");
    }

    fn on_stage_failed(&mut self, stage: Stage, error: &reconcile::Error) {
        log::debug!("{stage} failed: {error}");
    }
}

// ============================================================================
// Commands
// ============================================================================

pub fn show(_ctx: &Context, registry: &Registry, args: &EnvArgs) -> Result<()> {
    let session = Session::open(registry, args)?;
    let (desired, _) = session.run(&[])?;
    println!("{}", serde_json::to_string_pretty(desired.value())?);
    Ok(())
}

pub fn diff(ctx: &Context, registry: &Registry, args: &EnvArgs) -> Result<()> {
    let session = Session::open(registry, args)?;
    let (_, diffs) = session.diff()?;
    display_diff(ctx, &diffs);
    Ok(())
}

pub fn apply(ctx: &Context, registry: &Registry, args: &ApplyArgs) -> Result<()> {
    let session = Session::open(registry, &args.env)?;
    let (desired, diffs) = session.diff()?;
    display_diff(ctx, &diffs);

    if !DiffSummary::from_diffs(&diffs).has_changes() {
        return Ok(());
    }

    if !args.auto_approve && !confirm_proceed()? {
        ui::warn("Apply cancelled");
        return Ok(());
    }

    let summary = session.pipeline().apply(&desired)?;
    ui::success(&format!(
        "Applied to {}: {} created, {} modified, {} unchanged",
        session.provider.name(),
        summary.created,
        summary.modified,
        summary.unchanged
    ));
    Ok(())
}

// ============================================================================
// Display
// ============================================================================

/// Display a list of diffs in a user-friendly format
fn display_diff(ctx: &Context, diffs: &[ResourceDiff]) {
    let summary = DiffSummary::from_diffs(diffs);
    if !summary.has_changes() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    ui::header("Changes");
    for diff in diffs {
        let symbol = match diff.kind {
            ChangeKind::Added => "+".green(),
            ChangeKind::Modified => "~".yellow(),
            ChangeKind::Unchanged => {
                if ctx.verbose > 0 {
                    println!("  {} {}", "=".dimmed(), diff.id.dimmed());
                }
                continue;
            }
        };
        println!("  {} {}", symbol, diff.id);
        if !ctx.quiet {
            ui::unified_diff(&diff.unified());
        }
    }

    println!();
    println!(
        "Summary: {} ({} to add, {} to modify, {} unchanged)",
        ui::plural(summary.total(), "change").bold(),
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.unchanged
    );
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Apply these changes?")
        .default(false)
        .interact()?;

    Ok(confirmed)
}
