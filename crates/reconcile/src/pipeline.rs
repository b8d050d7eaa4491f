//! Evaluate → Decode → Show → (State | Apply)*
//!
//! Each stage consumes the previous stage's output, so a stage can only run
//! once everything before it succeeded. The first failure ends the run and
//! nothing after it is attempted.

use std::fmt;
use std::path::Path;

use evaluator::Evaluator;

use crate::error::{Error, Result};
use crate::provider::ConfiguredProvider;
use crate::state::{self, ApplySummary, RawState, RealState, ReconciledState};

/// What to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    /// Inline template code
    Snippet(&'a str),
    /// Template file on disk
    File(&'a Path),
}

impl fmt::Display for Input<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Snippet(_) => write!(f, "<snippet>"),
            Input::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Evaluate,
    Decode,
    Show,
    State,
    Apply,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Evaluate => "evaluate",
            Stage::Decode => "decode",
            Stage::Show => "show",
            Stage::State => "state",
            Stage::Apply => "apply",
        };
        f.write_str(name)
    }
}

/// A step run after Show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Query live state
    State,
    /// Apply the reconciled state
    Apply,
}

impl Step {
    fn stage(self) -> Stage {
        match self {
            Step::State => Stage::State,
            Step::Apply => Stage::Apply,
        }
    }
}

/// Result of one [`Step`]
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    State(RealState),
    Apply(ApplySummary),
}

/// Everything a [`Pipeline::run`] produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Output of the Show stage
    pub reconciled: ReconciledState,
    /// One outcome per requested step, in order
    pub outcomes: Vec<StepOutcome>,
}

/// Receives stage transitions
///
/// All methods default to doing nothing.
pub trait Observer {
    /// Called before a stage runs
    fn on_stage_start(&mut self, _stage: Stage) {}

    /// Called after a stage succeeded
    fn on_stage_complete(&mut self, _stage: Stage) {}

    /// Called when a stage failed; the run ends right after
    fn on_stage_failed(&mut self, _stage: Stage, _error: &Error) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObserver;

impl Observer for NoObserver {}

/// One evaluator and one configured provider, wired together
#[derive(Clone, Copy)]
pub struct Pipeline<'a> {
    evaluator: &'a dyn Evaluator,
    provider: &'a ConfiguredProvider,
}

impl fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}

impl<'a> Pipeline<'a> {
    pub fn new(evaluator: &'a dyn Evaluator, provider: &'a ConfiguredProvider) -> Self {
        Self {
            evaluator,
            provider,
        }
    }

    /// The provider this pipeline feeds
    pub fn provider(&self) -> &'a ConfiguredProvider {
        self.provider
    }

    /// Evaluate `input` and decode the output (Evaluate + Decode)
    pub fn evaluate(&self, input: Input<'_>) -> Result<RawState> {
        self.evaluate_observed(input, &mut NoObserver)
    }

    /// Evaluate, decode and normalize `input`
    pub fn show(&self, input: Input<'_>) -> Result<ReconciledState> {
        self.show_observed(input, &mut NoObserver)
    }

    /// Query the live state behind `desired`
    pub fn state(&self, desired: &ReconciledState) -> Result<RealState> {
        observe(&mut NoObserver, Stage::State, || self.provider.state(desired))
    }

    /// Make the target system match `desired`
    pub fn apply(&self, desired: &ReconciledState) -> Result<ApplySummary> {
        observe(&mut NoObserver, Stage::Apply, || self.provider.apply(desired))
    }

    /// Run Show on `input`, then every step in order
    pub fn run(&self, input: Input<'_>, steps: &[Step]) -> Result<RunReport> {
        self.run_observed(input, steps, &mut NoObserver)
    }

    /// [`run`](Self::run), reporting stage transitions to `observer`
    pub fn run_observed<O: Observer + ?Sized>(
        &self,
        input: Input<'_>,
        steps: &[Step],
        observer: &mut O,
    ) -> Result<RunReport> {
        let reconciled = self.show_observed(input, observer)?;

        let mut outcomes = Vec::with_capacity(steps.len());
        for &step in steps {
            let outcome = observe(observer, step.stage(), || match step {
                Step::State => self.provider.state(&reconciled).map(StepOutcome::State),
                Step::Apply => self.provider.apply(&reconciled).map(StepOutcome::Apply),
            })?;
            outcomes.push(outcome);
        }

        Ok(RunReport {
            reconciled,
            outcomes,
        })
    }

    fn evaluate_observed<O: Observer + ?Sized>(
        &self,
        input: Input<'_>,
        observer: &mut O,
    ) -> Result<RawState> {
        let text = observe(observer, Stage::Evaluate, || {
            let output = match input {
                Input::Snippet(code) => self.evaluator.evaluate_anonymous_snippet(code),
                Input::File(path) => self.evaluator.evaluate_file(path),
            };
            output.map_err(Error::from)
        })?;

        observe(observer, Stage::Decode, || {
            state::decode(&text).map_err(|source| Error::Decode { source })
        })
    }

    fn show_observed<O: Observer + ?Sized>(
        &self,
        input: Input<'_>,
        observer: &mut O,
    ) -> Result<ReconciledState> {
        let raw = self.evaluate_observed(input, observer)?;
        observe(observer, Stage::Show, || self.provider.show(&raw))
    }
}

fn observe<T, O: Observer + ?Sized>(
    observer: &mut O,
    stage: Stage,
    run: impl FnOnce() -> Result<T>,
) -> Result<T> {
    log::debug!("stage {stage}: start");
    observer.on_stage_start(stage);
    match run() {
        Ok(value) => {
            log::debug!("stage {stage}: done");
            observer.on_stage_complete(stage);
            Ok(value)
        }
        Err(e) => {
            log::debug!("stage {stage}: failed: {e}");
            observer.on_stage_failed(stage, &e);
            Err(e)
        }
    }
}
