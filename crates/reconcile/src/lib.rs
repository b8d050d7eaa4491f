//! # reconcile
//!
//! Turns evaluated templates into changes on a target system.
//!
//! ## Core Concepts
//!
//! - **RawState**: the decoded evaluation output, a plain value tree
//! - **Provider**: adapter for one target system (Show, State, Apply)
//! - **ReconciledState**: a provider's normal form of a RawState
//! - **RealState**: live state, limited to what a ReconciledState manages
//! - **Pipeline**: Evaluate → Decode → Show → (State | Apply)*, fail-fast
//! - **Registry**: read-only name → constructor map, built once at startup
//!
//! ## Example
//!
//! ```ignore
//! use evaluator::{EvaluationBackend, EvaluationRequest, InProcessBackend};
//! use reconcile::{Input, Pipeline, Registry, Step};
//!
//! let registry = Registry::builder().register("echo", echo).build()?;
//! let provider = registry.hydrate("echo", &serde_json::json!({}))?;
//! let evaluator = InProcessBackend.make_evaluator(EvaluationRequest::default());
//!
//! let report = Pipeline::new(evaluator.as_ref(), &provider)
//!     .run(Input::Snippet("{\"a\": 1}"), &[Step::Apply, Step::State])?;
//! ```
//!
//! Provider implementations return `anyhow` errors; the pipeline wraps them
//! in [`Error`] tagged with the failing [`Stage`].

pub mod diff;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod provider;
pub mod registry;
pub mod state;
pub mod subset;

pub use diff::{ChangeKind, DiffSummary, ResourceDiff, compute_diffs};
pub use error::{BoxError, Error, Result};
pub use extract::{ExtractError, Manifests, extract};
pub use pipeline::{Input, NoObserver, Observer, Pipeline, RunReport, Stage, Step, StepOutcome};
pub use provider::{BoxedProvider, ConfiguredProvider, Provider, settings};
pub use registry::{Constructor, Registry, RegistryBuilder};
pub use state::{ApplyOutcome, ApplySummary, RawState, RealState, ReconciledState};
