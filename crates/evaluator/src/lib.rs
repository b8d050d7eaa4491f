//! # evaluator
//!
//! Interchangeable engines for evaluating Jsonnet into JSON text.
//!
//! An [`EvaluationBackend`] turns an [`EvaluationRequest`] (import roots,
//! external variables, top-level arguments, stack bound) into a reusable
//! [`Evaluator`]. Evaluators are stateless: the same input with the same
//! request always yields the same output, and a failure never yields output.
//!
//! ## Example
//!
//! ```no_run
//! use evaluator::{EvaluationBackend, EvaluationRequest, SubprocessBackend};
//!
//! let request = EvaluationRequest::builder()
//!     .import_root("/project/lib")
//!     .ext_code("env", "\"prod\"")
//!     .max_stack(500)
//!     .build()
//!     .expect("valid request");
//!
//! let evaluator = SubprocessBackend::default().make_evaluator(request);
//! let json = evaluator
//!     .evaluate_anonymous_snippet("{a: std.extVar('env')}")
//!     .expect("evaluation failed");
//! ```
//!
//! ## Backends
//!
//! - `binary` (default feature): spawns an interpreter compatible with the
//!   Jsonnet CLI, one process per call
//! - `inprocess` (default feature): evaluates with jrsonnet inside the
//!   current process, including the `std.native` helpers listed in
//!   `backend::native`

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

/// Backend implementations.
pub mod backend;
/// Error types for evaluation.
pub mod error;
/// Evaluation settings.
pub mod request;

#[cfg(feature = "binary")]
pub use backend::binary::SubprocessBackend;
#[cfg(feature = "inprocess")]
pub use backend::inprocess::InProcessBackend;
pub use backend::{EvaluationBackend, Evaluator};
pub use error::{Error, InvalidRequest, Result, Unit};
pub use request::{EvaluationRequest, EvaluationRequestBuilder};
