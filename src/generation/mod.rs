//! Model-assisted generation.
//!
//! `GenerationOrchestrator` renders a prompt, appends the instruction for the
//! declared output format, calls the `ModelClient` with bounded retry and
//! hands back a `GenerationResult`.
//!
//! Format validators live in `format` and are run by the generators that
//! write the content.

mod error;
mod format;
mod orchestrator;
mod result;
mod retry;


pub use error::{CancelledError, GenerationError, GenerationFailure, ValidationError};
pub use format::{OutputFormat, strip_code_fence};
pub use orchestrator::GenerationOrchestrator;
pub use result::{GenerationOptions, GenerationRequest, GenerationResult, TokenUsage};
pub use retry::RetryPolicy;
