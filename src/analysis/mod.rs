//! Accountability analysis.
//!
//! The [`Orchestrator`] runs one ticker through cache gate, retrieval,
//! context aggregation, prompting, validate/repair, quality classification,
//! and persistence. Each step lives in its own module.

pub mod aggregator;
pub mod orchestrator;
pub mod prompt;
pub mod quality;
pub mod repair;
pub mod retrieval;
pub mod sentiment;

#[cfg(test)]
pub(crate) mod fakes;

pub use orchestrator::{Orchestrator, OrchestratorConfig};

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Failure of one bounded collaborator call.
#[derive(Debug, Error)]
pub enum StepError<E> {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Failed(E),
}

/// Await `fut` for at most `limit`.
pub(crate) async fn with_timeout<T, E, F>(limit: Duration, fut: F) -> Result<T, StepError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(StepError::Failed(e)),
        Err(_) => Err(StepError::Timeout(limit)),
    }
}
