//! PreCommitHook port - Work that must ride along with a unit of work.
//!
//! A hook is invoked with the set of changed aggregates immediately before
//! a unit of work commits. The caller must honor the result: `Ok` means the
//! hook's writes are staged and the commit may proceed, `Err` means the
//! whole transaction must be aborted. Commit-time event capture is the
//! canonical hook; nothing stops a deployment from adding others (e.g.
//! audit snapshots).

use async_trait::async_trait;

use crate::domain::foundation::{AggregateRoot, DomainError};

/// Port invoked by unit-of-work implementations just before commit.
#[async_trait]
pub trait PreCommitHook: Send + Sync {
    /// Runs against the aggregates touched by the commit.
    ///
    /// `correlation_id` is the originating request's tracing key, if any.
    ///
    /// # Errors
    ///
    /// Any error must cause the caller to roll back the entire transaction;
    /// there is no partial-success state.
    async fn before_commit(
        &self,
        aggregates: &mut [&mut dyn AggregateRoot],
        correlation_id: Option<&str>,
    ) -> Result<(), DomainError>;

    /// Hook name for logging.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that the trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn PreCommitHook) {}
}
