//! Revision store contract.
//!
//! The runtime never persists revisions. It reads them through the
//! [`RevisionStore`] trait: single lookups by id, filtered listings, and the
//! transitive closure of a workflow.

mod memory;
mod query;

use std::collections::HashMap;

use uuid::Uuid;

pub use self::memory::MemoryRevisionStore;
pub use self::query::{RevisionQuery, RevisionQueryBuilder};
use crate::error::Result;
use crate::revision::{OperatorId, RevisionKind, TransformationRevision};

/// Tracing target for store operations.
const TRACING_TARGET: &str = "cascade_core::store";

/// Read access to transformation revisions.
#[async_trait::async_trait]
pub trait RevisionStore: Send + Sync {
    /// Returns the revision with this id, whatever its state.
    async fn get(&self, id: Uuid) -> Result<TransformationRevision>;

    /// Returns every revision matching the query.
    async fn select(&self, query: &RevisionQuery) -> Result<Vec<TransformationRevision>>;

    /// Returns the sorted distinct categories, optionally of one kind only.
    async fn categories(&self, kind: Option<RevisionKind>) -> Result<Vec<String>>;

    /// Returns every revision referenced transitively by `root`, keyed by
    /// the id of the operator that instances it.
    ///
    /// Components have an empty closure.
    async fn nested_closure(
        &self,
        root: &TransformationRevision,
    ) -> Result<HashMap<OperatorId, TransformationRevision>> {
        let mut closure = HashMap::new();
        let mut pending: Vec<TransformationRevision> = vec![root.clone()];

        while let Some(revision) = pending.pop() {
            let Some(content) = revision.workflow_content() else {
                continue;
            };

            for operator in &content.operators {
                if closure.contains_key(&operator.id) {
                    continue;
                }

                let nested = self.get(operator.revision_id).await?;
                if nested.workflow_content().is_some() {
                    pending.push(nested.clone());
                }
                closure.insert(operator.id, nested);
            }
        }

        tracing::debug!(
            target: TRACING_TARGET,
            root_id = %root.id,
            nested_count = closure.len(),
            "Collected nested revisions"
        );

        Ok(closure)
    }
}
