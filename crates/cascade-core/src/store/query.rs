//! Revision listing filters.

use derive_builder::Builder;
use uuid::Uuid;

use crate::revision::{RevisionKind, RevisionState, TransformationRevision};

/// Filter for [`RevisionStore::select`](super::RevisionStore::select).
///
/// Unset fields match everything.
#[derive(Debug, Clone, Default, Builder)]
#[builder(default, setter(into, strip_option))]
pub struct RevisionQuery {
    pub kind: Option<RevisionKind>,
    pub states: Option<Vec<RevisionState>>,
    pub categories: Option<Vec<String>>,
    pub ids: Option<Vec<Uuid>>,
}

impl RevisionQuery {
    /// Returns a builder.
    pub fn builder() -> RevisionQueryBuilder {
        RevisionQueryBuilder::default()
    }

    /// Returns true if the revision passes every set filter.
    pub fn matches(&self, revision: &TransformationRevision) -> bool {
        self.kind.is_none_or(|kind| revision.kind == kind)
            && self
                .states
                .as_ref()
                .is_none_or(|states| states.contains(&revision.state))
            && self
                .categories
                .as_ref()
                .is_none_or(|categories| categories.contains(&revision.category))
            && self.ids.as_ref().is_none_or(|ids| ids.contains(&revision.id))
    }
}
