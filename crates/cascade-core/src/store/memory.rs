//! In-memory revision store.

use std::collections::{BTreeSet, HashMap};

use uuid::Uuid;

use super::{RevisionQuery, RevisionStore};
use crate::error::{Error, Result};
use crate::revision::{RevisionKind, TransformationRevision};

/// Revision store backed by a hash map.
#[derive(Debug, Clone, Default)]
pub struct MemoryRevisionStore {
    revisions: HashMap<Uuid, TransformationRevision>,
}

impl MemoryRevisionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a revision.
    pub fn insert(&mut self, revision: TransformationRevision) {
        self.revisions.insert(revision.id, revision);
    }

    /// Removes a revision by id.
    pub fn remove(&mut self, id: Uuid) -> Option<TransformationRevision> {
        self.revisions.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }
}

impl FromIterator<TransformationRevision> for MemoryRevisionStore {
    fn from_iter<I: IntoIterator<Item = TransformationRevision>>(iter: I) -> Self {
        let mut store = Self::new();
        for revision in iter {
            store.insert(revision);
        }
        store
    }
}

#[async_trait::async_trait]
impl RevisionStore for MemoryRevisionStore {
    async fn get(&self, id: Uuid) -> Result<TransformationRevision> {
        self.revisions
            .get(&id)
            .cloned()
            .ok_or(Error::RevisionNotFound(id))
    }

    async fn select(&self, query: &RevisionQuery) -> Result<Vec<TransformationRevision>> {
        let mut selected: Vec<_> = self
            .revisions
            .values()
            .filter(|revision| query.matches(revision))
            .cloned()
            .collect();
        selected.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(selected)
    }

    async fn categories(&self, kind: Option<RevisionKind>) -> Result<Vec<String>> {
        let categories: BTreeSet<_> = self
            .revisions
            .values()
            .filter(|revision| kind.is_none_or(|kind| revision.kind == kind))
            .map(|revision| revision.category.clone())
            .collect();
        Ok(categories.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::{
        CodeContent, Endpoint, IoInterface, RevisionState, WorkflowContent,
    };

    fn component(n: u128, category: &str, state: RevisionState) -> TransformationRevision {
        TransformationRevision::component(
            Uuid::from_u128(n),
            format!("component-{n}"),
            category,
            IoInterface::default(),
            CodeContent {
                code_module_id: Uuid::from_u128(n + 1000),
                function_name: "main".into(),
                source: String::new(),
            },
        )
        .with_state(state)
    }

    #[tokio::test]
    async fn test_get_returns_any_state() {
        let store: MemoryRevisionStore =
            [component(1, "A", RevisionState::Disabled)].into_iter().collect();

        let revision = store.get(Uuid::from_u128(1)).await.unwrap();
        assert_eq!(revision.state, RevisionState::Disabled);

        let err = store.get(Uuid::from_u128(2)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_select_filters() {
        let store: MemoryRevisionStore = [
            component(1, "A", RevisionState::Released),
            component(2, "B", RevisionState::Draft),
            component(3, "A", RevisionState::Draft),
        ]
        .into_iter()
        .collect();

        let query = RevisionQuery::builder()
            .kind(RevisionKind::Component)
            .states(vec![RevisionState::Released])
            .categories(vec!["A".to_owned()])
            .build()
            .unwrap();

        let selected = store.select(&query).await.unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, Uuid::from_u128(1));

        let categories = store.categories(Some(RevisionKind::Component)).await.unwrap();
        assert_eq!(categories, vec!["A".to_owned(), "B".to_owned()]);
    }

    #[tokio::test]
    async fn test_nested_closure_keyed_by_operator() {
        let leaf = component(1, "A", RevisionState::Released);

        let mut inner_content = WorkflowContent::default();
        let inner_op = inner_content.add_operator(leaf.id, "leaf");
        let inner = TransformationRevision::workflow(
            Uuid::from_u128(10),
            "inner",
            "W",
            IoInterface::default(),
            inner_content,
        );

        let mut outer_content = WorkflowContent::default();
        let first = outer_content.add_operator(inner.id, "first");
        let second = outer_content.add_operator(inner.id, "second");
        let direct = outer_content.add_operator(leaf.id, "direct");
        outer_content
            .connect(Endpoint::new(direct, "y"), Endpoint::new(first, "x"))
            .unwrap();
        let outer = TransformationRevision::workflow(
            Uuid::from_u128(20),
            "outer",
            "W",
            IoInterface::default(),
            outer_content,
        );

        let store: MemoryRevisionStore =
            [leaf.clone(), inner.clone(), outer.clone()].into_iter().collect();
        let closure = store.nested_closure(&outer).await.unwrap();

        assert_eq!(closure.len(), 4);
        assert_eq!(closure[&first].id, inner.id);
        assert_eq!(closure[&second].id, inner.id);
        assert_eq!(closure[&direct].id, leaf.id);
        assert_eq!(closure[&inner_op].id, leaf.id);
    }

    #[tokio::test]
    async fn test_nested_closure_missing_revision() {
        let mut content = WorkflowContent::default();
        content.add_operator(Uuid::from_u128(99), "ghost");
        let workflow = TransformationRevision::workflow(
            Uuid::from_u128(20),
            "outer",
            "W",
            IoInterface::default(),
            content,
        );

        let store: MemoryRevisionStore = [workflow.clone()].into_iter().collect();
        assert!(store.nested_closure(&workflow).await.is_err());
    }
}
