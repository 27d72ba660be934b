//! Browsable structure of the component adapter.
//!
//! Categories are exposed as thing nodes. Components suitable as sources or
//! sinks are listed below the category they belong to.

use std::collections::BTreeMap;

use cascade_core::revision::{InputKind, RevisionKind, TransformationRevision};
use cascade_core::store::{RevisionQuery, RevisionStore};
use cascade_core::types::ExternalType;
use cascade_core::wiring::COMPONENT_ADAPTER;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::validate::{validate_component, SINK_DATA_INPUT};
use super::ComponentAdapterConfig;
use crate::adapter::Direction;
use crate::error::{Error, Result};

/// Inputs the frontend adds on its own for time-ranged types.
const IMPLICIT_FILTERS: [&str; 2] = ["timestampFrom", "timestampTo"];

/// Kind of every filter derived from component inputs.
const FREE_TEXT: &str = "free_text";

/// A category of components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThingNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub description: String,
}

impl ThingNode {
    fn category(category: &str) -> Self {
        Self {
            id: category.to_owned(),
            parent_id: None,
            name: category.to_owned(),
            description: format!("Components suitable as sources/sinks in category {category}"),
        }
    }
}

/// A filter a binding may set, derived from one component input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureFilter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
    pub default_value: Option<Value>,
}

/// A component offered as source or sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureEntry {
    /// Component id, or the category for metadata sources.
    pub id: String,
    pub thing_node_id: String,
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub external_type: ExternalType,
    /// Component id of metadata sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_key: Option<String>,
    pub filters: BTreeMap<String, StructureFilter>,
}

impl StructureEntry {
    /// Builds the entry of a validated component.
    fn new(component: &TransformationRevision, direction: Direction) -> Option<Self> {
        let interface = &component.io_interface;
        let data_type = match direction {
            Direction::Load => interface.outputs.first()?.data_type,
            Direction::Send => interface.input(SINK_DATA_INPUT)?.data_type,
        };
        let external_type = data_type.external_type();
        let metadata = direction == Direction::Load && external_type.is_metadata();

        let filters = interface
            .inputs
            .iter()
            .filter(|input| direction == Direction::Load || input.name == SINK_DATA_INPUT)
            .filter(|input| !IMPLICIT_FILTERS.contains(&input.name.as_str()))
            .map(|input| {
                let filter = StructureFilter {
                    name: input.name.clone(),
                    kind: FREE_TEXT.to_owned(),
                    required: input.kind == InputKind::Required,
                    default_value: input.value.clone(),
                };
                (input.name.clone(), filter)
            })
            .collect();

        let name = component.display_name();
        Some(Self {
            id: if metadata {
                component.category.clone()
            } else {
                component.id.to_string()
            },
            thing_node_id: component.category.clone(),
            path: format!("{}/{name}", component.category),
            name,
            external_type,
            metadata_key: metadata.then(|| component.id.to_string()),
            filters,
        })
    }
}

/// Structure response of one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureListing {
    pub id: String,
    pub name: String,
    pub thing_nodes: Vec<ThingNode>,
    pub sources: Vec<StructureEntry>,
    pub sinks: Vec<StructureEntry>,
}

impl StructureListing {
    fn new(thing_nodes: Vec<ThingNode>, sources: Vec<StructureEntry>, sinks: Vec<StructureEntry>) -> Self {
        Self {
            id: COMPONENT_ADAPTER.to_owned(),
            name: "Component Adapter".to_owned(),
            thing_nodes,
            sources,
            sinks,
        }
    }
}

/// Structure queries of the component adapter over a revision store.
#[derive(Clone, Copy)]
pub struct ComponentAdapterStructure<'a> {
    store: &'a dyn RevisionStore,
    config: &'a ComponentAdapterConfig,
}

impl<'a> ComponentAdapterStructure<'a> {
    pub fn new(store: &'a dyn RevisionStore, config: &'a ComponentAdapterConfig) -> Self {
        Self { store, config }
    }

    /// Lists categories at the root, or the components of one category.
    pub async fn structure(&self, parent_id: Option<&str>) -> Result<StructureListing> {
        let Some(category) = parent_id else {
            let categories = self.store.categories(Some(RevisionKind::Component)).await?;
            let thing_nodes = categories
                .iter()
                .filter(|category| self.config.category_listed(category))
                .map(|category| ThingNode::category(category))
                .collect();
            return Ok(StructureListing::new(thing_nodes, Vec::new(), Vec::new()));
        };

        if !self.config.category_listed(category) {
            return Ok(StructureListing::new(Vec::new(), Vec::new(), Vec::new()));
        }

        let categories = Some(vec![category.to_owned()]);
        let sources = self.entries(Direction::Load, categories.clone(), None, false).await?;
        let sinks = self.entries(Direction::Send, categories, None, false).await?;
        Ok(StructureListing::new(Vec::new(), sources, sinks))
    }

    /// Lists sources whose name contains `filter`, ignoring case.
    pub async fn sources(&self, filter: Option<&str>) -> Result<Vec<StructureEntry>> {
        let entries = self.entries(Direction::Load, None, None, false).await?;
        Ok(filter_by_name(entries, filter))
    }

    /// Lists sinks whose name contains `filter`, ignoring case.
    pub async fn sinks(&self, filter: Option<&str>) -> Result<Vec<StructureEntry>> {
        let entries = self.entries(Direction::Send, None, None, false).await?;
        Ok(filter_by_name(entries, filter))
    }

    /// Looks up one source. DISABLED components are found too.
    pub async fn source_by_id(&self, id: Uuid) -> Result<Option<StructureEntry>> {
        self.entry_by_id(Direction::Load, id).await
    }

    /// Looks up one sink. DISABLED components are found too.
    pub async fn sink_by_id(&self, id: Uuid) -> Result<Option<StructureEntry>> {
        self.entry_by_id(Direction::Send, id).await
    }

    /// Returns the thing node of a listed category.
    pub fn thing_node_by_id(&self, id: &str) -> Option<ThingNode> {
        (!id.is_empty() && self.config.category_listed(id)).then(|| ThingNode::category(id))
    }

    async fn entry_by_id(&self, direction: Direction, id: Uuid) -> Result<Option<StructureEntry>> {
        let mut entries = self.entries(direction, None, Some(vec![id]), true).await?;
        if entries.len() > 1 {
            return Err(Error::Internal(format!(
                "found {} component adapter {}s with id {id}",
                entries.len(),
                direction.usage()
            )));
        }
        Ok(entries.pop())
    }

    async fn entries(
        &self,
        direction: Direction,
        categories: Option<Vec<String>>,
        ids: Option<Vec<Uuid>>,
        allow_disabled: bool,
    ) -> Result<Vec<StructureEntry>> {
        let query = RevisionQuery {
            kind: Some(RevisionKind::Component),
            states: Some(self.config.allowed_states(allow_disabled)),
            categories,
            ids,
        };

        let components = self.store.select(&query).await?;
        let mut entries: Vec<_> = components
            .iter()
            .filter(|component| {
                validate_component((*component).into(), self.config, direction, allow_disabled)
                    .is_ok()
            })
            .filter_map(|component| StructureEntry::new(component, direction))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

fn filter_by_name(entries: Vec<StructureEntry>, filter: Option<&str>) -> Vec<StructureEntry> {
    let Some(filter) = filter.map(str::to_lowercase) else {
        return entries;
    };
    entries
        .into_iter()
        .filter(|entry| entry.name.to_lowercase().contains(&filter))
        .collect()
}
