//! Suitability rules for components used as sources or sinks.

use std::fmt;

use cascade_core::revision::{IoInterface, RevisionKind, RevisionState, TransformationRevision};
use thiserror::Error;
use uuid::Uuid;

use super::ComponentAdapterConfig;
use crate::adapter::Direction;
use crate::payload::ComponentRecord;

/// Name of the single input every sink component must declare.
pub const SINK_DATA_INPUT: &str = "data";

/// The parts of a component the rules look at.
#[derive(Debug, Clone, Copy)]
pub struct ComponentProfile<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub version_tag: &'a str,
    pub kind: RevisionKind,
    pub state: RevisionState,
    pub category: &'a str,
    pub interface: &'a IoInterface,
}

impl<'a> From<&'a TransformationRevision> for ComponentProfile<'a> {
    fn from(revision: &'a TransformationRevision) -> Self {
        Self {
            id: revision.id,
            name: &revision.name,
            version_tag: &revision.version_tag,
            kind: revision.kind,
            state: revision.state,
            category: &revision.category,
            interface: &revision.io_interface,
        }
    }
}

impl<'a> From<&'a ComponentRecord> for ComponentProfile<'a> {
    fn from(record: &'a ComponentRecord) -> Self {
        Self {
            id: record.id,
            name: &record.name,
            version_tag: &record.version_tag,
            kind: RevisionKind::Component,
            state: record.state,
            category: &record.category,
            interface: &record.interface,
        }
    }
}

impl fmt::Display for ComponentProfile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) with id {}", self.name, self.version_tag, self.id)
    }
}

/// A component violates one of the source or sink rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Transformation {revision} is not a component. Component adapter can only use components.")]
    NotAComponent { revision: String },

    #[error("Component {revision} has state {state} which is not allowed. Allowed states are {allowed:?}.")]
    StateNotAllowed {
        revision: String,
        state: RevisionState,
        allowed: Vec<RevisionState>,
    },

    #[error(
        "Component {revision} has category {category} which is not allowed for component \
         {usage}s. Allowed categories for component {usage}s are {allowed:?}."
    )]
    CategoryNotAllowed {
        revision: String,
        category: String,
        usage: &'static str,
        allowed: Vec<String>,
    },

    #[error(
        "Component {revision} has more than one output which is not allowed for component \
         sources. Component sources need exactly one output."
    )]
    SourceMultipleOutputs { revision: String },

    #[error(
        "Component {revision} has no output which is not allowed for component sources. \
         Component sources need exactly one output."
    )]
    SourceNoOutput { revision: String },

    #[error(
        "Component {revision} has no input named 'data' which is not allowed for component \
         sinks. Component sinks always need a 'data' input."
    )]
    SinkMissingData { revision: String },

    #[error(
        "Component {revision} has outputs which is not allowed for component sinks. \
         Component sinks only have inputs."
    )]
    SinkHasOutputs { revision: String },
}

/// Checks that a component may be used in `direction`.
///
/// Rules run in order: kind, state, category, then interface shape.
pub fn validate_component(
    profile: ComponentProfile<'_>,
    config: &ComponentAdapterConfig,
    direction: Direction,
    allow_disabled: bool,
) -> Result<(), ValidationError> {
    let revision = profile.to_string();

    if profile.kind != RevisionKind::Component {
        return Err(ValidationError::NotAComponent { revision });
    }

    let allowed = config.allowed_states(allow_disabled);
    if !allowed.contains(&profile.state) {
        return Err(ValidationError::StateNotAllowed {
            revision,
            state: profile.state,
            allowed,
        });
    }

    if let Some(allowed) = config.allowed_categories(direction)
        && !allowed.iter().any(|category| category == profile.category)
    {
        return Err(ValidationError::CategoryNotAllowed {
            revision,
            category: profile.category.to_owned(),
            usage: direction.usage(),
            allowed: allowed.to_vec(),
        });
    }

    match direction {
        Direction::Load => match profile.interface.outputs.len() {
            1 => Ok(()),
            0 => Err(ValidationError::SourceNoOutput { revision }),
            _ => Err(ValidationError::SourceMultipleOutputs { revision }),
        },
        Direction::Send => {
            if profile.interface.input(SINK_DATA_INPUT).is_none() {
                return Err(ValidationError::SinkMissingData { revision });
            }
            if !profile.interface.outputs.is_empty() {
                return Err(ValidationError::SinkHasOutputs { revision });
            }
            Ok(())
        }
    }
}
