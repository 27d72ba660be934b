//! Component adapter configuration.

use cascade_core::revision::RevisionState;
#[cfg(feature = "config")]
use clap::{ArgAction, Args};
use serde::{Deserialize, Serialize};

use crate::adapter::Direction;

/// Which components the component adapter may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ComponentAdapterConfig {
    /// Whether the component adapter is available at all
    #[cfg_attr(
        feature = "config",
        arg(
            long = "component-adapter-active",
            env = "COMPONENT_ADAPTER_ACTIVE",
            default_value = "true",
            action = ArgAction::Set
        )
    )]
    #[serde(default = "default_active")]
    pub active: bool,

    /// Whether DRAFT components may be used as sources and sinks
    #[cfg_attr(
        feature = "config",
        arg(
            long = "component-adapter-allow-draft-components",
            env = "COMPONENT_ADAPTER_ALLOW_DRAFT_COMPONENTS",
            default_value = "false",
            action = ArgAction::Set
        )
    )]
    #[serde(default)]
    pub allow_draft_components: bool,

    /// Categories whose components may act as sources (all if unset)
    #[cfg_attr(
        feature = "config",
        arg(
            long = "component-adapter-allowed-source-categories",
            env = "COMPONENT_ADAPTER_ALLOWED_SOURCE_CATEGORIES",
            value_delimiter = ','
        )
    )]
    #[serde(default)]
    pub allowed_source_categories: Option<Vec<String>>,

    /// Categories whose components may act as sinks (all if unset)
    #[cfg_attr(
        feature = "config",
        arg(
            long = "component-adapter-allowed-sink-categories",
            env = "COMPONENT_ADAPTER_ALLOWED_SINK_CATEGORIES",
            value_delimiter = ','
        )
    )]
    #[serde(default)]
    pub allowed_sink_categories: Option<Vec<String>>,
}

fn default_active() -> bool {
    true
}

impl Default for ComponentAdapterConfig {
    fn default() -> Self {
        Self {
            active: default_active(),
            allow_draft_components: false,
            allowed_source_categories: None,
            allowed_sink_categories: None,
        }
    }
}

impl ComponentAdapterConfig {
    /// Returns the states a referenced component may be in.
    ///
    /// RELEASED is always allowed. DISABLED is only allowed for lookups by
    /// explicit id, never for listings.
    pub fn allowed_states(&self, allow_disabled: bool) -> Vec<RevisionState> {
        let mut states = vec![RevisionState::Released];
        if self.allow_draft_components {
            states.push(RevisionState::Draft);
        }
        if allow_disabled {
            states.push(RevisionState::Disabled);
        }
        states
    }

    /// Returns the category allow-list for one direction.
    pub fn allowed_categories(&self, direction: Direction) -> Option<&[String]> {
        match direction {
            Direction::Load => self.allowed_source_categories.as_deref(),
            Direction::Send => self.allowed_sink_categories.as_deref(),
        }
    }

    /// Returns true if `category` may be used in `direction`.
    pub fn category_allowed(&self, direction: Direction, category: &str) -> bool {
        self.allowed_categories(direction)
            .is_none_or(|allowed| allowed.iter().any(|c| c == category))
    }

    /// Returns true if `category` may appear in structure listings.
    pub fn category_listed(&self, category: &str) -> bool {
        match (&self.allowed_source_categories, &self.allowed_sink_categories) {
            (Some(sources), Some(sinks)) => {
                sources.iter().any(|c| c == category) || sinks.iter().any(|c| c == category)
            }
            _ => true,
        }
    }

    /// Enables or disables the adapter.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Allows DRAFT components.
    #[must_use]
    pub fn with_draft_components(mut self, allow: bool) -> Self {
        self.allow_draft_components = allow;
        self
    }

    /// Restricts source categories.
    #[must_use]
    pub fn with_source_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_source_categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Restricts sink categories.
    #[must_use]
    pub fn with_sink_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_sink_categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }
}
