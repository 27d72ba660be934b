//! Revision kind and lifecycle state.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Whether a revision is an executable unit or a composition of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RevisionKind {
    /// Opaque code body with a typed interface.
    Component,
    /// Graph of operators referencing other revisions.
    Workflow,
}

/// Lifecycle state of a revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RevisionState {
    /// Still being edited.
    Draft,
    /// Frozen and usable everywhere.
    Released,
    /// Deprecated; only reachable by explicit id.
    Disabled,
}
