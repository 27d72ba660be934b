//! Data types of component inputs and outputs.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use super::ExternalType;
use crate::error::Error;

/// Type of a value flowing through a component input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(try_from = "String", into = "&'static str")]
pub enum DataType {
    /// Integer scalar.
    #[strum(serialize = "INT")]
    Int,
    /// Floating point scalar.
    #[strum(serialize = "FLOAT")]
    Float,
    /// Text scalar.
    #[strum(serialize = "STRING")]
    String,
    /// Tabular data.
    #[strum(serialize = "DATAFRAME")]
    DataFrame,
    /// Single indexed series.
    #[strum(serialize = "SERIES")]
    Series,
    /// Long-format frame of several timeseries.
    #[strum(serialize = "MULTITSFRAME")]
    MultiTsFrame,
    /// Boolean scalar.
    #[strum(serialize = "BOOLEAN")]
    Boolean,
    /// Unconstrained value.
    #[strum(serialize = "ANY")]
    Any,
    /// Plotly figure encoded as JSON.
    #[strum(serialize = "PLOTLYJSON")]
    PlotlyJson,
}

/// Every accepted spelling, lowercase, mapped to its canonical variant.
const ALIASES: &[(&str, DataType)] = &[
    ("int", DataType::Int),
    ("integer", DataType::Int),
    ("float", DataType::Float),
    ("str", DataType::String),
    ("string", DataType::String),
    ("dataframe", DataType::DataFrame),
    ("series", DataType::Series),
    ("multitsframe", DataType::MultiTsFrame),
    ("bool", DataType::Boolean),
    ("boolean", DataType::Boolean),
    ("any", DataType::Any),
    ("object", DataType::Any),
    ("plotlyjson", DataType::PlotlyJson),
];

impl DataType {
    /// Returns the canonical spelling.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Returns the external type an adapter sees for values of this type.
    pub const fn external_type(&self) -> ExternalType {
        match self {
            Self::Int => ExternalType::MetadataInt,
            Self::Float => ExternalType::MetadataFloat,
            Self::String => ExternalType::MetadataStr,
            Self::DataFrame => ExternalType::DataFrame,
            Self::Series => ExternalType::TimeseriesNumeric,
            Self::MultiTsFrame => ExternalType::MultiTsFrame,
            Self::Boolean => ExternalType::MetadataBoolean,
            Self::Any => ExternalType::MetadataAny,
            Self::PlotlyJson => ExternalType::PlotlyJson,
        }
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == needle)
            .map(|(_, data_type)| *data_type)
            .ok_or_else(|| Error::UnknownAlias {
                what: "data type",
                alias: s.to_owned(),
            })
    }
}

impl TryFrom<String> for DataType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
