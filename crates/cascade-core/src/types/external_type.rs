//! Types as seen by adapters.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::error::Error;

/// Declared type of a wired source or sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ExternalType {
    #[strum(serialize = "metadata(int)")]
    MetadataInt,
    #[strum(serialize = "metadata(float)")]
    MetadataFloat,
    #[strum(serialize = "metadata(str)")]
    MetadataStr,
    #[strum(serialize = "metadata(boolean)")]
    MetadataBoolean,
    #[strum(serialize = "metadata(any)")]
    MetadataAny,
    #[strum(serialize = "timeseries(int)")]
    TimeseriesInt,
    #[strum(serialize = "timeseries(float)")]
    TimeseriesFloat,
    #[strum(serialize = "timeseries(numeric)")]
    TimeseriesNumeric,
    #[strum(serialize = "timeseries(str)")]
    TimeseriesStr,
    #[strum(serialize = "timeseries(bool)")]
    TimeseriesBool,
    #[strum(serialize = "timeseries(any)")]
    TimeseriesAny,
    #[strum(serialize = "series(int)")]
    SeriesInt,
    #[strum(serialize = "series(float)")]
    SeriesFloat,
    #[strum(serialize = "series(numeric)")]
    SeriesNumeric,
    #[strum(serialize = "series(str)")]
    SeriesStr,
    #[strum(serialize = "series(bool)")]
    SeriesBool,
    #[strum(serialize = "series(any)")]
    SeriesAny,
    #[strum(serialize = "multitsframe")]
    MultiTsFrame,
    #[strum(serialize = "dataframe")]
    DataFrame,
    #[strum(serialize = "plotlyjson")]
    PlotlyJson,
}

/// Coarse family of an [`ExternalType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GeneralType {
    Metadata,
    Timeseries,
    Series,
    Multitsframe,
    Dataframe,
    Plotlyjson,
}

/// Every accepted spelling, lowercase, mapped to its canonical variant.
const ALIASES: &[(&str, ExternalType)] = &[
    ("metadata(int)", ExternalType::MetadataInt),
    ("metadata(integer)", ExternalType::MetadataInt),
    ("metadata(float)", ExternalType::MetadataFloat),
    ("metadata(str)", ExternalType::MetadataStr),
    ("metadata(string)", ExternalType::MetadataStr),
    ("metadata(boolean)", ExternalType::MetadataBoolean),
    ("metadata(bool)", ExternalType::MetadataBoolean),
    ("metadata(any)", ExternalType::MetadataAny),
    ("metadata(object)", ExternalType::MetadataAny),
    ("timeseries(int)", ExternalType::TimeseriesInt),
    ("timeseries(integer)", ExternalType::TimeseriesInt),
    ("timeseries(float)", ExternalType::TimeseriesFloat),
    ("timeseries(numeric)", ExternalType::TimeseriesNumeric),
    ("timeseries(str)", ExternalType::TimeseriesStr),
    ("timeseries(string)", ExternalType::TimeseriesStr),
    ("timeseries(bool)", ExternalType::TimeseriesBool),
    ("timeseries(boolean)", ExternalType::TimeseriesBool),
    ("timeseries(any)", ExternalType::TimeseriesAny),
    ("timeseries(object)", ExternalType::TimeseriesAny),
    ("series(int)", ExternalType::SeriesInt),
    ("series(integer)", ExternalType::SeriesInt),
    ("series(float)", ExternalType::SeriesFloat),
    ("series(numeric)", ExternalType::SeriesNumeric),
    ("series(str)", ExternalType::SeriesStr),
    ("series(string)", ExternalType::SeriesStr),
    ("series(bool)", ExternalType::SeriesBool),
    ("series(boolean)", ExternalType::SeriesBool),
    ("series(any)", ExternalType::SeriesAny),
    ("series(object)", ExternalType::SeriesAny),
    ("multitsframe", ExternalType::MultiTsFrame),
    ("dataframe", ExternalType::DataFrame),
    ("plotlyjson", ExternalType::PlotlyJson),
];

impl ExternalType {
    /// Returns the canonical spelling.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Returns the family this type belongs to.
    pub const fn general_type(&self) -> GeneralType {
        match self {
            Self::MetadataInt
            | Self::MetadataFloat
            | Self::MetadataStr
            | Self::MetadataBoolean
            | Self::MetadataAny => GeneralType::Metadata,
            Self::TimeseriesInt
            | Self::TimeseriesFloat
            | Self::TimeseriesNumeric
            | Self::TimeseriesStr
            | Self::TimeseriesBool
            | Self::TimeseriesAny => GeneralType::Timeseries,
            Self::SeriesInt
            | Self::SeriesFloat
            | Self::SeriesNumeric
            | Self::SeriesStr
            | Self::SeriesBool
            | Self::SeriesAny => GeneralType::Series,
            Self::MultiTsFrame => GeneralType::Multitsframe,
            Self::DataFrame => GeneralType::Dataframe,
            Self::PlotlyJson => GeneralType::Plotlyjson,
        }
    }

    /// Returns true for single-value metadata types.
    pub const fn is_metadata(&self) -> bool {
        matches!(self.general_type(), GeneralType::Metadata)
    }
}

impl FromStr for ExternalType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == needle)
            .map(|(_, external_type)| *external_type)
            .ok_or_else(|| Error::UnknownAlias {
                what: "external type",
                alias: s.to_owned(),
            })
    }
}

impl TryFrom<String> for ExternalType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
