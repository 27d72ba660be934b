//! Value and interface types.
//!
//! Both [`DataType`] and [`ExternalType`] accept several spellings for the
//! same type. Parsing always goes through an explicit alias table that maps
//! every accepted spelling to exactly one canonical variant.

mod data_type;
mod external_type;
mod value;

pub use data_type::DataType;
pub use external_type::{ExternalType, GeneralType};
pub use value::parse_value;
