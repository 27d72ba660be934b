//! Transient revisions rebuilt from catalog records.
//!
//! A component used as a source or sink is run through the ordinary graph
//! machinery. Its revision is regenerated from the component record and code
//! module carried by the execution, then wrapped into a one-operator workflow.

use std::collections::BTreeMap;

use cascade_core::revision::{
    CodeContent, Input, InputKind, IoInterface, RevisionContent, RevisionKind, RevisionState,
    TransformationRevision,
};
use cascade_core::types::ExternalType;
use cascade_core::wiring::{IoWiring, Wiring};
use serde_json::Value;
use uuid::Uuid;

use super::validate::SINK_DATA_INPUT;
use crate::payload::{CodeModule, ComponentRecord};

/// Revision group shared by every regenerated revision.
pub const SYNTHETIC_REVISION_GROUP_ID: Uuid =
    Uuid::from_u128(0x0000_0000_1111_0000_1111_0000_0000_0000);

const REGENERATED: &str = "REGENERATED FOR COMPONENT ADAPTER";

/// A filter key that is not an input of the referenced component.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("filter '{filter}' is not an input of component {component}")]
pub struct UnknownFilter {
    pub filter: String,
    pub component: String,
}

/// Regenerates a DRAFT component revision from its record and code module.
///
/// Inputs with a default value become optional, all others required.
pub fn component_revision(record: &ComponentRecord, module: &CodeModule) -> TransformationRevision {
    let inputs = record
        .interface
        .inputs
        .iter()
        .map(|input| Input {
            kind: if input.value.is_some() {
                InputKind::Optional
            } else {
                InputKind::Required
            },
            ..input.clone()
        })
        .collect();

    TransformationRevision {
        id: record.id,
        revision_group_id: SYNTHETIC_REVISION_GROUP_ID,
        name: record.name.clone(),
        description: format!("TRAFO REV {}  {REGENERATED}", record.display_name()),
        category: format!("UNKNOWN CATEGORY SINCE {REGENERATED}"),
        version_tag: record.version_tag.clone(),
        kind: RevisionKind::Component,
        state: RevisionState::Draft,
        io_interface: IoInterface::new(inputs, record.interface.outputs.clone()),
        content: RevisionContent::Code(CodeContent {
            code_module_id: module.id,
            function_name: record.function_name.clone(),
            source: module.code.clone(),
        }),
        documentation: format!("UNKNOWN DOCUMENTATION SINCE {REGENERATED}"),
        test_wiring: Wiring::default(),
        release_wiring: None,
    }
}

/// Derives the wiring of a regenerated component from binding filters.
///
/// Every filter is direct-provisioned into the input of the same name, typed
/// as that input. For sinks the sent value is provisioned into `data`, typed
/// with the external type of the outer binding if it has one, and a `data`
/// filter is ignored.
pub fn derived_wiring(
    record: &ComponentRecord,
    filters: &BTreeMap<String, Value>,
    sink: Option<(&Value, Option<ExternalType>)>,
) -> Result<Wiring, UnknownFilter> {
    let mut input_wirings = Vec::with_capacity(filters.len() + 1);

    for (key, value) in filters {
        if sink.is_some() && key == SINK_DATA_INPUT {
            continue;
        }

        let Some(input) = record.interface.input(key) else {
            return Err(UnknownFilter {
                filter: key.clone(),
                component: record.display_name(),
            });
        };

        input_wirings.push(
            IoWiring::direct(key.clone(), value.clone())
                .with_type(input.data_type.external_type()),
        );
    }

    if let Some((value, external_type)) = sink {
        let mut wiring = IoWiring::direct(SINK_DATA_INPUT, value.clone());
        if let Some(external_type) = external_type {
            wiring = wiring.with_type(external_type);
        }
        input_wirings.push(wiring);
    }

    Ok(Wiring::new(input_wirings, Vec::new()))
}

#[cfg(test)]
mod tests {
    use cascade_core::types::DataType;
    use cascade_core::wiring::DIRECT_PROVISIONING;
    use serde_json::json;

    use super::*;
    use crate::fixtures;

    fn record() -> (ComponentRecord, CodeModule) {
        let revision = fixtures::doubler(1);
        (
            ComponentRecord::from_revision(&revision).unwrap(),
            CodeModule::from_revision(&revision).unwrap(),
        )
    }

    #[test]
    fn test_regenerated_revision() {
        let (record, module) = record();
        let revision = component_revision(&record, &module);

        assert_eq!(revision.id, record.id);
        assert_eq!(revision.revision_group_id, SYNTHETIC_REVISION_GROUP_ID);
        assert_eq!(revision.state, RevisionState::Draft);
        assert!(revision.description.ends_with(REGENERATED));
        assert_eq!(revision.code().unwrap().code_module_id, module.id);
        assert!(revision.validate().is_ok());
    }

    #[test]
    fn test_inputs_with_defaults_become_optional() {
        let (mut record, module) = record();
        record.interface.inputs.push(Input::required("factor", DataType::Int));
        record.interface.inputs[1].value = Some(json!(3));

        let revision = component_revision(&record, &module);
        assert_eq!(revision.io_interface.inputs[0].kind, InputKind::Required);
        assert_eq!(revision.io_interface.inputs[1].kind, InputKind::Optional);
    }

    #[test]
    fn test_filters_use_input_types() {
        let (record, _) = record();
        let filters = BTreeMap::from([("x".to_owned(), json!(5))]);

        let wiring = derived_wiring(&record, &filters, None).unwrap();
        let entry = &wiring.input_wirings[0];
        assert_eq!(entry.adapter_id, DIRECT_PROVISIONING);
        assert_eq!(entry.external_type, Some(ExternalType::MetadataInt));
        assert_eq!(entry.filters["value"], json!(5));
    }

    #[test]
    fn test_unknown_filter_rejected() {
        let (record, _) = record();
        let filters = BTreeMap::from([("nope".to_owned(), json!(1))]);

        let err = derived_wiring(&record, &filters, None).unwrap_err();
        assert_eq!(err.filter, "nope");
    }

    #[test]
    fn test_sink_value_provisioned_as_data() {
        let (record, _) = record();
        let filters = BTreeMap::from([("data".to_owned(), json!("ignored"))]);

        let value = json!([1, 2]);
        let wiring = derived_wiring(&record, &filters, Some((&value, None))).unwrap();
        assert_eq!(wiring.input_wirings.len(), 1);
        assert_eq!(wiring.input_wirings[0].workflow_io_name, "data");
        assert_eq!(wiring.input_wirings[0].filters["value"], json!([1, 2]));
        assert_eq!(wiring.input_wirings[0].external_type, None);
    }

    #[test]
    fn test_sink_value_keeps_binding_type() {
        let (record, _) = record();
        let value = json!({"a": 1});

        let wiring = derived_wiring(
            &record,
            &BTreeMap::new(),
            Some((&value, Some(ExternalType::MetadataAny))),
        )
        .unwrap();
        assert_eq!(wiring.input_wirings[0].workflow_io_name, "data");
        assert_eq!(wiring.input_wirings[0].external_type, Some(ExternalType::MetadataAny));
    }
}
