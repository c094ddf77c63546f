//! Model file CLI subcommands: probe, inspect.
//!
//! These commands read a model file directly; nothing is restored or run.

use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::aipp::{extract_configs, AippFunc, AippPreprocessConfig, InputLayout};
use crate::config;
use crate::error::Result;
use crate::model::custom_data::{self, probe_file};
use crate::model::MappedModel;

/// Exit code when the file carries no custom data.
pub const EXIT_UNTAGGED: i32 = 1;

/// Summary of a model file's custom data and payload.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub name: String,
    pub file_len: usize,
    /// Type discriminator, `None` for untagged files.
    pub data_type: Option<String>,
    pub value_len: usize,
    pub payload_len: usize,
    pub payload_sha256: String,
    pub aipp: Option<AippSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AippSummary {
    pub nodes: Vec<NodeSummary>,
    pub dynamic_input_count: usize,
    pub data_inputs: usize,
    /// Caller-facing slots, or why they could not be planned.
    pub layout: std::result::Result<InputLayout, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub graph_data_idx: i32,
    pub tensor_data_idx: i32,
    pub input_format: &'static str,
    /// Features enabled in the static parameters.
    pub static_features: Vec<AippFunc>,
    pub dynamic_inputs: Vec<(i32, AippFunc)>,
}

impl NodeSummary {
    fn from_config(config: &AippPreprocessConfig) -> Self {
        let info = &config.aipp_param_info;
        let flags = [
            (info.enable_crop, AippFunc::Crop),
            (info.enable_csc, AippFunc::ColorSpaceConversion),
            (info.enable_resize, AippFunc::Resize),
            (info.enable_dtc, AippFunc::DataTypeConversion),
            (info.enable_rotate, AippFunc::Rotation),
            (info.enable_padding, AippFunc::Padding),
        ];
        Self {
            graph_data_idx: config.graph_data_idx,
            tensor_data_idx: config.tensor_data_idx,
            input_format: info.input_format.name(),
            static_features: flags
                .into_iter()
                .filter(|(on, _)| *on)
                .map(|(_, func)| func)
                .collect(),
            dynamic_inputs: config
                .config_data
                .iter()
                .map(|d| (d.idx, d.func))
                .collect(),
        }
    }
}

/// Smallest data-input count the configs are consistent with.
fn implied_data_inputs(configs: &[AippPreprocessConfig]) -> usize {
    configs
        .iter()
        .map(|c| c.tensor_data_idx.max(0) as usize + 1)
        .max()
        .unwrap_or(0)
}

fn summarize_aipp(value: &[u8], data_inputs: Option<usize>) -> Result<AippSummary> {
    let extracted = extract_configs(value)?;
    let data_inputs = data_inputs.unwrap_or_else(|| implied_data_inputs(&extracted.configs));
    let layout = InputLayout::plan_for_data(&extracted.configs, data_inputs)
        .map_err(|e| e.to_string());
    Ok(AippSummary {
        nodes: extracted.configs.iter().map(NodeSummary::from_config).collect(),
        dynamic_input_count: extracted.dynamic_input_count,
        data_inputs,
        layout,
    })
}

/// Build the report for a model buffer.
///
/// `data_inputs` overrides the number of inputs the compiled graph
/// consumes; by default the smallest count the configs allow is used.
pub fn build_report(name: &str, bytes: &[u8], data_inputs: Option<usize>) -> Result<InspectReport> {
    let decoded = custom_data::decode(bytes)?;
    let (data_type, value_len, aipp) = match &decoded.custom_data {
        Some(data) => {
            let aipp = if data.is_aipp() {
                Some(summarize_aipp(&data.value, data_inputs)?)
            } else {
                None
            };
            (Some(data.data_type.clone()), data.value.len(), aipp)
        }
        None => (None, 0, None),
    };

    Ok(InspectReport {
        name: name.to_string(),
        file_len: bytes.len(),
        data_type,
        value_len,
        payload_len: decoded.payload.len(),
        payload_sha256: hex::encode(Sha256::digest(decoded.payload)),
        aipp,
    })
}

/// Report whether a file starts with a custom-data envelope.
///
/// Returns 0 if tagged, [`EXIT_UNTAGGED`] otherwise.
pub fn run_probe(path: &str) -> i32 {
    if probe_file(path) {
        println!("{}: custom data present", path);
        0
    } else {
        println!("{}: no custom data", path);
        EXIT_UNTAGGED
    }
}

/// Print a summary of a model file.
///
/// Returns 0 on success, 1 if the file cannot be read or decoded.
pub fn run_inspect(path: &str, json: bool, data_inputs: Option<usize>) -> i32 {
    let limit = config::load().max_model_bytes;
    let report = MappedModel::open(Path::new(path), limit)
        .and_then(|mapped| build_report(mapped.name(), mapped.as_bytes(), data_inputs));
    let report = match report {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(path, error = %e, "inspect failed");
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    } else {
        print_report(&report);
    }
    0
}

fn print_report(report: &InspectReport) {
    println!("Model:        {}", report.name);
    println!("File size:    {} bytes", report.file_len);
    match &report.data_type {
        Some(t) => println!("Custom data:  {} ({} bytes)", t, report.value_len),
        None => println!("Custom data:  none"),
    }
    println!("Payload:      {} bytes", report.payload_len);
    println!("SHA-256:      {}", report.payload_sha256);

    let Some(aipp) = &report.aipp else {
        return;
    };
    println!();
    println!(
        "AIPP nodes: {}  dynamic inputs: {}  data inputs: {}",
        aipp.nodes.len(),
        aipp.dynamic_input_count,
        aipp.data_inputs
    );
    for (i, node) in aipp.nodes.iter().enumerate() {
        println!(
            "  [{}] input {} -> data {}  format {}",
            i, node.graph_data_idx, node.tensor_data_idx, node.input_format
        );
        if !node.static_features.is_empty() {
            println!("      static:  {:?}", node.static_features);
        }
        for (idx, func) in &node.dynamic_inputs {
            println!("      dynamic: input {} -> {:?}", idx, func);
        }
    }

    match &aipp.layout {
        Ok(layout) => {
            println!("Caller inputs:");
            for (slot, role) in layout.roles().iter().enumerate() {
                println!("  {:>3}  {:?}", slot, role);
            }
        }
        Err(e) => println!("Caller inputs: not plannable ({})", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aipp::{encode_configs, AippConfigDataInfo, AIPP_PREPROCESS_TYPE};
    use crate::model::custom_data::{encode_with_payload, CustomModelData};

    fn tagged_model() -> Vec<u8> {
        let mut config = AippPreprocessConfig {
            graph_data_idx: 0,
            tensor_data_idx: 0,
            config_data: vec![AippConfigDataInfo {
                idx: 1,
                func: AippFunc::Crop,
            }],
            ..Default::default()
        };
        config.aipp_param_info.enable_crop = true;
        let data = CustomModelData::new(AIPP_PREPROCESS_TYPE, encode_configs(&[config]).unwrap());
        encode_with_payload(&data, b"payload").unwrap()
    }

    #[test]
    fn untagged_report() {
        let report = build_report("m", b"plain-model", None).unwrap();
        assert!(report.data_type.is_none());
        assert_eq!(report.payload_len, 11);
        assert_eq!(report.payload_sha256.len(), 64);
        assert!(report.aipp.is_none());
    }

    #[test]
    fn aipp_report_plans_layout() {
        let report = build_report("m", &tagged_model(), None).unwrap();
        assert_eq!(report.data_type.as_deref(), Some(AIPP_PREPROCESS_TYPE));
        assert_eq!(report.value_len, 308);
        assert_eq!(report.payload_len, 7);

        let aipp = report.aipp.unwrap();
        assert_eq!(aipp.dynamic_input_count, 1);
        assert_eq!(aipp.data_inputs, 1);
        assert_eq!(aipp.nodes[0].static_features, vec![AippFunc::Crop]);
        let layout = aipp.layout.unwrap();
        assert_eq!(layout.total_len(), 2);
        assert_eq!(layout.dynamic_slots(), vec![1]);
    }

    #[test]
    fn unplannable_layout_is_reported_not_fatal() {
        // Dynamic input 1 cannot exist with a single caller slot.
        let report = build_report("m", &tagged_model(), Some(0)).unwrap();
        assert!(report.aipp.unwrap().layout.is_err());
    }

    #[test]
    fn report_serializes() {
        let report = build_report("m", &tagged_model(), None).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["aipp"]["layout"]["Ok"]["roles"][1]["role"], "dynamic");
        assert_eq!(json["aipp"]["nodes"][0]["input_format"], "undefined");
    }

    #[test]
    fn probe_missing_file_is_untagged() {
        assert_eq!(run_probe("/nonexistent/model.om"), EXIT_UNTAGGED);
    }
}
