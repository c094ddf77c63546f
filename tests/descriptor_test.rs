//! Introspection-time descriptor remapping and its agreement with the
//! inference-time input remapping.

use std::sync::Arc;

use aipp_runtime::aipp::{
    convert_descs_with_configs, convert_input_tensor_descs, convert_inputs_with_configs,
    encode_configs, AippConfigDataInfo, AippFunc, AippPreprocessConfig, InputLayout, SlotRole,
    AIPP_PREPROCESS_TYPE,
};
use aipp_runtime::model::{CustomModelData, DataType, Format, NdTensorBuffer, TensorBuffer, TensorDesc};
use aipp_runtime::AippError;

fn data_desc(c: i32) -> TensorDesc {
    TensorDesc::new(vec![1, c, 4, 4], DataType::Float32, Format::Nchw)
}

fn node(graph: i32, tensor: i32, dynamic: &[(i32, AippFunc)]) -> AippPreprocessConfig {
    let mut config = AippPreprocessConfig {
        graph_data_idx: graph,
        tensor_data_idx: tensor,
        config_data: dynamic
            .iter()
            .map(|&(idx, func)| AippConfigDataInfo { idx, func })
            .collect(),
        ..Default::default()
    };
    config.aipp_param_info.crop_para.crop_size_w = u32::MAX;
    config.aipp_param_info.crop_para.crop_size_h = u32::MAX;
    config.aipp_param_info.resize_para.resize_output_size_w = u32::MAX;
    config.aipp_param_info.resize_para.resize_output_size_h = u32::MAX;
    config
}

#[test]
fn crop_and_channel_swap_slots_are_synthesized() {
    let data_descs = vec![data_desc(3), data_desc(1)];
    let config = node(0, 0, &[(1, AippFunc::Crop), (2, AippFunc::ChannelSwap)]);
    let custom = CustomModelData::new(AIPP_PREPROCESS_TYPE, encode_configs(&[config]).unwrap());

    let full = convert_input_tensor_descs(&custom, &data_descs).unwrap();
    assert_eq!(full.len(), 4);
    assert_eq!(full[0], data_descs[0]);
    assert_eq!(full[1].dims, vec![1, 20, 1, 1]);
    assert_eq!(full[1].data_type, DataType::Uint8);
    assert_eq!(full[1].format, Format::Nchw);
    assert_eq!(full[2].dims, vec![1, 8, 1, 1]);
    assert_eq!(full[2].data_type, DataType::Uint8);
    assert_eq!(full[3], data_descs[1]);
}

#[test]
fn every_feature_has_its_record_size() {
    let expected = [
        (AippFunc::Crop, 20),
        (AippFunc::ChannelSwap, 8),
        (AippFunc::ColorSpaceConversion, 12),
        (AippFunc::Resize, 12),
        (AippFunc::DataTypeConversion, 44),
        (AippFunc::Padding, 36),
    ];
    for (func, size) in expected {
        let full =
            convert_descs_with_configs(&[node(1, 0, &[(0, func)])], &[data_desc(3)]).unwrap();
        assert_eq!(full[0], TensorDesc::bytes(size), "{:?}", func);
        assert_eq!(full[0].byte_size(), Some(size));
        assert_eq!(full[1], data_desc(3));
    }
}

#[test]
fn non_aipp_custom_data_returns_descs_unchanged() {
    let descs = vec![data_desc(3)];
    let custom = CustomModelData::new("Other", vec![1, 2, 3]);
    assert_eq!(convert_input_tensor_descs(&custom, &descs).unwrap(), descs);
}

#[test]
fn bad_configs_are_rejected() {
    let descs = vec![data_desc(3)];

    let result = convert_descs_with_configs(&[node(0, 1, &[])], &descs);
    assert!(matches!(result, Err(AippError::OutOfRange { .. })));

    let result = convert_descs_with_configs(&[node(0, 0, &[(0, AippFunc::Crop)])], &descs);
    assert!(matches!(result, Err(AippError::InvalidArgument(_))));

    let result = convert_descs_with_configs(&[node(0, 0, &[(1, AippFunc::Rotation)])], &descs);
    assert!(matches!(result, Err(AippError::Unsupported(_))));

    let custom = CustomModelData::new(AIPP_PREPROCESS_TYPE, vec![0; 307]);
    assert!(convert_input_tensor_descs(&custom, &descs)
        .unwrap_err()
        .is_corruption());
}

/// Layouts used to compare both directions of the remapping.
fn duality_cases() -> Vec<(Vec<AippPreprocessConfig>, usize)> {
    vec![
        (vec![node(0, 0, &[(1, AippFunc::Crop)])], 1),
        (vec![node(0, 0, &[(1, AippFunc::Crop), (2, AippFunc::ChannelSwap)])], 2),
        (vec![node(3, 1, &[(0, AippFunc::Resize), (2, AippFunc::Padding)])], 3),
        (
            vec![
                node(4, 2, &[(1, AippFunc::DataTypeConversion)]),
                node(0, 0, &[(5, AippFunc::Crop), (6, AippFunc::ChannelSwap)]),
            ],
            4,
        ),
        (vec![node(1, 1, &[]), node(0, 0, &[])], 2),
    ]
}

/// Zero-filled caller inputs sized by `descs`.
fn inputs_for(descs: &[TensorDesc]) -> Vec<Arc<dyn TensorBuffer>> {
    descs
        .iter()
        .map(|desc| {
            let size = desc.byte_size().unwrap_or(1);
            Arc::new(NdTensorBuffer::from_bytes(vec![0u8; size])) as Arc<dyn TensorBuffer>
        })
        .collect()
}

#[test]
fn descriptor_and_input_remapping_agree() {
    for (configs, data_len) in duality_cases() {
        let data_descs: Vec<TensorDesc> = (0..data_len).map(|i| data_desc(i as i32 + 1)).collect();
        let full = convert_descs_with_configs(&configs, &data_descs).unwrap();
        let layout = InputLayout::plan_for_data(&configs, data_len).unwrap();
        assert_eq!(full.len(), layout.total_len());

        let inputs = inputs_for(&full);
        let converted = convert_inputs_with_configs(&inputs, &configs).unwrap();
        assert_eq!(converted.data_inputs.len(), data_len);

        // Data tensor t must be the caller slot whose descriptor is data_descs[t].
        for (t, tensor) in converted.data_inputs.iter().enumerate() {
            let slot = layout.data_sources()[t];
            assert!(Arc::ptr_eq(tensor, &inputs[slot]));
            assert_eq!(full[slot], data_descs[t]);
        }

        // Dynamic slots get synthesized descriptors and nothing else does.
        for (slot, role) in layout.roles().iter().enumerate() {
            match role {
                SlotRole::Dynamic { func, .. } => {
                    assert_eq!(full[slot], TensorDesc::bytes(func.param_size().unwrap()));
                }
                SlotRole::AippData { tensor_idx, .. } | SlotRole::Data { tensor_idx } => {
                    assert_eq!(full[slot], data_descs[*tensor_idx]);
                }
            }
        }
    }
}

#[test]
fn layout_partitions_all_slots() {
    for (configs, data_len) in duality_cases() {
        let layout = InputLayout::plan_for_data(&configs, data_len).unwrap();
        let mut seen = vec![0u32; layout.total_len()];
        for &slot in layout.data_sources() {
            seen[slot] += 1;
        }
        for slot in layout.dynamic_slots() {
            seen[slot] += 1;
        }
        assert!(seen.iter().all(|&n| n == 1), "{:?}", seen);
    }
}
