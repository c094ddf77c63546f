//! Caller-facing input slot planning.
//!
//! A model with AIPP nodes exposes more inputs to callers than its compiled
//! graph consumes: every dynamic parameter is an extra caller slot. The
//! [`InputLayout`] assigns a role to every caller slot and pairs each
//! data-only slot with the caller slot feeding it. Tensor conversion and
//! descriptor conversion both read the same layout.

use serde::Serialize;

use super::config::AippPreprocessConfig;
use super::params::AippFunc;
use crate::error::{AippError, Result};

/// What a caller-facing input slot carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum SlotRole {
    /// Image input of AIPP node `node`, feeding data slot `tensor_idx`.
    AippData { node: usize, tensor_idx: usize },
    /// Dynamic parameter tensor configuring `func` on node `node`.
    Dynamic { node: usize, func: AippFunc },
    /// Plain model input feeding data slot `tensor_idx`.
    Data { tensor_idx: usize },
}

impl SlotRole {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic { .. })
    }

    /// Data-only slot fed by this caller slot.
    pub fn tensor_idx(&self) -> Option<usize> {
        match *self {
            Self::AippData { tensor_idx, .. } | Self::Data { tensor_idx } => Some(tensor_idx),
            Self::Dynamic { .. } => None,
        }
    }
}

/// Pair free target slots with free source slots in order.
///
/// The k-th untaken target receives the k-th untaken source. Returns
/// `(target, source)` pairs; surplus slots on either side stay unpaired.
pub fn fill_unassigned(target_taken: &[bool], source_taken: &[bool]) -> Vec<(usize, usize)> {
    let free = |taken: &[bool]| -> Vec<usize> {
        taken
            .iter()
            .enumerate()
            .filter(|(_, t)| !**t)
            .map(|(i, _)| i)
            .collect()
    };
    free(target_taken)
        .into_iter()
        .zip(free(source_taken))
        .collect()
}

/// Number of dynamic parameter inputs declared across `configs`.
pub fn dynamic_input_count(configs: &[AippPreprocessConfig]) -> usize {
    configs.iter().map(|c| c.config_data.len()).sum()
}

/// Role of every caller-facing slot plus the data-slot mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputLayout {
    roles: Vec<SlotRole>,
    /// `data_sources[t]` is the caller slot feeding data slot `t`.
    data_sources: Vec<usize>,
}

impl InputLayout {
    /// Plan `total_inputs` caller slots for `configs`.
    ///
    /// Fails with `InvalidArgument` unless there are strictly more caller
    /// slots than dynamic inputs, with `OutOfRange` on any index outside its
    /// vector, with `InvalidArgument` when two entries claim the same slot
    /// and with `Unsupported` for a dynamic feature without a parameter
    /// record.
    pub fn plan(configs: &[AippPreprocessConfig], total_inputs: usize) -> Result<Self> {
        let dynamic = dynamic_input_count(configs);
        if total_inputs <= dynamic {
            tracing::error!(
                inputs = total_inputs,
                dynamic_inputs = dynamic,
                "not enough inputs for the declared dynamic AIPP parameters"
            );
            return Err(AippError::InvalidArgument(format!(
                "{} inputs cannot cover {} dynamic AIPP inputs",
                total_inputs, dynamic
            )));
        }
        let data_len = total_inputs - dynamic;

        let mut roles: Vec<Option<SlotRole>> = vec![None; total_inputs];
        let mut data_sources: Vec<Option<usize>> = vec![None; data_len];

        for (node, config) in configs.iter().enumerate() {
            let graph_idx = checked_index("graph data", config.graph_data_idx, total_inputs)?;
            let tensor_idx = checked_index("tensor data", config.tensor_data_idx, data_len)?;
            claim(&mut roles, graph_idx, SlotRole::AippData { node, tensor_idx })?;
            if data_sources[tensor_idx].replace(graph_idx).is_some() {
                return Err(AippError::InvalidArgument(format!(
                    "data slot {} claimed by more than one AIPP node",
                    tensor_idx
                )));
            }

            for info in &config.config_data {
                let slot = checked_index("dynamic input", info.idx, total_inputs)?;
                if info.func.param_size().is_none() {
                    tracing::error!(func = ?info.func, "dynamic parameter input not supported");
                    return Err(AippError::Unsupported(format!(
                        "{:?} has no dynamic parameter input",
                        info.func
                    )));
                }
                claim(&mut roles, slot, SlotRole::Dynamic { node, func: info.func })?;
            }
        }

        let data_taken: Vec<bool> = data_sources.iter().map(Option::is_some).collect();
        let slot_taken: Vec<bool> = roles.iter().map(Option::is_some).collect();
        for (tensor_idx, slot) in fill_unassigned(&data_taken, &slot_taken) {
            roles[slot] = Some(SlotRole::Data { tensor_idx });
            data_sources[tensor_idx] = Some(slot);
        }

        let roles = roles
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| AippError::InvalidArgument("caller slot left unassigned".into()))?;
        let data_sources = data_sources
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| AippError::InvalidArgument("data slot left unassigned".into()))?;

        Ok(Self {
            roles,
            data_sources,
        })
    }

    /// Plan the caller-facing slots for a model consuming `data_len` inputs.
    pub fn plan_for_data(configs: &[AippPreprocessConfig], data_len: usize) -> Result<Self> {
        Self::plan(configs, data_len + dynamic_input_count(configs))
    }

    pub fn roles(&self) -> &[SlotRole] {
        &self.roles
    }

    pub fn data_sources(&self) -> &[usize] {
        &self.data_sources
    }

    /// Number of caller-facing slots.
    pub fn total_len(&self) -> usize {
        self.roles.len()
    }

    /// Number of data-only slots.
    pub fn data_len(&self) -> usize {
        self.data_sources.len()
    }

    /// Caller slots holding dynamic parameters, ascending.
    pub fn dynamic_slots(&self) -> Vec<usize> {
        self.roles
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_dynamic())
            .map(|(i, _)| i)
            .collect()
    }
}

fn checked_index(what: &'static str, idx: i32, len: usize) -> Result<usize> {
    if idx < 0 || idx as usize >= len {
        tracing::error!(what, idx, len, "index out of range");
        return Err(AippError::out_of_range(what, idx, len));
    }
    Ok(idx as usize)
}

fn claim(roles: &mut [Option<SlotRole>], slot: usize, role: SlotRole) -> Result<()> {
    if let Some(existing) = roles[slot] {
        return Err(AippError::InvalidArgument(format!(
            "input slot {} claimed twice ({:?} and {:?})",
            slot, existing, role
        )));
    }
    roles[slot] = Some(role);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aipp::config::AippConfigDataInfo;

    fn config(graph: i32, tensor: i32, dynamic: &[(i32, AippFunc)]) -> AippPreprocessConfig {
        AippPreprocessConfig {
            graph_data_idx: graph,
            tensor_data_idx: tensor,
            config_data: dynamic
                .iter()
                .map(|&(idx, func)| AippConfigDataInfo { idx, func })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn fill_pairs_free_slots_in_order() {
        let pairs = fill_unassigned(&[true, false, false], &[false, true, false, true, false]);
        assert_eq!(pairs, vec![(1, 0), (2, 2)]);
    }

    #[test]
    fn fill_with_nothing_free() {
        assert!(fill_unassigned(&[true], &[true, true]).is_empty());
    }

    #[test]
    fn plans_mixed_inputs() {
        // caller: [plain, image, crop, plain]; model data: [image, plain, plain]
        let configs = vec![config(1, 0, &[(2, AippFunc::Crop)])];
        let layout = InputLayout::plan(&configs, 4).unwrap();
        assert_eq!(
            layout.roles(),
            &[
                SlotRole::Data { tensor_idx: 1 },
                SlotRole::AippData { node: 0, tensor_idx: 0 },
                SlotRole::Dynamic { node: 0, func: AippFunc::Crop },
                SlotRole::Data { tensor_idx: 2 },
            ]
        );
        assert_eq!(layout.data_sources(), &[1, 0, 3]);
        assert_eq!(layout.dynamic_slots(), vec![2]);
    }

    #[test]
    fn needs_more_inputs_than_dynamic_slots() {
        let configs = vec![config(0, 0, &[(1, AippFunc::Crop)])];
        assert!(matches!(
            InputLayout::plan(&configs, 1),
            Err(AippError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let configs = vec![config(0, 1, &[(1, AippFunc::Crop)])];
        assert!(matches!(
            InputLayout::plan(&configs, 2),
            Err(AippError::OutOfRange { what: "tensor data", .. })
        ));
        let configs = vec![config(-1, 0, &[])];
        assert!(matches!(
            InputLayout::plan(&configs, 2),
            Err(AippError::OutOfRange { what: "graph data", .. })
        ));
    }

    #[test]
    fn rejects_double_claims() {
        let configs = vec![config(0, 0, &[(0, AippFunc::Crop)])];
        assert!(matches!(
            InputLayout::plan(&configs, 3),
            Err(AippError::InvalidArgument(_))
        ));
        let configs = vec![config(0, 0, &[]), config(1, 0, &[])];
        assert!(matches!(
            InputLayout::plan(&configs, 2),
            Err(AippError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rotation_cannot_be_dynamic() {
        let configs = vec![config(0, 0, &[(1, AippFunc::Rotation)])];
        assert!(matches!(
            InputLayout::plan(&configs, 2),
            Err(AippError::Unsupported(_))
        ));
    }
}
