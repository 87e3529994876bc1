// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod call;
pub mod read;
pub mod status;
pub mod write;

use mediator_core::{ObjectRef, VariableRef};

/// Parses `module:object.variable` into a [`VariableRef`].
pub fn parse_variable_ref(s: &str) -> anyhow::Result<VariableRef> {
    let (module_object, name) = s
        .rsplit_once('.')
        .ok_or_else(|| anyhow::anyhow!("expected `module:object.variable`, got `{s}`"))?;
    let (module_id, object_id) = module_object
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("expected `module:object.variable`, got `{s}`"))?;
    Ok(VariableRef::new(
        ObjectRef::new(module_id, object_id),
        name,
    ))
}
