// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifiers for objects, variables and historian channels.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::module_state::ModuleId;

crate::define_id! {
    /// Identifies a configured object within its owning module.
    pub struct ObjectId;
}

crate::define_id! {
    /// Identifies a historian channel (one per variable actually appended to).
    pub struct ChannelId;
}

/// `(moduleID, localObjectID)` — globally identifies a configured object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub module_id: ModuleId,
    pub object_id: ObjectId,
}

impl ObjectRef {
    pub fn new(module_id: impl Into<ModuleId>, object_id: impl Into<ObjectId>) -> Self {
        Self {
            module_id: module_id.into(),
            object_id: object_id.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module_id, self.object_id)
    }
}

/// `(ObjectRef, name)` — globally identifies a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableRef {
    pub object: ObjectRef,
    pub name: String,
}

impl VariableRef {
    pub fn new(object: ObjectRef, name: impl Into<String>) -> Self {
        Self {
            object,
            name: name.into(),
        }
    }

    pub fn module_id(&self) -> &ModuleId {
        &self.object.module_id
    }
}

impl fmt::Display for VariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.object, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_ref_resolves_to_one_module() {
        let a = VariableRef::new(ObjectRef::new("modA", "obj1"), "temp");
        let b = VariableRef::new(ObjectRef::new("modA", "obj1"), "temp");
        assert_eq!(a, b);
        assert_eq!(a.module_id().as_str(), "modA");
    }

    #[test]
    fn display_formats_are_stable() {
        let v = VariableRef::new(ObjectRef::new("modA", "obj1"), "temp");
        assert_eq!(v.to_string(), "modA:obj1.temp");
    }

    #[test]
    fn distinct_objects_are_not_equal() {
        let a = ObjectRef::new("modA", "obj1");
        let b = ObjectRef::new("modA", "obj2");
        assert_ne!(a, b);
    }
}
