// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-module `VariableRef -> VTQ` map, with atomic whole-file
//! persistence.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mediator_core::refs::{ObjectRef, VariableRef};
use mediator_core::variable::Variable;
use mediator_core::Vtq;

#[derive(Debug, Error)]
pub enum VariableStoreError {
    #[error("variable not found: {0}")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Abstracts the filesystem operations behind `Flush`, so the atomic
/// write-rename sequence can be tested without real disk I/O.
pub trait VariablesFileWriter: Send + Sync {
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), VariableStoreError>;
    fn fsync(&self, path: &Path) -> Result<(), VariableStoreError>;
    fn rename(&self, from: &Path, to: &Path) -> Result<(), VariableStoreError>;
}

#[derive(Clone, Default)]
pub struct FsVariablesFileWriter;

impl VariablesFileWriter for FsVariablesFileWriter {
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), VariableStoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(data)?;
        Ok(())
    }

    fn fsync(&self, path: &Path) -> Result<(), VariableStoreError> {
        File::open(path)?.sync_all()?;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), VariableStoreError> {
        std::fs::rename(from, to)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedEntry {
    variable: VariableRef,
    value: Vtq,
}

/// One module's live values, keyed by `VariableRef`, plus whether each is
/// configured for history (the historian manager consults this to decide
/// whether an `Update` is also routed to the historian).
pub struct VariableStore<W: VariablesFileWriter = FsVariablesFileWriter> {
    values: HashMap<VariableRef, Vtq>,
    historized: HashMap<VariableRef, bool>,
    writer: W,
    path: PathBuf,
}

impl VariableStore<FsVariablesFileWriter> {
    pub fn new(path: PathBuf) -> Self {
        Self::with_writer(FsVariablesFileWriter, path)
    }
}

impl<W: VariablesFileWriter> VariableStore<W> {
    pub fn with_writer(writer: W, path: PathBuf) -> Self {
        Self {
            values: HashMap::new(),
            historized: HashMap::new(),
            writer,
            path,
        }
    }

    /// Restore from a previously flushed variables file. A missing file is
    /// treated as an empty store (first boot).
    pub fn load(writer: W, path: PathBuf) -> Result<Self, VariableStoreError> {
        let mut store = Self::with_writer(writer, path.clone());
        if !path.exists() {
            return Ok(store);
        }
        let data = std::fs::read_to_string(&path)?;
        let entries: Vec<PersistedEntry> = serde_json::from_str(&data)?;
        for entry in entries {
            store.values.insert(entry.variable, entry.value);
        }
        Ok(store)
    }

    pub fn get(&self, var: &VariableRef) -> Result<&Vtq, VariableStoreError> {
        self.values
            .get(var)
            .ok_or_else(|| VariableStoreError::NotFound(var.to_string()))
    }

    /// Atomic within the module: either every entry in `batch` is applied or
    /// none are. Returns `(previous, current)` pairs in input order.
    ///
    /// `reject_stale` controls whether a value whose timestamp is strictly
    /// older than the stored timestamp is rejected instead of applied.
    pub fn update(
        &mut self,
        batch: Vec<(VariableRef, Vtq)>,
        reject_stale: bool,
    ) -> Vec<(Option<Vtq>, Vtq)> {
        let mut results = Vec::with_capacity(batch.len());
        for (var, new_value) in batch {
            let previous = self.values.get(&var).cloned();
            let stale = reject_stale
                && previous
                    .as_ref()
                    .is_some_and(|prev| new_value.timestamp < prev.timestamp);
            let current = if stale {
                previous.clone().unwrap_or_else(|| new_value.clone())
            } else {
                self.values.insert(var, new_value.clone());
                new_value
            };
            results.push((previous, current));
        }
        results
    }

    /// Reconciles store contents with `declared`: variables no longer
    /// declared are dropped, newly declared ones start absent (`Get` will
    /// `NotFound` until the module writes them), and everything unchanged is
    /// preserved.
    pub fn sync(&mut self, object: &ObjectRef, declared: &[Variable]) {
        let declared_names: std::collections::HashSet<&str> =
            declared.iter().map(|v| v.name.as_str()).collect();
        self.values
            .retain(|var, _| var.object != *object || declared_names.contains(var.name.as_str()));
        self.historized
            .retain(|var, _| var.object != *object || declared_names.contains(var.name.as_str()));
        for variable in declared {
            let var_ref = VariableRef::new(object.clone(), variable.name.clone());
            self.historized.insert(var_ref, variable.historize);
        }
    }

    pub fn is_historized(&self, var: &VariableRef) -> bool {
        self.historized.get(var).copied().unwrap_or(false)
    }

    /// Whole-file rewrite: serialize, write to a temp file, fsync, then
    /// rename over the target path.
    pub fn flush(&self) -> Result<(), VariableStoreError> {
        let entries: Vec<PersistedEntry> = self
            .values
            .iter()
            .map(|(variable, value)| PersistedEntry {
                variable: variable.clone(),
                value: value.clone(),
            })
            .collect();
        let data = serde_json::to_vec_pretty(&entries)?;
        let tmp_path = self.path.with_extension("tmp");
        self.writer.write_tmp(&tmp_path, &data)?;
        self.writer.fsync(&tmp_path)?;
        self.writer.rename(&tmp_path, &self.path)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
#[path = "variable_store_tests.rs"]
mod tests;
