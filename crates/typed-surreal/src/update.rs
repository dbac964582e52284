//! Update semantics: CONTENT vs MERGE
//!
//! A [`Patch`] records exactly which fields the caller set, so a MERGE never
//! overwrites stored values with language-level defaults. CONTENT treats the
//! patch as the complete new state of the record.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

use crate::mapper::{self, ID_FIELD};
use crate::Result;

/// How an update applies its patch to stored records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateMode {
    /// Replace the stored record wholesale; absent fields are lost
    Content,
    /// Overlay only the fields present in the patch; nested objects merge
    Merge,
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateMode::Content => f.write_str("CONTENT"),
            UpdateMode::Merge => f.write_str("MERGE"),
        }
    }
}

/// Field-name → value map with explicit presence per field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    fields: Map<String, Value>,
}

impl Patch {
    /// Empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `field` as set to `value`.
    pub fn set(mut self, field: impl Into<String>, value: impl Serialize) -> Result<Self> {
        let value = mapper::to_generic(&value)?;
        self.fields.insert(field.into(), value);
        Ok(self)
    }

    /// Every field of `record` is authoritative (identity excluded).
    pub fn from_record<T: Serialize + ?Sized>(record: &T) -> Result<Self> {
        Ok(Self {
            fields: mapper::to_content(record)?,
        })
    }

    /// Only the listed fields of `record`; names the record does not
    /// serialize are skipped.
    pub fn pick<T: Serialize + ?Sized>(record: &T, fields: &[&str]) -> Result<Self> {
        let mut all = mapper::to_content(record)?;
        let fields = fields
            .iter()
            .filter_map(|name| all.remove(*name).map(|value| (name.to_string(), value)))
            .collect();
        Ok(Self { fields })
    }

    /// Drop a field from the patch, returning its value if it was set.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of the fields that are set
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl From<Map<String, Value>> for Patch {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// One resolved update request: a mode token plus its patch
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    mode: UpdateMode,
    patch: Patch,
}

impl Update {
    pub fn new(mode: UpdateMode, patch: Patch) -> Self {
        Self { mode, patch }
    }

    /// Replace stored records with the full state of `record`.
    pub fn content<T: Serialize + ?Sized>(record: &T) -> Result<Self> {
        Ok(Self::new(UpdateMode::Content, Patch::from_record(record)?))
    }

    /// Overlay the fields set in `patch`.
    pub fn merge(patch: Patch) -> Self {
        Self::new(UpdateMode::Merge, patch)
    }

    pub fn mode(&self) -> UpdateMode {
        self.mode
    }

    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    /// Resolve into the mode and the generic body sent to the store. The
    /// identity field never travels with an update.
    pub(crate) fn into_parts(self) -> (UpdateMode, Map<String, Value>) {
        let mut fields = self.patch.fields;
        if fields.remove(ID_FIELD).is_some() {
            debug!("Dropping identity field from {} patch", self.mode);
        }
        (self.mode, fields)
    }
}

/// Apply an update body to a stored record in place, keeping its identity.
///
/// This is the reference semantics the in-memory transport uses; remote
/// stores interpret the mode themselves.
pub(crate) fn apply(stored: &mut Map<String, Value>, mode: UpdateMode, body: &Map<String, Value>) {
    let id = stored.remove(ID_FIELD);
    match mode {
        UpdateMode::Content => *stored = body.clone(),
        UpdateMode::Merge => merge_objects(stored, body),
    }
    if let Some(id) = id {
        stored.insert(ID_FIELD.to_string(), id);
    }
}

fn merge_objects(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (field, value) in patch {
        if let (Some(Value::Object(existing)), Value::Object(nested)) =
            (target.get_mut(field), value)
        {
            merge_objects(existing, nested);
            continue;
        }
        target.insert(field.clone(), value.clone());
    }
}
