use std::collections::{btree_map::Entry, BTreeMap};

use log::trace;

use crate::{value::Value, RuntimeError};

/// The single, flat variable store of one run. Names are declared exactly once and can only be
/// read or assigned after that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    values: BTreeMap<String, Value>,
}

impl Environment {
    pub fn declare(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        match self.values.entry(name.to_string()) {
            Entry::Occupied(_) => Err(RuntimeError::AlreadyDeclared(name.to_string())),
            Entry::Vacant(entry) => {
                trace!("Declared {} = {:?}", name, value);
                entry.insert(value);
                Ok(())
            }
        }
    }

    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        match self.values.get_mut(name) {
            Some(slot) => {
                trace!("Assigned {} = {:?}", name, value);
                *slot = value;
                Ok(())
            }
            None => Err(RuntimeError::Undeclared(name.to_string())),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&Value, RuntimeError> {
        self.get(name).ok_or_else(|| RuntimeError::Undeclared(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}
