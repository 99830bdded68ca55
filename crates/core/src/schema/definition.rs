//! Object schema declaration for the Ripple object store.

use super::attribute::AttributeDef;
use crate::error::{Error, Result};
use crate::types::DataType;
use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// The schema for one declared object type.
///
/// Declares the table name, the persisted attributes with their types, and
/// which attribute names participate in `changed_attributes` tracking.
/// Tracked names need not be declared attributes.
#[derive(Clone, Debug)]
pub struct ObjectSchema {
    /// Table name.
    name: String,
    /// Declared attribute definitions.
    attributes: Vec<AttributeDef>,
    /// Attribute names whose mutations are recorded in `changed_attributes`.
    tracked: BTreeSet<String>,
}

impl ObjectSchema {
    /// Returns the table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared attributes.
    #[inline]
    pub fn attributes(&self) -> &[AttributeDef] {
        &self.attributes
    }

    /// Gets a declared attribute by name.
    pub fn get_attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// Returns whether mutations of the named attribute are tracked.
    pub fn is_tracked(&self, name: &str) -> bool {
        self.tracked.contains(name)
    }

    /// Returns the tracked attribute names.
    #[inline]
    pub fn tracked(&self) -> &BTreeSet<String> {
        &self.tracked
    }
}

/// Builder for object schemas.
pub struct SchemaBuilder {
    name: String,
    attributes: Vec<AttributeDef>,
    tracked: BTreeSet<String>,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_naming_rules(&name)?;
        Ok(Self {
            name,
            attributes: Vec::new(),
            tracked: BTreeSet::new(),
        })
    }

    /// Adds an attribute to the schema.
    pub fn add_attribute(mut self, name: impl Into<String>, data_type: DataType) -> Result<Self> {
        let name = name.into();
        check_naming_rules(&name)?;
        if name == "id" {
            return Err(Error::invalid_schema("Attribute name 'id' is reserved"));
        }
        if self.attributes.iter().any(|a| a.name() == name) {
            return Err(Error::invalid_schema(format!(
                "Attribute already declared: {}",
                name
            )));
        }
        self.attributes.push(AttributeDef::new(name, data_type));
        Ok(self)
    }

    /// Marks the named attributes as nullable.
    pub fn nullable(mut self, names: &[&str]) -> Self {
        for name in names {
            if let Some(attr) = self.attributes.iter_mut().find(|a| a.name() == *name) {
                *attr = attr.clone().nullable(true);
            }
        }
        self
    }

    /// Declares that mutations of the named attribute are recorded in
    /// `changed_attributes`. The name need not be a declared attribute.
    pub fn track_attribute_changes(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_naming_rules(&name)?;
        self.tracked.insert(name);
        Ok(self)
    }

    /// Builds the schema.
    pub fn build(self) -> ObjectSchema {
        ObjectSchema {
            name: self.name,
            attributes: self.attributes,
            tracked: self.tracked,
        }
    }
}

/// Validates a name follows naming rules.
fn check_naming_rules(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_schema("Name cannot be empty"));
    }
    let first = name.chars().next().unwrap();
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(Error::invalid_schema(format!(
            "Name must start with letter or underscore: {}",
            name
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::invalid_schema(format!(
            "Name contains invalid characters: {}",
            name
        )));
    }
    Ok(())
}
