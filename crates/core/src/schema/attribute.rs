//! Attribute definition for object schemas.

use crate::types::DataType;
use alloc::string::String;

/// A persisted attribute declared by an object schema.
#[derive(Clone, Debug)]
pub struct AttributeDef {
    /// Attribute name.
    name: String,
    /// Data type of the attribute.
    data_type: DataType,
    /// Whether this attribute allows null values.
    nullable: bool,
}

impl AttributeDef {
    /// Creates a new attribute definition.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        let nullable = data_type.is_nullable_by_default();
        Self {
            name,
            data_type,
            nullable,
        }
    }

    /// Sets whether this attribute is nullable.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Returns the attribute name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the data type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns whether this attribute is nullable.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl PartialEq for AttributeDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.data_type == other.data_type
    }
}
