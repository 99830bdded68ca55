//! Error types for the Ripple object store.

use crate::object::ObjectId;
use crate::types::DataType;
use alloc::string::String;
use core::fmt;

/// Result type alias for Ripple operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for object-store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Lookup by id on a table or view where the id is absent or no longer
    /// a member. Recoverable, handled by callers.
    ObjectNotFound {
        table: String,
        id: ObjectId,
    },
    /// Remove of an object that was already removed. Programmer error,
    /// surfaced rather than swallowed.
    AlreadyRemoved {
        table: String,
        id: ObjectId,
    },
    /// Table not found.
    TableNotFound {
        name: String,
    },
    /// Attribute not declared in the referenced schema.
    AttributeNotFound {
        table: String,
        attribute: String,
    },
    /// Type mismatch error.
    TypeMismatch {
        expected: DataType,
        got: Option<DataType>,
    },
    /// Invalid schema declaration.
    InvalidSchema {
        message: String,
    },
    /// Malformed predicate or parameter binding mismatch.
    InvalidPredicate {
        message: String,
    },
    /// Malformed join specification.
    InvalidJoin {
        message: String,
    },
    /// Operating on a torn-down store/table or an unlinked tracker.
    InvalidState {
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ObjectNotFound { table, id } => {
                write!(f, "Object {} not found in table {}", id, table)
            }
            Error::AlreadyRemoved { table, id } => {
                write!(f, "Object {} already removed from table {}", id, table)
            }
            Error::TableNotFound { name } => {
                write!(f, "Table not found: {}", name)
            }
            Error::AttributeNotFound { table, attribute } => {
                write!(f, "Attribute {} not declared in table {}", attribute, table)
            }
            Error::TypeMismatch { expected, got } => match got {
                Some(got) => write!(f, "Type mismatch: expected {:?}, got {:?}", expected, got),
                None => write!(f, "Type mismatch: expected {:?}, got Null", expected),
            },
            Error::InvalidSchema { message } => {
                write!(f, "Invalid schema: {}", message)
            }
            Error::InvalidPredicate { message } => {
                write!(f, "Invalid predicate: {}", message)
            }
            Error::InvalidJoin { message } => {
                write!(f, "Invalid join: {}", message)
            }
            Error::InvalidState { message } => {
                write!(f, "Invalid state: {}", message)
            }
        }
    }
}

impl Error {
    /// Creates an object-not-found error.
    pub fn object_not_found(table: impl Into<String>, id: ObjectId) -> Self {
        Error::ObjectNotFound {
            table: table.into(),
            id,
        }
    }

    /// Creates an already-removed error.
    pub fn already_removed(table: impl Into<String>, id: ObjectId) -> Self {
        Error::AlreadyRemoved {
            table: table.into(),
            id,
        }
    }

    /// Creates a table-not-found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Error::TableNotFound { name: name.into() }
    }

    /// Creates an attribute-not-found error.
    pub fn attribute_not_found(table: impl Into<String>, attribute: impl Into<String>) -> Self {
        Error::AttributeNotFound {
            table: table.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: DataType, got: Option<DataType>) -> Self {
        Error::TypeMismatch { expected, got }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates an invalid predicate error.
    pub fn invalid_predicate(message: impl Into<String>) -> Self {
        Error::InvalidPredicate {
            message: message.into(),
        }
    }

    /// Creates an invalid join error.
    pub fn invalid_join(message: impl Into<String>) -> Self {
        Error::InvalidJoin {
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Error::InvalidState {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::object_not_found("item", 7);
        assert!(err.to_string().contains("item"));
        assert!(err.to_string().contains('7'));

        let err = Error::type_mismatch(DataType::Int64, Some(DataType::String));
        assert!(err.to_string().contains("Type mismatch"));

        let err = Error::table_not_found("feed");
        assert!(err.to_string().contains("feed"));
    }

    #[test]
    fn test_error_constructors() {
        let err = Error::already_removed("item", 3);
        match err {
            Error::AlreadyRemoved { table, id } => {
                assert_eq!(table, "item");
                assert_eq!(id, 3);
            }
            _ => panic!("Wrong error type"),
        }

        let err = Error::invalid_state("tracker unlinked");
        match err {
            Error::InvalidState { message } => assert_eq!(message, "tracker unlinked"),
            _ => panic!("Wrong error type"),
        }
    }
}
