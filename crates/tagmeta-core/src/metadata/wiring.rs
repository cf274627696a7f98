//! Injection and extraction models.
//!
//! An [`Injection`] is one way to write a decoded value into a struct, an
//! [`Extraction`] the one way to read it back out. Both only point at
//! members of the described class; neither owns any data.

use crate::class::Requiredness;
use std::fmt;

/// Thrift field id
pub type FieldId = i16;

/// A member that takes arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Callable {
    /// The `index`-th constructor of `class`
    Constructor {
        /// Owning class
        class: String,
        /// Position in the class's constructor list
        index: usize,
    },
    /// Method `name` of `class`
    Method {
        /// Owning class
        class: String,
        /// Method name
        name: String,
    },
}

impl Callable {
    /// Class the callable belongs to
    pub fn class(&self) -> &str {
        match self {
            Callable::Constructor { class, .. } | Callable::Method { class, .. } => class,
        }
    }

    /// Returns the method name, or `None` for constructors
    pub fn method_name(&self) -> Option<&str> {
        match self {
            Callable::Method { name, .. } => Some(name),
            Callable::Constructor { .. } => None,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Constructor { class, index } => write!(f, "{}#<init>[{}]", class, index),
            Callable::Method { class, name } => write!(f, "{}.{}", class, name),
        }
    }
}

/// Direct write to a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInjection {
    /// Field id
    pub id: FieldId,
    /// Field name
    pub name: String,
    /// Name of the written class field
    pub field: String,
}

/// Positional argument of a constructor, setter, builder method or factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInjection {
    /// Field id
    pub id: FieldId,
    /// Field name
    pub name: String,
    /// Declared parameter name
    pub parameter_name: String,
    /// Zero-based position in the owner's parameter list
    pub parameter_index: usize,
    /// Declared requiredness of the parameter's tag
    pub requiredness: Requiredness,
    /// Constructor or method taking the argument
    pub owner: Callable,
}

/// One way to set a field's value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injection {
    /// Field write
    Field(FieldInjection),
    /// Constructor or method argument
    Parameter(ParameterInjection),
}

impl Injection {
    /// Field id
    pub fn id(&self) -> FieldId {
        match self {
            Injection::Field(i) => i.id,
            Injection::Parameter(i) => i.id,
        }
    }

    /// Field name
    pub fn name(&self) -> &str {
        match self {
            Injection::Field(i) => &i.name,
            Injection::Parameter(i) => &i.name,
        }
    }

    /// Returns the parameter injection, if this is one
    pub fn as_parameter(&self) -> Option<&ParameterInjection> {
        match self {
            Injection::Parameter(p) => Some(p),
            Injection::Field(_) => None,
        }
    }

    /// Returns the field injection, if this is one
    pub fn as_field(&self) -> Option<&FieldInjection> {
        match self {
            Injection::Field(f) => Some(f),
            Injection::Parameter(_) => None,
        }
    }
}

impl fmt::Display for Injection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Injection::Field(i) => write!(f, "field `{}`", i.field),
            Injection::Parameter(i) => write!(
                f,
                "parameter {} (`{}`) of {}",
                i.parameter_index, i.parameter_name, i.owner
            ),
        }
    }
}

/// Direct read of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldExtraction {
    /// Field id
    pub id: FieldId,
    /// Field name
    pub name: String,
    /// Name of the read class field
    pub field: String,
}

/// Accessor method call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodExtraction {
    /// Field id
    pub id: FieldId,
    /// Field name
    pub name: String,
    /// Name of the accessor method
    pub method: String,
}

/// The way to read a field's value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Field read
    Field(FieldExtraction),
    /// Accessor call
    Method(MethodExtraction),
}

impl Extraction {
    /// Field id
    pub fn id(&self) -> FieldId {
        match self {
            Extraction::Field(e) => e.id,
            Extraction::Method(e) => e.id,
        }
    }

    /// Field name
    pub fn name(&self) -> &str {
        match self {
            Extraction::Field(e) => &e.name,
            Extraction::Method(e) => &e.name,
        }
    }

    /// Name of the member that is read
    pub fn member(&self) -> &str {
        match self {
            Extraction::Field(e) => &e.field,
            Extraction::Method(e) => &e.method,
        }
    }
}

impl fmt::Display for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extraction::Field(e) => write!(f, "field `{}`", e.field),
            Extraction::Method(e) => write!(f, "method `{}`", e.method),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injection_accessors() {
        let injection = Injection::Parameter(ParameterInjection {
            id: 2,
            name: "type".to_string(),
            parameter_name: "type".to_string(),
            parameter_index: 1,
            requiredness: Requiredness::Unspecified,
            owner: Callable::Constructor {
                class: "Bonk".to_string(),
                index: 0,
            },
        });
        assert_eq!(injection.id(), 2);
        assert_eq!(injection.name(), "type");
        assert!(injection.as_field().is_none());
        assert_eq!(injection.to_string(), "parameter 1 (`type`) of Bonk#<init>[0]");
    }

    #[test]
    fn test_extraction_member() {
        let extraction = Extraction::Method(MethodExtraction {
            id: 1,
            name: "message".to_string(),
            method: "getMessage".to_string(),
        });
        assert_eq!(extraction.member(), "getMessage");
        assert_eq!(extraction.to_string(), "method `getMessage`");
    }
}
