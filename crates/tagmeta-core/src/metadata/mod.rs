//! Derived struct metadata.
//!
//! Everything in this module is immutable once built. A [`StructMetadata`]
//! is produced once per class by the builder and then shared read-only
//! through the [`Catalog`](crate::Catalog).

mod wiring;

use crate::class::{Requiredness, TypeRef};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

pub use wiring::{
    Callable, Extraction, FieldExtraction, FieldId, FieldInjection, Injection, MethodExtraction,
    ParameterInjection,
};

/// How instances of a struct are created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructionStrategy {
    /// No-argument constructor, then field writes
    Field,
    /// Tagged constructor (or static factory)
    Constructor,
    /// No-argument constructor, then setter calls
    Method,
    /// A separate builder class
    Builder,
}

impl ConstructionStrategy {
    /// Returns the strategy name
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstructionStrategy::Field => "field",
            ConstructionStrategy::Constructor => "constructor",
            ConstructionStrategy::Method => "method",
            ConstructionStrategy::Builder => "builder",
        }
    }
}

impl fmt::Display for ConstructionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference from a field to the metadata of a struct type it mentions
#[derive(Clone)]
pub enum StructLink {
    /// Built before the referencing struct
    Resolved(Arc<StructMetadata>),
    /// Part of a reference cycle; resolved through
    /// [`Catalog::resolve`](crate::Catalog::resolve) once published
    Deferred(String),
}

impl StructLink {
    /// Name of the referenced class
    pub fn class(&self) -> &str {
        match self {
            StructLink::Resolved(metadata) => metadata.class(),
            StructLink::Deferred(class) => class,
        }
    }

    /// Returns true for cycle edges
    pub fn is_deferred(&self) -> bool {
        matches!(self, StructLink::Deferred(_))
    }
}

impl fmt::Debug for StructLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructLink::Resolved(metadata) => f.debug_tuple("Resolved").field(&metadata.class()).finish(),
            StructLink::Deferred(class) => f.debug_tuple("Deferred").field(class).finish(),
        }
    }
}

impl PartialEq for StructLink {
    fn eq(&self, other: &Self) -> bool {
        self.is_deferred() == other.is_deferred() && self.class() == other.class()
    }
}

impl Eq for StructLink {}

/// Metadata of one logical field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    pub(crate) id: FieldId,
    pub(crate) name: String,
    pub(crate) requiredness: Requiredness,
    pub(crate) ty: TypeRef,
    pub(crate) extraction: Extraction,
    pub(crate) injections: Vec<Injection>,
    pub(crate) struct_links: Vec<StructLink>,
}

impl FieldMetadata {
    /// Field id
    pub fn id(&self) -> FieldId {
        self.id
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared requiredness
    pub fn requiredness(&self) -> Requiredness {
        self.requiredness
    }

    /// Declared value type
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// How the value is read
    pub fn extraction(&self) -> &Extraction {
        &self.extraction
    }

    /// How the value is written, in discovery order
    pub fn injections(&self) -> &[Injection] {
        &self.injections
    }

    /// Metadata of each struct type mentioned by [`ty`](Self::ty)
    pub fn struct_links(&self) -> &[StructLink] {
        &self.struct_links
    }

    /// Every field carries exactly one extraction
    pub fn is_readable(&self) -> bool {
        true
    }

    /// Has at least one injection
    pub fn is_writable(&self) -> bool {
        !self.injections.is_empty()
    }

    /// Readable but not writable
    pub fn is_read_only(&self) -> bool {
        self.is_readable() && !self.is_writable()
    }
}

/// The constructor used to create the instance (or the builder)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorMetadata {
    pub(crate) owner: Callable,
    pub(crate) parameters: Vec<ParameterInjection>,
}

impl ConstructorMetadata {
    /// Constructor or factory method
    pub fn owner(&self) -> &Callable {
        &self.owner
    }

    /// Parameters in positional order, empty for a no-argument constructor
    pub fn parameters(&self) -> &[ParameterInjection] {
        &self.parameters
    }
}

/// A setter-style call applied after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInjectionMetadata {
    pub(crate) method: Callable,
    pub(crate) parameters: Vec<ParameterInjection>,
}

impl MethodInjectionMetadata {
    /// The called method
    pub fn method(&self) -> &Callable {
        &self.method
    }

    /// Method name
    pub fn name(&self) -> &str {
        self.method.method_name().unwrap_or_default()
    }

    /// Arguments in positional order
    pub fn parameters(&self) -> &[ParameterInjection] {
        &self.parameters
    }
}

/// The builder used by builder-style structs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderMetadata {
    pub(crate) class: String,
    pub(crate) factory: Callable,
    pub(crate) factory_parameters: Vec<ParameterInjection>,
}

impl BuilderMetadata {
    /// Builder class name
    pub fn class(&self) -> &str {
        &self.class
    }

    /// The build method producing the struct
    pub fn factory(&self) -> &Callable {
        &self.factory
    }

    /// Arguments of the build method
    pub fn factory_parameters(&self) -> &[ParameterInjection] {
        &self.factory_parameters
    }
}

/// Canonical, wire-agnostic description of a struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructMetadata {
    pub(crate) class: String,
    pub(crate) strategy: ConstructionStrategy,
    pub(crate) fields: IndexMap<FieldId, FieldMetadata>,
    pub(crate) constructor: ConstructorMetadata,
    pub(crate) method_injections: Vec<MethodInjectionMetadata>,
    pub(crate) builder: Option<BuilderMetadata>,
}

impl StructMetadata {
    /// Struct class identity
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Construction strategy
    pub fn strategy(&self) -> ConstructionStrategy {
        self.strategy
    }

    /// Field by id
    pub fn field(&self, id: FieldId) -> Option<&FieldMetadata> {
        self.fields.get(&id)
    }

    /// Field by name
    pub fn field_by_name(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.values().find(|f| f.name == name)
    }

    /// Fields in discovery order
    pub fn fields(&self) -> impl Iterator<Item = &FieldMetadata> {
        self.fields.values()
    }

    /// Number of fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Constructor of the struct, or of its builder for builder-style structs
    pub fn constructor(&self) -> &ConstructorMetadata {
        &self.constructor
    }

    /// Setter calls applied after construction, in discovery order
    pub fn method_injections(&self) -> &[MethodInjectionMetadata] {
        &self.method_injections
    }

    /// Builder description, for builder-style structs
    pub fn builder(&self) -> Option<&BuilderMetadata> {
        self.builder.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(class: &str) -> StructMetadata {
        StructMetadata {
            class: class.to_string(),
            strategy: ConstructionStrategy::Field,
            fields: IndexMap::new(),
            constructor: ConstructorMetadata {
                owner: Callable::Constructor {
                    class: class.to_string(),
                    index: 0,
                },
                parameters: Vec::new(),
            },
            method_injections: Vec::new(),
            builder: None,
        }
    }

    #[test]
    fn test_struct_link_equality() {
        let resolved = StructLink::Resolved(Arc::new(metadata("Leaf")));
        assert_eq!(resolved.class(), "Leaf");
        assert_ne!(resolved, StructLink::Deferred("Leaf".to_string()));
        assert_eq!(
            StructLink::Deferred("Node".to_string()),
            StructLink::Deferred("Node".to_string())
        );
        assert_eq!(format!("{:?}", resolved), "Resolved(\"Leaf\")");
    }

    #[test]
    fn test_read_only_field() {
        let field = FieldMetadata {
            id: 1,
            name: "message".to_string(),
            requiredness: Requiredness::Unspecified,
            ty: TypeRef::String,
            extraction: Extraction::Field(FieldExtraction {
                id: 1,
                name: "message".to_string(),
                field: "message".to_string(),
            }),
            injections: Vec::new(),
            struct_links: Vec::new(),
        };
        assert!(field.is_readable());
        assert!(!field.is_writable());
        assert!(field.is_read_only());
        assert_eq!(field.extraction().member(), "message");
    }
}
