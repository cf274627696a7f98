//! # tagmeta-core
//!
//! A library for deriving wire-agnostic Thrift struct metadata from tagged
//! class descriptions.
//!
//! This crate provides the core functionality for:
//! - Describing classes structurally (fields, constructors, methods, tags)
//! - Deriving how each tagged field is read (extraction) and written (injection)
//! - Resolving the construction strategy: field, constructor, method or builder
//! - Caching derived metadata in a shared, single-flight [`Catalog`]
//! - Rendering metadata back as Thrift IDL
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`class`]: Structural class descriptions and their protobuf encoding
//! - [`metadata`]: The derived, immutable struct metadata
//! - [`catalog`]: Memoizing registry that drives builds
//! - [`diagnostics`]: Errors and warnings collected during a build
//! - [`idl`]: Thrift IDL rendering
//! - [`config`]: Code generation configuration
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use tagmeta_core::{Catalog, ClassInfo, ClassSet, ConstructorInfo, FieldInfo, FieldTag, TypeRef};
//!
//! let bonk = ClassInfo::new("Bonk")
//!     .field(FieldInfo::new("message", TypeRef::String).tagged(FieldTag::id(1)))
//!     .field(FieldInfo::new("type", TypeRef::I32).tagged(FieldTag::id(2)))
//!     .constructor(ConstructorInfo::no_args());
//!
//! let catalog = Catalog::new(ClassSet::from_classes([bonk])?);
//! let metadata = catalog.get_or_build("Bonk")?;
//! assert_eq!(metadata.field(1).map(|f| f.name()), Some("message"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! The library provides several traits for customization:
//!
//! - [`ClassSource`]: Supply class descriptions from any introspection layer
//! - [`MetadataWriter`]: Consume built metadata element by element
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod builder;
pub mod catalog;
pub mod class;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod idl;
pub mod metadata;

#[cfg(test)]
mod fixtures;

// Re-export primary types for convenience
pub use catalog::{BuildReport, Catalog};
pub use class::{
    ClassInfo, ClassSet, ClassSource, ConstructorInfo, FieldInfo, FieldTag, MethodInfo, ParameterInfo,
    Requiredness, TypeRef,
};
pub use config::{GeneratorConfig, GeneratorConfigBuilder};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSet, Severity};
pub use error::{Error, Result};
pub use idl::{IdlConfig, IdlRenderer, MetadataWriter, StatsWriter};
pub use metadata::{
    BuilderMetadata, Callable, ConstructionStrategy, ConstructorMetadata, Extraction, FieldId, FieldMetadata,
    Injection, MethodInjectionMetadata, ParameterInjection, StructLink, StructMetadata,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Largest valid Thrift field id
pub const MAX_FIELD_ID: FieldId = FieldId::MAX;
