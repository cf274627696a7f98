//! Thrift IDL rendering.
//!
//! Renders built [`StructMetadata`] back into a Thrift `struct` definition,
//! which is what a source generator consuming the catalog would emit:
//!
//! ```text
//! namespace java com.example
//!
//! struct Bonk {
//!   1: required string message;
//!   2: i32 type;
//! }
//! ```
//!
//! ## Extensibility
//!
//! The [`MetadataWriter`] trait, driven by [`walk`], allows other outputs
//! to be produced from the same metadata.

mod writer;

use crate::class::TypeRef;
use crate::metadata::{FieldMetadata, StructMetadata};
use std::fmt;

pub use writer::{walk, MetadataWriter, NullWriter, StatsWriter};

/// Configuration for IDL rendering
#[derive(Debug, Clone)]
pub struct IdlConfig {
    /// Indentation string (default: 2 spaces)
    pub indent_str: String,
    /// Language scope of the `namespace` line (default: `java`)
    pub namespace_scope: String,
    /// Namespace to declare, if any
    pub namespace: Option<String>,
}

impl Default for IdlConfig {
    fn default() -> Self {
        Self {
            indent_str: "  ".to_string(),
            namespace_scope: "java".to_string(),
            namespace: None,
        }
    }
}

impl IdlConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation string
    pub fn indent_str(mut self, s: impl Into<String>) -> Self {
        self.indent_str = s.into();
        self
    }

    /// Sets the namespace scope
    pub fn namespace_scope(mut self, scope: impl Into<String>) -> Self {
        self.namespace_scope = scope.into();
        self
    }

    /// Sets the declared namespace
    pub fn namespace(mut self, namespace: Option<impl Into<String>>) -> Self {
        self.namespace = namespace.map(Into::into);
        self
    }
}

/// Renders struct metadata as Thrift IDL
#[derive(Debug, Clone, Default)]
pub struct IdlRenderer {
    config: IdlConfig,
}

impl IdlRenderer {
    /// Creates a renderer with the default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a renderer with custom config
    pub fn with_config(config: IdlConfig) -> Self {
        Self { config }
    }

    /// File name of the rendered struct, e.g. `Bonk.thrift`
    pub fn file_name(metadata: &StructMetadata) -> String {
        format!("{}.thrift", simple_name(metadata.class()))
    }

    /// Renders one struct definition
    pub fn render(&self, metadata: &StructMetadata) -> String {
        let mut output = String::new();
        if let Some(namespace) = &self.config.namespace {
            output.push_str(&format!("namespace {} {}\n\n", self.config.namespace_scope, namespace));
        }
        output.push_str(&format!("struct {} {{\n", simple_name(metadata.class())));
        for field in metadata.fields() {
            output.push_str(&self.config.indent_str);
            output.push_str(&field_line(field));
            output.push('\n');
        }
        output.push_str("}\n");
        output
    }

    /// Writes the rendered struct to a writer
    pub fn write_to(&self, metadata: &StructMetadata, w: &mut impl fmt::Write) -> fmt::Result {
        w.write_str(&self.render(metadata))
    }
}

fn field_line(field: &FieldMetadata) -> String {
    let requiredness = field.requiredness().as_str();
    let ty = type_name(field.ty());
    if requiredness.is_empty() {
        format!("{}: {} {};", field.id(), ty, field.name())
    } else {
        format!("{}: {} {} {};", field.id(), requiredness, ty, field.name())
    }
}

/// Thrift spelling of a type; struct and enum names lose their qualifier
fn type_name(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Struct(name) | TypeRef::Enum(name) => simple_name(name).to_string(),
        TypeRef::List(inner) => format!("list<{}>", type_name(inner)),
        TypeRef::Set(inner) => format!("set<{}>", type_name(inner)),
        TypeRef::Map(key, value) => format!("map<{}, {}>", type_name(key), type_name(value)),
        other => other.to_string(),
    }
}

/// `com.example.Bonk` and `Outer$Inner` become `Bonk` and `Inner`
fn simple_name(class: &str) -> &str {
    class.rsplit(['.', '$']).next().unwrap_or(class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{ClassInfo, ClassSet, ConstructorInfo, FieldInfo, FieldTag};
    use crate::fixtures;
    use crate::Catalog;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_struct() {
        let catalog = Catalog::new(fixtures::bonk_classes());
        let metadata = catalog.get_or_build("BonkMethod").unwrap();

        let idl = IdlRenderer::new().render(&metadata);
        assert_eq!(idl, "struct BonkMethod {\n  1: string message;\n  2: i32 type;\n}\n");
    }

    #[test]
    fn test_render_with_namespace_and_requiredness() {
        let class = ClassInfo::new("com.example.Tree")
            .field(FieldInfo::new("label", TypeRef::String).tagged(FieldTag::id(1).required()))
            .field(
                FieldInfo::new("children", TypeRef::list(TypeRef::structure("com.example.Tree")))
                    .tagged(FieldTag::id(2).optional()),
            )
            .constructor(ConstructorInfo::no_args());
        let catalog = Catalog::new(ClassSet::from_classes([class]).unwrap());
        let metadata = catalog.get_or_build("com.example.Tree").unwrap();

        let config = IdlConfig::new().indent_str("    ").namespace(Some("com.example"));
        let idl = IdlRenderer::with_config(config).render(&metadata);
        assert_eq!(
            idl,
            "namespace java com.example\n\n\
             struct Tree {\n    \
             1: required string label;\n    \
             2: optional list<Tree> children;\n\
             }\n"
        );
        assert_eq!(IdlRenderer::file_name(&metadata), "Tree.thrift");
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(simple_name("Bonk"), "Bonk");
        assert_eq!(simple_name("com.example.Bonk"), "Bonk");
        assert_eq!(simple_name("BonkBuilder.Builder"), "Builder");
        assert_eq!(simple_name("Outer$Inner"), "Inner");
    }
}
