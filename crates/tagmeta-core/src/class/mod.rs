//! Structural class descriptions.
//!
//! The core never inspects live types. It consumes an already materialized
//! description of a class: its fields, constructors, methods and the
//! optional declarative tag on each member. An external introspection layer
//! produces these, either directly through the builder-style constructors
//! below or as an encoded [`ClassSetProto`](wire::ClassSetProto).
//!
//! ## Extensibility
//!
//! The [`ClassSource`] trait is how the catalog finds classes by name:
//!
//! ```no_run
//! use std::sync::Arc;
//! use tagmeta_core::{ClassInfo, ClassSource};
//!
//! struct Reflected;
//!
//! impl ClassSource for Reflected {
//!     fn class(&self, name: &str) -> Option<Arc<ClassInfo>> {
//!         // Ask the runtime for `name`
//!         None
//!     }
//! }
//! ```

pub mod wire;

use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Whether a field must be present on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Requiredness {
    /// Must be present
    Required,
    /// May be absent
    Optional,
    /// Not declared
    #[default]
    Unspecified,
}

impl Requiredness {
    /// Returns the IDL keyword, if any
    pub fn as_str(&self) -> &'static str {
        match self {
            Requiredness::Required => "required",
            Requiredness::Optional => "optional",
            Requiredness::Unspecified => "",
        }
    }
}

/// Thrift value type of a member
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// No value (method return type only)
    Void,
    /// bool
    Bool,
    /// byte
    Byte,
    /// i16
    I16,
    /// i32
    I32,
    /// i64
    I64,
    /// double
    Double,
    /// string
    String,
    /// binary
    Binary,
    /// Another struct, by class name
    Struct(String),
    /// An enum, by name
    Enum(String),
    /// list<T>
    List(Box<TypeRef>),
    /// set<T>
    Set(Box<TypeRef>),
    /// map<K, V>
    Map(Box<TypeRef>, Box<TypeRef>),
}

impl TypeRef {
    /// Shorthand for a struct reference
    pub fn structure(name: impl Into<String>) -> Self {
        TypeRef::Struct(name.into())
    }

    /// Shorthand for `list<T>`
    pub fn list(element: TypeRef) -> Self {
        TypeRef::List(Box::new(element))
    }

    /// Shorthand for `set<T>`
    pub fn set(element: TypeRef) -> Self {
        TypeRef::Set(Box::new(element))
    }

    /// Shorthand for `map<K, V>`
    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Map(Box::new(key), Box::new(value))
    }

    /// Returns true for [`TypeRef::Void`]
    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    /// Names of every struct mentioned by this type, including inside
    /// containers, without duplicates and in order of appearance
    pub fn struct_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_struct_names(&mut names);
        names
    }

    fn collect_struct_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            TypeRef::Struct(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            TypeRef::List(inner) | TypeRef::Set(inner) => inner.collect_struct_names(names),
            TypeRef::Map(key, value) => {
                key.collect_struct_names(names);
                value.collect_struct_names(names);
            }
            _ => {}
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => f.write_str("void"),
            TypeRef::Bool => f.write_str("bool"),
            TypeRef::Byte => f.write_str("byte"),
            TypeRef::I16 => f.write_str("i16"),
            TypeRef::I32 => f.write_str("i32"),
            TypeRef::I64 => f.write_str("i64"),
            TypeRef::Double => f.write_str("double"),
            TypeRef::String => f.write_str("string"),
            TypeRef::Binary => f.write_str("binary"),
            TypeRef::Struct(name) | TypeRef::Enum(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "list<{}>", inner),
            TypeRef::Set(inner) => write!(f, "set<{}>", inner),
            TypeRef::Map(key, value) => write!(f, "map<{}, {}>", key, value),
        }
    }
}

/// Declarative tag attached to a member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTag {
    /// Declared field id, validated by the classifier
    pub id: i32,
    /// Declared name; derived from the member when absent
    pub name: Option<String>,
    /// Declared requiredness
    pub requiredness: Requiredness,
}

impl FieldTag {
    /// Tag with an explicit name
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            requiredness: Requiredness::Unspecified,
        }
    }

    /// Tag whose name is derived from the member it is attached to
    pub fn id(id: i32) -> Self {
        Self {
            id,
            name: None,
            requiredness: Requiredness::Unspecified,
        }
    }

    /// Sets the requiredness
    pub fn requiredness(mut self, requiredness: Requiredness) -> Self {
        self.requiredness = requiredness;
        self
    }

    /// Marks the tag required
    pub fn required(self) -> Self {
        self.requiredness(Requiredness::Required)
    }

    /// Marks the tag optional
    pub fn optional(self) -> Self {
        self.requiredness(Requiredness::Optional)
    }
}

/// An exposed field of a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Member name
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
    /// Tag, if the field is part of the schema
    pub tag: Option<FieldTag>,
    /// Final fields can be read but not written
    pub is_final: bool,
}

impl FieldInfo {
    /// Creates an untagged, mutable field
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: None,
            is_final: false,
        }
    }

    /// Attaches a tag
    pub fn tagged(mut self, tag: FieldTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Marks the field final
    pub fn final_field(mut self) -> Self {
        self.is_final = true;
        self
    }
}

/// A parameter of a constructor or method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
    /// Tag, if any
    pub tag: Option<FieldTag>,
}

impl ParameterInfo {
    /// Creates an untagged parameter
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: None,
        }
    }

    /// Attaches a tag
    pub fn tagged(mut self, tag: FieldTag) -> Self {
        self.tag = Some(tag);
        self
    }
}

/// A constructor of a class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructorInfo {
    /// Parameters in declaration order
    pub parameters: Vec<ParameterInfo>,
    /// Explicitly designated as the build-producing constructor
    pub annotated: bool,
}

impl ConstructorInfo {
    /// The no-argument constructor
    pub fn no_args() -> Self {
        Self::default()
    }

    /// A constructor with the given parameters
    pub fn with_parameters(parameters: Vec<ParameterInfo>) -> Self {
        Self {
            parameters,
            annotated: false,
        }
    }

    /// Marks the constructor as the designated one
    pub fn annotated(mut self) -> Self {
        self.annotated = true;
        self
    }
}

/// A method of a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    /// Method name
    pub name: String,
    /// Parameters in declaration order
    pub parameters: Vec<ParameterInfo>,
    /// Return type, [`TypeRef::Void`] for none
    pub return_type: TypeRef,
    /// Tag, if any
    pub tag: Option<FieldTag>,
    /// Produces an instance of the struct (static factory or builder build method)
    pub factory: bool,
}

impl MethodInfo {
    /// Creates an untagged `void` method without parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: TypeRef::Void,
            tag: None,
            factory: false,
        }
    }

    /// Tagged accessor: no parameters, returns `ty`
    pub fn getter(name: impl Into<String>, ty: TypeRef, tag: FieldTag) -> Self {
        Self::new(name).returns(ty).tagged(tag)
    }

    /// Tagged setter: one parameter of type `ty`
    pub fn setter(name: impl Into<String>, ty: TypeRef, tag: FieldTag) -> Self {
        let method = Self::new(name);
        let parameter = ParameterInfo::new(derive_name(&method.name, &["set"]), ty);
        method.parameter(parameter).tagged(tag)
    }

    /// Adds a parameter
    pub fn parameter(mut self, parameter: ParameterInfo) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Sets the return type
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.return_type = ty;
        self
    }

    /// Attaches a tag
    pub fn tagged(mut self, tag: FieldTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Marks the method as build-producing
    pub fn factory(mut self) -> Self {
        self.factory = true;
        self
    }
}

/// Structural description of one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    /// Class identity
    pub name: String,
    /// Exposed fields
    pub fields: Vec<FieldInfo>,
    /// Constructors
    pub constructors: Vec<ConstructorInfo>,
    /// Methods
    pub methods: Vec<MethodInfo>,
    /// Name of the builder class, if instances are made through one
    pub builder: Option<String>,
}

impl ClassInfo {
    /// Creates an empty class description
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            builder: None,
        }
    }

    /// Adds a field
    pub fn field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a constructor
    pub fn constructor(mut self, constructor: ConstructorInfo) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Adds a method
    pub fn method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    /// Declares the builder class
    pub fn builder(mut self, builder: impl Into<String>) -> Self {
        self.builder = Some(builder.into());
        self
    }
}

/// Derives a field name from a member name by stripping the first matching
/// prefix and lower-casing the following character.
///
/// `getMessage` becomes `message`; a name without a matching prefix (or
/// consisting only of the prefix) is returned unchanged.
pub fn derive_name(member: &str, prefixes: &[&str]) -> String {
    for prefix in prefixes {
        if let Some(rest) = member.strip_prefix(prefix) {
            let mut chars = rest.chars();
            if let Some(first) = chars.next() {
                if first.is_ascii_uppercase() {
                    let mut name = String::with_capacity(rest.len());
                    name.push(first.to_ascii_lowercase());
                    name.extend(chars);
                    return name;
                }
            }
        }
    }
    member.to_string()
}

/// Trait for looking up class descriptions by name
///
/// The catalog uses this to find the root class, builder classes and the
/// classes of struct-typed fields.
pub trait ClassSource: Send + Sync {
    /// Returns the description of `name`, if known
    fn class(&self, name: &str) -> Option<Arc<ClassInfo>>;
}

/// An insertion-ordered set of class descriptions
#[derive(Debug, Clone, Default)]
pub struct ClassSet {
    classes: IndexMap<String, Arc<ClassInfo>>,
}

impl ClassSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class, rejecting a second class with the same name
    pub fn insert(&mut self, class: ClassInfo) -> Result<()> {
        if self.classes.contains_key(&class.name) {
            return Err(Error::invalid_description(format!(
                "class '{}' is described more than once",
                class.name
            )));
        }
        self.classes.insert(class.name.clone(), Arc::new(class));
        Ok(())
    }

    /// Builds a set from classes, rejecting duplicate names
    pub fn from_classes(classes: impl IntoIterator<Item = ClassInfo>) -> Result<Self> {
        let mut set = Self::new();
        for class in classes {
            set.insert(class)?;
        }
        Ok(set)
    }

    /// Merges another set into this one. A duplicate name rejects the whole
    /// set and leaves this one unchanged.
    pub fn merge(&mut self, other: ClassSet) -> Result<()> {
        if let Some(name) = other.names().find(|name| self.classes.contains_key(*name)) {
            return Err(Error::invalid_description(format!(
                "class '{}' is described more than once",
                name
            )));
        }
        self.classes.extend(other.classes);
        Ok(())
    }

    /// Class names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if the set is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassSource for ClassSet {
    fn class(&self, name: &str) -> Option<Arc<ClassInfo>> {
        self.classes.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_name() {
        assert_eq!(derive_name("getMessage", &["get", "is"]), "message");
        assert_eq!(derive_name("isEnabled", &["get", "is"]), "enabled");
        assert_eq!(derive_name("setType", &["set"]), "type");
        assert_eq!(derive_name("settle", &["set"]), "settle");
        assert_eq!(derive_name("get", &["get"]), "get");
        assert_eq!(derive_name("message", &["get"]), "message");
    }

    #[test]
    fn test_struct_names() {
        let ty = TypeRef::map(
            TypeRef::String,
            TypeRef::list(TypeRef::structure("Node")),
        );
        assert_eq!(ty.struct_names(), vec!["Node"]);

        let ty = TypeRef::map(TypeRef::structure("Key"), TypeRef::structure("Key"));
        assert_eq!(ty.struct_names(), vec!["Key"]);

        assert!(TypeRef::I32.struct_names().is_empty());
    }

    #[test]
    fn test_type_display() {
        let ty = TypeRef::map(TypeRef::String, TypeRef::set(TypeRef::I64));
        assert_eq!(ty.to_string(), "map<string, set<i64>>");
        assert_eq!(TypeRef::structure("Bonk").to_string(), "Bonk");
    }

    #[test]
    fn test_setter_parameter_name() {
        let method = MethodInfo::setter("setMessage", TypeRef::String, FieldTag::id(1));
        assert_eq!(method.parameters.len(), 1);
        assert_eq!(method.parameters[0].name, "message");
        assert!(method.return_type.is_void());
    }

    #[test]
    fn test_class_set_rejects_duplicates() {
        let mut set = ClassSet::new();
        set.insert(ClassInfo::new("Bonk")).unwrap();
        assert!(set.insert(ClassInfo::new("Bonk")).is_err());
        assert_eq!(set.len(), 1);
        assert!(set.class("Bonk").is_some());
        assert!(set.class("Missing").is_none());
    }

    #[test]
    fn test_class_set_merge() {
        let mut left = ClassSet::from_classes([ClassInfo::new("A")]).unwrap();
        let right = ClassSet::from_classes([ClassInfo::new("B")]).unwrap();
        left.merge(right).unwrap();
        assert_eq!(left.names().collect::<Vec<_>>(), vec!["A", "B"]);

        let again = ClassSet::from_classes([ClassInfo::new("A")]).unwrap();
        assert!(left.merge(again).is_err());
    }

    #[test]
    fn test_rejected_merge_leaves_set_unchanged() {
        let mut left = ClassSet::from_classes([ClassInfo::new("B")]).unwrap();
        let right = ClassSet::from_classes([ClassInfo::new("A"), ClassInfo::new("B")]).unwrap();

        let err = left.merge(right).unwrap_err();
        assert!(err.to_string().contains("'B'"));
        assert_eq!(left.names().collect::<Vec<_>>(), vec!["B"]);
        assert!(left.class("A").is_none());
    }
}
