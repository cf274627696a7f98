//! Encoded form of class descriptions.
//!
//! Introspection layers outside the process hand class descriptions over as
//! a protobuf `ClassSetProto`:
//!
//! ```text
//! ClassSetProto    { repeated ClassProto classes = 1; }
//! ClassProto       { string name = 1; repeated FieldProto fields = 2;
//!                    repeated ConstructorProto constructors = 3;
//!                    repeated MethodProto methods = 4; optional string builder = 5; }
//! FieldProto       { string name = 1; TypeProto type = 2; TagProto tag = 3; bool is_final = 4; }
//! ConstructorProto { repeated ParameterProto parameters = 1; bool annotated = 2; }
//! MethodProto      { string name = 1; repeated ParameterProto parameters = 2;
//!                    TypeProto return_type = 3; TagProto tag = 4; bool factory = 5; }
//! ParameterProto   { string name = 1; TypeProto type = 2; TagProto tag = 3; }
//! TagProto         { int32 id = 1; optional string name = 2; RequirednessProto requiredness = 3; }
//! TypeProto        { TypeKind kind = 1; string name = 2; repeated TypeProto args = 3; }
//! ```
//!
//! A missing `return_type` means `void`. Container kinds carry their element
//! types in `args` (one for list and set, key then value for map).

use super::{
    ClassInfo, ClassSet, ConstructorInfo, FieldInfo, FieldTag, MethodInfo, ParameterInfo,
    Requiredness, TypeRef,
};
use crate::error::{Error, Result};

/// Kind of a [`TypeProto`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum TypeKind {
    /// void
    Void = 0,
    /// bool
    Bool = 1,
    /// byte
    Byte = 2,
    /// i16
    I16 = 3,
    /// i32
    I32 = 4,
    /// i64
    I64 = 5,
    /// double
    Double = 6,
    /// string
    String = 7,
    /// binary
    Binary = 8,
    /// struct, named
    Struct = 9,
    /// enum, named
    Enum = 10,
    /// list, one argument
    List = 11,
    /// set, one argument
    Set = 12,
    /// map, two arguments
    Map = 13,
}

/// Requiredness of a [`TagProto`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum RequirednessProto {
    /// Not declared
    Unspecified = 0,
    /// Required
    Required = 1,
    /// Optional
    Optional = 2,
}

/// A set of encoded class descriptions
#[derive(Clone, PartialEq, prost::Message)]
pub struct ClassSetProto {
    /// Classes
    #[prost(message, repeated, tag = "1")]
    pub classes: Vec<ClassProto>,
}

/// Encoded [`ClassInfo`]
#[derive(Clone, PartialEq, prost::Message)]
pub struct ClassProto {
    /// Class name
    #[prost(string, tag = "1")]
    pub name: String,
    /// Fields
    #[prost(message, repeated, tag = "2")]
    pub fields: Vec<FieldProto>,
    /// Constructors
    #[prost(message, repeated, tag = "3")]
    pub constructors: Vec<ConstructorProto>,
    /// Methods
    #[prost(message, repeated, tag = "4")]
    pub methods: Vec<MethodProto>,
    /// Builder class name
    #[prost(string, optional, tag = "5")]
    pub builder: Option<String>,
}

/// Encoded [`FieldInfo`]
#[derive(Clone, PartialEq, prost::Message)]
pub struct FieldProto {
    /// Field name
    #[prost(string, tag = "1")]
    pub name: String,
    /// Declared type
    #[prost(message, optional, tag = "2")]
    pub r#type: Option<TypeProto>,
    /// Tag
    #[prost(message, optional, tag = "3")]
    pub tag: Option<TagProto>,
    /// Final flag
    #[prost(bool, tag = "4")]
    pub is_final: bool,
}

/// Encoded [`ConstructorInfo`]
#[derive(Clone, PartialEq, prost::Message)]
pub struct ConstructorProto {
    /// Parameters
    #[prost(message, repeated, tag = "1")]
    pub parameters: Vec<ParameterProto>,
    /// Designated constructor flag
    #[prost(bool, tag = "2")]
    pub annotated: bool,
}

/// Encoded [`MethodInfo`]
#[derive(Clone, PartialEq, prost::Message)]
pub struct MethodProto {
    /// Method name
    #[prost(string, tag = "1")]
    pub name: String,
    /// Parameters
    #[prost(message, repeated, tag = "2")]
    pub parameters: Vec<ParameterProto>,
    /// Return type, absent for void
    #[prost(message, optional, tag = "3")]
    pub return_type: Option<TypeProto>,
    /// Tag
    #[prost(message, optional, tag = "4")]
    pub tag: Option<TagProto>,
    /// Build-producing flag
    #[prost(bool, tag = "5")]
    pub factory: bool,
}

/// Encoded [`ParameterInfo`]
#[derive(Clone, PartialEq, prost::Message)]
pub struct ParameterProto {
    /// Parameter name
    #[prost(string, tag = "1")]
    pub name: String,
    /// Declared type
    #[prost(message, optional, tag = "2")]
    pub r#type: Option<TypeProto>,
    /// Tag
    #[prost(message, optional, tag = "3")]
    pub tag: Option<TagProto>,
}

/// Encoded [`FieldTag`]
#[derive(Clone, PartialEq, prost::Message)]
pub struct TagProto {
    /// Field id
    #[prost(int32, tag = "1")]
    pub id: i32,
    /// Explicit name
    #[prost(string, optional, tag = "2")]
    pub name: Option<String>,
    /// Requiredness
    #[prost(enumeration = "RequirednessProto", tag = "3")]
    pub requiredness: i32,
}

/// Encoded [`TypeRef`]
#[derive(Clone, PartialEq, prost::Message)]
pub struct TypeProto {
    /// Kind
    #[prost(enumeration = "TypeKind", tag = "1")]
    pub kind: i32,
    /// Struct or enum name
    #[prost(string, tag = "2")]
    pub name: String,
    /// Container element types
    #[prost(message, repeated, tag = "3")]
    pub args: Vec<TypeProto>,
}

impl ClassSet {
    /// Decodes an encoded `ClassSetProto`
    pub fn decode<B: bytes::Buf>(buf: B) -> Result<Self> {
        let proto = <ClassSetProto as prost::Message>::decode(buf)?;
        Self::try_from(proto)
    }

    /// Converts the set back into its encoded form
    pub fn to_proto(&self) -> ClassSetProto {
        ClassSetProto {
            classes: self.classes.values().map(|c| ClassProto::from(c.as_ref())).collect(),
        }
    }
}

impl TryFrom<ClassSetProto> for ClassSet {
    type Error = Error;

    fn try_from(proto: ClassSetProto) -> Result<Self> {
        let mut set = ClassSet::new();
        for class in proto.classes {
            set.insert(ClassInfo::try_from(class)?)?;
        }
        Ok(set)
    }
}

impl TryFrom<ClassProto> for ClassInfo {
    type Error = Error;

    fn try_from(proto: ClassProto) -> Result<Self> {
        if proto.name.is_empty() {
            return Err(Error::invalid_description("class without a name"));
        }
        let class = proto.name;

        let fields = proto
            .fields
            .into_iter()
            .map(|field| {
                Ok(FieldInfo {
                    ty: required_type(field.r#type, &class, &field.name)?,
                    tag: field.tag.map(FieldTag::try_from).transpose()?,
                    is_final: field.is_final,
                    name: field.name,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let constructors = proto
            .constructors
            .into_iter()
            .map(|constructor| {
                Ok(ConstructorInfo {
                    parameters: parameters(constructor.parameters, &class)?,
                    annotated: constructor.annotated,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let methods = proto
            .methods
            .into_iter()
            .map(|method| {
                let return_type = match method.return_type {
                    Some(ty) => TypeRef::try_from(ty)?,
                    None => TypeRef::Void,
                };
                Ok(MethodInfo {
                    parameters: parameters(method.parameters, &class)?,
                    return_type,
                    tag: method.tag.map(FieldTag::try_from).transpose()?,
                    factory: method.factory,
                    name: method.name,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ClassInfo {
            name: class,
            fields,
            constructors,
            methods,
            builder: proto.builder.filter(|b| !b.is_empty()),
        })
    }
}

fn parameters(protos: Vec<ParameterProto>, class: &str) -> Result<Vec<ParameterInfo>> {
    protos
        .into_iter()
        .map(|parameter| {
            Ok(ParameterInfo {
                ty: required_type(parameter.r#type, class, &parameter.name)?,
                tag: parameter.tag.map(FieldTag::try_from).transpose()?,
                name: parameter.name,
            })
        })
        .collect()
}

fn required_type(ty: Option<TypeProto>, class: &str, member: &str) -> Result<TypeRef> {
    let ty = ty.ok_or_else(|| {
        Error::invalid_description(format!("member '{}' of '{}' has no type", member, class))
    })?;
    TypeRef::try_from(ty)
}

impl TryFrom<TagProto> for FieldTag {
    type Error = Error;

    fn try_from(proto: TagProto) -> Result<Self> {
        let requiredness = match RequirednessProto::try_from(proto.requiredness) {
            Ok(RequirednessProto::Unspecified) => Requiredness::Unspecified,
            Ok(RequirednessProto::Required) => Requiredness::Required,
            Ok(RequirednessProto::Optional) => Requiredness::Optional,
            Err(_) => {
                return Err(Error::invalid_description(format!(
                    "unknown requiredness {}",
                    proto.requiredness
                )))
            }
        };
        Ok(FieldTag {
            id: proto.id,
            name: proto.name,
            requiredness,
        })
    }
}

impl TryFrom<TypeProto> for TypeRef {
    type Error = Error;

    fn try_from(proto: TypeProto) -> Result<Self> {
        let kind = TypeKind::try_from(proto.kind)
            .map_err(|_| Error::invalid_description(format!("unknown type kind {}", proto.kind)))?;

        let expected_args = match kind {
            TypeKind::List | TypeKind::Set => 1,
            TypeKind::Map => 2,
            _ => 0,
        };
        if proto.args.len() != expected_args {
            return Err(Error::invalid_description(format!(
                "type kind {:?} takes {} argument(s), found {}",
                kind,
                expected_args,
                proto.args.len()
            )));
        }
        if matches!(kind, TypeKind::Struct | TypeKind::Enum) && proto.name.is_empty() {
            return Err(Error::invalid_description(format!(
                "type kind {:?} requires a name",
                kind
            )));
        }

        let mut args = proto.args.into_iter().map(TypeRef::try_from);
        let mut next_arg = || {
            args.next()
                .unwrap_or_else(|| Err(Error::invalid_description("missing type argument")))
        };

        Ok(match kind {
            TypeKind::Void => TypeRef::Void,
            TypeKind::Bool => TypeRef::Bool,
            TypeKind::Byte => TypeRef::Byte,
            TypeKind::I16 => TypeRef::I16,
            TypeKind::I32 => TypeRef::I32,
            TypeKind::I64 => TypeRef::I64,
            TypeKind::Double => TypeRef::Double,
            TypeKind::String => TypeRef::String,
            TypeKind::Binary => TypeRef::Binary,
            TypeKind::Struct => TypeRef::Struct(proto.name),
            TypeKind::Enum => TypeRef::Enum(proto.name),
            TypeKind::List => TypeRef::list(next_arg()?),
            TypeKind::Set => TypeRef::set(next_arg()?),
            TypeKind::Map => {
                let key = next_arg()?;
                TypeRef::map(key, next_arg()?)
            }
        })
    }
}

impl From<&ClassInfo> for ClassProto {
    fn from(class: &ClassInfo) -> Self {
        ClassProto {
            name: class.name.clone(),
            fields: class
                .fields
                .iter()
                .map(|field| FieldProto {
                    name: field.name.clone(),
                    r#type: Some(TypeProto::from(&field.ty)),
                    tag: field.tag.as_ref().map(TagProto::from),
                    is_final: field.is_final,
                })
                .collect(),
            constructors: class
                .constructors
                .iter()
                .map(|constructor| ConstructorProto {
                    parameters: constructor.parameters.iter().map(ParameterProto::from).collect(),
                    annotated: constructor.annotated,
                })
                .collect(),
            methods: class
                .methods
                .iter()
                .map(|method| MethodProto {
                    name: method.name.clone(),
                    parameters: method.parameters.iter().map(ParameterProto::from).collect(),
                    return_type: (!method.return_type.is_void())
                        .then(|| TypeProto::from(&method.return_type)),
                    tag: method.tag.as_ref().map(TagProto::from),
                    factory: method.factory,
                })
                .collect(),
            builder: class.builder.clone(),
        }
    }
}

impl From<&ParameterInfo> for ParameterProto {
    fn from(parameter: &ParameterInfo) -> Self {
        ParameterProto {
            name: parameter.name.clone(),
            r#type: Some(TypeProto::from(&parameter.ty)),
            tag: parameter.tag.as_ref().map(TagProto::from),
        }
    }
}

impl From<&FieldTag> for TagProto {
    fn from(tag: &FieldTag) -> Self {
        let requiredness = match tag.requiredness {
            Requiredness::Unspecified => RequirednessProto::Unspecified,
            Requiredness::Required => RequirednessProto::Required,
            Requiredness::Optional => RequirednessProto::Optional,
        };
        TagProto {
            id: tag.id,
            name: tag.name.clone(),
            requiredness: requiredness as i32,
        }
    }
}

impl From<&TypeRef> for TypeProto {
    fn from(ty: &TypeRef) -> Self {
        let simple = |kind: TypeKind| TypeProto {
            kind: kind as i32,
            name: String::new(),
            args: Vec::new(),
        };
        match ty {
            TypeRef::Void => simple(TypeKind::Void),
            TypeRef::Bool => simple(TypeKind::Bool),
            TypeRef::Byte => simple(TypeKind::Byte),
            TypeRef::I16 => simple(TypeKind::I16),
            TypeRef::I32 => simple(TypeKind::I32),
            TypeRef::I64 => simple(TypeKind::I64),
            TypeRef::Double => simple(TypeKind::Double),
            TypeRef::String => simple(TypeKind::String),
            TypeRef::Binary => simple(TypeKind::Binary),
            TypeRef::Struct(name) => TypeProto {
                kind: TypeKind::Struct as i32,
                name: name.clone(),
                args: Vec::new(),
            },
            TypeRef::Enum(name) => TypeProto {
                kind: TypeKind::Enum as i32,
                name: name.clone(),
                args: Vec::new(),
            },
            TypeRef::List(inner) => TypeProto {
                args: vec![TypeProto::from(inner.as_ref())],
                ..simple(TypeKind::List)
            },
            TypeRef::Set(inner) => TypeProto {
                args: vec![TypeProto::from(inner.as_ref())],
                ..simple(TypeKind::Set)
            },
            TypeRef::Map(key, value) => TypeProto {
                args: vec![TypeProto::from(key.as_ref()), TypeProto::from(value.as_ref())],
                ..simple(TypeKind::Map)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassSource;
    use prost::Message;

    #[test]
    fn test_decode_encoded_class_set() {
        let class = ClassInfo::new("Node")
            .field(
                FieldInfo::new("children", TypeRef::list(TypeRef::structure("Node")))
                    .tagged(FieldTag::id(1).optional()),
            )
            .constructor(ConstructorInfo::no_args())
            .method(MethodInfo::getter("getLabel", TypeRef::String, FieldTag::new(2, "label")));
        let set = ClassSet::from_classes([class.clone()]).unwrap();

        let bytes = set.to_proto().encode_to_vec();
        let decoded = ClassSet::decode(bytes.as_slice()).unwrap();

        let node = decoded.class("Node").unwrap();
        pretty_assertions::assert_eq!(*node, class);
    }

    #[test]
    fn test_missing_return_type_is_void() {
        let proto = ClassProto {
            name: "Bonk".to_string(),
            methods: vec![MethodProto {
                name: "reset".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let class = ClassInfo::try_from(proto).unwrap();
        assert!(class.methods[0].return_type.is_void());
    }

    #[test]
    fn test_rejects_unknown_type_kind() {
        let proto = TypeProto {
            kind: 99,
            name: String::new(),
            args: Vec::new(),
        };
        assert!(TypeRef::try_from(proto).is_err());
    }

    #[test]
    fn test_rejects_list_without_element() {
        let proto = TypeProto {
            kind: TypeKind::List as i32,
            name: String::new(),
            args: Vec::new(),
        };
        let err = TypeRef::try_from(proto).unwrap_err();
        assert!(err.to_string().contains("takes 1 argument"));
    }

    #[test]
    fn test_rejects_field_without_type() {
        let proto = ClassProto {
            name: "Bonk".to_string(),
            fields: vec![FieldProto {
                name: "message".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = ClassInfo::try_from(proto).unwrap_err();
        assert!(err.to_string().contains("has no type"));
    }

    #[test]
    fn test_rejects_garbage_bytes() {
        assert!(ClassSet::decode(&[0xFFu8, 0xFF, 0xFF][..]).is_err());
    }
}
