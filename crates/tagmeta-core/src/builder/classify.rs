//! Member classification.
//!
//! Walks one class description and sorts its tagged members into the roles
//! they can play: readable fields, accessors, setters, build-producing
//! constructors and factories. Untagged members are skipped; malformed tags
//! are reported and the member is dropped.

use crate::class::{derive_name, ClassInfo, FieldTag, ParameterInfo, Requiredness, TypeRef};
use crate::diagnostics::{DiagnosticKind, DiagnosticSet};
use crate::metadata::{Callable, FieldId, ParameterInjection};
use crate::MAX_FIELD_ID;
use tracing::trace;

/// A member tag that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tagged {
    pub id: FieldId,
    pub name: String,
    pub requiredness: Requiredness,
    pub ty: TypeRef,
    /// Human readable member description, used in diagnostics
    pub source: String,
}

/// A tagged class field
#[derive(Debug, Clone)]
pub(crate) struct TaggedField {
    pub tag: Tagged,
    pub field: String,
    pub is_final: bool,
}

/// A tagged accessor method
#[derive(Debug, Clone)]
pub(crate) struct TaggedAccessor {
    pub tag: Tagged,
    pub method: String,
}

/// A tagged parameter of a callable
#[derive(Debug, Clone)]
pub(crate) struct TaggedParameter {
    pub tag: Tagged,
    pub name: String,
}

/// A constructor or method whose parameters are all tagged
#[derive(Debug, Clone)]
pub(crate) struct TaggedCallable {
    pub owner: Callable,
    pub parameters: Vec<TaggedParameter>,
    pub returns: TypeRef,
}

impl TaggedCallable {
    pub fn injections(&self) -> Vec<ParameterInjection> {
        self.parameters
            .iter()
            .enumerate()
            .map(|(index, parameter)| ParameterInjection {
                id: parameter.tag.id,
                name: parameter.tag.name.clone(),
                parameter_name: parameter.name.clone(),
                parameter_index: index,
                requiredness: parameter.tag.requiredness,
                owner: self.owner.clone(),
            })
            .collect()
    }
}

/// Tagged members of one class, by role
#[derive(Debug, Clone, Default)]
pub(crate) struct ClassMembers {
    pub fields: Vec<TaggedField>,
    pub accessors: Vec<TaggedAccessor>,
    pub setters: Vec<TaggedCallable>,
    pub constructors: Vec<TaggedCallable>,
    pub factories: Vec<TaggedCallable>,
    /// Index of the first no-argument constructor
    pub no_args_constructor: Option<usize>,
}

impl ClassMembers {
    /// Constructors and factories that produce an instance from tagged arguments
    pub fn build_producers(&self) -> impl Iterator<Item = &TaggedCallable> {
        self.constructors.iter().chain(self.factories.iter())
    }
}

pub(crate) fn classify(class: &ClassInfo, diagnostics: &mut DiagnosticSet) -> ClassMembers {
    let mut members = ClassMembers::default();
    let class_name = class.name.as_str();

    for field in &class.fields {
        let Some(tag) = &field.tag else {
            continue;
        };
        let source = format!("field `{}`", field.name);
        if let Some(tag) = validate_tag(class_name, tag, &field.name, &field.ty, source, diagnostics) {
            trace!("{}: tagged field `{}` -> id {}", class_name, field.name, tag.id);
            members.fields.push(TaggedField {
                tag,
                field: field.name.clone(),
                is_final: field.is_final,
            });
        }
    }

    for (index, constructor) in class.constructors.iter().enumerate() {
        if constructor.parameters.is_empty() {
            members.no_args_constructor.get_or_insert(index);
            continue;
        }
        let any_tagged = constructor.parameters.iter().any(|p| p.tag.is_some());
        if !constructor.annotated && !any_tagged {
            continue;
        }
        let owner = Callable::Constructor {
            class: class_name.to_string(),
            index,
        };
        if let Some(parameters) = tagged_parameters(class_name, &owner, &constructor.parameters, diagnostics) {
            trace!("{}: tagged constructor {} ({} parameters)", class_name, owner, parameters.len());
            members.constructors.push(TaggedCallable {
                owner,
                parameters,
                returns: TypeRef::Void,
            });
        }
    }

    for method in &class.methods {
        let owner = Callable::Method {
            class: class_name.to_string(),
            name: method.name.clone(),
        };

        if method.factory {
            if method.tag.is_some() {
                diagnostics.warning(
                    class_name,
                    DiagnosticKind::UnusedMember,
                    format!("tag on factory method `{}` is ignored", method.name),
                );
            }
            if let Some(parameters) = tagged_parameters(class_name, &owner, &method.parameters, diagnostics) {
                trace!("{}: factory {} ({} parameters)", class_name, owner, parameters.len());
                members.factories.push(TaggedCallable {
                    owner,
                    parameters,
                    returns: method.return_type.clone(),
                });
            }
            continue;
        }

        match (&method.tag, method.parameters.as_slice()) {
            (Some(tag), []) => {
                if method.return_type.is_void() {
                    diagnostics.error(
                        class_name,
                        DiagnosticKind::MalformedTag,
                        format!("method `{}` is tagged but takes no argument and returns nothing", method.name),
                    );
                    continue;
                }
                let default_name = derive_name(&method.name, &["get", "is"]);
                let source = format!("method `{}`", method.name);
                if let Some(tag) = validate_tag(class_name, tag, &default_name, &method.return_type, source, diagnostics) {
                    trace!("{}: accessor `{}` -> id {}", class_name, method.name, tag.id);
                    members.accessors.push(TaggedAccessor {
                        tag,
                        method: method.name.clone(),
                    });
                }
            }
            (Some(tag), [parameter]) => {
                let source = format!("parameter `{}` of method `{}`", parameter.name, method.name);
                let validated = match &parameter.tag {
                    Some(own) => validate_tag(class_name, own, &parameter.name, &parameter.ty, source, diagnostics),
                    None => {
                        let default_name = derive_name(&method.name, &["set"]);
                        validate_tag(class_name, tag, &default_name, &parameter.ty, source, diagnostics)
                    }
                };
                if let Some(tag) = validated {
                    trace!("{}: setter `{}` -> id {}", class_name, method.name, tag.id);
                    members.setters.push(TaggedCallable {
                        owner,
                        parameters: vec![TaggedParameter {
                            tag,
                            name: parameter.name.clone(),
                        }],
                        returns: method.return_type.clone(),
                    });
                }
            }
            (Some(_), parameters) => {
                diagnostics.error(
                    class_name,
                    DiagnosticKind::MalformedTag,
                    format!(
                        "method `{}` takes {} parameters; tag its parameters instead of the method",
                        method.name,
                        parameters.len()
                    ),
                );
            }
            (None, parameters) => {
                if !parameters.iter().any(|p| p.tag.is_some()) {
                    continue;
                }
                if let Some(parameters) = tagged_parameters(class_name, &owner, parameters, diagnostics) {
                    trace!("{}: setter {} ({} parameters)", class_name, owner, parameters.len());
                    members.setters.push(TaggedCallable {
                        owner,
                        parameters,
                        returns: method.return_type.clone(),
                    });
                }
            }
        }
    }

    members
}

/// Validates every parameter of a callable; all of them must carry a tag.
fn tagged_parameters(
    class: &str,
    owner: &Callable,
    parameters: &[ParameterInfo],
    diagnostics: &mut DiagnosticSet,
) -> Option<Vec<TaggedParameter>> {
    let mut tagged = Vec::with_capacity(parameters.len());
    let mut complete = true;

    for parameter in parameters {
        let Some(tag) = &parameter.tag else {
            diagnostics.error(
                class,
                DiagnosticKind::ConstructionStrategy,
                format!("parameter `{}` of {} is not tagged", parameter.name, owner),
            );
            complete = false;
            continue;
        };
        let source = format!("parameter `{}` of {}", parameter.name, owner);
        match validate_tag(class, tag, &parameter.name, &parameter.ty, source, diagnostics) {
            Some(tag) => tagged.push(TaggedParameter {
                tag,
                name: parameter.name.clone(),
            }),
            None => complete = false,
        }
    }

    complete.then_some(tagged)
}

fn validate_tag(
    class: &str,
    tag: &FieldTag,
    default_name: &str,
    ty: &TypeRef,
    source: String,
    diagnostics: &mut DiagnosticSet,
) -> Option<Tagged> {
    let id = match FieldId::try_from(tag.id) {
        Ok(id) if id > 0 => id,
        _ => {
            diagnostics.error(
                class,
                DiagnosticKind::MalformedTag,
                format!("{} has id {}; ids must be between 1 and {}", source, tag.id, MAX_FIELD_ID),
            );
            return None;
        }
    };

    let name = match tag.name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => default_name,
    };
    if !is_identifier(name) {
        diagnostics.error(
            class,
            DiagnosticKind::MalformedTag,
            format!("{} has unusable name {:?}", source, name),
        );
        return None;
    }

    if ty.is_void() {
        diagnostics.error(
            class,
            DiagnosticKind::MalformedTag,
            format!("{} is tagged but has type void", source),
        );
        return None;
    }

    Some(Tagged {
        id,
        name: name.to_string(),
        requiredness: tag.requiredness,
        ty: ty.clone(),
        source,
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{ConstructorInfo, FieldInfo, MethodInfo};

    #[test]
    fn test_untagged_members_are_skipped() {
        let class = ClassInfo::new("Plain")
            .field(FieldInfo::new("cache", TypeRef::I64))
            .constructor(ConstructorInfo::with_parameters(vec![ParameterInfo::new(
                "seed",
                TypeRef::I64,
            )]))
            .method(MethodInfo::new("getCache").returns(TypeRef::I64));

        let mut diagnostics = DiagnosticSet::new();
        let members = classify(&class, &mut diagnostics);

        assert!(diagnostics.is_empty());
        assert!(members.fields.is_empty());
        assert!(members.constructors.is_empty());
        assert!(members.accessors.is_empty());
        assert!(members.no_args_constructor.is_none());
    }

    #[test]
    fn test_names_are_derived_from_members() {
        let class = ClassInfo::new("Bonk")
            .method(MethodInfo::getter("getMessage", TypeRef::String, FieldTag::id(1)))
            .method(MethodInfo::getter("isActive", TypeRef::Bool, FieldTag::id(2)))
            .method(MethodInfo::setter("setMessage", TypeRef::String, FieldTag::id(1)));

        let mut diagnostics = DiagnosticSet::new();
        let members = classify(&class, &mut diagnostics);

        assert!(diagnostics.is_empty(), "{diagnostics}");
        assert_eq!(members.accessors[0].tag.name, "message");
        assert_eq!(members.accessors[1].tag.name, "active");
        assert_eq!(members.setters[0].parameters[0].tag.name, "message");
    }

    #[test]
    fn test_out_of_range_ids_are_malformed() {
        let class = ClassInfo::new("Bonk")
            .field(FieldInfo::new("a", TypeRef::I32).tagged(FieldTag::id(0)))
            .field(FieldInfo::new("b", TypeRef::I32).tagged(FieldTag::id(-4)))
            .field(FieldInfo::new("c", TypeRef::I32).tagged(FieldTag::id(40_000)))
            .field(FieldInfo::new("d", TypeRef::I32).tagged(FieldTag::id(3)));

        let mut diagnostics = DiagnosticSet::new();
        let members = classify(&class, &mut diagnostics);

        assert_eq!(diagnostics.errors().len(), 3);
        assert!(diagnostics.iter().all(|d| d.kind == DiagnosticKind::MalformedTag));
        assert_eq!(members.fields.len(), 1);
        assert_eq!(members.fields[0].field, "d");
    }

    #[test]
    fn test_unusable_name_is_malformed() {
        let class = ClassInfo::new("Bonk")
            .field(FieldInfo::new("a", TypeRef::I32).tagged(FieldTag::new(1, "not a name")));

        let mut diagnostics = DiagnosticSet::new();
        let members = classify(&class, &mut diagnostics);

        assert!(diagnostics.contains(DiagnosticKind::MalformedTag));
        assert!(members.fields.is_empty());
    }

    #[test]
    fn test_tagged_void_method_is_malformed() {
        let class = ClassInfo::new("Bonk").method(MethodInfo::new("reset").tagged(FieldTag::id(1)));

        let mut diagnostics = DiagnosticSet::new();
        classify(&class, &mut diagnostics);

        assert!(diagnostics.contains(DiagnosticKind::MalformedTag));
    }

    #[test]
    fn test_partially_tagged_constructor_is_rejected() {
        let class = ClassInfo::new("Bonk").constructor(ConstructorInfo::with_parameters(vec![
            ParameterInfo::new("message", TypeRef::String).tagged(FieldTag::id(1)),
            ParameterInfo::new("type", TypeRef::I32),
        ]));

        let mut diagnostics = DiagnosticSet::new();
        let members = classify(&class, &mut diagnostics);

        assert!(diagnostics.contains(DiagnosticKind::ConstructionStrategy));
        assert!(members.constructors.is_empty());
    }

    #[test]
    fn test_multi_argument_setter() {
        let class = ClassInfo::new("Bonk").method(
            MethodInfo::new("setData")
                .parameter(ParameterInfo::new("message", TypeRef::String).tagged(FieldTag::id(1)))
                .parameter(ParameterInfo::new("type", TypeRef::I32).tagged(FieldTag::id(2))),
        );

        let mut diagnostics = DiagnosticSet::new();
        let members = classify(&class, &mut diagnostics);

        assert!(diagnostics.is_empty());
        let injections = members.setters[0].injections();
        assert_eq!(injections.len(), 2);
        assert_eq!(injections[1].parameter_index, 1);
        assert_eq!(injections[1].name, "type");
    }

    #[test]
    fn test_tag_on_multi_argument_method_is_malformed() {
        let class = ClassInfo::new("Bonk").method(
            MethodInfo::new("setData")
                .parameter(ParameterInfo::new("message", TypeRef::String))
                .parameter(ParameterInfo::new("type", TypeRef::I32))
                .tagged(FieldTag::id(1)),
        );

        let mut diagnostics = DiagnosticSet::new();
        let members = classify(&class, &mut diagnostics);

        assert!(diagnostics.contains(DiagnosticKind::MalformedTag));
        assert!(members.setters.is_empty());
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("message"));
        assert!(is_identifier("_private2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("two words"));
    }
}
