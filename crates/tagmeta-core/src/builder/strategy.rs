//! Construction strategy resolution.
//!
//! Picks one of the four construction idioms from the classified members of
//! a struct and, if it names one, its builder class.

use super::classify::{ClassMembers, TaggedCallable};
use crate::class::{ClassInfo, TypeRef};
use crate::diagnostics::{DiagnosticKind, DiagnosticSet};
use crate::metadata::{Callable, ConstructionStrategy};
use tracing::debug;

/// The resolved way of creating instances
#[derive(Debug, Clone)]
pub(crate) struct Plan {
    pub strategy: ConstructionStrategy,
    /// Tagged constructor or factory; `None` means the no-argument constructor
    pub constructor: Option<TaggedCallable>,
    /// Owner of the constructor actually invoked
    pub constructor_owner: Callable,
    /// Setter calls applied after construction (on the builder for builder-style)
    pub setters: Vec<TaggedCallable>,
    /// Build method of the builder
    pub factory: Option<TaggedCallable>,
    pub builder_class: Option<String>,
}

impl Plan {
    /// Callables whose arguments must be known before the instance exists
    pub fn build_producers(&self) -> impl Iterator<Item = &TaggedCallable> {
        self.constructor.iter().chain(self.factory.iter())
    }
}

pub(crate) fn resolve(
    class: &ClassInfo,
    members: &ClassMembers,
    builder: Option<(&ClassInfo, &ClassMembers)>,
    diagnostics: &mut DiagnosticSet,
) -> Option<Plan> {
    let plan = match builder {
        Some((builder_class, builder_members)) => {
            resolve_builder(class, members, builder_class, builder_members, diagnostics)
        }
        None => resolve_direct(class, members, diagnostics),
    };
    if let Some(plan) = &plan {
        debug!("{}: {} strategy", class.name, plan.strategy);
    }
    plan
}

fn resolve_direct(class: &ClassInfo, members: &ClassMembers, diagnostics: &mut DiagnosticSet) -> Option<Plan> {
    let producers: Vec<&TaggedCallable> = members.build_producers().collect();
    match producers.as_slice() {
        [] => {
            let Some(index) = members.no_args_constructor else {
                diagnostics.error(
                    &class.name,
                    DiagnosticKind::ConstructionStrategy,
                    "class has no usable constructor",
                );
                return None;
            };
            let strategy = if members.setters.is_empty() {
                ConstructionStrategy::Field
            } else {
                ConstructionStrategy::Method
            };
            Some(Plan {
                strategy,
                constructor: None,
                constructor_owner: Callable::Constructor {
                    class: class.name.clone(),
                    index,
                },
                setters: members.setters.clone(),
                factory: None,
                builder_class: None,
            })
        }
        [producer] if !returns_class(producer, class) => {
            diagnostics.error(
                &class.name,
                DiagnosticKind::ConstructionStrategy,
                format!(
                    "factory {} returns {} instead of {}",
                    producer.owner,
                    producer.returns,
                    TypeRef::Struct(class.name.clone())
                ),
            );
            None
        }
        [producer] => Some(Plan {
            strategy: ConstructionStrategy::Constructor,
            constructor: Some((*producer).clone()),
            constructor_owner: producer.owner.clone(),
            setters: members.setters.clone(),
            factory: None,
            builder_class: None,
        }),
        many => {
            diagnostics.error(
                &class.name,
                DiagnosticKind::ConstructionStrategy,
                format!("ambiguous construction strategy: {}", describe(many)),
            );
            None
        }
    }
}

/// Constructors always produce the class; factories must declare it
fn returns_class(producer: &TaggedCallable, class: &ClassInfo) -> bool {
    match producer.owner {
        Callable::Constructor { .. } => true,
        Callable::Method { .. } => matches!(&producer.returns, TypeRef::Struct(name) if *name == class.name),
    }
}

fn resolve_builder(
    class: &ClassInfo,
    members: &ClassMembers,
    builder_class: &ClassInfo,
    builder_members: &ClassMembers,
    diagnostics: &mut DiagnosticSet,
) -> Option<Plan> {
    let mut viable = true;

    let producers: Vec<&TaggedCallable> = members.build_producers().collect();
    if !producers.is_empty() {
        diagnostics.error(
            &class.name,
            DiagnosticKind::ConstructionStrategy,
            format!(
                "ambiguous construction strategy: builder '{}' and {}",
                builder_class.name,
                describe(&producers)
            ),
        );
        viable = false;
    }

    let factory = match builder_members.factories.as_slice() {
        [factory] => {
            let expected = TypeRef::Struct(class.name.clone());
            if factory.returns != expected {
                diagnostics.error(
                    &class.name,
                    DiagnosticKind::ConstructionStrategy,
                    format!(
                        "build method {} returns {} instead of {}",
                        factory.owner, factory.returns, expected
                    ),
                );
                viable = false;
            }
            Some(factory.clone())
        }
        [] => {
            diagnostics.error(
                &class.name,
                DiagnosticKind::ConstructionStrategy,
                format!("builder '{}' has no build method", builder_class.name),
            );
            viable = false;
            None
        }
        many => {
            let many: Vec<&TaggedCallable> = many.iter().collect();
            diagnostics.error(
                &class.name,
                DiagnosticKind::ConstructionStrategy,
                format!(
                    "ambiguous construction strategy: builder '{}' declares {}",
                    builder_class.name,
                    describe(&many)
                ),
            );
            viable = false;
            None
        }
    };

    let (constructor, constructor_owner) = match builder_members.constructors.as_slice() {
        [constructor] => (Some(constructor.clone()), Some(constructor.owner.clone())),
        [] => match builder_members.no_args_constructor {
            Some(index) => (
                None,
                Some(Callable::Constructor {
                    class: builder_class.name.clone(),
                    index,
                }),
            ),
            None => {
                diagnostics.error(
                    &class.name,
                    DiagnosticKind::ConstructionStrategy,
                    format!("builder '{}' has no usable constructor", builder_class.name),
                );
                (None, None)
            }
        },
        many => {
            let many: Vec<&TaggedCallable> = many.iter().collect();
            diagnostics.error(
                &class.name,
                DiagnosticKind::ConstructionStrategy,
                format!(
                    "ambiguous construction strategy: builder '{}' declares {}",
                    builder_class.name,
                    describe(&many)
                ),
            );
            (None, None)
        }
    };

    let constructor_owner = constructor_owner?;
    if !viable {
        return None;
    }

    Some(Plan {
        strategy: ConstructionStrategy::Builder,
        constructor,
        constructor_owner,
        setters: builder_members.setters.clone(),
        factory,
        builder_class: Some(builder_class.name.clone()),
    })
}

fn describe(callables: &[&TaggedCallable]) -> String {
    callables
        .iter()
        .map(|c| c.owner.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::classify::classify;
    use crate::class::{ConstructorInfo, FieldInfo, FieldTag, MethodInfo, ParameterInfo};

    fn plan_for(class: &ClassInfo, builder: Option<&ClassInfo>) -> (Option<Plan>, DiagnosticSet) {
        let mut diagnostics = DiagnosticSet::new();
        let members = classify(class, &mut diagnostics);
        let builder_members = builder.map(|b| (b, classify(b, &mut diagnostics)));
        let plan = resolve(
            class,
            &members,
            builder_members.as_ref().map(|(b, m)| (*b, m)),
            &mut diagnostics,
        );
        (plan, diagnostics)
    }

    fn tagged_constructor() -> ConstructorInfo {
        ConstructorInfo::with_parameters(vec![
            ParameterInfo::new("message", TypeRef::String).tagged(FieldTag::id(1)),
        ])
    }

    #[test]
    fn test_field_strategy_needs_no_args_constructor() {
        let class = ClassInfo::new("Bonk")
            .field(FieldInfo::new("message", TypeRef::String).tagged(FieldTag::id(1)));

        let (plan, diagnostics) = plan_for(&class, None);
        assert!(plan.is_none());
        assert_eq!(diagnostics.errors()[0].message, "class has no usable constructor");

        let class = class.constructor(ConstructorInfo::no_args());
        let (plan, diagnostics) = plan_for(&class, None);
        assert!(diagnostics.is_empty());
        assert_eq!(plan.unwrap().strategy, ConstructionStrategy::Field);
    }

    #[test]
    fn test_two_tagged_constructors_are_ambiguous() {
        let class = ClassInfo::new("Bonk")
            .constructor(tagged_constructor())
            .constructor(ConstructorInfo::with_parameters(vec![
                ParameterInfo::new("type", TypeRef::I32).tagged(FieldTag::id(2)),
            ]));

        let (plan, diagnostics) = plan_for(&class, None);
        assert!(plan.is_none());
        assert!(diagnostics.errors()[0]
            .message
            .starts_with("ambiguous construction strategy"));
    }

    #[test]
    fn test_constructor_and_builder_are_ambiguous() {
        let class = ClassInfo::new("Bonk")
            .constructor(tagged_constructor())
            .builder("BonkBuilder");
        let builder = ClassInfo::new("BonkBuilder")
            .constructor(ConstructorInfo::no_args())
            .method(MethodInfo::new("build").returns(TypeRef::structure("Bonk")).factory());

        let (plan, diagnostics) = plan_for(&class, Some(&builder));
        assert!(plan.is_none());
        assert!(diagnostics.contains(DiagnosticKind::ConstructionStrategy));
        assert!(diagnostics.errors()[0].message.contains("builder 'BonkBuilder'"));
    }

    #[test]
    fn test_builder_without_build_method() {
        let class = ClassInfo::new("Bonk").builder("BonkBuilder");
        let builder = ClassInfo::new("BonkBuilder").constructor(ConstructorInfo::no_args());

        let (plan, diagnostics) = plan_for(&class, Some(&builder));
        assert!(plan.is_none());
        assert_eq!(
            diagnostics.errors()[0].message,
            "builder 'BonkBuilder' has no build method"
        );
    }

    #[test]
    fn test_build_method_must_return_struct() {
        let class = ClassInfo::new("Bonk").builder("BonkBuilder");
        let builder = ClassInfo::new("BonkBuilder")
            .constructor(ConstructorInfo::no_args())
            .method(MethodInfo::new("build").returns(TypeRef::structure("Other")).factory());

        let (plan, diagnostics) = plan_for(&class, Some(&builder));
        assert!(plan.is_none());
        assert!(diagnostics.errors()[0].message.contains("returns Other instead of Bonk"));
    }

    #[test]
    fn test_static_factory_must_return_struct() {
        let class = ClassInfo::new("Bonk").method(
            MethodInfo::new("parse")
                .parameter(ParameterInfo::new("message", TypeRef::String).tagged(FieldTag::id(1)))
                .returns(TypeRef::String)
                .factory(),
        );

        let (plan, diagnostics) = plan_for(&class, None);
        assert!(plan.is_none());
        assert_eq!(
            diagnostics.errors()[0].message,
            "factory Bonk.parse returns string instead of Bonk"
        );
    }

    #[test]
    fn test_static_factory_is_constructor_style() {
        let class = ClassInfo::new("Bonk").method(
            MethodInfo::new("of")
                .parameter(ParameterInfo::new("message", TypeRef::String).tagged(FieldTag::id(1)))
                .returns(TypeRef::structure("Bonk"))
                .factory(),
        );

        let (plan, diagnostics) = plan_for(&class, None);
        assert!(diagnostics.is_empty());
        let plan = plan.unwrap();
        assert_eq!(plan.strategy, ConstructionStrategy::Constructor);
        assert_eq!(plan.constructor_owner.method_name(), Some("of"));
    }
}
