//! Struct metadata builder.
//!
//! Turns one [`ClassInfo`] into a [`StructMetadata`] in a fixed sequence of
//! passes:
//!
//! 1. Classify the members of the class (and of its builder class, if any)
//! 2. Resolve the construction strategy
//! 3. Merge extraction and injection evidence per field id; without a
//!    strategy only the tags themselves are merged, so id and name
//!    conflicts are still reported
//! 4. Link struct-typed fields through the build session
//! 5. Cross-check the resolved callables against the assembled fields
//!
//! Diagnostics from every pass are collected in one [`DiagnosticSet`]; the
//! build only fails at the end, so a single run reports as many problems as
//! it can find.

mod assemble;
mod classify;
mod strategy;

use crate::catalog::BuildSession;
use crate::class::{ClassInfo, Requiredness};
use crate::diagnostics::{DiagnosticKind, DiagnosticSet};
use crate::metadata::{
    BuilderMetadata, ConstructionStrategy, ConstructorMetadata, Extraction, FieldExtraction, FieldId,
    FieldInjection, FieldMetadata, Injection, MethodExtraction, MethodInjectionMetadata, StructLink,
    StructMetadata,
};
use assemble::FieldAssembly;
use classify::{classify, ClassMembers, TaggedAccessor, TaggedField};
use indexmap::IndexMap;
use std::collections::HashSet;
use strategy::Plan;
use tracing::debug;

/// Builds the metadata of a single class within a build session
pub(crate) struct StructMetadataBuilder<'a> {
    class: &'a ClassInfo,
    diagnostics: DiagnosticSet,
}

impl<'a> StructMetadataBuilder<'a> {
    pub fn new(class: &'a ClassInfo) -> Self {
        Self {
            class,
            diagnostics: DiagnosticSet::new(),
        }
    }

    /// Runs every pass. On success the warnings of this class are handed to
    /// the session; on failure they are returned with the errors.
    pub fn build(mut self, session: &mut BuildSession<'_>) -> Result<StructMetadata, DiagnosticSet> {
        let class = self.class;
        debug!("{}: building metadata", class.name);

        let members = classify(class, &mut self.diagnostics);

        let mut builder_known = true;
        let builder_class = match &class.builder {
            Some(name) => {
                let builder_class = session.class(name);
                if builder_class.is_none() {
                    self.diagnostics.error(
                        &class.name,
                        DiagnosticKind::UnknownType,
                        format!("builder class '{}' is not known", name),
                    );
                    builder_known = false;
                }
                builder_class
            }
            None => None,
        };
        let builder_members = builder_class
            .as_deref()
            .map(|builder_class| self.classify_builder(builder_class));

        let plan = if builder_known {
            strategy::resolve(
                class,
                &members,
                builder_class.as_deref().zip(builder_members.as_ref()),
                &mut self.diagnostics,
            )
        } else {
            None
        };
        let Some(plan) = plan else {
            self.check_tags(&members);
            return Err(self.diagnostics);
        };

        let (fields, method_injections) = self.assemble(&members, &plan);
        let fields = self.link(fields, &plan, session);
        self.cross_check(&fields, &plan, &method_injections);

        if self.diagnostics.has_errors() {
            debug!("{}: {} errors", class.name, self.diagnostics.errors().len());
            return Err(self.diagnostics);
        }

        let metadata = StructMetadata {
            class: class.name.clone(),
            strategy: plan.strategy,
            fields,
            constructor: ConstructorMetadata {
                owner: plan.constructor_owner.clone(),
                parameters: plan
                    .constructor
                    .as_ref()
                    .map(|constructor| constructor.injections())
                    .unwrap_or_default(),
            },
            method_injections,
            builder: match (&plan.builder_class, &plan.factory) {
                (Some(builder_class), Some(factory)) => Some(BuilderMetadata {
                    class: builder_class.clone(),
                    factory: factory.owner.clone(),
                    factory_parameters: factory.injections(),
                }),
                _ => None,
            },
        };
        debug!(
            "{}: built with {} fields ({} strategy)",
            class.name,
            metadata.field_count(),
            metadata.strategy
        );
        session.record_warnings(self.diagnostics);
        Ok(metadata)
    }

    /// Classifies a builder class. Its fields and accessors have no role.
    fn classify_builder(&mut self, builder_class: &ClassInfo) -> ClassMembers {
        let members = classify(builder_class, &mut self.diagnostics);
        for field in &members.fields {
            self.diagnostics.warning(
                &self.class.name,
                DiagnosticKind::UnusedMember,
                format!("{} of builder '{}' is not used", field.tag.source, builder_class.name),
            );
        }
        for accessor in &members.accessors {
            self.diagnostics.warning(
                &self.class.name,
                DiagnosticKind::UnusedMember,
                format!("{} of builder '{}' is not used", accessor.tag.source, builder_class.name),
            );
        }
        members
    }

    /// Merges every tag of the class without a construction plan
    fn check_tags(&mut self, members: &ClassMembers) {
        let diagnostics = &mut self.diagnostics;
        let mut assembly = FieldAssembly::new(&self.class.name);
        for field in &members.fields {
            assembly.add_extraction(&field.tag, field_extraction(field), diagnostics);
        }
        for accessor in &members.accessors {
            assembly.add_extraction(&accessor.tag, accessor_extraction(accessor), diagnostics);
        }
        let callables = members.setters.iter().chain(members.build_producers());
        for parameter in callables.flat_map(|callable| callable.parameters.iter()) {
            assembly.add_tag(&parameter.tag, diagnostics);
        }
        assembly.check_names(diagnostics);
    }

    fn assemble(
        &mut self,
        members: &ClassMembers,
        plan: &Plan,
    ) -> (Vec<assemble::WiredField>, Vec<MethodInjectionMetadata>) {
        let diagnostics = &mut self.diagnostics;
        let mut assembly = FieldAssembly::new(&self.class.name);

        // Ids owned by the constructor of a constructor-style struct
        let sole_ids: HashSet<FieldId> = match plan.strategy {
            ConstructionStrategy::Constructor => plan
                .constructor
                .iter()
                .flat_map(|constructor| constructor.parameters.iter().map(|p| p.tag.id))
                .collect(),
            _ => HashSet::new(),
        };
        let builder_reason = plan
            .builder_class
            .as_ref()
            .map(|builder| format!("instances are created by builder '{}'", builder));

        for field in &members.fields {
            let tag = &field.tag;
            assembly.add_extraction(tag, field_extraction(field), diagnostics);
            if field.is_final {
                continue;
            }
            if let Some(reason) = &builder_reason {
                assembly.ignore(tag, reason, diagnostics);
            } else if sole_ids.contains(&tag.id) {
                let reason = format!("field {} is set by {}", tag.id, plan.constructor_owner);
                assembly.ignore(tag, &reason, diagnostics);
            } else {
                let injection = Injection::Field(FieldInjection {
                    id: tag.id,
                    name: tag.name.clone(),
                    field: field.field.clone(),
                });
                assembly.add_injection(tag, injection, diagnostics);
            }
        }

        for accessor in &members.accessors {
            assembly.add_extraction(&accessor.tag, accessor_extraction(accessor), diagnostics);
        }

        if let Some(constructor) = &plan.constructor {
            for (parameter, injection) in constructor.parameters.iter().zip(constructor.injections()) {
                assembly.add_injection(&parameter.tag, Injection::Parameter(injection), diagnostics);
            }
        }

        if let Some(reason) = &builder_reason {
            for setter in &members.setters {
                for parameter in &setter.parameters {
                    assembly.ignore(&parameter.tag, reason, diagnostics);
                }
            }
        }

        let mut method_injections = Vec::new();
        for setter in &plan.setters {
            if let Some(parameter) = setter.parameters.iter().find(|p| sole_ids.contains(&p.tag.id)) {
                let reason = format!("field {} is set by {}", parameter.tag.id, plan.constructor_owner);
                for parameter in &setter.parameters {
                    assembly.ignore(&parameter.tag, &reason, diagnostics);
                }
                continue;
            }
            let injections = setter.injections();
            for (parameter, injection) in setter.parameters.iter().zip(&injections) {
                assembly.add_injection(&parameter.tag, Injection::Parameter(injection.clone()), diagnostics);
            }
            method_injections.push(MethodInjectionMetadata {
                method: setter.owner.clone(),
                parameters: injections,
            });
        }

        if let Some(factory) = &plan.factory {
            for (parameter, injection) in factory.parameters.iter().zip(factory.injections()) {
                assembly.add_injection(&parameter.tag, Injection::Parameter(injection), diagnostics);
            }
        }

        (assembly.finish(diagnostics), method_injections)
    }

    /// Resolves struct-typed fields and rejects cycles that cannot be deferred
    fn link(
        &mut self,
        fields: Vec<assemble::WiredField>,
        plan: &Plan,
        session: &mut BuildSession<'_>,
    ) -> IndexMap<FieldId, FieldMetadata> {
        let class = &self.class.name;
        let mut linked = IndexMap::with_capacity(fields.len());

        for field in fields {
            let mut struct_links = Vec::new();
            for name in field.ty.struct_names() {
                match session.link(name, &mut self.diagnostics) {
                    Some(link) => struct_links.push(link),
                    None => self.diagnostics.error(
                        class,
                        DiagnosticKind::FieldWiring,
                        format!("field {} references struct '{}' which failed to build", field.id, name),
                    ),
                }
            }

            if field.requiredness == Requiredness::Required
                && struct_links.iter().any(StructLink::is_deferred)
                && constructed_only(&field.injections, plan)
            {
                self.diagnostics.error(
                    class,
                    DiagnosticKind::CycleResolution,
                    format!(
                        "field {} is required and only set through {}, but its type '{}' is still being built",
                        field.id, plan.constructor_owner, field.ty
                    ),
                );
            }

            linked.insert(
                field.id,
                FieldMetadata {
                    id: field.id,
                    name: field.name,
                    requiredness: field.requiredness,
                    ty: field.ty,
                    extraction: field.extraction,
                    injections: field.injections,
                    struct_links,
                },
            );
        }
        linked
    }

    /// Every id consumed by a resolved callable must have been assembled
    fn cross_check(
        &mut self,
        fields: &IndexMap<FieldId, FieldMetadata>,
        plan: &Plan,
        method_injections: &[MethodInjectionMetadata],
    ) {
        if self.diagnostics.has_errors() {
            return;
        }
        let producers = plan.build_producers().flat_map(|callable| callable.injections());
        let setters = method_injections.iter().flat_map(|m| m.parameters.iter().cloned());
        for injection in producers.chain(setters) {
            if !fields.contains_key(&injection.id) {
                self.diagnostics.error(
                    &self.class.name,
                    DiagnosticKind::FieldWiring,
                    format!(
                        "parameter {} of {} targets field {} which was not assembled",
                        injection.parameter_index, injection.owner, injection.id
                    ),
                );
            }
        }
    }
}

fn field_extraction(field: &TaggedField) -> Extraction {
    Extraction::Field(FieldExtraction {
        id: field.tag.id,
        name: field.tag.name.clone(),
        field: field.field.clone(),
    })
}

fn accessor_extraction(accessor: &TaggedAccessor) -> Extraction {
    Extraction::Method(MethodExtraction {
        id: accessor.tag.id,
        name: accessor.tag.name.clone(),
        method: accessor.method.clone(),
    })
}

/// True if every injection is an argument of a build-producing callable,
/// i.e. the value must exist before the instance does
fn constructed_only(injections: &[Injection], plan: &Plan) -> bool {
    !injections.is_empty()
        && injections.iter().all(|injection| match injection.as_parameter() {
            Some(parameter) => plan.build_producers().any(|p| p.owner == parameter.owner),
            None => false,
        })
}
