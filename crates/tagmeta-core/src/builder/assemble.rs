//! Per-id merging of injection and extraction evidence.

use super::classify::Tagged;
use crate::class::{Requiredness, TypeRef};
use crate::diagnostics::{DiagnosticKind, DiagnosticSet};
use crate::metadata::{Extraction, FieldId, Injection};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::trace;

/// A field whose evidence merged cleanly and is fully wired
#[derive(Debug, Clone)]
pub(crate) struct WiredField {
    pub id: FieldId,
    pub name: String,
    pub requiredness: Requiredness,
    pub ty: TypeRef,
    pub extraction: Extraction,
    pub injections: Vec<Injection>,
}

#[derive(Debug)]
struct Accumulator {
    name: String,
    name_source: String,
    ty: TypeRef,
    ty_source: String,
    requiredness: Requiredness,
    requiredness_source: Option<String>,
    extraction: Option<(Extraction, String)>,
    injections: Vec<Injection>,
    ignored: usize,
    conflicted: bool,
}

/// Builder-local accumulator keyed by field id, in first-discovered order
#[derive(Debug)]
pub(crate) struct FieldAssembly<'a> {
    class: &'a str,
    fields: IndexMap<FieldId, Accumulator>,
}

impl<'a> FieldAssembly<'a> {
    pub fn new(class: &'a str) -> Self {
        Self {
            class,
            fields: IndexMap::new(),
        }
    }

    /// Merges id, name, type and requiredness of `tag`, reporting contradictions
    fn observe(&mut self, tag: &Tagged, diagnostics: &mut DiagnosticSet) -> &mut Accumulator {
        let class = self.class;
        let entry = self.fields.entry(tag.id).or_insert_with(|| {
            trace!("{}: field {} first seen on {}", class, tag.id, tag.source);
            Accumulator {
                name: tag.name.clone(),
                name_source: tag.source.clone(),
                ty: tag.ty.clone(),
                ty_source: tag.source.clone(),
                requiredness: Requiredness::Unspecified,
                requiredness_source: None,
                extraction: None,
                injections: Vec::new(),
                ignored: 0,
                conflicted: false,
            }
        });

        if entry.name != tag.name {
            diagnostics.error(
                class,
                DiagnosticKind::DuplicateField,
                format!(
                    "field {} is declared as '{}' by {} and as '{}' by {}",
                    tag.id, entry.name, entry.name_source, tag.name, tag.source
                ),
            );
            entry.conflicted = true;
        }

        if entry.ty != tag.ty {
            diagnostics.error(
                class,
                DiagnosticKind::FieldWiring,
                format!(
                    "field {} has type {} on {} but {} on {}",
                    tag.id, entry.ty, entry.ty_source, tag.ty, tag.source
                ),
            );
            entry.conflicted = true;
        }

        if tag.requiredness != Requiredness::Unspecified {
            match entry.requiredness_source.clone() {
                Some(source) if entry.requiredness != tag.requiredness => {
                    diagnostics.error(
                        class,
                        DiagnosticKind::FieldWiring,
                        format!(
                            "field {} is {:?} on {} but {:?} on {}",
                            tag.id, entry.requiredness, source, tag.requiredness, tag.source
                        ),
                    );
                    entry.conflicted = true;
                }
                Some(_) => {}
                None => {
                    entry.requiredness = tag.requiredness;
                    entry.requiredness_source = Some(tag.source.clone());
                }
            }
        }

        entry
    }

    pub fn add_extraction(&mut self, tag: &Tagged, extraction: Extraction, diagnostics: &mut DiagnosticSet) {
        let class = self.class;
        let entry = self.observe(tag, diagnostics);
        let existing = entry.extraction.as_ref().map(|(_, source)| source.clone());
        match existing {
            Some(existing) => {
                diagnostics.error(
                    class,
                    DiagnosticKind::FieldWiring,
                    format!(
                        "field {} can be read from both {} and {}",
                        tag.id, existing, tag.source
                    ),
                );
                entry.conflicted = true;
            }
            None => entry.extraction = Some((extraction, tag.source.clone())),
        }
    }

    pub fn add_injection(&mut self, tag: &Tagged, injection: Injection, diagnostics: &mut DiagnosticSet) {
        self.observe(tag, diagnostics).injections.push(injection);
    }

    /// Merges a tag that carries no extraction or injection of its own
    pub fn add_tag(&mut self, tag: &Tagged, diagnostics: &mut DiagnosticSet) {
        self.observe(tag, diagnostics);
    }

    /// Records evidence the chosen construction strategy cannot use
    pub fn ignore(&mut self, tag: &Tagged, reason: &str, diagnostics: &mut DiagnosticSet) {
        diagnostics.warning(
            self.class,
            DiagnosticKind::UnusedMember,
            format!("{} is not used: {}", tag.source, reason),
        );
        self.observe(tag, diagnostics).ignored += 1;
    }

    /// Reports ids that share a name and returns them
    pub fn check_names(&self, diagnostics: &mut DiagnosticSet) -> Vec<FieldId> {
        let mut duplicate_names = Vec::new();
        let mut names: HashMap<&str, FieldId> = HashMap::new();
        for (id, field) in &self.fields {
            if let Some(previous) = names.insert(field.name.as_str(), *id) {
                diagnostics.error(
                    self.class,
                    DiagnosticKind::DuplicateField,
                    format!("fields {} and {} are both named '{}'", previous, id, field.name),
                );
                duplicate_names.push(*id);
                duplicate_names.push(previous);
            }
        }
        duplicate_names
    }

    /// Validates wiring and name uniqueness, returning the fields that passed
    pub fn finish(self, diagnostics: &mut DiagnosticSet) -> Vec<WiredField> {
        let class = self.class;
        let duplicate_names = self.check_names(diagnostics);

        let mut wired = Vec::with_capacity(self.fields.len());
        for (id, field) in self.fields {
            if field.conflicted || duplicate_names.contains(&id) {
                continue;
            }
            let Some((extraction, _)) = field.extraction else {
                diagnostics.error(
                    class,
                    DiagnosticKind::FieldWiring,
                    format!("field {} is not fully wired: it can be written but not read", id),
                );
                continue;
            };
            if field.injections.is_empty() {
                if field.ignored > 0 {
                    diagnostics.error(
                        class,
                        DiagnosticKind::ConstructionStrategy,
                        format!("field {} has no available constructor path", id),
                    );
                } else {
                    diagnostics.error(
                        class,
                        DiagnosticKind::FieldWiring,
                        format!("field {} is not fully wired: it can be read but not written", id),
                    );
                }
                continue;
            }
            wired.push(WiredField {
                id,
                name: field.name,
                requiredness: field.requiredness,
                ty: field.ty,
                extraction,
                injections: field.injections,
            });
        }
        wired
    }
}
