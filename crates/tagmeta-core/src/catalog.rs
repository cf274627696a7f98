//! Memoizing registry of built struct metadata.
//!
//! ## Architecture
//!
//! The [`Catalog`] owns a [`ClassSource`] and a map from class name to
//! published [`StructMetadata`]. Entries are created on the first successful
//! build and never evicted.
//!
//! A cache miss opens a build session under a catalog-wide build lock:
//!
//! - The lock is taken only after a cache miss and the cache is checked
//!   again once it is held, so each class is built at most once.
//! - Struct-typed fields are built recursively inside the same session.
//!   A class that is already being built is linked as
//!   [`StructLink::Deferred`] instead of recursing.
//! - Everything the session built is published together, and only if the
//!   requested class succeeded. The session (in-progress markers included)
//!   is dropped before the lock is released.
//!
//! Readers of published entries only take the read side of an `RwLock`.

use crate::builder::StructMetadataBuilder;
use crate::class::{ClassInfo, ClassSource};
use crate::diagnostics::{DiagnosticKind, DiagnosticSet};
use crate::metadata::{StructLink, StructMetadata};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, trace, warn};

/// Shared registry of struct metadata, keyed by class name
pub struct Catalog {
    source: Arc<dyn ClassSource>,
    entries: RwLock<HashMap<String, Arc<StructMetadata>>>,
    build_lock: Mutex<()>,
}

/// Outcome of a catalog lookup
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// The published metadata, if the build succeeded
    pub metadata: Option<Arc<StructMetadata>>,
    /// Warnings of every struct built for this lookup, plus the errors if it
    /// failed. Empty for cache hits.
    pub diagnostics: DiagnosticSet,
}

impl BuildReport {
    /// Returns true if metadata is available
    pub fn is_success(&self) -> bool {
        self.metadata.is_some()
    }

    /// Converts into the metadata, or the diagnostics explaining the failure
    pub fn into_result(self) -> Result<Arc<StructMetadata>, DiagnosticSet> {
        match self.metadata {
            Some(metadata) => Ok(metadata),
            None => Err(self.diagnostics),
        }
    }
}

impl Catalog {
    /// Creates an empty catalog over `source`
    pub fn new(source: impl ClassSource + 'static) -> Self {
        Self::with_source(Arc::new(source))
    }

    /// Creates an empty catalog over a shared source
    pub fn with_source(source: Arc<dyn ClassSource>) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
            build_lock: Mutex::new(()),
        }
    }

    /// Returns the published metadata of `class`, without building
    pub fn get(&self, class: &str) -> Option<Arc<StructMetadata>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(class)
            .cloned()
    }

    /// Returns the metadata of `class`, building it (and every struct it
    /// references) on first use
    pub fn get_or_build(&self, class: &str) -> Result<Arc<StructMetadata>, DiagnosticSet> {
        self.build_report(class).into_result()
    }

    /// Like [`get_or_build`](Self::get_or_build), but also returns the
    /// warnings of a successful build
    pub fn build_report(&self, class: &str) -> BuildReport {
        if let Some(metadata) = self.get(class) {
            trace!("{}: cache hit", class);
            return BuildReport {
                metadata: Some(metadata),
                diagnostics: DiagnosticSet::new(),
            };
        }

        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(metadata) = self.get(class) {
            debug!("{}: built by a concurrent lookup", class);
            return BuildReport {
                metadata: Some(metadata),
                diagnostics: DiagnosticSet::new(),
            };
        }

        let mut session = BuildSession::new(self);
        let result = session.build(class);
        session.finish(class, result)
    }

    /// Resolves a struct link to published metadata. Deferred links resolve
    /// once the build that created them has been published.
    pub fn resolve(&self, link: &StructLink) -> Option<Arc<StructMetadata>> {
        match link {
            StructLink::Resolved(metadata) => Some(Arc::clone(metadata)),
            StructLink::Deferred(class) => self.get(class),
        }
    }

    /// Number of published entries
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing has been published
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the published classes, sorted
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("entries", &self.class_names())
            .finish_non_exhaustive()
    }
}

/// State of one build session: the classes being built, the ones that were
/// built or failed, and the warnings collected so far
pub(crate) struct BuildSession<'c> {
    catalog: &'c Catalog,
    in_progress: Vec<String>,
    staged: IndexMap<String, Arc<StructMetadata>>,
    failed: HashSet<String>,
    warnings: DiagnosticSet,
}

impl<'c> BuildSession<'c> {
    fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            in_progress: Vec::new(),
            staged: IndexMap::new(),
            failed: HashSet::new(),
            warnings: DiagnosticSet::new(),
        }
    }

    pub fn class(&self, name: &str) -> Option<Arc<ClassInfo>> {
        self.catalog.source.class(name)
    }

    /// Links a struct type referenced by a field of the class being built.
    ///
    /// Returns `None` if the referenced struct failed; its diagnostics are
    /// appended to `diagnostics` the first time.
    pub fn link(&mut self, name: &str, diagnostics: &mut DiagnosticSet) -> Option<StructLink> {
        if let Some(metadata) = self.catalog.get(name) {
            return Some(StructLink::Resolved(metadata));
        }
        if let Some(metadata) = self.staged.get(name) {
            return Some(StructLink::Resolved(Arc::clone(metadata)));
        }
        if self.in_progress.iter().any(|class| class == name) {
            trace!("{}: cycle, deferring link", name);
            return Some(StructLink::Deferred(name.to_string()));
        }
        if self.failed.contains(name) {
            return None;
        }
        match self.build(name) {
            Ok(metadata) => Some(StructLink::Resolved(metadata)),
            Err(nested) => {
                diagnostics.extend(nested);
                None
            }
        }
    }

    pub fn record_warnings(&mut self, diagnostics: DiagnosticSet) {
        self.warnings.extend(diagnostics);
    }

    fn build(&mut self, name: &str) -> Result<Arc<StructMetadata>, DiagnosticSet> {
        let Some(class) = self.class(name) else {
            let mut diagnostics = DiagnosticSet::new();
            diagnostics.error(name, DiagnosticKind::UnknownType, format!("class '{}' is not known", name));
            self.failed.insert(name.to_string());
            return Err(diagnostics);
        };

        self.in_progress.push(name.to_string());
        let result = StructMetadataBuilder::new(&class).build(self);
        self.in_progress.pop();

        match result {
            Ok(metadata) => {
                let metadata = Arc::new(metadata);
                self.staged.insert(name.to_string(), Arc::clone(&metadata));
                Ok(metadata)
            }
            Err(diagnostics) => {
                self.failed.insert(name.to_string());
                Err(diagnostics)
            }
        }
    }

    /// Publishes the staged builds if the requested class succeeded
    fn finish(self, class: &str, result: Result<Arc<StructMetadata>, DiagnosticSet>) -> BuildReport {
        let BuildSession {
            catalog,
            staged,
            mut warnings,
            ..
        } = self;

        match result {
            Ok(metadata) => {
                let mut entries = catalog.entries.write().unwrap_or_else(PoisonError::into_inner);
                let published = staged.len();
                for (name, staged) in staged {
                    entries.entry(name).or_insert(staged);
                }
                drop(entries);

                if warnings.is_empty() {
                    debug!("{}: published {} structs", class, published);
                } else {
                    warn!(
                        "{}: published {} structs with {} warnings",
                        class,
                        published,
                        warnings.len()
                    );
                }
                BuildReport {
                    metadata: Some(metadata),
                    diagnostics: warnings,
                }
            }
            Err(errors) => {
                debug!("{}: build failed, {} structs discarded", class, staged.len());
                warnings.extend(errors);
                BuildReport {
                    metadata: None,
                    diagnostics: warnings,
                }
            }
        }
    }
}
