//! Code generation configuration.
//!
//! [`GeneratorConfig`] says where schema inputs come from, where generated
//! output goes and how namespaces are chosen. It is pure data: validation
//! happens once, in [`GeneratorConfigBuilder::build`], and a built config is
//! always usable.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Validated code generation configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    input_folder: Option<PathBuf>,
    input_files: Vec<PathBuf>,
    output_folder: PathBuf,
    override_namespace: Option<String>,
    default_namespace: Option<String>,
    declare_exceptions: bool,
    generate_included: bool,
}

impl GeneratorConfig {
    /// Starts a new builder
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::default()
    }

    /// Folder relative input files are resolved against
    pub fn input_folder(&self) -> Option<&Path> {
        self.input_folder.as_deref()
    }

    /// Input files, as added
    pub fn input_files(&self) -> &[PathBuf] {
        &self.input_files
    }

    /// Output folder
    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    /// Namespace that replaces every declared namespace
    pub fn override_namespace(&self) -> Option<&str> {
        self.override_namespace.as_deref()
    }

    /// Namespace used when none is declared
    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Whether generated service methods declare a checked failure type
    pub fn declare_exceptions(&self) -> bool {
        self.declare_exceptions
    }

    /// Whether included schemas are regenerated rather than referenced
    pub fn generate_included(&self) -> bool {
        self.generate_included
    }

    /// Input files with relative paths joined onto the input folder
    pub fn resolved_inputs(&self) -> Vec<PathBuf> {
        self.input_files
            .iter()
            .map(|file| match &self.input_folder {
                Some(folder) if file.is_relative() => folder.join(file),
                _ => file.clone(),
            })
            .collect()
    }

    /// Namespace for a schema: the override, else the declared namespace,
    /// else the default
    pub fn namespace_for<'a>(&'a self, declared: Option<&'a str>) -> Option<&'a str> {
        self.override_namespace
            .as_deref()
            .or(declared)
            .or(self.default_namespace.as_deref())
    }
}

/// Builder for [`GeneratorConfig`]
#[derive(Debug, Clone)]
pub struct GeneratorConfigBuilder {
    input_folder: Option<PathBuf>,
    input_files: Vec<PathBuf>,
    output_folder: Option<PathBuf>,
    override_namespace: Option<String>,
    default_namespace: Option<String>,
    declare_exceptions: bool,
    generate_included: bool,
}

impl Default for GeneratorConfigBuilder {
    fn default() -> Self {
        Self {
            input_folder: None,
            input_files: Vec::new(),
            output_folder: None,
            override_namespace: None,
            default_namespace: None,
            declare_exceptions: true,
            generate_included: false,
        }
    }
}

impl GeneratorConfigBuilder {
    /// Sets the folder relative input files are resolved against
    pub fn input_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.input_folder = Some(folder.into());
        self
    }

    /// Adds an input file
    pub fn input_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.input_files.push(file.into());
        self
    }

    /// Adds several input files
    pub fn input_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.input_files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Sets the output folder
    pub fn output_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.output_folder = Some(folder.into());
        self
    }

    /// Sets the namespace that replaces every declared namespace
    pub fn override_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.override_namespace = Some(namespace.into());
        self
    }

    /// Sets the namespace used when none is declared
    pub fn default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = Some(namespace.into());
        self
    }

    /// Sets whether service methods declare a checked failure type
    pub fn declare_exceptions(mut self, declare: bool) -> Self {
        self.declare_exceptions = declare;
        self
    }

    /// Sets whether included schemas are regenerated
    pub fn generate_included(mut self, generate: bool) -> Self {
        self.generate_included = generate;
        self
    }

    /// Validates and builds the configuration
    pub fn build(self) -> Result<GeneratorConfig> {
        let output_folder = self
            .output_folder
            .ok_or_else(|| Error::config("an output folder is required"))?;

        if self.input_files.is_empty() {
            return Err(Error::config("at least one input file is required"));
        }

        if self.input_folder.is_none() {
            if let Some(relative) = self.input_files.iter().find(|f| f.is_relative()) {
                return Err(Error::config(format!(
                    "input file '{}' is relative but no input folder is set",
                    relative.display()
                )));
            }
        }

        Ok(GeneratorConfig {
            input_folder: self.input_folder,
            input_files: self.input_files,
            output_folder,
            override_namespace: self.override_namespace,
            default_namespace: self.default_namespace,
            declare_exceptions: self.declare_exceptions,
            generate_included: self.generate_included,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::builder()
            .input_file("/schemas/bonk.pb")
            .output_folder("out")
            .build()
            .unwrap();

        assert!(config.declare_exceptions());
        assert!(!config.generate_included());
        assert_eq!(config.output_folder(), Path::new("out"));
        assert_eq!(config.namespace_for(None), None);
    }

    #[test]
    fn test_output_folder_is_required() {
        let err = GeneratorConfig::builder()
            .input_file("/schemas/bonk.pb")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_input_file_is_required() {
        let err = GeneratorConfig::builder().output_folder("out").build().unwrap_err();
        assert!(err.to_string().contains("at least one input file"));
    }

    #[test]
    fn test_relative_input_needs_folder() {
        let err = GeneratorConfig::builder()
            .input_file("bonk.pb")
            .output_folder("out")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("'bonk.pb' is relative"));

        let config = GeneratorConfig::builder()
            .input_folder("/schemas")
            .input_files(["bonk.pb", "/abs/node.pb"])
            .output_folder("out")
            .build()
            .unwrap();
        assert_eq!(
            config.resolved_inputs(),
            vec![PathBuf::from("/schemas/bonk.pb"), PathBuf::from("/abs/node.pb")]
        );
    }

    #[test]
    fn test_namespace_precedence() {
        let base = GeneratorConfig::builder()
            .input_file("/schemas/bonk.pb")
            .output_folder("out")
            .default_namespace("fallback");

        let config = base.clone().build().unwrap();
        assert_eq!(config.namespace_for(Some("declared")), Some("declared"));
        assert_eq!(config.namespace_for(None), Some("fallback"));

        let config = base.override_namespace("forced").build().unwrap();
        assert_eq!(config.namespace_for(Some("declared")), Some("forced"));
    }
}
