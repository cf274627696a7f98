//! Extensible metadata walking.
//!
//! [`walk`] visits a [`StructMetadata`] and hands every element to a
//! [`MetadataWriter`]. Implement the trait for alternative outputs
//! (documentation, statistics, codec tables).

use crate::metadata::{FieldMetadata, Injection, StructMetadata};
use std::fmt::Result;

/// Trait for consuming the elements of struct metadata.
///
/// Every hook defaults to a no-op.
///
/// # Example
///
/// ```
/// use tagmeta_core::idl::MetadataWriter;
/// use tagmeta_core::FieldMetadata;
///
/// struct FieldNames(Vec<String>);
///
/// impl MetadataWriter for FieldNames {
///     fn write_field(&mut self, field: &FieldMetadata) -> std::fmt::Result {
///         self.0.push(field.name().to_string());
///         Ok(())
///     }
/// }
/// ```
pub trait MetadataWriter {
    /// Called once per struct, before its fields
    fn write_struct(&mut self, metadata: &StructMetadata) -> Result {
        let _ = metadata;
        Ok(())
    }

    /// Called once per field, in field order
    fn write_field(&mut self, field: &FieldMetadata) -> Result {
        let _ = field;
        Ok(())
    }

    /// Called once per injection of the preceding field
    fn write_injection(&mut self, injection: &Injection) -> Result {
        let _ = injection;
        Ok(())
    }
}

/// A no-op writer that discards everything
pub struct NullWriter;

impl MetadataWriter for NullWriter {}

/// A writer that collects statistics about walked structs
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatsWriter {
    /// Number of structs
    pub struct_count: usize,
    /// Number of fields
    pub field_count: usize,
    /// Number of read-only fields
    pub read_only_count: usize,
    /// Number of direct field writes
    pub field_injection_count: usize,
    /// Number of constructor, setter or builder arguments
    pub parameter_injection_count: usize,
}

impl MetadataWriter for StatsWriter {
    fn write_struct(&mut self, _metadata: &StructMetadata) -> Result {
        self.struct_count += 1;
        Ok(())
    }

    fn write_field(&mut self, field: &FieldMetadata) -> Result {
        self.field_count += 1;
        if field.is_read_only() {
            self.read_only_count += 1;
        }
        Ok(())
    }

    fn write_injection(&mut self, injection: &Injection) -> Result {
        match injection {
            Injection::Field(_) => self.field_injection_count += 1,
            Injection::Parameter(_) => self.parameter_injection_count += 1,
        }
        Ok(())
    }
}

/// Drives `writer` over one struct
pub fn walk(metadata: &StructMetadata, writer: &mut impl MetadataWriter) -> Result {
    writer.write_struct(metadata)?;
    for field in metadata.fields() {
        writer.write_field(field)?;
        for injection in field.injections() {
            writer.write_injection(injection)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::Catalog;

    #[test]
    fn test_null_writer() {
        let catalog = Catalog::new(fixtures::bonk_classes());
        let metadata = catalog.get_or_build("BonkField").unwrap();
        assert!(walk(&metadata, &mut NullWriter).is_ok());
    }

    #[test]
    fn test_stats_writer() {
        let catalog = Catalog::new(fixtures::bonk_classes());
        let mut writer = StatsWriter::default();
        walk(&catalog.get_or_build("BonkField").unwrap(), &mut writer).unwrap();
        walk(&catalog.get_or_build("BonkConstructor").unwrap(), &mut writer).unwrap();

        assert_eq!(writer.struct_count, 2);
        assert_eq!(writer.field_count, 4);
        assert_eq!(writer.field_injection_count, 2);
        assert_eq!(writer.parameter_injection_count, 2);
        assert_eq!(writer.read_only_count, 0);
    }
}
