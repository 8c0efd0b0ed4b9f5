//! Grouping observed fields into named sections.

use autoforms_protocols::types::{FormField, FormSection};

/// Section name for fields without one.
pub const DEFAULT_SECTION: &str = "General";

/// Group fields by section, in order of first appearance.
pub fn group_sections(fields: &[FormField]) -> Vec<FormSection> {
    let mut sections: Vec<FormSection> = Vec::new();
    for field in fields {
        let name = field
            .section
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SECTION);
        match sections.iter_mut().find(|s| s.name == name) {
            Some(section) => section.fields.push(field.clone()),
            None => sections.push(FormSection {
                name: name.to_string(),
                fields: vec![field.clone()],
            }),
        }
    }
    sections
}
