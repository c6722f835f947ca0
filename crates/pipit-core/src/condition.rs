//! Environment conditions on manifest entries

use crate::types::{Entry, Runtime, StructuredEntry};

/// Whether `entry` applies to the given runtime.
///
/// Simple entries always apply. A structured entry applies when both its
/// `python` and `system` conditions pass; an absent condition passes.
pub fn is_applicable(entry: &Entry, runtime: &Runtime) -> bool {
    match entry {
        Entry::Simple(_) => true,
        Entry::Structured(info) => python_matches(info, runtime) && system_matches(info, runtime),
    }
}

/// The interpreter version must start with one of the listed prefixes
fn python_matches(info: &StructuredEntry, runtime: &Runtime) -> bool {
    match &info.python {
        Some(prefixes) => prefixes
            .split(',')
            .any(|prefix| runtime.python.starts_with(prefix)),
        None => true,
    }
}

/// The operating-system identifier must equal one of the listed values
fn system_matches(info: &StructuredEntry, runtime: &Runtime) -> bool {
    match &info.system {
        Some(systems) => systems.split(',').any(|system| system == runtime.system),
        None => true,
    }
}
