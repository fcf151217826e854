//! JobCatalog: the statically-known set of compiled-in handlers.
//!
//! Handlers self-register into a catalog at startup. Job manifests found
//! during discovery refer to catalog entries by function identifier.

use std::collections::HashMap;

use crate::error::JobError;
use crate::job::{register, JobDeclaration, JobDescriptor};

/// Side table from handler identifier to its registered descriptor.
#[derive(Debug, Default, Clone)]
pub struct JobCatalog {
    entries: Vec<JobDescriptor>,
    by_ident: HashMap<String, usize>,
}

impl JobCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare every handler in order, stopping at the first invalid one.
    pub fn from_declarations<I>(declarations: I) -> Result<Self, JobError>
    where
        I: IntoIterator<Item = JobDeclaration>,
    {
        let mut catalog = Self::new();
        for declaration in declarations {
            catalog.declare(declaration)?;
        }
        Ok(catalog)
    }

    /// Register a declaration and store it under its identifier.
    ///
    /// Rejected declarations (synchronous handlers, empty names) are not
    /// stored. Identifiers must be unique within a catalog.
    pub fn declare(&mut self, declaration: JobDeclaration) -> Result<&JobDescriptor, JobError> {
        if self.by_ident.contains_key(declaration.ident()) {
            return Err(JobError::InvalidDeclaration {
                ident: declaration.ident().to_string(),
                reason: "handler is already declared in this catalog".to_string(),
            });
        }

        let descriptor = register(declaration)?;
        tracing::debug!(
            ident = descriptor.ident(),
            job = descriptor.name(),
            kind = %descriptor.kind(),
            "declared job handler"
        );

        let index = self.entries.len();
        self.by_ident.insert(descriptor.ident().to_string(), index);
        self.entries.push(descriptor);
        Ok(&self.entries[index])
    }

    /// Get a handler by function identifier.
    pub fn get(&self, ident: &str) -> Option<&JobDescriptor> {
        self.by_ident.get(ident).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, ident: &str) -> bool {
        self.by_ident.contains_key(ident)
    }

    /// Descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &JobDescriptor> {
        self.entries.iter()
    }

    /// Identifiers in declaration order.
    pub fn idents(&self) -> Vec<&str> {
        self.entries.iter().map(|d| d.ident()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
