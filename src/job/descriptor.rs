//! Job descriptors and the registration step that produces them.

use serde::{Deserialize, Serialize};

use super::declaration::{HandlerFn, HandlerKind, JobDeclaration};
use crate::error::JobError;

/// Immutable record of a registered job.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    name: String,
    ident: String,
    description: String,
    parameters: Vec<String>,
    handler: HandlerFn,
}

impl JobDescriptor {
    /// Build a descriptor without validation.
    ///
    /// Prefer [`register`]. Descriptors built here may carry a blocking
    /// handler, which the router refuses at call time.
    pub fn from_parts(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<String>,
        handler: HandlerFn,
    ) -> Self {
        let name = name.into();
        Self {
            ident: name.clone(),
            name,
            description: description.into(),
            parameters,
            handler,
        }
    }

    /// The name the job is routed under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the function the job was declared on.
    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared parameter names, in declaration order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Check if the handler declares a parameter called `name`.
    pub fn accepts(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p == name)
    }

    pub fn kind(&self) -> HandlerKind {
        self.handler.kind()
    }

    pub fn handler(&self) -> &HandlerFn {
        &self.handler
    }

    /// Copy with a different routing name and/or description.
    pub(crate) fn renamed(&self, name: Option<&str>, description: Option<&str>) -> Self {
        let mut copy = self.clone();
        if let Some(name) = name {
            copy.name = name.to_string();
        }
        if let Some(description) = description {
            copy.description = description.to_string();
        }
        copy
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
            kind: self.kind(),
        }
    }
}

/// Serializable view of a descriptor, for listing available jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub name: String,
    pub description: String,
    pub parameters: Vec<String>,
    pub kind: HandlerKind,
}

/// Validate a declaration and turn it into a descriptor.
///
/// Synchronous handlers are rejected with `InvalidHandlerKind`. The routing
/// name is the declared name, or the function identifier when the declared
/// name is absent or blank.
pub fn register(declaration: JobDeclaration) -> Result<JobDescriptor, JobError> {
    let (ident, name, description, parameters, handler) = declaration.into_parts();

    if !handler.kind().is_async() {
        return Err(JobError::InvalidHandlerKind {
            job: name.filter(|n| !n.trim().is_empty()).unwrap_or(ident),
            kind: handler.kind(),
        });
    }

    let name = match name {
        Some(name) if !name.trim().is_empty() => name,
        _ => ident.clone(),
    };
    if name.trim().is_empty() {
        return Err(JobError::InvalidDeclaration {
            ident,
            reason: "job name must not be empty".to_string(),
        });
    }

    let mut unique: Vec<String> = Vec::with_capacity(parameters.len());
    for parameter in parameters {
        if !unique.contains(&parameter) {
            unique.push(parameter);
        }
    }

    Ok(JobDescriptor {
        name,
        ident,
        description: description.unwrap_or_default(),
        parameters: unique,
        handler,
    })
}
