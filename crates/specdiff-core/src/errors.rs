use specdiff_core_types::{BatchId, TraceId};
use thiserror::Error;

/// Result type alias using SpecDiffError
pub type Result<T> = std::result::Result<T, SpecDiffError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Stable classification of every error surfaced by specdiff. Each kind maps
/// to a stable code usable by callers, tests and UI layers without matching on
/// message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    NotFound,
    AlreadyExists,
    ConstraintViolation,
    InvalidBatch,

    /// The specification references a shape/path/request that does not exist
    DanglingReference,

    // Review session
    InvalidTransition,
    DiffNotFound,
    InteractionNotFound,
    CommitFailed,

    // Configuration
    InvalidConfig,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::InvalidBatch => "ERR_INVALID_BATCH",
            ExErrorKind::DanglingReference => "ERR_DANGLING_REFERENCE",
            ExErrorKind::InvalidTransition => "ERR_INVALID_TRANSITION",
            ExErrorKind::DiffNotFound => "ERR_DIFF_NOT_FOUND",
            ExErrorKind::InteractionNotFound => "ERR_INTERACTION_NOT_FOUND",
            ExErrorKind::CommitFailed => "ERR_COMMIT_FAILED",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether the error reflects a broken specification rather than a bad call
    pub fn is_fatal_configuration(&self) -> bool {
        matches!(self, ExErrorKind::DanglingReference)
    }
}

/// Canonical structured error type
///
/// Carries the classification plus optional context fields. Store and engine
/// layers return this type; core domain code returns [`SpecDiffError`] and
/// converts at the boundary.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    spec_id: Option<String>,
    batch_id: Option<BatchId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            spec_id: None,
            batch_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (shape, path, request, response or diff key)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add specification ID context
    pub fn with_spec_id(mut self, id: impl Into<String>) -> Self {
        self.spec_id = Some(id.into());
        self
    }

    /// Add commit batch context
    pub fn with_batch_id(mut self, batch_id: BatchId) -> Self {
        self.batch_id = Some(batch_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn spec_id(&self) -> Option<&str> {
        self.spec_id.as_deref()
    }

    pub fn batch_id(&self) -> Option<&BatchId> {
        self.batch_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(spec_id) = &self.spec_id {
            write!(f, " (spec_id: {})", spec_id)?;
        }
        if let Some(batch_id) = &self.batch_id {
            write!(f, " (batch_id: {})", batch_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for specification replay, diffing and interpretation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecDiffError {
    // ===== Lookup Errors =====
    #[error("Shape not found: {shape_id}")]
    ShapeNotFound { shape_id: String },

    #[error("Path component not found: {path_id}")]
    PathNotFound { path_id: String },

    #[error("Request not found: {request_id}")]
    RequestNotFound { request_id: String },

    #[error("Response not found: {response_id}")]
    ResponseNotFound { response_id: String },

    #[error("Field {field_id} not found on shape {shape_id}")]
    FieldNotFound { shape_id: String, field_id: String },

    // ===== Duplicate Errors =====
    #[error("Shape already exists: {shape_id}")]
    ShapeAlreadyExists { shape_id: String },

    #[error("Path component already exists: {path_id}")]
    PathAlreadyExists { path_id: String },

    #[error("Path {parent_path_id} already has a child named '{name}'")]
    DuplicatePathSegment {
        parent_path_id: String,
        name: String,
    },

    #[error("Request already exists: {request_id}")]
    RequestAlreadyExists { request_id: String },

    #[error("Response already exists: {response_id}")]
    ResponseAlreadyExists { response_id: String },

    #[error("Field {field_id} already exists on shape {shape_id}")]
    FieldAlreadyExists { shape_id: String, field_id: String },

    // ===== Shape Structure Errors =====
    #[error("Shape {shape_id} is not an object")]
    NotAnObject { shape_id: String },

    #[error("Shape {shape_id} is not a list")]
    NotAList { shape_id: String },

    #[error("Shape {shape_id} is not optional or nullable")]
    NotAWrapper { shape_id: String },

    #[error("Shape {shape_id} cannot reference itself")]
    SelfReference { shape_id: String },

    // ===== Validation Errors =====
    #[error("Invalid name: {reason}")]
    InvalidName { reason: String },

    #[error("Invalid HTTP status code: {status_code}")]
    InvalidStatusCode { status_code: u16 },

    #[error("Invalid HTTP method: '{method}'")]
    InvalidMethod { method: String },

    // ===== Batch Errors =====
    #[error("Batch {open_batch_id} is still open; batches cannot nest")]
    BatchAlreadyOpen { open_batch_id: String },

    #[error("EndBatchCommit for {batch_id} without a matching StartBatchCommit")]
    BatchNotOpen { batch_id: String },

    #[error("EndBatchCommit for {found} but open batch is {expected}")]
    BatchMismatch { expected: String, found: String },

    // ===== Configuration Errors =====
    /// A declared shape points at a shape id that was never added
    #[error("Dangling shape reference: {shape_id} referenced from {referenced_from}")]
    DanglingShapeReference {
        shape_id: String,
        referenced_from: String,
    },

    /// Wrapper shapes (optional/nullable/one-of) refer back to themselves
    #[error("Shape cycle detected at {shape_id}")]
    ShapeCycle { shape_id: String },

    // ===== Review Errors =====
    #[error("Diff not found in current review: {diff}")]
    DiffNotFound { diff: String },

    #[error("Interaction not found: {interaction_id}")]
    InteractionNotFound { interaction_id: String },

    #[error("Cannot {action} while review is {state}")]
    InvalidTransition { state: String, action: String },

    // ===== Serialization Errors =====
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<SpecDiffError> for ExError {
    fn from(err: SpecDiffError) -> Self {
        let message = err.to_string();
        match err {
            SpecDiffError::ShapeNotFound { shape_id } => {
                ExError::new(ExErrorKind::NotFound).with_entity_id(shape_id)
            }
            SpecDiffError::PathNotFound { path_id } => {
                ExError::new(ExErrorKind::NotFound).with_entity_id(path_id)
            }
            SpecDiffError::RequestNotFound { request_id } => {
                ExError::new(ExErrorKind::NotFound).with_entity_id(request_id)
            }
            SpecDiffError::ResponseNotFound { response_id } => {
                ExError::new(ExErrorKind::NotFound).with_entity_id(response_id)
            }
            SpecDiffError::FieldNotFound { field_id, .. } => {
                ExError::new(ExErrorKind::NotFound).with_entity_id(field_id)
            }

            SpecDiffError::ShapeAlreadyExists { shape_id } => {
                ExError::new(ExErrorKind::AlreadyExists).with_entity_id(shape_id)
            }
            SpecDiffError::PathAlreadyExists { path_id } => {
                ExError::new(ExErrorKind::AlreadyExists).with_entity_id(path_id)
            }
            SpecDiffError::DuplicatePathSegment { parent_path_id, .. } => {
                ExError::new(ExErrorKind::AlreadyExists).with_entity_id(parent_path_id)
            }
            SpecDiffError::RequestAlreadyExists { request_id } => {
                ExError::new(ExErrorKind::AlreadyExists).with_entity_id(request_id)
            }
            SpecDiffError::ResponseAlreadyExists { response_id } => {
                ExError::new(ExErrorKind::AlreadyExists).with_entity_id(response_id)
            }
            SpecDiffError::FieldAlreadyExists { field_id, .. } => {
                ExError::new(ExErrorKind::AlreadyExists).with_entity_id(field_id)
            }

            SpecDiffError::NotAnObject { shape_id }
            | SpecDiffError::NotAList { shape_id }
            | SpecDiffError::NotAWrapper { shape_id }
            | SpecDiffError::SelfReference { shape_id } => {
                ExError::new(ExErrorKind::ConstraintViolation).with_entity_id(shape_id)
            }

            SpecDiffError::InvalidName { .. }
            | SpecDiffError::InvalidStatusCode { .. }
            | SpecDiffError::InvalidMethod { .. } => ExError::new(ExErrorKind::InvalidInput),

            SpecDiffError::BatchAlreadyOpen { open_batch_id } => {
                ExError::new(ExErrorKind::InvalidBatch).with_entity_id(open_batch_id)
            }
            SpecDiffError::BatchNotOpen { batch_id } => {
                ExError::new(ExErrorKind::InvalidBatch).with_entity_id(batch_id)
            }
            SpecDiffError::BatchMismatch { found, .. } => {
                ExError::new(ExErrorKind::InvalidBatch).with_entity_id(found)
            }

            SpecDiffError::DanglingShapeReference { shape_id, .. }
            | SpecDiffError::ShapeCycle { shape_id } => {
                ExError::new(ExErrorKind::DanglingReference).with_entity_id(shape_id)
            }

            SpecDiffError::DiffNotFound { diff } => {
                ExError::new(ExErrorKind::DiffNotFound).with_entity_id(diff)
            }
            SpecDiffError::InteractionNotFound { interaction_id } => {
                ExError::new(ExErrorKind::InteractionNotFound).with_entity_id(interaction_id)
            }
            SpecDiffError::InvalidTransition { .. } => {
                ExError::new(ExErrorKind::InvalidTransition)
            }

            SpecDiffError::Serialization { .. } => ExError::new(ExErrorKind::Serialization),
        }
        .with_message(message)
    }
}

/// Conversion from serde_json::Error to SpecDiffError
impl From<serde_json::Error> for SpecDiffError {
    fn from(err: serde_json::Error) -> Self {
        SpecDiffError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes_are_stable() {
        let cases = [
            (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
            (ExErrorKind::DanglingReference, "ERR_DANGLING_REFERENCE"),
            (ExErrorKind::InvalidBatch, "ERR_INVALID_BATCH"),
            (ExErrorKind::InvalidTransition, "ERR_INVALID_TRANSITION"),
            (ExErrorKind::CommitFailed, "ERR_COMMIT_FAILED"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_dangling_reference_is_fatal_configuration() {
        let err: ExError = SpecDiffError::DanglingShapeReference {
            shape_id: "s1".to_string(),
            referenced_from: "request r1".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::DanglingReference);
        assert!(err.kind().is_fatal_configuration());
        assert_eq!(err.entity_id(), Some("s1"));
        assert!(err.message().contains("request r1"));
    }

    #[test]
    fn test_display_includes_code_op_and_source() {
        let inner = ExError::new(ExErrorKind::Io).with_message("disk full");
        let err = ExError::new(ExErrorKind::CommitFailed)
            .with_op("commit")
            .with_spec_id("spec-1")
            .with_source(inner);
        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_COMMIT_FAILED] in operation 'commit'"));
        assert!(rendered.contains("spec_id: spec-1"));
        assert!(rendered.contains("disk full"));
        assert_eq!(err.source_error().map(|e| e.kind()), Some(ExErrorKind::Io));
    }

    #[test]
    fn test_serde_json_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SpecDiffError = parse.into();
        assert!(matches!(err, SpecDiffError::Serialization { .. }));
    }
}
