use thiserror::Error;

/// Result type alias using the structured error facility
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable for programmatic handling,
/// tests, and responses returned by the surrounding controller layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    NotFound,
    /// A recipient or option check failed; details carry every problem found
    ValidationFailed,

    // Reports
    /// No stored report exists to diff against
    NoPreviousReport,
    /// The report target exists but is not a folder
    InvalidTarget,
    /// Report bytes are not a JSON array of objects
    InvalidReport,
    /// A record in a report lacks a required field (e.g. `id`)
    MissingField,

    // Integration/IO
    Storage,
    Serialization,
    Io,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::ValidationFailed => "ERR_VALIDATION_FAILED",
            ExErrorKind::NoPreviousReport => "ERR_NO_PREVIOUS_REPORT",
            ExErrorKind::InvalidTarget => "ERR_INVALID_TARGET",
            ExErrorKind::InvalidReport => "ERR_INVALID_REPORT",
            ExErrorKind::MissingField => "ERR_MISSING_FIELD",
            ExErrorKind::Storage => "ERR_STORAGE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus optional context
/// (operation, user, share, path) for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    user_id: Option<String>,
    share_id: Option<String>,
    path: Option<String>,
    message: String,
    details: Option<Vec<String>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            user_id: None,
            share_id: None,
            path: None,
            message: String::new(),
            details: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add user context
    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    /// Add share context
    pub fn with_share_id(mut self, id: impl Into<String>) -> Self {
        self.share_id = Some(id.into());
        self
    }

    /// Add path context
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach the individual problems behind a `ValidationFailed` error
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the error kind
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

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn share_id(&self) -> Option<&str> {
        self.share_id.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Individual problems, if any (populated on `ValidationFailed`)
    pub fn details(&self) -> Option<&[String]> {
        self.details.as_deref()
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
        if let Some(user_id) = &self.user_id {
            write!(f, " (user_id: {})", user_id)?;
        }
        if let Some(share_id) = &self.share_id {
            write!(f, " (share_id: {})", share_id)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        if let Some(details) = &self.details {
            for detail in details {
                write!(f, "\n\n{}", detail)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain failures raised by the share-listing core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShareListError {
    /// The user does not exist (or no longer exists)
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    /// No node with this id in the user's tree
    #[error("Node {node_id} not found for user {user_id}")]
    NodeNotFound { user_id: String, node_id: u64 },

    /// Paths are resolved in a user's tree, so a path query needs a user
    #[error("Unable to query a path if no user is set: {path}")]
    PathRequiresUser { path: String },

    /// Permission bitmask outside the canonical range
    #[error("Invalid permissions bitmask: {value}")]
    InvalidPermissions { value: u32 },

    /// Report target exists but is not a folder
    #[error("Invalid directory, \"{path}\" not a folder")]
    InvalidTarget { path: String },

    /// Report target does not exist where one is required
    #[error("Invalid directory, \"{path}\" does not exist")]
    MissingTarget { path: String },

    /// Nothing to diff against
    #[error("No previous report found in {path}")]
    NoPreviousReport { path: String },

    /// Report content could not be decoded
    #[error("Invalid report: {reason}")]
    InvalidReport { reason: String },

    /// A record lacks a required field
    #[error("Record {index} is missing field `{field}`")]
    MissingField { index: usize, field: String },

    /// One or more recipients/options failed validation
    #[error("Validation failed with {} problem(s)", problems.len())]
    RecipientValidation { problems: Vec<String> },

    /// Collaborator storage failure
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Serialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<ShareListError> for ExError {
    fn from(err: ShareListError) -> Self {
        let message = err.to_string();
        match err {
            ShareListError::UserNotFound { user_id } => ExError::new(ExErrorKind::NotFound)
                .with_user_id(user_id)
                .with_message(message),
            ShareListError::NodeNotFound { user_id, .. } => ExError::new(ExErrorKind::NotFound)
                .with_user_id(user_id)
                .with_message(message),
            ShareListError::PathRequiresUser { path } => ExError::new(ExErrorKind::InvalidInput)
                .with_path(path)
                .with_message(message),
            ShareListError::InvalidPermissions { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }
            ShareListError::InvalidTarget { path } => ExError::new(ExErrorKind::InvalidTarget)
                .with_path(path)
                .with_message(message),
            ShareListError::MissingTarget { path } => ExError::new(ExErrorKind::InvalidTarget)
                .with_path(path)
                .with_message(message),
            ShareListError::NoPreviousReport { path } => {
                ExError::new(ExErrorKind::NoPreviousReport)
                    .with_path(path)
                    .with_message(message)
            }
            ShareListError::InvalidReport { .. } => {
                ExError::new(ExErrorKind::InvalidReport).with_message(message)
            }
            ShareListError::MissingField { .. } => {
                ExError::new(ExErrorKind::MissingField).with_message(message)
            }
            ShareListError::RecipientValidation { problems } => {
                ExError::new(ExErrorKind::ValidationFailed)
                    .with_message(message)
                    .with_details(problems)
            }
            ShareListError::Storage { .. } => {
                ExError::new(ExErrorKind::Storage).with_message(message)
            }
            ShareListError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for ShareListError {
    fn from(err: serde_json::Error) -> Self {
        ShareListError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ShareListError::from(err).into()
    }
}
