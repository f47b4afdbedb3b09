//! Workflow errors: one root cause plus the annotations added on the way up.

use std::fmt;
use std::panic::Location;

use thiserror::Error;

use crate::controller::ControllerError;

/// Category of a root cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad argument count or shape, detected before any remote call.
    Validation,
    /// A lookup expected to be unique returned zero or several matches.
    AmbiguousResult,
    /// A named sub-resource does not exist among the candidates.
    NotFound,
    /// The controller reported a failure.
    Remote,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "ValidationError"),
            Self::AmbiguousResult => write!(f, "AmbiguousResult"),
            Self::NotFound => write!(f, "NotFound"),
            Self::Remote => write!(f, "RemoteError"),
        }
    }
}

/// The root cause of a failed workflow.
#[derive(Debug, Error)]
pub enum Cause {
    /// Bad arguments or an unusable local input.
    #[error("{0}")]
    Validation(String),

    /// Expected exactly one match.
    #[error("expected exactly one {resource} matching {key:?}, got {count}")]
    AmbiguousResult {
        resource: &'static str,
        key: String,
        count: usize,
    },

    /// A named resource is missing.
    #[error("{resource} {name:?} not found{}", .within.as_ref().map(|w| format!(" on {w}")).unwrap_or_default())]
    NotFound {
        resource: &'static str,
        name: String,
        within: Option<String>,
    },

    /// Controller failure.
    #[error(transparent)]
    Remote(#[from] ControllerError),
}

impl Cause {
    /// Category of this cause.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::AmbiguousResult { .. } => ErrorKind::AmbiguousResult,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Remote(_) => ErrorKind::Remote,
        }
    }

    /// Category plus, for remote errors, the client error variant.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::Remote(err) => format!("{}({})", self.kind(), err.variant()),
            _ => self.kind().to_string(),
        }
    }
}

/// One contextual annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// What was being attempted.
    pub message: String,
    /// Where the annotation was added.
    pub location: &'static Location<'static>,
}

/// A failed workflow: root cause and annotation frames.
///
/// Frames are kept innermost first, in the order they were added.
#[derive(Debug)]
pub struct WorkflowError {
    cause: Cause,
    origin: &'static Location<'static>,
    frames: Vec<Frame>,
}

impl WorkflowError {
    /// New error with no annotations, recording the caller as its origin.
    #[track_caller]
    #[must_use]
    pub fn new(cause: Cause) -> Self {
        Self {
            cause,
            origin: Location::caller(),
            frames: Vec::new(),
        }
    }

    /// Validation failure.
    #[track_caller]
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(Cause::Validation(message.into()))
    }

    /// Lookup that did not produce exactly one result.
    #[track_caller]
    #[must_use]
    pub fn ambiguous(resource: &'static str, key: impl Into<String>, count: usize) -> Self {
        Self::new(Cause::AmbiguousResult {
            resource,
            key: key.into(),
            count,
        })
    }

    /// Missing named resource.
    #[track_caller]
    #[must_use]
    pub fn not_found(resource: &'static str, name: impl Into<String>) -> Self {
        Self::new(Cause::NotFound {
            resource,
            name: name.into(),
            within: None,
        })
    }

    /// Missing named resource inside a parent resource.
    #[track_caller]
    #[must_use]
    pub fn not_found_within(
        resource: &'static str,
        name: impl Into<String>,
        within: impl Into<String>,
    ) -> Self {
        Self::new(Cause::NotFound {
            resource,
            name: name.into(),
            within: Some(within.into()),
        })
    }

    /// Convert a direct lookup failure: a controller 404 becomes
    /// [`Cause::NotFound`], anything else stays remote.
    #[track_caller]
    #[must_use]
    pub fn lookup(resource: &'static str, name: &str, err: ControllerError) -> Self {
        match err {
            ControllerError::NoMatch(_) => Self::not_found(resource, name),
            other => Self::new(Cause::Remote(other)),
        }
    }

    /// Add an annotation frame at the caller's location.
    #[track_caller]
    #[must_use]
    pub fn annotate(mut self, message: impl Into<String>) -> Self {
        self.frames.push(Frame {
            message: message.into(),
            location: Location::caller(),
        });
        self
    }

    /// The root cause.
    #[must_use]
    pub fn cause(&self) -> &Cause {
        &self.cause
    }

    /// Category of the root cause.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.cause.kind()
    }

    /// Where the root cause was raised.
    #[must_use]
    pub fn origin(&self) -> &'static Location<'static> {
        self.origin
    }

    /// Annotations from outermost to innermost.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter().rev()
    }

    /// Annotation messages from outermost to innermost.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.frames().map(|f| f.message.as_str()).collect()
    }
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self.frames() {
            write!(f, "{}: ", frame.message)?;
        }
        write!(f, "{}", self.cause)
    }
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

impl From<Cause> for WorkflowError {
    #[track_caller]
    fn from(cause: Cause) -> Self {
        Self::new(cause)
    }
}

impl From<ControllerError> for WorkflowError {
    #[track_caller]
    fn from(err: ControllerError) -> Self {
        Self::new(Cause::Remote(err))
    }
}

/// Annotate the error side of a `Result`.
pub trait Annotate<T> {
    /// Add a frame with a fixed message.
    ///
    /// # Errors
    /// Returns the same error with one more frame.
    fn annotate(self, message: &str) -> Result<T, WorkflowError>;

    /// Add a frame with a lazily built message.
    ///
    /// # Errors
    /// Returns the same error with one more frame.
    fn with_annotation<F: FnOnce() -> String>(self, f: F) -> Result<T, WorkflowError>;
}

impl<T, E> Annotate<T> for Result<T, E>
where
    WorkflowError: From<E>,
{
    #[track_caller]
    fn annotate(self, message: &str) -> Result<T, WorkflowError> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(WorkflowError::from(err).annotate(message)),
        }
    }

    #[track_caller]
    fn with_annotation<F: FnOnce() -> String>(self, f: F) -> Result<T, WorkflowError> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(WorkflowError::from(err).annotate(f())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_lookup() -> Result<(), WorkflowError> {
        Err(ControllerError::NoMatch("gone".into())).annotate("fetching file")
    }

    #[test]
    fn test_frames_are_outermost_first() {
        let err = failing_lookup()
            .annotate("deleting file")
            .unwrap_err()
            .annotate("running \"delete-file\"");

        assert_eq!(
            err.messages(),
            vec!["running \"delete-file\"", "deleting file", "fetching file"]
        );
        assert_eq!(err.kind(), ErrorKind::Remote);
    }

    #[test]
    fn test_frame_records_caller_location() {
        let err = WorkflowError::validation("bad").annotate("here");
        let frame = err.frames().next().unwrap();
        assert_eq!(frame.location.file(), file!());
    }

    #[test]
    fn test_origin_is_annotation_site_for_converted_errors() {
        let line = line!() + 1;
        let err = Err::<(), _>(ControllerError::NoMatch("x".into())).annotate("here");
        assert_eq!(err.unwrap_err().origin().line(), line);
    }

    #[test]
    fn test_display_chains_messages() {
        let err = WorkflowError::ambiguous("machine", "node1", 2).annotate("resolving parent");
        assert_eq!(
            err.to_string(),
            "resolving parent: expected exactly one machine matching \"node1\", got 2"
        );
    }

    #[test]
    fn test_not_found_display() {
        let err = WorkflowError::not_found_within("subnet link", "sub-a", "dev1 interface eth0");
        assert_eq!(
            err.to_string(),
            "subnet link \"sub-a\" not found on dev1 interface eth0"
        );
        assert_eq!(
            WorkflowError::not_found("file", "x").to_string(),
            "file \"x\" not found"
        );
    }

    #[test]
    fn test_lookup_maps_no_match_to_not_found() {
        let err = WorkflowError::lookup("file", "x", ControllerError::NoMatch("404".into()));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = WorkflowError::lookup("file", "x", ControllerError::BadRequest("400".into()));
        assert_eq!(err.kind(), ErrorKind::Remote);
    }

    #[test]
    fn test_type_name_includes_remote_variant() {
        let err: WorkflowError = ControllerError::CannotComplete("busy".into()).into();
        assert_eq!(err.cause().type_name(), "RemoteError(CannotComplete)");
        assert_eq!(
            WorkflowError::validation("x").cause().type_name(),
            "ValidationError"
        );
    }

    #[test]
    fn test_source_is_root_cause() {
        use std::error::Error as _;
        let err = WorkflowError::not_found("interface", "eth9").annotate("outer");
        assert_eq!(
            err.source().unwrap().to_string(),
            "interface \"eth9\" not found"
        );
    }
}
