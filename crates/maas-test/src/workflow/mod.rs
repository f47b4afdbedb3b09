//! Workflow executors, one per action.
//!
//! Every workflow is a short, fixed sequence of controller calls. The first
//! failing call ends the workflow; whatever was printed before stays printed.

use std::fmt;

use async_trait::async_trait;

use crate::config::WorkflowOptions;
use crate::controller::Controller;
use crate::error::WorkflowError;
use crate::output::Output;

mod devices;
mod files;
mod inspect;
mod machines;

pub use devices::{Container, CreateDevice, DeleteDevices, UnlinkSubnet, CONTAINER_INTERFACE};
pub use files::{AddFile, DeleteFile, ListFiles, ReadFile};
pub use inspect::Inspect;
pub use machines::{Allocate, Release, Start, RELEASE_COMMENT};

/// How many positional arguments a workflow takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Any number.
    Any,
    /// Exactly `n`.
    Exactly(usize),
    /// `n` or more.
    AtLeast(usize),
    /// `n` or fewer.
    AtMost(usize),
}

impl Arity {
    /// Whether `count` arguments are acceptable.
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
            Self::AtMost(n) => count <= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any number of"),
            Self::Exactly(n) => write!(f, "exactly {n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
            Self::AtMost(n) => write!(f, "at most {n}"),
        }
    }
}

/// What a running workflow can reach.
pub struct Session<'a> {
    /// Controller to issue calls against.
    pub controller: &'a dyn Controller,
    /// Options from the command line.
    pub options: &'a WorkflowOptions,
    /// User-facing output.
    pub output: &'a dyn Output,
}

impl<'a> Session<'a> {
    /// Bundle a controller, options and output sink.
    pub fn new(
        controller: &'a dyn Controller,
        options: &'a WorkflowOptions,
        output: &'a dyn Output,
    ) -> Self {
        Self {
            controller,
            options,
            output,
        }
    }

    /// Emit one line of output.
    pub fn say(&self, text: impl AsRef<str>) {
        self.output.line(text.as_ref());
    }
}

/// One action's executor.
#[async_trait]
pub trait Workflow: Send + Sync {
    /// Action name on the command line.
    fn action(&self) -> &'static str;

    /// Accepted argument count.
    fn arity(&self) -> Arity;

    /// Argument synopsis shown on arity errors.
    fn usage(&self) -> &'static str;

    /// Run the workflow. Arity has already been checked.
    async fn execute(&self, session: &Session<'_>, args: &[String]) -> Result<(), WorkflowError>;
}

/// View exactly `N` positional arguments as an array.
fn exact_args<const N: usize>(args: &[String]) -> Result<&[String; N], WorkflowError> {
    args.try_into().map_err(|_| {
        WorkflowError::validation(format!("expected {N} argument(s), got {}", args.len()))
    })
}

/// All workflows, in the order the command line documents them.
#[must_use]
pub fn standard() -> Vec<Box<dyn Workflow>> {
    vec![
        Box::new(Inspect),
        Box::new(Allocate),
        Box::new(Release),
        Box::new(Start),
        Box::new(CreateDevice),
        Box::new(DeleteDevices),
        Box::new(ListFiles),
        Box::new(AddFile),
        Box::new(ReadFile),
        Box::new(DeleteFile),
        Box::new(Container),
        Box::new(UnlinkSubnet),
    ]
}
