//! Action dispatch: map the action name to its workflow, check arity, run it
//! and report failures.

use std::collections::BTreeMap;

use tracing::{debug, info_span, Instrument};

use crate::config::LogConfig;
use crate::error::WorkflowError;
use crate::report::Reporter;
use crate::workflow::{self, Session, Workflow};

/// How a dispatch ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The workflow ran to completion.
    Completed,
    /// No workflow is registered under the action name.
    UnknownAction,
}

/// Registry of workflows keyed by action name.
pub struct Dispatcher {
    workflows: BTreeMap<&'static str, Box<dyn Workflow>>,
    reporter: Reporter,
}

impl Dispatcher {
    /// Empty dispatcher.
    #[must_use]
    pub fn new(logging: &LogConfig) -> Self {
        Self {
            workflows: BTreeMap::new(),
            reporter: Reporter::new(logging),
        }
    }

    /// Dispatcher with every built-in workflow registered.
    #[must_use]
    pub fn standard(logging: &LogConfig) -> Self {
        let mut dispatcher = Self::new(logging);
        for wf in workflow::standard() {
            dispatcher.register(wf);
        }
        dispatcher
    }

    /// Register a workflow, replacing any previous one with the same action.
    pub fn register(&mut self, wf: Box<dyn Workflow>) {
        self.workflows.insert(wf.action(), wf);
    }

    /// Registered action names, sorted.
    pub fn actions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.workflows.keys().copied()
    }

    /// Run `action` with `args`.
    ///
    /// An unknown action prints a notice and is not an error.
    ///
    /// # Errors
    /// Returns the workflow's error, already reported to the session output.
    pub async fn dispatch(
        &self,
        session: &Session<'_>,
        action: &str,
        args: &[String],
    ) -> Result<Dispatch, WorkflowError> {
        let Some(wf) = self.workflows.get(action) else {
            session.say(format!("unknown action: {action:?}"));
            session.say("");
            return Ok(Dispatch::UnknownAction);
        };

        let result = async {
            if !wf.arity().accepts(args.len()) {
                return Err(WorkflowError::validation(format!(
                    "{action}: expected {} argument(s), got {}; usage: {}",
                    wf.arity(),
                    args.len(),
                    wf.usage()
                )));
            }
            debug!(?args, "Running workflow");
            wf.execute(session, args).await
        }
        .instrument(info_span!("workflow", action))
        .await;

        match result {
            Ok(()) => Ok(Dispatch::Completed),
            Err(err) => {
                let err = err.annotate(format!("running {action:?}"));
                Err(self.reporter.report(session.output, err))
            }
        }
    }
}
