//! Diagnostic reporting for failed workflows.

use tracing::error;

use crate::config::LogConfig;
use crate::error::WorkflowError;
use crate::output::Output;

/// Renders a failed workflow's root cause and annotation chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    verbose: bool,
}

impl Reporter {
    /// Reporter that shows source locations when verbose logging is on.
    #[must_use]
    pub fn new(logging: &LogConfig) -> Self {
        Self {
            verbose: logging.verbose,
        }
    }

    /// Lines describing `err`: its category, then each annotation from
    /// outermost to innermost, then the root cause.
    #[must_use]
    pub fn render(&self, err: &WorkflowError) -> Vec<String> {
        let mut lines = vec![
            String::new(),
            format!("Error type: {}", err.cause().type_name()),
        ];

        for frame in err.frames() {
            if self.verbose {
                lines.push(format!(
                    "  {} [{}:{}]",
                    frame.message,
                    frame.location.file(),
                    frame.location.line()
                ));
            } else {
                lines.push(format!("  {}", frame.message));
            }
        }

        let origin = err.origin();
        if self.verbose {
            lines.push(format!(
                "  {} [{}:{}]",
                err.cause(),
                origin.file(),
                origin.line()
            ));
        } else {
            lines.push(format!("  {}", err.cause()));
        }
        lines
    }

    /// Print the rendering of `err` and hand the error back.
    pub fn report(&self, output: &dyn Output, err: WorkflowError) -> WorkflowError {
        for line in self.render(&err) {
            output.line(&line);
        }
        error!(kind = %err.kind(), error = %err, "Workflow failed");
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerError;
    use crate::error::Annotate;
    use crate::output::Captured;

    fn nested() -> WorkflowError {
        let inner: Result<(), _> =
            Err(ControllerError::CannotComplete("machine is deploying".into()));
        inner
            .annotate("releasing machines")
            .annotate("running \"release\"")
            .unwrap_err()
    }

    #[test]
    fn test_render_plain() {
        let lines = Reporter::default().render(&nested());
        assert_eq!(
            lines,
            vec![
                "",
                "Error type: RemoteError(CannotComplete)",
                "  running \"release\"",
                "  releasing machines",
                "  cannot complete: machine is deploying",
            ]
        );
    }

    #[test]
    fn test_render_verbose_shows_locations() {
        let reporter = Reporter::new(&LogConfig::new(true));
        let lines = reporter.render(&nested());
        assert_eq!(lines.len(), 5);
        for line in &lines[2..] {
            assert!(line.contains(&format!("[{}:", file!())), "{line}");
        }
    }

    #[test]
    fn test_report_returns_the_error() {
        let out = Captured::default();
        let err = Reporter::default().report(&out, WorkflowError::validation("missing parent"));

        assert_eq!(err.to_string(), "missing parent");
        assert_eq!(out.lines()[1], "Error type: ValidationError");
        assert_eq!(out.lines()[2], "  missing parent");
    }
}
