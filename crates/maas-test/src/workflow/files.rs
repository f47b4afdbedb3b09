//! File store workflows.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{exact_args, Arity, Session, Workflow};
use crate::controller::{AddFileArgs, FileSource};
use crate::error::{Annotate, WorkflowError};
use crate::resolve;

/// `list-files [prefix]`
pub struct ListFiles;

#[async_trait]
impl Workflow for ListFiles {
    fn action(&self) -> &'static str {
        "list-files"
    }

    fn arity(&self) -> Arity {
        Arity::AtMost(1)
    }

    fn usage(&self) -> &'static str {
        "list-files [prefix]"
    }

    async fn execute(&self, session: &Session<'_>, args: &[String]) -> Result<(), WorkflowError> {
        let prefix = args.first().map_or("", String::as_str);

        let files = session
            .controller
            .files(prefix)
            .await
            .with_annotation(|| format!("listing files with prefix {prefix:?}"))?;

        for (i, file) in files.iter().enumerate() {
            session.say(format!("{i}: {} ({})", file.filename, file.anonymous_url));
        }
        Ok(())
    }
}

/// `add-file <filename> <path>`: upload a local file, buffered when
/// read-direct is set and streamed otherwise.
pub struct AddFile;

#[async_trait]
impl Workflow for AddFile {
    fn action(&self) -> &'static str {
        "add-file"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(2)
    }

    fn usage(&self) -> &'static str {
        "add-file <filename> <path>"
    }

    async fn execute(&self, session: &Session<'_>, args: &[String]) -> Result<(), WorkflowError> {
        let [filename, path] = exact_args::<2>(args)?;

        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            WorkflowError::validation(format!("file {path:?} is not accessible: {e}"))
        })?;
        if !metadata.is_file() {
            return Err(WorkflowError::validation(format!(
                "file {path:?} is not a regular file"
            )));
        }

        let source = if session.options.read_direct {
            info!("reading content first");
            let content = tokio::fs::read(path).await.map_err(|e| {
                WorkflowError::validation(format!("file {path:?} is not readable: {e}"))
            })?;
            FileSource::Bytes(content)
        } else {
            info!("opening file and providing reader");
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                WorkflowError::validation(format!("file {path:?} cannot be opened: {e}"))
            })?;
            FileSource::Reader {
                reader: Box::new(file),
                length: metadata.len(),
            }
        };
        debug!(filename = %filename, path = %path, source = ?source, "Uploading file");

        session
            .controller
            .add_file(AddFileArgs {
                filename: filename.clone(),
                source,
            })
            .await
            .with_annotation(|| format!("adding file {filename:?}"))?;

        session.say("file added successfully");
        Ok(())
    }
}

/// `read-file <filename>`: print a stored file's content.
pub struct ReadFile;

#[async_trait]
impl Workflow for ReadFile {
    fn action(&self) -> &'static str {
        "read-file"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn usage(&self) -> &'static str {
        "read-file <filename>"
    }

    async fn execute(&self, session: &Session<'_>, args: &[String]) -> Result<(), WorkflowError> {
        let [filename] = exact_args::<1>(args)?;

        let file = if session.options.read_direct {
            session
                .controller
                .get_file(filename)
                .await
                .map_err(|e| WorkflowError::lookup("file", filename, e))
                .with_annotation(|| format!("fetching file {filename:?}"))?
        } else {
            let files = session
                .controller
                .files(filename)
                .await
                .with_annotation(|| format!("listing files with prefix {filename:?}"))?;
            resolve::file_by_exact_name(files, filename)?
        };

        let content = session
            .controller
            .read_file(&file)
            .await
            .with_annotation(|| format!("reading file {filename:?}"))?;

        session.say(String::from_utf8_lossy(&content));
        Ok(())
    }
}

/// `delete-file <filename>`
pub struct DeleteFile;

#[async_trait]
impl Workflow for DeleteFile {
    fn action(&self) -> &'static str {
        "delete-file"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn usage(&self) -> &'static str {
        "delete-file <filename>"
    }

    async fn execute(&self, session: &Session<'_>, args: &[String]) -> Result<(), WorkflowError> {
        let [filename] = exact_args::<1>(args)?;

        let file = session
            .controller
            .get_file(filename)
            .await
            .map_err(|e| WorkflowError::lookup("file", filename, e))
            .with_annotation(|| format!("fetching file {filename:?}"))?;

        session
            .controller
            .delete_file(&file.filename)
            .await
            .with_annotation(|| format!("deleting file {filename:?}"))?;

        session.say(format!("File {filename:?} deleted."));
        Ok(())
    }
}
