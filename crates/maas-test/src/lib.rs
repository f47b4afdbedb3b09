//! Command-line exerciser for a MAAS 2.0 bare metal controller.
//!
//! Each action runs one short workflow against the controller: inspect the
//! inventory, allocate, start and release machines, manage devices and their
//! subnet links, and work with the file store. Names given on the command
//! line are resolved to live resources before anything is changed, and every
//! failure is reported with its root cause and the chain of steps that led
//! to it.
//!
//! # Example
//!
//! ```rust,ignore
//! use maas_test::controller::maas::{ControllerArgs, MaasController};
//! use maas_test::{Dispatcher, LogConfig, Session, Stdout, WorkflowOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let logging = LogConfig::new(false);
//!     let controller =
//!         MaasController::connect(ControllerArgs::new("http://maas/MAAS", "c:t:s")).await?;
//!     let options = WorkflowOptions::new(false, "");
//!     let session = Session::new(&controller, &options, &Stdout);
//!
//!     Dispatcher::standard(&logging)
//!         .dispatch(&session, "list-files", &[])
//!         .await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod mac;
pub mod output;
pub mod report;
pub mod resolve;
pub mod workflow;

pub use config::{LogConfig, Settings, WorkflowOptions};
pub use controller::{Controller, ControllerError};
pub use dispatch::{Dispatch, Dispatcher};
pub use error::{Annotate, Cause, ErrorKind, WorkflowError};
pub use output::{Captured, Output, Stdout};
pub use report::Reporter;
pub use workflow::{Arity, Session, Workflow};
