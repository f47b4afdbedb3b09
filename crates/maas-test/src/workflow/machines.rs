//! Machine lifecycle: allocate, start, release.

use async_trait::async_trait;

use super::{exact_args, Arity, Session, Workflow};
use crate::controller::{AllocateMachineArgs, ReleaseMachinesArgs, StartArgs};
use crate::error::{Annotate, WorkflowError};
use crate::resolve;

/// Comment attached to bulk releases.
pub const RELEASE_COMMENT: &str = "released by maas-test";

/// `allocate <hostname>`: reserve a machine without deploying it.
pub struct Allocate;

#[async_trait]
impl Workflow for Allocate {
    fn action(&self) -> &'static str {
        "allocate"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn usage(&self) -> &'static str {
        "allocate <hostname>"
    }

    async fn execute(&self, session: &Session<'_>, args: &[String]) -> Result<(), WorkflowError> {
        let [hostname] = exact_args::<1>(args)?;

        let (machine, matches) = session
            .controller
            .allocate_machine(AllocateMachineArgs {
                hostname: Some(hostname.clone()),
                ..AllocateMachineArgs::default()
            })
            .await
            .with_annotation(|| format!("allocating machine {hostname:?}"))?;

        session.say(format!("match: {matches:?}"));
        session.say(format!("Allocated machine: {}", machine.fqdn));
        Ok(())
    }
}

/// `release <systemID...>`: return machines to the pool in one call.
pub struct Release;

#[async_trait]
impl Workflow for Release {
    fn action(&self) -> &'static str {
        "release"
    }

    fn arity(&self) -> Arity {
        Arity::Any
    }

    fn usage(&self) -> &'static str {
        "release <systemID...>"
    }

    async fn execute(&self, session: &Session<'_>, args: &[String]) -> Result<(), WorkflowError> {
        session
            .controller
            .release_machines(ReleaseMachinesArgs {
                system_ids: args.to_vec(),
                comment: Some(RELEASE_COMMENT.to_string()),
            })
            .await
            .with_annotation(|| format!("releasing machines {args:?}"))?;

        session.say("Released successfully");
        Ok(())
    }
}

/// `start <hostname> <series>`: deploy an allocated machine.
pub struct Start;

#[async_trait]
impl Workflow for Start {
    fn action(&self) -> &'static str {
        "start"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(2)
    }

    fn usage(&self) -> &'static str {
        "start <hostname> <series>"
    }

    async fn execute(&self, session: &Session<'_>, args: &[String]) -> Result<(), WorkflowError> {
        let [hostname, series] = exact_args::<2>(args)?;

        let machine = resolve::machine_by_hostname(session.controller, hostname)
            .await
            .annotate("resolving machine to start")?;

        session
            .controller
            .start_machine(
                &machine.system_id,
                StartArgs {
                    distro_series: series.clone(),
                    comment: None,
                },
            )
            .await
            .with_annotation(|| format!("starting {} with series {series:?}", machine.system_id))?;

        session.say("Started successfully");
        Ok(())
    }
}
