//! The default action: summarise the controller and round-trip one machine
//! lookup by system ID.

use async_trait::async_trait;
use tracing::debug;

use super::{Arity, Session, Workflow};
use crate::controller::{Machine, MachinesArgs};
use crate::error::{Annotate, WorkflowError};

/// No action: print zones, fabrics and machines, then look the first
/// machine up again by system ID.
pub struct Inspect;

impl Inspect {
    async fn requery(session: &Session<'_>, first: &Machine) -> Result<(), WorkflowError> {
        let system_id = first.system_id.as_str();
        session.say("");
        session.say(format!("Asking for machine with system ID: {system_id}"));

        let machines = session
            .controller
            .machines(MachinesArgs {
                system_ids: vec![system_id.to_string()],
                ..MachinesArgs::default()
            })
            .await
            .with_annotation(|| format!("listing machine {system_id:?}"))?;

        let [machine] = machines.as_slice() else {
            return Err(WorkflowError::ambiguous("machine", system_id, machines.len()));
        };
        if machine.system_id != system_id {
            return Err(WorkflowError::not_found("machine", system_id)
                .annotate(format!("lookup returned {:?}", machine.system_id)));
        }

        session.say(format!("Should just have 1 result: {}", machines.len()));
        session.say(&machine.system_id);
        session.say("");
        Ok(())
    }
}

#[async_trait]
impl Workflow for Inspect {
    fn action(&self) -> &'static str {
        ""
    }

    fn arity(&self) -> Arity {
        Arity::Any
    }

    fn usage(&self) -> &'static str {
        "(no action)"
    }

    async fn execute(&self, session: &Session<'_>, _args: &[String]) -> Result<(), WorkflowError> {
        let zones = session.controller.zones().await.annotate("listing zones")?;
        let fabrics = session
            .controller
            .fabrics()
            .await
            .annotate("listing fabrics")?;

        for fabric in &fabrics {
            session.say(format!(
                "Fabric {}({}) has {} vlans",
                fabric.name,
                fabric.id,
                fabric.vlans.len()
            ));
        }
        for zone in &zones {
            session.say(format!("Zone: {} ({})", zone.name, zone.description));
        }

        let machines = session
            .controller
            .machines(MachinesArgs::default())
            .await
            .annotate("listing machines")?;
        debug!(count = machines.len(), "Listed machines");

        for (i, machine) in machines.iter().enumerate() {
            session.say("");
            session.say(format!("-- machine {}", i + 1));
            session.say(format!("fqdn: {}", machine.fqdn));
            session.say(format!("system id: {}", machine.system_id));
            session.say(format!(
                "OS: {}/{}",
                machine.operating_system, machine.distro_series
            ));
            session.say(format!("Power: {}", machine.power_state));
        }

        let Some(first) = machines.first() else {
            return Err(WorkflowError::ambiguous("machine", "", 0)
                .annotate("no machine to look up by system ID"));
        };
        Self::requery(session, first)
            .await
            .annotate("round-tripping first machine")
    }
}
