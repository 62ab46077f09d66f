//! Field path resolution on a task or a bus device

use anyhow::Result;
use kview::{find_bus_device, find_task, to_bus_device, DeviceSelector, FieldPath, Program};

/// Print the address or value `path` names, starting from the task with
/// `pid` or from the bus-specific structure of `device`
pub fn handle(
    prog: &Program,
    pid: Option<i64>,
    device: Option<&DeviceSelector>,
    path: &FieldPath,
) -> Result<()> {
    let root = match (pid, device) {
        (Some(pid), _) => find_task(prog, pid)?,
        (None, Some(selector)) => {
            let device = find_bus_device(prog, selector.bus, &selector.name)?;
            to_bus_device(&device, selector.bus)?
        }
        (None, None) => anyhow::bail!("either --pid or --device is required"),
    };

    tracing::debug!(root = ?root, %path, "resolving");
    println!("{}", path.resolve(&root)?);
    Ok(())
}
