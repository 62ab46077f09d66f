//! Task listing and dumps

use anyhow::{Context, Result};
use kview::{find_task, for_each_task, format_object, hex, task_comm, task_pid, Program};

/// List every task, or dump the task with `pid` and its scheduling entity
pub fn handle(prog: &Program, pid: Option<i64>) -> Result<()> {
    let Some(pid) = pid else {
        for task in for_each_task(prog)? {
            println!("pid={}: {}", task_pid(&task)?, task_comm(&task)?);
        }
        return Ok(());
    };

    let task = find_task(prog, pid)?;
    println!("task_struct@{}:", hex(task.address()));
    println!("{}", format_object(&task)?);

    let se = task
        .member("se")
        .context("task_struct has no sched_entity")?;
    println!("sched_entity:");
    println!("{}", format_object(&se)?);

    Ok(())
}
