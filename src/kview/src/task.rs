//! Task lookups
//!
//! Every thread group leader hangs off `init_task.tasks`; the threads of a
//! group are on `signal->thread_head` (6.7+) or the older circular
//! `thread_group` list.

use crate::error::{KernelError, Result};
use crate::helpers::list_for_each_entry;
use crate::object::Object;
use crate::program::Program;

const TASK_STRUCT: &str = "struct task_struct";

/// Every thread of every process, leaders first within each group
///
/// `init_task` (the idle task, pid 0) is the list head and is not included.
pub fn for_each_task(prog: &Program) -> Result<Vec<Object<'_>>> {
    let init = prog.variable("init_task", TASK_STRUCT)?;
    let task_ty = init.ty();
    let types = prog.types();

    let walk = if types.find_member(task_ty, "thread_node").is_ok() {
        ThreadWalk::SignalList
    } else if types.find_member(task_ty, "thread_group").is_ok() {
        ThreadWalk::ThreadGroup
    } else {
        ThreadWalk::LeadersOnly
    };

    let mut tasks = Vec::new();
    for leader in list_for_each_entry(&init.member("tasks")?, TASK_STRUCT, "tasks")? {
        let leader = leader?;
        walk.threads(&leader, &mut tasks)?;
    }

    tracing::debug!(count = tasks.len(), ?walk, "walked task list");
    Ok(tasks)
}

#[derive(Debug, Clone, Copy)]
enum ThreadWalk {
    SignalList,
    ThreadGroup,
    LeadersOnly,
}

impl ThreadWalk {
    fn threads<'p>(self, leader: &Object<'p>, out: &mut Vec<Object<'p>>) -> Result<()> {
        match self {
            ThreadWalk::SignalList => {
                let head = leader.member("signal")?.member("thread_head")?;
                let start = out.len();
                for thread in list_for_each_entry(&head, TASK_STRUCT, "thread_node")? {
                    out.push(thread?);
                }
                if out.len() == start {
                    out.push(*leader);
                }
            }
            ThreadWalk::ThreadGroup => {
                out.push(*leader);
                let head = leader.member("thread_group")?;
                for thread in list_for_each_entry(&head, TASK_STRUCT, "thread_group")? {
                    out.push(thread?);
                }
            }
            ThreadWalk::LeadersOnly => out.push(*leader),
        }
        Ok(())
    }
}

/// The task whose `pid` is `pid`
pub fn find_task(prog: &Program, pid: i64) -> Result<Object<'_>> {
    for task in for_each_task(prog)? {
        if task.member("pid")?.value_i64()? == pid {
            tracing::debug!(pid, address = format_args!("{:#x}", task.address()), "found task");
            return Ok(task);
        }
    }
    Err(KernelError::TaskNotFound(pid))
}

pub fn task_pid(task: &Object<'_>) -> Result<i64> {
    task.member("pid")?.value_i64()
}

/// `task->comm`
pub fn task_comm(task: &Object<'_>) -> Result<String> {
    task.member("comm")?.read_cstr()
}
