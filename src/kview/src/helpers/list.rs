//! Doubly linked `struct list_head` lists

use crate::error::{KernelError, Result};
use crate::object::Object;
use crate::program::Program;
use crate::types::TypeId;

/// Iterator over the entries of a kernel list
///
/// Yields each containing `spec` object, stopping when the walk comes back
/// to the head. A NULL link ends the walk with an error.
pub struct ListIter<'p> {
    prog: &'p Program,
    head: u64,
    cursor: u64,
    next_offset: u64,
    member_offset: u64,
    entry_ty: TypeId,
    done: bool,
}

/// `list_for_each_entry(pos, head, member)` with `pos` of type `spec`
///
/// `head` is a `struct list_head` or a pointer to one; `member` may be a
/// dotted path such as `subsys.kobj.entry`.
pub fn list_for_each_entry<'p>(
    head: &Object<'p>,
    spec: &str,
    member: &str,
) -> Result<ListIter<'p>> {
    let prog = head.program();
    let head = if prog.types().is_pointer(head.ty()) {
        head.deref()?
    } else {
        *head
    };

    let next_offset = prog.types().find_member(head.ty(), "next")?.byte_offset();
    let head_address = head.address_of()?;
    let first = prog.memory().read_ptr(head_address + next_offset)?;

    Ok(ListIter {
        prog,
        head: head_address,
        cursor: first,
        next_offset,
        member_offset: prog.offset_of(spec, member)?,
        entry_ty: prog.types().find(spec)?,
        done: false,
    })
}

impl<'p> Iterator for ListIter<'p> {
    type Item = Result<Object<'p>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.cursor == self.head {
            self.done = true;
            return None;
        }
        if self.cursor == 0 {
            self.done = true;
            return Some(Err(KernelError::NullPointer(format!(
                "struct list_head * in list at {:#x}",
                self.head
            ))));
        }

        let node = self.cursor;
        match self.prog.memory().read_ptr(node + self.next_offset) {
            Ok(next) => self.cursor = next,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        }

        let entry = node.wrapping_sub(self.member_offset);
        Some(Ok(self.prog.object(entry, self.entry_ty)))
    }
}
