//! Processes and their mailboxes.
//!
//! Each process owns one OS thread. The mailbox is the only state that is
//! written across threads: any process may append to it, only the owner
//! scans and removes from it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::matcher::MatchBody;
use crate::{Context, EvalError, Value};

/// Lifecycle of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Created, its thread has not started running yet
    Runnable,
    Running,
    /// Waiting in `receive` for a matching message
    Blocked,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProcessState::Runnable => "runnable",
            ProcessState::Running => "running",
            ProcessState::Blocked => "blocked",
            ProcessState::Terminated => "terminated",
        })
    }
}

/// A shareable handle to a process: its pid and its mailbox.
#[derive(Clone)]
pub struct ProcessHandle {
    inner: Arc<ProcessInner>,
}

struct ProcessInner {
    pid: u64,
    slot: Mutex<Slot>,
    wake: Condvar,
}

struct Slot {
    messages: VecDeque<Value>,
    state: ProcessState,
}

impl ProcessHandle {
    pub(crate) fn new(pid: u64) -> Self {
        Self {
            inner: Arc::new(ProcessInner {
                pid,
                slot: Mutex::new(Slot {
                    messages: VecDeque::new(),
                    state: ProcessState::Runnable,
                }),
                wake: Condvar::new(),
            }),
        }
    }

    pub fn pid(&self) -> u64 {
        self.inner.pid
    }

    pub fn state(&self) -> ProcessState {
        self.lock().state
    }

    pub(crate) fn set_state(&self, state: ProcessState) {
        self.lock().state = state;
    }

    /// Number of queued messages.
    pub fn mailbox_len(&self) -> usize {
        self.lock().messages.len()
    }

    /// Mark the process terminated and discard whatever is still queued.
    pub(crate) fn terminate(&self) {
        let mut slot = self.lock();
        slot.state = ProcessState::Terminated;
        slot.messages.clear();
    }

    /// Append a message to the mailbox. Never blocks; a terminated process
    /// silently drops it.
    pub fn send(&self, message: Value) {
        let mut slot = self.lock();
        if slot.state == ProcessState::Terminated {
            trace!(pid = self.pid(), %message, "dropping message for terminated process");
            return;
        }
        slot.messages.push_back(message);
        drop(slot);
        self.inner.wake.notify_all();
    }

    /// Selective receive.
    ///
    /// Scans the mailbox from the oldest message, trying every clause on
    /// each message in order. The first match removes that one message and
    /// returns the clause index with the bound context. With no match the
    /// caller blocks until a send arrives, then rescans the whole queue.
    ///
    /// Clause patterns must already be forced: no user code may run while
    /// the mailbox lock is held.
    pub fn receive(
        &self,
        clauses: &[MatchBody<'_>],
        ctx: &Context,
    ) -> Result<(usize, Context), EvalError> {
        let mut slot = self.lock();
        loop {
            if let Some((position, index, bound)) = Self::scan(&slot.messages, clauses, ctx)? {
                slot.messages.remove(position);
                slot.state = ProcessState::Running;
                return Ok((index, bound));
            }

            slot.state = ProcessState::Blocked;
            trace!(pid = self.pid(), queued = slot.messages.len(), "receive blocked");
            slot = self
                .inner
                .wake
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn scan(
        messages: &VecDeque<Value>,
        clauses: &[MatchBody<'_>],
        ctx: &Context,
    ) -> Result<Option<(usize, usize, Context)>, EvalError> {
        for (position, message) in messages.iter().enumerate() {
            for (index, clause) in clauses.iter().enumerate() {
                if let Some(bound) = clause.make_context(message, ctx)? {
                    return Ok(Some((position, index, bound)));
                }
            }
        }
        Ok(None)
    }

    // Poisoning can only come from a panic between lock and unlock; the
    // queue itself stays consistent, so keep using it.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for ProcessHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.pid == other.inner.pid
    }
}

impl Eq for ProcessHandle {}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<0.{}.0>", self.inner.pid)
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessHandle({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selective_receive_keeps_order() {
        let process = ProcessHandle::new(1);
        process.send(Value::atom("m1"));
        process.send(Value::tuple(vec![Value::atom("m2"), Value::Int(2)]));

        let (body, _) = ember_parser::parse_expr("ok");
        let body = body.unwrap();
        let ctx = Context::new();
        let second_shape = MatchBody::new(
            Value::tuple(vec![Value::atom("m2"), Value::Variable("X".into())]),
            &body,
        );
        let (index, bound) = process.receive(&[second_shape], &ctx).unwrap();
        assert_eq!(index, 0);
        assert_eq!(bound.lookup("X"), Some(Value::Int(2)));
        assert_eq!(process.mailbox_len(), 1);

        let first_shape = MatchBody::new(Value::atom("m1"), &body);
        process.receive(&[first_shape], &ctx).unwrap();
        assert_eq!(process.mailbox_len(), 0);
    }

    #[test]
    fn test_send_to_terminated_is_dropped() {
        let process = ProcessHandle::new(7);
        process.terminate();
        process.send(Value::Int(1));
        assert_eq!(process.mailbox_len(), 0);
        assert_eq!(process.to_string(), "<0.7.0>");
    }
}
