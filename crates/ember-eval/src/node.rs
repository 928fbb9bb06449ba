//! The node: process registry, pid allocation, thread spawning and the
//! shared output sink.

use std::any::Any;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::process::{ProcessHandle, ProcessState};
use crate::{Context, EvalError, Evaluator, Value};

/// Default stack size for process threads.
pub const DEFAULT_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Shared state of one interpreter instance.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    next_pid: AtomicU64,
    stack_size: usize,
    processes: DashMap<u64, ProcessHandle>,
    output: Output,
}

impl Node {
    pub fn new(stack_size: usize) -> Self {
        Self::with_output(stack_size, Output::stdout())
    }

    pub fn with_output(stack_size: usize, output: Output) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                next_pid: AtomicU64::new(0),
                stack_size,
                processes: DashMap::new(),
                output,
            }),
        }
    }

    pub fn stack_size(&self) -> usize {
        self.inner.stack_size
    }

    pub fn output(&self) -> &Output {
        &self.inner.output
    }

    /// Allocate and register a new process with an empty mailbox.
    fn create_process(&self) -> ProcessHandle {
        let pid = self.inner.next_pid.fetch_add(1, Ordering::Relaxed);
        let process = ProcessHandle::new(pid);
        self.inner.processes.insert(pid, process.clone());
        process
    }

    /// A process for the calling thread, so that `self()` and `receive`
    /// work outside spawned processes.
    pub fn host_process(&self) -> ProcessHandle {
        let process = self.create_process();
        process.set_state(ProcessState::Running);
        process
    }

    /// Start `entry` (a function of arity 0) on a new thread and return its
    /// handle without waiting.
    pub fn spawn(&self, entry: Value, ctx: Context) -> Result<ProcessHandle, EvalError> {
        let callable = entry
            .as_callable()
            .ok_or_else(|| EvalError::BadFunction(entry.clone()))?;
        callable.check_arity(&[])?;

        let process = self.create_process();
        let evaluator = Evaluator::new(self.clone(), process.clone());
        let node = self.clone();

        let spawned = thread::Builder::new()
            .name(format!("ember {}", process))
            .stack_size(self.inner.stack_size)
            .spawn(move || {
                let process = evaluator.process().clone();
                process.set_state(ProcessState::Running);

                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    evaluator.call(&entry, &ctx, Vec::new())
                }));
                match outcome {
                    Ok(Ok(result)) => debug!(pid = process.pid(), %result, "process exited"),
                    Ok(Err(error)) => warn!(pid = process.pid(), %error, "process crashed"),
                    Err(payload) => warn!(
                        pid = process.pid(),
                        panic = %panic_message(payload),
                        "process panicked"
                    ),
                }

                node.terminate(&process);
            });

        match spawned {
            Ok(_) => {
                debug!(pid = process.pid(), "process spawned");
                Ok(process)
            }
            Err(error) => {
                self.terminate(&process);
                Err(EvalError::Spawn(error.to_string()))
            }
        }
    }

    /// Mark a process terminated and drop it from the registry.
    pub fn terminate(&self, process: &ProcessHandle) {
        process.terminate();
        self.inner.processes.remove(&process.pid());
    }

    pub fn process(&self, pid: u64) -> Option<ProcessHandle> {
        self.inner.processes.get(&pid).map(|entry| entry.clone())
    }

    /// Live processes, ordered by pid.
    pub fn processes(&self) -> Vec<ProcessHandle> {
        let mut processes: Vec<ProcessHandle> = self
            .inner
            .processes
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        processes.sort_by_key(ProcessHandle::pid);
        processes
    }

    pub fn process_count(&self) -> usize {
        self.inner.processes.len()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "unknown panic".to_string(),
        },
    }
}

/// Where `io` output goes. Stdout by default; tests swap in a buffer.
#[derive(Clone)]
pub struct Output {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Output {
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// An in-memory sink and a handle to read back what was written.
    pub fn buffer() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Self::from_writer(buffer.clone()), buffer)
    }

    pub fn write_str(&self, text: &str) -> Result<(), EvalError> {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_all(text.as_bytes())
            .and_then(|()| sink.flush())
            .map_err(|error| EvalError::Output(error.to_string()))
    }
}

/// A cloneable in-memory writer.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
