//! Integration tests for processes and mailboxes.
//!
//! Every test talks to spawned processes through the host process's
//! mailbox, so nothing here sleeps.

use std::thread;

use ember_eval::{EvalError, ProcessState, Value};
use ember_runtime::{Machine, MachineConfig, MachineError};

fn machine() -> Machine {
    Machine::new(MachineConfig::default())
}

fn eval(machine: &Machine, source: &str) -> Value {
    machine
        .eval_str(source)
        .unwrap_or_else(|e| panic!("{}: {}", source, e))
}

#[test]
fn test_selective_receive_keeps_queue_order() {
    let m = machine();
    eval(&m, "self() ! m1, self() ! {m2, 2}");
    assert_eq!(m.host().mailbox_len(), 2);

    assert_eq!(eval(&m, "receive {m2, X} -> X end"), Value::Int(2));
    assert_eq!(m.host().mailbox_len(), 1);

    assert_eq!(eval(&m, "receive m1 -> got_m1 end"), Value::atom("got_m1"));
    assert_eq!(m.host().mailbox_len(), 0);
}

#[test]
fn test_first_matching_clause_wins_per_message() {
    let m = machine();
    eval(&m, "self() ! {b, 1}, self() ! {a, 2}");
    // The oldest message is tried against every clause before the next one.
    assert_eq!(
        eval(&m, "receive {a, N} -> {a, N}; {b, N} -> {b, N} end").to_string(),
        "{b,1}"
    );
}

#[test]
fn test_spawn_gives_distinct_handles() {
    let m = machine();
    let result = eval(
        &m,
        "Parent = self(),
         P1 = spawn(fun () -> Parent ! {self(), one} end),
         P2 = spawn(fun () -> Parent ! {self(), two} end),
         A = receive {P1, one} -> P1 end,
         B = receive {P2, two} -> P2 end,
         {P1 =/= P2, A =:= P1, B =:= P2, P1 =/= Parent}",
    );
    assert_eq!(result.to_string(), "{true,true,true,true}");
}

#[test]
fn test_messages_from_one_sender_arrive_in_order() {
    let m = machine();
    let result = eval(
        &m,
        "Parent = self(),
         spawn(fun () -> Parent ! m1, Parent ! {m2, x} end),
         Second = receive {m2, V} -> V end,
         First = receive m1 -> m1 end,
         {First, Second}",
    );
    assert_eq!(result.to_string(), "{m1,x}");
}

#[test]
fn test_request_reply_server() {
    let m = machine();
    m.load_source(
        "server.erl",
        "loop(Count) ->
             receive
                 {add, N} -> loop(Count + N);
                 {get, From} -> From ! {count, Count}, loop(Count);
                 stop -> done
             end.",
    )
    .unwrap();

    let result = eval(
        &m,
        "S = spawn(fun () -> loop(0) end),
         S ! {add, 2}, S ! {add, 3}, S ! {get, self()},
         receive {count, C} -> S ! stop, C end",
    );
    assert_eq!(result, Value::Int(5));
}

#[test]
fn test_crashed_process_does_not_take_down_others() {
    let m = machine();
    let result = eval(
        &m,
        "Parent = self(),
         spawn(fun () -> 1 = 2 end),
         spawn(fun () -> Parent ! alive end),
         receive alive -> ok end",
    );
    assert_eq!(result, Value::ok());
}

#[test]
fn test_spawn_checks_entry_arity() {
    let m = machine();
    assert!(matches!(
        m.eval_str("spawn(fun (X) -> X end)"),
        Err(MachineError::Eval(EvalError::BadArity { .. }))
    ));
    assert!(matches!(
        m.eval_str("spawn(42)"),
        Err(MachineError::Eval(EvalError::BadFunction(_)))
    ));
}

#[test]
fn test_send_requires_a_pid() {
    let m = machine();
    assert!(matches!(
        m.eval_str("hello ! world"),
        Err(MachineError::Eval(EvalError::TypeError(_)))
    ));
}

#[test]
fn test_host_process_is_running_and_registered() {
    let m = machine();
    assert_eq!(m.host().state(), ProcessState::Running);
    assert!(m.node().process(m.host().pid()).is_some());
}

#[test]
fn test_blocked_receive_rescans_after_each_send() {
    let m = machine();
    let host = m.host().clone();
    let sender = thread::spawn(move || {
        while host.state() != ProcessState::Blocked {
            thread::yield_now();
        }
        host.send(Value::atom("noise"));
        host.send(Value::tuple(vec![Value::atom("hit"), Value::Int(1)]));
    });

    assert_eq!(eval(&m, "receive {hit, X} -> X end"), Value::Int(1));
    sender.join().unwrap();

    // The earlier, unmatched message stays queued at the front.
    assert_eq!(m.host().mailbox_len(), 1);
    assert_eq!(eval(&m, "receive Any -> Any end"), Value::atom("noise"));
}

#[test]
fn test_runaway_recursion_ends_only_its_own_process() {
    let m = machine();
    m.load_source("deep.erl", "deep(0) -> 0; deep(N) -> 1 + deep(N - 1).")
        .unwrap();

    let Value::Pid(runaway) = eval(&m, "spawn(fun () -> deep(1000000) end)") else {
        panic!("spawn should return a pid");
    };
    while m.node().process(runaway.pid()).is_some() {
        thread::yield_now();
    }
    assert_eq!(runaway.state(), ProcessState::Terminated);

    let result = eval(
        &m,
        "Parent = self(),
         spawn(fun () -> Parent ! {depth, deep(100)} end),
         receive {depth, N} -> N end",
    );
    assert_eq!(result, Value::Int(100));
}
