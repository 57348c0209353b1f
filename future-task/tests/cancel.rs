use future_task::task::spawn;
use future_task::{FutureTask, Interrupted, TaskError, TaskState, interrupt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn wait_for(flag: &AtomicBool) {
    while !flag.load(Ordering::SeqCst) {
        thread::yield_now();
    }
}

#[test]
fn test_cancel_before_run_skips_computation() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();

    let task = FutureTask::new(move || {
        flag.store(true, Ordering::SeqCst);
        1
    });

    assert!(task.cancel(false));

    assert!(task.is_cancelled());
    assert!(task.is_done());
    assert_eq!(task.state(), TaskState::Cancelled);
    assert!(matches!(task.get(), Err(TaskError::Cancelled)));

    task.run();

    assert!(!ran.load(Ordering::SeqCst));
    assert!(matches!(task.get(), Err(TaskError::Cancelled)));
}

#[test]
fn test_cancel_with_interrupt_before_run() {
    let task = FutureTask::new(|| 1);

    assert!(task.cancel(true));
    assert_eq!(task.state(), TaskState::Interrupted);

    task.run();

    assert!(matches!(task.get(), Err(TaskError::Cancelled)));
    assert!(!interrupt::is_interrupted());
}

#[test]
fn test_cancel_is_idempotent() {
    let task = FutureTask::new(|| 1);

    assert!(task.cancel(false));
    assert!(!task.cancel(false));
    assert!(!task.cancel(true));
    assert_eq!(task.state(), TaskState::Cancelled);
}

#[test]
fn test_cancel_after_completion_fails() {
    let task = FutureTask::new(|| 11);
    task.run();

    assert!(!task.cancel(false));
    assert!(!task.cancel(true));
    assert!(!task.is_cancelled());
    assert_eq!(*task.get().unwrap(), 11);
}

#[test]
fn test_cancel_without_interrupt_discards_result() {
    let started = Arc::new(AtomicBool::new(false));
    let release = Arc::new(Barrier::new(2));

    let task = Arc::new(FutureTask::new({
        let started = started.clone();
        let release = release.clone();
        move || {
            started.store(true, Ordering::SeqCst);
            release.wait();
            42
        }
    }));

    let worker = spawn(task.clone()).unwrap();
    wait_for(&started);

    assert!(task.cancel(false));
    release.wait();
    worker.join().unwrap();

    assert!(matches!(task.get(), Err(TaskError::Cancelled)));
    assert_eq!(task.state(), TaskState::Cancelled);
}

#[test]
fn test_cancel_with_interrupt_stops_sleeping_computation() {
    let started = Arc::new(AtomicBool::new(false));
    let observed = Arc::new(AtomicBool::new(false));

    let task = Arc::new(FutureTask::fallible({
        let started = started.clone();
        let observed = observed.clone();
        move || -> Result<u32, Interrupted> {
            started.store(true, Ordering::SeqCst);
            let slept = interrupt::sleep(Duration::from_secs(30));
            observed.store(slept.is_err(), Ordering::SeqCst);
            slept.map(|()| 1)
        }
    }));

    let worker = {
        let task = task.clone();
        thread::spawn(move || {
            task.run();
            interrupt::is_interrupted()
        })
    };

    wait_for(&started);
    assert!(task.cancel(true));

    let still_interrupted = worker.join().unwrap();

    assert!(observed.load(Ordering::SeqCst));
    assert!(!still_interrupted);
    assert_eq!(task.state(), TaskState::Interrupted);
    assert!(matches!(task.get(), Err(TaskError::Cancelled)));
}

#[test]
fn test_runner_interrupt_is_cleared_after_run() {
    let started = Arc::new(AtomicBool::new(false));

    let task = Arc::new(FutureTask::new({
        let started = started.clone();
        move || {
            started.store(true, Ordering::SeqCst);
            while !interrupt::is_interrupted() {
                thread::yield_now();
            }
            "noticed"
        }
    }));

    let worker = {
        let task = task.clone();
        thread::spawn(move || {
            task.run();
            interrupt::is_interrupted()
        })
    };

    wait_for(&started);
    assert!(task.cancel(true));

    assert!(!worker.join().unwrap());
    assert!(task.is_cancelled());
    assert!(matches!(task.get(), Err(TaskError::Cancelled)));
}

#[test]
fn test_cancel_wakes_blocked_getters() {
    let task = Arc::new(FutureTask::new(|| 5));

    let getters: Vec<_> = (0..4)
        .map(|_| {
            let task = task.clone();
            thread::spawn(move || matches!(task.get(), Err(TaskError::Cancelled)))
        })
        .collect();

    thread::sleep(Duration::from_millis(20));
    assert!(task.cancel(false));

    for getter in getters {
        assert!(getter.join().unwrap());
    }
}
