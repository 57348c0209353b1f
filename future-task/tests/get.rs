use future_task::task::spawn;
use future_task::{FutureTask, Panicked, TaskError, TaskState};
use std::hint::black_box;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

fn divide(a: i32, b: i32) -> i32 {
    a / b
}

#[test]
fn test_get_returns_computed_value() {
    let task = FutureTask::new(|| 2 + 3);

    task.run();

    assert_eq!(*task.get().unwrap(), 5);
    assert!(task.is_done());
    assert!(!task.is_cancelled());
    assert_eq!(task.state(), TaskState::Normal);
}

#[test]
fn test_get_reports_division_by_zero() {
    let divisor = black_box(0);
    let task = FutureTask::new(move || divide(10, divisor));

    task.run();

    match task.get() {
        Err(TaskError::Execution(cause)) => {
            let panicked = cause
                .downcast_ref::<Panicked>()
                .expect("cause should be a caught panic");
            assert!(
                panicked.message().contains("divide by zero"),
                "unexpected message: {}",
                panicked.message()
            );
        }
        other => panic!("expected an execution failure, got {:?}", other),
    }

    assert!(task.is_done());
    assert!(!task.is_cancelled());
    assert_eq!(task.state(), TaskState::Exceptional);
}

#[test]
fn test_get_reports_returned_error() {
    let task = FutureTask::fallible(|| -> Result<u32, io::Error> {
        Err(io::Error::new(io::ErrorKind::NotFound, "missing input"))
    });

    task.run();

    match task.get() {
        Err(TaskError::Execution(cause)) => {
            let err = cause.downcast_ref::<io::Error>().unwrap();
            assert_eq!(err.kind(), io::ErrorKind::NotFound);
            assert_eq!(cause.to_string(), "missing input");
        }
        other => panic!("expected an execution failure, got {:?}", other),
    }
}

#[test]
fn test_repeated_get_returns_same_result() {
    let task = FutureTask::new(|| String::from("cached"));
    task.run();

    let first = task.get().unwrap() as *const String;
    for _ in 0..10 {
        assert_eq!(task.get().unwrap(), "cached");
        assert_eq!(task.get().unwrap() as *const String, first);
    }

    let failing = FutureTask::fallible(|| -> Result<(), io::Error> {
        Err(io::Error::other("boom"))
    });
    failing.run();

    for _ in 0..3 {
        let err = failing.get().unwrap_err();
        assert_eq!(err.to_string(), "task computation failed: boom");
    }
}

#[test]
fn test_with_result_runs_work_then_yields_value() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let task = FutureTask::with_result(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        },
        "done",
    );

    task.run();

    assert_eq!(*task.get().unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_run_twice_executes_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let task = FutureTask::new(move || counter.fetch_add(1, Ordering::SeqCst) + 1);

    task.run();
    task.run();

    assert_eq!(*task.get().unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_timed_get_expires_then_unbounded_get_succeeds() {
    let task = Arc::new(FutureTask::new(|| {
        thread::sleep(Duration::from_millis(100));
        7
    }));

    let worker = spawn(task.clone()).unwrap();

    let result = task.get_timeout(Duration::from_millis(10));
    assert!(
        matches!(result, Err(TaskError::Timeout)),
        "expected a timeout, got {:?}",
        result
    );
    assert_eq!(task.state(), TaskState::New);
    assert!(!task.is_done());

    let waiter = {
        let task = task.clone();
        thread::spawn(move || *task.get().unwrap())
    };

    assert_eq!(waiter.join().unwrap(), 7);
    worker.join().unwrap();

    assert_eq!(*task.get_timeout(Duration::ZERO).unwrap(), 7);
}

#[test]
fn test_timed_get_completes_before_deadline() {
    let task = Arc::new(FutureTask::new(|| {
        thread::sleep(Duration::from_millis(10));
        123
    }));

    let worker = spawn(task.clone()).unwrap();

    assert_eq!(*task.get_timeout(Duration::from_secs(5)).unwrap(), 123);
    worker.join().unwrap();
}

#[test]
fn test_timed_get_with_huge_timeout_waits() {
    let task = Arc::new(FutureTask::new(|| 9));
    let worker = spawn(task.clone()).unwrap();

    assert_eq!(*task.get_timeout(Duration::MAX).unwrap(), 9);
    worker.join().unwrap();
}

#[test]
fn test_zero_timeout_on_pending_task() {
    let task = FutureTask::new(|| 1);

    assert!(matches!(
        task.get_timeout(Duration::ZERO),
        Err(TaskError::Timeout)
    ));

    task.run();
    assert_eq!(*task.get_timeout(Duration::ZERO).unwrap(), 1);
}

#[test]
fn test_spawn_uses_task_name_for_thread() {
    let task = Arc::new(
        FutureTask::builder()
            .name("named-worker")
            .build(|| thread::current().name().map(str::to_owned)),
    );

    spawn(task.clone()).unwrap().join().unwrap();

    assert_eq!(task.get().unwrap().as_deref(), Some("named-worker"));
}
