use future_task::{FutureTask, TaskError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_cancel_and_run_agree_on_a_single_outcome() {
    for round in 0..200 {
        let executions = Arc::new(AtomicUsize::new(0));
        let counter = executions.clone();
        let task = Arc::new(FutureTask::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            round
        }));

        let start = Arc::new(Barrier::new(3));

        let runner = {
            let task = task.clone();
            let start = start.clone();
            thread::spawn(move || {
                start.wait();
                task.run();
            })
        };

        let canceller = {
            let task = task.clone();
            let start = start.clone();
            thread::spawn(move || {
                start.wait();
                task.cancel(round % 2 == 0)
            })
        };

        start.wait();
        runner.join().unwrap();
        let cancelled = canceller.join().unwrap();

        assert!(executions.load(Ordering::SeqCst) <= 1);
        assert!(task.is_done());
        assert_eq!(task.is_cancelled(), cancelled);

        for _ in 0..3 {
            match task.get() {
                Ok(value) => {
                    assert!(!cancelled);
                    assert_eq!(*value, round);
                }
                Err(TaskError::Cancelled) => assert!(cancelled),
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
    }
}

#[test]
fn test_concurrent_runners_execute_once() {
    for _ in 0..100 {
        let executions = Arc::new(AtomicUsize::new(0));
        let counter = executions.clone();
        let task = Arc::new(FutureTask::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let start = Arc::new(Barrier::new(4));
        let runners: Vec<_> = (0..4)
            .map(|_| {
                let task = task.clone();
                let start = start.clone();
                thread::spawn(move || {
                    start.wait();
                    task.run();
                })
            })
            .collect();

        for runner in runners {
            runner.join().unwrap();
        }

        assert!(task.get().is_ok());
        assert_eq!(executions.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn test_concurrent_cancels_have_one_winner() {
    for _ in 0..100 {
        let task = Arc::new(FutureTask::new(|| ()));
        let start = Arc::new(Barrier::new(4));

        let cancellers: Vec<_> = (0..4)
            .map(|i| {
                let task = task.clone();
                let start = start.clone();
                thread::spawn(move || {
                    start.wait();
                    task.cancel(i % 2 == 0)
                })
            })
            .collect();

        let winners = cancellers
            .into_iter()
            .map(|canceller| canceller.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert!(task.is_cancelled());
    }
}
