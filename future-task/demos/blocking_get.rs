use future_task::task::spawn;
use future_task::{FutureTask, TaskError, interrupt};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_thread_names(true)
        .init();

    let slow = Arc::new(
        FutureTask::builder()
            .name("slow-sum")
            .on_done(|task: &FutureTask<u32>| println!("hook: {:?}", task))
            .build(|| {
                thread::sleep(Duration::from_millis(100));
                (1..=10).sum::<u32>()
            }),
    );

    let worker = spawn(slow.clone()).expect("failed to spawn worker");

    match slow.get_timeout(Duration::from_millis(10)) {
        Err(TaskError::Timeout) => println!("still running after 10ms"),
        other => println!("unexpected: {:?}", other),
    }

    println!("sum = {}", slow.get().expect("computation failed"));
    worker.join().expect("worker panicked");

    let endless = Arc::new(
        FutureTask::builder()
            .name("endless")
            .build_fallible(|| interrupt::sleep(Duration::from_secs(3600)).map(|()| 0u32)),
    );

    let worker = spawn(endless.clone()).expect("failed to spawn worker");
    thread::sleep(Duration::from_millis(20));

    println!("cancelled: {}", endless.cancel(true));
    println!("result: {:?}", endless.get());
    worker.join().expect("worker panicked");
}
