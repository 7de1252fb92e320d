use rowflood::{PoolError, PoolTask, TaskFuture, WorkerPool};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{sleep, timeout};

// Helper to create a task closure for the pool.
fn create_task(
  task_id_for_log: usize,
  duration_ms: u64,
  output_value: String,
  should_panic: bool,
  completion_flag: Option<Arc<AtomicBool>>, // External flag to verify completion
) -> PoolTask<String> {
  Box::new(move |_ctx| -> TaskFuture<String> {
    Box::pin(async move {
      sleep(Duration::from_millis(duration_ms)).await;

      if should_panic {
        tracing::info!("Task {} panicking as requested.", task_id_for_log);
        panic!("Task {} intentionally panicked!", task_id_for_log);
      }

      if let Some(flag) = completion_flag {
        flag.store(true, Ordering::SeqCst);
      }
      tracing::info!("Task {} completed successfully.", task_id_for_log);
      output_value
    })
  })
}

// Helper to initialize tracing for tests (Once ensures a single init).
fn setup_tracing_for_test() {
  use std::sync::Once;
  use tracing_subscriber::{fmt, EnvFilter};
  static TRACING_INIT: Once = Once::new();

  TRACING_INIT.call_once(|| {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,rowflood=trace"));

    fmt::Subscriber::builder()
      .with_env_filter(filter)
      .with_test_writer()
      .try_init()
      .ok();
  });
}

#[tokio::test]
async fn test_submit_and_await_basic_task() {
  setup_tracing_for_test();
  let pool = WorkerPool::<String>::new(2, "test_pool_basic_submit").unwrap();

  let handle = pool.submit(create_task(1, 50, "task1_done".to_string(), false, None)).await;
  let result = handle.outcome().await;
  assert_eq!(result, Ok("task1_done".to_string()));

  pool.shutdown();
}

#[tokio::test]
async fn test_invalid_capacity_is_rejected_before_any_work() {
  setup_tracing_for_test();
  match WorkerPool::<String>::new(0, "test_pool_zero_capacity") {
    Err(PoolError::InvalidCapacity(0)) => { /* Expected */ }
    other => panic!("Expected InvalidCapacity, got {:?}", other.map(|_| "pool")),
  }
}

#[tokio::test]
async fn test_task_panics_are_handled() {
  setup_tracing_for_test();
  let pool = WorkerPool::<String>::new(1, "test_pool_panic_handling").unwrap();

  let handle_panic = pool.submit(create_task(1, 50, "wont_complete".to_string(), true, None)).await;
  match handle_panic.outcome().await {
    Err(PoolError::TaskPanicked) => { /* Expected */ }
    other => panic!("Expected TaskPanicked error, got {:?}", other),
  }

  // Ensure the pool still works for other tasks: the panicked task's
  // token must have returned.
  let handle_normal = pool.submit(create_task(2, 50, "task2_done".to_string(), false, None)).await;
  assert_eq!(handle_normal.outcome().await, Ok("task2_done".to_string()));

  pool.shutdown();
}

// Capacity 2, 5 tasks sleeping 50ms each. At no point may more than 2
// bodies run at once, and the wall time reflects ceil(5/2) admission
// waves.
#[tokio::test]
async fn test_bounded_concurrency_with_more_tasks_than_capacity() {
  setup_tracing_for_test();
  let pool = WorkerPool::<String>::new(2, "test_pool_bounded_concurrency").unwrap();

  let currently_running = Arc::new(AtomicUsize::new(0));
  let max_observed = Arc::new(AtomicUsize::new(0));
  let started_at = Instant::now();

  let mut handles = Vec::new();
  for i in 0..5 {
    let running = currently_running.clone();
    let max_seen = max_observed.clone();
    let task: PoolTask<String> = Box::new(move |_ctx| -> TaskFuture<String> {
      Box::pin(async move {
        let now_running = running.fetch_add(1, Ordering::SeqCst) + 1;
        max_seen.fetch_max(now_running, Ordering::SeqCst);
        sleep(Duration::from_millis(50)).await;
        running.fetch_sub(1, Ordering::SeqCst);
        format!("task_{}_done", i)
      })
    });
    handles.push(pool.submit(task).await);
  }

  for handle in handles {
    handle.outcome().await.unwrap();
  }

  let elapsed = started_at.elapsed();
  assert!(
    max_observed.load(Ordering::SeqCst) <= 2,
    "Observed {} concurrent task bodies, capacity is 2.",
    max_observed.load(Ordering::SeqCst)
  );
  assert!(
    elapsed >= Duration::from_millis(140),
    "5 tasks of 50ms under capacity 2 should take about 3 waves, took {:?}.",
    elapsed
  );
  // A pool that serialized all five tasks would need 250ms+.
  assert!(
    elapsed < Duration::from_millis(225),
    "5 tasks of 50ms under capacity 2 must run in parallel waves, took {:?}.",
    elapsed
  );

  pool.shutdown();
}

// Every submitted task yields exactly one terminal outcome; the handle
// is consumed by the read, so a second read cannot exist.
#[tokio::test]
async fn test_every_task_yields_exactly_one_outcome() {
  setup_tracing_for_test();
  let pool = WorkerPool::<String>::new(3, "test_pool_exactly_once").unwrap();

  let mut handles = Vec::new();
  for i in 0..10 {
    handles.push(pool.submit(create_task(i, 10, format!("task_{}_done", i), false, None)).await);
  }

  for (i, handle) in handles.into_iter().enumerate() {
    assert_eq!(handle.outcome().await, Ok(format!("task_{}_done", i)));
  }

  pool.shutdown();
}

// Shutdown must unblock every submit stuck waiting for admission,
// without any token being released, within a bounded time.
#[tokio::test]
async fn test_shutdown_unblocks_admission_waiters() {
  setup_tracing_for_test();
  let pool = WorkerPool::<String>::new(1, "test_pool_unblock_waiters").unwrap();

  // Occupy the only token with a long task.
  let blocker = pool.submit(create_task(0, 500, "blocker".to_string(), false, None)).await;

  // Park several submitters behind the occupied gate.
  let mut waiters = Vec::new();
  for i in 1..=3 {
    let pool_for_waiter = pool.clone();
    let never_runs = Arc::new(AtomicBool::new(false));
    let flag = never_runs.clone();
    waiters.push((
      never_runs,
      tokio::spawn(async move {
        let handle = pool_for_waiter
          .submit(create_task(i, 10, "never".to_string(), false, Some(flag)))
          .await;
        handle.outcome().await
      }),
    ));
  }

  sleep(Duration::from_millis(50)).await; // Let the waiters block.
  pool.shutdown();

  for (never_runs, waiter) in waiters {
    let outcome = timeout(Duration::from_millis(500), waiter)
      .await
      .expect("Waiter did not unblock after shutdown")
      .unwrap();
    match outcome {
      Err(PoolError::PoolShuttingDown) => { /* Expected */ }
      other => panic!("Expected PoolShuttingDown for blocked waiter, got {:?}", other),
    }
    assert!(
      !never_runs.load(Ordering::SeqCst),
      "A task refused at admission must never have its body invoked."
    );
  }

  // The in-flight task runs to completion even after shutdown.
  assert_eq!(
    timeout(Duration::from_secs(2), blocker.outcome()).await.unwrap(),
    Ok("blocker".to_string())
  );
}

#[tokio::test]
async fn test_submit_after_shutdown_resolves_without_running_body() {
  setup_tracing_for_test();
  let pool = WorkerPool::<String>::new(2, "test_pool_submit_after_shutdown").unwrap();
  pool.shutdown();

  let body_ran = Arc::new(AtomicBool::new(false));
  let handle = pool
    .submit(create_task(1, 10, "late".to_string(), false, Some(body_ran.clone())))
    .await;

  match handle.outcome().await {
    Err(PoolError::PoolShuttingDown) => { /* Expected */ }
    other => panic!("Expected PoolShuttingDown, got {:?}", other),
  }
  assert!(!body_ran.load(Ordering::SeqCst));
}

// Concurrent double shutdown must not panic or error, and the pool
// stays closed.
#[tokio::test]
async fn test_concurrent_double_shutdown_is_idempotent() {
  setup_tracing_for_test();
  let pool = WorkerPool::<String>::new(2, "test_pool_double_shutdown").unwrap();

  let pool_a = pool.clone();
  let pool_b = pool.clone();
  let (a, b) = tokio::join!(
    tokio::spawn(async move { pool_a.shutdown() }),
    tokio::spawn(async move { pool_b.shutdown() }),
  );
  a.unwrap();
  b.unwrap();

  assert!(pool.is_shutting_down());

  let handle = pool.submit(create_task(1, 10, "after".to_string(), false, None)).await;
  assert_eq!(handle.outcome().await, Err(PoolError::PoolShuttingDown));
}

// Tokens released by finished tasks are reusable: run far more tasks
// than capacity to exercise the acquire/release cycle.
#[tokio::test]
async fn test_tokens_are_recycled_across_many_tasks() {
  setup_tracing_for_test();
  let pool = WorkerPool::<String>::new(4, "test_pool_token_recycling").unwrap();

  let mut handles = Vec::new();
  for i in 0..40 {
    handles.push(pool.submit(create_task(i, 5, format!("task_{}_done", i), false, None)).await);
  }
  for handle in handles {
    assert!(handle.outcome().await.is_ok());
  }

  // All tasks done, full capacity should be back.
  sleep(Duration::from_millis(50)).await;
  assert_eq!(pool.available_capacity(), 4);
  assert_eq!(pool.active_task_count(), 0);

  pool.shutdown();
}
