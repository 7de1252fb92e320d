use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

/// The future a task body resolves to. Must be `Send` and `'static`.
pub type TaskFuture<R> = Pin<Box<dyn Future<Output = R> + Send + 'static>>;

/// A deferred, cancellation-aware unit of work.
///
/// The pool invokes the closure with its long-lived cancellation token
/// only after admission; a task rejected at admission is never invoked.
pub type PoolTask<R> = Box<dyn FnOnce(CancellationToken) -> TaskFuture<R> + Send + 'static>;
