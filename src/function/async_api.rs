//! Async API
//!
//! Every [`Functions`] operation as a future. The blocking exchange runs on
//! tokio's blocking pool; the returned [`FunctionFuture`] resolves exactly
//! once with the operation's result.
//!
//! Dropping a future does not cancel the request already sent to the store.
//! The only way to stop server-side execution is [`AsyncFunctions::kill`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::{FunctionError, Result};

use super::{
    FunctionLibrary, FunctionResult, FunctionStats, Functions, InvocationRequest, KillOutcome,
    RestorePolicy,
};

/// Pending result of an async operation
#[must_use = "futures do nothing unless awaited"]
pub struct FunctionFuture<T> {
    handle: JoinHandle<Result<T>>,
}

impl<T> Future for FunctionFuture<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.handle).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) => Poll::Ready(Err(FunctionError::TaskFailed(e.to_string()))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Future-returning wrapper around [`Functions`]
#[derive(Clone)]
pub struct AsyncFunctions {
    inner: Functions,
    runtime: Handle,
}

impl AsyncFunctions {
    /// Wrap `functions`, running work on the current tokio runtime
    ///
    /// Fails with `Config` when called outside a runtime.
    pub fn new(functions: Functions) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| FunctionError::Config(format!("No tokio runtime: {}", e)))?;
        Ok(Self::with_handle(functions, runtime))
    }

    /// Wrap `functions`, running work on the given runtime
    pub fn with_handle(functions: Functions, runtime: Handle) -> Self {
        Self {
            inner: functions,
            runtime,
        }
    }

    /// The blocking client underneath
    pub fn blocking(&self) -> &Functions {
        &self.inner
    }

    fn spawn<T, F>(&self, op: F) -> FunctionFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(&Functions) -> Result<T> + Send + 'static,
    {
        let functions = self.inner.clone();
        FunctionFuture {
            handle: self.runtime.spawn_blocking(move || op(&functions)),
        }
    }

    // =========================================================================
    // Library Management
    // =========================================================================

    pub fn load(&self, library: impl Into<String>, code: impl Into<String>) -> FunctionFuture<()> {
        let (library, code) = (library.into(), code.into());
        self.spawn(move |f| f.load(&library, &code))
    }

    pub fn load_and_replace(
        &self,
        library: impl Into<String>,
        code: impl Into<String>,
    ) -> FunctionFuture<()> {
        let (library, code) = (library.into(), code.into());
        self.spawn(move |f| f.load_and_replace(&library, &code))
    }

    pub fn delete(&self, library: impl Into<String>) -> FunctionFuture<()> {
        let library = library.into();
        self.spawn(move |f| f.delete(&library))
    }

    pub fn flush(&self) -> FunctionFuture<()> {
        self.spawn(|f| f.flush())
    }

    pub fn list(&self) -> FunctionFuture<Vec<FunctionLibrary>> {
        self.spawn(|f| f.list())
    }

    pub fn list_matching(&self, pattern: impl Into<String>) -> FunctionFuture<Vec<FunctionLibrary>> {
        let pattern = pattern.into();
        self.spawn(move |f| f.list_matching(&pattern))
    }

    pub fn dump(&self) -> FunctionFuture<Bytes> {
        self.spawn(|f| f.dump())
    }

    pub fn restore(&self, payload: impl Into<Bytes>) -> FunctionFuture<()> {
        self.restore_with(payload, RestorePolicy::Append)
    }

    pub fn restore_and_replace(&self, payload: impl Into<Bytes>) -> FunctionFuture<()> {
        self.restore_with(payload, RestorePolicy::Replace)
    }

    pub fn restore_after_flush(&self, payload: impl Into<Bytes>) -> FunctionFuture<()> {
        self.restore_with(payload, RestorePolicy::Flush)
    }

    pub fn restore_with(
        &self,
        payload: impl Into<Bytes>,
        policy: RestorePolicy,
    ) -> FunctionFuture<()> {
        let payload = payload.into();
        self.spawn(move |f| f.restore_with(&payload, policy))
    }

    pub fn stats(&self) -> FunctionFuture<FunctionStats> {
        self.spawn(|f| f.stats())
    }

    pub fn kill(&self) -> FunctionFuture<KillOutcome> {
        self.spawn(|f| f.kill())
    }

    // =========================================================================
    // Function Calls
    // =========================================================================

    /// Async form of [`Functions::invoke`]
    pub fn call(&self, request: InvocationRequest) -> FunctionFuture<FunctionResult> {
        self.spawn(move |f| f.invoke(&request))
    }
}
