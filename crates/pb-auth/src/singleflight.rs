//! Collapses concurrent calls sharing a key into one execution.
//!
//! The first caller for a key spawns the work on the tokio runtime; everyone
//! arriving while it is in flight awaits the same shared join handle and
//! receives a clone of its output. The spawned task removes its entry once it
//! finishes or panics, so a caller arriving afterwards starts a fresh
//! execution.
//!
//! A caller may drop its future at any time. The work runs to completion
//! regardless of who is still waiting, so its side effects land even when
//! every caller gave up, and no later caller ever inherits a half-run call.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::trace;

type Call<T> = Shared<BoxFuture<'static, T>>;
type Calls<T> = Arc<Mutex<HashMap<&'static str, Call<T>>>>;

/// Table of in-flight calls keyed by a static operation name
pub struct SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    calls: Calls<T>,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `work` for `key`, or join the execution already in flight
    ///
    /// `work` is only invoked when no call for `key` is in progress. Must be
    /// called from within a tokio runtime. A panic inside `work` is resumed in
    /// every caller.
    pub async fn run<F, Fut>(&self, key: &'static str, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let call = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);

            match calls.get(key) {
                Some(call) => {
                    trace!(key, "Joining in-flight call");
                    call.clone()
                }
                None => {
                    trace!(key, "Starting call");
                    let evict = Evict {
                        calls: Arc::clone(&self.calls),
                        key,
                    };
                    let work = work();
                    let task = tokio::spawn(async move {
                        let _evict = evict;
                        work.await
                    });
                    let call = async move {
                        match task.await {
                            Ok(output) => output,
                            Err(err) => match err.try_into_panic() {
                                Ok(payload) => panic::resume_unwind(payload),
                                Err(err) => panic::resume_unwind(Box::new(err.to_string())),
                            },
                        }
                    }
                    .boxed()
                    .shared();

                    calls.insert(key, call.clone());
                    call
                }
            }
        };

        call.await
    }

    /// Number of keys with a call in progress
    pub fn in_flight(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Removes the entry of a finished call, also when its work panicked
struct Evict<T>
where
    T: Clone + Send + Sync + 'static,
{
    calls: Calls<T>,
    key: &'static str,
}

impl<T> Drop for Evict<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(self.key);
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&'static str> = self
            .calls
            .lock()
            .map(|calls| calls.keys().copied().collect())
            .unwrap_or_default();

        f.debug_struct("SingleFlight").field("in_flight", &keys).finish()
    }
}
