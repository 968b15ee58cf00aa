//! Compensating transaction for multi-step checkout persistence.
//!
//! A [`Transaction`] is a stack of (operation, compensation) pairs. Steps run
//! in registration order; on the first failing step every compensation that
//! was registered for an earlier, completed step runs in reverse order.
//! Compensation failures are logged as warnings and collected on the
//! returned [`SagaFailure`], never raised in place of the original error.
//!
//! ```ignore
//! let outcome = Transaction::new("checkout")
//!     .step("persist_customer", save_customer, delete_customer)
//!     .step("persist_subscription", save_subscription, delete_subscription)
//!     .execute()
//!     .await;
//! ```

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;

/// Deferred async action run at most once by the transaction.
pub type Action<E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), E>> + Send>;

/// Boxes an async closure into an [`Action`].
pub fn action<E, F, Fut>(f: F) -> Action<E>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
{
    Box::new(move || Box::pin(f()))
}

struct Step<E> {
    name: &'static str,
    operation: Option<Action<E>>,
    compensation: Option<Action<E>>,
}

/// Failure report for a transaction that did not complete.
#[derive(Debug)]
pub struct SagaFailure<E> {
    /// Name of the step whose operation failed.
    pub failed_step: &'static str,
    /// The operation's error.
    pub error: E,
    /// Steps whose compensation ran successfully, in execution order.
    pub compensated: Vec<&'static str>,
    /// Steps whose compensation itself failed, with the rendered error.
    pub compensation_failures: Vec<(&'static str, String)>,
}

impl<E> SagaFailure<E> {
    /// True when every compensation that ran succeeded.
    pub fn fully_compensated(&self) -> bool {
        self.compensation_failures.is_empty()
    }
}

impl<E: fmt::Display> fmt::Display for SagaFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step '{}' failed: {}", self.failed_step, self.error)
    }
}

/// Ordered list of operations, each paired with an optional compensation.
pub struct Transaction<E> {
    name: &'static str,
    steps: Vec<Step<E>>,
}

impl<E: fmt::Display + Send + 'static> Transaction<E> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    /// Registers a forward operation and the action that undoes it.
    pub fn step(mut self, name: &'static str, operation: Action<E>, compensation: Action<E>) -> Self {
        self.steps.push(Step {
            name,
            operation: Some(operation),
            compensation: Some(compensation),
        });
        self
    }

    /// Registers a forward operation that has nothing to undo.
    pub fn step_without_compensation(mut self, name: &'static str, operation: Action<E>) -> Self {
        self.steps.push(Step {
            name,
            operation: Some(operation),
            compensation: None,
        });
        self
    }

    /// Records a side effect that already happened outside the transaction
    /// so that its compensation joins the unwind stack.
    pub fn completed(mut self, name: &'static str, compensation: Action<E>) -> Self {
        self.steps.push(Step {
            name,
            operation: None,
            compensation: Some(compensation),
        });
        self
    }

    /// Number of registered steps, including pre-completed ones.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs every step in order, unwinding on the first failure.
    pub async fn execute(self) -> Result<(), SagaFailure<E>> {
        let saga = self.name;
        let mut done: Vec<(&'static str, Option<Action<E>>)> = Vec::with_capacity(self.steps.len());

        for step in self.steps {
            let Some(operation) = step.operation else {
                done.push((step.name, step.compensation));
                continue;
            };

            match operation().await {
                Ok(()) => {
                    tracing::debug!(saga, step = step.name, "saga step completed");
                    done.push((step.name, step.compensation));
                }
                Err(error) => {
                    tracing::warn!(saga, step = step.name, error = %error, "saga step failed, compensating");
                    let mut failure = SagaFailure {
                        failed_step: step.name,
                        error,
                        compensated: Vec::new(),
                        compensation_failures: Vec::new(),
                    };
                    unwind(saga, done, &mut failure).await;
                    return Err(failure);
                }
            }
        }

        Ok(())
    }
}

async fn unwind<E: fmt::Display>(
    saga: &'static str,
    done: Vec<(&'static str, Option<Action<E>>)>,
    failure: &mut SagaFailure<E>,
) {
    for (name, compensation) in done.into_iter().rev() {
        let Some(compensation) = compensation else {
            continue;
        };
        match compensation().await {
            Ok(()) => failure.compensated.push(name),
            Err(e) => {
                tracing::warn!(
                    saga,
                    step = name,
                    error = %e,
                    "compensation failed, manual reconciliation required"
                );
                failure.compensation_failures.push((name, e.to_string()));
            }
        }
    }
}
