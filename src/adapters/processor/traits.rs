//! Processor and result-handler abstractions
//!
//! A [`Processor`] turns one batch of records into an application-defined
//! output. Each session binds exactly one concrete processor type at
//! construction; the output then flows to the session's [`ResultHandler`].

use crate::domain::ids::Category;
use crate::domain::{Record, Result};
use async_trait::async_trait;

/// Pluggable batch processor
#[async_trait]
pub trait Processor: Send + Sync + 'static {
    /// Value produced for every successfully processed batch
    type Output: Send + 'static;

    /// Process the records fetched for one batch
    ///
    /// # Errors
    ///
    /// Any error is treated as a processing failure of the batch.
    async fn process(&self, records: Vec<Record>, category: &Category) -> Result<Self::Output>;

    /// Name used in logs and conflict errors
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Verdict of a result handler on a processed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Output delivered; the batch is done
    Accept,
    /// Output rejected; the batch is treated as failed and retried
    Retry,
}

/// Receives each processed batch's output
///
/// Delivery is at-least-once: after a crash between a successful delivery
/// and the descriptor write, the same batch is processed and delivered again.
#[async_trait]
pub trait ResultHandler<O: Send + 'static>: Send + Sync {
    /// Deliver `output`, returning whether the batch may be marked done
    async fn handle(&self, output: O) -> Delivery;
}

#[async_trait]
impl<O, F> ResultHandler<O> for F
where
    O: Send + 'static,
    F: Fn(O) -> Delivery + Send + Sync,
{
    async fn handle(&self, output: O) -> Delivery {
        (self)(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Count;

    #[async_trait]
    impl Processor for Count {
        type Output = usize;

        async fn process(&self, records: Vec<Record>, _category: &Category) -> Result<usize> {
            Ok(records.len())
        }
    }

    #[tokio::test]
    async fn test_closure_result_handler() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_handler = seen.clone();
        let handler = move |count: usize| {
            seen_in_handler.fetch_add(count, Ordering::SeqCst);
            if count > 0 {
                Delivery::Accept
            } else {
                Delivery::Retry
            }
        };

        assert_eq!(handler.handle(3).await, Delivery::Accept);
        assert_eq!(handler.handle(0).await, Delivery::Retry);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_default_processor_name() {
        let processor = Count;
        assert!(processor.name().ends_with("Count"));
        let category = Category::new("a").unwrap();
        assert_eq!(processor.process(Vec::new(), &category).await.unwrap(), 0);
    }
}
