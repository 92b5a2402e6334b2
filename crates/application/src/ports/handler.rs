use crate::services::MessageWriter;
use async_trait::async_trait;
use std::future::Future;
use wiredns_domain::Query;

/// Application logic invoked once per inbound query.
///
/// The writer is handed over by value: the handler replies at most once, and
/// a writer dropped without flushing sends nothing.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn serve_dns(&self, writer: MessageWriter, query: Query);
}

/// Adapts an async closure into a [`Handler`].
pub struct HandlerFn<F> {
    func: F,
}

pub fn handler_fn<F, Fut>(func: F) -> HandlerFn<F>
where
    F: Fn(MessageWriter, Query) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    HandlerFn { func }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(MessageWriter, Query) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn serve_dns(&self, writer: MessageWriter, query: Query) {
        (self.func)(writer, query).await
    }
}
