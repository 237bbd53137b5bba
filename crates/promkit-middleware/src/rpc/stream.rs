use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;

use super::ServerReporter;

/// Inbound message stream that counts every successfully received item
/// into `grpc_server_msg_received_total`.
pub struct MonitoredStream<S> {
    inner: S,
    reporter: ServerReporter,
}

impl<S> MonitoredStream<S> {
    pub fn new(inner: S, reporter: ServerReporter) -> Self {
        Self { inner, reporter }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, T, E> Stream for MonitoredStream<S>
where
    S: Stream<Item = Result<T, E>> + Unpin,
{
    type Item = Result<T, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = Pin::new(&mut self.inner).poll_next(cx);
        if let Poll::Ready(Some(Ok(_))) = &polled {
            self.reporter.received_message();
        }
        polled
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures_util::{stream, StreamExt};

    use crate::rpc::{Code, RpcType, ServerMetrics};

    #[tokio::test]
    async fn counts_only_ok_items_and_reports_final_code() {
        let m = Arc::new(ServerMetrics::builder().build().expect("build"));

        let res: Result<usize, Code> = m
            .streaming(RpcType::BidiStream, "/chat.Room/Talk", |reporter| async move {
                let inbound = stream::iter(vec![Ok::<_, Code>("a"), Err(Code::DataLoss), Ok("b")]);
                let mut monitored = super::MonitoredStream::new(inbound, reporter.clone());
                let mut n = 0;
                while let Some(item) = monitored.next().await {
                    if item.is_ok() {
                        n += 1;
                        reporter.sent_message();
                    }
                }
                Ok(n)
            })
            .await;

        assert_eq!(res, Ok(2));
        assert_eq!(m.received_total(RpcType::BidiStream, "chat.Room", "Talk"), 2);
        assert_eq!(m.sent_total(RpcType::BidiStream, "chat.Room", "Talk"), 2);
        assert_eq!(m.handled_total(RpcType::BidiStream, "chat.Room", "Talk", Code::Ok), 1);
        assert_eq!(m.started_total(RpcType::BidiStream, "chat.Room", "Talk"), 1);
    }

    #[tokio::test]
    async fn streaming_error_code_is_reported() {
        let m = Arc::new(ServerMetrics::builder().build().expect("build"));
        let res: Result<(), Code> = m
            .streaming(RpcType::ServerStream, "/feed.Feed/Watch", |_r| async {
                Err(Code::DeadlineExceeded)
            })
            .await;
        assert_eq!(res, Err(Code::DeadlineExceeded));
        assert_eq!(
            m.handled_total(RpcType::ServerStream, "feed.Feed", "Watch", Code::DeadlineExceeded),
            1
        );
    }
}
