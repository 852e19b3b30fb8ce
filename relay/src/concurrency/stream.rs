use core::pin::Pin;
use core::task::{Context, Poll};
use futures::{Stream, ready};
use pin_project_lite::pin_project;

pin_project! {
    /// A stream adapter that ends right after the first `Err` item.
    ///
    /// Row streams report a failed query or an undecodable row as an error item.
    /// Anything the inner stream would yield after that is dropped, so a consumer
    /// sees `Ok*` optionally followed by exactly one `Err`.
    #[must_use = "streams do nothing unless polled"]
    #[derive(Debug)]
    pub struct StopOnErrorStream<S> {
        #[pin]
        stream: S,
        finished: bool,
    }
}

impl<S> StopOnErrorStream<S> {
    pub fn wrap(stream: S) -> Self {
        Self {
            stream,
            finished: false,
        }
    }
}

impl<S, T, E> Stream for StopOnErrorStream<S>
where
    S: Stream<Item = Result<T, E>>,
{
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.finished {
            return Poll::Ready(None);
        }

        match ready!(this.stream.poll_next(cx)) {
            Some(Ok(item)) => Poll::Ready(Some(Ok(item))),
            Some(Err(err)) => {
                *this.finished = true;
                Poll::Ready(Some(Err(err)))
            }
            None => {
                *this.finished = true;
                Poll::Ready(None)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (0, self.stream.size_hint().1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{StreamExt, stream};

    #[tokio::test]
    async fn items_after_the_first_error_are_dropped() {
        let inner = stream::iter(vec![Ok(1), Ok(2), Err("decode"), Ok(3), Err("late")]);

        let items: Vec<Result<i32, &str>> = StopOnErrorStream::wrap(inner).collect().await;

        assert_eq!(items, vec![Ok(1), Ok(2), Err("decode")]);
    }

    #[tokio::test]
    async fn clean_streams_pass_through() {
        let inner = stream::iter(vec![Ok::<_, &str>(1), Ok(2)]);

        let items: Vec<_> = StopOnErrorStream::wrap(inner).collect().await;

        assert_eq!(items, vec![Ok(1), Ok(2)]);
    }
}
