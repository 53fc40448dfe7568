//! Live `NewMemo` delivery with an explicit release handle.
//!
//! A [`MemoSubscription`] is a stream of decoded memos paired with a release
//! hook that tears down whatever feeds it (a spawned poller, a log filter).
//! The hook runs exactly once: on [`MemoSubscription::unsubscribe`] or on drop.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc;
use futures::stream::{FusedStream, Stream};

use crate::memo::Memo;

/// Producer half handed to the transport that feeds a subscription.
pub type MemoSender = mpsc::UnboundedSender<Memo>;

type Release = Box<dyn FnOnce() + Send>;

pub struct MemoSubscription {
    memos: mpsc::UnboundedReceiver<Memo>,
    release: Option<Release>,
}

impl MemoSubscription {
    pub fn new(memos: mpsc::UnboundedReceiver<Memo>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            memos,
            release: Some(Box::new(release)),
        }
    }

    /// A connected sender/subscription pair.
    pub fn channel(release: impl FnOnce() + Send + 'static) -> (MemoSender, Self) {
        let (tx, rx) = mpsc::unbounded();
        (tx, Self::new(rx, release))
    }

    /// Stop delivery and release the source now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(release) = self.release.take() {
            self.memos.close();
            release();
        }
    }
}

impl Stream for MemoSubscription {
    type Item = Memo;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Memo>> {
        Pin::new(&mut self.memos).poll_next(cx)
    }
}

impl FusedStream for MemoSubscription {
    fn is_terminated(&self) -> bool {
        self.memos.is_terminated()
    }
}

impl Drop for MemoSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for MemoSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoSubscription")
            .field("released", &self.release.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let hook = {
            let count = count.clone();
            move || {
                count.fetch_add(1, Ordering::SeqCst);
            }
        };
        (count, hook)
    }

    fn memo(name: &str) -> Memo {
        Memo::from_parts(Address::ZERO, U256::from(1), name.into(), String::new()).unwrap()
    }

    #[tokio::test]
    async fn test_delivers_in_order() {
        let (_, hook) = counter();
        let (tx, mut sub) = MemoSubscription::channel(hook);
        tx.unbounded_send(memo("a")).unwrap();
        tx.unbounded_send(memo("b")).unwrap();

        assert_eq!(sub.next().await.unwrap().name, "a");
        assert_eq!(sub.next().await.unwrap().name, "b");
    }

    #[test]
    fn test_drop_releases_once() {
        let (count, hook) = counter();
        let (tx, sub) = MemoSubscription::channel(hook);
        drop(sub);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(tx.is_closed());
    }

    #[test]
    fn test_unsubscribe_releases_once() {
        let (count, hook) = counter();
        let (tx, sub) = MemoSubscription::channel(hook);
        sub.unsubscribe();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(tx.unbounded_send(memo("late")).is_err());
    }

    #[tokio::test]
    async fn test_ends_when_source_goes_away() {
        let (count, hook) = counter();
        let (tx, mut sub) = MemoSubscription::channel(hook);
        drop(tx);
        assert!(sub.next().await.is_none());
        assert!(sub.is_terminated());
        // The source ending on its own is not a release.
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
