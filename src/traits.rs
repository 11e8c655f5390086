//! The receive seam shared by every readable endpoint.
//!
//! Conduits and oneshots both implement [`Receive`], so the multiplexers and
//! worker pools can read from either, or from a boxed mix of both.

use async_trait::async_trait;
use std::sync::Arc;

/// Something values can be received from.
///
/// `recv` resolves to `None` once the endpoint is closed for good. Endpoints that
/// never close (such as [`Oneshot`](crate::Oneshot)) simply never return `None`.
/// `recv` must be cancel safe: dropping the future before it resolves loses no value.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use stageweld::traits::Receive;
///
/// struct Constant(u32);
///
/// #[async_trait]
/// impl Receive for Constant {
///     type Item = u32;
///
///     async fn recv(&self) -> Option<Self::Item> {
///         Some(self.0)
///     }
/// }
/// ```
#[async_trait]
pub trait Receive: Send + Sync {
    /// The type of values received
    type Item: Send + 'static;

    /// Receive the next value, or `None` once the endpoint is closed.
    ///
    /// This is a raw wait; inside a pipeline use [`read`](crate::read), which also
    /// races cancellation.
    async fn recv(&self) -> Option<Self::Item>;
}

#[async_trait]
impl<R: Receive + ?Sized> Receive for Box<R> {
    type Item = R::Item;

    async fn recv(&self) -> Option<Self::Item> {
        (**self).recv().await
    }
}

#[async_trait]
impl<R: Receive + ?Sized> Receive for Arc<R> {
    type Item = R::Item;

    async fn recv(&self) -> Option<Self::Item> {
        (**self).recv().await
    }
}
