use crate::breaker::Breaker;
use crate::error::BreakerServiceError;
use crate::group::BreakerGroup;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

pub(crate) type FallbackFn<Req, Res, Err> =
    dyn Fn(Req) -> BoxFuture<'static, Result<Res, Err>> + Send + Sync;
pub(crate) type SharedFallback<Req, Res, Err> = Arc<FallbackFn<Req, Res, Err>>;

/// A Tower layer that guards a service with a [`Breaker`].
///
/// Unlike [`BreakerGroup::go`], the service reports every outcome back to the
/// breaker: `Ok` marks a success and `Err` marks a failure.
///
/// ```rust
/// use tower::{ServiceBuilder, service_fn};
/// use tollgate_breaker::{BreakerConfig, BreakerGroup, BreakerLayer};
///
/// let group = BreakerGroup::new(BreakerConfig::default()).unwrap();
///
/// let service = ServiceBuilder::new()
///     .layer(BreakerLayer::from_group(&group, "profile-service"))
///     .service(service_fn(|req: String| async move { Ok::<_, std::io::Error>(req) }));
/// ```
#[derive(Clone)]
pub struct BreakerLayer {
    breaker: Arc<Breaker>,
}

impl BreakerLayer {
    /// Creates a layer around `breaker`.
    pub fn new(breaker: Arc<Breaker>) -> Self {
        Self { breaker }
    }

    /// Creates a layer around the group's breaker for `name`.
    pub fn from_group(group: &BreakerGroup, name: &str) -> Self {
        Self::new(group.get(name))
    }

    /// The breaker this layer applies.
    pub fn breaker(&self) -> &Arc<Breaker> {
        &self.breaker
    }
}

impl<S> Layer<S> for BreakerLayer {
    type Service = BreakerService<S>;

    fn layer(&self, service: S) -> Self::Service {
        BreakerService::new(service, Arc::clone(&self.breaker))
    }
}

/// The service produced by [`BreakerLayer`].
pub struct BreakerService<S> {
    inner: S,
    breaker: Arc<Breaker>,
}

impl<S> BreakerService<S> {
    /// Wraps `inner` with `breaker`.
    pub fn new(inner: S, breaker: Arc<Breaker>) -> Self {
        Self { inner, breaker }
    }

    /// The breaker guarding this service.
    pub fn breaker(&self) -> &Arc<Breaker> {
        &self.breaker
    }

    /// Serves rejected calls from `fallback` instead of failing them.
    ///
    /// The fallback's outcome is not reported to the breaker.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use futures::future::BoxFuture;
    /// use tower::service_fn;
    /// use tollgate_breaker::{Breaker, BreakerConfig, BreakerService};
    ///
    /// let breaker = Arc::new(Breaker::new("search", &BreakerConfig::default()).unwrap());
    /// let svc = service_fn(|q: String| async move { Ok::<String, String>(q) });
    ///
    /// let service = BreakerService::new(svc, breaker).with_fallback(|_q: String| {
    ///     Box::pin(async { Ok::<String, String>("cached results".to_string()) })
    ///         as BoxFuture<'static, Result<String, String>>
    /// });
    /// # let _ = service;
    /// ```
    pub fn with_fallback<Req, Res, Err, F>(
        self,
        fallback: F,
    ) -> BreakerServiceWithFallback<S, Req, Res, Err>
    where
        F: Fn(Req) -> BoxFuture<'static, Result<Res, Err>> + Send + Sync + 'static,
    {
        BreakerServiceWithFallback {
            inner: self.inner,
            breaker: self.breaker,
            fallback: Arc::new(fallback),
        }
    }
}

impl<S> Clone for BreakerService<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            breaker: Arc::clone(&self.breaker),
        }
    }
}

impl<S, Req> Service<Req> for BreakerService<S>
where
    S: Service<Req>,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = S::Response;
    type Error = BreakerServiceError<S::Error>;
    type Future = BoxFuture<'static, Result<S::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(BreakerServiceError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        if let Err(err) = self.breaker.allow() {
            return Box::pin(futures::future::ready(Err(BreakerServiceError::Rejected(err))));
        }

        let breaker = Arc::clone(&self.breaker);
        let fut = self.inner.call(req);
        Box::pin(async move {
            let result = fut.await;
            match &result {
                Ok(_) => breaker.mark_success(),
                Err(_) => breaker.mark_failed(),
            }
            result.map_err(BreakerServiceError::Inner)
        })
    }
}

/// A [`BreakerService`] with a fallback for rejected calls.
pub struct BreakerServiceWithFallback<S, Req, Res, Err> {
    inner: S,
    breaker: Arc<Breaker>,
    fallback: SharedFallback<Req, Res, Err>,
}

impl<S, Req, Res, Err> BreakerServiceWithFallback<S, Req, Res, Err> {
    /// The breaker guarding this service.
    pub fn breaker(&self) -> &Arc<Breaker> {
        &self.breaker
    }
}

impl<S, Req, Res, Err> Clone for BreakerServiceWithFallback<S, Req, Res, Err>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            breaker: Arc::clone(&self.breaker),
            fallback: Arc::clone(&self.fallback),
        }
    }
}

impl<S, Req, Res, Err> Service<Req> for BreakerServiceWithFallback<S, Req, Res, Err>
where
    S: Service<Req, Response = Res, Error = Err>,
    S::Future: Send + 'static,
    Res: Send + 'static,
    Err: Send + 'static,
{
    type Response = Res;
    type Error = BreakerServiceError<Err>;
    type Future = BoxFuture<'static, Result<Res, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(BreakerServiceError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        if self.breaker.allow().is_err() {
            #[cfg(feature = "tracing")]
            tracing::debug!(breaker = self.breaker.name(), "calling fallback handler");

            let fut = (self.fallback)(req);
            return Box::pin(async move { fut.await.map_err(BreakerServiceError::Inner) });
        }

        let breaker = Arc::clone(&self.breaker);
        let fut = self.inner.call(req);
        Box::pin(async move {
            let result = fut.await;
            match &result {
                Ok(_) => breaker.mark_success(),
                Err(_) => breaker.mark_failed(),
            }
            result.map_err(BreakerServiceError::Inner)
        })
    }
}
