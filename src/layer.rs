//! Tower middleware surface for credential failover
//!
//! [`FailoverLayer`] wraps a service whose request carries the credential to
//! use (`S: Service<(Credential, Req)>`) and re-invokes it across the pool
//! under the same rotate/retry policy as
//! [`invoke_with_failover`](crate::failover::invoke_with_failover), which it
//! delegates to. Requests must be `Clone` so each attempt gets its own copy.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;
use tower::{BoxError, Layer, Service, ServiceExt};

use crate::config::FailoverConfig;
use crate::credentials::{Credential, CredentialPool};
use crate::failover::invoke_with_failover;

/// Layer that adds credential failover to a credential-parameterized service.
#[derive(Debug, Clone)]
pub struct FailoverLayer {
    pool: CredentialPool,
    config: FailoverConfig,
}

impl FailoverLayer {
    pub fn new(pool: CredentialPool, config: FailoverConfig) -> Self {
        Self { pool, config }
    }
}

impl<S> Layer<S> for FailoverLayer {
    type Service = FailoverService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FailoverService {
            inner: Arc::new(Mutex::new(inner)),
            pool: self.pool.clone(),
            config: self.config.clone(),
        }
    }
}

/// Service produced by [`FailoverLayer`].
pub struct FailoverService<S> {
    inner: Arc<Mutex<S>>,
    pool: CredentialPool,
    config: FailoverConfig,
}

impl<S> Clone for FailoverService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            pool: self.pool.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S, Req> Service<Req> for FailoverService<S>
where
    // The per-attempt closure borrows the request across awaits while
    // cloning it, so Req must be Sync as well as Send.
    Req: Clone + Send + Sync + 'static,
    S: Service<(Credential, Req), Error = BoxError> + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        // Readiness is checked per-attempt inside call, behind the mutex.
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let inner = self.inner.clone();
        let pool = self.pool.clone();
        let config = self.config.clone();
        Box::pin(async move {
            invoke_with_failover(&pool, &config, |credential| {
                let inner = inner.clone();
                let req = req.clone();
                async move {
                    let mut guard = inner.lock().await;
                    ServiceExt::ready(&mut *guard)
                        .await?
                        .call((credential, req))
                        .await
                }
            })
            .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::service_fn;

    fn fast_config() -> FailoverConfig {
        FailoverConfig {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_layer_passes_credential_and_request() {
        let pool = CredentialPool::parse("k1").unwrap();
        let svc = service_fn(|(credential, req): (Credential, String)| async move {
            Ok::<_, BoxError>(format!("{}:{}", credential.as_str(), req))
        });

        let mut svc = FailoverLayer::new(pool, fast_config()).layer(svc);
        let out = ServiceExt::ready(&mut svc)
            .await
            .unwrap()
            .call("hello".to_string())
            .await
            .unwrap();
        assert_eq!(out, "k1:hello");
    }

    #[tokio::test]
    async fn test_layer_rotates_on_auth_failure() {
        let pool = CredentialPool::parse("bad,good").unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let svc = service_fn(move |(credential, req): (Credential, u32)| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if credential.as_str() == "bad" {
                    Err::<u32, BoxError>("401 unauthorized".into())
                } else {
                    Ok(req * 2)
                }
            }
        });

        let mut svc = FailoverLayer::new(pool, fast_config()).layer(svc);
        let out = ServiceExt::ready(&mut svc)
            .await
            .unwrap()
            .call(21)
            .await
            .unwrap();
        assert_eq!(out, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_layer_retries_overload_then_exhausts() {
        let pool = CredentialPool::parse("k1,k2").unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let svc = service_fn(move |(_credential, _req): (Credential, ())| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), BoxError>("503 overloaded".into())
            }
        });

        let mut svc = FailoverLayer::new(pool, fast_config()).layer(svc);
        let err = ServiceExt::ready(&mut svc)
            .await
            .unwrap()
            .call(())
            .await
            .unwrap_err();
        // 2 credentials x 2 attempts
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(err.to_string(), "503 overloaded");
    }

    #[tokio::test]
    async fn test_service_future_is_send() {
        // tokio::spawn requires the response future to be Send; this guards
        // the trait bounds on FailoverService.
        let pool = CredentialPool::parse("k1").unwrap();
        let svc = service_fn(|(credential, req): (Credential, String)| async move {
            Ok::<_, BoxError>(format!("{}:{}", credential.as_str(), req))
        });

        let mut svc = FailoverLayer::new(pool, fast_config()).layer(svc);
        let handle = tokio::spawn(async move {
            ServiceExt::ready(&mut svc)
                .await
                .unwrap()
                .call("spawned".to_string())
                .await
        });
        assert_eq!(handle.await.unwrap().unwrap(), "k1:spawned");
    }

    #[tokio::test]
    async fn test_layer_fatal_short_circuits() {
        let pool = CredentialPool::parse("k1,k2,k3").unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let svc = service_fn(move |(_credential, _req): (Credential, ())| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), BoxError>("schema validation failed".into())
            }
        });

        let mut svc = FailoverLayer::new(pool, fast_config()).layer(svc);
        let err = ServiceExt::ready(&mut svc)
            .await
            .unwrap()
            .call(())
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.to_string(), "schema validation failed");
    }
}
