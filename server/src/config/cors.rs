use axum::http::{header, HeaderValue, Method, Request, Response, StatusCode};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};

const ALLOWED_HEADERS: &str = "Content-Type";
const ALLOWED_METHODS: &str = "GET, POST, PATCH, DELETE, OPTIONS";

/// Stamps a fixed cross-origin policy on every response and answers
/// `OPTIONS` itself, without calling the wrapped service.
#[derive(Clone)]
pub struct CorsHeadersLayer {
    allowed_origin: HeaderValue,
}

impl CorsHeadersLayer {
    pub fn new(allowed_origin: HeaderValue) -> Self {
        Self { allowed_origin }
    }
}

impl<S> Layer<S> for CorsHeadersLayer {
    type Service = CorsHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorsHeadersService {
            inner,
            allowed_origin: self.allowed_origin.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CorsHeadersService<S> {
    inner: S,
    allowed_origin: HeaderValue,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorsHeadersService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Default,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = CorsHeadersFuture<S::Future, ResBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        if request.method() == Method::OPTIONS {
            let mut response = Response::new(ResBody::default());
            *response.status_mut() = StatusCode::OK;
            apply_cors_headers(&mut response, &self.allowed_origin);
            return CorsHeadersFuture::Preflight {
                response: Some(response),
            };
        }

        CorsHeadersFuture::Inner {
            future: self.inner.call(request),
            allowed_origin: self.allowed_origin.clone(),
        }
    }
}

#[pin_project::pin_project(project = CorsHeadersFutureProj)]
pub enum CorsHeadersFuture<F, B> {
    Preflight {
        response: Option<Response<B>>,
    },
    Inner {
        #[pin]
        future: F,
        allowed_origin: HeaderValue,
    },
}

impl<F, B, E> Future for CorsHeadersFuture<F, B>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = Result<Response<B>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            CorsHeadersFutureProj::Preflight { response } => Poll::Ready(Ok(response
                .take()
                .expect("preflight future polled after completion"))),
            CorsHeadersFutureProj::Inner {
                future,
                allowed_origin,
            } => match future.poll(cx) {
                Poll::Ready(Ok(mut response)) => {
                    apply_cors_headers(&mut response, allowed_origin);
                    Poll::Ready(Ok(response))
                }
                Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

fn apply_cors_headers<B>(response: &mut Response<B>, allowed_origin: &HeaderValue) {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allowed_origin.clone());
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
}

pub fn create_cors_layer(allowed_origin: HeaderValue) -> CorsHeadersLayer {
    tracing::info!(origin = ?allowed_origin, "CORS: allowing single origin");
    CorsHeadersLayer::new(allowed_origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::{service_fn, ServiceExt};

    const ORIGIN: &str = "http://localhost:3000";

    fn counting_service(
        calls: Arc<AtomicUsize>,
    ) -> impl Service<Request<Body>, Response = Response<Body>, Error = Infallible> + Clone {
        service_fn(move |_req: Request<Body>| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let mut response = Response::new(Body::from("inner"));
                *response.status_mut() = StatusCode::IM_A_TEAPOT;
                Ok::<_, Infallible>(response)
            }
        })
    }

    fn request(method: Method) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri("/api/events")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_options_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = create_cors_layer(HeaderValue::from_static(ORIGIN))
            .layer(counting_service(calls.clone()));

        let response = service.oneshot(request(Method::OPTIONS)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            ORIGIN
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            ALLOWED_HEADERS
        );
    }

    #[tokio::test]
    async fn test_headers_added_to_inner_response() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = create_cors_layer(HeaderValue::from_static(ORIGIN))
            .layer(counting_service(calls.clone()));

        let response = service.oneshot(request(Method::GET)).await.unwrap();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            ORIGIN
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            ALLOWED_METHODS
        );
    }
}
