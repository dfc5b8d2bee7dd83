use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::data::ResponseHead;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Status, headers and a streaming body.
pub struct Response<E> {
    pub head: ResponseHead,
    pub body: BoxStream<'static, std::result::Result<Bytes, E>>,
}

/// Asynchronous HTTP client abstraction.
///
/// This is the minimal surface the transfer engine needs. Implementations
/// handle redirects and TLS themselves. A status of 400 or above is not an
/// error at this level; callers inspect [`ResponseHead::status`].
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - [`MockHttpClient`](crate::MockHttpClient): In-memory server for tests
pub trait HttpClient: Send + Sync {
    /// Transport error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a HEAD request.
    fn head(
        &self,
        url: &str,
    ) -> impl Future<Output = std::result::Result<ResponseHead, Self::Error>> + Send;

    /// Issue a GET request with extra headers, returning once headers arrive.
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<Response<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use futures_util::StreamExt;

    use super::*;

    const USER_AGENT: &str = concat!("grab/", env!("CARGO_PKG_VERSION"));

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a client with the default configuration.
        pub fn new() -> crate::error::Result<Self> {
            let client = reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .map_err(|e| crate::error::Error::Request(e.to_string()))?;
            Ok(Self { client })
        }

        /// Wrap a preconfigured client.
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    fn head_of(response: &reqwest::Response) -> ResponseHead {
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        ResponseHead {
            status: response.status().as_u16(),
            headers,
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn head(&self, url: &str) -> std::result::Result<ResponseHead, Self::Error> {
            let response = self.client.head(url).send().await?;
            Ok(head_of(&response))
        }

        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<Response<Self::Error>, Self::Error> {
            let mut request = self.client.get(url);
            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await?;
            let head = head_of(&response);
            let body = response.bytes_stream().map(|chunk| chunk.map(Bytes::from));

            Ok(Response {
                head,
                body: Box::pin(body),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
