use tracing::{debug, info, warn};

use super::http::HttpClient;
use crate::core::describe;
use crate::data::{ResponseHead, TransferDescriptor};
use crate::error::{Error, Result};

/// Resolve transfer metadata for `url`.
///
/// Sends HEAD first. A transport failure, or a server that rejects HEAD with
/// 405 or 501, is retried once as a GET whose body is dropped unread. A
/// missing `Accept-Ranges: bytes` is not an error; the descriptor simply
/// reports `supports_ranges = false`.
///
/// # Errors
///
/// - [`Error::Request`] when neither HEAD nor GET reaches the server
/// - [`Error::Server`] when the final status is 400 or above
pub async fn resolve<C: HttpClient>(client: &C, url: &str) -> Result<TransferDescriptor> {
    let head = match client.head(url).await {
        Ok(head) if matches!(head.status, 405 | 501) => {
            debug!(status = head.status, "HEAD rejected, retrying as GET");
            head_via_get(client, url).await?
        }
        Ok(head) => head,
        Err(e) => {
            warn!(error = %e, "HEAD failed, retrying as GET");
            head_via_get(client, url).await?
        }
    };

    if head.is_error() {
        return Err(Error::Server {
            status: head.status,
        });
    }

    let descriptor = describe(&head);
    info!(
        file = %descriptor.file_name(),
        size = descriptor.total_size,
        ranges = descriptor.supports_ranges,
        "resolved transfer"
    );
    if !descriptor.supports_ranges {
        info!("server does not accept byte ranges");
    }

    Ok(descriptor)
}

async fn head_via_get<C: HttpClient>(client: &C, url: &str) -> Result<ResponseHead> {
    let response = client
        .get(url, &[])
        .await
        .map_err(|e| Error::Request(e.to_string()))?;
    Ok(response.head)
}
