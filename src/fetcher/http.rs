use super::{FetchError, RetryPolicy};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, Response};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use url::Url;

pub(super) async fn fetch(
    client: &Client,
    url: &Url,
    headers: &[(HeaderName, HeaderValue)],
    retry: RetryPolicy,
    sink: &mut (dyn AsyncWrite + Unpin + Send),
) -> Result<u64, FetchError> {
    let mut response = send_with_retries(client, url, headers, retry).await?;

    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?
    {
        sink.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    tracing::debug!("fetched {} bytes from {}", written, url);
    Ok(written)
}

// Nothing reaches the sink until a response with a success status arrives,
// so a retried request never leaves partial content behind.
async fn send_with_retries(
    client: &Client,
    url: &Url,
    headers: &[(HeaderName, HeaderValue)],
    retry: RetryPolicy,
) -> Result<Response, FetchError> {
    let mut attempt = 0;

    loop {
        let mut request = client.get(url.clone());
        for (name, value) in headers {
            request = request.header(name.clone(), value.clone());
        }

        tracing::debug!("GET {} (attempt {})", url, attempt + 1);
        let result = request.send().await;

        let retryable = match &result {
            Ok(response) => response.status().is_server_error(),
            Err(e) => e.is_connect() || e.is_timeout(),
        };

        if retryable && attempt < retry.max_retries {
            let delay = retry.delay_for(attempt);
            match &result {
                Ok(response) => tracing::warn!(
                    "{} returned {}, retrying in {:?}",
                    url,
                    response.status(),
                    delay
                ),
                Err(e) => tracing::warn!("request to {} failed: {}, retrying in {:?}", url, e, delay),
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
            continue;
        }

        let response = result.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        return Ok(response);
    }
}
