use core_logic::NetworkError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Sends `request` and decodes the body as JSON regardless of status.
///
/// The status is returned alongside so callers decide what a non-2xx
/// means for their endpoint.
pub(crate) async fn send_json<R: DeserializeOwned>(
    request: RequestBuilder,
    endpoint: &str,
) -> Result<(StatusCode, R), NetworkError> {
    let resp = request
        .send()
        .await
        .map_err(|e| NetworkError::from_reqwest(endpoint, &e))?;

    let status = resp.status();
    let body = resp
        .bytes()
        .await
        .map_err(|e| NetworkError::from_reqwest(endpoint, &e))?;

    let parsed = serde_json::from_slice(&body).map_err(|e| NetworkError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason: format!("HTTP {}: {}", status.as_u16(), e),
    })?;

    Ok((status, parsed))
}

pub(crate) async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
    client: &Client,
    endpoint: &str,
    body: &B,
) -> Result<(StatusCode, R), NetworkError> {
    send_json(client.post(endpoint).json(body), endpoint).await
}
