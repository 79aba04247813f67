use crate::error::ApiError;
use crate::session::Session;
use configuration::{ApiSettings, Credentials};

/// Authenticates against the platform and returns a reusable session.
///
/// The platform answers `POST /authentication` (HTTP basic auth) with a session
/// cookie, which the session's cookie store then attaches to every request.
/// Any non-success status is fatal for the caller: there is no channel to work
/// with.
pub async fn sign_in(settings: &ApiSettings, credentials: &Credentials) -> Result<Session, ApiError> {
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .timeout(settings.request_timeout)
        .build()?;

    let url = format!("{}/authentication", settings.base_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .basic_auth(&credentials.username, Some(&credentials.password))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to decode error response".to_string());
        tracing::error!(status = status.as_u16(), "Sign-in rejected by the platform.");
        return Err(ApiError::Authentication(format!("{}: {}", status, text)));
    }

    tracing::info!(user = %credentials.username, "Signed in.");
    Ok(Session::new(client, credentials.clone()))
}
