use crate::error::Error;
use crate::options::Settings;
use base64::Engine;

/// Builds the client shared by the identity provider exchange and every
/// notification. Cloning it is cheap and keeps the connection pool shared.
///
/// # Arguments
///
/// * `settings` - The run settings; the user agent and request timeout are taken from here.
///
/// # Returns
///
/// A `Result` containing the built `Client` if successful, or an [`Error::Client`] otherwise.
pub fn build_api_client(settings: &Settings) -> Result<reqwest::Client, Error> {
    Ok(reqwest::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(settings.request_timeout)
        .build()?)
}

/// Builds the client used to download sitemaps.
///
/// Basic authentication is attached here only, so sitemap credentials never
/// reach the identity provider or the indexing endpoint.
///
/// # Arguments
///
/// * `settings` - The run settings; the user agent and request timeout are taken from here.
/// * `basic_auth` - Optional `username:password` sent with every sitemap request.
///
/// # Returns
///
/// A `Result` containing the built `Client` if successful, or an error otherwise.
///
/// # Errors
///
/// Fails with [`Error::Header`] when the credentials do not form a valid header
/// value, and with [`Error::Client`] when the client cannot be built.
pub fn build_sitemap_client(
    settings: &Settings,
    basic_auth: Option<&str>,
) -> Result<reqwest::Client, Error> {
    let mut client_builder = reqwest::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(settings.request_timeout);

    if let Some(auth) = basic_auth.filter(|a| !a.is_empty()) {
        let mut headers = reqwest::header::HeaderMap::new();
        let encoded_credentials = base64::engine::general_purpose::STANDARD.encode(auth.as_bytes());
        let mut auth_value: reqwest::header::HeaderValue =
            format!("Basic {}", encoded_credentials).parse()?;
        auth_value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth_value);
        client_builder = client_builder.default_headers(headers);
    }
    Ok(client_builder.build()?)
}

/// Fetches the content of a given URL as a `String`.
///
/// # Errors
///
/// This function will return an error if:
/// - The GET request fails (e.g., network issues or the request timeout elapsed).
/// - The HTTP response status is not successful (e.g., 4xx or 5xx error).
/// - The response body cannot be converted to text.
pub async fn get_url_content(
    url: &str,
    client: &reqwest::Client,
) -> Result<String, reqwest::Error> {
    client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}
