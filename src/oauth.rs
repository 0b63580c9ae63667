//! Google OAuth: refreshing tokens and the browser consent flow.

use std::path::PathBuf;

use coursecal_core::error::AuthResult;
use coursecal_core::{AuthError, Credential};
use google_calendar::Client;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::app_config::ClientSecrets;
use crate::session::{InteractiveAuthorizer, TokenRefresher};

pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

pub struct GoogleOAuth {
    secrets_path: PathBuf,
    redirect_port: u16,
}

impl GoogleOAuth {
    pub fn new(secrets_path: impl Into<PathBuf>, redirect_port: u16) -> Self {
        Self {
            secrets_path: secrets_path.into(),
            redirect_port,
        }
    }

    fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback", self.redirect_port)
    }

    fn redirect_address(&self) -> String {
        format!("127.0.0.1:{}", self.redirect_port)
    }
}

impl TokenRefresher for &GoogleOAuth {
    async fn refresh(&self, credential: &Credential) -> AuthResult<Credential> {
        let secrets = ClientSecrets::load(&self.secrets_path)?;

        let client = Client::new(
            secrets.client_id,
            secrets.client_secret,
            self.redirect_uri(),
            credential.access_token.clone(),
            credential.refresh_token.clone(),
        );

        let tokens = client
            .refresh_access_token()
            .await
            .map_err(|e| AuthError::Refresh(e.to_string()))?;

        Ok(credential.refreshed(tokens.access_token, tokens.refresh_token, tokens.expires_in))
    }
}

impl InteractiveAuthorizer for &GoogleOAuth {
    async fn authorize(&self) -> AuthResult<Credential> {
        let secrets = ClientSecrets::load(&self.secrets_path)?;
        let scopes: Vec<String> = SCOPES.iter().map(|s| s.to_string()).collect();

        let mut client = Client::new(
            secrets.client_id,
            secrets.client_secret,
            self.redirect_uri(),
            String::new(),
            String::new(),
        );

        let auth_url = client.user_consent_url(&scopes);
        let expected_state = query_param(&auth_url, "state");

        // Bind before showing the URL so a fast redirect can't be missed
        let address = self.redirect_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| AuthError::Listener { address, source })?;

        eprintln!("\nOpen this URL in your browser to authorize coursecal:\n");
        eprintln!("{}\n", auth_url);

        if open::that(&auth_url).is_err() {
            eprintln!("(Could not open browser automatically, please copy the URL above)");
        }

        let callback = wait_for_callback(&listener).await?;
        verify_state(expected_state.as_deref(), &callback)?;

        eprintln!("Received authorization code, exchanging for tokens...");

        let tokens = client
            .get_access_token(&callback.code, &callback.state)
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        if tokens.refresh_token.is_empty() {
            tracing::warn!("no refresh token granted; authorization will be needed again after expiry");
        }

        Ok(Credential::from_expires_in(
            tokens.access_token,
            tokens.refresh_token,
            tokens.expires_in,
        ))
    }
}

fn query_param(url: &str, key: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.to_string())
}

#[derive(Debug, PartialEq, Eq)]
struct Callback {
    code: String,
    state: String,
}

/// The callback must echo the `state` sent in the consent URL. A URL
/// without one leaves nothing to compare.
fn verify_state(expected: Option<&str>, callback: &Callback) -> AuthResult<()> {
    match expected {
        Some(expected) if callback.state != expected => {
            Err(AuthError::Callback("state parameter mismatch".to_string()))
        }
        _ => Ok(()),
    }
}

/// Parse the request line of the redirect, e.g.
/// `GET /callback?code=...&state=... HTTP/1.1`.
fn parse_callback(request_line: &str) -> AuthResult<Callback> {
    let url_part = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| AuthError::Callback("invalid HTTP request".to_string()))?;

    let url = url::Url::parse(&format!("http://localhost{}", url_part))
        .map_err(|e| AuthError::Callback(e.to_string()))?;

    let param = |key: &str| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = param("error") {
        return Err(AuthError::ConsentDeclined(error));
    }

    let code = param("code").ok_or_else(|| AuthError::Callback("no code in callback".to_string()))?;
    let state =
        param("state").ok_or_else(|| AuthError::Callback("no state in callback".to_string()))?;

    Ok(Callback { code, state })
}

async fn wait_for_callback(listener: &TcpListener) -> AuthResult<Callback> {
    let io_err = |context: &str, e: std::io::Error| AuthError::Callback(format!("{}: {}", context, e));

    let (stream, _) = listener
        .accept()
        .await
        .map_err(|e| io_err("failed to accept OAuth callback", e))?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .map_err(|e| io_err("failed to read OAuth callback request line", e))?;

    // Drain the headers so closing the socket doesn't reset the connection
    loop {
        let mut header = String::new();
        let read = reader
            .read_line(&mut header)
            .await
            .map_err(|e| io_err("failed to read OAuth callback headers", e))?;
        if read == 0 || header.trim().is_empty() {
            break;
        }
    }

    let result = parse_callback(&request_line);

    let (heading, body) = match &result {
        Ok(_) => (
            "Authorization successful!",
            "You can close this window and return to the terminal.",
        ),
        Err(_) => (
            "Authorization failed",
            "Return to the terminal for details.",
        ),
    };

    let response = format!(
        "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body><h1>{}</h1><p>{}</p></body></html>",
        heading, body
    );

    let mut stream = reader.into_inner();
    stream
        .write_all(response.as_bytes())
        .await
        .map_err(|e| io_err("failed to write OAuth callback response", e))?;
    stream
        .flush()
        .await
        .map_err(|e| io_err("failed to flush OAuth callback response", e))?;

    result
}
