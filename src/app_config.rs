//! OAuth client registration, as downloaded from the Google Cloud console.
//!
//! The file looks like:
//!   {"installed": {"client_id": "...", "client_secret": "...", ...}}

use std::path::Path;

use coursecal_core::AuthError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        if !path.exists() {
            return Err(AuthError::ClientSecrets(format!(
                "{} not found.\n\n\
                Create OAuth credentials at https://console.cloud.google.com/apis/credentials\n\
                (application type \"Desktop app\"), enable the Google Calendar API,\n\
                and save the downloaded JSON to that path.",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            AuthError::ClientSecrets(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&contents).map_err(|message| {
            AuthError::ClientSecrets(format!("failed to parse {}: {}", path.display(), message))
        })
    }

    fn parse(contents: &str) -> Result<Self, String> {
        let file: SecretsFile = serde_json::from_str(contents).map_err(|e| e.to_string())?;

        file.installed
            .or(file.web)
            .ok_or_else(|| "expected an \"installed\" or \"web\" client".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_installed_client() {
        let secrets = ClientSecrets::parse(
            r#"{"installed":{"client_id":"abc.apps.googleusercontent.com","project_id":"p",
               "auth_uri":"https://accounts.google.com/o/oauth2/auth",
               "client_secret":"shh","redirect_uris":["http://localhost"]}}"#,
        )
        .unwrap();

        assert_eq!(secrets.client_id, "abc.apps.googleusercontent.com");
        assert_eq!(secrets.client_secret, "shh");
    }

    #[test]
    fn accepts_web_client() {
        let secrets =
            ClientSecrets::parse(r#"{"web":{"client_id":"id","client_secret":"secret"}}"#)
                .unwrap();
        assert_eq!(secrets.client_id, "id");
    }

    #[test]
    fn rejects_unknown_shape() {
        assert!(ClientSecrets::parse(r#"{"client_id":"id"}"#).is_err());
    }

    #[test]
    fn missing_file_explains_setup() {
        let err = ClientSecrets::load(Path::new("/nonexistent/credentials.json")).unwrap_err();
        assert!(matches!(err, AuthError::ClientSecrets(_)));
        assert!(err.to_string().contains("console.cloud.google.com"));
    }
}
