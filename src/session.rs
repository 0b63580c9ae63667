//! Produces a valid Google session (access token) that we can use to call
//! the gcal API.

use chrono::Utc;
use coursecal_core::error::AuthResult;
use coursecal_core::{Credential, CredentialStore};

/// Exchanges a refresh token for a new access token.
pub trait TokenRefresher {
    async fn refresh(&self, credential: &Credential) -> AuthResult<Credential>;
}

/// Asks the user for consent and returns a fresh credential.
pub trait InteractiveAuthorizer {
    async fn authorize(&self) -> AuthResult<Credential>;
}

/// An authenticated session. Read-only once built.
#[derive(Debug, Clone)]
pub struct Session {
    credential: Credential,
}

impl Session {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    pub fn access_token(&self) -> &str {
        &self.credential.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.credential.refresh_token
    }
}

pub struct Authenticator<S, R, I> {
    store: S,
    refresher: R,
    authorizer: I,
}

impl<S, R, I> Authenticator<S, R, I>
where
    S: CredentialStore,
    R: TokenRefresher,
    I: InteractiveAuthorizer,
{
    pub fn new(store: S, refresher: R, authorizer: I) -> Self {
        Self {
            store,
            refresher,
            authorizer,
        }
    }

    /// Load the cached credential, refreshing it or running the interactive
    /// flow when needed. Any new credential is written back to the store.
    pub async fn get_session(&self) -> AuthResult<Session> {
        let credential = match self.store.load()? {
            Some(cached) if !cached.is_expired(Utc::now()) => {
                tracing::debug!("using cached credential");
                return Ok(Session::new(cached));
            }
            Some(cached) if cached.can_refresh() => {
                tracing::info!("access token expired, refreshing");
                match self.refresher.refresh(&cached).await {
                    Ok(refreshed) => refreshed,
                    Err(e) => {
                        tracing::warn!(error = %e, "refresh failed, falling back to interactive authorization");
                        self.authorizer.authorize().await?
                    }
                }
            }
            Some(_) => {
                tracing::info!("cached credential expired without a refresh token");
                self.authorizer.authorize().await?
            }
            None => {
                tracing::info!("no cached credential, starting interactive authorization");
                self.authorizer.authorize().await?
            }
        };

        self.store.save(&credential)?;
        Ok(Session::new(credential))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use chrono::{DateTime, Duration};
    use coursecal_core::AuthError;

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        credential: RefCell<Option<Credential>>,
        saves: Cell<usize>,
    }

    impl MemoryStore {
        fn with(credential: Credential) -> Self {
            Self {
                credential: RefCell::new(Some(credential)),
                saves: Cell::new(0),
            }
        }
    }

    impl CredentialStore for &MemoryStore {
        fn load(&self) -> AuthResult<Option<Credential>> {
            Ok(self.credential.borrow().clone())
        }

        fn save(&self, credential: &Credential) -> AuthResult<()> {
            self.saves.set(self.saves.get() + 1);
            *self.credential.borrow_mut() = Some(credential.clone());
            Ok(())
        }
    }

    /// A cache that exists but can't be read.
    struct UnreadableStore;

    impl CredentialStore for UnreadableStore {
        fn load(&self) -> AuthResult<Option<Credential>> {
            Err(AuthError::CacheUnreadable {
                path: "token.toml".into(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }

        fn save(&self, _credential: &Credential) -> AuthResult<()> {
            panic!("nothing should be saved after a failed load");
        }
    }

    #[derive(Default)]
    struct FakeRefresher {
        calls: Cell<usize>,
        fail: bool,
    }

    impl TokenRefresher for &FakeRefresher {
        async fn refresh(&self, credential: &Credential) -> AuthResult<Credential> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(AuthError::Refresh("invalid_grant".to_string()));
            }
            Ok(credential.refreshed("refreshed".to_string(), String::new(), 3600))
        }
    }

    #[derive(Default)]
    struct FakeAuthorizer {
        calls: Cell<usize>,
        decline: bool,
    }

    impl InteractiveAuthorizer for &FakeAuthorizer {
        async fn authorize(&self) -> AuthResult<Credential> {
            self.calls.set(self.calls.get() + 1);
            if self.decline {
                return Err(AuthError::ConsentDeclined("access_denied".to_string()));
            }
            Ok(Credential::from_expires_in(
                "interactive".to_string(),
                "1//interactive".to_string(),
                3600,
            ))
        }
    }

    fn credential(expires_at: DateTime<Utc>, refresh_token: &str) -> Credential {
        Credential {
            access_token: "cached".to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn missing_cache_runs_interactive_flow() {
        let store = MemoryStore::default();
        let refresher = FakeRefresher::default();
        let authorizer = FakeAuthorizer::default();

        let session = Authenticator::new(&store, &refresher, &authorizer)
            .get_session()
            .await
            .unwrap();

        assert_eq!(session.access_token(), "interactive");
        assert_eq!(authorizer.calls.get(), 1);
        assert_eq!(refresher.calls.get(), 0);
        assert_eq!(store.saves.get(), 1);
        assert_eq!(
            store.credential.borrow().as_ref().unwrap().access_token,
            "interactive"
        );
    }

    #[tokio::test]
    async fn valid_cache_is_used_without_writing() {
        let store = MemoryStore::with(credential(Utc::now() + Duration::hours(1), "1//r"));
        let refresher = FakeRefresher::default();
        let authorizer = FakeAuthorizer::default();

        let session = Authenticator::new(&store, &refresher, &authorizer)
            .get_session()
            .await
            .unwrap();

        assert_eq!(session.access_token(), "cached");
        assert_eq!(refresher.calls.get(), 0);
        assert_eq!(authorizer.calls.get(), 0);
        assert_eq!(store.saves.get(), 0);
    }

    #[tokio::test]
    async fn expired_cache_with_refresh_token_refreshes_silently() {
        let store = MemoryStore::with(credential(Utc::now() - Duration::hours(1), "1//r"));
        let refresher = FakeRefresher::default();
        let authorizer = FakeAuthorizer::default();

        let session = Authenticator::new(&store, &refresher, &authorizer)
            .get_session()
            .await
            .unwrap();

        assert_eq!(session.access_token(), "refreshed");
        assert_eq!(session.refresh_token(), "1//r");
        assert_eq!(refresher.calls.get(), 1);
        assert_eq!(authorizer.calls.get(), 0);
        assert_eq!(store.saves.get(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_falls_back_to_interactive() {
        let store = MemoryStore::with(credential(Utc::now() - Duration::hours(1), "1//r"));
        let refresher = FakeRefresher {
            fail: true,
            ..Default::default()
        };
        let authorizer = FakeAuthorizer::default();

        let session = Authenticator::new(&store, &refresher, &authorizer)
            .get_session()
            .await
            .unwrap();

        assert_eq!(session.access_token(), "interactive");
        assert_eq!(refresher.calls.get(), 1);
        assert_eq!(authorizer.calls.get(), 1);
    }

    #[tokio::test]
    async fn expired_cache_without_refresh_token_goes_interactive() {
        let store = MemoryStore::with(credential(Utc::now() - Duration::hours(1), ""));
        let refresher = FakeRefresher::default();
        let authorizer = FakeAuthorizer::default();

        Authenticator::new(&store, &refresher, &authorizer)
            .get_session()
            .await
            .unwrap();

        assert_eq!(refresher.calls.get(), 0);
        assert_eq!(authorizer.calls.get(), 1);
    }

    #[tokio::test]
    async fn declined_consent_is_fatal_and_nothing_is_saved() {
        let store = MemoryStore::default();
        let refresher = FakeRefresher::default();
        let authorizer = FakeAuthorizer {
            decline: true,
            ..Default::default()
        };

        let err = Authenticator::new(&store, &refresher, &authorizer)
            .get_session()
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::ConsentDeclined(_)));
        assert_eq!(store.saves.get(), 0);
    }

    #[tokio::test]
    async fn unreadable_cache_aborts_before_authorizing() {
        let refresher = FakeRefresher::default();
        let authorizer = FakeAuthorizer::default();

        let err = Authenticator::new(UnreadableStore, &refresher, &authorizer)
            .get_session()
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::CacheUnreadable { .. }));
        assert_eq!(refresher.calls.get(), 0);
        assert_eq!(authorizer.calls.get(), 0);
    }
}
