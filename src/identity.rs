//! Who may edit: the authenticated identity and the main-user designation.

use std::sync::{Mutex, PoisonError};

use anyhow::Context as _;
use async_trait::async_trait;

use crate::storage::Storage;

/// Principal reported for unauthenticated callers.
pub const ANONYMOUS_PRINCIPAL: &str = "2vxsx-fae";

pub const MAIN_USER_KEY: &str = "portfolio_main_user_principal";

pub const PRINCIPAL_ENV: &str = "FOLIO_PRINCIPAL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Principal(String),
}

impl Identity {
    /// The anonymous sentinel and blank strings never become authenticated.
    pub fn from_principal(principal: impl Into<String>) -> Self {
        let principal = principal.into();
        let trimmed = principal.trim();
        if trimmed.is_empty() || trimmed == ANONYMOUS_PRINCIPAL {
            Self::Anonymous
        } else {
            Self::Principal(trimmed.to_owned())
        }
    }

    pub fn principal(&self) -> &str {
        match self {
            Self::Anonymous => ANONYMOUS_PRINCIPAL,
            Self::Principal(principal) => principal,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Principal(_))
    }
}

/// Login capability supplied by the host environment.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self) -> Identity;
    async fn login(&self) -> anyhow::Result<Identity>;
    async fn logout(&self) -> anyhow::Result<()>;
}

/// Identity taken from a configured principal (flag or `FOLIO_PRINCIPAL`).
#[derive(Debug)]
pub struct EnvIdentityProvider {
    configured: Identity,
    session: Mutex<Identity>,
}

impl EnvIdentityProvider {
    /// Starts logged in as `principal`, else as `FOLIO_PRINCIPAL`, else
    /// anonymous.
    pub fn new(principal: Option<String>) -> Self {
        let configured = principal
            .or_else(|| std::env::var(PRINCIPAL_ENV).ok())
            .map(Identity::from_principal)
            .unwrap_or(Identity::Anonymous);
        Self {
            session: Mutex::new(configured.clone()),
            configured,
        }
    }

    fn session(&self) -> std::sync::MutexGuard<'_, Identity> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl IdentityProvider for EnvIdentityProvider {
    fn current_identity(&self) -> Identity {
        self.session().clone()
    }

    async fn login(&self) -> anyhow::Result<Identity> {
        if !self.configured.is_authenticated() {
            anyhow::bail!("no principal configured; pass --principal or set {PRINCIPAL_ENV}");
        }
        *self.session() = self.configured.clone();
        Ok(self.configured.clone())
    }

    async fn logout(&self) -> anyhow::Result<()> {
        *self.session() = Identity::Anonymous;
        Ok(())
    }
}

/// Persisted designation of the single identity allowed to edit content.
#[derive(Debug)]
pub struct MainUserGate<S> {
    storage: S,
    main_user: Option<String>,
}

impl<S: Storage> MainUserGate<S> {
    pub fn load(storage: S) -> Self {
        let main_user = match storage.get(MAIN_USER_KEY) {
            Ok(value) => value.filter(|principal| !principal.is_empty()),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to read main user");
                None
            }
        };
        Self { storage, main_user }
    }

    pub fn main_user(&self) -> Option<&str> {
        self.main_user.as_deref()
    }

    /// Designates `identity` as the main user. Anonymous callers are ignored
    /// and `false` is returned.
    pub fn set_main_user(&mut self, identity: &Identity) -> anyhow::Result<bool> {
        let Identity::Principal(principal) = identity else {
            tracing::debug!("anonymous identity cannot become main user");
            return Ok(false);
        };
        self.storage
            .set(MAIN_USER_KEY, principal)
            .context("save main user")?;
        self.main_user = Some(principal.clone());
        tracing::info!(principal = %principal, "main user set");
        Ok(true)
    }

    pub fn clear(&mut self) -> anyhow::Result<()> {
        self.storage
            .remove(MAIN_USER_KEY)
            .context("clear main user")?;
        self.main_user = None;
        tracing::info!("main user cleared");
        Ok(())
    }

    pub fn is_main_user(&self, identity: &Identity) -> bool {
        match (identity, &self.main_user) {
            (Identity::Principal(principal), Some(main_user)) => principal == main_user,
            _ => false,
        }
    }
}
