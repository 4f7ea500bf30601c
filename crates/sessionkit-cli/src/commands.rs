use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::warn;

use sessionkit_core::storage::FileStorage;
use sessionkit_core::{
    AuthClient, Config, CredentialStore, Executor, Navigator, Route, SessionGuard, SessionState,
    StorageKind, ViewState,
};

use crate::navigator::TerminalNavigator;

pub struct App {
    config: Config,
    guard: SessionGuard,
    navigator: Arc<TerminalNavigator>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let storage = config
            .open_storage()
            .context("Failed to open credential storage")?;
        let credentials = CredentialStore::new(storage);
        let executor =
            Executor::from_config(&config, credentials).context("Failed to create HTTP client")?;
        let navigator = Arc::new(TerminalNavigator);
        let guard = SessionGuard::new(AuthClient::new(executor), navigator.clone());

        Ok(Self {
            config,
            guard,
            navigator,
        })
    }

    fn client(&self) -> &AuthClient {
        self.guard.client()
    }

    pub async fn register(&self, email: &str, password: Option<String>) -> Result<()> {
        let (password, confirm) = match password {
            Some(password) => (password.clone(), password),
            None => (
                rpassword::prompt_password("Password: ")?,
                rpassword::prompt_password("Confirm password: ")?,
            ),
        };

        let user = self.client().register(email, &password, &confirm).await?;
        println!("Registered {} (id {}).", user.email, user.id);
        self.navigator.redirect(Route::Login);
        Ok(())
    }

    pub async fn login(&self, email: Option<String>, password: Option<String>) -> Result<()> {
        let Some(email) = email.or_else(|| self.config.last_email.clone()) else {
            bail!("Email required");
        };
        let password = match password {
            Some(password) => password,
            None => rpassword::prompt_password("Password: ")?,
        };

        let pair = self.client().login(&email, &password).await?;
        self.guard.sign_in(&pair);

        let mut config = self.config.clone();
        config.last_email = Some(email);
        if let Err(e) = config.save() {
            warn!(error = %e, "Failed to save config");
        }

        self.navigator.redirect(Route::Dashboard);
        Ok(())
    }

    pub async fn profile(&self) -> Result<()> {
        match self.guard.load_profile().await {
            ViewState::Ready(user) => {
                println!("Email:   {}", user.email);
                println!("User ID: {}", user.id);
                Ok(())
            }
            ViewState::Failed(message) => bail!(message),
            ViewState::Loading => Ok(()),
        }
    }

    pub async fn update_profile(&self, email: &str) -> Result<()> {
        if !self.guard.require_session() {
            bail!("Not signed in.");
        }
        let user = self.client().update_profile(email).await?;
        println!("Email updated to {}.", user.email);
        Ok(())
    }

    pub async fn search(&self, query: &str) -> Result<()> {
        if !self.guard.require_session() {
            bail!("Not signed in.");
        }
        let users = self.client().search_users(query).await?;
        if users.is_empty() {
            println!("No users found.");
        }
        for user in users {
            println!("{:>6}  {}", user.id, user.email);
        }
        Ok(())
    }

    pub fn logout(&self) {
        self.guard.logout();
    }

    pub fn status(&self) -> Result<()> {
        let state = match self.guard.state() {
            SessionState::Anonymous => "signed out",
            SessionState::Authenticated => "signed in",
            SessionState::Invalid => "session rejected",
        };
        println!("API:     {}", self.config.base_url());
        println!("Session: {}", state);

        if self.config.storage_kind() == StorageKind::File {
            let storage = FileStorage::new(self.config.data_dir()?);
            if let Some(updated) = storage.last_updated().ok().flatten() {
                let minutes = (Utc::now() - updated).num_minutes().max(0);
                println!("Stored:  {} ({}m ago)", storage.path().display(), minutes);
            }
        }
        Ok(())
    }
}
