use std::sync::mpsc;

use crate::model::config::CubbyConfig;
use crate::model::user::User;

/// Environment variable that overrides `[user].id`
pub const USER_ENV: &str = "CUBBY_USER";

/// Supplies the signed-in user. Identity is taken as given, never verified.
pub trait IdentityProvider {
    fn current_user(&self) -> Option<User>;

    /// A stream of identity changes. `None` means signed out.
    fn subscribe(&mut self) -> mpsc::Receiver<Option<User>>;
}

/// Identity set from configuration or by explicit sign-in/out calls.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    user: Option<User>,
    subscribers: Vec<mpsc::Sender<Option<User>>>,
}

impl StaticIdentity {
    pub fn new(user: Option<User>) -> Self {
        StaticIdentity {
            user,
            subscribers: Vec::new(),
        }
    }

    /// Identity from `[user]`, with `CUBBY_USER` taking precedence.
    pub fn from_config(config: &CubbyConfig) -> Self {
        Self::resolve(config, std::env::var(USER_ENV).ok())
    }

    fn resolve(config: &CubbyConfig, env_user: Option<String>) -> Self {
        let env_user = env_user.filter(|id| !id.trim().is_empty());
        let user = match (env_user, &config.user) {
            (Some(id), Some(cfg)) if cfg.id == id => Some(User {
                id: id.into(),
                email: cfg.email.clone(),
            }),
            (Some(id), _) => Some(User::new(id)),
            (None, Some(cfg)) if !cfg.id.trim().is_empty() => Some(User {
                id: cfg.id.as_str().into(),
                email: cfg.email.clone(),
            }),
            (None, _) => None,
        };
        StaticIdentity::new(user)
    }

    pub fn sign_in(&mut self, user: User) {
        tracing::debug!(user = %user.id, "signed in");
        self.user = Some(user);
        self.broadcast();
    }

    pub fn sign_out(&mut self) {
        tracing::debug!("signed out");
        self.user = None;
        self.broadcast();
    }

    /// Send the current identity to every live subscriber; drop the rest.
    fn broadcast(&mut self) {
        let user = self.user.clone();
        self.subscribers.retain(|tx| tx.send(user.clone()).is_ok());
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<User> {
        self.user.clone()
    }

    fn subscribe(&mut self) -> mpsc::Receiver<Option<User>> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::UserConfig;
    use crate::model::user::UserId;

    fn config_with(id: &str) -> CubbyConfig {
        CubbyConfig {
            user: Some(UserConfig {
                id: id.into(),
                email: Some(format!("{id}@example.com")),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn config_user_is_used() {
        let identity = StaticIdentity::resolve(&config_with("alice"), None);
        let user = identity.current_user().unwrap();
        assert_eq!(user.id, UserId::new("alice"));
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn env_overrides_config() {
        let identity = StaticIdentity::resolve(&config_with("alice"), Some("bob".into()));
        let user = identity.current_user().unwrap();
        assert_eq!(user.id, UserId::new("bob"));
        assert_eq!(user.email, None);

        let blank = StaticIdentity::resolve(&config_with("alice"), Some("  ".into()));
        assert_eq!(blank.current_user().unwrap().id, UserId::new("alice"));
    }

    #[test]
    fn no_identity_without_config_or_env() {
        let identity = StaticIdentity::resolve(&CubbyConfig::default(), None);
        assert!(identity.current_user().is_none());
    }

    #[test]
    fn subscribers_see_changes() {
        let mut identity = StaticIdentity::default();
        let rx = identity.subscribe();
        identity.sign_in(User::new("alice"));
        identity.sign_out();
        assert_eq!(rx.try_recv().unwrap(), Some(User::new("alice")));
        assert_eq!(rx.try_recv().unwrap(), None);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut identity = StaticIdentity::default();
        drop(identity.subscribe());
        let rx = identity.subscribe();
        identity.sign_in(User::new("alice"));
        assert_eq!(identity.subscribers.len(), 1);
        assert!(rx.try_recv().is_ok());
    }
}
