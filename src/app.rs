//! Wires configuration, the persisted session and a gateway into a
//! [`MenuSync`] ready for commands.

use std::sync::Arc;

use instaurant_core::{
    Action, FirebaseGateway, Gateway, MemoryGateway, MenuSync, Session, Store,
};

use crate::config::{Backend, Config};
use crate::session::SessionFile;

pub struct App {
    pub sync: MenuSync,
    pub session: Option<Session>,
}

impl App {
    pub fn open(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let backend = config.backend.value;
        let saved = match SessionFile::load(&config.session_path())? {
            Some(saved) if saved.backend == backend => Some(saved),
            Some(saved) => {
                tracing::warn!(
                    saved = %saved.backend,
                    configured = %backend,
                    "ignoring session saved for another backend"
                );
                None
            }
            None => None,
        };

        if let Some(saved) = &saved {
            if saved.account.is_expired() {
                tracing::warn!(email = %saved.account.email, "saved session has expired");
            }
        }

        let gateway: Arc<dyn Gateway> = match backend {
            Backend::Local => {
                let dir = config.local_backend_dir();
                tracing::debug!(dir = %dir.display(), "opening local backend");
                let gateway = MemoryGateway::open(dir)?;
                if let Some(saved) = saved {
                    gateway.restore_session(saved.account);
                }
                Arc::new(gateway)
            }
            Backend::Firebase => {
                let firebase = config.firebase.gateway_config()?;
                tracing::debug!(database = %firebase.database_url, "using firebase backend");
                let gateway = FirebaseGateway::new(firebase);
                if let Some(saved) = saved {
                    gateway.restore_session(saved.account);
                }
                Arc::new(gateway)
            }
        };

        let store = Arc::new(Store::new());
        spawn_action_log(&store);

        let sync = MenuSync::new(gateway, store);
        let session = sync.resume_session();
        Ok(Self { sync, session })
    }

    /// The signed-in owner's id.
    pub fn owner_id(&self) -> Result<&str, Box<dyn std::error::Error>> {
        self.session
            .as_ref()
            .map(|s| s.uid.as_str())
            .ok_or_else(|| "Not signed in. Run 'instaurant auth signin' first.".into())
    }
}

/// Logs every dispatched descriptor at debug level.
fn spawn_action_log(store: &Store) {
    let mut actions = store.observe();
    tokio::spawn(async move {
        while let Ok(action) = actions.recv().await {
            match &action {
                Action::Category(a) => {
                    tracing::debug!(scope = a.scope(), kind = a.kind(), "category")
                }
                Action::Dish(a) => tracing::debug!(scope = a.scope(), kind = a.kind(), "dish"),
                other => tracing::debug!(action = ?other, "dispatch"),
            }
        }
    });
}
