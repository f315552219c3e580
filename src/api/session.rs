use parking_lot::RwLock;

/// Wallet connection as seen by the orchestrator.
pub trait SessionProvider: Send + Sync {
    fn account(&self) -> Option<String>;

    fn is_connected(&self) -> bool {
        self.account().is_some()
    }
}

/// Session whose account is set from config or by the front end.
#[derive(Debug, Default)]
pub struct StaticSession {
    account: RwLock<Option<String>>,
}

impl StaticSession {
    pub fn new(account: Option<String>) -> Self {
        let account = account.filter(|a| !a.trim().is_empty());
        Self {
            account: RwLock::new(account),
        }
    }

    pub fn connect(&self, account: impl Into<String>) {
        *self.account.write() = Some(account.into());
    }

    pub fn disconnect(&self) {
        *self.account.write() = None;
    }
}

impl SessionProvider for StaticSession {
    fn account(&self) -> Option<String> {
        self.account.read().clone()
    }
}
