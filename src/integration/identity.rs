use std::sync::{Arc, RwLock};

use crate::user;

/// Identity collaborator. Supplies the currently authenticated user;
/// `None` means every operation requiring a caller fails upstream.
pub trait Identity: Send + Sync {
    fn current_user(&self) -> Option<user::Id>;
}

pub type Provider = Arc<dyn Identity>;

/// Process-local session holder, used by the demo binary and tests.
#[derive(Default)]
pub struct StaticIdentity {
    user: RwLock<Option<user::Id>>,
}

impl StaticIdentity {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn login(&self, user: user::Id) {
        *self.user.write().expect("identity lock poisoned") = Some(user);
    }

    pub fn logout(&self) {
        *self.user.write().expect("identity lock poisoned") = None;
    }
}

impl Identity for StaticIdentity {
    fn current_user(&self) -> Option<user::Id> {
        self.user.read().expect("identity lock poisoned").clone()
    }
}
