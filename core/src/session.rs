use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Who is signed in, if anyone.
#[derive(Debug, Default)]
pub struct Session {
    user: RwLock<Option<User>>,
}

impl Session {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            user: RwLock::new(Some(user)),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.read().clone()
    }

    pub fn sign_in(&self, user: User) {
        *self.user.write() = Some(user);
    }

    pub fn sign_out(&self) {
        *self.user.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_and_out() {
        let session = Session::signed_out();
        assert_eq!(session.current_user(), None);
        session.sign_in(User {
            name: "ada".into(),
            avatar_url: None,
        });
        assert_eq!(session.current_user().map(|u| u.name), Some("ada".to_string()));
        session.sign_out();
        assert_eq!(session.current_user(), None);
    }
}
