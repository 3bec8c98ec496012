use crate::STUB_UUID;

use uuid::Uuid;

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn stub() -> UserId {
        UserId(STUB_UUID)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewUser {
    pub name: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), crate::Error> {
        crate::validate_content(&self.name)?;
        Ok(())
    }
}

/// The user on whose behalf an operation is performed
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Viewer {
    pub id: UserId,
    pub name: String,
}

impl From<User> for Viewer {
    fn from(u: User) -> Viewer {
        Viewer {
            id: u.id,
            name: u.name,
        }
    }
}
