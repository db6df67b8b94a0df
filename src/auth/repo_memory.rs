use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::UserRepository;
use crate::auth::repo_types::{NewUser, User};
use crate::error::RepoError;

/// In-process store with the same uniqueness guarantees as the `users` table.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, RepoError> {
        self.users
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, RepoError> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn update(&self, user: &User) -> Result<User, RepoError> {
        let mut users = self.users.lock().unwrap();
        if !users.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(RepoError::Duplicate);
        }
        let mut updated = user.clone();
        updated.updated_at = OffsetDateTime::now_utc();
        users.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.users
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ann".into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("ann@x.com")).await.unwrap();
        let err = repo.create(new_user("ann@x.com")).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn update_and_delete_unknown_id_are_not_found() {
        let repo = InMemoryUserRepository::new();
        let mut user = repo.create(new_user("ann@x.com")).await.unwrap();
        user.id = Uuid::new_v4();
        assert!(matches!(repo.update(&user).await, Err(RepoError::NotFound)));
        assert!(matches!(repo.delete(user.id).await, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn update_cannot_steal_another_email() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("ann@x.com")).await.unwrap();
        let mut bob = repo.create(new_user("bob@x.com")).await.unwrap();
        bob.email = "ann@x.com".into();
        assert!(matches!(repo.update(&bob).await, Err(RepoError::Duplicate)));
    }

    #[tokio::test]
    async fn delete_frees_the_email() {
        let repo = InMemoryUserRepository::new();
        let ann = repo.create(new_user("ann@x.com")).await.unwrap();
        repo.delete(ann.id).await.unwrap();
        assert!(matches!(repo.get_by_id(ann.id).await, Err(RepoError::NotFound)));
        repo.create(new_user("ann@x.com")).await.unwrap();
    }
}
