//! Directory Service Trait
//!
//! The operations the dispatcher can invoke. `UserStore` is the only
//! implementation; the trait keeps the presentation layer free of the
//! repository type parameter.

use platform::password::ClearTextPassword;

use crate::application::user_store::UserStore;
use crate::domain::entity::{NewUser, User, UserPatch};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_id::UserId;
use crate::error::DirectoryResult;

#[trait_variant::make(UserDirectory: Send)]
pub trait LocalUserDirectory {
    async fn all(&self) -> DirectoryResult<Vec<User>>;

    async fn read(&self, user_id: &UserId) -> DirectoryResult<User>;

    async fn by_user_name(&self, user_name: &str) -> DirectoryResult<User>;

    async fn create(&self, new_user: NewUser) -> DirectoryResult<User>;

    async fn update(&self, user_id: &UserId, patch: UserPatch) -> DirectoryResult<User>;

    async fn update_with_password(
        &self,
        user_id: &UserId,
        patch: UserPatch,
        password: ClearTextPassword,
    ) -> DirectoryResult<User>;

    async fn reset_password(
        &self,
        user_name: &str,
        password: ClearTextPassword,
    ) -> DirectoryResult<User>;

    async fn update_password(
        &self,
        user_name: &str,
        old_password: ClearTextPassword,
        new_password: ClearTextPassword,
    ) -> DirectoryResult<User>;

    async fn verify_password(
        &self,
        user_name: &str,
        password: ClearTextPassword,
    ) -> DirectoryResult<bool>;

    async fn delete(&self, user_id: &UserId) -> DirectoryResult<User>;
}

impl<R> UserDirectory for UserStore<R>
where
    R: UserRepository + Send + Sync,
{
    async fn all(&self) -> DirectoryResult<Vec<User>> {
        UserStore::all(self).await
    }

    async fn read(&self, user_id: &UserId) -> DirectoryResult<User> {
        UserStore::read(self, user_id).await
    }

    async fn by_user_name(&self, user_name: &str) -> DirectoryResult<User> {
        UserStore::by_user_name(self, user_name).await
    }

    async fn create(&self, new_user: NewUser) -> DirectoryResult<User> {
        UserStore::create(self, new_user).await
    }

    async fn update(&self, user_id: &UserId, patch: UserPatch) -> DirectoryResult<User> {
        UserStore::update(self, user_id, patch).await
    }

    async fn update_with_password(
        &self,
        user_id: &UserId,
        patch: UserPatch,
        password: ClearTextPassword,
    ) -> DirectoryResult<User> {
        UserStore::update_with_password(self, user_id, patch, password).await
    }

    async fn reset_password(
        &self,
        user_name: &str,
        password: ClearTextPassword,
    ) -> DirectoryResult<User> {
        UserStore::reset_password(self, user_name, password).await
    }

    async fn update_password(
        &self,
        user_name: &str,
        old_password: ClearTextPassword,
        new_password: ClearTextPassword,
    ) -> DirectoryResult<User> {
        UserStore::update_password(self, user_name, old_password, new_password).await
    }

    async fn verify_password(
        &self,
        user_name: &str,
        password: ClearTextPassword,
    ) -> DirectoryResult<bool> {
        UserStore::verify_password(self, user_name, password).await
    }

    async fn delete(&self, user_id: &UserId) -> DirectoryResult<User> {
        UserStore::delete(self, user_id).await
    }
}
