use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::ReturnDocument,
    Collection, Database,
};
use serde::{Deserialize, Serialize};

/// Persisted user document. Only ever serialized toward the database;
/// read paths go through `PublicUser`, which has no password field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_gender")]
    pub gender: String,
    #[serde(default = "default_mobile")]
    pub mobile: String,
}

fn default_gender() -> String {
    "Not Selected".to_string()
}

fn default_mobile() -> String {
    "0123456789".to_string()
}

fn users(db: &Database) -> Collection<User> {
    db.collection::<User>("users")
}

impl User {
    /// Find a user by exact email match.
    pub async fn find_by_email(db: &Database, email: &str) -> anyhow::Result<Option<User>> {
        Ok(users(db).find_one(doc! { "email": email }).await?)
    }

    pub async fn find_by_id(db: &Database, id: ObjectId) -> anyhow::Result<Option<User>> {
        Ok(users(db).find_one(doc! { "_id": id }).await?)
    }

    /// Insert a new user with the placeholder gender and mobile values.
    /// Email uniqueness is the caller's pre-insert check; there is no
    /// unique index, so two concurrent registrations can race past it.
    pub async fn create(
        db: &Database,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = User {
            id: ObjectId::new(),
            name: name.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            gender: default_gender(),
            mobile: default_mobile(),
        };
        users(db).insert_one(&user).await?;
        Ok(user)
    }

    /// Overwrite name, gender and mobile, returning the post-update document.
    pub async fn update_profile(
        db: &Database,
        id: ObjectId,
        name: &str,
        gender: &str,
        mobile: &str,
    ) -> anyhow::Result<Option<User>> {
        let updated = users(db)
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "name": name, "gender": gender, "mobile": mobile } },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    /// Overwrite the password hash only.
    pub async fn update_password(
        db: &Database,
        id: ObjectId,
        password_hash: &str,
    ) -> anyhow::Result<()> {
        users(db)
            .update_one(doc! { "_id": id }, doc! { "$set": { "password": password_hash } })
            .await?;
        Ok(())
    }

    /// Delete by id; false when nothing matched.
    pub async fn delete(db: &Database, id: ObjectId) -> anyhow::Result<bool> {
        let res = users(db).delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count > 0)
    }

    pub async fn list_all(db: &Database) -> anyhow::Result<Vec<User>> {
        let cursor = users(db).find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }
}
