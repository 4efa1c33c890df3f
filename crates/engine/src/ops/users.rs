use chrono::Utc;

use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, User, users, wallets};

use super::{Engine, normalize_email, normalize_optional_text, with_tx};

impl Engine {
    /// Registers a user together with their zero-balance wallet.
    ///
    /// The engine stores the password hash as given; hashing and password
    /// policy live at the boundary that owns the credentials.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        let first_name = normalize_optional_text(first_name);
        let last_name = normalize_optional_text(last_name);
        let password_hash = password_hash.to_string();

        with_tx!(self, |db_tx| {
            let exists = users::Entity::find()
                .filter(users::Column::Email.eq(email.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(email));
            }

            let user = users::ActiveModel {
                email: ActiveValue::Set(email),
                password_hash: ActiveValue::Set(password_hash),
                first_name: ActiveValue::Set(first_name),
                last_name: ActiveValue::Set(last_name),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            wallets::ActiveModel {
                user_id: ActiveValue::Set(user.id),
                balance_pln_minor: ActiveValue::Set(0),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            Ok(User::from(user))
        })
    }

    /// Looks a user up by normalized email.
    pub async fn user_by_email(&self, email: &str) -> ResultEngine<Option<User>> {
        let email = normalize_email(email)?;
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.database)
            .await?;
        Ok(model.map(User::from))
    }
}
