use crate::db::DbPool;
use crate::models::{NewSession, User};
use crate::schema::{sessions, users};
use chrono::{Duration, Utc};
use diesel::prelude::*;

use super::crypto::{hash_token, issue_token};

pub fn create_session(conn: &mut PgConnection, user_id: i32) -> Result<String, diesel::result::Error> {
    let issued = issue_token();
    let expires_at = Utc::now() + Duration::days(30);

    let new_session = NewSession {
        user_id,
        token_hash: &issued.hash,
        expires_at,
    };

    diesel::insert_into(sessions::table)
        .values(&new_session)
        .execute(conn)?;

    Ok(issued.token)
}

pub fn delete_session(conn: &mut PgConnection, token: &str) -> Result<usize, diesel::result::Error> {
    diesel::delete(sessions::table.filter(sessions::token_hash.eq(hash_token(token)))).execute(conn)
}

pub async fn get_user_from_token(pool: &DbPool, token: &str) -> Option<User> {
    let mut conn = pool.get().ok()?;
    let token_hash = hash_token(token);

    let _span = tracing::info_span!("db.query", db.operation = "get_user_from_token").entered();
    sessions::table
        .inner_join(users::table)
        .filter(sessions::token_hash.eq(&token_hash))
        .filter(sessions::expires_at.gt(Utc::now()))
        .filter(users::deleted_at.is_null())
        .select(User::as_select())
        .first(&mut conn)
        .ok()
}
