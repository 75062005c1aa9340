use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::store::Store;

pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";
pub const ADMIN_KEY_SETTING: &str = "admin_api_key_hash";

// ── Admin API key guard ──

/// Guard: request carries an `X-Admin-Key` whose sha256 matches the stored
/// `admin_api_key_hash`. Fails with 401 otherwise.
pub struct AdminKey;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminKey {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let store = match request.guard::<&State<Arc<dyn Store>>>().await.succeeded() {
            Some(s) => s,
            None => return Outcome::Error((Status::InternalServerError, ())),
        };
        let presented = match request.headers().get_one(ADMIN_KEY_HEADER) {
            Some(k) if !k.trim().is_empty() => k.trim(),
            _ => return Outcome::Error((Status::Unauthorized, ())),
        };

        if key_matches(&**store.inner(), presented) {
            Outcome::Success(AdminKey)
        } else {
            log::warn!("Rejected admin API request with an invalid key");
            Outcome::Error((Status::Unauthorized, ()))
        }
    }
}

pub fn key_matches(store: &dyn Store, presented: &str) -> bool {
    match store.setting_get(ADMIN_KEY_SETTING) {
        Some(stored) if !stored.is_empty() => hash_key(presented).eq_ignore_ascii_case(&stored),
        _ => false,
    }
}

pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
