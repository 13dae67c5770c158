use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;
use rand_core::OsRng;
use tracing::{info, warn};

use guestbook_db::models::UserRow;
use guestbook_db::{Database, is_unique_violation};
use guestbook_types::api::{LoginRequest, LoginResponse, RegisterRequest, SuccessResponse};

use crate::error::ApiError;
use crate::{AppState, run_blocking};

pub const ADMIN_USERNAME: &str = "admin";

/// Built-in admin password. Insecure; override it through configuration.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    let username = req.username.clone();
    let created = run_blocking(&state, "Registration failed", move |db| {
        if db.get_user_by_username(&req.username)?.is_some() {
            return Ok(false);
        }

        let password_hash = hash_password(&req.password)?;
        match db.create_user(&req.username, &password_hash) {
            Ok(_) => Ok(true),
            // Lost a race with a concurrent registration of the same name
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e),
        }
    })
    .await?;

    if !created {
        return Err(ApiError::conflict("Username already exists"));
    }

    info!("Registered user {}", username);
    Ok(Json(SuccessResponse::ok()))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = run_blocking(&state, "Login failed", move |db| {
        find_user_by_credentials(db, &req.username, &req.password)
    })
    .await?
    .ok_or(ApiError::Unauthorized)?;

    // Only checked after the password matched
    if user.is_banned {
        return Err(ApiError::Forbidden);
    }

    Ok(Json(LoginResponse {
        success: true,
        username: user.username,
        is_admin: user.is_admin,
    }))
}

/// Look up a user whose password verifies. Unknown users and wrong passwords
/// both yield `None`.
pub fn find_user_by_credentials(
    db: &Database,
    username: &str,
    password: &str,
) -> anyhow::Result<Option<UserRow>> {
    if username.is_empty() || password.is_empty() {
        return Ok(None);
    }

    Ok(db
        .get_user_by_username(username)?
        .filter(|user| verify_password(password, &user.password)))
}

/// What `bootstrap_admin` found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminBootstrap {
    pub created: bool,
    /// The stored admin credential is still the built-in default.
    pub default_password: bool,
    /// A non-default configured password was not applied because the admin already exists.
    pub configured_ignored: bool,
}

/// Seed the `admin` account on first start and flag an insecure credential.
///
/// An existing admin keeps its stored password; the configured one only
/// applies to the first start.
pub fn bootstrap_admin(db: &Database, password: &str) -> anyhow::Result<AdminBootstrap> {
    let report = match db.get_user_by_username(ADMIN_USERNAME)? {
        Some(admin) => AdminBootstrap {
            created: false,
            default_password: verify_password(DEFAULT_ADMIN_PASSWORD, &admin.password),
            configured_ignored: password != DEFAULT_ADMIN_PASSWORD
                && !verify_password(password, &admin.password),
        },
        None => {
            let password_hash = hash_password(password)?;
            let created = db.create_user_if_absent(ADMIN_USERNAME, &password_hash, true)?;
            if created {
                info!("Created initial admin account '{}'", ADMIN_USERNAME);
            }
            AdminBootstrap {
                created,
                default_password: created && password == DEFAULT_ADMIN_PASSWORD,
                configured_ignored: false,
            }
        }
    };

    if report.default_password {
        warn!(
            "Admin account '{}' still uses the built-in default password '{}'",
            ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD
        );
    }
    if report.configured_ignored {
        warn!(
            "GUESTBOOK_ADMIN_PASSWORD differs from the stored admin password and is ignored; \
             it only applies when the admin account is first created"
        );
    }

    Ok(report)
}

/// Argon2id with a random salt, encoded as a PHC string.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_only_the_original_password() {
        let hash = hash_password("pw1").unwrap();
        assert_ne!(hash, "pw1");
        assert!(verify_password("pw1", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("pw1", "pw1"));
    }

    #[test]
    fn bootstrap_admin_runs_once() {
        let db = Database::open_in_memory().unwrap();
        let first = bootstrap_admin(&db, "s3cret").unwrap();
        assert!(first.created);
        assert!(!first.default_password);

        let second = bootstrap_admin(&db, "other").unwrap();
        assert!(!second.created);
        assert!(second.configured_ignored);

        let admin = find_user_by_credentials(&db, ADMIN_USERNAME, "s3cret")
            .unwrap()
            .unwrap();
        assert!(admin.is_admin);
        assert!(find_user_by_credentials(&db, ADMIN_USERNAME, "other").unwrap().is_none());
    }

    #[test]
    fn default_admin_password_is_flagged_until_changed() {
        let db = Database::open_in_memory().unwrap();
        let first = bootstrap_admin(&db, DEFAULT_ADMIN_PASSWORD).unwrap();
        assert!(first.created);
        assert!(first.default_password);

        // Configuring a new password later does not replace the live default
        let restart = bootstrap_admin(&db, "s3cret").unwrap();
        assert_eq!(
            restart,
            AdminBootstrap {
                created: false,
                default_password: true,
                configured_ignored: true,
            }
        );
        assert!(find_user_by_credentials(&db, ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)
            .unwrap()
            .is_some());
    }

    #[test]
    fn default_config_over_custom_admin_is_not_flagged() {
        let db = Database::open_in_memory().unwrap();
        bootstrap_admin(&db, "s3cret").unwrap();

        let restart = bootstrap_admin(&db, DEFAULT_ADMIN_PASSWORD).unwrap();
        assert!(!restart.default_password);
        assert!(!restart.configured_ignored);
    }

    #[test]
    fn credentials_lookup_hides_which_part_failed() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("alice", &hash_password("pw1").unwrap()).unwrap();

        assert!(find_user_by_credentials(&db, "alice", "pw1").unwrap().is_some());
        assert!(find_user_by_credentials(&db, "alice", "pw2").unwrap().is_none());
        assert!(find_user_by_credentials(&db, "bob", "pw1").unwrap().is_none());
    }
}
