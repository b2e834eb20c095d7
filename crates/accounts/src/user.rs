//! User aggregate: registration, login security, token flows, administration.
//!
//! # Invariants
//! - The password hash is replaced atomically with a `password_changed_at`
//!   stamp (minus a small skew buffer) so earlier-issued tokens can be
//!   invalidated by the session layer.
//! - A locked account rejects logins even with the correct password.
//! - Reset/verification tokens are stored only as digests; expired and
//!   unknown tokens are rejected with the identical error.
//! - Role changes and status toggles require an admin/super-admin actor and
//!   record that actor as `updated_by`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use shopcore_core::{
    Aggregate, AggregateRoot, DomainError, EmailAddress, Event, UserId,
};

use crate::password;
use crate::permissions::Permission;
use crate::roles::Role;
use crate::token;

/// Consecutive failed logins that trigger a lock.
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;
/// Lock duration after too many failures.
pub fn lock_duration() -> Duration {
    Duration::hours(2)
}
/// Password reset tokens live for 30 minutes.
pub fn password_reset_ttl() -> Duration {
    Duration::minutes(30)
}
/// Email verification tokens live for 24 hours.
pub fn email_verification_ttl() -> Duration {
    Duration::hours(24)
}
/// `password_changed_at` is stamped slightly in the past so a token issued in
/// the same instant as the change still compares as stale.
pub fn password_change_skew() -> Duration {
    Duration::seconds(1)
}

/// Account state, distinct from the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
    Deleted,
}

/// A stored token digest with its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Uniform check: a mismatching, missing, or expired token all look the
    /// same to the caller.
    fn accepts(&self, presented: &str, now: DateTime<Utc>) -> bool {
        self.digest == token::digest_of(presented) && now <= self.expires_at
    }
}

/// Aggregate root: User.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub name: String,
    pub password_hash: String,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub is_active: bool,
    pub account_status: AccountStatus,
    pub login_attempts: u32,
    pub lock_until: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_email_verified: bool,
    pub password_reset: Option<TokenRecord>,
    pub email_verification: Option<TokenRecord>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub version: u64,
    pub created: bool,
}

impl User {
    /// Create an empty, not-yet-registered aggregate instance for rehydration.
    pub fn empty(id: UserId) -> Self {
        Self {
            id,
            email: EmailAddress::placeholder(),
            name: String::new(),
            password_hash: String::new(),
            password_changed_at: None,
            role: Role::Client,
            permissions: Vec::new(),
            is_active: true,
            account_status: AccountStatus::Active,
            login_attempts: 0,
            lock_until: None,
            last_login: None,
            is_email_verified: false,
            password_reset: None,
            email_verification: None,
            created_by: None,
            updated_by: None,
            version: 0,
            created: false,
        }
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| until > now)
    }

    /// Public-facing projection: never includes the password hash or any
    /// token digest.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            permissions: self.permissions.clone(),
            is_active: self.is_active,
            account_status: self.account_status,
            is_email_verified: self.is_email_verified,
            last_login: self.last_login,
        }
    }

    fn ensure_exists(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    /// Soft-deleted accounts are not-found for everything except admin
    /// status changes (which can restore them).
    fn ensure_not_deleted(&self) -> Result<(), DomainError> {
        self.ensure_exists()?;
        if self.account_status == AccountStatus::Deleted {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn ensure_admin(actor_role: Role) -> Result<(), DomainError> {
        if !actor_role.can_manage_users() {
            return Err(DomainError::forbidden(
                "user administration requires an admin role",
            ));
        }
        Ok(())
    }
}

/// What the customer-facing layer may see of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: EmailAddress,
    pub name: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub is_active: bool,
    pub account_status: AccountStatus,
    pub is_email_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
}

impl AggregateRoot for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterUser.
///
/// Self-registration always yields a `client`; elevated roles require an
/// admin actor (the admin-creation path), and `super-admin` a super-admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUser {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Option<Role>,
    pub actor: Option<UserId>,
    pub actor_role: Option<Role>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordLogin, the outcome of a password comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLogin {
    pub password_matches: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserCommand {
    Register(RegisterUser),
    RecordLogin(RecordLogin),
    ChangePassword {
        new_password_hash: String,
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    RequestPasswordReset {
        digest: String,
        expires_at: DateTime<Utc>,
        occurred_at: DateTime<Utc>,
    },
    ResetPassword {
        token: String,
        new_password_hash: String,
        occurred_at: DateTime<Utc>,
    },
    RequestEmailVerification {
        digest: String,
        expires_at: DateTime<Utc>,
        occurred_at: DateTime<Utc>,
    },
    VerifyEmail {
        token: String,
        occurred_at: DateTime<Utc>,
    },
    SetRole {
        role: Role,
        actor: UserId,
        actor_role: Role,
        occurred_at: DateTime<Utc>,
    },
    SetAccountStatus {
        status: AccountStatus,
        actor: UserId,
        actor_role: Role,
        occurred_at: DateTime<Utc>,
    },
}

/// Event: UserRegistered. Carries the normalized email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegistered {
    pub user_id: UserId,
    pub email: EmailAddress,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub actor: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserEvent {
    Registered(UserRegistered),
    LoginSucceeded {
        occurred_at: DateTime<Utc>,
    },
    /// Carries the computed attempt count and lock deadline so `apply` stays
    /// a deterministic fold.
    LoginFailed {
        attempts: u32,
        lock_until: Option<DateTime<Utc>>,
        occurred_at: DateTime<Utc>,
    },
    PasswordChanged {
        password_hash: String,
        changed_at: DateTime<Utc>,
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    PasswordResetRequested {
        digest: String,
        expires_at: DateTime<Utc>,
        occurred_at: DateTime<Utc>,
    },
    PasswordResetCompleted {
        password_hash: String,
        changed_at: DateTime<Utc>,
        occurred_at: DateTime<Utc>,
    },
    EmailVerificationRequested {
        digest: String,
        expires_at: DateTime<Utc>,
        occurred_at: DateTime<Utc>,
    },
    EmailVerified {
        occurred_at: DateTime<Utc>,
    },
    RoleChanged {
        role: Role,
        actor: UserId,
        occurred_at: DateTime<Utc>,
    },
    AccountStatusChanged {
        status: AccountStatus,
        actor: UserId,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for UserEvent {
    fn event_type(&self) -> &'static str {
        match self {
            UserEvent::Registered(_) => "accounts.user.registered",
            UserEvent::LoginSucceeded { .. } => "accounts.user.login_succeeded",
            UserEvent::LoginFailed { .. } => "accounts.user.login_failed",
            UserEvent::PasswordChanged { .. } => "accounts.user.password_changed",
            UserEvent::PasswordResetRequested { .. } => "accounts.user.password_reset_requested",
            UserEvent::PasswordResetCompleted { .. } => "accounts.user.password_reset_completed",
            UserEvent::EmailVerificationRequested { .. } => {
                "accounts.user.email_verification_requested"
            }
            UserEvent::EmailVerified { .. } => "accounts.user.email_verified",
            UserEvent::RoleChanged { .. } => "accounts.user.role_changed",
            UserEvent::AccountStatusChanged { .. } => "accounts.user.account_status_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            UserEvent::Registered(e) => e.occurred_at,
            UserEvent::LoginSucceeded { occurred_at }
            | UserEvent::LoginFailed { occurred_at, .. }
            | UserEvent::PasswordChanged { occurred_at, .. }
            | UserEvent::PasswordResetRequested { occurred_at, .. }
            | UserEvent::PasswordResetCompleted { occurred_at, .. }
            | UserEvent::EmailVerificationRequested { occurred_at, .. }
            | UserEvent::EmailVerified { occurred_at }
            | UserEvent::RoleChanged { occurred_at, .. }
            | UserEvent::AccountStatusChanged { occurred_at, .. } => *occurred_at,
        }
    }
}

/// Result of a full login attempt (password verified against the hash).
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub success: bool,
    pub events: Vec<UserEvent>,
}

impl Aggregate for User {
    type Command = UserCommand;
    type Event = UserEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            UserEvent::Registered(e) => {
                self.id = e.user_id;
                self.email = e.email.clone();
                self.name = e.name.clone();
                self.password_hash = e.password_hash.clone();
                self.role = e.role;
                self.is_active = true;
                self.account_status = AccountStatus::Active;
                self.created_by = e.actor;
                self.updated_by = e.actor;
                self.created = true;
            }
            UserEvent::LoginSucceeded { occurred_at } => {
                self.login_attempts = 0;
                self.lock_until = None;
                self.last_login = Some(*occurred_at);
            }
            UserEvent::LoginFailed {
                attempts,
                lock_until,
                ..
            } => {
                self.login_attempts = *attempts;
                self.lock_until = *lock_until;
            }
            UserEvent::PasswordChanged {
                password_hash,
                changed_at,
                actor,
                ..
            } => {
                self.password_hash = password_hash.clone();
                self.password_changed_at = Some(*changed_at);
                self.updated_by = *actor;
            }
            UserEvent::PasswordResetRequested {
                digest, expires_at, ..
            } => {
                self.password_reset = Some(TokenRecord {
                    digest: digest.clone(),
                    expires_at: *expires_at,
                });
            }
            UserEvent::PasswordResetCompleted {
                password_hash,
                changed_at,
                ..
            } => {
                self.password_hash = password_hash.clone();
                self.password_changed_at = Some(*changed_at);
                self.password_reset = None;
                // A proven mailbox owner is no longer a lockout suspect.
                self.login_attempts = 0;
                self.lock_until = None;
            }
            UserEvent::EmailVerificationRequested {
                digest, expires_at, ..
            } => {
                self.email_verification = Some(TokenRecord {
                    digest: digest.clone(),
                    expires_at: *expires_at,
                });
            }
            UserEvent::EmailVerified { .. } => {
                self.is_email_verified = true;
                self.email_verification = None;
            }
            UserEvent::RoleChanged { role, actor, .. } => {
                self.role = *role;
                self.updated_by = Some(*actor);
            }
            UserEvent::AccountStatusChanged { status, actor, .. } => {
                self.account_status = *status;
                self.is_active = *status == AccountStatus::Active;
                self.updated_by = Some(*actor);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            UserCommand::Register(cmd) => self.handle_register(cmd),
            UserCommand::RecordLogin(cmd) => self.handle_record_login(cmd),
            UserCommand::ChangePassword {
                new_password_hash,
                actor,
                occurred_at,
            } => {
                self.ensure_not_deleted()?;
                Ok(vec![UserEvent::PasswordChanged {
                    password_hash: new_password_hash.clone(),
                    changed_at: *occurred_at - password_change_skew(),
                    actor: *actor,
                    occurred_at: *occurred_at,
                }])
            }
            UserCommand::RequestPasswordReset {
                digest,
                expires_at,
                occurred_at,
            } => {
                self.ensure_not_deleted()?;
                Ok(vec![UserEvent::PasswordResetRequested {
                    digest: digest.clone(),
                    expires_at: *expires_at,
                    occurred_at: *occurred_at,
                }])
            }
            UserCommand::ResetPassword {
                token,
                new_password_hash,
                occurred_at,
            } => self.handle_reset_password(token, new_password_hash, *occurred_at),
            UserCommand::RequestEmailVerification {
                digest,
                expires_at,
                occurred_at,
            } => {
                self.ensure_not_deleted()?;
                Ok(vec![UserEvent::EmailVerificationRequested {
                    digest: digest.clone(),
                    expires_at: *expires_at,
                    occurred_at: *occurred_at,
                }])
            }
            UserCommand::VerifyEmail { token, occurred_at } => {
                self.ensure_not_deleted()?;
                let accepted = self
                    .email_verification
                    .as_ref()
                    .is_some_and(|record| record.accepts(token, *occurred_at));
                if !accepted {
                    return Err(invalid_token());
                }
                Ok(vec![UserEvent::EmailVerified {
                    occurred_at: *occurred_at,
                }])
            }
            UserCommand::SetRole {
                role,
                actor,
                actor_role,
                occurred_at,
            } => {
                self.ensure_not_deleted()?;
                Self::ensure_admin(*actor_role)?;
                if !actor_role.can_grant(*role) {
                    return Err(DomainError::forbidden(
                        "only a super-admin can grant super-admin",
                    ));
                }
                Ok(vec![UserEvent::RoleChanged {
                    role: *role,
                    actor: *actor,
                    occurred_at: *occurred_at,
                }])
            }
            UserCommand::SetAccountStatus {
                status,
                actor,
                actor_role,
                occurred_at,
            } => {
                // Deliberately only `ensure_exists`: admins can restore a
                // soft-deleted account by setting it back to active.
                self.ensure_exists()?;
                Self::ensure_admin(*actor_role)?;
                Ok(vec![UserEvent::AccountStatusChanged {
                    status: *status,
                    actor: *actor,
                    occurred_at: *occurred_at,
                }])
            }
        }
    }
}

fn invalid_token() -> DomainError {
    // Same message for "expired" and "never existed", so callers cannot tell.
    DomainError::validation("invalid or expired token")
}

impl User {
    fn handle_register(&self, cmd: &RegisterUser) -> Result<Vec<UserEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("user already exists"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if cmd.password_hash.is_empty() {
            return Err(DomainError::validation("password hash cannot be empty"));
        }

        let email = EmailAddress::parse(&cmd.email)?;

        let role = cmd.role.unwrap_or_default();
        if role != Role::Client {
            let actor_role = cmd
                .actor_role
                .ok_or_else(|| DomainError::forbidden("elevated roles require an admin actor"))?;
            if !actor_role.can_grant(role) {
                return Err(DomainError::forbidden(format!(
                    "role '{role}' cannot be granted by '{actor_role}'"
                )));
            }
        }

        Ok(vec![UserEvent::Registered(UserRegistered {
            user_id: cmd.user_id,
            email,
            name: cmd.name.clone(),
            password_hash: cmd.password_hash.clone(),
            role,
            actor: cmd.actor,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_login(&self, cmd: &RecordLogin) -> Result<Vec<UserEvent>, DomainError> {
        self.ensure_not_deleted()?;

        // Locked wins over everything, including a correct password.
        if self.is_locked(cmd.occurred_at) {
            return Err(DomainError::forbidden("account is locked"));
        }
        if !self.is_active || self.account_status == AccountStatus::Suspended {
            return Err(DomainError::forbidden("account is disabled"));
        }

        if cmd.password_matches {
            return Ok(vec![UserEvent::LoginSucceeded {
                occurred_at: cmd.occurred_at,
            }]);
        }

        // A failure after an expired lock starts a fresh count.
        let attempts = if self.lock_until.is_some_and(|until| until <= cmd.occurred_at) {
            1
        } else {
            self.login_attempts + 1
        };
        let lock_until = (attempts >= MAX_LOGIN_ATTEMPTS)
            .then(|| cmd.occurred_at + lock_duration());

        Ok(vec![UserEvent::LoginFailed {
            attempts,
            lock_until,
            occurred_at: cmd.occurred_at,
        }])
    }

    fn handle_reset_password(
        &self,
        token: &str,
        new_password_hash: &str,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<UserEvent>, DomainError> {
        self.ensure_not_deleted()?;

        let accepted = self
            .password_reset
            .as_ref()
            .is_some_and(|record| record.accepts(token, occurred_at));
        if !accepted {
            return Err(invalid_token());
        }

        Ok(vec![UserEvent::PasswordResetCompleted {
            password_hash: new_password_hash.to_string(),
            changed_at: occurred_at - password_change_skew(),
            occurred_at,
        }])
    }

    /// Verify `password` against the stored hash and run the login state
    /// machine. Lock/disabled rejections surface as `Forbidden` before the
    /// password is even considered.
    pub fn attempt_login(
        &self,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, DomainError> {
        self.ensure_not_deleted()?;
        if self.is_locked(now) {
            return Err(DomainError::forbidden("account is locked"));
        }

        let matches = password::verify_password(password, &self.password_hash)?;
        let events = self.handle(&UserCommand::RecordLogin(RecordLogin {
            password_matches: matches,
            occurred_at: now,
        }))?;

        Ok(LoginOutcome {
            success: matches,
            events,
        })
    }

    /// Issue a password-reset token. The returned plaintext is the only copy;
    /// the emitted event stores the digest with a 30-minute expiry.
    pub fn request_password_reset(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(String, Vec<UserEvent>), DomainError> {
        let issued = token::issue();
        let events = self.handle(&UserCommand::RequestPasswordReset {
            digest: issued.digest,
            expires_at: now + password_reset_ttl(),
            occurred_at: now,
        })?;
        Ok((issued.plaintext, events))
    }

    /// Issue an email-verification token (24-hour expiry).
    pub fn request_email_verification(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(String, Vec<UserEvent>), DomainError> {
        let issued = token::issue();
        let events = self.handle(&UserCommand::RequestEmailVerification {
            digest: issued.digest,
            expires_at: now + email_verification_ttl(),
            occurred_at: now,
        })?;
        Ok((issued.plaintext, events))
    }
}
