//! User invitation model
//!
//! Registration is invitation-only: an admin issues an invitation for an
//! email address, the invitee registers with the token before it expires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserRole;

/// User invitation entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    /// Unique identifier
    pub id: i64,
    /// Invited email address
    pub email: String,
    /// Opaque invitation token (unique)
    pub token: String,
    /// Role granted upon acceptance
    pub role: UserRole,
    /// Admin user who issued the invitation
    pub invited_by: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// When the invitation was redeemed, if ever
    pub accepted_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Check if the invitation can still be redeemed
    pub fn is_usable(&self) -> bool {
        self.accepted_at.is_none() && self.expires_at > Utc::now()
    }
}

/// Input for issuing an invitation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitationInput {
    pub email: String,
    pub role: UserRole,
    pub invited_by: i64,
}
