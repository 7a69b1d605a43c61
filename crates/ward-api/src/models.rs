//! Request and response bodies for the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
use ward_core::{ArmId, GrantId, GrantStatus, RequestId, Role, UserId, UserStatus};
use ward_governance::{
    AccessGrant, Arm, EditUserInput, ProfileUpdate, RegisterUserInput, RequestAccessInput,
    ReviewInput, SweepOutcome, User,
};

/// Body for `POST /users`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255))]
    pub first_name: String,
    #[validate(length(min = 1, max = 255))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub organization: String,
    pub requested_role: Option<Role>,
    #[serde(default)]
    pub arm_ids: Vec<ArmId>,
}

impl From<RegisterRequest> for RegisterUserInput {
    fn from(body: RegisterRequest) -> Self {
        Self {
            first_name: body.first_name,
            last_name: body.last_name,
            organization: body.organization,
            requested_role: body.requested_role,
            arm_ids: body.arm_ids,
        }
    }
}

/// Optional profile fields accepted alongside an access request.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileBody {
    #[validate(length(min = 1, max = 255))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub last_name: Option<String>,
    #[validate(length(max = 255))]
    pub organization: Option<String>,
}

/// Body for `POST /access-requests`.
#[derive(Debug, Deserialize, Validate)]
pub struct RequestAccessRequest {
    pub arm_ids: Vec<ArmId>,
    #[validate(nested)]
    pub profile: Option<ProfileBody>,
}

impl From<RequestAccessRequest> for RequestAccessInput {
    fn from(body: RequestAccessRequest) -> Self {
        Self {
            arm_ids: body.arm_ids,
            profile: body.profile.map(|p| ProfileUpdate {
                first_name: p.first_name,
                last_name: p.last_name,
                organization: p.organization,
            }),
        }
    }
}

/// Body for the review endpoints.
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub provider: String,
    pub arm_ids: Vec<ArmId>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

impl From<ReviewRequest> for ReviewInput {
    fn from(body: ReviewRequest) -> Self {
        Self {
            user: ward_core::Identity::new(&body.email, &body.provider),
            arm_ids: body.arm_ids,
            comment: body.comment,
        }
    }
}

/// Body for `PATCH /users`.
#[derive(Debug, Deserialize, Validate)]
pub struct EditUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub provider: String,
    #[validate(length(min = 1, max = 255))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub last_name: Option<String>,
    #[validate(length(max = 255))]
    pub organization: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

impl From<EditUserRequest> for EditUserInput {
    fn from(body: EditUserRequest) -> Self {
        Self {
            user: ward_core::Identity::new(&body.email, &body.provider),
            first_name: body.first_name,
            last_name: body.last_name,
            organization: body.organization,
            role: body.role,
            status: body.status,
        }
    }
}

/// A user record on the wire.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub provider: String,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.identity.email,
            provider: user.identity.provider,
            first_name: user.first_name,
            last_name: user.last_name,
            organization: user.organization,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// An access grant on the wire.
#[derive(Debug, Serialize)]
pub struct GrantResponse {
    pub id: GrantId,
    pub arm_id: ArmId,
    pub status: GrantStatus,
    pub request_id: RequestId,
    pub requested_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewer: Option<String>,
    pub comment: Option<String>,
}

impl From<AccessGrant> for GrantResponse {
    fn from(grant: AccessGrant) -> Self {
        Self {
            id: grant.id,
            arm_id: grant.arm_id,
            status: grant.status,
            request_id: grant.request_id,
            requested_at: grant.requested_at,
            reviewed_at: grant.reviewed_at,
            reviewer: grant.reviewer.map(|r| r.to_string()),
            comment: grant.comment,
        }
    }
}

/// An arm on the wire.
#[derive(Debug, Serialize)]
pub struct ArmResponse {
    pub id: ArmId,
    pub name: String,
    pub acronym: String,
}

impl From<Arm> for ArmResponse {
    fn from(arm: Arm) -> Self {
        Self {
            id: arm.id,
            name: arm.name,
            acronym: arm.acronym,
        }
    }
}

/// Response for `GET /users/me/access`.
#[derive(Debug, Serialize)]
pub struct AccessListResponse {
    pub user: UserResponse,
    pub grants: Vec<GrantResponse>,
}

/// Response for the grant-mutating endpoints.
#[derive(Debug, Serialize)]
pub struct GrantListResponse {
    pub grants: Vec<GrantResponse>,
}

impl From<Vec<AccessGrant>> for GrantListResponse {
    fn from(grants: Vec<AccessGrant>) -> Self {
        Self {
            grants: grants.into_iter().map(Into::into).collect(),
        }
    }
}

/// Response for `POST /admin/sweep`.
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub selected: usize,
    pub disabled: u64,
    pub demoted: usize,
    pub disabled_users: Vec<String>,
}

impl From<SweepOutcome> for SweepResponse {
    fn from(outcome: SweepOutcome) -> Self {
        Self {
            selected: outcome.selected,
            disabled: outcome.disabled,
            demoted: outcome.demoted,
            disabled_users: outcome
                .disabled_users
                .into_iter()
                .map(|identity| identity.email)
                .collect(),
        }
    }
}
