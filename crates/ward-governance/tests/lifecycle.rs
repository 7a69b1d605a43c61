//! End-to-end lifecycle flows: registration, requests, review, and edits.

mod common;

use common::TestContext;
use ward_core::{ArmId, GrantStatus, Identity, Role, UserStatus};
use ward_governance::notify::TemplateKey;
use ward_governance::{
    AuditAction, AuditStore, EditUserInput, ErrorKind, GrantRepository, ProfileUpdate,
    RegisterUserInput, RequestAccessInput, ReviewInput, SessionContext,
};

fn register_input() -> RegisterUserInput {
    RegisterUserInput {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        organization: String::new(),
        requested_role: None,
        arm_ids: Vec::new(),
    }
}

#[tokio::test]
async fn test_registration_creates_unreviewed_non_member() {
    let ctx = TestContext::new();
    let (user, _) = ctx.register_user("jane@site.org").await;

    assert_eq!(user.role, Role::NonMember);
    assert_eq!(user.status, UserStatus::Unreviewed);
    assert_eq!(user.organization, "");
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let ctx = TestContext::new();
    let (_, session) = ctx.register_user("jane@site.org").await;

    let err = ctx
        .engine
        .register_user(&session, register_input())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotUnique);
    assert_eq!(err.severity_class(), 409);
}

#[tokio::test]
async fn test_registration_from_disallowed_provider() {
    let ctx = TestContext::new();
    let session = SessionContext::new("jane@site.org", "facebook");

    let err = ctx
        .engine
        .register_user(&session, register_input())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdp);
    assert_eq!(err.severity_class(), 401);
}

#[tokio::test]
async fn test_registration_without_session_identity() {
    let ctx = TestContext::new();
    let session = SessionContext::new("", "google");

    let err = ctx
        .engine
        .register_user(&session, register_input())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotLoggedIn);
}

#[tokio::test]
async fn test_admin_registration_cannot_carry_arm_request() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let session = SessionContext::new("root@site.org", "google");

    let err = ctx
        .engine
        .register_user(
            &session,
            RegisterUserInput {
                requested_role: Some(Role::Admin),
                arm_ids: vec![arm.id],
                ..register_input()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAdminArmRequest);

    // Nothing was persisted.
    let identity = Identity::new("root@site.org", "google");
    assert!(ctx.repo.find_user(&identity).await.unwrap().is_none());
}

#[tokio::test]
async fn test_admin_registration_without_arms_is_active() {
    let ctx = TestContext::new();
    let session = SessionContext::new("root@site.org", "google");

    let admin = ctx
        .engine
        .register_user(
            &session,
            RegisterUserInput {
                requested_role: Some(Role::Admin),
                ..register_input()
            },
        )
        .await
        .unwrap();
    assert_eq!(admin.role, Role::Admin);
    assert_eq!(admin.status, UserStatus::Active);
}

#[tokio::test]
async fn test_membership_cannot_be_claimed_at_registration() {
    let ctx = TestContext::new();
    let session = SessionContext::new("jane@site.org", "google");

    let err = ctx
        .engine
        .register_user(
            &session,
            RegisterUserInput {
                requested_role: Some(Role::Member),
                ..register_input()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRole);
}

#[tokio::test]
async fn test_registration_with_unknown_arm_creates_nothing() {
    let ctx = TestContext::new();
    let session = SessionContext::new("jane@site.org", "google");

    let err = ctx
        .engine
        .register_user(
            &session,
            RegisterUserInput {
                arm_ids: vec![ArmId::new()],
                ..register_input()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequestArm);

    let identity = Identity::new("jane@site.org", "google");
    assert!(ctx.repo.find_user(&identity).await.unwrap().is_none());
}

#[tokio::test]
async fn test_registration_with_initial_request_files_grants() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let session = SessionContext::new("jane@site.org", "google");

    let user = ctx
        .engine
        .register_user(
            &session,
            RegisterUserInput {
                arm_ids: vec![arm.id],
                ..register_input()
            },
        )
        .await
        .unwrap();

    let grants = ctx.repo.grants_for_user(user.id).await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].status, GrantStatus::Requested);
    assert!(grants[0].reviewer.is_none());
}

#[tokio::test]
async fn test_request_access_happy_path_notifies_and_audits() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (_admin, _) = ctx.seed_admin("root@site.org").await;
    let (user, session) = ctx.register_user("jane@site.org").await;

    let grants = ctx.request(&session, &[arm.id]).await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].status, GrantStatus::Requested);
    assert_eq!(grants[0].arm_id, arm.id);

    let events = ctx.audit.events_for(&user.identity).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::GrantTransition);
    assert_eq!(events[0].new_value.as_deref(), Some("requested"));
    assert!(!events[0].actor.is_system());

    let sent = ctx.notifier.sent().await;
    let templates: Vec<_> = sent.iter().map(|n| n.template).collect();
    assert!(templates.contains(&TemplateKey::RequestSubmitted));
    assert!(templates.contains(&TemplateKey::RequestPendingReview));
    let pending = sent
        .iter()
        .find(|n| n.template == TemplateKey::RequestPendingReview)
        .unwrap();
    assert_eq!(pending.recipients, vec!["root@site.org".to_string()]);
}

#[tokio::test]
async fn test_request_with_no_arms_is_rejected() {
    let ctx = TestContext::new();
    let (_, session) = ctx.register_user("jane@site.org").await;

    let err = ctx.request(&session, &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingArmRequestInputs);
    assert_eq!(err.severity_class(), 400);
}

#[tokio::test]
async fn test_one_unknown_arm_voids_the_whole_batch() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (user, session) = ctx.register_user("jane@site.org").await;

    let err = ctx
        .request(&session, &[arm.id, ArmId::new()])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequestArm);

    let grants = ctx.repo.grants_for_user(user.id).await.unwrap();
    assert!(grants.is_empty(), "valid arm in the batch was not granted");
}

#[tokio::test]
async fn test_duplicate_arms_in_one_request_collapse() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (_, session) = ctx.register_user("jane@site.org").await;

    let grants = ctx.request(&session, &[arm.id, arm.id]).await.unwrap();
    assert_eq!(grants.len(), 1);
}

#[tokio::test]
async fn test_admin_cannot_request_access() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (_, admin_session) = ctx.seed_admin("root@site.org").await;

    let err = ctx.request(&admin_session, &[arm.id]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotGeneralUser);
    assert_eq!(err.severity_class(), 403);
}

#[tokio::test]
async fn test_disabled_user_cannot_request_access() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (user, session) = ctx.register_user("jane@site.org").await;
    ctx.repo.disable_users(&[user.id]).await.unwrap();

    let err = ctx.request(&session, &[arm.id]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthorized);
}

#[tokio::test]
async fn test_profile_update_alongside_request_is_audited() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (user, session) = ctx.register_user("jane@site.org").await;

    ctx.engine
        .request_access(
            &session,
            RequestAccessInput {
                arm_ids: vec![arm.id],
                profile: Some(ProfileUpdate {
                    organization: Some("Broad".to_string()),
                    ..Default::default()
                }),
            },
        )
        .await
        .unwrap();

    let refreshed = ctx.repo.find_user(&user.identity).await.unwrap().unwrap();
    assert_eq!(refreshed.organization, "Broad");

    let events = ctx.audit.events_for(&user.identity).await.unwrap();
    let field_change = events
        .iter()
        .find(|e| e.action == AuditAction::FieldChanged)
        .expect("profile change audited");
    assert_eq!(field_change.field.as_deref(), Some("organization"));
    assert_eq!(field_change.old_value.as_deref(), Some(""));
    assert_eq!(field_change.new_value.as_deref(), Some("Broad"));
}

#[tokio::test]
async fn test_approval_promotes_role_and_status() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (admin, admin_session) = ctx.seed_admin("root@site.org").await;
    let (user, session) = ctx.register_user("jane@site.org").await;
    ctx.request(&session, &[arm.id]).await.unwrap();

    let grants = ctx
        .engine
        .approve_access(
            &admin_session,
            ReviewInput {
                user: user.identity.clone(),
                arm_ids: vec![arm.id],
                comment: Some("looks good".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].status, GrantStatus::Approved);
    assert_eq!(grants[0].reviewer.as_ref(), Some(&admin.identity));
    assert!(grants[0].has_review_stamp());
    assert_eq!(grants[0].comment.as_deref(), Some("looks good"));

    let refreshed = ctx.repo.find_user(&user.identity).await.unwrap().unwrap();
    assert_eq!(refreshed.role, Role::Member);
    assert_eq!(refreshed.status, UserStatus::Active);

    // Role and status promotions both land in the audit trail.
    let events = ctx.audit.events_for(&user.identity).await.unwrap();
    let fields: Vec<_> = events
        .iter()
        .filter(|e| e.action == AuditAction::FieldChanged)
        .filter_map(|e| e.field.as_deref())
        .collect();
    assert!(fields.contains(&"role"));
    assert!(fields.contains(&"status"));
}

#[tokio::test]
async fn test_non_admin_cannot_review() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (user, session) = ctx.register_user("jane@site.org").await;
    let (other, other_session) = ctx.register_user("mallory@site.org").await;
    let _ = other;
    ctx.request(&session, &[arm.id]).await.unwrap();

    let err = ctx
        .engine
        .approve_access(
            &other_session,
            ReviewInput {
                user: user.identity.clone(),
                arm_ids: vec![arm.id],
                comment: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthorized);
}

#[tokio::test]
async fn test_rejection_leaves_derived_fields_alone() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (_, admin_session) = ctx.seed_admin("root@site.org").await;
    let (user, session) = ctx.register_user("jane@site.org").await;
    ctx.request(&session, &[arm.id]).await.unwrap();

    let grants = ctx
        .engine
        .reject_access(
            &admin_session,
            ReviewInput {
                user: user.identity.clone(),
                arm_ids: vec![arm.id],
                comment: Some("incomplete application".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(grants[0].status, GrantStatus::Rejected);
    let refreshed = ctx.repo.find_user(&user.identity).await.unwrap().unwrap();
    assert_eq!(refreshed.role, Role::NonMember);
    assert_eq!(refreshed.status, UserStatus::Unreviewed);
}

#[tokio::test]
async fn test_rejected_grant_can_be_approved_without_a_new_request() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (_, admin_session) = ctx.seed_admin("root@site.org").await;
    let (user, session) = ctx.register_user("jane@site.org").await;
    ctx.request(&session, &[arm.id]).await.unwrap();

    let review = ReviewInput {
        user: user.identity.clone(),
        arm_ids: vec![arm.id],
        comment: None,
    };
    ctx.engine
        .reject_access(&admin_session, review.clone())
        .await
        .unwrap();

    // The earlier decision is reversed in place.
    let grants = ctx
        .engine
        .approve_access(&admin_session, review)
        .await
        .unwrap();
    assert_eq!(grants[0].status, GrantStatus::Approved);
}

#[tokio::test]
async fn test_pending_grant_cannot_be_revoked() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (_, admin_session) = ctx.seed_admin("root@site.org").await;
    let (user, session) = ctx.register_user("jane@site.org").await;
    ctx.request(&session, &[arm.id]).await.unwrap();

    let err = ctx
        .engine
        .revoke_access(
            &admin_session,
            ReviewInput {
                user: user.identity.clone(),
                arm_ids: vec![arm.id],
                comment: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRevokeArms);
    assert_eq!(err.severity_class(), 409);
}

#[tokio::test]
async fn test_approved_grant_cannot_be_rejected() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (_, admin_session) = ctx.seed_admin("root@site.org").await;
    let (user, session) = ctx.register_user("jane@site.org").await;
    ctx.request(&session, &[arm.id]).await.unwrap();

    let review = ReviewInput {
        user: user.identity.clone(),
        arm_ids: vec![arm.id],
        comment: None,
    };
    ctx.engine
        .approve_access(&admin_session, review.clone())
        .await
        .unwrap();

    let err = ctx
        .engine
        .reject_access(&admin_session, review)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidReviewArms);
}

#[tokio::test]
async fn test_revoking_the_last_approval_deactivates_the_member() {
    let ctx = TestContext::new();
    let arm_a = ctx.seed_arm("Genomics").await;
    let arm_b = ctx.seed_arm("Imaging").await;
    let (_, admin_session) = ctx.seed_admin("root@site.org").await;
    let (user, session) = ctx.register_user("jane@site.org").await;
    ctx.request(&session, &[arm_a.id, arm_b.id]).await.unwrap();

    ctx.engine
        .approve_access(
            &admin_session,
            ReviewInput {
                user: user.identity.clone(),
                arm_ids: vec![arm_a.id, arm_b.id],
                comment: None,
            },
        )
        .await
        .unwrap();

    // Revoking one of two approvals keeps the user active.
    ctx.engine
        .revoke_access(
            &admin_session,
            ReviewInput {
                user: user.identity.clone(),
                arm_ids: vec![arm_a.id],
                comment: None,
            },
        )
        .await
        .unwrap();
    let mid = ctx.repo.find_user(&user.identity).await.unwrap().unwrap();
    assert_eq!(mid.status, UserStatus::Active);

    // Revoking the last one flips them to inactive; membership is kept.
    ctx.engine
        .revoke_access(
            &admin_session,
            ReviewInput {
                user: user.identity.clone(),
                arm_ids: vec![arm_b.id],
                comment: None,
            },
        )
        .await
        .unwrap();
    let after = ctx.repo.find_user(&user.identity).await.unwrap().unwrap();
    assert_eq!(after.status, UserStatus::Inactive);
    assert_eq!(after.role, Role::Member);
}

#[tokio::test]
async fn test_re_request_after_rejection_gets_a_fresh_grant() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (_, admin_session) = ctx.seed_admin("root@site.org").await;
    let (user, session) = ctx.register_user("jane@site.org").await;

    let first = ctx.request(&session, &[arm.id]).await.unwrap();
    ctx.engine
        .reject_access(
            &admin_session,
            ReviewInput {
                user: user.identity.clone(),
                arm_ids: vec![arm.id],
                comment: Some("no".to_string()),
            },
        )
        .await
        .unwrap();

    let second = ctx.request(&session, &[arm.id]).await.unwrap();
    assert_ne!(second[0].id, first[0].id);
    assert_ne!(second[0].request_id, first[0].request_id);
    assert_eq!(second[0].status, GrantStatus::Requested);
    assert!(second[0].comment.is_none(), "no review history carried over");

    // The superseded grant survives detached, not deleted.
    let detached = ctx.repo.detached_grants().await;
    assert_eq!(detached.len(), 1);
    assert_eq!(detached[0].status, GrantStatus::Rejected);
}

#[tokio::test]
async fn test_re_request_of_a_live_arm_is_rejected() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (_, session) = ctx.register_user("jane@site.org").await;
    ctx.request(&session, &[arm.id]).await.unwrap();

    let err = ctx.request(&session, &[arm.id]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequestArm);
}

#[tokio::test]
async fn test_failed_request_leaves_profile_untouched() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (user, session) = ctx.register_user("jane@site.org").await;
    ctx.request(&session, &[arm.id]).await.unwrap();

    // Re-requesting a live-held arm voids the batch before any side effect,
    // including the profile update bundled with the request.
    let err = ctx
        .engine
        .request_access(
            &session,
            RequestAccessInput {
                arm_ids: vec![arm.id],
                profile: Some(ProfileUpdate {
                    organization: Some("Broad".to_string()),
                    ..Default::default()
                }),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequestArm);

    let after = ctx.repo.find_user(&user.identity).await.unwrap().unwrap();
    assert_eq!(after.organization, "");
}

#[tokio::test]
async fn test_review_of_unknown_user() {
    let ctx = TestContext::new();
    let (_, admin_session) = ctx.seed_admin("root@site.org").await;

    let err = ctx
        .engine
        .approve_access(
            &admin_session,
            ReviewInput {
                user: Identity::new("ghost@site.org", "google"),
                arm_ids: vec![ArmId::new()],
                comment: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UserNotFound);
    assert_eq!(err.severity_class(), 400);
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_the_operation() {
    let ctx = TestContext::with_failing_notifier();
    let arm = ctx.seed_arm("Genomics").await;
    let (_, session) = ctx.register_user("jane@site.org").await;

    let grants = ctx.request(&session, &[arm.id]).await.unwrap();
    assert_eq!(grants.len(), 1);
    assert!(ctx.notifier.count().await > 0, "send was attempted");
}

#[tokio::test]
async fn test_edit_user_demoting_an_admin_forces_member() {
    let ctx = TestContext::new();
    let (_, root_session) = ctx.seed_admin("root@site.org").await;
    let (target, _) = ctx.seed_admin("second@site.org").await;

    let updated = ctx
        .engine
        .edit_user(
            &root_session,
            EditUserInput {
                user: target.identity.clone(),
                role: Some(Role::NonMember),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // The requested replacement role is ignored: demotion lands on member,
    // with status recomputed from approved grants (none here).
    assert_eq!(updated.role, Role::Member);
    assert_eq!(updated.status, UserStatus::Inactive);
}

#[tokio::test]
async fn test_edit_user_demotion_overrides_requested_status() {
    let ctx = TestContext::new();
    let (_, root_session) = ctx.seed_admin("root@site.org").await;
    let (target, _) = ctx.seed_admin("second@site.org").await;

    let updated = ctx
        .engine
        .edit_user(
            &root_session,
            EditUserInput {
                user: target.identity.clone(),
                role: Some(Role::Member),
                status: Some(UserStatus::Active),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // A status supplied alongside the demotion does not stick: with no
    // approved grants the recomputed status is inactive.
    assert_eq!(updated.role, Role::Member);
    assert_eq!(updated.status, UserStatus::Inactive);
}

#[tokio::test]
async fn test_edit_user_requires_admin() {
    let ctx = TestContext::new();
    let (user, session) = ctx.register_user("jane@site.org").await;

    let err = ctx
        .engine
        .edit_user(
            &session,
            EditUserInput {
                user: user.identity.clone(),
                first_name: Some("Janet".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthorized);
}

#[tokio::test]
async fn test_access_list_returns_caller_record_and_grants() {
    let ctx = TestContext::new();
    let arm = ctx.seed_arm("Genomics").await;
    let (user, session) = ctx.register_user("jane@site.org").await;
    ctx.request(&session, &[arm.id]).await.unwrap();

    let (listed, grants) = ctx.engine.access_list(&session).await.unwrap();
    assert_eq!(listed.id, user.id);
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].arm_id, arm.id);
}

#[tokio::test]
async fn test_access_list_for_unknown_identity() {
    let ctx = TestContext::new();
    let session = SessionContext::new("ghost@site.org", "google");

    let err = ctx.engine.access_list(&session).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UserNotFound);
}

#[tokio::test]
async fn test_request_approve_revoke_re_request_round() {
    let ctx = TestContext::new();
    let arm_a = ctx.seed_arm("Genomics").await;
    let arm_b = ctx.seed_arm("Imaging").await;
    let (_, admin_session) = ctx.seed_admin("root@site.org").await;
    let (user, session) = ctx.register_user("jane@site.org").await;

    // Both grants share one request id.
    let requested = ctx.request(&session, &[arm_a.id, arm_b.id]).await.unwrap();
    assert_eq!(requested.len(), 2);
    assert_eq!(requested[0].request_id, requested[1].request_id);

    // Approving A promotes the user; B stays requested.
    let grants = ctx
        .engine
        .approve_access(
            &admin_session,
            ReviewInput {
                user: user.identity.clone(),
                arm_ids: vec![arm_a.id],
                comment: None,
            },
        )
        .await
        .unwrap();
    let b = grants.iter().find(|g| g.arm_id == arm_b.id).unwrap();
    assert_eq!(b.status, GrantStatus::Requested);
    let mid = ctx.repo.find_user(&user.identity).await.unwrap().unwrap();
    assert_eq!(mid.role, Role::Member);
    assert_eq!(mid.status, UserStatus::Active);

    // Revoking A leaves no approvals: status drops to inactive.
    ctx.engine
        .revoke_access(
            &admin_session,
            ReviewInput {
                user: user.identity.clone(),
                arm_ids: vec![arm_a.id],
                comment: None,
            },
        )
        .await
        .unwrap();
    let after = ctx.repo.find_user(&user.identity).await.unwrap().unwrap();
    assert_eq!(after.status, UserStatus::Inactive);

    // Re-requesting A detaches the revoked grant and files a fresh one.
    let fresh = ctx.request(&session, &[arm_a.id]).await.unwrap();
    assert_ne!(fresh[0].request_id, requested[0].request_id);
    assert_eq!(fresh[0].status, GrantStatus::Requested);
    let detached = ctx.repo.detached_grants().await;
    assert_eq!(detached.len(), 1);
    assert_eq!(detached[0].status, GrantStatus::Revoked);
}

#[tokio::test]
async fn test_session_identity_is_normalized_before_lookup() {
    let ctx = TestContext::new();
    let (user, _) = ctx.register_user("jane@site.org").await;

    let shouty = SessionContext::new("JANE@SITE.ORG", "Google");
    let (listed, _) = ctx.engine.access_list(&shouty).await.unwrap();
    assert_eq!(listed.id, user.id);
}
