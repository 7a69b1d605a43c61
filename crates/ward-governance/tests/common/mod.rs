//! Shared test fixtures for the lifecycle suites.

use std::sync::Arc;

use ward_core::{ArmId, Identity, Role, UserStatus};
use ward_governance::notify::RecordingDispatcher;
use ward_governance::{
    seed_initial_admin, Arm, ArmSeed, AuditStore, EngineConfig, GrantRepository,
    InMemoryAuditStore, InMemoryGrantRepository, LifecycleEngine, NotificationDispatcher,
    RegisterUserInput, RequestAccessInput, SessionContext, User,
};

/// Engine plus handles to its in-memory stores.
pub struct TestContext {
    pub engine: LifecycleEngine,
    pub repo: Arc<InMemoryGrantRepository>,
    pub audit: Arc<InMemoryAuditStore>,
    pub notifier: Arc<RecordingDispatcher>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(RecordingDispatcher::new()))
    }

    pub fn with_failing_notifier() -> Self {
        Self::with_notifier(Arc::new(RecordingDispatcher::failing()))
    }

    fn with_notifier(notifier: Arc<RecordingDispatcher>) -> Self {
        let repo = Arc::new(InMemoryGrantRepository::new());
        let audit = Arc::new(InMemoryAuditStore::new());
        let engine = LifecycleEngine::new(
            Arc::clone(&repo) as Arc<dyn GrantRepository>,
            Arc::clone(&audit) as Arc<dyn AuditStore>,
            Arc::clone(&notifier) as Arc<dyn NotificationDispatcher>,
            EngineConfig::default(),
        );
        Self {
            engine,
            repo,
            audit,
            notifier,
        }
    }

    /// Seed one requestable arm.
    pub async fn seed_arm(&self, name: &str) -> Arm {
        let created = ward_governance::seed_arms(
            self.repo.as_ref(),
            &[ArmSeed {
                name: name.to_string(),
                acronym: name.chars().take(2).collect::<String>().to_uppercase(),
            }],
        )
        .await
        .expect("seed arm");
        created.into_iter().next().expect("arm created")
    }

    /// Seed the reviewing administrator and return their session.
    pub async fn seed_admin(&self, email: &str) -> (User, SessionContext) {
        let identity = Identity::new(email, "google");
        let admin = seed_initial_admin(self.repo.as_ref(), identity, "Ada", "Admin")
            .await
            .expect("seed admin");
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.status, UserStatus::Active);
        (admin, SessionContext::new(email, "google"))
    }

    /// Register a plain user with no initial arm request.
    pub async fn register_user(&self, email: &str) -> (User, SessionContext) {
        let session = SessionContext::new(email, "google");
        let user = self
            .engine
            .register_user(
                &session,
                RegisterUserInput {
                    first_name: "Jane".to_string(),
                    last_name: "Doe".to_string(),
                    organization: String::new(),
                    requested_role: None,
                    arm_ids: Vec::new(),
                },
            )
            .await
            .expect("register user");
        (user, session)
    }

    /// File an access request for the given arms.
    pub async fn request(
        &self,
        session: &SessionContext,
        arm_ids: &[ArmId],
    ) -> ward_governance::Result<Vec<ward_governance::AccessGrant>> {
        self.engine
            .request_access(
                session,
                RequestAccessInput {
                    arm_ids: arm_ids.to_vec(),
                    profile: None,
                },
            )
            .await
    }
}
