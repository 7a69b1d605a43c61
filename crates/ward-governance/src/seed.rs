//! Idempotent startup seeding.
//!
//! Run on every boot: creates the initial administrator account and the
//! requestable arms when missing, and leaves existing records untouched, so
//! repeated startups converge on the same state.

use tracing::{info, instrument};
use ward_core::{ArmId, Identity, Role, UserStatus};

use crate::error::Result;
use crate::store::{CreateUserRecord, GrantRepository};
use crate::types::{Arm, User};

/// Declarative description of an arm to seed.
#[derive(Debug, Clone)]
pub struct ArmSeed {
    pub name: String,
    pub acronym: String,
}

/// Ensure the initial administrator exists.
///
/// Returns the existing record unchanged when the identity is already
/// registered, regardless of its current role or status.
#[instrument(skip(repo), fields(email = %identity.email))]
pub async fn seed_initial_admin(
    repo: &dyn GrantRepository,
    identity: Identity,
    first_name: &str,
    last_name: &str,
) -> Result<User> {
    if let Some(existing) = repo.find_user(&identity).await? {
        return Ok(existing);
    }
    let admin = repo
        .create_user(CreateUserRecord {
            identity,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            organization: String::new(),
            role: Role::Admin,
            status: UserStatus::Active,
        })
        .await?;
    info!(user_id = %admin.id, "seeded initial administrator");
    Ok(admin)
}

/// Ensure every listed arm exists, matching by name.
///
/// Returns the arms created this run; arms already present are skipped.
#[instrument(skip(repo, seeds))]
pub async fn seed_arms(repo: &dyn GrantRepository, seeds: &[ArmSeed]) -> Result<Vec<Arm>> {
    let existing = repo.list_arms().await?;
    let mut created = Vec::new();
    for seed in seeds {
        if existing.iter().any(|arm| arm.name == seed.name) {
            continue;
        }
        let arm = repo
            .create_arm(Arm {
                id: ArmId::new(),
                name: seed.name.clone(),
                acronym: seed.acronym.clone(),
            })
            .await?;
        created.push(arm);
    }
    if !created.is_empty() {
        info!(count = created.len(), "seeded arms");
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryGrantRepository;

    #[tokio::test]
    async fn test_admin_seeding_is_idempotent() {
        let repo = InMemoryGrantRepository::new();
        let identity = Identity::new("admin@site.org", "google");

        let first = seed_initial_admin(&repo, identity.clone(), "Ada", "Admin")
            .await
            .unwrap();
        assert_eq!(first.role, Role::Admin);
        assert_eq!(first.status, UserStatus::Active);

        let second = seed_initial_admin(&repo, identity, "Other", "Name")
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.first_name, "Ada", "existing record untouched");
    }

    #[tokio::test]
    async fn test_arm_seeding_skips_existing_names() {
        let repo = InMemoryGrantRepository::new();
        let seeds = vec![
            ArmSeed {
                name: "Genomics Cohort".to_string(),
                acronym: "GC".to_string(),
            },
            ArmSeed {
                name: "Imaging Cohort".to_string(),
                acronym: "IC".to_string(),
            },
        ];

        let first = seed_arms(&repo, &seeds).await.unwrap();
        assert_eq!(first.len(), 2);

        let second = seed_arms(&repo, &seeds).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(repo.list_arms().await.unwrap().len(), 2);
    }
}
