//! Repository resolver.
//!
//! Unlike the network resolvers this one probes the repository path directly:
//! a "not found" answer triggers creation, anything else aborts.

use tracing::info;

use super::Resolved;
use crate::clients::{CreateRepositoryDetails, RegistryApi, Repository};
use crate::error::{BootstrapError, Result, Stage};

pub async fn ensure_repository<A: RegistryApi + ?Sized>(
    api: &A,
    tenant_name: &str,
    repository_name: &str,
) -> Result<Resolved<Repository>> {
    let repository = Repository {
        tenant_name: tenant_name.to_string(),
        name: repository_name.to_string(),
    };

    match api.get_repository(tenant_name, repository_name).await {
        Ok(()) => Ok(Resolved::Found(repository)),
        Err(e) if e.is_not_found() => {
            api.create_repository(
                tenant_name,
                repository_name,
                &CreateRepositoryDetails { is_public: true },
            )
            .await
            .map_err(|e| BootstrapError::provision(Stage::Repository, "failed to create repo", e))?;
            info!(tenant = tenant_name, repository = repository_name, "Created repository");
            Ok(Resolved::Created(repository))
        }
        Err(e) => Err(BootstrapError::provision(
            Stage::Repository,
            "failed to look up repo",
            e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::test_util::{FakeCloud, Op};

    #[tokio::test]
    async fn existing_repository_is_not_recreated() {
        let cloud = FakeCloud::new();
        cloud.seed_repository("acme", "r1");

        let resolved = ensure_repository(&cloud, "acme", "r1").await.unwrap();
        assert!(!resolved.created());
        assert_eq!(cloud.calls(Op::CreateRepository), 0);
    }

    #[tokio::test]
    async fn not_found_creates_public_repository() {
        let cloud = FakeCloud::new();

        let resolved = ensure_repository(&cloud, "acme", "r1").await.unwrap();
        assert!(resolved.created());
        assert_eq!(cloud.calls(Op::CreateRepository), 1);
        assert_eq!(cloud.repository_visibility("acme", "r1"), Some(true));
    }

    #[tokio::test]
    async fn other_probe_errors_abort() {
        let cloud = FakeCloud::new();
        cloud.fail(
            Op::GetRepository,
            ApiError::service(401, "NotAuthenticated", "bad signature"),
        );

        let err = ensure_repository(&cloud, "acme", "r1").await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Repository));
        assert_eq!(cloud.calls(Op::CreateRepository), 0);
    }

    #[tokio::test]
    async fn transport_errors_abort() {
        let cloud = FakeCloud::new();
        cloud.fail(Op::GetRepository, ApiError::Transport("dns".to_string()));

        assert!(ensure_repository(&cloud, "acme", "r1").await.is_err());
        assert_eq!(cloud.calls(Op::CreateRepository), 0);
    }
}
