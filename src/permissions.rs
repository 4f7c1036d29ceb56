use crate::error::{Result, TravcamError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Capabilities the host must grant before the camera is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Camera,
    Microphone,
    Storage,
}

pub const REQUIRED_PERMISSIONS: [Permission; 3] = [
    Permission::Camera,
    Permission::Microphone,
    Permission::Storage,
];

/// Host-side permission negotiation
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Subset of `required` that is not granted
    async fn missing(&self, required: &[Permission]) -> Vec<Permission>;
}

/// Fail with `PermissionDenied` unless every required permission is granted
pub async fn ensure_permissions(gate: &dyn PermissionGate) -> Result<()> {
    let missing = gate.missing(&REQUIRED_PERMISSIONS).await;
    if missing.is_empty() {
        debug!("All camera permissions granted");
        Ok(())
    } else {
        warn!("Camera permissions missing: {:?}", missing);
        Err(TravcamError::PermissionDenied { missing })
    }
}

/// Gate for hosts without a permission model
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantedPermissions;

#[async_trait]
impl PermissionGate for GrantedPermissions {
    async fn missing(&self, _required: &[Permission]) -> Vec<Permission> {
        Vec::new()
    }
}

/// Gate with a fixed set of granted permissions
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    granted: HashSet<Permission>,
}

impl StaticPermissions {
    pub fn new<I: IntoIterator<Item = Permission>>(granted: I) -> Self {
        Self {
            granted: granted.into_iter().collect(),
        }
    }
}

#[async_trait]
impl PermissionGate for StaticPermissions {
    async fn missing(&self, required: &[Permission]) -> Vec<Permission> {
        required
            .iter()
            .copied()
            .filter(|permission| !self.granted.contains(permission))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_granted() {
        assert!(ensure_permissions(&GrantedPermissions).await.is_ok());
        let gate = StaticPermissions::new(REQUIRED_PERMISSIONS);
        assert!(ensure_permissions(&gate).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_permissions_are_reported() {
        let gate = StaticPermissions::new([Permission::Camera]);
        match ensure_permissions(&gate).await {
            Err(TravcamError::PermissionDenied { missing }) => {
                assert_eq!(missing, vec![Permission::Microphone, Permission::Storage]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
