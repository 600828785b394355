//! Permission module using Casbin
//!
//! RBAC over staff accounts: every profile is grouped under its role, roles
//! carry a fixed permission set, and `user_permission` rows add per-user
//! grants on top.

use casbin::{CoreApi, DefaultModel, Enforcer, MgmtApi};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::entity::profile::{self, Role};
use crate::entity::user_permission;

const MODEL: &str = r#"
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[role_definition]
g = _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = g(r.sub, p.sub) && r.obj == p.obj && r.act == p.act
"#;

/// Permission constants
pub mod perm {
    pub const ORDERS: &str = "orders";
    pub const CATALOG: &str = "catalog";
    pub const TABLES: &str = "tables";
    pub const CUSTOMERS: &str = "customers";
    pub const SUPPLIERS: &str = "suppliers";
    pub const INVENTORY: &str = "inventory";
    pub const COUPONS: &str = "coupons";
    pub const USERS: &str = "users";
    pub const SETTINGS: &str = "settings";

    /// All permissions
    pub const ALL: [&str; 9] = [
        ORDERS, CATALOG, TABLES, CUSTOMERS, SUPPLIERS, INVENTORY, COUPONS, USERS, SETTINGS,
    ];

    pub fn is_known(name: &str) -> bool {
        ALL.contains(&name)
    }
}

/// Action constants
pub mod action {
    pub const ACCESS: &str = "access";
}

/// Permissions every member of `role` gets
pub fn role_permissions(role: Role) -> &'static [&'static str] {
    use perm::*;
    match role {
        Role::Admin => &ALL,
        Role::Manager => &[ORDERS, CATALOG, TABLES, CUSTOMERS, SUPPLIERS, INVENTORY, COUPONS],
        Role::Cashier => &[ORDERS, TABLES, CUSTOMERS, COUPONS],
        Role::Waiter => &[ORDERS, TABLES],
        Role::Kitchen => &[ORDERS, INVENTORY],
    }
}

/// Role name prefix to distinguish from usernames
const ROLE_PREFIX: &str = "role:";

fn role_subject(role: Role) -> String {
    format!("{}{}", ROLE_PREFIX, role.as_str())
}

/// Casbin policy rows derived from accounts and grants
#[derive(Debug, Default, PartialEq)]
pub struct PolicySet {
    pub policies: Vec<Vec<String>>,
    pub groupings: Vec<Vec<String>>,
}

impl PolicySet {
    pub fn build(profiles: &[profile::Model], grants: &[user_permission::Model]) -> Self {
        let mut set = PolicySet::default();

        for role in Role::ALL {
            for p in role_permissions(role) {
                set.policies.push(vec![
                    role_subject(role),
                    p.to_string(),
                    action::ACCESS.to_string(),
                ]);
            }
        }

        let mut usernames = HashMap::new();
        for profile in profiles.iter().filter(|p| p.active) {
            usernames.insert(profile.id, profile.username.as_str());
            match Role::parse(&profile.role) {
                Some(role) => set
                    .groupings
                    .push(vec![profile.username.clone(), role_subject(role)]),
                None => tracing::warn!(
                    "User {} has unknown role {:?}",
                    profile.username,
                    profile.role
                ),
            }
        }

        for grant in grants {
            if let Some(username) = usernames.get(&grant.user_id) {
                set.policies.push(vec![
                    username.to_string(),
                    grant.permission.clone(),
                    action::ACCESS.to_string(),
                ]);
            }
        }

        set
    }
}

/// Permission enforcer wrapper
#[derive(Clone)]
pub struct PermissionEnforcer {
    enforcer: Arc<RwLock<Enforcer>>,
    db: Arc<DatabaseConnection>,
}

impl PermissionEnforcer {
    pub async fn new(db: Arc<DatabaseConnection>) -> anyhow::Result<Self> {
        let enforcer = new_enforcer().await?;

        let perm_enforcer = Self {
            enforcer: Arc::new(RwLock::new(enforcer)),
            db,
        };
        perm_enforcer.load_policies().await?;

        Ok(perm_enforcer)
    }

    /// Rebuild every policy from the profile and grant tables
    pub async fn load_policies(&self) -> anyhow::Result<()> {
        let profiles = profile::Entity::find().all(&*self.db).await?;
        let grants = user_permission::Entity::find().all(&*self.db).await?;
        let set = PolicySet::build(&profiles, &grants);

        let mut enforcer = self.enforcer.write().await;
        apply(&mut enforcer, set).await?;

        tracing::debug!("Loaded permissions for {} users", profiles.len());
        Ok(())
    }

    /// Get all permissions for a user
    pub async fn get_user_permissions(&self, user: &str) -> Vec<String> {
        let enforcer = self.enforcer.read().await;
        user_permissions(&enforcer, user)
    }

    /// Replace a user's extra grants
    pub async fn set_user_permissions(
        &self,
        user_id: i64,
        permissions: &[String],
    ) -> anyhow::Result<()> {
        if let Some(unknown) = permissions.iter().find(|p| !perm::is_known(p)) {
            anyhow::bail!("unknown permission: {}", unknown);
        }

        let txn = self.db.begin().await?;
        replace_grants(&txn, user_id, permissions).await?;
        txn.commit().await?;

        self.load_policies().await
    }
}

async fn new_enforcer() -> anyhow::Result<Enforcer> {
    let model = DefaultModel::from_str(MODEL).await?;
    Ok(Enforcer::new(model, ()).await?)
}

async fn apply(enforcer: &mut Enforcer, set: PolicySet) -> anyhow::Result<()> {
    enforcer.clear_policy().await?;
    for policy in set.policies {
        let _ = enforcer.add_policy(policy).await;
    }
    for grouping in set.groupings {
        let _ = enforcer.add_grouping_policy(grouping).await;
    }
    Ok(())
}

fn user_permissions(enforcer: &Enforcer, user: &str) -> Vec<String> {
    perm::ALL
        .iter()
        .filter(|p| enforcer.enforce((user, **p, action::ACCESS)).unwrap_or(false))
        .map(|p| p.to_string())
        .collect()
}

async fn replace_grants<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    permissions: &[String],
) -> Result<(), sea_orm::DbErr> {
    user_permission::Entity::delete_many()
        .filter(user_permission::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    let mut rows: Vec<user_permission::ActiveModel> = Vec::new();
    for p in permissions {
        rows.push(user_permission::ActiveModel {
            user_id: Set(user_id),
            permission: Set(p.clone()),
            ..Default::default()
        });
    }
    if !rows.is_empty() {
        user_permission::Entity::insert_many(rows).exec(db).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: i64, username: &str, role: &str, active: bool) -> profile::Model {
        profile::Model {
            id,
            username: username.to_string(),
            password: String::new(),
            full_name: username.to_string(),
            email: None,
            role: role.to_string(),
            active,
            last_login: 0,
            created_at: 0,
        }
    }

    fn grant(user_id: i64, permission: &str) -> user_permission::Model {
        user_permission::Model {
            id: 0,
            user_id,
            permission: permission.to_string(),
        }
    }

    async fn enforcer_for(set: PolicySet) -> Enforcer {
        let mut e = new_enforcer().await.unwrap();
        apply(&mut e, set).await.unwrap();
        e
    }

    #[test]
    fn test_role_defaults() {
        assert_eq!(role_permissions(Role::Admin).len(), perm::ALL.len());
        assert!(!role_permissions(Role::Manager).contains(&perm::USERS));
        assert!(role_permissions(Role::Kitchen).contains(&perm::INVENTORY));
        for role in Role::ALL {
            assert!(role_permissions(role).contains(&perm::ORDERS));
        }
    }

    #[test]
    fn test_policy_set_skips_inactive_users() {
        let profiles = vec![
            profile(1, "ana", "waiter", true),
            profile(2, "old", "manager", false),
            profile(3, "odd", "janitor", true),
        ];
        let grants = vec![grant(1, perm::COUPONS), grant(2, perm::USERS)];
        let set = PolicySet::build(&profiles, &grants);

        assert_eq!(set.groupings, vec![vec!["ana".to_string(), "role:waiter".to_string()]]);
        assert!(set.policies.iter().any(|p| p[0] == "ana" && p[1] == perm::COUPONS));
        assert!(!set.policies.iter().any(|p| p[0] == "old"));
    }

    #[tokio::test]
    async fn test_role_and_grant_enforcement() {
        let profiles = vec![
            profile(1, "ana", "waiter", true),
            profile(2, "boss", "admin", true),
        ];
        let grants = vec![grant(1, perm::CUSTOMERS)];
        let e = enforcer_for(PolicySet::build(&profiles, &grants)).await;

        assert_eq!(
            user_permissions(&e, "ana"),
            vec![perm::ORDERS, perm::TABLES, perm::CUSTOMERS]
        );
        assert_eq!(user_permissions(&e, "boss").len(), perm::ALL.len());
        assert!(user_permissions(&e, "nobody").is_empty());
    }
}
