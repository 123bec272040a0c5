//! 服务层集成测试（需要 PostgreSQL，运行：cargo test -- --ignored）

use fleet_fuel::{
    error::AppError,
    models::{
        audit::AuditLogFilters,
        machine::{CreateMachineRequest, MachineListQuery, UpdateMachineRequest},
        operator::CreateOperatorRequest,
        refuel::{CreateRefuelRequest, RefuelListQuery, VariancePreviewRequest},
        role::{Action, Resource, Role},
        settings::UpdateSettingsRequest,
        user::{CreateUserRequest, UpdateUserRequest, User},
    },
    repository::user_repo::UserRepository,
    services::permission_service::is_allowed,
};
use serial_test::serial;
use uuid::Uuid;

mod common;
use common::{create_test_user, setup_test_db, ADMIN_PASSWORD};

fn machine_request(id: &str, rate: f64) -> CreateMachineRequest {
    CreateMachineRequest {
        id: id.to_string(),
        model: "CAT 320".to_string(),
        rate,
        capacity: 400.0,
    }
}

fn operator_request(name: &str, badge: &str) -> CreateOperatorRequest {
    CreateOperatorRequest {
        name: name.to_string(),
        badge: badge.to_string(),
    }
}

fn refuel_request(machine_id: &str, operator_id: Uuid, usage: f64, fuel: f64) -> CreateRefuelRequest {
    CreateRefuelRequest {
        machine_id: machine_id.to_string(),
        operator_id,
        usage,
        fuel,
        notes: None,
        refueled_at: None,
    }
}

fn user_request(username: &str, role: &str) -> CreateUserRequest {
    CreateUserRequest {
        username: username.to_string(),
        password: "Clerk12345".to_string(),
        full_name: "Data Clerk".to_string(),
        email: None,
        role: role.to_string(),
        permissions: None,
    }
}

fn role_change(role: &str) -> UpdateUserRequest {
    UpdateUserRequest {
        role: Some(role.to_string()),
        ..Default::default()
    }
}

async fn count(state: &fleet_fuel::middleware::AppState, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(&state.db).await.unwrap()
}

async fn audit_entries(
    state: &fleet_fuel::middleware::AppState,
    entity_type: &str,
    entity_id: &str,
) -> Vec<fleet_fuel::models::audit::AuditLog> {
    state
        .audit_service
        .query_logs(&AuditLogFilters {
            entity_type: Some(entity_type.to_string()),
            entity_id: Some(entity_id.to_string()),
            limit: 50,
            ..Default::default()
        })
        .await
        .unwrap()
}

async fn admin(state: &fleet_fuel::middleware::AppState) -> User {
    create_test_user(state, "admin", ADMIN_PASSWORD, Role::Admin, None).await
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_duplicate_badge_writes_nothing() {
    let state = setup_test_db().await;
    let admin = admin(&state).await;

    let first = state
        .operator_service
        .create(&admin, operator_request("Jane Doe", "B-100"))
        .await
        .unwrap();

    let err = state
        .operator_service
        .create(&admin, operator_request("John Roe", " B-100 "))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM operators WHERE badge = 'B-100'")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let creates: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs WHERE entity_type = 'operators'")
            .fetch_one(&state.db)
            .await
            .unwrap();
    assert_eq!(creates, 1);
    assert_eq!(audit_entries(&state, "operators", &first.id.to_string()).await.len(), 1);
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_each_write_has_exactly_one_audit_entry() {
    let state = setup_test_db().await;
    let admin = admin(&state).await;

    let machine = state
        .machine_service
        .create(&admin, machine_request(" ex-001 ", 10.0))
        .await
        .unwrap();
    assert_eq!(machine.id, "EX-001");

    let logs = audit_entries(&state, "machines", "EX-001").await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].actor_id, admin.id);
    assert_eq!(logs[0].actor_name, admin.username);
    assert_eq!(logs[0].action, "create");

    state
        .machine_service
        .update(
            &admin,
            "ex-001",
            UpdateMachineRequest {
                rate: Some(12.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let logs = audit_entries(&state, "machines", "EX-001").await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action, "update");
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_soft_deleted_machine_keeps_history() {
    let state = setup_test_db().await;
    let admin = admin(&state).await;

    state
        .machine_service
        .create(&admin, machine_request("EX-001", 10.0))
        .await
        .unwrap();
    let operator = state
        .operator_service
        .create(&admin, operator_request("Jane Doe", "B-100"))
        .await
        .unwrap();
    let refuel = state
        .refuel_service
        .create(&admin, refuel_request("EX-001", operator.id, 10.0, 120.0))
        .await
        .unwrap();
    assert!(refuel.variance.is_anomaly);

    state
        .machine_service
        .deactivate(&admin, "EX-001", ADMIN_PASSWORD)
        .await
        .unwrap();

    let active = state
        .machine_service
        .list(&admin, &MachineListQuery::default())
        .await
        .unwrap();
    assert!(active.iter().all(|m| m.id != "EX-001"));

    let all = state
        .machine_service
        .list(&admin, &MachineListQuery { include_inactive: true })
        .await
        .unwrap();
    assert!(all.iter().any(|m| m.id == "EX-001"));

    let history = state
        .refuel_service
        .list(&admin, &RefuelListQuery::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].entry.machine_model, "CAT 320");
    assert_eq!(history[0].entry.machine_rate, 10.0);
    assert_eq!(history[0].variance.variance_pct, Some(20.0));

    // 停用后不能再记录加油
    let err = state
        .refuel_service
        .create(&admin, refuel_request("EX-001", operator.id, 5.0, 50.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_wrong_admin_password_blocks_delete() {
    let state = setup_test_db().await;
    let admin = admin(&state).await;
    let manager = create_test_user(&state, "manager", "Manager123", Role::Manager, None).await;

    state
        .machine_service
        .create(&admin, machine_request("EX-001", 10.0))
        .await
        .unwrap();

    // 管理者自己的密码不能代替管理员密码
    let err = state
        .machine_service
        .deactivate(&manager, "EX-001", "Manager123")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ReauthenticationFailed));

    let machine = state.machine_service.get(&admin, "EX-001").await.unwrap();
    assert!(machine.status.is_active());
    assert_eq!(audit_entries(&state, "machines", "EX-001").await.len(), 1);

    // 任一启用的管理员密码都可以
    state
        .machine_service
        .deactivate(&manager, "EX-001", ADMIN_PASSWORD)
        .await
        .unwrap();
    let logs = audit_entries(&state, "machines", "EX-001").await;
    assert_eq!(logs[0].action, "delete");
    assert_eq!(logs[0].actor_id, manager.id);
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_refuel_requires_existing_machine_and_operator() {
    let state = setup_test_db().await;
    let admin = admin(&state).await;

    state
        .machine_service
        .create(&admin, machine_request("EX-001", 10.0))
        .await
        .unwrap();
    let operator = state
        .operator_service
        .create(&admin, operator_request("Jane Doe", "B-100"))
        .await
        .unwrap();

    let err = state
        .refuel_service
        .create(&admin, refuel_request("NOPE-1", operator.id, 10.0, 100.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ReferentialIntegrity(_)));

    let err = state
        .refuel_service
        .create(&admin, refuel_request("EX-001", Uuid::new_v4(), 10.0, 100.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ReferentialIntegrity(_)));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM refuels")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_refuel_hard_delete() {
    let state = setup_test_db().await;
    let admin = admin(&state).await;

    state
        .machine_service
        .create(&admin, machine_request("EX-001", 10.0))
        .await
        .unwrap();
    let operator = state
        .operator_service
        .create(&admin, operator_request("Jane Doe", "B-100"))
        .await
        .unwrap();
    let refuel = state
        .refuel_service
        .create(&admin, refuel_request("EX-001", operator.id, 10.0, 100.0))
        .await
        .unwrap();

    state
        .refuel_service
        .delete(&admin, refuel.entry.id, ADMIN_PASSWORD)
        .await
        .unwrap();

    let err = state
        .refuel_service
        .get(&admin, refuel.entry.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let logs = audit_entries(&state, "refuels", &refuel.entry.id.to_string()).await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action, "delete");
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_permission_denied_before_write() {
    let state = setup_test_db().await;
    let viewer = create_test_user(&state, "viewer", "Viewer123", Role::Viewer, None).await;

    let err = state
        .machine_service
        .create(&viewer, machine_request("EX-001", 10.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM machines")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_malformed_override_falls_back_to_role() {
    let state = setup_test_db().await;
    let clerk = create_test_user(&state, "clerk", "Clerk1234", Role::DataEntry, None).await;

    sqlx::query("UPDATE users SET permissions = '\"machines:all\"'::jsonb WHERE id = $1")
        .bind(clerk.id)
        .execute(&state.db)
        .await
        .unwrap();

    let reloaded = UserRepository::new(state.db.clone())
        .find_by_id(clerk.id)
        .await
        .unwrap()
        .unwrap();
    assert!(reloaded.permissions.is_none());
    assert!(is_allowed(Some(&reloaded), Resource::Refuels, Action::Write));
    assert!(!is_allowed(Some(&reloaded), Resource::Refuels, Action::Delete));
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_tolerance_change_applies_to_existing_entries() {
    let state = setup_test_db().await;
    let admin = admin(&state).await;

    state
        .machine_service
        .create(&admin, machine_request("EX-001", 10.0))
        .await
        .unwrap();
    let operator = state
        .operator_service
        .create(&admin, operator_request("Jane Doe", "B-100"))
        .await
        .unwrap();
    state
        .refuel_service
        .create(&admin, refuel_request("EX-001", operator.id, 10.0, 115.0))
        .await
        .unwrap();

    let before = state
        .refuel_service
        .list(&admin, &RefuelListQuery::default())
        .await
        .unwrap();
    assert!(before[0].variance.is_anomaly);

    state
        .settings_service
        .update(
            &admin,
            UpdateSettingsRequest {
                tolerance: Some(20.0),
                company_name: None,
            },
        )
        .await
        .unwrap();

    let after = state
        .refuel_service
        .list(&admin, &RefuelListQuery::default())
        .await
        .unwrap();
    assert!(!after[0].variance.is_anomaly);

    let preview = state
        .refuel_service
        .preview(
            &admin,
            VariancePreviewRequest {
                machine_id: "ex-001".to_string(),
                usage: 10.0,
                fuel: 125.0,
            },
        )
        .await
        .unwrap();
    assert!(preview.result.is_anomaly);
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_login_and_bootstrap() {
    let state = setup_test_db().await;

    let created = state
        .auth_service
        .bootstrap_admin(&state.config.bootstrap)
        .await
        .unwrap()
        .expect("admin should be created");
    let logs = audit_entries(&state, "users", &created.id.to_string()).await;
    assert_eq!(logs[0].action, "system_initialized");

    // 已有管理员时不再创建
    assert!(state
        .auth_service
        .bootstrap_admin(&state.config.bootstrap)
        .await
        .unwrap()
        .is_none());

    let err = state
        .auth_service
        .login(fleet_fuel::models::auth::LoginRequest {
            username: "admin".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));

    let response = state
        .auth_service
        .login(fleet_fuel::models::auth::LoginRequest {
            username: "admin".to_string(),
            password: ADMIN_PASSWORD.to_string(),
        })
        .await
        .unwrap();
    let user = state
        .auth_service
        .authenticate(&response.access_token)
        .await
        .unwrap();
    assert_eq!(user.id, created.id);
    assert!(user.last_login.is_some());

    let logs = audit_entries(&state, "users", &created.id.to_string()).await;
    assert_eq!(logs[0].action, "login");
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_user_writes_are_audited_once_each() {
    let state = setup_test_db().await;
    let admin = admin(&state).await;

    let clerk = state
        .user_service
        .create(&admin, user_request("clerk", "data_entry"))
        .await
        .unwrap();
    let clerk_id = clerk.id.to_string();

    let logs = audit_entries(&state, "users", &clerk_id).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "create");

    let updated = state
        .user_service
        .update(&admin, clerk.id, role_change("viewer"))
        .await
        .unwrap();
    assert_eq!(updated.role, Role::Viewer);

    let logs = audit_entries(&state, "users", &clerk_id).await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action, "update");

    let deactivated = state.user_service.deactivate(&admin, clerk.id).await.unwrap();
    assert!(!deactivated.active);

    let logs = audit_entries(&state, "users", &clerk_id).await;
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[0].action, "delete");
    assert!(logs.iter().all(|log| log.actor_id == admin.id));

    // 停用后仍保留记录
    assert_eq!(count(&state, "SELECT COUNT(*) FROM users WHERE username = 'clerk'").await, 1);
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_duplicate_username_writes_nothing() {
    let state = setup_test_db().await;
    let admin = admin(&state).await;

    state
        .user_service
        .create(&admin, user_request("clerk", "data_entry"))
        .await
        .unwrap();

    let err = state
        .user_service
        .create(&admin, user_request(" clerk ", "viewer"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    assert_eq!(count(&state, "SELECT COUNT(*) FROM users WHERE username = 'clerk'").await, 1);
    assert_eq!(
        count(
            &state,
            "SELECT COUNT(*) FROM audit_logs WHERE entity_type = 'users' AND action = 'create'"
        )
        .await,
        1
    );
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_settings_update_is_audited_once() {
    let state = setup_test_db().await;
    let admin = admin(&state).await;

    let settings = state
        .settings_service
        .update(
            &admin,
            UpdateSettingsRequest {
                tolerance: Some(15.0),
                company_name: Some("Acme Haulage".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(settings.tolerance, 15.0);

    let logs = audit_entries(&state, "settings", &settings.id).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "update");
    assert_eq!(logs[0].actor_id, admin.id);
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_operator_deactivate_is_audited_once() {
    let state = setup_test_db().await;
    let admin = admin(&state).await;

    let operator = state
        .operator_service
        .create(&admin, operator_request("Jane Doe", "B-100"))
        .await
        .unwrap();

    let deactivated = state
        .operator_service
        .deactivate(&admin, operator.id, ADMIN_PASSWORD)
        .await
        .unwrap();
    assert_eq!(deactivated.id, operator.id);

    let logs = audit_entries(&state, "operators", &operator.id.to_string()).await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action, "delete");

    // 重复停用不写审计
    let err = state
        .operator_service
        .deactivate(&admin, operator.id, ADMIN_PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(audit_entries(&state, "operators", &operator.id.to_string()).await.len(), 2);
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_actor_cannot_change_own_role() {
    let state = setup_test_db().await;
    let admin = admin(&state).await;
    let _second = create_test_user(&state, "admin2", ADMIN_PASSWORD, Role::Admin, None).await;

    let err = state
        .user_service
        .update(&admin, admin.id, role_change("viewer"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let reloaded = UserRepository::new(state.db.clone())
        .find_by_id(admin.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.role, Role::Admin);
    assert!(audit_entries(&state, "users", &admin.id.to_string()).await.is_empty());

    // 不改变角色的自我更新仍然允许
    state
        .user_service
        .update(&admin, admin.id, role_change("admin"))
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn test_last_active_admin_cannot_be_removed() {
    let state = setup_test_db().await;
    let admin = admin(&state).await;

    let users_override: fleet_fuel::models::role::PermissionOverride =
        [(Resource::Users, vec![Action::Read, Action::Write, Action::Delete])]
            .into_iter()
            .collect();
    let manager =
        create_test_user(&state, "manager", "Manager123", Role::Manager, Some(users_override)).await;

    let err = state
        .user_service
        .update(&manager, admin.id, role_change("viewer"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = state.user_service.deactivate(&manager, admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    assert_eq!(
        count(&state, "SELECT COUNT(*) FROM users WHERE role = 'admin' AND active").await,
        1
    );
    assert!(audit_entries(&state, "users", &admin.id.to_string()).await.is_empty());

    // 有第二个管理员后允许停用
    let second = create_test_user(&state, "admin2", ADMIN_PASSWORD, Role::Admin, None).await;
    state.user_service.deactivate(&manager, admin.id).await.unwrap();

    let err = state.user_service.deactivate(&manager, second.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    state
        .auth_service
        .verify_admin_password(&manager, ADMIN_PASSWORD)
        .await
        .unwrap();
}
