//! Employee creation spans the user and employee tables in one transaction:
//! both rows exist afterwards, or neither does.

mod common;

use assert_matches::assert_matches;
use common::TestApp;
use retail_api::entities::user::Entity as UserEntity;
use retail_api::errors::ServiceError;
use retail_api::services::employees::CreateEmployeeRequest;
use sea_orm::EntityTrait;

#[tokio::test]
async fn creation_writes_user_and_employee_together() {
    let app = TestApp::new().await;

    let employee = app
        .services
        .employees
        .create_employee(CreateEmployeeRequest {
            username: "ltran".to_string(),
            full_name: "Linh Tran".to_string(),
            role: "sales".to_string(),
            phone: Some("0901234567".to_string()),
            position: Some("Store clerk".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(employee.username, "ltran");
    assert_eq!(employee.role, "sales");

    let user = UserEntity::find_by_id(employee.user_id)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .expect("backing user exists");
    assert_eq!(user.full_name, "Linh Tran");
}

#[tokio::test]
async fn duplicate_usernames_conflict_and_leave_no_orphan() {
    let app = TestApp::new().await;

    app.services
        .employees
        .create_employee(CreateEmployeeRequest {
            username: "ltran".to_string(),
            full_name: "Linh Tran".to_string(),
            role: "sales".to_string(),
            phone: None,
            position: None,
        })
        .await
        .unwrap();

    let err = app
        .services
        .employees
        .create_employee(CreateEmployeeRequest {
            username: "ltran".to_string(),
            full_name: "Long Tran".to_string(),
            role: "sales".to_string(),
            phone: None,
            position: None,
        })
        .await
        .expect_err("duplicate username must conflict");
    assert_matches!(err, ServiceError::Conflict(_));

    let users = UserEntity::find().all(app.db.as_ref()).await.unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn deleting_an_employee_removes_the_backing_user() {
    let app = TestApp::new().await;

    let employee = app
        .services
        .employees
        .create_employee(CreateEmployeeRequest {
            username: "tempworker".to_string(),
            full_name: "Temp Worker".to_string(),
            role: "warehouse".to_string(),
            phone: None,
            position: None,
        })
        .await
        .unwrap();

    app.services
        .employees
        .delete_employee(employee.id)
        .await
        .unwrap();

    let users = UserEntity::find().all(app.db.as_ref()).await.unwrap();
    assert!(users.is_empty());
}
