use crate::errors::ModelError;
use crate::{dashboard, dashboard_portal, exclude_portal_team, project, rel_role_portal, role, source, user, view};
use super::{db_tests_disabled, setup_test_db};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use anyhow::Result;
use uuid::Uuid;

async fn seed_project(db: &DatabaseConnection) -> Result<(user::Model, project::Model)> {
    let name = format!("u_{}", Uuid::new_v4().simple());
    let owner = user::create(db, &name, &format!("{name}@example.com"), "hash").await?;
    let p = project::create(db, owner.id, &format!("p_{}", Uuid::new_v4()), None, false).await?;
    Ok((owner, p))
}

#[tokio::test]
async fn test_portal_crud() -> Result<()> {
    if db_tests_disabled() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let (owner, p) = seed_project(&db).await?;

    let portal = dashboard_portal::create(&db, p.id, "sales", Some("q3"), None, true, owner.id).await?;
    assert_eq!(portal.project_id, p.id);
    assert!(portal.update_time.is_none());

    let found = dashboard_portal::find_by_name(&db, p.id, "sales").await?;
    assert_eq!(found.map(|m| m.id), Some(portal.id));

    // same name in the same project is rejected by the unique index
    let dup = dashboard_portal::create(&db, p.id, "sales", None, None, false, owner.id).await;
    assert!(matches!(dup, Err(ModelError::Conflict(_))));

    let d = dashboard::create(&db, portal.id, "overview", 0, 0, owner.id).await?;
    assert_eq!(d.dashboard_type, dashboard::TYPE_DASHBOARD);

    let r = role::create(&db, &format!("r_{}", Uuid::new_v4()), None).await?;
    rel_role_portal::create(&db, r.id, portal.id, false, owner.id).await?;
    exclude_portal_team::new_active(portal.id, 42, owner.id).insert(&db).await?;

    // deleting the portal cascades to its child rows
    dashboard_portal::Entity::delete_by_id(portal.id).exec(&db).await?;
    let left = dashboard::Entity::find().filter(dashboard::Column::DashboardPortalId.eq(portal.id)).all(&db).await?;
    assert!(left.is_empty());
    let left = exclude_portal_team::Entity::find().filter(exclude_portal_team::Column::PortalId.eq(portal.id)).all(&db).await?;
    assert!(left.is_empty());

    role::Entity::delete_by_id(r.id).exec(&db).await?;
    project::Entity::delete_by_id(p.id).exec(&db).await?;
    user::hard_delete(&db, owner.id).await?;
    Ok(())
}

#[tokio::test]
async fn test_source_with_view_cannot_be_deleted() -> Result<()> {
    if db_tests_disabled() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let (owner, p) = seed_project(&db).await?;

    let s = source::create(&db, p.id, "warehouse", None, source::TYPE_JDBC, "{}", owner.id).await?;
    let v = view::create(&db, p.id, s.id, "orders", Some("select 1"), owner.id).await?;

    let res = source::Entity::delete_by_id(s.id).exec(&db).await;
    assert!(res.is_err(), "view must keep its source alive");

    view::Entity::delete_by_id(v.id).exec(&db).await?;
    source::Entity::delete_by_id(s.id).exec(&db).await?;
    project::Entity::delete_by_id(p.id).exec(&db).await?;
    user::hard_delete(&db, owner.id).await?;
    Ok(())
}

#[tokio::test]
async fn test_source_validation_rejects_bad_input() -> Result<()> {
    if db_tests_disabled() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let res = source::create(&db, 1, "  ", None, source::TYPE_CSV, "{}", 1).await;
    assert!(matches!(res, Err(ModelError::Validation(_))));
    let res = source::create(&db, 1, "ok", None, "mongo", "{}", 1).await;
    assert!(matches!(res, Err(ModelError::Validation(_))));
    Ok(())
}
