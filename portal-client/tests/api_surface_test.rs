mod helpers;

use helpers::spawn_portal;
use portal_client::{AdminApi, AdminQuery};

#[tokio::test]
async fn test_admin_list_decodes_page() {
    let (backend, portal) = spawn_portal().await;
    portal.logged_in_as("admin", "admin123").await;

    let page = AdminApi::new(portal.client.clone())
        .list_admins(&AdminQuery {
            keyword: Some("adm".to_string()),
            page_num: Some(1),
            page_size: Some(10),
        })
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.records[0].admin_id, 10);
    assert_eq!(
        page.records[0].user.as_ref().map(|u| u.username.as_str()),
        Some("admin")
    );

    let recorded = backend.recorded_for("/admin/admins");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].token, portal.session.token().await);
}

#[tokio::test]
async fn test_admin_list_empty_keyword_match() {
    let (_backend, portal) = spawn_portal().await;
    portal.logged_in_as("admin", "admin123").await;

    let page = AdminApi::new(portal.client.clone())
        .list_admins(&AdminQuery {
            keyword: Some("nobody".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 0);
    assert!(page.records.is_empty());
}
