use libcat_dal::user::User;
use libcat_e2e_tests::{TestUser, client, extend_url, launch_env, login, prepare_env};
use serde_json::json;
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_user_administration() {
    let (args, _config_guard) = prepare_env("test_user_administration").await.unwrap();
    let base_url = args.base_url.clone();
    let (admin_client, admin) = launch_env(args, TestUser::Admin).await.unwrap();

    let users_url = base_url.join("users").unwrap();

    // who am I
    let response = admin_client
        .get(base_url.join("auth/me").unwrap())
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let me: User = response.json().await.unwrap();
    assert_eq!(me.id, admin.id);
    assert_eq!(me.email, TestUser::Admin.email());

    let new_user = json!({
        "email": TestUser::Member.email(),
        "name": "Member Reader",
        "password": TestUser::Member.password(),
        "roles": null,
    });
    let response = admin_client
        .post(users_url.clone())
        .json(&new_user)
        .send()
        .await
        .unwrap();
    info!("Create user response: {:#?}", response);
    assert_eq!(201, response.status().as_u16());
    let member: User = response.json().await.unwrap();
    assert_eq!(member.email, TestUser::Member.email());
    assert!(member.roles.is_none());

    let response = admin_client.get(users_url.clone()).send().await.unwrap();
    assert!(response.status().is_success());
    let users: Vec<User> = response.json().await.unwrap();
    assert_eq!(users.len(), 2);

    let response = admin_client
        .get(extend_url(&users_url, member.id))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // invalid email is rejected with validation details
    let invalid = json!({
        "email": "not-an-email",
        "name": "Nobody",
        "password": "password123",
        "roles": null,
    });
    let response = admin_client
        .post(users_url.clone())
        .json(&invalid)
        .send()
        .await
        .unwrap();
    assert_eq!(422, response.status().as_u16());

    // unknown role as well
    let invalid = json!({
        "email": "other@example.com",
        "password": "password123",
        "roles": ["superuser"],
    });
    let response = admin_client
        .post(users_url.clone())
        .json(&invalid)
        .send()
        .await
        .unwrap();
    assert_eq!(422, response.status().as_u16());

    // plain members cannot administer users
    let member_client = client().unwrap();
    login(&member_client, &base_url, TestUser::Member)
        .await
        .unwrap();
    let response = member_client.get(users_url.clone()).send().await.unwrap();
    assert_eq!(403, response.status().as_u16());

    // anonymous clients cannot either
    let anonymous = client().unwrap();
    let response = anonymous.get(users_url.clone()).send().await.unwrap();
    assert_eq!(401, response.status().as_u16());

    let response = admin_client
        .delete(extend_url(&users_url, member.id))
        .send()
        .await
        .unwrap();
    assert_eq!(204, response.status().as_u16());
    let response = admin_client
        .get(extend_url(&users_url, member.id))
        .send()
        .await
        .unwrap();
    assert_eq!(404, response.status().as_u16());

    // logout drops the session
    let response = admin_client
        .get(base_url.join("auth/logout").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(303, response.status().as_u16());
    let response = admin_client
        .get(base_url.join("auth/me").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());

    // and wrong password does not get in
    let response = anonymous
        .post(base_url.join("auth/login").unwrap())
        .json(&json!({"email": TestUser::Admin.email(), "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());

    // content type parameters like charset do not break credential parsing
    let response = anonymous
        .post(base_url.join("auth/login").unwrap())
        .header("content-type", "application/json; charset=utf-8")
        .body(
            serde_json::to_string(
                &json!({"email": TestUser::Admin.email(), "password": TestUser::Admin.password()}),
            )
            .unwrap(),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(303, response.status().as_u16());
}

#[tokio::test]
#[traced_test]
async fn test_configured_page_size_caps_user_list() {
    let (mut args, _config_guard) = prepare_env("test_configured_page_size").await.unwrap();
    args.default_page_size = 1;
    let base_url = args.base_url.clone();
    let (admin_client, _admin) = launch_env(args, TestUser::Admin).await.unwrap();

    let users_url = base_url.join("users").unwrap();
    let response = admin_client
        .post(users_url.clone())
        .json(&json!({
            "email": TestUser::Member.email(),
            "name": "Member Reader",
            "password": TestUser::Member.password(),
            "roles": null,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(201, response.status().as_u16());

    // two users exist, but the configured page size caps the listing
    let response = admin_client.get(users_url).send().await.unwrap();
    assert!(response.status().is_success());
    let users: Vec<User> = response.json().await.unwrap();
    assert_eq!(users.len(), 1);
}
