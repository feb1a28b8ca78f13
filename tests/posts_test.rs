mod common;

use axum::http::StatusCode;
use common::{body_text, location, MultipartBody, TestSite, SMALL_JPEG};
use quill::db::posts;
use quill::forms::REQUIRED_TEXT;

#[tokio::test]
async fn anonymous_create_and_edit_redirect_to_login() {
    let site = TestSite::new();
    let author = site.create_user("auth");
    let post_id = site.create_post(author, "Test post", None);

    let response = site.get("/create/", None).await;
    assert_eq!(location(&response), "/auth/login/?next=%2Fcreate%2F");

    let response = site.get(&format!("/posts/{post_id}/edit/"), None).await;
    assert_eq!(
        location(&response),
        format!("/auth/login/?next=%2Fposts%2F{post_id}%2Fedit%2F")
    );

    let response = site
        .post_form(&format!("/posts/{post_id}/comment/"), None, "text=hi")
        .await;
    assert_eq!(
        location(&response),
        format!("/auth/login/?next=%2Fposts%2F{post_id}%2Fcomment%2F")
    );
}

#[tokio::test]
async fn public_pages_render() {
    let site = TestSite::new();
    let author = site.create_user("auth");
    let group = site.create_group("Test group", "test-slug");
    let post_id = site.create_post(author, "Test post", Some(group));

    for uri in [
        "/".to_string(),
        "/group/test-slug/".to_string(),
        "/profile/auth/".to_string(),
        format!("/posts/{post_id}/"),
        "/about/author/".to_string(),
        "/about/tech/".to_string(),
    ] {
        let response = site.get(&uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    }
}

#[tokio::test]
async fn unknown_objects_are_not_found() {
    let site = TestSite::new();
    for uri in [
        "/group/no-such-group/",
        "/profile/nobody/",
        "/posts/999/",
        "/posts/abc/",
    ] {
        let response = site.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {uri}");
    }
}

#[tokio::test]
async fn unknown_path_shows_not_found_page_for_everyone() {
    let site = TestSite::new();
    let user = site.create_user("auth");
    let cookie = site.login_cookie(user);

    let anonymous = site.get("/unexisting_page/", None).await;
    assert_eq!(anonymous.status(), StatusCode::NOT_FOUND);
    let body = body_text(anonymous).await;
    assert!(body.contains("Page not found"));
    assert!(body.contains("Log in"));

    let signed_in = site.get("/unexisting_page/", Some(&cookie)).await;
    assert_eq!(signed_in.status(), StatusCode::NOT_FOUND);
    let body = body_text(signed_in).await;
    assert!(body.contains("Page not found"));
    assert!(body.contains("Log out"));
}

#[tokio::test]
async fn create_with_empty_text_persists_nothing() {
    let site = TestSite::new();
    let user = site.create_user("auth");
    let cookie = site.login_cookie(user);

    let body = MultipartBody::default().text("text", "   ").finish();
    let response = site.post_multipart("/create/", &cookie, body).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(REQUIRED_TEXT));
    assert_eq!(site.post_count(), 0);
}

#[tokio::test]
async fn create_with_group_and_image_persists_post() {
    let site = TestSite::new();
    let user = site.create_user("auth");
    let group = site.create_group("Test group", "test-slug");
    let cookie = site.login_cookie(user);

    let body = MultipartBody::default()
        .text("text", "Test text")
        .text("group", &group.to_string())
        .file("image", "small.jpeg", "image/jpeg", SMALL_JPEG)
        .finish();
    let response = site.post_multipart("/create/", &cookie, body).await;
    assert_eq!(location(&response), "/profile/auth/");

    assert_eq!(site.post_count(), 1);
    let post = {
        let conn = site.state.db.get().unwrap();
        let page = posts::page_of_posts(&conn, posts::PostFilter::All, 10, None).unwrap();
        page.items.into_iter().next().unwrap()
    };
    assert_eq!(post.text, "Test text");
    assert_eq!(post.author.id, user);
    assert_eq!(post.group.as_ref().map(|g| g.id), Some(group));

    let image_url = post.image_url().unwrap();
    assert_eq!(image_url, "/media/posts/small.jpeg");
    let response = site.get(&image_url, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/jpeg");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.as_ref(), SMALL_JPEG);
}

#[tokio::test]
async fn create_rejects_unknown_group_and_non_image() {
    let site = TestSite::new();
    let user = site.create_user("auth");
    let cookie = site.login_cookie(user);

    let body = MultipartBody::default()
        .text("text", "Test text")
        .text("group", "4242")
        .file("image", "notes.txt", "text/plain", b"hello")
        .finish();
    let response = site.post_multipart("/create/", &cookie, body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Select a valid group."));
    assert!(page.contains("Upload a valid image."));
    assert!(page.contains("Test text"));
    assert_eq!(site.post_count(), 0);
}

#[tokio::test]
async fn non_author_edit_redirects_without_mutation() {
    let site = TestSite::new();
    let author = site.create_user("auth");
    let other = site.create_user("no_name");
    let post_id = site.create_post(author, "Original text", None);
    let cookie = site.login_cookie(other);

    let response = site.get(&format!("/posts/{post_id}/edit/"), Some(&cookie)).await;
    assert_eq!(location(&response), format!("/posts/{post_id}/"));

    let body = MultipartBody::default().text("text", "Hijacked").finish();
    let response = site
        .post_multipart(&format!("/posts/{post_id}/edit/"), &cookie, body)
        .await;
    assert_eq!(location(&response), format!("/posts/{post_id}/"));

    let conn = site.state.db.get().unwrap();
    let post = posts::find_post(&conn, post_id).unwrap().unwrap();
    assert_eq!(post.text, "Original text");
    assert_eq!(post.author.id, author);
}

#[tokio::test]
async fn author_edits_post() {
    let site = TestSite::new();
    let author = site.create_user("auth");
    let group = site.create_group("Test group", "test-slug");
    let post_id = site.create_post(author, "Original text", None);
    let cookie = site.login_cookie(author);

    let response = site.get(&format!("/posts/{post_id}/edit/"), Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Original text"));

    let body = MultipartBody::default()
        .text("text", "Edited text")
        .text("group", &group.to_string())
        .finish();
    let response = site
        .post_multipart(&format!("/posts/{post_id}/edit/"), &cookie, body)
        .await;
    assert_eq!(location(&response), format!("/posts/{post_id}/"));

    let conn = site.state.db.get().unwrap();
    let post = posts::find_post(&conn, post_id).unwrap().unwrap();
    assert_eq!(post.text, "Edited text");
    assert_eq!(post.group.map(|g| g.id), Some(group));
    assert_eq!(site.post_count(), 1);
}

#[tokio::test]
async fn edit_with_empty_text_rerenders_form() {
    let site = TestSite::new();
    let author = site.create_user("auth");
    let post_id = site.create_post(author, "Original text", None);
    let cookie = site.login_cookie(author);

    let body = MultipartBody::default().text("text", "").finish();
    let response = site
        .post_multipart(&format!("/posts/{post_id}/edit/"), &cookie, body)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(REQUIRED_TEXT));

    let conn = site.state.db.get().unwrap();
    assert_eq!(posts::find_post(&conn, post_id).unwrap().unwrap().text, "Original text");
}

#[tokio::test]
async fn comments_are_stamped_and_empty_ones_dropped() {
    let site = TestSite::new();
    let author = site.create_user("auth");
    let reader = site.create_user("reader");
    let post_id = site.create_post(author, "Test post", None);
    let cookie = site.login_cookie(reader);
    let uri = format!("/posts/{post_id}/comment/");

    let response = site.post_form(&uri, Some(&cookie), "text=Nice+post").await;
    assert_eq!(location(&response), format!("/posts/{post_id}/"));

    let response = site.post_form(&uri, Some(&cookie), "text=++").await;
    assert_eq!(location(&response), format!("/posts/{post_id}/"));

    let conn = site.state.db.get().unwrap();
    let comments = quill::db::comments::list_for_post(&conn, post_id).unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Nice post");
    assert_eq!(comments[0].author.username, "reader");
    drop(conn);

    let page = body_text(site.get(&format!("/posts/{post_id}/"), None).await).await;
    assert!(page.contains("Nice post"));
}

#[tokio::test]
async fn comment_on_missing_post_is_not_found() {
    let site = TestSite::new();
    let reader = site.create_user("reader");
    let cookie = site.login_cookie(reader);

    let response = site
        .post_form("/posts/999/comment/", Some(&cookie), "text=hello")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn posting_to_detail_shows_errors_without_saving() {
    let site = TestSite::new();
    let author = site.create_user("auth");
    let post_id = site.create_post(author, "Test post", None);
    let cookie = site.login_cookie(author);

    let response = site
        .post_form(&format!("/posts/{post_id}/"), Some(&cookie), "text=")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(REQUIRED_TEXT));

    let response = site
        .post_form(&format!("/posts/{post_id}/"), Some(&cookie), "text=kept")
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let conn = site.state.db.get().unwrap();
    assert!(quill::db::comments::list_for_post(&conn, post_id)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn listings_paginate_thirteen_posts() {
    let site = TestSite::new();
    let author = site.create_user("auth");
    let group = site.create_group("Test group", "test-slug");
    for i in 0..13 {
        site.create_post(author, &format!("Post number {i:02}"), Some(group));
    }

    for base in ["/", "/group/test-slug/", "/profile/auth/"] {
        let first = body_text(site.get(base, None).await).await;
        assert_eq!(first.matches("class=\"card\"").count(), 10, "{base}");
        assert!(first.contains("Post number 12"));
        assert!(!first.contains("Post number 02"));

        let second = body_text(site.get(&format!("{base}?page=2"), None).await).await;
        assert_eq!(second.matches("class=\"card\"").count(), 3, "{base}?page=2");
        assert!(second.contains("Post number 00"));

        let beyond = body_text(site.get(&format!("{base}?page=99"), None).await).await;
        assert_eq!(beyond.matches("class=\"card\"").count(), 3, "{base}?page=99");
    }
}
