use uuid::Uuid;

use crate::common::{TestApp, routes};

/// Extract the public id from a share response's `public_url`.
fn public_id_from_url(url: &str) -> String {
    url.rsplit('/')
        .next()
        .expect("public_url should have segments")
        .to_string()
}

mod enabling {
    use super::*;

    #[tokio::test]
    async fn owner_can_enable_sharing_and_gets_a_url() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.upload_file("a.txt", b"data".to_vec(), &token).await;

        let res = app.post_empty_with_token(&routes::file_share(&id), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let url = res.body["public_url"].as_str().unwrap();
        assert!(url.starts_with("/api/v1/public/files/"));

        let meta = app.get_with_token(&routes::file(&id), &token).await;
        assert_eq!(meta.body["is_public"], true);
    }

    #[tokio::test]
    async fn enabling_twice_returns_the_same_url() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.upload_file("a.txt", b"data".to_vec(), &token).await;

        let first = app.post_empty_with_token(&routes::file_share(&id), &token).await;
        let second = app.post_empty_with_token(&routes::file_share(&id), &token).await;

        assert_eq!(first.body["public_url"], second.body["public_url"]);
    }

    #[tokio::test]
    async fn url_is_stable_across_disable_and_re_enable() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.upload_file("a.txt", b"data".to_vec(), &token).await;

        let first = app.post_empty_with_token(&routes::file_share(&id), &token).await;
        let disable = app.delete_with_token(&routes::file_share(&id), &token).await;
        assert_eq!(disable.status, 204);
        let second = app.post_empty_with_token(&routes::file_share(&id), &token).await;

        assert_eq!(first.body["public_url"], second.body["public_url"]);
    }

    #[tokio::test]
    async fn non_owner_cannot_enable_sharing() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        let id = app.upload_file("a.txt", b"data".to_vec(), &alice).await;

        let res = app.post_empty_with_token(&routes::file_share(&id), &bob).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn admin_can_manage_sharing_of_any_file() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let admin = app.create_admin("root", "securepass").await;
        let id = app.upload_file("a.txt", b"data".to_vec(), &alice).await;

        let res = app.post_empty_with_token(&routes::file_share(&id), &admin).await;
        assert_eq!(res.status, 200);

        let res = app.delete_with_token(&routes::file_share(&id), &admin).await;
        assert_eq!(res.status, 204);
    }
}

mod public_access {
    use super::*;

    #[tokio::test]
    async fn shared_file_is_downloadable_without_authentication() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let content = b"shared content".to_vec();
        let id = app.upload_file("shared.txt", content.clone(), &token).await;

        let share = app.post_empty_with_token(&routes::file_share(&id), &token).await;
        let public_id = public_id_from_url(share.body["public_url"].as_str().unwrap());

        let res = app
            .get_raw_without_token(&routes::public_download(&public_id))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.bytes, content);
        assert!(res.header("content-disposition").starts_with("attachment;"));
    }

    #[tokio::test]
    async fn shared_file_metadata_is_visible_without_authentication() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.upload_file("shared.txt", b"data".to_vec(), &token).await;

        let share = app.post_empty_with_token(&routes::file_share(&id), &token).await;
        let public_id = public_id_from_url(share.body["public_url"].as_str().unwrap());

        let res = app.get_without_token(&routes::public_file(&public_id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["original_name"], "shared.txt");
    }

    #[tokio::test]
    async fn public_download_stamps_last_downloaded_at() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.upload_file("a.txt", b"data".to_vec(), &token).await;

        let share = app.post_empty_with_token(&routes::file_share(&id), &token).await;
        let public_id = public_id_from_url(share.body["public_url"].as_str().unwrap());

        app.get_raw_without_token(&routes::public_download(&public_id))
            .await;

        let meta = app.get_with_token(&routes::file(&id), &token).await;
        assert!(meta.body["last_downloaded_at"].is_string());
    }

    #[tokio::test]
    async fn unshared_file_is_not_reachable_by_its_public_id() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.upload_file("a.txt", b"data".to_vec(), &token).await;

        let meta = app.get_with_token(&routes::file(&id), &token).await;
        let public_id = meta.body["public_id"].as_str().unwrap().to_string();

        let res = app.get_without_token(&routes::public_file(&public_id)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn unknown_and_unshared_public_ids_are_indistinguishable() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.upload_file("a.txt", b"data".to_vec(), &token).await;

        let meta = app.get_with_token(&routes::file(&id), &token).await;
        let unshared_id = meta.body["public_id"].as_str().unwrap().to_string();
        let unknown_id = Uuid::new_v4().to_string();

        let unshared = app.get_without_token(&routes::public_file(&unshared_id)).await;
        let unknown = app.get_without_token(&routes::public_file(&unknown_id)).await;

        assert_eq!(unshared.status, unknown.status);
        assert_eq!(unshared.body["code"], unknown.body["code"]);
        assert_eq!(unshared.body["message"], unknown.body["message"]);
    }

    #[tokio::test]
    async fn malformed_public_id_is_a_plain_404() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::public_file("not-a-uuid")).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn disabling_sharing_cuts_off_public_access() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.upload_file("a.txt", b"data".to_vec(), &token).await;

        let share = app.post_empty_with_token(&routes::file_share(&id), &token).await;
        let public_id = public_id_from_url(share.body["public_url"].as_str().unwrap());

        let before = app
            .get_raw_without_token(&routes::public_download(&public_id))
            .await;
        assert_eq!(before.status, 200);

        let disable = app.delete_with_token(&routes::file_share(&id), &token).await;
        assert_eq!(disable.status, 204);

        let after = app.get_without_token(&routes::public_download(&public_id)).await;
        assert_eq!(after.status, 404);
        assert_eq!(after.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn deleting_a_shared_file_removes_public_access() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.upload_file("a.txt", b"data".to_vec(), &token).await;

        let share = app.post_empty_with_token(&routes::file_share(&id), &token).await;
        let public_id = public_id_from_url(share.body["public_url"].as_str().unwrap());

        let del = app.delete_with_token(&routes::file(&id), &token).await;
        assert_eq!(del.status, 204);

        let res = app.get_without_token(&routes::public_file(&public_id)).await;
        assert_eq!(res.status, 404);
    }
}
