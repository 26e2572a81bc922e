mod common;

use aicreator_remote::RemoteError;
use aicreator_sync::repo::VideoGeneration;
use aicreator_sync::view::OpState;
use aicreator_types::models::VideoStyle;
use common::{IMAGE_URL, harness};

#[tokio::test]
async fn register_login_generate_through_view_models() {
    let h = harness();
    let users = h.app.user_view();
    let images = h.app.image_view();

    users
        .register("alice", "secret1", "alice@x.com")
        .join()
        .await
        .unwrap();
    let user = users.login("alice", "secret1").join().await.unwrap();
    assert_eq!(users.auth.get(), OpState::Ready(user));

    let image = images
        .generate("a cat", (1024, 1024), 7.0)
        .join()
        .await
        .unwrap();
    assert_eq!(image.image_url, IMAGE_URL);
    assert_eq!(images.generation.get(), OpState::Ready(image.clone()));

    images.set_favorite(image.id, true).join().await.unwrap();
    assert!(h.app.db.get_image(image.id).unwrap().unwrap().is_favorite);

    images.delete(image.id).join().await.unwrap();
    assert_eq!(h.app.db.count_images().unwrap(), 0);
}

#[tokio::test]
async fn failures_show_user_messages() {
    let h = harness();
    let users = h.app.user_view();

    let err = users
        .register("alice", "123", "alice@x.com")
        .join()
        .await
        .unwrap_err();
    assert_eq!(users.auth.get(), OpState::Failed(err.user_message()));

    h.remote.fail_with(RemoteError::Network("offline".into()));
    users.login("alice", "secret1").join().await.unwrap_err();
    assert_eq!(
        users.auth.get(),
        OpState::Failed("Network error, please check your connection".into())
    );
}

#[tokio::test]
async fn image_generation_without_session_fails() {
    let h = harness();
    let images = h.app.image_view();

    images
        .generate("a cat", (1024, 1024), 7.0)
        .join()
        .await
        .unwrap_err();
    assert_eq!(
        images.generation.get(),
        OpState::Failed("Please log in first".into())
    );
    assert_eq!(h.remote.call_count(), 0);
}

#[tokio::test]
async fn video_view_model_stores_result() {
    let h = harness();
    let users = h.app.user_view();
    users.register("alice", "secret1", "alice@x.com").join().await.unwrap();
    users.login("alice", "secret1").join().await.unwrap();

    let videos = h.app.video_view();
    let outcome = videos
        .generate(h.source_image(), VideoStyle::SlowMotion, 4, 30)
        .join()
        .await
        .unwrap();

    let VideoGeneration::Saved(video) = outcome else {
        panic!("expected a stored video");
    };
    assert_eq!(h.app.db.all_videos().unwrap(), vec![video.clone()]);

    videos.delete(video.id).join().await.unwrap();
    assert!(h.app.db.all_videos().unwrap().is_empty());
}

#[tokio::test]
async fn shutdown_cancels_pool_work() {
    let h = harness();
    h.app.shutdown().await;

    let handle = h.app.user_view().login("alice", "secret1");
    assert!(handle.join().await.is_err());
}
