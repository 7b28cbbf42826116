use plgrab::download::{
    DownloadOptions, DownloadSummary, TrackOutcome, download_playlist, download_playlists,
    download_track, m3u::PlaylistFormat, template::OutputTemplate,
};
use tempfile::TempDir;

mod common;

use common::{StubService, audio_bytes, create_test_playlist, create_test_track};

fn workout_service() -> StubService {
    StubService::default().with_playlist(
        create_test_playlist("p1", "Workout", "Alice", None),
        vec![
            create_test_track("t1", "Hysteria", "Muse", "Absolution", 8),
            create_test_track("t2", "Starlight", "Muse", "Black Holes and Revelations", 2),
        ],
    )
}

#[tokio::test]
async fn test_download_track_writes_file() {
    plgrab::set_quiet(true);
    let dir = TempDir::new().unwrap();
    let service = workout_service();
    let track = create_test_track("t1", "Hysteria", "Muse", "Absolution", 8);
    let path = dir.path().join("nested").join("Muse - Hysteria.mp3");

    let outcome = download_track(&service, &track, &path).await.unwrap();

    assert_eq!(outcome, TrackOutcome::Downloaded(audio_bytes("t1").len() as u64));
    assert_eq!(std::fs::read(&path).unwrap(), audio_bytes("t1"));
    assert!(!dir.path().join("nested").join("Muse - Hysteria.mp3.part").exists());
}

#[tokio::test]
async fn test_download_track_skips_existing_file() {
    plgrab::set_quiet(true);
    let dir = TempDir::new().unwrap();
    let service = workout_service();
    let track = create_test_track("t1", "Hysteria", "Muse", "Absolution", 8);
    let path = dir.path().join("Muse - Hysteria.mp3");
    std::fs::write(&path, b"already here").unwrap();

    let outcome = download_track(&service, &track, &path).await.unwrap();

    assert_eq!(outcome, TrackOutcome::Skipped);
    assert_eq!(std::fs::read(&path).unwrap(), b"already here");
    assert!(service.streamed().is_empty());
}

#[tokio::test]
async fn test_download_track_failure_leaves_no_partial_file() {
    plgrab::set_quiet(true);
    let dir = TempDir::new().unwrap();
    let service = workout_service().failing_track("t1");
    let track = create_test_track("t1", "Hysteria", "Muse", "Absolution", 8);
    let path = dir.path().join("Muse - Hysteria.mp3");

    assert!(download_track(&service, &track, &path).await.is_err());
    assert!(!path.exists());
    assert!(!dir.path().join("Muse - Hysteria.mp3.part").exists());
}

#[tokio::test]
async fn test_download_playlist_into_directory() {
    plgrab::set_quiet(true);
    let dir = TempDir::new().unwrap();
    let service = workout_service();
    let template = OutputTemplate::new(dir.path());

    let summary = download_playlist(&service, &service.playlists[0], &template, None)
        .await
        .unwrap();

    assert_eq!(
        summary,
        DownloadSummary {
            downloaded: 2,
            skipped: 0,
            failed: 0
        }
    );
    assert_eq!(service.streamed(), vec!["t1", "t2"]);
    assert!(dir.path().join("Muse - Hysteria.mp3").is_file());
    assert!(dir.path().join("Muse - Starlight.mp3").is_file());
    assert!(!dir.path().join("Workout.m3u").exists());
}

#[tokio::test]
async fn test_download_playlist_continues_after_failure() {
    plgrab::set_quiet(true);
    let dir = TempDir::new().unwrap();
    let service = workout_service().failing_track("t1");
    let template = OutputTemplate::new(dir.path());

    let summary = download_playlist(
        &service,
        &service.playlists[0],
        &template,
        Some(PlaylistFormat::M3u),
    )
    .await
    .unwrap();

    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.failed, 1);
    assert!(!dir.path().join("Muse - Hysteria.mp3").exists());
    assert!(dir.path().join("Muse - Starlight.mp3").is_file());

    // failed tracks are left out of the playlist file
    let m3u = std::fs::read_to_string(dir.path().join("Workout.m3u")).unwrap();
    assert_eq!(m3u, "#EXTM3U\n#EXTINF:215,Muse - Starlight\nMuse - Starlight.mp3\n");
}

#[tokio::test]
async fn test_download_playlist_writes_relative_m3u8() {
    plgrab::set_quiet(true);
    let dir = TempDir::new().unwrap();
    let service = workout_service();
    let output = dir.path().join("%artist%").join("%album%").join("%track2% %title%");
    let template = OutputTemplate::new(&output);

    // an existing file still belongs in the playlist
    let existing = dir.path().join("Muse").join("Absolution").join("08 Hysteria.mp3");
    std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
    std::fs::write(&existing, b"old").unwrap();

    let summary = download_playlist(
        &service,
        &service.playlists[0],
        &template,
        Some(PlaylistFormat::M3u8),
    )
    .await
    .unwrap();

    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(service.streamed(), vec!["t2"]);

    let m3u = std::fs::read_to_string(dir.path().join("Workout.m3u8")).unwrap();
    assert_eq!(
        m3u,
        "#EXTM3U\n\
         #EXTINF:215,Muse - Hysteria\n\
         Muse/Absolution/08 Hysteria.mp3\n\
         #EXTINF:215,Muse - Starlight\n\
         Muse/Black Holes and Revelations/02 Starlight.mp3\n"
    );
}

#[tokio::test]
async fn test_download_playlists_skips_unlistable_playlist() {
    plgrab::set_quiet(true);
    let dir = TempDir::new().unwrap();
    let service = workout_service().with_playlist(
        create_test_playlist("p2", "Road Trip", "Alice", None),
        vec![create_test_track(
            "t3",
            "Go With the Flow",
            "Queens of the Stone Age",
            "Songs for the Deaf",
            4,
        )],
    );
    let missing = create_test_playlist("gone", "Deleted", "Alice", None);

    let playlists = vec![missing, service.playlists[0].clone(), service.playlists[1].clone()];
    let options = DownloadOptions {
        output: dir.path().to_path_buf(),
        playlist_format: Some(PlaylistFormat::M3u),
    };

    let total = download_playlists(&service, &playlists, &options).await;

    assert_eq!(
        total,
        DownloadSummary {
            downloaded: 3,
            skipped: 0,
            failed: 0
        }
    );
    assert!(dir.path().join("Workout.m3u").is_file());
    assert!(dir.path().join("Road Trip.m3u").is_file());
    assert!(!dir.path().join("Deleted.m3u").exists());
    assert!(
        dir.path()
            .join("Queens of the Stone Age - Go With the Flow.mp3")
            .is_file()
    );
}
