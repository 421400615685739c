use catalog_core::config::DatabaseConfig;
use catalog_core::repo::predicate::text;
use catalog_core::{
    Album, AlbumColumn, AlbumRelation, Predicate, RepoError, Repository, Session,
    SqliteRepository, Track, TrackColumn, TrackRelation,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn album_with_tracks(title: &str, isrcs: &[&str]) -> Album {
    let mut album = Album::new(title, "Miles Davis", date(1959, 8, 17));
    for (index, isrc) in isrcs.iter().enumerate() {
        album.push_track(Track::new(
            Uuid::nil(),
            *isrc,
            format!("{title} #{}", index + 1),
            Duration::from_secs(180 + index as u64),
        ));
    }
    album
}

#[test]
fn insert_then_get_round_trips_every_scalar() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);

    let album = album_with_tracks("Kind of Blue", &[]);
    albums.insert(&album).unwrap();

    let loaded = albums.get(&album.id, &[]).unwrap().unwrap();
    assert_eq!(loaded, album);
}

#[test]
fn track_round_trips_sub_millisecond_duration_and_timestamps() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);
    let tracks = SqliteRepository::<Track>::new(&session);
    let album = album_with_tracks("Precise", &[]);
    albums.insert(&album).unwrap();

    let mut track = Track::new(album.id, "USAAA0000042", "Blip", Duration::from_micros(1_500));
    track.created_at = Utc::now();
    track.updated_at = Utc::now();
    tracks.insert(&track).unwrap();

    let loaded = tracks.get(&track.id, &[]).unwrap().unwrap();
    assert_eq!(loaded.duration, Duration::from_micros(1_500));
    assert_eq!(loaded, track);
}

#[test]
fn duration_beyond_storage_range_is_rejected_without_a_row() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);
    let tracks = SqliteRepository::<Track>::new(&session);
    let album = album_with_tracks("Endless", &[]);
    albums.insert(&album).unwrap();

    let endless = Track::new(album.id, "USAAA0000043", "Endless", Duration::MAX);
    let err = tracks.insert(&endless).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)), "got {err}");
    assert!(tracks.list(&[]).unwrap().is_empty());
}

#[test]
fn get_missing_key_returns_none() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);

    assert!(albums.get(&Uuid::now_v7(), &[]).unwrap().is_none());
    assert!(albums
        .get(&Uuid::now_v7(), &[AlbumRelation::Tracks])
        .unwrap()
        .is_none());
}

#[test]
fn album_graph_insert_persists_tracks_and_expands_in_order() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);

    let album = album_with_tracks(
        "Kind of Blue",
        &["USSM15900113", "USSM15900114", "USSM15900115"],
    );
    albums.insert(&album).unwrap();

    let bare = albums.get(&album.id, &[]).unwrap().unwrap();
    assert!(bare.tracks.is_empty());

    let expanded = albums
        .get(&album.id, &[AlbumRelation::Tracks])
        .unwrap()
        .unwrap();
    assert_eq!(expanded.tracks, album.tracks);
    assert!(expanded.tracks.iter().all(|track| track.album_id == album.id));
}

#[test]
fn track_expansion_loads_owning_album_without_its_tracks() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);
    let tracks = SqliteRepository::<Track>::new(&session);

    let album = album_with_tracks("Sketches of Spain", &["USSM16000001"]);
    albums.insert(&album).unwrap();

    let track_id = album.tracks[0].id;
    let bare = tracks.get(&track_id, &[]).unwrap().unwrap();
    assert!(bare.album.is_none());

    let expanded = tracks
        .get(&track_id, &[TrackRelation::Album])
        .unwrap()
        .unwrap();
    let owner = expanded.album.expect("album should be expanded");
    assert_eq!(owner.id, album.id);
    assert_eq!(owner.title, "Sketches of Spain");
    assert!(owner.tracks.is_empty());
}

#[test]
fn list_returns_every_row_in_insertion_order() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);
    assert!(albums.list(&[]).unwrap().is_empty());

    let first = album_with_tracks("First", &["USAAA0000001", "USAAA0000002"]);
    let second = album_with_tracks("Second", &[]);
    let third = album_with_tracks("Third", &["USAAA0000003"]);
    for album in [&first, &second, &third] {
        albums.insert(album).unwrap();
    }

    let listed = albums.list(&[AlbumRelation::Tracks]).unwrap();
    let ids = listed.iter().map(|album| album.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![first.id, second.id, third.id]);
    assert_eq!(listed[0].tracks.len(), 2);
    assert!(listed[1].tracks.is_empty());
    assert_eq!(listed[2].tracks.len(), 1);

    let tracks = SqliteRepository::<Track>::new(&session);
    assert_eq!(tracks.list(&[]).unwrap().len(), 3);
}

#[test]
fn update_replaces_scalars_and_keeps_children() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);

    let album = album_with_tracks("Kind of Blue", &["USSM15900113", "USSM15900114"]);
    albums.insert(&album).unwrap();
    std::thread::sleep(Duration::from_millis(5));

    let mut changed = album.clone();
    changed.title = "Kind of Blue (Legacy Edition)".to_string();
    changed.release_date = date(2009, 9, 29);
    changed.tracks.clear();
    changed.created_at = DateTime::from_timestamp_millis(0).unwrap();

    assert!(albums.update(&changed, &[AlbumRelation::Tracks]).unwrap());
    assert_eq!(session.tracked_len(), 0);

    let stored = albums
        .get(&album.id, &[AlbumRelation::Tracks])
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Kind of Blue (Legacy Edition)");
    assert_eq!(stored.artist, "Miles Davis");
    assert_eq!(stored.release_date, date(2009, 9, 29));
    assert_eq!(stored.tracks.len(), 2);
    assert_eq!(stored.created_at, album.created_at);
    assert!(stored.updated_at > album.updated_at);
}

#[test]
fn update_without_changes_still_refreshes_updated_at() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);

    let album = album_with_tracks("Milestones", &[]);
    albums.insert(&album).unwrap();
    std::thread::sleep(Duration::from_millis(5));

    assert!(albums.update(&album, &[]).unwrap());
    let stored = albums.get(&album.id, &[]).unwrap().unwrap();
    assert_eq!(stored.title, album.title);
    assert!(stored.updated_at > album.updated_at);
}

#[test]
fn update_missing_key_returns_false_and_clears_tracking() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);

    let ghost = album_with_tracks("Ghost", &[]);
    assert!(!albums.update(&ghost, &[]).unwrap());
    assert_eq!(session.tracked_len(), 0);
    assert!(albums.list(&[]).unwrap().is_empty());
}

#[test]
fn failed_update_clears_tracking_and_leaves_row_intact() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);
    let tracks = SqliteRepository::<Track>::new(&session);

    let album = album_with_tracks("Pair", &["USAAA0000001", "USAAA0000002"]);
    albums.insert(&album).unwrap();

    let mut clash = album.tracks[1].clone();
    clash.isrc = "USAAA0000001".to_string();
    let err = tracks.update(&clash, &[]).unwrap_err();
    assert!(err.is_constraint_violation());
    assert_eq!(session.tracked_len(), 0);

    let stored = tracks.get(&clash.id, &[]).unwrap().unwrap();
    assert_eq!(stored.isrc, "USAAA0000002");
}

#[test]
fn delete_is_idempotent() {
    let session = Session::open_in_memory().unwrap();
    let tracks = SqliteRepository::<Track>::new(&session);
    let albums = SqliteRepository::<Album>::new(&session);

    let album = album_with_tracks("Porgy and Bess", &["USSM15800001", "USSM15800002"]);
    albums.insert(&album).unwrap();

    let key = album.tracks[0].id;
    assert!(tracks.delete(&key).unwrap());
    assert!(!tracks.delete(&key).unwrap());
    assert!(tracks.get(&key, &[]).unwrap().is_none());
    assert!(!tracks.delete(&Uuid::now_v7()).unwrap());

    let remaining = albums
        .get(&album.id, &[AlbumRelation::Tracks])
        .unwrap()
        .unwrap();
    assert_eq!(remaining.tracks.len(), 1);
}

#[test]
fn deleting_album_cascades_to_its_tracks() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);
    let tracks = SqliteRepository::<Track>::new(&session);

    let kept = album_with_tracks("Kept", &["USAAA0000001"]);
    let dropped = album_with_tracks("Dropped", &["USAAA0000002", "USAAA0000003"]);
    albums.insert(&kept).unwrap();
    albums.insert(&dropped).unwrap();

    assert!(albums.delete(&dropped.id).unwrap());

    let remaining = tracks.list(&[]).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].album_id, kept.id);
}

#[test]
fn duplicate_isrc_is_rejected_and_first_row_survives() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);
    let tracks = SqliteRepository::<Track>::new(&session);

    let album = album_with_tracks("Original", &["USSM15900113"]);
    albums.insert(&album).unwrap();

    let duplicate = Track::new(album.id, "USSM15900113", "Imposter", Duration::from_secs(60));
    let err = tracks.insert(&duplicate).unwrap_err();
    assert!(err.is_constraint_violation(), "unexpected error: {err}");

    assert!(tracks.get(&duplicate.id, &[]).unwrap().is_none());
    let first = tracks.get(&album.tracks[0].id, &[]).unwrap().unwrap();
    assert_eq!(first.title, "Original #1");
}

#[test]
fn duplicate_key_insert_is_a_constraint_violation() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);

    let album = album_with_tracks("Once", &[]);
    albums.insert(&album).unwrap();

    let mut again = album.clone();
    again.title = "Twice".to_string();
    assert!(albums.insert(&again).unwrap_err().is_constraint_violation());
    assert_eq!(albums.get(&album.id, &[]).unwrap().unwrap().title, "Once");
}

#[test]
fn failed_graph_insert_rolls_back_album_and_tracks() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);
    let tracks = SqliteRepository::<Track>::new(&session);

    let album = album_with_tracks("Broken", &["USAAA0000001", "USAAA0000001"]);
    assert!(albums.insert(&album).unwrap_err().is_constraint_violation());

    assert!(albums.get(&album.id, &[]).unwrap().is_none());
    assert!(tracks.list(&[]).unwrap().is_empty());
}

#[test]
fn track_for_missing_album_violates_foreign_key() {
    let session = Session::open_in_memory().unwrap();
    let tracks = SqliteRepository::<Track>::new(&session);

    let orphan = Track::new(Uuid::now_v7(), "USAAA0000009", "Orphan", Duration::from_secs(1));
    assert!(tracks.insert(&orphan).unwrap_err().is_constraint_violation());
}

#[test]
fn exists_evaluates_composed_predicates() {
    let session = Session::open_in_memory().unwrap();
    let albums = SqliteRepository::<Album>::new(&session);
    let tracks = SqliteRepository::<Track>::new(&session);
    assert!(!albums.exists(&Predicate::True).unwrap());

    let blue = album_with_tracks("Kind of Blue", &["USSM15900113", "USSM15900114"]);
    let mut bitches = Album::new("Bitches Brew", "Miles Davis", date(1970, 3, 30));
    bitches.push_track(Track::new(
        Uuid::nil(),
        "USSM17000001",
        "Pharaoh's Dance",
        Duration::from_secs(1200),
    ));
    albums.insert(&blue).unwrap();
    albums.insert(&bitches).unwrap();

    let by_miles = Predicate::eq(AlbumColumn::Artist, text("Miles Davis"));
    let seventies = Predicate::ge(AlbumColumn::ReleaseDate, text("1970-01-01"));
    assert!(albums.exists(&by_miles.clone().and(seventies.clone())).unwrap());
    assert!(!albums
        .exists(&seventies.clone().and(Predicate::eq(AlbumColumn::Title, text("Kind of Blue"))))
        .unwrap());
    assert!(albums
        .exists(
            &Predicate::eq(AlbumColumn::Title, text("Nope"))
                .or(Predicate::eq(AlbumColumn::Title, text("Bitches Brew")))
        )
        .unwrap());
    assert!(!albums.exists(&!by_miles).unwrap());

    let long_tracks = Predicate::gt(TrackColumn::DurationNs, 600_000_000_000_i64);
    assert!(tracks.exists(&long_tracks).unwrap());
    assert!(tracks
        .exists(&Predicate::in_values(
            TrackColumn::Isrc,
            [text("USXXX0000000"), text("USSM15900114")]
        ))
        .unwrap());
    assert!(!tracks
        .exists(&Predicate::in_values(TrackColumn::Isrc, Vec::<String>::new()))
        .unwrap());
    assert!(!tracks.exists(&Predicate::is_null(TrackColumn::AlbumId)).unwrap());
}

#[test]
fn concurrent_sessions_resolve_updates_last_write_wins() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("catalog.sqlite3"),
        ..DatabaseConfig::default()
    };
    let first_session = Session::open(&config).unwrap();
    let second_session = Session::open(&config).unwrap();
    let first = SqliteRepository::<Album>::new(&first_session);
    let second = SqliteRepository::<Album>::new(&second_session);

    let album = album_with_tracks("Contested", &[]);
    first.insert(&album).unwrap();

    let mut from_first = album.clone();
    from_first.title = "First writer".to_string();
    let mut from_second = album.clone();
    from_second.title = "Second writer".to_string();
    from_second.artist = "John Coltrane".to_string();

    assert!(first.update(&from_first, &[]).unwrap());
    assert!(second.update(&from_second, &[]).unwrap());

    let seen_by_first = first.get(&album.id, &[]).unwrap().unwrap();
    assert_eq!(seen_by_first.title, "Second writer");
    assert_eq!(seen_by_first.artist, "John Coltrane");
}

#[test]
fn sessions_on_separate_threads_share_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("catalog.sqlite3"),
        ..DatabaseConfig::default()
    };
    let session = Session::open(&config).unwrap();
    let album = album_with_tracks("Threads", &["USAAA0000001"]);
    SqliteRepository::<Album>::new(&session).insert(&album).unwrap();

    let worker_config = config.clone();
    let album_id = album.id;
    let loaded = std::thread::spawn(move || {
        let session = Session::open(&worker_config).unwrap();
        SqliteRepository::<Album>::new(&session)
            .get(&album_id, &[AlbumRelation::Tracks])
            .unwrap()
    })
    .join()
    .unwrap()
    .unwrap();

    assert_eq!(loaded.tracks.len(), 1);
}

/// Runs `call` while another thread keeps interrupting the session.
fn with_interrupts<T>(session: &Session, call: impl FnOnce() -> T) -> T {
    let handle = session.interrupt_handle();
    let done = AtomicBool::new(false);
    let done = &done;
    std::thread::scope(|scope| {
        scope.spawn(move || {
            while !done.load(Ordering::Acquire) {
                handle.interrupt();
                std::thread::yield_now();
            }
        });
        let result = call();
        done.store(true, Ordering::Release);
        result
    })
}

fn count_rows(session: &Session, table: &str) -> i64 {
    session
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn interrupted_list_returns_cancelled_and_session_recovers() {
    let session = Session::open_in_memory().unwrap();
    session
        .connection()
        .execute_batch(
            "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 200000)
             INSERT INTO albums (id, title, artist, release_date, created_at, updated_at)
             SELECT printf('00000000-0000-7000-8000-%012x', n), 'Bulk ' || n, 'Various',
                    '2000-01-01', 0, 0
             FROM seq;",
        )
        .unwrap();
    let albums = SqliteRepository::<Album>::new(&session);

    let result = with_interrupts(&session, || albums.list(&[]));
    assert!(
        matches!(result, Err(RepoError::Cancelled)),
        "got {:?}",
        result.as_ref().map(Vec::len)
    );

    assert_eq!(count_rows(&session, "albums"), 200_000);
    assert!(albums.exists(&Predicate::True).unwrap());
}

#[test]
fn interrupted_insert_returns_cancelled_and_leaves_no_rows() {
    let session = Session::open_in_memory().unwrap();
    // Makes every album insert run long enough to be interrupted mid-statement.
    session
        .connection()
        .execute_batch(
            "CREATE TEMP TABLE digits (d INTEGER NOT NULL);
             INSERT INTO digits (d) VALUES (0), (1), (2), (3), (4), (5), (6), (7), (8), (9);
             CREATE TEMP TRIGGER slow_album_insert AFTER INSERT ON albums
             BEGIN
                 SELECT COUNT(*) FROM digits a, digits b, digits c, digits d, digits e,
                                      digits f, digits g;
             END;",
        )
        .unwrap();
    let albums = SqliteRepository::<Album>::new(&session);
    let album = album_with_tracks("Interrupted", &["USAAA0000101", "USAAA0000102"]);

    let result = with_interrupts(&session, || albums.insert(&album));
    assert!(matches!(result, Err(RepoError::Cancelled)), "got {result:?}");

    assert!(session.connection().is_autocommit());
    assert_eq!(count_rows(&session, "albums"), 0);
    assert_eq!(count_rows(&session, "tracks"), 0);
}
