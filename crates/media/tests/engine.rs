use async_trait::async_trait;
use recall_media::error::{ErrorKind, Result};
use recall_media::{Context, HookKind, MediaDir, MediaEngine, MediaHook, Registry};
use recall_store::{Database, Fact, LogEvent, MediaEntry, Repository};
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

struct Setup {
    _temp: TempDir,
    outside: std::path::PathBuf,
    repo: Repository,
    engine: MediaEngine,
}

async fn setup() -> Setup {
    let temp = tempfile::tempdir().unwrap();
    let outside = temp.path().join("home/user");
    std::fs::create_dir_all(&outside).unwrap();
    let db = Database::connect_in_memory().await.unwrap();
    let repo = Repository::from(&db);
    let dir = MediaDir::new(temp.path().join("default.db_media")).unwrap();
    let engine = MediaEngine::with_dir(dir, repo.clone());
    Setup { _temp: temp, outside, repo, engine }
}

fn write(path: &Path, contents: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn touch(path: &Path, secs: u64) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
}

async fn events(repo: &Repository) -> Vec<(LogEvent, String)> {
    repo.list_log().await.unwrap().into_iter().map(|entry| (entry.event, entry.object)).collect()
}

#[tokio::test]
async fn test_ingest_absolute_reference() {
    let s = setup().await;
    let source = s.outside.join("pic.png");
    write(&source, b"picture");
    let fact = Fact::new("f1").with_field("Q", format!(r#"<img src="{}">"#, source.display()));
    s.repo.upsert_fact(&fact).await.unwrap();

    let ingest = s.engine.ingest(&fact, &Context::local()).await.unwrap();
    assert!(ingest.failures.is_empty());
    assert_eq!(ingest.added, ["pic.png"]);
    assert_eq!(ingest.fact.fields["Q"], r#"<img src="pic.png">"#);
    assert_eq!(s.repo.get_fact("f1").await.unwrap(), Some(ingest.fact.clone()));
    assert_eq!(std::fs::read(s.engine.media_dir().join("pic.png")).unwrap(), b"picture");
    let entry = s.repo.get_media("pic.png").await.unwrap().unwrap();
    assert_eq!(entry.drift, s.engine.drift_signal("pic.png").await.unwrap());
    assert_eq!(events(&s.repo).await, [(LogEvent::AddedMediaFile, "pic.png".to_string())]);
    // The source is copied, not moved.
    assert!(source.exists());
}

#[tokio::test]
async fn test_ingest_is_idempotent() {
    let s = setup().await;
    let source = s.outside.join("pic.png");
    write(&source, b"picture");
    let fact = Fact::new("f1").with_field("Q", format!(r#"<img src="{}">"#, source.display()));
    s.repo.upsert_fact(&fact).await.unwrap();

    let first = s.engine.ingest(&fact, &Context::local()).await.unwrap();
    let second = s.engine.ingest(&first.fact, &Context::local()).await.unwrap();
    assert!(second.added.is_empty());
    assert_eq!(second.fact, first.fact);
    // Ingesting the original, unrewritten fact again reuses the identical copy.
    let third = s.engine.ingest(&fact, &Context::local()).await.unwrap();
    assert!(third.added.is_empty());
    assert_eq!(third.fact, first.fact);

    assert_eq!(s.engine.dir().list().await.unwrap().len(), 1);
    assert_eq!(s.repo.list_media().await.unwrap().len(), 1);
    assert_eq!(events(&s.repo).await.len(), 1);
}

#[tokio::test]
async fn test_ingest_collision_keeps_both_files() {
    let s = setup().await;
    write(&s.engine.media_dir().join("pic.png"), b"an older picture");
    let source = s.outside.join("pic.png");
    write(&source, b"picture");
    let fact = Fact::new("f1").with_field("Q", format!(r#"<img src="{}">"#, source.display()));
    s.repo.upsert_fact(&fact).await.unwrap();

    let ingest = s.engine.ingest(&fact, &Context::local()).await.unwrap();
    assert_eq!(ingest.fact.fields["Q"], r#"<img src="pic_1.png">"#);
    assert_eq!(std::fs::read(s.engine.media_dir().join("pic.png")).unwrap(), b"an older picture");
    assert_eq!(std::fs::read(s.engine.media_dir().join("pic_1.png")).unwrap(), b"picture");
}

#[tokio::test]
async fn test_ingest_normalizes_relative_references() {
    let s = setup().await;
    write(&s.engine.media_dir().join("sounds/owl.ogg"), b"hoot");
    let fact = Fact::new("f1")
        .with_field("Q", r#"<audio src="sounds\owl.ogg">"#)
        .with_field("A", r#"<audio src='sounds/owl.ogg'> <img src="https://example.com/a.png">"#);
    s.repo.upsert_fact(&fact).await.unwrap();

    let ingest = s.engine.ingest(&fact, &Context::local()).await.unwrap();
    assert!(ingest.failures.is_empty());
    assert_eq!(ingest.added, ["sounds/owl.ogg"]);
    assert_eq!(ingest.fact.fields["Q"], r#"<audio src="sounds/owl.ogg">"#);
    assert_eq!(ingest.fact.fields["A"], fact.fields["A"]);
    assert_eq!(s.repo.list_media().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_ingest_normalizes_missing_relative_reference() {
    let s = setup().await;
    let fact = Fact::new("f1").with_field("Q", r#"<audio src="sounds\missing.ogg">"#);
    s.repo.upsert_fact(&fact).await.unwrap();

    let ingest = s.engine.ingest(&fact, &Context::local()).await.unwrap();
    assert!(ingest.added.is_empty());
    assert_eq!(ingest.failures.len(), 1);
    assert_eq!(ingest.failures[0].path, r"sounds\missing.ogg");
    assert!(matches!(&*ingest.failures[0].error, ErrorKind::NotFound(_)));
    assert_eq!(ingest.fact.fields["Q"], r#"<audio src="sounds/missing.ogg">"#);
    assert_eq!(s.repo.get_fact("f1").await.unwrap().unwrap().fields["Q"], ingest.fact.fields["Q"]);
    assert!(s.repo.list_media().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ingest_failure_is_per_reference() {
    let s = setup().await;
    let source = s.outside.join("pic.png");
    write(&source, b"picture");
    let missing = s.outside.join("missing.png");
    let fact = Fact::new("f1")
        .with_field("Q", format!(r#"<img src="{}">"#, source.display()))
        .with_field("A", format!(r#"<img src="{}">"#, missing.display()));
    s.repo.upsert_fact(&fact).await.unwrap();

    let ingest = s.engine.ingest(&fact, &Context::local()).await.unwrap();
    assert_eq!(ingest.added, ["pic.png"]);
    assert_eq!(ingest.failures.len(), 1);
    assert_eq!(ingest.failures[0].path, missing.display().to_string());
    assert!(matches!(&*ingest.failures[0].error, ErrorKind::NotFound(_)));
    assert_eq!(ingest.fact.fields["Q"], r#"<img src="pic.png">"#);
    assert_eq!(ingest.fact.fields["A"], fact.fields["A"]);
    assert_eq!(s.repo.list_media().await.unwrap(), [s.repo.get_media("pic.png").await.unwrap().unwrap()]);
}

#[tokio::test]
async fn test_ingest_while_syncing_logs_nothing() {
    let s = setup().await;
    write(&s.engine.media_dir().join("pic.png"), b"picture");
    let fact = Fact::new("f1").with_field("Q", r#"<img src="pic.png">"#);
    s.repo.upsert_fact(&fact).await.unwrap();

    let ingest = s.engine.ingest(&fact, &Context::syncing()).await.unwrap();
    assert_eq!(ingest.added, ["pic.png"]);
    assert!(s.repo.get_media("pic.png").await.unwrap().is_some());
    assert!(events(&s.repo).await.is_empty());
}

#[tokio::test]
async fn test_detect_edited_media_files() {
    let s = setup().await;
    let path = s.engine.media_dir().join("pic.png");
    write(&path, b"picture");
    touch(&path, 1_000);
    let fact = Fact::new("f1").with_field("Q", r#"<img src="pic.png">"#);
    s.repo.upsert_fact(&fact).await.unwrap();
    s.engine.ingest(&fact, &Context::local()).await.unwrap();

    // Untouched: nothing to report.
    assert!(s.engine.detect_edited_media_files().await.unwrap().is_empty());

    touch(&path, 2_000);
    assert_eq!(s.engine.detect_edited_media_files().await.unwrap(), ["pic.png"]);
    let entry = s.repo.get_media("pic.png").await.unwrap().unwrap();
    assert_eq!(entry.drift, s.engine.drift_signal("pic.png").await.unwrap());
    // Reported once only.
    assert!(s.engine.detect_edited_media_files().await.unwrap().is_empty());
    assert_eq!(
        events(&s.repo).await,
        [(LogEvent::AddedMediaFile, "pic.png".to_string()), (LogEvent::EditedMediaFile, "pic.png".to_string())]
    );
}

#[tokio::test]
async fn test_detect_skips_missing_files() {
    let s = setup().await;
    s.repo.insert_media(&MediaEntry::new("gone.png", "12345")).await.unwrap();
    assert!(s.engine.detect_edited_media_files().await.unwrap().is_empty());
    assert_eq!(s.repo.get_media("gone.png").await.unwrap(), Some(MediaEntry::new("gone.png", "12345")));
    assert!(events(&s.repo).await.is_empty());
}

struct Recorder {
    name: &'static str,
    seen: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl MediaHook for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, payload: &str) -> Result<()> {
        self.seen.lock().unwrap().push(payload.to_string());
        if self.fail {
            exn::bail!(ErrorKind::NotFound(payload.into()));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_detect_runs_hooks_on_every_field() {
    let s = setup().await;
    s.repo.upsert_fact(&Fact::new("f1").with_field("Q", "question").with_field("A", "answer")).await.unwrap();
    s.repo.upsert_fact(&Fact::new("f2").with_field("Q", r"$\frac{1}{2}$")).await.unwrap();
    let recorder = Arc::new(Recorder { name: "latex", seen: Mutex::default(), fail: false });
    let engine = s
        .engine
        .clone()
        .with_hooks(Arc::new(Registry::default().with(HookKind::EditedMediaCheck, recorder.clone())));

    engine.detect_edited_media_files().await.unwrap();
    let mut seen = recorder.seen.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen, [r"$\frac{1}{2}$", "answer", "question"]);
}

#[tokio::test]
async fn test_failing_hook_is_reported() {
    let s = setup().await;
    s.repo.upsert_fact(&Fact::new("f1").with_field("Q", "question")).await.unwrap();
    let hook = Arc::new(Recorder { name: "broken", seen: Mutex::default(), fail: true });
    let engine = s.engine.clone().with_hooks(Arc::new(Registry::default().with(HookKind::EditedMediaCheck, hook)));
    let err = engine.detect_edited_media_files().await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::Hook(name) if name == "broken"));
}

#[tokio::test]
async fn test_reclaim_orphaned_media() {
    let s = setup().await;
    let root = s.engine.media_dir().to_path_buf();
    for name in ["kept.png", "pics/kept.png", "orphan.png", "old/deep/orphan.ogg", "_latex/formula.png"] {
        write(&root.join(name), b"data");
    }
    std::fs::create_dir_all(root.join("_latex/empty")).unwrap();
    s.repo
        .upsert_fact(
            &Fact::new("f1")
                .with_field("Q", r#"<img src="kept.png">"#)
                .with_field("A", r#"<IMG SRC='pics\kept.png'>"#),
        )
        .await
        .unwrap();
    s.repo.insert_media(&MediaEntry::new("orphan.png", "1")).await.unwrap();

    let reclaim = s.engine.reclaim_orphaned_media().await.unwrap();
    assert_eq!(reclaim.deleted, ["old/deep/orphan.ogg", "orphan.png"]);
    assert!(reclaim.failures.is_empty());
    let mut pruned = reclaim.pruned.clone();
    pruned.sort();
    assert_eq!(pruned, ["old", "old/deep"]);

    assert!(root.join("kept.png").exists());
    assert!(root.join("pics/kept.png").exists());
    assert!(root.join("_latex/formula.png").exists());
    assert!(root.join("_latex/empty").is_dir());
    assert!(!root.join("old").exists());
    assert!(s.repo.get_media("orphan.png").await.unwrap().is_none());
    assert_eq!(
        events(&s.repo).await,
        [
            (LogEvent::DeletedMediaFile, "old/deep/orphan.ogg".to_string()),
            (LogEvent::DeletedMediaFile, "orphan.png".to_string()),
        ]
    );

    // Nothing left to do.
    let again = s.engine.reclaim_orphaned_media().await.unwrap();
    assert!(again.deleted.is_empty());
    assert!(again.pruned.is_empty());
}

#[tokio::test]
async fn test_reclaim_logs_media_ingested_during_sync() {
    let s = setup().await;
    write(&s.engine.media_dir().join("pic.png"), b"picture");
    let fact = Fact::new("f1").with_field("Q", r#"<img src="pic.png">"#);
    s.repo.upsert_fact(&fact).await.unwrap();
    s.engine.ingest(&fact, &Context::syncing()).await.unwrap();
    assert!(events(&s.repo).await.is_empty());

    s.repo.delete_fact("f1").await.unwrap();
    let reclaim = s.engine.reclaim_orphaned_media().await.unwrap();
    assert_eq!(reclaim.deleted, ["pic.png"]);
    assert!(s.repo.get_media("pic.png").await.unwrap().is_none());
    assert_eq!(events(&s.repo).await, [(LogEvent::DeletedMediaFile, "pic.png".to_string())]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_reclaim_non_utf8_filename() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let s = setup().await;
    let path = s.engine.media_dir().join(OsStr::from_bytes(b"bad\xff.png"));
    write(&path, b"data");

    let reclaim = s.engine.reclaim_orphaned_media().await.unwrap();
    assert!(reclaim.failures.is_empty());
    assert_eq!(reclaim.deleted, ["bad\u{fffd}.png"]);
    assert!(!path.exists());
    assert_eq!(events(&s.repo).await, [(LogEvent::DeletedMediaFile, "bad\u{fffd}.png".to_string())]);
}

#[tokio::test]
async fn test_reclaim_survives_unreadable_media_dir() {
    let s = setup().await;
    let root = s.engine.media_dir().to_path_buf();
    std::fs::remove_dir(&root).unwrap();
    write(&root, b"not a directory");

    let reclaim = s.engine.reclaim_orphaned_media().await.unwrap();
    assert!(reclaim.deleted.is_empty());
    assert!(reclaim.pruned.is_empty());
    assert_eq!(reclaim.failures.len(), 1);
    assert_eq!(reclaim.failures[0].path, ".");
    assert!(root.is_file());
}

#[tokio::test]
async fn test_deleting_fact_keeps_media_until_reclaimed() {
    let s = setup().await;
    let source = s.outside.join("pic.png");
    write(&source, b"picture");
    let fact = Fact::new("f1").with_field("Q", format!(r#"<img src="{}">"#, source.display()));
    s.repo.upsert_fact(&fact).await.unwrap();
    s.engine.ingest(&fact, &Context::local()).await.unwrap();

    s.repo.delete_fact("f1").await.unwrap();
    assert!(s.engine.media_dir().join("pic.png").exists());
    let reclaim = s.engine.reclaim_orphaned_media().await.unwrap();
    assert_eq!(reclaim.deleted, ["pic.png"]);
}
