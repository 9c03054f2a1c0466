use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::academy::{self, ForumPost, PostSpec, ProgressRecord, Video};
use crate::data::{CatalogService, ForumService, ProgressService};
use crate::progress::{self, ProgressMap};
use crate::seed;

/// Lifecycle of one remote collection. `Loading` and `Failed` hang on to
/// the last good data so the view keeps rendering the previous snapshot.
#[derive(Debug, Default)]
pub enum Remote<T> {
    #[default]
    Idle,
    Loading {
        previous: Option<T>,
    },
    Loaded(T),
    Failed {
        error: academy::Error,
        previous: Option<T>,
    },
}

impl<T> Remote<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Remote::Idle => None,
            Remote::Loading { previous } => previous.as_ref(),
            Remote::Loaded(data) => Some(data),
            Remote::Failed { previous, .. } => previous.as_ref(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Remote::Loading { .. })
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Remote::Loaded(_))
    }

    fn take_data(&mut self) -> Option<T> {
        match std::mem::replace(self, Remote::Idle) {
            Remote::Idle => None,
            Remote::Loading { previous } => previous,
            Remote::Loaded(data) => Some(data),
            Remote::Failed { previous, .. } => previous,
        }
    }

    fn begin(&mut self) {
        let previous = self.take_data();
        *self = Remote::Loading { previous };
    }

    fn resolve(&mut self, result: Result<T, academy::Error>) {
        match result {
            Ok(data) => *self = Remote::Loaded(data),
            Err(error) => {
                let previous = self.take_data();
                *self = Remote::Failed { error, previous };
            }
        }
    }
}

enum Event {
    Videos(Result<Vec<Video>, academy::Error>),
    Progress(Result<Vec<ProgressRecord>, academy::Error>),
    Posts(Result<Vec<ForumPost>, academy::Error>),
    Seeded(Result<usize, academy::Error>),
    Watched(Result<(), academy::Error>),
    Posted(Result<ForumPost, academy::Error>),
}

/// What `poll` observed, for the view's status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    LibraryLoaded,
    LibraryFailed(String),
    PostsLoaded,
    PostsFailed(String),
    Seeded(usize),
    SeedFailed(String),
    Watched,
    WatchFailed(String),
    Posted,
    PostFailed(String),
}

pub struct Store {
    catalog: Arc<dyn CatalogService>,
    progress: Arc<dyn ProgressService>,
    forum: Arc<dyn ForumService>,
    user_id: String,
    videos: Remote<Vec<Video>>,
    progress_map: Remote<ProgressMap>,
    posts: Remote<Vec<ForumPost>>,
    seeding: bool,
    marking: bool,
    publishing: bool,
    event_tx: Sender<Event>,
    event_rx: Receiver<Event>,
}

impl Store {
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        progress: Arc<dyn ProgressService>,
        forum: Arc<dyn ForumService>,
        user_id: String,
    ) -> Self {
        let (event_tx, event_rx) = unbounded();
        Store {
            catalog,
            progress,
            forum,
            user_id,
            videos: Remote::Idle,
            progress_map: Remote::Idle,
            posts: Remote::Idle,
            seeding: false,
            marking: false,
            publishing: false,
            event_tx,
            event_rx,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn videos(&self) -> &[Video] {
        self.videos.data().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn posts(&self) -> &[ForumPost] {
        self.posts.data().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Percent for a video, if the user has any recorded activity on it.
    /// Absence means an implicit 0%.
    pub fn percent_for(&self, video_id: &str) -> Option<i64> {
        self.progress_map
            .data()
            .and_then(|map| map.get(video_id))
            .copied()
    }

    pub fn completed_count(&self) -> usize {
        self.progress_map
            .data()
            .map(progress::completed_count)
            .unwrap_or(0)
    }

    /// The library covers the videos+progress pair; it stays loading
    /// until both fetches settle.
    pub fn library_loading(&self) -> bool {
        self.videos.is_loading() || self.progress_map.is_loading()
    }

    pub fn posts_loading(&self) -> bool {
        self.posts.is_loading()
    }

    pub fn seeding(&self) -> bool {
        self.seeding
    }

    pub fn marking(&self) -> bool {
        self.marking
    }

    pub fn publishing(&self) -> bool {
        self.publishing
    }

    pub fn is_busy(&self) -> bool {
        self.library_loading()
            || self.posts_loading()
            || self.seeding
            || self.marking
            || self.publishing
    }

    pub fn videos_state(&self) -> &Remote<Vec<Video>> {
        &self.videos
    }

    pub fn progress_state(&self) -> &Remote<ProgressMap> {
        &self.progress_map
    }

    pub fn posts_state(&self) -> &Remote<Vec<ForumPost>> {
        &self.posts
    }

    /// Fetches videos and the user's progress concurrently. The two
    /// results may land in either order; `poll` applies them as they
    /// arrive.
    pub fn load_library(&mut self) {
        self.videos.begin();
        self.progress_map.begin();

        let tx = self.event_tx.clone();
        let catalog = self.catalog.clone();
        thread::spawn(move || {
            let _ = tx.send(Event::Videos(catalog.list_videos()));
        });

        let tx = self.event_tx.clone();
        let service = self.progress.clone();
        let user_id = self.user_id.clone();
        thread::spawn(move || {
            let _ = tx.send(Event::Progress(service.list_progress(&user_id)));
        });
    }

    pub fn load_posts(&mut self) {
        self.posts.begin();
        let tx = self.event_tx.clone();
        let forum = self.forum.clone();
        thread::spawn(move || {
            let _ = tx.send(Event::Posts(forum.list_posts()));
        });
    }

    /// Seeds the demo catalog when it is empty. A no-op while a seeding
    /// pass is in flight or when videos are already present.
    pub fn ensure_seed(&mut self) {
        if self.seeding || !self.videos().is_empty() {
            return;
        }
        self.seeding = true;
        let tx = self.event_tx.clone();
        let catalog = self.catalog.clone();
        let current: Vec<Video> = self.videos().to_vec();
        thread::spawn(move || {
            let _ = tx.send(Event::Seeded(seed::ensure_seed(catalog.as_ref(), &current)));
        });
    }

    /// Submits a 100% progress record for the video; the last position
    /// is its duration, or 0 when the duration is unknown. Duplicate
    /// submits are suppressed while one is in flight.
    pub fn mark_watched(&mut self, video: &Video) {
        if self.marking {
            return;
        }
        self.marking = true;
        let entry = ProgressRecord {
            user_id: self.user_id.clone(),
            video_id: video.id.clone(),
            percent: 100,
            last_position_sec: video.duration_sec.unwrap_or(0),
        };
        let tx = self.event_tx.clone();
        let service = self.progress.clone();
        thread::spawn(move || {
            let _ = tx.send(Event::Watched(service.record_progress(&entry)));
        });
    }

    /// Validates and dispatches a forum post. Empty title or content is
    /// rejected before any request; a submit while one is in flight is
    /// suppressed.
    pub fn create_post(
        &mut self,
        title: &str,
        content: &str,
        topics_input: &str,
    ) -> Result<(), academy::Error> {
        if title.is_empty() {
            return Err(academy::Error::Validation("post title is required".into()));
        }
        if content.is_empty() {
            return Err(academy::Error::Validation(
                "post content is required".into(),
            ));
        }
        if self.publishing {
            return Ok(());
        }
        self.publishing = true;
        let spec = PostSpec {
            user_id: self.user_id.clone(),
            title: title.to_string(),
            content: content.to_string(),
            topics: parse_topics(topics_input),
        };
        let tx = self.event_tx.clone();
        let forum = self.forum.clone();
        thread::spawn(move || {
            let _ = tx.send(Event::Posted(forum.create_post(&spec)));
        });
        Ok(())
    }

    /// Drains completed background work and applies it, in completion
    /// order. Overlapping reloads therefore resolve last-write-wins.
    /// Successful mutations re-invoke the affected loader exactly once.
    pub fn poll(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            self.apply(event, &mut updates);
        }
        updates
    }

    fn apply(&mut self, event: Event, updates: &mut Vec<Update>) {
        match event {
            Event::Videos(result) => {
                self.videos.resolve(result);
                self.note_library(updates);
            }
            Event::Progress(result) => {
                self.progress_map
                    .resolve(result.map(|records| progress::reconcile(&records)));
                self.note_library(updates);
            }
            Event::Posts(result) => {
                self.posts.resolve(result);
                match &self.posts {
                    Remote::Failed { error, .. } => {
                        updates.push(Update::PostsFailed(error.to_string()));
                    }
                    _ => updates.push(Update::PostsLoaded),
                }
            }
            Event::Seeded(result) => {
                self.seeding = false;
                match result {
                    Ok(created) => {
                        updates.push(Update::Seeded(created));
                        if created > 0 {
                            self.load_library();
                        }
                    }
                    Err(err) => updates.push(Update::SeedFailed(err.to_string())),
                }
            }
            Event::Watched(result) => {
                self.marking = false;
                match result {
                    Ok(()) => {
                        updates.push(Update::Watched);
                        self.load_library();
                    }
                    Err(err) => updates.push(Update::WatchFailed(err.to_string())),
                }
            }
            Event::Posted(result) => {
                self.publishing = false;
                match result {
                    Ok(_) => {
                        updates.push(Update::Posted);
                        self.load_posts();
                    }
                    Err(err) => updates.push(Update::PostFailed(err.to_string())),
                }
            }
        }
    }

    fn note_library(&self, updates: &mut Vec<Update>) {
        if let Remote::Failed { error, .. } = &self.videos {
            updates.push(Update::LibraryFailed(error.to_string()));
            return;
        }
        if let Remote::Failed { error, .. } = &self.progress_map {
            updates.push(Update::LibraryFailed(error.to_string()));
            return;
        }
        if self.videos.is_loaded() && self.progress_map.is_loaded() {
            updates.push(Update::LibraryLoaded);
        }
    }
}

/// Comma-separated topics: trimmed, empty segments dropped.
pub fn parse_topics(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Mutex};
    use std::time::{Duration, Instant};

    use super::*;
    use crate::academy::{Level, Plan, VideoSpec};

    fn video(id: &str, duration_sec: Option<i64>) -> Video {
        Video {
            id: id.into(),
            title: format!("video {}", id),
            description: String::new(),
            url: String::new(),
            duration_sec,
            level: Level::Beginner,
            topics: Vec::new(),
            requires_plan: Plan::Basic,
        }
    }

    fn record(video_id: &str, percent: i64) -> ProgressRecord {
        ProgressRecord {
            user_id: "demo-user-1".into(),
            video_id: video_id.into(),
            percent,
            last_position_sec: 0,
        }
    }

    #[derive(Default)]
    struct FakeCatalog {
        videos: Mutex<Vec<Video>>,
        created: Mutex<Vec<VideoSpec>>,
        list_calls: AtomicUsize,
    }

    impl FakeCatalog {
        fn with_videos(videos: Vec<Video>) -> Self {
            Self {
                videos: Mutex::new(videos),
                ..Default::default()
            }
        }
    }

    impl CatalogService for FakeCatalog {
        fn list_videos(&self) -> Result<Vec<Video>, academy::Error> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.videos.lock().unwrap().clone())
        }

        fn create_video(&self, spec: &VideoSpec) -> Result<Video, academy::Error> {
            let mut created = self.created.lock().unwrap();
            created.push(spec.clone());
            Ok(video(&format!("seed-{}", created.len()), spec.duration_sec))
        }
    }

    #[derive(Default)]
    struct FakeProgress {
        records: Mutex<Vec<ProgressRecord>>,
        submitted: Mutex<Vec<ProgressRecord>>,
        list_calls: AtomicUsize,
        fail_submit: bool,
    }

    impl FakeProgress {
        fn with_records(records: Vec<ProgressRecord>) -> Self {
            Self {
                records: Mutex::new(records),
                ..Default::default()
            }
        }
    }

    impl ProgressService for FakeProgress {
        fn list_progress(&self, _user_id: &str) -> Result<Vec<ProgressRecord>, academy::Error> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.records.lock().unwrap().clone())
        }

        fn record_progress(&self, entry: &ProgressRecord) -> Result<(), academy::Error> {
            if self.fail_submit {
                return Err(academy::Error::Validation("injected failure".into()));
            }
            self.submitted.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeForum {
        posts: Mutex<Vec<ForumPost>>,
        created: Mutex<Vec<PostSpec>>,
        list_calls: AtomicUsize,
        gate: Option<Mutex<mpsc::Receiver<()>>>,
    }

    impl ForumService for FakeForum {
        fn list_posts(&self) -> Result<Vec<ForumPost>, academy::Error> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.posts.lock().unwrap().clone())
        }

        fn create_post(&self, spec: &PostSpec) -> Result<ForumPost, academy::Error> {
            if let Some(gate) = &self.gate {
                let _ = gate.lock().unwrap().recv();
            }
            self.created.lock().unwrap().push(spec.clone());
            Ok(ForumPost {
                id: "p1".into(),
                user_id: spec.user_id.clone(),
                title: spec.title.clone(),
                content: spec.content.clone(),
                topics: spec.topics.clone(),
            })
        }
    }

    struct Fixture {
        catalog: Arc<FakeCatalog>,
        progress: Arc<FakeProgress>,
        forum: Arc<FakeForum>,
        store: Store,
    }

    fn fixture(catalog: FakeCatalog, progress: FakeProgress, forum: FakeForum) -> Fixture {
        let catalog = Arc::new(catalog);
        let progress = Arc::new(progress);
        let forum = Arc::new(forum);
        let store = Store::new(
            catalog.clone(),
            progress.clone(),
            forum.clone(),
            "demo-user-1".into(),
        );
        Fixture {
            catalog,
            progress,
            forum,
            store,
        }
    }

    fn drain_until(
        store: &mut Store,
        mut done: impl FnMut(&[Update]) -> bool,
    ) -> Vec<Update> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = Vec::new();
        while Instant::now() < deadline {
            seen.extend(store.poll());
            if done(&seen) {
                return seen;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("timed out waiting for store updates; saw {:?}", seen);
    }

    fn contains(updates: &[Update], wanted: &Update) -> bool {
        updates.iter().any(|update| update == wanted)
    }

    #[test]
    fn load_library_merges_videos_and_progress() {
        let mut fx = fixture(
            FakeCatalog::with_videos(vec![video("v1", Some(780)), video("v2", None)]),
            FakeProgress::with_records(vec![
                record("v1", 40),
                record("v2", 100),
                record("v1", 75),
            ]),
            FakeForum::default(),
        );
        fx.store.load_library();
        assert!(fx.store.library_loading());
        drain_until(&mut fx.store, |seen| {
            contains(seen, &Update::LibraryLoaded)
        });
        assert!(!fx.store.library_loading());
        assert_eq!(fx.store.videos().len(), 2);
        assert_eq!(fx.store.percent_for("v1"), Some(75));
        assert_eq!(fx.store.percent_for("v2"), Some(100));
        assert_eq!(fx.store.percent_for("missing"), None);
        assert_eq!(fx.store.completed_count(), 1);
        assert!(fx.store.videos_state().is_loaded());
        assert!(fx.store.progress_state().is_loaded());
    }

    #[test]
    fn load_posts_settles_the_posts_state() {
        let mut fx = fixture(
            FakeCatalog::default(),
            FakeProgress::default(),
            FakeForum::default(),
        );
        assert!(matches!(fx.store.posts_state(), Remote::Idle));
        fx.store.load_posts();
        assert!(fx.store.posts_loading());
        drain_until(&mut fx.store, |seen| contains(seen, &Update::PostsLoaded));
        assert!(fx.store.posts_state().is_loaded());
        assert!(fx.store.posts().is_empty());
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        struct FlakyCatalog {
            calls: AtomicUsize,
        }

        impl CatalogService for FlakyCatalog {
            fn list_videos(&self) -> Result<Vec<Video>, academy::Error> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(vec![video("v1", None)])
                } else {
                    Err(academy::Error::Validation("injected failure".into()))
                }
            }

            fn create_video(&self, _spec: &VideoSpec) -> Result<Video, academy::Error> {
                Err(academy::Error::Validation("unused".into()))
            }
        }

        let catalog = Arc::new(FlakyCatalog {
            calls: AtomicUsize::new(0),
        });
        let progress = Arc::new(FakeProgress::default());
        let forum = Arc::new(FakeForum::default());
        let mut store = Store::new(catalog, progress, forum, "demo-user-1".into());

        store.load_library();
        drain_until(&mut store, |seen| contains(seen, &Update::LibraryLoaded));
        assert_eq!(store.videos().len(), 1);

        store.load_library();
        let updates = drain_until(&mut store, |seen| {
            seen.iter()
                .any(|update| matches!(update, Update::LibraryFailed(_)))
        });
        assert!(updates
            .iter()
            .any(|update| matches!(update, Update::LibraryFailed(_))));
        // Stale but consistent: the previous snapshot survives.
        assert_eq!(store.videos().len(), 1);
        assert!(matches!(store.videos_state(), Remote::Failed { .. }));
        assert!(!store.library_loading());
    }

    #[test]
    fn mark_watched_submits_full_percent_and_duration() {
        let mut fx = fixture(
            FakeCatalog::default(),
            FakeProgress::default(),
            FakeForum::default(),
        );
        fx.store.mark_watched(&video("v1", Some(780)));
        drain_until(&mut fx.store, |seen| contains(seen, &Update::Watched));
        let submitted = fx.progress.submitted.lock().unwrap().clone();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].user_id, "demo-user-1");
        assert_eq!(submitted[0].video_id, "v1");
        assert_eq!(submitted[0].percent, 100);
        assert_eq!(submitted[0].last_position_sec, 780);
    }

    #[test]
    fn mark_watched_without_duration_submits_zero_position() {
        let mut fx = fixture(
            FakeCatalog::default(),
            FakeProgress::default(),
            FakeForum::default(),
        );
        fx.store.mark_watched(&video("v2", None));
        drain_until(&mut fx.store, |seen| contains(seen, &Update::Watched));
        let submitted = fx.progress.submitted.lock().unwrap().clone();
        assert_eq!(submitted[0].last_position_sec, 0);
    }

    #[test]
    fn successful_mark_watched_reloads_library_once() {
        let mut fx = fixture(
            FakeCatalog::default(),
            FakeProgress::default(),
            FakeForum::default(),
        );
        fx.store.mark_watched(&video("v1", Some(780)));
        drain_until(&mut fx.store, |seen| contains(seen, &Update::LibraryLoaded));
        assert_eq!(fx.catalog.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fx.progress.list_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_mark_watched_changes_nothing() {
        let mut fx = fixture(
            FakeCatalog::default(),
            FakeProgress {
                fail_submit: true,
                ..Default::default()
            },
            FakeForum::default(),
        );
        fx.store.mark_watched(&video("v1", Some(780)));
        drain_until(&mut fx.store, |seen| {
            seen.iter()
                .any(|update| matches!(update, Update::WatchFailed(_)))
        });
        assert!(!fx.store.marking());
        assert_eq!(fx.catalog.list_calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.progress.list_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn create_post_rejects_empty_fields_before_dispatch() {
        let mut fx = fixture(
            FakeCatalog::default(),
            FakeProgress::default(),
            FakeForum::default(),
        );
        let err = fx.store.create_post("", "content", "").unwrap_err();
        assert!(err.is_validation());
        let err = fx.store.create_post("title", "", "").unwrap_err();
        assert!(err.is_validation());
        assert!(fx.forum.created.lock().unwrap().is_empty());
        assert!(!fx.store.publishing());
    }

    #[test]
    fn successful_post_parses_topics_and_reloads_posts_once() {
        let mut fx = fixture(
            FakeCatalog::default(),
            FakeProgress::default(),
            FakeForum::default(),
        );
        fx.store
            .create_post("Conseils", "Du contenu", "technique, question ,")
            .unwrap();
        drain_until(&mut fx.store, |seen| contains(seen, &Update::PostsLoaded));
        let created = fx.forum.created.lock().unwrap().clone();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].user_id, "demo-user-1");
        assert_eq!(created[0].topics, vec!["technique", "question"]);
        assert_eq!(fx.forum.list_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_submit_is_suppressed_while_publishing() {
        let (release, gate) = mpsc::channel();
        let mut fx = fixture(
            FakeCatalog::default(),
            FakeProgress::default(),
            FakeForum {
                gate: Some(Mutex::new(gate)),
                ..Default::default()
            },
        );
        fx.store.create_post("Titre", "Contenu", "").unwrap();
        assert!(fx.store.publishing());
        // Second submit while the first is in flight is dropped.
        fx.store.create_post("Titre", "Contenu", "").unwrap();
        release.send(()).unwrap();
        drain_until(&mut fx.store, |seen| contains(seen, &Update::Posted));
        assert_eq!(fx.forum.created.lock().unwrap().len(), 1);
    }

    #[test]
    fn ensure_seed_with_populated_catalog_is_a_no_op() {
        let mut fx = fixture(
            FakeCatalog::with_videos(vec![video("v1", None)]),
            FakeProgress::default(),
            FakeForum::default(),
        );
        fx.store.load_library();
        drain_until(&mut fx.store, |seen| contains(seen, &Update::LibraryLoaded));
        fx.store.ensure_seed();
        assert!(!fx.store.seeding());
        assert!(fx.catalog.created.lock().unwrap().is_empty());
    }

    #[test]
    fn ensure_seed_creates_demo_videos_and_reloads() {
        let mut fx = fixture(
            FakeCatalog::default(),
            FakeProgress::default(),
            FakeForum::default(),
        );
        fx.store.ensure_seed();
        assert!(fx.store.seeding());
        let updates = drain_until(&mut fx.store, |seen| {
            contains(seen, &Update::LibraryLoaded)
        });
        assert!(contains(&updates, &Update::Seeded(3)));
        let created = fx.catalog.created.lock().unwrap().clone();
        assert_eq!(created, *seed::SEED_VIDEOS);
        assert_eq!(fx.catalog.list_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn parse_topics_trims_and_drops_empty_segments() {
        assert_eq!(
            parse_topics("technique, question ,"),
            vec!["technique", "question"]
        );
        assert_eq!(parse_topics(""), Vec::<String>::new());
        assert_eq!(parse_topics(" , ,"), Vec::<String>::new());
    }
}
