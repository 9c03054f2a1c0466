use std::sync::Arc;

use crate::academy::{self, ForumPost, PostSpec, ProgressRecord, Video, VideoSpec};

pub trait CatalogService: Send + Sync {
    fn list_videos(&self) -> Result<Vec<Video>, academy::Error>;
    fn create_video(&self, spec: &VideoSpec) -> Result<Video, academy::Error>;
}

pub trait ProgressService: Send + Sync {
    fn list_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, academy::Error>;
    fn record_progress(&self, entry: &ProgressRecord) -> Result<(), academy::Error>;
}

pub trait ForumService: Send + Sync {
    fn list_posts(&self) -> Result<Vec<ForumPost>, academy::Error>;
    fn create_post(&self, spec: &PostSpec) -> Result<ForumPost, academy::Error>;
}

pub struct AcademyCatalogService {
    client: Arc<academy::Client>,
}

impl AcademyCatalogService {
    pub fn new(client: Arc<academy::Client>) -> Self {
        Self { client }
    }
}

impl CatalogService for AcademyCatalogService {
    fn list_videos(&self) -> Result<Vec<Video>, academy::Error> {
        self.client.videos()
    }

    fn create_video(&self, spec: &VideoSpec) -> Result<Video, academy::Error> {
        self.client.create_video(spec)
    }
}

pub struct AcademyProgressService {
    client: Arc<academy::Client>,
}

impl AcademyProgressService {
    pub fn new(client: Arc<academy::Client>) -> Self {
        Self { client }
    }
}

impl ProgressService for AcademyProgressService {
    fn list_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, academy::Error> {
        self.client.progress(user_id)
    }

    fn record_progress(&self, entry: &ProgressRecord) -> Result<(), academy::Error> {
        self.client.record_progress(entry)
    }
}

pub struct AcademyForumService {
    client: Arc<academy::Client>,
}

impl AcademyForumService {
    pub fn new(client: Arc<academy::Client>) -> Self {
        Self { client }
    }
}

impl ForumService for AcademyForumService {
    fn list_posts(&self) -> Result<Vec<ForumPost>, academy::Error> {
        self.client.posts()
    }

    fn create_post(&self, spec: &PostSpec) -> Result<ForumPost, academy::Error> {
        self.client.create_post(spec)
    }
}
