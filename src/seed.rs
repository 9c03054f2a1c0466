use once_cell::sync::Lazy;

use crate::academy::{self, Level, Plan, Video, VideoSpec};
use crate::data::CatalogService;

/// Demo catalog created on first run, in this order.
pub static SEED_VIDEOS: Lazy<Vec<VideoSpec>> = Lazy::new(|| {
    vec![
        VideoSpec {
            title: "Siu Nim Tao – Principes de base".into(),
            description: "La première forme du Wing Chun, structure et relaxation".into(),
            url: "https://example.com/siu-nim-tao".into(),
            duration_sec: Some(780),
            level: Level::Beginner,
            topics: vec!["formes".into(), "structure".into()],
            requires_plan: Plan::Basic,
        },
        VideoSpec {
            title: "Chum Kiu – Mouvement du corps".into(),
            description: "Transitions et pivots".into(),
            url: "https://example.com/chum-kiu".into(),
            duration_sec: Some(820),
            level: Level::Intermediate,
            topics: vec!["formes".into(), "mobilité".into()],
            requires_plan: Plan::Premium,
        },
        VideoSpec {
            title: "Chi Sao avancé".into(),
            description: "Sensibilité, timing, et applications".into(),
            url: "https://example.com/chi-sao".into(),
            duration_sec: Some(900),
            level: Level::Advanced,
            topics: vec!["applications".into(), "chi sao".into()],
            requires_plan: Plan::Vip,
        },
    ]
});

/// No-op when the catalog already has at least one entry. Otherwise
/// issues the seed creates one at a time in list order; a failure
/// part-way leaves the prefix created and is returned as-is (no
/// rollback, no retry). Returns how many videos were created.
pub fn ensure_seed(
    catalog: &dyn CatalogService,
    current_videos: &[Video],
) -> Result<usize, academy::Error> {
    if !current_videos.is_empty() {
        return Ok(0);
    }
    let mut created = 0;
    for spec in SEED_VIDEOS.iter() {
        catalog.create_video(spec)?;
        created += 1;
    }
    Ok(created)
}
