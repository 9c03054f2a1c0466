use std::sync::Arc;

use anyhow::{Context, Result};

use crate::academy;
use crate::config;
use crate::data::{
    AcademyCatalogService, AcademyForumService, AcademyProgressService, CatalogService,
    ForumService, ProgressService,
};
use crate::store::Store;
use crate::ui;

pub fn run() -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    let config_path = config::default_path();
    let display_path = friendly_path(config_path.as_ref());

    let user_agent = if !cfg.api.user_agent.trim().is_empty() {
        cfg.api.user_agent.clone()
    } else {
        format!("kwoon/{}", crate::VERSION)
    };

    let client = academy::Client::new(academy::ClientConfig {
        user_agent,
        base_url: Some(cfg.api.base_url.clone()),
        http_client: None,
    })
    .context("initialize academy client")?;
    let client = Arc::new(client);

    let catalog: Arc<dyn CatalogService> = Arc::new(AcademyCatalogService::new(client.clone()));
    let progress: Arc<dyn ProgressService> = Arc::new(AcademyProgressService::new(client.clone()));
    let forum: Arc<dyn ForumService> = Arc::new(AcademyForumService::new(client));

    let store = Store::new(catalog, progress, forum, cfg.api.user_id.clone());

    let options = ui::Options {
        store,
        config_path: display_path,
    };

    let mut model = ui::Model::new(options);
    model.run()
}

fn friendly_path(path: Option<&std::path::PathBuf>) -> String {
    if let Some(path) = path {
        if let Some(home) = dirs::home_dir() {
            if let Ok(stripped) = path.strip_prefix(&home) {
                let mut display = String::from("~");
                if !stripped.as_os_str().is_empty() {
                    display.push_str(&format!("/{}", stripped.display()));
                }
                return display;
            }
        }
        path.display().to_string()
    } else {
        "~/.config/kwoon/config.yaml".to_string()
    }
}
