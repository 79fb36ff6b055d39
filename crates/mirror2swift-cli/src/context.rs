use mirror2swift_core::repos::YumRepoDir;

/// Host facts resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub repo_feed: YumRepoDir,
    pub repos_available: bool,
}

impl AppContext {
    pub fn load() -> Self {
        let repo_feed = YumRepoDir::system();
        let repos_available = repo_feed.is_available();
        Self {
            repo_feed,
            repos_available,
        }
    }
}
