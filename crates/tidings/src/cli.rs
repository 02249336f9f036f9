use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tidings_core::AccountId;
use tidings_feed::{FeedConfig, FeedConfigError, PagePolicy};

/// Command line options for the Tidings feed service
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Opts {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub cmd: OptsCmd,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Directory holding the database
    #[arg(env = "TIDINGS_DATA_DIR", long, global = true)]
    pub data_dir: Option<PathBuf>,
}

static PROJECTS_DIR: LazyLock<directories::ProjectDirs> = LazyLock::new(|| {
    directories::ProjectDirs::from("org", "Tidings", "tidings")
        .expect("Unable to determine project's dir")
});

impl GlobalOpts {
    pub fn data_dir(&self) -> &Path {
        self.data_dir.as_deref().unwrap_or_else(|| {
            PROJECTS_DIR
                .state_dir()
                .unwrap_or_else(|| PROJECTS_DIR.data_local_dir())
        })
    }
}

#[derive(Debug, Subcommand)]
pub enum OptsCmd {
    /// Generate a new random account id
    GenId,
    /// Serve the feed HTTP API
    Serve(ServeOpts),
    /// Resolve one page of a viewer's feed from the local database
    Feed {
        #[arg(long)]
        viewer: AccountId,

        #[arg(long)]
        page: Option<i64>,

        #[arg(long)]
        page_size: Option<i64>,

        #[command(flatten)]
        feed: FeedOpts,
    },
    /// Load follow edges and posts from a JSON fixture
    Import {
        #[arg(long)]
        file: PathBuf,
    },
    /// Show what the database knows about an account
    Dump {
        #[arg(long)]
        account: AccountId,
    },
}

#[derive(Debug, Args)]
pub struct ServeOpts {
    /// Listen address
    #[arg(long, short, default_value = "[::1]:3000", env = "TIDINGS_LISTEN")]
    pub listen: String,

    /// Set SO_REUSEPORT
    #[arg(long, env = "TIDINGS_REUSEPORT")]
    pub reuseport: bool,

    /// Cors origin settings
    #[arg(long, env = "TIDINGS_CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    #[command(flatten)]
    pub feed: FeedOpts,
}

impl ServeOpts {
    pub fn web_opts(&self) -> tidings_web::Opts {
        tidings_web::Opts::new(self.listen.clone(), self.cors_origin.clone(), self.reuseport)
    }
}

#[derive(Debug, Args)]
pub struct FeedOpts {
    /// `pageSize` used when a request doesn't send one
    #[arg(long, env = "TIDINGS_DEFAULT_PAGE_SIZE", default_value_t = FeedConfig::DEFAULT_PAGE_SIZE)]
    pub default_page_size: u64,

    /// Largest `pageSize` a request may ask for
    #[arg(long, env = "TIDINGS_MAX_PAGE_SIZE", default_value_t = tidings_core::PageLimits::DEFAULT_MAX_PAGE_SIZE)]
    pub max_page_size: u64,

    /// What to do with out of range page parameters: `reject` or `clamp`
    #[arg(long, env = "TIDINGS_PAGE_POLICY", default_value_t = PagePolicy::Reject)]
    pub page_policy: PagePolicy,

    /// Give up on a feed request after this many milliseconds
    #[arg(long, env = "TIDINGS_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,
}

impl FeedOpts {
    pub fn to_config(&self) -> Result<FeedConfig, FeedConfigError> {
        let config = FeedConfig::builder()
            .default_page_size(self.default_page_size)
            .max_page_size(self.max_page_size)
            .page_policy(self.page_policy)
            .maybe_request_timeout(self.request_timeout_ms.map(Duration::from_millis))
            .build();
        config.validate()?;
        Ok(config)
    }
}
