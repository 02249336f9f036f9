mod cli;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use cli::Opts;
use snafu::{FromString, ResultExt, Snafu, Whatever};
use tidings_core::{AccountId, Timestamp};
use tidings_db::{Database, DbError, Fixture};
use tidings_feed::{
    Clock, ContentStore, FeedConfigError, FeedError, FeedResolver, FollowEdgeStore,
    FollowGraphReader, RequestCtx, SystemClock,
};
use tidings_util_error::WhateverResult;
use tidings_web::{Server, WebServerError};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub const LOG_TARGET: &str = "tidings::cli";

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("Web server error: {source}"))]
    WebServer { source: WebServerError },
    #[snafu(display("Feed error: {source}"))]
    Feed { source: FeedError },
    #[snafu(display("Invalid feed configuration: {source}"))]
    Config { source: FeedConfigError },
    #[snafu(display("Miscellaneous error: {source}"))]
    Whatever { source: Whatever },
    #[snafu(display("Data dir error: {source:?}"))]
    DataDir { source: io::Error },
    #[snafu(display("Database error: {source}"))]
    Database { source: DbError },
    #[snafu(display("Could not read fixture {}: {source}", path.display()))]
    FixtureRead { source: io::Error, path: PathBuf },
    #[snafu(display("Invalid fixture {}: {source}", path.display()))]
    FixtureParse {
        source: serde_json::Error,
        path: PathBuf,
    },
}

pub type CliResult<T> = std::result::Result<T, CliError>;

#[snafu::report]
#[tokio::main]
async fn main() -> CliResult<()> {
    init_logging().context(WhateverSnafu)?;

    let opts = Opts::parse();
    match handle_cmd(opts).await {
        Ok(v) => {
            println!("{}", serde_json::to_string_pretty(&v).expect("Can't fail"));
            Ok(())
        }
        Err(err) => Err(err),
    }
}

async fn open_db(opts: &Opts) -> CliResult<Arc<Database>> {
    let path = Database::mk_db_path(opts.global.data_dir())
        .await
        .context(DataDirSnafu)?;
    Ok(Arc::new(Database::open(path).await.context(DatabaseSnafu)?))
}

async fn handle_cmd(opts: Opts) -> CliResult<serde_json::Value> {
    Ok(match opts.cmd {
        cli::OptsCmd::GenId => {
            serde_json::json!({ "accountId": AccountId::random() })
        }
        cli::OptsCmd::Serve(ref serve_opts) => {
            let config = serve_opts.feed.to_config().context(ConfigSnafu)?;
            let db = open_db(&opts).await?;
            let resolver = FeedResolver::new(
                FollowGraphReader::new(db.clone() as Arc<dyn FollowEdgeStore>),
                db as Arc<dyn ContentStore>,
                Arc::new(SystemClock) as Arc<dyn Clock>,
                config,
            );

            let server = Server::init(serve_opts.web_opts(), resolver)
                .await
                .context(WebServerSnafu)?;
            info!(
                target: LOG_TARGET,
                addr = %server.addr().context(WebServerSnafu)?,
                "Serving feed"
            );
            server.run().await.context(WebServerSnafu)?;

            serde_json::Value::Null
        }
        cli::OptsCmd::Feed {
            viewer,
            page,
            page_size,
            ref feed,
        } => {
            let config = feed.to_config().context(ConfigSnafu)?;
            let db = open_db(&opts).await?;
            let request = config.page_request(page, page_size);
            let mut ctx = RequestCtx::new();
            if let Some(timeout) = config.request_timeout {
                ctx = ctx.with_timeout(timeout);
            }

            let resolver =
                FeedResolver::new(FollowGraphReader::new(db.clone()), db, SystemClock, config);
            let page = resolver
                .resolve_page(&ctx, viewer, Some(request))
                .await
                .context(FeedSnafu)?;

            serde_json::to_value(page).expect("Can't fail")
        }
        cli::OptsCmd::Import { ref file } => {
            let bytes = tokio::fs::read(file)
                .await
                .context(FixtureReadSnafu { path: file.clone() })?;
            let fixture: Fixture = serde_json::from_slice(&bytes)
                .context(FixtureParseSnafu { path: file.clone() })?;

            let db = open_db(&opts).await?;
            let summary = db
                .import(&fixture, Timestamp::now())
                .await
                .context(DatabaseSnafu)?;

            serde_json::to_value(summary).expect("Can't fail")
        }
        cli::OptsCmd::Dump { account } => {
            let db = open_db(&opts).await?;
            let followees = db.followees(account).await.context(DatabaseSnafu)?;
            let followers = db.followers(account).await.context(DatabaseSnafu)?;
            let posts = db.posts_of(account).await.context(DatabaseSnafu)?;

            serde_json::json!({
                "account": account,
                "followees": followees,
                "followers": followers,
                "posts": posts,
            })
        }
    })
}

pub fn init_logging() -> WhateverResult<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|_| Whatever::without_source("Failed to initialize logging".to_string()))?;

    Ok(())
}
