use redb_bincode::ReadableTable as _;
use tracing::{debug, info};

use crate::{
    Database, DbResult, DbVersionTooHighSnafu, LOG_TARGET, db_version, follows_by_follower,
    follows_by_following, posts, posts_by_author,
};

impl Database {
    /// Bumped on every schema change, together with a new migration arm
    pub(crate) const DB_VER: u64 = 0;

    pub(crate) fn init_tables_tx(tx: &redb_bincode::WriteTransaction) -> DbResult<()> {
        tx.open_table(&db_version::TABLE)?;

        tx.open_table(&follows_by_follower::TABLE)?;
        tx.open_table(&follows_by_following::TABLE)?;

        tx.open_table(&posts::TABLE)?;
        tx.open_table(&posts_by_author::TABLE)?;
        Ok(())
    }

    pub(crate) fn handle_db_ver_migrations(dbtx: &redb_bincode::WriteTransaction) -> DbResult<()> {
        let mut table_db_ver = dbtx.open_table(&db_version::TABLE)?;

        let Some(cur_db_ver) = table_db_ver.first()?.map(|g| g.1.value()) else {
            info!(target: LOG_TARGET, "Initializing new database");
            table_db_ver.insert(&(), &Self::DB_VER)?;

            return Ok(());
        };

        if Self::DB_VER < cur_db_ver {
            return DbVersionTooHighSnafu {
                db_ver: cur_db_ver,
                code_ver: Self::DB_VER,
            }
            .fail();
        }

        // No migrations yet; the first schema change adds a `match` over
        // `cur_db_ver` here
        debug!(target: LOG_TARGET, db_ver = cur_db_ver, "Db version");

        Ok(())
    }
}
