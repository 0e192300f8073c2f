mod error;
pub mod store;

pub use error::SqliteDaoError;
pub use store::SqliteGameStore;

use crate::dao::storage::{StorageError, StorageOp};

impl From<SqliteDaoError> for StorageError {
    fn from(err: SqliteDaoError) -> Self {
        let op = match &err {
            SqliteDaoError::Open { .. } | SqliteDaoError::Schema { .. } => StorageOp::Setup,
            SqliteDaoError::LoadChannel { .. }
            | SqliteDaoError::Decode { .. }
            | SqliteDaoError::CorruptRow { .. } => StorageOp::ChannelRead,
            SqliteDaoError::RegisterChannel { .. } => StorageOp::ChannelRegistration,
            SqliteDaoError::SongLookup { .. } => StorageOp::SongLookup,
            SqliteDaoError::CommitAnswer { .. } => StorageOp::AnswerCommit,
            SqliteDaoError::LoadStats { .. } => StorageOp::StatsRead,
        };
        StorageError::unavailable(op, err.to_string(), err)
    }
}
