use agrireg_core::error::CoreError;

use crate::remote::RemoteError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("User is not authenticated")]
    Unauthenticated,

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
