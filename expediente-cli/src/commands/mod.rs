pub mod audit;
pub mod documents;
pub mod init;
pub mod list;
pub mod migrate;
pub mod register;
pub mod show;
pub mod verify;

use expediente_core::storage::Storage;
use expediente_core::Status;
use expediente_session::Session;

/// The status dataset a record identifier currently lives in.
///
/// Scans all four datasets instead of trusting the prefix, so records
/// with legacy unprefixed identifiers are still found.
pub(crate) fn locate_status<S>(session: &Session<S>, identifier: &str) -> Option<Status>
where
    S: Storage + Clone,
{
    Status::ALL
        .into_iter()
        .find(|status| session.dataset(*status).find_by_identifier(identifier).is_some())
}
