use homefix_shared::Session;

use crate::ClientResult;

/// Device storage for the persisted session. Reads are synchronous so a
/// session can be restored before any other component starts.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> ClientResult<Option<Session>>;
    fn save(&self, session: &Session) -> ClientResult<()>;
    fn clear(&self) -> ClientResult<()>;
}
