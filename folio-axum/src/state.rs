use std::sync::Arc;

use folio_core::FolioApp;

pub struct FolioAxumState<R, P> {
    pub app: Arc<FolioApp<R, P>>,
}

impl<R, P> Clone for FolioAxumState<R, P> {
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
        }
    }
}
