use crate::service::KeyService;

#[derive(Clone)]
pub struct AppState {
    pub keys: KeyService,
}

impl AppState {
    pub fn new(keys: KeyService) -> Self {
        Self { keys }
    }
}
