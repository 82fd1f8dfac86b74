use crate::certificate::CertificateRenderer;
use crate::config::Config;
use crate::storage::{FileStore, UploadLimits};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub uploads: FileStore,
    pub templates: FileStore,
    pub renderer: CertificateRenderer,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let renderer =
            CertificateRenderer::new(&config.templates_folder, config.fonts_folder.as_deref());
        Self {
            uploads: FileStore::new(&config.upload_folder),
            templates: FileStore::new(&config.templates_folder),
            renderer,
            config,
        }
    }

    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_size: self.config.max_file_size,
            max_batch_size: self.config.max_batch_size,
        }
    }
}
