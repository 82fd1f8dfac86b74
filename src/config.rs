use std::path::PathBuf;

const MB: u64 = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub templates_folder: PathBuf,
    pub upload_folder: PathBuf,
    pub samples_folder: PathBuf,
    pub fonts_folder: Option<PathBuf>,
    pub max_file_size: u64,
    pub max_batch_size: u64,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let templates_folder = base_dir.join(
            std::env::var("TEMPLATES_FOLDER").unwrap_or_else(|_| "certificates".to_string()),
        );
        let upload_folder = base_dir.join(
            std::env::var("UPLOAD_FOLDER").unwrap_or_else(|_| "uploads".to_string()),
        );
        let samples_folder = base_dir.join(
            std::env::var("SAMPLES_FOLDER").unwrap_or_else(|_| "testingUploads".to_string()),
        );
        let fonts_folder = std::env::var("FONTS_FOLDER")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(|dir| base_dir.join(dir));

        let max_file_size = size_from_env("MAX_FILE_SIZE_MB", 10)?;
        let max_batch_size = size_from_env("MAX_BATCH_SIZE_MB", 50)?;
        if max_file_size > max_batch_size {
            return Err("MAX_FILE_SIZE_MB must not exceed MAX_BATCH_SIZE_MB".into());
        }

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8787".to_string())
            .parse()
            .unwrap_or(8787);

        Ok(Self {
            templates_folder,
            upload_folder,
            samples_folder,
            fonts_folder,
            max_file_size,
            max_batch_size,
            host,
            port,
        })
    }

    /// Configuration rooted at `root`, with the default limits. Used by the
    /// tests to keep all I/O inside a temporary directory.
    #[cfg(test)]
    pub fn rooted_at(root: &std::path::Path) -> Self {
        Self {
            templates_folder: root.join("certificates"),
            upload_folder: root.join("uploads"),
            samples_folder: root.join("testingUploads"),
            fonts_folder: None,
            max_file_size: 10 * MB,
            max_batch_size: 50 * MB,
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }
}

fn size_from_env(key: &str, default_mb: u64) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
    match std::env::var(key) {
        Ok(value) => {
            let mb: u64 = value
                .trim()
                .parse()
                .map_err(|_| format!("{} must be a whole number of megabytes", key))?;
            Ok(mb * MB)
        }
        Err(_) => Ok(default_mb * MB),
    }
}
