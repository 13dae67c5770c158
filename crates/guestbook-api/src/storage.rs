use anyhow::{Context, Result};
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// URL prefix under which stored blobs are served.
pub const UPLOADS_PREFIX: &str = "/uploads";

/// On-disk store for uploaded file content.
///
/// Each upload is a flat file at `{dir}/{generated name}`. Records refer to
/// blobs by their access path, `/uploads/{generated name}`.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `content` under a freshly generated name and return its access path.
    pub async fn store(&self, content: &[u8], original_name: &str) -> Result<String> {
        let file_name = generate_file_name(original_name);
        self.write_new(&file_name, content).await?;
        debug!("Stored {} ({} bytes) as {}", original_name, content.len(), file_name);
        Ok(format!("{}/{}", UPLOADS_PREFIX, file_name))
    }

    /// Create `file_name` in the upload directory. Fails if it already exists.
    async fn write_new(&self, file_name: &str, content: &[u8]) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.dir.join(file_name))
            .await
            .with_context(|| format!("failed to create blob {}", file_name))?;
        file.write_all(content).await?;
        file.flush().await?;
        Ok(())
    }

    /// Remove the blob behind `access_path`. Returns false if it was already gone.
    pub async fn delete(&self, access_path: &str) -> Result<bool> {
        // Only the last component counts, so a stored path can't point outside `dir`.
        let Some(file_name) = Path::new(access_path).file_name() else {
            warn!("Refusing to delete blob with unusable path {:?}", access_path);
            return Ok(false);
        };

        match fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => {
                info!("Deleted blob {}", access_path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Blob {} already gone", access_path);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// `files-{unix millis}-{random}{.ext}`, keeping the original extension when it is plain ASCII.
fn generate_file_name(original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    format!("files-{}-{}{}", millis, suffix, ext)
}
