use crate::{
    domain::{ItemId, PipelineConfig, PipelineSnapshot, Stage, StageCollection},
    error::{PipelineError, RemoteError, Result},
    sync::{PipelineSource, RemoteSync},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};

/// A stage change recorded by the file backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChange {
    pub item_id: ItemId,
    pub from_stage: Stage,
    pub to_stage: Stage,
    pub changed_at: DateTime<Utc>,
}

/// File-based pipeline backend
pub struct FileBackend {
    root_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBackend {
    const PIPELINE_DIR: &'static str = ".pipeline";
    const PIPELINE_FILE: &'static str = "pipeline.json";
    const CHANGES_FILE: &'static str = "changes.json";

    /// Creates a new FileBackend for the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::PIPELINE_DIR),
            write_lock: Mutex::new(()),
        }
    }

    fn pipeline_file(&self) -> PathBuf {
        self.root_path.join(Self::PIPELINE_FILE)
    }

    fn changes_file(&self) -> PathBuf {
        self.root_path.join(Self::CHANGES_FILE)
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    /// Creates the backend directory and an empty pipeline for the
    /// configured stages, keeping any existing pipeline file
    pub async fn initialize(&self, config: &PipelineConfig) -> Result<()> {
        config.validate()?;
        self.ensure_directory_exists(&self.root_path).await?;

        if !self.pipeline_file().exists() {
            let empty = StageCollection::new(config.stages.clone())?;
            self.save_snapshot(&empty.to_snapshot()).await?;
        }

        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.root_path.exists() && self.pipeline_file().exists()
    }

    /// Replaces the stored pipeline
    pub async fn save_snapshot(&self, snapshot: &PipelineSnapshot) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;

        let json = serde_json::to_string_pretty(snapshot)?;
        Self::write_atomic(&self.pipeline_file(), json).await
    }

    pub async fn load_snapshot(&self) -> Result<PipelineSnapshot> {
        let file_path = self.pipeline_file();

        if !file_path.exists() {
            return Err(PipelineError::NotInitialized);
        }

        let contents = fs::read_to_string(&file_path).await?;
        let snapshot: PipelineSnapshot = serde_json::from_str(&contents)?;
        Ok(snapshot)
    }

    /// All recorded stage changes, oldest first
    pub async fn load_changes(&self) -> Result<Vec<StageChange>> {
        let file_path = self.changes_file();

        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&file_path).await?;
        let changes: Vec<StageChange> = serde_json::from_str(&contents)?;
        Ok(changes)
    }

    fn staging_path(path: &Path) -> PathBuf {
        path.with_extension("json.tmp")
    }

    /// Replaces a file through a sibling temp file
    async fn write_atomic(path: &Path, contents: String) -> Result<()> {
        let staged = Self::staging_path(path);
        fs::write(&staged, contents).await?;
        fs::rename(&staged, path).await?;
        Ok(())
    }

    async fn move_item(&self, item_id: &ItemId, to_stage: &Stage) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        // Read and validate everything before touching either file
        let collection = StageCollection::from_snapshot(self.load_snapshot().await?)?;
        let mut changes = self.load_changes().await?;

        let from_stage = collection.stage_of(item_id).cloned().ok_or_else(|| {
            PipelineError::NotFound {
                item: item_id.to_string(),
                stage: "any stage".to_string(),
            }
        })?;
        let next = collection.with_moved(item_id, &from_stage, to_stage)?;
        changes.push(StageChange {
            item_id: item_id.clone(),
            from_stage,
            to_stage: to_stage.clone(),
            changed_at: Utc::now(),
        });

        // Both files are staged before either is replaced
        let pipeline_file = self.pipeline_file();
        let changes_file = self.changes_file();
        fs::write(
            Self::staging_path(&pipeline_file),
            serde_json::to_string_pretty(&next.to_snapshot())?,
        )
        .await?;
        fs::write(
            Self::staging_path(&changes_file),
            serde_json::to_string_pretty(&changes)?,
        )
        .await?;
        fs::rename(Self::staging_path(&pipeline_file), &pipeline_file).await?;
        fs::rename(Self::staging_path(&changes_file), &changes_file).await?;

        Ok(())
    }
}

#[async_trait]
impl PipelineSource for FileBackend {
    async fn fetch_pipeline(&self) -> Result<PipelineSnapshot> {
        self.load_snapshot().await
    }
}

#[async_trait]
impl RemoteSync for FileBackend {
    async fn commit_transition(
        &self,
        item_id: &ItemId,
        to_stage: &Stage,
    ) -> std::result::Result<(), RemoteError> {
        self.move_item(item_id, to_stage)
            .await
            .map_err(|e| RemoteError::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Item;
    use tempfile::TempDir;

    async fn stored(backend: &FileBackend) -> StageCollection {
        StageCollection::from_snapshot(backend.fetch_pipeline().await.unwrap()).unwrap()
    }

    async fn seeded(temp_dir: &TempDir) -> FileBackend {
        let backend = FileBackend::new(temp_dir.path());
        backend.initialize(&PipelineConfig::default()).await.unwrap();

        let collection = StageCollection::with_items(
            PipelineConfig::default().stages,
            vec![
                Item::new("R1", "New Referral").with_attribute("name", "Jane Doe"),
                Item::new("R2", "Eligibility Check"),
            ],
        )
        .unwrap();
        backend
            .save_snapshot(&collection.to_snapshot())
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path());

        assert!(!backend.is_initialized().await);
        backend.initialize(&PipelineConfig::default()).await.unwrap();
        assert!(backend.is_initialized().await);

        let snapshot = backend.fetch_pipeline().await.unwrap();
        assert_eq!(snapshot.stages.len(), 6);
        assert!(snapshot.stage_counts.values().all(|count| *count == 0));
    }

    #[tokio::test]
    async fn test_initialize_keeps_existing_pipeline() {
        let temp_dir = TempDir::new().unwrap();
        let backend = seeded(&temp_dir).await;

        backend.initialize(&PipelineConfig::default()).await.unwrap();

        let collection = stored(&backend).await;
        assert_eq!(collection.total(), 2);
    }

    #[tokio::test]
    async fn test_initialize_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path());

        let config = PipelineConfig::default().with_stages(Vec::new());
        assert!(matches!(
            backend.initialize(&config).await,
            Err(PipelineError::Config(_))
        ));
        assert!(!backend.is_initialized().await);
    }

    #[tokio::test]
    async fn test_fetch_uninitialized() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path());

        assert!(matches!(
            backend.fetch_pipeline().await,
            Err(PipelineError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_commit_moves_item_and_records_change() {
        let temp_dir = TempDir::new().unwrap();
        let backend = seeded(&temp_dir).await;

        backend
            .commit_transition(&ItemId::from("R1"), &Stage::from("Admission"))
            .await
            .unwrap();

        let collection = stored(&backend).await;
        let admitted = collection.get(&Stage::from("Admission"));
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].name(), Some("Jane Doe"));
        assert_eq!(collection.count(&Stage::from("New Referral")), 0);

        let changes = backend.load_changes().await.unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].from_stage.as_str(), "New Referral");
        assert_eq!(changes[0].to_stage.as_str(), "Admission");
    }

    #[tokio::test]
    async fn test_commit_failures_leave_files_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let backend = seeded(&temp_dir).await;

        let missing = backend
            .commit_transition(&ItemId::from("R9"), &Stage::from("Admission"))
            .await;
        assert!(missing.unwrap_err().reason().contains("R9"));

        let unknown_stage = backend
            .commit_transition(&ItemId::from("R1"), &Stage::from("Discharged"))
            .await;
        assert!(unknown_stage.is_err());

        let same_stage = backend
            .commit_transition(&ItemId::from("R2"), &Stage::from("Eligibility Check"))
            .await;
        assert!(same_stage.is_err());

        assert!(backend.load_changes().await.unwrap().is_empty());
        let collection = stored(&backend).await;
        assert_eq!(collection.count(&Stage::from("New Referral")), 1);
    }

    #[tokio::test]
    async fn test_commit_with_corrupt_journal_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let backend = seeded(&temp_dir).await;
        fs::write(backend.changes_file(), "{ not json").await.unwrap();

        let result = backend
            .commit_transition(&ItemId::from("R1"), &Stage::from("Admission"))
            .await;
        assert!(result.is_err());

        let collection = stored(&backend).await;
        assert_eq!(
            collection.stage_of(&ItemId::from("R1")),
            Some(&Stage::from("New Referral"))
        );
        assert_eq!(collection.count(&Stage::from("Admission")), 0);
        assert_eq!(
            fs::read_to_string(backend.changes_file()).await.unwrap(),
            "{ not json"
        );
    }
}
