use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::acquire::AcquisitionPipeline;
use crate::config::SyncConfig;
use crate::error::{CarnyxError, Result};
use crate::filesystem::{LocalFilesystem, MirrorFilesystem};
use crate::media::AudioFetcher;
use crate::path::absolutize;
use crate::reconcile::{ReconciliationPlan, reconcile};
use crate::record::{CollectionId, ItemId, ItemRecord, RemoteId};
use crate::resolver::{CollectionResolver, MetadataSource};
use crate::scanner::MirrorScanner;
use crate::tag::{LoftyTagWriter, TagWriter};
use crate::ytdlp::YtDlp;

/// A validated command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// One item written into the working directory, optionally tagged with an album.
    Item { id: ItemId, album: Option<String> },
    /// A collection mirrored into `directory`, which also names the album.
    Collection { id: CollectionId, directory: String },
}

impl Invocation {
    pub fn from_args(id: &str, destination: Option<&str>) -> Result<Self> {
        match (RemoteId::parse(id)?, destination) {
            (RemoteId::Item(id), album) => Ok(Invocation::Item {
                id,
                album: album.filter(|name| !name.is_empty()).map(str::to_owned),
            }),
            (RemoteId::Collection(_), None) => Err(CarnyxError::Usage(
                "a collection needs a destination directory".into(),
            )),
            (RemoteId::Collection(_), Some("")) => Err(CarnyxError::Usage(
                "destination directory must not be empty".into(),
            )),
            (RemoteId::Collection(id), Some(directory)) => Ok(Invocation::Collection {
                id,
                directory: directory.to_owned(),
            }),
        }
    }
}

/// Explicit run environment; nothing reads process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncContext {
    pub working_dir: PathBuf,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub subject: String,
    pub reason: String,
}

impl ItemFailure {
    fn new(subject: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            subject: subject.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Set on dry runs instead of performing any change.
    pub plan: Option<ReconciliationPlan>,
    pub created: Vec<PathBuf>,
    pub untagged: Vec<ItemFailure>,
    pub failed: Vec<ItemFailure>,
    pub deleted: Vec<String>,
    pub delete_failures: Vec<ItemFailure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.untagged.is_empty() && self.failed.is_empty() && self.delete_failures.is_empty()
    }

    fn record(&mut self, item: &ItemRecord, outcome: Result<PathBuf>) {
        match outcome {
            Ok(path) => self.created.push(path),
            Err(CarnyxError::TagWrite { path, reason }) => {
                tracing::warn!(path = %path.display(), %reason, "file kept without tags");
                self.untagged
                    .push(ItemFailure::new(path.display().to_string(), reason));
            }
            Err(err) => {
                tracing::warn!(id = %item.id, title = %item.title, error = %err, "item skipped");
                self.failed.push(ItemFailure::new(item.title.clone(), err));
            }
        }
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(plan) = &self.plan {
            writeln!(
                f,
                "dry run: {} to create, {} to delete",
                plan.to_create.len(),
                plan.to_delete.len()
            )?;
            for item in &plan.to_create {
                writeln!(f, "  + {}", item.title)?;
            }
            for title in &plan.to_delete {
                writeln!(f, "  - {title}")?;
            }
            return Ok(());
        }

        write!(
            f,
            "created {}, deleted {}",
            self.created.len(),
            self.deleted.len()
        )?;
        if !self.untagged.is_empty() {
            write!(f, ", untagged {}", self.untagged.len())?;
        }
        if !self.failed.is_empty() {
            write!(f, ", failed {}", self.failed.len())?;
        }
        if !self.delete_failures.is_empty() {
            write!(f, ", undeletable {}", self.delete_failures.len())?;
        }
        writeln!(f)?;
        for failure in self
            .failed
            .iter()
            .chain(&self.untagged)
            .chain(&self.delete_failures)
        {
            writeln!(f, "  ! {}: {}", failure.subject, failure.reason)?;
        }
        Ok(())
    }
}

pub struct Orchestrator {
    resolver: CollectionResolver,
    scanner: MirrorScanner,
    fs: Arc<dyn MirrorFilesystem>,
    pipeline: Arc<AcquisitionPipeline>,
    config: Arc<SyncConfig>,
}

impl Orchestrator {
    pub fn new(
        config: SyncConfig,
        source: Arc<dyn MetadataSource>,
        fetcher: Arc<dyn AudioFetcher>,
        tagger: Arc<dyn TagWriter>,
        fs: Arc<dyn MirrorFilesystem>,
    ) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        Ok(Self {
            resolver: CollectionResolver::new(source),
            scanner: MirrorScanner::new(fs.clone(), config.extension()),
            pipeline: Arc::new(AcquisitionPipeline::new(
                fetcher,
                tagger,
                fs.clone(),
                config.clone(),
            )),
            fs,
            config,
        })
    }

    /// Wires the yt-dlp helper, lofty tagging and the local filesystem.
    pub fn with_defaults(config: SyncConfig) -> Result<Self> {
        let helper = Arc::new(YtDlp::new(config.yt_dlp.clone()));
        Self::new(
            config,
            helper.clone(),
            helper,
            Arc::new(LoftyTagWriter::new()),
            Arc::new(LocalFilesystem::new()),
        )
    }

    pub async fn run(&self, invocation: &Invocation, ctx: &SyncContext) -> Result<SyncReport> {
        match invocation {
            Invocation::Item { id, album } => self.run_item(id, album.as_deref(), ctx).await,
            Invocation::Collection { id, directory } => {
                self.sync_collection(id, directory, ctx).await
            }
        }
    }

    async fn run_item(
        &self,
        id: &ItemId,
        album: Option<&str>,
        ctx: &SyncContext,
    ) -> Result<SyncReport> {
        let item = self
            .resolver
            .resolve(&RemoteId::Item(id.clone()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CarnyxError::resolution(id.to_string(), "no item returned"))?;

        let mut report = SyncReport::default();
        if ctx.dry_run {
            self.pipeline.plan_path(&item, &ctx.working_dir)?;
            report.plan = Some(ReconciliationPlan {
                to_create: vec![item],
                ..ReconciliationPlan::default()
            });
            return Ok(report);
        }

        // the lone item is the whole run: only a tagging failure is survivable
        match self.pipeline.acquire(&item, &ctx.working_dir, album).await {
            Err(err @ CarnyxError::TagWrite { .. }) => report.record(&item, Err(err)),
            Err(err) => return Err(err),
            Ok(path) => report.record(&item, Ok(path)),
        }
        Ok(report)
    }

    async fn sync_collection(
        &self,
        id: &CollectionId,
        directory: &str,
        ctx: &SyncContext,
    ) -> Result<SyncReport> {
        let mirror = self.mirror_dir(directory, ctx).await?;

        // a failed lookup aborts here, before the mirror is created or scanned
        let remote = self.resolver.resolve(&RemoteId::Collection(id.clone())).await?;

        if !ctx.dry_run {
            self.fs.create_dir_all(&mirror).await.map_err(|source| {
                CarnyxError::DirectoryAccess {
                    path: mirror.clone(),
                    source,
                }
            })?;
        }
        let local = self.scanner.scan(&mirror).await?;
        let plan = reconcile(&remote, &local);
        tracing::info!(
            dir = %mirror.display(),
            remote = remote.len(),
            local = local.len(),
            create = plan.to_create.len(),
            delete = plan.to_delete.len(),
            "reconciled"
        );

        let mut report = SyncReport::default();
        if ctx.dry_run {
            report.plan = Some(plan);
            return Ok(report);
        }

        self.delete_stale(&mirror, &plan, &mut report).await;
        self.create_missing(&mirror, directory, plan.to_create, &mut report)
            .await;
        Ok(report)
    }

    async fn mirror_dir(&self, directory: &str, ctx: &SyncContext) -> Result<PathBuf> {
        let cwd = absolutize(&ctx.working_dir, Path::new("."));
        let mirror = absolutize(&ctx.working_dir, Path::new(directory));
        let same = mirror == cwd
            || match (
                tokio::fs::canonicalize(&mirror).await,
                tokio::fs::canonicalize(&cwd).await,
            ) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            };
        if same {
            return Err(CarnyxError::Usage(
                "collection directory cannot be the working directory".into(),
            ));
        }
        Ok(mirror)
    }

    async fn delete_stale(&self, mirror: &Path, plan: &ReconciliationPlan, report: &mut SyncReport) {
        for title in &plan.to_delete {
            let path = mirror.join(format!("{title}.{}", self.config.extension()));
            match self.fs.remove_file(&path).await {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "deleted");
                    report.deleted.push(title.clone());
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "could not delete");
                    report.delete_failures.push(ItemFailure::new(title.clone(), err));
                }
            }
        }
    }

    async fn create_missing(
        &self,
        mirror: &Path,
        album: &str,
        items: Vec<ItemRecord>,
        report: &mut SyncReport,
    ) {
        let permits = Arc::new(Semaphore::new(self.config.workers));
        let mut tasks = JoinSet::new();
        for item in items {
            let pipeline = self.pipeline.clone();
            let permits = permits.clone();
            let mirror = mirror.to_path_buf();
            let album = album.to_owned();
            tasks.spawn(async move {
                let outcome = match permits.acquire_owned().await {
                    Ok(_permit) => pipeline.acquire(&item, &mirror, Some(&album)).await,
                    Err(err) => Err(CarnyxError::acquisition(item.id.to_string(), err)),
                };
                (item, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((item, outcome)) => report.record(&item, outcome),
                Err(err) => {
                    tracing::error!(error = %err, "acquisition task aborted");
                    report.failed.push(ItemFailure::new("<task>", err));
                }
            }
        }
    }
}
