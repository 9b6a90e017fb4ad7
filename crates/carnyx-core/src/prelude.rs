pub use crate::acquire::AcquisitionPipeline;
pub use crate::config::{AudioFormat, ConfigValidationError, SyncConfig};
pub use crate::error::{CarnyxError, Result};
pub use crate::filesystem::{LocalFilesystem, MirrorFilesystem};
pub use crate::media::{AudioFetcher, FetchRequest};
pub use crate::reconcile::{ReconciliationPlan, reconcile};
pub use crate::record::{CollectionId, ItemId, ItemRecord, RemoteId};
pub use crate::resolver::{CollectionResolver, MetadataSource, RemoteEntry};
pub use crate::scanner::{LocalTitles, MirrorScanner};
pub use crate::sync::{Invocation, ItemFailure, Orchestrator, SyncContext, SyncReport};
pub use crate::tag::{LoftyTagWriter, TagSet, TagWriter};
pub use crate::ytdlp::YtDlp;
