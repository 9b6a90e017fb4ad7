use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::{Child, Command};

use crate::error::{CarnyxError, Result};
use crate::media::{AudioFetcher, FetchRequest};
use crate::record::{CollectionId, ItemId};
use crate::resolver::{MetadataSource, RemoteEntry};

const ITEM_URL: &str = "https://youtube.com/watch?v=";
const COLLECTION_URL: &str = "https://youtube.com/playlist?list=";

/// Drives the `yt-dlp` executable for both metadata and audio.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CollectionDump {
    entries: Option<Vec<RemoteEntry>>,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn item_url(id: &ItemId) -> String {
        format!("{ITEM_URL}{id}")
    }

    pub fn collection_url(id: &CollectionId) -> String {
        format!("{COLLECTION_URL}{id}")
    }

    async fn run(&self, args: Vec<OsString>) -> std::result::Result<Vec<u8>, String> {
        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        tracing::debug!(?command, "invoking yt-dlp");

        let child = command
            .spawn()
            .map_err(|err| format!("cannot run {}: {err}", self.program.display()))?;
        let group = HelperGroup::of(&child);
        let output = child
            .wait_with_output()
            .await
            .map_err(|err| format!("lost track of {}: {err}", self.program.display()))?;
        group.disarm();

        if !output.status.success() {
            return Err(Self::failure_reason(&output.status, &output.stderr));
        }
        Ok(output.stdout)
    }

    fn failure_reason(status: &std::process::ExitStatus, stderr: &[u8]) -> String {
        let stderr = String::from_utf8_lossy(stderr);
        match stderr.lines().rev().find(|line| !line.trim().is_empty()) {
            Some(line) => format!("{status}: {}", line.trim()),
            None => status.to_string(),
        }
    }

    fn metadata_args(url: String) -> Vec<OsString> {
        ["--quiet", "--no-warnings", "--flat-playlist", "--dump-single-json"]
            .into_iter()
            .map(OsString::from)
            .chain(std::iter::once(OsString::from(url)))
            .collect()
    }

    fn fetch_args(request: &FetchRequest) -> std::result::Result<Vec<OsString>, String> {
        // yt-dlp re-encodes the template as text, so the stem must already be UTF-8
        let stem = request.output_stem.to_str().ok_or_else(|| {
            format!(
                "output path {} is not valid UTF-8",
                request.output_stem.display()
            )
        })?;
        // the output template treats '%' as a field marker
        let template = format!("{}.%(ext)s", stem.replace('%', "%%"));

        let mut args: Vec<OsString> = [
            "--quiet",
            "--no-warnings",
            "--no-playlist",
            "-f",
            "bestaudio/best",
            "-x",
            "--audio-format",
            request.format.codec(),
            "--audio-quality",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(format!("{}K", request.bitrate_kbps).into());
        args.push("-o".into());
        args.push(template.into());
        args.push(Self::item_url(&request.id).into());
        Ok(args)
    }

    pub(crate) fn parse_item(raw: &[u8]) -> std::result::Result<RemoteEntry, String> {
        serde_json::from_slice(raw).map_err(|err| format!("unexpected metadata: {err}"))
    }

    pub(crate) fn parse_collection(raw: &[u8]) -> std::result::Result<Vec<RemoteEntry>, String> {
        let dump: CollectionDump =
            serde_json::from_slice(raw).map_err(|err| format!("unexpected metadata: {err}"))?;
        dump.entries
            .ok_or_else(|| "metadata has no entries; not a collection".to_owned())
    }
}

/// The helper's process group. Dropping it while armed kills the whole group,
/// including transcoders the helper started, so an abandoned fetch stops
/// writing into the mirror.
#[cfg_attr(not(unix), allow(dead_code))]
struct HelperGroup {
    pgid: Option<u32>,
}

impl HelperGroup {
    fn of(child: &Child) -> Self {
        Self { pgid: child.id() }
    }

    fn disarm(mut self) {
        self.pgid = None;
    }
}

impl Drop for HelperGroup {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(pgid) = self.pgid.and_then(|id| libc::pid_t::try_from(id).ok()) {
            tracing::debug!(pgid, "killing helper process group");
            // SAFETY: killpg takes no pointers; the group was created for this helper
            unsafe {
                libc::killpg(pgid, libc::SIGKILL);
            }
        }
    }
}

#[async_trait]
impl MetadataSource for YtDlp {
    async fn resolve_item(&self, id: &ItemId) -> Result<RemoteEntry> {
        let stdout = self
            .run(Self::metadata_args(Self::item_url(id)))
            .await
            .map_err(|reason| CarnyxError::resolution(id.to_string(), reason))?;
        Self::parse_item(&stdout).map_err(|reason| CarnyxError::resolution(id.to_string(), reason))
    }

    async fn resolve_collection(&self, id: &CollectionId) -> Result<Vec<RemoteEntry>> {
        let stdout = self
            .run(Self::metadata_args(Self::collection_url(id)))
            .await
            .map_err(|reason| CarnyxError::resolution(id.to_string(), reason))?;
        Self::parse_collection(&stdout)
            .map_err(|reason| CarnyxError::resolution(id.to_string(), reason))
    }
}

#[async_trait]
impl AudioFetcher for YtDlp {
    async fn fetch(&self, request: &FetchRequest) -> Result<PathBuf> {
        let id = request.id.to_string();
        let args =
            Self::fetch_args(request).map_err(|reason| CarnyxError::acquisition(&id, reason))?;
        self.run(args)
            .await
            .map_err(|reason| CarnyxError::acquisition(&id, reason))?;

        let produced = request.output_path();
        match tokio::fs::try_exists(&produced).await {
            Ok(true) => Ok(produced),
            Ok(false) => Err(CarnyxError::acquisition(
                id,
                format!("helper reported success but {} is missing", produced.display()),
            )),
            Err(err) => Err(CarnyxError::acquisition(id, err)),
        }
    }
}
