use std::collections::BTreeSet;

use crate::error::{CoreError, Result};
use crate::models::{timestamp, Playlist, PlaylistPatch, Track, TrackAttrs};
use crate::provider::{RemoteItem, TrackSource, VideoPlatform};
use crate::query::Query;
use crate::storage::Registry;

/// Refreshes the playlist's tracks from its source and stamps `synced`.
///
/// Tracks keep the order the source returned them in, duplicates dropped.
pub fn sync_playlist(
    registry: &mut Registry,
    source: &dyn TrackSource,
    playlist: &Playlist,
) -> Result<Playlist> {
    let fetched = source.fetch_tracks(playlist.kind, playlist.limit, &playlist.arguments)?;
    let mut track_ids: Vec<String> = Vec::with_capacity(fetched.len());
    for entry in fetched {
        let track = registry.tracks().set(TrackAttrs::from(entry))?;
        if !track_ids.contains(&track.id) {
            track_ids.push(track.id);
        }
    }
    log::info!(
        "Playlist {} synced with {} tracks",
        playlist.id,
        track_ids.len()
    );
    registry.playlists().update(
        playlist,
        PlaylistPatch {
            tracks: Some(track_ids),
            synced: Some(timestamp()),
            ..Default::default()
        },
    )
}

/// Creates the remote playlist and records its remote id.
pub fn push_playlist(
    registry: &mut Registry,
    platform: &dyn VideoPlatform,
    playlist: &Playlist,
) -> Result<Playlist> {
    if let Some(youtube_id) = &playlist.youtube_id {
        return Err(CoreError::Validation(format!(
            "Playlist {} already exists remotely as {}",
            playlist.id, youtube_id
        )));
    }
    let youtube_id = platform.create_playlist(playlist)?;
    log::info!("Created remote playlist {} for {}", youtube_id, playlist.id);
    registry.playlists().update(
        playlist,
        PlaylistPatch {
            youtube_id: Some(youtube_id),
            ..Default::default()
        },
    )
}

/// The remote calls needed to bring a remote playlist in line with the local one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Video ids to add, ascending.
    pub to_add: Vec<String>,
    /// Remote entries to delete, ordered by video id.
    pub to_remove: Vec<RemoteItem>,
}

impl Reconciliation {
    /// Local state wins: everything local but not remote is added, everything
    /// remote but not local is removed.
    pub fn plan(offline: &BTreeSet<String>, online: &[RemoteItem]) -> Self {
        let online_ids = online
            .iter()
            .map(|item| item.video_id.clone())
            .collect::<BTreeSet<_>>();
        let to_add = offline.difference(&online_ids).cloned().collect();
        let mut to_remove = online
            .iter()
            .filter(|item| !offline.contains(&item.video_id))
            .cloned()
            .collect::<Vec<_>>();
        to_remove.sort_by(|a, b| a.video_id.cmp(&b.video_id));
        Self { to_add, to_remove }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub playlist: Playlist,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Video ids of the playlist's tracks that are linked to a video.
pub fn offline_videos(registry: &mut Registry, playlist: &Playlist) -> Result<BTreeSet<String>> {
    let tracks = registry.tracks().find(
        &Query::new()
            .not_null("youtube_id")
            .one_of("id", playlist.tracks.clone()),
    )?;
    Ok(tracks
        .into_iter()
        .filter_map(|track| track.youtube_id)
        .collect())
}

/// Reconciles the items of an already created remote playlist.
///
/// Nothing is called remotely when both sides already agree, and `uploaded`
/// is stamped only after every add and remove went through.
pub fn reconcile_playlist(
    registry: &mut Registry,
    platform: &dyn VideoPlatform,
    playlist: &Playlist,
) -> Result<ReconcileOutcome> {
    if playlist.youtube_id.is_none() {
        return Err(CoreError::Validation(format!(
            "Playlist {} has not been pushed yet",
            playlist.id
        )));
    }
    let online = platform.list_items(playlist)?;
    let offline = offline_videos(registry, playlist)?;
    let plan = Reconciliation::plan(&offline, &online);
    if plan.is_empty() {
        log::info!("Playlist {} is already synced", playlist.id);
        return Ok(ReconcileOutcome {
            playlist: playlist.clone(),
            added: vec![],
            removed: vec![],
        });
    }

    for video_id in &plan.to_add {
        log::debug!("Adding video {} to {}", video_id, playlist.id);
        platform.add_item(playlist, video_id)?;
    }
    for item in &plan.to_remove {
        log::debug!("Removing video {} from {}", item.video_id, playlist.id);
        platform.remove_item(item)?;
    }

    let playlist = registry.playlists().update(
        playlist,
        PlaylistPatch {
            uploaded: Some(timestamp()),
            ..Default::default()
        },
    )?;
    Ok(ReconcileOutcome {
        playlist,
        added: plan.to_add,
        removed: plan.to_remove.into_iter().map(|item| item.video_id).collect(),
    })
}

/// Looks up a video for the track and links it. Returns `None` when the
/// platform has no match.
pub fn resolve_track_video(
    registry: &mut Registry,
    platform: &dyn VideoPlatform,
    track: &Track,
) -> Result<Option<Track>> {
    match platform.search_video(track)? {
        Some(video_id) => {
            let attrs = TrackAttrs::new(track.artist.clone(), track.name.clone()).youtube_id(video_id);
            Ok(Some(registry.tracks().set(attrs)?))
        }
        None => {
            log::debug!("No video found for track {}", track.id);
            Ok(None)
        }
    }
}

/// Per item results of a batch run. A failing item never stops the rest.
#[derive(Debug, Default, PartialEq)]
pub struct BatchReport {
    pub succeeded: usize,
    /// Ids of the failed items with their error messages, in run order.
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Turns a batch with failures into an error naming how many failed.
    pub fn ensure_success(&self, what: &str) -> Result<()> {
        if self.is_success() {
            return Ok(());
        }
        Err(CoreError::RemoteService(format!(
            "{} of {} {} failed",
            self.failed.len(),
            self.total(),
            what
        )))
    }
}

fn run_batch<I, T>(
    action: &str,
    items: &[I],
    id: impl Fn(&I) -> &str,
    mut run: impl FnMut(&I) -> Result<T>,
    mut on_done: impl FnMut(&I, &Result<T>),
) -> BatchReport {
    let mut report = BatchReport::default();
    for item in items {
        let result = run(item);
        match &result {
            Ok(_) => report.succeeded += 1,
            Err(error) => {
                log::warn!("{} {} failed: {}", action, id(item), error);
                report.failed.push((id(item).to_string(), error.to_string()));
            }
        }
        on_done(item, &result);
    }
    report
}

/// Syncs every playlist from the source, continuing past failures.
pub fn sync_all(
    registry: &mut Registry,
    source: &dyn TrackSource,
    playlists: &[Playlist],
    on_done: impl FnMut(&Playlist, &Result<Playlist>),
) -> BatchReport {
    run_batch(
        "Syncing playlist",
        playlists,
        |playlist| playlist.id.as_str(),
        |playlist| sync_playlist(registry, source, playlist),
        on_done,
    )
}

/// Creates every playlist remotely, continuing past failures.
pub fn push_all(
    registry: &mut Registry,
    platform: &dyn VideoPlatform,
    playlists: &[Playlist],
    on_done: impl FnMut(&Playlist, &Result<Playlist>),
) -> BatchReport {
    run_batch(
        "Pushing playlist",
        playlists,
        |playlist| playlist.id.as_str(),
        |playlist| push_playlist(registry, platform, playlist),
        on_done,
    )
}

/// Reconciles the items of every playlist, continuing past failures.
pub fn reconcile_all(
    registry: &mut Registry,
    platform: &dyn VideoPlatform,
    playlists: &[Playlist],
    on_done: impl FnMut(&Playlist, &Result<ReconcileOutcome>),
) -> BatchReport {
    run_batch(
        "Syncing items of playlist",
        playlists,
        |playlist| playlist.id.as_str(),
        |playlist| reconcile_playlist(registry, platform, playlist),
        on_done,
    )
}

/// Looks up videos for every track, continuing past failures.
pub fn resolve_all(
    registry: &mut Registry,
    platform: &dyn VideoPlatform,
    tracks: &[Track],
    on_done: impl FnMut(&Track, &Result<Option<Track>>),
) -> BatchReport {
    run_batch(
        "Searching track",
        tracks,
        |track| track.id.as_str(),
        |track| resolve_track_video(registry, platform, track),
        on_done,
    )
}
