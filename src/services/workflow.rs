//! Multi-step authoring flow for catalog titles.
//!
//! `SelectType -> EditMetadata -> AllocateSeasons -> EditEpisode -> Done`,
//! with movies going straight from metadata to `Done`. Every transition
//! either completes or leaves the state exactly as it was.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::catalog::CatalogService;
use super::duration::{probe_minutes, DurationProbe};
use super::error::{CatalogError, WorkflowError};
use super::upload::MediaUploader;
use crate::models::{
    Advance, ContentType, EpisodeDraft, EpisodePatch, MediaFile, MetadataDraft, MovieDraft,
    NewEpisode, NewMovie, NewSeason, NewShow, Relation, SeasonChoice, SeasonPatch, ShowDraft,
    StringValidator, Title, TitlePatch, ValidationError, Validator,
};
use crate::storage::Bucket;

/// 工作流状态
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum WorkflowState {
    SelectType,
    EditMetadata {
        content_type: ContentType,
        /// Id of the title being edited, `None` when creating.
        editing: Option<i64>,
    },
    AllocateSeasons {
        content_type: ContentType,
        title_id: i64,
        declared: u32,
    },
    EditEpisode {
        content_type: ContentType,
        title_id: i64,
        declared: u32,
        season: u32,
        season_id: i64,
        episode: u32,
    },
    Done {
        content_type: ContentType,
        title_id: i64,
    },
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::SelectType => "select_type",
            WorkflowState::EditMetadata { .. } => "edit_metadata",
            WorkflowState::AllocateSeasons { .. } => "allocate_seasons",
            WorkflowState::EditEpisode { .. } => "edit_episode",
            WorkflowState::Done { .. } => "done",
        }
    }

    pub fn content_type(&self) -> Option<ContentType> {
        match self {
            WorkflowState::SelectType => None,
            WorkflowState::EditMetadata { content_type, .. }
            | WorkflowState::AllocateSeasons { content_type, .. }
            | WorkflowState::EditEpisode { content_type, .. }
            | WorkflowState::Done { content_type, .. } => Some(*content_type),
        }
    }
}

/// 已持久化的季进度
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonProgress {
    pub number: u32,
    pub season_id: i64,
    pub arc_name: Option<String>,
    pub episodes: u32,
}

/// 供展示层使用的工作流快照
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    pub state: WorkflowState,
    pub unit_label: Option<&'static str>,
    pub seasons: Vec<SeasonProgress>,
    /// Title loaded by `begin_edit`, used to prefill the metadata form.
    pub existing: Option<Title>,
}

#[derive(Deserialize)]
struct Inserted {
    id: i64,
}

/// 内容编辑工作流
pub struct AuthoringWorkflow {
    catalog: CatalogService,
    uploader: MediaUploader,
    probe: Arc<dyn DurationProbe>,
    state: WorkflowState,
    seasons: BTreeMap<u32, SeasonProgress>,
    existing: Option<Title>,
}

impl AuthoringWorkflow {
    pub fn new(catalog: CatalogService, uploader: MediaUploader, probe: Arc<dyn DurationProbe>) -> Self {
        Self {
            catalog,
            uploader,
            probe,
            state: WorkflowState::SelectType,
            seasons: BTreeMap::new(),
            existing: None,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn seasons(&self) -> impl Iterator<Item = &SeasonProgress> {
        self.seasons.values()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            state: self.state.clone(),
            unit_label: self.state.content_type().and_then(ContentType::unit_label),
            seasons: self.seasons.values().cloned().collect(),
            existing: self.existing.clone(),
        }
    }

    fn invalid(&self, action: &'static str) -> WorkflowError {
        WorkflowError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }

    fn set_state(&mut self, next: WorkflowState) {
        tracing::info!("Authoring: {} -> {}", self.state.name(), next.name());
        self.state = next;
    }

    // ============ 选择类型 ============

    /// Starts a new title of `kind`, discarding any previous form state.
    pub fn select_type(&mut self, kind: ContentType) -> Result<(), WorkflowError> {
        if !matches!(self.state, WorkflowState::SelectType | WorkflowState::Done { .. }) {
            return Err(self.invalid("select a content type"));
        }

        self.seasons.clear();
        self.existing = None;
        self.set_state(WorkflowState::EditMetadata {
            content_type: kind,
            editing: None,
        });
        Ok(())
    }

    /// Opens an existing title for editing, loading its seasons and episode
    /// counts.
    pub async fn begin_edit(&mut self, kind: ContentType, id: i64) -> Result<(), WorkflowError> {
        if !matches!(self.state, WorkflowState::SelectType | WorkflowState::Done { .. }) {
            return Err(self.invalid("edit a title"));
        }

        // 类型与存储的 is_dorama 不符时为 NotFound
        let title = self.catalog.get_title(kind, id).await?;

        let mut seasons = BTreeMap::new();
        if let Some(parent_type) = kind.parent_type() {
            for season in self.catalog.seasons_of(parent_type, id).await? {
                let episodes = self.catalog.count_episodes(season.id).await?;
                let number = season.season_number as u32;
                seasons.insert(
                    number,
                    SeasonProgress {
                        number,
                        season_id: season.id,
                        arc_name: season.arc_name,
                        episodes: episodes as u32,
                    },
                );
            }
        }

        self.seasons = seasons;
        self.existing = Some(title);
        self.set_state(WorkflowState::EditMetadata {
            content_type: kind,
            editing: Some(id),
        });
        Ok(())
    }

    // ============ 元数据 ============

    pub async fn submit_metadata(&mut self, draft: MetadataDraft) -> Result<(), WorkflowError> {
        let WorkflowState::EditMetadata { content_type, editing } = self.state.clone() else {
            return Err(self.invalid("submit metadata"));
        };

        if draft.content_type() != content_type {
            return Err(WorkflowError::FormMismatch {
                expected: content_type,
                got: draft.content_type(),
            });
        }
        draft.validate()?;

        match draft {
            MetadataDraft::Movie(movie) => self.submit_movie(movie, editing).await,
            MetadataDraft::Series(show) | MetadataDraft::Drama(show) | MetadataDraft::Anime(show) => {
                self.submit_show(content_type, show, editing).await
            }
        }
    }

    async fn submit_movie(&mut self, draft: MovieDraft, editing: Option<i64>) -> Result<(), WorkflowError> {
        if editing.is_none() {
            require(&draft.poster, "poster")?;
            require(&draft.thumbnail, "thumbnail")?;
            require(&draft.video, "video")?;
        }

        // 先探测时长，再依次上传
        let duration = match draft.video {
            Some(ref video) => Some(probe_minutes(self.probe.as_ref(), video).await?),
            None => None,
        };
        let poster_url = self.uploader.upload(Bucket::Posters, draft.poster.as_ref()).await?;
        let thumbnail_url = self
            .uploader
            .upload(Bucket::Thumbnails, draft.thumbnail.as_ref())
            .await?;
        let video_url = self.uploader.upload(Bucket::Videos, draft.video.as_ref()).await?;

        let fields = draft.fields.normalized();
        let title_id = match editing {
            None => {
                let record = NewMovie {
                    title: fields.title,
                    release_year: fields.release_year,
                    imdb_rating: fields.imdb_rating,
                    synopsis: fields.synopsis,
                    poster_url,
                    thumbnail_url,
                    video_url,
                    duration,
                };
                let inserted: Inserted = self
                    .catalog
                    .insert(ContentType::Movie.relation(), &record)
                    .await?;
                inserted.id
            }
            Some(id) => {
                let patch = TitlePatch {
                    title: Some(fields.title),
                    release_year: Some(fields.release_year),
                    imdb_rating: Some(fields.imdb_rating),
                    synopsis: Some(fields.synopsis),
                    poster_url,
                    thumbnail_url,
                    video_url,
                    duration,
                    ..Default::default()
                };
                self.catalog
                    .update(ContentType::Movie.relation(), id, &patch)
                    .await?;
                id
            }
        };

        self.set_state(WorkflowState::Done {
            content_type: ContentType::Movie,
            title_id,
        });
        Ok(())
    }

    async fn submit_show(
        &mut self,
        kind: ContentType,
        draft: ShowDraft,
        editing: Option<i64>,
    ) -> Result<(), WorkflowError> {
        let declared = draft.season_count;
        let existing = self.seasons.len() as u32;
        if editing.is_some() && declared < existing {
            return Err(ValidationError::SeasonCountBelowExisting {
                requested: declared,
                existing,
            }
            .into());
        }
        if editing.is_none() {
            require(&draft.poster, "poster")?;
        }

        let poster_url = self.uploader.upload(Bucket::Posters, draft.poster.as_ref()).await?;
        let fields = draft.fields.normalized();
        let relation = kind.relation();

        let title_id = match editing {
            None => {
                let record = NewShow {
                    title: fields.title,
                    release_year: fields.release_year,
                    imdb_rating: fields.imdb_rating,
                    synopsis: fields.synopsis,
                    poster_url,
                    is_dorama: kind.dorama_flag(),
                    season_count: declared as i64,
                    completed: false,
                };
                let inserted: Inserted = self.catalog.insert(relation, &record).await?;
                inserted.id
            }
            Some(id) => {
                let patch = TitlePatch {
                    title: Some(fields.title),
                    release_year: Some(fields.release_year),
                    imdb_rating: Some(fields.imdb_rating),
                    synopsis: Some(fields.synopsis),
                    poster_url,
                    season_count: Some(declared as i64),
                    completed: Some(self.missing_seasons(declared, None).is_empty()),
                    ..Default::default()
                };
                self.catalog.update(relation, id, &patch).await?;
                id
            }
        };

        self.set_state(WorkflowState::AllocateSeasons {
            content_type: kind,
            title_id,
            declared,
        });
        Ok(())
    }

    // ============ 季 / 篇章 ============

    pub async fn choose_season(&mut self, choice: SeasonChoice) -> Result<(), WorkflowError> {
        let WorkflowState::AllocateSeasons {
            content_type,
            title_id,
            declared,
        } = self.state.clone()
        else {
            return Err(self.invalid("choose a season"));
        };

        self.check_season(content_type, choice.number, declared)?;
        StringValidator::validate_arc_name(&choice.arc_name)?;

        // Arc names only exist for anime.
        let arc_name = match content_type {
            ContentType::Anime => choice
                .arc_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            _ => None,
        };

        let next = self
            .enter_season(content_type, title_id, declared, choice.number, arc_name)
            .await?;
        self.set_state(next);
        Ok(())
    }

    fn check_season(&self, kind: ContentType, number: u32, declared: u32) -> Result<(), WorkflowError> {
        if number == 0 || number > declared {
            return Err(WorkflowError::SeasonOutOfRange {
                unit: kind.unit_label().unwrap_or("season"),
                requested: number,
                declared,
            });
        }
        Ok(())
    }

    /// Creates the season row on first visit (or renames its arc) and
    /// places the cursor after the last persisted episode.
    async fn enter_season(
        &mut self,
        kind: ContentType,
        title_id: i64,
        declared: u32,
        number: u32,
        arc_name: Option<String>,
    ) -> Result<WorkflowState, WorkflowError> {
        let parent_type = kind
            .parent_type()
            .ok_or_else(|| WorkflowError::InvalidTransition {
                state: "allocate_seasons",
                action: "enter a season of a movie",
            })?;

        let existing = match self.seasons.get(&number) {
            Some(progress) => Some((progress.season_id, progress.arc_name.clone())),
            None => self
                .catalog
                .find_season(parent_type, title_id, number)
                .await?
                .map(|s| (s.id, s.arc_name)),
        };

        let (season_id, arc_name) = match existing {
            Some((id, stored)) => {
                let changed = arc_name.is_some() && arc_name != stored;
                if changed {
                    let patch = SeasonPatch {
                        arc_name: arc_name.clone(),
                    };
                    self.catalog
                        .update(Relation::Seasons, id, &patch)
                        .await?;
                    (id, arc_name)
                } else {
                    (id, stored)
                }
            }
            None => {
                let record = NewSeason {
                    parent_id: title_id,
                    parent_type,
                    season_number: number as i64,
                    arc_name: arc_name.clone(),
                };
                let inserted: Inserted = self
                    .catalog
                    .insert(Relation::Seasons, &record)
                    .await?;
                (inserted.id, arc_name)
            }
        };

        let episodes = self.catalog.count_episodes(season_id).await? as u32;
        self.seasons.insert(
            number,
            SeasonProgress {
                number,
                season_id,
                arc_name,
                episodes,
            },
        );

        Ok(WorkflowState::EditEpisode {
            content_type: kind,
            title_id,
            declared,
            season: number,
            season_id,
            episode: episodes + 1,
        })
    }

    // ============ 单集 ============

    /// Moves the cursor to episode `n` of the current season (1..=k+1).
    pub fn select_episode(&mut self, n: u32) -> Result<(), WorkflowError> {
        let WorkflowState::EditEpisode { season, .. } = self.state else {
            return Err(self.invalid("select an episode"));
        };

        let max = self.persisted_episodes(season) + 1;
        if n == 0 || n > max {
            return Err(WorkflowError::EpisodeOutOfRange { requested: n, max });
        }

        if let WorkflowState::EditEpisode { ref mut episode, .. } = self.state {
            *episode = n;
        }
        Ok(())
    }

    pub async fn save_episode(&mut self, draft: EpisodeDraft, advance: Advance) -> Result<(), WorkflowError> {
        let WorkflowState::EditEpisode {
            content_type,
            title_id,
            declared,
            season,
            season_id,
            episode,
        } = self.state.clone()
        else {
            return Err(self.invalid("save an episode"));
        };

        draft.validate()?;

        // 先检查去向的前置条件，避免写入后才失败
        match advance {
            Advance::NextEpisode => {}
            Advance::NextSeason => self.check_season(content_type, season + 1, declared)?,
            Advance::Finish => {
                let missing = self.missing_seasons(declared, Some(season));
                if season != declared || !missing.is_empty() {
                    let mut missing = missing;
                    missing.extend((season + 1)..=declared);
                    missing.sort_unstable();
                    missing.dedup();
                    return Err(WorkflowError::SeasonsIncomplete {
                        unit: content_type.unit_label().unwrap_or("season"),
                        missing,
                    });
                }
            }
        }

        let persisted = self.persisted_episodes(season);
        let is_new = episode > persisted;
        if is_new {
            require(&draft.thumbnail, "thumbnail")?;
            require(&draft.video, "video")?;
        }

        let duration = match draft.video {
            Some(ref video) => Some(probe_minutes(self.probe.as_ref(), video).await?),
            None => None,
        };
        let thumbnail_url = self
            .uploader
            .upload(Bucket::Thumbnails, draft.thumbnail.as_ref())
            .await?;
        let video_url = self.uploader.upload(Bucket::Videos, draft.video.as_ref()).await?;

        if is_new {
            let record = NewEpisode {
                season_id,
                episode_number: episode as i64,
                title: draft.title.trim().to_string(),
                synopsis: draft.synopsis.trim().to_string(),
                thumbnail_url,
                video_url,
                duration,
            };
            let _: Inserted = self
                .catalog
                .insert(Relation::Episodes, &record)
                .await?;
            if let Some(progress) = self.seasons.get_mut(&season) {
                progress.episodes = episode;
            }
        } else {
            let stored = self
                .catalog
                .episodes_of(season_id)
                .await?
                .into_iter()
                .find(|e| e.episode_number == episode as i64)
                .ok_or(CatalogError::NotFound {
                    relation: Relation::Episodes,
                    id: episode as i64,
                })?;
            let patch = EpisodePatch {
                title: Some(draft.title.trim().to_string()),
                synopsis: Some(draft.synopsis.trim().to_string()),
                thumbnail_url,
                video_url,
                duration,
            };
            self.catalog
                .update(Relation::Episodes, stored.id, &patch)
                .await?;
        }

        tracing::info!(
            "Saved episode {} of {} {} (title {})",
            episode,
            content_type.unit_label().unwrap_or("season"),
            season,
            title_id
        );

        let next = match advance {
            Advance::NextEpisode => WorkflowState::EditEpisode {
                content_type,
                title_id,
                declared,
                season,
                season_id,
                episode: episode + 1,
            },
            Advance::NextSeason => {
                self.enter_season(content_type, title_id, declared, season + 1, None)
                    .await?
            }
            Advance::Finish => {
                self.catalog.mark_completed(content_type, title_id).await?;
                WorkflowState::Done {
                    content_type,
                    title_id,
                }
            }
        };
        self.set_state(next);
        Ok(())
    }

    /// EditEpisode -> AllocateSeasons, dropping the unsaved episode form.
    pub fn back_to_seasons(&mut self) -> Result<(), WorkflowError> {
        let WorkflowState::EditEpisode {
            content_type,
            title_id,
            declared,
            ..
        } = self.state
        else {
            return Err(self.invalid("go back to the season list"));
        };

        self.set_state(WorkflowState::AllocateSeasons {
            content_type,
            title_id,
            declared,
        });
        Ok(())
    }

    /// Any state -> SelectType. Rows already written stay in place.
    pub fn cancel(&mut self) {
        self.seasons.clear();
        self.existing = None;
        self.set_state(WorkflowState::SelectType);
    }

    fn persisted_episodes(&self, season: u32) -> u32 {
        self.seasons.get(&season).map(|p| p.episodes).unwrap_or(0)
    }

    /// Seasons in 1..=declared without episodes, ignoring `except`.
    fn missing_seasons(&self, declared: u32, except: Option<u32>) -> Vec<u32> {
        (1..=declared)
            .filter(|n| Some(*n) != except)
            .filter(|n| self.persisted_episodes(*n) == 0)
            .collect()
    }
}

fn require(file: &Option<MediaFile>, name: &'static str) -> Result<(), WorkflowError> {
    match file {
        Some(f) if !f.is_empty() => Ok(()),
        _ => Err(WorkflowError::MissingFile(name)),
    }
}
