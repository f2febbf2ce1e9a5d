// 创作工作流集成测试
//
// 使用内存 SQLite + 临时目录存储，覆盖电影、剧集、韩剧、动画的完整流程

mod common;

use common::{mp4, png, Harness, BASE_URL};
use jumpflix_backend::models::{
    Advance, ContentType, EpisodeDraft, MetadataDraft, MovieDraft, ParentType, Relation,
    SeasonChoice, ShowDraft, Title, TitleFields, ValidationError,
};
use jumpflix_backend::services::{
    CatalogError, DurationDecodeError, UploadError, WorkflowError, WorkflowState,
};
use jumpflix_backend::storage::Bucket;
use proptest::prelude::*;

fn fields(title: &str) -> TitleFields {
    TitleFields {
        title: title.to_string(),
        release_year: 2020,
        imdb_rating: 7.5,
        synopsis: "x".to_string(),
    }
}

fn movie_draft(title: &str) -> MetadataDraft {
    MetadataDraft::Movie(MovieDraft {
        fields: fields(title),
        poster: Some(png("poster.png")),
        thumbnail: Some(png("thumb.png")),
        video: Some(mp4("movie.mp4")),
    })
}

fn show_draft(kind: ContentType, title: &str, seasons: u32) -> MetadataDraft {
    let draft = ShowDraft {
        fields: fields(title),
        poster: Some(png("poster.png")),
        season_count: seasons,
    };
    MetadataDraft::show(kind, draft).unwrap()
}

fn episode(title: &str) -> EpisodeDraft {
    EpisodeDraft {
        title: title.to_string(),
        synopsis: String::new(),
        thumbnail: Some(png("ep.png")),
        video: Some(mp4("ep.mp4")),
    }
}

fn season(number: u32) -> SeasonChoice {
    SeasonChoice {
        number,
        arc_name: None,
    }
}

fn title_id(state: &WorkflowState) -> i64 {
    match state {
        WorkflowState::AllocateSeasons { title_id, .. }
        | WorkflowState::EditEpisode { title_id, .. }
        | WorkflowState::Done { title_id, .. } => *title_id,
        other => panic!("no title yet in {:?}", other),
    }
}

fn cursor(state: &WorkflowState) -> (u32, u32) {
    match state {
        WorkflowState::EditEpisode { season, episode, .. } => (*season, *episode),
        other => panic!("not editing an episode: {:?}", other),
    }
}

// ============ 电影 ============

#[tokio::test]
async fn test_movie_is_created_with_duration_and_urls() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();

    workflow.select_type(ContentType::Movie).unwrap();
    workflow.submit_metadata(movie_draft("Test")).await.unwrap();

    let id = title_id(workflow.state());
    assert!(matches!(workflow.state(), WorkflowState::Done { content_type: ContentType::Movie, .. }));

    let movie = harness.catalog.get_movie(id).await.unwrap();
    assert_eq!(movie.title, "Test");
    assert_eq!(movie.release_year, 2020);
    assert_eq!(movie.imdb_rating, 7.5);
    assert_eq!(movie.synopsis, "x");
    // 125 秒四舍五入为 2 分钟
    assert_eq!(movie.duration, Some(2));

    let poster = movie.poster_url.unwrap();
    assert!(poster.starts_with(&format!("{}/media/posters/", BASE_URL)));
    assert!(poster.ends_with(".png"));
    assert!(movie.thumbnail_url.unwrap().contains("/media/thumbnails/"));
    assert!(movie.video_url.unwrap().ends_with(".mp4"));
}

#[tokio::test]
async fn test_failed_upload_writes_no_row() {
    let harness = Harness::failing_on(Bucket::Videos).await;
    let mut workflow = harness.workflow();

    workflow.select_type(ContentType::Movie).unwrap();
    let err = workflow.submit_metadata(movie_draft("Test")).await.unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Catalog(CatalogError::Upload(UploadError::Rejected {
            bucket: Bucket::Videos,
            ..
        }))
    ));
    assert!(matches!(workflow.state(), WorkflowState::EditMetadata { editing: None, .. }));
    assert_eq!(harness.catalog.count(Relation::Movies, &[]).await.unwrap(), 0);

    // 重试时换一个可用的后端即可成功
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();
    workflow.select_type(ContentType::Movie).unwrap();
    workflow.submit_metadata(movie_draft("Test")).await.unwrap();
    assert_eq!(harness.catalog.count(Relation::Movies, &[]).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unreadable_movie_duration_leaves_nothing_behind() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();
    workflow.select_type(ContentType::Movie).unwrap();

    for name in ["corrupt.mp4", "blank.mp4"] {
        let mut draft = movie_draft("Test");
        if let MetadataDraft::Movie(ref mut movie) = draft {
            movie.video = Some(mp4(name));
        }

        let err = workflow.submit_metadata(draft).await.unwrap_err();
        assert!(
            matches!(err, WorkflowError::Catalog(CatalogError::DurationDecode(_))),
            "{name}: {err:?}"
        );
        assert!(matches!(
            workflow.state(),
            WorkflowState::EditMetadata { content_type: ContentType::Movie, editing: None, .. }
        ));
        assert_eq!(harness.catalog.count(Relation::Movies, &[]).await.unwrap(), 0);
        assert_eq!(harness.stored_files(), 0);
    }

    // 换一个可读的视频文件即可重试
    workflow.submit_metadata(movie_draft("Test")).await.unwrap();
    let movie = harness.catalog.get_movie(title_id(workflow.state())).await.unwrap();
    assert_eq!(movie.duration, Some(2));
    assert_eq!(harness.stored_files(), 3);
}

#[tokio::test]
async fn test_new_movie_requires_all_files() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();
    workflow.select_type(ContentType::Movie).unwrap();

    let draft = MetadataDraft::Movie(MovieDraft {
        fields: fields("Test"),
        poster: Some(png("poster.png")),
        thumbnail: Some(png("thumb.png")),
        video: None,
    });
    let err = workflow.submit_metadata(draft).await.unwrap_err();
    assert!(matches!(err, WorkflowError::MissingFile("video")));
    assert_eq!(harness.catalog.count(Relation::Movies, &[]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_metadata_is_rejected_before_upload() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();
    workflow.select_type(ContentType::Movie).unwrap();

    let mut draft = movie_draft("Test");
    if let MetadataDraft::Movie(ref mut movie) = draft {
        movie.fields.imdb_rating = 11.0;
    }
    let err = workflow.submit_metadata(draft).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    let err = workflow
        .submit_metadata(show_draft(ContentType::Anime, "Naruto", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::FormMismatch { .. }));
}

// ============ 剧集 ============

#[tokio::test]
async fn test_series_with_three_seasons() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();

    workflow.select_type(ContentType::Series).unwrap();
    workflow
        .submit_metadata(show_draft(ContentType::Series, "Dark", 3))
        .await
        .unwrap();
    let id = title_id(workflow.state());
    assert!(matches!(workflow.state(), WorkflowState::AllocateSeasons { declared: 3, .. }));

    workflow.choose_season(season(1)).await.unwrap();
    workflow.save_episode(episode("S1E1"), Advance::NextSeason).await.unwrap();
    assert_eq!(cursor(workflow.state()), (2, 1));
    workflow.save_episode(episode("S2E1"), Advance::NextSeason).await.unwrap();
    assert_eq!(cursor(workflow.state()), (3, 1));
    workflow.save_episode(episode("S3E1"), Advance::Finish).await.unwrap();
    assert!(matches!(workflow.state(), WorkflowState::Done { .. }));

    let seasons = harness.catalog.seasons_of(ParentType::Series, id).await.unwrap();
    let numbers: Vec<i64> = seasons.iter().map(|s| s.season_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert!(seasons.iter().all(|s| s.parent_type == ParentType::Series && s.parent_id == id));

    let show = harness.catalog.get_show(id).await.unwrap();
    assert!(!show.is_dorama);
    assert!(show.completed);
    assert_eq!(show.season_count, 3);

    let episodes = harness.catalog.episodes_of(seasons[0].id).await.unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].duration, Some(2));
}

#[tokio::test]
async fn test_next_season_beyond_declared_is_rejected() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();

    workflow.select_type(ContentType::Series).unwrap();
    workflow
        .submit_metadata(show_draft(ContentType::Series, "Mini", 1))
        .await
        .unwrap();
    workflow.choose_season(season(1)).await.unwrap();

    let err = workflow
        .save_episode(episode("E1"), Advance::NextSeason)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::SeasonOutOfRange { requested: 2, declared: 1, .. }));
    // 前置条件失败时不写入
    assert_eq!(harness.catalog.count(Relation::Episodes, &[]).await.unwrap(), 0);
    assert_eq!(cursor(workflow.state()), (1, 1));
}

#[tokio::test]
async fn test_season_choice_must_be_in_range() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();

    workflow.select_type(ContentType::Series).unwrap();
    workflow
        .submit_metadata(show_draft(ContentType::Series, "Dark", 3))
        .await
        .unwrap();

    for number in [0, 4] {
        let err = workflow.choose_season(season(number)).await.unwrap_err();
        assert!(matches!(err, WorkflowError::SeasonOutOfRange { declared: 3, .. }));
    }
    assert_eq!(harness.catalog.count(Relation::Seasons, &[]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_episode_numbering_survives_revisits() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();

    workflow.select_type(ContentType::Series).unwrap();
    workflow
        .submit_metadata(show_draft(ContentType::Series, "Dark", 2))
        .await
        .unwrap();

    workflow.choose_season(season(1)).await.unwrap();
    workflow.save_episode(episode("E1"), Advance::NextEpisode).await.unwrap();
    workflow.save_episode(episode("E2"), Advance::NextEpisode).await.unwrap();
    assert_eq!(cursor(workflow.state()), (1, 3));

    workflow.back_to_seasons().unwrap();
    workflow.choose_season(season(2)).await.unwrap();
    assert_eq!(cursor(workflow.state()), (2, 1));

    workflow.back_to_seasons().unwrap();
    workflow.choose_season(season(1)).await.unwrap();
    assert_eq!(cursor(workflow.state()), (1, 3));

    // 重新访问时不会重复创建季
    assert_eq!(harness.catalog.count(Relation::Seasons, &[]).await.unwrap(), 2);

    let progress: Vec<(u32, u32)> = workflow.seasons().map(|s| (s.number, s.episodes)).collect();
    assert_eq!(progress, vec![(1, 2), (2, 0)]);
}

#[tokio::test]
async fn test_existing_episode_is_updated_in_place() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();

    workflow.select_type(ContentType::Series).unwrap();
    workflow
        .submit_metadata(show_draft(ContentType::Series, "Dark", 1))
        .await
        .unwrap();
    workflow.choose_season(season(1)).await.unwrap();
    workflow.save_episode(episode("Pilot"), Advance::NextEpisode).await.unwrap();

    workflow.select_episode(1).unwrap();
    let rename = EpisodeDraft {
        title: "Secrets".to_string(),
        synopsis: "Renamed".to_string(),
        thumbnail: None,
        video: None,
    };
    workflow.save_episode(rename, Advance::NextEpisode).await.unwrap();

    let WorkflowState::EditEpisode { season_id, .. } = *workflow.state() else {
        panic!("expected episode editor");
    };
    let episodes = harness.catalog.episodes_of(season_id).await.unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].title, "Secrets");
    assert!(episodes[0].video_url.is_some());

    assert!(matches!(
        workflow.select_episode(5),
        Err(WorkflowError::EpisodeOutOfRange { requested: 5, max: 2 })
    ));
}

#[tokio::test]
async fn test_new_episode_requires_files() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();

    workflow.select_type(ContentType::Anime).unwrap();
    workflow
        .submit_metadata(show_draft(ContentType::Anime, "Naruto", 1))
        .await
        .unwrap();
    workflow.choose_season(season(1)).await.unwrap();

    let mut draft = episode("E1");
    draft.thumbnail = None;
    let err = workflow.save_episode(draft, Advance::NextEpisode).await.unwrap_err();
    assert!(matches!(err, WorkflowError::MissingFile("thumbnail")));
}

#[tokio::test]
async fn test_unreadable_episode_duration_keeps_cursor() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();

    workflow.select_type(ContentType::Series).unwrap();
    workflow
        .submit_metadata(show_draft(ContentType::Series, "Dark", 1))
        .await
        .unwrap();
    workflow.choose_season(season(1)).await.unwrap();
    let uploaded = harness.stored_files();
    let season_id = harness
        .catalog
        .seasons_of(ParentType::Series, title_id(workflow.state()))
        .await
        .unwrap()[0]
        .id;

    let mut draft = episode("E1");
    draft.video = Some(mp4("corrupt-ep.mp4"));
    let err = workflow.save_episode(draft, Advance::NextEpisode).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Catalog(CatalogError::DurationDecode(DurationDecodeError::ProbeFailed { .. }))
    ));

    let mut draft = episode("E1");
    draft.video = Some(mp4("blank-ep.mp4"));
    let err = workflow.save_episode(draft, Advance::NextEpisode).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Catalog(CatalogError::DurationDecode(DurationDecodeError::InvalidDuration(_)))
    ));

    assert_eq!(cursor(workflow.state()), (1, 1));
    assert!(harness.catalog.episodes_of(season_id).await.unwrap().is_empty());
    assert_eq!(harness.stored_files(), uploaded);

    workflow.save_episode(episode("E1"), Advance::NextEpisode).await.unwrap();
    assert_eq!(cursor(workflow.state()), (1, 2));
    let episodes = harness.catalog.episodes_of(season_id).await.unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].duration, Some(2));
    assert_eq!(harness.stored_files(), uploaded + 2);
}

#[tokio::test]
async fn test_finish_requires_every_season() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();

    workflow.select_type(ContentType::Series).unwrap();
    workflow
        .submit_metadata(show_draft(ContentType::Series, "Dark", 3))
        .await
        .unwrap();
    let id = title_id(workflow.state());

    workflow.choose_season(season(3)).await.unwrap();
    let err = workflow.save_episode(episode("E1"), Advance::Finish).await.unwrap_err();
    match err {
        WorkflowError::SeasonsIncomplete { missing, .. } => assert_eq!(missing, vec![1, 2]),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(harness.catalog.count(Relation::Episodes, &[]).await.unwrap(), 0);

    // 非最后一季也不能结束
    workflow.back_to_seasons().unwrap();
    workflow.choose_season(season(1)).await.unwrap();
    let err = workflow.save_episode(episode("E1"), Advance::Finish).await.unwrap_err();
    match err {
        WorkflowError::SeasonsIncomplete { missing, .. } => assert_eq!(missing, vec![2, 3]),
        other => panic!("unexpected error: {:?}", other),
    }

    assert!(!harness.catalog.get_show(id).await.unwrap().completed);
}

#[tokio::test]
async fn test_cancel_keeps_written_rows() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();

    workflow.select_type(ContentType::Series).unwrap();
    workflow
        .submit_metadata(show_draft(ContentType::Series, "Dark", 2))
        .await
        .unwrap();
    workflow.choose_season(season(1)).await.unwrap();
    workflow.save_episode(episode("E1"), Advance::NextEpisode).await.unwrap();

    workflow.cancel();
    assert_eq!(*workflow.state(), WorkflowState::SelectType);
    assert_eq!(workflow.seasons().count(), 0);

    assert_eq!(harness.catalog.count(Relation::Series, &[]).await.unwrap(), 1);
    assert_eq!(harness.catalog.count(Relation::Episodes, &[]).await.unwrap(), 1);

    // 取消后可以重新开始
    workflow.select_type(ContentType::Movie).unwrap();
}

#[tokio::test]
async fn test_transitions_out_of_order_are_rejected() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();

    assert!(matches!(
        workflow.choose_season(season(1)).await,
        Err(WorkflowError::InvalidTransition { state: "select_type", .. })
    ));
    assert!(workflow.back_to_seasons().is_err());

    workflow.select_type(ContentType::Drama).unwrap();
    assert!(matches!(
        workflow.select_type(ContentType::Movie),
        Err(WorkflowError::InvalidTransition { state: "edit_metadata", .. })
    ));
}

// ============ 韩剧 / 动画 ============

#[tokio::test]
async fn test_drama_is_stored_as_dorama_series() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();

    workflow.select_type(ContentType::Drama).unwrap();
    workflow
        .submit_metadata(show_draft(ContentType::Drama, "Reply 1988", 1))
        .await
        .unwrap();
    let id = title_id(workflow.state());

    let show = harness.catalog.get_show(id).await.unwrap();
    assert!(show.is_dorama);
    assert!(matches!(
        harness.catalog.get_title(ContentType::Drama, id).await.unwrap(),
        Title::Drama(_)
    ));
    assert!(matches!(
        harness.catalog.get_title(ContentType::Series, id).await,
        Err(CatalogError::NotFound { .. })
    ));
    assert_eq!(harness.catalog.list_series(false).await.unwrap().len(), 0);
    assert_eq!(harness.catalog.list_series(true).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_anime_arc_names() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();

    workflow.select_type(ContentType::Anime).unwrap();
    assert_eq!(workflow.snapshot().unit_label, Some("arco"));
    workflow
        .submit_metadata(show_draft(ContentType::Anime, "One Piece", 2))
        .await
        .unwrap();
    let id = title_id(workflow.state());

    workflow
        .choose_season(SeasonChoice {
            number: 1,
            arc_name: Some("  East Blue ".to_string()),
        })
        .await
        .unwrap();
    workflow.back_to_seasons().unwrap();

    // 再次选择时改名
    workflow
        .choose_season(SeasonChoice {
            number: 1,
            arc_name: Some("Romance Dawn".to_string()),
        })
        .await
        .unwrap();

    let seasons = harness.catalog.seasons_of(ParentType::Anime, id).await.unwrap();
    assert_eq!(seasons.len(), 1);
    assert_eq!(seasons[0].arc_name.as_deref(), Some("Romance Dawn"));
    assert_eq!(seasons[0].parent_type, ParentType::Anime);
}

#[tokio::test]
async fn test_series_ignores_arc_names() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();

    workflow.select_type(ContentType::Series).unwrap();
    workflow
        .submit_metadata(show_draft(ContentType::Series, "Dark", 1))
        .await
        .unwrap();
    let id = title_id(workflow.state());
    workflow
        .choose_season(SeasonChoice {
            number: 1,
            arc_name: Some("Ignored".to_string()),
        })
        .await
        .unwrap();

    let seasons = harness.catalog.seasons_of(ParentType::Series, id).await.unwrap();
    assert_eq!(seasons[0].arc_name, None);
}

// ============ 编辑模式 ============

#[tokio::test]
async fn test_edit_movie_keeps_existing_media() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();
    workflow.select_type(ContentType::Movie).unwrap();
    workflow.submit_metadata(movie_draft("Tset")).await.unwrap();
    let id = title_id(workflow.state());
    let before = harness.catalog.get_movie(id).await.unwrap();

    let mut editor = harness.workflow();
    editor.begin_edit(ContentType::Movie, id).await.unwrap();
    assert_eq!(
        *editor.state(),
        WorkflowState::EditMetadata {
            content_type: ContentType::Movie,
            editing: Some(id)
        }
    );
    assert_eq!(editor.snapshot().existing.map(|t| t.id()), Some(id));

    let draft = MetadataDraft::Movie(MovieDraft {
        fields: fields("Test"),
        poster: None,
        thumbnail: None,
        video: None,
    });
    editor.submit_metadata(draft).await.unwrap();

    let after = harness.catalog.get_movie(id).await.unwrap();
    assert_eq!(after.title, "Test");
    assert_eq!(after.poster_url, before.poster_url);
    assert_eq!(after.video_url, before.video_url);
    assert_eq!(after.duration, before.duration);
    assert_eq!(harness.catalog.count(Relation::Movies, &[]).await.unwrap(), 1);
}

#[tokio::test]
async fn test_edit_show_loads_progress_and_guards_season_count() {
    let harness = Harness::new().await;
    let mut workflow = harness.workflow();
    workflow.select_type(ContentType::Anime).unwrap();
    workflow
        .submit_metadata(show_draft(ContentType::Anime, "Naruto", 2))
        .await
        .unwrap();
    let id = title_id(workflow.state());
    workflow.choose_season(season(1)).await.unwrap();
    workflow.save_episode(episode("E1"), Advance::NextSeason).await.unwrap();
    workflow.save_episode(episode("E1"), Advance::Finish).await.unwrap();

    let mut editor = harness.workflow();
    editor.begin_edit(ContentType::Anime, id).await.unwrap();
    let progress: Vec<(u32, u32)> = editor.seasons().map(|s| (s.number, s.episodes)).collect();
    assert_eq!(progress, vec![(1, 1), (2, 1)]);

    let mut shrink = show_draft(ContentType::Anime, "Naruto", 1);
    if let MetadataDraft::Anime(ref mut show) = shrink {
        show.poster = None;
    }
    let err = editor.submit_metadata(shrink).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::SeasonCountBelowExisting {
            requested: 1,
            existing: 2
        })
    ));

    // 增加季数后作品不再完结
    let mut grow = show_draft(ContentType::Anime, "Naruto", 3);
    if let MetadataDraft::Anime(ref mut show) = grow {
        show.poster = None;
    }
    editor.submit_metadata(grow).await.unwrap();
    let anime = harness.catalog.get_anime(id).await.unwrap();
    assert_eq!(anime.season_count, 3);
    assert!(!anime.completed);

    editor.choose_season(season(1)).await.unwrap();
    assert_eq!(cursor(editor.state()), (1, 2));
}

#[tokio::test]
async fn test_edit_unknown_title_is_not_found() {
    let harness = Harness::new().await;
    let mut editor = harness.workflow();

    let err = editor.begin_edit(ContentType::Movie, 99).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Catalog(CatalogError::NotFound { id: 99, .. })));
    assert_eq!(*editor.state(), WorkflowState::SelectType);
}

// ============ 编号性质 ============

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// 任意顺序访问各季，单集编号始终从 1 连续递增
    #[test]
    fn prop_episode_numbers_stay_contiguous(
        visits in proptest::collection::vec((1u32..=3, 0u32..=3), 1..6)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let harness = Harness::new().await;
            let mut workflow = harness.workflow();
            workflow.select_type(ContentType::Anime).unwrap();
            workflow
                .submit_metadata(show_draft(ContentType::Anime, "Gintama", 3))
                .await
                .unwrap();
            let id = title_id(workflow.state());

            let mut expected = [0i64; 3];
            for (number, saves) in &visits {
                workflow.choose_season(season(*number)).await.unwrap();
                for _ in 0..*saves {
                    workflow.save_episode(episode("E"), Advance::NextEpisode).await.unwrap();
                }
                expected[(*number - 1) as usize] += *saves as i64;
                workflow.back_to_seasons().unwrap();
            }

            for stored in harness.catalog.seasons_of(ParentType::Anime, id).await.unwrap() {
                let numbers: Vec<i64> = harness
                    .catalog
                    .episodes_of(stored.id)
                    .await
                    .unwrap()
                    .iter()
                    .map(|e| e.episode_number)
                    .collect();
                let total = expected[(stored.season_number - 1) as usize];
                assert_eq!(numbers, (1..=total).collect::<Vec<_>>());
            }
        });
    }
}
