use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::error::CatalogError;
use crate::database::{GatewayError, Predicate, Row, RowQuery, RowStore, SortOrder};
use crate::models::{
    Anime, ContentDetails, ContentType, Episode, Movie, ParentType, Relation, Season,
    SeasonWithEpisodes, Show, Title, TitlePatch, ValidationError,
};

/// 每页条目数
pub const PAGE_SIZE: u64 = 30;

/// 级联删除统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub titles: u64,
    pub seasons: u64,
    pub episodes: u64,
}

impl DeleteReport {
    pub fn total(&self) -> u64 {
        self.titles + self.seasons + self.episodes
    }
}

/// 按首字母浏览
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseQuery {
    pub letter: Option<char>,
    /// 1-based; 0 is treated as 1.
    pub page: u64,
    /// Restricts the series relation to dramas (`Some(true)`) or regular series.
    pub dorama: Option<bool>,
}

/// 分页结果
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

/// 目录查询层
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn RowStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    // ============ 通用操作 ============

    /// Inserts `record` and returns the stored row decoded as `R`.
    pub async fn insert<T, R>(&self, relation: Relation, record: &T) -> Result<R, CatalogError>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let row = to_row(relation, record)?;
        let rows = self.store.insert(relation, row).await.map_err(|source| {
            tracing::error!("Insert into {} failed: {}", relation, source);
            CatalogError::Insert { relation, source }
        })?;

        let Some(first) = rows.into_iter().next() else {
            tracing::error!("Insert into {} returned no rows", relation);
            return Err(CatalogError::InsertEmpty(relation));
        };

        let stored: R = decode(relation, first)?;
        tracing::info!("Inserted row into {}", relation);
        Ok(stored)
    }

    /// Applies `patch` to row `id`. Zero matched rows is `NotFound`.
    pub async fn update<T>(&self, relation: Relation, id: i64, patch: &T) -> Result<(), CatalogError>
    where
        T: Serialize + Sync,
    {
        let row = to_row(relation, patch)?;
        let touched = self
            .store
            .update(relation, &[Predicate::eq("id", id)], row)
            .await
            .map_err(|source| {
                tracing::error!("Update of {} {} failed: {}", relation, id, source);
                CatalogError::Update { relation, source }
            })?;

        if touched == 0 {
            return Err(CatalogError::NotFound { relation, id });
        }
        tracing::info!("Updated {} {}", relation, id);
        Ok(())
    }

    pub async fn delete_row(&self, relation: Relation, id: i64) -> Result<(), CatalogError> {
        let removed = self.delete_where(relation, &[Predicate::eq("id", id)]).await?;
        if removed == 0 {
            return Err(CatalogError::NotFound { relation, id });
        }
        Ok(())
    }

    /// 删除季及其所有单集
    pub async fn delete_season(&self, season_id: i64) -> Result<DeleteReport, CatalogError> {
        let _season: Season = self.get_by_id(Relation::Seasons, season_id).await?;

        let episodes = self
            .delete_where(Relation::Episodes, &[Predicate::eq("season_id", season_id)])
            .await?;
        self.delete_row(Relation::Seasons, season_id).await?;

        Ok(DeleteReport {
            titles: 0,
            seasons: 1,
            episodes,
        })
    }

    /// 删除作品并级联删除季和单集（先删子项）
    pub async fn delete_title(&self, kind: ContentType, id: i64) -> Result<DeleteReport, CatalogError> {
        let relation = kind.relation();
        self.get_title(kind, id).await?;

        let mut report = DeleteReport::default();
        if let Some(parent_type) = kind.parent_type() {
            for season in self.seasons_of(parent_type, id).await? {
                let season_report = self.delete_season(season.id).await?;
                report.seasons += season_report.seasons;
                report.episodes += season_report.episodes;
            }
        }

        self.delete_row(relation, id).await?;
        report.titles = 1;

        tracing::info!(
            "Deleted {} {} ({} seasons, {} episodes)",
            kind,
            id,
            report.seasons,
            report.episodes
        );
        Ok(report)
    }

    pub async fn list<T: DeserializeOwned>(&self, relation: Relation) -> Result<Vec<T>, CatalogError> {
        let query = if relation.is_title() {
            RowQuery::new().order_by("title", SortOrder::Asc)
        } else {
            RowQuery::new().order_by("id", SortOrder::Asc)
        };
        self.select(relation, &query).await
    }

    pub async fn get_by_id<T: DeserializeOwned>(&self, relation: Relation, id: i64) -> Result<T, CatalogError> {
        let query = RowQuery::new().eq("id", id).limit(1);
        self.select(relation, &query)
            .await?
            .into_iter()
            .next()
            .ok_or(CatalogError::NotFound { relation, id })
    }

    /// Case-insensitive substring match on `title`, ordered by title.
    pub async fn search<T: DeserializeOwned>(
        &self,
        relation: Relation,
        substring: &str,
    ) -> Result<Vec<T>, CatalogError> {
        let query = RowQuery::new()
            .filter(Predicate::contains("title", substring.trim()))
            .order_by("title", SortOrder::Asc);
        self.select(relation, &query).await
    }

    /// 跨电影、剧集、动画搜索
    pub async fn search_all(&self, substring: &str) -> Result<Vec<Title>, CatalogError> {
        let mut titles: Vec<Title> = Vec::new();
        titles.extend(self.search_movies(substring).await?.into_iter().map(Title::Movie));
        titles.extend(
            self.search::<Show>(Relation::Series, substring)
                .await?
                .into_iter()
                .map(Title::from_show),
        );
        titles.extend(self.search_animes(substring).await?.into_iter().map(Title::Anime));
        Ok(titles)
    }

    pub async fn count(&self, relation: Relation, predicates: &[Predicate]) -> Result<u64, CatalogError> {
        self.store
            .count(relation, predicates)
            .await
            .map_err(|source| query_error(relation, source))
    }

    // ============ 类型化查询 ============

    pub async fn list_movies(&self) -> Result<Vec<Movie>, CatalogError> {
        self.list(Relation::Movies).await
    }

    /// Regular series (`dorama == false`) or dramas (`dorama == true`).
    pub async fn list_series(&self, dorama: bool) -> Result<Vec<Show>, CatalogError> {
        let query = RowQuery::new()
            .eq("is_dorama", dorama)
            .order_by("title", SortOrder::Asc);
        self.select(Relation::Series, &query).await
    }

    pub async fn list_animes(&self) -> Result<Vec<Anime>, CatalogError> {
        self.list(Relation::Animes).await
    }

    pub async fn list_titles(&self, kind: ContentType) -> Result<Vec<Title>, CatalogError> {
        Ok(match kind {
            ContentType::Movie => self.list_movies().await?.into_iter().map(Title::Movie).collect(),
            ContentType::Series | ContentType::Drama => self
                .list_series(kind == ContentType::Drama)
                .await?
                .into_iter()
                .map(Title::from_show)
                .collect(),
            ContentType::Anime => self.list_animes().await?.into_iter().map(Title::Anime).collect(),
        })
    }

    pub async fn get_movie(&self, id: i64) -> Result<Movie, CatalogError> {
        self.get_by_id(Relation::Movies, id).await
    }

    pub async fn get_show(&self, id: i64) -> Result<Show, CatalogError> {
        self.get_by_id(Relation::Series, id).await
    }

    pub async fn get_anime(&self, id: i64) -> Result<Anime, CatalogError> {
        self.get_by_id(Relation::Animes, id).await
    }

    /// 剧集与韩剧共用一张表，`is_dorama` 与请求的类型不符时视为不存在
    pub async fn get_title(&self, kind: ContentType, id: i64) -> Result<Title, CatalogError> {
        let title = match kind {
            ContentType::Movie => Title::Movie(self.get_movie(id).await?),
            ContentType::Series | ContentType::Drama => Title::from_show(self.get_show(id).await?),
            ContentType::Anime => Title::Anime(self.get_anime(id).await?),
        };
        if title.content_type() != kind {
            return Err(CatalogError::NotFound {
                relation: kind.relation(),
                id,
            });
        }
        Ok(title)
    }

    pub async fn search_movies(&self, substring: &str) -> Result<Vec<Movie>, CatalogError> {
        self.search(Relation::Movies, substring).await
    }

    pub async fn search_series(&self, substring: &str, dorama: bool) -> Result<Vec<Show>, CatalogError> {
        let query = RowQuery::new()
            .filter(Predicate::contains("title", substring.trim()))
            .eq("is_dorama", dorama)
            .order_by("title", SortOrder::Asc);
        self.select(Relation::Series, &query).await
    }

    pub async fn search_animes(&self, substring: &str) -> Result<Vec<Anime>, CatalogError> {
        self.search(Relation::Animes, substring).await
    }

    pub async fn search_titles(&self, kind: ContentType, substring: &str) -> Result<Vec<Title>, CatalogError> {
        Ok(match kind {
            ContentType::Movie => self
                .search_movies(substring)
                .await?
                .into_iter()
                .map(Title::Movie)
                .collect(),
            ContentType::Series | ContentType::Drama => self
                .search_series(substring, kind == ContentType::Drama)
                .await?
                .into_iter()
                .map(Title::from_show)
                .collect(),
            ContentType::Anime => self
                .search_animes(substring)
                .await?
                .into_iter()
                .map(Title::Anime)
                .collect(),
        })
    }

    // ============ 季 / 单集 ============

    /// Seasons of a title, ascending by number.
    pub async fn seasons_of(&self, parent_type: ParentType, parent_id: i64) -> Result<Vec<Season>, CatalogError> {
        let query = RowQuery::new()
            .eq("parent_id", parent_id)
            .eq("parent_type", parent_type.as_str())
            .order_by("season_number", SortOrder::Asc);
        self.select(Relation::Seasons, &query).await
    }

    pub async fn find_season(
        &self,
        parent_type: ParentType,
        parent_id: i64,
        number: u32,
    ) -> Result<Option<Season>, CatalogError> {
        let query = RowQuery::new()
            .eq("parent_id", parent_id)
            .eq("parent_type", parent_type.as_str())
            .eq("season_number", number)
            .limit(1);
        Ok(self.select(Relation::Seasons, &query).await?.into_iter().next())
    }

    /// Episodes of a season, ascending by number.
    pub async fn episodes_of(&self, season_id: i64) -> Result<Vec<Episode>, CatalogError> {
        let query = RowQuery::new()
            .eq("season_id", season_id)
            .order_by("episode_number", SortOrder::Asc);
        self.select(Relation::Episodes, &query).await
    }

    pub async fn count_episodes(&self, season_id: i64) -> Result<u64, CatalogError> {
        self.count(Relation::Episodes, &[Predicate::eq("season_id", season_id)])
            .await
    }

    /// 作品详情：季按编号升序，单集按编号升序
    pub async fn get_content_details(&self, id: i64, kind: ContentType) -> Result<ContentDetails, CatalogError> {
        let title = self.get_title(kind, id).await?;

        let mut seasons = Vec::new();
        if let Some(parent_type) = kind.parent_type() {
            for season in self.seasons_of(parent_type, id).await? {
                let episodes = self.episodes_of(season.id).await?;
                seasons.push(SeasonWithEpisodes { season, episodes });
            }
        }

        Ok(ContentDetails { title, seasons })
    }

    /// Marks a seasonal title as fully authored.
    pub async fn mark_completed(&self, kind: ContentType, id: i64) -> Result<(), CatalogError> {
        let patch = TitlePatch {
            completed: Some(true),
            ..Default::default()
        };
        self.update(kind.relation(), id, &patch).await
    }

    // ============ 浏览 ============

    /// 按首字母分页浏览，每页 30 条，按标题排序
    pub async fn browse(&self, relation: Relation, browse: &BrowseQuery) -> Result<Page<Title>, CatalogError> {
        if !relation.is_title() {
            return Err(query_error(
                relation,
                GatewayError::InvalidValue("relation is not browsable".to_string()),
            ));
        }

        let mut predicates = Vec::new();
        if let Some(letter) = browse.letter {
            predicates.push(Predicate::starts_with("title", letter.to_string()));
        }
        if relation == Relation::Series {
            if let Some(dorama) = browse.dorama {
                predicates.push(Predicate::eq("is_dorama", dorama));
            }
        }

        let page = browse.page.max(1);
        let offset = (page - 1)
            .checked_mul(PAGE_SIZE)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or(ValidationError::PageOutOfRange(page))?;

        let total = self.count(relation, &predicates).await?;
        let mut query = RowQuery::new()
            .order_by("title", SortOrder::Asc)
            .limit(PAGE_SIZE)
            .offset(offset);
        query.predicates = predicates;

        let rows: Vec<Value> = self.select(relation, &query).await?;
        let items = rows
            .into_iter()
            .map(|row| title_from_row(relation, row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            page,
            per_page: PAGE_SIZE,
            total_pages: total.div_ceil(PAGE_SIZE),
        })
    }

    async fn select<T: DeserializeOwned>(&self, relation: Relation, query: &RowQuery) -> Result<Vec<T>, CatalogError> {
        let rows = self
            .store
            .select(relation, query)
            .await
            .map_err(|source| query_error(relation, source))?;
        rows.into_iter().map(|row| decode(relation, row)).collect()
    }

    async fn delete_where(&self, relation: Relation, predicates: &[Predicate]) -> Result<u64, CatalogError> {
        self.store.delete(relation, predicates).await.map_err(|source| {
            tracing::error!("Delete from {} failed: {}", relation, source);
            CatalogError::Delete { relation, source }
        })
    }
}

fn query_error(relation: Relation, source: GatewayError) -> CatalogError {
    tracing::error!("Query on {} failed: {}", relation, source);
    CatalogError::Query { relation, source }
}

fn to_row<T: Serialize>(relation: Relation, record: &T) -> Result<Row, CatalogError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CatalogError::Decode {
            relation,
            message: format!("expected an object, got {}", other),
        }),
        Err(e) => Err(CatalogError::Decode {
            relation,
            message: e.to_string(),
        }),
    }
}

fn decode<T: DeserializeOwned>(relation: Relation, row: Value) -> Result<T, CatalogError> {
    serde_json::from_value(row).map_err(|e| CatalogError::Decode {
        relation,
        message: e.to_string(),
    })
}

fn title_from_row(relation: Relation, row: Value) -> Result<Title, CatalogError> {
    match relation {
        Relation::Movies => Ok(Title::Movie(decode(relation, row)?)),
        Relation::Series => Ok(Title::from_show(decode(relation, row)?)),
        Relation::Animes => Ok(Title::Anime(decode(relation, row)?)),
        other => Err(CatalogError::Decode {
            relation: other,
            message: "not a title relation".to_string(),
        }),
    }
}
