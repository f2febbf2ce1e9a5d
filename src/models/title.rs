use serde::{Deserialize, Serialize};

use super::content::{ContentType, ParentType};

/// 电影
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_year: i32,
    pub imdb_rating: f64,
    #[serde(default)]
    pub synopsis: String,
    pub poster_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    /// 时长（分钟）
    pub duration: Option<i64>,
}

/// 剧集 / 韩剧（共用 series 表）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Show {
    pub id: i64,
    pub title: String,
    pub release_year: i32,
    pub imdb_rating: f64,
    #[serde(default)]
    pub synopsis: String,
    pub poster_url: Option<String>,
    #[serde(default)]
    pub is_dorama: bool,
    #[serde(default = "default_season_count")]
    pub season_count: i64,
    #[serde(default)]
    pub completed: bool,
}

/// 动画
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anime {
    pub id: i64,
    pub title: String,
    pub release_year: i32,
    pub imdb_rating: f64,
    #[serde(default)]
    pub synopsis: String,
    pub poster_url: Option<String>,
    #[serde(default = "default_season_count")]
    pub season_count: i64,
    #[serde(default)]
    pub completed: bool,
}

fn default_season_count() -> i64 {
    1
}

/// 季 / 篇章
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Season {
    pub id: i64,
    pub parent_id: i64,
    pub parent_type: ParentType,
    pub season_number: i64,
    pub arc_name: Option<String>,
}

/// 单集
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub id: i64,
    pub season_id: i64,
    pub episode_number: i64,
    pub title: String,
    #[serde(default)]
    pub synopsis: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<i64>,
}

/// A top-level title of any kind.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Title {
    Movie(Movie),
    Series(Show),
    Drama(Show),
    Anime(Anime),
}

impl Title {
    pub fn from_show(show: Show) -> Self {
        if show.is_dorama {
            Title::Drama(show)
        } else {
            Title::Series(show)
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Title::Movie(m) => m.id,
            Title::Series(s) | Title::Drama(s) => s.id,
            Title::Anime(a) => a.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Title::Movie(m) => &m.title,
            Title::Series(s) | Title::Drama(s) => &s.title,
            Title::Anime(a) => &a.title,
        }
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            Title::Movie(_) => ContentType::Movie,
            Title::Series(_) => ContentType::Series,
            Title::Drama(_) => ContentType::Drama,
            Title::Anime(_) => ContentType::Anime,
        }
    }

    pub fn poster_url(&self) -> Option<&str> {
        match self {
            Title::Movie(m) => m.poster_url.as_deref(),
            Title::Series(s) | Title::Drama(s) => s.poster_url.as_deref(),
            Title::Anime(a) => a.poster_url.as_deref(),
        }
    }

    /// Declared season count, `None` for movies.
    pub fn season_count(&self) -> Option<i64> {
        match self {
            Title::Movie(_) => None,
            Title::Series(s) | Title::Drama(s) => Some(s.season_count),
            Title::Anime(a) => Some(a.season_count),
        }
    }
}

/// 带单集列表的季
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeasonWithEpisodes {
    #[serde(flatten)]
    pub season: Season,
    pub episodes: Vec<Episode>,
}

/// 内容详情（季按编号升序，单集按编号升序）
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContentDetails {
    pub title: Title,
    pub seasons: Vec<SeasonWithEpisodes>,
}

impl ContentDetails {
    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }
}

// ============ Insert payloads ============

#[derive(Debug, Clone, Serialize)]
pub struct NewMovie {
    pub title: String,
    pub release_year: i32,
    pub imdb_rating: f64,
    pub synopsis: String,
    pub poster_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<i64>,
}

/// Insert payload for both the series and animes relations; `is_dorama` is
/// omitted for animes.
#[derive(Debug, Clone, Serialize)]
pub struct NewShow {
    pub title: String,
    pub release_year: i32,
    pub imdb_rating: f64,
    pub synopsis: String,
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_dorama: Option<bool>,
    pub season_count: i64,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSeason {
    pub parent_id: i64,
    pub parent_type: ParentType,
    pub season_number: i64,
    pub arc_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewEpisode {
    pub season_id: i64,
    pub episode_number: i64,
    pub title: String,
    pub synopsis: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<i64>,
}

// ============ Patches ============

/// Partial update of a title row; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TitlePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeasonPatch {
    pub arc_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EpisodePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}
