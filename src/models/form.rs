use serde::{Deserialize, Serialize};

use super::content::ContentType;
use super::rating::RatingStepper;
use super::validation::{NumberValidator, StringValidator, ValidationError, Validator};

/// 上传的文件（原始文件名 + 内容）
#[derive(Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Lower-cased extension of the original file name, if any.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Bytes are elided; video payloads would flood the logs otherwise.
impl std::fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// 所有内容类型共有的元数据字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleFields {
    pub title: String,
    pub release_year: i32,
    pub imdb_rating: f64,
    #[serde(default)]
    pub synopsis: String,
}

impl Validator for TitleFields {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        StringValidator::validate_title(&self.title)?;
        NumberValidator::validate_year(self.release_year)?;
        NumberValidator::validate_rating(self.imdb_rating)?;
        StringValidator::validate_synopsis(&self.synopsis)?;
        Ok(())
    }
}

impl TitleFields {
    /// Trimmed title/synopsis and the rating snapped to the stepper grid.
    pub fn normalized(&self) -> TitleFields {
        TitleFields {
            title: self.title.trim().to_string(),
            release_year: self.release_year,
            imdb_rating: RatingStepper::from_value(self.imdb_rating).value(),
            synopsis: self.synopsis.trim().to_string(),
        }
    }
}

/// 电影表单
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDraft {
    pub fields: TitleFields,
    pub poster: Option<MediaFile>,
    pub thumbnail: Option<MediaFile>,
    pub video: Option<MediaFile>,
}

/// 剧集/韩剧/动画表单
#[derive(Debug, Clone, PartialEq)]
pub struct ShowDraft {
    pub fields: TitleFields,
    pub poster: Option<MediaFile>,
    pub season_count: u32,
}

impl Validator for MovieDraft {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        self.fields.validate()
    }
}

impl Validator for ShowDraft {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        self.fields.validate()?;
        NumberValidator::validate_season_count(self.season_count)
    }
}

/// Metadata form, one concrete shape per content type.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataDraft {
    Movie(MovieDraft),
    Series(ShowDraft),
    Drama(ShowDraft),
    Anime(ShowDraft),
}

impl MetadataDraft {
    pub fn content_type(&self) -> ContentType {
        match self {
            MetadataDraft::Movie(_) => ContentType::Movie,
            MetadataDraft::Series(_) => ContentType::Series,
            MetadataDraft::Drama(_) => ContentType::Drama,
            MetadataDraft::Anime(_) => ContentType::Anime,
        }
    }

    pub fn fields(&self) -> &TitleFields {
        match self {
            MetadataDraft::Movie(m) => &m.fields,
            MetadataDraft::Series(s) | MetadataDraft::Drama(s) | MetadataDraft::Anime(s) => {
                &s.fields
            }
        }
    }

    /// Wraps a show draft in the variant matching `kind`.
    pub fn show(kind: ContentType, draft: ShowDraft) -> Option<Self> {
        match kind {
            ContentType::Series => Some(MetadataDraft::Series(draft)),
            ContentType::Drama => Some(MetadataDraft::Drama(draft)),
            ContentType::Anime => Some(MetadataDraft::Anime(draft)),
            ContentType::Movie => None,
        }
    }
}

impl Validator for MetadataDraft {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        match self {
            MetadataDraft::Movie(m) => m.validate(),
            MetadataDraft::Series(s) | MetadataDraft::Drama(s) | MetadataDraft::Anime(s) => {
                s.validate()
            }
        }
    }
}

/// 选择季/篇章
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonChoice {
    pub number: u32,
    #[serde(default)]
    pub arc_name: Option<String>,
}

/// 单集表单
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeDraft {
    pub title: String,
    pub synopsis: String,
    pub thumbnail: Option<MediaFile>,
    pub video: Option<MediaFile>,
}

impl Validator for EpisodeDraft {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        StringValidator::validate_title(&self.title)?;
        StringValidator::validate_synopsis(&self.synopsis)
    }
}

/// 保存单集后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advance {
    NextEpisode,
    NextSeason,
    Finish,
}
