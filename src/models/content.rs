use serde::{Deserialize, Serialize};

/// 目录中的内容类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Movie,
    Series,
    Drama,
    Anime,
}

/// 底层关系（表）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Movies,
    Series,
    Animes,
    Seasons,
    Episodes,
}

/// Owner tag stored on season rows. Dramas share the series relation, so
/// their seasons are tagged `series` as well.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParentType {
    Series,
    Anime,
}

/// 元数据表单字段
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
    Title,
    ReleaseYear,
    ImdbRating,
    Synopsis,
    Poster,
    Thumbnail,
    Video,
    SeasonCount,
}

/// 内容类型描述（静态注册表条目）
#[derive(Debug, Clone, Serialize)]
pub struct ContentDescriptor {
    pub content_type: ContentType,
    pub tag: &'static str,
    pub display_name: &'static str,
    pub relation: Relation,
    pub fields: &'static [MetadataField],
    pub has_seasons: bool,
    /// Singular label for one season/arc, `None` for movies.
    pub unit_label: Option<&'static str>,
    pub parent_type: Option<ParentType>,
}

const MOVIE_FIELDS: &[MetadataField] = &[
    MetadataField::Title,
    MetadataField::ReleaseYear,
    MetadataField::ImdbRating,
    MetadataField::Synopsis,
    MetadataField::Poster,
    MetadataField::Thumbnail,
    MetadataField::Video,
];

const SHOW_FIELDS: &[MetadataField] = &[
    MetadataField::Title,
    MetadataField::ReleaseYear,
    MetadataField::ImdbRating,
    MetadataField::Synopsis,
    MetadataField::Poster,
    MetadataField::SeasonCount,
];

static MOVIE: ContentDescriptor = ContentDescriptor {
    content_type: ContentType::Movie,
    tag: "movie",
    display_name: "Filme",
    relation: Relation::Movies,
    fields: MOVIE_FIELDS,
    has_seasons: false,
    unit_label: None,
    parent_type: None,
};

static SERIES: ContentDescriptor = ContentDescriptor {
    content_type: ContentType::Series,
    tag: "series",
    display_name: "Série",
    relation: Relation::Series,
    fields: SHOW_FIELDS,
    has_seasons: true,
    unit_label: Some("temporada"),
    parent_type: Some(ParentType::Series),
};

static DRAMA: ContentDescriptor = ContentDescriptor {
    content_type: ContentType::Drama,
    tag: "drama",
    display_name: "Dorama",
    relation: Relation::Series,
    fields: SHOW_FIELDS,
    has_seasons: true,
    unit_label: Some("temporada"),
    parent_type: Some(ParentType::Series),
};

static ANIME: ContentDescriptor = ContentDescriptor {
    content_type: ContentType::Anime,
    tag: "anime",
    display_name: "Anime",
    relation: Relation::Animes,
    fields: SHOW_FIELDS,
    has_seasons: true,
    unit_label: Some("arco"),
    parent_type: Some(ParentType::Anime),
};

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::Movie,
        ContentType::Series,
        ContentType::Drama,
        ContentType::Anime,
    ];

    /// 查询注册表
    pub fn descriptor(self) -> &'static ContentDescriptor {
        match self {
            ContentType::Movie => &MOVIE,
            ContentType::Series => &SERIES,
            ContentType::Drama => &DRAMA,
            ContentType::Anime => &ANIME,
        }
    }

    pub fn relation(self) -> Relation {
        self.descriptor().relation
    }

    pub fn has_seasons(self) -> bool {
        self.descriptor().has_seasons
    }

    pub fn parent_type(self) -> Option<ParentType> {
        self.descriptor().parent_type
    }

    pub fn unit_label(self) -> Option<&'static str> {
        self.descriptor().unit_label
    }

    pub fn accepts(self, field: MetadataField) -> bool {
        self.descriptor().fields.contains(&field)
    }

    /// `is_dorama` value written for rows in the series relation.
    pub fn dorama_flag(self) -> Option<bool> {
        match self {
            ContentType::Series => Some(false),
            ContentType::Drama => Some(true),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.descriptor().tag)
    }
}

/// Tag outside the registered set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown content type: {0}")]
pub struct UnknownContentType(pub String);

impl std::str::FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" | "filme" => Ok(ContentType::Movie),
            "series" | "serie" => Ok(ContentType::Series),
            "drama" | "kdrama" | "dorama" => Ok(ContentType::Drama),
            "anime" | "animes" => Ok(ContentType::Anime),
            _ => Err(UnknownContentType(s.to_string())),
        }
    }
}

impl Relation {
    pub const ALL: [Relation; 5] = [
        Relation::Movies,
        Relation::Series,
        Relation::Animes,
        Relation::Seasons,
        Relation::Episodes,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Relation::Movies => "movies",
            Relation::Series => "series",
            Relation::Animes => "animes",
            Relation::Seasons => "seasons",
            Relation::Episodes => "episodes",
        }
    }

    /// Whether rows of this relation are top-level titles.
    pub fn is_title(self) -> bool {
        matches!(self, Relation::Movies | Relation::Series | Relation::Animes)
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

impl ParentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParentType::Series => "series",
            ParentType::Anime => "anime",
        }
    }
}
