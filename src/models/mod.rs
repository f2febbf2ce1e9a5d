pub mod content;
pub mod form;
pub mod rating;
pub mod title;
pub mod validation;

pub use content::{ContentDescriptor, ContentType, MetadataField, ParentType, Relation, UnknownContentType};
pub use form::{
    Advance, EpisodeDraft, MediaFile, MetadataDraft, MovieDraft, SeasonChoice, ShowDraft, TitleFields,
};
pub use rating::RatingStepper;
pub use title::{
    Anime, ContentDetails, Episode, EpisodePatch, Movie, NewEpisode, NewMovie, NewSeason, NewShow,
    Season, SeasonPatch, SeasonWithEpisodes, Show, Title, TitlePatch,
};
pub use validation::{NumberValidator, StringValidator, ValidationError, Validator};
