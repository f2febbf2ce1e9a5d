pub mod catalog;
pub mod duration;
pub mod error;
pub mod gateway;
pub mod rating;
pub mod session;
pub mod upload;
pub mod workflow;

pub use catalog::{BrowseQuery, CatalogService, DeleteReport, Page, PAGE_SIZE};
pub use duration::{to_minutes, DurationProbe, FfprobeDurationProbe};
pub use gateway::{Gateways, SharedGateways};
pub use error::{AuthError, CatalogError, DurationDecodeError, UploadError, WorkflowError};
pub use rating::{HoldHandle, HoldRepeater, RatingStepper};
pub use session::{AuthClient, AuthEvent, AuthService, Session, SessionContext, SessionState, User};
pub use upload::MediaUploader;
pub use workflow::{AuthoringWorkflow, SeasonProgress, WorkflowSnapshot, WorkflowState};
