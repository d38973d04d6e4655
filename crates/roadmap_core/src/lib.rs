pub mod domain;
pub mod extract;
pub mod notes;
pub mod ports;
pub mod registry;
pub mod resolver;
pub mod submission;
pub mod walker;

#[cfg(test)]
pub(crate) mod testing;

pub use domain::{
    Coordinates, CreatedPoint, NewPoint, Point, ResolutionDebug, ResolutionResult, Submission,
    WalkOutcome,
};
pub use extract::{extract_from_html, extract_from_url};
pub use notes::{NotesError, NotesLog};
pub use ports::{FetchedPage, Geocoder, PageFetcher, PointStore, PortError, PortResult};
pub use registry::Registry;
pub use resolver::LinkResolver;
pub use submission::{SubmissionError, SubmissionService};
pub use walker::{RedirectWalker, DEFAULT_MAX_HOPS};
