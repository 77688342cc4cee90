pub mod error;
pub mod feed;
pub mod geometry;
pub mod labels;
pub mod ride;
pub mod footpath;
pub mod round;
pub mod journey;
pub mod transfer_gen;
pub mod utils;

pub use error::{RaptorError, RaptorResult};
pub use feed::{FeedBuilder, FeedView};
pub use journey::{Journey, JourneyError, Leg};
pub use round::{search, SearchConfig};
