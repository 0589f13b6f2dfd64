pub mod feed;
pub mod interactions;
pub mod recommender;

pub use feed::FeedComposer;
pub use recommender::{GorseClient, Recommender};
