//! Events - 投影推送

mod publisher;

pub use publisher::ProjectionPublisher;
