pub mod broadcast;
pub mod normalizer;
pub mod pipeline;

pub use broadcast::ChannelBroadcaster;
pub use normalizer::Normalizer;
pub use pipeline::Pipeline;

pub mod prelude {
    pub use super::broadcast::ChannelBroadcaster;
    pub use super::normalizer::{clean_text, normalize_source, parse_date, Normalizer};
    pub use super::pipeline::Pipeline;
}
