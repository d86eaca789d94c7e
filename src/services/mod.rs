// Humaniser Core Services

pub mod text_processor;
pub mod rule_rewriter;
pub mod config_store;
pub mod providers;
pub mod paraphraser;
pub mod humaniser;

pub use text_processor::*;
pub use rule_rewriter::rewrite;
pub use config_store::*;
pub use providers::*;
pub use paraphraser::{ParaphraseService, ServiceStatus};
pub use humaniser::{HumaniseMethod, Humanised, HumaniserPipeline};
