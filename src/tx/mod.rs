//! Transaction submission module with nonce management and gas optimization

mod gas;
mod nonce;
mod report;
mod submitter;
mod template;

pub use report::{ChannelSink, SubmissionReport, SubmissionSink};
pub use submitter::{BatchOutcome, BatchSubmitter};
pub use template::TxTemplate;
