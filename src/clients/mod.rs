pub mod exam_client;

#[cfg(test)]
pub(crate) mod mock;

pub use exam_client::{ExamBackend, ExamClient};
