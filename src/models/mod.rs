pub mod branding;
pub mod envelope;
pub mod exam;
pub mod proctor;
pub mod question;
pub mod result;

pub use branding::{Branding, BrandingPayload};
pub use envelope::{ApiEnvelope, MaybeWrapped};
pub use exam::{ExamSummary, MAX_ATTEMPTS};
pub use proctor::{CheatReport, ProctorEvent};
pub use question::{AnswerOption, AnswerVerdict, OptionLabel, Question, QuestionItem};
pub use result::{Candidate, ExamResult, ExamStats, ResultStatus};
