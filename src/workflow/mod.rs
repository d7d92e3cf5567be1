pub mod exam_session;
pub mod session_ctx;
pub mod session_runner;

pub use exam_session::{Advance, ExamSession, Feedback, FinishReason, SessionPhase, NO_EXPLANATION};
pub use session_ctx::SessionCtx;
pub use session_runner::{SessionCommand, SessionEvent, SessionOutcome, SessionRunner};
