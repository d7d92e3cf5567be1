//! 终端宿主
//!
//! 标准输入由后台任务逐行读取并转发到通道，
//! 这样答题时可以同时等待输入、计时和监考事件。
//! 渲染函数都是纯函数，只负责拼文字。

use crate::models::{AnswerOption, Branding, ExamResult, ExamSummary, OptionLabel, MAX_ATTEMPTS};
use crate::utils::{format_attempts, format_clock};
use crate::views::result::{closing_message, stat_lines};
use crate::workflow::session_runner::SESSION_EXPIRED_MESSAGE;
use crate::workflow::{SessionCommand, SessionEvent};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// 终端输入输出
pub struct Terminal {
    lines: mpsc::Receiver<String>,
    _pump: JoinHandle<()>,
    /// 连接的是真实终端，可以关闭回显
    interactive: bool,
}

impl Terminal {
    /// 启动标准输入读取任务
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel(32);
        let pump = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!("读取标准输入失败: {}", e);
                        break;
                    }
                }
            }
        });
        Self {
            lines: rx,
            _pump: pump,
            interactive: true,
        }
    }

    /// 预先给定输入行，用于测试
    #[cfg(test)]
    pub(crate) fn scripted(lines: &[&str]) -> Self {
        let (tx, rx) = mpsc::channel(lines.len().max(1));
        for line in lines {
            let _ = tx.try_send(line.to_string());
        }
        Self {
            lines: rx,
            _pump: tokio::spawn(async {}),
            interactive: false,
        }
    }

    /// 下一行输入；输入结束返回 None
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await.map(|l| l.trim().to_string())
    }

    pub async fn prompt(&mut self, label: &str) -> Option<String> {
        self.print_inline(label);
        self.next_line().await
    }

    /// 不回显输入（用于密码）
    pub async fn prompt_secret(&mut self, label: &str) -> Option<String> {
        let hidden = HiddenInput::engage(self.interactive);
        let line = self.prompt(label).await;
        if hidden.is_active() {
            self.print("");
        }
        line
    }

    pub fn print(&self, text: &str) {
        println!("{}", text);
    }

    pub fn print_inline(&self, text: &str) {
        print!("{}", text);
        let _ = std::io::stdout().flush();
    }
}

/// 关闭终端回显，drop 时恢复（包括被取消的情况）
struct HiddenInput {
    active: bool,
}

impl HiddenInput {
    fn engage(interactive: bool) -> Self {
        Self {
            active: interactive && stty("-echo"),
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for HiddenInput {
    fn drop(&mut self) {
        if self.active && !stty("echo") {
            debug!("恢复终端回显失败");
        }
    }
}

#[cfg(unix)]
fn stty(arg: &str) -> bool {
    std::process::Command::new("stty")
        .arg(arg)
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn stty(_arg: &str) -> bool {
    false
}

/// 解析答题时的一行输入
pub fn parse_command(input: &str) -> Option<SessionCommand> {
    let input = input.trim();
    if let Some(label) = OptionLabel::parse(input) {
        return Some(SessionCommand::Select(label));
    }

    match input.to_ascii_lowercase().as_str() {
        "s" | "submit" => Some(SessionCommand::Submit),
        "n" | "next" => Some(SessionCommand::Next),
        "back" => Some(SessionCommand::Back),
        "f5" => Some(SessionCommand::Key {
            key: "F5".to_string(),
            ctrl: false,
        }),
        "^r" | "ctrl+r" => Some(SessionCommand::Key {
            key: "r".to_string(),
            ctrl: true,
        }),
        "quit" | "exit" => Some(SessionCommand::Leave),
        _ => None,
    }
}

pub fn render_banner(branding: &Branding) -> String {
    let mut out = format!("=== {} ===", branding.display_name());
    if let Some(logo) = &branding.logo_url {
        out.push_str(&format!("\n[logo] {}", logo));
    }
    out.push_str("\nWelcome back. Please log in to continue.");
    out
}

pub fn render_exam(exam: &ExamSummary) -> String {
    format!(
        "{}\n{}\n\nTotal Questions : {}\nTime Allotment  : {} Minutes\nPassing Rate    : {} %\nAttempts Used   : {}",
        exam.title,
        exam.description,
        exam.total_questions,
        exam.duration,
        exam.pass_mark,
        format_attempts(exam.attempts_used, MAX_ATTEMPTS)
    )
}

pub fn render_instructions(instructions: &str) -> String {
    format!("--- Exam Rules & Instructions ---\n{}\n---------------------------------", instructions)
}

fn render_options(options: &[AnswerOption]) -> String {
    options
        .iter()
        .map(|o| format!("  ({}) {}", o.label, o.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 答题事件对应的输出；tick 只更新计时行
pub fn render_event(event: &SessionEvent) -> Option<String> {
    let text = match event {
        SessionEvent::Question {
            progress,
            stem,
            options,
            time_left,
        } => format!(
            "\n{}    ⏳ {}\n{}\n{}\n[a-d] select  [s] submit  [n] next",
            progress,
            format_clock(*time_left),
            stem,
            render_options(options)
        ),
        SessionEvent::Tick(left) if left % 60 == 0 || *left <= 10 => {
            format!("⏳ Time Remaining {}", format_clock(*left))
        }
        SessionEvent::Tick(_) => return None,
        SessionEvent::Selected(label) => format!("Selected ({})", label),
        SessionEvent::Submitting => "Submitting...".to_string(),
        SessionEvent::Feedback {
            headline,
            explanation,
        } => format!("{}\n💡 {}", headline, explanation),
        SessionEvent::Rejected(message) => message.clone(),
        SessionEvent::Warning(message) => format!("⚠ {}", message),
        SessionEvent::ProctorWarning { count, event } => {
            format!("⚠ Warning {}: {}", count, event)
        }
        SessionEvent::Unavailable(message) => message.clone(),
        SessionEvent::SessionExpired => SESSION_EXPIRED_MESSAGE.to_string(),
        SessionEvent::Finished { .. } => "🎉 Exam Finished!".to_string(),
    };
    Some(text)
}

pub fn render_result(result: &ExamResult) -> String {
    let mut out = format!(
        "=== {} ===\nStatus: {}\n{}",
        result.stats.title,
        result.status,
        result.status.message()
    );

    if let Some(user) = &result.user {
        out.push_str(&format!(
            "\n\nName    : {}\nCompany : {}\nEmail   : {}",
            user.name, user.company, user.email
        ));
    }

    out.push('\n');
    for (label, value) in stat_lines(result) {
        out.push_str(&format!("\n{:<16}: {}", label, value));
    }

    if let Some(message) = closing_message(result.status) {
        out.push_str(&format!("\n\n{}", message));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExamStats, ProctorEvent, ResultStatus};

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("b"), Some(SessionCommand::Select(OptionLabel::B)));
        assert_eq!(parse_command(" S "), Some(SessionCommand::Submit));
        assert_eq!(parse_command("next"), Some(SessionCommand::Next));
        assert_eq!(parse_command("back"), Some(SessionCommand::Back));
        assert_eq!(
            parse_command("ctrl+r"),
            Some(SessionCommand::Key {
                key: "r".to_string(),
                ctrl: true
            })
        );
        assert_eq!(parse_command("hello"), None);
    }

    #[tokio::test]
    async fn test_prompt_secret_reads_line() {
        let mut terminal = Terminal::scripted(&["  hunter2  "]);

        let hidden = HiddenInput::engage(terminal.interactive);
        assert!(!hidden.is_active());
        drop(hidden);

        assert_eq!(
            terminal.prompt_secret("Password: ").await.as_deref(),
            Some("hunter2")
        );
    }

    #[test]
    fn test_render_question_event() {
        let text = render_event(&SessionEvent::Question {
            progress: "Q 1 of 4".to_string(),
            stem: "2 + 2?".to_string(),
            options: vec![
                AnswerOption {
                    label: OptionLabel::C,
                    text: "4".to_string(),
                },
                AnswerOption {
                    label: OptionLabel::A,
                    text: "3".to_string(),
                },
            ],
            time_left: 600,
        })
        .unwrap();

        assert!(text.contains("Q 1 of 4"));
        assert!(text.contains("00:10:00"));
        assert!(text.contains("(C) 4\n  (A) 3"));
    }

    #[test]
    fn test_ticks_are_throttled_on_screen() {
        assert!(render_event(&SessionEvent::Tick(599)).is_none());
        assert_eq!(
            render_event(&SessionEvent::Tick(540)).as_deref(),
            Some("⏳ Time Remaining 00:09:00")
        );
        assert!(render_event(&SessionEvent::Tick(5)).is_some());
        assert_eq!(
            render_event(&SessionEvent::ProctorWarning {
                count: 2,
                event: ProctorEvent::CopyAttempt
            })
            .as_deref(),
            Some("⚠ Warning 2: Copy Attempt Detected")
        );
    }

    #[test]
    fn test_render_result() {
        let result = ExamResult {
            status: ResultStatus::Passed,
            stats: ExamStats {
                title: "Safety Induction".to_string(),
                total_questions: 10,
                score_percent: 90.0,
                pass_mark: 75,
                attempts_used: 1,
                duration: Some(10),
            },
            correct_count: 9,
            user: None,
        };

        let text = render_result(&result);
        assert!(text.contains("Status: passed"));
        assert!(text.contains("Correct Answers : 9"));
        assert!(text.contains("Duration        : 10 min"));
        assert!(text.contains("Please log out to secure your session."));
    }
}
