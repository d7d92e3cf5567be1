//! 显示格式化

/// 把剩余秒数格式化为 `HH:MM:SS`
pub fn format_clock(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// 已用次数显示，例如 `2 of 3`
pub fn format_attempts(used: u32, max: u32) -> String {
    format!("{} of {}", used, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(45), "00:00:45");
        assert_eq!(format_clock(600), "00:10:00");
        assert_eq!(format_clock(3 * 3600 + 61), "03:01:01");
    }

    #[test]
    fn test_format_attempts() {
        assert_eq!(format_attempts(1, 3), "1 of 3");
    }
}
