const MATH_KEYWORDS: [&str; 2] = ["수학", "문제"];

/// Rule-based reply for the lightweight chat endpoint.
///
/// Returns `None` for a blank message.
pub fn chat_reply(message: &str) -> Option<&'static str> {
    let message = message.trim();
    if message.is_empty() {
        return None;
    }
    if MATH_KEYWORDS.iter().any(|keyword| message.contains(keyword)) {
        Some("수학 문제를 풀어드릴 수 있습니다! /api/solve 엔드포인트를 사용해보세요.")
    } else {
        Some("안녕하세요! 저는 수학 학습을 도와주는 AI 튜터입니다.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_reply() {
        assert_eq!(chat_reply("   "), None);
        assert!(chat_reply("이 문제 어떻게 풀어요?").unwrap().contains("/api/solve"));
        assert!(chat_reply("수학이 어려워요").unwrap().contains("/api/solve"));
        assert!(chat_reply("안녕").unwrap().starts_with("안녕하세요"));
    }
}
