//! Prompt templates for fallback answer generation

/// Returned when the generation reply carries no `response` field
pub const GENERATION_FALLBACK: &str = "⚠️ 모델 응답 오류";

/// Prompt for answering a question, optionally grounded on retrieved context
pub fn answer_prompt(question: &str, context: &str) -> String {
    format!("질문: {}\n\n참고 문서: {}\n\n답변:", question, context)
}
