//! System prompt templates for the AI tutor

use super::types::TutorTask;

/// Token budget per request kind
pub fn max_tokens(task: TutorTask) -> u32 {
    match task {
        TutorTask::Flashcard => 800,
        TutorTask::Explanation => 600,
        TutorTask::Quiz => 400,
    }
}

/// Build the system instructions for a request kind and subject
pub fn system_message(task: TutorTask, subject: &str) -> String {
    match task {
        TutorTask::Flashcard => format!(
            r#"You are an expert AP-level tutor for {subject}. Generate educational flashcard content suitable for AP students preparing for exams.

CRITICAL INSTRUCTIONS:
1. Return ONLY a valid JSON array with exactly 3 flashcards
2. Each flashcard MUST have exactly these properties: "front" (the question) and "back" (the answer)
3. Make questions challenging but appropriate for AP level
4. Include detailed, educational answers that help students learn
5. NO markdown formatting, NO code blocks, NO extra text
6. Return ONLY the raw JSON array starting with [ and ending with ]

Example format:
[{{"front": "What is...", "back": "The answer is..."}}, {{"front": "Explain...", "back": "It means..."}}]"#
        ),
        TutorTask::Explanation => format!(
            r#"You are an expert AP-level tutor for {subject}. Provide clear, detailed explanations suitable for AP students.

Guidelines:
- Use academic but accessible language
- Break down complex concepts into understandable parts
- Provide examples when helpful
- Keep responses focused and educational
- Aim for 100-200 words unless more detail is needed"#
        ),
        TutorTask::Quiz => format!(
            r#"You are creating AP-level quiz questions for {subject}. Generate challenging multiple choice questions.

CRITICAL INSTRUCTIONS:
1. Return ONLY valid JSON with these exact properties:
   - "question": the quiz question (string)
   - "options": array of exactly 4 answer choices (string array)
   - "correctAnswer": index of correct answer 0-3 (number)
2. Make questions AP exam difficulty
3. All options should be plausible to test understanding
4. NO markdown, NO code blocks, NO extra text
5. Return ONLY the raw JSON object starting with {{ and ending with }}

Example format:
{{"question": "What is...", "options": ["A", "B", "C", "D"], "correctAnswer": 0}}"#
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_is_interpolated() {
        let message = system_message(TutorTask::Explanation, "AP Biology");
        assert!(message.contains("AP Biology"));
    }

    #[test]
    fn test_structured_tasks_demand_raw_json() {
        assert!(system_message(TutorTask::Flashcard, "AP Chemistry").contains("JSON array"));
        assert!(system_message(TutorTask::Quiz, "AP Chemistry").contains("correctAnswer"));
    }

    #[test]
    fn test_token_budget_per_task() {
        assert_eq!(max_tokens(TutorTask::Flashcard), 800);
        assert_eq!(max_tokens(TutorTask::Explanation), 600);
        assert_eq!(max_tokens(TutorTask::Quiz), 400);
    }
}
