// src/utils/html.rs

use crate::models::quiz::{CreateQuestionRequest, QuizRequest};

/// Strips unsafe markup from authored text with ammonia's whitelist.
///
/// Safe inline tags such as <b> survive; <script> is removed with its content.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitized copy of quiz settings.
pub fn clean_quiz_request(req: &QuizRequest) -> QuizRequest {
    QuizRequest {
        title: clean_html(&req.title),
        ..req.clone()
    }
}

/// Sanitized copy of a question with its options.
pub fn clean_question_request(req: &CreateQuestionRequest) -> CreateQuestionRequest {
    let mut cleaned = req.clone();
    cleaned.text = clean_html(&req.text);
    for opt in &mut cleaned.answer_options {
        opt.text = clean_html(&opt.text);
    }
    cleaned
}
