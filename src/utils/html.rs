// src/utils/html.rs

use crate::models::{Answer, Question};

/// Strips markup from user-supplied text before it is stored.
///
/// Quiz titles, question text and open-ended answers are shown back to other
/// users, so script tags and event-handler attributes must not survive.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

pub fn clean_question(question: &mut Question) {
    question.text = clean_html(&question.text);
    for option in &mut question.options {
        *option = clean_html(option);
    }
    if let Some(explanation) = question.explanation.as_mut() {
        *explanation = clean_html(explanation);
    }
}

pub fn clean_answer(answer: &mut Answer) {
    if let Some(text) = answer.open_ended_text.as_mut() {
        *text = clean_html(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionKind;

    #[test]
    fn scripts_are_removed_and_plain_text_kept() {
        assert_eq!(clean_html("Photosynthesis<script>alert(1)</script>"), "Photosynthesis");
        assert_eq!(clean_html("plain"), "plain");
    }

    #[test]
    fn question_fields_are_cleaned() {
        let mut q = Question {
            id: "1".into(),
            text: "<b onclick=\"x()\">Why?</b>".into(),
            options: vec!["a<script></script>".into(), "b".into()],
            correct_option_index: 0,
            explanation: Some("<iframe src=x></iframe>because".into()),
            kind: QuestionKind::MultipleChoice,
        };
        clean_question(&mut q);

        assert_eq!(q.text, "<b>Why?</b>");
        assert_eq!(q.options, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(q.explanation.as_deref(), Some("because"));
    }
}
