use visionproxy_core::InferenceError;

const INSTRUCTION: &str = "Describe the scene in one sentence for a blind viewer. Ignore flashes and lighting changes.";

/// Conversation-style prompt; the model's reply follows `marker`.
pub fn build_prompt(reading_budget_seconds: f64, marker: &str) -> String {
    format!(
        "USER: <video>\n{} Keep it short enough to read aloud in {:.1} seconds. {}",
        INSTRUCTION, reading_budget_seconds, marker
    )
}

/// Pull the model's answer out of the raw generated text.
///
/// The generated text echoes the prompt, so the answer is whatever follows the
/// last occurrence of `marker`. Internal whitespace is collapsed so the result
/// fits on one overlay line.
pub fn extract_answer(raw: &str, marker: &str) -> Result<String, InferenceError> {
    let (_, tail) = raw.rsplit_once(marker).ok_or_else(|| {
        InferenceError::MalformedResponse(format!("answer marker {:?} not found", marker))
    })?;

    let answer = tail.split_whitespace().collect::<Vec<_>>().join(" ");
    if answer.is_empty() {
        return Err(InferenceError::EmptyResult);
    }
    Ok(answer)
}
