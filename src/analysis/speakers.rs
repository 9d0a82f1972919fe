//! Speaker roles
//!
//! Diarized transcripts only carry opaque speaker labels ("A", "B"). The
//! customer is guessed from how each speaker talks: customers ask, agents
//! greet and use honorific service phrasing early in the call.

use super::models::{Utterance, AGENT_LABEL, CUSTOMER_LABEL};

/// Speaker label assumed when there is nothing to go on
const FALLBACK_SPEAKER: &str = "A";

const QUESTION_KEYWORDS: [&str; 8] = ["어떻게", "뭐", "무엇", "왜", "어디", "언제", "얼마", "?"];
const QUESTION_WEIGHT: i32 = 2;

const AGENT_PATTERNS: [&str; 4] = ["입니다", "되십니까", "도와드리겠습니다", "고객님"];
const AGENT_PENALTY: i32 = 3;
/// Agent phrasing only counts in the opening utterances
const OPENING_UTTERANCES: usize = 3;

/// Speakers in order of first appearance
fn speakers_in_order(utterances: &[Utterance]) -> Vec<&str> {
    let mut speakers: Vec<&str> = Vec::new();
    for u in utterances {
        if !speakers.contains(&u.speaker.as_str()) {
            speakers.push(&u.speaker);
        }
    }
    speakers
}

/// Guess which speaker is the customer
///
/// Each utterance adds 2 to its speaker's score per question keyword it
/// contains; each of the first three utterances subtracts 3 per agent phrase.
/// Highest score wins, ties go to whoever spoke first.
pub fn detect_customer_speaker(utterances: &[Utterance]) -> String {
    let speakers = speakers_in_order(utterances);
    match speakers.len() {
        0 => return FALLBACK_SPEAKER.to_string(),
        1 => return speakers[0].to_string(),
        _ => {}
    }

    let mut scores = vec![0i32; speakers.len()];
    let index_of = |speaker: &str| speakers.iter().position(|s| *s == speaker);

    for (i, u) in utterances.iter().enumerate() {
        let Some(idx) = index_of(&u.speaker) else {
            continue;
        };
        let questions = QUESTION_KEYWORDS
            .iter()
            .filter(|k| u.text.contains(*k))
            .count() as i32;
        scores[idx] += questions * QUESTION_WEIGHT;

        if i < OPENING_UTTERANCES {
            let agent_phrases = AGENT_PATTERNS
                .iter()
                .filter(|p| u.text.contains(*p))
                .count() as i32;
            scores[idx] -= agent_phrases * AGENT_PENALTY;
        }
    }

    let mut best = 0;
    for idx in 1..speakers.len() {
        if scores[idx] > scores[best] {
            best = idx;
        }
    }
    speakers[best].to_string()
}

/// Customer and agent labels for one transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerRoles {
    pub customer: String,
    /// First speaker other than the customer; the customer again for
    /// single-speaker transcripts
    pub agent: String,
}

impl SpeakerRoles {
    pub fn detect(utterances: &[Utterance]) -> Self {
        let customer = detect_customer_speaker(utterances);
        let agent = speakers_in_order(utterances)
            .into_iter()
            .find(|s| *s != customer)
            .map(str::to_string)
            .unwrap_or_else(|| customer.clone());
        Self { customer, agent }
    }

    fn label(&self, speaker: &str) -> &'static str {
        if speaker == self.customer {
            CUSTOMER_LABEL
        } else {
            AGENT_LABEL
        }
    }

    /// `고객: text` / `상담사: text` lines
    pub fn conversation(&self, utterances: &[Utterance]) -> String {
        utterances
            .iter()
            .map(|u| format!("{}: {}", self.label(&u.speaker), u.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `[고객] text` lines
    pub fn utterance_lines(&self, utterances: &[Utterance]) -> String {
        utterances
            .iter()
            .map(|u| format!("[{}] {}", self.label(&u.speaker), u.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Everything one speaker said, space separated
pub fn speaker_text(utterances: &[Utterance], speaker: &str) -> String {
    utterances
        .iter()
        .filter(|u| u.speaker == speaker)
        .map(|u| u.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
