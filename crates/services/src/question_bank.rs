//! Offline question source: a fixed bank of CS fundamentals questions,
//! filtered by keywords in the job role.

use async_trait::async_trait;
use prep_core::model::{JobRole, Question, QuestionId, SessionContext};
use rand::seq::SliceRandom;

use crate::api::{QuestionRequest, QuestionSource, QuestionStyle};
use crate::error::CollaboratorError;

/// Fewer keyword matches than this and the whole bank is used instead.
const MIN_MATCHED_POOL: usize = 5;

const BANK: &[(u64, &str, &str)] = &[
    (1, "DSA", "Explain the difference between an array and a linked list."),
    (2, "DSA", "What is the time complexity of binary search? Explain why."),
    (3, "Algorithms", "Describe quicksort and its average/worst case complexities."),
    (4, "OS", "What is a race condition? How can it be prevented?"),
    (5, "DBMS", "Explain normalization and why it's important."),
    (6, "CN", "Explain the TCP three-way handshake."),
    (7, "TOC", "What is the difference between DFA and NFA?"),
    (8, "Compilers", "What is lexical analysis in compiler design?"),
    (9, "OS", "What is virtual memory? How does paging work?"),
    (10, "DBMS", "What is an index in databases? Types of indexing?"),
    (11, "CN", "What is DNS? How does it resolve domain names?"),
    (12, "Algorithms", "Explain dynamic programming vs divide-and-conquer."),
    (13, "DSA", "When to prefer a heap over a balanced BST?"),
    (14, "Security", "What is symmetric vs asymmetric encryption?"),
    (15, "AI/ML", "Explain the bias-variance tradeoff briefly."),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinQuestionBank;

impl BuiltinQuestionBank {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Bank entries relevant to the role, before shuffling.
    fn pool(role: &JobRole) -> Vec<Question> {
        let topics = topics_for(&role.normalized());
        let matched: Vec<_> = BANK
            .iter()
            .filter(|(_, topic, _)| topics.is_none_or(|wanted| wanted.contains(topic)))
            .collect();
        let entries = if matched.len() >= MIN_MATCHED_POOL {
            matched
        } else {
            BANK.iter().collect()
        };

        entries
            .into_iter()
            .filter_map(|(id, topic, text)| {
                Question::free_response(QuestionId::new(*id), *text)
                    .ok()
                    .map(|q| q.with_topic(*topic))
            })
            .collect()
    }
}

/// Topics to keep for a lowercased role. `None` keeps everything.
fn topics_for(role: &str) -> Option<&'static [&'static str]> {
    let has = |keywords: &[&str]| keywords.iter().any(|k| role.contains(k));

    if has(&["software", "engineer", "developer"]) {
        Some(&["DSA", "Algorithms", "Compilers"])
    } else if has(&["data", "scientist", "ml"]) {
        Some(&["AI/ML", "Algorithms", "DSA"])
    } else if has(&["network"]) {
        Some(&["CN"])
    } else if has(&["db", "database", "sql"]) {
        Some(&["DBMS"])
    } else {
        None
    }
}

#[async_trait]
impl QuestionSource for BuiltinQuestionBank {
    fn requires_auth(&self) -> bool {
        false
    }

    async fn fetch_questions(
        &self,
        request: &QuestionRequest,
        _context: &SessionContext,
    ) -> Result<Vec<Question>, CollaboratorError> {
        if request.style == QuestionStyle::MultipleChoice {
            return Err(CollaboratorError::Unsupported(
                "the offline question bank only has free-response questions",
            ));
        }

        let mut pool = Self::pool(&request.job_role);
        pool.shuffle(&mut rand::rng());
        pool.truncate(request.count);
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(role: &str, count: usize) -> QuestionRequest {
        QuestionRequest {
            job_role: JobRole::parse(role).unwrap(),
            count,
            style: QuestionStyle::FreeResponse,
        }
    }

    #[test]
    fn engineer_roles_get_dsa_algorithms_and_compilers() {
        let pool = BuiltinQuestionBank::pool(&JobRole::parse("Software Engineer").unwrap());
        assert_eq!(pool.len(), 6);
        assert!(
            pool.iter()
                .all(|q| matches!(q.topic(), Some("DSA" | "Algorithms" | "Compilers")))
        );
    }

    #[test]
    fn small_match_falls_back_to_whole_bank() {
        // Only two CN questions exist.
        let pool = BuiltinQuestionBank::pool(&JobRole::parse("Network admin").unwrap());
        assert_eq!(pool.len(), BANK.len());
    }

    #[test]
    fn unknown_role_uses_whole_bank() {
        assert_eq!(topics_for("product manager"), None);
    }

    #[tokio::test]
    async fn fetch_returns_requested_count_without_duplicates() {
        let bank = BuiltinQuestionBank::new();
        let questions = bank
            .fetch_questions(&request("Data Scientist", 6), &SessionContext::Anonymous)
            .await
            .unwrap();
        assert_eq!(questions.len(), 6);

        let mut ids: Vec<_> = questions.iter().map(Question::id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }

    #[tokio::test]
    async fn multiple_choice_is_unsupported() {
        let bank = BuiltinQuestionBank::new();
        let mut req = request("Developer", 3);
        req.style = QuestionStyle::MultipleChoice;
        let err = bank
            .fetch_questions(&req, &SessionContext::Anonymous)
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::Unsupported(_)));
    }
}
