//! In-memory assessment sessions keyed by an id issued at profile submission.

use chrono::{DateTime, Utc};
use riskiq_core::error::AssessmentError;
use riskiq_core::risk::{CompanyProfile, RiskQuestion};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub profile: CompanyProfile,
    pub questions: Vec<RiskQuestion>,
    pub created_at: DateTime<Utc>,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    capacity: usize,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), capacity: capacity.max(1) }
    }

    /// Store a new session and return it. Evicts the oldest when full.
    pub async fn create(&self, profile: CompanyProfile, questions: Vec<RiskQuestion>) -> Session {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            profile,
            questions,
            created_at: Utc::now(),
        };
        let mut sessions = self.sessions.write().await;
        while sessions.len() >= self.capacity {
            let Some(oldest) = sessions
                .values()
                .min_by_key(|s| s.created_at)
                .map(|s| s.id.clone())
            else {
                break;
            };
            debug!(session_id = %oldest, "Evicting oldest assessment session");
            sessions.remove(&oldest);
        }
        sessions.insert(session.id.clone(), session.clone());
        session
    }

    pub async fn get(&self, id: &str) -> Result<Session, AssessmentError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AssessmentError::SessionNotFound(id.to_string()))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(industry: &str) -> CompanyProfile {
        CompanyProfile { industry: industry.into(), ..Default::default() }
    }

    #[tokio::test]
    async fn sessions_do_not_collide() {
        let store = SessionStore::new(10);
        let a = store.create(profile("Healthcare"), vec![]).await;
        let b = store.create(profile("Finance"), vec![]).await;
        assert_ne!(a.id, b.id);
        assert_eq!(store.get(&a.id).await.unwrap().profile.industry, "Healthcare");
        assert_eq!(store.get(&b.id).await.unwrap().profile.industry, "Finance");
    }

    #[tokio::test]
    async fn unknown_session_is_client_error() {
        let store = SessionStore::new(10);
        let err = store.get("nope").await.unwrap_err();
        assert!(matches!(err, AssessmentError::SessionNotFound(ref id) if id == "nope"));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn oldest_session_is_evicted_at_capacity() {
        let store = SessionStore::new(2);
        let first = store.create(profile("a"), vec![]).await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = store.create(profile("b"), vec![]).await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let third = store.create(profile("c"), vec![]).await;
        assert_eq!(store.len().await, 2);
        assert!(store.get(&first.id).await.is_err());
        assert!(store.get(&second.id).await.is_ok());
        assert!(store.get(&third.id).await.is_ok());
    }
}
