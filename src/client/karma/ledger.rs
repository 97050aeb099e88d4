//! Award settlement against the remote store.
//!
//! Settling an award is a read-merge-upsert over the day's progress record,
//! followed by the audit document and a trace entry. Every step can be
//! replayed: the audit document short-circuits a settled award, and the
//! progress record remembers which award keys it already holds, so a replay
//! after a partial failure never counts the same award twice.
//!
//! An award that cannot be settled is queued as a [`PendingAward`]: an audit
//! payload marked with a private field. The remote writer recognizes the
//! marker and settles the award on delivery instead of upserting the audit
//! document directly.

use crate::client::karma::actions::normalize_action;
use crate::client::remote::DocumentStore;
use crate::shared::progress::progress_id;
use crate::shared::{
    AwardAuditRecord, DailyProgressRecord, DocumentType, KarmaTraceRecord, Payload, PayloadKind,
    RemoteDocument, SyncError,
};
use serde_json::Value;

/// Private payload field marking a queued award
pub const PENDING_AWARD_FIELD: &str = "_pendingAward";

/// How a settlement ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The award is now part of the progress record
    Applied,
    /// The audit document already existed
    AlreadyApplied,
}

/// An award waiting to be settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAward {
    pub audit: AwardAuditRecord,
}

impl PendingAward {
    pub fn new(audit: AwardAuditRecord) -> Self {
        Self { audit }
    }

    /// Deterministic award key, also the queue id
    pub fn key(&self) -> String {
        self.audit.key()
    }

    /// Queue payload carrying this award
    pub fn to_payload(&self) -> Result<Payload, SyncError> {
        Ok(Payload::from_record(self.key(), DocumentType::Audit, &self.audit)?
            .with_field(PENDING_AWARD_FIELD, true))
    }

    /// Recover a queued award. `None` when the payload is not one.
    pub fn from_payload(payload: &Payload) -> Option<Result<Self, SyncError>> {
        let marked = payload.kind == PayloadKind::Known(DocumentType::Audit)
            && payload.field(PENDING_AWARD_FIELD) == Some(&Value::Bool(true));
        if !marked {
            return None;
        }

        let decoded = serde_json::from_value::<AwardAuditRecord>(Value::Object(payload.fields.clone()))
            .map_err(SyncError::from)
            .and_then(|audit| {
                if normalize_action(&audit.action).is_none() {
                    return Err(SyncError::validation(
                        "action",
                        format!("unknown karma action {:?}", audit.action),
                    ));
                }
                if audit.key() != payload.id {
                    return Err(SyncError::validation(
                        "id",
                        format!("award key {} does not match payload id {}", audit.key(), payload.id),
                    ));
                }
                Ok(Self { audit })
            });
        Some(decoded)
    }
}

/// Settle one award: audit check, progress merge, audit write, trace.
pub async fn settle(
    store: &dyn DocumentStore,
    award: &PendingAward,
    now: u64,
) -> Result<Settlement, SyncError> {
    let key = award.key();
    let audit = &award.audit;

    if store.read(&key, DocumentType::Audit.as_str()).await?.is_some() {
        return Ok(Settlement::AlreadyApplied);
    }

    let id = progress_id(&audit.user_id, &audit.date);
    let stored = store.read(&id, DocumentType::DailyProgress.as_str()).await?;
    let mut record = match stored.map(|doc| doc.decode::<DailyProgressRecord>()) {
        Some(Ok(record)) => record,
        Some(Err(e)) => {
            tracing::warn!("[Karma] Progress record {} unreadable ({}); starting fresh", id, e);
            DailyProgressRecord::new(&audit.user_id, &audit.date, now)
        }
        None => DailyProgressRecord::new(&audit.user_id, &audit.date, now),
    };

    let counter = normalize_action(&audit.action).and_then(|action| action.counter());
    if record.apply_award(&key, counter, audit.points, now) {
        store
            .create(RemoteDocument::encode(&id, DocumentType::DailyProgress, &record)?)
            .await?;
    } else {
        tracing::debug!("[Karma] {} already merged into {}; finishing audit", key, id);
    }

    store
        .create(RemoteDocument::encode(&key, DocumentType::Audit, audit)?)
        .await?;
    write_trace(store, &key, audit).await;
    Ok(Settlement::Applied)
}

async fn write_trace(store: &dyn DocumentStore, key: &str, audit: &AwardAuditRecord) {
    let trace = KarmaTraceRecord {
        award_key: key.to_string(),
        user_id: audit.user_id.clone(),
        action: audit.action.clone(),
        related_id: audit.related_id.clone(),
        date: audit.date.clone(),
        points: audit.points,
        created_at: audit.created_at,
    };
    let id = format!("karma-{}", uuid::Uuid::new_v4());
    let result = match RemoteDocument::encode(id, DocumentType::Karma, &trace) {
        Ok(document) => store.create(document).await.map(|_| ()),
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::warn!("[Karma] Failed to write trace for {}: {}", key, e);
    }
}
