//! 离线许可校验 - 业务能力层
//!
//! ## 状态机
//!
//! ```text
//! Unchecked ──(已锁定 / 时长用尽)──▶ Locked
//!     │
//!     ├──(已存摘要有效)──▶ Validated
//!     ▼
//! Validating ──(输入有效)──▶ Validated
//!     ├──(输入为空)──▶ Rejected
//!     └──(连续 10 次无效)──▶ Locked
//! ```
//!
//! 锁定标记一旦写入就不会被清除，累计使用秒数只增不减。

use std::sync::Arc;

use serde_json::{json, Value as JsonValue};
use tracing::{debug, error, info, warn};

use crate::error::{AppResult, LicenseError, LockReason};
use crate::services::clock::Clock;
use crate::services::operator::{InputKind, Operator};
use crate::services::store::KvStore;
use crate::services::verifier::CredentialVerifier;

/// 累计可用时长：6 小时（秒）
pub const LICENSE_MAX_SECONDS: u64 = 6 * 3600;

/// 最多允许输入许可码的次数
pub const MAX_ATTEMPTS: usize = 10;

pub const KEY_CODE_HASH: &str = "license_code_hash";
pub const KEY_ISSUED_AT: &str = "license_time";
pub const KEY_USED_SECONDS: &str = "license_used_seconds";
pub const KEY_LOCKED: &str = "license_locked";

/// 许可校验状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseState {
    Unchecked,
    Locked,
    Validating,
    Validated,
    Rejected,
}

/// 持久化的许可记录
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseRecord {
    /// 许可码的摘要
    pub code_hash: Option<String>,
    /// 许可码通过校验的时间（Unix 毫秒）
    pub issued_at: Option<i64>,
    /// 累计使用秒数
    pub used_seconds: u64,
    /// 是否已锁定
    pub locked: bool,
}

impl LicenseRecord {
    /// 剩余可用秒数
    pub fn remaining_seconds(&self) -> u64 {
        LICENSE_MAX_SECONDS.saturating_sub(self.used_seconds)
    }
}

/// 本次运行的会话，校验通过时创建，退出时提交一次
#[derive(Debug, PartialEq, Eq)]
pub struct Session {
    /// 会话开始时间（Unix 秒）
    pub started_at: i64,
}

/// 会话提交后的用量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageReport {
    pub session_seconds: u64,
    pub used_seconds: u64,
    pub remaining_seconds: u64,
    pub locked: bool,
}

/// 许可守卫
pub struct LicenseGuard {
    store: Arc<dyn KvStore>,
    operator: Arc<dyn Operator>,
    verifier: Arc<dyn CredentialVerifier>,
    clock: Arc<dyn Clock>,
}

impl LicenseGuard {
    pub fn new(
        store: Arc<dyn KvStore>,
        operator: Arc<dyn Operator>,
        verifier: Arc<dyn CredentialVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            operator,
            verifier,
            clock,
        }
    }

    /// 读取持久化的许可记录
    pub async fn load_record(&self) -> AppResult<LicenseRecord> {
        let code_hash = self
            .store
            .get(KEY_CODE_HASH)
            .await?
            .and_then(|v| v.as_str().map(str::to_string));
        let issued_at = self.store.get(KEY_ISSUED_AT).await?.and_then(|v| v.as_i64());
        let used_seconds = self
            .store
            .get(KEY_USED_SECONDS)
            .await?
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let locked = self
            .store
            .get(KEY_LOCKED)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Ok(LicenseRecord {
            code_hash,
            issued_at,
            used_seconds,
            locked,
        })
    }

    /// 启动时校验许可
    ///
    /// 通过时返回本次会话；锁定或被拒绝时返回终止性错误。
    pub async fn check(&self) -> AppResult<Session> {
        let record = self.load_record().await?;
        let mut state = LicenseState::Unchecked;
        debug!("许可状态: {:?}", state);

        if record.locked || record.used_seconds >= LICENSE_MAX_SECONDS {
            let reason = if record.locked {
                LockReason::PreviouslyLocked
            } else {
                LockReason::BudgetExhausted
            };
            let saved = self.persist_lock().await;
            state = LicenseState::Locked;
            debug!("许可状态: {:?}", state);
            self.operator
                .alert(&lock_alert("❌ 许可已过期，达到 6 小时限制。", saved))
                .await;
            return Err(LicenseError::Locked { reason }.into());
        }

        if let (Some(hash), Some(_)) = (record.code_hash.as_deref(), record.issued_at) {
            if self.verifier.is_permitted(hash) {
                state = LicenseState::Validated;
            }
        }

        if state != LicenseState::Validated {
            state = LicenseState::Validating;
            debug!("许可状态: {:?}", state);
            if let Err(e) = self.prompt_for_code().await {
                state = match e {
                    LicenseError::Rejected => LicenseState::Rejected,
                    LicenseError::Locked { .. } => LicenseState::Locked,
                };
                debug!("许可状态: {:?}", state);
                return Err(e.into());
            }
            state = LicenseState::Validated;
        }
        debug!("许可状态: {:?}", state);

        let session = Session {
            started_at: self.clock.now_secs(),
        };
        info!(
            "✅ 离线许可校验通过，累计使用 {} 小时，剩余 {} 小时。",
            format_hours(record.used_seconds),
            format_hours(record.remaining_seconds())
        );

        Ok(session)
    }

    /// 提示操作者输入许可码，最多 `MAX_ATTEMPTS` 次
    async fn prompt_for_code(&self) -> Result<(), LicenseError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let Some(code) = self.operator.request_input(InputKind::LicenseCode).await else {
                self.operator.alert("未输入许可码，脚本终止。").await;
                return Err(LicenseError::Rejected);
            };

            let digest = self.verifier.digest(&code);
            if self.verifier.is_permitted(&digest) {
                self.persist_credential(Some(&digest)).await;
                info!("✅ 许可码校验通过 (第 {} 次尝试)", attempt);
                return Ok(());
            }

            warn!("❌ 第 {} 次尝试失败，许可码无效", attempt);
            self.operator
                .alert(&format!("❌ 第 {} 次尝试失败，许可码无效，请重新输入。", attempt))
                .await;
            self.persist_credential(None).await;
        }

        let saved = self.persist_lock().await;
        self.operator
            .alert(&lock_alert(
                &format!("❌ 连续 {} 次失败，许可已锁定。", MAX_ATTEMPTS),
                saved,
            ))
            .await;
        Err(LicenseError::Locked {
            reason: LockReason::TooManyAttempts,
        })
    }

    /// 写入锁定标记，失败时记录错误并返回 `false`
    async fn persist_lock(&self) -> bool {
        match self.store.set(KEY_LOCKED, json!(true)).await {
            Ok(()) => true,
            Err(e) => {
                error!("❌ 写入锁定标记失败: {}", e);
                false
            }
        }
    }

    /// 保存（`Some`）或清除（`None`）许可码摘要与签发时间
    async fn persist_credential(&self, digest: Option<&str>) {
        let (hash, issued_at) = match digest {
            Some(d) => (json!(d), json!(self.clock.now_millis())),
            None => (JsonValue::Null, JsonValue::Null),
        };
        if let Err(e) = self.store.set(KEY_CODE_HASH, hash).await {
            warn!("写入许可码摘要失败: {}", e);
        }
        if let Err(e) = self.store.set(KEY_ISSUED_AT, issued_at).await {
            warn!("写入许可签发时间失败: {}", e);
        }
    }

    /// 退出时提交本次会话的使用时长
    pub async fn commit_session(&self, session: Session) -> AppResult<UsageReport> {
        let delta = (self.clock.now_secs() - session.started_at).max(0) as u64;

        let record = self.load_record().await?;
        let used = record.used_seconds.saturating_add(delta);
        self.store.set(KEY_USED_SECONDS, json!(used)).await?;

        let locked = used >= LICENSE_MAX_SECONDS;
        if locked {
            self.store.set(KEY_LOCKED, json!(true)).await?;
            self.operator.alert("⏰ 总使用时长已满 6 小时，许可已锁定。").await;
        } else {
            info!(
                "📊 本次运行 {} 分钟，总使用 {} 小时，剩余 {} 小时。",
                (delta as f64 / 60.0).round(),
                format_hours(used),
                format_hours(LICENSE_MAX_SECONDS - used)
            );
        }

        Ok(UsageReport {
            session_seconds: delta,
            used_seconds: used,
            remaining_seconds: LICENSE_MAX_SECONDS.saturating_sub(used),
            locked,
        })
    }
}

/// 锁定标记未能保存时在提示末尾注明
fn lock_alert(message: &str, saved: bool) -> String {
    if saved {
        message.to_string()
    } else {
        format!("{}（锁定状态未能保存，请检查许可存储）", message)
    }
}

/// 秒数格式化为保留两位小数的小时数
pub fn format_hours(seconds: u64) -> String {
    format!("{:.2}", seconds as f64 / 3600.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AutomationError;
    use crate::services::store::MemoryStore;
    use crate::services::verifier::HmacVerifier;
    use crate::testing::{ManualClock, ScriptedOperator};

    const KEY: &[u8] = b"test-key";
    const GOOD: &str = "GOOD-CODE";

    struct Harness {
        store: Arc<MemoryStore>,
        operator: Arc<ScriptedOperator>,
        clock: Arc<ManualClock>,
        guard: LicenseGuard,
    }

    fn verifier() -> Arc<HmacVerifier> {
        let probe = HmacVerifier::new(KEY, Vec::<String>::new()).unwrap();
        Arc::new(HmacVerifier::new(KEY, [probe.digest(GOOD)]).unwrap())
    }

    fn harness(store: Arc<MemoryStore>, answers: Vec<Option<&str>>) -> Harness {
        let operator = Arc::new(ScriptedOperator::new(answers));
        let clock = Arc::new(ManualClock::at_secs(1_700_000_000));
        let guard = LicenseGuard::new(store.clone(), operator.clone(), verifier(), clock.clone());
        Harness {
            store,
            operator,
            clock,
            guard,
        }
    }

    fn locked_reason(err: AutomationError) -> Option<LockReason> {
        match err {
            AutomationError::License(LicenseError::Locked { reason }) => Some(reason),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_first_run_valid_code_persists_digest_not_plaintext() {
        let h = harness(Arc::new(MemoryStore::new()), vec![Some(GOOD)]);

        let session = h.guard.check().await.unwrap();
        assert_eq!(session.started_at, 1_700_000_000);

        let record = h.guard.load_record().await.unwrap();
        let digest = record.code_hash.unwrap();
        assert_ne!(digest, GOOD);
        assert_eq!(digest, verifier().digest(GOOD));
        assert_eq!(record.issued_at, Some(1_700_000_000_000));
        assert!(!record.locked);
    }

    #[tokio::test]
    async fn test_stored_credential_skips_prompt() {
        let store = Arc::new(MemoryStore::new());
        harness(store.clone(), vec![Some(GOOD)]).guard.check().await.unwrap();

        let second = harness(store, vec![]);
        second.guard.check().await.unwrap();
        assert!(second.operator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_then_valid_succeeds() {
        let h = harness(Arc::new(MemoryStore::new()), vec![Some("bad-1"), Some("bad-2"), Some(GOOD)]);

        h.guard.check().await.unwrap();
        assert_eq!(h.operator.requests().len(), 3);
        assert_eq!(h.operator.alerts().len(), 2);
        assert!(h.operator.alerts()[1].contains("第 2 次尝试失败"));
        assert!(!h.guard.load_record().await.unwrap().locked);
    }

    #[tokio::test]
    async fn test_ten_invalid_attempts_lock() {
        let answers = vec![Some("wrong"); MAX_ATTEMPTS];
        let h = harness(Arc::new(MemoryStore::new()), answers);

        let err = h.guard.check().await.unwrap_err();
        assert_eq!(locked_reason(err), Some(LockReason::TooManyAttempts));

        let record = h.guard.load_record().await.unwrap();
        assert!(record.locked);
        assert_eq!(record.code_hash, None);
        assert_eq!(h.operator.requests().len(), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_empty_input_rejects_without_lock() {
        let h = harness(Arc::new(MemoryStore::new()), vec![Some("wrong"), Some("wrong"), None]);

        let err = h.guard.check().await.unwrap_err();
        assert!(matches!(err, AutomationError::License(LicenseError::Rejected)));
        assert_eq!(h.operator.requests().len(), 3);
        assert!(!h.guard.load_record().await.unwrap().locked);
    }

    #[tokio::test]
    async fn test_lock_is_permanent_even_with_valid_code() {
        let store = Arc::new(MemoryStore::new());
        store.set(KEY_LOCKED, json!(true)).await.unwrap();

        for _ in 0..3 {
            let h = harness(store.clone(), vec![Some(GOOD)]);
            let err = h.guard.check().await.unwrap_err();
            assert_eq!(locked_reason(err), Some(LockReason::PreviouslyLocked));
            assert!(h.operator.requests().is_empty());
        }
        assert_eq!(store.get(KEY_LOCKED).await.unwrap(), Some(json!(true)));
    }

    #[tokio::test]
    async fn test_usage_accumulates_and_locks_at_budget() {
        let store = Arc::new(MemoryStore::new());
        let deltas = [3600, 7200, 7200, 3600];
        let mut total = 0;

        for (i, delta) in deltas.iter().enumerate() {
            let h = harness(store.clone(), vec![Some(GOOD)]);
            let session = h.guard.check().await.unwrap();
            h.clock.advance_secs(*delta);
            let report = h.guard.commit_session(session).await.unwrap();

            total += *delta as u64;
            assert_eq!(report.used_seconds, total);
            assert_eq!(report.locked, i == deltas.len() - 1);
        }

        assert_eq!(store.get(KEY_USED_SECONDS).await.unwrap(), Some(json!(LICENSE_MAX_SECONDS)));
        let h = harness(store, vec![Some(GOOD)]);
        let err = h.guard.check().await.unwrap_err();
        assert_eq!(locked_reason(err), Some(LockReason::PreviouslyLocked));
    }

    /// 只拒绝写入锁定标记的存储
    #[derive(Default)]
    struct LockWriteFails {
        inner: MemoryStore,
    }

    #[async_trait::async_trait]
    impl KvStore for LockWriteFails {
        async fn get(&self, key: &str) -> AppResult<Option<JsonValue>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: JsonValue) -> AppResult<()> {
            if key == KEY_LOCKED {
                return Err(std::io::Error::other("disk full").into());
            }
            self.inner.set(key, value).await
        }
    }

    #[tokio::test]
    async fn test_unsaved_lock_is_reported_to_operator() {
        let operator = Arc::new(ScriptedOperator::new(vec![Some("wrong"); MAX_ATTEMPTS]));
        let guard = LicenseGuard::new(
            Arc::new(LockWriteFails::default()),
            operator.clone(),
            verifier(),
            Arc::new(ManualClock::at_secs(1_700_000_000)),
        );

        let err = guard.check().await.unwrap_err();
        assert_eq!(locked_reason(err), Some(LockReason::TooManyAttempts));
        let last = operator.alerts().pop().unwrap();
        assert!(last.contains("许可已锁定"));
        assert!(last.contains("锁定状态未能保存"));
    }

    #[tokio::test]
    async fn test_unsaved_lock_on_entry_still_refuses() {
        let store = LockWriteFails::default();
        store.set(KEY_USED_SECONDS, json!(LICENSE_MAX_SECONDS)).await.unwrap();
        let operator = Arc::new(ScriptedOperator::new(vec![Some(GOOD)]));
        let guard = LicenseGuard::new(
            Arc::new(store),
            operator.clone(),
            verifier(),
            Arc::new(ManualClock::at_secs(1_700_000_000)),
        );

        let err = guard.check().await.unwrap_err();
        assert_eq!(locked_reason(err), Some(LockReason::BudgetExhausted));
        assert!(operator.requests().is_empty());
        assert!(operator.alerts()[0].contains("锁定状态未能保存"));
    }

    #[tokio::test]
    async fn test_exhausted_budget_locks_on_entry() {
        let store = Arc::new(MemoryStore::new());
        store.set(KEY_USED_SECONDS, json!(LICENSE_MAX_SECONDS + 5)).await.unwrap();

        let h = harness(store.clone(), vec![Some(GOOD)]);
        let err = h.guard.check().await.unwrap_err();
        assert_eq!(locked_reason(err), Some(LockReason::BudgetExhausted));
        assert_eq!(h.store.get(KEY_LOCKED).await.unwrap(), Some(json!(true)));
    }

    #[tokio::test]
    async fn test_clock_going_backwards_never_decreases_usage() {
        let store = Arc::new(MemoryStore::new());
        store.set(KEY_USED_SECONDS, json!(100)).await.unwrap();
        let h = harness(store, vec![Some(GOOD)]);

        let session = h.guard.check().await.unwrap();
        h.clock.advance_secs(-50);
        let report = h.guard.commit_session(session).await.unwrap();
        assert_eq!(report.session_seconds, 0);
        assert_eq!(report.used_seconds, 100);
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(0), "0.00");
        assert_eq!(format_hours(5400), "1.50");
        assert_eq!(format_hours(LICENSE_MAX_SECONDS), "6.00");
    }
}
