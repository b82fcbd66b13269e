//! 等待原语 - 业务能力层
//!
//! 所有等待都只能以成功或超时结束，超时只影响当前调用。

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

use crate::error::{AppResult, AutomationError};
use crate::infrastructure::{HostPage, MouseEventKind};
use crate::models::JitterRange;

/// 单次观察 DOM 变化的最长窗口，需小于 CDP 请求超时
pub const MUTATION_WINDOW: Duration = Duration::from_secs(10);

/// 轮询直到元素出现
///
/// 超过 `timeout` 仍未出现则返回 `NotFound`
pub async fn wait_for_element(
    page: &dyn HostPage,
    selector: &str,
    timeout: Duration,
    poll: Duration,
) -> AppResult<()> {
    let start = Instant::now();
    loop {
        if page.exists(selector).await? {
            return Ok(());
        }
        if start.elapsed() > timeout {
            return Err(AutomationError::not_found(selector));
        }
        sleep(poll).await;
    }
}

/// 观察 `document.body` 的 DOM 变化，每个观察窗口结束后重新评估条件
///
/// 窗口内没有变化也会评估一次，避免错过两次观察之间出现的元素。
/// 条件首次为真时返回；超时返回 `Timeout`。两种情况下都会注销观察者。
pub async fn wait_for_condition<F, Fut>(
    page: &dyn HostPage,
    what: &str,
    mut predicate: F,
    limit: Duration,
) -> AppResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<bool>>,
{
    let observe = async {
        loop {
            let changed = page.next_mutation(MUTATION_WINDOW).await?;
            if predicate().await? {
                return Ok(());
            }
            if !changed {
                debug!("观察窗口内无 DOM 变化，继续等待{}", what);
            }
        }
    };

    let result = match timeout(limit, observe).await {
        Ok(result) => result,
        Err(_) => Err(AutomationError::timeout(what, limit)),
    };

    if let Err(e) = page.stop_observing().await {
        debug!("注销 DOM 观察者失败: {}", e);
    }
    result
}

/// 等待 DOM 变化后出现匹配 `selector` 的元素
pub async fn wait_for_selector_mutation(
    page: &dyn HostPage,
    what: &str,
    selector: &str,
    limit: Duration,
) -> AppResult<()> {
    wait_for_condition(page, what, || page.exists(selector), limit).await
}

/// 模拟人工点击：悬停、按下、抬起、点击，事件之间随机间隔
pub async fn simulate_interaction(
    page: &dyn HostPage,
    selector: &str,
    jitter: JitterRange,
) -> AppResult<()> {
    for (i, kind) in MouseEventKind::HUMAN_SEQUENCE.into_iter().enumerate() {
        if i > 0 {
            sleep(jitter.sample()).await;
        }
        page.dispatch_mouse(selector, kind).await?;
    }
    debug!("模拟点击完成: {}", selector);
    Ok(())
}

/// 在区间内随机等待
pub async fn random_delay(range: JitterRange) {
    sleep(range.sample()).await;
}
