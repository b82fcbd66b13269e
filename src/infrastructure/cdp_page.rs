//! 基于 chromiumoxide 的宿主页面实现

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use tracing::debug;

use crate::error::{AppResult, AutomationError};
use crate::infrastructure::host_page::{HostPage, MouseEventKind};
use crate::infrastructure::js_executor::JsExecutor;

/// 页面上保存常驻观察者的全局变量名
const MUTATION_LATCH: &str = "__autoVideoMutationLatch";

/// 通过 CDP 驱动的宿主页面
pub struct CdpPage {
    executor: JsExecutor,
}

impl CdpPage {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    /// 对匹配的元素执行一段脚本，元素不存在时返回 `NotFound`
    ///
    /// `body` 中可以使用变量 `el`
    async fn with_element(&self, selector: &str, body: &str) -> AppResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el) return false;
                {}
                return true;
            }})()
            "#,
            serde_json::to_string(selector)?,
            body
        );

        let found: bool = self.executor.eval_as(js_code).await?;
        if found {
            Ok(())
        } else {
            Err(AutomationError::not_found(selector))
        }
    }
}

#[async_trait]
impl HostPage for CdpPage {
    async fn exists(&self, selector: &str) -> AppResult<bool> {
        let js_code = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        self.executor.eval_as(js_code).await
    }

    async fn read_value(&self, selector: &str) -> AppResult<Option<String>> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                return el ? String(el.value ?? '') : null;
            }})()
            "#,
            serde_json::to_string(selector)?
        );
        self.executor.eval_as(js_code).await
    }

    async fn write_value(&self, selector: &str, value: &str) -> AppResult<()> {
        let body = format!(
            "el.value = {}; el.dispatchEvent(new Event('input', {{ bubbles: true }}));",
            serde_json::to_string(value)?
        );
        self.with_element(selector, &body).await
    }

    async fn click(&self, selector: &str) -> AppResult<()> {
        self.with_element(selector, "el.click();").await
    }

    async fn dispatch_mouse(&self, selector: &str, kind: MouseEventKind) -> AppResult<()> {
        let body = format!(
            "el.dispatchEvent(new MouseEvent('{}', {{ bubbles: true }}));",
            kind.as_str()
        );
        self.with_element(selector, &body).await
    }

    async fn attach_file(&self, selector: &str, file: &Path) -> AppResult<()> {
        self.with_element(selector, "el.value = '';").await?;

        let element = self.executor.page().find_element(selector).await?;
        let params = SetFileInputFilesParams::builder()
            .file(file.to_string_lossy().to_string())
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(AutomationError::Script)?;

        // DOM.setFileInputFiles 会自行派发 input/change 事件
        self.executor.page().execute(params).await?;
        debug!("已设置文件输入: {}", file.display());
        Ok(())
    }

    async fn next_mutation(&self, window: Duration) -> AppResult<bool> {
        let js_code = format!(
            r#"
            new Promise(resolve => {{
                let latch = window.{latch};
                if (!latch) {{
                    latch = {{ dirty: false, waiters: [] }};
                    latch.observer = new MutationObserver(() => {{
                        latch.dirty = true;
                        latch.waiters.splice(0).forEach(wake => wake());
                    }});
                    latch.observer.observe(document.body, {{ childList: true, subtree: true }});
                    window.{latch} = latch;
                }}
                if (latch.dirty) {{
                    latch.dirty = false;
                    resolve(true);
                    return;
                }}
                const wake = () => {{
                    clearTimeout(timer);
                    latch.dirty = false;
                    resolve(true);
                }};
                const timer = setTimeout(() => {{
                    latch.waiters = latch.waiters.filter(w => w !== wake);
                    resolve(false);
                }}, {window_ms});
                latch.waiters.push(wake);
            }})
            "#,
            latch = MUTATION_LATCH,
            window_ms = window.as_millis()
        );
        self.executor.eval_as(js_code).await
    }

    async fn stop_observing(&self) -> AppResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                const latch = window.{latch};
                if (latch) {{
                    latch.observer.disconnect();
                    latch.waiters.splice(0).forEach(wake => wake());
                    delete window.{latch};
                }}
                return true;
            }})()
            "#,
            latch = MUTATION_LATCH
        );
        self.executor.eval(js_code).await?;
        Ok(())
    }

    async fn set_unload_guard(&self, message: Option<&str>) -> AppResult<()> {
        let js_code = match message {
            Some(msg) => format!(
                r#"
                (() => {{
                    const msg = {};
                    window.onbeforeunload = (e) => {{
                        e.preventDefault();
                        e.returnValue = msg;
                        return msg;
                    }};
                    return true;
                }})()
                "#,
                serde_json::to_string(msg)?
            ),
            None => "(() => { window.onbeforeunload = null; return true; })()".to_string(),
        };
        self.executor.eval(js_code).await?;
        Ok(())
    }
}
