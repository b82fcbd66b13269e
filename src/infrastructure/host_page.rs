//! 宿主页面能力接口
//!
//! 流水线只通过选择器操作页面，不持有任何 DOM 句柄。

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppResult;

/// 可派发的鼠标事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    MouseOver,
    MouseDown,
    MouseUp,
    Click,
}

impl MouseEventKind {
    /// 模拟人工点击时的事件顺序
    pub const HUMAN_SEQUENCE: [MouseEventKind; 4] = [
        MouseEventKind::MouseOver,
        MouseEventKind::MouseDown,
        MouseEventKind::MouseUp,
        MouseEventKind::Click,
    ];

    /// DOM 事件类型名
    pub fn as_str(self) -> &'static str {
        match self {
            MouseEventKind::MouseOver => "mouseover",
            MouseEventKind::MouseDown => "mousedown",
            MouseEventKind::MouseUp => "mouseup",
            MouseEventKind::Click => "click",
        }
    }
}

/// 宿主页面
///
/// 所有方法都以 CSS 选择器定位元素，元素不存在时返回 `NotFound`（`exists`/`read_value` 除外）。
#[async_trait]
pub trait HostPage: Send + Sync {
    /// 元素是否存在
    async fn exists(&self, selector: &str) -> AppResult<bool>;

    /// 读取输入元素的值，元素不存在时返回 `None`
    async fn read_value(&self, selector: &str) -> AppResult<Option<String>>;

    /// 写入输入元素的值并派发冒泡的 `input` 事件
    async fn write_value(&self, selector: &str, value: &str) -> AppResult<()>;

    /// 调用元素的原生 `click()`
    async fn click(&self, selector: &str) -> AppResult<()>;

    /// 派发冒泡的鼠标事件
    async fn dispatch_mouse(&self, selector: &str, kind: MouseEventKind) -> AppResult<()>;

    /// 清空文件输入框，设置所选文件并触发 `change`
    async fn attach_file(&self, selector: &str, file: &Path) -> AppResult<()>;

    /// 等待 `document.body` 下的下一批 DOM 变化
    ///
    /// 首次调用时挂上一个常驻观察者；自上次调用以来已有变化则立即返回 `true`，
    /// 否则在 `window` 内等到变化返回 `true`，超时返回 `false`。
    async fn next_mutation(&self, window: Duration) -> AppResult<bool>;

    /// 注销 `next_mutation` 挂上的观察者，未挂上时什么也不做
    async fn stop_observing(&self) -> AppResult<()>;

    /// 安装（`Some`）或移除（`None`）离开页面时的确认提示
    async fn set_unload_guard(&self, message: Option<&str>) -> AppResult<()>;
}
