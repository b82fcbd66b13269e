//! 测试替身：可编排的宿主页面、操作者、通知渠道与时钟

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppResult, AutomationError};
use crate::infrastructure::{HostPage, MouseEventKind};
use crate::services::clock::Clock;
use crate::services::notifier::{Notice, Notifier};
use crate::services::operator::{InputKind, Operator};

/// 页面上发生过的操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Attach(String),
    Write(String, String),
    Click(String),
    Mouse(String, MouseEventKind),
    UnloadGuard(Option<String>),
}

#[derive(Default)]
struct FakeDom {
    present: HashSet<String>,
    values: HashMap<String, String>,
    scripted: HashMap<String, VecDeque<bool>>,
    mutations: VecDeque<bool>,
    quiet: bool,
    clear_on_attach: Vec<String>,
    fail_attach: HashSet<String>,
    events: Vec<PageEvent>,
}

/// 内存中的宿主页面
///
/// `exists` 先消费为选择器编排的结果，编排用完后回落到静态元素集合。
/// 每次 `next_mutation` 都在 1 秒（虚拟时间）后返回，默认报告有变化。
#[derive(Default)]
pub struct FakePage {
    dom: Mutex<FakeDom>,
    mutation_waits: AtomicUsize,
    observer_stops: AtomicUsize,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    fn dom(&self) -> std::sync::MutexGuard<'_, FakeDom> {
        self.dom.lock().unwrap()
    }

    pub fn add_element(&self, selector: &str) {
        self.dom().present.insert(selector.to_string());
    }

    pub fn remove_element(&self, selector: &str) {
        self.dom().present.remove(selector);
    }

    pub fn set_value(&self, selector: &str, value: &str) {
        self.dom().values.insert(selector.to_string(), value.to_string());
    }

    pub fn value(&self, selector: &str) -> Option<String> {
        self.dom().values.get(selector).cloned()
    }

    pub fn script_exists<I: IntoIterator<Item = bool>>(&self, selector: &str, answers: I) {
        self.dom()
            .scripted
            .entry(selector.to_string())
            .or_default()
            .extend(answers);
    }

    /// 上传文件时清空某个输入框（模拟宿主页面重置表单）
    pub fn clear_on_attach(&self, selector: &str) {
        self.dom().clear_on_attach.push(selector.to_string());
    }

    /// 上传指定文件名时失败
    pub fn fail_attach(&self, file_name: &str) {
        self.dom().fail_attach.insert(file_name.to_string());
    }

    pub fn events(&self) -> Vec<PageEvent> {
        self.dom().events.clone()
    }

    pub fn mouse_count(&self, selector: &str, kind: MouseEventKind) -> usize {
        self.dom()
            .events
            .iter()
            .filter(|e| **e == PageEvent::Mouse(selector.to_string(), kind))
            .count()
    }

    /// 编排后续观察窗口是否有变化，编排用完后按 `set_quiet` 决定
    pub fn script_mutations<I: IntoIterator<Item = bool>>(&self, answers: I) {
        self.dom().mutations.extend(answers);
    }

    /// 静止页面的观察窗口一律没有变化
    pub fn set_quiet(&self, quiet: bool) {
        self.dom().quiet = quiet;
    }

    pub fn mutation_waits(&self) -> usize {
        self.mutation_waits.load(Ordering::SeqCst)
    }

    pub fn observer_stops(&self) -> usize {
        self.observer_stops.load(Ordering::SeqCst)
    }

    fn require(&self, dom: &FakeDom, selector: &str) -> AppResult<()> {
        if dom.present.contains(selector) {
            Ok(())
        } else {
            Err(AutomationError::not_found(selector))
        }
    }
}

#[async_trait]
impl HostPage for FakePage {
    async fn exists(&self, selector: &str) -> AppResult<bool> {
        let mut dom = self.dom();
        if let Some(answer) = dom.scripted.get_mut(selector).and_then(|q| q.pop_front()) {
            return Ok(answer);
        }
        Ok(dom.present.contains(selector))
    }

    async fn read_value(&self, selector: &str) -> AppResult<Option<String>> {
        let dom = self.dom();
        if !dom.present.contains(selector) {
            return Ok(None);
        }
        Ok(Some(dom.values.get(selector).cloned().unwrap_or_default()))
    }

    async fn write_value(&self, selector: &str, value: &str) -> AppResult<()> {
        let mut dom = self.dom();
        self.require(&dom, selector)?;
        dom.values.insert(selector.to_string(), value.to_string());
        dom.events.push(PageEvent::Write(selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> AppResult<()> {
        let mut dom = self.dom();
        self.require(&dom, selector)?;
        dom.events.push(PageEvent::Click(selector.to_string()));
        Ok(())
    }

    async fn dispatch_mouse(&self, selector: &str, kind: MouseEventKind) -> AppResult<()> {
        let mut dom = self.dom();
        self.require(&dom, selector)?;
        dom.events.push(PageEvent::Mouse(selector.to_string(), kind));
        Ok(())
    }

    async fn attach_file(&self, selector: &str, file: &Path) -> AppResult<()> {
        let mut dom = self.dom();
        self.require(&dom, selector)?;
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if dom.fail_attach.contains(&name) {
            return Err(AutomationError::Script(format!("无法设置文件: {}", name)));
        }
        for cleared in dom.clear_on_attach.clone() {
            dom.values.insert(cleared, String::new());
        }
        dom.events.push(PageEvent::Attach(name));
        Ok(())
    }

    async fn next_mutation(&self, window: Duration) -> AppResult<bool> {
        self.mutation_waits.fetch_add(1, Ordering::SeqCst);
        let changed = {
            let mut dom = self.dom();
            let quiet = dom.quiet;
            dom.mutations.pop_front().unwrap_or(!quiet)
        };
        tokio::time::sleep(window.min(Duration::from_secs(1))).await;
        Ok(changed)
    }

    async fn stop_observing(&self) -> AppResult<()> {
        self.observer_stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_unload_guard(&self, message: Option<&str>) -> AppResult<()> {
        self.dom()
            .events
            .push(PageEvent::UnloadGuard(message.map(str::to_string)));
        Ok(())
    }
}

/// 按脚本回答的操作者
#[derive(Default)]
pub struct ScriptedOperator {
    answers: Mutex<VecDeque<Option<String>>>,
    requests: Mutex<Vec<InputKind>>,
    alerts: Mutex<Vec<String>>,
}

impl ScriptedOperator {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(|a| a.map(Into::into)).collect()),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<InputKind> {
        self.requests.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Operator for ScriptedOperator {
    async fn request_input(&self, kind: InputKind) -> Option<String> {
        self.requests.lock().unwrap().push(kind);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .flatten()
            .filter(|s| !s.is_empty())
    }

    async fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

/// 记录所有通知
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// 手动推进的时钟
#[derive(Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn at_secs(secs: i64) -> Self {
        Self {
            millis: AtomicI64::new(secs * 1000),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.millis.fetch_add(secs * 1000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// 限流提示与封面使用不同选择器，便于分别编排
pub fn test_selectors() -> crate::models::Selectors {
    crate::models::Selectors {
        throttle: ".throttle-tip".to_string(),
        ..Default::default()
    }
}

/// 流程所需元素都已就绪（限流提示除外）的页面
pub fn ready_page(selectors: &crate::models::Selectors) -> FakePage {
    let page = FakePage::new();
    for selector in [
        &selectors.file_input,
        &selectors.prompt,
        &selectors.confirm,
        &selectors.send,
        &selectors.cover,
        &selectors.download,
    ] {
        page.add_element(selector);
    }
    page
}
