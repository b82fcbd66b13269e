//! 宿主页面的 CSS 选择器

use serde::{Deserialize, Serialize};

/// 宿主页面上用到的全部选择器
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// 接收图片的文件输入框
    pub file_input: String,
    /// 提示词输入框
    pub prompt: String,
    /// 确认上传按钮（仅匹配可用状态）
    pub confirm: String,
    /// 发送按钮
    pub send: String,
    /// "歇一歇"限流提示
    pub throttle: String,
    /// 封面生成完成标记
    pub cover: String,
    /// 下载按钮
    pub download: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            file_input: r#"input[type="file"][accept*="image"]"#.to_string(),
            prompt: ".prompt.scroll-display-none".to_string(),
            confirm: ".btn_done:not([disabled])".to_string(),
            send: ".btn-group svg.icon".to_string(),
            // 宿主页面限流时首个卡片同样带有 finished 封面
            throttle: r#"div[data-index="0"] .cover.finished"#.to_string(),
            cover: r#"div[data-index="0"] .cover.finished"#.to_string(),
            download: r#"img.btn-icon.el-tooltip__trigger[src*="toolbar_download_ic"]"#.to_string(),
        }
    }
}
