use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 可上传的图片扩展名（对应文件选择框的 `image/*`）
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif"];

/// 判断路径是否为图片文件
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// 从文件夹中加载本批次要处理的图片，按文件名排序
pub async fn load_image_batch(folder_path: &str) -> Result<Vec<PathBuf>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut images = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if is_image_file(&path) {
            images.push(path);
        } else {
            tracing::debug!("跳过非图片文件: {}", path.display());
        }
    }

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    tracing::info!("在 {} 中找到 {} 张图片", folder_path, images.len());

    Ok(images)
}
