//! 许可码校验 - 业务能力层
//!
//! 只保存许可码的 HMAC-SHA256 摘要，明文许可码不会出现在程序或存储中。

use std::collections::HashSet;

use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 有效许可码的 HMAC-SHA256 摘要
pub const PERMITTED_DIGESTS: &[&str] = &[
    "1c6799ef7f135b08f0f3cd351a237478dc3dda3d9dbec166e284b2e7bbf428f0",
    "422278f8af53658afc292591c1e7d158d032d3c316e0f37e48aaf6b562eb0245",
];

/// 生成上述摘要时使用的密钥
const SHARED_KEY: &[u8] = b"tsx123!";

/// 许可码校验能力
pub trait CredentialVerifier: Send + Sync {
    /// 计算候选许可码的摘要（小写十六进制）
    fn digest(&self, candidate: &str) -> String;

    /// 摘要是否在允许列表中
    fn is_permitted(&self, digest: &str) -> bool;

    /// 候选许可码是否有效
    fn verify(&self, candidate: &str) -> bool {
        self.is_permitted(&self.digest(candidate))
    }
}

/// 基于内置摘要列表的 HMAC 校验器
pub struct HmacVerifier {
    keyed: HmacSha256,
    permitted: HashSet<String>,
}

impl HmacVerifier {
    /// 使用自定义密钥和摘要列表创建
    pub fn new<I, S>(key: &[u8], permitted: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keyed = HmacSha256::new_from_slice(key).map_err(|_| anyhow!("无效的 HMAC 密钥"))?;
        let permitted = permitted
            .into_iter()
            .map(|d| d.as_ref().trim().to_ascii_lowercase())
            .collect();
        Ok(Self { keyed, permitted })
    }

    /// 使用内置密钥和摘要列表创建
    pub fn embedded() -> Result<Self> {
        Self::new(SHARED_KEY, PERMITTED_DIGESTS.iter().copied())
    }
}

impl CredentialVerifier for HmacVerifier {
    fn digest(&self, candidate: &str) -> String {
        let mut mac = self.keyed.clone();
        mac.update(candidate.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn is_permitted(&self, digest: &str) -> bool {
        self.permitted.contains(&digest.to_ascii_lowercase())
    }
}
