// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::errors::DomainError;

const RETIRED_SUFFIX: &str = "HC";

/// 型号标识
///
/// 制造商产品型号，规范化后不可变：去掉非字母数字字符、转为大写、
/// 去掉结尾的 `HC` 后缀。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelIdentifier(String);

impl ModelIdentifier {
    /// 解析并规范化型号
    ///
    /// # 返回值
    ///
    /// * `Ok(ModelIdentifier)` - 规范化后非空
    /// * `Err(DomainError)` - 规范化后为空
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(DomainError::Validation(format!(
                "model identifier '{}' is empty after normalization",
                raw
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 规范化型号字符串
///
/// Repeated trailing `HC` runs are all removed so that the result is a
/// fixed point: `normalize(normalize(m)) == normalize(m)`.
pub fn normalize(raw: &str) -> String {
    let mut out: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();

    while out.ends_with(RETIRED_SUFFIX) {
        out.truncate(out.len() - RETIRED_SUFFIX.len());
    }
    out
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModelIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ModelIdentifier {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ModelIdentifier> for String {
    fn from(value: ModelIdentifier) -> Self {
        value.0
    }
}
