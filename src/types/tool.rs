use serde::{Deserialize, Serialize};
use std::fmt;

/// 定价模式
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum PricingModel {
    Free,
    Freemium,
    Paid,
    Enterprise,
    #[default]
    Unknown,
}

impl PricingModel {
    /// 将模型返回的任意标签映射为枚举值，无法识别的一律视为`Unknown`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "free" => PricingModel::Free,
            "freemium" => PricingModel::Freemium,
            "paid" => PricingModel::Paid,
            "enterprise" => PricingModel::Enterprise,
            _ => PricingModel::Unknown,
        }
    }
}

impl fmt::Display for PricingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingModel::Free => write!(f, "Free"),
            PricingModel::Freemium => write!(f, "Freemium"),
            PricingModel::Paid => write!(f, "Paid"),
            PricingModel::Enterprise => write!(f, "Enterprise"),
            PricingModel::Unknown => write!(f, "Unknown"),
        }
    }
}

/// 三态布尔值
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    Yes,
    No,
    #[default]
    Unknown,
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => TriState::Yes,
            Some(false) => TriState::No,
            None => TriState::Unknown,
        }
    }
}

impl TriState {
    pub fn as_option(&self) -> Option<bool> {
        match self {
            TriState::Yes => Some(true),
            TriState::No => Some(false),
            TriState::Unknown => None,
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriState::Yes => write!(f, "yes"),
            TriState::No => write!(f, "no"),
            TriState::Unknown => write!(f, "unknown"),
        }
    }
}

/// 单个开发工具的结构化描述
///
/// 除`name`以外的字段都有明确的"未知"取值，下游不需要判断字段是否存在。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolRecord {
    pub name: String,
    pub website: Option<String>,
    pub pricing_model: PricingModel,
    pub is_open_source: TriState,
    pub tech_stack: Vec<String>,
    pub supported_languages: Vec<String>,
    pub has_api: TriState,
    pub integrations: Vec<String>,
    pub description: String,
}

impl ToolRecord {
    /// 只有名称、其余字段均为未知的记录
    pub fn unknown(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            website: None,
            pricing_model: PricingModel::Unknown,
            is_open_source: TriState::Unknown,
            tech_stack: Vec::new(),
            supported_languages: Vec::new(),
            has_api: TriState::Unknown,
            integrations: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_website(mut self, website: Option<String>) -> Self {
        self.website = website;
        self
    }

    /// 除名称和网址外没有任何已知信息
    pub fn is_degraded(&self) -> bool {
        self.pricing_model == PricingModel::Unknown
            && self.is_open_source == TriState::Unknown
            && self.has_api == TriState::Unknown
            && self.tech_stack.is_empty()
            && self.supported_languages.is_empty()
            && self.integrations.is_empty()
            && self.description.is_empty()
    }

    /// 用于拼接到推荐prompt中的紧凑单行描述
    pub fn compact_summary(&self) -> String {
        let list = |items: &[String]| {
            if items.is_empty() {
                "unknown".to_string()
            } else {
                items.join(", ")
            }
        };
        let description = if self.description.is_empty() {
            "unknown"
        } else {
            self.description.as_str()
        };

        format!(
            "- {} | website: {} | pricing: {} | open source: {} | api: {} | tech stack: {} | languages: {} | integrations: {} | description: {}",
            self.name,
            self.website.as_deref().unwrap_or("unknown"),
            self.pricing_model,
            self.is_open_source,
            self.has_api,
            list(&self.tech_stack),
            list(&self.supported_languages),
            list(&self.integrations),
            description
        )
    }
}

/// 按大小写不敏感的精确匹配去重，保留首次出现的写法与顺序
pub fn dedup_case_insensitive<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for item in items {
        let trimmed = item.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            result.push(trimmed.to_string());
        }
    }
    result
}
