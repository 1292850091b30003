//! 列表响应的通用封装

use serde::Deserialize;

/// 列表接口既可能返回裸数组，也可能返回分页封装
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Paginated {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    Plain(Vec<T>),
}

impl<T> ListEnvelope<T> {
    /// 拆出本页条目与下一页链接
    pub fn into_page(self) -> (Vec<T>, Option<String>) {
        match self {
            ListEnvelope::Paginated { results, next, .. } => {
                (results, next.filter(|n| !n.is_empty()))
            }
            ListEnvelope::Plain(items) => (items, None),
        }
    }

    /// 服务端声明的总数；裸数组时为元素个数
    pub fn total(&self) -> u64 {
        match self {
            ListEnvelope::Paginated { count, results, .. } => {
                count.unwrap_or(results.len() as u64)
            }
            ListEnvelope::Plain(items) => items.len() as u64,
        }
    }
}
