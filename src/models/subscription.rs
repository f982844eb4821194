use chrono::NaiveDate;
use std::fmt::Display;

/// 期刊订阅
///
/// 由人工在订阅表中维护，本程序只更新处理状态和水位日期
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    /// 工作区内部记录 ID，更新状态时使用
    pub id: String,
    pub journal: String,
    pub online_issn: String,
    pub print_issn: String,
    /// 人工设置的起始抓取日期
    pub start_date: Option<NaiveDate>,
    /// 上次成功处理后推进的水位日期
    pub last_update: Option<NaiveDate>,
    pub enabled: bool,
}

impl Subscription {
    /// 优先使用 Online ISSN，其次 Print ISSN
    pub fn issn(&self) -> Option<&str> {
        [self.online_issn.trim(), self.print_issn.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
    }

    /// 抓取起点：水位日期 > 起始抓取日期
    pub fn watermark(&self) -> Option<NaiveDate> {
        self.last_update.or(self.start_date)
    }
}

impl Display for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[期刊 {}]", self.journal)
    }
}
