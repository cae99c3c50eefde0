//! Fixed word lists and pattern tables used by the classifier.
//!
//! Everything here is immutable and built at most once per process.

use std::sync::OnceLock;

use regex::{RegexSet, RegexSetBuilder};

/// Imperative/UI verbs. Their presence marks instructional body text.
pub const ACTION_VERBS: &[&str] = &[
    "点击", "选择", "输入", "打开", "关闭", "设置", "配置", "进入", "退出", "保存", "删除", "修改",
    "查看", "操作", "执行", "运行", "启动", "停止", "添加", "移除", "编辑", "更新", "刷新", "重置",
    "清除", "导入", "导出", "上传", "下载", "发送", "接收", "连接", "断开", "登录", "登出", "注册",
    "提交", "取消", "确认", "拒绝", "同意", "申请", "审批", "通过", "驳回",
    "click", "select", "tap", "choose", "save", "delete", "modify", "edit", "execute", "launch",
    "restart", "refresh", "upload", "download", "submit", "cancel", "confirm", "login", "logout",
    "navigate",
];

/// Structural and domain nouns that tend to appear in section titles.
pub const HEADING_KEYWORDS: &[&str] = &[
    "管理", "系统", "功能", "概述", "介绍", "说明", "中心", "平台", "工具", "环境", "配置", "设置",
    "模块", "组件", "服务", "接口", "协议", "标准", "规范", "流程", "方案", "策略", "政策", "制度",
    "规则", "原则", "方法", "技术", "架构", "框架", "结构", "设计", "开发", "部署", "运维", "监控",
    "安全", "权限", "认证", "授权", "加密", "解密", "备份", "恢复", "容灾", "性能", "优化", "调优",
    "测试", "验证", "评估", "分析", "统计", "报告",
    "system", "overview", "introduction", "module", "management", "feature", "function",
    "platform", "environment", "configuration", "settings", "component", "service", "interface",
    "protocol", "standard", "specification", "process", "workflow", "solution", "strategy",
    "policy", "principle", "method", "architecture", "framework", "structure", "design",
    "development", "deployment", "operations", "monitoring", "security", "permission",
    "authentication", "authorization", "backup", "recovery", "performance", "optimization",
    "testing", "verification", "evaluation", "analysis", "statistics", "report", "summary",
    "conclusion", "appendix", "background", "requirements",
];

/// Units a `第<N>…` chapter marker may end with.
pub const CHAPTER_INDICATORS: &[&str] = &["章", "节", "部分", "篇"];

/// Lowercased alphanumeric words of `text`.
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_owned)
        .collect()
}

/// First lexicon entry present in `text`.
///
/// Non-ASCII entries match as substrings, which suits scripts written
/// without spaces. ASCII entries match whole words, case-insensitively; with
/// `plurals` set a trailing `s` is also accepted.
fn find_in(text: &str, lexicon: &[&'static str], plurals: bool) -> Option<&'static str> {
    let words = words(text);
    lexicon.iter().copied().find(|entry| {
        if !entry.is_ascii() {
            return text.contains(entry);
        }
        words.iter().any(|w| {
            let plural = plurals
                && w.len() == entry.len() + 1
                && w.starts_with(*entry)
                && w.ends_with('s');
            w.as_str() == *entry || plural
        })
    })
}

/// The action verb that marks `text` as instructional, if any.
pub fn find_action_verb(text: &str) -> Option<&'static str> {
    find_in(text, ACTION_VERBS, false)
}

/// The first heading keyword in `text`; English nouns also match in plural.
pub fn find_heading_keyword(text: &str) -> Option<&'static str> {
    find_in(text, HEADING_KEYWORDS, true)
}

/// A [`RegexSet`] whose members carry a short name for diagnostics.
pub struct NamedPatterns {
    names: Vec<&'static str>,
    set: RegexSet,
}

impl NamedPatterns {
    fn build(entries: Vec<(&'static str, String)>, case_insensitive: bool) -> Self {
        let (names, patterns): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        let set = RegexSetBuilder::new(patterns)
            .case_insensitive(case_insensitive)
            .build()
            .unwrap();
        Self { names, set }
    }

    /// Name of the first (lowest-index) pattern matching `text`.
    pub fn first_match(&self, text: &str) -> Option<&'static str> {
        self.set
            .matches(text)
            .iter()
            .next()
            .map(|idx| self.names[idx])
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }
}

pub(crate) const CHINESE_NUMERALS: &str = "一二三四五六七八九十";

/// Chaptering and enumeration prefixes.
pub fn numbering_patterns() -> &'static NamedPatterns {
    static PATTERNS: OnceLock<NamedPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        NamedPatterns::build(
            vec![
                (
                    "chapter_marker",
                    format!(
                        r"^第[{CHINESE_NUMERALS}\d]+(?:{})",
                        CHAPTER_INDICATORS.join("|")
                    ),
                ),
                ("decimal_outline", r"^\d+(?:\.\d+)*[.、]".to_string()),
                ("chinese_enumerator", r"^[一二三四五六七八九十]+[、．.]".to_string()),
                (
                    "parenthesized_enumerator",
                    r"^[(（][一二三四五六七八九十\d]+[)）]".to_string(),
                ),
                ("circled_enumerator", r"^[\x{2460}-\x{2473}]".to_string()),
                ("latin_letter", r"^[A-Z]\.".to_string()),
            ],
            false,
        )
    })
}

/// Shapes that are never headings: page numbers, addresses, dates, leaders.
pub fn exclusion_patterns() -> &'static NamedPatterns {
    static PATTERNS: OnceLock<NamedPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        NamedPatterns::build(
            [
                ("pure_digits", r"^\d+$"),
                ("page_number", r"^第\s*\d+\s*页$"),
                ("page_label", r"^page\s+\d+$"),
                ("dot_leader", r"\.{5,}"),
                ("ip_address", r"\d+\.\d+\.\d+\.\d+"),
                ("port", r":\d+"),
                ("url_or_email", r"^www\.|^http|@"),
                ("date", r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}"),
                ("digit_run", r"^[\d\s\-+()]{10,}$"),
            ]
            .into_iter()
            .map(|(name, pattern)| (name, pattern.to_string()))
            .collect(),
            true,
        )
    })
}
