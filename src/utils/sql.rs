//! SQL 辅助函数

/// LIKE 模式中使用的转义字符
pub const LIKE_ESCAPE: char = '\\';

/// 转义 LIKE 通配符，使用户输入按字面匹配
pub fn escape_like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// 构造大小写不敏感的子串匹配模式（已转义、已转小写）
pub fn contains_pattern(input: &str) -> String {
    format!("%{}%", escape_like_pattern(&input.to_lowercase()))
}

/// 搜索列内容：各字段按 Unicode 规则转小写后以换行拼接
///
/// SQLite 的 `LOWER()` 只处理 ASCII，写入与查询两侧都在程序中折叠。
pub fn search_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_pattern() {
        assert_eq!(escape_like_pattern("abc"), "abc");
        assert_eq!(escape_like_pattern("100%"), "100\\%");
        assert_eq!(escape_like_pattern("a_b"), "a\\_b");
        assert_eq!(escape_like_pattern("c:\\"), "c:\\\\");
    }

    #[test]
    fn test_search_text_folds_unicode() {
        assert_eq!(search_text(["Übung Größe", "ÉTÉ"]), "übung größe\nété");
        assert_eq!(search_text(["Alice", ""]), "alice\n");
    }

    #[test]
    fn test_contains_pattern_lowercases() {
        assert_eq!(contains_pattern("Two_Sum"), "%two\\_sum%");
    }
}
