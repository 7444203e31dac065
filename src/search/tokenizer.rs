//! Query tokenizer - turns user input into an FTS5 match expression / 查询分词
//!
//! The index uses SQLite's trigram tokenizer, so every quoted phrase is a
//! case-insensitive substring match. Phrases shorter than three characters never
//! match under trigram, which is why short terms are dropped.

/// Shortest term the trigram index can match / trigram 可匹配的最短长度
pub const MIN_TERM_CHARS: usize = 3;

/// Split a query into terms / 拆分查询词
///
/// Separators are whitespace and list punctuation (ASCII and full-width).
/// Characters such as `_`, `.`, `@` stay inside terms since usernames and
/// nicknames use them.
pub fn query_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '，' | '；' | '、'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Build the FTS5 MATCH expression for a query / 构建 MATCH 表达式
///
/// Terms are OR-ed. When no term reaches [`MIN_TERM_CHARS`] the whole trimmed
/// query becomes a single phrase. Returns `None` for an empty query.
pub fn match_expression(query: &str) -> Option<String> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    let mut alternatives: Vec<String> = Vec::new();
    for term in query_terms(query) {
        if term.chars().count() < MIN_TERM_CHARS {
            continue;
        }
        push_unique(&mut alternatives, quote_phrase(&term));

        // 繁体查询补充简体写法
        let simplified = to_simplified(&term);
        if simplified != term {
            push_unique(&mut alternatives, quote_phrase(&simplified));
        }
    }

    if alternatives.is_empty() {
        alternatives.push(quote_phrase(query));
    }

    Some(alternatives.join(" OR "))
}

fn push_unique(list: &mut Vec<String>, phrase: String) {
    if !list.contains(&phrase) {
        list.push(phrase);
    }
}

/// Quote a term as an FTS5 string / 转义为 FTS5 字符串
fn quote_phrase(term: &str) -> String {
    format!("\"{}\"", term.replace('"', "\"\""))
}

/// 繁体转简体（姓名常用字映射）
pub fn to_simplified(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '張' => '张', '陳' => '陈', '劉' => '刘', '楊' => '杨', '黃' => '黄',
            '趙' => '赵', '吳' => '吴', '孫' => '孙', '鄭' => '郑', '馬' => '马',
            '許' => '许', '鄧' => '邓', '馮' => '冯', '韓' => '韩', '蕭' => '萧',
            '葉' => '叶', '蔣' => '蒋', '蘇' => '苏', '盧' => '卢', '潘' => '潘',
            '錢' => '钱', '湯' => '汤', '賴' => '赖', '龔' => '龚', '嚴' => '严',
            '陸' => '陆', '鍾' => '钟', '萬' => '万', '顧' => '顾', '譚' => '谭',
            '華' => '华', '國' => '国', '東' => '东', '偉' => '伟', '強' => '强',
            '軍' => '军', '傑' => '杰', '濤' => '涛', '鵬' => '鹏', '輝' => '辉',
            '麗' => '丽', '靜' => '静', '紅' => '红', '艷' => '艳', '鳳' => '凤',
            '蘭' => '兰', '玲' => '玲', '潔' => '洁', '燕' => '燕', '雲' => '云',
            '飛' => '飞', '龍' => '龙', '鳴' => '鸣', '權' => '权', '興' => '兴',
            '寶' => '宝', '廣' => '广', '長' => '长', '曉' => '晓', '書' => '书',
            '學' => '学', '愛' => '爱', '風' => '风', '夢' => '梦', '樂' => '乐',
            _ => c,
        })
        .collect()
}
