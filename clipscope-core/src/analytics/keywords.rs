//! Title keyword frequency (word-cloud source).
//!
//! Titles are cleaned of punctuation and digit runs, then split on
//! whitespace. Latin-only segments become one lowercased token. Segments
//! containing CJK ideographs emit every all-CJK window of 4, 3 and 2
//! characters, so overlapping substrings are counted separately
//! ("美食教程" yields "美食教程", "美食教", "食教程", "美食", "食教", "教程").

use std::collections::HashMap;

use serde::Serialize;

use crate::types::VideoRecord;

/// Characters replaced by whitespace before segmenting.
pub const PUNCTUATION: &str = "【】[]()（）《》<>〈〉「」『』{}\"'“”‘’,，.。!！?？:：;；、|｜/\\-—_~～·…#＃@&*+=%^`$￥♪★☆";

/// Window sizes for CJK segments, longest first.
const CJK_WINDOWS: [usize; 3] = [4, 3, 2];

/// Tokens never counted.
pub const STOP_WORDS: &[&str] = &[
    // Chinese
    "我们", "你们", "他们", "她们", "自己", "这个", "那个", "这些", "那些", "这样", "那样",
    "什么", "怎么", "为什么", "如何", "一个", "一下", "一起", "没有", "就是", "还是", "可以",
    "不是", "已经", "因为", "所以", "但是", "如果", "然后", "而且", "或者", "真的", "这是",
    "还有", "现在", "时候", "大家", "视频", "合集", "第一", "最后", "之后", "以后", "之前",
    // English
    "the", "and", "for", "with", "you", "your", "are", "this", "that", "from", "how", "what",
    "not", "but", "all", "can", "was", "were", "its", "is", "to", "of", "in", "on", "at", "it",
    "an", "be", "by", "as", "or", "my", "me", "we", "do", "so", "up", "no", "if", "vs",
];

/// One keyword and how often it appeared across all titles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

/// Whether `c` is a CJK unified ideograph.
pub fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2A6DF}')
}

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Split one title into keyword tokens, duplicates included.
pub fn tokenize_title(title: &str) -> Vec<String> {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_digit() || PUNCTUATION.contains(c) {
                ' '
            } else {
                c
            }
        })
        .collect();

    let mut tokens = Vec::new();
    for segment in cleaned.split_whitespace() {
        if segment.chars().all(|c| c.is_ascii_alphabetic()) {
            let word = segment.to_ascii_lowercase();
            if word.len() >= 2 && !is_stop_word(&word) {
                tokens.push(word);
            }
        } else if segment.chars().any(is_cjk) {
            let chars: Vec<char> = segment.chars().collect();
            for size in CJK_WINDOWS {
                if chars.len() < size {
                    continue;
                }
                for window in chars.windows(size) {
                    if window.iter().all(|&c| is_cjk(c)) {
                        let word: String = window.iter().collect();
                        if !is_stop_word(&word) {
                            tokens.push(word);
                        }
                    }
                }
            }
        }
    }
    tokens
}

/// Aggregate title tokens into a frequency table.
///
/// Keeps tokens seen at least `min_count` times, most frequent first, at
/// most `limit` entries. Equal counts keep first-seen order.
pub fn keyword_frequencies(
    records: &[VideoRecord],
    min_count: usize,
    limit: usize,
) -> Vec<KeywordCount> {
    let mut order: Vec<KeywordCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for token in records.iter().flat_map(|r| tokenize_title(&r.title)) {
        match index.get(&token) {
            Some(&i) => order[i].count += 1,
            None => {
                index.insert(token.clone(), order.len());
                order.push(KeywordCount {
                    word: token,
                    count: 1,
                });
            }
        }
    }

    let mut kept: Vec<KeywordCount> = order
        .into_iter()
        .filter(|k| k.count >= min_count)
        .collect();
    kept.sort_by(|a, b| b.count.cmp(&a.count));
    kept.truncate(limit);
    kept
}
