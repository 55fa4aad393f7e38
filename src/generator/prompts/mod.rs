//! 各阶段的提示词模板

pub const SYSTEM: &str = include_str!("system.tpl");

pub fn plan_queries(user_input: &str, min_queries: usize, max_queries: usize) -> String {
    format!(
        include_str!("plan_queries.tpl"),
        user_input = user_input,
        min_queries = min_queries,
        max_queries = max_queries
    )
}

/// 单个网页的摘要提示词，正文放在 `<SEARCH_RESULTS>` 块中
pub fn summarize(user_input: &str, page_content: &str) -> String {
    format!(
        include_str!("summarize.tpl"),
        user_input = user_input,
        page_content = page_content
    )
}

pub fn compose(user_input: &str, search_results: &str) -> String {
    format!(
        include_str!("compose.tpl"),
        user_input = user_input,
        search_results = search_results
    )
}

/// 审校提示词，通过句与修订标记由调用方传入，保证提示与解析使用同一组常量
pub fn review(
    user_input: &str,
    draft: &str,
    summaries: &str,
    acceptance_sentence: &str,
    correction_open: &str,
    correction_close: &str,
) -> String {
    format!(
        include_str!("review.tpl"),
        user_input = user_input,
        draft = draft,
        summaries = summaries,
        acceptance_sentence = acceptance_sentence,
        correction_open = correction_open,
        correction_close = correction_close
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_queries_fills_bounds() {
        let prompt = plan_queries("What causes tides?", 3, 8);
        assert!(prompt.contains("<USER_INPUT>\nWhat causes tides?\n</USER_INPUT>"));
        assert!(prompt.contains("Return between 3 and 8 distinct queries."));
    }

    #[test]
    fn test_inserted_braces_are_kept_verbatim() {
        let prompt = summarize("q", "fn main() { println!(\"{draft}\"); }");
        assert!(prompt.contains("<SEARCH_RESULTS>\nfn main() { println!(\"{draft}\"); }\n</SEARCH_RESULTS>"));
    }

    #[test]
    fn test_compose_includes_sources() {
        let prompt = compose("q", "[1]\n\nTitle: Moon\n");
        assert!(prompt.contains("<SEARCH_RESULTS>\n[1]\n\nTitle: Moon\n\n</SEARCH_RESULTS>"));
    }

    #[test]
    fn test_review_includes_markers_and_sentence() {
        let prompt = review("q", "DRAFT", "SUMMARIES", "ALL GOOD.", "<OPEN>", "</OPEN>");
        assert!(prompt.contains("<FINAL_RESPONSE>\nDRAFT\n</FINAL_RESPONSE>"));
        assert!(prompt.contains("SUMMARIES"));
        assert!(prompt.contains("  <OPEN>\n"));
        assert!(prompt.contains("  </OPEN>\n"));
        assert!(prompt.contains("  ALL GOOD.\n"));
    }
}
