//! Summary prompt construction.

/// Build the Vietnamese summarization prompt for one article.
///
/// The wording is fixed so the same article always produces the same prompt.
/// It asks for at least `expected_words` words, a leading "Tên bài" title line,
/// plain paragraphs (no bullets or numbered lists) and no meta-commentary.
pub fn build_prompt(article_text: &str, expected_words: usize) -> String {
    format!(
        "Yêu cầu tóm tắt chi tiết bằng tiếng Việt, không thêm lời giới thiệu hay nhận xét, \
         không giải thích đã làm gì, không đề cập số từ đã tóm tắt, chỉ cung cấp nội dung tóm tắt. \
         BẮT BUỘC phải trên {expected_words} từ, trình bày tóm tắt theo định dạng: \
         đầu tiên là dòng Tên bài bằng tiếng Việt, sau đó là các đoạn văn, \
         không dùng gạch đầu dòng hay liệt kê. \
         Nội dung bài viết:\n{article_text}\n\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_full_article() {
        let article = "Dòng một.\nDòng hai có <ký tự> & dấu.";
        let prompt = build_prompt(article, 2000);
        assert!(prompt.contains(article));
        assert!(prompt.ends_with("\n\n"));
    }

    #[test]
    fn prompt_states_constraints() {
        let prompt = build_prompt("x", 1500);
        assert!(prompt.contains("trên 1500 từ"));
        assert!(prompt.contains("Tên bài"));
        assert!(prompt.contains("không dùng gạch đầu dòng"));
    }

    #[test]
    fn prompt_is_deterministic() {
        assert_eq!(build_prompt("same", 10), build_prompt("same", 10));
    }
}
