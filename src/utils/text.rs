/// 安全地截取前`max_chars`个字符，超出时追加省略号
pub fn truncate_chars(content: &str, max_chars: usize) -> String {
    if content.chars().count() > max_chars {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        content.to_string()
    }
}

/// 移除推理模型输出中的`<think>...</think>`片段
///
/// 未闭合的`<think>`会吞掉其后的全部内容。
pub fn strip_think_blocks(content: &str) -> String {
    let mut output = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("<think>") {
        output.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(end) => rest = &rest[start + end + "</think>".len()..],
            None => return output,
        }
    }
    output.push_str(rest);
    output
}
