//! 调研结果的终端输出

use anyhow::{Context, Result};
use std::fmt::Write;

use crate::types::{RecommendationResult, ToolRecord, TriState};

/// 渲染为人类可读的文本
pub fn render_result(result: &RecommendationResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\n📊 Results for: {}", result.query());
    let _ = writeln!(out, "{}", "=".repeat(60));

    for (i, tool) in result.tools().iter().enumerate() {
        render_tool(&mut out, i + 1, tool);
    }

    if !result.analysis().is_empty() {
        let _ = writeln!(out, "Developer Recommendations: ");
        let _ = writeln!(out, "{}", "-".repeat(40));
        let _ = writeln!(out, "{}", result.analysis());
    }
    out
}

fn render_tool(out: &mut String, index: usize, tool: &ToolRecord) {
    let _ = writeln!(out, "\n{}. 🏢 {}", index, tool.name);
    let _ = writeln!(
        out,
        "   🌐 Website: {}",
        tool.website.as_deref().unwrap_or("unknown")
    );
    let _ = writeln!(out, "   💰 Pricing: {}", tool.pricing_model);
    let _ = writeln!(out, "   📖 Open Source: {}", tool.is_open_source);

    if !tool.tech_stack.is_empty() {
        let _ = writeln!(out, "   🛠️  Tech Stack: {}", first_n(&tool.tech_stack, 5));
    }
    if !tool.supported_languages.is_empty() {
        let _ = writeln!(
            out,
            "   💻 Language Support: {}",
            first_n(&tool.supported_languages, 5)
        );
    }
    match tool.has_api {
        TriState::Yes => {
            let _ = writeln!(out, "   🔌 API: ✅ Available");
        }
        TriState::No => {
            let _ = writeln!(out, "   🔌 API: ❌ Not Available");
        }
        TriState::Unknown => {}
    }
    if !tool.integrations.is_empty() {
        let _ = writeln!(out, "   🔗 Integrations: {}", first_n(&tool.integrations, 4));
    }
    if !tool.description.is_empty() {
        let _ = writeln!(out, "   📝 Description: {}", tool.description);
    }
    out.push('\n');
}

fn first_n(items: &[String], n: usize) -> String {
    items
        .iter()
        .take(n)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// 渲染为JSON
pub fn render_json(result: &RecommendationResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("Failed to serialize research result")
}
