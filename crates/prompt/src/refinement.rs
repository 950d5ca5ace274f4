//! Prompts for the outer refinement graph.
//!
//! One builder per node: introduction, conclusion, summary, titles, and
//! clarity/flow. Each inserts the draft verbatim via marker replacement.

const INTRODUCTION_TEMPLATE: &str = r#"You are an expert technical writer tasked with creating a compelling introduction for a blog post.
The full draft of the blog post is provided below.

**Blog Draft:**
```markdown
{blog_draft}
```

**Task:**
Write a professional, engaging introduction paragraph (typically 3-5 sentences) suitable for direct publication.
The introduction should:
1. Hook the reader and clearly state the blog post's main topic or purpose.
2. Briefly mention the key areas or concepts that will be covered.
3. Set a professional and informative tone for the rest of the article.
4. Avoid summarizing the entire content; focus on enticing the reader to continue.

**Output:**
Provide *only* the raw text for the introduction paragraph. Do NOT include any markdown formatting (like ```markdown), section headers, or extraneous text.
"#;

const CONCLUSION_TEMPLATE: &str = r#"You are an expert technical writer tasked with creating a concise and impactful conclusion for a blog post.
The full draft of the blog post is provided below.

**Blog Draft:**
```markdown
{blog_draft}
```

**Task:**
Write a professional, concise conclusion paragraph (typically 3-5 sentences) suitable for direct publication.
The conclusion should:
1. Briefly summarize the main takeaways or key points discussed in the blog post.
2. Reiterate the significance or implications of the topic.
3. Offer a final thought, call to action (if appropriate), or suggest next steps for the reader.
4. Provide a sense of closure.

**Output:**
Provide *only* the raw text for the conclusion paragraph. Do NOT include any markdown formatting (like ```markdown), section headers, or extraneous text.
"#;

const SUMMARY_TEMPLATE: &str = r#"You are an expert technical writer tasked with creating a concise summary of a blog post.
The full draft of the blog post is provided below.

**Blog Draft:**
```markdown
{blog_draft}
```

**Task:**
Write a concise summary (target 2-4 sentences) of the entire blog post, suitable for direct use (e.g., meta descriptions, social media previews).
The summary should accurately capture the main topic, key concepts covered, and the overall message or outcome of the post.

**Output:**
Provide *only* the raw text for the summary. Do NOT include any markdown formatting (like ```markdown), headers, or extraneous text.
"#;

const TITLES_TEMPLATE: &str = r#"You are an expert copywriter tasked with generating compelling titles and subtitles for a blog post.
The full draft of the blog post is provided below.

**Blog Draft:**
```markdown
{blog_draft}
```

**Task:**
Generate exactly {num_titles} title option(s). Prefer direct questions that reveal a technical insight over marketing copy; keep subtitles factual and specific, with concrete numbers when the draft provides them.

**Output:**
Output ONLY a JSON array, no other text. Each option must follow this exact structure:

[
  {
    "title": "Your compelling title here",
    "subtitle": "Your informative subtitle that adds context",
    "reasoning": "Brief explanation of why this title works"
  }
]

Ensure proper JSON formatting with double quotes. Do not include markdown code blocks or any other formatting.
"#;

const CLARITY_FLOW_TEMPLATE: &str = r#"You are an expert technical editor tasked with enhancing a blog post draft for clarity, flow, and engagement.
The full draft is provided below.

**Blog Draft:**
```markdown
{blog_draft}
```

**Task:**
Review and improve the draft while **PRESERVING ALL CONTENT AND WORD COUNT**. Focus on:

1. **Remove Duplicates**: Identify and remove exact duplicate headings/sections (keep first instance)
2. **Improve Transitions**: Add connecting sentences between sections that feel disconnected
3. **Fix Flow Issues**: Rephrase awkward transitions, ensure logical progression
4. **Language Polish**: Fix grammar, typos, clarify ambiguous sentences (without removing detail)

**CRITICAL CONSTRAINTS**:
- DO NOT remove any technical details, examples, or explanations
- Maintain approximately the same word count
- DO NOT summarize or consolidate sections
- Preserve all code blocks, formulas, and links

**Output:**
Provide the COMPLETE enhanced draft, outputting ONLY the fully formatted markdown content.
"#;

pub fn introduction_prompt(blog_draft: &str) -> String {
    INTRODUCTION_TEMPLATE.replace("{blog_draft}", blog_draft)
}

pub fn conclusion_prompt(blog_draft: &str) -> String {
    CONCLUSION_TEMPLATE.replace("{blog_draft}", blog_draft)
}

pub fn summary_prompt(blog_draft: &str) -> String {
    SUMMARY_TEMPLATE.replace("{blog_draft}", blog_draft)
}

pub fn titles_prompt(blog_draft: &str, num_titles: u32) -> String {
    TITLES_TEMPLATE
        .replace("{num_titles}", &num_titles.to_string())
        .replace("{blog_draft}", blog_draft)
}

pub fn clarity_flow_prompt(blog_draft: &str) -> String {
    CLARITY_FLOW_TEMPLATE.replace("{blog_draft}", blog_draft)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_lands_in_every_prompt() {
        let draft = "A draft with $\\sum_{i} x_i$ inside.";
        for prompt in [
            introduction_prompt(draft),
            conclusion_prompt(draft),
            summary_prompt(draft),
            titles_prompt(draft, 3),
            clarity_flow_prompt(draft),
        ] {
            assert!(prompt.contains(draft));
        }
    }

    #[test]
    fn titles_prompt_carries_count() {
        let prompt = titles_prompt("draft", 5);
        assert!(prompt.contains("exactly 5 title option(s)"));
        // The JSON example braces must survive marker replacement.
        assert!(prompt.contains("\"title\""));
        assert!(prompt.contains("\"reasoning\""));
    }
}
