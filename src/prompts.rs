//! Prompt builders for every generative call in the pipeline.
//!
//! Kept in one place so prompt wording changes never touch control flow.

use crate::models::{Article, Candidate};

/// One comparison prompt per corpus batch. The model answers with a text
/// containing "YES" when any existing topic is more than 80% similar to
/// the candidate, "NO" otherwise.
pub fn similarity_batch(candidate: &Candidate, batch: &[Article]) -> String {
    let existing = batch
        .iter()
        .map(|a| format!("Title: {}\nDescription: {}\n", a.title, a.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are an AI assistant that checks if a new topic is similar to existing topics in a database.
Your task is to compare the new topic with the existing topics and determine if they are similar based on the focus of the content and temporal context.
Focus on the main subject, context, key details, and timing of the news articles. Do not consider superficial similarities like similar words or phrases unless they indicate the same core topic at the same point in time.

New Topic:
Title: {title}
Description: {body}

Existing Topics:
{existing}

Compare the new topic with the existing topics. If any of the existing topics are similar to the new topic more than 80% then, respond with "YES". Otherwise, respond with "NO"."#,
        title = candidate.title,
        body = candidate.body,
        existing = existing
    )
}

/// Category determination; response is a comma-separated label list only.
pub fn categories(candidate: &Candidate) -> String {
    format!(
        r#"You are an AI assistant that determines the categories for a news article based on its title and description.
The categories can include:
- City, State, District (if the news is local or regional), using specific names only.
- Sports and the name of the sport (if the news is related to sports).
- Politics (if the news is related to politics).
- World and the country name (if the news is international).
- Entertainment (if the news is related to entertainment).
- Education (if the news is related to education).

Based on the following title and description, determine the appropriate categories and return them as a comma-separated list.
Exclude generic terms like "City", "State", or "District" from the response. Only include specific names and relevant categories.
Ensure that each category is separated by a comma and a space (e.g., "Education, Mumbai, Maharashtra").

Title: {title}
Description: {body}

Respond only with the comma-separated list of categories. Do not include any additional text."#,
        title = candidate.title,
        body = candidate.body
    )
}

/// SEO metadata; the response must be a bare JSON object.
pub fn seo(title: &str, body: &str) -> String {
    format!(
        r#"Generate an SEO-optimized engaging title, meta description and keywords for the given news content.

Title: "{title}"
Description: "{body}"

Respond ONLY with a JSON object:
{{
  "keywords": "Your keywords for the topic here",
  "optimized_title": "Your SEO-optimized title here",
  "meta_description": "Your engaging description for the topic here"
}}"#
    )
}

/// Human-readable summary used verbatim as the post body.
pub fn summary(title: &str, body: &str) -> String {
    format!(
        r#"You are an AI assistant specialized in summarizing news articles concisely and accurately.

Given the following news article details:

Title: "{title}"
Content: "{body}"

Generate a well-structured summary: start with a brief paragraph covering the main idea in 2-3 sentences, then list the most important details as bullet points under a "Highlights:" heading.

Ensure that:
- The summary captures the main points and key events.
- It maintains a neutral and factual tone.
- Important names, dates, and locations are retained for clarity.
- If the content is unclear or lacks information, mention that explicitly."#
    )
}

/// Short prompt for the text-to-image backend, derived from the headline.
pub fn image_prompt(title: &str) -> String {
    format!(
        r#"I have a news article with the following title:

Title: "{title}"

Produce a concise 2-3 word image generation prompt for an open-source text-to-image model.
Keep it short and to the point, focused on the core topic of the article.
Avoid specific names, locations, or complex descriptions; prefer common objects, abstract themes, or natural elements.

Respond only with the prompt text."#
    )
}
