pub const SYSTEM_PROMPT: &str =
    "אתה עוזר חדשות שמחזיר חדשות מפורטות בפורמט JSON. החזר רק JSON תקין ללא טקסט נוסף.";

const FIELD_INSTRUCTIONS: &str = "לכל חדשה, כלול:
- כותרת מלאה בעברית
- תקציר של 2-3 משפטים
- תוכן המאמר המלא (5-8 פסקאות)
- מקור החדשה
- תיאור לתמונה מתאימה";

const SCHEMA_EXAMPLE: &str = r#"החזר בפורמט JSON הבא בלבד:
{
    "articles": [
        {
            "title": "כותרת מלאה בעברית",
            "summary": "תקציר קצר של החדשה",
            "full_content": "תוכן מלא של המאמר עם כל הפרטים...",
            "source": "שם המקור",
            "image_description": "תיאור התמונה המתאימה"
        }
    ]
}"#;

pub fn build_user_prompt(search_query: &str, max_results: u32) -> String {
    let mut result = String::with_capacity(
        search_query.len() + FIELD_INSTRUCTIONS.len() + SCHEMA_EXAMPLE.len() + 128,
    );
    result.push_str(&format!(
        "מצא את {} החדשות החשובות והפופולריות ביותר בנושא: {}",
        max_results, search_query
    ));
    result.push_str("\n\n");
    result.push_str(FIELD_INSTRUCTIONS);
    result.push_str("\n\n");
    result.push_str(SCHEMA_EXAMPLE);
    result
}

/// Removes a leading ```` ```json ```` and a trailing ```` ``` ```` from a model reply.
pub fn strip_code_fence(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}
