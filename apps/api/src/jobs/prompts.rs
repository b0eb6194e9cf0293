// Prompts for the job-query synthesizer. Each service that calls the text
// generator keeps its prompts alongside it.

/// Prompt for compressing a user profile into one upstream search query.
/// `{prefs}` is replaced with the serialized `SearchPreferences`.
pub const JOB_QUERY_PROMPT_TEMPLATE: &str = r#"You are an AI career expert. Your goal is to generate a SINGLE, highly optimized job search query for a Google-Jobs-backed search API.

Analyze the user's profile:
{prefs}

### Rules for the Query:
1. **Format**: "[Primary Job Title] jobs in [Location]"
2. **Conciseness**: Keep it under 10 words. Avoid long lists of skills.
3. **Relevance**: Pick the MOST likely job role based on the top skills.
4. **Location**: Use the provided city/country. If missing, fall back to the remaining preferences or global.
5. **Output**: Return ONLY the query string. No quotes, no markdown, no explanations.

### Examples of Good Queries:
- "Full Stack Developer jobs in Chicago"
- "React Developer jobs in India"
- "Data Analyst jobs in New York"
- "Python Developer remote jobs"

Generate the best single query now:"#;
