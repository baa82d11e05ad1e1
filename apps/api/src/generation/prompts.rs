// All LLM prompt templates for the generation module.
// Placeholders are `{name}` and are filled with `str::replace` before sending.

/// Job parsing prompt. Replace: {job_description}, {json_only}
pub const JOB_PARSE_PROMPT_TEMPLATE: &str = r#"Parse the following job description and extract key information in JSON format.

Job Description:
{job_description}

Extract these fields:
- title: job title
- company: company name
- skills: array of required skills
- experience: years of experience required
- location: job location
- salary: salary range if mentioned
- requirements: array of key requirements

Example format:
{
  "title": "Software Engineer",
  "company": "Tech Corp",
  "skills": ["React", "Node.js", "TypeScript"],
  "experience": "3+ years",
  "location": "San Francisco, CA",
  "salary": "$100k-120k",
  "requirements": ["Bachelor's degree", "Problem solving skills"]
}

{json_only}"#;

/// Cover letter prompt.
/// Replace: {title}, {company}, {skills}, {experience}, {location},
///          {sender_title}, {job_description}, {signer}
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Generate a concise, one-paragraph professional cover letter for the following job:

Job Title: {title}
Company: {company}
Required Skills: {skills}
Experience: {experience}
Location: {location}
Sender Profile: {sender_title}
Job Description:
{job_description}

The letter should:
- Be addressed to the hiring manager (no specific name)
- Express enthusiasm for the role and the company
- Include no placeholders
- Convey confidence and eagerness to contribute
- Be formatted as a simple HTML <p> paragraph (no headers, no complex styling)
- End with "Regards, {signer}""#;

/// Cover letter analysis prompt. Replace: {cover_letter}, {skills}, {json_only}
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze this one-paragraph cover letter and provide improvement suggestions.

Cover Letter:
{cover_letter}

Job Skills:
{skills}

Use this schema:
{
  "strengths": ["string"],
  "suggestions": ["string"],
  "matchScore": 0,
  "personalization": { "insight": "string" }
}
matchScore is a number from 0 to 100.

{json_only}"#;
