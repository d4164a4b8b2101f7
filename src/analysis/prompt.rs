// src/analysis/prompt.rs
// =============================================================================
// Builds the single prompt sent to the language model for one repository.
//
// The prompt carries the repository's metadata and every code sample (already
// truncated by the walker), and asks for a JSON object with exactly the keys
// parse_reply() understands.
// =============================================================================

use crate::github::RepositoryRef;
use crate::walk::CodeSample;

const INSTRUCTIONS: &str = "Respond with ONLY a JSON object with these keys:\n\
     {\n  \
       \"technologies\": [languages, frameworks, libraries and tools used],\n  \
       \"skills\": [concrete technical skills demonstrated],\n  \
       \"achievements\": [notable things this project accomplishes],\n  \
       \"summary\": \"two or three sentences describing the project\"\n\
     }\n";

pub fn build_prompt(repo: &RepositoryRef, samples: &[CodeSample]) -> String {
    let mut prompt = format!(
        "Analyze this GitHub repository and identify the technical skills it demonstrates.\n\n\
         Repository: {}\n\
         Description: {}\n\
         Primary language: {}\n\
         Stars: {}, Forks: {}\n\n",
        repo.name,
        repo.description_or_default(),
        repo.primary_language.as_deref().unwrap_or("Unknown"),
        repo.star_count,
        repo.fork_count,
    );

    if samples.is_empty() {
        prompt.push_str("No code samples could be collected; rely on the metadata above.\n");
    } else {
        prompt.push_str(&format!("Code samples ({} files):\n", samples.len()));
        for sample in samples {
            prompt.push_str(&format!(
                "\n### File: {}\n```{}\n{}\n```\n",
                sample.path, sample.extension, sample.content
            ));
        }
    }

    prompt.push('\n');
    prompt.push_str(INSTRUCTIONS);
    prompt
}
