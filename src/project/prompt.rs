//! Prompt composition for whole-project generation.
//!
//! The instruction text pins down the output grammar the parser prefers
//! (`## relative/path` followed by a fenced block) and shows one worked
//! example keyed to the detected language. Later stages treat the model's
//! compliance as best-effort only.

use super::context::ProjectContext;

/// Builds the instruction text sent to the model. The conversation history
/// is appended verbatim, last.
pub fn compose_prompt(context: &ProjectContext, conversation: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are a professional software engineer. Generate a complete project \
         from the conversation history below.\n\n",
    );

    prompt.push_str("**Project context analysis:**\n");
    if let Some(language) = &context.language {
        prompt.push_str(&format!("- Programming language: {}\n", language));
    }
    if let Some(framework) = &context.framework {
        prompt.push_str(&format!("- Framework: {}\n", framework));
    }
    if let Some(project_type) = &context.project_type {
        prompt.push_str(&format!(
            "- Project type: {}\n",
            project_type_description(project_type)
        ));
    }
    if let Some(domain) = &context.domain {
        prompt.push_str(&format!("- Business domain: {}\n", domain));
    }
    prompt.push('\n');

    prompt.push_str("**Strict format requirements:**\n");
    prompt.push_str("1. Return every file in exactly this format:\n");
    prompt.push_str("   ## relative/path/to/file\n");
    prompt.push_str("   ```language\n");
    prompt.push_str("   file content\n");
    prompt.push_str("   ```\n\n");

    prompt.push_str("2. Example:\n");
    prompt.push_str(example_for(context));
    prompt.push_str("\n\n");

    prompt.push_str("3. Project structure requirements:\n");
    prompt.push_str(&structure_requirements(context));
    prompt.push('\n');

    prompt.push_str("4. File path format:\n");
    prompt.push_str("   - Use relative paths: src/models/User.cs\n");
    prompt.push_str("   - Never use absolute paths: /src/models/User.cs\n");
    prompt.push_str("   - Keep the directory layout clear and conventional\n\n");

    prompt.push_str("5. Code quality requirements:\n");
    prompt.push_str("   - Code must be complete and runnable, no placeholders\n");
    prompt.push_str("   - Include every needed import or using statement\n");
    prompt.push_str("   - Follow the language's best practices\n");
    prompt.push_str("   - Add comments and documentation where appropriate\n\n");

    prompt.push_str("**Conversation history:**\n");
    prompt.push_str(conversation);

    prompt
}

fn project_type_description(project_type: &str) -> &'static str {
    match project_type {
        "library" => "library / SDK",
        "api" => "API service",
        "web" => "web application",
        "console" => "console application",
        _ => "general project",
    }
}

fn example_for(context: &ProjectContext) -> &'static str {
    match context.language.as_deref() {
        Some("csharp") => {
            "   ## src/Models/WeatherData.cs\n\
             \x20  ```csharp\n\
             \x20  using System;\n\
             \n\
             \x20  namespace MyProject.Models\n\
             \x20  {\n\
             \x20      public class WeatherData\n\
             \x20      {\n\
             \x20          public string Temperature { get; set; }\n\
             \x20      }\n\
             \x20  }\n\
             \x20  ```"
        }
        Some("java") => {
            "   ## src/main/java/com/example/models/WeatherData.java\n\
             \x20  ```java\n\
             \x20  package com.example.models;\n\
             \n\
             \x20  public class WeatherData {\n\
             \x20      private String temperature;\n\
             \n\
             \x20      public String getTemperature() {\n\
             \x20          return temperature;\n\
             \x20      }\n\
             \x20  }\n\
             \x20  ```"
        }
        Some("python") => {
            "   ## src/models/weather_data.py\n\
             \x20  ```python\n\
             \x20  from dataclasses import dataclass\n\
             \n\
             \x20  @dataclass\n\
             \x20  class WeatherData:\n\
             \x20      temperature: str\n\
             \x20  ```"
        }
        Some("javascript") => {
            "   ## src/models/WeatherData.js\n\
             \x20  ```javascript\n\
             \x20  class WeatherData {\n\
             \x20      constructor(temperature) {\n\
             \x20          this.temperature = temperature;\n\
             \x20      }\n\
             \x20  }\n\
             \n\
             \x20  module.exports = WeatherData;\n\
             \x20  ```"
        }
        _ => {
            "   ## src/models/WeatherData.ext\n\
             \x20  ```\n\
             \x20  // file content in the project's language\n\
             \x20  ```"
        }
    }
}

fn structure_requirements(context: &ProjectContext) -> String {
    let mut requirements = String::new();
    requirements.push_str("   - Comment every method, property, class and interface\n");

    match context.language.as_deref() {
        Some("csharp") => {
            requirements.push_str("   - Include the .csproj project file\n");
            if context.project_type.as_deref() == Some("library") {
                requirements.push_str("   - Use <OutputType>Library</OutputType>\n");
                requirements.push_str("   - Do not generate a Program.cs\n");
            }
            requirements.push_str("   - Keep namespaces consistent\n");
            requirements
                .push_str("   - Use a conventional layout (Models, Services, Utils, ...)\n");
        }
        Some("java") => {
            requirements.push_str("   - Include pom.xml or build.gradle\n");
            requirements.push_str("   - Follow the standard Maven/Gradle layout\n");
            requirements.push_str("   - Keep package names consistent\n");
        }
        Some("python") => {
            requirements.push_str("   - Include requirements.txt\n");
            requirements.push_str("   - Include setup.py or pyproject.toml\n");
            requirements.push_str("   - Follow Python packaging conventions\n");
        }
        Some("javascript") | Some("typescript") => {
            requirements.push_str("   - Include package.json\n");
            requirements.push_str("   - Organize sources under src/\n");
            if context.language.as_deref() == Some("typescript") {
                requirements.push_str("   - Include tsconfig.json\n");
            }
        }
        _ => {
            requirements.push_str("   - Include the appropriate project configuration files\n");
            requirements.push_str("   - Follow the language's standard layout\n");
        }
    }

    requirements.push_str("   - Include a README.md\n");
    requirements.push_str("   - Keep the structure clean with separated responsibilities\n");
    requirements
}

#[cfg(test)]
mod tests {
    use super::super::context::analyze_context;
    use super::*;

    #[test]
    fn prompt_pins_the_output_grammar() {
        let prompt = compose_prompt(&ProjectContext::default(), "make me something");

        assert!(prompt.contains("## relative/path/to/file"));
        assert!(prompt.contains("```language"));
        assert!(prompt.contains("Use relative paths"));
    }

    #[test]
    fn example_is_keyed_to_the_detected_language() {
        let context = analyze_context("a python cli");
        let prompt = compose_prompt(&context, "x");

        assert!(prompt.contains("weather_data.py"));
        assert!(!prompt.contains("WeatherData.cs"));
    }

    #[test]
    fn unknown_language_gets_the_generic_example() {
        let prompt = compose_prompt(&ProjectContext::default(), "x");

        assert!(prompt.contains("WeatherData.ext"));
    }

    #[test]
    fn conversation_history_comes_last_verbatim() {
        let history = "user: build a thing\nassistant: which thing?";
        let prompt = compose_prompt(&ProjectContext::default(), history);

        assert!(prompt.ends_with(history));
    }

    #[test]
    fn detected_context_fields_are_surfaced() {
        let context = analyze_context("a typescript web shop");
        let prompt = compose_prompt(&context, "x");

        assert!(prompt.contains("Programming language: typescript"));
        assert!(prompt.contains("web application"));
        assert!(prompt.contains("tsconfig.json"));
    }
}
