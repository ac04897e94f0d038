//! Developer chat: canned code samples and a toy runner for them

use std::sync::LazyLock;
use std::time::Duration;

use log::{info, warn};
use regex::Regex;

use super::engine::{ChatError, DelayedReplies, Message};
use crate::notification::Notices;
use crate::settings;

pub const GREETING: &str = "Hello! I can help you with coding in various languages. \
                            What would you like me to help you with today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeLanguage {
    JavaScript,
    #[default]
    TypeScript,
    Python,
    Html,
    Css,
    Java,
    C,
    Cpp,
    CSharp,
    Go,
    Ruby,
    Php,
    Swift,
    Kotlin,
    Rust,
    Shell,
    Sql,
    PlainText,
}

impl CodeLanguage {
    pub const ALL: [CodeLanguage; 18] = [
        CodeLanguage::JavaScript,
        CodeLanguage::TypeScript,
        CodeLanguage::Python,
        CodeLanguage::Html,
        CodeLanguage::Css,
        CodeLanguage::Java,
        CodeLanguage::C,
        CodeLanguage::Cpp,
        CodeLanguage::CSharp,
        CodeLanguage::Go,
        CodeLanguage::Ruby,
        CodeLanguage::Php,
        CodeLanguage::Swift,
        CodeLanguage::Kotlin,
        CodeLanguage::Rust,
        CodeLanguage::Shell,
        CodeLanguage::Sql,
        CodeLanguage::PlainText,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CodeLanguage::JavaScript => "javascript",
            CodeLanguage::TypeScript => "typescript",
            CodeLanguage::Python => "python",
            CodeLanguage::Html => "html",
            CodeLanguage::Css => "css",
            CodeLanguage::Java => "java",
            CodeLanguage::C => "c",
            CodeLanguage::Cpp => "cpp",
            CodeLanguage::CSharp => "csharp",
            CodeLanguage::Go => "go",
            CodeLanguage::Ruby => "ruby",
            CodeLanguage::Php => "php",
            CodeLanguage::Swift => "swift",
            CodeLanguage::Kotlin => "kotlin",
            CodeLanguage::Rust => "rust",
            CodeLanguage::Shell => "shell",
            CodeLanguage::Sql => "sql",
            CodeLanguage::PlainText => "plaintext",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|lang| lang.as_str() == name)
    }

    fn runs_as_script(&self) -> bool {
        matches!(self, CodeLanguage::JavaScript | CodeLanguage::TypeScript)
    }
}

const CODE_REQUEST_WORDS: [&str; 4] = ["create", "code", "write", "implement"];

// Trailing spaces keep "java" from matching "javascript" and "go" from "good"
const LANGUAGE_MENTIONS: [&str; 14] = [
    "javascript",
    "typescript",
    "python",
    "html",
    "css",
    "java ",
    "c++",
    "c#",
    "go ",
    "ruby",
    "php",
    "swift",
    "kotlin",
    "rust",
];

/// True when `text` asks for code without saying in which language.
pub fn needs_language_choice(text: &str) -> bool {
    let lower = text.to_lowercase();
    CODE_REQUEST_WORDS.iter().any(|w| lower.contains(w))
        && !LANGUAGE_MENTIONS.iter().any(|l| lower.contains(l))
}

fn sample_for_request(request: &str) -> String {
    if request.to_lowercase().contains("hello world") {
        return r#"console.log("Hello, World!");"#.to_string();
    }
    format!(
        "// Generated code based on: \"{request}\"\n\n\
         function processRequest() {{\n  \
         // Implementation would go here\n  \
         console.log(\"Processing user request\");\n  \
         return \"Operation completed\";\n\
         }}\n\n\
         processRequest();"
    )
}

fn sample_for_language(lang: CodeLanguage) -> String {
    let name = lang.as_str();
    let body = match lang {
        CodeLanguage::JavaScript | CodeLanguage::TypeScript => format!(
            "function processUserRequest() {{\n  \
             console.log(\"Processing in {name}\");\n  \
             return \"Operation completed\";\n\
             }}\n\n\
             processUserRequest();"
        ),
        CodeLanguage::Python => "def process_user_request():\n    \
             print(\"Processing in Python\")\n    \
             return \"Operation completed\"\n\n\
             process_user_request()"
            .to_string(),
        CodeLanguage::Html => "<!DOCTYPE html>\n<html>\n<head>\n    <title>Example</title>\n\
             </head>\n<body>\n    <h1>Hello from HTML</h1>\n    \
             <p>This is a sample implementation.</p>\n</body>\n</html>"
            .to_string(),
        _ => format!("// Example code for {name}\n// Implementation would be language-specific"),
    };
    format!("// Generated {name} code\n\n{body}")
}

static CONSOLE_LOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"console\.log\((.*)\)\s*;?\s*$").expect("console.log pattern is valid")
});
// One argument: a whole quoted literal, or a bare token up to the next comma
static CONSOLE_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|`(?:[^`\\]|\\.)*`|[^,"'`]+"#)
        .expect("argument pattern is valid")
});
static RETURN_STMT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^return\s+(.+?)\s*;?\s*$").expect("return pattern is valid"));
static HTML_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head>.*?</head>").expect("head pattern is valid"));
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"));

fn literal_value(expr: &str) -> Result<String, String> {
    let expr = expr.trim();
    for quote in ['"', '\'', '`'] {
        if let Some(inner) = expr
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return Ok(inner.to_string());
        }
    }
    if expr.parse::<f64>().is_ok() || matches!(expr, "true" | "false" | "null" | "undefined") {
        return Ok(expr.to_string());
    }
    Err(format!("{expr} is not defined"))
}

/// Run a script sample: `console.log` calls with literal arguments print,
/// a top-level `return` becomes the result.
fn run_script(code: &str) -> Result<String, String> {
    let opens = code.matches('{').count();
    let closes = code.matches('}').count();
    if opens != closes {
        return Err("Unexpected end of input".to_string());
    }

    let mut output = String::new();
    let mut result = None;
    let mut depth = 0usize;
    for line in code.lines() {
        let trimmed = line.trim();
        if let Some(caps) = CONSOLE_LOG.captures(trimmed) {
            let args = CONSOLE_ARG
                .find_iter(&caps[1])
                .map(|arg| arg.as_str())
                .filter(|arg| !arg.trim().is_empty())
                .map(literal_value)
                .collect::<Result<Vec<_>, _>>()?;
            output.push_str(&args.join(" "));
            output.push('\n');
        } else if depth == 0 {
            if let Some(caps) = RETURN_STMT.captures(trimmed) {
                result = Some(literal_value(&caps[1])?);
                break;
            }
        }
        depth += trimmed.matches('{').count();
        depth = depth.saturating_sub(trimmed.matches('}').count());
    }

    if let Some(result) = result {
        output.push_str(&format!("Result: {result}"));
    }
    Ok(output)
}

fn render_html(code: &str) -> String {
    let without_head = HTML_HEAD.replace_all(code, "");
    let text = HTML_TAG.replace_all(&without_head, "\n");
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewMode {
    #[default]
    Code,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Scheduled,
    /// The request asked for code without a language; waiting on
    /// [`DeveloperChat::confirm_language`]
    NeedsLanguage,
}

pub struct DeveloperChat {
    api_key: String,
    messages: Vec<Message>,
    language: CodeLanguage,
    language_prompt: bool,
    code_preview: String,
    preview_output: String,
    preview_mode: PreviewMode,
    replies: DelayedReplies,
}

impl DeveloperChat {
    pub fn new(delay: Duration) -> Self {
        Self {
            api_key: String::new(),
            messages: vec![Message::assistant(GREETING)],
            language: CodeLanguage::default(),
            language_prompt: false,
            code_preview: String::new(),
            preview_output: String::new(),
            preview_mode: PreviewMode::Code,
            replies: DelayedReplies::new(delay),
        }
    }

    pub fn from_settings() -> Self {
        Self::new(settings::chat_delay())
    }

    pub fn set_api_key(&mut self, key: impl Into<String>) {
        self.api_key = key.into();
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn language(&self) -> CodeLanguage {
        self.language
    }

    pub fn awaiting_language(&self) -> bool {
        self.language_prompt
    }

    pub fn is_waiting(&self) -> bool {
        self.replies.is_pending()
    }

    pub fn code_preview(&self) -> &str {
        &self.code_preview
    }

    pub fn preview_output(&self) -> &str {
        &self.preview_output
    }

    pub fn preview_mode(&self) -> PreviewMode {
        self.preview_mode
    }

    pub fn set_preview_mode(&mut self, mode: PreviewMode) {
        self.preview_mode = mode;
    }

    pub fn send(&mut self, text: &str, notices: &mut Notices) -> Result<SendOutcome, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self.api_key.is_empty() {
            notices.error("Please enter your Gemini API key first");
            return Err(ChatError::MissingApiKey);
        }
        if self.language_prompt {
            return Err(ChatError::AwaitingLanguage);
        }
        if self.replies.is_pending() {
            notices.info("Please wait for the current response");
            return Err(ChatError::Busy);
        }

        self.messages.push(Message::user(text));
        if needs_language_choice(text) {
            self.language_prompt = true;
            return Ok(SendOutcome::NeedsLanguage);
        }

        let reply = Message::assistant("Here's an example of how you might implement that:")
            .with_code(self.language.as_str(), sample_for_request(text));
        if let Err(e) = self.replies.schedule(reply) {
            notices.error("Failed to get response from Gemini");
            return Err(e);
        }
        Ok(SendOutcome::Scheduled)
    }

    pub fn confirm_language(
        &mut self,
        language: CodeLanguage,
        notices: &mut Notices,
    ) -> Result<(), ChatError> {
        if self.replies.is_pending() {
            return Err(ChatError::Busy);
        }
        self.language = language;
        self.language_prompt = false;
        let name = language.as_str();
        self.messages.push(Message::assistant(format!(
            "I'll use {name} for this code. Processing your request..."
        )));

        let reply = Message::assistant(format!("Here's an example implementation in {name}:"))
            .with_code(name, sample_for_language(language));
        if let Err(e) = self.replies.schedule(reply) {
            notices.error("Failed to get response from Gemini");
            return Err(e);
        }
        Ok(())
    }

    pub fn dismiss_language_prompt(&mut self) {
        self.language_prompt = false;
    }

    pub fn poll(&mut self) -> usize {
        let arrived = self.replies.poll();
        self.absorb(arrived)
    }

    pub fn wait(&mut self, timeout: Duration) -> usize {
        let arrived = self.replies.wait(timeout);
        self.absorb(arrived)
    }

    fn absorb(&mut self, arrived: Vec<Message>) -> usize {
        let count = arrived.len();
        for message in arrived {
            if let Some(code) = &message.code {
                self.code_preview = code.content.clone();
            }
            self.messages.push(message);
        }
        count
    }

    /// Run the latest code sample and switch the preview to its output.
    /// Returns false when there is nothing to run.
    pub fn run_code(&mut self, notices: &mut Notices) -> bool {
        if self.code_preview.is_empty() || self.replies.is_pending() {
            return false;
        }
        let name = self.language.as_str();

        if self.language.runs_as_script() {
            match run_script(&self.code_preview) {
                Ok(output) => {
                    self.preview_output = output;
                    notices.success("Code executed successfully");
                }
                Err(e) => {
                    warn!("Error executing code: {e}");
                    self.preview_output = format!("Error executing code: {e}");
                    notices.error("Error executing code");
                }
            }
        } else if self.language == CodeLanguage::Html {
            self.preview_output = render_html(&self.code_preview);
            notices.success("HTML rendered");
        } else {
            info!("Refusing to run {name} sample");
            self.preview_output = format!(
                "Running {name} code is not supported directly in the preview. \
                 You would need a proper development environment for this language."
            );
            notices.error(format!("Running {name} code is not supported in the preview"));
        }
        self.preview_mode = PreviewMode::Output;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: Duration = Duration::from_millis(20);

    fn ready_chat() -> DeveloperChat {
        let mut chat = DeveloperChat::new(FAST);
        chat.set_api_key("key");
        chat
    }

    #[test]
    fn opens_with_greeting() {
        let chat = DeveloperChat::new(FAST);
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].content, GREETING);
    }

    #[test]
    fn language_detection() {
        assert!(needs_language_choice("Please write a sorting function"));
        assert!(!needs_language_choice("write it in Python"));
        assert!(!needs_language_choice("implement this in rust"));
        assert!(!needs_language_choice("what is a closure?"));
        // "javascript" does not count as "java "
        assert!(!needs_language_choice("code javascript"));
    }

    #[test]
    fn code_request_without_language_prompts() {
        let mut chat = ready_chat();
        let mut notices = Notices::new();
        let outcome = chat.send("create a parser", &mut notices).unwrap();
        assert_eq!(outcome, SendOutcome::NeedsLanguage);
        assert!(chat.awaiting_language());
        assert!(!chat.is_waiting());
        assert_eq!(
            chat.send("another", &mut notices),
            Err(ChatError::AwaitingLanguage)
        );

        chat.confirm_language(CodeLanguage::Python, &mut notices).unwrap();
        assert!(!chat.awaiting_language());
        assert_eq!(
            chat.messages().last().unwrap().content,
            "I'll use python for this code. Processing your request..."
        );

        assert_eq!(chat.wait(Duration::from_secs(2)), 1);
        let code = chat.messages().last().unwrap().code.clone().unwrap();
        assert_eq!(code.language, "python");
        assert!(code.content.contains("def process_user_request():"));
        assert_eq!(chat.code_preview(), code.content);
    }

    #[test]
    fn hello_world_runs() {
        let mut chat = ready_chat();
        let mut notices = Notices::new();
        chat.send("show me hello world in javascript", &mut notices)
            .unwrap();
        chat.wait(Duration::from_secs(2));
        assert_eq!(chat.code_preview(), r#"console.log("Hello, World!");"#);

        assert!(chat.run_code(&mut notices));
        assert_eq!(chat.preview_output(), "Hello, World!\n");
        assert_eq!(chat.preview_mode(), PreviewMode::Output);
    }

    #[test]
    fn console_log_keeps_commas_inside_literals() {
        let output = run_script(r#"console.log("a, b", 'c,d', 3);"#).unwrap();
        assert_eq!(output, "a, b c,d 3\n");
    }

    #[test]
    fn generated_function_reports_log_but_no_top_level_result() {
        let output = run_script(&sample_for_request("sort a list")).unwrap();
        assert_eq!(output, "Processing user request\n");
    }

    #[test]
    fn top_level_return_becomes_result() {
        let output = run_script("console.log('a', 2);\nreturn \"done\";").unwrap();
        assert_eq!(output, "a 2\nResult: done");
    }

    #[test]
    fn sandbox_errors_are_shown_as_output() {
        let mut chat = ready_chat();
        let mut notices = Notices::new();
        chat.code_preview = "console.log(answer);".to_string();
        chat.language = CodeLanguage::JavaScript;

        assert!(chat.run_code(&mut notices));
        assert_eq!(
            chat.preview_output(),
            "Error executing code: answer is not defined"
        );
        assert!(notices.contains("Error executing code"));
    }

    #[test]
    fn html_is_rendered_to_text() {
        let rendered = render_html(&sample_for_language(CodeLanguage::Html));
        assert!(rendered.contains("Hello from HTML\nThis is a sample implementation."));
        assert!(!rendered.contains("Example"));
    }

    #[test]
    fn other_languages_are_not_run() {
        let mut chat = ready_chat();
        let mut notices = Notices::new();
        chat.code_preview = sample_for_language(CodeLanguage::Go);
        chat.language = CodeLanguage::Go;

        assert!(chat.run_code(&mut notices));
        assert!(chat
            .preview_output()
            .starts_with("Running go code is not supported"));
    }

    #[test]
    fn nothing_to_run_without_sample() {
        let mut chat = ready_chat();
        let mut notices = Notices::new();
        assert!(!chat.run_code(&mut notices));
        assert_eq!(chat.preview_mode(), PreviewMode::Code);
    }
}
