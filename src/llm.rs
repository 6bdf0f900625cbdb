use std::io::Write as _;
use std::process::{Command, Stdio};

use crate::config::LlmConfig;
use crate::gemini::GeminiGateway;

/// A failed text-generation call. Callers treat it as a per-item failure.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("request to {endpoint} failed")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("LLM API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("malformed LLM response: {0}")]
    Malformed(String),
    #[error("LLM output text is empty")]
    EmptyOutput,
    #[error("LLM command `{program}` failed: {reason}")]
    Command { program: String, reason: String },
}

/// Single synchronous text-generation call.
pub trait Gateway {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

impl<G: Gateway + ?Sized> Gateway for &G {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}

impl<G: Gateway + ?Sized> Gateway for Box<G> {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LlmEngine {
    /// Hosted Gemini model over HTTPS.
    Gemini,
    /// Local program: prompt on stdin, response on stdout.
    Command,
}

pub fn build_gateway(config: &LlmConfig) -> anyhow::Result<Box<dyn Gateway>> {
    match config.engine {
        LlmEngine::Gemini => {
            let gemini = config.gemini()?;
            tracing::info!(engine = "gemini", model = %gemini.model, "llm gateway");
            Ok(Box::new(GeminiGateway::new(gemini)?))
        }
        LlmEngine::Command => {
            let Some(program) = config.command.clone() else {
                anyhow::bail!("missing --command (required when --engine=command)");
            };
            tracing::info!(engine = "command", command = %program, "llm gateway");
            Ok(Box::new(CommandGateway {
                program,
                args: config.command_args.clone(),
            }))
        }
    }
}

/// Runs an external program per prompt.
#[derive(Debug, Clone)]
pub struct CommandGateway {
    pub program: String,
    pub args: Vec<String>,
}

impl Gateway for CommandGateway {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let fail = |reason: String| GenerationError::Command {
            program: self.program.clone(),
            reason,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| fail(format!("spawn: {err}")))?;

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| fail("stdin is not piped".to_owned()))?;
            if let Err(err) = stdin.write_all(prompt.as_bytes())
                && err.kind() != std::io::ErrorKind::BrokenPipe
            {
                return Err(fail(format!("write stdin: {err}")));
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|err| fail(format!("wait: {err}")))?;
        if !output.status.success() {
            return Err(fail(format!("exited with {}", output.status)));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| fail("stdout is not valid UTF-8".to_owned()))?;
        if stdout.trim().is_empty() {
            return Err(GenerationError::EmptyOutput);
        }
        Ok(stdout)
    }
}
