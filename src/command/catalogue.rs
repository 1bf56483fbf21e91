use super::resolver::CommandResolver;
use crate::core::{DeclarationError, EngineError, Result};

/// Static table of command words and their resolvers.
///
/// Registration order is kept so generated help is stable across runs.
pub struct CommandCatalogue<T> {
    commands: Vec<CommandResolver<T>>,
}

impl<T: Send + 'static> CommandCatalogue<T> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Add a resolver under its name. Each word may be registered once.
    pub fn register(&mut self, resolver: CommandResolver<T>) -> std::result::Result<(), DeclarationError> {
        if self.get(resolver.name()).is_some() {
            return Err(DeclarationError::DuplicateCommand(resolver.name().to_string()));
        }
        self.commands.push(resolver);
        Ok(())
    }

    pub fn get(&self, word: &str) -> Option<&CommandResolver<T>> {
        self.commands.iter().find(|resolver| resolver.name() == word)
    }

    pub fn resolver(&self, word: &str) -> Result<&CommandResolver<T>> {
        self.get(word)
            .ok_or_else(|| EngineError::UnknownCommand(word.to_string()))
    }

    pub fn words(&self) -> Vec<&str> {
        self.commands.iter().map(CommandResolver::name).collect()
    }

    /// Markdown help, one section per command word.
    pub fn usage(&self) -> String {
        let mut out = String::new();
        for resolver in &self.commands {
            out.push_str(&format!("#### {}\n\n", resolver.name()));
            for shape in resolver.shapes() {
                out.push_str(&format!("* \"{} {}\"", resolver.name(), shape.usage()));
                let summary = shape
                    .description()
                    .lines()
                    .map(str::trim)
                    .find(|line| !line.is_empty() && !line.starts_with('#'))
                    .unwrap_or("");
                if !summary.is_empty() {
                    out.push_str(&format!(" - {}", summary));
                }
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}

impl<T: Send + 'static> Default for CommandCatalogue<T> {
    fn default() -> Self {
        Self::new()
    }
}
