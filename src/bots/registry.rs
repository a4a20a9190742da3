use crate::bots::adapter::{Bot, BotSettings};
use crate::bots::players::{randy::RandyBot, sweeper::SweeperBot};
use std::collections::BTreeMap;

pub type BotConstructor =
    Box<dyn Fn(&BotSettings) -> anyhow::Result<Box<dyn Bot>> + Send + Sync>;

/// Name -> constructor table consulted by the worker when it loads a bot.
#[derive(Default)]
pub struct BotRegistry {
    constructors: BTreeMap<String, BotConstructor>,
}

impl BotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the bots shipped with the crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("randy", |settings| {
            let bot: Box<dyn Bot> = Box::new(RandyBot::new(settings)?);
            Ok(bot)
        });
        registry.register("sweeper", |settings| {
            let bot: Box<dyn Bot> = Box::new(SweeperBot::new(settings)?);
            Ok(bot)
        });
        registry
    }

    /// Register (or replace) a constructor under `name`.
    pub fn register<F>(&mut self, name: &str, constructor: F) -> &mut Self
    where
        F: Fn(&BotSettings) -> anyhow::Result<Box<dyn Bot>> + Send + Sync + 'static,
    {
        self.constructors
            .insert(name.to_string(), Box::new(constructor));
        self
    }

    pub fn get(&self, name: &str) -> Option<&BotConstructor> {
        self.constructors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for BotRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotRegistry")
            .field("bots", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_bots_are_listed_in_order() {
        let registry = BotRegistry::with_builtin();
        assert_eq!(registry.names(), vec!["randy", "sweeper"]);
        assert!(registry.contains("randy"));
        assert!(registry.get("nobody").is_none());
    }

    #[test]
    fn registered_constructor_builds_a_bot() {
        let registry = BotRegistry::with_builtin();
        let settings = BotSettings {
            bot_seed: Some(1),
            code_colors: vec!["R".to_string(), "G".to_string()],
            code_length: 2,
        };
        let constructor = registry.get("sweeper").unwrap();
        let mut bot = constructor(&settings).unwrap();
        assert_eq!(bot.make_guess().unwrap().len(), 2);
    }
}
