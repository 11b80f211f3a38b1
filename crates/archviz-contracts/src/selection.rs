use indexmap::IndexMap;

use crate::catalog::{OptionCategory, PromptOption};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("'{query}' is not a known {category} option")]
    UnknownOption {
        category: &'static str,
        query: String,
    },
}

/// One chosen option per category. Every category starts at its first catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSelection {
    choices: IndexMap<OptionCategory, PromptOption>,
}

impl Default for WorkflowSelection {
    fn default() -> Self {
        let choices = OptionCategory::ALL
            .into_iter()
            .map(|category| (category, category.default_option()))
            .collect();
        Self { choices }
    }
}

impl WorkflowSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: OptionCategory) -> PromptOption {
        self.choices
            .get(&category)
            .copied()
            .unwrap_or_else(|| category.default_option())
    }

    /// Fragment injected into prompts for `category`.
    pub fn value(&self, category: OptionCategory) -> &'static str {
        self.get(category).value
    }

    pub fn set(
        &mut self,
        category: OptionCategory,
        option: PromptOption,
    ) -> Result<(), SelectionError> {
        if !category.contains(&option) {
            return Err(SelectionError::UnknownOption {
                category: category.name(),
                query: option.label.to_string(),
            });
        }
        self.choices.insert(category, option);
        Ok(())
    }

    /// Looks `query` up in the category's catalog and selects it.
    pub fn choose(
        &mut self,
        category: OptionCategory,
        query: &str,
    ) -> Result<PromptOption, SelectionError> {
        let option = category
            .find(query)
            .ok_or_else(|| SelectionError::UnknownOption {
                category: category.name(),
                query: query.to_string(),
            })?;
        self.choices.insert(category, option);
        Ok(option)
    }

    pub fn with(mut self, category: OptionCategory, query: &str) -> Result<Self, SelectionError> {
        self.choose(category, query)?;
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionCategory, PromptOption)> + '_ {
        self.choices.iter().map(|(category, option)| (*category, *option))
    }
}
