use crate::constants::CoffeeConfig;

/// The tip form as the user is editing it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormState {
    pub name: String,
    pub message: String,
}

/// The `buyCoffee` arguments derived from a [`FormState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub message: String,
}

impl FormState {
    /// Resolve the form into call arguments, substituting the configured
    /// defaults for blank fields.
    pub fn submission(&self, config: &CoffeeConfig) -> Submission {
        Submission {
            name: or_default(&self.name, &config.default_name),
            message: or_default(&self.message, &config.default_message),
        }
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.message.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.message.is_empty()
    }
}

fn or_default(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}
