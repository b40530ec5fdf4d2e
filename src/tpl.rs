use std::collections::HashMap;

/// Resolves `$VARIABLE` references in manifest strings
#[derive(Debug, Default)]
pub struct Tpl {
    variables: HashMap<String, String>,
}

impl Tpl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable with its value
    pub fn register<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.variables.insert(key.into(), value.into());
    }

    /// Replace every `$KEY` with its value. Longer keys are substituted
    /// first so `$NAME_SUFFIX` is not clobbered by `$NAME`.
    pub fn parse(&self, input: &str) -> String {
        let mut keys: Vec<&String> = self.variables.keys().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        keys.into_iter().fold(input.to_string(), |result, key| {
            result.replace(&format!("${}", key), &self.variables[key])
        })
    }

    pub fn parse_vec(&self, input: &[String]) -> Vec<String> {
        input.iter().map(|s| self.parse(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parsing() {
        let mut tpl = Tpl::new();
        tpl.register("VERSION", "1.0.0");
        tpl.register("PROFILE", "release");

        let result = tpl.parse("app-$VERSION-$PROFILE.tar.gz");
        assert_eq!(result, "app-1.0.0-release.tar.gz");
    }

    #[test]
    fn test_longest_key_wins() {
        let mut tpl = Tpl::new();
        tpl.register("NAME", "demo");
        tpl.register("NAME_UPPER", "DEMO");

        assert_eq!(tpl.parse("$NAME_UPPER/$NAME"), "DEMO/demo");
    }

    #[test]
    fn test_unknown_variables_are_kept() {
        let tpl = Tpl::new();
        assert_eq!(tpl.parse("$HOME/x"), "$HOME/x");
    }
}
